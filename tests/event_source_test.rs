//! The notify-backed source driving the processor on a real directory.

#![cfg(unix)]

use std::collections::HashSet;
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use vcwatch::{ChangeProcessor, FsEventSource, Settings, WatchConfig};

fn recorded_tags(processor: &ChangeProcessor, path: &str) -> HashSet<String> {
    processor
        .cache()
        .entries_for(path)
        .unwrap_or_default()
        .iter()
        .flatten()
        .map(|line| line.to_string())
        .collect()
}

#[test]
fn test_source_feeds_processor() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("a.txt");
    fs::write(&file, "hello").unwrap();

    // Zero debounce: a single write may surface as several modify events.
    let config = WatchConfig {
        debounce_ms: 0,
        ..Settings::default().watch
    };
    let processor = Arc::new(ChangeProcessor::new(temp.path(), &config));
    processor.construct().unwrap();

    let (source, events) = FsEventSource::start(temp.path(), config.channel_capacity).unwrap();
    let worker = {
        let processor = Arc::clone(&processor);
        thread::spawn(move || processor.run(events))
    };

    fs::write(&file, "hello world").unwrap();

    let expected: HashSet<String> = ["- hello", "+ hello world"]
        .into_iter()
        .map(String::from)
        .collect();
    let deadline = Instant::now() + Duration::from_secs(10);
    while recorded_tags(&processor, "a.txt") != expected && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(50));
    }

    drop(source);
    worker.join().unwrap();

    assert_eq!(recorded_tags(&processor, "a.txt"), expected);
    assert_eq!(
        processor.current_file("a.txt").unwrap().content,
        "hello world"
    );
}

#[test]
fn test_dropping_source_stops_processor() {
    let temp = TempDir::new().unwrap();
    let processor = Arc::new(ChangeProcessor::new(temp.path(), &Settings::default().watch));
    processor.construct().unwrap();

    let (source, events) = FsEventSource::start(temp.path(), 8).unwrap();
    let worker = {
        let processor = Arc::clone(&processor);
        thread::spawn(move || processor.run(events))
    };

    drop(source);
    worker.join().unwrap();
    assert!(processor.cache().is_empty());
}

#[test]
fn test_missing_root_fails_to_start() {
    let temp = TempDir::new().unwrap();
    let result = FsEventSource::start(&temp.path().join("absent"), 8);
    assert!(result.is_err());
}
