//! In-memory snapshot of a watched directory tree.
//!
//! The tree is rebuilt wholesale on every accepted change; lookups resolve
//! a root-relative path to a file node, an explicit "excluded" marker, or
//! not-found.
//!
//! ```text
//! "."
//!  ├── src
//!  │    └── main.rs   -> FileRepr { path: "src/main.rs", content }
//!  └── a.txt          -> FileRepr { path: "a.txt", content }
//! ```

mod error;
mod filter;
mod node;
mod tree;

pub use error::{SnapshotError, SnapshotResult};
pub use filter::PathFilter;
pub use node::{FileRepr, Lookup, ROOT_SENTINEL, SnapshotNode, UNREADABLE_PREFIX};
pub use tree::{BuildStats, SnapshotTree};
