//! Domain pack loading from a directory of JSON files.

mod loader;

pub use loader::{PackLoadError, PackLoader};
