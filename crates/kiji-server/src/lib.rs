//! Development server with live reload for kiji blogs.
//!
//! Serves every page, feed and image on demand from the content directory,
//! re-reading content per request, and tells connected browsers to reload
//! when a post changes.

pub mod livereload;
pub mod server;
pub mod watcher;

pub use livereload::{ReloadHub, ReloadMessage};
pub use server::{DevServer, DevServerConfig, ServerError};
pub use watcher::{FileWatcher, WatchEvent};
