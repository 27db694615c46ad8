//! Browser log viewer
//!
//! Reads entries from a file or row-store source, filters them by level,
//! paginates newest first and renders an HTML page served over axum.

pub mod html;
pub mod server;
pub mod source;

pub use server::{router, start, ServerHandle, ViewerQuery, ViewerState, DEFAULT_PER_PAGE};
pub use source::{FileSource, LogSource, Page, RowStoreSource, SourceKind};
