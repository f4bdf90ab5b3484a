//! Core catalog reader module

pub mod codec;
pub mod format;
pub mod iter;
pub mod reader;
pub mod refresh;
pub mod snapshot;
pub mod types;
pub mod utils;

pub use reader::FeedReader;
pub use types::error::{AvtrdbError, Result};
