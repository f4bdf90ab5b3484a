//! File format parsing layer for catalog feeds.
//!
//! This module provides the mid-level parsing layer that bridges between
//! raw buffers and the high-level [`FeedReader`](crate::avtrdb::reader::FeedReader).
//!
//! # Module Organization
//!
//! - [`header`]: Parses the fixed PAS container header and derives the dynamic key
//! - [`content`]: Reads the container body and assembles its record tables
//! - [`legacy`]: Parses the tab-delimited legacy text feed
//!
//! # Architecture
//!
//! ```text
//! PAS container:              Legacy text feed:
//! ┌─────────────────┐         ┌─────────────────┐
//! │  Fixed header   │ ←       │  Metadata line  │ (skipped)
//! │  (36 bytes)     │ header  ├─────────────────┤
//! ├─────────────────┤         │  token\tname\t  │ ← legacy::parse()
//! │  Id blocks      │ ←       │  author\tdesc   │
//! │  Flags          │ content │  ...            │
//! │  Author indices │         └─────────────────┘
//! │  String tables  │
//! └─────────────────┘
//! ```

pub mod content;
pub mod header;
pub mod legacy;
