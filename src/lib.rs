//! # avtrdb-reader
//!
//! A reader for the obfuscated avatar catalog feeds: the legacy
//! tab-delimited text cipher format and the binary PAS container format.
//! Decoded per-platform feeds are merged into one deduplicated
//! [`DatabaseSnapshot`] keyed by avatar id.
//!
//! Fetching the feed files and displaying the snapshot are left to the
//! caller; [`FeedReader::open`] is the only file-system access.
pub mod avtrdb;

// Re-export the main types for convenience
pub use avtrdb::{
    AvtrdbError, FeedReader, Result,
    refresh::{FeedFailure, FeedReport, FeedRole, FeedSource, RefreshOutcome, refresh},
    snapshot::{AuxMarkReport, DatabaseSnapshot, MergeReport, SnapshotMerger, SnapshotQuery},
    types::{
        feeds::{Container, DecodedFeed, DecodedIds, FeedFormat, LegacyText, SourceFeed},
        models::{
            AvatarId, AvatarRecord, ContainerHeader, DecodeInconsistency, DecodeOptions, KeySchedule,
            PackedDate, Platform,
        },
    },
    utils::ByteCursor,
};
