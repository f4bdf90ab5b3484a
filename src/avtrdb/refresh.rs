//! One full refresh: decode every platform feed and merge the results.
//!
//! Each feed is decoded as a single unit of work. A feed that fails is
//! recorded in the outcome and the refresh carries on with the others.
//! Primary feeds are merged first, in the order given, then auxiliary
//! feeds mark the records the primaries produced.

use std::fmt;

use log::{error, info};

use super::snapshot::{AuxMarkReport, DatabaseSnapshot, MergeReport, SnapshotMerger};
use super::types::error::AvtrdbError;
use super::types::feeds::SourceFeed;
use super::types::models::{DecodeInconsistency, DecodeOptions, Platform};

/// Whether a feed supplies full records or only ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedRole {
    Primary,
    Auxiliary,
}

impl fmt::Display for FeedRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FeedRole::Primary => write!(f, "primary"),
            FeedRole::Auxiliary => write!(f, "auxiliary"),
        }
    }
}

/// One input file of a refresh.
#[derive(Debug, Clone)]
pub struct FeedSource {
    pub platform: Platform,
    pub role: FeedRole,
    pub feed: SourceFeed,
}

impl FeedSource {
    pub fn primary(platform: Platform, feed: SourceFeed) -> Self {
        Self {
            platform,
            role: FeedRole::Primary,
            feed,
        }
    }

    pub fn auxiliary(platform: Platform, feed: SourceFeed) -> Self {
        Self {
            platform,
            role: FeedRole::Auxiliary,
            feed,
        }
    }
}

/// A feed that could not be decoded.
#[derive(Debug)]
pub struct FeedFailure {
    pub platform: Platform,
    pub role: FeedRole,
    pub error: AvtrdbError,
}

/// Per-feed result of a successful decode.
#[derive(Debug, Clone)]
pub enum FeedReport {
    Merged(MergeReport),
    Marked(AuxMarkReport),
}

/// Everything a refresh produced.
#[derive(Debug)]
pub struct RefreshOutcome {
    pub snapshot: DatabaseSnapshot,
    pub reports: Vec<FeedReport>,
    pub inconsistencies: Vec<(Platform, DecodeInconsistency)>,
    pub failures: Vec<FeedFailure>,
}

impl RefreshOutcome {
    /// True when every feed decoded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Platforms with at least one failed feed.
    pub fn failed_platforms(&self) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = self.failures.iter().map(|f| f.platform).collect();
        platforms.sort();
        platforms.dedup();
        platforms
    }
}

/// Decodes and merges all sources into a fresh snapshot.
pub fn refresh(sources: &[FeedSource], options: &DecodeOptions) -> RefreshOutcome {
    info!("Refreshing catalog from {} feeds", sources.len());

    let mut merger = SnapshotMerger::new();
    let mut reports = Vec::new();
    let mut inconsistencies = Vec::new();
    let mut failures = Vec::new();

    let ordered = sources
        .iter()
        .filter(|s| s.role == FeedRole::Primary)
        .chain(sources.iter().filter(|s| s.role == FeedRole::Auxiliary));

    for source in ordered {
        let result = match source.role {
            FeedRole::Primary => source.feed.decode(source.platform, options).map(|feed| {
                inconsistencies.extend(feed.inconsistencies.iter().cloned().map(|i| (source.platform, i)));
                FeedReport::Merged(merger.merge_feed(feed))
            }),
            FeedRole::Auxiliary => source.feed.decode_ids(source.platform, options).map(|decoded| {
                inconsistencies.extend(decoded.inconsistencies.iter().cloned().map(|i| (source.platform, i)));
                FeedReport::Marked(merger.mark_auxiliary(source.platform, &decoded.ids))
            }),
        };

        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                error!(
                    "Failed to decode {} {} feed ({}): {}",
                    source.platform,
                    source.role,
                    source.feed.format_name(),
                    e
                );
                failures.push(FeedFailure {
                    platform: source.platform,
                    role: source.role,
                    error: e,
                });
            }
        }
    }

    let snapshot = merger.finish();
    info!(
        "Refresh finished: {} unique avatars, {} feeds failed",
        snapshot.len(),
        failures.len()
    );

    RefreshOutcome {
        snapshot,
        reports,
        inconsistencies,
        failures,
    }
}
