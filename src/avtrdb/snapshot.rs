//! Cross-platform merge into one deduplicated catalog snapshot.
//!
//! A [`SnapshotMerger`] is built fresh for every refresh. Primary feeds are
//! merged record by record (first writer wins for the text fields, platform
//! tags are unioned); auxiliary id-only feeds then tag records that are
//! already known. [`SnapshotMerger::finish`] hands out the read-only
//! [`DatabaseSnapshot`].

use std::collections::{BTreeSet, HashMap};
use std::io::{Read, Write};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::types::error::{AvtrdbError, Result};
use super::types::feeds::DecodedFeed;
use super::types::models::{AvatarId, AvatarRecord, ContainerHeader, PackedDate, Platform};

/// The merged catalog at one refresh.
///
/// Serializes as `{ entries, avatarCount, authorCount, lastUpdate }`.
/// The id index is rebuilt on deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SnapshotFile")]
pub struct DatabaseSnapshot {
    entries: Vec<AvatarRecord>,
    #[serde(skip)]
    id_index: HashMap<AvatarId, usize>,
    avatar_count: u32,
    author_count: u32,
    last_update: Option<PackedDate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotFile {
    entries: Vec<AvatarRecord>,
    #[serde(default)]
    avatar_count: u32,
    #[serde(default)]
    author_count: u32,
    #[serde(default)]
    last_update: Option<PackedDate>,
}

impl TryFrom<SnapshotFile> for DatabaseSnapshot {
    type Error = AvtrdbError;
    fn try_from(file: SnapshotFile) -> Result<Self> {
        let mut id_index = HashMap::with_capacity(file.entries.len());
        for (position, record) in file.entries.iter().enumerate() {
            if id_index.insert(record.id.clone(), position).is_some() {
                return Err(AvtrdbError::DuplicateAvatarId(record.id.to_string()));
            }
        }
        Ok(Self {
            entries: file.entries,
            id_index,
            avatar_count: file.avatar_count,
            author_count: file.author_count,
            last_update: file.last_update,
        })
    }
}

impl DatabaseSnapshot {
    /// Records in first-seen order.
    pub fn entries(&self) -> &[AvatarRecord] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AvatarRecord> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &AvatarId) -> Option<&AvatarRecord> {
        self.id_index.get(id).map(|&position| &self.entries[position])
    }

    pub fn contains(&self, id: &AvatarId) -> bool {
        self.id_index.contains_key(id)
    }

    /// Catalog-wide avatar total declared by the first container header.
    pub fn avatar_count(&self) -> u32 {
        self.avatar_count
    }

    /// Catalog-wide author total declared by the first container header.
    pub fn author_count(&self) -> u32 {
        self.author_count
    }

    /// `None` when only legacy text feeds were merged.
    pub fn last_update(&self) -> Option<PackedDate> {
        self.last_update
    }

    /// Records matching `query`, in snapshot order.
    pub fn search<'a>(&'a self, query: &'a SnapshotQuery) -> impl Iterator<Item = &'a AvatarRecord> + 'a {
        self.entries.iter().filter(move |record| query.matches(record))
    }

    /// Records matching `query`, most recently added first.
    pub fn search_newest_first<'a>(
        &'a self,
        query: &'a SnapshotQuery,
    ) -> impl Iterator<Item = &'a AvatarRecord> + 'a {
        self.entries.iter().rev().filter(move |record| query.matches(record))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn read_json<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
}

impl<'a> IntoIterator for &'a DatabaseSnapshot {
    type Item = &'a AvatarRecord;
    type IntoIter = std::slice::Iter<'a, AvatarRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Outcome of merging one primary feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub platform: Platform,
    /// Records not seen before.
    pub inserted: usize,
    /// Known records that gained the platform tag.
    pub tagged: usize,
    /// Known records that already carried the platform tag.
    pub already_tagged: usize,
}

/// Outcome of marking one auxiliary id-only feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxMarkReport {
    pub platform: Platform,
    /// Known records that gained the platform tag.
    pub newly_tagged: usize,
    /// Known records that already carried the platform tag.
    pub duplicates: usize,
    /// Ids absent from the snapshot, in feed order.
    pub not_found: Vec<AvatarId>,
}

impl AuxMarkReport {
    /// Ids of the feed that matched a known record.
    pub fn marked(&self) -> usize {
        self.newly_tagged + self.duplicates
    }
}

/// Builds a [`DatabaseSnapshot`] from per-platform feeds.
///
/// Merges take `&mut self`, so one merge runs at a time.
#[derive(Debug, Default)]
pub struct SnapshotMerger {
    snapshot: DatabaseSnapshot,
    header_seen: bool,
}

impl SnapshotMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes declared counts and the update date from the first container header.
    pub fn record_header(&mut self, header: &ContainerHeader) {
        if self.header_seen {
            if self.snapshot.last_update != Some(header.last_update) {
                debug!(
                    "Ignoring later header dated {} (snapshot keeps {:?})",
                    header.last_update, self.snapshot.last_update
                );
            }
            return;
        }
        self.header_seen = true;
        self.snapshot.avatar_count = header.declared_avatar_count;
        self.snapshot.author_count = header.declared_author_count;
        self.snapshot.last_update = Some(header.last_update);
    }

    /// Merges a decoded primary feed, header included.
    pub fn merge_feed(&mut self, feed: DecodedFeed) -> MergeReport {
        if let Some(header) = &feed.header {
            self.record_header(header);
        }
        self.merge_records(feed.platform, feed.records)
    }

    /// Merges full records published for `platform`.
    ///
    /// New ids are appended. Known ids only gain the platform tag; their
    /// name, author and description stay as first seen.
    pub fn merge_records(&mut self, platform: Platform, records: Vec<AvatarRecord>) -> MergeReport {
        let mut report = MergeReport {
            platform,
            inserted: 0,
            tagged: 0,
            already_tagged: 0,
        };

        for mut record in records {
            match self.snapshot.id_index.get(&record.id) {
                Some(&position) => {
                    if self.snapshot.entries[position].platforms.insert(platform) {
                        report.tagged += 1;
                    } else {
                        report.already_tagged += 1;
                    }
                }
                None => {
                    record.platforms.insert(platform);
                    self.snapshot.id_index.insert(record.id.clone(), self.snapshot.entries.len());
                    self.snapshot.entries.push(record);
                    report.inserted += 1;
                }
            }
        }

        info!(
            "Merged {}: {} new, {} tagged, {} already tagged ({} total)",
            platform,
            report.inserted,
            report.tagged,
            report.already_tagged,
            self.snapshot.len()
        );
        report
    }

    /// Tags known records listed by an auxiliary feed. Unknown ids are
    /// collected, never inserted.
    pub fn mark_auxiliary(&mut self, platform: Platform, ids: &[AvatarId]) -> AuxMarkReport {
        let mut report = AuxMarkReport {
            platform,
            newly_tagged: 0,
            duplicates: 0,
            not_found: Vec::new(),
        };

        for id in ids {
            let Some(&position) = self.snapshot.id_index.get(id) else {
                report.not_found.push(id.clone());
                continue;
            };
            if self.snapshot.entries[position].platforms.insert(platform) {
                report.newly_tagged += 1;
            } else {
                report.duplicates += 1;
            }
        }

        info!("Marked {} {} avatars", report.marked(), platform);
        if !report.not_found.is_empty() {
            info!("Found {} {} ids missing from the main list", report.not_found.len(), platform);
        }
        if report.duplicates > 0 {
            debug!("Skipped {} duplicate {} entries", report.duplicates, platform);
        }
        report
    }

    /// The snapshot built so far.
    pub fn snapshot(&self) -> &DatabaseSnapshot {
        &self.snapshot
    }

    pub fn finish(self) -> DatabaseSnapshot {
        self.snapshot
    }
}

/// Filter used by display consumers.
///
/// Text matching is a case-insensitive substring test. An empty platform
/// set accepts every record; otherwise a record needs any listed platform.
#[derive(Debug, Clone, Default)]
pub struct SnapshotQuery {
    text: Option<String>,
    author: Option<String>,
    platforms: BTreeSet<Platform>,
}

impl SnapshotQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches against name or description.
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_lowercase());
        self
    }

    pub fn with_author(mut self, author: &str) -> Self {
        self.author = Some(author.to_lowercase());
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platforms.insert(platform);
        self
    }

    pub fn matches(&self, record: &AvatarRecord) -> bool {
        if let Some(text) = &self.text
            && !record.name.to_lowercase().contains(text.as_str())
            && !record.description.to_lowercase().contains(text.as_str())
        {
            return false;
        }
        if let Some(author) = &self.author
            && !record.author.to_lowercase().contains(author.as_str())
        {
            return false;
        }
        self.platforms.is_empty() || !self.platforms.is_disjoint(&record.platforms)
    }
}
