//! Iterator over the records of a full container.
//!
//! [`RecordIterator`] walks the identifier blocks, avatar entries and author
//! indices in lockstep, unkeying one block per step, so a container is
//! decoded in a single pass without materializing an intermediate id list.
//!
//! # Example
//! ```no_run
//! # use avtrdb_reader::{Container, FeedReader, Platform, DecodeOptions};
//! let reader = FeedReader::<Container>::open("pasavtrdb.txt", Platform::Pc, DecodeOptions::default()).unwrap();
//! let feed = reader.decode().unwrap();
//! for record in &feed.records {
//!     println!("{} {}", record.id, record.name);
//! }
//! ```

use std::iter::Enumerate;
use std::slice::{ChunksExact, Iter};

use super::codec::crypto::{self, BLOCK_LEN};
use super::format::content::{self, ContainerBody, StringTables};
use super::types::error::{AvtrdbError, Result};
use super::types::models::{AvatarRecord, ContainerHeader, KeySchedule, Platform};

/// Yields one [`AvatarRecord`] per identifier block.
///
/// Stops after the first error.
pub struct RecordIterator<'a> {
    id_blocks: Enumerate<ChunksExact<'a, u8>>,
    avatar_entries: Iter<'a, &'a str>,
    author_indices: Iter<'a, i32>,
    authors: &'a [&'a str],
    key: [u8; 16],
    schedule: KeySchedule,
    platform: Platform,
    failed: bool,
}

impl<'a> RecordIterator<'a> {
    pub fn new(
        header: &ContainerHeader,
        body: &'a ContainerBody<'a>,
        tables: &'a StringTables<'a>,
        schedule: KeySchedule,
        platform: Platform,
    ) -> Self {
        Self {
            id_blocks: body.id_blocks.chunks_exact(BLOCK_LEN).enumerate(),
            avatar_entries: tables.avatars.iter(),
            author_indices: body.author_indices.iter(),
            authors: &tables.authors,
            key: header.dynamic_key,
            schedule,
            platform,
            failed: false,
        }
    }

    fn resolve(&mut self, record: usize, chunk: &[u8]) -> Result<AvatarRecord> {
        let mut block = [0u8; BLOCK_LEN];
        block.copy_from_slice(chunk);
        let id = crypto::decode_block(&block, &self.key, self.schedule);

        let entry = self.avatar_entries.next().ok_or_else(|| {
            AvtrdbError::MalformedStringBlock(format!("no avatar entry for record {}", record))
        })?;
        let (name, description) = content::parse_avatar_entry(entry);

        let raw_index = self.author_indices.next().copied().ok_or_else(|| {
            AvtrdbError::MalformedStringBlock(format!("no author index for record {}", record))
        })?;
        let (author_index, _) = content::mask_author_index(record, raw_index);
        let author = self
            .authors
            .get(author_index)
            .map(|author| crate::avtrdb::utils::unreverse(author))
            .ok_or(AvtrdbError::AuthorIndexOutOfRange {
                record,
                index: author_index,
                table_len: self.authors.len(),
            })?;

        Ok(AvatarRecord::new(id, name, author, description, self.platform))
    }
}

impl<'a> Iterator for RecordIterator<'a> {
    type Item = Result<AvatarRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let (record, chunk) = self.id_blocks.next()?;
        let result = self.resolve(record, chunk);
        self.failed = result.is_err();
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            self.id_blocks.size_hint()
        }
    }
}
