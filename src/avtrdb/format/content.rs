//! # Container Body Parsing & Record Table Assembly
//!
//! This module takes the bytes that follow a parsed container header and
//! turns them into identifiers and records. It sits between the `reader`
//! (which owns the buffer) and the `codec` (which only does the pure
//! unkeying).
//!
//! ## Body Layout
//! ```text
//! [N * 16 bytes]          Identifier blocks
//! [N * flag_width bytes]  Per-record flags (kept raw)
//! [N * 4 bytes]           Author indices (i32, little-endian)
//! [rest]                  UTF-8 text: authors '\n' avatars
//!                         each table split on '\r',
//!                         avatar entries are "name\tdescription"
//! ```

use log::{debug, trace, warn};

use crate::avtrdb::codec::crypto::{self, BLOCK_LEN};
use crate::avtrdb::iter::RecordIterator;
use crate::avtrdb::types::error::{AvtrdbError, Result};
use crate::avtrdb::types::models::*;
use crate::avtrdb::utils::ByteCursor;

/// Mask applied to every author index before table lookup.
pub const AUTHOR_INDEX_MASK: u32 = 0x7FFFF;

/// Everything after the header of a full container, borrowed where possible.
#[derive(Debug)]
pub struct ContainerBody<'a> {
    /// Raw identifier blocks, `BLOCK_LEN` bytes per avatar.
    pub id_blocks: &'a [u8],
    /// Raw per-record flags, `flag_width` bytes per avatar.
    pub flags: &'a [u8],
    pub author_indices: Vec<i32>,
    pub text: String,
}

/// The two string tables of the trailing text block.
#[derive(Debug)]
pub struct StringTables<'a> {
    pub authors: Vec<&'a str>,
    pub avatars: Vec<&'a str>,
}

/// Reads the identifier region that directly follows the header.
pub fn read_id_blocks<'a>(cursor: &mut ByteCursor<'a>, header: &ContainerHeader) -> Result<&'a [u8]> {
    let len = header.file_avatar_count as usize * BLOCK_LEN;
    trace!("Reading {} identifier blocks ({} bytes)", header.file_avatar_count, len);
    cursor.read_bytes(len)
}

/// Unkeys every block of an identifier region.
pub fn decode_ids(id_blocks: &[u8], header: &ContainerHeader, schedule: KeySchedule) -> Vec<AvatarId> {
    debug!("Decoding {} identifiers with {:?} key schedule", id_blocks.len() / BLOCK_LEN, schedule);
    id_blocks
        .chunks_exact(BLOCK_LEN)
        .map(|chunk| {
            let mut block = [0u8; BLOCK_LEN];
            block.copy_from_slice(chunk);
            crypto::decode_block(&block, &header.dynamic_key, schedule)
        })
        .collect()
}

/// Reads the full body of a container, leaving the cursor at the end of the buffer.
pub fn read_body<'a>(cursor: &mut ByteCursor<'a>, header: &ContainerHeader) -> Result<ContainerBody<'a>> {
    let count = header.file_avatar_count as usize;

    let id_blocks = read_id_blocks(cursor, header)?;
    let flags = cursor.read_bytes(count * header.flag_width as usize)?;
    let author_indices = cursor.read_int32_array(count)?;

    let text_bytes = cursor.read_rest();
    trace!("String block: {} bytes", text_bytes.len());
    let text = String::from_utf8(text_bytes.to_vec())?;

    Ok(ContainerBody {
        id_blocks,
        flags,
        author_indices,
        text,
    })
}

/// Splits the string block into its author and avatar tables.
pub fn split_tables(text: &str) -> Result<StringTables<'_>> {
    let mut segments = text.split('\n');
    let (Some(authors), Some(avatars)) = (segments.next(), segments.next()) else {
        return Err(AvtrdbError::MalformedStringBlock(
            "expected author and avatar segments separated by a newline".to_string(),
        ));
    };
    let tables = StringTables {
        authors: authors.split('\r').collect(),
        avatars: avatars.split('\r').collect(),
    };
    debug!("String tables: {} authors, {} avatar entries", tables.authors.len(), tables.avatars.len());
    Ok(tables)
}

/// Splits an avatar entry into reversed-back name and description.
pub fn parse_avatar_entry(entry: &str) -> (String, String) {
    let mut fields = entry.split('\t');
    let name = fields.next().map(crate::avtrdb::utils::unreverse).unwrap_or_default();
    let description = fields.next().map(crate::avtrdb::utils::unreverse).unwrap_or_default();
    (name, description)
}

/// Masks an author index to 19 bits, reporting when bits were dropped.
pub fn mask_author_index(record: usize, raw: i32) -> (usize, Option<DecodeInconsistency>) {
    let clamped = (raw as u32 & AUTHOR_INDEX_MASK) as usize;
    let dropped = raw as u32 & !AUTHOR_INDEX_MASK != 0;
    let inconsistency = dropped.then_some(DecodeInconsistency::AuthorIndexClamped { record, raw, clamped });
    (clamped, inconsistency)
}

/// Zips identifiers, name entries and resolved authors into records.
///
/// Fails if the avatar table has fewer entries than the header promises
/// or an author index points past the author table. Clamped author indices
/// and table sizes that differ from the header are reported, not raised.
pub fn assemble_records(
    header: &ContainerHeader,
    body: &ContainerBody<'_>,
    schedule: KeySchedule,
    platform: Platform,
) -> Result<(Vec<AvatarRecord>, Vec<DecodeInconsistency>)> {
    let tables = split_tables(&body.text)?;
    let mut inconsistencies = Vec::new();

    if tables.authors.len() as u64 != header.file_author_count as u64 {
        inconsistencies.push(DecodeInconsistency::CountMismatch {
            item_type: "author table entries",
            declared: header.file_author_count as u64,
            found: tables.authors.len() as u64,
        });
    }
    if tables.avatars.len() < header.file_avatar_count as usize {
        return Err(AvtrdbError::MalformedStringBlock(format!(
            "avatar table has {} entries, header declares {}",
            tables.avatars.len(),
            header.file_avatar_count
        )));
    }
    if tables.avatars.len() != header.file_avatar_count as usize {
        inconsistencies.push(DecodeInconsistency::CountMismatch {
            item_type: "avatar table entries",
            declared: header.file_avatar_count as u64,
            found: tables.avatars.len() as u64,
        });
    }

    inconsistencies.extend(
        body.author_indices
            .iter()
            .enumerate()
            .filter_map(|(record, &raw)| mask_author_index(record, raw).1),
    );

    for inconsistency in &inconsistencies {
        warn!("Record tables: {}", inconsistency);
    }

    let records = RecordIterator::new(header, body, &tables, schedule, platform)
        .collect::<Result<Vec<_>>>()?;

    Ok((records, inconsistencies))
}
