//! Core data structures for the avatar catalog.
//!
//! This module defines the fundamental types used throughout the library:
//! - Avatar identifiers, platforms and records
//! - The container header and its packed date
//! - Decoding options and the non-fatal inconsistencies a decode reports

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{AvtrdbError, Result};

/// Platform a record is published for.
///
/// Serialized with the spelling the catalog and its consumers use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "PC")]
    Pc,
    #[serde(rename = "Quest")]
    Quest,
    #[serde(rename = "iOS")]
    Ios,
}

impl Platform {
    /// All platforms, in the order the catalog publishes their feeds.
    pub const ALL: [Platform; 3] = [Platform::Pc, Platform::Quest, Platform::Ios];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Pc => "PC",
            Platform::Quest => "Quest",
            Platform::Ios => "iOS",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An avatar identifier: `avtr_` followed by a lowercase 8-4-4-4-12 UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AvatarId(String);

impl AvatarId {
    pub const PREFIX: &'static str = "avtr_";

    /// Character positions of the hyphens within the 36-character UUID suffix.
    pub const HYPHEN_POSITIONS: [usize; 4] = [8, 13, 18, 23];

    /// Builds an id from exactly 32 lowercase hex digits produced by one of
    /// the decoders.
    pub(crate) fn from_hex_digits(digits: &str) -> Self {
        debug_assert_eq!(digits.len(), 32);
        let mut id = String::with_capacity(Self::PREFIX.len() + 36);
        id.push_str(Self::PREFIX);
        for (i, c) in digits.chars().enumerate() {
            if matches!(i, 8 | 12 | 16 | 20) {
                id.push('-');
            }
            id.push(c);
        }
        Self(id)
    }

    /// Validates and wraps an id string, e.g. one loaded from a saved snapshot.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || AvtrdbError::InvalidAvatarId(s.to_string());
        let uuid = s.strip_prefix(Self::PREFIX).ok_or_else(invalid)?;
        if uuid.len() != 36 {
            return Err(invalid());
        }
        let well_formed = uuid.bytes().enumerate().all(|(i, b)| {
            if Self::HYPHEN_POSITIONS.contains(&i) {
                b == b'-'
            } else {
                b.is_ascii_digit() || (b'a'..=b'f').contains(&b)
            }
        });
        if !well_formed {
            return Err(invalid());
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The hyphenated UUID without the `avtr_` prefix.
    pub fn uuid(&self) -> &str {
        &self.0[Self::PREFIX.len()..]
    }
}

impl fmt::Display for AvatarId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AvatarId {
    type Error = AvtrdbError;
    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<AvatarId> for String {
    fn from(id: AvatarId) -> Self {
        id.0
    }
}

/// A single decoded catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarRecord {
    #[serde(rename = "avatar_id")]
    pub id: AvatarId,
    pub name: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    pub platforms: BTreeSet<Platform>,
}

impl AvatarRecord {
    /// Creates a record tagged with the platform whose feed it was decoded from.
    pub fn new(
        id: AvatarId,
        name: String,
        author: String,
        description: String,
        platform: Platform,
    ) -> Self {
        Self {
            id,
            name,
            author,
            description,
            platforms: BTreeSet::from([platform]),
        }
    }
}

/// Calendar date packed into 16 bits of the container header.
///
/// Month and day are not range checked; see [`PackedDate::is_plausible`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackedDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl PackedDate {
    /// Unpacks `[b0, b1]`: the top 13 bits hold a 4-bit year offset from
    /// 2016, a 4-bit month and a 5-bit day. The low 3 bits are unused.
    pub fn from_packed(bytes: [u8; 2]) -> Self {
        let raw = u16::from_be_bytes(bytes);
        let date_num = raw >> 3;
        Self {
            year: 2000 + (date_num >> 9) + 16,
            month: ((date_num >> 5) & 15) as u8,
            day: (date_num & 31) as u8,
        }
    }

    /// Whether month and day fall in their calendar ranges.
    pub fn is_plausible(&self) -> bool {
        (1..=12).contains(&self.month) && (1..=31).contains(&self.day)
    }
}

impl fmt::Display for PackedDate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl TryFrom<String> for PackedDate {
    type Error = AvtrdbError;
    fn try_from(value: String) -> Result<Self> {
        let invalid = || AvtrdbError::InvalidDate(value.clone());
        let mut parts = value.splitn(3, '-');
        let mut next = || parts.next().ok_or_else(invalid);
        let (year, month, day) = (next()?, next()?, next()?);
        Ok(Self {
            year: year.parse().map_err(|_| invalid())?,
            month: month.parse().map_err(|_| invalid())?,
            day: day.parse().map_err(|_| invalid())?,
        })
    }
}

impl From<PackedDate> for String {
    fn from(date: PackedDate) -> Self {
        date.to_string()
    }
}

/// Parsed fixed-layout header of a PAS container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Opaque platform tag byte.
    pub platform_tag: u8,
    /// Opaque format version byte.
    pub format_version: u8,
    /// Total avatars the publisher declares for the whole catalog.
    pub declared_avatar_count: u32,
    /// Total authors the publisher declares for the whole catalog.
    pub declared_author_count: u32,
    pub last_update: PackedDate,
    /// Avatars actually present in this file.
    pub file_avatar_count: u32,
    /// Authors actually present in this file.
    pub file_author_count: u32,
    /// Width in bytes of each record's flag field.
    pub flag_width: u8,
    /// Per-file key: the header's random bytes XOR the static key.
    pub dynamic_key: [u8; 16],
}

impl ContainerHeader {
    /// Size of the fixed header in bytes.
    pub const LEN: usize = 36;
}

/// How identifier blocks are unkeyed.
///
/// The format carries no flag for this; the caller picks by feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeySchedule {
    /// Plain XOR against the dynamic key.
    #[default]
    Simple,
    /// Descending XOR folding each byte into its neighbour, output reversed.
    Feedback,
}

/// Decoding configuration.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    pub key_schedule: KeySchedule,
    /// Constant table XORed with each container's random bytes.
    pub static_key: [u8; 16],
    /// Number of leading metadata lines in a legacy text feed.
    pub skip_metadata_lines: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            key_schedule: KeySchedule::default(),
            static_key: crate::avtrdb::codec::crypto::STATIC_KEY,
            skip_metadata_lines: 1,
        }
    }
}

impl DecodeOptions {
    pub fn with_key_schedule(mut self, key_schedule: KeySchedule) -> Self {
        self.key_schedule = key_schedule;
        self
    }

    pub fn with_static_key(mut self, static_key: [u8; 16]) -> Self {
        self.static_key = static_key;
        self
    }

    pub fn with_skip_metadata_lines(mut self, lines: usize) -> Self {
        self.skip_metadata_lines = lines;
        self
    }
}

/// A non-fatal oddity noticed while decoding. Logged and returned, never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeInconsistency {
    /// A declared count does not match what the file actually holds.
    CountMismatch {
        item_type: &'static str,
        declared: u64,
        found: u64,
    },
    /// An author index had bits set above the 19-bit mask.
    AuthorIndexClamped {
        record: usize,
        raw: i32,
        clamped: usize,
    },
    /// The header date has a month or day outside the calendar range.
    ImplausibleDate(PackedDate),
    /// A legacy feed line had too few fields and was skipped.
    SkippedLine { line: usize, fields: usize },
}

impl fmt::Display for DecodeInconsistency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::CountMismatch { item_type, declared, found } => {
                write!(f, "count mismatch for {}: declared {}, found {}", item_type, declared, found)
            }
            Self::AuthorIndexClamped { record, raw, clamped } => {
                write!(f, "author index {:#x} of record {} clamped to {}", raw, record, clamped)
            }
            Self::ImplausibleDate(date) => write!(f, "implausible last-update date {}", date),
            Self::SkippedLine { line, fields } => {
                write!(f, "line {} skipped: {} fields, need 4", line, fields)
            }
        }
    }
}
