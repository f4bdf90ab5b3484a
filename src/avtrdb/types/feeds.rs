//! Specialization logic for the two feed encodings (legacy text vs PAS container).

use log::info;

use super::error::Result;
use super::models::{AvatarId, AvatarRecord, ContainerHeader, DecodeInconsistency, DecodeOptions, Platform};
use crate::avtrdb::format::{content, header, legacy};
use crate::avtrdb::utils::ByteCursor;

/// Records decoded from one feed file.
#[derive(Debug, Clone)]
pub struct DecodedFeed {
    pub platform: Platform,
    /// Present for containers only.
    pub header: Option<ContainerHeader>,
    pub records: Vec<AvatarRecord>,
    pub inconsistencies: Vec<DecodeInconsistency>,
}

/// Identifiers decoded from one feed file, without record tables.
#[derive(Debug, Clone)]
pub struct DecodedIds {
    pub platform: Platform,
    pub header: Option<ContainerHeader>,
    pub ids: Vec<AvatarId>,
    pub inconsistencies: Vec<DecodeInconsistency>,
}

/// A trait that defines how a specific feed encoding is decoded.
///
/// Both encodings produce the same record shape; nothing is shared between
/// their parsers.
pub trait FeedFormat {
    /// A short name used for debugging and logging.
    const DEBUG_NAME: &'static str;

    /// Decodes every record of a feed buffer.
    fn decode(bytes: &[u8], platform: Platform, options: &DecodeOptions) -> Result<DecodedFeed>;

    /// Decodes only the identifiers of a feed buffer.
    fn decode_ids(bytes: &[u8], platform: Platform, options: &DecodeOptions) -> Result<DecodedIds>;
}

/// Zero-cost marker struct for the legacy tab-delimited text feed.
#[derive(Debug)]
pub struct LegacyText;

impl FeedFormat for LegacyText {
    const DEBUG_NAME: &'static str = "legacy text";

    fn decode(bytes: &[u8], platform: Platform, options: &DecodeOptions) -> Result<DecodedFeed> {
        let text = String::from_utf8(bytes.to_vec())?;
        let (records, inconsistencies) = legacy::parse(&text, options.skip_metadata_lines, platform)?;
        info!("Decoded {} {} records from {} feed", records.len(), platform, Self::DEBUG_NAME);
        Ok(DecodedFeed {
            platform,
            header: None,
            records,
            inconsistencies,
        })
    }

    fn decode_ids(bytes: &[u8], platform: Platform, options: &DecodeOptions) -> Result<DecodedIds> {
        // Legacy lines carry no separable id column; decode them in full.
        let feed = Self::decode(bytes, platform, options)?;
        Ok(DecodedIds {
            platform,
            header: None,
            ids: feed.records.into_iter().map(|record| record.id).collect(),
            inconsistencies: feed.inconsistencies,
        })
    }
}

/// Zero-cost marker struct for the binary PAS container.
#[derive(Debug)]
pub struct Container;

impl FeedFormat for Container {
    const DEBUG_NAME: &'static str = "PAS container";

    fn decode(bytes: &[u8], platform: Platform, options: &DecodeOptions) -> Result<DecodedFeed> {
        let mut cursor = ByteCursor::new(bytes);
        let (header, mut inconsistencies) = header::parse(&mut cursor, &options.static_key)?;
        let body = content::read_body(&mut cursor, &header)?;
        let (records, table_inconsistencies) =
            content::assemble_records(&header, &body, options.key_schedule, platform)?;
        inconsistencies.extend(table_inconsistencies);

        info!("Decoded {} {} records from {}", records.len(), platform, Self::DEBUG_NAME);
        Ok(DecodedFeed {
            platform,
            header: Some(header),
            records,
            inconsistencies,
        })
    }

    fn decode_ids(bytes: &[u8], platform: Platform, options: &DecodeOptions) -> Result<DecodedIds> {
        let mut cursor = ByteCursor::new(bytes);
        let (header, inconsistencies) = header::parse(&mut cursor, &options.static_key)?;
        let id_blocks = content::read_id_blocks(&mut cursor, &header)?;
        let ids = content::decode_ids(id_blocks, &header, options.key_schedule);

        info!("Decoded {} {} identifiers from {}", ids.len(), platform, Self::DEBUG_NAME);
        Ok(DecodedIds {
            platform,
            header: Some(header),
            ids,
            inconsistencies,
        })
    }
}

/// A feed buffer tagged with its encoding, as handed over by the fetch layer.
#[derive(Debug, Clone)]
pub enum SourceFeed {
    LegacyText(Vec<u8>),
    Container(Vec<u8>),
}

impl SourceFeed {
    pub fn format_name(&self) -> &'static str {
        match self {
            Self::LegacyText(_) => LegacyText::DEBUG_NAME,
            Self::Container(_) => Container::DEBUG_NAME,
        }
    }

    pub fn decode(&self, platform: Platform, options: &DecodeOptions) -> Result<DecodedFeed> {
        match self {
            Self::LegacyText(bytes) => LegacyText::decode(bytes, platform, options),
            Self::Container(bytes) => Container::decode(bytes, platform, options),
        }
    }

    pub fn decode_ids(&self, platform: Platform, options: &DecodeOptions) -> Result<DecodedIds> {
        match self {
            Self::LegacyText(bytes) => LegacyText::decode_ids(bytes, platform, options),
            Self::Container(bytes) => Container::decode_ids(bytes, platform, options),
        }
    }
}
