//! Legacy delimited-text feed parsing.
//!
//! One metadata line, then one avatar per line:
//! ```text
//! token \t name \t author \t description [\t ...]
//! ```
//! Every field, the token included, is stored reversed.

use log::{debug, warn};

use crate::avtrdb::codec::cipher;
use crate::avtrdb::types::error::Result;
use crate::avtrdb::types::models::{AvatarRecord, DecodeInconsistency, Platform};
use crate::avtrdb::utils::unreverse;

/// Minimum number of tab-separated fields in a usable line.
pub const MIN_FIELDS: usize = 4;

/// Decodes all records of a legacy feed.
///
/// Lines with fewer than [`MIN_FIELDS`] fields are skipped and reported.
/// A token that does not decode fails the whole feed.
pub fn parse(
    text: &str,
    skip_metadata_lines: usize,
    platform: Platform,
) -> Result<(Vec<AvatarRecord>, Vec<DecodeInconsistency>)> {
    let mut records = Vec::new();
    let mut inconsistencies = Vec::new();

    for (line_no, line) in text.lines().enumerate().skip(skip_metadata_lines) {
        // Tabs are field separators, so an empty trailing field must survive the trim.
        let line = line.trim_matches(|c: char| c.is_whitespace() && c != '\t');
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < MIN_FIELDS {
            let skipped = DecodeInconsistency::SkippedLine {
                line: line_no + 1,
                fields: fields.len(),
            };
            warn!("Legacy feed ({}): {}", platform, skipped);
            inconsistencies.push(skipped);
            continue;
        }

        let id = cipher::decode_token(&unreverse(fields[0]))?;
        records.push(AvatarRecord::new(
            id,
            unreverse(fields[1]),
            unreverse(fields[2]),
            unreverse(fields[3]),
            platform,
        ));
    }

    debug!(
        "Legacy feed ({}): {} records, {} lines skipped",
        platform,
        records.len(),
        inconsistencies.len()
    );
    Ok((records, inconsistencies))
}
