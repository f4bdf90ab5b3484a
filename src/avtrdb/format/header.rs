//! PAS container header parsing and dynamic key derivation.
//!
//! # Header Structure
//! ```text
//! [3 bytes]  Magic "PAS"
//! [1 byte]   Platform tag
//! [1 byte]   Format version
//! [3 bytes]  Declared avatar count (big-endian)
//! [3 bytes]  Declared author count (big-endian)
//! [2 bytes]  Packed last-update date
//! [3 bytes]  Avatars in this file (big-endian)
//! [3 bytes]  Authors in this file (big-endian)
//! [1 byte]   Flag width per record
//! [16 bytes] Random key material
//! ```

use log::{debug, info, trace, warn};

use crate::avtrdb::codec::crypto;
use crate::avtrdb::types::{
    error::{AvtrdbError, Result},
    models::{ContainerHeader, DecodeInconsistency, PackedDate},
};
use crate::avtrdb::utils::ByteCursor;

/// Container signature.
pub const MAGIC: &[u8; 3] = b"PAS";

/// Parses the container header from the start of the cursor.
///
/// Returns the header together with the non-fatal inconsistencies found in
/// it (declared vs per-file counts, implausible date).
pub fn parse(
    cursor: &mut ByteCursor<'_>,
    static_key: &[u8; 16],
) -> Result<(ContainerHeader, Vec<DecodeInconsistency>)> {
    trace!("Parsing container header ({} bytes available)", cursor.remaining());

    // Step 1: Signature
    let magic: [u8; 3] = cursor.read_array()?;
    if &magic != MAGIC {
        return Err(AvtrdbError::BadMagic { found: magic });
    }

    // Step 2: Opaque platform/version pair
    let [platform_tag, format_version] = cursor.read_array::<2>()?;

    // Step 3: Catalog-wide declared totals
    let declared_avatar_count = cursor.read_int24()?;
    let declared_author_count = cursor.read_int24()?;

    // Step 4: Last update
    let last_update = PackedDate::from_packed(cursor.read_array()?);

    // Step 5: Per-file counts
    let file_avatar_count = cursor.read_int24()?;
    let file_author_count = cursor.read_int24()?;

    // Step 6: Flag width
    let flag_width = cursor.read_byte()?;

    // Step 7 + 8: Key material
    let random_bytes: [u8; 16] = cursor.read_array()?;
    let dynamic_key = crypto::derive_dynamic_key(&random_bytes, static_key);

    debug!(
        "Container header: platform_tag={:#04x}, version={}, declared=({} avatars, {} authors), file=({} avatars, {} authors), flag_width={}",
        platform_tag,
        format_version,
        declared_avatar_count,
        declared_author_count,
        file_avatar_count,
        file_author_count,
        flag_width
    );

    let header = ContainerHeader {
        platform_tag,
        format_version,
        declared_avatar_count,
        declared_author_count,
        last_update,
        file_avatar_count,
        file_author_count,
        flag_width,
        dynamic_key,
    };

    let inconsistencies = check(&header);
    for inconsistency in &inconsistencies {
        warn!("Container header: {}", inconsistency);
    }

    info!(
        "Header parsed successfully: last_update={}, avatars={}, authors={}",
        header.last_update, header.file_avatar_count, header.file_author_count
    );

    Ok((header, inconsistencies))
}

/// Compares the declared totals with the per-file counts and sanity-checks the date.
fn check(header: &ContainerHeader) -> Vec<DecodeInconsistency> {
    let mut found = Vec::new();
    if header.declared_avatar_count != header.file_avatar_count {
        found.push(DecodeInconsistency::CountMismatch {
            item_type: "avatars in header",
            declared: header.declared_avatar_count as u64,
            found: header.file_avatar_count as u64,
        });
    }
    if header.declared_author_count != header.file_author_count {
        found.push(DecodeInconsistency::CountMismatch {
            item_type: "authors in header",
            declared: header.declared_author_count as u64,
            found: header.file_author_count as u64,
        });
    }
    if !header.last_update.is_plausible() {
        found.push(DecodeInconsistency::ImplausibleDate(header.last_update));
    }
    found
}
