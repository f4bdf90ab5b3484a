use std::fs;
use std::marker::PhantomData;
use std::path::Path;

use log::info;

use super::format::header;
use super::types::error::Result;
use super::types::feeds::{Container, DecodedFeed, DecodedIds, FeedFormat};
use super::types::models::*;
use super::utils::ByteCursor;

/// Reader for a single catalog feed file.
///
/// Holds the file's bytes and decodes them with the format `F`:
/// [`LegacyText`](super::types::feeds::LegacyText) or [`Container`].
/// This is the only place the library touches the file system.
#[derive(Debug)]
pub struct FeedReader<F: FeedFormat> {
    data: Vec<u8>,
    pub platform: Platform,
    pub options: DecodeOptions,
    _format: PhantomData<F>,
}

impl<F: FeedFormat> FeedReader<F> {
    /// Reads a feed file from the given path.
    ///
    /// # Arguments
    /// * `path` - Path to the downloaded feed file
    /// * `platform` - Platform the feed was published for
    /// * `options` - Key schedule, static key and metadata line settings
    ///
    /// # Errors
    /// Returns an error if the file cannot be read. Format errors surface
    /// from [`decode`](Self::decode) and [`identifiers`](Self::identifiers).
    pub fn open(path: impl AsRef<Path>, platform: Platform, options: DecodeOptions) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening {} feed file: {}", F::DEBUG_NAME, path.display());
        let data = fs::read(path)?;
        Ok(Self::from_bytes(data, platform, options))
    }

    /// Wraps an already fetched buffer.
    pub fn from_bytes(data: Vec<u8>, platform: Platform, options: DecodeOptions) -> Self {
        Self {
            data,
            platform,
            options,
            _format: PhantomData,
        }
    }

    /// Size of the feed in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decodes every record of the feed.
    pub fn decode(&self) -> Result<DecodedFeed> {
        F::decode(&self.data, self.platform, &self.options)
    }

    /// Decodes only the identifiers, as for an auxiliary feed.
    pub fn identifiers(&self) -> Result<DecodedIds> {
        F::decode_ids(&self.data, self.platform, &self.options)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl FeedReader<Container> {
    /// Parses only the fixed header.
    pub fn header(&self) -> Result<ContainerHeader> {
        let mut cursor = ByteCursor::new(&self.data);
        let (header, _) = header::parse(&mut cursor, &self.options.static_key)?;
        Ok(header)
    }
}
