//! Fixture builders shared by the integration tests.
//!
//! The encoders here are the inverse of the decoders under test, so the
//! tests can work with plain ids and strings instead of opaque blobs.
#![allow(dead_code)]

use avtrdb_reader::KeySchedule;
use avtrdb_reader::avtrdb::codec::{cipher::ALPHABET, crypto::STATIC_KEY};

pub const RANDOM_BYTES: [u8; 16] = [
    0x5a, 0x01, 0xc3, 0x77, 0x10, 0x9e, 0x42, 0xee, 0x08, 0x31, 0xab, 0x6d, 0xf0, 0x13, 0x2c, 0x99,
];

/// 2017-02-06
pub const DATE_2017_02_06: [u8; 2] = [0x12, 0x34];

/// 2024-12-31
pub const DATE_2024_12_31: [u8; 2] = [0x8c, 0xf8];

pub fn reversed(s: &str) -> String {
    s.chars().rev().collect()
}

/// `avtr_` + the 8-4-4-4-12 form of 32 hex digits.
pub fn avatar_id(digits: &str) -> String {
    assert_eq!(digits.len(), 32);
    format!(
        "avtr_{}-{}-{}-{}-{}",
        &digits[..8],
        &digits[8..12],
        &digits[12..16],
        &digits[16..20],
        &digits[20..]
    )
}

pub fn dynamic_key(random_bytes: &[u8; 16]) -> [u8; 16] {
    let mut key = [0u8; 16];
    for i in 0..16 {
        key[i] = random_bytes[i] ^ STATIC_KEY[i];
    }
    key
}

/// Produces the block that `schedule` unkeys back to `plain`.
pub fn encode_block(plain: &[u8; 16], key: &[u8; 16], schedule: KeySchedule) -> [u8; 16] {
    match schedule {
        KeySchedule::Simple => {
            let mut block = [0u8; 16];
            for i in 0..16 {
                block[i] = plain[i] ^ key[i];
            }
            block
        }
        KeySchedule::Feedback => {
            // Decoding reverses after the XOR chain, so the chain must yield the reversed bytes.
            let mut target = *plain;
            target.reverse();
            let mut block = [0u8; 16];
            block[0] = target[0] ^ target[15] ^ key[0];
            for i in 1..16 {
                block[i] = target[i] ^ block[i - 1] ^ key[i];
            }
            block
        }
    }
}

/// One avatar to place in a container fixture.
#[derive(Debug, Clone)]
pub struct FixtureAvatar {
    pub digits: String,
    pub name: String,
    pub description: String,
    pub author_index: i32,
}

impl FixtureAvatar {
    pub fn new(digits: &str, name: &str, description: &str, author_index: i32) -> Self {
        Self {
            digits: digits.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            author_index,
        }
    }
}

/// Builder for PAS container bytes.
#[derive(Debug, Clone)]
pub struct ContainerBuilder {
    pub platform_tag: u8,
    pub format_version: u8,
    pub declared_avatars: Option<u32>,
    pub declared_authors: Option<u32>,
    pub date: [u8; 2],
    pub flag_width: u8,
    pub random_bytes: [u8; 16],
    pub schedule: KeySchedule,
    pub authors: Vec<String>,
    pub avatars: Vec<FixtureAvatar>,
    /// Replaces the generated text block when set.
    pub text_override: Option<Vec<u8>>,
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self {
            platform_tag: 0x01,
            format_version: 0x02,
            declared_avatars: None,
            declared_authors: None,
            date: DATE_2017_02_06,
            flag_width: 1,
            random_bytes: RANDOM_BYTES,
            schedule: KeySchedule::Simple,
            authors: Vec::new(),
            avatars: Vec::new(),
            text_override: None,
        }
    }
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn author(mut self, name: &str) -> Self {
        self.authors.push(name.to_string());
        self
    }

    pub fn avatar(mut self, digits: &str, name: &str, description: &str, author_index: i32) -> Self {
        self.avatars.push(FixtureAvatar::new(digits, name, description, author_index));
        self
    }

    pub fn schedule(mut self, schedule: KeySchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn date(mut self, date: [u8; 2]) -> Self {
        self.date = date;
        self
    }

    pub fn flag_width(mut self, width: u8) -> Self {
        self.flag_width = width;
        self
    }

    pub fn declared(mut self, avatars: u32, authors: u32) -> Self {
        self.declared_avatars = Some(avatars);
        self.declared_authors = Some(authors);
        self
    }

    pub fn text(mut self, text: &[u8]) -> Self {
        self.text_override = Some(text.to_vec());
        self
    }

    pub fn header_bytes(&self) -> Vec<u8> {
        let avatars = self.avatars.len() as u32;
        let authors = self.authors.len() as u32;
        let mut out = Vec::with_capacity(36);
        out.extend_from_slice(b"PAS");
        out.push(self.platform_tag);
        out.push(self.format_version);
        out.extend_from_slice(&int24(self.declared_avatars.unwrap_or(avatars)));
        out.extend_from_slice(&int24(self.declared_authors.unwrap_or(authors)));
        out.extend_from_slice(&self.date);
        out.extend_from_slice(&int24(avatars));
        out.extend_from_slice(&int24(authors));
        out.push(self.flag_width);
        out.extend_from_slice(&self.random_bytes);
        out
    }

    pub fn build(&self) -> Vec<u8> {
        let key = dynamic_key(&self.random_bytes);
        let mut out = self.header_bytes();

        for avatar in &self.avatars {
            let mut plain = [0u8; 16];
            plain.copy_from_slice(&hex::decode(&avatar.digits).expect("fixture digits are hex"));
            out.extend_from_slice(&encode_block(&plain, &key, self.schedule));
        }
        for (i, _) in self.avatars.iter().enumerate() {
            out.extend(std::iter::repeat_n(i as u8, self.flag_width as usize));
        }
        for avatar in &self.avatars {
            out.extend_from_slice(&avatar.author_index.to_le_bytes());
        }

        match &self.text_override {
            Some(text) => out.extend_from_slice(text),
            None => {
                let authors: Vec<String> = self.authors.iter().map(|a| reversed(a)).collect();
                let avatars: Vec<String> = self
                    .avatars
                    .iter()
                    .map(|a| format!("{}\t{}", reversed(&a.name), reversed(&a.description)))
                    .collect();
                out.extend_from_slice(authors.join("\r").as_bytes());
                out.push(b'\n');
                out.extend_from_slice(avatars.join("\r").as_bytes());
            }
        }
        out
    }
}

fn int24(value: u32) -> [u8; 3] {
    let bytes = value.to_be_bytes();
    [bytes[1], bytes[2], bytes[3]]
}

/// Encodes 32 hex digits as a 22-symbol legacy token (not yet reversed).
///
/// `layout` is 0 or 2 and selects the nibble layout the decoder detects
/// from bit 3 of the last symbol.
pub fn encode_token(digits: &str, layout: u8) -> String {
    assert_eq!(digits.len(), 32);
    let mut nibbles: Vec<u8> = digits
        .chars()
        .map(|c| c.to_digit(16).expect("fixture digits are hex") as u8)
        .collect();
    nibbles.push(if layout == 2 { 8 } else { 0 });

    let mut token = String::with_capacity(22);
    for triple in nibbles.chunks_exact(3) {
        let (a, b, c) = (triple[0], triple[1], triple[2]);
        let first = if layout == 2 {
            (a << 2) | (b >> 2)
        } else {
            a | (((b >> 2) & 3) << 4)
        };
        let third = c | ((b & 3) << 4);
        token.push(ALPHABET[first as usize] as char);
        token.push(ALPHABET[third as usize] as char);
    }
    token
}

/// One line of a legacy feed, every field reversed.
pub fn legacy_line(digits: &str, layout: u8, name: &str, author: &str, description: &str) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        reversed(&encode_token(digits, layout)),
        reversed(name),
        reversed(author),
        reversed(description)
    )
}

/// A legacy feed: a metadata line followed by `lines`.
pub fn legacy_feed(lines: &[String]) -> Vec<u8> {
    let mut text = String::from("avtrdb\t2024-12-31\tmetadata");
    for line in lines {
        text.push('\n');
        text.push_str(line);
    }
    text.push('\n');
    text.into_bytes()
}

pub const ID_A: &str = "0123456789abcdef0123456789abcdef";
pub const ID_B: &str = "fedcba9876543210fedcba9876543210";
pub const ID_C: &str = "00112233445566778899aabbccddeeff";
pub const ID_D: &str = "deadbeefcafebabe0000000011111111";
