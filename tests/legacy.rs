mod common;

use avtrdb_reader::{AvtrdbError, DecodeInconsistency, DecodeOptions, FeedFormat, LegacyText, Platform};
use common::*;

#[test]
fn legacy_feed_decodes_reversed_fields() {
    let bytes = legacy_feed(&[
        legacy_line(ID_A, 0, "Fox", "Alice", "A red fox"),
        legacy_line(ID_B, 2, "Owl", "Bob", "Nocturnal"),
    ]);
    let feed = LegacyText::decode(&bytes, Platform::Pc, &DecodeOptions::default()).unwrap();

    assert!(feed.header.is_none());
    assert!(feed.inconsistencies.is_empty());
    assert_eq!(feed.records.len(), 2);

    let fox = &feed.records[0];
    assert_eq!(fox.id.as_str(), avatar_id(ID_A));
    assert_eq!(fox.name, "Fox");
    assert_eq!(fox.author, "Alice");
    assert_eq!(fox.description, "A red fox");
    assert!(fox.platforms.contains(&Platform::Pc));

    assert_eq!(feed.records[1].id.as_str(), avatar_id(ID_B));
    assert_eq!(feed.records[1].author, "Bob");
}

#[test]
fn metadata_line_is_never_a_record() {
    // A metadata line that happens to have four fields must still be skipped.
    let mut text = legacy_line(ID_C, 0, "Meta", "Meta", "Meta");
    text.push('\n');
    text.push_str(&legacy_line(ID_D, 0, "Real", "Someone", ""));

    let feed = LegacyText::decode(text.as_bytes(), Platform::Pc, &DecodeOptions::default()).unwrap();
    assert_eq!(feed.records.len(), 1);
    assert_eq!(feed.records[0].name, "Real");
}

#[test]
fn metadata_line_count_is_configurable() {
    let text = legacy_line(ID_C, 0, "First", "Someone", "");
    let options = DecodeOptions::default().with_skip_metadata_lines(0);
    let feed = LegacyText::decode(text.as_bytes(), Platform::Quest, &options).unwrap();
    assert_eq!(feed.records.len(), 1);
    assert_eq!(feed.records[0].id.as_str(), avatar_id(ID_C));
}

#[test]
fn short_lines_are_skipped_and_reported() {
    let bytes = legacy_feed(&[
        "only\tthree\tfields".to_string(),
        legacy_line(ID_A, 0, "Fox", "Alice", "A red fox"),
    ]);
    let feed = LegacyText::decode(&bytes, Platform::Pc, &DecodeOptions::default()).unwrap();

    assert_eq!(feed.records.len(), 1);
    assert_eq!(
        feed.inconsistencies,
        vec![DecodeInconsistency::SkippedLine { line: 2, fields: 3 }]
    );
}

#[test]
fn trailing_newline_and_carriage_returns_are_tolerated() {
    let line = legacy_line(ID_B, 2, "Owl", "Bob", "Nocturnal");
    let text = format!("meta\r\n{}\r\n", line);
    let feed = LegacyText::decode(text.as_bytes(), Platform::Pc, &DecodeOptions::default()).unwrap();
    assert_eq!(feed.records.len(), 1);
    assert_eq!(feed.records[0].description, "Nocturnal");
}

#[test]
fn extra_fields_are_ignored() {
    let line = format!("{}\textra\tfields", legacy_line(ID_A, 0, "Fox", "Alice", "A red fox"));
    let feed = LegacyText::decode(&legacy_feed(&[line]), Platform::Pc, &DecodeOptions::default()).unwrap();
    assert_eq!(feed.records[0].description, "A red fox");
}

#[test]
fn bad_token_fails_the_feed() {
    let bytes = legacy_feed(&[
        legacy_line(ID_A, 0, "Fox", "Alice", "A red fox"),
        "!!!!!!!!!!!!!!!!!!!!!!\tname\tauthor\tdesc".to_string(),
    ]);
    let err = LegacyText::decode(&bytes, Platform::Pc, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, AvtrdbError::InvalidToken { .. }));
}

#[test]
fn id_only_decode_lists_tokens_in_order() {
    let bytes = legacy_feed(&[
        legacy_line(ID_D, 2, "One", "A", ""),
        legacy_line(ID_C, 0, "Two", "B", ""),
    ]);
    let decoded = LegacyText::decode_ids(&bytes, Platform::Ios, &DecodeOptions::default()).unwrap();
    let ids: Vec<&str> = decoded.ids.iter().map(|id| id.as_str()).collect();
    assert_eq!(ids, vec![avatar_id(ID_D), avatar_id(ID_C)]);
}

#[test]
fn non_utf8_feed_is_rejected() {
    let err = LegacyText::decode(&[0xc3, 0x28], Platform::Pc, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, AvtrdbError::InvalidUtf8(_)));
}
