mod common;

use avtrdb_reader::avtrdb::codec::cipher::{self, ALPHABET, TOKEN_LEN};
use avtrdb_reader::avtrdb::codec::crypto::{self, STATIC_KEY};
use avtrdb_reader::{AvatarId, AvtrdbError, KeySchedule};
use common::*;
use proptest::prelude::*;

#[test]
fn token_with_layout_zero_decodes_known_value() {
    let id = cipher::decode_token(&"fg".repeat(11)).unwrap();
    assert_eq!(id.as_str(), "avtr_f10f10f1-0f10-f10f-10f1-0f10f10f10f1");
}

#[test]
fn token_with_layout_two_decodes_known_value() {
    let id = cipher::decode_token(&"A8".repeat(11)).unwrap();
    assert_eq!(id.as_str(), "avtr_90890890-8908-9089-0890-890890890890");
}

#[test]
fn all_zero_token_is_the_nil_uuid() {
    let id = cipher::decode_token(&"0".repeat(TOKEN_LEN)).unwrap();
    assert_eq!(id.as_str(), "avtr_00000000-0000-0000-0000-000000000000");
}

#[test]
fn decoded_tokens_are_hyphenated_lowercase_uuids() {
    for digits in [ID_A, ID_B, ID_C, ID_D] {
        for layout in [0, 2] {
            let id = cipher::decode_token(&encode_token(digits, layout)).unwrap();
            assert_eq!(id.as_str(), avatar_id(digits));
            assert_eq!(id.as_str().len(), 41);
            let uuid = id.uuid();
            for position in AvatarId::HYPHEN_POSITIONS {
                assert_eq!(uuid.as_bytes()[position], b'-');
            }
            assert!(AvatarId::parse(id.as_str()).is_ok());
        }
    }
}

#[test]
fn token_decoding_is_deterministic() {
    let token = encode_token(ID_D, 2);
    assert_eq!(cipher::decode_token(&token).unwrap(), cipher::decode_token(&token).unwrap());
}

#[test]
fn symbols_past_the_token_length_are_ignored() {
    let token = encode_token(ID_C, 0);
    let longer = format!("{}zz", token);
    assert_eq!(cipher::decode_token(&longer).unwrap(), cipher::decode_token(&token).unwrap());
}

#[test]
fn short_token_is_rejected() {
    let err = cipher::decode_token("0123456789").unwrap_err();
    assert!(matches!(err, AvtrdbError::InvalidToken { .. }));
}

#[test]
fn symbol_outside_the_alphabet_is_rejected() {
    let mut token = encode_token(ID_A, 0);
    token.replace_range(5..6, "_");
    let err = cipher::decode_token(&token).unwrap_err();
    assert!(matches!(err, AvtrdbError::InvalidToken { .. }));
}

#[test]
fn alphabet_starts_with_hex_digits() {
    assert_eq!(&ALPHABET[..16], b"0123456789abcdef");
    assert_eq!(ALPHABET.len(), 64);
}

#[test]
fn block_equal_to_key_decodes_to_nil_uuid() {
    let id = crypto::decode_block(&STATIC_KEY, &STATIC_KEY, KeySchedule::Simple);
    assert_eq!(id.as_str(), "avtr_00000000-0000-0000-0000-000000000000");
}

#[test]
fn dynamic_key_is_random_bytes_xor_static_key() {
    let key = crypto::derive_dynamic_key(&RANDOM_BYTES, &STATIC_KEY);
    assert_eq!(key, dynamic_key(&RANDOM_BYTES));
    assert_eq!(crypto::derive_dynamic_key(&[0u8; 16], &STATIC_KEY), STATIC_KEY);
}

#[test]
fn feedback_chain_wraps_through_rewritten_last_byte() {
    let mut block = [0u8; 16];
    block[0] = 1;
    crypto::xor_feedback(&mut block, &[0u8; 16]);

    let mut expected = [0u8; 16];
    expected[0] = 1;
    expected[1] = 1;
    assert_eq!(block, expected);
}

#[test]
fn feedback_output_is_reversed() {
    let mut block = [0u8; 16];
    block[0] = 1;
    let id = crypto::decode_block(&block, &[0u8; 16], KeySchedule::Feedback);
    assert_eq!(id.as_str(), "avtr_00000000-0000-0000-0000-000000000101");
}

#[test]
fn feedback_decodes_encoded_block() {
    let key = dynamic_key(&RANDOM_BYTES);
    let mut plain = [0u8; 16];
    plain.copy_from_slice(&hex::decode(ID_D).unwrap());

    let block = encode_block(&plain, &key, KeySchedule::Feedback);
    let id = crypto::decode_block(&block, &key, KeySchedule::Feedback);
    assert_eq!(id.as_str(), avatar_id(ID_D));
}

#[test]
fn schedules_disagree_on_the_same_block() {
    let key = dynamic_key(&RANDOM_BYTES);
    let block = [0x42u8; 16];
    assert_ne!(
        crypto::decode_block(&block, &key, KeySchedule::Simple),
        crypto::decode_block(&block, &key, KeySchedule::Feedback)
    );
}

proptest! {
    #[test]
    fn xor_simple_is_self_inverse(block in any::<[u8; 16]>(), key in any::<[u8; 16]>()) {
        prop_assert_eq!(crypto::xor_simple(&crypto::xor_simple(&block, &key), &key), block);
    }

    #[test]
    fn legacy_layouts_agree(digits in "[0-9a-f]{32}") {
        let zero = cipher::decode_token(&encode_token(&digits, 0)).unwrap();
        let two = cipher::decode_token(&encode_token(&digits, 2)).unwrap();
        prop_assert_eq!(zero.as_str(), avatar_id(&digits));
        prop_assert_eq!(two, zero);
    }

    #[test]
    fn both_schedules_recover_the_plain_id(plain in any::<[u8; 16]>(), random in any::<[u8; 16]>()) {
        let key = dynamic_key(&random);
        let expected = avatar_id(&hex::encode(plain));
        for schedule in [KeySchedule::Simple, KeySchedule::Feedback] {
            let block = encode_block(&plain, &key, schedule);
            let decoded = crypto::decode_block(&block, &key, schedule);
            prop_assert_eq!(decoded.as_str(), expected.as_str());
        }
    }
}
