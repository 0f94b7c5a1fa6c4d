//! Token obfuscation used by the redirect pages.
//!
//! Tokens are JSON wrapped in three base64 layers with a ROT13 pass between
//! the second and third. Some pages skip the rotation, so decoding falls back
//! to plain double base64.

use crate::resolver::{Result, ResolverError};
use base64::{
    Engine, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig, general_purpose::STANDARD},
};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Standard alphabet, tolerant of missing padding and stray trailing bits
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decode base64, ignoring ASCII whitespace
pub fn base64_decode(input: impl AsRef<[u8]>) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = input
        .as_ref()
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    LENIENT
        .decode(cleaned)
        .map_err(|e| ResolverError::Decode(format!("base64: {e}")))
}

/// Decode base64 into a UTF-8 string
pub fn base64_decode_str(input: impl AsRef<[u8]>) -> Result<String> {
    let bytes = base64_decode(input)?;
    String::from_utf8(bytes).map_err(|e| ResolverError::Decode(format!("utf-8: {e}")))
}

/// Single base64 layer, used for the `?re=` query token
pub fn encode_token(value: &str) -> String {
    STANDARD.encode(value)
}

/// Rotate ASCII letters by 13, preserving case
pub fn rot13(input: &str) -> String {
    input.chars().map(rotate_char).collect()
}

fn rotate_char(c: char) -> char {
    match c {
        'A'..='Z' => (((c as u8 - b'A' + 13) % 26) + b'A') as char,
        'a'..='z' => (((c as u8 - b'a' + 13) % 26) + b'a') as char,
        _ => c,
    }
}

fn rotate_bytes(input: &[u8]) -> Vec<u8> {
    input
        .iter()
        .map(|&b| match b {
            b'A'..=b'Z' => ((b - b'A' + 13) % 26) + b'A',
            b'a'..=b'z' => ((b - b'a' + 13) % 26) + b'a',
            _ => b,
        })
        .collect()
}

/// One base64 layer followed by a single letter rotation.
///
/// Wrapping the output in two more base64 layers yields a token that
/// [`decode_token`] accepts.
pub fn obfuscate(value: &[u8]) -> String {
    rot13(&STANDARD.encode(value))
}

/// Reverse the page obfuscation and parse the JSON payload.
pub fn decode_token<T: DeserializeOwned>(encoded: &str) -> Result<T> {
    match decode_rotated(encoded) {
        Ok(value) => Ok(value),
        Err(primary) => {
            debug!("Rotated decode failed ({primary}), trying plain double base64");
            decode_plain(encoded).map_err(|fallback| {
                ResolverError::Decode(format!("{primary}; fallback: {fallback}"))
            })
        }
    }
}

fn decode_rotated<T: DeserializeOwned>(encoded: &str) -> Result<T> {
    let once = base64_decode(encoded)?;
    let twice = base64_decode(once)?;
    let rotated = rotate_bytes(&twice);
    let json = base64_decode(rotated)?;
    parse_json(&json)
}

fn decode_plain<T: DeserializeOwned>(encoded: &str) -> Result<T> {
    let once = base64_decode(encoded)?;
    let json = base64_decode(once)?;
    parse_json(&json)
}

fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| ResolverError::Decode(format!("json: {e}")))
}
