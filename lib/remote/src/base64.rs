//! Standard-alphabet base64 with `=` padding.

use thiserror::Error;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const PAD: u8 = b'=';

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base64Error {
    #[error("length {0} is not a multiple of 4")]
    InvalidLength(usize),
    #[error("invalid byte {byte:#04x} at offset {offset}")]
    InvalidByte { offset: usize, byte: u8 },
    #[error("misplaced padding")]
    InvalidPadding,
}

pub fn encode(input: &[u8]) -> String {
    let mut out = String::with_capacity(input.len().div_ceil(3) * 4);

    for chunk in input.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = chunk.get(1).copied().unwrap_or(0) as u32;
        let b2 = chunk.get(2).copied().unwrap_or(0) as u32;
        let n = (b0 << 16) | (b1 << 8) | b2;

        out.push(ALPHABET[(n >> 18) as usize & 63] as char);
        out.push(ALPHABET[(n >> 12) as usize & 63] as char);
        out.push(if chunk.len() > 1 {
            ALPHABET[(n >> 6) as usize & 63] as char
        } else {
            PAD as char
        });
        out.push(if chunk.len() > 2 {
            ALPHABET[n as usize & 63] as char
        } else {
            PAD as char
        });
    }

    out
}

fn value(byte: u8) -> Option<u8> {
    match byte {
        b'A'..=b'Z' => Some(byte - b'A'),
        b'a'..=b'z' => Some(byte - b'a' + 26),
        b'0'..=b'9' => Some(byte - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

/// Decode strictly: the input length must be a multiple of four and
/// padding may only close the final quantum.
pub fn decode(input: &str) -> Result<Vec<u8>, Base64Error> {
    let bytes = input.as_bytes();
    if bytes.len() % 4 != 0 {
        return Err(Base64Error::InvalidLength(bytes.len()));
    }

    let quanta = bytes.len() / 4;
    let mut out = Vec::with_capacity(quanta * 3);

    for (nth, quantum) in bytes.chunks_exact(4).enumerate() {
        let padding = if nth + 1 == quanta {
            quantum.iter().rev().take_while(|byte| **byte == PAD).count()
        } else {
            0
        };
        if padding > 2 {
            return Err(Base64Error::InvalidPadding);
        }

        let mut n = 0u32;
        for (i, &byte) in quantum[..4 - padding].iter().enumerate() {
            let sextet = value(byte).ok_or(if byte == PAD {
                Base64Error::InvalidPadding
            } else {
                Base64Error::InvalidByte {
                    offset: nth * 4 + i,
                    byte,
                }
            })?;
            n |= (sextet as u32) << (18 - 6 * i);
        }

        let decoded = [(n >> 16) as u8, (n >> 8) as u8, n as u8];
        out.extend_from_slice(&decoded[..3 - padding]);
    }

    Ok(out)
}
