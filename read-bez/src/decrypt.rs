//! Decoding of encrypted bez buffers.
//!
//! Glyph programs may be stored hex encoded and encrypted with the same
//! rolling cipher used for PostScript charstrings, preceded by a few bytes
//! of random lead-in. [`decode`] detects such buffers and returns the plain
//! text; plain buffers are passed through untouched.

use std::borrow::Cow;

/// Key for the eexec style encryption used by bez buffers.
pub const EEXEC_KEY: u32 = 85294471;

/// Key for charstring encryption.
pub const CHARSTRING_KEY: u32 = 6492394;

/// Number of random lead-in bytes preceding the plain text.
pub const LEN_IV: usize = 4;

const C1: u32 = 1069928045;
const C2: u32 = 226908351;

/// Returns the plain text of a possibly encrypted bez buffer.
///
/// A buffer is treated as encrypted when it begins with four hex digits
/// (after any leading whitespace) and holds nothing but hex digits and
/// whitespace. Anything else is plain text.
pub fn decode(data: &[u8]) -> Cow<'_, [u8]> {
    if is_encrypted(data) {
        Cow::Owned(
            decrypt(decode_hex(data.iter().copied()), EEXEC_KEY)
                // First bytes are random lead-in
                .skip(LEN_IV)
                .collect(),
        )
    } else {
        Cow::Borrowed(data)
    }
}

/// Returns true if the buffer looks like hex encoded cipher text.
pub fn is_encrypted(data: &[u8]) -> bool {
    let start = data
        .iter()
        .position(|b| !is_whitespace(*b))
        .unwrap_or(data.len());
    data.get(start..start + 4)
        .is_some_and(|lead| lead.iter().all(|b| b.is_ascii_hexdigit()))
        && data[start..]
            .iter()
            .all(|b| b.is_ascii_hexdigit() || is_whitespace(*b))
}

/// Returns an iterator yielding the decrypted bytes.
pub fn decrypt(bytes: impl Iterator<Item = u8>, mut key: u32) -> impl Iterator<Item = u8> {
    bytes.map(move |b| {
        let plain = b ^ (key >> 24) as u8;
        key = next_key(b, key);
        plain
    })
}

/// Returns an iterator yielding the encrypted bytes.
///
/// This is the inverse of [`decrypt`] for the same key.
pub fn encrypt(bytes: impl Iterator<Item = u8>, mut key: u32) -> impl Iterator<Item = u8> {
    bytes.map(move |b| {
        let cipher = b ^ (key >> 24) as u8;
        key = next_key(cipher, key);
        cipher
    })
}

fn next_key(cipher: u8, key: u32) -> u32 {
    (cipher as u32)
        .wrapping_add(key)
        .wrapping_mul(C1)
        .wrapping_add(C2)
}

/// Decodes a sequence of hex digit pairs, skipping whitespace.
///
/// Decoding stops at the first byte that is neither whitespace nor a hex
/// digit. A trailing odd digit is padded with zero.
pub fn decode_hex(mut bytes: impl Iterator<Item = u8>) -> impl Iterator<Item = u8> {
    let mut pad = 0x1_u32;
    core::iter::from_fn(move || {
        for c in bytes.by_ref() {
            if is_whitespace(c) {
                continue;
            }
            let Some(digit) = (c as char).to_digit(16) else {
                break;
            };
            pad = (pad << 4) | digit;
            if pad & 0x100 != 0 {
                let res = pad as u8;
                pad = 0x1;
                return Some(res);
            }
        }
        if pad != 0x1 {
            let res = (pad << 4) as u8;
            pad = 0x1;
            return Some(res);
        }
        None
    })
}

pub(crate) fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\n' | b'\r' | b'\t' | b'\0' | 0x0C)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_decode_ignores_whitespace() {
        let decoded = decode_hex(b"743F 84\n13\tF3".iter().copied()).collect::<Vec<_>>();
        assert_eq!(decoded, [0x74, 0x3f, 0x84, 0x13, 0xf3]);
    }

    #[test]
    fn hex_decode_odd_and_truncated() {
        let decoded = decode_hex(b"743".iter().copied()).collect::<Vec<_>>();
        assert_eq!(decoded, [0x74, 0x30]);
        let decoded = decode_hex(b"74zz3F".iter().copied()).collect::<Vec<_>>();
        assert_eq!(decoded, [0x74]);
    }

    #[test]
    fn encrypt_then_decrypt() {
        let plain = b"% A\nsc 0 0 mt ed";
        let cipher = encrypt(plain.iter().copied(), CHARSTRING_KEY).collect::<Vec<_>>();
        assert_ne!(&cipher[..], &plain[..]);
        let back = decrypt(cipher.into_iter(), CHARSTRING_KEY).collect::<Vec<_>>();
        assert_eq!(&back[..], &plain[..]);
    }

    #[test]
    fn decode_encrypted_buffer() {
        let plain = b"% A\nsc 0 0 mt 10 0 rdt cp ed\n";
        let hex = encode_for_test(plain);
        assert!(is_encrypted(hex.as_bytes()));
        assert_eq!(&decode(hex.as_bytes())[..], &plain[..]);
    }

    #[test]
    fn plain_buffer_is_borrowed() {
        let plain = b"% A\nsc 0 0 mt ed\n";
        assert!(!is_encrypted(plain));
        assert!(matches!(decode(plain), Cow::Borrowed(_)));
        assert!(!is_encrypted(b"  ed"));
        assert!(!is_encrypted(b""));
    }

    #[test]
    fn leading_number_is_plain() {
        let plain = b"1000 0 mt 0 100 rdt -10 0 rdt cp ed\n";
        assert!(!is_encrypted(plain));
        assert!(matches!(decode(plain), Cow::Borrowed(_)));
    }

    fn encode_for_test(plain: &[u8]) -> String {
        let lead_in = [0x12, 0x34, 0x56, 0x78];
        encrypt(lead_in.iter().chain(plain).copied(), EEXEC_KEY)
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .chunks(32)
            .map(|line| line.concat())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
