use super::error::DecodeError;

/// Map one character onto its 5-bit RFC 4648 value.
///
/// Lowercase letters are folded to uppercase first, so `"jbsw"` and `"JBSW"`
/// decode identically. The digits `0`, `1` and `8` are read as `O`, `L` and
/// `B`, which is how they are usually mistyped from a printed secret.
fn char_value(c: char) -> Option<u8> {
    let c = match c.to_ascii_uppercase() {
        '0' => 'O',
        '1' => 'L',
        '8' => 'B',
        other => other,
    };
    match c {
        'A'..='Z' => Some(c as u8 - b'A'),
        '2'..='7' => Some(c as u8 - b'2' + 26),
        _ => None,
    }
}

/// Decode a human-entered Base32 secret into key bytes.
///
/// Whitespace and `-` are skipped wherever they appear. Any other character
/// outside the alphabet fails the whole decode.
///
/// The output is sized from the raw input length (`len * 5 / 8`); bytes that
/// the valid characters do not fill stay zero.
pub fn decode_base32(input: &str) -> Result<Vec<u8>, DecodeError> {
    let mut bytes = vec![0u8; input.len() * 5 / 8];
    let mut index = 0;
    let mut bits: u32 = 0;
    let mut bit_count: u32 = 0;

    for (position, c) in input.chars().enumerate() {
        if c.is_whitespace() || c == '-' {
            continue;
        }
        let value = char_value(c).ok_or(DecodeError {
            character: c,
            position,
        })?;

        bits = (bits << 5) | u32::from(value);
        bit_count += 5;
        if bit_count >= 8 {
            bit_count -= 8;
            bytes[index] = (bits >> bit_count) as u8;
            bits &= (1 << bit_count) - 1;
            index += 1;
        }
    }

    Ok(bytes)
}
