//! ISBN-10 and ISBN-13 checksum validation.
//!
//! Both checks are total over `&str`: any length, any characters, no panics.
//! Callers that accept user input should strip separators first (see
//! `FieldValidator::to_isbn`); these functions treat a hyphen like any other
//! invalid character.

/// Returns `true` when `s` is a well-formed ISBN-10.
///
/// Positions 0–8 must be ASCII digits; position 9 may also be `X` (either
/// case), which stands for the check value 10. The weighted sum
/// `Σ value[i] × (10 − i)` must be divisible by 11.
pub fn is_valid_isbn10(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 10 {
        return false;
    }

    let mut sum = 0u32;
    for (i, &b) in bytes.iter().enumerate() {
        let value = match b {
            b'0'..=b'9' => u32::from(b - b'0'),
            b'X' | b'x' if i == 9 => 10,
            _ => return false,
        };
        sum += value * (10 - i as u32);
    }
    sum % 11 == 0
}

/// Returns `true` when `s` is a well-formed ISBN-13.
///
/// Exactly 13 ASCII digits. The first twelve are weighted 1, 3, 1, 3, …;
/// the thirteenth must equal `(10 − sum mod 10) mod 10`.
pub fn is_valid_isbn13(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 13 || !bytes.iter().all(u8::is_ascii_digit) {
        return false;
    }

    let sum: u32 = bytes[..12]
        .iter()
        .enumerate()
        .map(|(i, &b)| {
            let digit = u32::from(b - b'0');
            if i % 2 == 0 {
                digit
            } else {
                digit * 3
            }
        })
        .sum();
    let check = (10 - sum % 10) % 10;
    check == u32::from(bytes[12] - b'0')
}

/// Returns `true` when `s` passes either checksum.
pub fn is_valid_isbn(s: &str) -> bool {
    is_valid_isbn10(s) || is_valid_isbn13(s)
}
