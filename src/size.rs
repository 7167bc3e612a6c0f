//! Size arguments with binary unit suffixes.

use crate::error::{CopyError, Result};

/// Parse `<digits>[K|M|G]` (case-insensitive, powers of 1024) into a byte count.
///
/// Zero is rejected: every size this crate takes is a block size or a block count.
pub fn parse_size(text: &str) -> Result<u64> {
    let invalid = |why: &str| CopyError::InvalidConfiguration(format!("invalid size '{text}': {why}"));

    let digits_end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (digits, suffix) = text.split_at(digits_end);
    if digits.is_empty() {
        return Err(invalid("expected a number"));
    }

    let shift = match suffix {
        "" => 0,
        "k" | "K" => 10,
        "m" | "M" => 20,
        "g" | "G" => 30,
        _ => return Err(invalid("unknown unit, expected K, M or G")),
    };

    let value: u64 = digits.parse().map_err(|_| invalid("number too large"))?;
    let bytes = value
        .checked_mul(1u64 << shift)
        .ok_or_else(|| invalid("number too large"))?;
    if bytes == 0 {
        return Err(invalid("must be greater than zero"));
    }
    Ok(bytes)
}

/// [`parse_size`] narrowed to an in-memory buffer length.
pub fn parse_block_size(text: &str) -> Result<usize> {
    let bytes = parse_size(text)?;
    usize::try_from(bytes).map_err(|_| {
        CopyError::InvalidConfiguration(format!("block size '{text}' does not fit in memory"))
    })
}
