//! # Hex dump interchange format
//!
//! A portable text encoding of the 64 KiW RAM image: rows of 8 words,
//! with consecutive byte-identical rows collapsed into a single `*`
//! marker line (the final row is always written literally, so a
//! reader can always find the end of the image).
//!
//! Endianness only affects how a word's two bytes are ordered within its
//! four printed hex digits; `write_hexdump` and `read_hexdump` agree on
//! the convention so that `read_hexdump(write_hexdump(mem, e), e) == mem`
//! for either endianness.
//!
//! Grounded on `common/hexdump.c`'s `write_hexdump`/`read_hexdump` — no
//! Rust source in the retrieved corpus implements this interchange
//! format, so the original C is the direct behavioral reference.

use crate::error::{AsmError, ErrorKind, Span};
use crate::encoder::RAM_WORDS;

const ROW_WORDS: usize = 8;

fn swap_bytes(word: u16) -> u16 {
    word.rotate_left(8)
}

/// Serializes `image` into the row/duplicate-marker text format.
#[must_use]
pub fn write_hexdump(image: &[u16; RAM_WORDS], big_endian: bool) -> String {
    let mut out = String::new();
    let mut last_row: Option<[u16; ROW_WORDS]> = None;
    let mut skipping = false;

    let mut offset = 0usize;
    while offset < RAM_WORDS {
        let mut row = [0u16; ROW_WORDS];
        row.copy_from_slice(&image[offset..offset + ROW_WORDS]);
        let is_final_row = RAM_WORDS - offset <= ROW_WORDS;

        if !is_final_row && last_row == Some(row) {
            if !skipping {
                out.push_str("*\n");
                skipping = true;
            }
            offset += ROW_WORDS;
            continue;
        }

        skipping = false;
        out.push_str(&format!("{offset:04X}:"));
        for word in row {
            let printed = if big_endian { word } else { swap_bytes(word) };
            out.push_str(&format!(" {printed:04X}"));
        }
        out.push('\n');
        last_row = Some(row);
        offset += ROW_WORDS;
    }

    out
}

/// Parses the row/duplicate-marker text format back into a RAM image.
pub fn read_hexdump(text: &str, big_endian: bool) -> Result<Box<[u16; RAM_WORDS]>, AsmError> {
    let mut mem = Box::new([0u16; RAM_WORDS]);
    let mut last_row = [0u16; ROW_WORDS];
    let mut last_offset: Option<usize> = None;
    let mut pending_repeat = false;

    for (line_no, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        let span = Span::line_only(line_no + 1);

        if line.starts_with('*') {
            pending_repeat = true;
            continue;
        }

        let (offset_str, rest) = line.split_once(':').ok_or_else(|| {
            AsmError::new(ErrorKind::InvalidHexDigit, format!("malformed row '{line}'"), span)
        })?;
        let offset = usize::from_str_radix(offset_str.trim(), 16).map_err(|_| {
            AsmError::new(
                ErrorKind::InvalidHexDigit,
                format!("invalid offset '{offset_str}'"),
                span,
            )
        })?;

        if pending_repeat {
            let prev = last_offset.ok_or_else(|| {
                AsmError::new(ErrorKind::DuplicateRowWithoutPrior, "'*' with no prior row", span)
            })?;
            if offset > RAM_WORDS {
                return Err(AsmError::new(
                    ErrorKind::NonMonotonicOffset,
                    format!("offset x{offset:04X} exceeds the image size"),
                    span,
                ));
            }
            let mut fill = prev + ROW_WORDS;
            let mut cycle = 0usize;
            while fill < offset {
                mem[fill] = last_row[cycle % ROW_WORDS];
                fill += 1;
                cycle += 1;
            }
            pending_repeat = false;
        } else {
            let expected = last_offset.map_or(0, |prev| prev + ROW_WORDS);
            if offset != expected {
                return Err(AsmError::new(
                    ErrorKind::NonMonotonicOffset,
                    format!("offset x{offset:04X} is out of sequence"),
                    span,
                ));
            }
        }

        let mut row = [0u16; ROW_WORDS];
        for (slot, token) in rest.split_whitespace().take(ROW_WORDS).enumerate() {
            let parsed = u32::from_str_radix(token, 16).map_err(|_| {
                AsmError::new(
                    ErrorKind::InvalidHexDigit,
                    format!("invalid hex word '{token}'"),
                    span,
                )
            })?;
            if parsed > 0xFFFF {
                return Err(AsmError::new(
                    ErrorKind::ValueExceedsWord,
                    format!("word '{token}' exceeds 0xFFFF"),
                    span,
                ));
            }
            let value = if big_endian {
                parsed as u16
            } else {
                swap_bytes(parsed as u16)
            };
            row[slot] = value;
            if offset + slot < RAM_WORDS {
                mem[offset + slot] = value;
            }
        }
        last_row = row;
        last_offset = Some(offset);
    }

    Ok(mem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_sparse_image_big_endian() {
        let mut image = Box::new([0u16; RAM_WORDS]);
        image[0] = 0x7C01;
        image[1] = 0x1234;
        image[RAM_WORDS - 1] = 0xBEEF;
        let text = write_hexdump(&image, true);
        let back = read_hexdump(&text, true).unwrap();
        assert_eq!(*back, *image);
    }

    #[test]
    fn round_trips_little_endian() {
        let mut image = Box::new([0u16; RAM_WORDS]);
        image[3] = 0xABCD;
        let text = write_hexdump(&image, false);
        assert!(text.contains("CDAB"));
        let back = read_hexdump(&text, false).unwrap();
        assert_eq!(*back, *image);
    }

    #[test]
    fn all_zero_image_writes_first_row_marker_and_final_row() {
        let image = Box::new([0u16; RAM_WORDS]);
        let text = write_hexdump(&image, true);
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("0000:"));
        assert_eq!(lines.next().unwrap(), "*");
        let last = text.lines().last().unwrap();
        assert!(last.starts_with("FFF8:"));
    }

    #[test]
    fn star_without_prior_row_is_an_error() {
        let err = read_hexdump("*\n0000: 0001 0000 0000 0000 0000 0000 0000 0000\n", true)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateRowWithoutPrior);
    }

    #[test]
    fn out_of_sequence_offset_is_an_error() {
        let err = read_hexdump("0008: 0 0 0 0 0 0 0 0\n", true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NonMonotonicOffset);
    }

    #[test]
    fn overflowing_word_is_an_error() {
        let err = read_hexdump("0000: 10000 0 0 0 0 0 0 0\n", true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValueExceedsWord);
    }

    #[test]
    fn repeat_marker_followed_by_an_out_of_range_offset_is_an_error() {
        let text = "0000: 0001 0000 0000 0000 0000 0000 0000 0000\n*\n10008: 0 0 0 0 0 0 0 0\n";
        let err = read_hexdump(text, true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NonMonotonicOffset);
    }
}
