//! Opcode tables and operand-field formatting shared by the CPU core and
//! the disassembler.
//!
//! Mirrors `dcpu16_asm::parser::ast`'s `BasicOp`/`NonBasicOp` encodings,
//! but works on raw `u16` fields rather than a parsed AST, since the CPU
//! and disassembler both operate on already-assembled words, not source.

use dcpu16_asm::lexer::token::REGISTER_NAMES;

/// Opcode-extension value for `JSR` in a non-basic word's `a` field.
pub const EXT_JSR: u16 = 0x01;

pub fn is_conditional(op: u16) -> bool {
    matches!(op, 0xC..=0xF)
}

pub fn basic_mnemonic(op: u16) -> &'static str {
    match op {
        0x1 => "SET",
        0x2 => "ADD",
        0x3 => "SUB",
        0x4 => "MUL",
        0x5 => "DIV",
        0x6 => "MOD",
        0x7 => "SHL",
        0x8 => "SHR",
        0x9 => "AND",
        0xA => "BOR",
        0xB => "XOR",
        0xC => "IFE",
        0xD => "IFN",
        0xE => "IFG",
        0xF => "IFB",
        _ => "DAT",
    }
}

pub fn nonbasic_mnemonic(opcode_ext: u16) -> &'static str {
    match opcode_ext {
        EXT_JSR => "JSR",
        _ => "RESERVED",
    }
}

/// Whether decoding operand field `field` consumes a following word —
/// used by the CPU (to advance `pc`) and the disassembler (to know how
/// many words a formatted operand spans).
pub fn field_uses_next_word(field: u16) -> bool {
    matches!(field, 0x10..=0x17 | 0x1E | 0x1F)
}

/// Formats a 6-bit operand field as assembly text. `next_word`, if the
/// field needs one, is the word immediately following the instruction
/// (and any earlier operand's next word).
pub fn format_operand(field: u16, next_word: Option<u16>) -> String {
    match field {
        0x00..=0x07 => REGISTER_NAMES[field as usize].to_string(),
        0x08..=0x0F => format!("[{}]", REGISTER_NAMES[(field - 0x08) as usize]),
        0x10..=0x17 => format!(
            "[{} + {:#06x}]",
            REGISTER_NAMES[(field - 0x10) as usize],
            next_word.unwrap_or(0)
        ),
        0x18 => "POP".to_string(),
        0x19 => "PEEK".to_string(),
        0x1A => "PUSH".to_string(),
        0x1B => "SP".to_string(),
        0x1C => "PC".to_string(),
        0x1D => "O".to_string(),
        0x1E => format!("[{:#06x}]", next_word.unwrap_or(0)),
        0x1F => format!("{:#06x}", next_word.unwrap_or(0)),
        0x20..=0x3F => format!("{:#04x}", field - 0x20),
        _ => "???".to_string(),
    }
}

/// One decoded instruction, produced for `-d`/`--disassemble`.
pub struct Decoded {
    pub address: u16,
    pub words: u16,
    pub text: String,
}

/// Walks `image[start..end)`, decoding instructions without executing
/// them. Each step advances by however many words the instruction and
/// its operands occupy, exactly mirroring the CPU's own fetch order.
///
/// Takes plain `usize` bounds rather than `u16` addresses: the image is
/// 65536 words long, a count that itself overflows `u16`, so indexing
/// stays in `usize` and only the per-instruction `address` is narrowed
/// back to `u16` for display.
pub fn disassemble(image: &[u16], start: usize, end: usize) -> Vec<Decoded> {
    let mut out = Vec::new();
    let mut cursor = start;

    let mut fetch = |cursor: &mut usize| -> u16 {
        let word = image[*cursor];
        *cursor += 1;
        word
    };

    while cursor < end {
        let address = cursor;
        let word = fetch(&mut cursor);
        let op = word & 0xF;
        let a_field = (word >> 4) & 0x3F;
        let b_field = (word >> 10) & 0x3F;

        let text = if op == 0 {
            let operand_next = field_uses_next_word(b_field).then(|| fetch(&mut cursor));
            format!(
                "{} {}",
                nonbasic_mnemonic(a_field),
                format_operand(b_field, operand_next)
            )
        } else {
            let a_next = field_uses_next_word(a_field).then(|| fetch(&mut cursor));
            let b_next = field_uses_next_word(b_field).then(|| fetch(&mut cursor));
            format!(
                "{} {}, {}",
                basic_mnemonic(op),
                format_operand(a_field, a_next),
                format_operand(b_field, b_next)
            )
        };

        out.push(Decoded {
            address: address as u16,
            words: (cursor - address) as u16,
            text,
        });
    }

    out
}
