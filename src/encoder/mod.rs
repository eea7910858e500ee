//! DCPU-16 Machine Code Encoder
//!
//! Converts a parsed program into the 64 KiW RAM image described by the
//! basic/non-basic word layouts and the operand value table.
//!
//! ## Word layout
//!
//! - Basic: bits `[3:0]=opcode`, `[9:4]=a`, `[15:10]=b`.
//! - Non-basic: bits `[3:0]=0`, `[9:4]=opcode_ext`, `[15:10]=a`.
//!
//! Operand resolution may append zero or one extra word; a two-operand
//! instruction where both operands need one emits them in `a`-before-`b`
//! order, matching the CPU's own resolution order.

use crate::error::{AsmError, AsmWarning, Span};
use crate::parser::ast::{
    Addressing, BasicOp, DatItem, Instruction, LineContent, Opcode, Operand, OffsetValue,
    RegisterOperand, SourceLine,
};
use crate::parser::ParseResult;

pub const RAM_WORDS: usize = 0x1_0000;

pub struct EncodeResult {
    pub image: Box<[u16; RAM_WORDS]>,
    pub errors: Vec<AsmError>,
    pub warnings: Vec<AsmWarning>,
}

#[must_use]
pub fn encode(parsed: &ParseResult, paranoid: bool) -> EncodeResult {
    let mut encoder = Encoder {
        image: Box::new([0u16; RAM_WORDS]),
        errors: Vec::new(),
        warnings: Vec::new(),
        paranoid,
    };
    for line in &parsed.lines {
        encoder.encode_line(line);
    }
    EncodeResult {
        image: encoder.image,
        errors: encoder.errors,
        warnings: encoder.warnings,
    }
}

/// A resolved operand: its 6-bit field value, and the extra word it needs
/// in the image (if any).
struct Resolved {
    value: u16,
    next_word: Option<u16>,
}

struct Encoder {
    image: Box<[u16; RAM_WORDS]>,
    errors: Vec<AsmError>,
    warnings: Vec<AsmWarning>,
    paranoid: bool,
}

impl Encoder {
    fn store(&mut self, addr: u16, word: u16) {
        self.image[addr as usize] = word;
    }

    fn encode_line(&mut self, line: &SourceLine) {
        match &line.content {
            LineContent::Empty | LineContent::Org(_) => {}
            LineContent::Dat { pc, items } => self.encode_dat(*pc, items),
            LineContent::Instruction(instr) => self.encode_instruction(instr),
        }
    }

    fn encode_dat(&mut self, pc: u16, items: &[DatItem]) {
        let mut addr = pc;
        for item in items {
            match item {
                DatItem::Word(w) => {
                    self.store(addr, *w);
                    addr = addr.wrapping_add(1);
                }
                DatItem::String(s) => {
                    for ch in s.chars() {
                        self.store(addr, ch as u16);
                        addr = addr.wrapping_add(1);
                    }
                }
            }
        }
    }

    fn encode_instruction(&mut self, instr: &Instruction) {
        let a = self.resolve_operand(&instr.a, instr.span);
        let b = instr.b.as_ref().map(|b| self.resolve_operand(b, instr.span));

        let word = match instr.op {
            Opcode::Basic(op) => {
                let b_value = b.as_ref().map_or(0, |r| r.value);
                op.encoding() | (a.value << 4) | (b_value << 10)
            }
            Opcode::NonBasic(op) => (op.encoding() << 4) | (a.value << 10),
        };

        let mut addr = instr.pc;
        self.store(addr, word);
        addr = addr.wrapping_add(1);
        if let Some(next) = a.next_word {
            self.store(addr, next);
            addr = addr.wrapping_add(1);
        }
        if let Some(next) = b.as_ref().and_then(|r| r.next_word) {
            self.store(addr, next);
        }

        if self.paranoid {
            self.check_warnings(instr, &a);
        }
    }

    fn check_warnings(&mut self, instr: &Instruction, a: &Resolved) {
        let Opcode::Basic(op) = instr.op else {
            return;
        };
        if matches!(op, BasicOp::Div | BasicOp::Mod) {
            if let Some(Operand::Literal(0, Addressing::Immediate)) = &instr.b {
                self.warnings.push(AsmWarning::new(
                    format!("{op:?} by an immediate zero always yields zero"),
                    instr.span,
                ));
            }
        }
        if !op.is_conditional() && is_literal_form(a.value) {
            self.warnings.push(AsmWarning::new(
                "write to a literal destination is silently discarded",
                instr.span,
            ));
        }
    }

    fn resolve_operand(&mut self, operand: &Operand, span: Span) -> Resolved {
        match operand {
            Operand::Register(reg, addressing) => resolve_register(*reg, *addressing),
            Operand::Literal(n, Addressing::Reference) => Resolved {
                value: 0x1E,
                next_word: Some(*n),
            },
            Operand::Literal(n, Addressing::Immediate) => {
                if *n > 0x1f {
                    Resolved {
                        value: 0x1F,
                        next_word: Some(*n),
                    }
                } else {
                    Resolved {
                        value: 0x20 + *n,
                        next_word: None,
                    }
                }
            }
            Operand::Label(handle, addressing) => {
                let label = handle.borrow();
                if !label.defined {
                    self.errors.push(AsmError::undefined_label(&label.name, span));
                }
                let pc = label.pc;
                if self.paranoid && *addressing == Addressing::Immediate && pc <= 0x1f {
                    self.warnings.push(AsmWarning::new(
                        format!(
                            "label '{}' resolves to x{pc:04X}, still encoded as a next-word literal",
                            label.name
                        ),
                        span,
                    ));
                }
                let value = match addressing {
                    Addressing::Reference => 0x1E,
                    Addressing::Immediate => 0x1F,
                };
                Resolved {
                    value,
                    next_word: Some(pc),
                }
            }
            Operand::RegisterOffset { base, offset } => {
                let next = match offset {
                    OffsetValue::Literal(n) => *n,
                    OffsetValue::Label(handle) => {
                        let label = handle.borrow();
                        if !label.defined {
                            self.errors.push(AsmError::undefined_label(&label.name, span));
                        }
                        label.pc
                    }
                };
                Resolved {
                    value: 0x10 + *base as u16,
                    next_word: Some(next),
                }
            }
        }
    }
}

fn resolve_register(reg: RegisterOperand, addressing: Addressing) -> Resolved {
    let value = match reg {
        RegisterOperand::General(n) => {
            let base = n as u16;
            match addressing {
                Addressing::Immediate => base,
                Addressing::Reference => 0x08 + base,
            }
        }
        RegisterOperand::Pop => 0x18,
        RegisterOperand::Peek => 0x19,
        RegisterOperand::Push => 0x1A,
        RegisterOperand::Sp => 0x1B,
        RegisterOperand::Pc => 0x1C,
        RegisterOperand::O => 0x1D,
    };
    Resolved {
        value,
        next_word: None,
    }
}

fn is_literal_form(value: u16) -> bool {
    value == 0x1F || (0x20..=0x3F).contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse_program;

    fn encode_source(src: &str) -> EncodeResult {
        let lexed = tokenize(src);
        assert!(lexed.errors.is_empty(), "lex errors: {:?}", lexed.errors);
        let parsed = parse_program(&lexed.tokens, false);
        assert!(parsed.errors.is_empty(), "parse errors: {:?}", parsed.errors);
        encode(&parsed, false)
    }

    #[test]
    fn small_literal_is_inlined_into_one_word() {
        let result = encode_source("SET A, 0x1e\n");
        assert!(result.errors.is_empty());
        // op=SET(1), a=register A immediate(0), b=small literal 0x1e -> 0x20+0x1e=0x3e
        assert_eq!(result.image[0], 0x1 | (0 << 4) | (0x3E << 10));
        assert_eq!(result.image[1], 0);
    }

    #[test]
    fn next_word_literal_uses_two_words() {
        let result = encode_source("SET A, 0x1234\n");
        assert!(result.errors.is_empty());
        assert_eq!(result.image[0], 0x1 | (0 << 4) | (0x1F << 10));
        assert_eq!(result.image[1], 0x1234);
    }

    #[test]
    fn jsr_encodes_as_non_basic() {
        let result = encode_source(":target SET A, 1\nJSR target\n");
        assert!(result.errors.is_empty());
        let jsr_word = result.image[1];
        assert_eq!(jsr_word & 0xF, 0);
        assert_eq!((jsr_word >> 4) & 0x3F, 0x01);
        assert_eq!((jsr_word >> 10) & 0x3F, 0x1F);
        assert_eq!(result.image[2], 0); // target resolves to pc 0
    }

    #[test]
    fn undefined_label_is_a_fatal_error() {
        let result = encode_source("SET A, nowhere\n");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, crate::error::ErrorKind::UndefinedLabel);
    }

    #[test]
    fn dat_string_emits_one_word_per_char() {
        let result = encode_source(".DAT \"Hi\"\n");
        assert!(result.errors.is_empty());
        assert_eq!(result.image[0], 'H' as u16);
        assert_eq!(result.image[1], 'i' as u16);
    }

    #[test]
    fn register_offset_stores_index_word() {
        let result = encode_source("SET [A+4], B\n");
        assert!(result.errors.is_empty());
        assert_eq!(result.image[0] & 0xF, BasicOp::Set.encoding());
        assert_eq!((result.image[0] >> 4) & 0x3F, 0x10); // [A + next word]
        assert_eq!(result.image[1], 4);
    }

    #[test]
    fn div_by_immediate_zero_warns_in_paranoid_mode() {
        let lexed = tokenize("DIV A, 0\n");
        let parsed = parse_program(&lexed.tokens, true);
        let result = encode(&parsed, true);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn literal_destination_warns_in_paranoid_mode() {
        let lexed = tokenize("SET 5, A\n");
        let parsed = parse_program(&lexed.tokens, true);
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        let result = encode(&parsed, true);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn conditional_does_not_warn_on_literal_a() {
        let lexed = tokenize("IFE 5, A\n");
        let parsed = parse_program(&lexed.tokens, true);
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        let result = encode(&parsed, true);
        assert!(result.warnings.is_empty());
    }
}
