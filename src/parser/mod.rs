//! # DCPU-16 Parser
//!
//! Parses a token stream into source lines: label definitions, `.ORG`/
//! `.DAT` directive effects, and instructions with their operands.
//!
//! ## Architecture
//!
//! Conceptually two passes — resolve labels, then encode — implemented
//! in one pass with deferred resolution: every operand that names a
//! label gets a shared handle (see `labels.rs`) up front, and the
//! handle's `pc` is filled in whenever that name's definition is
//! reached, whether that's before or after the reference. The parser
//! also tracks the assembly program counter directly as it walks lines,
//! so there is no separate first-pass stage the way the model project's
//! `.ORIG`/`.END`-delimited LC-3 grammar needs one.

#[macro_use]
mod macros;
pub mod ast;
pub mod labels;

#[cfg(test)]
mod tests;

use crate::error::{AsmError, AsmWarning, ErrorKind, Span};
use crate::lexer::token::{Token, TokenKind};
use ast::{
    uses_next_word, DatItem, Instruction, LineContent, NonBasicOp, Opcode, OffsetValue, Operand,
    RegisterOperand, SourceLine,
};
use labels::LabelTable;

pub struct ParseResult {
    pub lines: Vec<SourceLine>,
    pub labels: LabelTable,
    pub errors: Vec<AsmError>,
    pub warnings: Vec<AsmWarning>,
}

#[must_use]
pub fn parse_program(tokens: &[Token], paranoid: bool) -> ParseResult {
    let mut lines = Vec::new();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut labels = LabelTable::new();
    let mut pc: u32 = 0;

    let mut line_start = 0;
    let mut line_number = 1;

    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Newline => {
                process_line(
                    &tokens[line_start..i],
                    line_number,
                    &mut pc,
                    &mut labels,
                    &mut lines,
                    &mut errors,
                    &mut warnings,
                    paranoid,
                );
                line_start = i + 1;
                line_number += 1;
            }
            TokenKind::Eof => {
                process_line(
                    &tokens[line_start..i],
                    line_number,
                    &mut pc,
                    &mut labels,
                    &mut lines,
                    &mut errors,
                    &mut warnings,
                    paranoid,
                );
                break;
            }
            _ => {}
        }
    }

    ParseResult {
        lines,
        labels,
        errors,
        warnings,
    }
}

fn line_span(tokens: &[Token], line_number: usize) -> Span {
    tokens
        .first()
        .map(|t| t.span)
        .unwrap_or_else(|| Span::line_only(line_number))
}

#[allow(clippy::too_many_arguments)]
fn process_line(
    tokens: &[Token],
    line_number: usize,
    pc: &mut u32,
    labels: &mut LabelTable,
    lines: &mut Vec<SourceLine>,
    errors: &mut Vec<AsmError>,
    warnings: &mut Vec<AsmWarning>,
    paranoid: bool,
) {
    let span = line_span(tokens, line_number);
    let refs: Vec<&Token> = tokens.iter().collect();

    let mut idx = 0;
    let mut label_handles = Vec::new();

    while idx + 1 < refs.len() && matches!(refs[idx].kind, TokenKind::Colon) {
        match &refs[idx + 1].kind {
            TokenKind::Identifier(name) => {
                if let Err(old_pc) = labels.define(name, *pc as u16) {
                    errors.push(AsmError::duplicate_label(name, old_pc, refs[idx + 1].span));
                }
                label_handles.push(labels.lookup_or_create(name));
                idx += 2;
            }
            _ => {
                errors.push(AsmError::new(
                    ErrorKind::UnexpectedToken,
                    "expected a label name after ':'",
                    refs[idx].span,
                ));
                idx += 1;
                break;
            }
        }
    }

    let content_tokens = &refs[idx..];

    if content_tokens.is_empty() {
        lines.push(SourceLine {
            labels: label_handles,
            content: LineContent::Empty,
            line_number,
            span,
        });
        return;
    }

    let first = content_tokens[0];
    let fallback_span = content_tokens.last().map_or(first.span, |t| t.span);
    let mut lp = LineParser::new(&content_tokens[1..], labels, fallback_span);

    let result: Result<LineContent, AsmError> = match &first.kind {
        TokenKind::DirOrg => parse_org(&mut lp, first.span),
        TokenKind::DirDat => parse_dat(&mut lp, *pc, first.span),
        kind if kind.is_basic_opcode() => {
            let op = Opcode::Basic(basic_op_from_token!(kind));
            parse_instruction(&mut lp, op, line_number, *pc, first.span).map(LineContent::Instruction)
        }
        TokenKind::OpJsr => {
            let op = Opcode::NonBasic(NonBasicOp::Jsr);
            parse_instruction(&mut lp, op, line_number, *pc, first.span).map(LineContent::Instruction)
        }
        _ => Err(AsmError::new(
            ErrorKind::UnexpectedToken,
            format!("expected an instruction or directive, found '{}'", first.lexeme),
            first.span,
        )),
    };

    match result {
        Ok(LineContent::Org(new_pc)) => {
            if paranoid && (new_pc as u32) < *pc {
                warnings.push(AsmWarning::new(
                    format!(
                        "'.ORG 0x{new_pc:04X}' moves the assembly address backward from 0x{:04X}",
                        *pc
                    ),
                    first.span,
                ));
            }
            *pc = new_pc as u32;
            lines.push(SourceLine {
                labels: label_handles,
                content: LineContent::Org(new_pc),
                line_number,
                span,
            });
        }
        Ok(LineContent::Dat { pc: dat_pc, items }) => {
            let word_count: u32 = items
                .iter()
                .map(|item| match item {
                    DatItem::Word(_) => 1,
                    DatItem::String(s) => s.chars().count() as u32,
                })
                .sum();
            lines.push(SourceLine {
                labels: label_handles,
                content: LineContent::Dat { pc: dat_pc, items },
                line_number,
                span,
            });
            *pc += word_count;
        }
        Ok(LineContent::Instruction(instr)) => {
            let len = 1
                + uses_next_word(&instr.a) as u32
                + instr.b.as_ref().map_or(0, |b| uses_next_word(b) as u32);
            lines.push(SourceLine {
                labels: label_handles,
                content: LineContent::Instruction(instr),
                line_number,
                span,
            });
            *pc += len;
        }
        Ok(LineContent::Empty) => {
            lines.push(SourceLine {
                labels: label_handles,
                content: LineContent::Empty,
                line_number,
                span,
            });
        }
        Err(err) => {
            errors.push(err);
            lines.push(SourceLine {
                labels: label_handles,
                content: LineContent::Empty,
                line_number,
                span,
            });
        }
    }
}

/// Walks the tokens after the directive/mnemonic on one line.
struct LineParser<'a> {
    tokens: &'a [&'a Token],
    pos: usize,
    labels: &'a mut LabelTable,
    fallback_span: Span,
}

impl<'a> LineParser<'a> {
    fn new(tokens: &'a [&'a Token], labels: &'a mut LabelTable, fallback_span: Span) -> Self {
        Self {
            tokens,
            pos: 0,
            labels,
            fallback_span,
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect_comma(&mut self) -> Result<(), AsmError> {
        match self.advance() {
            Some(t) if matches!(t.kind, TokenKind::Comma) => Ok(()),
            Some(t) => Err(AsmError::new(
                ErrorKind::ExpectedComma,
                "expected ',' between operands",
                t.span,
            )),
            None => Err(AsmError::new(
                ErrorKind::TooFewOperands,
                "expected a second operand",
                self.fallback_span,
            )),
        }
    }

    fn expect_rbracket(&mut self) -> Result<(), AsmError> {
        match self.advance() {
            Some(t) if matches!(t.kind, TokenKind::RBracket) => Ok(()),
            Some(t) => Err(AsmError::new(ErrorKind::ExpectedCloseBracket, "expected ']'", t.span)),
            None => Err(AsmError::new(
                ErrorKind::ExpectedCloseBracket,
                "expected ']'",
                self.fallback_span,
            )),
        }
    }

    fn expect_general_register(&mut self) -> Result<u8, AsmError> {
        match self.advance() {
            Some(t) => match t.kind {
                TokenKind::Register(idx) => Ok(idx),
                _ => Err(AsmError::new(
                    ErrorKind::ExpectedRegister,
                    "expected a general-purpose register A-J",
                    t.span,
                )),
            },
            None => Err(AsmError::new(
                ErrorKind::ExpectedRegister,
                "expected a general-purpose register A-J",
                self.fallback_span,
            )),
        }
    }

    fn ensure_no_extra(&mut self) -> Result<(), AsmError> {
        match self.peek() {
            Some(t) => Err(AsmError::new(
                ErrorKind::TooManyOperands,
                "unexpected token after operand",
                t.span,
            )),
            None => Ok(()),
        }
    }
}

fn parse_operand(lp: &mut LineParser) -> Result<Operand, AsmError> {
    let tok = match lp.peek() {
        Some(t) => t,
        None => {
            return Err(AsmError::new(
                ErrorKind::TooFewOperands,
                "expected an operand",
                lp.fallback_span,
            ))
        }
    };

    match &tok.kind {
        TokenKind::LBracket => {
            lp.advance();
            let operand = parse_bracket_inner(lp)?;
            lp.expect_rbracket()?;
            Ok(operand)
        }
        TokenKind::Register(idx) => {
            let idx = *idx;
            lp.advance();
            Ok(Operand::Register(RegisterOperand::General(idx), ast::Addressing::Immediate))
        }
        TokenKind::Pop => {
            lp.advance();
            Ok(Operand::Register(RegisterOperand::Pop, ast::Addressing::Immediate))
        }
        TokenKind::Peek => {
            lp.advance();
            Ok(Operand::Register(RegisterOperand::Peek, ast::Addressing::Immediate))
        }
        TokenKind::Push => {
            lp.advance();
            Ok(Operand::Register(RegisterOperand::Push, ast::Addressing::Immediate))
        }
        TokenKind::RegSp => {
            lp.advance();
            Ok(Operand::Register(RegisterOperand::Sp, ast::Addressing::Immediate))
        }
        TokenKind::RegPc => {
            lp.advance();
            Ok(Operand::Register(RegisterOperand::Pc, ast::Addressing::Immediate))
        }
        TokenKind::RegO => {
            lp.advance();
            Ok(Operand::Register(RegisterOperand::O, ast::Addressing::Immediate))
        }
        TokenKind::Number(n) => {
            let n = *n;
            lp.advance();
            Ok(Operand::Literal(n, ast::Addressing::Immediate))
        }
        TokenKind::Identifier(name) => {
            let name = name.clone();
            lp.advance();
            let handle = lp.labels.lookup_or_create(&name);
            Ok(Operand::Label(handle, ast::Addressing::Immediate))
        }
        _ => Err(AsmError::new(
            ErrorKind::ExpectedOperand,
            format!("unexpected token '{}' where an operand was expected", tok.lexeme),
            tok.span,
        )),
    }
}

fn parse_bracket_inner(lp: &mut LineParser) -> Result<Operand, AsmError> {
    let tok = match lp.peek() {
        Some(t) => t,
        None => {
            return Err(AsmError::new(
                ErrorKind::InvalidOperandShape,
                "empty '[' ']'",
                lp.fallback_span,
            ))
        }
    };

    match &tok.kind {
        TokenKind::Register(idx) => {
            let base = *idx;
            lp.advance();
            if matches!(lp.peek().map(|t| &t.kind), Some(TokenKind::Plus)) {
                lp.advance();
                let offset = parse_offset_value(lp)?;
                Ok(Operand::RegisterOffset { base, offset })
            } else {
                Ok(Operand::Register(RegisterOperand::General(base), ast::Addressing::Reference))
            }
        }
        TokenKind::Number(n) => {
            let n = *n;
            lp.advance();
            if matches!(lp.peek().map(|t| &t.kind), Some(TokenKind::Plus)) {
                lp.advance();
                let base = lp.expect_general_register()?;
                Ok(Operand::RegisterOffset {
                    base,
                    offset: OffsetValue::Literal(n),
                })
            } else {
                Ok(Operand::Literal(n, ast::Addressing::Reference))
            }
        }
        TokenKind::Identifier(name) => {
            let name = name.clone();
            lp.advance();
            if matches!(lp.peek().map(|t| &t.kind), Some(TokenKind::Plus)) {
                lp.advance();
                let base = lp.expect_general_register()?;
                let handle = lp.labels.lookup_or_create(&name);
                Ok(Operand::RegisterOffset {
                    base,
                    offset: OffsetValue::Label(handle),
                })
            } else {
                let handle = lp.labels.lookup_or_create(&name);
                Ok(Operand::Label(handle, ast::Addressing::Reference))
            }
        }
        _ => Err(AsmError::new(
            ErrorKind::InvalidOperandShape,
            "invalid operand inside '[' ']'",
            tok.span,
        )),
    }
}

fn parse_offset_value(lp: &mut LineParser) -> Result<OffsetValue, AsmError> {
    match lp.advance() {
        Some(t) => match &t.kind {
            TokenKind::Number(n) => Ok(OffsetValue::Literal(*n)),
            TokenKind::Identifier(name) => Ok(OffsetValue::Label(lp.labels.lookup_or_create(name))),
            _ => Err(AsmError::new(
                ErrorKind::InvalidOperandShape,
                "expected a number or label after '+'",
                t.span,
            )),
        },
        None => Err(AsmError::new(
            ErrorKind::InvalidOperandShape,
            "expected a number or label after '+'",
            lp.fallback_span,
        )),
    }
}

fn parse_instruction(
    lp: &mut LineParser,
    op: Opcode,
    line_number: usize,
    pc: u32,
    span: Span,
) -> Result<Instruction, AsmError> {
    let a = parse_operand(lp)?;
    let b = match op {
        Opcode::NonBasic(_) => None,
        Opcode::Basic(_) => {
            lp.expect_comma()?;
            Some(parse_operand(lp)?)
        }
    };
    lp.ensure_no_extra()?;
    Ok(Instruction {
        pc: pc as u16,
        line: line_number as u32,
        op,
        a,
        b,
        span,
    })
}

fn parse_org(lp: &mut LineParser, directive_span: Span) -> Result<LineContent, AsmError> {
    let tok = lp.advance().ok_or_else(|| {
        AsmError::new(
            ErrorKind::TooFewOperands,
            "'.ORG' requires a numeric address",
            directive_span,
        )
    })?;
    let value = match tok.kind {
        TokenKind::Number(n) => n,
        _ => {
            return Err(AsmError::new(
                ErrorKind::ExpectedOperand,
                "'.ORG' requires a numeric address",
                tok.span,
            ))
        }
    };
    lp.ensure_no_extra()?;
    Ok(LineContent::Org(value))
}

fn parse_dat(lp: &mut LineParser, pc: u32, directive_span: Span) -> Result<LineContent, AsmError> {
    let mut items = Vec::new();
    loop {
        let tok = lp.advance().ok_or_else(|| {
            AsmError::new(
                ErrorKind::TooFewOperands,
                "'.DAT' requires at least one item",
                directive_span,
            )
        })?;
        match &tok.kind {
            TokenKind::Number(n) => items.push(DatItem::Word(*n)),
            TokenKind::StringLiteral(s) => items.push(DatItem::String(s.clone())),
            _ => {
                return Err(AsmError::new(
                    ErrorKind::InvalidDatItem,
                    "'.DAT' items must be numbers or strings",
                    tok.span,
                ))
            }
        }
        match lp.peek() {
            Some(t) if matches!(t.kind, TokenKind::Comma) => {
                lp.advance();
            }
            Some(t) => {
                return Err(AsmError::new(
                    ErrorKind::UnexpectedToken,
                    "expected ',' between '.DAT' items",
                    t.span,
                ))
            }
            None => break,
        }
    }
    Ok(LineContent::Dat {
        pc: pc as u16,
        items,
    })
}
