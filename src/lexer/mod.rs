//! # DCPU-16 Lexer
//!
//! Tokenizes DCPU-16 assembly source into a stream of tokens.
//!
//! ## Token priority
//!
//! 1. Single-character punctuation (`[ ] , : +`)
//! 2. Double-quoted string literals with escapes `\" \\ \t \r`
//! 3. Directives `.ORG`/`.DAT` (also accepted bare, as `ORG`/`DAT`)
//! 4. Mnemonic keywords, case-insensitive, maximal-munch (so `SETX` lexes
//!    as one identifier, never as `SET` followed by `X`)
//! 5. Register names `A B C X Y Z I J`, only when the identifier is
//!    exactly one character long
//! 6. Multi-character identifiers (case-sensitive — unlike mnemonics and
//!    directives, which are matched case-insensitively)
//! 7. Numeric literals, `0x`-prefixed hex or plain decimal
//!
//! End-of-line and NUL both yield `Newline`.

pub mod cursor;
pub mod token;


use crate::error::{AsmError, AsmWarning, ErrorKind, Span};
use cursor::Cursor;
use token::{Token, TokenKind, REGISTER_NAMES};

pub struct LexResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<AsmError>,
    pub warnings: Vec<AsmWarning>,
}

fn process_escape_char(esc: char) -> Option<char> {
    match esc {
        '"' => Some('"'),
        '\\' => Some('\\'),
        't' => Some('\t'),
        'r' => Some('\r'),
        _ => None,
    }
}

#[must_use]
pub fn tokenize(source: &str) -> LexResult {
    let mut cursor = Cursor::new(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    while !cursor.is_at_end() {
        match lex_token(&mut cursor, &mut warnings) {
            Ok(Some(token)) => tokens.push(token),
            Ok(None) => {}
            Err(err) => errors.push(err),
        }
    }

    let (l, c) = cursor.current_pos();
    tokens.push(Token {
        kind: TokenKind::Eof,
        lexeme: String::new(),
        span: Span::new(l, c),
    });

    LexResult {
        tokens,
        errors,
        warnings,
    }
}

fn lex_token(
    cursor: &mut Cursor,
    warnings: &mut Vec<AsmWarning>,
) -> Result<Option<Token>, AsmError> {
    while matches!(cursor.peek(), Some(' ' | '\t')) {
        cursor.advance();
    }

    if cursor.is_at_end() {
        return Ok(None);
    }

    let (sl, sc) = cursor.current_pos();
    let ch = cursor.peek().unwrap();

    match ch {
        '\n' | '\0' => {
            cursor.advance();
            Ok(Some(Token {
                kind: TokenKind::Newline,
                lexeme: "\n".into(),
                span: cursor.make_span(sl, sc),
            }))
        }
        '\r' => {
            cursor.advance();
            if cursor.peek() == Some('\n') {
                cursor.advance();
            }
            Ok(Some(Token {
                kind: TokenKind::Newline,
                lexeme: "\n".into(),
                span: cursor.make_span(sl, sc),
            }))
        }
        ';' => {
            while let Some(c) = cursor.peek() {
                if c == '\n' || c == '\r' {
                    break;
                }
                cursor.advance();
            }
            Ok(None)
        }
        '[' => single(cursor, sl, sc, TokenKind::LBracket, "["),
        ']' => single(cursor, sl, sc, TokenKind::RBracket, "]"),
        ',' => single(cursor, sl, sc, TokenKind::Comma, ","),
        ':' => single(cursor, sl, sc, TokenKind::Colon, ":"),
        '+' => single(cursor, sl, sc, TokenKind::Plus, "+"),
        '"' => lex_string(cursor, sl, sc),
        c if c.is_ascii_digit() => lex_number(cursor, sl, sc, warnings),
        c if c.is_ascii_alphabetic() || c == '_' || c == '.' => lex_word(cursor, sl, sc),
        _ => {
            cursor.advance();
            Err(AsmError::new(
                ErrorKind::UnexpectedCharacter,
                format!("unexpected character '{ch}'"),
                cursor.make_span(sl, sc),
            ))
        }
    }
}

fn single(
    cursor: &mut Cursor,
    sl: usize,
    sc: usize,
    kind: TokenKind,
    lexeme: &str,
) -> Result<Option<Token>, AsmError> {
    cursor.advance();
    Ok(Some(Token {
        kind,
        lexeme: lexeme.into(),
        span: cursor.make_span(sl, sc),
    }))
}

fn lex_string(cursor: &mut Cursor, sl: usize, sc: usize) -> Result<Option<Token>, AsmError> {
    cursor.advance(); // opening quote
    let mut processed = String::new();

    loop {
        if cursor.is_at_end() {
            return Err(AsmError::new(
                ErrorKind::UnterminatedString,
                "unterminated string literal",
                cursor.make_span(sl, sc),
            ));
        }
        let ch = cursor.peek().unwrap();
        if ch == '\n' || ch == '\r' {
            return Err(AsmError::new(
                ErrorKind::UnterminatedString,
                "unterminated string literal",
                cursor.make_span(sl, sc),
            ));
        }
        if ch == '"' {
            cursor.advance();
            break;
        }
        if ch == '\\' {
            cursor.advance();
            let esc = cursor.peek().ok_or_else(|| {
                AsmError::new(
                    ErrorKind::UnterminatedString,
                    "unterminated string literal",
                    cursor.make_span(sl, sc),
                )
            })?;
            match process_escape_char(esc) {
                Some(mapped) => {
                    processed.push(mapped);
                    cursor.advance();
                }
                None => {
                    return Err(AsmError::new(
                        ErrorKind::InvalidEscapeSequence,
                        format!("invalid escape sequence '\\{esc}'"),
                        cursor.make_span(sl, sc),
                    ));
                }
            }
        } else {
            processed.push(cursor.advance().unwrap());
        }
    }

    Ok(Some(Token {
        kind: TokenKind::StringLiteral(processed.clone()),
        lexeme: processed,
        span: cursor.make_span(sl, sc),
    }))
}

fn lex_number(
    cursor: &mut Cursor,
    sl: usize,
    sc: usize,
    warnings: &mut Vec<AsmWarning>,
) -> Result<Option<Token>, AsmError> {
    let mut raw = String::new();
    let is_hex = cursor.peek() == Some('0') && matches!(cursor.peek_at(1), Some('x' | 'X'));

    let value: u32 = if is_hex {
        raw.push(cursor.advance().unwrap()); // '0'
        raw.push(cursor.advance().unwrap()); // 'x'/'X'
        let mut digits = String::new();
        while matches!(cursor.peek(), Some(c) if c.is_ascii_hexdigit()) {
            let c = cursor.advance().unwrap();
            digits.push(c);
            raw.push(c);
        }
        if digits.is_empty() {
            return Err(AsmError::new(
                ErrorKind::InvalidNumericLiteral,
                "expected hex digits after '0x'",
                cursor.make_span(sl, sc),
            ));
        }
        u32::from_str_radix(&digits, 16).map_err(|_| {
            AsmError::new(
                ErrorKind::InvalidNumericLiteral,
                format!("invalid hex literal '{raw}'"),
                cursor.make_span(sl, sc),
            )
        })?
    } else {
        while matches!(cursor.peek(), Some(c) if c.is_ascii_digit()) {
            raw.push(cursor.advance().unwrap());
        }
        raw.parse::<u32>().map_err(|_| {
            AsmError::new(
                ErrorKind::InvalidNumericLiteral,
                format!("invalid decimal literal '{raw}'"),
                cursor.make_span(sl, sc),
            )
        })?
    };

    let span = cursor.make_span(sl, sc);
    let word = if value > 0xFFFF {
        warnings.push(AsmWarning::new(
            format!("literal {raw} exceeds 16 bits and will wrap"),
            span,
        ));
        (value & 0xFFFF) as u16
    } else {
        value as u16
    };

    Ok(Some(Token {
        kind: TokenKind::Number(word),
        lexeme: raw,
        span,
    }))
}

fn lex_word(cursor: &mut Cursor, sl: usize, sc: usize) -> Result<Option<Token>, AsmError> {
    let leading_dot = cursor.peek() == Some('.');
    if leading_dot {
        cursor.advance();
    }

    let mut word = String::new();
    while matches!(cursor.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
        word.push(cursor.advance().unwrap());
    }

    let span = cursor.make_span(sl, sc);
    let upper = word.to_ascii_uppercase();

    if leading_dot {
        return match upper.as_str() {
            "ORG" => Ok(Some(Token {
                kind: TokenKind::DirOrg,
                lexeme: format!(".{word}"),
                span,
            })),
            "DAT" => Ok(Some(Token {
                kind: TokenKind::DirDat,
                lexeme: format!(".{word}"),
                span,
            })),
            _ => Err(AsmError::new(
                ErrorKind::UnexpectedCharacter,
                format!("unknown directive '.{word}'"),
                span,
            )),
        };
    }

    if let Some(kind) = keyword_kind(&upper) {
        return Ok(Some(Token {
            kind,
            lexeme: word,
            span,
        }));
    }

    if word.chars().count() == 1 {
        let c = upper.chars().next().unwrap();
        if let Some(idx) = REGISTER_NAMES.iter().position(|&r| r == c) {
            return Ok(Some(Token {
                kind: TokenKind::Register(idx as u8),
                lexeme: word,
                span,
            }));
        }
        if c == 'O' {
            return Ok(Some(Token {
                kind: TokenKind::RegO,
                lexeme: word,
                span,
            }));
        }
    }

    Ok(Some(Token {
        kind: TokenKind::Identifier(word.clone()),
        lexeme: word,
        span,
    }))
}

/// Directives (bare form), mnemonics, stack pseudo-registers and the
/// multi-letter status registers SP/PC all share the "keyword" tier —
/// none of their spellings collide, so a single lookup suffices.
fn keyword_kind(upper: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match upper {
        "ORG" => DirOrg,
        "DAT" => DirDat,
        "SET" => OpSet,
        "ADD" => OpAdd,
        "SUB" => OpSub,
        "MUL" => OpMul,
        "DIV" => OpDiv,
        "MOD" => OpMod,
        "SHL" => OpShl,
        "SHR" => OpShr,
        "AND" => OpAnd,
        "BOR" => OpBor,
        "XOR" => OpXor,
        "IFE" => OpIfe,
        "IFN" => OpIfn,
        "IFG" => OpIfg,
        "IFB" => OpIfb,
        "JSR" => OpJsr,
        "POP" => Pop,
        "PEEK" => Peek,
        "PUSH" => Push,
        "SP" => RegSp,
        "PC" => RegPc,
        _ => return None,
    })
}
