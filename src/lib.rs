//! # DCPU-16 Assembler
//!
//! A one-pass assembler for the DCPU-16 16-bit virtual processor, with
//! deferred label resolution and a hex dump interchange format for the
//! resulting RAM image.
//!
//! ## Pipeline
//!
//! 1. **Lexer** - tokenizes source text
//! 2. **Parser** - builds the instruction/directive AST and label table
//! 3. **Encoder** - resolves labels and packs instructions into a 64 KiW image
//! 4. **Hex dump** - serializes/deserializes that image as portable text
//!
//! ## Example
//!
//! ```rust,no_run
//! use dcpu16_asm::{lexer::tokenize, parser::parse_program, encoder::encode, hexdump::write_hexdump};
//!
//! let source = std::fs::read_to_string("program.dasm").unwrap();
//! let lexed = tokenize(&source);
//! let parsed = parse_program(&lexed.tokens, false);
//! let encoded = encode(&parsed, false);
//!
//! if encoded.errors.is_empty() {
//!     let text = write_hexdump(&encoded.image, false);
//!     std::fs::write("out.hex", text).unwrap();
//! }
//! ```

pub mod encoder;
pub mod error;
pub mod hexdump;
pub mod lexer;
pub mod parser;
