//! # DCPU-16 Emulator
//!
//! CPU core, memory-mapped peripherals, and a disassembler for the
//! DCPU-16. The `dcpu16-emu` binary wraps this in a terminal front end;
//! this library half is what integration tests drive directly.

pub mod cpu;
pub mod isa;
pub mod peripherals;
pub mod ui;
