use std::env;
use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use dcpu16_asm::encoder::RAM_WORDS;
use dcpu16_asm::hexdump::read_hexdump;

use dcpu16_emu::cpu::Cpu;
use dcpu16_emu::isa;
use dcpu16_emu::ui;

struct Options {
    input: Option<String>,
    big_endian: bool,
    verbose: bool,
    disassemble: bool,
    halt_on_fixpoint: bool,
}

fn print_usage() {
    println!("Usage: dcpu16-emu [OPTIONS] [FILE]");
    println!();
    println!("Loads a hex dump RAM image and runs it in a terminal console.");
    println!("FILE may be '-' or omitted to read from stdin.");
    println!();
    println!("Options:");
    println!("  -b, --bigendian      image words are big-endian (default: little-endian)");
    println!("  -v, --verbose        show registers alongside the console");
    println!("  -d, --disassemble    print decoded instructions and exit, don't execute");
    println!("  -H, --halt           stop when a step leaves pc unchanged");
    println!("  -h, --help           print this message and exit");
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut input = None;
    let mut big_endian = false;
    let mut verbose = false;
    let mut disassemble = false;
    let mut halt_on_fixpoint = false;

    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            "-b" | "--bigendian" => big_endian = true,
            "-v" | "--verbose" => verbose = true,
            "-d" | "--disassemble" => disassemble = true,
            "-H" | "--halt" => halt_on_fixpoint = true,
            "-" => input = None,
            other => input = Some(other.to_string()),
        }
    }

    Ok(Options {
        input,
        big_endian,
        verbose,
        disassemble,
        halt_on_fixpoint,
    })
}

fn read_input(input: &Option<String>) -> io::Result<String> {
    match input {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn run_disassembler(image: &[u16; RAM_WORDS]) {
    for decoded in isa::disassemble(image.as_slice(), 0, RAM_WORDS) {
        println!("{:04x}: {}", decoded.address, decoded.text);
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("dcpu16-emu: {message}");
            return ExitCode::FAILURE;
        }
    };

    let text = match read_input(&options.input) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("dcpu16-emu: cannot read input: {err}");
            return ExitCode::FAILURE;
        }
    };

    let image = match read_hexdump(&text, options.big_endian) {
        Ok(image) => image,
        Err(err) => {
            let name = options.input.as_deref().unwrap_or("<stdin>");
            eprintln!("{name}:{err}");
            return ExitCode::FAILURE;
        }
    };

    if options.disassemble {
        run_disassembler(&image);
        return ExitCode::SUCCESS;
    }

    let mut cpu = Cpu::new();
    cpu.load(&image);
    if let Err(err) = ui::run(&mut cpu, options.halt_on_fixpoint, options.verbose) {
        eprintln!("dcpu16-emu: {err}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
