use std::env;
use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use dcpu16_asm::encoder::encode;
use dcpu16_asm::hexdump::write_hexdump;
use dcpu16_asm::lexer::tokenize;
use dcpu16_asm::parser::parse_program;

struct Options {
    input: Option<String>,
    output: String,
    big_endian: bool,
    paranoid: bool,
}

fn print_usage() {
    println!("Usage: dcpu16-asm [OPTIONS] [FILE]");
    println!();
    println!("Assembles DCPU-16 source into a hex dump RAM image.");
    println!("FILE may be '-' or omitted to read from stdin.");
    println!();
    println!("Options:");
    println!("  -o PATH              output path (default: out.hex)");
    println!("  -b, --bigendian      write big-endian words (default: little-endian)");
    println!("  -p, --paranoid       enable non-fatal style warnings");
    println!("  -h, --help           print this message and exit");
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut input = None;
    let mut output = "out.hex".to_string();
    let mut big_endian = false;
    let mut paranoid = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            "-b" | "--bigendian" => big_endian = true,
            "-p" | "--paranoid" => paranoid = true,
            "-o" => {
                i += 1;
                output = args.get(i).ok_or("-o requires a path argument")?.clone();
            }
            "-" => input = None,
            arg => input = Some(arg.to_string()),
        }
        i += 1;
    }

    Ok(Options {
        input,
        output,
        big_endian,
        paranoid,
    })
}

fn source_name(input: &Option<String>) -> &str {
    match input {
        Some(path) => path,
        None => "<stdin>",
    }
}

fn read_source(input: &Option<String>) -> io::Result<String> {
    match input {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("dcpu16-asm: {message}");
            return ExitCode::FAILURE;
        }
    };

    let source = match read_source(&options.input) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("dcpu16-asm: cannot read input: {err}");
            return ExitCode::FAILURE;
        }
    };

    let name = source_name(&options.input);

    let lexed = tokenize(&source);
    if let Some(err) = lexed.errors.first() {
        eprintln!("{name}:{err}");
        return ExitCode::FAILURE;
    }
    if options.paranoid {
        for warning in &lexed.warnings {
            eprintln!("{name}:{warning}");
        }
    }

    let parsed = parse_program(&lexed.tokens, options.paranoid);
    if let Some(err) = parsed.errors.first() {
        eprintln!("{name}:{err}");
        return ExitCode::FAILURE;
    }
    for warning in &parsed.warnings {
        eprintln!("{name}:{warning}");
    }

    let encoded = encode(&parsed, options.paranoid);
    if let Some(err) = encoded.errors.first() {
        eprintln!("{name}:{err}");
        return ExitCode::FAILURE;
    }
    for warning in &encoded.warnings {
        eprintln!("{name}:{warning}");
    }

    let text = write_hexdump(&encoded.image, options.big_endian);
    if let Err(err) = fs::write(&options.output, text) {
        eprintln!("dcpu16-asm: cannot write '{}': {err}", options.output);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
