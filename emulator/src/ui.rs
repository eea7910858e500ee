//! Terminal front-end: a `ratatui` console view driven by a cooperative
//! poll/step/repaint/sleep loop.
//!
//! Each iteration does exactly four things, in order: poll one
//! non-blocking key event, execute exactly one CPU instruction, repaint
//! the console from RAM, sleep a small fixed interval. Those are the
//! loop's only suspension points — nothing else here blocks.

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Color;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Terminal;

use crate::cpu::Cpu;
use crate::peripherals::{self, VRAM_COLUMNS, VRAM_ROWS};

const TICK: Duration = Duration::from_millis(16);

/// 4-bit color index to terminal color, matching the low palette most
/// terminal emulators map ANSI 0-15 to.
const PALETTE: [Color; 16] = [
    Color::Black,
    Color::Blue,
    Color::Green,
    Color::Cyan,
    Color::Red,
    Color::Magenta,
    Color::Yellow,
    Color::Gray,
    Color::DarkGray,
    Color::LightBlue,
    Color::LightGreen,
    Color::LightCyan,
    Color::LightRed,
    Color::LightMagenta,
    Color::LightYellow,
    Color::White,
];

fn key_to_word(code: KeyCode) -> Option<u16> {
    match code {
        KeyCode::Left => Some(peripherals::KEY_LEFT),
        KeyCode::Right => Some(peripherals::KEY_RIGHT),
        KeyCode::Up => Some(peripherals::KEY_UP),
        KeyCode::Down => Some(peripherals::KEY_DOWN),
        KeyCode::Char(c) if c.is_ascii() => Some(c as u16),
        _ => None,
    }
}

fn console_lines(cpu: &Cpu) -> Vec<Line<'static>> {
    let cells = peripherals::read_vram(&cpu.ram);
    cells
        .chunks(VRAM_COLUMNS)
        .take(VRAM_ROWS)
        .map(|row| {
            let spans: Vec<Span<'static>> = row
                .iter()
                .map(|cell| {
                    let ch = if cell.ascii.is_ascii_graphic() || cell.ascii == b' ' {
                        cell.ascii as char
                    } else {
                        ' '
                    };
                    Span::styled(
                        ch.to_string(),
                        ratatui::style::Style::default()
                            .fg(PALETTE[cell.fg as usize & 0xF])
                            .bg(PALETTE[cell.bg as usize & 0xF]),
                    )
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

fn status_line(cpu: &Cpu) -> String {
    format!(
        "pc={:#06x} sp={:#06x} o={:#06x}  A={:#06x} B={:#06x} C={:#06x} X={:#06x} Y={:#06x} Z={:#06x} I={:#06x} J={:#06x}  reserved-opcode hits={}",
        cpu.pc,
        cpu.sp,
        cpu.o,
        cpu.registers[0],
        cpu.registers[1],
        cpu.registers[2],
        cpu.registers[3],
        cpu.registers[4],
        cpu.registers[5],
        cpu.registers[6],
        cpu.registers[7],
        cpu.reserved_hits,
    )
}

/// Drives `cpu` in a terminal UI until the user quits, SIGINT arrives, or
/// (when `halt_on_fixpoint`) a step leaves `pc` unchanged.
pub fn run(cpu: &mut Cpu, halt_on_fixpoint: bool, verbose: bool) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, cpu, halt_on_fixpoint, verbose);

    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    cpu: &mut Cpu,
    halt_on_fixpoint: bool,
    verbose: bool,
) -> io::Result<()> {
    loop {
        if event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if key.code == KeyCode::Esc {
                        return Ok(());
                    }
                    if let Some(word) = key_to_word(key.code) {
                        peripherals::set_last_key(&mut cpu.ram, word);
                    }
                }
            }
        }

        let pc_before = cpu.pc;
        cpu.step();
        if halt_on_fixpoint && cpu.pc == pc_before {
            if verbose {
                terminal.draw(|frame| draw(frame, cpu, verbose))?;
            }
            return Ok(());
        }

        terminal.draw(|frame| draw(frame, cpu, verbose))?;
        std::thread::sleep(TICK);
    }
}

fn draw(frame: &mut ratatui::Frame, cpu: &Cpu, verbose: bool) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(VRAM_ROWS as u16 + 2), Constraint::Min(1)])
        .split(area);

    let console = Paragraph::new(console_lines(cpu))
        .block(Block::default().borders(Borders::ALL).title("console"));
    frame.render_widget(console, chunks[0]);

    if verbose {
        let status = Paragraph::new(status_line(cpu))
            .block(Block::default().borders(Borders::ALL).title("registers"));
        frame.render_widget(status, chunks[1]);
    }
}
