//! Terminal frontend: the 64x32 display drawn with block characters, plus
//! console, program and hardware panels for following the machine.

mod input;
pub mod panels;

use std::collections::VecDeque;
use std::io::{self, Stdout};

use anyhow::{bail, Result};
use chipterm_chip8::{FrameBuffer, Frontend, Instruction, Machine, Screen};
use chipterm_chip8::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use tui::backend::CrosstermBackend;
use tui::layout::{Constraint, Direction, Layout, Rect};
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::text::Spans;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders, Paragraph};
use tui::{Frame, Terminal};

pub use input::{spawn_input, translate, Keymap, KEY_RELEASE_DELAY};

/// Display panel size including its border.
const DISPLAY_COLS: u16 = SCREEN_WIDTH as u16 + 2;
const DISPLAY_ROWS: u16 = SCREEN_HEIGHT as u16 + 2;

type Backend = CrosstermBackend<Stdout>;

/// Terminal implementation of [`Frontend`].
///
/// Owns the framebuffer outright: sprite draws and frame renders both arrive
/// on the scheduler's thread, and the input thread only ever talks to the
/// scheduler through its event channel.
pub struct TuiFrontend {
    terminal: Terminal<Backend>,
    screen: FrameBuffer,
    logs: VecDeque<String>,
}

impl TuiFrontend {
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        // from here on Drop restores the terminal
        let mut frontend = TuiFrontend {
            terminal,
            screen: FrameBuffer::default(),
            logs: VecDeque::new(),
        };
        frontend.terminal.hide_cursor()?;
        frontend.terminal.clear()?;

        let size = frontend.terminal.size()?;
        if size.width < DISPLAY_COLS || size.height < DISPLAY_ROWS {
            bail!(
                "insufficient resolution to initialize the display: need {}x{}, have {}x{}",
                DISPLAY_COLS,
                DISPLAY_ROWS,
                size.width,
                size.height
            );
        }
        log::info!("terminal frontend ready at {}x{}", size.width, size.height);
        Ok(frontend)
    }

    fn draw(&mut self, machine: &Machine, listing: &[Instruction]) -> io::Result<()> {
        let screen = &self.screen;
        let logs = &self.logs;
        self.terminal.draw(|f| {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(DISPLAY_COLS), Constraint::Min(0)].as_ref())
                .split(f.size());
            let left = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(DISPLAY_ROWS), Constraint::Min(0)].as_ref())
                .split(columns[0]);
            let right = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(55), Constraint::Percentage(45)].as_ref())
                .split(columns[1]);

            draw_display(f, left[0], screen);
            let visible = left[1].height.saturating_sub(4) as usize;
            draw_text(f, left[1], "CONSOLE", panels::console_lines(logs, visible));
            draw_text(f, right[0], "PROGRAM", panels::program_lines(machine, listing));
            draw_text(f, right[1], "HARDWARE", panels::hardware_lines(machine));
        })?;
        Ok(())
    }
}

fn draw_display(f: &mut Frame<Backend>, area: Rect, screen: &FrameBuffer) {
    // canvas y grows upwards, so rows are negated
    let lit: Vec<(f64, f64)> = screen
        .lit()
        .map(|(x, y)| (x as f64, -(y as f64)))
        .collect();
    let canvas = Canvas::default()
        .block(
            Block::default()
                .title("DISPLAY")
                .borders(Borders::ALL)
                .style(Style::default().bg(Color::Black)),
        )
        .x_bounds([0.0, (SCREEN_WIDTH - 1) as f64])
        .y_bounds([-((SCREEN_HEIGHT - 1) as f64), 0.0])
        .marker(Marker::Block)
        .paint(|ctx| {
            ctx.draw(&Points {
                coords: &lit,
                color: Color::White,
            });
        });
    f.render_widget(canvas, area);
}

fn draw_text(f: &mut Frame<Backend>, area: Rect, title: &str, lines: Vec<String>) {
    let text: Vec<Spans> = lines.into_iter().map(Spans::from).collect();
    let paragraph =
        Paragraph::new(text).block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(paragraph, area);
}

impl Screen for TuiFrontend {
    fn draw_sprite(&mut self, sprite: &[u8], x: u8, y: u8) -> bool {
        self.screen.draw_sprite(sprite, x, y)
    }

    fn clear_display(&mut self) {
        self.screen.clear();
    }

    fn log(&mut self, message: &str) {
        log::debug!("console: {}", message);
        panels::push_console(&mut self.logs, message);
    }
}

impl Frontend for TuiFrontend {
    fn render_frame(&mut self, machine: &Machine, listing: &[Instruction]) {
        if let Err(e) = self.draw(machine, listing) {
            log::error!("failed to render frame: {}", e);
        }
    }
}

impl Drop for TuiFrontend {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            log::warn!("failed to leave raw mode: {}", e);
        }
        if let Err(e) = execute!(self.terminal.backend_mut(), LeaveAlternateScreen) {
            log::warn!("failed to leave alternate screen: {}", e);
        }
        let _ = self.terminal.show_cursor();
    }
}
