use crate::{Coords, TermInt};
use crate::game::{InputEvent, InputSource, Renderer};
use crate::snake::{Direction, SnakeState};
use std::{io::{Stdout, Write, stdout}, time::Duration};

use anyhow::{bail, Context, Result};
use crossterm::{cursor, execute, queue, style, terminal};
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

const SNAKE_BODY_CHAR: char = '█';
const BAIT_CHAR: char = 'O';
const DEAD_SNAKE_CHAR: char = 'X';

/// Keyboard input read from the terminal through crossterm.
#[derive(Default)]
pub struct KeyInput;

impl InputSource for KeyInput {
    fn poll_events(&mut self) -> Result<Vec<InputEvent>> {
        let mut events = vec![];

        while event::poll(Duration::from_millis(0)).context("Error polling input")? {
            if let Event::Key(ev) = event::read().context("Error reading input")? {
                events.extend(map_key(&ev));
            }
        }

        Ok(events)
    }

    fn wait_event(&mut self) -> Result<InputEvent> {
        loop {
            if let Event::Key(ev) = event::read().context("Error reading input")? {
                if let Some(input) = map_key(&ev) {
                    return Ok(input);
                }
            }
        }
    }
}

/// Translates a key press into a game input. Anything else is ignored.
pub fn map_key(ev: &KeyEvent) -> Option<InputEvent> {
    if ev.kind != KeyEventKind::Press {
        return None;
    }

    if ev.modifiers.contains(KeyModifiers::CONTROL) && ev.code == KeyCode::Char('c') {
        return Some(InputEvent::Quit);
    }

    match ev.code {
        KeyCode::Char('w') | KeyCode::Char('W') | KeyCode::Up => Some(InputEvent::Direction(Direction::Up)),
        KeyCode::Char('a') | KeyCode::Char('A') | KeyCode::Left => Some(InputEvent::Direction(Direction::Left)),
        KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Down => Some(InputEvent::Direction(Direction::Down)),
        KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Right => Some(InputEvent::Direction(Direction::Right)),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(InputEvent::Restart),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(InputEvent::Quit),
        _ => None,
    }
}

/// Draws the playfield on the terminal, one character per grid cell inside a border.
pub struct TermManager {
    cols: TermInt,
    rows: TermInt,
    box_size: i32,
    stdout: Stdout,
    screen: Vec<char>,
    current_msg: Option<Message>,
    active: bool,
}

struct Message {
    top_left: Coords,
    width: TermInt,
    height: TermInt,
}

impl TermManager {
    pub fn new(cols: TermInt, rows: TermInt, box_size: i32) -> Self {
        let screen = vec![' '; cols as usize * rows as usize];
        TermManager { cols, rows, box_size, stdout: stdout(), screen, current_msg: None, active: false }
    }

    pub fn setup(&mut self) -> Result<()> {
        let (w, h) = terminal::size().context("Error reading terminal size")?;
        let (need_w, need_h) = self.board_size();
        if (w as i32) < need_w || (h as i32) < need_h {
            bail!("terminal is {}x{} but the playfield needs {}x{}", w, h, need_w, need_h);
        }

        self.active = true;
        execute!(self.stdout, EnterAlternateScreen).context("Error entering alt screen")?;
        terminal::enable_raw_mode().context("Error setting raw mode")?;
        execute!(self.stdout, cursor::Hide, cursor::DisableBlinking, terminal::Clear(ClearType::All))
            .context("Error preparing screen")?;

        self.draw_borders()?;
        self.flush()
    }

    pub fn restore(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }

        terminal::disable_raw_mode().context("Error restoring raw mode")?;
        execute!(self.stdout, cursor::Show, cursor::EnableBlinking, LeaveAlternateScreen)
            .context("Error leaving alt screen")?;
        self.active = false;
        Ok(())
    }

    /// Board dimensions in terminal cells, border included.
    pub fn board_size(&self) -> Coords {
        (self.cols as i32 + 2, self.rows as i32 + 2)
    }

    pub fn show_message(&mut self, lines: &[&str]) -> Result<()> {
        self.hide_message()?;

        let (board_w, board_h) = self.board_size();
        let msg_height = (lines.len() + 2) as TermInt;
        let msg_width = (lines.iter().map(|x| x.chars().count()).max().unwrap_or(0) + 2) as TermInt;
        let top_left = (
            (board_w / 2 - msg_width as i32 / 2).max(0),
            (board_h / 2 - msg_height as i32 / 2).max(0),
        );

        for (i, line) in std::iter::once("").chain(lines.iter().copied()).chain(std::iter::once("")).enumerate() {
            let padded_line = format!("{line: ^width$}", line = line, width = msg_width as usize);
            let y = top_left.1 + i as i32;
            for (x_diff, ch) in padded_line.chars().enumerate() {
                self.print_at((top_left.0 + x_diff as i32, y), ch)?;
            }
        }

        self.current_msg = Some(Message { top_left, width: msg_width, height: msg_height });
        self.flush()
    }

    pub fn hide_message(&mut self) -> Result<()> {
        let msg = match self.current_msg.take() {
            Some(msg) => msg,
            None => return Ok(()),
        };

        for y_diff in 0..msg.height as i32 {
            for x_diff in 0..msg.width as i32 {
                let pos = (msg.top_left.0 + x_diff, msg.top_left.1 + y_diff);
                let ch = self.char_at(pos);
                self.print_at(pos, ch)?;
            }
        }

        self.flush()
    }

    ///////////////////////////////////////////////////////////////////////////

    fn draw_borders(&mut self) -> Result<()> {
        let (width, height) = self.board_size();

        for y in 0..height {
            for x in 0..width {
                if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
                    self.print_at((x, y), border_char((x, y), (width, height)))?;
                }
            }
        }

        Ok(())
    }

    // What the board shows at a terminal position, ignoring any message on top
    fn char_at(&self, pos: Coords) -> char {
        let (width, height) = self.board_size();
        let (x, y) = pos;

        if x <= 0 || y <= 0 || x >= width - 1 || y >= height - 1 {
            if x < width && y < height {
                return border_char(pos, (width, height));
            }
            return ' ';
        }

        self.screen[self.cols as usize * (y - 1) as usize + (x - 1) as usize]
    }

    fn print_at(&mut self, pos: Coords, ch: char) -> Result<()> {
        queue!(self.stdout, cursor::MoveTo(pos.0 as TermInt, pos.1 as TermInt), style::Print(ch))
            .context("Error printing to terminal")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.stdout.flush().context("Error flushing")
    }
}

impl Renderer for TermManager {
    fn draw(&mut self, state: &SnakeState) -> Result<()> {
        self.hide_message()?;

        let frame = compose_frame(state, self.cols, self.rows, self.box_size);
        for (i, (&new, &old)) in frame.iter().zip(self.screen.iter()).enumerate() {
            if new != old {
                let x = (i % self.cols as usize) as i32 + 1;
                let y = (i / self.cols as usize) as i32 + 1;
                queue!(self.stdout, cursor::MoveTo(x as TermInt, y as TermInt), style::Print(new))
                    .context("Error printing to terminal")?;
            }
        }

        self.screen = frame;
        self.flush()
    }

    fn game_over(&mut self, state: &SnakeState) -> Result<()> {
        self.draw(state)?;
        self.show_message(&[
            "Game Over!",
            &*format!("Score: {}", state.score()),
            "",
            "[R] to restart, [Q] to quit",
        ])
    }
}

impl Drop for TermManager {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Lays the state out as one character per grid cell, row by row. Cells that are not fully
/// on the board are left out.
pub fn compose_frame(state: &SnakeState, cols: TermInt, rows: TermInt, box_size: i32) -> Vec<char> {
    let mut frame = vec![' '; cols as usize * rows as usize];

    let cell = |(x, y): Coords| -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (c, r) = (x / box_size, y / box_size);
        if c >= cols as i32 || r >= rows as i32 {
            return None;
        }
        Some(r as usize * cols as usize + c as usize)
    };

    if let Some(idx) = state.bait().and_then(cell) {
        frame[idx] = BAIT_CHAR;
    }

    let body_char = if state.is_alive() { SNAKE_BODY_CHAR } else { DEAD_SNAKE_CHAR };
    for seg in state.segments().iter().skip(1).rev() {
        if let Some(idx) = cell(seg.pos) {
            frame[idx] = body_char;
        }
    }

    let head = state.head();
    if let Some(idx) = cell(head.pos) {
        frame[idx] = if state.is_alive() { head_char(head.heading) } else { DEAD_SNAKE_CHAR };
    }

    frame
}

fn head_char(heading: Direction) -> char {
    match heading {
        Direction::Up => '^',
        Direction::Down => 'v',
        Direction::Left => '<',
        Direction::Right => '>',
    }
}

fn border_char(pos: Coords, size: Coords) -> char {
    let (x, y) = pos;
    let (width, height) = size;
    let corner_x = x == 0 || x == width - 1;
    let edge_y = y == 0 || y == height - 1;

    match (corner_x, edge_y) {
        (true, true) => '+',
        (false, true) => '-',
        _ => '|',
    }
}
