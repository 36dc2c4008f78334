//! Live status output for running tasks
//!
//! Every task owns exactly one [`StatusDisplay`]. The runtime drives it with
//! fully formatted lines (text plus optional indented subtext); the display
//! only decides how those lines reach the user.

use std::io::{self, IsTerminal, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use colored::*;
use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use tokio::task::JoinHandle;

const DEFAULT_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const DEFAULT_INTERVAL: Duration = Duration::from_millis(80);
/// `tokio::time::interval` rejects a zero period
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Visual treatment of a persisted status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Info,
    Success,
    Failure,
}

impl Symbol {
    pub fn glyph(self) -> ColoredString {
        match self {
            Symbol::Info => "ℹ".blue().bold(),
            Symbol::Success => "✔".green().bold(),
            Symbol::Failure => "✖".red().bold(),
        }
    }
}

/// Output channel for a task's status line
pub trait StatusDisplay: Send {
    /// Begin showing `line` as in progress
    fn start(&mut self, line: &str);

    /// Replace the in-progress line
    fn update(&mut self, line: &str);

    /// Stop and clear the in-progress line without leaving output behind
    fn stop(&mut self);

    /// Stop and leave `line` on screen with the given treatment
    fn persist(&mut self, symbol: Symbol, line: &str);

    fn is_spinning(&self) -> bool;
}

/// Options for the terminal spinner
#[derive(Debug, Clone)]
pub struct SpinnerOptions {
    pub frames: Vec<String>,
    pub interval: Duration,
    /// Animate and redraw in place. When false only persisted lines are printed.
    pub interactive: bool,
}

impl Default for SpinnerOptions {
    fn default() -> Self {
        Self {
            frames: DEFAULT_FRAMES.iter().map(|f| f.to_string()).collect(),
            interval: DEFAULT_INTERVAL,
            interactive: io::stderr().is_terminal(),
        }
    }
}

#[derive(Debug, Default)]
struct SpinnerState {
    line: String,
    active: bool,
    frame: usize,
    lines_drawn: u16,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Animated spinner writing to stderr
pub struct TerminalSpinner {
    options: SpinnerOptions,
    state: Arc<Mutex<SpinnerState>>,
    ticker: Option<JoinHandle<()>>,
}

impl TerminalSpinner {
    pub fn new(mut options: SpinnerOptions) -> Self {
        options.interval = options.interval.max(MIN_INTERVAL);
        Self {
            options,
            state: Arc::new(Mutex::new(SpinnerState::default())),
            ticker: None,
        }
    }

    fn cancel_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl Default for TerminalSpinner {
    fn default() -> Self {
        Self::new(SpinnerOptions::default())
    }
}

impl StatusDisplay for TerminalSpinner {
    fn start(&mut self, line: &str) {
        {
            let mut state = lock(&self.state);
            state.line = line.to_string();
            if state.active {
                return;
            }
            state.active = true;
        }

        if !self.options.interactive {
            return;
        }

        // Outside a runtime there is nothing to tick on; draw a single frame.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let frames = self.options.frames.clone();
                let interval = self.options.interval;
                let state = Arc::clone(&self.state);
                self.ticker = Some(handle.spawn(animate(state, frames, interval)));
            }
            Err(_) => {
                let mut state = lock(&self.state);
                let frame = self.options.frames.first().cloned().unwrap_or_default();
                draw_frame(&mut state, &frame);
            }
        }
    }

    fn update(&mut self, line: &str) {
        lock(&self.state).line = line.to_string();
    }

    fn stop(&mut self) {
        {
            let mut state = lock(&self.state);
            if state.active {
                state.active = false;
                let mut stderr = io::stderr().lock();
                let _ = clear_lines(&mut stderr, state.lines_drawn);
                state.lines_drawn = 0;
            }
        }
        self.cancel_ticker();
    }

    fn persist(&mut self, symbol: Symbol, line: &str) {
        self.stop();
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "{} {}", symbol.glyph(), line);
    }

    fn is_spinning(&self) -> bool {
        lock(&self.state).active
    }
}

impl Drop for TerminalSpinner {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}

async fn animate(state: Arc<Mutex<SpinnerState>>, frames: Vec<String>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let mut guard = lock(&state);
        // Checked under the lock so a concurrent stop never sees a late frame.
        if !guard.active {
            break;
        }
        let frame = match frames.len() {
            0 => String::new(),
            len => frames[guard.frame % len].clone(),
        };
        draw_frame(&mut guard, &frame);
        guard.frame = guard.frame.wrapping_add(1);
    }
}

fn draw_frame(state: &mut SpinnerState, frame: &str) {
    let mut stderr = io::stderr().lock();
    let _ = clear_lines(&mut stderr, state.lines_drawn);
    let output = format!("{} {}", frame.cyan(), state.line);
    let _ = write!(stderr, "{}", output);
    let _ = stderr.flush();
    state.lines_drawn = u16::try_from(output.lines().count()).unwrap_or(u16::MAX);
}

fn clear_lines(out: &mut impl Write, lines: u16) -> io::Result<()> {
    if lines == 0 {
        return Ok(());
    }
    queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
    for _ in 1..lines {
        queue!(out, MoveUp(1), Clear(ClearType::CurrentLine))?;
    }
    out.flush()
}

/// One call made against a [`MemoryDisplay`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    Start(String),
    Update(String),
    Stop,
    Persist(Symbol, String),
}

#[derive(Debug, Default)]
struct MemoryState {
    events: Vec<DisplayEvent>,
    spinning: bool,
}

/// Display that records every call instead of drawing.
///
/// Clones share the same record, so a caller can keep one clone while the
/// task owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryDisplay {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DisplayEvent> {
        lock(&self.state).events.clone()
    }

    /// The most recent line left on screen, if any
    pub fn last_persisted(&self) -> Option<(Symbol, String)> {
        lock(&self.state)
            .events
            .iter()
            .rev()
            .find_map(|event| match event {
                DisplayEvent::Persist(symbol, line) => Some((*symbol, line.clone())),
                _ => None,
            })
    }

    fn record(&self, event: DisplayEvent, spinning: bool) {
        let mut state = lock(&self.state);
        state.events.push(event);
        state.spinning = spinning;
    }
}

impl StatusDisplay for MemoryDisplay {
    fn start(&mut self, line: &str) {
        self.record(DisplayEvent::Start(line.to_string()), true);
    }

    fn update(&mut self, line: &str) {
        let spinning = self.is_spinning();
        self.record(DisplayEvent::Update(line.to_string()), spinning);
    }

    fn stop(&mut self) {
        self.record(DisplayEvent::Stop, false);
    }

    fn persist(&mut self, symbol: Symbol, line: &str) {
        self.record(DisplayEvent::Persist(symbol, line.to_string()), false);
    }

    fn is_spinning(&self) -> bool {
        lock(&self.state).spinning
    }
}
