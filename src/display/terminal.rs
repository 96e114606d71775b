// src/display/terminal.rs
//! Terminal dashboard with start/stop/reset controls

use crate::{
    error::{Result, TrackerError},
    monitor::TrackMonitor,
    track::{format_elapsed, TrackSnapshot},
};
use chrono::Local;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use std::{
    io::{self, Write},
    time::Duration,
};
use tokio::time::sleep;

pub struct TerminalDisplay;

impl TerminalDisplay {
    pub fn new() -> Self {
        Self
    }

    /// Run the display loop until quit or Ctrl+C. Renders once per tick
    /// and translates key presses into monitor commands.
    pub async fn run(&self, monitor: TrackMonitor) -> Result<()> {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode().map_err(TrackerError::Io)?;
        execute!(stdout, Hide, Clear(ClearType::All)).map_err(TrackerError::Io)?;

        // Ctrl+C also shuts the monitor down when the terminal loses focus
        let ctrlc_monitor = monitor.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                ctrlc_monitor.shutdown();
            }
        });

        let mut status_line: Option<String> = None;

        while monitor.is_running() {
            if let Some(command) = self.poll_key()? {
                match command {
                    Command::Toggle => match monitor.toggle_tracking().await {
                        Ok(true) => status_line = Some("Tracking started".to_string()),
                        Ok(false) => status_line = Some("Tracking stopped".to_string()),
                        Err(e) => status_line = Some(format!("Start failed: {}", e)),
                    },
                    Command::Reset => {
                        monitor.reset();
                        status_line = Some("Tracking reset".to_string());
                    }
                    Command::Quit => {
                        monitor.shutdown();
                        break;
                    }
                }
            }

            // provider loops report errors through the monitor so nothing
            // writes to the terminal behind the dashboard's back
            if let Some(msg) = monitor.take_status() {
                status_line = Some(msg);
            }

            let snapshot = monitor.snapshot();
            let address = monitor.address();
            self.render(
                &mut stdout,
                &snapshot,
                address.as_deref(),
                monitor.is_tracking(),
                status_line.as_deref(),
            )?;

            stdout.flush().map_err(TrackerError::Io)?;
            sleep(Duration::from_millis(250)).await;
        }

        execute!(stdout, Show, Clear(ClearType::All), MoveTo(0, 0)).map_err(TrackerError::Io)?;
        terminal::disable_raw_mode().map_err(TrackerError::Io)?;
        println!("Shutting down...");
        Ok(())
    }

    /// Non-blocking key read, mapped to a monitor command
    fn poll_key(&self) -> Result<Option<Command>> {
        while event::poll(Duration::from_millis(0)).map_err(TrackerError::Io)? {
            if let Event::Key(KeyEvent { code, modifiers, .. }) = event::read().map_err(TrackerError::Io)? {
                match code {
                    KeyCode::Char('s') | KeyCode::Char(' ') => return Ok(Some(Command::Toggle)),
                    KeyCode::Char('r') => return Ok(Some(Command::Reset)),
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(Some(Command::Quit)),
                    KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(Some(Command::Quit))
                    }
                    _ => {}
                }
            }
        }
        Ok(None)
    }

    /// Redraw the full dashboard
    fn render(
        &self,
        stdout: &mut impl Write,
        snapshot: &TrackSnapshot,
        address: Option<&str>,
        tracking: bool,
        status_line: Option<&str>,
    ) -> Result<()> {
        execute!(stdout, Clear(ClearType::All), MoveTo(0, 0)).map_err(TrackerError::Io)?;

        let mut row: u16 = 0;

        // Header
        execute!(stdout, SetForegroundColor(Color::Green)).map_err(TrackerError::Io)?;
        write_line(stdout, &mut row, "=".repeat(52))?;
        write_line(stdout, &mut row, "GPS Distance Tracker".to_string())?;
        write_line(stdout, &mut row, "=".repeat(52))?;
        execute!(stdout, ResetColor).map_err(TrackerError::Io)?;

        let state_str = if tracking { "TRACKING" } else { "STOPPED" };
        write_line(
            stdout,
            &mut row,
            format!("{}  ({})", state_str, Local::now().format("%H:%M:%S")),
        )?;
        row += 1;

        // Trip section
        execute!(stdout, SetForegroundColor(Color::Cyan)).map_err(TrackerError::Io)?;
        write_line(stdout, &mut row, "TRIP:".to_string())?;
        execute!(stdout, ResetColor).map_err(TrackerError::Io)?;

        write_line(stdout, &mut row, format!("  Distance:     {:.2} km", snapshot.distance_km))?;
        let speed_str = match snapshot.speed_kmh {
            Some(kmh) => format!("{:.1} km/h", kmh),
            None => "--".to_string(),
        };
        write_line(stdout, &mut row, format!("  Speed:        {}", speed_str))?;
        write_line(stdout, &mut row, format!("  Data Points:  {}", snapshot.fix_count))?;
        write_line(stdout, &mut row, format!("  Time:         {}", format_elapsed(snapshot.elapsed_ms)))?;
        row += 1;

        // Location section
        execute!(stdout, SetForegroundColor(Color::Yellow)).map_err(TrackerError::Io)?;
        write_line(stdout, &mut row, "LOCATION:".to_string())?;
        execute!(stdout, ResetColor).map_err(TrackerError::Io)?;
        write_line(
            stdout,
            &mut row,
            format!("  {}", address.unwrap_or("Waiting for fix...")),
        )?;
        row += 1;

        if let Some(msg) = status_line {
            write_line(stdout, &mut row, format!("  {}", msg))?;
        }
        row += 1;

        // Footer
        execute!(stdout, SetForegroundColor(Color::Green)).map_err(TrackerError::Io)?;
        write_line(stdout, &mut row, "=".repeat(52))?;
        write_line(stdout, &mut row, "[s] start/stop   [r] reset   [q] quit".to_string())?;
        write_line(stdout, &mut row, "=".repeat(52))?;
        execute!(stdout, ResetColor).map_err(TrackerError::Io)?;

        Ok(())
    }
}

/// Print one line at the given row and advance it; raw mode needs explicit
/// cursor positioning
fn write_line(stdout: &mut impl Write, row: &mut u16, text: String) -> Result<()> {
    execute!(stdout, MoveTo(0, *row), Print(text)).map_err(TrackerError::Io)?;
    *row += 1;
    Ok(())
}

impl Default for TerminalDisplay {
    fn default() -> Self {
        Self::new()
    }
}

enum Command {
    Toggle,
    Reset,
    Quit,
}
