use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use std::sync::Arc;
use std::time::Instant;

use crate::backend::http::HttpBackend;
use crate::config::KioskConfig;
use crate::controller::{Command, KioskController, ViewState};
use crate::selection::SLOT_COUNT;

/// Grid columns in the selection screen
pub const GRID_COLS: usize = 4;

pub struct App {
    pub controller: KioskController<HttpBackend>,

    // Votable item keys, in grid order
    pub items: Vec<String>,
    // Languages in cycling order
    pub languages: Vec<String>,

    // Grid cursor (index into items)
    pub cursor: usize,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,

    pub show_help: bool,
}

impl App {
    pub async fn new(config: KioskConfig) -> Result<Self> {
        let backend = Arc::new(HttpBackend::new(config.server_url.clone()));
        let mut controller = KioskController::new(
            backend,
            config.startup_language(),
            config.languages.clone(),
            config.launch_duration(),
            config.idle_timeout(),
        );

        // Best-effort: an unreachable server at startup still gets a usable
        // kiosk that shows raw keys until translations arrive
        controller.load_translations().await;

        Ok(Self {
            controller,
            items: config.items,
            languages: config.languages,
            cursor: 0,
            status_message: None,
            status_message_time: None,
            show_help: false,
        })
    }

    /// Set a status message (auto-clears after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.show_help {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Enter | KeyCode::Char('q')
            ) {
                self.show_help = false;
            }
            return Ok(());
        }

        // Language cycling works on every screen
        if key.code == KeyCode::Tab {
            self.cycle_language().await;
            return Ok(());
        }

        if key.code == KeyCode::Char('?') {
            self.show_help = true;
            return Ok(());
        }

        match self.controller.view() {
            ViewState::Selecting => self.handle_selecting_key(key).await,
            // Input is disabled for the whole launch sequence
            ViewState::Transitioning => Ok(()),
            ViewState::ResultShown => self.handle_result_key(key).await,
        }
    }

    async fn handle_selecting_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            // Grid navigation
            KeyCode::Char('h') | KeyCode::Left => self.move_cursor(-1, 0),
            KeyCode::Char('l') | KeyCode::Right => self.move_cursor(1, 0),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(0, -1),
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(0, 1),

            // Toggle the item under the cursor
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some(key) = self.items.get(self.cursor).cloned() {
                    let was_full = self.controller.selection.is_full();
                    let selected = self.controller.selection.is_selected(&key);
                    self.controller
                        .handle_command(Command::ToggleItem(key))
                        .await;
                    if was_full && !selected {
                        self.set_status("Three picks already made. Toggle one off first.");
                    }
                }
            }

            // Clear a display slot directly
            KeyCode::Char(c @ '1'..='3') => {
                let slot = c as usize - '1' as usize;
                debug_assert!(slot < SLOT_COUNT);
                self.controller
                    .handle_command(Command::ToggleSlot(slot))
                    .await;
            }

            // Clear all picks
            KeyCode::Esc => {
                if !self.controller.selection.is_empty() {
                    self.controller.selection.reset();
                    self.set_status("Selection cleared");
                }
            }

            // Submit the vote
            KeyCode::Char('s') => {
                if self.controller.selection.is_full() {
                    self.controller.handle_command(Command::Submit).await;
                } else {
                    self.set_status(format!(
                        "Pick {} more to vote",
                        SLOT_COUNT - self.controller.selection.len()
                    ));
                }
            }

            _ => {}
        }
        Ok(())
    }

    async fn handle_result_key(&mut self, key: KeyEvent) -> Result<()> {
        if matches!(
            key.code,
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('b')
        ) {
            self.controller.handle_command(Command::Return).await;
        }
        Ok(())
    }

    async fn cycle_language(&mut self) {
        if self.languages.is_empty() {
            return;
        }
        let current = self.controller.language();
        let idx = self
            .languages
            .iter()
            .position(|l| l == current)
            .map(|i| (i + 1) % self.languages.len())
            .unwrap_or(0);
        let next = self.languages[idx].clone();
        self.controller
            .handle_command(Command::SetLanguage(next.clone()))
            .await;
        self.set_status(format!("Language: {}", next));
    }

    fn move_cursor(&mut self, dx: isize, dy: isize) {
        if self.items.is_empty() {
            return;
        }
        let cols = GRID_COLS.min(self.items.len());
        let rows = self.items.len().div_ceil(cols);
        let mut col = (self.cursor % cols) as isize;
        let mut row = (self.cursor / cols) as isize;

        col = (col + dx).rem_euclid(cols as isize);
        row = (row + dy).rem_euclid(rows as isize);

        let mut next = row as usize * cols + col as usize;
        // Last row may be ragged; clamp onto it
        if next >= self.items.len() {
            next = self.items.len() - 1;
        }
        self.cursor = next;
    }

    pub async fn tick(&mut self) -> Result<()> {
        self.controller.tick().await;

        // Surface controller errors as a non-blocking notice
        if let Some(err) = self.controller.take_error() {
            self.set_status(format!("⚠ {}", err));
        }

        // Clear status message after 3 seconds
        if let Some(time) = self.status_message_time {
            if time.elapsed().as_secs() >= 3 {
                self.status_message = None;
                self.status_message_time = None;
            }
        }

        Ok(())
    }
}
