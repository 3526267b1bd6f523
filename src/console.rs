//! Terminal scoring screen. Each key action runs one handler to completion;
//! handler failures become a notice popup and never end the session.
//!
//! ```text
//! ┌ Fraud Detection System ──────────────────────────────────┐
//! │┌ Transaction ───────────────────────────────────────────┐│
//! ││ 0,149.62,-1.35,...                                     ││
//! │└────────────────────────────────────────────────────────┘│
//! │Prediction: Fraudulent                                    │
//! │┌ Results ──────────────┐┌ Fraud: Time vs Amount ────────┐│
//! ││ 2 Fraudulent Trans... ││ Amount        •               ││
//! ││ • Index: 4, Amount... ││          •              Time  ││
//! │└───────────────────────┘└───────────────────────────────┘│
//! │Enter Predict | Ctrl+O Upload | Ctrl+S Download | Ctrl+C Quit
//! └──────────────────────────────────────────────────────────┘
//! ```

use std::io;
use std::path::PathBuf;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};
use tracing::{debug, error};

use crate::error::FraudError;
use crate::input_field::InputField;
use crate::scorer::{Scorer, Severity};

pub const BANNER: &str = "Fraud Detection System";

/// Key bindings of the scoring screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    /// Enter: predict the typed transaction, or upload the typed path
    Submit,
    /// Open the upload path entry
    Upload,
    Download,
    /// Esc: cancel the upload entry, or quit from the transaction entry
    Back,
    Insert(char),
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
    None,
}

impl KeyAction {
    pub fn from_key_event(key: &KeyEvent) -> Self {
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Self::Quit,
            (KeyCode::Char('o'), KeyModifiers::CONTROL) => Self::Upload,
            (KeyCode::Char('s'), KeyModifiers::CONTROL) => Self::Download,
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => Self::Insert(c),
            (KeyCode::Enter, _) => Self::Submit,
            (KeyCode::Esc, _) => Self::Back,
            (KeyCode::Backspace, _) => Self::Backspace,
            (KeyCode::Delete, _) => Self::Delete,
            (KeyCode::Left, _) => Self::Left,
            (KeyCode::Right, _) => Self::Right,
            (KeyCode::Home, _) => Self::Home,
            (KeyCode::End, _) => Self::End,
            _ => Self::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Transaction,
    UploadPath,
}

/// Modal message shown after a handler finishes or fails
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    fn from_error(err: &FraudError) -> Self {
        Self { title: err.notice_title().to_string(), message: err.to_string() }
    }
}

fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Alert => Style::default().fg(Color::Red),
        Severity::Success => Style::default().fg(Color::Green),
    }
}

pub struct Console {
    scorer: Scorer,
    export_path: PathBuf,
    mode: InputMode,
    transaction: InputField,
    upload_path: InputField,
    notice: Option<Notice>,
    should_quit: bool,
}

impl Console {
    pub fn new(scorer: Scorer, export_path: PathBuf) -> Self {
        let transaction = InputField::new("Transaction")
            .with_placeholder(format!("{} comma-separated values", scorer.model().n_features()));
        Self {
            scorer,
            export_path,
            mode: InputMode::Transaction,
            transaction,
            upload_path: InputField::new("Upload CSV").with_placeholder("path to a CSV file"),
            notice: None,
            should_quit: false,
        }
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Takes over the terminal until the user quits
    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        // Restore the terminal even when the loop failed
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        result
    }

    fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        while !self.should_quit() {
            terminal.draw(|frame| self.draw(frame))?;
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let action = KeyAction::from_key_event(&key);

        // An open notice swallows the key that closes it
        if self.notice.is_some() {
            if matches!(action, KeyAction::Submit | KeyAction::Back | KeyAction::Quit) {
                self.notice = None;
            }
            return;
        }

        match action {
            KeyAction::Quit => self.should_quit = true,
            KeyAction::Submit => self.on_submit(),
            KeyAction::Upload => {
                self.mode = InputMode::UploadPath;
                self.upload_path.clear();
            }
            KeyAction::Download => {
                // The download button only exists while there are flagged rows
                if self.scorer.download_visible() {
                    self.on_download();
                }
            }
            KeyAction::Back => match self.mode {
                InputMode::UploadPath => {
                    debug!("upload cancelled");
                    self.mode = InputMode::Transaction;
                }
                InputMode::Transaction => self.should_quit = true,
            },
            KeyAction::Insert(c) => self.active_field().insert_char(c),
            KeyAction::Backspace => self.active_field().delete_char(),
            KeyAction::Delete => self.active_field().delete_char_forward(),
            KeyAction::Left => self.active_field().cursor_left(),
            KeyAction::Right => self.active_field().cursor_right(),
            KeyAction::Home => self.active_field().cursor_home(),
            KeyAction::End => self.active_field().cursor_end(),
            KeyAction::None => {}
        }
    }

    fn active_field(&mut self) -> &mut InputField {
        match self.mode {
            InputMode::Transaction => &mut self.transaction,
            InputMode::UploadPath => &mut self.upload_path,
        }
    }

    fn on_submit(&mut self) {
        match self.mode {
            InputMode::Transaction => {
                if let Err(e) = self.scorer.predict_single(&self.transaction.value) {
                    error!(error = %e, "prediction failed");
                    self.notice = Some(Notice::from_error(&e));
                }
            }
            InputMode::UploadPath => {
                self.mode = InputMode::Transaction;
                let path = self.upload_path.value.trim().to_string();
                // An empty path is a cancelled file dialog
                if path.is_empty() {
                    debug!("upload cancelled");
                    return;
                }
                if let Err(e) = self.scorer.predict_bulk(&path) {
                    error!(path = %path, error = %e, "upload failed");
                    self.notice = Some(Notice {
                        title: e.notice_title().to_string(),
                        message: format!("Failed to process file: {}", e),
                    });
                }
            }
        }
    }

    fn on_download(&mut self) {
        let path = self.export_path.clone();
        self.notice = Some(match self.scorer.export_fraud_set(&path) {
            Ok(_) => Notice {
                title: "Saved".to_string(),
                message: format!("Fraud data saved as {}", path.display()),
            },
            Err(e) => {
                error!(error = %e, "export failed");
                Notice::from_error(&e)
            }
        });
    }

    pub fn draw(&self, frame: &mut Frame) {
        let size = frame.area();
        let outer = Block::default()
            .title(format!(" {} ", BANNER))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = outer.inner(size);
        frame.render_widget(outer, size);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // entry
                Constraint::Length(1), // prediction label
                Constraint::Min(6),    // results and chart
                Constraint::Length(1), // key hints
            ])
            .split(inner);

        let focused = self.notice().is_none();
        match self.mode() {
            InputMode::Transaction => self.transaction.render(frame, chunks[0], focused),
            InputMode::UploadPath => self.upload_path.render(frame, chunks[0], focused),
        }
        self.render_prediction(frame, chunks[1]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(chunks[2]);
        self.render_results(frame, body[0]);
        match self.scorer.chart() {
            Some(chart) => chart.render(frame, body[1]),
            None => {
                let placeholder = Paragraph::new("Upload a CSV file to plot flagged transactions")
                    .style(Style::default().fg(Color::DarkGray))
                    .wrap(Wrap { trim: true })
                    .block(Block::default().title(" Chart ").borders(Borders::ALL));
                frame.render_widget(placeholder, body[1]);
            }
        }

        self.render_hints(frame, chunks[3]);

        if let Some(notice) = self.notice() {
            render_notice(frame, size, notice);
        }
    }

    fn render_prediction(&self, frame: &mut Frame, area: Rect) {
        let style = match self.scorer.prediction() {
            Some(verdict) => severity_style(verdict.severity()),
            None => Style::default().fg(Color::Gray),
        };
        let label = Paragraph::new(Span::styled(
            self.scorer.prediction_text(),
            style.add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(label, area);
    }

    fn render_results(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Results ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));

        // Keep the newest messages in view
        let visible = area.height.saturating_sub(2) as usize;
        let results = self.scorer.results();
        let skip = results.len().saturating_sub(visible);
        let items: Vec<ListItem> = results[skip..]
            .iter()
            .map(|m| ListItem::new(Line::from(Span::styled(m.text.as_str(), severity_style(m.severity)))))
            .collect();

        frame.render_widget(List::new(items).block(block), area);
    }

    fn render_hints(&self, frame: &mut Frame, area: Rect) {
        let key = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        let mut spans = match self.mode {
            InputMode::Transaction => vec![
                Span::styled("Enter", key),
                Span::raw(" Predict | "),
                Span::styled("Ctrl+O", key),
                Span::raw(" Upload | "),
            ],
            InputMode::UploadPath => vec![
                Span::styled("Enter", key),
                Span::raw(" Score file | "),
                Span::styled("Esc", key),
                Span::raw(" Cancel | "),
            ],
        };
        if self.scorer.download_visible() {
            spans.push(Span::styled("Ctrl+S", key));
            spans.push(Span::raw(" Download | "));
        }
        spans.push(Span::styled("Ctrl+C", key));
        spans.push(Span::raw(" Quit"));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

fn render_notice(frame: &mut Frame, area: Rect, notice: &Notice) {
    let width = 60.min(area.width.saturating_sub(4));
    let height = 7.min(area.height.saturating_sub(2));
    let popup = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    };

    let border = if notice.title == "Saved" { Color::Green } else { Color::Red };
    let block = Block::default()
        .title(format!(" {} ", notice.title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    let text = vec![
        Line::from(notice.message.as_str()),
        Line::from(""),
        Line::from(Span::styled("Press Enter to close", Style::default().fg(Color::DarkGray))),
    ];

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }).block(block), popup);
}
