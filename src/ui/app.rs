use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::export::ExportArtifact;
use crate::session::{Phase, Session};

use super::forms::{NameForm, SummaryBox};
use super::helpers::{centered_rect, day_detail_lines, surface_error};

/// Footer space reserved for the status message and key hints.
const FOOTER_HEIGHT: u16 = 3;
/// Rows for the patient header block (border + three content lines).
const PATIENT_HEADER_HEIGHT: u16 = 5;
/// Rows for the summary entry box.
const SUMMARY_HEIGHT: u16 = 7;

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI. The session owns every
/// piece of workflow state; the app adds only presentation concerns (entry
/// buffers, scroll position, footer status).
pub struct App {
    session: Session,
    out_dir: PathBuf,
    name_form: NameForm,
    summary: SummaryBox,
    chart_scroll: u16,
    chart_max_scroll: u16,
    follow_chart: bool,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(session: Session, out_dir: PathBuf) -> Self {
        Self {
            session,
            out_dir,
            name_form: NameForm::default(),
            summary: SummaryBox::default(),
            chart_scroll: 0,
            chart_max_scroll: 0,
            follow_chart: true,
            status: None,
        }
    }

    /// Dispatch one key press. Returns `true` when the app should exit.
    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match self.session.phase() {
            Phase::Onboarding => Ok(self.handle_onboarding_key(key)),
            Phase::Reviewing => Ok(self.handle_reviewing_key(key)),
            Phase::AllComplete => Ok(matches!(
                key.code,
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter
            )),
        }
    }

    fn handle_onboarding_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Esc => return true,
            KeyCode::Enter => match self.session.set_operator_identity(&self.name_form.value) {
                Ok(()) => {
                    self.name_form.error = None;
                    self.sync_summary();
                    self.set_status(
                        format!(
                            "Welcome, {}. {} patient(s) to review.",
                            self.session.operator().unwrap_or_default(),
                            self.session.patient_count(),
                        ),
                        StatusKind::Info,
                    );
                }
                Err(err) => self.name_form.error = Some(err.to_string()),
            },
            KeyCode::Backspace => self.name_form.backspace(),
            KeyCode::Char(ch) => {
                if self.name_form.push_char(ch) {
                    self.name_form.error = None;
                }
            }
            _ => {}
        }
        false
    }

    fn handle_reviewing_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('p') => self.step_back_day(),
                KeyCode::Char('n') => self.advance_day(),
                KeyCode::Char('s') => self.save_current_patient(),
                KeyCode::Char('d') => self.download_artifact(),
                KeyCode::Char('k') => self.skip_patient(),
                KeyCode::Char('r') => self.redo_previous_patient(),
                KeyCode::Char('q') => return true,
                _ => {}
            }
            return false;
        }

        match key.code {
            KeyCode::Esc => return true,
            KeyCode::Up => self.scroll_chart_up(),
            KeyCode::Down => self.scroll_chart_down(),
            KeyCode::Enter => {
                self.summary.newline();
                self.status = None;
            }
            KeyCode::Backspace => self.summary.backspace(),
            KeyCode::Char(ch) => {
                if self.summary.push_char(ch) {
                    self.status = None;
                }
            }
            _ => {}
        }
        false
    }

    /// Reload the summary buffer from the ledger for the day now in view and
    /// snap the running chart back to following the latest day.
    fn sync_summary(&mut self) {
        let saved = self
            .session
            .current_day()
            .and_then(|day| self.session.annotation(day))
            .unwrap_or_default()
            .to_string();
        self.summary.seed(&saved);
        self.chart_scroll = 0;
        self.follow_chart = true;
    }

    fn step_back_day(&mut self) {
        if !self.session.can_previous_day() {
            self.set_status("Already on the first cycle day.", StatusKind::Error);
            return;
        }
        self.session.previous_day();
        self.sync_summary();
        self.status = None;
    }

    fn advance_day(&mut self) {
        if self.session.is_final_day() {
            self.set_status(
                "This is the final cycle day; Ctrl+S saves and prepares the download.",
                StatusKind::Error,
            );
            return;
        }
        match self.session.next_day(&self.summary.text) {
            Ok(()) => {
                self.sync_summary();
                self.status = None;
            }
            Err(err) => self.set_status(err.to_string(), StatusKind::Error),
        }
    }

    fn save_current_patient(&mut self) {
        if !self.session.is_final_day() {
            self.set_status(
                "Saving is available once you reach the final cycle day.",
                StatusKind::Error,
            );
            return;
        }
        match self.session.save_and_export(&self.summary.text) {
            Ok(()) => {
                let filename = self
                    .session
                    .pending_export()
                    .map(|artifact| artifact.filename.clone())
                    .unwrap_or_default();
                self.sync_summary();
                self.set_status(
                    format!("Final summary saved. Ctrl+D downloads {filename}."),
                    StatusKind::Info,
                );
            }
            Err(err) => self.set_status(err.to_string(), StatusKind::Error),
        }
    }

    fn download_artifact(&mut self) {
        let Some(artifact) = self.session.pending_export().cloned() else {
            self.set_status(
                "No annotated table is ready to download yet.",
                StatusKind::Error,
            );
            return;
        };
        match write_artifact(&self.out_dir, &artifact) {
            Ok(path) => self.set_status(
                format!("Annotated table written to {}.", path.display()),
                StatusKind::Info,
            ),
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    fn skip_patient(&mut self) {
        self.session.next_patient();
        self.sync_summary();
        if self.session.phase() == Phase::AllComplete {
            self.status = None;
        } else {
            self.set_status("Moving to next patient.", StatusKind::Info);
        }
    }

    fn redo_previous_patient(&mut self) {
        if !self.session.can_previous_patient() {
            self.set_status("Already on the first patient.", StatusKind::Error);
            return;
        }
        self.session.previous_patient();
        self.sync_summary();
        self.set_status("Redoing previous patient from day 1.", StatusKind::Info);
    }

    fn scroll_chart_up(&mut self) {
        let base = if self.follow_chart {
            self.chart_max_scroll
        } else {
            self.chart_scroll
        };
        self.chart_scroll = base.saturating_sub(1);
        self.follow_chart = false;
    }

    fn scroll_chart_down(&mut self) {
        if self.follow_chart {
            return;
        }
        self.chart_scroll = self.chart_scroll.saturating_add(1);
        if self.chart_scroll >= self.chart_max_scroll {
            self.chart_scroll = self.chart_max_scroll;
            self.follow_chart = true;
        }
    }

    fn set_status(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    pub(crate) fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        match self.session.phase() {
            Phase::Onboarding => self.draw_onboarding(frame, area),
            Phase::Reviewing => self.draw_reviewing(frame, area),
            Phase::AllComplete => self.draw_all_complete(frame, area),
        }
    }

    fn draw_onboarding(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Ovarian Stimulation Cycle Annotation")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            Line::from("Please enter your name to begin annotating:"),
            Line::from(""),
            self.name_form.build_line(),
            Line::from(""),
        ];
        if let Some(error) = &self.name_form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to begin, Esc to quit",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let cursor_x = inner.x + "Name: ".len() as u16 + self.name_form.value_len() as u16;
        frame.set_cursor_position((cursor_x, inner.y + 2));
    }

    fn draw_reviewing(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(PATIENT_HEADER_HEIGHT),
                Constraint::Min(3),
                Constraint::Length(SUMMARY_HEIGHT),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_title(frame, chunks[0]);
        self.draw_patient_header(frame, chunks[1]);
        self.draw_running_chart(frame, chunks[2]);
        self.draw_summary_box(frame, chunks[3]);
        self.draw_footer(frame, chunks[4]);
    }

    fn draw_title(&self, frame: &mut Frame, area: Rect) {
        let title = Line::from(vec![
            Span::styled(
                "Ovarian Stimulation Cycle Annotation",
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(
                "   Nurse: {}",
                self.session.operator().unwrap_or_default()
            )),
        ]);
        frame.render_widget(Paragraph::new(title), area);
    }

    fn draw_patient_header(&self, frame: &mut Frame, area: Rect) {
        let Some(group) = self.session.current_patient() else {
            return;
        };
        let Some(current_day) = self.session.current_day() else {
            return;
        };

        let info = group.first();
        let header = Paragraph::new(vec![
            Line::from(vec![
                Span::styled(
                    group.patient.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(
                    "   Cycle Day {current_day} (day {} of {}, patient {} of {})",
                    self.session.day_index() + 1,
                    group.day_count(),
                    self.session.patient_index() + 1,
                    self.session.patient_count(),
                )),
            ]),
            Line::from(vec![
                Span::styled("Protocol: ", Style::default().fg(Color::DarkGray)),
                Span::raw(info.protocol.clone()),
                Span::styled("   AMH: ", Style::default().fg(Color::DarkGray)),
                Span::raw(info.amh.clone()),
            ]),
            Line::from(vec![
                Span::styled("Cycle Notes: ", Style::default().fg(Color::DarkGray)),
                Span::raw(info.cycle_notes.clone()),
            ]),
        ])
        .block(Block::default().borders(Borders::ALL).title("Patient"));
        frame.render_widget(header, area);
    }

    fn draw_running_chart(&mut self, frame: &mut Frame, area: Rect) {
        let Some(current_day) = self.session.current_day() else {
            return;
        };
        let Some(group) = self.session.current_patient() else {
            return;
        };

        let mut lines = Vec::new();
        for record in &group.records {
            if record.cycle_day > current_day {
                break;
            }
            lines.extend(day_detail_lines(
                record,
                self.session.annotation(record.cycle_day),
            ));
        }

        let inner_height = area.height.saturating_sub(2);
        let max_scroll = (lines.len() as u16).saturating_sub(inner_height);
        self.chart_max_scroll = max_scroll;
        let scroll = if self.follow_chart {
            max_scroll
        } else {
            self.chart_scroll.min(max_scroll)
        };

        let chart = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0))
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Cycle Days through Day {current_day} (Up/Down to scroll)"
            )));
        frame.render_widget(chart, area);
    }

    fn draw_summary_box(&self, frame: &mut Frame, area: Rect) {
        let Some(current_day) = self.session.current_day() else {
            return;
        };

        let title = if self.session.is_final_day() {
            format!("Final Summary for Cycle Day {current_day} (3-4 sentences for the patient)")
        } else {
            format!("Summary for Cycle Day {current_day} (3-4 sentences for the patient)")
        };
        let block = Block::default().borders(Borders::ALL).title(title);
        let inner = block.inner(area);

        let lines: Vec<Line> = self.summary.lines().into_iter().map(Line::from).collect();
        let paragraph = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(block);
        frame.render_widget(paragraph, area);

        let (column, row) = self.summary.cursor();
        let cursor_x = (inner.x + column as u16).min(inner.x + inner.width.saturating_sub(1));
        let cursor_y = (inner.y + row as u16).min(inner.y + inner.height.saturating_sub(1));
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let mut spans = Vec::new();

        if self.session.is_final_day() {
            spans.push(Span::styled("[Ctrl+S]", key_style));
            spans.push(Span::raw(" Save & Prepare Download   "));
            if self.session.ready_to_export() {
                spans.push(Span::styled("[Ctrl+D]", key_style));
                spans.push(Span::raw(" Download   "));
            }
        } else {
            spans.push(Span::styled("[Ctrl+N]", key_style));
            spans.push(Span::raw(" Next Day   "));
        }
        if self.session.can_previous_day() {
            spans.push(Span::styled("[Ctrl+P]", key_style));
            spans.push(Span::raw(" Previous Day   "));
        }
        spans.push(Span::styled("[Ctrl+K]", key_style));
        spans.push(Span::raw(" Next Patient   "));
        if self.session.can_previous_patient() {
            spans.push(Span::styled("[Ctrl+R]", key_style));
            spans.push(Span::raw(" Redo Patient   "));
        }
        spans.push(Span::styled("[Esc]", key_style));
        spans.push(Span::raw(" Quit"));

        Line::from(spans)
    }

    fn draw_all_complete(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 30, area);
        let message = Paragraph::new(vec![
            Line::from(Span::styled(
                "All patients have been reviewed!",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press q or Esc to exit."),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(message, popup_area);
    }
}

/// Write a pending artifact into the output directory, creating it if needed.
fn write_artifact(out_dir: &Path, artifact: &ExportArtifact) -> Result<PathBuf> {
    fs::create_dir_all(out_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            out_dir.display()
        )
    })?;
    let path = out_dir.join(&artifact.filename);
    fs::write(&path, artifact.csv.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
