use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::models::CycleRecord;

/// Build the textual payload for one cycle day in the running chart: the
/// day's measurements plus the saved summary when one has been committed.
pub(crate) fn day_detail_lines(
    record: &CycleRecord,
    annotation: Option<&str>,
) -> Vec<Line<'static>> {
    let label_style = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        Line::from(Span::styled(
            format!("Cycle Day {}", record.cycle_day),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  E2: ", label_style),
            Span::raw(record.e2.clone()),
            Span::styled("   P4: ", label_style),
            Span::raw(record.p4.clone()),
        ]),
        Line::from(vec![
            Span::styled("  Left Ovary Follicles: ", label_style),
            Span::raw(record.left_follicles.clone()),
            Span::styled("   Right Ovary Follicles: ", label_style),
            Span::raw(record.right_follicles.clone()),
        ]),
        Line::from(vec![
            Span::styled("  Medication: ", label_style),
            Span::raw(record.medication.clone()),
        ]),
        Line::from(vec![
            Span::styled("  Clinician Instruction: ", label_style),
            Span::raw(record.clinician_instruction.clone()),
        ]),
    ];

    if let Some(summary) = annotation {
        lines.push(Line::from(vec![
            Span::styled("  Saved Summary: ", Style::default().fg(Color::Green)),
            Span::styled(summary.to_string(), Style::default().fg(Color::Green)),
        ]));
    }
    lines.push(Line::from(""));
    lines
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}
