use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

/// Single-field text entry for the onboarding screen. The operator's name is
/// captured once; after a successful submit the form is never shown again.
#[derive(Default, Clone)]
pub(crate) struct NameForm {
    pub(crate) value: String,
    pub(crate) error: Option<String>,
}

impl NameForm {
    /// Append a printable character to the name.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.value.push(ch);
        true
    }

    /// Remove the last character.
    pub(crate) fn backspace(&mut self) {
        self.value.pop();
    }

    /// Render the input line with a placeholder when empty.
    pub(crate) fn build_line(&self) -> Line<'static> {
        let display = if self.value.is_empty() {
            Span::styled("<your name>", Style::default().fg(Color::DarkGray))
        } else {
            Span::styled(self.value.clone(), Style::default().fg(Color::Yellow))
        };
        Line::from(vec![Span::raw("Name: "), display])
    }

    /// Character count, used for cursor placement.
    pub(crate) fn value_len(&self) -> usize {
        self.value.chars().count()
    }
}

/// Multi-line text entry for the per-day summary. The buffer is reseeded from
/// the ledger whenever the day in view changes, so stepping back shows the
/// committed text ready for editing.
#[derive(Default, Clone)]
pub(crate) struct SummaryBox {
    pub(crate) text: String,
}

impl SummaryBox {
    /// Replace the buffer contents, e.g. when navigating to another day.
    pub(crate) fn seed(&mut self, text: &str) {
        self.text = text.to_string();
    }

    /// Append a printable character.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.text.push(ch);
        true
    }

    /// Start a new line within the summary.
    pub(crate) fn newline(&mut self) {
        self.text.push('\n');
    }

    /// Remove the last character (including line breaks).
    pub(crate) fn backspace(&mut self) {
        self.text.pop();
    }

    /// The buffer split into display lines. Always at least one line so the
    /// widget and cursor math have something to work with.
    pub(crate) fn lines(&self) -> Vec<&str> {
        if self.text.is_empty() {
            vec![""]
        } else {
            self.text.split('\n').collect()
        }
    }

    /// Cursor position as (column, row) at the end of the buffer.
    pub(crate) fn cursor(&self) -> (usize, usize) {
        let lines = self.lines();
        let row = lines.len() - 1;
        let column = lines[row].chars().count();
        (column, row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_form_rejects_control_characters() {
        let mut form = NameForm::default();
        assert!(form.push_char('J'));
        assert!(!form.push_char('\u{8}'));
        assert_eq!(form.value, "J");
    }

    #[test]
    fn summary_cursor_tracks_the_last_line() {
        let mut summary = SummaryBox::default();
        assert_eq!(summary.cursor(), (0, 0));
        summary.push_char('a');
        summary.push_char('b');
        summary.newline();
        summary.push_char('c');
        assert_eq!(summary.cursor(), (1, 1));
        summary.backspace();
        summary.backspace();
        assert_eq!(summary.cursor(), (2, 0));
    }
}
