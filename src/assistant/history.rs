use std::fmt::Write;

use super::types::Turn;

/// Number of most recent turns replayed to the model as context.
pub const HISTORY_WINDOW: usize = 6;

/// Builds the model input for `question`. Without history the question goes
/// through verbatim; otherwise the last `HISTORY_WINDOW` turns are prepended
/// as `role: content` lines.
pub fn build_input(question: &str, history: &[Turn]) -> String {
    if history.is_empty() {
        return question.to_string();
    }

    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let mut input = String::from("Contexte de conversation précédente:\n");
    for turn in &history[start..] {
        let _ = writeln!(input, "{}: {}", turn.role, turn.content);
    }
    let _ = write!(input, "\nNouvelle question: {question}");
    input
}
