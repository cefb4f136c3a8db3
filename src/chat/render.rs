use std::fmt::Write;

use crate::assistant::types::Role;
use crate::assistant::{Answer, Source, Turn};
use crate::markdown::escape_md_link;

/// Plain-text report of the one-shot run.
pub fn one_shot(answer: &Answer) -> String {
    let mut out = format!(
        "Réponse: {}\n\nSources trouvées: {}\n",
        answer.text,
        answer.sources.len()
    );
    for (i, source) in answer.sources.iter().enumerate() {
        let _ = writeln!(out, "{}. {}: {}", i + 1, source.title, source.url);
    }
    out
}

/// Answer text followed by a numbered block of Markdown links, if any.
pub fn chat_answer(answer: &Answer) -> String {
    let mut out = answer.text.clone();
    out.push('\n');
    if !answer.sources.is_empty() {
        out.push('\n');
        out.push_str(&sources_block(&answer.sources));
    }
    out
}

/// Every turn of the session, oldest first, with each assistant turn's sources.
pub fn transcript(turns: &[Turn]) -> String {
    if turns.is_empty() {
        return "Aucun message.\n".to_string();
    }
    let mut out = String::new();
    for turn in turns {
        let label = match turn.role {
            Role::User => "Vous",
            Role::Assistant => "Assistant",
        };
        let _ = writeln!(out, "[{label}] {}", turn.content);
        if !turn.sources.is_empty() {
            out.push_str(&sources_block(&turn.sources));
        }
        out.push('\n');
    }
    out
}

fn sources_block(sources: &[Source]) -> String {
    let mut out = String::from("### 📚 Sources:\n");
    for (i, source) in sources.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. [{}]({})",
            i + 1,
            escape_md_link(&source.title),
            escape_md_link(&source.url)
        );
    }
    out
}
