use std::fmt;

use crate::linkup::types::SourceEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cited document: title and URL as reported by the search API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub title: String,
    pub url: String,
}

impl Source {
    /// Entries lacking a name or a URL are not citable and yield `None`.
    pub fn from_entry(entry: &SourceEntry) -> Option<Self> {
        Some(Self {
            title: entry.name.clone()?,
            url: entry.url.clone()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub sources: Vec<Source>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            sources: Vec::new(),
        }
    }

    pub fn assistant(answer: Answer) -> Self {
        Self {
            role: Role::Assistant,
            content: answer.text,
            sources: answer.sources,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<Source>,
}
