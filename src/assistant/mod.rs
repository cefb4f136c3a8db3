//! Answer orchestration: prompt building, tool dispatch, and the client-owning `Assistant`.

pub(crate) mod engine;
pub(crate) mod history;
pub(crate) mod prompts;
pub mod types;

pub use types::{Answer, Source, Turn};

use crate::linkup::{LinkupClient, LinkupError, SearchArgs, SearchResult, WebSearch};
use crate::openai::{OpenAiClient, OpenAiError};

#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("{0}")]
    Completion(#[from] OpenAiError),

    #[error("{0}")]
    Search(#[from] LinkupError),

    #[error("invalid search_linkup arguments: {0}")]
    ToolArguments(#[source] serde_json::Error),
}

/// Produces an answer for a question given the turns that preceded it.
/// Implemented by `Assistant`; the chat shell is tested against mocks.
pub trait Responder {
    async fn respond(&self, question: &str, history: &[Turn]) -> Result<Answer, AnswerError>;
}

/// Owns the API clients for the lifetime of the process.
///
/// Either client may be absent when its key is missing from the environment;
/// the error surfaces on the first call that needs it.
#[derive(Clone, Debug)]
pub struct Assistant {
    openai: Option<OpenAiClient>,
    linkup: Option<LinkupClient>,
}

impl Assistant {
    pub fn new(openai: Option<OpenAiClient>, linkup: Option<LinkupClient>) -> Self {
        Self { openai, linkup }
    }

    fn openai(&self) -> Result<&OpenAiClient, AnswerError> {
        self.openai
            .as_ref()
            .ok_or(AnswerError::Completion(OpenAiError::ApiKeyNotSet))
    }
}

impl Responder for Assistant {
    async fn respond(&self, question: &str, history: &[Turn]) -> Result<Answer, AnswerError> {
        let openai = self.openai()?;
        engine::answer(openai, &self.linkup, question, history).await
    }
}

impl WebSearch for Option<LinkupClient> {
    async fn search(&self, args: &SearchArgs) -> Result<SearchResult, LinkupError> {
        match self {
            Some(client) => client.search(args).await,
            None => Err(LinkupError::ApiKeyNotSet),
        }
    }
}
