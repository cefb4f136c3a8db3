use tracing::debug;

use crate::assistant::{Answer, AnswerError, Responder, Turn};

/// Append-only turn log of one chat session.
#[derive(Debug, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Records `question`, asks `responder` with every earlier turn, and
    /// records the reply. A failed answer is still logged as an assistant
    /// turn carrying the error text and no sources.
    pub async fn ask(
        &mut self,
        responder: &impl Responder,
        question: &str,
    ) -> Result<Answer, AnswerError> {
        let prior = self.turns.len();
        self.turns.push(Turn::user(question));

        match responder.respond(question, &self.turns[..prior]).await {
            Ok(answer) => {
                self.turns.push(Turn::assistant(answer.clone()));
                Ok(answer)
            }
            Err(e) => {
                debug!(error = %e, "answer failed");
                self.turns.push(Turn::assistant(Answer {
                    text: format!("Désolé, une erreur s'est produite: {e}"),
                    sources: Vec::new(),
                }));
                Err(e)
            }
        }
    }
}
