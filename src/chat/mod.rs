//! Terminal presentation: the interactive chat loop and answer rendering.

mod conversation;
pub mod render;

use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::info;

use crate::assistant::Responder;
use conversation::Conversation;

const BANNER: &str = "Assistant juridique (droit français)\n\
Sources limitées aux domaines officiels français.\n\
Commandes: /clear efface la conversation, /count affiche le nombre de messages, \
/history réaffiche la conversation, /quit quitte.\n";
const PROMPT: &str = "\n> ";

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Empty,
    Clear,
    Count,
    History,
    Quit,
    Ask(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        match line.trim() {
            "" => Command::Empty,
            "/clear" => Command::Clear,
            "/count" => Command::Count,
            "/history" => Command::History,
            "/quit" | "/exit" => Command::Quit,
            _ => Command::Ask(line),
        }
    }
}

/// Reads questions line by line from `input` until `/quit` or end of input.
/// Answer failures are printed and logged as turns; only I/O errors end the loop early.
pub async fn run<R, W>(responder: &impl Responder, input: R, mut out: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut conversation = Conversation::new();
    let mut lines = input.lines();

    out.write_all(BANNER.as_bytes()).await?;

    loop {
        out.write_all(PROMPT.as_bytes()).await?;
        out.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match Command::parse(&line) {
            Command::Empty => {}
            Command::Quit => break,
            Command::Clear => {
                conversation.clear();
                out.write_all("Conversation effacée.\n".as_bytes()).await?;
            }
            Command::Count => {
                let count = conversation.turns().len();
                out.write_all(format!("Messages dans la conversation: {count}\n").as_bytes())
                    .await?;
            }
            Command::History => {
                out.write_all(render::transcript(conversation.turns()).as_bytes())
                    .await?;
            }
            Command::Ask(question) => {
                out.write_all(b"Recherche en cours...\n").await?;
                out.flush().await?;
                let rendered = match conversation.ask(responder, question).await {
                    Ok(answer) => render::chat_answer(&answer),
                    Err(e) => format!("Erreur: {e}\n"),
                };
                out.write_all(rendered.as_bytes()).await?;
            }
        }
    }

    info!(turns = conversation.turns().len(), "chat session ended");
    out.flush().await
}
