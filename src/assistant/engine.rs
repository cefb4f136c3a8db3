use tracing::{debug, info};

use super::AnswerError;
use super::history::build_input;
use super::prompts::{self, SEARCH_TOOL_NAME};
use super::types::{Answer, Source, Turn};
use crate::linkup::{SearchArgs, WebSearch};
use crate::openai::CompletionClient;
use crate::openai::text::{append_message_text, collect_output_text};
use crate::openai::types::{OutputItem, ResponsesRequest, TextOptions};

/// Answers `question` in at most two completion calls.
///
/// The first call may ask for `search_linkup`; every such request is executed
/// in order and its citable sources collected. If any search ran, a second
/// call without tools rewrites the answer from the first raw search result,
/// and its text replaces whatever the first call produced.
pub async fn answer(
    completions: &impl CompletionClient,
    search: &impl WebSearch,
    question: &str,
    history: &[Turn],
) -> Result<Answer, AnswerError> {
    let request = ResponsesRequest {
        model: completions.model().to_string(),
        input: build_input(question, history),
        text: TextOptions {
            verbosity: completions.verbosity(),
        },
        instructions: Some(prompts::INSTRUCTIONS.to_string()),
        tools: Some(vec![prompts::search_tool()]),
    };
    let response = completions.complete(&request).await?;

    let mut text = String::new();
    let mut tool_results = Vec::new();
    let mut sources = Vec::new();

    for item in &response.output {
        match item {
            OutputItem::Message { content } => append_message_text(content, &mut text),
            OutputItem::FunctionCall {
                name,
                arguments,
                call_id,
            } if name == SEARCH_TOOL_NAME => {
                let args: SearchArgs =
                    serde_json::from_str(arguments).map_err(AnswerError::ToolArguments)?;
                debug!(call_id = ?call_id, query = %args.query, "model requested a search");
                let result = search.search(&args).await?;
                sources.extend(result.sources.iter().filter_map(Source::from_entry));
                tool_results.push(result.raw);
            }
            OutputItem::FunctionCall { name, .. } => {
                debug!(%name, "ignoring call to undeclared tool");
            }
            OutputItem::Other => {}
        }
    }

    // TODO: decide with product whether every search result should feed the follow-up.
    if let Some(first_result) = tool_results.first() {
        if tool_results.len() > 1 {
            debug!(
                discarded = tool_results.len() - 1,
                "follow-up uses the first search result only"
            );
        }
        let follow_up = ResponsesRequest {
            model: completions.model().to_string(),
            input: prompts::follow_up_input(question, first_result),
            text: TextOptions {
                verbosity: completions.verbosity(),
            },
            instructions: Some(prompts::FOLLOW_UP_INSTRUCTIONS.to_string()),
            tools: None,
        };
        let response = completions.complete(&follow_up).await?;
        text = collect_output_text(&response.output);
    }

    info!(
        searches = tool_results.len(),
        sources = sources.len(),
        "answer ready"
    );
    Ok(Answer { text, sources })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linkup::client::into_search_result;
    use crate::linkup::types::{Depth, OutputType, SearchResult};
    use crate::linkup::LinkupError;
    use crate::openai::OpenAiError;
    use crate::openai::types::ResponsesResponse;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const QUESTION: &str = "Explain article L121-2 of the commercial code";

    struct MockCompletion {
        responses: Mutex<VecDeque<ResponsesResponse>>,
        requests: Mutex<Vec<ResponsesRequest>>,
    }

    impl MockCompletion {
        fn with_outputs(outputs: Vec<serde_json::Value>) -> Self {
            Self {
                responses: Mutex::new(
                    outputs
                        .into_iter()
                        .map(|output| serde_json::from_value(json!({ "output": output })).unwrap())
                        .collect(),
                ),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn captured(&self) -> Vec<ResponsesRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl CompletionClient for MockCompletion {
        fn model(&self) -> &str {
            "mock-model"
        }

        async fn complete(
            &self,
            request: &ResponsesRequest,
        ) -> Result<ResponsesResponse, OpenAiError> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or(OpenAiError::RateLimited)
        }
    }

    struct MockSearch {
        results: Mutex<VecDeque<Result<SearchResult, LinkupError>>>,
        args: Mutex<Vec<SearchArgs>>,
    }

    impl MockSearch {
        fn with_bodies(bodies: Vec<serde_json::Value>) -> Self {
            Self {
                results: Mutex::new(bodies.into_iter().map(|b| Ok(into_search_result(b))).collect()),
                args: Mutex::new(Vec::new()),
            }
        }

        fn failing(error: LinkupError) -> Self {
            Self {
                results: Mutex::new(VecDeque::from([Err(error)])),
                args: Mutex::new(Vec::new()),
            }
        }

        fn captured(&self) -> Vec<SearchArgs> {
            self.args.lock().unwrap().clone()
        }
    }

    impl WebSearch for MockSearch {
        async fn search(&self, args: &SearchArgs) -> Result<SearchResult, LinkupError> {
            self.args.lock().unwrap().push(args.clone());
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LinkupError::RateLimited))
        }
    }

    fn message(parts: &[&str]) -> serde_json::Value {
        let content: Vec<_> = parts
            .iter()
            .map(|t| json!({"type": "output_text", "text": t}))
            .collect();
        json!({"type": "message", "role": "assistant", "content": content})
    }

    fn search_call(arguments: &str) -> serde_json::Value {
        json!({
            "type": "function_call",
            "name": SEARCH_TOOL_NAME,
            "arguments": arguments,
            "call_id": "call_1"
        })
    }

    #[tokio::test]
    async fn no_search_returns_first_completion_text() {
        let completions = MockCompletion::with_outputs(vec![json!([
            {"type": "reasoning", "summary": []},
            message(&["L'article L121-2 ", "concerne le conjoint."]),
            message(&[" Fin."])
        ])]);
        let search = MockSearch::with_bodies(vec![]);

        let answer = answer(&completions, &search, QUESTION, &[]).await.unwrap();

        assert_eq!(answer.text, "L'article L121-2 concerne le conjoint. Fin.");
        assert!(answer.sources.is_empty());
        assert!(search.captured().is_empty());

        let requests = completions.captured();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].input, QUESTION);
        assert_eq!(requests[0].model, "mock-model");
        assert_eq!(requests[0].instructions.as_deref(), Some(prompts::INSTRUCTIONS));
        let tools = requests[0].tools.as_ref().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, SEARCH_TOOL_NAME);
    }

    #[tokio::test]
    async fn search_result_drives_follow_up_that_replaces_text() {
        let completions = MockCompletion::with_outputs(vec![
            json!([
                message(&["Je vérifie sur Légifrance."]),
                search_call(r#"{"query": "article L121-2 code de commerce"}"#)
            ]),
            json!([message(&["## Article L121-2", "\nRéponse complète."])]),
        ]);
        let search = MockSearch::with_bodies(vec![json!({
            "answer": "Le conjoint collaborateur...",
            "sources": [
                {"name": "Code de commerce - Article L121-2", "url": "https://www.legifrance.gouv.fr/codes/article_lc/LEGIARTI000006219167"},
                {"name": "Fiche pratique", "snippet": "sans lien"}
            ]
        })]);

        let answer = answer(&completions, &search, QUESTION, &[]).await.unwrap();

        assert_eq!(answer.text, "## Article L121-2\nRéponse complète.");
        assert_eq!(
            answer.sources,
            vec![Source {
                title: "Code de commerce - Article L121-2".into(),
                url: "https://www.legifrance.gouv.fr/codes/article_lc/LEGIARTI000006219167".into(),
            }]
        );

        let args = search.captured();
        assert_eq!(args, vec![SearchArgs::new("article L121-2 code de commerce")]);

        let requests = completions.captured();
        assert_eq!(requests.len(), 2);
        let follow_up = &requests[1];
        assert!(follow_up.tools.is_none());
        assert_eq!(
            follow_up.instructions.as_deref(),
            Some(prompts::FOLLOW_UP_INSTRUCTIONS)
        );
        assert!(follow_up.input.starts_with(&format!("Question: {QUESTION}\nTool results: {{")));
        assert!(follow_up.input.contains("Le conjoint collaborateur..."));
        assert!(follow_up.input.ends_with("Provide a complete answer using this information."));
    }

    #[tokio::test]
    async fn only_first_search_result_feeds_follow_up() {
        let completions = MockCompletion::with_outputs(vec![
            json!([
                search_call(r#"{"query": "L121-2", "depth": "deep"}"#),
                search_call(r#"{"query": "L121-4", "output_type": "searchResults"}"#)
            ]),
            json!([message(&["Synthèse"])]),
        ]);
        let search = MockSearch::with_bodies(vec![
            json!({"answer": "premier", "sources": [{"name": "A", "url": "https://a.gouv.fr"}]}),
            json!({"answer": "second", "sources": [{"name": "B", "url": "https://b.gouv.fr"}]}),
        ]);

        let answer = answer(&completions, &search, QUESTION, &[]).await.unwrap();

        let args = search.captured();
        assert_eq!(args.len(), 2);
        assert_eq!(args[0].depth, Depth::Deep);
        assert_eq!(args[1].output_type, OutputType::SearchResults);

        let titles: Vec<_> = answer.sources.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["A", "B"]);

        let requests = completions.captured();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].input.contains("premier"));
        assert!(!requests[1].input.contains("second"));
    }

    #[tokio::test]
    async fn sources_keep_search_order_and_skip_incomplete_entries() {
        let completions = MockCompletion::with_outputs(vec![
            json!([search_call(r#"{"query": "bail commercial"}"#)]),
            json!([message(&["ok"])]),
        ]);
        let search = MockSearch::with_bodies(vec![json!({
            "sources": [
                {"name": "Un", "url": "https://1.fr"},
                {"url": "https://sans-nom.fr"},
                {"name": "Deux", "url": "https://2.fr"},
                {"name": "Sans URL"},
                {"name": "Trois", "url": "https://3.fr"}
            ]
        })]);

        let answer = answer(&completions, &search, QUESTION, &[]).await.unwrap();

        let urls: Vec<_> = answer.sources.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(urls, ["https://1.fr", "https://2.fr", "https://3.fr"]);
    }

    #[tokio::test]
    async fn search_without_sources_still_triggers_follow_up() {
        let completions = MockCompletion::with_outputs(vec![
            json!([search_call(r#"{"query": "x", "output_type": "searchResults"}"#)]),
            json!([message(&["suite"])]),
        ]);
        let search = MockSearch::with_bodies(vec![json!({"results": []})]);

        let answer = answer(&completions, &search, QUESTION, &[]).await.unwrap();

        assert_eq!(answer.text, "suite");
        assert!(answer.sources.is_empty());
        assert_eq!(completions.captured().len(), 2);
    }

    #[tokio::test]
    async fn malformed_arguments_fail_the_answer() {
        for arguments in ["not json", r#"{"depth": "deep"}"#, r#"{"query": 12}"#] {
            let completions = MockCompletion::with_outputs(vec![json!([
                message(&["texte"]),
                search_call(arguments)
            ])]);
            let search = MockSearch::with_bodies(vec![json!({"sources": []})]);

            let err = answer(&completions, &search, QUESTION, &[]).await.unwrap_err();

            assert!(matches!(err, AnswerError::ToolArguments(_)), "{arguments}: {err:?}");
            assert!(search.captured().is_empty());
            assert_eq!(completions.captured().len(), 1);
        }
    }

    #[tokio::test]
    async fn undeclared_tool_is_ignored() {
        let completions = MockCompletion::with_outputs(vec![json!([
            message(&["réponse directe"]),
            {"type": "function_call", "name": "other_tool", "arguments": "{}", "call_id": "c"}
        ])]);
        let search = MockSearch::with_bodies(vec![]);

        let answer = answer(&completions, &search, QUESTION, &[]).await.unwrap();

        assert_eq!(answer.text, "réponse directe");
        assert_eq!(completions.captured().len(), 1);
    }

    #[tokio::test]
    async fn search_error_propagates() {
        let completions =
            MockCompletion::with_outputs(vec![json!([search_call(r#"{"query": "x"}"#)])]);
        let search = MockSearch::failing(LinkupError::ApiKeyNotSet);

        let err = answer(&completions, &search, QUESTION, &[]).await.unwrap_err();

        assert!(matches!(err, AnswerError::Search(LinkupError::ApiKeyNotSet)));
        assert!(err.to_string().contains("LINKUP_API_KEY"));
    }

    #[tokio::test]
    async fn completion_error_propagates() {
        let completions = MockCompletion::with_outputs(vec![]);
        let search = MockSearch::with_bodies(vec![]);

        let err = answer(&completions, &search, QUESTION, &[]).await.unwrap_err();

        assert!(matches!(err, AnswerError::Completion(OpenAiError::RateLimited)));
    }

    #[tokio::test]
    async fn history_is_folded_into_first_input_only() {
        let completions = MockCompletion::with_outputs(vec![
            json!([search_call(r#"{"query": "x"}"#)]),
            json!([message(&["ok"])]),
        ]);
        let search = MockSearch::with_bodies(vec![json!({"sources": []})]);
        let history: Vec<Turn> = (0..8).map(|i| Turn::user(format!("tour {i}"))).collect();

        answer(&completions, &search, "Nouvelle ?", &history)
            .await
            .unwrap();

        let requests = completions.captured();
        assert!(requests[0].input.starts_with("Contexte de conversation précédente:\n"));
        assert!(!requests[0].input.contains("tour 1\n"));
        assert!(requests[0].input.contains("user: tour 2\n"));
        assert!(requests[1].input.starts_with("Question: Nouvelle ?\n"));
        assert!(!requests[1].input.contains("Contexte"));
    }
}
