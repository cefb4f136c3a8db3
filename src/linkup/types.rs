use serde::{Deserialize, Serialize};

/// Official French domains every search is restricted to.
pub const ALLOWED_DOMAINS: [&str; 7] = [
    "legifrance.gouv.fr",
    "service-public.fr",
    "conseil-constitutionnel.fr",
    "assemblee-nationale.fr",
    "senat.fr",
    "insee.fr",
    "data.gouv.fr",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    #[default]
    Standard,
    Deep,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputType {
    #[default]
    SourcedAnswer,
    SearchResults,
}

/// Arguments of a `search_linkup` call as emitted by the model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchArgs {
    pub query: String,
    #[serde(default)]
    pub depth: Depth,
    #[serde(default)]
    pub output_type: OutputType,
}

#[cfg(test)]
impl SearchArgs {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            depth: Depth::default(),
            output_type: OutputType::default(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest<'a> {
    pub q: &'a str,
    pub depth: Depth,
    pub output_type: OutputType,
    pub include_domains: &'a [&'a str],
}

impl<'a> SearchRequest<'a> {
    pub fn restricted(args: &'a SearchArgs) -> Self {
        Self {
            q: &args.query,
            depth: args.depth,
            output_type: args.output_type,
            include_domains: &ALLOWED_DOMAINS,
        }
    }
}

/// Typed view over the parts of a search response we read. Every field is
/// optional: a `searchResults` response has no `sources` at all. Entries stay
/// untyped here so one malformed entry cannot hide the others.
#[derive(Debug, Default, Deserialize)]
pub struct SourcedView {
    #[serde(default)]
    pub sources: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceEntry {
    pub name: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Full response body, forwarded verbatim to the follow-up completion.
    pub raw: serde_json::Value,
    pub sources: Vec<SourceEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    pub message: Option<String>,
}
