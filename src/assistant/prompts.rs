use serde_json::json;

use crate::openai::types::FunctionTool;

pub const SEARCH_TOOL_NAME: &str = "search_linkup";

pub const INSTRUCTIONS: &str = "Vous êtes un assistant juridique spécialisé dans le droit français. \
Répondez de manière précise, professionnelle et pédagogique. \
Citez toujours les articles de loi pertinents avec leurs références exactes. \
Structurez vos réponses avec des titres clairs. \
Adaptez votre niveau de langage à l'interlocuteur tout en restant rigoureux juridiquement. \
Si une question sort de votre domaine d'expertise juridique, redirigez vers les bonnes ressources. \
Utilisez un ton bienveillant mais autoritaire sur les questions de droit.";

pub const FOLLOW_UP_INSTRUCTIONS: &str = "Vous êtes un assistant juridique spécialisé dans le droit français. \
Répondez de manière précise, professionnelle et détaillée. \
Citez toujours les articles de loi pertinents avec leurs références exactes. \
Structurez vos réponses avec des titres clairs. \
Adaptez votre niveau de langage à l'interlocuteur tout en restant rigoureux juridiquement. \
Si une question sort de votre domaine d'expertise juridique, redirigez vers les bonnes ressources. \
Utilisez un ton bienveillant mais autoritaire sur les questions de droit. \
Répondez en format markdown.";

pub fn search_tool() -> FunctionTool {
    FunctionTool {
        kind: "function",
        name: SEARCH_TOOL_NAME.to_string(),
        description: "Search for information using Linkup API to get current web information"
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to find information on the web"
                },
                "depth": {
                    "type": "string",
                    "enum": ["standard", "deep"],
                    "description": "The depth of search to perform. Standard for quick results, deep for comprehensive search."
                },
                "output_type": {
                    "type": "string",
                    "enum": ["sourcedAnswer", "searchResults"],
                    "description": "Type of output to return. sourcedAnswer for a complete answer with sources, searchResults for raw search results."
                }
            },
            "required": ["query"]
        }),
    }
}

/// Input of the second completion: the user question and one raw search result.
pub fn follow_up_input(question: &str, tool_result: &serde_json::Value) -> String {
    format!(
        "Question: {question}\nTool results: {tool_result}\nProvide a complete answer using this information."
    )
}
