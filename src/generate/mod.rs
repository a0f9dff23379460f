//! Code generation from search context
//!
//! Search results become numbered context blocks sent to `POST /generate`
//! together with the user's prompt. Users can narrow the context to a subset
//! of documents; an empty selection means "use everything".

use std::collections::BTreeSet;

use thiserror::Error;

use crate::api::{ApiError, GenerateRequest, GenerateResponse, RagApiClient, SearchResult};

/// Model used when none is configured
pub const DEFAULT_MODEL_KEY: &str = "mistral";

/// Fallback text when the backend returned neither artifacts nor code
pub const NO_CODE_GENERATED: &str = "No code generated";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("No context documents available, run a search first")]
    NoContext,

    #[error(transparent)]
    Api(#[from] ApiError),
}

// =============================================================================
// Context Selection
// =============================================================================

/// Set of document ids chosen as generation context
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextSelection {
    selected: BTreeSet<String>,
}

impl ContextSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` if absent, remove it if present; returns whether it is now selected
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.selected.remove(id) {
            false
        } else {
            self.selected.insert(id.to_string());
            true
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected documents in context order, or all of them if nothing is selected
    pub fn documents_to_use<'a>(&self, documents: &'a [SearchResult]) -> Vec<&'a SearchResult> {
        if self.selected.is_empty() {
            return documents.iter().collect();
        }
        documents
            .iter()
            .filter(|doc| self.selected.contains(&doc.id))
            .collect()
    }
}

// =============================================================================
// Request / Response
// =============================================================================

/// Context block sent for one document
pub fn format_context_block(doc: &SearchResult) -> String {
    format!(
        "Title: {}\nContent: {}\nScore: {}\nFile: {}\n---",
        doc.display_title(),
        doc.snippet,
        doc.scores.final_score,
        doc.metadata.file_name.as_deref().unwrap_or("N/A")
    )
}

impl GenerateRequest {
    /// Build a generation request from a prompt and context documents
    pub fn from_context(
        prompt: &str,
        documents: &[&SearchResult],
        model_key: &str,
    ) -> Result<Self, GenerationError> {
        if prompt.trim().is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }
        if documents.is_empty() {
            return Err(GenerationError::NoContext);
        }

        Ok(Self {
            query: prompt.to_string(),
            selected_contents: documents.iter().map(|doc| format_context_block(doc)).collect(),
            model_key: model_key.to_string(),
            top_k: documents.len(),
        })
    }
}

impl GenerateResponse {
    /// First artifact value, else `generated_code`, else a fixed placeholder
    pub fn code(&self) -> String {
        if let Some(first) = self.artifacts.as_ref().and_then(|a| a.values().next()) {
            return match first.as_str() {
                Some(text) => text.to_string(),
                None => first.to_string(),
            };
        }
        self.generated_code
            .clone()
            .unwrap_or_else(|| NO_CODE_GENERATED.to_string())
    }
}

/// Validate, send and extract generated code
pub async fn generate_code(
    client: &RagApiClient,
    prompt: &str,
    documents: &[&SearchResult],
    model_key: &str,
) -> Result<String, GenerationError> {
    let request = GenerateRequest::from_context(prompt, documents, model_key)?;
    tracing::debug!(
        "Generating with {} context documents via {}",
        request.top_k,
        request.model_key
    );
    let response = client.generate(&request).await?;
    Ok(response.code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn docs() -> Vec<SearchResult> {
        vec![
            SearchResult::new("a", "def transform()", 0.9)
                .with_title("Transformer")
                .with_file_name("transform.groovy"),
            SearchResult::new("b", "<xsl:template/>", 0.5),
        ]
    }

    #[test]
    fn test_context_block_format() {
        let docs = docs();
        assert_eq!(
            format_context_block(&docs[0]),
            "Title: Transformer\nContent: def transform()\nScore: 0.9\nFile: transform.groovy\n---"
        );
        assert_eq!(
            format_context_block(&docs[1]),
            "Title: Untitled\nContent: <xsl:template/>\nScore: 0.5\nFile: N/A\n---"
        );
    }

    #[test]
    fn test_selection_toggle() {
        let mut selection = ContextSelection::new();
        assert!(selection.toggle("a"));
        assert!(selection.is_selected("a"));
        assert!(!selection.toggle("a"));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_documents_to_use() {
        let docs = docs();
        let mut selection = ContextSelection::new();
        assert_eq!(selection.documents_to_use(&docs).len(), 2);

        selection.toggle("b");
        let used = selection.documents_to_use(&docs);
        assert_eq!(used.len(), 1);
        assert_eq!(used[0].id, "b");
    }

    #[test]
    fn test_request_from_context() {
        let docs = docs();
        let refs: Vec<&SearchResult> = docs.iter().collect();
        let request = GenerateRequest::from_context("write a mapper", &refs, "mistral").unwrap();
        assert_eq!(request.top_k, 2);
        assert_eq!(request.selected_contents.len(), 2);
        assert_eq!(request.model_key, "mistral");
    }

    #[test]
    fn test_request_validation() {
        let docs = docs();
        let refs: Vec<&SearchResult> = docs.iter().collect();
        assert!(matches!(
            GenerateRequest::from_context("  ", &refs, "mistral"),
            Err(GenerationError::EmptyPrompt)
        ));
        assert!(matches!(
            GenerateRequest::from_context("write", &[], "mistral"),
            Err(GenerationError::NoContext)
        ));
    }

    #[test]
    fn test_code_prefers_first_artifact() {
        let mut artifacts = Map::new();
        artifacts.insert("main.groovy".to_string(), json!("println 'hi'"));
        artifacts.insert("test.groovy".to_string(), json!("assert true"));
        let response = GenerateResponse {
            artifacts: Some(artifacts),
            generated_code: Some("ignored".to_string()),
            elapsed_ms: None,
        };
        assert_eq!(response.code(), "println 'hi'");
    }

    #[test]
    fn test_code_fallbacks() {
        let response = GenerateResponse {
            artifacts: Some(Map::new()),
            generated_code: Some("x = 1".to_string()),
            elapsed_ms: None,
        };
        assert_eq!(response.code(), "x = 1");
        assert_eq!(GenerateResponse::default().code(), NO_CODE_GENERATED);
    }

    #[test]
    fn test_non_string_artifact_is_serialized() {
        let mut artifacts = Map::new();
        artifacts.insert("iflow".to_string(), Value::from(42));
        let response = GenerateResponse {
            artifacts: Some(artifacts),
            ..GenerateResponse::default()
        };
        assert_eq!(response.code(), "42");
    }
}
