//! Search pipeline types and errors.

use crate::{config::Config, language::Language, openai::OpenAiError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the search pipeline.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The question was blank.
    #[error("question must not be empty")]
    EmptyQuestion,
    /// A provider call failed.
    #[error(transparent)]
    Provider(#[from] OpenAiError),
}

/// How the chat model interpreted a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnalysis {
    /// Primary concept the question is about.
    pub main_concept: String,
    /// Query sent to the vector store.
    pub search_query: String,
    /// Terms whose presence makes a hit less relevant.
    #[serde(default)]
    pub exclude_terms: Vec<String>,
    /// Whether the question concerns reclaims, disputes, or chargebacks.
    #[serde(default)]
    pub is_reclaim_query: bool,
}

/// A search hit after ranking, with recovered provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedHit {
    /// Hit text.
    pub content: String,
    /// Adjusted relevance score.
    pub score: f32,
    /// Source label, if one could be recovered.
    pub source: Option<String>,
    /// Originating document name.
    pub document_name: Option<String>,
    /// Slack permalink for conversation hits.
    pub slack_link: Option<String>,
}

/// Final answer returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    /// Answer text in the language of the question.
    pub text: String,
    /// Language the question was asked in.
    pub language: Language,
    /// Interpretation used for retrieval.
    pub analysis: QueryAnalysis,
    /// Hits the answer was generated from, best first.
    pub sources: Vec<RankedHit>,
}

/// Retrieval tunables.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Hits requested from the vector store.
    pub max_results: usize,
    /// Hits kept after ranking.
    pub context_limit: usize,
    /// Workspace base URL used to build Slack permalinks.
    pub slack_workspace_url: Option<String>,
}

impl SearchSettings {
    /// Derive settings from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_results: config.search_max_results,
            context_limit: config.search_context_limit,
            slack_workspace_url: config.slack_workspace_url.clone(),
        }
    }
}
