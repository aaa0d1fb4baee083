//! Knowledge base search: query analysis, retrieval, ranking, and answer generation.

mod analysis;
mod metadata;
mod prompts;
mod ranking;
mod service;
mod types;

pub use analysis::{fallback_analysis, parse_analysis};
pub use metadata::{HitMetadata, extract_metadata, slack_link};
pub use prompts::NO_EXCEPTION_RULE;
pub use ranking::{adjust_score, rank_hits, source_weight};
pub use service::SearchService;
pub use types::{Answer, QueryAnalysis, RankedHit, SearchError, SearchSettings};
