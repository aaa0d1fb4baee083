use super::types::QueryAnalysis;

const RECLAIM_KEYWORDS: [&str; 3] = ["reclaim", "dispute", "chargeback"];

/// Parse the analyzer reply, falling back to the question itself when it is unusable.
pub fn parse_analysis(reply: &str, question: &str) -> QueryAnalysis {
    match serde_json::from_str::<QueryAnalysis>(strip_code_fence(reply)) {
        Ok(mut analysis) => {
            if analysis.search_query.trim().is_empty() {
                analysis.search_query = question.to_string();
            }
            if analysis.main_concept.trim().is_empty() {
                analysis.main_concept = question.to_string();
            }
            analysis
        }
        Err(error) => {
            tracing::warn!(error = %error, "Query analysis was not valid JSON; using the question");
            fallback_analysis(question)
        }
    }
}

/// Analysis derived from the question alone.
pub fn fallback_analysis(question: &str) -> QueryAnalysis {
    let lowered = question.to_lowercase();
    QueryAnalysis {
        main_concept: question.to_string(),
        search_query: question.to_string(),
        exclude_terms: Vec::new(),
        is_reclaim_query: RECLAIM_KEYWORDS
            .iter()
            .any(|keyword| lowered.contains(keyword)),
    }
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}
