//! Re-weighting of vector store hits.

use super::metadata::{extract_metadata, slack_link};
use super::types::{QueryAnalysis, RankedHit};
use crate::openai::SearchResult;
use std::cmp::Ordering;

const REQUIREMENT_TERMS: [&str; 7] = [
    "need",
    "require",
    "must have",
    "rules",
    "criteria",
    "only if",
    "mandatory",
];
const LIST_MARKERS: [&str; 8] = ["1:", "2:", "3:", "4:", ":heavy_check_mark:", "✓", "•", "-"];
const SLACK_MARKER: &str = "\"thread_ts\":";

const REQUIREMENT_BOOST: f32 = 1.5;
const LIST_BOOST: f32 = 1.5;
const EXCLUDE_PENALTY: f32 = 0.3;
const RECLAIM_DOCUMENT_BOOST: f32 = 2.0;

/// Multiplier applied for a hit's source on non-reclaim questions.
pub fn source_weight(source: Option<&str>) -> f32 {
    match source {
        Some("official_document") => 2.0,
        Some("product-changes") => 1.75,
        Some("help") => 1.25,
        _ => 1.0,
    }
}

/// Adjust a provider score using the hit's content and source.
pub fn adjust_score(score: f32, content: &str, source: Option<&str>, analysis: &QueryAnalysis) -> f32 {
    let lowered = content.to_lowercase();
    let mut score = score;

    if REQUIREMENT_TERMS.iter().any(|term| lowered.contains(term)) {
        score *= REQUIREMENT_BOOST;
    }
    if LIST_MARKERS.iter().any(|marker| content.contains(marker)) {
        score *= LIST_BOOST;
    }
    if analysis
        .exclude_terms
        .iter()
        .filter(|term| !term.trim().is_empty())
        .any(|term| lowered.contains(&term.to_lowercase()))
    {
        score *= EXCLUDE_PENALTY;
    }

    if analysis.is_reclaim_query {
        // Reclaim answers come from official documents only.
        if content.contains(SLACK_MARKER) {
            return 0.0;
        }
        return score * RECLAIM_DOCUMENT_BOOST;
    }
    score * source_weight(source)
}

/// Score, filter, and order hits, keeping at most `limit`.
pub fn rank_hits(
    results: &[SearchResult],
    analysis: &QueryAnalysis,
    slack_workspace_url: Option<&str>,
    limit: usize,
) -> Vec<RankedHit> {
    let mut hits: Vec<RankedHit> = results
        .iter()
        .filter_map(|result| {
            let content = result.text();
            let metadata = extract_metadata(&content);
            let score = adjust_score(
                result.score,
                &content,
                metadata.source.as_deref(),
                analysis,
            );
            if score <= 0.0 {
                return None;
            }
            let link = metadata.thread_ts.as_deref().and_then(|thread_ts| {
                slack_link(slack_workspace_url, thread_ts, metadata.source.as_deref())
            });
            Some(RankedHit {
                content,
                score,
                source: metadata.source,
                document_name: metadata.document_name,
                slack_link: link,
            })
        })
        .collect();

    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    hits.truncate(limit);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai::SearchContent;

    fn analysis(is_reclaim_query: bool, exclude_terms: &[&str]) -> QueryAnalysis {
        QueryAnalysis {
            main_concept: "reclaim exceptions".into(),
            search_query: "reclaim exceptions".into(),
            exclude_terms: exclude_terms.iter().map(|term| term.to_string()).collect(),
            is_reclaim_query,
        }
    }

    fn hit(score: f32, text: &str) -> SearchResult {
        SearchResult {
            file_id: "file-1".into(),
            filename: Some("rustykb.json".into()),
            score,
            attributes: None,
            content: vec![SearchContent {
                kind: "text".into(),
                text: text.into(),
            }],
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn requirement_and_list_boosts_stack() {
        let plain = adjust_score(1.0, "Plain text", None, &analysis(false, &[]));
        let boosted = adjust_score(
            1.0,
            "Criteria 1: materials bought",
            None,
            &analysis(false, &[]),
        );
        assert!(approx(plain, 1.0));
        assert!(approx(boosted, 2.25));
    }

    #[test]
    fn exclude_terms_penalize_case_insensitively() {
        let score = adjust_score(1.0, "Leave a Review", None, &analysis(false, &["review"]));
        assert!(approx(score, 0.3));
        let blank = adjust_score(1.0, "Leave a Review", None, &analysis(false, &[" "]));
        assert!(approx(blank, 1.0));
    }

    #[test]
    fn source_weights_apply_to_regular_questions() {
        let question = analysis(false, &[]);
        assert!(approx(adjust_score(1.0, "x", Some("official_document"), &question), 2.0));
        assert!(approx(adjust_score(1.0, "x", Some("product-changes"), &question), 1.75));
        assert!(approx(adjust_score(1.0, "x", Some("help"), &question), 1.25));
        assert!(approx(adjust_score(1.0, "x", Some("customer-success"), &question), 1.0));
        assert!(approx(adjust_score(1.0, "x", Some("elsewhere"), &question), 1.0));
    }

    #[test]
    fn reclaim_questions_drop_slack_hits() {
        let reclaim = analysis(true, &[]);
        let slack = r#"{"text": "ok", "metadata": {"thread_ts": "1.2"}}"#;
        assert_eq!(adjust_score(1.0, slack, Some("help"), &reclaim), 0.0);
        assert!(approx(adjust_score(1.0, "guideline", Some("help"), &reclaim), 2.0));
    }

    #[test]
    fn rank_hits_sorts_filters_and_truncates() {
        let results = vec![
            hit(0.5, r#"{"text": "Ask in the thread", "metadata": {"source": "help", "thread_ts": "1707300000.000100"}}"#),
            hit(0.4, r#"{"text": "Guideline", "metadata": {"source": "official_document", "file_name": "Reclaim Guideline 2025.xlsx"}}"#),
            hit(0.7, "unrelated"),
            hit(0.1, "last"),
        ];

        let ranked = rank_hits(
            &results,
            &analysis(false, &[]),
            Some("https://example.slack.com"),
            3,
        );
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].document_name.as_deref(), Some("Reclaim Guideline 2025.xlsx"));
        assert!(approx(ranked[0].score, 0.8));
        assert_eq!(ranked[1].content, "unrelated");
        assert_eq!(ranked[2].source.as_deref(), Some("help"));
        assert_eq!(
            ranked[2].slack_link.as_deref(),
            Some("https://example.slack.com/archives/help/p1707300000000100")
        );

        let reclaim = rank_hits(&results, &analysis(true, &[]), None, 8);
        assert_eq!(reclaim.len(), 3);
        assert!(reclaim.iter().all(|hit| hit.slack_link.is_none()));
        assert!(reclaim.iter().all(|hit| !hit.content.contains("thread_ts")));
    }
}
