//! Prompt templates for query analysis and answer generation.

use super::types::RankedHit;
use crate::language::Glossary;
use serde_json::{Value, json};

pub(crate) const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are a search query analyzer. Analyze the query and return ONLY a JSON object with exactly these fields:
{
    "main_concept": "the primary concept being asked about",
    "search_query": "the enhanced search query to find relevant information",
    "exclude_terms": ["terms", "that", "should", "reduce", "relevance"],
    "is_reclaim_query": false
}

Your task:
1. For reclaim/dispute/chargeback queries:
   - Set is_reclaim_query to true
   - Focus search_query on finding official guidelines and exceptions
   - Include terms like "guideline", "exception", "rule", "policy"
   - For profession/role-specific queries (e.g. DJs, vloerleggers, mediators):
     * Include both the profession name and "general exceptions"
     * Keep profession names in original language (don't translate)
2. For other queries:
   - Keep search focused on the specific topic
   - Include synonyms and related terms
3. Always identify terms that could lead to irrelevant results in exclude_terms

Example for reclaim query "what are exceptions for vloerleggers?":
{
    "main_concept": "vloerleggers reclaim exceptions",
    "search_query": "vloerleggers general exceptions reclaim guideline materiaal gekocht",
    "exclude_terms": ["review", "profile"],
    "is_reclaim_query": true
}

IMPORTANT: Return ONLY the JSON object, no other text."#;

/// Rule quoted when no specific reclaim exception applies.
pub const NO_EXCEPTION_RULE: &str = "If you can't find the exception you are looking for - it's not an exception! And therefore needs to be denied";

pub(crate) fn analysis_user_prompt(question: &str) -> String {
    format!("Analyze this query: {question}")
}

pub(crate) fn answer_system_prompt(main_concept: &str, glossary: &Glossary) -> String {
    format!(
        "You are a helpful customer success assistant. Answer questions accurately and professionally.

Topic: {main_concept}

Guidelines:
- Focus on information directly relevant to the question asked
- Keep different concepts separate and distinct
- If listing requirements or steps, use a clear numbered list
- Each item should be complete and on its own line
- Double-check that all numbered items are present and properly formatted
- For document sources, cite as [Document: filename]
- For Slack messages, use [Source](link) format
- Always include the source of information
- Keep responses clear and concise

Language and Terminology Guidelines:
- ALWAYS use these exact terms regardless of response language: {terms}
- Never translate them to other terms like \"herroeping\" or \"terugvordering\"
- Keep document names and system terms in English
- This applies to ALL languages; these are company standard terms

When answering reclaim exception queries:
- ALWAYS start with the specific exception if found
- If a specific exception exists, quote it exactly as written
- If NO specific exception is found, cite the general rule:
  \"{NO_EXCEPTION_RULE}\"
- Be explicit about whether exceptions are allowed or not
- Always cite the source document

Other guidelines:
- Stay focused on the specific concept being asked about
- Do not mix information about different features or concepts
- If answering whether something is allowed/valid, clearly state yes/no and explain why
- Prioritize explicit statements and lists from official documents",
        terms = glossary.quoted(),
    )
}

pub(crate) fn answer_user_prompt(question: &str, hits: &[RankedHit]) -> String {
    let sources: Vec<Value> = hits
        .iter()
        .map(|hit| {
            json!({
                "content": hit.content,
                "source": hit.slack_link.as_ref().or(hit.source.as_ref()),
                "document_name": hit.document_name.as_deref().unwrap_or("Unknown Document"),
            })
        })
        .collect();

    format!(
        "Question: {question}

Sources:
{sources:#}

Based on these sources, please provide a clear and specific answer to the question. \
For document sources, cite them as [Document: filename]. IMPORTANT: Always use the term \
'reclaim' or 'reclameren' regardless of the response language - these are company standard terms.",
        sources = Value::Array(sources),
    )
}
