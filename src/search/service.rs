//! Question answering over the vector store.

use super::{
    analysis::parse_analysis,
    prompts::{ANALYSIS_SYSTEM_PROMPT, analysis_user_prompt, answer_system_prompt, answer_user_prompt},
    ranking::rank_hits,
    types::{Answer, QueryAnalysis, SearchError, SearchSettings},
};
use crate::{
    language::{Glossary, Language, detect_language, translate_text},
    metrics::{KnowledgeMetrics, MetricsSnapshot},
    openai::{ChatClient, ChatMessage, OpenAiService},
};
use std::sync::Arc;

/// Answers questions from the knowledge base in the language they were asked in.
pub struct SearchService {
    openai: Arc<OpenAiService>,
    chat: Arc<dyn ChatClient>,
    store_id: String,
    settings: SearchSettings,
    glossary: Glossary,
    metrics: Arc<KnowledgeMetrics>,
}

impl SearchService {
    /// Build a search service for one vector store.
    ///
    /// Vector store queries go through `openai`; analysis, answers, and translations go through
    /// `chat`.
    pub fn new(
        openai: Arc<OpenAiService>,
        chat: Arc<dyn ChatClient>,
        store_id: impl Into<String>,
        settings: SearchSettings,
        glossary: Glossary,
    ) -> Self {
        Self {
            openai,
            chat,
            store_id: store_id.into(),
            settings,
            glossary,
            metrics: Arc::new(KnowledgeMetrics::new()),
        }
    }

    /// Answer `question` using the hits most relevant to it.
    pub async fn search_and_respond(&self, question: &str) -> Result<Answer, SearchError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(SearchError::EmptyQuestion);
        }

        let language = detect_language(question);
        let english_question = if language.is_english() {
            question.to_string()
        } else {
            translate_text(self.chat.as_ref(), question, Language::English, &self.glossary).await?
        };

        let analysis = self.analyze(&english_question).await?;
        let results = self
            .openai
            .search_vector_store(&self.store_id, &analysis.search_query, self.settings.max_results)
            .await?;
        let hits = rank_hits(
            &results,
            &analysis,
            self.settings.slack_workspace_url.as_deref(),
            self.settings.context_limit,
        );
        tracing::info!(
            language = %language,
            reclaim = analysis.is_reclaim_query,
            results = results.len(),
            kept = hits.len(),
            "Ranked search results"
        );

        let messages = vec![
            ChatMessage::system(answer_system_prompt(&analysis.main_concept, &self.glossary)),
            ChatMessage::user(answer_user_prompt(&english_question, &hits)),
        ];
        let english_answer = self.chat.chat(messages).await?;
        let text = if language.is_english() {
            english_answer
        } else {
            translate_text(self.chat.as_ref(), &english_answer, language, &self.glossary).await?
        };

        self.metrics.record_query();
        Ok(Answer {
            text,
            language,
            analysis,
            sources: hits,
        })
    }

    /// Return the current query metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn analyze(&self, question: &str) -> Result<QueryAnalysis, SearchError> {
        let messages = vec![
            ChatMessage::system(ANALYSIS_SYSTEM_PROMPT),
            ChatMessage::user(analysis_user_prompt(question)),
        ];
        let reply = self.chat.chat(messages).await?;
        let analysis = parse_analysis(&reply, question);
        tracing::debug!(
            main_concept = %analysis.main_concept,
            search_query = %analysis.search_query,
            exclude_terms = ?analysis.exclude_terms,
            "Analyzed question"
        );
        Ok(analysis)
    }
}
