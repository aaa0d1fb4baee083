use std::sync::Once;

use rustykb::{
    config,
    language::{Glossary, Language, translate_text},
    openai::{ChatClient, ChatMessage, OpenAiService},
    search::{SearchService, SearchSettings},
    upload::load_store_id,
};
use std::sync::Arc;

static INIT: Once = Once::new();

fn init_config_once() -> &'static config::Config {
    INIT.call_once(|| {
        config::init_config().expect("OPENAI_API_KEY must be set for live tests");
    });
    config::get_config()
}

#[tokio::test]
#[ignore = "Requires a live provider API key"]
async fn live_chat_completion_roundtrip() {
    let config = init_config_once();
    let client = OpenAiService::from_config(config).expect("client");
    let reply = client
        .chat(vec![
            ChatMessage::system("Reply with the single word: pong"),
            ChatMessage::user("ping"),
        ])
        .await
        .expect("failed to request a chat completion");
    assert!(
        reply.to_lowercase().contains("pong"),
        "unexpected reply: {reply}"
    );
}

#[tokio::test]
#[ignore = "Requires a live provider API key"]
async fn live_translation_keeps_glossary_terms() {
    let config = init_config_once();
    let client = OpenAiService::from_config(config).expect("client");
    let translated = translate_text(
        &client,
        "The customer wants to reclaim the budget because the DJ did not show up at the party.",
        Language::Dutch,
        &Glossary::default(),
    )
    .await
    .expect("translation");
    assert!(translated.contains("DJ"), "glossary term lost: {translated}");
}

#[tokio::test]
#[ignore = "Requires a live provider API key and a created vector store"]
async fn live_search_answers_from_store() {
    let config = init_config_once();
    let store_id = load_store_id(&config.vector_store_id_file).expect("store id file");
    let openai = Arc::new(OpenAiService::from_config(config).expect("client"));
    let chat: Arc<dyn ChatClient> = openai.clone();
    let service = SearchService::new(
        openai,
        chat,
        store_id,
        SearchSettings::from_config(config),
        Glossary::default(),
    );
    let answer = service
        .search_and_respond("What are the general reclaim rules?")
        .await
        .expect("answer");
    assert!(!answer.text.trim().is_empty());
}
