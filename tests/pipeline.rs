use std::{fs::File, path::PathBuf, sync::Arc};

use docx_rs::{Docx, Paragraph, Run};
use httpmock::{Method::POST, MockServer};
use rustykb::{
    config::{self, Config},
    ingest::{IngestService, IngestSettings, save_records},
    language::{Glossary, Language},
    logging,
    openai::{ChatClient, OpenAiService},
    search::{SearchService, SearchSettings},
    upload::{UploadService, load_processed_data, load_store_id},
};
use serde_json::json;
use tokio::sync::OnceCell;

static HARNESS: OnceCell<Harness> = OnceCell::const_new();

struct Harness {
    server: &'static MockServer,
    config: &'static Config,
    workdir: PathBuf,
}

fn set_env(key: &str, value: &str) {
    // SAFETY: Configuration is established once before any test reads the environment.
    unsafe { std::env::set_var(key, value) }
}

async fn harness() -> &'static Harness {
    HARNESS
        .get_or_init(|| async {
            let server: &'static MockServer = Box::leak(Box::new(MockServer::start_async().await));
            let workdir = std::env::temp_dir().join(format!("rustykb-pipeline-{}", std::process::id()));
            std::fs::create_dir_all(&workdir).expect("workdir");

            set_env("OPENAI_API_KEY", "sk-pipeline");
            set_env("OPENAI_BASE_URL", &format!("{}/", server.base_url()));
            set_env("CHAT_MODEL", "gpt-4o");
            set_env("OPENAI_MAX_RETRIES", "0");
            set_env("VECTOR_STORE_NAME", "customer-success-knowledge");
            set_env(
                "VECTOR_STORE_ID_FILE",
                &workdir.join("vector_store_id.txt").display().to_string(),
            );
            set_env("SLACK_WORKSPACE_URL", "https://example.slack.com");

            let config = config::init_config().expect("config");
            logging::init_tracing();
            Harness {
                server,
                config,
                workdir,
            }
        })
        .await
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn configuration_comes_from_environment() {
    let harness = harness().await;
    let config = harness.config;
    assert_eq!(config.openai_api_key, "sk-pipeline");
    assert_eq!(config.search_max_results, 30);
    assert_eq!(config.search_context_limit, 8);
    assert_eq!(config.openai_max_retries, 0);
    assert_eq!(
        config.slack_workspace_url.as_deref(),
        Some("https://example.slack.com")
    );
}

#[tokio::test]
async fn document_to_answer_round_trip() {
    let harness = harness().await;
    let config = harness.config;
    let server = harness.server;

    let manual = harness.workdir.join("Customer Success Manual.docx");
    Docx::new()
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Customer Success Manual")))
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text(
            "A mediator is assigned when the customer and the professional cannot agree on a \
             solution within seven days of the complaint being filed.",
        )))
        .build()
        .pack(File::create(&manual).expect("create docx"))
        .expect("pack docx");

    let create_store = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/vector_stores")
                .header("authorization", "Bearer sk-pipeline");
            then.status(200).json_body(json!({
                "id": "vs_pipeline",
                "object": "vector_store",
                "name": "customer-success-knowledge",
                "status": "completed"
            }));
        })
        .await;
    let upload = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/files")
                .body_contains("Customer Success Manual.docx")
                .body_contains("A mediator is assigned");
            then.status(200).json_body(json!({
                "id": "file-pipeline",
                "object": "file",
                "purpose": "assistants"
            }));
        })
        .await;
    let batch = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/vector_stores/vs_pipeline/file_batches")
                .json_body(json!({ "file_ids": ["file-pipeline"] }));
            then.status(200).json_body(json!({
                "id": "vsfb_pipeline",
                "vector_store_id": "vs_pipeline",
                "status": "in_progress"
            }));
        })
        .await;
    let search = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/vector_stores/vs_pipeline/search")
                .json_body(json!({
                    "query": "mediator assignment rules",
                    "max_num_results": 30
                }));
            then.status(200).json_body(json!({
                "object": "vector_store.search_results.page",
                "data": [{
                    "file_id": "file-pipeline",
                    "filename": "rustykb.json",
                    "score": 0.61,
                    "content": [{
                        "type": "text",
                        "text": "{\"text\": \"A mediator is assigned when the customer and the professional cannot agree\", \"metadata\": {\"source\": \"official_document\", \"file_name\": \"Customer Success Manual.docx\"}}"
                    }]
                }],
                "has_more": false
            }));
        })
        .await;
    let analysis = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("search query analyzer");
            then.status(200).json_body(completion(
                r#"{"main_concept": "mediator assignment", "search_query": "mediator assignment rules", "exclude_terms": [], "is_reclaim_query": false}"#,
            ));
        })
        .await;
    let answer = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("customer success assistant")
                .body_contains("Customer Success Manual.docx");
            then.status(200).json_body(completion(
                "A mediator steps in after seven days without agreement. [Document: Customer Success Manual.docx]",
            ));
        })
        .await;

    let openai = Arc::new(OpenAiService::from_config(config).expect("client"));
    let chat: Arc<dyn ChatClient> = openai.clone();

    let ingest = IngestService::new(
        chat.clone(),
        &IngestSettings::from_config(config),
        Glossary::default(),
    )
    .expect("ingest service");
    let records = ingest.process_documents(&[manual]).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].metadata["original_language"], "English");

    let records_path = harness.workdir.join("processed_documents.json");
    save_records(&records_path, &records).expect("save records");
    let loaded = load_processed_data(&[
        harness.workdir.join("processed_conversations.json"),
        records_path,
    ])
    .expect("load records");
    assert_eq!(loaded, records);

    let uploader = UploadService::new(openai.clone());
    let (store, _) = uploader
        .build_knowledge_base(
            &config.vector_store_name,
            &loaded,
            &config.vector_store_id_file,
        )
        .await
        .expect("knowledge base");
    assert_eq!(store.id, "vs_pipeline");

    let store_id = load_store_id(&config.vector_store_id_file).expect("store id");
    let search_service = SearchService::new(
        openai,
        chat,
        store_id,
        SearchSettings::from_config(config),
        Glossary::default(),
    );
    let response = search_service
        .search_and_respond("When does a mediator get assigned to a complaint between a customer and a professional?")
        .await
        .expect("answer");

    create_store.assert();
    upload.assert();
    batch.assert();
    search.assert();
    analysis.assert();
    answer.assert();
    assert_eq!(response.language, Language::English);
    assert!(response.text.contains("[Document: Customer Success Manual.docx]"));
    assert_eq!(response.sources.len(), 1);
    assert_eq!(search_service.metrics_snapshot().queries_answered, 1);
}
