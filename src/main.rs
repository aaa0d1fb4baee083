use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rustykb::{
    config::{self, Config},
    ingest::{DEFAULT_CHANNELS, IngestService, IngestSettings, save_records},
    language::Glossary,
    logging,
    openai::{ChatClient, OpenAiService},
    search::{Answer, SearchService, SearchSettings},
    upload::{UploadService, load_processed_data, load_store_id},
};
use tokio::io::{AsyncBufReadExt, BufReader};

const DOCUMENTS_OUTPUT: &str = "processed_documents.json";
const CONVERSATIONS_OUTPUT: &str = "processed_conversations.json";

#[derive(Parser)]
#[command(
    name = "rustykb",
    version,
    about = "Customer success knowledge base over a hosted vector store"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert .docx and .xlsx files into English records.
    ProcessDocuments {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, default_value = DOCUMENTS_OUTPUT)]
        output: PathBuf,
    },
    /// Convert a Slack export into English records.
    ProcessSlack {
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Channel directory to read; repeat for several. Defaults to the known channels.
        #[arg(long = "channel")]
        channels: Vec<String>,
        /// Merge replies into one record per thread.
        #[arg(long)]
        threads: bool,
        #[arg(long, default_value = CONVERSATIONS_OUTPUT)]
        output: PathBuf,
    },
    /// Create a vector store from processed record files and save its id.
    CreateStore {
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "input")]
        inputs: Vec<PathBuf>,
    },
    /// Answer a single question.
    Ask {
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// Ask questions interactively until `quit`.
    Search,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = config::init_config().context("failed to load configuration")?;
    logging::init_tracing();
    let openai = Arc::new(OpenAiService::from_config(config)?);

    match cli.command {
        Command::ProcessDocuments { files, output } => {
            process_documents(config, openai, &files, &output).await
        }
        Command::ProcessSlack {
            root,
            channels,
            threads,
            output,
        } => process_slack(config, openai, &root, channels, threads, &output).await,
        Command::CreateStore { name, inputs } => create_store(config, openai, name, inputs).await,
        Command::Ask { question } => {
            let service = search_service(config, openai)?;
            let answer = service.search_and_respond(&question.join(" ")).await?;
            print_answer(&answer);
            tracing::info!(metrics = ?service.metrics_snapshot(), "Search metrics");
            Ok(())
        }
        Command::Search => interactive_search(search_service(config, openai)?).await,
    }
}

fn ingest_service(config: &Config, openai: Arc<OpenAiService>) -> Result<IngestService> {
    let chat: Arc<dyn ChatClient> = openai;
    Ok(IngestService::new(
        chat,
        &IngestSettings::from_config(config),
        Glossary::default(),
    )?)
}

async fn process_documents(
    config: &Config,
    openai: Arc<OpenAiService>,
    files: &[PathBuf],
    output: &Path,
) -> Result<()> {
    let service = ingest_service(config, openai)?;
    let records = service.process_documents(files).await;
    if records.is_empty() {
        bail!("none of the {} documents produced any records", files.len());
    }
    save_records(output, &records)?;
    println!("Processed {} records into {}", records.len(), output.display());
    tracing::info!(metrics = ?service.metrics_snapshot(), "Ingestion metrics");
    Ok(())
}

async fn process_slack(
    config: &Config,
    openai: Arc<OpenAiService>,
    root: &Path,
    channels: Vec<String>,
    threads: bool,
    output: &Path,
) -> Result<()> {
    let channels = if channels.is_empty() {
        DEFAULT_CHANNELS.iter().map(|channel| channel.to_string()).collect()
    } else {
        channels
    };
    let service = ingest_service(config, openai)?;
    let records = service
        .process_conversations(root, &channels, threads)
        .await
        .with_context(|| format!("failed to process Slack export under {}", root.display()))?;
    save_records(output, &records)?;
    println!("Processed {} records into {}", records.len(), output.display());
    tracing::info!(metrics = ?service.metrics_snapshot(), "Ingestion metrics");
    Ok(())
}

async fn create_store(
    config: &Config,
    openai: Arc<OpenAiService>,
    name: Option<String>,
    inputs: Vec<PathBuf>,
) -> Result<()> {
    let inputs = if inputs.is_empty() {
        vec![
            PathBuf::from(CONVERSATIONS_OUTPUT),
            PathBuf::from(DOCUMENTS_OUTPUT),
        ]
    } else {
        inputs
    };
    let name = name.unwrap_or_else(|| config.vector_store_name.clone());

    let records = load_processed_data(&inputs)?;
    println!("Loaded {} records", records.len());

    let service = UploadService::new(openai);
    let (store, batch) = service
        .build_knowledge_base(&name, &records, &config.vector_store_id_file)
        .await?;
    println!("Created vector store with ID: {}", store.id);
    println!("Created file batch with ID: {}", batch.id);
    println!(
        "Vector store ID saved to {}",
        config.vector_store_id_file.display()
    );
    tracing::info!(metrics = ?service.metrics_snapshot(), "Upload metrics");
    Ok(())
}

fn search_service(config: &Config, openai: Arc<OpenAiService>) -> Result<SearchService> {
    let store_id = load_store_id(&config.vector_store_id_file)
        .context("no vector store id; run create-store first")?;
    let chat: Arc<dyn ChatClient> = openai.clone();
    Ok(SearchService::new(
        openai,
        chat,
        store_id,
        SearchSettings::from_config(config),
        Glossary::default(),
    ))
}

async fn interactive_search(service: SearchService) -> Result<()> {
    println!("Customer Success Knowledge Base Search");
    println!("=====================================");
    println!("Type 'quit' to exit");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("What would you like to know? ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.eq_ignore_ascii_case("quit") {
            break;
        }
        if question.is_empty() {
            continue;
        }

        match service.search_and_respond(question).await {
            Ok(answer) => print_answer(&answer),
            Err(err) => {
                tracing::error!(error = %err, "Search failed");
                println!("Error: {err}\n");
            }
        }
    }

    tracing::info!(metrics = ?service.metrics_snapshot(), "Search metrics");
    Ok(())
}

fn print_answer(answer: &Answer) {
    println!("\nResponse:");
    println!("---------");
    println!("{}", answer.text);
    println!("\n");
}
