use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use docsum_client::net::http::OnUnauthorized;
use docsum_client::services::history::{CONFIRM_DELETE_CHAT, CONFIRM_DELETE_CONTENT, DeleteOutcome};
use docsum_client::state::chat::{Message, Role};
use docsum_client::state::history::{HistoryState, HistoryView, RoundDisposition};
use docsum_client::{
    ChatSession, ClientConfig, ClientError, HistoryReconciler, HttpClient, MemoryCredentialStore, Transport,
    ValidationError, spawn_poller,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::info;


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{}", .0.user_message())]
    Client(#[from] ClientError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "docsum", about = "Document summarizer assistant and history moderation CLI")]
struct Cli {
    #[arg(long, env = "DOCSUM_API_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "DOCSUM_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask one question and print the transcript.
    Ask { question: String },
    /// Interactive assistant session. `/reset` starts over, `/quit` exits.
    Chat,
    History(HistoryCommand),
}

#[derive(Args, Debug)]
struct HistoryCommand {
    #[command(subcommand)]
    command: HistorySubcommand,
}

#[derive(Subcommand, Debug)]
enum HistorySubcommand {
    /// Fetch both histories once and print them.
    Show,
    /// Poll until Ctrl-C, printing a status line per interval.
    Watch {
        #[arg(long, help = "Poll interval in seconds (defaults to DOCSUM_POLL_INTERVAL_SECS)")]
        interval: Option<u64>,
    },
    DeleteContent {
        user_id: String,
        content_id: String,
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    DeleteChat {
        user_id: String,
        chat_id: String,
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = ClientConfig::new(base_url, config.poll_interval.as_secs(), config.timeouts)?;
    }

    let credentials = Arc::new(MemoryCredentialStore::new(cli.token));
    let on_unauthorized: OnUnauthorized = Arc::new(|| {
        eprintln!("session expired; log in again and pass a fresh --token");
    });
    let transport: Arc<dyn Transport> = Arc::new(HttpClient::new(&config, credentials, on_unauthorized)?);

    match cli.command {
        Command::Ask { question } => run_ask(transport, &question).await,
        Command::Chat => run_chat(transport).await,
        Command::History(history) => run_history(transport, &config, history).await,
    }
}

// =============================================================================
// CHAT
// =============================================================================

async fn run_ask(transport: Arc<dyn Transport>, question: &str) -> Result<(), CliError> {
    let session = ChatSession::new(transport);
    let result = session.submit(question).await;
    print_messages(&session.messages());
    if let Some(banner) = session.last_error() {
        eprintln!("error: {banner}");
    }
    result.map(|_| ()).map_err(CliError::from)
}

async fn run_chat(transport: Arc<dyn Transport>) -> Result<(), CliError> {
    let session = ChatSession::new(transport);
    print_messages(&session.messages());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" => break,
            "/reset" => {
                session.reset();
                print_messages(&session.messages());
                continue;
            }
            _ => {}
        }

        let before = session.messages().len();
        session.set_input(line);
        match session.submit_input().await {
            Ok(_) => print_messages(&session.messages()[before + 1..]),
            Err(ClientError::Validation(ValidationError::Empty)) => {}
            Err(ClientError::Busy) => eprintln!("error: {}", ClientError::Busy.user_message()),
            Err(_) => {
                if let Some(banner) = session.last_error() {
                    eprintln!("error: {banner}");
                }
            }
        }
    }
    Ok(())
}

fn print_messages(messages: &[Message]) {
    for message in messages {
        let who = match message.role {
            Role::User => "you",
            Role::Bot => "bot",
        };
        match &message.source {
            Some(source) => println!("{who}> {} (source: {source})", message.content),
            None => println!("{who}> {}", message.content),
        }
    }
}

// =============================================================================
// HISTORY
// =============================================================================

async fn run_history(
    transport: Arc<dyn Transport>,
    config: &ClientConfig,
    history: HistoryCommand,
) -> Result<(), CliError> {
    let reconciler = Arc::new(HistoryReconciler::new(transport));
    match history.command {
        HistorySubcommand::Show => {
            poll_or_fail(&reconciler).await?;
            print_history(&reconciler.snapshot());
            Ok(())
        }
        HistorySubcommand::Watch { interval } => {
            let interval = interval
                .filter(|secs| *secs > 0)
                .map_or(config.poll_interval, Duration::from_secs);
            watch(reconciler, interval).await
        }
        HistorySubcommand::DeleteContent { user_id, content_id, yes } => {
            poll_or_fail(&reconciler).await?;
            let confirmed = yes || ask_confirmation(CONFIRM_DELETE_CONTENT).await?;
            let confirm = move |_: &str| confirmed;
            let outcome = reconciler.delete_content(&user_id, &content_id, &confirm).await?;
            report_delete(outcome, &reconciler.snapshot());
            Ok(())
        }
        HistorySubcommand::DeleteChat { user_id, chat_id, yes } => {
            poll_or_fail(&reconciler).await?;
            let confirmed = yes || ask_confirmation(CONFIRM_DELETE_CHAT).await?;
            let confirm = move |_: &str| confirmed;
            let outcome = reconciler.delete_chat(&user_id, &chat_id, &confirm).await?;
            report_delete(outcome, &reconciler.snapshot());
            Ok(())
        }
    }
}

async fn poll_or_fail(reconciler: &HistoryReconciler) -> Result<(), CliError> {
    match reconciler.poll_once().await {
        RoundDisposition::Failed(err) => Err(err.into()),
        RoundDisposition::Applied | RoundDisposition::Stale | RoundDisposition::Discarded => Ok(()),
    }
}

async fn watch(reconciler: Arc<HistoryReconciler>, interval: Duration) -> Result<(), CliError> {
    let poller = spawn_poller(reconciler.clone(), interval);
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => print_status(&reconciler.snapshot()),
        }
    }
    poller.stop();
    info!("watch finished");
    Ok(())
}

fn print_status(state: &HistoryState) {
    let content_rows = state.content_rows().len();
    let chat_rows = state.chat_rows().len();
    match state.view() {
        HistoryView::Loading => println!("loading..."),
        HistoryView::Empty => println!("no data"),
        HistoryView::Ready => println!("{content_rows} content entries, {chat_rows} chat entries"),
        HistoryView::Failed(banner) => {
            println!("error: {banner} (showing {content_rows} content entries, {chat_rows} chat entries)");
        }
    }
}

fn print_history(state: &HistoryState) {
    if state.view() == HistoryView::Empty {
        println!("no data");
        return;
    }

    println!("== content history");
    for row in state.content_rows() {
        println!(
            "{} {} [{}] {} => {} ({}/{})",
            row.timestamp.as_deref().unwrap_or("-"),
            row.email,
            row.kind,
            row.content_preview,
            row.summary_preview,
            row.user_id,
            row.content_id,
        );
    }

    println!("== chat history");
    for row in state.chat_rows() {
        println!(
            "{} {} Q: {} A: {} [{}] ({}/{})",
            row.timestamp.as_deref().unwrap_or("-"),
            row.email,
            row.question,
            row.answer,
            row.source.as_deref().unwrap_or("-"),
            row.owner_id,
            row.chat_id,
        );
    }
}

async fn ask_confirmation(prompt: &str) -> Result<bool, CliError> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    Ok(read_confirmation(&mut BufReader::new(tokio::io::stdin())).await?)
}

async fn read_confirmation<R: AsyncBufRead + Unpin>(reader: &mut R) -> io::Result<bool> {
    let mut answer = String::new();
    reader.read_line(&mut answer).await?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn report_delete(outcome: DeleteOutcome, state: &HistoryState) {
    match outcome {
        DeleteOutcome::Deleted => println!(
            "deleted; {} content entries and {} chat entries remain",
            state.content_rows().len(),
            state.chat_rows().len()
        ),
        DeleteOutcome::Cancelled => println!("cancelled"),
    }
}
