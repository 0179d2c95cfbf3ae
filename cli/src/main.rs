use clap::{Args, Parser, Subcommand};
use danmaku::config::{DEFAULT_API_BASE_URL, DEFAULT_ENDPOINT, DEFAULT_SINK_CAPACITY};
use danmaku::{DecodedMessage, LookupError, RoomLookup, SessionClient, SessionConfig, SessionError};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("room lookup failed: {0}")]
    Lookup(#[from] LookupError),
    #[error("session failed: {0}")]
    Session(#[from] SessionError),
    #[error("session task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "danmaku", about = "Live-chat broadcast client")]
struct Cli {
    #[arg(long, env = "DANMAKU_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    api_base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Join a room and print every decoded message as a JSON line.
    Watch(WatchArgs),
    /// Print the room record for a room id.
    Room { room: u64 },
}

#[derive(Args, Debug)]
struct WatchArgs {
    room: u64,

    #[arg(long, help = "Treat ROOM as the internal id and skip the lookup")]
    no_resolve: bool,

    #[arg(long, env = "DANMAKU_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    #[arg(long, env = "DANMAKU_SINK_CAPACITY", default_value_t = DEFAULT_SINK_CAPACITY)]
    sink_capacity: usize,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Watch(args) => run_watch(&cli.api_base_url, args).await,
        Command::Room { room } => run_room(&cli.api_base_url, room).await,
    }
}

async fn run_room(api_base_url: &str, room: u64) -> Result<(), CliError> {
    let info = RoomLookup::new(api_base_url)?.info(room).await?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

async fn run_watch(api_base_url: &str, args: WatchArgs) -> Result<(), CliError> {
    let room_id = if args.no_resolve {
        args.room
    } else {
        RoomLookup::new(api_base_url)?.resolve(args.room).await?
    };

    let config = SessionConfig {
        endpoint: args.endpoint,
        sink_capacity: args.sink_capacity,
    };
    let (tx, mut rx) = config.channel();
    let mut client = SessionClient::new(&config);
    let session = tokio::spawn(async move { client.run(room_id, tx).await });

    while let Some(batch) = rx.recv().await {
        for message in &batch {
            print_message(message)?;
        }
    }

    session.await??;
    tracing::info!(room_id, "watch: session ended");
    Ok(())
}

fn print_message(message: &DecodedMessage) -> Result<(), CliError> {
    let body = message.json()?;
    let line = serde_json::json!({
        "operation": message.operation,
        "sequence_id": message.sequence_id,
        "body": body,
    });
    println!("{}", serde_json::to_string::<Value>(&line)?);
    Ok(())
}
