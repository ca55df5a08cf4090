//! # Flowlink CLI Entry Point
//!
//! Main binary for talking to a flowlink compute service from the shell.
//!
//! ## Usage
//!
//! ```bash
//! # Stream requests over WebSocket, one JSON document per line
//! cat requests.ndjson | flowlink post localhost:12345
//!
//! # Same, over plain HTTP, reading from a file
//! flowlink post http://localhost:12345 --input requests.ndjson --http
//!
//! # Check liveness
//! flowlink health localhost:12345
//!
//! # Print the status document
//! flowlink info localhost:12345 --parsed
//! ```
//!
//! ## Host Format
//!
//! Hosts may be bare (`host:port`) or carry a `ws://`, `wss://`, `http://`
//! or `https://` prefix; each command picks the scheme it needs.
//!
//! Logs go to stderr so stdout stays machine-readable. Set `RUST_LOG` to
//! change the level (default `info`).

use anyhow::{Context, Result};
use argh::FromArgs;
use tokio::io::{AsyncBufRead, BufReader};

use flowlink_cli::post::{spawn_reader, PrintObserver};
use flowlink_client::{HealthCheckClient, HttpClient, InfoClient, StreamingClient};

/// Main CLI structure parsed from command-line arguments.
#[derive(FromArgs)]
/// Flowlink - client for remote compute services
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Post(PostArgs),
    Health(HealthArgs),
    Info(InfoArgs),
}

/// Arguments for streaming requests to a service.
///
/// Each input line is one JSON request. Responses are printed one JSON
/// document per line in arrival order. The exit status is non-zero when any
/// request failed, any response could not be decoded, or any input line was
/// malformed.
#[derive(FromArgs)]
#[argh(subcommand, name = "post")]
/// send newline-delimited JSON requests and print the responses
struct PostArgs {
    /// address of the service
    #[argh(positional)]
    host: String,

    /// file to read requests from
    ///
    /// Defaults to standard input.
    #[argh(option, short = 'i')]
    input: Option<String>,

    /// send over plain HTTP, one request at a time, instead of WebSocket
    #[argh(switch)]
    http: bool,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "health")]
/// check whether a service is healthy
struct HealthArgs {
    /// address of the service
    #[argh(positional)]
    host: String,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "info")]
/// print the status document of a service
struct InfoArgs {
    /// address of the service
    #[argh(positional)]
    host: String,

    /// decode the document into component versions and environment first
    #[argh(switch)]
    parsed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // Set default log level to INFO, but allow RUST_LOG env var to override
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Post(args) => run_post(args).await,
        Commands::Health(args) => {
            let client = HealthCheckClient::new(&args.host)?;
            client
                .health_check()
                .await
                .with_context(|| format!("{} is not healthy", client.base_url()))?;
            println!("healthy");
            Ok(())
        }
        Commands::Info(args) => {
            let client = InfoClient::new(&args.host)?;
            if args.parsed {
                let info = client.info().await?;
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("{}", client.info_json().await?);
            }
            Ok(())
        }
    }
}

/// Executes the `post` subcommand.
///
/// The input is read on a background task while the client sends, so large
/// inputs are streamed rather than loaded up front.
async fn run_post(args: PostArgs) -> Result<()> {
    let input: Box<dyn AsyncBufRead + Unpin + Send> = match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let (requests, reader) = spawn_reader(input);
    let observer = PrintObserver::new(std::io::stdout());

    if args.http {
        let client = HttpClient::new(&args.host)?;
        tracing::info!("Posting to {}", client.post_url());
        client.post(requests, &observer).await?;
    } else {
        let client = StreamingClient::connect(&args.host).await?;
        tracing::info!("Connected to {}", client.url());
        client.post(requests, &observer).await?;
        if let Err(e) = client.close().await {
            tracing::debug!("close failed: {}", e);
        }
    }

    let malformed = reader.await.context("input reader panicked")??;
    let summary = observer.summary();
    tracing::info!(
        "{} responses, {} failed requests, {} undecodable responses, {} malformed input lines",
        summary.responses,
        summary.errors,
        summary.undecodable,
        malformed
    );

    if summary.failures() > 0 || malformed > 0 {
        anyhow::bail!(
            "{} of the submitted requests did not complete cleanly",
            summary.failures() + malformed
        );
    }

    Ok(())
}
