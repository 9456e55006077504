use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing_subscriber::EnvFilter;

use voiceos_gateway::api::ApiServer;
use voiceos_gateway::pipeline::{PipelineResult, VoiceStack};
use voiceos_gateway::voice::{AlwaysAwake, FixedTranscriber, SilentSynthesizer, wav_to_pcm16};
use voiceos_gateway::{Config, Gateway};

/// Streamed audio is fed in slices of this many milliseconds
const FEED_MS: u64 = 100;

/// VoiceOS - voice request routing and orchestration gateway
#[derive(Parser)]
#[command(name = "voiceos", version, about)]
struct Cli {
    /// Path to the config file
    #[arg(short, long, env = "VOICEOS_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server (default)
    Serve,
    /// Process a text query and print the response
    Query {
        /// Query text
        text: String,
    },
    /// Show how a query would be routed
    Route {
        /// Query text
        text: String,
    },
    /// List registered tools
    Tools,
    /// Run the voice pipeline over a WAV file
    Pipeline {
        /// 16-bit mono WAV input
        wav: PathBuf,
        /// Transcript the demo transcriber returns for every chunk
        #[arg(short, long)]
        transcript: String,
        /// Skip wake word detection (push-to-talk)
        #[arg(long)]
        no_wake: bool,
        /// Process the file as a stream of fixed windows
        #[arg(long)]
        stream: bool,
        /// Where to write synthesized audio
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,voiceos_gateway=info",
        1 => "info,voiceos_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load_with_options(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Query { text } => query(config, &text).await,
        Command::Route { text } => route(config, &text),
        Command::Tools => tools(config),
        Command::Pipeline {
            wav,
            transcript,
            no_wake,
            stream,
            out,
        } => pipeline(config, &wav, transcript, no_wake, stream, out.as_deref()).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let port = config.server.port;
    let gateway = Arc::new(Gateway::new(config)?);

    let server = ApiServer::new(gateway, port).spawn();

    tokio::select! {
        result = server => result??,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }

    Ok(())
}

async fn query(config: Config, text: &str) -> anyhow::Result<()> {
    let gateway = Gateway::new(config)?;
    let response = gateway.process_query(text, None).await;

    println!("{}", serde_json::to_string_pretty(&response)?);

    if let Some(error) = response.error {
        anyhow::bail!("query failed: {error}");
    }
    Ok(())
}

fn route(config: Config, text: &str) -> anyhow::Result<()> {
    let gateway = Gateway::new(config)?;
    let decision = gateway.route(text, None);

    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

fn tools(config: Config) -> anyhow::Result<()> {
    let gateway = Gateway::new(config)?;

    for tool in gateway.list_tools() {
        println!("{}", tool.name);
    }
    Ok(())
}

async fn pipeline(
    config: Config,
    wav: &Path,
    transcript: String,
    no_wake: bool,
    stream: bool,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(wav).await?;
    let (pcm, sample_rate) = wav_to_pcm16(&bytes)?;

    if sample_rate != config.audio.sample_rate {
        tracing::warn!(
            file = sample_rate,
            configured = config.audio.sample_rate,
            "sample rate mismatch, windows will not be one second"
        );
    }

    let mut voice = VoiceStack::from_config(
        &config.audio,
        Arc::new(FixedTranscriber::new(transcript)),
        Arc::new(SilentSynthesizer::new(config.audio.sample_rate)),
    );
    if no_wake {
        voice = voice.with_wake_word(Arc::new(AlwaysAwake));
    }

    let feed_bytes = usize::try_from(
        u64::from(config.audio.sample_rate) * u64::from(config.audio.sample_width) * FEED_MS / 1000,
    )?
    .max(1);
    let gateway = Gateway::builder(config).voice(voice).build()?;

    if !stream {
        let result = gateway.run_pipeline(&pcm).await?;
        return report(&result, out).await;
    }

    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        for slice in pcm.chunks(feed_bytes) {
            if tx.send(slice.to_vec()).await.is_err() {
                break;
            }
        }
    });

    let mut results = Box::pin(gateway.run_stream(ReceiverStream::new(rx))?);
    let mut last = None;
    while let Some(result) = results.next().await {
        println!("{}", serde_json::to_string(&result)?);
        last = Some(result);
    }

    match last {
        Some(result) => report(&result, out).await,
        None => {
            tracing::warn!("input shorter than one window, nothing processed");
            Ok(())
        }
    }
}

async fn report(result: &PipelineResult, out: Option<&Path>) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);

    if let Some(path) = out {
        tokio::fs::write(path, &result.audio).await?;
        tracing::info!(path = %path.display(), bytes = result.audio.len(), "wrote synthesized audio");
    }

    if let Some(error) = &result.error {
        anyhow::bail!("{error}");
    }
    Ok(())
}
