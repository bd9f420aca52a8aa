use std::env;
use std::path::PathBuf;

use anyhow::anyhow;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use parley::core::channel::RealtimeChannel;
use parley::core::elevenlabs::ElevenLabsProtocol;
use parley::{ServerConfig, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Initialize crypto provider for TLS connections
    // This must be done before any TLS connections are attempted
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    // Handle CLI arguments
    let mut config_path: Option<PathBuf> = None;
    let mut command: Option<String> = None;
    let mut agent_id: Option<String> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                config_path = Some(PathBuf::from(path));
            }
            "-a" | "--agent" => {
                agent_id = Some(
                    args.next()
                        .ok_or_else(|| anyhow!("--agent requires an agent id"))?,
                );
            }
            "chat" if command.is_none() => command = Some(arg),
            other => {
                anyhow::bail!(
                    "Unknown argument '{other}'. Usage: parley [--config <file.yaml>] [chat [--agent <id>]]"
                );
            }
        }
    }

    // Load configuration
    let config = match &config_path {
        Some(path) => ServerConfig::from_file(path),
        None => ServerConfig::from_env(),
    }
    .map_err(|e| anyhow!(e.to_string()))?;

    if command.as_deref() == Some("chat") {
        return run_chat(&config, agent_id.as_deref()).await;
    }
    if agent_id.is_some() {
        anyhow::bail!("--agent is only valid with the 'chat' command");
    }

    let address = config.address();
    println!("Starting server on {address}");

    let app_state = AppState::new(config).await;
    let app = routes::api::create_app(app_state);

    let listener = TcpListener::bind(&address).await?;
    println!("Server listening on {address}");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Text-only conversation with an agent: stdin lines go out as user
/// messages, agent responses are printed.
async fn run_chat(config: &ServerConfig, agent_id: Option<&str>) -> anyhow::Result<()> {
    let conversation = config
        .conversation_config(agent_id)
        .map_err(|e| anyhow!(e))?
        .with_text_only(true);

    let channel = RealtimeChannel::new(
        ElevenLabsProtocol::new(conversation),
        config.channel_config(),
    );

    channel.on_agent_response(|text| async move {
        println!("agent> {text}");
    });
    channel.on_agent_correction(|correction| async move {
        println!("agent (corrected)> {}", correction.corrected);
    });
    channel.on_error(|err| async move {
        eprintln!("error: {err}");
    });

    channel.connect().await?;
    println!("Connected. Type a message and press enter, /quit to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "/quit" {
                    break;
                }
                if let Err(e) = channel.send_text(line).await {
                    eprintln!("error: {e}");
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    channel.disconnect().await?;
    Ok(())
}
