mod board;
mod engine;
mod error;
mod eval;
mod game;
mod square;

use std::sync::{Arc, Mutex};
use anyhow::Context;
use clap::Parser;
use log::{info, error};
use tokio::net::{TcpListener, TcpStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::protocol::Message;
use crate::engine::Engine;
use crate::error::GameError;
use crate::game::{Game, handle_message};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, default_value = "localhost")]
    host: String,
    #[arg(long, default_value_t = 8999)]
    port: u16,
    /// Search depth in plies
    #[arg(long, default_value_t = Engine::DEFAULT_DEPTH, value_parser = clap::value_parser!(u32).range(1..=6))]
    depth: u32,
    /// Play a random first move when the engine opens the game
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    random_opening: bool,
    #[arg(long, default_value_t = log::Level::Info)]
    log_level: log::Level,
}

#[derive(Debug, Clone, Copy)]
struct GameConfig {
    engine: Engine,
    random_opening: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    simple_logger::init_with_level(args.log_level).context("Failed to initialise logging")?;

    let address = format!("{}:{}", args.host, args.port);
    let config = GameConfig {
        engine: Engine::new(args.depth),
        random_opening: args.random_opening,
    };

    // Bind the server to a local port
    let listener = TcpListener::bind(&address).await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on: {} (search depth {})", address, args.depth);

    serve(listener, config).await;
    Ok(())
}

async fn serve(listener: TcpListener, config: GameConfig) {
    loop {
        let stream = match listener.accept().await {
            Ok((stream, _)) => stream,
            Err(e) => {
                error!("Failed to accept connection: {:?}", e);
                continue;
            }
        };
        tokio::spawn(async move {
            if let Err(e) = accept_connection(stream, config).await {
                error!("Connection failed: {:?}", e);
            }
        });
    }
}

async fn accept_connection(stream: TcpStream, config: GameConfig) -> anyhow::Result<()> {
    let addr = stream.peer_addr()?;
    info!("Peer address: {}", addr);

    let ws_stream = tokio_tungstenite::accept_async(stream)
        .await
        .context("Error during the websocket handshake occurred")?;
    info!("New WebSocket connection: {}", addr);

    let (mut write, mut read) = ws_stream.split();

    let game_mutex = Arc::new(Mutex::new(Game::new(config.engine, config.random_opening)));

    while let Some(raw_message) = read.next().await {
        match raw_message {
            Ok(text_message) => {
                if !text_message.is_text() && !text_message.is_binary() { continue; }
                let response = match serde_json::from_slice::<Value>(&text_message.into_data()) {
                    Ok(data) => {
                        info!("Received: {}", data);
                        // searching is CPU bound, keep it off the async workers
                        let game = Arc::clone(&game_mutex);
                        let result = tokio::task::spawn_blocking(move || handle_message(&game, data))
                            .await
                            .unwrap_or_else(|e| Err(GameError::Internal { message: e.to_string() }));
                        match result {
                            Ok(resp) => resp,
                            Err(e) => {
                                error!("Error handling message: {:?}", e);
                                json!({"error": e.to_string()})
                            }
                        }
                    },
                    Err(e) => {
                        error!("Error parsing JSON: {:?}", e);
                        json!({"error": GameError::from(e).to_string()})
                    }
                };
                let response_str = response.to_string();
                write.send(Message::text(response_str.clone())).await
                    .with_context(|| format!("Failed to send message: {}", response_str))?;
                info!("Sent: {}", response_str);
            }
            Err(e) => { error!("Error reading websocket message: {:?}", e); }
        }
    }

    info!("Connection closed: {}", addr);
    Ok(())
}
