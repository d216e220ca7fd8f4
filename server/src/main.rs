use std::net::SocketAddr;
use std::time::Instant;

use log::{error, info};
use pullwire::tcp::{Listener, TcpSink, TcpSource};
use pullwire::{ChunkSource, PullSource, Result};

const LISTEN_ADDR: &str = "127.0.0.1:9000";

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let listener = Listener::bind(LISTEN_ADDR)
        .await
        .expect("Failed to bind listener");
    info!("Echo server listening on {}", LISTEN_ADDR);

    loop {
        let (source, sink, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Accept failed: {}", e);
                continue;
            }
        };
        info!("Client connected from {}", peer);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(source, sink, peer).await {
                error!("Connection {} failed: {}", peer, e);
            }
        });
    }
}

/// Pulls the whole request off the socket, then echoes it back.
async fn handle_connection(mut source: TcpSource, sink: TcpSink, peer: SocketAddr) -> Result<()> {
    let start = Instant::now();
    let mut chunks = Vec::new();
    let mut total = 0usize;

    while let Some(chunk) = source.pull().await? {
        total += chunk.len();
        chunks.push(chunk);
    }

    let elapsed = start.elapsed();
    let speed = (total as f64 / 1024.0) / elapsed.as_secs_f64();
    info!("=== Receive Complete ===");
    info!("Total received: {} KB from {}", total / 1024, peer);
    info!("Time: {:.2} seconds", elapsed.as_secs_f64());
    info!("Speed: {:.2} KB/s", speed);

    let start = Instant::now();
    let mut reply = ChunkSource::new(chunks);
    sink.send_all(&mut reply).await?;

    let elapsed = start.elapsed();
    let speed = (total as f64 / 1024.0) / elapsed.as_secs_f64();
    info!("=== Echo Complete ===");
    info!("Total sent: {} KB to {}", total / 1024, peer);
    info!("Time: {:.2} seconds", elapsed.as_secs_f64());
    info!("Speed: {:.2} KB/s", speed);

    Ok(())
}
