use std::time::Instant;

use log::info;
use pullwire::{tcp, ChunkSource, PullSource};

const SERVER_ADDR: &str = "127.0.0.1:9000";
const DATA_SIZE: usize = 4 * 1024 * 1024; // 4 MB
const CHUNK_SIZE: usize = 64 * 1024;

#[tokio::main]
async fn main() {
    env_logger::init();

    info!("Connecting to server at {}...", SERVER_ADDR);
    let (mut source, sink) = tcp::connect(SERVER_ADDR)
        .await
        .expect("Failed to connect to server");
    info!("Connected!");

    info!("Sending {} KB of data...", DATA_SIZE / 1024);
    let payload = vec![0xAB; DATA_SIZE];
    let mut outgoing = ChunkSource::from_bytes(payload.clone(), CHUNK_SIZE);

    let start = Instant::now();
    sink.send_all(&mut outgoing)
        .await
        .expect("Failed to send payload");
    let elapsed = start.elapsed();
    let speed = (DATA_SIZE as f64 / 1024.0) / elapsed.as_secs_f64();

    info!("=== Send Complete ===");
    info!("Total sent: {} KB", DATA_SIZE / 1024);
    info!("Time: {:.2} seconds", elapsed.as_secs_f64());
    info!("Speed: {:.2} KB/s", speed);

    info!("Receiving echo from server...");
    let start = Instant::now();
    let mut received = Vec::with_capacity(DATA_SIZE);
    while let Some(chunk) = source.pull().await.expect("Failed to pull echo") {
        received.extend_from_slice(&chunk);
    }
    let elapsed = start.elapsed();
    let speed = (received.len() as f64 / 1024.0) / elapsed.as_secs_f64();

    if received == payload {
        info!("Echo matches exactly");
    } else {
        info!("Echo does not match");
    }

    info!("=== Receive Complete ===");
    info!("Total received: {} KB", received.len() / 1024);
    info!("Time: {:.2} seconds", elapsed.as_secs_f64());
    info!("Speed: {:.2} KB/s", speed);
}
