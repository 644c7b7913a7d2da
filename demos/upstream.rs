//! Demo upstream for trying the balancer locally.
//!
//! ```text
//! cargo run --example upstream -- 5001
//! cargo run --example upstream -- 5002
//! cargo run -- -u http://127.0.0.1:5001 -u http://127.0.0.1:5002
//! ```
//!
//! `POST /toggle` flips the liveness endpoint between 200 and 503.

use axum::{extract::State, http::StatusCode, routing::{get, post}, Router};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone)]
struct Demo {
    port: u16,
    alive: Arc<AtomicBool>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let port: u16 = std::env::args().nth(1).as_deref().unwrap_or("5001").parse()?;
    let demo = Demo {
        port,
        alive: Arc::new(AtomicBool::new(true)),
    };

    let app = Router::new()
        .route("/", get(|State(d): State<Demo>| async move { format!("Hello from upstream {}", d.port) }))
        .route("/health", get(health))
        .route("/toggle", post(toggle))
        .with_state(demo);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("Demo upstream listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health(State(demo): State<Demo>) -> StatusCode {
    if demo.alive.load(Ordering::SeqCst) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn toggle(State(demo): State<Demo>) -> String {
    let now_alive = !demo.alive.fetch_xor(true, Ordering::SeqCst);
    format!("health endpoint now {}", if now_alive { "up" } else { "down" })
}
