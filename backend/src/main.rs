use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
    Router,
};
use formula_core::formula::{functions, Expression};
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

mod commands;

const ADDR_VAR: &str = "FORMULA_BACKEND_ADDR";
const DEFAULT_ADDR: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
    3000,
);

/// Bind address from the environment, falling back to localhost:3000.
fn bind_addr() -> SocketAddr {
    match std::env::var(ADDR_VAR) {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("Ignoring {}='{}': {}", ADDR_VAR, raw, e);
            DEFAULT_ADDR
        }),
        Err(_) => DEFAULT_ADDR,
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();
    functions::init();

    let app = Router::new()
        .route("/", get(root))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http());

    let addr = bind_addr();
    info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn root() -> String {
    format!("Formula backend {}", formula_core::version())
}

async fn ws_handler(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(handle_socket)
}

// Each connection owns one expression; nothing is shared between sessions.
async fn handle_socket(mut socket: WebSocket) {
    info!("Client connected");
    let mut expression = Expression::new();

    while let Some(msg) = socket.recv().await {
        let msg = if let Ok(msg) = msg {
            msg
        } else {
            return;
        };

        if let Message::Text(text) = msg {
            info!("Received message: {}", text);
            let reply = commands::handle_command(&mut expression, &text);
            if socket.send(Message::Text(reply)).await.is_err() {
                return;
            }
        }
    }

    info!("Client disconnected");
}
