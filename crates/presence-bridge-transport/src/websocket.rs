//! WebSocket transport for door controller clients.

use std::sync::Arc;

use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use presence_bridge_core::{DeviceSink, Relay};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// WebSocket upgrade handler.
///
/// Use this as an Axum route handler.
pub async fn ws_handler<D>(
    ws: WebSocketUpgrade,
    State(relay): State<Arc<Relay<D>>>,
) -> impl IntoResponse
where
    D: DeviceSink + 'static,
{
    ws.on_upgrade(|socket| handle_socket(socket, relay))
}

async fn handle_socket<D>(socket: WebSocket, relay: Arc<Relay<D>>)
where
    D: DeviceSink + 'static,
{
    let (mut sender, mut receiver) = socket.split();

    let clients = Arc::clone(relay.clients());
    let (client_id, mut rx) = clients.register().await;
    tracing::info!(client_id = %client_id, "Client connected");

    // Forward broadcasts to this client, in order
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                tracing::debug!(client_id = %client_id, msg = %text.as_str(), "From client");
                relay.handle_client_message(text.as_str()).await;
            }
            Ok(Message::Binary(data)) => {
                let text = String::from_utf8_lossy(&data);
                tracing::debug!(client_id = %client_id, msg = %text, "From client (binary)");
                relay.handle_client_message(&text).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(client_id = %client_id, "WebSocket error: {e}");
                break;
            }
        }
    }

    send_task.abort();
    clients.remove(client_id).await;

    tracing::info!(client_id = %client_id, "Client disconnected");
}

/// Create WebSocket router.
///
/// Clients may connect at either `/` or `/ws`.
///
/// # Example
/// ```ignore
/// let app = create_ws_router(Arc::new(relay));
/// axum::serve(listener, app).await?;
/// ```
#[must_use]
pub fn create_ws_router<D>(relay: Arc<Relay<D>>) -> Router
where
    D: DeviceSink + 'static,
{
    Router::new()
        .route("/", get(ws_handler::<D>))
        .route("/ws", get(ws_handler::<D>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(relay)
}
