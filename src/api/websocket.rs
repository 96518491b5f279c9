use axum::{
    extract::{State, ws::{WebSocket, WebSocketUpgrade, Message}},
    response::IntoResponse,
};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval, Duration};
use futures::{SinkExt, StreamExt};
use crate::api::rest::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn send_json(sender: &mut futures::stream::SplitSink<WebSocket, Message>, msg: serde_json::Value) -> bool {
    matches!(
        tokio::time::timeout(Duration::from_secs(5), sender.send(Message::Text(msg.to_string()))).await,
        Ok(Ok(_))
    )
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut updates = state.offers.subscribe();
    let mut heartbeat_ticker = interval(Duration::from_secs(10));

    let best = state.yields.best_yield().await;
    if !send_json(&mut sender, serde_json::json!({ "type": "best_yield", "data": best })).await {
        return;
    }
    let offers = state.offers.offer_list();
    if !send_json(&mut sender, serde_json::json!({ "type": "offers_update", "data": offers })).await {
        return;
    }

    loop {
        tokio::select! {
            update = updates.recv() => {
                let list = match update {
                    Ok(list) => list,
                    // slow client: skip to the current projection
                    Err(RecvError::Lagged(_)) => state.offers.offer_list(),
                    Err(RecvError::Closed) => return,
                };
                let msg = serde_json::json!({ "type": "offers_update", "data": list });
                if !send_json(&mut sender, msg).await {
                    return;
                }
            }

            _ = heartbeat_ticker.tick() => {
                if sender.send(Message::Ping(vec![])).await.is_err() {
                    return;
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(cmd) = serde_json::from_str::<serde_json::Value>(&text) {
                            if cmd["type"] == "ping" {
                                let _ = sender.send(Message::Text(r#"{"type":"pong"}"#.to_string())).await;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return,
                    _ => {}
                }
            }
        }
    }
}
