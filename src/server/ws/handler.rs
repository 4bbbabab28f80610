use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};

use crate::graph::{GraphError, ProgressSink};
use crate::state::AppState;

use super::protocol::{
    connected_message, error_message, WsRunRequest, MSG_GRAPH_NOT_FOUND, MSG_RUN_COMPLETE,
};

// GET /ws/run — streams step messages of one run, then the final state
pub async fn ws_run_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Forwards run log messages to the socket, one text frame each.
pub struct WsProgressSink<'a> {
    sender: &'a mut SplitSink<WebSocket, Message>,
}

#[async_trait]
impl<'a> ProgressSink for WsProgressSink<'a> {
    async fn deliver(&mut self, message: &str) -> anyhow::Result<()> {
        send_text(self.sender, message).await
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    if let Err(err) = stream_run(&mut sender, &mut receiver, &state).await {
        tracing::warn!("WebSocket run failed: {:#}", err);
        let _ = send_text(&mut sender, &error_message(client_error_text(&err))).await;
    }

    let _ = sender.send(Message::Close(None)).await;
}

async fn stream_run(
    sender: &mut SplitSink<WebSocket, Message>,
    receiver: &mut SplitStream<WebSocket>,
    state: &AppState,
) -> anyhow::Result<()> {
    let Some(request) = next_request(receiver).await? else {
        tracing::info!("Client disconnected before starting a run");
        return Ok(());
    };

    let graph_id = request.graph_id.unwrap_or_default();
    let Some(graph) = state.graphs.get(&graph_id).await else {
        send_text(sender, MSG_GRAPH_NOT_FOUND).await?;
        return Ok(());
    };

    send_text(sender, &connected_message(&graph_id)).await?;

    let initial_state = request.initial_state.unwrap_or_default();
    let (final_state, _logs) = {
        let mut sink = WsProgressSink {
            sender: &mut *sender,
        };
        graph.run_streaming(initial_state, &mut sink).await?
    };

    send_text(sender, MSG_RUN_COMPLETE).await?;
    let payload = serde_json::to_string(&final_state).context("serialize final state")?;
    send_text(sender, &payload).await?;
    Ok(())
}

/// Graph failures show the client only their message; the trace stays in the log.
fn client_error_text(err: &anyhow::Error) -> String {
    match err.downcast_ref::<GraphError>() {
        Some(graph_err) => graph_err.message.clone(),
        None => format!("{:#}", err),
    }
}

/// Waits for the client's run request; `None` if the socket closes first.
async fn next_request(receiver: &mut SplitStream<WebSocket>) -> anyhow::Result<Option<WsRunRequest>> {
    while let Some(msg) = receiver.next().await {
        match msg.context("websocket receive failed")? {
            Message::Text(text) => {
                let request = serde_json::from_str::<WsRunRequest>(&text)
                    .context("invalid run request")?;
                return Ok(Some(request));
            }
            Message::Close(_) => return Ok(None),
            _ => {}
        }
    }
    Ok(None)
}

pub async fn send_text(
    sender: &mut SplitSink<WebSocket, Message>,
    text: &str,
) -> anyhow::Result<()> {
    sender
        .send(Message::Text(text.to_string()))
        .await
        .context("websocket send failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphErrorKind;

    #[test]
    fn test_client_error_text_hides_graph_trace() {
        let err = anyhow::Error::from(
            GraphError::node_not_found("ghost").with_trace(&["split_text".to_string()]),
        );
        assert_eq!(
            error_message(client_error_text(&err)),
            "Error: Node 'ghost' not found"
        );

        let failed = anyhow::Error::from(GraphError::new(
            GraphErrorKind::NodeFailed,
            "merge",
            "field 'chunks' is not a list",
        ));
        assert_eq!(client_error_text(&failed), "field 'chunks' is not a list");
    }

    #[test]
    fn test_client_error_text_keeps_other_causes() {
        let err = anyhow::anyhow!("expected value").context("invalid run request");
        assert_eq!(client_error_text(&err), "invalid run request: expected value");
    }
}
