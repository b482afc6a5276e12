//! `WebSocket` handler and inbound protocol dispatch.
//!
//! Each attached client gets one socket task: outbound broadcast messages
//! are forwarded as text frames, inbound frames are parsed as
//! [`ClientMessage`] and dispatched against the shared state. Interactive
//! updates run entirely on the service runtime; nothing here ever calls
//! into the renderer-control side.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use plotline_protocol::{
    ClientMessage, ConnectionId, FunctionUpdateReply, FunctionUpdateRequest, GraphUpdateRequest,
    ServerMessage,
};
use plotline_sample::Domain;
use tracing::{debug, warn};

use crate::error::ServerError;
use crate::state::ServiceState;

/// Upgrade an HTTP request to a `WebSocket` connection and attach the
/// client to the session.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_endpoint(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServiceState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle the socket lifecycle: register the connection, then forward
/// outbound broadcasts and dispatch inbound messages until the client
/// leaves or the session shuts down.
async fn handle_socket(mut socket: WebSocket, state: Arc<ServiceState>) {
    let connection = ConnectionId::new();
    state.register_connection(connection).await;

    let mut rx = state.subscribe();

    loop {
        tokio::select! {
            // Outbound protocol messages from the session.
            result = rx.recv() => {
                match result {
                    Ok(message) => {
                        let json = match serde_json::to_string(&message) {
                            Ok(j) => j,
                            Err(e) => {
                                warn!(error = %e, "failed to serialize outbound message");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            debug!(%connection, "client disconnected (send failed)");
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        debug!(%connection, skipped = n, "client lagged, skipping ahead");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        debug!(%connection, "outbound channel closed");
                        break;
                    }
                }
            }
            // Inbound frames from the client.
            frame = socket.recv() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(message) => dispatch(&state, message).await,
                            Err(e) => warn!(%connection, error = %e, "ignoring unparseable message"),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(%connection, "client disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(%connection, error = %e, "socket error");
                        break;
                    }
                    _ => {
                        // Binary and pong frames are not part of the protocol.
                    }
                }
            }
            // Session shutdown: say goodbye and leave.
            () = state.shutdown.notified() => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
        }
    }

    state.remove_connection(connection).await;
}

/// Route one inbound protocol message against the shared state.
async fn dispatch(state: &ServiceState, message: ClientMessage) {
    match message {
        ClientMessage::GetGraphUpdate(request) => handle_graph_update(state, request).await,
        ClientMessage::GetFunctionUpdate(request) => handle_function_update(state, request).await,
        ClientMessage::GraphUpdated => state.render_acked.signal(),
        ClientMessage::SendImageData(payload) => handle_image_data(state, &payload).await,
        ClientMessage::Connect { connection } => state.register_connection(connection).await,
        ClientMessage::Disconnect { connection } => state.remove_connection(connection).await,
    }
}

/// Re-sample the interactive plot for new view parameters and push the
/// resulting snapshot. A sampling failure rides out in the snapshot's
/// error slot; the previous points survive, and the service stays up.
async fn handle_graph_update(state: &ServiceState, request: GraphUpdateRequest) {
    let domain = Domain::new(request.xmin, request.xmax);
    let y_bounds = match (request.ymin, request.ymax) {
        (Some(min), Some(max)) => Some((min, max)),
        _ => None,
    };

    let mut snapshot = {
        let mut figure = state.figure.lock().await;
        let outcome = figure.update_interactive(&request.parameters, domain, y_bounds);
        let mut snapshot = figure.snapshot();
        if let Err(e) = outcome {
            warn!(error = %e, "interactive update failed");
            snapshot.error = e.to_string();
        }
        snapshot
    };
    if snapshot.error.is_empty() {
        debug!(
            points = snapshot
                .data
                .datasets
                .last()
                .map_or(0, |dataset| dataset.data.len()),
            "interactive update sampled"
        );
    }
    state.broadcast(ServerMessage::UpdateGraph(Box::new(snapshot)));
}

/// Compile new function source for the interactive plot and reply with
/// the accepted parameter names or a structured failure. A figure without
/// an interactive plot ignores the request.
async fn handle_function_update(state: &ServiceState, request: FunctionUpdateRequest) {
    let reply = {
        let mut figure = state.figure.lock().await;
        let Some(interactive) = figure.interactive_mut() else {
            debug!("function update without an interactive plot, ignoring");
            return;
        };
        match interactive.bind_function(&request.code) {
            Ok(params) => FunctionUpdateReply {
                params: params.to_vec(),
                error: None,
            },
            Err(e) => FunctionUpdateReply {
                params: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    };
    state.broadcast(ServerMessage::UpdateFunction(reply));
}

/// Decode a capture response and hand the bytes to the waiting save
/// operation.
async fn handle_image_data(state: &ServiceState, payload: &str) {
    match decode_data_url(payload) {
        Ok(bytes) => {
            debug!(bytes = bytes.len(), "image data received");
            *state.image_data.lock().await = Some(bytes);
            state.image_received.signal();
        }
        Err(e) => warn!(error = %e, "discarding malformed image payload"),
    }
}

/// Decode a `data:<mime>;base64,<payload>` URL into raw bytes.
fn decode_data_url(payload: &str) -> Result<Vec<u8>, ServerError> {
    if !payload.starts_with("data:") {
        return Err(ServerError::ImagePayload(String::from(
            "expected a data URL",
        )));
    }
    let encoded = payload
        .split_once(',')
        .map(|(_, rest)| rest)
        .ok_or_else(|| ServerError::ImagePayload(String::from("missing payload separator")))?;
    BASE64
        .decode(encoded)
        .map_err(|e| ServerError::ImagePayload(format!("base64 decode failed: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::time::Duration;

    const SHORT: Duration = Duration::from_millis(20);

    fn make_state() -> ServiceState {
        ServiceState::new("test-token")
    }

    #[tokio::test]
    async fn graph_updated_signals_the_render_gate() {
        let state = make_state();
        dispatch(&state, ClientMessage::GraphUpdated).await;
        assert!(state.render_acked.wait(SHORT).await);
    }

    #[tokio::test]
    async fn image_data_is_decoded_and_buffered() {
        let state = make_state();
        // "hello" in base64.
        let payload = String::from("data:image/png;base64,aGVsbG8=");
        dispatch(&state, ClientMessage::SendImageData(payload)).await;

        assert!(state.image_received.wait(SHORT).await);
        let bytes = state.image_data.lock().await.clone().unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[tokio::test]
    async fn malformed_image_data_is_dropped_without_a_signal() {
        let state = make_state();
        dispatch(&state, ClientMessage::SendImageData(String::from("nonsense"))).await;

        assert!(!state.image_received.wait(SHORT).await);
        assert!(state.image_data.lock().await.is_none());
    }

    #[tokio::test]
    async fn function_update_replies_with_accepted_params() {
        let state = make_state();
        state.figure.lock().await.new_interactive_plot().unwrap();
        let mut rx = state.subscribe();

        dispatch(
            &state,
            ClientMessage::GetFunctionUpdate(FunctionUpdateRequest {
                code: String::from("f(x, a, b) = a * x + b"),
            }),
        )
        .await;

        match rx.recv().await.unwrap() {
            ServerMessage::UpdateFunction(reply) => {
                assert_eq!(reply.params, ["a", "b"]);
                assert_eq!(reply.error, None);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn bad_function_source_replies_with_an_error_and_keeps_the_old_one() {
        let state = make_state();
        {
            let mut figure = state.figure.lock().await;
            figure
                .new_interactive_plot()
                .unwrap()
                .bind_function("f(x, a) = a * x")
                .unwrap();
        }
        let mut rx = state.subscribe();

        dispatch(
            &state,
            ClientMessage::GetFunctionUpdate(FunctionUpdateRequest {
                code: String::from("f(y, a) = a * y"),
            }),
        )
        .await;

        match rx.recv().await.unwrap() {
            ServerMessage::UpdateFunction(reply) => {
                assert!(reply.params.is_empty());
                assert!(reply.error.is_some());
            }
            other => panic!("unexpected message: {other:?}"),
        }

        // The previously bound function is untouched.
        let figure = state.figure.lock().await;
        assert_eq!(figure.interactive().unwrap().params(), ["a"]);
    }

    #[tokio::test]
    async fn function_update_without_an_interactive_plot_is_ignored() {
        let state = make_state();
        let mut rx = state.subscribe();

        dispatch(
            &state,
            ClientMessage::GetFunctionUpdate(FunctionUpdateRequest {
                code: String::from("f(x) = x"),
            }),
        )
        .await;

        assert!(matches!(
            rx.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn graph_update_pushes_a_sampled_snapshot() {
        let state = make_state();
        {
            let mut figure = state.figure.lock().await;
            figure
                .new_interactive_plot()
                .unwrap()
                .bind_function("f(x) = x ^ 2")
                .unwrap();
        }
        let mut rx = state.subscribe();

        dispatch(
            &state,
            ClientMessage::GetGraphUpdate(GraphUpdateRequest {
                parameters: BTreeMap::new(),
                xmin: -1.0,
                xmax: 1.0,
                ymin: None,
                ymax: None,
            }),
        )
        .await;

        match rx.recv().await.unwrap() {
            ServerMessage::UpdateGraph(snapshot) => {
                assert!(snapshot.interactive);
                assert!(snapshot.error.is_empty());
                let dataset = snapshot.data.datasets.last().unwrap();
                assert!(!dataset.data.is_empty());
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_sampling_reports_through_the_error_slot() {
        let state = make_state();
        {
            let mut figure = state.figure.lock().await;
            figure
                .new_interactive_plot()
                .unwrap()
                .bind_function("f(x, a) = a * x")
                .unwrap();
        }
        let mut rx = state.subscribe();

        // No binding for `a`: sampling fails, the service must not.
        dispatch(
            &state,
            ClientMessage::GetGraphUpdate(GraphUpdateRequest {
                parameters: BTreeMap::new(),
                xmin: 0.0,
                xmax: 1.0,
                ymin: None,
                ymax: None,
            }),
        )
        .await;

        match rx.recv().await.unwrap() {
            ServerMessage::UpdateGraph(snapshot) => {
                assert!(!snapshot.error.is_empty());
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn in_band_connect_and_disconnect_update_the_registry() {
        let state = make_state();
        let id = ConnectionId::new();

        dispatch(&state, ClientMessage::Connect { connection: id }).await;
        assert_eq!(state.connection_count().await, 1);

        dispatch(&state, ClientMessage::Disconnect { connection: id }).await;
        assert_eq!(state.connection_count().await, 0);
    }

    #[test]
    fn data_url_decoding_rejects_non_data_urls() {
        assert!(decode_data_url("http://example.com/x.png").is_err());
        assert!(decode_data_url("data:image/png;base64").is_err());
        assert!(decode_data_url("data:image/png;base64,!!!").is_err());
        assert_eq!(
            decode_data_url("data:image/png;base64,aGVsbG8=").unwrap(),
            b"hello"
        );
    }
}
