//! The bidirectional message set.
//!
//! Client-to-service messages drive interactive updates, acknowledge
//! renders, and deliver captured images. Service-to-client messages push
//! chart snapshots, function-compile results, and capture requests. The
//! connection lifecycle pair exists for transports that signal attachment
//! in-band; the websocket transport synthesizes it from the socket
//! lifecycle instead.

use std::collections::BTreeMap;

use plotline_model::FigureSnapshot;
use serde::{Deserialize, Serialize};

use crate::ids::ConnectionId;

/// Messages sent by a remote client to the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Request a re-sampled chart for new view parameters.
    GetGraphUpdate(GraphUpdateRequest),
    /// Request compilation of new function source.
    GetFunctionUpdate(FunctionUpdateRequest),
    /// Acknowledge that the last pushed snapshot finished rendering.
    GraphUpdated,
    /// Deliver the captured chart image as a data URL.
    SendImageData(String),
    /// A client attached (in-band form).
    Connect {
        /// The attaching connection.
        connection: ConnectionId,
    },
    /// A client detached (in-band form).
    Disconnect {
        /// The detaching connection.
        connection: ConnectionId,
    },
}

/// Messages sent by the service to every connected client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Push a full chart snapshot to render.
    UpdateGraph(Box<FigureSnapshot>),
    /// Report the outcome of a function-compile request.
    UpdateFunction(FunctionUpdateReply),
    /// Ask the client to capture and send back the rendered image.
    RequestImageData,
}

/// Interactive view parameters for one graph update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphUpdateRequest {
    /// Bindings for the function's control parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
    /// Lower edge of the requested x domain.
    pub xmin: f64,
    /// Upper edge of the requested x domain.
    pub xmax: f64,
    /// Optional explicit lower y bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ymin: Option<f64>,
    /// Optional explicit upper y bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ymax: Option<f64>,
}

/// New function source from a remote client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionUpdateRequest {
    /// The function definition text, e.g. `f(x, a) = a * sin(x)`.
    pub code: String,
}

/// Outcome of a function-compile request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionUpdateReply {
    /// Accepted control parameter names, empty on failure.
    pub params: Vec<String>,
    /// The failure message, absent on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_use_the_wire_names() {
        let msg = ClientMessage::GetFunctionUpdate(FunctionUpdateRequest {
            code: String::from("f(x) = x"),
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "get_function_update");
        assert_eq!(value["payload"]["code"], "f(x) = x");

        let ack = serde_json::to_value(ClientMessage::GraphUpdated).unwrap();
        assert_eq!(ack["type"], "graph_updated");
    }

    #[test]
    fn graph_update_request_parses_with_optional_bounds() {
        let json = r#"{
            "type": "get_graph_update",
            "payload": {"parameters": {"a": 1.5}, "xmin": -1.0, "xmax": 1.0}
        }"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::GetGraphUpdate(req) => {
                assert_eq!(req.parameters.get("a"), Some(&1.5));
                assert_eq!(req.ymin, None);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn server_capture_request_has_no_payload_field() {
        let value = serde_json::to_value(ServerMessage::RequestImageData).unwrap();
        assert_eq!(value["type"], "request_image_data");
        assert!(value.get("payload").is_none());
    }

    #[test]
    fn function_reply_omits_the_error_slot_on_success() {
        let reply = FunctionUpdateReply {
            params: vec![String::from("a"), String::from("b")],
            error: None,
        };
        let value = serde_json::to_value(ServerMessage::UpdateFunction(reply)).unwrap();
        assert_eq!(value["type"], "update_function");
        assert_eq!(value["payload"]["params"][1], "b");
        assert!(value["payload"].get("error").is_none());
    }
}
