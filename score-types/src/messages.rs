//! Protocol messages for scorecast.
//!
//! Every frame is a JSON text message. Clients send [`ClientMessage`]s; the
//! relay answers with [`ServerMessage`]s, forwards dispatches verbatim, and
//! announces disconnects as a bare JSON array of actions. [`ServerFrame`]
//! decodes any of those shapes on the client side.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{SessionId, WireError};

/// The shared state tree. Opaque to the protocol.
pub type StoreState = Value;

/// A requested state mutation: `{type, payload}`.
///
/// The relay never interprets `type` or `payload`; that is the reducer's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Action tag, e.g. `task/setTaskUpdate`
    #[serde(rename = "type")]
    pub kind: String,
    /// Free-form payload (null when absent)
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

impl Action {
    /// Create an action from a tag and payload.
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }
}

/// Messages sent by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Apply a batch of actions and replicate it to every session
    Dispatch {
        /// Actions, applied in order
        actions: Vec<Action>,
    },
    /// Same semantics as `Dispatch`
    DispatchAll {
        /// Actions, applied in order
        actions: Vec<Action>,
    },
    /// Persist the current state
    SaveStore,
}

impl ClientMessage {
    /// Decode a client frame.
    ///
    /// Distinguishes an unknown `type` from a malformed frame so the relay can
    /// log something useful.
    pub fn from_json(text: &str) -> Result<Self, WireError> {
        let value: Value = serde_json::from_str(text).map_err(WireError::Deserialization)?;
        let kind = match value.get("type") {
            Some(Value::String(kind)) => kind.clone(),
            Some(_) => return Err(WireError::InvalidData("`type` must be a string".into())),
            None => return Err(WireError::InvalidData("missing `type`".into())),
        };
        if !matches!(kind.as_str(), "dispatch" | "dispatch_all" | "save_store") {
            return Err(WireError::UnknownMessageType(kind));
        }
        serde_json::from_value(value).map_err(WireError::Deserialization)
    }

    /// Encode to a JSON text frame.
    pub fn to_json(&self) -> Result<String, WireError> {
        serde_json::to_string(self).map_err(WireError::Serialization)
    }

    /// The action batch carried by a dispatch, if any.
    pub fn actions(&self) -> Option<&[Action]> {
        match self {
            Self::Dispatch { actions } | Self::DispatchAll { actions } => Some(actions),
            Self::SaveStore => None,
        }
    }
}

/// Messages originated by the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full snapshot for a newly opened session
    Welcome(Welcome),
    /// Outcome of a `save_store` request
    SaveStoreResult(SaveStoreResult),
}

impl ServerMessage {
    /// Encode to a JSON text frame.
    pub fn to_json(&self) -> Result<String, WireError> {
        serde_json::to_string(self).map_err(WireError::Serialization)
    }
}

/// Snapshot sent once, right after a session opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Welcome {
    /// Id assigned to the receiving session
    pub sid: SessionId,
    /// Send time, milliseconds since the Unix epoch
    pub time: u64,
    /// Full store state at the time of sending
    pub state: StoreState,
    /// Number of actions applied to the store so far
    #[serde(default)]
    pub version: u64,
}

/// Acknowledgment of a `save_store` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveStoreResult {
    /// Whether the snapshot reached stable storage
    pub ok: bool,
    /// Completion time, milliseconds since the Unix epoch
    pub time: u64,
    /// Failure description when `ok` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Encode a batch of actions as a bare JSON array.
///
/// This is the shape used to announce a disconnect.
pub fn encode_action_batch(actions: &[Action]) -> Result<String, WireError> {
    serde_json::to_string(actions).map_err(WireError::Serialization)
}

/// Any frame a client can receive from the relay.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerFrame {
    /// Initial snapshot
    Welcome(Welcome),
    /// Actions to apply locally, in order (forwarded dispatch or disconnect)
    Actions(Vec<Action>),
    /// Save acknowledgment
    SaveStoreResult(SaveStoreResult),
}

impl ServerFrame {
    /// Decode a relay frame.
    pub fn from_json(text: &str) -> Result<Self, WireError> {
        let value: Value = serde_json::from_str(text).map_err(WireError::Deserialization)?;
        if value.is_array() {
            let actions = serde_json::from_value(value).map_err(WireError::Deserialization)?;
            return Ok(Self::Actions(actions));
        }
        match value.get("type").and_then(Value::as_str) {
            Some("welcome") | Some("save_store_result") => {
                match serde_json::from_value(value).map_err(WireError::Deserialization)? {
                    ServerMessage::Welcome(welcome) => Ok(Self::Welcome(welcome)),
                    ServerMessage::SaveStoreResult(result) => Ok(Self::SaveStoreResult(result)),
                }
            }
            Some("dispatch") | Some("dispatch_all") => {
                match serde_json::from_value(value).map_err(WireError::Deserialization)? {
                    ClientMessage::Dispatch { actions } | ClientMessage::DispatchAll { actions } => {
                        Ok(Self::Actions(actions))
                    }
                    ClientMessage::SaveStore => {
                        Err(WireError::InvalidData("save_store is client-only".into()))
                    }
                }
            }
            Some(other) => Err(WireError::UnknownMessageType(other.to_string())),
            None => Err(WireError::InvalidData("missing `type`".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dispatch_decodes_actions_in_order() {
        let text = r#"{"type":"dispatch","actions":[
            {"type":"task/setTaskUpdate","payload":{"fieldSide":"red","taskObjectId":"ball","afterValue":3}},
            {"type":"task/setScoreEnable","payload":{"fieldSide":"red","enable":true}}
        ]}"#;

        let msg = ClientMessage::from_json(text).unwrap();
        let actions = msg.actions().unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].kind, "task/setTaskUpdate");
        assert_eq!(actions[1].payload["enable"], json!(true));
    }

    #[test]
    fn dispatch_all_is_accepted() {
        let msg = ClientMessage::from_json(r#"{"type":"dispatch_all","actions":[]}"#).unwrap();
        assert!(matches!(msg, ClientMessage::DispatchAll { .. }));
    }

    #[test]
    fn save_store_ignores_extra_fields() {
        let msg = ClientMessage::from_json(r#"{"type":"save_store","extra":1}"#).unwrap();
        assert_eq!(msg, ClientMessage::SaveStore);
        assert!(msg.actions().is_none());
    }

    #[test]
    fn action_without_payload_is_null() {
        let msg =
            ClientMessage::from_json(r#"{"type":"dispatch","actions":[{"type":"phase/reset"}]}"#)
                .unwrap();
        assert!(msg.actions().unwrap()[0].payload.is_null());
    }

    #[test]
    fn malformed_frames_are_rejected() {
        assert!(matches!(
            ClientMessage::from_json("not json"),
            Err(WireError::Deserialization(_))
        ));
        assert!(matches!(
            ClientMessage::from_json(r#"{"actions":[]}"#),
            Err(WireError::InvalidData(_))
        ));
        assert!(matches!(
            ClientMessage::from_json(r#"{"type":7}"#),
            Err(WireError::InvalidData(_))
        ));
        assert!(matches!(
            ClientMessage::from_json(r#"{"type":"dispatch"}"#),
            Err(WireError::Deserialization(_))
        ));
        assert!(matches!(
            ClientMessage::from_json(r#"{"type":"dispatch","actions":[{"payload":1}]}"#),
            Err(WireError::Deserialization(_))
        ));
    }

    #[test]
    fn unknown_message_type_is_reported_by_name() {
        match ClientMessage::from_json(r#"{"type":"ping"}"#) {
            Err(WireError::UnknownMessageType(kind)) => assert_eq!(kind, "ping"),
            other => panic!("expected UnknownMessageType, got {:?}", other),
        }
    }

    #[test]
    fn welcome_wire_shape() {
        let sid = SessionId::new();
        let msg = ServerMessage::Welcome(Welcome {
            sid,
            time: 1_700_000_000_000,
            state: json!({"tasks": {}}),
            version: 4,
        });

        let value: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "welcome");
        assert_eq!(value["sid"], sid.to_string());
        assert_eq!(value["time"], 1_700_000_000_000u64);
        assert_eq!(value["state"], json!({"tasks": {}}));
        assert_eq!(value["version"], 4);
    }

    #[test]
    fn save_result_omits_error_on_success() {
        let msg = ServerMessage::SaveStoreResult(SaveStoreResult {
            ok: true,
            time: 1,
            error: None,
        });
        let json = msg.to_json().unwrap();
        assert!(json.contains("\"type\":\"save_store_result\""));
        assert!(!json.contains("error"));
    }

    #[test]
    fn action_batch_is_a_bare_array() {
        let batch = vec![Action::new(
            "connectedDevices/removeDevice",
            json!({"sockId": "abc"}),
        )];
        let json = encode_action_batch(&batch).unwrap();
        assert_eq!(
            json,
            r#"[{"type":"connectedDevices/removeDevice","payload":{"sockId":"abc"}}]"#
        );
    }

    #[test]
    fn server_frame_decodes_every_relay_shape() {
        let sid = SessionId::new();
        let welcome = ServerMessage::Welcome(Welcome {
            sid,
            time: 0,
            state: json!({}),
            version: 0,
        })
        .to_json()
        .unwrap();
        assert!(matches!(
            ServerFrame::from_json(&welcome).unwrap(),
            ServerFrame::Welcome(w) if w.sid == sid
        ));

        let forwarded = r#"{"type":"dispatch","actions":[{"type":"a"},{"type":"b"}]}"#;
        match ServerFrame::from_json(forwarded).unwrap() {
            ServerFrame::Actions(actions) => assert_eq!(actions.len(), 2),
            other => panic!("expected actions, got {:?}", other),
        }

        let removal = r#"[{"type":"connectedDevices/removeDevice","payload":{"sockId":"x"}}]"#;
        assert!(matches!(
            ServerFrame::from_json(removal).unwrap(),
            ServerFrame::Actions(a) if a.len() == 1
        ));

        let ack = r#"{"type":"save_store_result","ok":false,"time":5,"error":"disk full"}"#;
        match ServerFrame::from_json(ack).unwrap() {
            ServerFrame::SaveStoreResult(r) => {
                assert!(!r.ok);
                assert_eq!(r.error.as_deref(), Some("disk full"));
            }
            other => panic!("expected save result, got {:?}", other),
        }
    }

    #[test]
    fn server_frame_rejects_unknown_type() {
        assert!(matches!(
            ServerFrame::from_json(r#"{"type":"hello"}"#),
            Err(WireError::UnknownMessageType(_))
        ));
    }
}
