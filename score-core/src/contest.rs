//! Reference reducer for a two-sided contest scoreboard.
//!
//! State layout:
//!
//! ```text
//! {
//!   "score": {
//!     "<side>": { "tasks": { "<taskId>": <number> }, "enable": bool, "vgoal": <number|null> }
//!   },
//!   "connectedDevices": { "devices": [ { "sockId": "...", ... } ] }
//! }
//! ```
//!
//! Action tags follow the `<slice>/<reducer>` convention the display clients
//! already emit (`task/setTaskUpdate`, `connectedDevices/removeDevice`, ...).
//! Anything else, phase and timer actions included, is carried through the
//! relay untouched and leaves this state alone.

use score_types::{Action, StoreState};
use serde::Deserialize;
use serde_json::{json, Map, Number, Value};

use crate::Reducer;

/// Tag of the action the relay synthesizes when a session closes.
pub const REMOVE_DEVICE_ACTION: &str = "connectedDevices/removeDevice";

const SET_TASK_UPDATE: &str = "task/setTaskUpdate";
const SET_SCORE_ENABLE: &str = "task/setScoreEnable";
const SET_VGOAL_TIME: &str = "task/setVgoalTime";
const UNSET_VGOAL_TIME: &str = "task/unsetVgoalTime";
const SET_CURRENT: &str = "task/setCurrent";
const ADD_DEVICE_OR_UPDATE: &str = "connectedDevices/addDeviceOrUpdate";

/// Decoded form of the actions [`ContestReducer`] understands.
#[derive(Debug, Clone, PartialEq)]
pub enum ContestAction {
    /// Set one task counter on one side
    SetTaskUpdate {
        /// `blue`, `red`, ...
        field_side: String,
        /// Task object id from the contest config
        task_object_id: String,
        /// New counter value
        after_value: Number,
    },
    /// Enable or disable a side's score display
    SetScoreEnable {
        /// Target side
        field_side: String,
        /// New flag
        enable: bool,
    },
    /// Record a V-goal time for a side
    SetVgoalTime {
        /// Target side
        field_side: String,
        /// Elapsed time at V-goal
        vgoal_time: Number,
    },
    /// Clear a side's V-goal time
    UnsetVgoalTime {
        /// Target side
        field_side: String,
    },
    /// Replace the whole score subtree
    SetCurrent(Map<String, Value>),
    /// Insert or replace a roster entry keyed by `sockId`
    AddDeviceOrUpdate(Map<String, Value>),
    /// Drop a roster entry
    RemoveDevice {
        /// Session id of the device
        sock_id: String,
    },
    /// Unknown tag or unusable payload. Always a no-op.
    Unrecognized,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskUpdatePayload {
    field_side: String,
    task_object_id: String,
    after_value: Number,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoreEnablePayload {
    field_side: String,
    enable: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VgoalTimePayload {
    field_side: String,
    vgoal_time: Number,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldSidePayload {
    field_side: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SockIdPayload {
    sock_id: String,
}

fn decode<T: serde::de::DeserializeOwned>(payload: &Value) -> Option<T> {
    T::deserialize(payload).ok()
}

impl ContestAction {
    /// Decode an opaque action. Never fails: anything unusable is
    /// [`ContestAction::Unrecognized`].
    pub fn from_action(action: &Action) -> Self {
        let payload = &action.payload;
        let decoded = match action.kind.as_str() {
            SET_TASK_UPDATE => decode::<TaskUpdatePayload>(payload).map(|p| Self::SetTaskUpdate {
                field_side: p.field_side,
                task_object_id: p.task_object_id,
                after_value: p.after_value,
            }),
            SET_SCORE_ENABLE => {
                decode::<ScoreEnablePayload>(payload).map(|p| Self::SetScoreEnable {
                    field_side: p.field_side,
                    enable: p.enable,
                })
            }
            SET_VGOAL_TIME => decode::<VgoalTimePayload>(payload).map(|p| Self::SetVgoalTime {
                field_side: p.field_side,
                vgoal_time: p.vgoal_time,
            }),
            UNSET_VGOAL_TIME => decode::<FieldSidePayload>(payload).map(|p| Self::UnsetVgoalTime {
                field_side: p.field_side,
            }),
            SET_CURRENT => payload.as_object().cloned().map(Self::SetCurrent),
            ADD_DEVICE_OR_UPDATE => match payload {
                Value::Object(device) if device.get("sockId").is_some_and(Value::is_string) => {
                    Some(Self::AddDeviceOrUpdate(device.clone()))
                }
                _ => None,
            },
            REMOVE_DEVICE_ACTION => {
                decode::<SockIdPayload>(payload).map(|p| Self::RemoveDevice { sock_id: p.sock_id })
            }
            _ => None,
        };
        decoded.unwrap_or(Self::Unrecognized)
    }
}

/// Reducer for the contest scoreboard state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContestReducer;

impl ContestReducer {
    /// Create the reducer.
    pub fn new() -> Self {
        Self
    }
}

impl Reducer for ContestReducer {
    fn reduce(&self, state: &mut StoreState, action: &Action) {
        match ContestAction::from_action(action) {
            ContestAction::SetTaskUpdate {
                field_side,
                task_object_id,
                after_value,
            } => {
                if let Some(tasks) = side_mut(state, &field_side)
                    .and_then(|side| side.get_mut("tasks"))
                    .and_then(Value::as_object_mut)
                {
                    tasks.insert(task_object_id, Value::Number(after_value));
                }
            }
            ContestAction::SetScoreEnable { field_side, enable } => {
                if let Some(side) = side_mut(state, &field_side) {
                    side.insert("enable".into(), Value::Bool(enable));
                }
            }
            ContestAction::SetVgoalTime {
                field_side,
                vgoal_time,
            } => {
                if let Some(side) = side_mut(state, &field_side) {
                    side.insert("vgoal".into(), Value::Number(vgoal_time));
                }
            }
            ContestAction::UnsetVgoalTime { field_side } => {
                if let Some(side) = side_mut(state, &field_side) {
                    side.insert("vgoal".into(), Value::Null);
                }
            }
            ContestAction::SetCurrent(score) => {
                if let Some(root) = state.as_object_mut() {
                    root.insert("score".into(), Value::Object(score));
                }
            }
            ContestAction::AddDeviceOrUpdate(device) => {
                if let Some(devices) = devices_mut(state) {
                    let sock_id = device.get("sockId").cloned();
                    match devices.iter().position(|d| d.get("sockId") == sock_id.as_ref()) {
                        Some(index) => devices[index] = Value::Object(device),
                        None => devices.push(Value::Object(device)),
                    }
                }
            }
            ContestAction::RemoveDevice { sock_id } => {
                if let Some(devices) = devices_mut(state) {
                    devices.retain(|d| {
                        d.get("sockId").and_then(Value::as_str) != Some(sock_id.as_str())
                    });
                }
            }
            ContestAction::Unrecognized => {}
        }
    }
}

fn side_mut<'a>(state: &'a mut StoreState, field_side: &str) -> Option<&'a mut Map<String, Value>> {
    state
        .get_mut("score")?
        .get_mut(field_side)?
        .as_object_mut()
}

fn devices_mut(state: &mut StoreState) -> Option<&mut Vec<Value>> {
    state
        .get_mut("connectedDevices")?
        .get_mut("devices")?
        .as_array_mut()
}

/// Session ids currently listed in the roster.
pub fn connected_devices(state: &StoreState) -> Vec<&str> {
    state
        .get("connectedDevices")
        .and_then(|c| c.get("devices"))
        .and_then(Value::as_array)
        .map(|devices| {
            devices
                .iter()
                .filter_map(|d| d.get("sockId").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}

/// One scorable task from the contest rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskObject {
    /// Task id, used as the key under `tasks`
    pub id: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Starting counter value (default: 0)
    #[serde(default)]
    pub initial_value: i64,
}

/// Bootstrap source for the default initial state.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContestConfig {
    /// Sides of the field (default: `blue`, `red`).
    #[serde(default = "default_field_sides")]
    pub field_sides: Vec<String>,
    /// Scorable tasks, tracked per side.
    #[serde(default)]
    pub task_objects: Vec<TaskObject>,
}

fn default_field_sides() -> Vec<String> {
    vec!["blue".to_string(), "red".to_string()]
}

impl Default for ContestConfig {
    fn default() -> Self {
        Self {
            field_sides: default_field_sides(),
            task_objects: Vec::new(),
        }
    }
}

impl ContestConfig {
    /// The state a fresh contest starts from: every task at its initial
    /// value, scores disabled, no V-goal, empty roster.
    pub fn initial_state(&self) -> StoreState {
        let tasks: Map<String, Value> = self
            .task_objects
            .iter()
            .map(|task| (task.id.clone(), json!(task.initial_value)))
            .collect();

        let score: Map<String, Value> = self
            .field_sides
            .iter()
            .map(|side| {
                (
                    side.clone(),
                    json!({ "tasks": tasks.clone(), "enable": false, "vgoal": null }),
                )
            })
            .collect();

        json!({
            "score": score,
            "connectedDevices": { "devices": [] },
        })
    }
}
