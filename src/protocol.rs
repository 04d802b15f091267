use crate::geometry::Quaternion;
use crate::types::{Arm, Direction, LockingPolicy, Pose, VibrationDuration, WarmupState};
use crate::{MyoError, Result};
use serde::Deserialize;
use serde_json::{json, Map, Value};

// -- Envelope tags --
pub const TAG_EVENT: &str = "event";
pub const TAG_COMMAND: &str = "command";

/// Type-specific payload of a gateway message, discriminated on `type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageKind {
    Paired {
        mac_address: String,
        #[serde(default)]
        name: Option<String>,
    },
    Connected {
        #[serde(default)]
        version: Vec<Value>,
    },
    Disconnected,
    Locked,
    Unlocked,
    ArmSynced {
        arm: Arm,
        x_direction: Direction,
        #[serde(default)]
        warmup_state: WarmupState,
    },
    ArmUnsynced,
    WarmupCompleted,
    Pose {
        pose: Pose,
    },
    Orientation {
        orientation: Quaternion,
        accelerometer: [f64; 3],
        gyroscope: [f64; 3],
    },
    Emg {
        emg: [i32; 8],
    },
    Rssi {
        rssi: i32,
    },
    BatteryLevel {
        battery_level: u8,
    },
    /// Any `type` this client does not know. Kept so the router can log and skip it.
    #[serde(other)]
    Unknown,
}

/// One decoded gateway message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Session handle (`myo` field) of the device the message is about.
    pub handle: String,
    pub timestamp: Option<u64>,
    pub kind: MessageKind,
    /// The message as received, handed to `status`-style subscribers.
    pub raw: Value,
}

impl Message {
    /// Build a typed message from a loosely-typed one.
    ///
    /// Returns `None` when `type` or `myo` is missing, or when the payload
    /// of a known type does not have the expected shape.
    pub fn from_value(raw: &Value) -> Option<Message> {
        let type_name = raw.get("type").and_then(Value::as_str).filter(|t| !t.is_empty())?;
        let handle = raw.get("myo").and_then(handle_from_value)?;

        let kind = match MessageKind::deserialize(raw) {
            Ok(kind) => kind,
            Err(e) => {
                log::trace!("Dropping malformed '{}' message: {}", type_name, e);
                return None;
            }
        };

        Some(Message {
            handle,
            timestamp: raw.get("timestamp").and_then(timestamp_from_value),
            kind,
            raw: raw.clone(),
        })
    }

    /// The raw `type` field.
    pub fn type_name(&self) -> &str {
        self.raw.get("type").and_then(Value::as_str).unwrap_or("")
    }
}

/// Session handles arrive as numbers or strings; both normalise to a string.
fn handle_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Timestamps arrive as numbers or numeric strings.
fn timestamp_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Join a `connected` version array (`[1, 5, 1931, 0]`) into `1.5.1931.0`.
pub fn join_version(parts: &[Value]) -> String {
    parts
        .iter()
        .map(|part| match part {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Unwrap an inbound `["event", {...}]` frame.
///
/// Returns `Ok(None)` for frames with another tag.
pub fn decode_envelope(text: &str) -> Result<Option<Value>> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Array(mut items) = value else {
        return Err(MyoError::InvalidEnvelope("expected a JSON array".into()));
    };
    if items.len() < 2 {
        return Err(MyoError::InvalidEnvelope(format!(
            "expected [tag, payload], got {} element(s)",
            items.len()
        )));
    }
    let is_event = match items[0].as_str() {
        Some(tag) => tag == TAG_EVENT,
        None => return Err(MyoError::InvalidEnvelope("tag is not a string".into())),
    };
    if !is_event {
        return Ok(None);
    }
    Ok(Some(items.swap_remove(1)))
}

/// Outbound intent for the gateway. Delivery is never confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub command: &'static str,
    /// Session handle of the target device, absent for gateway-wide commands.
    pub myo: Option<String>,
    /// Command parameter, written as the wire `type` field.
    pub kind: Option<&'static str>,
}

impl Command {
    fn for_device(command: &'static str, myo: &str, kind: Option<&'static str>) -> Self {
        Self {
            command,
            myo: Some(myo.to_string()),
            kind,
        }
    }

    pub fn lock(myo: &str) -> Self {
        Self::for_device("lock", myo, None)
    }

    /// `hold` keeps the device unlocked until told otherwise; otherwise the unlock is timed.
    pub fn unlock(myo: &str, hold: bool) -> Self {
        Self::for_device("unlock", myo, Some(if hold { "hold" } else { "timed" }))
    }

    pub fn vibrate(myo: &str, duration: VibrationDuration) -> Self {
        Self::for_device("vibrate", myo, Some(duration.as_str()))
    }

    pub fn set_locking_policy(policy: LockingPolicy) -> Self {
        Self {
            command: "set_locking_policy",
            myo: None,
            kind: Some(policy.as_str()),
        }
    }

    pub fn set_stream_emg(myo: &str, enabled: bool) -> Self {
        Self::for_device(
            "set_stream_emg",
            myo,
            Some(if enabled { "enabled" } else { "disabled" }),
        )
    }

    pub fn request_rssi(myo: &str) -> Self {
        Self::for_device("request_rssi", myo, None)
    }

    pub fn request_battery_level(myo: &str) -> Self {
        Self::for_device("request_battery_level", myo, None)
    }
}

/// Wrap a command into its `["command", {...}]` frame.
///
/// Numeric handles go back on the wire as numbers, matching what the gateway sent.
pub fn encode_command(command: &Command) -> String {
    let mut body = Map::new();
    body.insert("command".into(), Value::from(command.command));
    if let Some(myo) = &command.myo {
        let handle = match myo.parse::<u64>() {
            Ok(n) => Value::from(n),
            Err(_) => Value::from(myo.as_str()),
        };
        body.insert("myo".into(), handle);
    }
    if let Some(kind) = command.kind {
        body.insert("type".into(), Value::from(kind));
    }
    json!([TAG_COMMAND, body]).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_event_envelope() {
        let text = r#"["event",{"type":"pose","myo":0,"timestamp":"1596313963","pose":"fist"}]"#;
        let value = decode_envelope(text).unwrap().unwrap();
        let msg = Message::from_value(&value).unwrap();
        assert_eq!(msg.handle, "0");
        assert_eq!(msg.timestamp, Some(1596313963));
        assert_eq!(msg.kind, MessageKind::Pose { pose: Pose::Fist });
        assert_eq!(msg.type_name(), "pose");
    }

    #[test]
    fn test_decode_envelope_other_tag() {
        assert_eq!(decode_envelope(r#"["acknowledged",{}]"#).unwrap(), None);
    }

    #[test]
    fn test_decode_envelope_rejects_garbage() {
        assert!(matches!(decode_envelope("{}"), Err(MyoError::InvalidEnvelope(_))));
        assert!(matches!(decode_envelope("[\"event\"]"), Err(MyoError::InvalidEnvelope(_))));
        assert!(matches!(decode_envelope("not json"), Err(MyoError::Json(_))));
    }

    #[test]
    fn test_missing_type_or_handle_is_dropped() {
        assert!(Message::from_value(&json!({"myo": 0, "pose": "fist"})).is_none());
        assert!(Message::from_value(&json!({"type": "pose", "pose": "fist"})).is_none());
        assert!(Message::from_value(&json!({"type": "", "myo": 0})).is_none());
    }

    #[test]
    fn test_bad_payload_is_dropped() {
        assert!(Message::from_value(&json!({"type": "pose", "myo": 0, "pose": "jazz_hands"})).is_none());
        assert!(Message::from_value(&json!({"type": "paired", "myo": 0})).is_none());
        assert!(Message::from_value(&json!({"type": "emg", "myo": 0, "emg": [1, 2, 3]})).is_none());
    }

    #[test]
    fn test_unknown_type_is_kept() {
        let msg = Message::from_value(&json!({"type": "firmware_update", "myo": "2"})).unwrap();
        assert_eq!(msg.kind, MessageKind::Unknown);
        assert_eq!(msg.type_name(), "firmware_update");
        assert_eq!(msg.timestamp, None);
    }

    #[test]
    fn test_orientation_payload() {
        let msg = Message::from_value(&json!({
            "type": "orientation",
            "myo": 1,
            "timestamp": 42,
            "orientation": {"x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0},
            "accelerometer": [0.1, 0.2, 0.98],
            "gyroscope": [1.5, -2.0, 0.25]
        }))
        .unwrap();
        match msg.kind {
            MessageKind::Orientation { orientation, accelerometer, gyroscope } => {
                assert_eq!(orientation, Quaternion::IDENTITY);
                assert_eq!(accelerometer, [0.1, 0.2, 0.98]);
                assert_eq!(gyroscope, [1.5, -2.0, 0.25]);
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_arm_synced_payload() {
        let msg = Message::from_value(&json!({
            "type": "arm_synced",
            "myo": 0,
            "arm": "left",
            "x_direction": "toward_elbow",
            "warmup_state": "cold"
        }))
        .unwrap();
        assert_eq!(
            msg.kind,
            MessageKind::ArmSynced {
                arm: Arm::Left,
                x_direction: Direction::TowardElbow,
                warmup_state: WarmupState::Unknown,
            }
        );
    }

    #[test]
    fn test_join_version() {
        assert_eq!(join_version(&[json!(1), json!(5), json!(1931), json!(0)]), "1.5.1931.0");
        assert_eq!(join_version(&[json!("1"), json!("2")]), "1.2");
        assert_eq!(join_version(&[]), "");
    }

    #[test]
    fn test_encode_unlock_hold() {
        let text = encode_command(&Command::unlock("0", true));
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!(["command", {"command": "unlock", "myo": 0, "type": "hold"}]));
    }

    #[test]
    fn test_encode_gateway_wide_command() {
        let text = encode_command(&Command::set_locking_policy(LockingPolicy::None));
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!(["command", {"command": "set_locking_policy", "type": "none"}]));
    }

    #[test]
    fn test_encode_string_handle() {
        let text = encode_command(&Command::request_rssi("left-arm"));
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!(["command", {"command": "request_rssi", "myo": "left-arm"}]));
    }
}
