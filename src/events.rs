//! Logical events published to subscribers.
//!
//! Each [`Event`] variant fixes both the subscription name it is published
//! under and the shape of its payload, so a subscriber that matches on the
//! variant for its name sees exactly one payload type.

use crate::geometry::{ImuData, Quaternion, Vector3};
use crate::types::Pose;
use serde_json::Value;

/// Device lifecycle updates that carry the raw gateway message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// The generic event fired alongside every specific one below.
    Status,
    Paired,
    Connected,
    Disconnected,
    Locked,
    ArmSynced,
    ArmUnsynced,
    WarmupCompleted,
}

impl StatusKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusKind::Status => "status",
            StatusKind::Paired => "paired",
            StatusKind::Connected => "connected",
            StatusKind::Disconnected => "disconnected",
            StatusKind::Locked => "locked",
            StatusKind::ArmSynced => "arm_synced",
            StatusKind::ArmUnsynced => "arm_unsynced",
            StatusKind::WarmupCompleted => "warmup_completed",
        }
    }
}

/// Why the gateway socket closed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CloseInfo {
    pub code: Option<u16>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Gateway socket is open.
    Ready,
    SocketClosed(CloseInfo),
    /// Fired under the pose's own name (`fist`, `rest`, ...).
    PoseEntered(Pose),
    /// Fired under `<pose>_off`.
    PoseExited(Pose),
    /// Generic `pose` event for any non-rest pose.
    Pose(Pose),
    /// Generic `pose_off` event.
    PoseOff(Pose),
    Orientation {
        orientation: Quaternion,
        timestamp: Option<u64>,
    },
    Accelerometer {
        accelerometer: Vector3,
        timestamp: Option<u64>,
    },
    Gyroscope {
        gyroscope: Vector3,
        timestamp: Option<u64>,
    },
    Imu {
        imu: ImuData,
        timestamp: Option<u64>,
    },
    ZeroOrientation,
    Emg {
        emg: [i32; 8],
        timestamp: Option<u64>,
    },
    BluetoothStrength {
        strength: f64,
        timestamp: Option<u64>,
    },
    Rssi {
        rssi: i32,
        timestamp: Option<u64>,
    },
    BatteryLevel {
        level: u8,
        timestamp: Option<u64>,
    },
    Status {
        kind: StatusKind,
        message: Value,
        timestamp: Option<u64>,
    },
}

impl Event {
    /// Subscription name this event is published under.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Ready => "ready",
            Event::SocketClosed(_) => "socket_closed",
            Event::PoseEntered(pose) => pose.as_str(),
            Event::PoseExited(pose) => pose.off_name(),
            Event::Pose(_) => "pose",
            Event::PoseOff(_) => "pose_off",
            Event::Orientation { .. } => "orientation",
            Event::Accelerometer { .. } => "accelerometer",
            Event::Gyroscope { .. } => "gyroscope",
            Event::Imu { .. } => "imu",
            Event::ZeroOrientation => "zero_orientation",
            Event::Emg { .. } => "emg",
            Event::BluetoothStrength { .. } => "bluetooth_strength",
            Event::Rssi { .. } => "rssi",
            Event::BatteryLevel { .. } => "battery_level",
            Event::Status { kind, .. } => kind.as_str(),
        }
    }

    pub fn timestamp(&self) -> Option<u64> {
        match self {
            Event::Orientation { timestamp, .. }
            | Event::Accelerometer { timestamp, .. }
            | Event::Gyroscope { timestamp, .. }
            | Event::Imu { timestamp, .. }
            | Event::Emg { timestamp, .. }
            | Event::BluetoothStrength { timestamp, .. }
            | Event::Rssi { timestamp, .. }
            | Event::BatteryLevel { timestamp, .. }
            | Event::Status { timestamp, .. } => *timestamp,
            _ => None,
        }
    }

    pub(crate) fn status(kind: StatusKind, message: &Value, timestamp: Option<u64>) -> Event {
        Event::Status {
            kind,
            message: message.clone(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_event_names() {
        assert_eq!(Event::PoseEntered(Pose::Fist).name(), "fist");
        assert_eq!(Event::PoseExited(Pose::WaveIn).name(), "wave_in_off");
        assert_eq!(Event::Pose(Pose::Fist).name(), "pose");
        assert_eq!(Event::PoseOff(Pose::Fist).name(), "pose_off");
    }

    #[test]
    fn test_status_event_names() {
        let msg = serde_json::json!({"type": "locked"});
        assert_eq!(Event::status(StatusKind::Locked, &msg, Some(3)).name(), "locked");
        assert_eq!(Event::status(StatusKind::Status, &msg, Some(3)).name(), "status");
        assert_eq!(Event::status(StatusKind::Status, &msg, Some(3)).timestamp(), Some(3));
        assert_eq!(Event::ZeroOrientation.timestamp(), None);
    }
}
