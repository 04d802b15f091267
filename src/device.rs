use crate::events::{Event, StatusKind};
use crate::geometry::{map_signal_strength, ImuData, Quaternion, Vector3};
use crate::protocol::{join_version, Command, Message};
use crate::types::{Arm, Direction, LockingPolicy, Pose, WarmupState};
use serde_json::Value;

/// State of one paired armband.
///
/// Records are created by the hub on the first `paired` message for a MAC
/// address and live as long as the hub. Each transition below touches only
/// the facets its message kind owns and returns the events to publish, in
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct Myo {
    /// Hardware address, fixed at pairing.
    pub mac_address: String,
    pub name: Option<String>,
    /// Session handle (`myo` field) assigned by the gateway.
    pub connect_index: String,

    pub is_locked: bool,
    pub is_connected: bool,
    pub is_synced: bool,

    pub battery_level: u8,
    /// Firmware version reported on connect, dot-joined.
    pub connect_version: Option<String>,
    pub warmup_state: WarmupState,
    pub arm: Option<Arm>,
    pub direction: Option<Direction>,

    /// Calibration applied to every raw orientation sample.
    pub orientation_offset: Quaternion,
    /// Most recent raw (uncalibrated) orientation sample.
    pub last_quaternion: Quaternion,
    pub last_imu: Option<ImuData>,
    /// Pose currently held; `None` at rest.
    pub last_pose: Option<Pose>,
}

impl Myo {
    pub fn new(
        mac_address: impl Into<String>,
        name: Option<String>,
        connect_index: impl Into<String>,
    ) -> Self {
        Self {
            mac_address: mac_address.into(),
            name,
            connect_index: connect_index.into(),
            is_locked: true,
            is_connected: false,
            is_synced: false,
            battery_level: 0,
            connect_version: None,
            warmup_state: WarmupState::Unknown,
            arm: None,
            direction: None,
            orientation_offset: Quaternion::IDENTITY,
            last_quaternion: Quaternion::IDENTITY,
            last_imu: None,
            last_pose: None,
        }
    }

    /// Pose state machine: `Rest` or `Holding(pose)`.
    ///
    /// Leaving a held pose always fires `<pose>_off` and `pose_off` first.
    /// Under the standard locking policy a held pose asks for a holding
    /// unlock and rest asks for a timed one.
    pub(crate) fn apply_pose(
        &mut self,
        pose: Pose,
        policy: LockingPolicy,
    ) -> (Vec<Event>, Option<Command>) {
        let mut events = Vec::with_capacity(4);

        if let Some(previous) = self.last_pose.take() {
            events.push(Event::PoseExited(previous));
            events.push(Event::PoseOff(previous));
        }

        let hold = if pose == Pose::Rest {
            events.push(Event::PoseEntered(Pose::Rest));
            false
        } else {
            events.push(Event::PoseEntered(pose));
            events.push(Event::Pose(pose));
            self.last_pose = Some(pose);
            true
        };

        let unlock = match policy {
            LockingPolicy::Standard => Some(Command::unlock(&self.connect_index, hold)),
            LockingPolicy::None => None,
        };
        (events, unlock)
    }

    /// Store the raw sample and emit the calibrated orientation followed by
    /// accelerometer, gyroscope and the combined IMU sample.
    pub(crate) fn apply_orientation(
        &mut self,
        raw: Quaternion,
        accelerometer: [f64; 3],
        gyroscope: [f64; 3],
        timestamp: Option<u64>,
    ) -> Vec<Event> {
        self.last_quaternion = raw;

        let imu = ImuData {
            orientation: self.orientation_offset.rotate(&raw),
            accelerometer: Vector3::from_triplet(accelerometer),
            gyroscope: Vector3::from_triplet(gyroscope),
        };
        self.last_imu = Some(imu);

        vec![
            Event::Orientation {
                orientation: imu.orientation,
                timestamp,
            },
            Event::Accelerometer {
                accelerometer: imu.accelerometer,
                timestamp,
            },
            Event::Gyroscope {
                gyroscope: imu.gyroscope,
                timestamp,
            },
            Event::Imu { imu, timestamp },
        ]
    }

    /// Make the current orientation the reference: later samples equal to
    /// the last one read as identity.
    pub(crate) fn zero_orientation(&mut self) -> Event {
        self.orientation_offset = self.last_quaternion.invert();
        Event::ZeroOrientation
    }

    pub(crate) fn on_paired(&self, message: &Message) -> Vec<Event> {
        status_events(StatusKind::Paired, message)
    }

    pub(crate) fn on_connected(&mut self, version: &[Value], message: &Message) -> Vec<Event> {
        self.connect_version = Some(join_version(version));
        self.is_connected = true;
        status_events(StatusKind::Connected, message)
    }

    pub(crate) fn on_disconnected(&mut self, message: &Message) -> Vec<Event> {
        self.is_connected = false;
        status_events(StatusKind::Disconnected, message)
    }

    pub(crate) fn on_locked(&mut self, message: &Message) -> Vec<Event> {
        self.is_locked = true;
        status_events(StatusKind::Locked, message)
    }

    /// Unlike `locked`, an unlock fires no event at all, not even `status`.
    pub(crate) fn on_unlocked(&mut self) -> Vec<Event> {
        self.is_locked = false;
        Vec::new()
    }

    pub(crate) fn on_arm_synced(
        &mut self,
        arm: Arm,
        direction: Direction,
        warmup_state: WarmupState,
        message: &Message,
    ) -> Vec<Event> {
        self.arm = Some(arm);
        self.direction = Some(direction);
        self.warmup_state = warmup_state;
        self.is_synced = true;
        status_events(StatusKind::ArmSynced, message)
    }

    pub(crate) fn on_arm_unsynced(&mut self, message: &Message) -> Vec<Event> {
        self.arm = None;
        self.direction = None;
        self.warmup_state = WarmupState::Unknown;
        self.is_synced = false;
        status_events(StatusKind::ArmUnsynced, message)
    }

    pub(crate) fn on_warmup_completed(&mut self, message: &Message) -> Vec<Event> {
        self.warmup_state = WarmupState::Warm;
        status_events(StatusKind::WarmupCompleted, message)
    }

    /// RSSI is not stored; it only derives the signal-strength event.
    pub(crate) fn on_rssi(&self, rssi: i32, message: &Message) -> Vec<Event> {
        let timestamp = message.timestamp;
        vec![
            Event::BluetoothStrength {
                strength: map_signal_strength(f64::from(rssi)),
                timestamp,
            },
            Event::Rssi { rssi, timestamp },
            Event::status(StatusKind::Status, &message.raw, timestamp),
        ]
    }

    pub(crate) fn on_battery_level(&mut self, level: u8, message: &Message) -> Vec<Event> {
        self.battery_level = level;
        vec![
            Event::BatteryLevel {
                level,
                timestamp: message.timestamp,
            },
            Event::status(StatusKind::Status, &message.raw, message.timestamp),
        ]
    }
}

/// The specific status event followed by the generic `status` one.
fn status_events(kind: StatusKind, message: &Message) -> Vec<Event> {
    vec![
        Event::status(kind, &message.raw, message.timestamp),
        Event::status(StatusKind::Status, &message.raw, message.timestamp),
    ]
}
