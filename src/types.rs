use serde::{Deserialize, Serialize};

/// Hand pose recognised by the armband.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pose {
    Rest,
    FingersSpread,
    WaveIn,
    WaveOut,
    Fist,
    DoubleTap,
}

impl Pose {
    pub const ALL: [Pose; 6] = [
        Pose::Rest,
        Pose::FingersSpread,
        Pose::WaveIn,
        Pose::WaveOut,
        Pose::Fist,
        Pose::DoubleTap,
    ];

    /// Wire name, also the name of the event fired on entering the pose.
    pub fn as_str(self) -> &'static str {
        match self {
            Pose::Rest => "rest",
            Pose::FingersSpread => "fingers_spread",
            Pose::WaveIn => "wave_in",
            Pose::WaveOut => "wave_out",
            Pose::Fist => "fist",
            Pose::DoubleTap => "double_tap",
        }
    }

    /// Name of the event fired on leaving the pose.
    pub fn off_name(self) -> &'static str {
        match self {
            Pose::Rest => "rest_off",
            Pose::FingersSpread => "fingers_spread_off",
            Pose::WaveIn => "wave_in_off",
            Pose::WaveOut => "wave_out_off",
            Pose::Fist => "fist_off",
            Pose::DoubleTap => "double_tap_off",
        }
    }
}

/// Arm the device is worn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arm {
    Left,
    Right,
}

/// Which way the logo on the device points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    TowardElbow,
    TowardWrist,
}

/// Sensor warmup state. Anything the gateway reports other than `warm` reads as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarmupState {
    Warm,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Process-wide locking policy of the gateway.
///
/// Under `Standard` the device auto-locks unless held unlocked by an
/// active pose or a timed unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockingPolicy {
    #[default]
    Standard,
    None,
}

impl LockingPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            LockingPolicy::Standard => "standard",
            LockingPolicy::None => "none",
        }
    }
}

/// Length of a vibration command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VibrationDuration {
    Short,
    #[default]
    Medium,
    Long,
}

impl VibrationDuration {
    pub fn as_str(self) -> &'static str {
        match self {
            VibrationDuration::Short => "short",
            VibrationDuration::Medium => "medium",
            VibrationDuration::Long => "long",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_names_match_wire() {
        for pose in Pose::ALL {
            let wire = serde_json::to_value(pose).unwrap();
            assert_eq!(wire, pose.as_str());
            assert_eq!(pose.off_name(), format!("{}_off", pose.as_str()));
        }
    }

    #[test]
    fn test_warmup_state_falls_back_to_unknown() {
        let warm: WarmupState = serde_json::from_str("\"warm\"").unwrap();
        let cold: WarmupState = serde_json::from_str("\"cold\"").unwrap();
        assert_eq!(warm, WarmupState::Warm);
        assert_eq!(cold, WarmupState::Unknown);
        assert_eq!(WarmupState::default(), WarmupState::Unknown);
    }
}
