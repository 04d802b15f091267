//! Message router and device registry.
//!
//! The [`Hub`] takes one gateway message at a time, finds (or, on pairing,
//! creates) the device it is about, applies the transition for its type and
//! publishes the resulting events before returning. Nothing is queued or
//! retried: a message that cannot be routed is dropped.

use crate::bus::{EventBus, SubscriptionId};
use crate::device::Myo;
use crate::events::Event;
use crate::protocol::{Command, Message, MessageKind};
use crate::socket::Inbound;
use crate::types::{LockingPolicy, VibrationDuration};
use crate::{MyoError, Result};
use serde_json::Value;
use std::rc::Rc;

/// Destination for outbound commands. Sending is fire-and-forget.
pub trait CommandSink {
    fn send_command(&mut self, command: Command);
}

/// Collects commands in memory.
impl CommandSink for Vec<Command> {
    fn send_command(&mut self, command: Command) {
        self.push(command);
    }
}

/// Queues commands for a live [`Connection`](crate::Connection).
impl CommandSink for crossbeam_channel::Sender<Command> {
    fn send_command(&mut self, command: Command) {
        if self.send(command).is_err() {
            log::warn!("Command dropped, gateway connection is gone");
        }
    }
}

/// Device registry, router and event bus for one gateway session.
///
/// Single-threaded: keep the hub on one thread and feed it from there.
pub struct Hub<S: CommandSink> {
    devices: Vec<Myo>,
    bus: Rc<EventBus>,
    locking_policy: LockingPolicy,
    sink: S,
}

impl<S: CommandSink> Hub<S> {
    pub fn new(sink: S) -> Self {
        Self {
            devices: Vec::new(),
            bus: Rc::new(EventBus::new()),
            locking_policy: LockingPolicy::default(),
            sink,
        }
    }

    // -- Subscriptions --

    /// See [`EventBus::subscribe`].
    pub fn subscribe<F>(&self, name: &str, callback: F) -> SubscriptionId
    where
        F: Fn(Option<&Myo>, &Event) + 'static,
    {
        self.bus.subscribe(name, callback)
    }

    pub fn unsubscribe(&self, name: &str) {
        self.bus.unsubscribe(name);
    }

    /// Shared handle to the bus, for callbacks that publish or subscribe themselves.
    pub fn bus(&self) -> Rc<EventBus> {
        self.bus.clone()
    }

    // -- Registry --

    pub fn devices(&self) -> &[Myo] {
        &self.devices
    }

    /// Device currently bound to a session handle.
    pub fn device(&self, handle: &str) -> Option<&Myo> {
        self.devices.iter().find(|m| m.connect_index == handle)
    }

    pub fn device_by_mac(&self, mac_address: &str) -> Option<&Myo> {
        self.devices.iter().find(|m| m.mac_address == mac_address)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    // -- Commands --

    pub fn locking_policy(&self) -> LockingPolicy {
        self.locking_policy
    }

    /// Tell the gateway about the new policy and use it for later pose transitions.
    pub fn set_locking_policy(&mut self, policy: LockingPolicy) {
        self.sink.send_command(Command::set_locking_policy(policy));
        self.locking_policy = policy;
    }

    pub fn send_command(&mut self, command: Command) {
        log::trace!("Command {:?}", command);
        self.sink.send_command(command);
    }

    pub fn lock(&mut self, handle: &str) {
        self.send_command(Command::lock(handle));
    }

    pub fn unlock(&mut self, handle: &str, hold: bool) {
        self.send_command(Command::unlock(handle, hold));
    }

    pub fn vibrate(&mut self, handle: &str, duration: VibrationDuration) {
        self.send_command(Command::vibrate(handle, duration));
    }

    pub fn request_bluetooth_strength(&mut self, handle: &str) {
        self.send_command(Command::request_rssi(handle));
    }

    pub fn request_battery_level(&mut self, handle: &str) {
        self.send_command(Command::request_battery_level(handle));
    }

    pub fn stream_emg(&mut self, handle: &str, enabled: bool) {
        self.send_command(Command::set_stream_emg(handle, enabled));
    }

    /// Calibrate a device so its current orientation reads as identity.
    ///
    /// Returns `false` if no device is bound to `handle`.
    pub fn zero_orientation(&mut self, handle: &str) -> bool {
        let Some(index) = self.position(handle) else {
            return false;
        };
        let event = self.devices[index].zero_orientation();
        self.bus.publish(Some(&self.devices[index]), &event);
        true
    }

    // -- Routing --

    /// Process one item from a gateway connection.
    ///
    /// A delivered socket error is returned to the caller; everything else
    /// is routed or published and never fails.
    pub fn handle(&mut self, inbound: Inbound) -> Result<()> {
        match inbound {
            Inbound::Ready => self.bus.publish(None, &Event::Ready),
            Inbound::Message(value) => self.route(&value),
            Inbound::Closed(info) => {
                log::info!("Gateway socket closed: {:?}", info);
                self.bus.publish(None, &Event::SocketClosed(info));
            }
            Inbound::Error(reason) => return Err(MyoError::Socket(reason)),
        }
        Ok(())
    }

    /// Route one loosely-typed gateway message. Malformed messages are dropped.
    pub fn route(&mut self, raw: &Value) {
        match Message::from_value(raw) {
            Some(message) => self.route_message(message),
            None => log::trace!("Dropping message without type or device handle"),
        }
    }

    /// Route one typed gateway message.
    pub fn route_message(&mut self, message: Message) {
        if let MessageKind::Paired { mac_address, name } = &message.kind {
            if self.device_by_mac(mac_address).is_none() {
                log::info!("Paired {} as handle {}", mac_address, message.handle);
                self.devices
                    .push(Myo::new(mac_address.clone(), name.clone(), message.handle.clone()));
            }
        }

        // First match wins when two records share a handle.
        let Some(index) = self.position(&message.handle) else {
            log::debug!(
                "Dropping '{}' for unknown handle {}",
                message.type_name(),
                message.handle
            );
            return;
        };

        let policy = self.locking_policy;
        let timestamp = message.timestamp;
        let myo = &mut self.devices[index];

        let (events, command) = match &message.kind {
            MessageKind::Pose { pose } => myo.apply_pose(*pose, policy),
            MessageKind::Orientation {
                orientation,
                accelerometer,
                gyroscope,
            } => (
                myo.apply_orientation(*orientation, *accelerometer, *gyroscope, timestamp),
                None,
            ),
            MessageKind::Emg { emg } => (vec![Event::Emg { emg: *emg, timestamp }], None),
            MessageKind::Paired { .. } => (myo.on_paired(&message), None),
            MessageKind::Connected { version } => (myo.on_connected(version, &message), None),
            MessageKind::Disconnected => (myo.on_disconnected(&message), None),
            MessageKind::Locked => (myo.on_locked(&message), None),
            // Deliberately silent: no `unlocked` event and no `status` event.
            MessageKind::Unlocked => (myo.on_unlocked(), None),
            MessageKind::ArmSynced {
                arm,
                x_direction,
                warmup_state,
            } => (
                myo.on_arm_synced(*arm, *x_direction, *warmup_state, &message),
                None,
            ),
            MessageKind::ArmUnsynced => (myo.on_arm_unsynced(&message), None),
            MessageKind::WarmupCompleted => (myo.on_warmup_completed(&message), None),
            MessageKind::Rssi { rssi } => (myo.on_rssi(*rssi, &message), None),
            MessageKind::BatteryLevel { battery_level } => {
                (myo.on_battery_level(*battery_level, &message), None)
            }
            MessageKind::Unknown => {
                log::debug!("Ignoring unknown message type '{}'", message.type_name());
                (Vec::new(), None)
            }
        };

        let myo = &self.devices[index];
        for event in &events {
            self.bus.publish(Some(myo), event);
        }
        if let Some(command) = command {
            self.send_command(command);
        }
    }

    /// First record bound to `handle`. Handles are not rebound, so a handle
    /// the gateway reuses for a new MAC keeps resolving to the older record.
    fn position(&self, handle: &str) -> Option<usize> {
        self.devices.iter().position(|m| m.connect_index == handle)
    }
}
