//! # myolink - device-state synchronization for Myo armbands
//!
//! Consumes the message stream of a Myo Connect gateway and turns it into:
//! - consistent per-device state (pose, lock, sync, battery, calibration)
//! - an ordered, typed event stream with named and wildcard subscriptions
//! - fire-and-forget command intents (unlock, vibrate, EMG streaming, ...)
//!
//! ## Quick Start
//! ```no_run
//! use myolink::{ConnectOptions, Connection, Event, Hub};
//! use std::time::Duration;
//!
//! let connection = Connection::open(&ConnectOptions::from_env()).unwrap();
//! let mut hub = Hub::new(connection.command_sender());
//!
//! hub.subscribe("fist", |myo, _| {
//!     if let Some(myo) = myo {
//!         println!("fist on {}", myo.mac_address);
//!     }
//! });
//! hub.subscribe("orientation", |_, event| {
//!     if let Event::Orientation { orientation, .. } = event {
//!         println!("w={:.3}", orientation.w);
//!     }
//! });
//!
//! loop {
//!     let inbound = connection.recv_timeout(Duration::from_secs(5)).unwrap();
//!     hub.handle(inbound).unwrap();
//! }
//! ```

pub mod error;
pub mod types;
pub mod geometry;
pub mod config;
pub mod protocol;
pub mod events;
pub mod bus;
pub mod device;
pub mod hub;
pub mod socket;

pub use error::MyoError;
pub use types::*;
pub use geometry::{map_signal_strength, ImuData, Quaternion, Vector3};
pub use config::ConnectOptions;
pub use protocol::{Command, Message, MessageKind};
pub use events::{CloseInfo, Event, StatusKind};
pub use bus::{EventBus, SubscriptionId, WILDCARD};
pub use device::Myo;
pub use hub::{CommandSink, Hub};
pub use socket::{Connection, Inbound};

/// Result type alias for myolink operations.
pub type Result<T> = std::result::Result<T, MyoError>;
