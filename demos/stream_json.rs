//! Stream every event as one JSON line through a wildcard subscriber.
//!
//! {"event":"orientation","t":1596314,"w":0.998,"x":0.012,"y":-0.041,"z":0.003}
//!
//! Usage: cargo run --example stream_json

use myolink::{ConnectOptions, Connection, Event, Hub, MyoError, WILDCARD};
use serde_json::json;
use std::io::{self, Write};
use std::time::Duration;

fn to_json(event: &Event) -> serde_json::Value {
    let mut line = match event {
        Event::Orientation { orientation: q, .. } => {
            json!({"w": q.w, "x": q.x, "y": q.y, "z": q.z})
        }
        Event::Accelerometer { accelerometer: v, .. } | Event::Gyroscope { gyroscope: v, .. } => {
            json!({"x": v.x, "y": v.y, "z": v.z})
        }
        Event::Pose(pose) | Event::PoseOff(pose) => json!({"pose": pose}),
        Event::Emg { emg, .. } => json!({"emg": emg}),
        Event::BluetoothStrength { strength, .. } => json!({"strength": strength}),
        Event::Rssi { rssi, .. } => json!({"rssi": rssi}),
        Event::BatteryLevel { level, .. } => json!({"level": level}),
        Event::Status { message, .. } => json!({"message": message}),
        Event::SocketClosed(info) => json!({"code": info.code, "reason": info.reason}),
        _ => json!({}),
    };
    line["event"] = json!(event.name());
    if let Some(t) = event.timestamp() {
        line["t"] = json!(t);
    }
    line
}

fn main() {
    env_logger::init();

    let connection = match Connection::open(&ConnectOptions::from_env()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to connect to Myo Connect: {}", e);
            std::process::exit(1);
        }
    };

    let mut hub = Hub::new(connection.command_sender());
    hub.subscribe(WILDCARD, |_, event| {
        // IMU duplicates the three events before it.
        if matches!(event, Event::Imu { .. }) {
            return;
        }
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let _ = writeln!(out, "{}", to_json(event));
        let _ = out.flush();
    });

    eprintln!("Streaming JSON (Ctrl+C to stop)...");

    let mut idle_timeouts: u32 = 0;

    loop {
        match connection.recv_timeout(Duration::from_secs(2)) {
            Ok(inbound) => {
                idle_timeouts = 0;
                // A socket error is followed by `Closed`, then the stream stops.
                if let Err(e) = hub.handle(inbound) {
                    eprintln!("Error: {}", e);
                }
            }
            Err(MyoError::Timeout) => {
                idle_timeouts += 1;
                eprintln!("No gateway message for 2s (timeout #{})", idle_timeouts);
                if idle_timeouts >= 15 {
                    eprintln!("Stopping after 30s without messages");
                    break;
                }
            }
            Err(MyoError::StreamStopped) => break,
            Err(e) => {
                eprintln!("Error: {}", e);
                break;
            }
        }
    }
}
