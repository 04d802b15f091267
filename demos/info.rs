//! Print every armband Myo Connect pairs during the first few seconds, then exit.

use myolink::{ConnectOptions, Connection, Hub, MyoError};
use std::time::{Duration, Instant};

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
    let deadline = Instant::now() + Duration::from_secs(3);

    while Instant::now() < deadline {
        match connection.recv_timeout(Duration::from_millis(200)) {
            Ok(inbound) => {
                if let Err(e) = hub.handle(inbound) {
                    eprintln!("Error: {}", e);
                }
            }
            Err(MyoError::Timeout) => continue,
            Err(MyoError::StreamStopped) => break,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    println!("Found {} Myo(s):", hub.devices().len());
    for (i, myo) in hub.devices().iter().enumerate() {
        println!(
            "  [{}] MAC={}  Name={}  Handle={}  FW={}  Connected={}  Synced={}",
            i,
            myo.mac_address,
            myo.name.as_deref().unwrap_or("-"),
            myo.connect_index,
            myo.connect_version.as_deref().unwrap_or("?"),
            myo.is_connected,
            myo.is_synced,
        );
    }
}
