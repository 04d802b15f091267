//! Stream poses and orientation from every paired Myo to stdout.
//!
//! Usage: cargo run --example stream
//! Make a fist to zero the orientation. Press Ctrl+C to stop.

use myolink::{ConnectOptions, Connection, Event, Hub, MyoError, VibrationDuration};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
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

    hub.subscribe("ready", |_, _| println!("Connected to Myo Connect"));
    hub.subscribe("socket_closed", |_, event| {
        if let Event::SocketClosed(info) = event {
            println!("Myo Connect closed the socket (code {:?})", info.code);
        }
    });
    hub.subscribe("paired", |myo, _| {
        if let Some(myo) = myo {
            println!("Paired {} ({})", myo.mac_address, myo.name.as_deref().unwrap_or("unnamed"));
        }
    });
    hub.subscribe("pose", |myo, event| {
        if let (Some(myo), Event::Pose(pose)) = (myo, event) {
            println!("[{}] pose {:?}", myo.connect_index, pose);
        }
    });

    // Fist zeroes the orientation; the hub is busy routing, so remember the request.
    let zero_requests: Rc<RefCell<Vec<String>>> = Rc::default();
    let requests = zero_requests.clone();
    hub.subscribe("fist", move |myo, _| {
        if let Some(myo) = myo {
            requests.borrow_mut().push(myo.connect_index.clone());
        }
    });

    let count = Rc::new(Cell::new(0u64));
    let samples = count.clone();
    hub.subscribe("orientation", move |myo, event| {
        samples.set(samples.get() + 1);
        // Print every ~50th sample to avoid flooding the terminal
        if samples.get() % 50 != 1 {
            return;
        }
        if let (Some(myo), Event::Orientation { orientation: q, timestamp }) = (myo, event) {
            println!(
                "[{}] ts={:<12}  quat=[{:+.3}, {:+.3}, {:+.3}, {:+.3}]",
                myo.connect_index,
                timestamp.unwrap_or(0),
                q.x, q.y, q.z, q.w,
            );
        }
    });

    println!("Streaming (Ctrl+C to stop)...");

    let start = Instant::now();
    let mut last_report = Instant::now();

    loop {
        match connection.recv_timeout(Duration::from_secs(2)) {
            Ok(inbound) => {
                // A socket error is followed by `Closed`, then the stream stops.
                if let Err(e) = hub.handle(inbound) {
                    eprintln!("Error: {}", e);
                }
                for handle in zero_requests.borrow_mut().drain(..) {
                    hub.zero_orientation(&handle);
                    hub.vibrate(&handle, VibrationDuration::Short);
                }
            }
            Err(MyoError::Timeout) => {
                if !connection.is_active() {
                    break;
                }
            }
            Err(MyoError::StreamStopped) => break,
            Err(e) => {
                eprintln!("Error: {}", e);
                break;
            }
        }

        // Report rate every 3 seconds
        let now = Instant::now();
        if now.duration_since(last_report) >= Duration::from_secs(3) {
            let elapsed = start.elapsed().as_secs_f64();
            println!(
                "--- {} samples in {:.1}s ({:.1} Hz) ---",
                count.get(),
                elapsed,
                count.get() as f64 / elapsed
            );
            last_report = now;
        }
    }
}
