use crate::config::ConnectOptions;
use crate::events::CloseInfo;
use crate::protocol::{self, Command};
use crate::{MyoError, Result};
use crossbeam_channel::{Receiver, SendTimeoutError, Sender};
use serde_json::Value;
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::WebSocket;

/// How long a socket read may block before the stop flag and command queue are polled again.
const READ_POLL: Duration = Duration::from_millis(50);

/// Depth of the inbound queue between the socket thread and the consumer.
const INBOUND_CAPACITY: usize = 1024;

type GatewaySocket = WebSocket<MaybeTlsStream<TcpStream>>;

/// What the gateway connection delivers to the consumer thread.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// The socket is open.
    Ready,
    /// One `event` payload, still loosely typed.
    Message(Value),
    /// The socket closed. Always the last item.
    Closed(CloseInfo),
    /// The socket failed; a `Closed` follows.
    Error(String),
}

/// Handle to an open Myo Connect websocket.
///
/// A background thread owns the socket: it forwards decoded event frames
/// and writes queued commands between reads. Messages arrive on one
/// channel, in gateway order, so a single consumer can hand them to a
/// [`Hub`](crate::Hub) one at a time.
pub struct Connection {
    receiver: Receiver<Inbound>,
    commands: Sender<Command>,
    stop_flag: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl Connection {
    /// Connect to the gateway and start the socket thread.
    pub fn open(options: &ConnectOptions) -> Result<Connection> {
        let url = options.url();
        let (socket, _response) = tungstenite::connect(url.as_str())?;
        set_read_timeout(&socket, READ_POLL);
        log::info!("Connected to Myo Connect at {}", url);

        let (sender, receiver) = crossbeam_channel::bounded(INBOUND_CAPACITY);
        let (commands, command_rx) = crossbeam_channel::unbounded();
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_clone = stop_flag.clone();

        let thread = std::thread::Builder::new()
            .name("myo-socket".into())
            .spawn(move || {
                socket_loop(socket, sender, command_rx, stop_clone);
            })
            .map_err(|e| MyoError::Socket(format!("Failed to spawn socket thread: {}", e)))?;

        Ok(Connection {
            receiver,
            commands,
            stop_flag,
            thread: Some(thread),
        })
    }

    /// Receive the next inbound item (blocks until available).
    pub fn recv(&self) -> Result<Inbound> {
        self.receiver.recv().map_err(|_| MyoError::StreamStopped)
    }

    /// Try to receive an inbound item without blocking.
    pub fn try_recv(&self) -> Option<Inbound> {
        self.receiver.try_recv().ok()
    }

    /// Receive an inbound item with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Inbound> {
        self.receiver.recv_timeout(timeout).map_err(|e| match e {
            crossbeam_channel::RecvTimeoutError::Timeout => MyoError::Timeout,
            crossbeam_channel::RecvTimeoutError::Disconnected => MyoError::StreamStopped,
        })
    }

    /// Command queue of this connection; usable as a hub's command sink.
    pub fn command_sender(&self) -> Sender<Command> {
        self.commands.clone()
    }

    /// Queue a command for the gateway.
    pub fn send_command(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| MyoError::ChannelDisconnected)
    }

    /// Check if the socket thread is still running.
    pub fn is_active(&self) -> bool {
        !self.stop_flag.load(Ordering::Relaxed)
            && self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Close the socket and wait for the thread to finish.
    pub fn disconnect(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn set_read_timeout(socket: &GatewaySocket, timeout: Duration) {
    match socket.get_ref() {
        MaybeTlsStream::Plain(stream) => {
            if let Err(e) = stream.set_read_timeout(Some(timeout)) {
                log::warn!("Failed to set socket read timeout: {}", e);
            }
        }
        _ => log::warn!("Unsupported stream type, socket reads will block"),
    }
}

fn is_timeout(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

/// The socket loop runs in a dedicated thread.
///
/// Each turn flushes pending commands, then reads at most one frame.
/// Ends on stop flag, close, error, or when the consumer drops its receiver.
fn socket_loop(
    mut socket: GatewaySocket,
    sender: Sender<Inbound>,
    commands: Receiver<Command>,
    stop_flag: Arc<AtomicBool>,
) {
    log::info!("Socket reader started");
    let mut close = CloseInfo::default();

    if !forward(&sender, Inbound::Ready, &stop_flag) {
        return;
    }

    loop {
        if stop_flag.load(Ordering::Relaxed) {
            log::info!("Socket reader stopping (stop flag set)");
            let _ = socket.close(None);
            let _ = socket.flush();
            break;
        }

        for command in commands.try_iter() {
            let text = protocol::encode_command(&command);
            log::trace!("-> {}", text);
            if let Err(e) = socket.send(tungstenite::Message::Text(text)) {
                log::warn!("Failed to send '{}' command: {}", command.command, e);
            }
        }

        let frame = match socket.read() {
            Ok(frame) => frame,
            Err(tungstenite::Error::Io(e)) if is_timeout(&e) => continue,
            Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                break;
            }
            Err(e) => {
                log::warn!("Socket read error: {}", e);
                forward(&sender, Inbound::Error(e.to_string()), &stop_flag);
                break;
            }
        };

        match frame {
            tungstenite::Message::Text(text) => match protocol::decode_envelope(&text) {
                Ok(Some(payload)) => {
                    if !forward(&sender, Inbound::Message(payload), &stop_flag) {
                        log::info!("Inbound channel gone, stopping reader");
                        let _ = socket.close(None);
                        let _ = socket.flush();
                        return;
                    }
                }
                Ok(None) => log::trace!("Skipping non-event frame: {}", text),
                Err(e) => log::warn!("Skipping undecodable frame: {}", e),
            },
            tungstenite::Message::Close(frame) => {
                if let Some(frame) = frame {
                    close = CloseInfo {
                        code: Some(u16::from(frame.code)),
                        reason: frame.reason.to_string(),
                    };
                }
                log::info!("Gateway closed the socket ({:?})", close.code);
            }
            _ => {}
        }
    }

    forward(&sender, Inbound::Closed(close), &stop_flag);
}

/// Blocking send that gives up once the stop flag is set or the consumer is gone.
fn forward(sender: &Sender<Inbound>, item: Inbound, stop_flag: &AtomicBool) -> bool {
    let mut item = item;
    loop {
        match sender.send_timeout(item, READ_POLL) {
            Ok(()) => return true,
            Err(SendTimeoutError::Timeout(back)) => {
                if stop_flag.load(Ordering::Relaxed) {
                    return false;
                }
                log::trace!("Inbound channel full, waiting for consumer");
                item = back;
            }
            Err(SendTimeoutError::Disconnected(_)) => return false,
        }
    }
}
