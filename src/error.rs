/// Errors that can occur when talking to the Myo Connect gateway.
///
/// Per-message processing never produces one of these: a bad message is
/// dropped, not reported.
#[derive(Debug, thiserror::Error)]
pub enum MyoError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("Socket error reported by gateway connection: {0}")]
    Socket(String),

    #[error("Gateway connection stopped")]
    StreamStopped,

    #[error("Timeout waiting for data")]
    Timeout,

    #[error("Channel disconnected")]
    ChannelDisconnected,
}
