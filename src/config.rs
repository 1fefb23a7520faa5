/// Public test broker used when no `--server` is given.
pub const DEFAULT_BROKER: &str = "test.mosquitto.org";
pub const DEFAULT_PORT: u16 = 1883;

/// Single shared topic; every client publishes and subscribes here.
pub const CHAT_TOPIC: &str = "amu";

/// Immutable session configuration, built once at startup and threaded into
/// the send and receive paths.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub server: String,
    pub port: u16,
    pub store_enabled: bool,
}
