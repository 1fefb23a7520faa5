/// Events from the network layer up to the session loop.
#[derive(Debug, Clone)]
pub enum NetworkEvent {
    /// Broker accepted the connection and the topic subscription is active.
    Connected,
    /// A raw payload arrived on the chat topic.
    MessageReceived(String),
    /// The initial connection attempt failed; nothing was subscribed or published.
    ConnectionFailed(String),
    /// An established connection dropped.
    ConnectionLost(String),
}
