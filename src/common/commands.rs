/// Commands from the session loop down to the network layer.
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    /// Publish an encoded payload on the chat topic.
    Publish(String),
    /// Disconnect from the broker and stop the network task.
    Shutdown,
}
