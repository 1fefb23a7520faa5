/// Domain model for one decoded chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender_id: String,
    pub display_name: String,
    pub body: String,
}

/// Identity returned by the auth layer after login or registration.
/// Immutable for the lifetime of the session.
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity {
    pub user_id: String,
    pub display_name: String,
}
