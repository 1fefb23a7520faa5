use thiserror::Error;

/// Failure taxonomy for the client.
///
/// Connection errors are fatal and end the session; auth errors are handled
/// with re-prompt loops; I/O errors from the store are logged and survived.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("can't connect, please check your network connection")]
    Connection(#[from] rumqttc::ConnectionError),

    #[error("mqtt client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("user {0} is already registered")]
    UserExists(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
