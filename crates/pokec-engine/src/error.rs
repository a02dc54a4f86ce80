use thiserror::Error;

/// Typed outcomes of every engine decision. These cross the engine boundary
/// as values; the transport layer maps them to user-visible responses.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("email is already registered")]
    DuplicateIdentity,

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("wrong email or password")]
    InvalidCredentials,

    #[error("this account is banned")]
    AccountBanned,

    #[error("not authorized")]
    Unauthorized,

    #[error("banned users cannot post")]
    Banned,

    #[error("muted users cannot post")]
    Muted,

    #[error("VIP status required for this room")]
    PaymentRequired,

    #[error("message text is empty")]
    EmptyMessage,

    #[error("no such {0}")]
    NotFound(&'static str),

    /// Collaborator outage — the only kind logged at source.
    #[error("persistence unavailable: {0}")]
    Persistence(#[from] anyhow::Error),
}
