/// Errors that can occur while mediating provider access.
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    /// A required collaborator was not supplied when building the mediator.
    #[error("missing required collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// The mediator task has stopped and can no longer accept commands.
    #[error("mediator is closed")]
    MediatorClosed,

    /// The outbound transport failed to deliver a message.
    #[error("transport error: {0}")]
    Transport(String),

    /// An inbound payload could not be decoded.
    #[error("malformed message: {0}")]
    Malformed(String),
}

/// Result type for mediator operations.
pub type ApprovalResult<T> = Result<T, ApprovalError>;
