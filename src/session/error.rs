// ABOUTME: Session error types covering connect, authentication, registration and I/O failures
// ABOUTME: Every connect failure funnels through disconnect before it propagates

use thiserror::Error;

use crate::handler::HandlerError;
use crate::pdu::PduError;

/// Why network registration could not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("network auto-registration is disabled")]
    AutoRegistrationDisabled,
    #[error("network registration denied")]
    Denied,
    #[error("unknown network registration error")]
    Unknown,
    #[error("invalid registration response")]
    InvalidResponse,
}

/// Errors surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("device is not connected")]
    NotConnected,

    #[error("device is already connected")]
    AlreadyConnected,

    #[error("SIM PIN required but none configured")]
    NoPin,

    #[error("SIM PIN rejected by device")]
    InvalidPin,

    #[error("SIM PIN2 required but none configured")]
    NoPin2,

    #[error("SIM PIN2 rejected by device")]
    InvalidPin2,

    #[error("SIM PUK required")]
    PukRequired,

    #[error("network registration failed: {0}")]
    Registration(#[from] RegistrationError),

    #[error("device has no PDU mode support")]
    NoPduSupport,

    #[error("device has no TEXT mode support")]
    NoTextSupport,

    #[error("operation is not valid while connected")]
    StillConnected,

    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error(transparent)]
    Pdu(#[from] PduError),
}

pub type SessionResult<T> = Result<T, SessionError>;
