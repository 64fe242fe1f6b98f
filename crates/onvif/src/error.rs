// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy shared by discovery, SOAP dispatch and the service wrappers.
//!
//! Remote calls are classified exactly once, at the dispatcher boundary, into
//! one of four kinds (see [`ErrorKind`]). Wrappers propagate that
//! classification untouched; callers branch on [`Error::kind`] to decide
//! between retrying (connection failures) and giving up (everything else).

/// Coarse classification of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The device rejected the supplied credentials.
    Authentication,
    /// Network or HTTP-level failure; plausibly transient.
    Connection,
    /// A well-formed SOAP fault that is not an authentication rejection.
    Protocol,
    /// Anything that could not be classified above.
    Unexpected,
    /// Local network resources (sockets, multicast membership) are unavailable.
    Resource,
    /// Caller supplied an argument that cannot be used.
    InvalidArgument,
}

/// Errors returned by ONVIF operations.
///
/// # Example
///
/// ```rust,no_run
/// use onvif::{Camera, ClientConfig, ErrorKind};
///
/// let camera = Camera::new("192.168.1.100", 80, ClientConfig::default())?;
/// match camera.device().get_device_information() {
///     Ok(info) => println!("{} {}", info.manufacturer, info.model),
///     Err(e) if e.kind() == ErrorKind::Authentication => eprintln!("bad credentials"),
///     Err(e) if e.is_retryable() => eprintln!("try again later: {}", e),
///     Err(e) => eprintln!("giving up: {}", e),
/// }
/// # Ok::<(), onvif::Error>(())
/// ```
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Remote call failures
    // ========================================================================
    /// Credential rejection signaled by a SOAP fault.
    AuthenticationFailure(String),
    /// Transport-level failure: unreachable host, HTTP error status, timeout.
    ConnectionFailure(String),
    /// Any other SOAP fault (unsupported operation, malformed request...).
    ProtocolFault {
        /// Fault code followed by its subcodes, e.g. `env:Receiver ter:ActionNotSupported`.
        code: String,
        /// Human readable fault reason.
        message: String,
    },
    /// Failure that fits none of the categories above.
    UnexpectedFailure(String),

    // ========================================================================
    // Local resource failures (discovery)
    // ========================================================================
    /// Failed to create or bind the discovery socket.
    BindFailed(String),
    /// Failed to join the WS-Discovery multicast group.
    MulticastJoinFailed(String),
    /// Failed to send the probe datagram.
    SendFailed(String),
    /// I/O error with underlying cause.
    IoError(std::io::Error),

    // ========================================================================
    // Caller errors
    // ========================================================================
    /// Argument rejected before any network activity.
    InvalidArgument(String),
}

impl Error {
    /// Classification callers are expected to branch on.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AuthenticationFailure(_) => ErrorKind::Authentication,
            Error::ConnectionFailure(_) => ErrorKind::Connection,
            Error::ProtocolFault { .. } => ErrorKind::Protocol,
            Error::UnexpectedFailure(_) => ErrorKind::Unexpected,
            Error::BindFailed(_)
            | Error::MulticastJoinFailed(_)
            | Error::SendFailed(_)
            | Error::IoError(_) => ErrorKind::Resource,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }

    /// Connection failures are the only ones worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Connection
    }

    /// True for the fault devices return when an optional action is not implemented.
    pub(crate) fn is_action_not_supported(&self) -> bool {
        match self {
            Error::ProtocolFault { code, message } => {
                code.contains("ActionNotSupported")
                    || code.contains("NotSupported")
                    || message.contains("not supported")
                    || message.contains("Not Implemented")
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::AuthenticationFailure(msg) => write!(f, "Authentication failed: {}", msg),
            Error::ConnectionFailure(msg) => write!(f, "Connection failed: {}", msg),
            Error::ProtocolFault { code, message } => {
                write!(f, "SOAP fault ({}): {}", code, message)
            }
            Error::UnexpectedFailure(msg) => write!(f, "Unexpected failure: {}", msg),
            Error::BindFailed(msg) => write!(f, "Bind failed: {}", msg),
            Error::MulticastJoinFailed(msg) => write!(f, "Multicast join failed: {}", msg),
            Error::SendFailed(msg) => write!(f, "Send failed: {}", msg),
            Error::IoError(e) => write!(f, "I/O error: {}", e),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e)
    }
}

/// Convenient alias for API results using the public `Error` type.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            Error::AuthenticationFailure("x".into()).kind(),
            ErrorKind::Authentication
        );
        assert_eq!(
            Error::ConnectionFailure("x".into()).kind(),
            ErrorKind::Connection
        );
        assert_eq!(
            Error::ProtocolFault {
                code: "env:Sender".into(),
                message: "bad".into()
            }
            .kind(),
            ErrorKind::Protocol
        );
        assert_eq!(
            Error::MulticastJoinFailed("x".into()).kind(),
            ErrorKind::Resource
        );
    }

    #[test]
    fn test_only_connection_is_retryable() {
        assert!(Error::ConnectionFailure("timeout".into()).is_retryable());
        assert!(!Error::AuthenticationFailure("nope".into()).is_retryable());
        assert!(!Error::UnexpectedFailure("?".into()).is_retryable());
    }

    #[test]
    fn test_action_not_supported_detection() {
        let fault = Error::ProtocolFault {
            code: "env:Receiver ter:ActionNotSupported ter:AudioNotSupported".into(),
            message: "Optional Action Not Implemented".into(),
        };
        assert!(fault.is_action_not_supported());

        let other = Error::ProtocolFault {
            code: "env:Sender ter:InvalidArgVal".into(),
            message: "No such profile".into(),
        };
        assert!(!other.is_action_not_supported());
        assert!(!Error::ConnectionFailure("not supported".into()).is_action_not_supported());
    }

    #[test]
    fn test_display() {
        let err = Error::ProtocolFault {
            code: "env:Sender".into(),
            message: "Invalid token".into(),
        };
        assert_eq!(err.to_string(), "SOAP fault (env:Sender): Invalid token");
    }
}
