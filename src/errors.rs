use std::net::SocketAddr;

/// Errors produced while decoding an inbound datagram.
///
/// Neither variant is fatal: the dispatch loop treats both as "drop this
/// packet and move on," which is the only sane policy on a lossy UDP bus.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The datagram was unparseable or larger than the decode bound.
    #[error("malformed datagram: {0}")]
    Malformed(String),

    /// The envelope carried a protocol version this library does not speak.
    ///
    /// Unknown versions are ignored rather than errored so newer hubs can
    /// coexist with older devices.
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u32),
}

impl CodecError {
    pub(crate) fn malformed(err: impl ToString) -> Self {
        CodecError::Malformed(err.to_string())
    }
}

/// Errors produced by the transport layer or while building an outbound
/// envelope.
///
/// Transport failures are transient by design: a failed heartbeat send is
/// simply retried on the next scheduled firing.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// A socket operation failed.
    #[error("socket {action} error: {err:?}")]
    Socket { action: String, err: std::io::Error },

    /// Failed to serialize an outbound envelope.
    #[error("failed to encode envelope: {0:?}")]
    Encode(serde_json::Error),

    /// The datagram could not be delivered in full.
    #[error("short send to {dest}: wrote {written} of {len} bytes")]
    ShortSend {
        dest: SocketAddr,
        written: usize,
        len: usize,
    },
}

impl TransportError {
    /// Create a new socket error
    pub fn socket(action: &str, err: std::io::Error) -> Self {
        TransportError::Socket {
            action: action.to_string(),
            err,
        }
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for CodecError {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
