// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

//! Per-connection session state and the connection state machine.

/// Minimum scratch buffer size, large enough for the largest reply
/// this simulator marshals (a fragmented Read Tag response) plus
/// headroom.
pub const SCRATCH_BUFFER_SIZE: usize = 4200;

/// The lifecycle a single accepted connection moves through.
///
/// Each handler declares which state(s) it is legal to run from;
/// anything else is rejected with `BadParam` rather than silently
/// accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unregistered,
    Registered,
    Connected,
    Closed,
}

/// Mutable state carried for the lifetime of one accepted TCP
/// connection. A fresh `Session` is created per connection; nothing
/// here is shared across connections.
pub struct Session {
    pub state: ConnectionState,

    /// 32-bit handle allocated on Register Session, zero until then.
    pub session_handle: u32,

    /// Opaque value echoed from the client's EIP header.
    pub client_session_context: u64,

    /// Client-chosen connection id from Forward Open.
    pub client_connection_id: u32,

    /// Server-allocated connection id from Forward Open.
    pub server_connection_id: u32,

    /// Most recent connection sequence number seen from the client.
    pub client_connection_seq: u16,

    /// Upper bound on the byte size of a single reply, used to decide
    /// when a Read Tag response must fragment.
    pub max_response_size: usize,

    /// Set once Forward Close (or an unrecoverable error) has been
    /// handled; the per-connection loop exits after this is true.
    pub done: bool,
}

impl Session {
    pub fn new() -> Self {
        Session {
            state: ConnectionState::Unregistered,
            session_handle: 0,
            client_session_context: 0,
            client_connection_id: 0,
            server_connection_id: 0,
            client_connection_seq: 0,
            max_response_size: SCRATCH_BUFFER_SIZE,
            done: false,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_unregistered() {
        let session = Session::new();
        assert_eq!(session.state, ConnectionState::Unregistered);
        assert_eq!(session.session_handle, 0);
        assert!(!session.done);
    }
}
