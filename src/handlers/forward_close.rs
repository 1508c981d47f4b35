// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

//! Forward Close: tears down the connected session.

use crate::cip::CipService;
use crate::error::Error;
use crate::session::{ConnectionState, Session};

/// Handles a Forward Close request, marking the session done so the
/// connection loop exits after the reply is written.
pub fn handle(session: &mut Session) -> Result<Vec<u8>, Error> {
    if session.state != ConnectionState::Connected {
        return Err(Error::BadParam("forward close received outside connected state"));
    }

    session.done = true;
    session.state = ConnectionState::Closed;

    Ok(vec![CipService::ForwardClose.response_code(), 0, 0, 0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_close_sets_done() {
        let mut session = Session::new();
        session.state = ConnectionState::Connected;
        let reply = handle(&mut session).unwrap();
        assert_eq!(reply, vec![0xCE, 0, 0, 0]);
        assert!(session.done);
        assert_eq!(session.state, ConnectionState::Closed);
    }

    #[test]
    fn test_rejects_wrong_state() {
        let mut session = Session::new();
        assert!(handle(&mut session).is_err());
    }
}
