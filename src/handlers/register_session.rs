// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

//! Register Session: the first request on every connection.

use crate::error::Error;
use crate::session::{ConnectionState, Session};
use crate::slice::{get_u16_le, put_u16_le};
use rand::RngCore;

const PROTOCOL_VERSION: u16 = 1;

/// Handles a Register Session payload (`protocol_version(2)`,
/// `option_flags(2)`), allocating a fresh session handle on success.
///
/// Returns the 4-byte reply payload to echo after the EIP header; the
/// caller marshals the header itself since Register Session has no
/// CPF/CIP framing of its own.
pub fn handle(session: &mut Session, payload: &[u8], rng: &mut dyn RngCore) -> Result<Vec<u8>, Error> {
    if session.state != ConnectionState::Unregistered {
        return Err(Error::BadParam("register session received outside unregistered state"));
    }
    if payload.len() != 4 {
        return Err(Error::BadParam("register session payload must be 4 bytes"));
    }

    let protocol_version = get_u16_le(payload, 0);
    let option_flags = get_u16_le(payload, 2);

    if protocol_version != PROTOCOL_VERSION {
        return Err(Error::BadParam("unsupported protocol version"));
    }
    if option_flags != 0 {
        return Err(Error::BadParam("register session option flags must be zero"));
    }

    let mut handle = rng.next_u32();
    while handle == 0 {
        handle = rng.next_u32();
    }

    session.session_handle = handle;
    session.state = ConnectionState::Registered;

    let mut reply = vec![0u8; 4];
    put_u16_le(&mut reply, 0, protocol_version);
    put_u16_le(&mut reply, 2, option_flags);
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_allocates_nonzero_handle() {
        let mut session = Session::new();
        let payload = [0x01, 0x00, 0x00, 0x00];
        let mut rng = StepRng::new(42, 1);
        let reply = handle(&mut session, &payload, &mut rng).unwrap();
        assert_ne!(session.session_handle, 0);
        assert_eq!(session.state, ConnectionState::Registered);
        assert_eq!(reply, payload);
    }

    #[test]
    fn test_rejects_wrong_state() {
        let mut session = Session::new();
        session.state = ConnectionState::Connected;
        let payload = [0x01, 0x00, 0x00, 0x00];
        let mut rng = StepRng::new(1, 1);
        assert!(handle(&mut session, &payload, &mut rng).is_err());
    }

    #[test]
    fn test_rejects_wrong_version() {
        let mut session = Session::new();
        let payload = [0x02, 0x00, 0x00, 0x00];
        let mut rng = StepRng::new(1, 1);
        assert!(handle(&mut session, &payload, &mut rng).is_err());
    }
}
