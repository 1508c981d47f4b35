// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

//! Top-level request dispatch: EIP command -> CPF layer -> CIP
//! service handler -> marshalled reply.

mod forward_close;
mod forward_open;
mod read_tag;
mod register_session;

use crate::cip::CipService;
use crate::cpf::{ConnectedCpfRequest, UnconnectedCpfRequest};
use crate::eip::{EipCommand, EipHeader};
use crate::error::Error;
use crate::session::Session;
use crate::tag::Tag;
use rand::RngCore;
use std::convert::TryFrom;

/// Decodes one EIP packet in `request` and returns the full reply
/// packet to write back, or `None` when the request (Unregister
/// Session) requires no reply.
pub fn handle_request(session: &mut Session, tags: &[Tag], rng: &mut dyn RngCore, request: &[u8]) -> Result<Option<Vec<u8>>, Error> {
    let (header, payload) = EipHeader::decode(request, session)?;
    session.client_session_context = header.sender_context;

    match header.command {
        EipCommand::RegisterSession => {
            let reply_payload = register_session::handle(session, payload, rng)?;
            Ok(Some(wrap_eip(header.command, session, &reply_payload)))
        }
        EipCommand::UnregisterSession => {
            session.done = true;
            Ok(None)
        }
        EipCommand::UnconnectedData => {
            let cpf_req = UnconnectedCpfRequest::decode(payload)?;
            let service = CipService::try_from(*cpf_req.cip_payload.first().ok_or(Error::TooSmall("empty cip payload"))?)?;
            if !service.is_unconnected() {
                return Err(Error::Unsupported);
            }
            let cip_reply = forward_open::handle(session, service, cpf_req.cip_payload, rng)?;
            let mut cpf_reply = vec![0u8; crate::cpf::UNCONNECTED_HEADER_SIZE + cip_reply.len()];
            UnconnectedCpfRequest::encode(&mut cpf_reply, &cip_reply)?;
            Ok(Some(wrap_eip(header.command, session, &cpf_reply)))
        }
        EipCommand::ConnectedData => {
            let cpf_req = ConnectedCpfRequest::decode(payload, session.server_connection_id)?;
            session.client_connection_seq = cpf_req.connection_seq;
            let service = CipService::try_from(*cpf_req.cip_payload.first().ok_or(Error::TooSmall("empty cip payload"))?)?;
            if !service.is_connected() {
                return Err(Error::Unsupported);
            }
            let cip_reply = match service {
                CipService::ReadTag | CipService::ReadTagFragmented => read_tag::handle(session, service, cpf_req.cip_payload, tags)?,
                CipService::ForwardClose => forward_close::handle(session)?,
                CipService::ForwardOpen | CipService::ForwardOpenExtended => return Err(Error::Unsupported),
            };
            let mut cpf_reply = vec![0u8; crate::cpf::CONNECTED_HEADER_SIZE + 2 + cip_reply.len()];
            ConnectedCpfRequest::encode(&mut cpf_reply, session.server_connection_id, session.client_connection_seq, &cip_reply)?;
            Ok(Some(wrap_eip(header.command, session, &cpf_reply)))
        }
    }
}

fn wrap_eip(command: EipCommand, session: &Session, payload: &[u8]) -> Vec<u8> {
    let mut packet = vec![0u8; crate::eip::HEADER_SIZE + payload.len()];
    EipHeader::encode(&mut packet, command, payload.len() as u16, session.session_handle, session.client_session_context)
        .expect("scratch buffer sized for header");
    packet[crate::eip::HEADER_SIZE..].copy_from_slice(payload);
    packet
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ConnectionState;
    use crate::slice::{get_u16_le, get_u32_le, put_u16_le, put_u32_le, put_u64_le};
    use rand::rngs::mock::StepRng;

    fn eip_packet(command: u16, session_handle: u32, sender_context: u64, payload: &[u8]) -> Vec<u8> {
        let mut buf = vec![0u8; crate::eip::HEADER_SIZE + payload.len()];
        put_u16_le(&mut buf, 0, command);
        put_u16_le(&mut buf, 2, payload.len() as u16);
        put_u32_le(&mut buf, 4, session_handle);
        put_u64_le(&mut buf, 12, sender_context);
        buf[crate::eip::HEADER_SIZE..].copy_from_slice(payload);
        buf
    }

    #[test]
    fn test_register_session_roundtrip() {
        let mut session = Session::new();
        let mut rng = StepRng::new(42, 1);
        let request = eip_packet(0x0065, 0, 0, &[1, 0, 0, 0]);
        let reply = handle_request(&mut session, &[], &mut rng, &request).unwrap().unwrap();
        assert_eq!(get_u16_le(&reply, 0), 0x0065);
        assert_eq!(get_u32_le(&reply, 4), session.session_handle);
        assert_ne!(session.session_handle, 0);
    }

    #[test]
    fn test_unregister_session_produces_no_reply() {
        let mut session = Session::new();
        session.state = ConnectionState::Connected;
        session.session_handle = 0x1111_1111;
        let mut rng = StepRng::new(1, 1);
        let request = eip_packet(0x0066, session.session_handle, 0, &[]);
        let reply = handle_request(&mut session, &[], &mut rng, &request).unwrap();
        assert!(reply.is_none());
        assert!(session.done);
    }
}
