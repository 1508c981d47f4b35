// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

//! Forward Open (classic and extended): opens the connected session
//! used for subsequent Read Tag traffic.

use crate::cip::CipService;
use crate::error::Error;
use crate::session::{ConnectionState, Session};
use crate::slice::{get_u16_le, get_u32_le, put_u16_le, put_u32_le};
use rand::RngCore;

const CM_PATH: [u8; 4] = [0x20, 0x06, 0x24, 0x01];
const MESSAGE_ROUTER_PATH: [u8; 6] = [0x01, 0x06, 0x20, 0x02, 0x24, 0x01];

const SECS_PER_TICK: u8 = 0x0A;
const TIMEOUT_TICKS: u8 = 0x05;
const CONN_SERIAL_NUMBER: u16 = 0x3420;
const ORIG_VENDOR_ID: u16 = 0xF33D;
const ORIG_SERIAL_NUMBER: u32 = 0x2150_4345;
const RPI: u32 = 0x000F_4240;
const CONN_PARAMS_CLASSIC: u16 = 0x43F8;
const CONN_PARAMS_EXTENDED: u32 = 0x4200_0FA2;
const TRANSPORT_CLASS: u8 = 0xA3;

/// Handles a Forward Open or Forward Open Extended request, storing
/// the negotiated connection ids on success.
pub fn handle(session: &mut Session, service: CipService, cip_payload: &[u8], rng: &mut dyn RngCore) -> Result<Vec<u8>, Error> {
    if session.state != ConnectionState::Registered {
        return Err(Error::BadParam("forward open received outside registered state"));
    }

    let extended = match service {
        CipService::ForwardOpen => false,
        CipService::ForwardOpenExtended => true,
        _ => return Err(Error::Unsupported),
    };
    let params_width = if extended { 4 } else { 2 };

    if cip_payload.get(1) != Some(&2) {
        return Err(Error::BadParam("cm path size must be two words"));
    }
    if cip_payload.get(2..6) != Some(&CM_PATH[..]) {
        return Err(Error::BadParam("cm path mismatch"));
    }
    if cip_payload.get(6) != Some(&SECS_PER_TICK) {
        return Err(Error::BadParam("secs per tick mismatch"));
    }
    if cip_payload.get(7) != Some(&TIMEOUT_TICKS) {
        return Err(Error::BadParam("timeout ticks mismatch"));
    }

    let orig_to_targ_conn_id = get_u32_le(cip_payload, 8);
    if orig_to_targ_conn_id != 0 {
        return Err(Error::BadParam("orig_to_targ_conn_id must be zero"));
    }

    let targ_to_orig_conn_id = get_u32_le(cip_payload, 12);
    if targ_to_orig_conn_id == 0 {
        return Err(Error::BadParam("targ_to_orig_conn_id must be nonzero"));
    }

    if get_u16_le(cip_payload, 16) != CONN_SERIAL_NUMBER {
        return Err(Error::BadParam("connection serial number mismatch"));
    }
    if get_u16_le(cip_payload, 18) != ORIG_VENDOR_ID {
        return Err(Error::BadParam("originator vendor id mismatch"));
    }
    if get_u32_le(cip_payload, 20) != ORIG_SERIAL_NUMBER {
        return Err(Error::BadParam("originator serial number mismatch"));
    }
    if cip_payload.get(24) != Some(&1) {
        return Err(Error::BadParam("connection timeout multiplier must be one"));
    }
    if cip_payload.get(25..28) != Some(&[0, 0, 0][..]) {
        return Err(Error::BadParam("reserved bytes must be zero"));
    }

    let orig_to_targ_rpi = get_u32_le(cip_payload, 28);
    if orig_to_targ_rpi != RPI {
        return Err(Error::BadParam("orig_to_targ_rpi mismatch"));
    }

    let conn_params_offset = 32;
    if !conn_params_match(cip_payload, conn_params_offset, params_width) {
        return Err(Error::BadParam("orig_to_targ_conn_params mismatch"));
    }

    let targ_to_orig_rpi_offset = conn_params_offset + params_width;
    let targ_to_orig_rpi = get_u32_le(cip_payload, targ_to_orig_rpi_offset);
    if targ_to_orig_rpi != RPI {
        return Err(Error::BadParam("targ_to_orig_rpi mismatch"));
    }

    let targ_params_offset = targ_to_orig_rpi_offset + 4;
    if !conn_params_match(cip_payload, targ_params_offset, params_width) {
        return Err(Error::BadParam("targ_to_orig_conn_params mismatch"));
    }

    let transport_class_offset = targ_params_offset + params_width;
    if cip_payload.get(transport_class_offset) != Some(&TRANSPORT_CLASS) {
        return Err(Error::BadParam("transport class mismatch"));
    }

    let path_size_offset = transport_class_offset + 1;
    if cip_payload.get(path_size_offset) != Some(&3) {
        return Err(Error::BadParam("message router path size must be three words"));
    }

    let path_offset = path_size_offset + 1;
    if cip_payload.get(path_offset..path_offset + 6) != Some(&MESSAGE_ROUTER_PATH[..]) {
        return Err(Error::BadParam("message router path mismatch"));
    }

    let mut server_connection_id = rng.next_u32();
    while server_connection_id == 0 {
        server_connection_id = rng.next_u32();
    }

    session.client_connection_id = targ_to_orig_conn_id;
    session.server_connection_id = server_connection_id;
    session.state = ConnectionState::Connected;

    let mut reply = vec![0u8; 30];
    reply[0] = service.response_code();
    reply[1] = 0;
    reply[2] = 0;
    reply[3] = 0;
    put_u32_le(&mut reply, 4, session.client_connection_id);
    put_u32_le(&mut reply, 8, session.server_connection_id);
    put_u16_le(&mut reply, 12, CONN_SERIAL_NUMBER);
    put_u16_le(&mut reply, 14, ORIG_VENDOR_ID);
    put_u32_le(&mut reply, 16, ORIG_SERIAL_NUMBER);
    put_u32_le(&mut reply, 20, orig_to_targ_rpi);
    put_u32_le(&mut reply, 24, targ_to_orig_rpi);
    reply[28] = 0;
    reply[29] = 0;

    Ok(reply)
}

fn conn_params_match(buf: &[u8], offset: usize, width: usize) -> bool {
    if width == 2 {
        get_u16_le(buf, offset) == CONN_PARAMS_CLASSIC
    } else {
        get_u32_le(buf, offset) == CONN_PARAMS_EXTENDED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    fn classic_request(client_conn_id: u32) -> Vec<u8> {
        let mut buf = vec![0u8; 48];
        buf[0] = 0x54;
        buf[1] = 2;
        buf[2..6].copy_from_slice(&CM_PATH);
        buf[6] = SECS_PER_TICK;
        buf[7] = TIMEOUT_TICKS;
        put_u32_le(&mut buf, 8, 0);
        put_u32_le(&mut buf, 12, client_conn_id);
        put_u16_le(&mut buf, 16, CONN_SERIAL_NUMBER);
        put_u16_le(&mut buf, 18, ORIG_VENDOR_ID);
        put_u32_le(&mut buf, 20, ORIG_SERIAL_NUMBER);
        buf[24] = 1;
        put_u32_le(&mut buf, 28, RPI);
        put_u16_le(&mut buf, 32, CONN_PARAMS_CLASSIC);
        put_u32_le(&mut buf, 34, RPI);
        put_u16_le(&mut buf, 38, CONN_PARAMS_CLASSIC);
        buf[40] = TRANSPORT_CLASS;
        buf[41] = 3;
        buf[42..48].copy_from_slice(&MESSAGE_ROUTER_PATH);
        buf
    }

    fn extended_request(client_conn_id: u32) -> Vec<u8> {
        let mut buf = vec![0u8; 52];
        buf[0] = 0x5B;
        buf[1] = 2;
        buf[2..6].copy_from_slice(&CM_PATH);
        buf[6] = SECS_PER_TICK;
        buf[7] = TIMEOUT_TICKS;
        put_u32_le(&mut buf, 8, 0);
        put_u32_le(&mut buf, 12, client_conn_id);
        put_u16_le(&mut buf, 16, CONN_SERIAL_NUMBER);
        put_u16_le(&mut buf, 18, ORIG_VENDOR_ID);
        put_u32_le(&mut buf, 20, ORIG_SERIAL_NUMBER);
        buf[24] = 1;
        put_u32_le(&mut buf, 28, RPI);
        put_u32_le(&mut buf, 32, CONN_PARAMS_EXTENDED);
        put_u32_le(&mut buf, 36, RPI);
        put_u32_le(&mut buf, 40, CONN_PARAMS_EXTENDED);
        buf[44] = TRANSPORT_CLASS;
        buf[45] = 3;
        buf[46..52].copy_from_slice(&MESSAGE_ROUTER_PATH);
        buf
    }

    #[test]
    fn test_classic_forward_open_succeeds() {
        let mut session = Session::new();
        session.state = ConnectionState::Registered;
        let req = classic_request(0xAABB_CCDD);
        let mut rng = StepRng::new(7, 1);
        let reply = handle(&mut session, CipService::ForwardOpen, &req, &mut rng).unwrap();
        assert_eq!(reply[0], 0xD4);
        assert_eq!(session.client_connection_id, 0xAABB_CCDD);
        assert_eq!(session.state, ConnectionState::Connected);
        assert_eq!(get_u32_le(&reply, 4), 0xAABB_CCDD);
        assert_eq!(get_u32_le(&reply, 8), session.server_connection_id);
    }

    #[test]
    fn test_extended_forward_open_succeeds() {
        let mut session = Session::new();
        session.state = ConnectionState::Registered;
        let req = extended_request(0x1234_5678);
        let mut rng = StepRng::new(7, 1);
        let reply = handle(&mut session, CipService::ForwardOpenExtended, &req, &mut rng).unwrap();
        assert_eq!(reply[0], 0xDB);
        assert_eq!(session.client_connection_id, 0x1234_5678);
    }

    #[test]
    fn test_extended_service_with_classic_params_is_rejected() {
        let mut session = Session::new();
        session.state = ConnectionState::Registered;
        let req = classic_request(0x1111_1111);
        let mut rng = StepRng::new(7, 1);
        let err = handle(&mut session, CipService::ForwardOpenExtended, &req, &mut rng).unwrap_err();
        assert!(matches!(err, Error::BadParam(_)));
    }

    #[test]
    fn test_wrong_router_path_is_rejected() {
        let mut session = Session::new();
        session.state = ConnectionState::Registered;
        let mut req = classic_request(0x1111_1111);
        req[42] = 0xFF;
        let mut rng = StepRng::new(7, 1);
        assert!(handle(&mut session, CipService::ForwardOpen, &req, &mut rng).is_err());
    }
}
