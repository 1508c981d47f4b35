// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

//! Common Packet Format: the unconnected and connected item layers
//! carried inside an EIP payload.

use crate::error::Error;
use crate::slice::{get_u16_le, get_u32_le, put_u16_le, put_u32_le};

pub const NAI_ITEM_TYPE: u16 = 0x0000;
pub const UDI_ITEM_TYPE: u16 = 0x00B2;
pub const CAI_ITEM_TYPE: u16 = 0x00A1;
pub const CDI_ITEM_TYPE: u16 = 0x00B1;

pub const UNCONNECTED_HEADER_SIZE: usize = 16;
pub const CONNECTED_HEADER_SIZE: usize = 20;

/// Decoded unconnected CPF envelope: Null Address Item + Unconnected
/// Data Item.
pub struct UnconnectedCpfRequest<'a> {
    pub cip_payload: &'a [u8],
}

impl<'a> UnconnectedCpfRequest<'a> {
    /// Decodes and validates the 16-byte unconnected header, returning
    /// the embedded CIP payload.
    pub fn decode(buf: &'a [u8]) -> Result<Self, Error> {
        if buf.len() < UNCONNECTED_HEADER_SIZE {
            return Err(Error::TooSmall("unconnected cpf header truncated"));
        }

        let interface_handle = get_u32_le(buf, 0);
        let router_timeout = get_u16_le(buf, 4);
        let item_count = get_u16_le(buf, 6);
        let nai_item_type = get_u16_le(buf, 8);
        let nai_item_length = get_u16_le(buf, 10);
        let udi_item_type = get_u16_le(buf, 12);
        let udi_item_length = get_u16_le(buf, 14);

        if interface_handle != 0 {
            return Err(Error::BadParam("interface handle must be zero"));
        }
        if router_timeout != 1 {
            return Err(Error::BadParam("router timeout must be one"));
        }
        if item_count != 2 {
            return Err(Error::BadParam("cpf item count must be two"));
        }
        if nai_item_type != NAI_ITEM_TYPE || nai_item_length != 0 {
            return Err(Error::BadParam("null address item malformed"));
        }
        if udi_item_type != UDI_ITEM_TYPE {
            return Err(Error::BadParam("unconnected data item type mismatch"));
        }

        let cip_payload = &buf[UNCONNECTED_HEADER_SIZE..];
        if udi_item_length as usize != cip_payload.len() {
            return Err(Error::BadParam("unconnected data item length mismatch"));
        }

        Ok(UnconnectedCpfRequest { cip_payload })
    }

    /// Marshals the unconnected CPF header around `cip_reply` into
    /// `buf`, returning the total bytes written.
    pub fn encode(buf: &mut [u8], cip_reply: &[u8]) -> Result<usize, Error> {
        let total = UNCONNECTED_HEADER_SIZE + cip_reply.len();
        if buf.len() < total {
            return Err(Error::OutOfBounds);
        }
        put_u32_le(buf, 0, 0);
        put_u16_le(buf, 4, 1);
        put_u16_le(buf, 6, 2);
        put_u16_le(buf, 8, NAI_ITEM_TYPE);
        put_u16_le(buf, 10, 0);
        put_u16_le(buf, 12, UDI_ITEM_TYPE);
        put_u16_le(buf, 14, cip_reply.len() as u16);
        buf[UNCONNECTED_HEADER_SIZE..total].copy_from_slice(cip_reply);
        Ok(total)
    }
}

/// Decoded connected CPF envelope: Connected Address Item + Connected
/// Data Item. The 2-byte connection sequence sits inside the data
/// item's declared length but is stripped out of `cip_payload`.
pub struct ConnectedCpfRequest<'a> {
    pub connection_id: u32,
    pub connection_seq: u16,
    pub cip_payload: &'a [u8],
}

impl<'a> ConnectedCpfRequest<'a> {
    pub fn decode(buf: &'a [u8], expected_connection_id: u32) -> Result<Self, Error> {
        if buf.len() < CONNECTED_HEADER_SIZE {
            return Err(Error::TooSmall("connected cpf header truncated"));
        }

        let interface_handle = get_u32_le(buf, 0);
        let router_timeout = get_u16_le(buf, 4);
        let item_count = get_u16_le(buf, 6);
        let cai_item_type = get_u16_le(buf, 8);
        let cai_item_length = get_u16_le(buf, 10);
        let connection_id = get_u32_le(buf, 12);
        let cdi_item_type = get_u16_le(buf, 16);
        let cdi_item_length = get_u16_le(buf, 18);

        if interface_handle != 0 {
            return Err(Error::BadParam("interface handle must be zero"));
        }
        if router_timeout != 1 {
            return Err(Error::BadParam("router timeout must be one"));
        }
        if item_count != 2 {
            return Err(Error::BadParam("cpf item count must be two"));
        }
        if cai_item_type != CAI_ITEM_TYPE || cai_item_length != 4 {
            return Err(Error::BadParam("connected address item malformed"));
        }
        if cdi_item_type != CDI_ITEM_TYPE {
            return Err(Error::BadParam("connected data item type mismatch"));
        }
        if connection_id != expected_connection_id {
            return Err(Error::BadParam("stale connection id"));
        }

        let rest = &buf[CONNECTED_HEADER_SIZE..];
        if cdi_item_length as usize != rest.len() {
            return Err(Error::BadParam("connected data item length mismatch"));
        }
        if rest.len() < 2 {
            return Err(Error::TooSmall("connected data item missing sequence"));
        }

        let connection_seq = get_u16_le(rest, 0);
        let cip_payload = &rest[2..];

        Ok(ConnectedCpfRequest {
            connection_id,
            connection_seq,
            cip_payload,
        })
    }

    /// Marshals the connected CPF header (echoing `connection_id` and
    /// `connection_seq`) around `cip_reply` into `buf`.
    pub fn encode(buf: &mut [u8], connection_id: u32, connection_seq: u16, cip_reply: &[u8]) -> Result<usize, Error> {
        let total = CONNECTED_HEADER_SIZE + 2 + cip_reply.len();
        if buf.len() < total {
            return Err(Error::OutOfBounds);
        }
        put_u32_le(buf, 0, 0);
        put_u16_le(buf, 4, 1);
        put_u16_le(buf, 6, 2);
        put_u16_le(buf, 8, CAI_ITEM_TYPE);
        put_u16_le(buf, 10, 4);
        put_u32_le(buf, 12, connection_id);
        put_u16_le(buf, 16, CDI_ITEM_TYPE);
        put_u16_le(buf, 18, (cip_reply.len() + 2) as u16);
        put_u16_le(buf, CONNECTED_HEADER_SIZE, connection_seq);
        buf[CONNECTED_HEADER_SIZE + 2..total].copy_from_slice(cip_reply);
        Ok(total)
    }
}
