// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

//! The 24-byte EtherNet/IP encapsulation envelope.

use crate::error::Error;
use crate::session::Session;
use crate::slice::{get_u16_le, get_u32_le, get_u64_le, put_u16_le, put_u32_le, put_u64_le};
use std::convert::TryFrom;

pub const HEADER_SIZE: usize = 24;

/// Encapsulation commands this simulator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EipCommand {
    RegisterSession,
    UnregisterSession,
    UnconnectedData,
    ConnectedData,
}

impl TryFrom<u16> for EipCommand {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self, Error> {
        match value {
            0x0065 => Ok(EipCommand::RegisterSession),
            0x0066 => Ok(EipCommand::UnregisterSession),
            0x006F => Ok(EipCommand::UnconnectedData),
            0x0070 => Ok(EipCommand::ConnectedData),
            _ => Err(Error::Unsupported),
        }
    }
}

impl From<EipCommand> for u16 {
    fn from(cmd: EipCommand) -> u16 {
        match cmd {
            EipCommand::RegisterSession => 0x0065,
            EipCommand::UnregisterSession => 0x0066,
            EipCommand::UnconnectedData => 0x006F,
            EipCommand::ConnectedData => 0x0070,
        }
    }
}

/// The fixed-width envelope preceding every EIP payload.
#[derive(Debug, Clone, Copy)]
pub struct EipHeader {
    pub command: EipCommand,
    pub length: u16,
    pub session_handle: u32,
    pub status: i32,
    pub sender_context: u64,
    pub options: u32,
}

impl EipHeader {
    /// Parses the 24-byte header and checks that `length` matches the
    /// actual payload size, without applying any request-side
    /// session/state validation. Used both as the first stage of
    /// `decode` and to inspect marshalled replies (which don't obey
    /// the request-side "session handle must be zero" rules).
    pub fn decode_fields(buf: &[u8]) -> Result<(EipHeader, &[u8]), Error> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::TooSmall("eip header truncated"));
        }

        let command_raw = get_u16_le(buf, 0);
        let length = get_u16_le(buf, 2);
        let session_handle = get_u32_le(buf, 4);
        let status = get_u32_le(buf, 8) as i32;
        let sender_context = get_u64_le(buf, 12);
        let options = get_u32_le(buf, 20);

        let payload = &buf[HEADER_SIZE..];
        if payload.len() != length as usize {
            return Err(Error::BadParam("eip length disagrees with payload size"));
        }

        let command = EipCommand::try_from(command_raw)?;

        Ok((
            EipHeader {
                command,
                length,
                session_handle,
                status,
                sender_context,
                options,
            },
            payload,
        ))
    }

    /// Decodes and validates an incoming request header, returning it
    /// along with the payload sub-slice that follows it.
    ///
    /// Validation order follows the reference dispatcher: length
    /// first, then session handle, then status, then sender context,
    /// then options.
    pub fn decode<'a>(buf: &'a [u8], session: &Session) -> Result<(EipHeader, &'a [u8]), Error> {
        let (header, payload) = Self::decode_fields(buf)?;

        match header.command {
            EipCommand::RegisterSession => {
                if header.session_handle != 0 {
                    return Err(Error::BadParam("register session handle must be zero"));
                }
                if header.sender_context != 0 {
                    return Err(Error::BadParam("register session context must be zero"));
                }
            }
            EipCommand::ConnectedData => {
                if header.session_handle != session.session_handle {
                    return Err(Error::BadParam("session handle mismatch"));
                }
                if header.sender_context != 0 {
                    return Err(Error::BadParam("connected data context must be zero"));
                }
            }
            EipCommand::UnconnectedData | EipCommand::UnregisterSession => {
                if header.session_handle != session.session_handle {
                    return Err(Error::BadParam("session handle mismatch"));
                }
            }
        }

        if header.status != 0 {
            return Err(Error::BadParam("eip status must be zero"));
        }
        if header.options != 0 {
            return Err(Error::BadParam("eip options must be zero"));
        }

        Ok((header, payload))
    }

    /// Marshals the 24-byte header into `buf[0..24]`, returning the
    /// number of bytes written.
    pub fn encode(buf: &mut [u8], command: EipCommand, length: u16, session_handle: u32, sender_context: u64) -> Result<usize, Error> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::OutOfBounds);
        }
        put_u16_le(buf, 0, command.into());
        put_u16_le(buf, 2, length);
        put_u32_le(buf, 4, session_handle);
        put_u32_le(buf, 8, 0);
        put_u64_le(buf, 12, sender_context);
        put_u32_le(buf, 20, 0);
        Ok(HEADER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_session_packet(session_handle: u32, sender_context: u64) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_SIZE + 4];
        put_u16_le(&mut buf, 0, 0x0065);
        put_u16_le(&mut buf, 2, 4);
        put_u32_le(&mut buf, 4, session_handle);
        put_u64_le(&mut buf, 12, sender_context);
        put_u16_le(&mut buf, HEADER_SIZE, 1);
        buf
    }

    #[test]
    fn test_decode_register_session() {
        let buf = register_session_packet(0, 0);
        let session = Session::new();
        let (header, payload) = EipHeader::decode(&buf, &session).unwrap();
        assert_eq!(header.command, EipCommand::RegisterSession);
        assert_eq!(header.length, 4);
        assert_eq!(payload.len(), 4);
    }

    #[test]
    fn test_register_session_with_nonzero_handle_is_rejected() {
        let buf = register_session_packet(7, 0);
        let session = Session::new();
        let err = EipHeader::decode(&buf, &session).unwrap_err();
        assert!(matches!(err, Error::BadParam(_)));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut buf = register_session_packet(0, 0);
        put_u16_le(&mut buf, 2, 99);
        let session = Session::new();
        let err = EipHeader::decode(&buf, &session).unwrap_err();
        assert!(matches!(err, Error::BadParam(_)));
    }

    #[test]
    fn test_unknown_command_is_unsupported() {
        let mut buf = register_session_packet(0, 0);
        put_u16_le(&mut buf, 0, 0xDEAD);
        let session = Session::new();
        let err = EipHeader::decode(&buf, &session).unwrap_err();
        assert!(matches!(err, Error::Unsupported));
    }

    #[test]
    fn test_roundtrip_encode_decode_session_handle() {
        let mut buf = [0u8; HEADER_SIZE];
        EipHeader::encode(&mut buf, EipCommand::RegisterSession, 4, 0xABCDEF01, 0x1122_3344_5566_7788).unwrap();
        assert_eq!(get_u32_le(&buf, 4), 0xABCDEF01);
        assert_eq!(get_u64_le(&buf, 12), 0x1122_3344_5566_7788);
    }
}
