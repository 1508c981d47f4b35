// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

//! CIP service codes and the shared general-status values used in
//! every reply.

use crate::error::Error;
use std::convert::TryFrom;

pub const STATUS_OK: u8 = 0x00;
pub const STATUS_PATH_SEGMENT_ERROR: u8 = 0x04;
pub const STATUS_FRAGMENTED: u8 = 0x06;

/// The response bit OR'd onto a service code to mark it a reply.
pub const RESPONSE_BIT: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipService {
    ForwardOpen,
    ForwardOpenExtended,
    ForwardClose,
    ReadTag,
    ReadTagFragmented,
}

impl TryFrom<u8> for CipService {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        match value {
            0x54 => Ok(CipService::ForwardOpen),
            0x5B => Ok(CipService::ForwardOpenExtended),
            0x4E => Ok(CipService::ForwardClose),
            0x4C => Ok(CipService::ReadTag),
            0x52 => Ok(CipService::ReadTagFragmented),
            _ => Err(Error::Unsupported),
        }
    }
}

impl From<CipService> for u8 {
    fn from(service: CipService) -> u8 {
        match service {
            CipService::ForwardOpen => 0x54,
            CipService::ForwardOpenExtended => 0x5B,
            CipService::ForwardClose => 0x4E,
            CipService::ReadTag => 0x4C,
            CipService::ReadTagFragmented => 0x52,
        }
    }
}

impl CipService {
    /// Whether this service is legal inside an unconnected CPF
    /// envelope (only the Forward Open pair is).
    pub fn is_unconnected(self) -> bool {
        matches!(self, CipService::ForwardOpen | CipService::ForwardOpenExtended)
    }

    /// Whether this service is legal inside a connected CPF envelope.
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            CipService::ReadTag | CipService::ReadTagFragmented | CipService::ForwardClose
        )
    }

    pub fn response_code(self) -> u8 {
        u8::from(self) | RESPONSE_BIT
    }
}
