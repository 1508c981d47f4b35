// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

//! Read Tag and Read Tag Fragmented: resolves a symbolic IOI path to
//! a stored tag and marshals its elements.

use crate::cip::{CipService, STATUS_FRAGMENTED, STATUS_OK, STATUS_PATH_SEGMENT_ERROR};
use crate::error::Error;
use crate::session::{ConnectionState, Session};
use crate::slice::{get_u16_le, get_u32_le};
use crate::tag::{find_tag, Tag};

const SYMBOLIC_SEGMENT: u8 = 0x91;
const NUMERIC_SEGMENT_8: u8 = 0x28;
const NUMERIC_SEGMENT_16: u8 = 0x29;
const NUMERIC_SEGMENT_32: u8 = 0x2A;

/// Header byte count ahead of the type code in a successful reply:
/// service, reserved, status, size.
const REPLY_PREFIX_LEN: usize = 4;

/// Byte count of the fixed reply header counted against the
/// fragmentation budget: service, reserved, status, size, type code.
/// The produced reply never exceeds `max_response_size`, and equals it
/// exactly whenever `max_response_size - FRAGMENT_HEADER_LEN` is a
/// multiple of the element size.
const FRAGMENT_HEADER_LEN: usize = REPLY_PREFIX_LEN + 2;

struct IoiPath {
    name: String,
    indices: Vec<u32>,
}

fn parse_ioi_path(path: &[u8]) -> Result<IoiPath, Error> {
    let mut offset = 0;
    let mut name = None;
    let mut indices = Vec::new();

    while offset < path.len() {
        let segment_type = path[offset];
        match segment_type {
            SYMBOLIC_SEGMENT => {
                let name_length = *path
                    .get(offset + 1)
                    .ok_or(Error::TooSmall("truncated symbolic segment"))? as usize;
                let name_start = offset + 2;
                let name_end = name_start + name_length;
                let name_bytes = path
                    .get(name_start..name_end)
                    .ok_or(Error::TooSmall("truncated symbolic segment name"))?;
                name = Some(
                    String::from_utf8(name_bytes.to_vec())
                        .map_err(|_| Error::BadData("tag name is not valid utf-8"))?,
                );
                let segment_len = 2 + name_length;
                offset += segment_len + (segment_len % 2);
            }
            NUMERIC_SEGMENT_8 => {
                let val = *path.get(offset + 1).ok_or(Error::TooSmall("truncated numeric segment"))?;
                indices.push(val as u32);
                offset += 2;
            }
            NUMERIC_SEGMENT_16 => {
                let val = get_u16_le(path, offset + 2);
                indices.push(val as u32);
                offset += 4;
            }
            NUMERIC_SEGMENT_32 => {
                let val = get_u32_le(path, offset + 2);
                indices.push(val);
                offset += 6;
            }
            _ => return Err(Error::BadData("unrecognized ioi path segment")),
        }
    }

    let name = name.ok_or(Error::BadData("ioi path missing symbolic segment"))?;
    Ok(IoiPath { name, indices })
}

fn flatten_index(dimensions: &[u32; 3], indices: &[u32]) -> usize {
    let mut start = 0usize;
    for (i, &idx) in indices.iter().enumerate() {
        let mut stride = 1usize;
        for &d in dimensions.iter().skip(i + 1) {
            if d != 0 {
                stride *= d as usize;
            }
        }
        start += idx as usize * stride;
    }
    start
}

fn not_found_reply(service: CipService) -> Vec<u8> {
    vec![service.response_code(), 0, STATUS_PATH_SEGMENT_ERROR, 0]
}

fn success_reply(service: CipService, tag: &Tag, start_index: usize, requested: usize, max_response_size: usize) -> Vec<u8> {
    let element_size = tag.element_type.element_size();
    let room = max_response_size.saturating_sub(FRAGMENT_HEADER_LEN);
    let max_elements = if element_size == 0 { requested } else { room / element_size };
    let (status, count) = if requested > max_elements {
        (STATUS_FRAGMENTED, max_elements)
    } else {
        (STATUS_OK, requested)
    };

    let mut reply = Vec::with_capacity(REPLY_PREFIX_LEN + 2 + count * element_size);
    reply.push(service.response_code());
    reply.push(0);
    reply.push(status);
    reply.push(0);
    reply.extend_from_slice(&tag.element_type.cip_type_code().to_le_bytes());
    tag.encode_elements(start_index, count, &mut reply);
    reply
}

/// Handles a Read Tag (`0x4C`) or Read Tag Fragmented (`0x52`) request
/// against the process-wide tag table.
pub fn handle(session: &mut Session, service: CipService, cip_payload: &[u8], tags: &[Tag]) -> Result<Vec<u8>, Error> {
    if session.state != ConnectionState::Connected {
        return Err(Error::BadParam("read tag received outside connected state"));
    }

    let fragmented = service == CipService::ReadTagFragmented;

    // cip_payload[0] is the service code; the IOI path size follows it.
    let ioi_path_size = *cip_payload.get(1).ok_or(Error::TooSmall("read tag payload empty"))? as usize;
    let path_len = ioi_path_size * 2;
    let path = cip_payload
        .get(2..2 + path_len)
        .ok_or(Error::TooSmall("ioi path truncated"))?;
    let after_path = 2 + path_len;

    let element_count = get_u16_le(cip_payload, after_path) as usize;
    let offset = after_path + 2;

    let byte_offset = if fragmented {
        Some(get_u32_le(cip_payload, offset) as usize)
    } else {
        None
    };

    let ioi = parse_ioi_path(path)?;

    let tag = match find_tag(tags, &ioi.name) {
        Some(tag) => tag,
        None => return Ok(not_found_reply(service)),
    };

    let element_size = tag.element_type.element_size();
    let start_index = match byte_offset {
        Some(b) if element_size != 0 => b / element_size,
        Some(_) => 0,
        None => flatten_index(&tag.dimensions, &ioi.indices),
    };

    Ok(success_reply(service, tag, start_index, element_count, session.max_response_size))
}
