// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

//! The process-wide tag table and the command-line grammar that
//! builds it.

use crate::error::Error;

/// CIP element type of a tag, with the numeric type code used on the
/// wire in Read Tag responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Dint,
    Int,
    Real,
    Bool,
    BoolArray,
}

impl ElementType {
    pub fn cip_type_code(self) -> u16 {
        match self {
            ElementType::Dint => 0x00C4,
            ElementType::Int => 0x00C3,
            ElementType::Real => 0x00CA,
            ElementType::Bool => 0x00C1,
            ElementType::BoolArray => 0x00D3,
        }
    }

    /// Size in bytes of one stored element on the wire. `BoolArray`
    /// elements are packed 64-bit words, not individual bits.
    pub fn element_size(self) -> usize {
        match self {
            ElementType::Dint => 4,
            ElementType::Int => 2,
            ElementType::Real => 4,
            ElementType::Bool => 1,
            ElementType::BoolArray => 8,
        }
    }
}

/// Storage for one tag's values, laid out unpacked in memory and
/// packed onto the wire only at marshal time.
pub enum TagStorage {
    Dint(Vec<i32>),
    Int(Vec<i16>),
    Real(Vec<f32>),
    Bool(Vec<bool>),
    BoolArray(Vec<u64>),
}

pub struct Tag {
    pub name: String,
    pub element_type: ElementType,
    pub dimensions: [u32; 3],
    pub storage: TagStorage,
}

impl Tag {
    /// Total addressable element count (product of nonzero
    /// dimensions, or 1 for a scalar).
    pub fn element_count(&self) -> usize {
        self.dimensions
            .iter()
            .filter(|&&d| d != 0)
            .map(|&d| d as usize)
            .product::<usize>()
            .max(1)
    }

    fn zeroed(element_type: ElementType, count: usize) -> TagStorage {
        match element_type {
            ElementType::Dint => TagStorage::Dint(vec![0; count]),
            ElementType::Int => TagStorage::Int(vec![0; count]),
            ElementType::Real => TagStorage::Real(vec![0.0; count]),
            ElementType::Bool => TagStorage::Bool(vec![false; count]),
            ElementType::BoolArray => TagStorage::BoolArray(vec![0; count]),
        }
    }

    /// Encodes `count` consecutive elements starting at `start_index`
    /// into `out`, little-endian, appending to whatever `out` already
    /// holds.
    pub fn encode_elements(&self, start_index: usize, count: usize, out: &mut Vec<u8>) {
        match &self.storage {
            TagStorage::Dint(v) => {
                for i in 0..count {
                    let val = v.get(start_index + i).copied().unwrap_or(0);
                    out.extend_from_slice(&val.to_le_bytes());
                }
            }
            TagStorage::Int(v) => {
                for i in 0..count {
                    let val = v.get(start_index + i).copied().unwrap_or(0);
                    out.extend_from_slice(&val.to_le_bytes());
                }
            }
            TagStorage::Real(v) => {
                for i in 0..count {
                    let val = v.get(start_index + i).copied().unwrap_or(0.0);
                    out.extend_from_slice(&val.to_le_bytes());
                }
            }
            TagStorage::Bool(v) => {
                for i in 0..count {
                    let val = v.get(start_index + i).copied().unwrap_or(false);
                    out.push(if val { 0xFF } else { 0x00 });
                }
            }
            TagStorage::BoolArray(v) => {
                for i in 0..count {
                    let val = v.get(start_index + i).copied().unwrap_or(0);
                    out.extend_from_slice(&val.to_le_bytes());
                }
            }
        }
    }
}

/// Parses one `name:TYPE[dim1][dim2][dim3]` command-line argument.
///
/// `name` must be 1-40 ASCII bytes; `TYPE` is case-sensitive and one
/// of the five element types; zero to three bracketed, positive
/// decimal dimensions may follow.
pub fn parse_tag_def(input: &str) -> Result<Tag, Error> {
    let invalid = |reason: &str| Error::InvalidTagDef {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let (name, rest) = input
        .split_once(':')
        .ok_or_else(|| invalid("missing ':' separating name from type"))?;

    if name.is_empty() || name.len() > 40 {
        return Err(invalid("name must be 1-40 bytes"));
    }
    if !name.is_ascii() {
        return Err(invalid("name must be ASCII"));
    }

    let bracket_start = rest.find('[');
    let (type_str, dims_str) = match bracket_start {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    };

    let element_type = match type_str {
        "DINT" => ElementType::Dint,
        "INT" => ElementType::Int,
        "REAL" => ElementType::Real,
        "BOOL" => ElementType::Bool,
        "BOOL_ARRAY" => ElementType::BoolArray,
        other => return Err(invalid(&format!("unknown type {other:?}"))),
    };

    let mut dimensions = [0u32; 3];
    let mut remaining = dims_str;
    let mut n_dims = 0;
    while !remaining.is_empty() {
        if n_dims >= 3 {
            return Err(invalid("at most 3 dimensions"));
        }
        let close = remaining
            .find(']')
            .ok_or_else(|| invalid("unterminated '['"))?;
        if !remaining.starts_with('[') {
            return Err(invalid("expected '[' to start a dimension"));
        }
        let digits = &remaining[1..close];
        let value: u32 = digits
            .parse()
            .map_err(|_| invalid("dimension must be a positive decimal integer"))?;
        if value == 0 {
            return Err(invalid("dimension must be positive"));
        }
        dimensions[n_dims] = value;
        n_dims += 1;
        remaining = &remaining[close + 1..];
    }

    let count = dimensions
        .iter()
        .filter(|&&d| d != 0)
        .map(|&d| d as usize)
        .product::<usize>()
        .max(1);

    Ok(Tag {
        name: name.to_string(),
        element_type,
        dimensions,
        storage: Tag::zeroed(element_type, count),
    })
}

/// Builds the process-wide tag table from a set of command-line
/// definitions.
pub fn build_tag_table(defs: &[String]) -> Result<Vec<Tag>, Error> {
    defs.iter().map(|d| parse_tag_def(d)).collect()
}

pub fn find_tag<'a>(tags: &'a [Tag], name: &str) -> Option<&'a Tag> {
    tags.iter().find(|t| t.name == name)
}
