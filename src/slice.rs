// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

//! Bounds-checked byte-buffer views and little-endian field access.
//!
//! The original simulator threads a `{len, data}` pair with a
//! `data = NULL` sentinel for errors through every parser and
//! marshaller. Here that becomes a borrowed slice whose lifetime the
//! borrow checker ties to its backing buffer, with `Result` for the
//! fallible operations instead of a sentinel.

use crate::error::Error;
use byteorder::{ByteOrder, LittleEndian};

/// Truncate `buf` to `new_len`, or fail if it would grow the view.
pub fn truncate(buf: &[u8], new_len: usize) -> Result<&[u8], Error> {
    if new_len > buf.len() {
        return Err(Error::OutOfBounds);
    }
    Ok(&buf[..new_len])
}

/// The subslice of `buf` starting at `offset`, or fail if `offset` is
/// beyond the end.
pub fn remainder(buf: &[u8], offset: usize) -> Result<&[u8], Error> {
    if offset > buf.len() {
        return Err(Error::OutOfBounds);
    }
    Ok(&buf[offset..])
}

/// Read one byte at `index`, returning 0 if out of bounds.
///
/// Matches the simulator's "reads out of bounds return 0" convention;
/// callers on security-relevant paths must preflight bounds using the
/// packet's declared length field before relying on this.
#[inline]
pub fn at(buf: &[u8], index: usize) -> u8 {
    buf.get(index).copied().unwrap_or(0)
}

/// Write one byte at `index`. A no-op if out of bounds.
#[inline]
pub fn put_at(buf: &mut [u8], index: usize, val: u8) {
    if let Some(slot) = buf.get_mut(index) {
        *slot = val;
    }
}

/// Read a little-endian `u16` at `offset`, or 0 if `buf` is too small.
#[inline]
pub fn get_u16_le(buf: &[u8], offset: usize) -> u16 {
    match buf.get(offset..offset + 2) {
        Some(window) => LittleEndian::read_u16(window),
        None => 0,
    }
}

/// Read a little-endian `u32` at `offset`, or 0 if `buf` is too small.
#[inline]
pub fn get_u32_le(buf: &[u8], offset: usize) -> u32 {
    match buf.get(offset..offset + 4) {
        Some(window) => LittleEndian::read_u32(window),
        None => 0,
    }
}

/// Read a little-endian `u64` at `offset`, or 0 if `buf` is too small.
#[inline]
pub fn get_u64_le(buf: &[u8], offset: usize) -> u64 {
    match buf.get(offset..offset + 8) {
        Some(window) => LittleEndian::read_u64(window),
        None => 0,
    }
}

/// Write a little-endian `u16` at `offset`. A no-op if `buf` is too
/// small to hold it.
#[inline]
pub fn put_u16_le(buf: &mut [u8], offset: usize, val: u16) {
    if let Some(window) = buf.get_mut(offset..offset + 2) {
        LittleEndian::write_u16(window, val);
    }
}

/// Write a little-endian `u32` at `offset`. A no-op if `buf` is too
/// small to hold it.
#[inline]
pub fn put_u32_le(buf: &mut [u8], offset: usize, val: u32) {
    if let Some(window) = buf.get_mut(offset..offset + 4) {
        LittleEndian::write_u32(window, val);
    }
}

/// Write a little-endian `u64` at `offset`. A no-op if `buf` is too
/// small to hold it.
#[inline]
pub fn put_u64_le(buf: &mut [u8], offset: usize, val: u64) {
    if let Some(window) = buf.get_mut(offset..offset + 8) {
        LittleEndian::write_u64(window, val);
    }
}
