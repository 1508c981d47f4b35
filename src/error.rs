// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

//! Crate-wide error taxonomy for the EtherNet/IP + CIP simulator.

use std::io;

/// Error codes propagated through decode, validate, and handler paths.
///
/// Each variant maps to one of the simulator's own error classes
/// rather than a generic parse failure, since the class determines
/// how the connection loop reacts (terminate vs. reject one field).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed byte stream; a declared length disagrees with what
    /// was actually on the wire.
    #[error("malformed packet: {0}")]
    BadData(&'static str),

    /// A declared length is smaller than what the message actually
    /// requires.
    #[error("packet too small: {0}")]
    TooSmall(&'static str),

    /// A declared length is larger than what the message actually
    /// contains.
    #[error("packet too large: {0}")]
    TooLarge(&'static str),

    /// A magic value, handshake field, or session/connection id had
    /// the wrong value for the current request.
    #[error("bad parameter: {0}")]
    BadParam(&'static str),

    /// A command or service code this simulator does not implement.
    #[error("unsupported command or service")]
    Unsupported,

    /// A buffer access went beyond its bounds.
    #[error("buffer access out of bounds")]
    OutOfBounds,

    /// Transport-level I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// Failed to create the listening socket.
    #[error("socket create error: {0}")]
    Create(String),

    /// Failed to bind or listen on the socket.
    #[error("socket open error: {0}")]
    Open(String),

    /// A command-line tag definition did not match the expected
    /// grammar (`name:TYPE[dim1][dim2][dim3]`).
    #[error("invalid tag definition {input:?}: {reason}")]
    InvalidTagDef { input: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
