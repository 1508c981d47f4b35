// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

//! Command-line configuration for the `plc-sim` binary.

use clap::Parser;

/// Default EtherNet/IP explicit-messaging port.
pub const DEFAULT_PORT: u16 = 44818;

#[derive(Parser, Debug)]
#[command(author, version, about = "Deterministic EtherNet/IP + CIP PLC simulator")]
pub struct Config {
    /// TCP port to listen on.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Tag definitions of the form `name:TYPE[dim1][dim2][dim3]`.
    #[arg(value_name = "TAG")]
    pub tags: Vec<String>,
}
