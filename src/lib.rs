// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

//! A deterministic EtherNet/IP + CIP simulator for an Allen-Bradley
//! ControlLogix-family PLC.
//!
//! # Examples
//! ```no_run
//! use plc_sim::config::Config;
//! use plc_sim::server;
//! use clap::Parser;
//!
//! # fn main() {
//!     let config = Config::parse();
//!     if let Err(e) = server::run(config) {
//!         eprintln!("{e}");
//!         std::process::exit(1);
//!     }
//! # }
//! ```

pub mod cip;
pub mod config;
pub mod cpf;
pub mod eip;
pub mod error;
pub mod frame;
pub mod handlers;
pub mod server;
pub mod session;
pub mod slice;
pub mod tag;
