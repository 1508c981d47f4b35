// Copyright 2019 Petar Dambovaliev. All rights reserved.
// This software may be modified and distributed under the terms
// of the BSD license. See the LICENSE file for details.

//! The accept loop and per-connection request/response loop.

use crate::config::Config;
use crate::error::Error;
use crate::frame::read_eip_packet;
use crate::handlers::handle_request;
use crate::session::{Session, SCRATCH_BUFFER_SIZE};
use crate::tag::{build_tag_table, Tag};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Poll interval for checking the shutdown flag between non-blocking
/// accept attempts.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Binds the listener, installs the Ctrl-C handler, and runs the
/// accept loop until shutdown is requested.
pub fn run(config: Config) -> Result<(), Error> {
    let tags = build_tag_table(&config.tags)?;

    let listener = TcpListener::bind(("0.0.0.0", config.port)).map_err(|e| Error::Open(e.to_string()))?;
    listener.set_nonblocking(true)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let handler_flag = shutdown.clone();
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst)).expect("failed to install ctrl-c handler");

    info!(port = config.port, "listening");

    while !shutdown.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, addr)) => {
                stream.set_nonblocking(false)?;
                info!(%addr, "accepted connection");
                if let Err(e) = handle_connection(stream, &tags) {
                    warn!(error = %e, "connection terminated");
                } else {
                    info!(%addr, "connection closed");
                }
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(e) => return Err(Error::Io(e)),
        }
    }

    info!("shutdown requested, exiting");
    Ok(())
}

fn handle_connection(mut stream: TcpStream, tags: &[Tag]) -> Result<(), Error> {
    let mut session = Session::new();
    let mut rng = StdRng::from_entropy();
    let mut buf = vec![0u8; SCRATCH_BUFFER_SIZE];

    while !session.done {
        let n = read_eip_packet(&mut stream, &mut buf)?;
        match handle_request(&mut session, tags, &mut rng, &buf[..n]) {
            Ok(Some(reply)) => stream.write_all(&reply)?,
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "rejecting request");
                return Err(e);
            }
        }
    }

    Ok(())
}
