//! Per-connection request loop.
//!
//! One session is one OS thread: read a line, hand it to the worker pool,
//! write back whatever the pool produced, repeat. Sessions never share
//! state with each other directly — only through the registry and its
//! tables — so there is nothing here to lock. A worker panic terminates
//! just this session; other sessions are unaffected.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::executor;
use crate::registry::TableRegistry;
use crate::worker_pool::ThreadPool;

pub fn handle(stream: TcpStream, registry: Arc<TableRegistry>, pool: Arc<ThreadPool>) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let mut writer = match stream.try_clone() {
        Ok(w) => w,
        Err(e) => {
            tracing::warn!(%peer, error = %e, "failed to clone session socket");
            return;
        }
    };
    let mut reader = BufReader::new(stream);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = match reader.read_line(&mut line) {
            Ok(0) => break, // peer closed the connection
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(%peer, error = %e, "error reading from session socket");
                break;
            }
        };
        let _ = bytes_read;

        let trimmed = line.strip_suffix('\n').unwrap_or(&line);
        let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);
        let request = trimmed.as_bytes().to_vec();

        let response = Arc::new(Mutex::new(Vec::new()));
        let response_for_job = Arc::clone(&response);
        let registry_for_job = Arc::clone(&registry);

        let outcome = pool.execute(move || {
            let mut out = response_for_job.lock();
            executor::execute(&registry_for_job, &request, &mut out);
        });

        match outcome {
            Ok(()) => {
                let body = std::mem::take(&mut *response.lock());
                if let Err(e) = writer.write_all(&body) {
                    tracing::warn!(%peer, error = %e, "error writing response, closing session");
                    break;
                }
            }
            Err(()) => {
                // A system-level failure inside the worker: log it and tear
                // down this session. Other sessions are unaffected.
                tracing::error!(%peer, "worker failed unexpectedly; terminating session");
                break;
            }
        }
    }
}
