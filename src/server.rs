//! TCP accept loop: one thread per accepted connection, a single shared
//! registry and worker pool behind them. Per §9's design notes, this is the
//! "run each session on its own thread" alternative to a single-threaded
//! acceptor posting into the pool — the externally observable contract is
//! identical, and it avoids needing an async runtime in the dependency
//! stack.

use std::net::TcpListener;
use std::sync::Arc;

use crate::registry::TableRegistry;
use crate::worker_pool::ThreadPool;

pub fn run(listener: TcpListener, registry: Arc<TableRegistry>, pool: Arc<ThreadPool>) -> std::io::Result<()> {
    tracing::info!(addr = ?listener.local_addr()?, "listening");
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to accept connection");
                continue;
            }
        };
        let registry = Arc::clone(&registry);
        let pool = Arc::clone(&pool);
        std::thread::spawn(move || {
            crate::session::handle(stream, registry, pool);
        });
    }
    Ok(())
}
