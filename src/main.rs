use std::net::TcpListener;
use std::sync::Arc;

use clap::Parser;

use bulkmt::config::Args;
use bulkmt::registry::TableRegistry;
use bulkmt::worker_pool::ThreadPool;
use bulkmt::{logging, server};

fn main() -> std::io::Result<()> {
    let args = Args::parse();
    let _logging_guard = logging::init();

    tracing::info!(port = args.port, threads = args.threads, "starting bulkmt");

    let registry = Arc::new(TableRegistry::new());
    let pool = Arc::new(ThreadPool::new(args.threads));
    let listener = TcpListener::bind(("0.0.0.0", args.port))?;

    server::run(listener, registry, pool)
}
