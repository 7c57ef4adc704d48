//! Command-line configuration.

use clap::Parser;

/// A concurrent two-table join server.
#[derive(Debug, Parser)]
#[command(name = "bulkmt", version, about)]
pub struct Args {
    /// TCP port to listen on.
    pub port: u16,

    /// Number of worker threads executing command bodies. Defaults to the
    /// host's available parallelism, floored at 2 so a single-core box
    /// still gets a dedicated pool separate from the accept loop.
    #[arg(long, default_value_t = default_thread_count())]
    pub threads: usize,
}

fn default_thread_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or_else(|_| num_cpus::get())
        .max(2)
}
