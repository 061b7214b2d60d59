//! logsift — parse, filter and summarize log files.

use clap::Parser;

use sift_cli::{Args, logging, runner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.log_json);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        files = args.files.len(),
        "logsift starting"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    runner::run(&args, &mut out).await
}
