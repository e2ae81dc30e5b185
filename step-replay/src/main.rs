// Step replay - drive a debugger session from an instrumentation trace
//
// Reads JSON lines (session commands and instrumentation events) from stdin
// and writes one JSON line per outcome to stdout.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

mod handlers;
mod protocol;

use handlers::ReplayHandler;

#[tokio::main]
async fn main() -> Result<()> {
    // Tracing to stderr only - stdout carries the replay output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("step_replay=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting step replay...");

    let mut handler = ReplayHandler::new();

    let mut reader = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut line_no = 0usize;

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                info!("End of trace");
                break;
            }
            Ok(_) => {
                line_no += 1;
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                debug!("Received: {}", line);

                if let Some(output) = handler.handle_line(line_no, line) {
                    let output_str = serde_json::to_string(&output)?;
                    debug!("Sending: {}", output_str);
                    stdout.write_all(output_str.as_bytes()).await?;
                    stdout.write_all(b"\n").await?;
                    stdout.flush().await?;
                }
            }
            Err(e) => {
                error!("Read error: {}", e);
                break;
            }
        }
    }

    info!("Step replay shutting down");
    Ok(())
}
