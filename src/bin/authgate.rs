use anyhow::Result;
use authgate::cli;

// One invocation is one page load: a single-threaded event loop.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let action = cli::start()?;

    let result = action.execute().await;

    cli::telemetry::shutdown_tracer();

    result
}
