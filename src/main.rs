/// flowdoc server entry point
///
/// Serves the workflow document API at /api/* and a health check at /healthz.

use flowdoc::{config::Config, server::start_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Defaults come from FLOWDOC_* environment variables
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
