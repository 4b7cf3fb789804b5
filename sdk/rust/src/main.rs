use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use quote_client::{write_artifact, QuoteClient, DEFAULT_ARTIFACT, DEFAULT_URL};

#[derive(Parser)]
#[command(name = "quote-client")]
#[command(about = "Fetch the current USD-BRL quote and write it to a file", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = DEFAULT_URL)]
    url: String,

    #[arg(short, long, default_value = DEFAULT_ARTIFACT)]
    output: PathBuf,

    /// End-to-end budget for the call.
    #[arg(short, long, default_value_t = 300)]
    timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quote_client=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let client = QuoteClient::with_timeout(&cli.url, Duration::from_millis(cli.timeout_ms))?;

    let quote = match client.fetch_quote().await {
        Ok(quote) => quote,
        Err(e) => {
            tracing::error!(url = %cli.url, error = %e, "Failed to fetch quote");
            return Err(e.into());
        }
    };

    write_artifact(&cli.output, &quote.bid).await?;
    tracing::info!(bid = %quote.bid, output = %cli.output.display(), "Quote written");
    Ok(())
}
