//! Satispay CSV bot - converts exports sent to a Telegram chat.

use clap::Parser;
use satispay_csv_bot::{
    telegram::{update_stream, RETRY_DELAY},
    Config, Relay, Result, TelegramClient,
};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "satispay_bot")]
#[command(about = "Telegram bot converting Satispay CSV exports", long_about = None)]
struct Cli {
    /// Configuration file (defaults to conf.json in . or /srv/satispayCSV2budgetbanker/)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    if let Err(e) = run().await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let client = TelegramClient::new(config.bot_api_key.clone());
    let me = client.get_me().await?;
    info!(
        account = me.username.as_deref().unwrap_or(&me.first_name),
        "authorized on account"
    );

    let relay = Relay::from_config(client.clone(), &config);
    let updates = update_stream(client, RETRY_DELAY);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("cannot listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let handled = relay.run(updates, shutdown).await;
    info!(handled, "stopped");
    Ok(())
}
