use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "depwatch-cli")]
#[command(about = "Query a running depwatch health responder", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:2000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the full health document
    Health,
    /// Print one status key; exits non-zero when it is not ok
    Probe {
        /// startup, ready or live
        status: depwatch::StatusKey,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/-/health", base)).send().await?;
            let status = res.status();
            if !status.is_success() {
                eprintln!("Error: health responder returned status {}", status);
                std::process::exit(1);
            }
            let json: Value = res.json().await?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Commands::Probe { status } => {
            let res = client.get(format!("{}/-/{}", base, status)).send().await?;
            let code = res.status();
            let body = res.text().await?;
            println!("{}: {}", status, body.trim());
            if !code.is_success() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
