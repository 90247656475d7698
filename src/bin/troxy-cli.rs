use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "troxy-cli")]
#[command(about = "Management CLI for the Troxy replay server", long_about = None)]
struct Cli {
    /// Admin API base URL, including the path prefix.
    #[arg(short, long, default_value = "http://localhost:8080/troxy/api")]
    url: String,

    /// API key, if the server requires one.
    #[arg(short, long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server status
    Status,
    /// List loaded recordings in precedence order
    Recordings,
    /// Show request counters
    Stats {
        /// Only the per-path table
        #[arg(long, conflicts_with = "recordings")]
        paths: bool,
        /// Only the per-recording table
        #[arg(long)]
        recordings: bool,
    },
    /// Reset all request counters to zero
    Reset,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", key))?,
        );
    }

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/status", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Recordings => {
            let res = client.get(format!("{}/recordings", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Stats { paths, recordings } => {
            let endpoint = if paths {
                "statistics/paths"
            } else if recordings {
                "statistics/recordings"
            } else {
                "statistics"
            };
            let res = client.get(format!("{}/{}", cli.url, endpoint))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Reset => {
            let res = client.delete(format!("{}/statistics", cli.url))
                .headers(headers)
                .send()
                .await?;
            if res.status().is_success() {
                println!("Statistics reset");
            } else {
                eprintln!("Error: Admin API returned status {}", res.status());
            }
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
