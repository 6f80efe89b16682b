use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "failover-cli")]
#[command(about = "Management CLI for the DNS failover service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// Admin API key; omit when the server runs without one.
    #[arg(short, long, env = "FAILOVER_API_KEY", default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Monitor states, recent switches and flapping endpoints
    Status,
    /// List stored monitor definitions
    Monitors,
    /// Show the switch log, newest first
    History {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Show the endpoint-down log, newest first
    IpDown {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Force a monitor back to its primary IP
    Restore {
        id: String,
        /// Override the primary's CDN/proxied flag
        #[arg(long)]
        proxied: Option<bool>,
    },
    /// Stop and delete a monitor
    Delete { id: String },
    /// List Cloudflare zones
    Zones,
    /// List a zone's DNS records
    Records {
        zone_id: String,
        /// Match name, content or type
        #[arg(short, long)]
        search: Option<String>,
    },
    /// List Cloudflare accounts and the active one
    Accounts,
    /// Make an account the one DNS calls use
    Activate { id: String },
    /// Show the live DNS and notification settings
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    if !cli.key.is_empty() {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
        );
    }

    let request = match cli.command {
        Commands::Status => client.get(format!("{base}/api/status")),
        Commands::Monitors => client.get(format!("{base}/api/monitors")),
        Commands::History { limit } => client
            .get(format!("{base}/api/history"))
            .query(&[("limit", limit)]),
        Commands::IpDown { limit } => client
            .get(format!("{base}/api/ip-down"))
            .query(&[("limit", limit)]),
        Commands::Restore { id, proxied } => client
            .post(format!("{base}/api/monitors/{id}/restore"))
            .json(&json!({ "proxied": proxied })),
        Commands::Delete { id } => client.delete(format!("{base}/api/monitors/{id}")),
        Commands::Zones => client.get(format!("{base}/api/zones")),
        Commands::Records { zone_id, search } => {
            let request = client.get(format!("{base}/api/zones/{zone_id}/records"));
            match search {
                Some(search) => request.query(&[("search", search)]),
                None => request,
            }
        }
        Commands::Accounts => client.get(format!("{base}/api/cloudflare-accounts")),
        Commands::Activate { id } => {
            client.post(format!("{base}/api/cloudflare-accounts/{id}/activate"))
        }
        Commands::Config => client.get(format!("{base}/api/config")),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await?;
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let text = res.text().await?;
    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }

    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
