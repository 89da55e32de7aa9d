use clap::{Parser, Subcommand};
use reqwest::header::LOCATION;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Parser)]
#[command(name = "accounts-cli")]
#[command(about = "Command line client for the account service", long_about = None)]
struct Cli {
    #[arg(long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, default_value = "user")]
    user: String,

    #[arg(short, long, default_value = "user")]
    password: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all accounts
    List,
    /// Show one account
    Get { id: i64 },
    /// Create an account
    Create { number: String, name: String },
    /// Show one beneficiary of an account
    Beneficiary { id: i64, name: String },
    /// Add a beneficiary with no allocation
    AddBeneficiary { id: i64, name: String },
    /// Remove a beneficiary
    RemoveBeneficiary { id: i64, name: String },
    /// Set allocations, e.g. `allocate 0 "Jane Doe=0.5" "Junior Doe=0.5"`
    Allocate {
        id: i64,
        #[arg(required = true)]
        allocations: Vec<String>,
    },
    /// Show the roles granted to the current user
    Authorities,
    /// Check service health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/').to_string();

    let get = |path: String| {
        client
            .get(format!("{base}{path}"))
            .basic_auth(&cli.user, Some(&cli.password))
    };

    let res = match &cli.command {
        Commands::List => get("/accounts".into()).send().await?,
        Commands::Get { id } => get(format!("/accounts/{id}")).send().await?,
        Commands::Create { number, name } => {
            client
                .post(format!("{base}/accounts"))
                .basic_auth(&cli.user, Some(&cli.password))
                .json(&serde_json::json!({ "number": number, "name": name, "beneficiaries": [] }))
                .send()
                .await?
        }
        Commands::Beneficiary { id, name } => {
            let url = beneficiary_url(&base, *id, name)?;
            client
                .get(url)
                .basic_auth(&cli.user, Some(&cli.password))
                .send()
                .await?
        }
        Commands::AddBeneficiary { id, name } => {
            client
                .post(format!("{base}/accounts/{id}/beneficiaries"))
                .basic_auth(&cli.user, Some(&cli.password))
                .body(name.clone())
                .send()
                .await?
        }
        Commands::RemoveBeneficiary { id, name } => {
            let url = beneficiary_url(&base, *id, name)?;
            client
                .delete(url)
                .basic_auth(&cli.user, Some(&cli.password))
                .send()
                .await?
        }
        Commands::Allocate { id, allocations } => {
            let body = parse_allocations(allocations)?;
            client
                .put(format!("{base}/accounts/{id}/beneficiaries"))
                .basic_auth(&cli.user, Some(&cli.password))
                .json(&body)
                .send()
                .await?
        }
        Commands::Authorities => get("/authorities".into()).send().await?,
        Commands::Health => client.get(format!("{base}/health")).send().await?,
    };

    print_response(res).await
}

fn beneficiary_url(base: &str, id: i64, name: &str) -> Result<reqwest::Url, Box<dyn std::error::Error>> {
    let mut url = reqwest::Url::parse(base)?;
    let id = id.to_string();
    url.path_segments_mut()
        .map_err(|_| "base url cannot hold a path")?
        .pop_if_empty()
        .extend(["accounts", id.as_str(), "beneficiaries", name]);
    Ok(url)
}

fn parse_allocations(pairs: &[String]) -> Result<HashMap<String, Value>, Box<dyn std::error::Error>> {
    let mut allocations = HashMap::new();
    for pair in pairs {
        let (name, value) = pair
            .rsplit_once('=')
            .ok_or_else(|| format!("expected NAME=FRACTION, got '{pair}'"))?;
        // Sent as a string so the server parses the exact decimal.
        allocations.insert(name.trim().to_string(), Value::String(value.trim().to_string()));
    }
    Ok(allocations)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if let Some(location) = res.headers().get(LOCATION) {
        println!("Location: {}", location.to_str().unwrap_or("<invalid>"));
    }

    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("{}", text);
        }
        std::process::exit(1);
    }

    let text = res.text().await?;
    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
