//! Pix CLI
//!
//! Command-line interface for the Pix API.

use anyhow::Result;
use clap::{Parser, Subcommand};

use pix_client::PixClient;

#[derive(Parser)]
#[command(name = "pix")]
#[command(author, version, about = "Pix API CLI client", long_about = None)]
struct Cli {
    /// Base URL of the Pix API
    #[arg(long, env = "PIX_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// API key for authentication
    #[arg(long, env = "PIX_API_KEY")]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API health
    Health,
    /// Sign up and print the new API key
    Signup {
        first_name: String,
        last_name: String,
        /// Opening wallet balance in cents
        #[arg(long, default_value_t = 0)]
        wallet: i64,
    },
    /// Show your profile and wallet
    Me,
    /// Request a pix and print the key to share with the payer
    Request {
        /// Amount in cents
        #[arg(long, allow_negative_numbers = true)]
        value: i64,
    },
    /// Pay a pix by its key
    Pay {
        #[arg(long)]
        key: String,
    },
    /// List the pix you received or paid, newest first
    History,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut client = PixClient::new(&cli.api_url);
    if let Some(key) = cli.api_key {
        client = client.with_api_key(key);
    }

    match cli.command {
        Commands::Health => {
            let healthy = client.health().await?;
            if healthy {
                println!("✓ API is healthy");
            } else {
                println!("✗ API is not healthy");
                std::process::exit(1);
            }
        }

        Commands::Signup {
            first_name,
            last_name,
            wallet,
        } => {
            let signup = client.create_user(&first_name, &last_name, wallet).await?;
            println!("{}", serde_json::to_string_pretty(&signup.user)?);
            eprintln!("Save this API key, it will not be shown again:");
            println!("{}", signup.api_key);
        }

        Commands::Me => {
            let user = client.me().await?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }

        Commands::Request { value } => {
            let key = client.request_pix(value).await?;
            println!("{}", key);
        }

        Commands::Pay { key } => {
            let resp = client.pay_pix(&key).await?;
            println!("✓ {}", resp.msg);
        }

        Commands::History => {
            let entries = client.transactions().await?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request() {
        let cli = Cli::try_parse_from(["pix", "request", "--value", "250"]).unwrap();
        assert!(matches!(cli.command, Commands::Request { value: 250 }));
    }

    #[test]
    fn test_parse_signup_with_wallet() {
        let cli = Cli::try_parse_from([
            "pix", "--api-key", "sk_x", "signup", "Ana", "Souza", "--wallet", "1000",
        ])
        .unwrap();
        assert_eq!(cli.api_key.as_deref(), Some("sk_x"));
        assert!(matches!(cli.command, Commands::Signup { wallet: 1000, .. }));
    }

    #[test]
    fn test_clap_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
