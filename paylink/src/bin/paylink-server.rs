// src/bin/paylink-server.rs
use clap::{Parser, Subcommand};
use std::env;
use tracing_subscriber::EnvFilter;
use yansi::Paint;

#[derive(Parser)]
#[command(name = "paylink-server", about = "paylink payment-request link service", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the service
    Start {
        /// API port (default: 8000)
        #[arg(long, default_value_t = 8000)]
        api_port: u16,

        /// Store backend: local | postgres
        #[arg(long, default_value = "local")]
        store: String,

        /// Path for the local sled store (optional)
        #[arg(long)]
        sled_path: Option<String>,

        /// Public base URL used when minting shareable payment URLs
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Validate configuration and exit
    Check {},
}

fn banner() {
    let name = r#"
                    _ _       _
 _ __   __ _ _   _| (_)_ __ | | __
| '_ \ / _` | | | | | | '_ \| |/ /
| |_) | (_| | |_| | | | | | |   <
| .__/ \__,_|\__, |_|_|_| |_|_|\_\
|_|          |___/
"#;
    println!("{}", Paint::cyan(name).bold());
    println!(
        "{} {}",
        Paint::green("paylink").bold(),
        Paint::white("- shareable payment-request links").dimmed()
    );
    println!();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    banner();

    match cli.command {
        Commands::Start {
            api_port,
            store,
            sled_path,
            base_url,
        } => {
            // Set env variables the rest of the service expects
            env::set_var("API_ADDR", format!("0.0.0.0:{}", api_port));
            env::set_var("STORE_MODE", &store);
            if let Some(p) = sled_path {
                env::set_var("SLED_PATH", p);
            }
            if let Some(b) = base_url {
                env::set_var("PUBLIC_BASE_URL", b);
            }

            println!(
                "{} API -> http://127.0.0.1:{}   store -> {}",
                Paint::blue("[starting]").bold(),
                api_port,
                store
            );

            paylink::run().await?;
        }

        Commands::Check {} => {
            dotenvy::dotenv().ok();
            let validation = paylink::config::validate_config();
            validation.print_summary();
            if !validation.valid {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
