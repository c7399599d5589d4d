mod client;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use client::{CreateLinkRequest, PaylinkApi, PaymentLink};
use colored::Colorize;

#[derive(Parser)]
#[command(name = "paylink")]
#[command(about = "paylink - create and track payment-request links", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// paylink server URL
    #[arg(long, global = true, default_value = "http://localhost:8000")]
    node_url: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Currency {
    Eth,
    Usd,
}

impl Currency {
    fn as_str(&self) -> &'static str {
        match self {
            Currency::Eth => "ETH",
            Currency::Usd => "USD",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new payment-request link
    Create {
        /// Recipient address (0x + 40 hex digits)
        recipient: String,

        /// Requested amount (decimal string)
        amount: String,

        /// Currency tag
        #[arg(short, long, value_enum, default_value = "eth")]
        currency: Currency,

        /// Optional message shown to the payer
        #[arg(short, long)]
        message: Option<String>,

        /// Creator wallet address (recorded on the link)
        #[arg(long)]
        created_by: Option<String>,
    },

    /// List links known to the server
    List {
        /// Only links created by this address (case-insensitive)
        #[arg(long)]
        creator: Option<String>,
    },

    /// Show a single link
    Show {
        /// Link id
        id: String,
    },

    /// Report a completed transfer for a link
    Pay {
        /// Link id
        id: String,

        /// Payer wallet address
        paid_by: String,

        /// Transaction hash of the transfer
        tx_hash: String,
    },

    /// Check server health
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let api = PaylinkApi::new(Some(cli.node_url.clone()));

    match cli.command {
        Commands::Create {
            recipient,
            amount,
            currency,
            message,
            created_by,
        } => {
            let created = api.create_link(&CreateLinkRequest {
                recipient,
                amount,
                currency: currency.as_str().to_string(),
                message,
                created_by,
            })?;

            println!("{}", "Link created".green().bold());
            print_link(&created.link);
            println!();
            println!("  share: {}", created.url.cyan().underline());
        }

        Commands::List { creator } => {
            let links = api.list_links(creator.as_deref())?;
            if links.is_empty() {
                println!("{}", "No links found".yellow());
            } else {
                println!("{} link(s):", links.len());
                println!();
                for link in &links {
                    print_link_line(link);
                }
            }
        }

        Commands::Show { id } => {
            let link = api.get_link(&id)?;
            print_link(&link);
        }

        Commands::Pay { id, paid_by, tx_hash } => {
            let link = api.mark_paid(&id, &paid_by, &tx_hash)?;
            println!("{}", "Link settled".green().bold());
            print_link(&link);
        }

        Commands::Status => {
            if api.health_check()? {
                println!("{} {}", "server:".bold(), "healthy".green());
            } else {
                println!("{} {}", "server:".bold(), "unhealthy".red());
            }
        }
    }

    Ok(())
}

fn status_tag(link: &PaymentLink) -> colored::ColoredString {
    if link.paid {
        "PAID".green().bold()
    } else {
        "UNPAID".yellow().bold()
    }
}

fn print_link_line(link: &PaymentLink) {
    println!(
        "  {}  {}  {} {}  -> {}",
        link.id.dimmed(),
        status_tag(link),
        link.amount,
        link.currency,
        link.recipient
    );
}

fn print_link(link: &PaymentLink) {
    println!("  id:        {}", link.id);
    println!("  status:    {}", status_tag(link));
    println!("  amount:    {} {}", link.amount, link.currency);
    println!("  recipient: {}", link.recipient);
    if let Some(message) = &link.message {
        println!("  message:   {}", message);
    }
    println!("  created:   {}", link.created_at.to_rfc3339());
    if let Some(created_by) = &link.created_by {
        println!("  creator:   {}", created_by);
    }
    if link.paid {
        if let Some(paid_at) = link.paid_at {
            println!("  paid at:   {}", paid_at.to_rfc3339());
        }
        if let Some(paid_by) = &link.paid_by {
            println!("  paid by:   {}", paid_by);
        }
        if let Some(tx_hash) = &link.tx_hash {
            println!("  tx hash:   {}", tx_hash);
        }
    }
}
