//! signet-cli
//!
//! Operator CLI for a running Signet node. Proposes and accepts transfers,
//! mints deposits, and inspects the chain over the node's HTTP API.
//!
//! Usage:
//!   signet-cli send         --to <name> --amount <n>   [--node <url>]
//!   signet-cli pending                                  [--node <url>]
//!   signet-cli accept       --number <n>                [--node <url>]
//!   signet-cli deposit      --amount <n> [--name <who>] [--node <url>]
//!   signet-cli balance                                  [--node <url>]
//!   signet-cli transactions                             [--node <url>]
//!   signet-cli verify-chain                             [--node <url>]
//!   signet-cli join         --name <participant>        [--node <url of authority>]

use clap::{Parser, Subcommand};

mod rest_client;
use rest_client::NodeClient;

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "signet-cli", version, about = "Signet operator CLI")]
struct Args {
    /// Node API endpoint.
    #[arg(long, global = true, default_value = "http://127.0.0.1:8000")]
    node: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Propose a transfer to another participant.
    Send {
        /// Recipient node name.
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: f64,
    },

    /// List proposals waiting for this node's counter-signature.
    Pending,

    /// Counter-sign the pending proposal at a queue position and submit it.
    Accept {
        /// Position in the pending queue (see `pending`).
        #[arg(long)]
        number: usize,
    },

    /// Mint a balance through an authority deposit round.
    Deposit {
        #[arg(long)]
        amount: f64,
        /// Depositor node name (usually the node the CLI points at).
        #[arg(long)]
        name: String,
    },

    /// Print this node's balance.
    Balance,

    /// Dump the committed chain.
    Transactions,

    /// Ask the node to audit its own chain.
    VerifyChain,

    /// Register a participant with the authority the CLI points at.
    Join {
        /// Participant name to register.
        #[arg(long)]
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let client = NodeClient::new(&args.node);

    match args.command {
        Command::Send { to, amount } => {
            let reply = client.send(&to, amount).await?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        Command::Pending => {
            let reply = client.pending().await?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        Command::Accept { number } => {
            let reply = client.accept(number).await?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        Command::Deposit { amount, name } => {
            let reply = client.deposit(&name, amount).await?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        Command::Balance => {
            let balance = client.balance().await?;
            println!("{balance}");
        }
        Command::Transactions => {
            let reply = client.transactions().await?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        Command::VerifyChain => {
            let reply = client.verify_chain().await?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        Command::Join { name } => {
            let reply = client.join(&name).await?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
    }
    Ok(())
}
