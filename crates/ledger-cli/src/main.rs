use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client for the ledger node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:8080)
    #[arg(long, global = true, env = "LEDGER_NODE", default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a transfer written as "A -> B: Rp10000"
    Submit {
        /// Transfer text
        transaction: String,
    },
    /// Credit an account from the node's system account
    Topup {
        #[arg(long)]
        account: String,
        #[arg(long)]
        amount: u64,
    },
    /// Print every block
    Chain,
    /// Print the tip height and hash
    Head,
    /// Check the chain's hash links
    Validate,
    /// Print balances, or one party's balance
    Balances {
        party: Option<String>,
    },
}

#[derive(Serialize)]
struct TxIn<'a> {
    transaction: &'a str,
}

#[derive(Serialize)]
struct TopUpIn<'a> {
    account: &'a str,
    amount: u64,
}

impl Command {
    fn path(&self) -> String {
        match self {
            Command::Submit { .. } => "/tx".to_string(),
            Command::Topup { .. } => "/topup".to_string(),
            Command::Chain => "/chain".to_string(),
            Command::Head => "/chain/head".to_string(),
            Command::Validate => "/chain/valid".to_string(),
            Command::Balances { party: None } => "/balances".to_string(),
            Command::Balances { party: Some(p) } => format!("/balances/{}", urlencoding::encode(p)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let url = format!("{}{}", cli.node.trim_end_matches('/'), cli.cmd.path());
    let client = reqwest::Client::new();
    debug!("requesting {url}");

    let res = match &cli.cmd {
        Command::Submit { transaction } => {
            client
                .post(&url)
                .json(&TxIn { transaction })
                .send()
                .await?
        }
        Command::Topup { account, amount } => {
            client
                .post(&url)
                .json(&TopUpIn {
                    account,
                    amount: *amount,
                })
                .send()
                .await?
        }
        _ => client.get(&url).send().await?,
    };

    let status = res.status();
    let body: serde_json::Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    if !status.is_success() {
        bail!("node answered {status}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_map_to_node_routes() {
        let cli = Cli::try_parse_from(["ledger-cli", "submit", "A -> B: Rp5"]).unwrap();
        assert_eq!(cli.cmd.path(), "/tx");
        let cli = Cli::try_parse_from(["ledger-cli", "balances", "andi"]).unwrap();
        assert_eq!(cli.cmd.path(), "/balances/andi");
        let cli = Cli::try_parse_from(["ledger-cli", "balances"]).unwrap();
        assert_eq!(cli.cmd.path(), "/balances");
        let cli = Cli::try_parse_from(["ledger-cli", "balances", "budi santoso"]).unwrap();
        assert_eq!(cli.cmd.path(), "/balances/budi%20santoso");
        let cli = Cli::try_parse_from(["ledger-cli", "validate", "--node", "http://x:1"]).unwrap();
        assert_eq!(cli.cmd.path(), "/chain/valid");
        assert_eq!(cli.node, "http://x:1");
    }

    #[test]
    fn topup_requires_positive_looking_amount() {
        assert!(Cli::try_parse_from(["ledger-cli", "topup", "--account", "a", "--amount", "-1"]).is_err());
        let cli =
            Cli::try_parse_from(["ledger-cli", "topup", "--account", "a", "--amount", "7"]).unwrap();
        assert_eq!(cli.cmd.path(), "/topup");
    }
}
