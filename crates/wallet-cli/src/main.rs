//! Hedera Wallet CLI
//!
//! Command-line tool for account queries and transaction submission.
//! The operator account is read from `OPERATOR_ID` and `OPERATOR_KEY`
//! (hex private key), from the environment or a `.env` file.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hedera_wallet_core::{
    execute, parse_hbar, sign, AccountId, AssetRef, ContractId, NetworkClient, NetworkId,
    PrivateKey, TokenId, TransactionDraft, TINYBARS_PER_HBAR,
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "hwallet")]
#[command(about = "Hedera Wallet CLI", version)]
struct Cli {
    /// Network to operate on (mainnet, testnet, previewnet)
    #[arg(short, long, default_value = "testnet", global = true)]
    network: NetworkArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy)]
struct NetworkArg(NetworkId);

impl std::str::FromStr for NetworkArg {
    type Err = hedera_wallet_core::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(NetworkArg(s.parse::<NetworkId>()?))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the operator account's balance
    Balance,

    /// List the operator account's token holdings
    Tokens,

    /// Show recent transactions for the operator account
    History {
        /// Maximum number of rows
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Transfer hbar to another account
    Transfer {
        /// Recipient account (0.0.x)
        to: AccountId,

        /// Amount in hbar, e.g. "2.5"
        amount: String,

        /// Optional transaction memo
        #[arg(short, long)]
        memo: Option<String>,
    },

    /// Transfer token units to another account
    TokenTransfer {
        /// Token to move (0.0.x)
        token: TokenId,

        /// Recipient account (0.0.x)
        to: AccountId,

        /// Amount in base units
        amount: i64,
    },

    /// Create a new token with the operator as treasury
    CreateToken {
        /// Token name
        name: String,

        /// Token symbol
        symbol: String,

        /// Decimal places
        #[arg(short, long, default_value_t = 0)]
        decimals: u32,

        /// Initial supply in base units
        #[arg(short, long, default_value_t = 0)]
        supply: u64,
    },

    /// Associate the operator account with a token
    Associate {
        /// Token to associate with (0.0.x)
        token: TokenId,
    },

    /// Deploy contract bytecode
    Deploy {
        /// Hex-encoded bytecode, or @path to a hex file
        bytecode: String,

        /// Gas limit
        #[arg(short, long, default_value_t = 100_000)]
        gas: u64,
    },

    /// Call a deployed contract
    Call {
        /// Contract to call (0.0.x)
        contract: ContractId,

        /// Hex-encoded call parameters
        #[arg(default_value = "")]
        parameters: String,

        /// Gas limit
        #[arg(short, long, default_value_t = 50_000)]
        gas: u64,
    },
}

struct Operator {
    account_id: AccountId,
    key: PrivateKey,
}

fn load_operator() -> Result<Operator> {
    dotenvy::dotenv().ok();

    let account_id = std::env::var("OPERATOR_ID")
        .context("OPERATOR_ID is not set")?
        .parse::<AccountId>()
        .context("OPERATOR_ID is not a valid account id")?;
    let key = std::env::var("OPERATOR_KEY")
        .context("OPERATOR_KEY is not set")
        .and_then(|hex_key| {
            PrivateKey::from_hex(&hex_key).context("OPERATOR_KEY is not a valid private key")
        })?;

    Ok(Operator { account_id, key })
}

fn format_hbar(tinybars: i64) -> String {
    let whole = tinybars / TINYBARS_PER_HBAR;
    let frac = (tinybars % TINYBARS_PER_HBAR).abs();
    if frac == 0 {
        format!("{} hbar", whole)
    } else {
        format!("{}.{:08} hbar", whole, frac)
    }
}

fn read_bytecode(arg: &str) -> Result<Vec<u8>> {
    let hex_str = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read bytecode file {}", path))?,
        None => arg.to_string(),
    };
    hex::decode(hex_str.trim()).context("Bytecode is not valid hex")
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(Level::WARN.to_string()));
    FmtSubscriber::builder().with_env_filter(filter).init();

    let cli = Cli::parse();
    let operator = load_operator()?;
    let network = cli.network.0;
    let client = NetworkClient::for_network(operator.account_id, network);

    info!(account_id = %operator.account_id, %network, "operator loaded");

    match cli.command {
        Commands::Balance => {
            let balance = client.get_balance().await?;
            println!("Account:  {}", operator.account_id);
            println!("Network:  {}", network);
            println!("Balance:  {} ({} tinybars)", format_hbar(balance), balance);
        }

        Commands::Tokens => {
            let tokens = client.list_tokens().await?;
            if tokens.is_empty() {
                println!("No token holdings for {}", operator.account_id);
            } else {
                for token in tokens {
                    println!(
                        "{}  {}  {}",
                        token.token_id,
                        token.balance,
                        token.symbol.as_deref().unwrap_or("-"),
                    );
                }
            }
        }

        Commands::History { limit } => {
            let rows = client.list_transactions(limit).await?;
            if rows.is_empty() {
                println!("No transactions for {}", operator.account_id);
            } else {
                for row in rows {
                    println!(
                        "{}  {}  {}  fee {}",
                        row.transaction_id, row.name, row.result, row.charged_fee,
                    );
                }
            }
        }

        Commands::Transfer { to, amount, memo } => {
            let tinybars = parse_hbar(&amount)?;
            let mut draft =
                TransactionDraft::transfer(AssetRef::Hbar, operator.account_id, to, tinybars)?;
            if let Some(memo) = memo {
                draft = draft.with_memo(memo);
            }
            run_draft(draft, &operator, &client, "Transfer").await?;
        }

        Commands::TokenTransfer { token, to, amount } => {
            let draft = TransactionDraft::transfer(
                AssetRef::Token(token),
                operator.account_id,
                to,
                amount,
            )?;
            run_draft(draft, &operator, &client, "Token transfer").await?;
        }

        Commands::CreateToken {
            name,
            symbol,
            decimals,
            supply,
        } => {
            let draft =
                TransactionDraft::token_create(&name, &symbol, decimals, supply, operator.account_id)?;
            run_draft(draft, &operator, &client, "Token creation").await?;
        }

        Commands::Associate { token } => {
            let draft = TransactionDraft::token_associate(operator.account_id, token);
            run_draft(draft, &operator, &client, "Association").await?;
        }

        Commands::Deploy { bytecode, gas } => {
            let bytecode = read_bytecode(&bytecode)?;
            let draft = TransactionDraft::contract_create(bytecode, gas)?;
            run_draft(draft, &operator, &client, "Deployment").await?;
        }

        Commands::Call {
            contract,
            parameters,
            gas,
        } => {
            let parameters = if parameters.is_empty() {
                Vec::new()
            } else {
                hex::decode(parameters.trim()).context("Parameters are not valid hex")?
            };
            let draft = TransactionDraft::contract_call(contract, parameters, gas);
            run_draft(draft, &operator, &client, "Contract call").await?;
        }
    }

    Ok(())
}

/// Freeze, sign, submit and report one transaction
async fn run_draft(
    draft: TransactionDraft,
    operator: &Operator,
    client: &NetworkClient,
    label: &str,
) -> Result<()> {
    let frozen = draft.freeze(client)?;
    let transaction_id = frozen.transaction_id();
    println!("{} submitted as {}", label, transaction_id);

    let signed = sign::sign(frozen, &operator.key)?;
    let result = execute::execute(&signed, client).await?;

    println!("Status: {}", result.status);
    if let Some(entity) = &result.created_entity_id {
        println!("Created: {}", entity);
    }
    if !result.status.is_success() {
        anyhow::bail!("{} resolved with status {}", label, result.status);
    }
    Ok(())
}
