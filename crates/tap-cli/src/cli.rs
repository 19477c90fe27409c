use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tap_ledger::{Dimension, ListKind};
use tap_types::Address;

#[derive(Parser)]
#[command(
    name = "tap",
    about = "TAP token ledger with staking and dividend change tracking",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Ledger snapshot file
    #[arg(long, global = true, default_value = "tap-ledger.json")]
    pub state: PathBuf,

    /// Caller address (defaults to the ledger owner)
    #[arg(long = "as", global = true, value_name = "ADDRESS")]
    pub sender: Option<Address>,

    /// Current time in microseconds (defaults to the system clock)
    #[arg(long, global = true, value_name = "MICROS")]
    pub now: Option<u64>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new ledger snapshot
    Init(InitArgs),
    /// Show token metadata and settings
    Info,
    /// Show the balance breakdown of an address
    Balance(BalanceArgs),
    /// Transfer tokens from the caller
    Transfer(TransferArgs),
    /// Set the caller's staked amount
    Stake(StakeArgs),
    /// Change an owner setting
    Set(SetArgs),
    /// Flip an owner switch
    Toggle(ToggleArgs),
    /// Show or edit the blacklist, locklist, or whitelist
    List(ListArgs),
    /// Start a new day for a tracked dimension
    Flip(DimensionArgs),
    /// Fetch the next page of changed addresses
    Drain(PageArgs),
    /// Clear the retired change buffer
    Clear(PageArgs),
    /// List every address that ever received tokens
    Known,
    /// Derive an address from a label, or generate a random one
    Address(AddressArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// TOML genesis configuration
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Initial supply in whole tokens
    #[arg(long)]
    pub supply: Option<u64>,
    #[arg(long)]
    pub decimals: Option<u8>,
    #[arg(long)]
    pub owner: Option<Address>,
    /// Overwrite an existing snapshot
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct BalanceArgs {
    /// Address to inspect (defaults to the caller)
    pub address: Option<Address>,
}

#[derive(Args)]
pub struct TransferArgs {
    pub to: Address,
    /// Amount in base units
    pub value: u128,
    /// Payload delivered with the transfer
    #[arg(long)]
    pub data: Option<String>,
}

#[derive(Args)]
pub struct StakeArgs {
    /// New staked amount in base units (0 unstakes everything)
    pub value: u128,
}

#[derive(Args)]
pub struct SetArgs {
    #[command(subcommand)]
    pub setting: Setting,
}

#[derive(Subcommand)]
pub enum Setting {
    /// Minimum stake, in whole tokens
    MinStake { tokens: u128 },
    /// Unstaking period, in days
    UnstakingPeriod { days: u64 },
    /// Entries handled per drain or clear call
    MaxLoop { max_loop: usize },
    /// Address allowed to drive dividend distribution
    Dividends { address: Address },
}

#[derive(Args)]
pub struct ToggleArgs {
    pub switch: Switch,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum Switch {
    Staking,
    StakedOnly,
    Pause,
}

#[derive(Args)]
pub struct ListArgs {
    pub list: ListName,
    #[command(subcommand)]
    pub action: Option<ListAction>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ListName {
    Blacklist,
    Locklist,
    Whitelist,
}

impl From<ListName> for ListKind {
    fn from(name: ListName) -> Self {
        match name {
            ListName::Blacklist => ListKind::Blacklist,
            ListName::Locklist => ListKind::Locklist,
            ListName::Whitelist => ListKind::Whitelist,
        }
    }
}

#[derive(Subcommand)]
pub enum ListAction {
    Add { address: Address },
    Remove { address: Address },
    Show,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum DimensionName {
    Balance,
    Stake,
}

impl From<DimensionName> for Dimension {
    fn from(name: DimensionName) -> Self {
        match name {
            DimensionName::Balance => Dimension::Balance,
            DimensionName::Stake => Dimension::Stake,
        }
    }
}

#[derive(Args)]
pub struct DimensionArgs {
    pub dimension: DimensionName,
}

#[derive(Args)]
pub struct PageArgs {
    pub dimension: DimensionName,
    /// Upper bound on entries (further capped by the ledger's max loop)
    #[arg(long)]
    pub max: Option<usize>,
}

#[derive(Args)]
pub struct AddressArgs {
    /// Label to derive from (omit for a random account address)
    pub label: Option<String>,
    /// Derive a contract address instead of an account
    #[arg(long)]
    pub contract: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let owner = Address::account("owner");
        let bob = Address::account("bob").to_string();
        let caller = owner.to_string();
        let cli = Cli::try_parse_from([
            "tap",
            "transfer",
            bob.as_str(),
            "300",
            "--as",
            caller.as_str(),
            "--now",
            "42",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.sender, Some(owner));
        assert_eq!(cli.now, Some(42));
        assert!(matches!(cli.format, OutputFormat::Json));
        assert!(matches!(cli.command, Command::Transfer(TransferArgs { value: 300, .. })));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(Cli::try_parse_from(["tap", "balance", "hxnothex"]).is_err());
    }

    #[test]
    fn list_defaults_to_show() {
        let cli = Cli::try_parse_from(["tap", "list", "locklist"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::List(ListArgs {
                list: ListName::Locklist,
                action: None
            })
        ));
    }
}
