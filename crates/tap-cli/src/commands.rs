use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use serde::Serialize;
use tap_ledger::{
    snapshot, BalanceDetails, CallContext, Dimension, LedgerConfig, ListKind, TokenLedger,
    TracingSink,
};
use tap_types::{Address, AddressKind, Timestamp};

use crate::cli::*;

/// A loaded ledger plus the caller identity for this invocation.
struct Session {
    path: PathBuf,
    ledger: TokenLedger,
    ctx: CallContext,
}

impl Session {
    fn open(cli: &Globals) -> anyhow::Result<Self> {
        let state = snapshot::load(&cli.state)
            .with_context(|| format!("cannot open ledger {}", cli.state.display()))?;
        let ledger = TokenLedger::from_state(state, Arc::new(TracingSink));
        let sender = cli.sender.unwrap_or_else(|| ledger.owner());
        let now = cli.now.map(Timestamp::from_micros).unwrap_or_else(Timestamp::now);
        tracing::debug!(%sender, %now, path = %cli.state.display(), "ledger loaded");
        Ok(Self {
            path: cli.state.clone(),
            ledger,
            ctx: CallContext::new(sender, now),
        })
    }

    fn save(self) -> anyhow::Result<()> {
        save_ledger(&self.path, &self.ledger)
    }
}

/// Flags shared by every subcommand.
struct Globals {
    state: PathBuf,
    sender: Option<Address>,
    now: Option<u64>,
    format: OutputFormat,
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let globals = Globals {
        state: cli.state,
        sender: cli.sender,
        now: cli.now,
        format: cli.format,
    };
    match cli.command {
        Command::Init(args) => cmd_init(&globals, args),
        Command::Info => cmd_info(&globals),
        Command::Balance(args) => cmd_balance(&globals, args),
        Command::Transfer(args) => cmd_transfer(&globals, args),
        Command::Stake(args) => cmd_stake(&globals, args),
        Command::Set(args) => cmd_set(&globals, args),
        Command::Toggle(args) => cmd_toggle(&globals, args),
        Command::List(args) => cmd_list(&globals, args),
        Command::Flip(args) => cmd_flip(&globals, args),
        Command::Drain(args) => cmd_drain(&globals, args),
        Command::Clear(args) => cmd_clear(&globals, args),
        Command::Known => cmd_known(&globals),
        Command::Address(args) => cmd_address(&globals, args),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn done(globals: &Globals, message: String) -> anyhow::Result<()> {
    match globals.format {
        OutputFormat::Json => print_json(&serde_json::json!({ "ok": true, "message": message })),
        OutputFormat::Text => {
            println!("{} {}", "✓".green().bold(), message);
            Ok(())
        }
    }
}

fn cmd_init(globals: &Globals, args: InitArgs) -> anyhow::Result<()> {
    if globals.state.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            globals.state.display()
        );
    }
    let mut config = match &args.config {
        Some(path) => LedgerConfig::load(path)?,
        None => LedgerConfig::default(),
    };
    if let Some(supply) = args.supply {
        config.initial_supply = supply;
    }
    if let Some(decimals) = args.decimals {
        config.decimals = decimals;
    }
    if let Some(owner) = args.owner {
        config.owner = owner;
    }

    let ledger = TokenLedger::genesis(&config, Arc::new(TracingSink))?;
    save_ledger(&globals.state, &ledger)?;
    done(
        globals,
        format!(
            "Initialized {} ({}) in {}, {} base units owned by {}",
            ledger.name().bold(),
            ledger.symbol(),
            globals.state.display(),
            ledger.total_supply(),
            ledger.owner().to_string().cyan()
        ),
    )
}

fn save_ledger(path: &Path, ledger: &TokenLedger) -> anyhow::Result<()> {
    snapshot::save(path, ledger.state())
        .with_context(|| format!("cannot write ledger {}", path.display()))
}

#[derive(Serialize)]
struct InfoReport {
    name: String,
    symbol: String,
    decimals: u8,
    total_supply: u128,
    total_staked: u128,
    owner: Address,
    dividends_address: Option<Address>,
    minimum_stake: u128,
    unstaking_period_days: u64,
    max_loop: usize,
    staking_enabled: bool,
    dividends_on_staked_only: bool,
    paused: bool,
}

fn cmd_info(globals: &Globals) -> anyhow::Result<()> {
    let session = Session::open(globals)?;
    let l = &session.ledger;
    let report = InfoReport {
        name: l.name().to_string(),
        symbol: l.symbol().to_string(),
        decimals: l.decimals(),
        total_supply: l.total_supply(),
        total_staked: l.total_staked(),
        owner: l.owner(),
        dividends_address: l.dividends_address(),
        minimum_stake: l.minimum_stake(),
        unstaking_period_days: l.unstaking_period_days(),
        max_loop: l.max_loop(),
        staking_enabled: l.staking_enabled(),
        dividends_on_staked_only: l.dividends_on_staked_only(),
        paused: l.paused(),
    };
    if let OutputFormat::Json = globals.format {
        return print_json(&report);
    }

    println!("{} ({})", report.name.bold(), report.symbol);
    println!("  Decimals: {}", report.decimals);
    println!("  Total supply: {}", report.total_supply.to_string().bold());
    println!("  Total staked: {}", report.total_staked);
    println!("  Owner: {}", report.owner.to_string().cyan());
    match report.dividends_address {
        Some(address) => println!("  Dividends: {}", address.to_string().cyan()),
        None => println!("  Dividends: {}", "(not set)".dimmed()),
    }
    println!("  Minimum stake: {}", report.minimum_stake);
    println!("  Unstaking period: {} days", report.unstaking_period_days);
    println!("  Max loop: {}", report.max_loop);
    println!("  Staking: {}", on_off(report.staking_enabled));
    println!("  Dividends on staked only: {}", on_off(report.dividends_on_staked_only));
    println!("  Paused: {}", on_off(report.paused));
    Ok(())
}

fn on_off(flag: bool) -> colored::ColoredString {
    if flag {
        "on".green()
    } else {
        "off".dimmed()
    }
}

#[derive(Serialize)]
struct BalanceReport {
    address: Address,
    #[serde(flatten)]
    details: BalanceDetails,
}

fn cmd_balance(globals: &Globals, args: BalanceArgs) -> anyhow::Result<()> {
    let session = Session::open(globals)?;
    let address = args.address.unwrap_or(session.ctx.sender);
    let details = session.ledger.details_balance_of(&address, session.ctx.now);
    if let OutputFormat::Json = globals.format {
        return print_json(&BalanceReport { address, details });
    }

    println!("{}", address.to_string().cyan().bold());
    println!("  Total:     {}", details.total.to_string().bold());
    println!("  Available: {}", details.available);
    println!("  Staked:    {}", details.staked);
    if details.unstaking > 0 {
        println!(
            "  Unstaking: {} (unlocks at {})",
            details.unstaking,
            details.unstaking_unlock_time.to_string().yellow()
        );
    } else {
        println!("  Unstaking: 0");
    }
    Ok(())
}

fn cmd_transfer(globals: &Globals, args: TransferArgs) -> anyhow::Result<()> {
    let mut session = Session::open(globals)?;
    let data = args.data.as_deref().map(str::as_bytes);
    session
        .ledger
        .transfer(&session.ctx, args.to, args.value, data)?;
    let from = session.ctx.sender;
    session.save()?;
    done(
        globals,
        format!(
            "Transferred {} from {} to {}",
            args.value.to_string().bold(),
            from.short_id(),
            args.to.short_id()
        ),
    )
}

fn cmd_stake(globals: &Globals, args: StakeArgs) -> anyhow::Result<()> {
    let mut session = Session::open(globals)?;
    session.ledger.stake(&session.ctx, args.value)?;
    let who = session.ctx.sender;
    session.save()?;
    done(
        globals,
        format!("Stake of {} set to {}", who.short_id(), args.value.to_string().bold()),
    )
}

fn cmd_set(globals: &Globals, args: SetArgs) -> anyhow::Result<()> {
    let mut session = Session::open(globals)?;
    let ctx = session.ctx;
    let ledger = &mut session.ledger;
    let message = match args.setting {
        Setting::MinStake { tokens } => {
            ledger.set_minimum_stake(&ctx, tokens)?;
            format!("Minimum stake set to {} base units", ledger.minimum_stake())
        }
        Setting::UnstakingPeriod { days } => {
            ledger.set_unstaking_period(&ctx, days)?;
            format!("Unstaking period set to {days} days")
        }
        Setting::MaxLoop { max_loop } => {
            ledger.set_max_loop(&ctx, max_loop)?;
            format!("Max loop set to {max_loop}")
        }
        Setting::Dividends { address } => {
            ledger.set_dividends_address(&ctx, address)?;
            format!("Dividends address set to {address}")
        }
    };
    session.save()?;
    done(globals, message)
}

fn cmd_toggle(globals: &Globals, args: ToggleArgs) -> anyhow::Result<()> {
    let mut session = Session::open(globals)?;
    let ctx = session.ctx;
    let (label, enabled) = match args.switch {
        Switch::Staking => ("Staking", session.ledger.toggle_staking_enabled(&ctx)?),
        Switch::StakedOnly => (
            "Dividends on staked only",
            session.ledger.toggle_dividends_on_staked_only(&ctx)?,
        ),
        Switch::Pause => ("Paused", session.ledger.toggle_paused(&ctx)?),
    };
    session.save()?;
    done(globals, format!("{label}: {}", if enabled { "on" } else { "off" }))
}

fn cmd_list(globals: &Globals, args: ListArgs) -> anyhow::Result<()> {
    let mut session = Session::open(globals)?;
    let ctx = session.ctx;
    let kind = ListKind::from(args.list);
    let ledger = &mut session.ledger;

    let message = match args.action.unwrap_or(ListAction::Show) {
        ListAction::Show => return print_addresses(globals, &ledger.list(kind)),
        ListAction::Add { address } => {
            match kind {
                ListKind::Blacklist => ledger.add_to_blacklist(&ctx, address)?,
                ListKind::Locklist => ledger.add_to_locklist(&ctx, address)?,
                ListKind::Whitelist => ledger.add_to_whitelist(&ctx, address)?,
            }
            format!("Added {address} to the {kind}")
        }
        ListAction::Remove { address } => {
            match kind {
                ListKind::Blacklist => ledger.remove_from_blacklist(&ctx, address)?,
                ListKind::Locklist => ledger.remove_from_locklist(&ctx, address)?,
                ListKind::Whitelist => ledger.remove_from_whitelist(&ctx, address)?,
            }
            format!("Removed {address} from the {kind}")
        }
    };
    session.save()?;
    done(globals, message)
}

fn print_addresses(globals: &Globals, addresses: &[Address]) -> anyhow::Result<()> {
    if let OutputFormat::Json = globals.format {
        return print_json(&addresses);
    }
    if addresses.is_empty() {
        println!("{}", "(empty)".dimmed());
    }
    for address in addresses {
        println!("{address}");
    }
    Ok(())
}

fn cmd_flip(globals: &Globals, args: DimensionArgs) -> anyhow::Result<()> {
    let mut session = Session::open(globals)?;
    let dimension = Dimension::from(args.dimension);
    session.ledger.flip_day(&session.ctx, dimension)?;
    session.save()?;
    done(globals, format!("Flipped {dimension} day"))
}

#[derive(Serialize)]
struct PageEntry {
    address: Address,
    value: u128,
}

fn cmd_drain(globals: &Globals, args: PageArgs) -> anyhow::Result<()> {
    let mut session = Session::open(globals)?;
    let dimension = Dimension::from(args.dimension);
    let page = session.ledger.drain_page(
        &session.ctx,
        dimension,
        args.max.unwrap_or(usize::MAX),
    )?;
    session.save()?;

    if let OutputFormat::Json = globals.format {
        let entries: Vec<PageEntry> = page
            .into_iter()
            .map(|(address, value)| PageEntry { address, value })
            .collect();
        return print_json(&entries);
    }
    if page.is_empty() {
        println!("{}", "No pending changes.".dimmed());
    }
    for (address, value) in page {
        println!("{}  {}", address.to_string().cyan(), value);
    }
    Ok(())
}

fn cmd_clear(globals: &Globals, args: PageArgs) -> anyhow::Result<()> {
    let mut session = Session::open(globals)?;
    let dimension = Dimension::from(args.dimension);
    let empty = session.ledger.clear_previous(
        &session.ctx,
        dimension,
        args.max.unwrap_or(usize::MAX),
    )?;
    let remaining = session.ledger.tracker(dimension).previous_entries().len();
    session.save()?;
    if empty {
        done(globals, format!("Previous {dimension} day cleared"))
    } else {
        done(
            globals,
            format!("Previous {dimension} day partly cleared, {remaining} entries left"),
        )
    }
}

fn cmd_known(globals: &Globals) -> anyhow::Result<()> {
    let session = Session::open(globals)?;
    print_addresses(globals, &session.ledger.known_addresses())
}

fn cmd_address(globals: &Globals, args: AddressArgs) -> anyhow::Result<()> {
    let kind = if args.contract {
        AddressKind::Contract
    } else {
        AddressKind::Account
    };
    let address = match &args.label {
        Some(label) => Address::derive(kind, label),
        None if args.contract => bail!("a contract address needs a label"),
        None => Address::ephemeral(),
    };
    match globals.format {
        OutputFormat::Json => print_json(&address),
        OutputFormat::Text => {
            println!("{address}");
            Ok(())
        }
    }
}
