use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use crm_server::{
    config::AppConfig,
    http::{self, AppState, ServeConfig},
};
use entity::{ContactStatus, RecordId, Stage};
use platform_obs::{ObsConfig, init_tracing, shutdown_tracing};
use platform_store::StoreSettings;
use products_crm::{
    ActivityKind, CompanyFilter, ContactFilter, CrmStores, DashboardStats, DealFilter,
    DragOutcome, PipelineBoard, TracingNotifier, industries, recent_activity, seed_crm_demo,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "crm-server", version, about = "CRM pipeline backend and board tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the record API over in-memory stores.
    Serve(ServeCommand),
    /// Print the pipeline board from the configured record service.
    Board {
        /// Only print this column.
        #[arg(long)]
        stage: Option<Stage>,
        /// Only print deals whose name or owner contains this text.
        #[arg(long)]
        search: Option<String>,
    },
    /// Move one deal to another stage, exactly as a board drop would.
    Move {
        #[arg(long)]
        deal: RecordId,
        #[arg(long)]
        to: Stage,
    },
    /// Print the dashboard figures and the latest activity.
    Stats {
        #[arg(long, default_value_t = 5)]
        recent: usize,
    },
    /// List contacts.
    Contacts {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        status: Option<ContactStatus>,
    },
    /// List companies, optionally narrowed to one industry.
    Companies {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        industry: Option<String>,
    },
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
    #[arg(long, help = "Start with empty stores even when SEED_DEMO is set")]
    no_seed: bool,
}

impl From<&ServeCommand> for ServeConfig {
    fn from(value: &ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(ObsConfig {
        with_target: matches!(cli.command, Command::Serve(_)),
        ..ObsConfig::service("crm-server")
    })?;
    let result = match cli.command {
        Command::Serve(cmd) => run_server(cmd).await,
        Command::Board { stage, search } => print_board(DealFilter { search, stage }).await,
        Command::Move { deal, to } => move_deal(deal, to).await,
        Command::Stats { recent } => print_stats(recent).await,
        Command::Contacts { search, status } => {
            print_contacts(ContactFilter { search, status }).await
        }
        Command::Companies { search, industry } => {
            print_companies(CompanyFilter { search, industry }).await
        }
    };
    shutdown_tracing();
    result
}

async fn run_server(cmd: ServeCommand) -> Result<()> {
    let config = Arc::new(AppConfig::load()?);
    let stores = CrmStores::in_memory();
    if config.seed_demo && !cmd.no_seed {
        seed_crm_demo(&stores)
            .await
            .context("failed to seed demo data")?;
    }
    let state = AppState { stores, config };
    http::serve((&cmd).into(), state).await
}

async fn open_board() -> Result<PipelineBoard> {
    let settings = StoreSettings::from_env();
    info!(base_url = %settings.base_url, "connecting to record service");
    let stores = CrmStores::http(&settings).context("invalid record service settings")?;
    let board = PipelineBoard::new(stores, Arc::new(TracingNotifier));
    board.load().await.context("failed to load the board")?;
    Ok(board)
}

async fn print_board(filter: DealFilter) -> Result<()> {
    let board = open_board().await?;
    let snapshot = board.snapshot();
    let lookups = snapshot.lookups();
    for column in snapshot.columns().iter() {
        if filter.stage.is_some_and(|stage| stage != column.stage) {
            continue;
        }
        println!("{}: {}", column.stage, column.caption());
        for deal in column.deals.iter().filter(|deal| filter.matches(deal)) {
            let card = lookups.card(deal);
            println!(
                "  #{:<4} {:<28} {:>12}  {} / {}",
                card.id.get(),
                card.name,
                card.amount,
                card.contact,
                card.company
            );
        }
    }
    Ok(())
}

async fn move_deal(deal: RecordId, to: Stage) -> Result<()> {
    let board = open_board().await?;
    match board.move_deal(deal, Some(to)).await? {
        DragOutcome::Moved(moved) => {
            println!("deal {} moved from {} to {}", moved.deal_id, moved.from, moved.to);
            Ok(())
        }
        DragOutcome::Failed { attempted, reason } => {
            bail!("deal {} was not moved to {}: {reason}", attempted.deal_id, attempted.to)
        }
        DragOutcome::Cancelled => Ok(()),
    }
}

async fn print_stats(recent: usize) -> Result<()> {
    let board = open_board().await?;
    let snapshot = board.snapshot();
    let stats = DashboardStats::compute(&snapshot.deals, &snapshot.contacts, &snapshot.companies);
    for card in stats.stat_cards() {
        println!("{:<16} {}", card.label, card.value);
    }
    let activity = recent_activity(&snapshot.deals, &snapshot.contacts, recent);
    if !activity.is_empty() {
        println!();
        println!("Recent activity");
    }
    for item in activity {
        let kind = match item.kind {
            ActivityKind::Deal => "deal",
            ActivityKind::Contact => "contact",
        };
        println!(
            "  {} {:<8} {:<36} {}",
            item.at.format("%Y-%m-%d %H:%M"),
            kind,
            item.title,
            item.subtitle
        );
    }
    Ok(())
}

async fn print_contacts(filter: ContactFilter) -> Result<()> {
    let board = open_board().await?;
    let snapshot = board.snapshot();
    let lookups = snapshot.lookups();
    for contact in filter.apply(&snapshot.contacts) {
        println!(
            "  #{:<4} {:<24} {:<28} {:<9} {}",
            contact.id.get(),
            contact.full_name(),
            contact.email,
            contact.status.label(),
            lookups.company_label(contact.company_id)
        );
    }
    Ok(())
}

async fn print_companies(filter: CompanyFilter) -> Result<()> {
    let board = open_board().await?;
    let snapshot = board.snapshot();
    if filter.industry.is_none() {
        println!("industries: {}", industries(&snapshot.companies).join(", "));
    }
    for company in filter.apply(&snapshot.companies) {
        println!(
            "  #{:<4} {:<28} {:<16} {}",
            company.id.get(),
            company.name,
            company.industry,
            company.website
        );
    }
    Ok(())
}
