mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand, enterprise::EnterpriseSubcommand, order::OrderSubcommand,
    order_cycle::OrderCycleSubcommand, schedule::ScheduleSubcommand,
    subscription::SubscriptionSubcommand, user::UserSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cycles",
    about = "Administer order cycles, their schedules and the subscriptions that follow them",
    version,
    propagate_version = true
)]
struct Cli {
    /// Market root (default: auto-detect from .cycles/)
    #[arg(long, global = true, env = "CYCLES_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Id of the acting user
    #[arg(long, global = true, env = "CYCLES_USER")]
    user: Option<i64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .cycles/ with a config and an empty database
    Init,

    /// Manage enterprises
    Enterprise {
        #[command(subcommand)]
        subcommand: EnterpriseSubcommand,
    },

    /// Manage users and the enterprises they manage
    User {
        #[command(subcommand)]
        subcommand: UserSubcommand,
    },

    /// Manage schedules
    Schedule {
        #[command(subcommand)]
        subcommand: ScheduleSubcommand,
    },

    /// Manage subscriptions
    Subscription {
        #[command(subcommand)]
        subcommand: SubscriptionSubcommand,
    },

    /// Record customer orders
    Order {
        #[command(subcommand)]
        subcommand: OrderSubcommand,
    },

    /// Administer order cycles as the acting user
    OrderCycle {
        #[command(subcommand)]
        subcommand: OrderCycleSubcommand,
    },

    /// Inspect and validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Enterprise { subcommand } => cmd::enterprise::run(&root, subcommand, cli.json),
        Commands::User { subcommand } => cmd::user::run(&root, subcommand, cli.json),
        Commands::Schedule { subcommand } => cmd::schedule::run(&root, subcommand, cli.json),
        Commands::Subscription { subcommand } => {
            cmd::subscription::run(&root, subcommand, cli.json)
        }
        Commands::Order { subcommand } => cmd::order::run(&root, subcommand, cli.json),
        Commands::OrderCycle { subcommand } => {
            cmd::order_cycle::run(&root, subcommand, cli.user, cli.json)
        }
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
