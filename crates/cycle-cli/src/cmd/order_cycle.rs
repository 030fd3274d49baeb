use crate::output::{print_json, print_table};
use anyhow::Context;
use chrono::Utc;
use clap::{Args, Subcommand};
use cycle_core::{
    admin::{IndexQuery, NewOrderCycle, OrderCycleAdmin, Saved},
    error::CycleError,
    messages,
    order_cycle::{BulkEntry, OrderCycle, OrderCycleParams},
    reconcile::ScheduleSet,
    sync::TracingSync,
    types::{ListRole, UserId},
};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum OrderCycleSubcommand {
    /// List recent order cycles the user can access
    List {
        /// all, distributor or producer (default from config)
        #[arg(long)]
        role: Option<String>,
        /// Only cycles whose name contains this text
        #[arg(long)]
        name: Option<String>,
        /// Show cycles closing after this time instead of the recent window
        #[arg(long)]
        closes_after: Option<String>,
    },
    /// Show one order cycle
    Show { id: i64 },
    /// Pick a coordinator for a new order cycle
    New {
        #[arg(long)]
        coordinator: Option<i64>,
    },
    /// Create an order cycle
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        coordinator: i64,
        #[command(flatten)]
        fields: CycleFields,
    },
    /// Update an order cycle (the coordinator is fixed at create)
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: CycleFields,
    },
    /// Update names and dates of several order cycles from a JSON file
    BulkUpdate {
        /// JSON array of {id, name?, orders_open_at?, orders_close_at?}
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Copy an order cycle
    Clone { id: i64 },
    /// Queue emails to the producers of an order cycle
    Notify { id: i64 },
    /// Delete an order cycle unless schedules or orders still use it
    Destroy { id: i64 },
    /// List queued producer notifications
    Notifications,
}

#[derive(Args)]
pub struct CycleFields {
    /// When orders open (RFC 3339, `YYYY-MM-DD HH:MM` or `none`)
    #[arg(long)]
    opens_at: Option<String>,
    /// When orders close (RFC 3339, `YYYY-MM-DD HH:MM` or `none`)
    #[arg(long)]
    closes_at: Option<String>,
    /// Comma-separated schedule ids; empty detaches every schedule you may edit
    #[arg(long)]
    schedules: Option<String>,
    /// Comma-separated enterprise ids supplying the cycle
    #[arg(long)]
    incoming: Option<String>,
    /// Comma-separated enterprise ids distributing the cycle
    #[arg(long)]
    outgoing: Option<String>,
}

impl CycleFields {
    fn into_params(
        self,
        name: Option<String>,
        coordinator_id: Option<i64>,
    ) -> anyhow::Result<OrderCycleParams> {
        Ok(OrderCycleParams {
            name,
            orders_open_at: self.opens_at.as_deref().map(super::parse_time).transpose()?,
            orders_close_at: self.closes_at.as_deref().map(super::parse_time).transpose()?,
            coordinator_id,
            schedule_ids: self
                .schedules
                .as_deref()
                .map(|s| super::parse_ids(s).map(|ids| ids.into_iter().collect::<ScheduleSet>()))
                .transpose()?,
            incoming_exchanges: self.incoming.as_deref().map(super::parse_ids).transpose()?,
            outgoing_exchanges: self.outgoing.as_deref().map(super::parse_ids).transpose()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(
    root: &Path,
    subcmd: OrderCycleSubcommand,
    user: Option<UserId>,
    json: bool,
) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let result = match subcmd {
        OrderCycleSubcommand::Notifications => notifications(&ws, json),
        other => run_as_user(&ws, other, user, json),
    };
    if json {
        if let Err(err) = &result {
            print_error_list(err)?;
        }
    }
    result
}

/// Validation and missing-data failures are reported on stdout as
/// `{"errors": [...]}` so `--json` callers get each message separately.
fn print_error_list(err: &anyhow::Error) -> anyhow::Result<()> {
    match err.downcast_ref::<CycleError>() {
        Some(e @ (CycleError::ValidationFailed(_) | CycleError::NoBulkData)) => {
            print_json(&serde_json::json!({ "errors": e.full_messages() }))
        }
        _ => Ok(()),
    }
}

fn run_as_user(
    ws: &super::Workspace,
    subcmd: OrderCycleSubcommand,
    user: Option<UserId>,
    json: bool,
) -> anyhow::Result<()> {
    let actor = super::acting_user(&ws.store, user)?;
    let sync = TracingSync;
    let admin = OrderCycleAdmin::new(&ws.store, &actor, &sync)
        .with_recent_window_days(ws.config.index.recent_window_days);

    match subcmd {
        OrderCycleSubcommand::List {
            role,
            name,
            closes_after,
        } => {
            let role = match role {
                Some(r) => r.parse::<ListRole>()?,
                None => ws.config.index.default_role,
            };
            let closes_after = closes_after.as_deref().map(super::parse_time).transpose()?;
            let query = IndexQuery {
                role,
                name_contains: name,
                closes_after: closes_after.flatten(),
            };
            list(&admin, &query, json)
        }
        OrderCycleSubcommand::Show { id } => show(&admin, id, json),
        OrderCycleSubcommand::New { coordinator } => new(&admin, coordinator, json),
        OrderCycleSubcommand::Create {
            name,
            coordinator,
            fields,
        } => {
            let params = fields.into_params(Some(name), Some(coordinator))?;
            let saved = admin.create(params)?;
            report_saved(&saved, messages::CREATE_NOTICE, json)
        }
        OrderCycleSubcommand::Update {
            id,
            name,
            fields,
        } => {
            let params = fields.into_params(name, None)?;
            let saved = admin.update(id, params)?;
            report_saved(&saved, messages::UPDATE_NOTICE, json)
        }
        OrderCycleSubcommand::BulkUpdate { file } => bulk_update(&admin, file.as_deref(), json),
        OrderCycleSubcommand::Clone { id } => clone(&admin, id, json),
        OrderCycleSubcommand::Notify { id } => {
            let job = admin.notify_producers(id)?;
            if json {
                print_json(&job)?;
            } else {
                println!("{}", messages::EMAIL_TO_PRODUCERS_NOTICE);
            }
            Ok(())
        }
        OrderCycleSubcommand::Destroy { id } => destroy(&admin, id, json),
        OrderCycleSubcommand::Notifications => notifications(ws, json),
    }
}

// ---------------------------------------------------------------------------
// list / show / new
// ---------------------------------------------------------------------------

fn list(admin: &OrderCycleAdmin<'_>, query: &IndexQuery, json: bool) -> anyhow::Result<()> {
    let now = Utc::now();
    let cycles = admin.index(query, now)?;

    if json {
        let value: Vec<_> = cycles
            .iter()
            .map(|oc| {
                serde_json::json!({
                    "order_cycle": oc,
                    "status": oc.status(now),
                })
            })
            .collect();
        print_json(&value)?;
        return Ok(());
    }

    if cycles.is_empty() {
        println!("No order cycles.");
        return Ok(());
    }
    let rows = cycles
        .iter()
        .map(|oc| {
            vec![
                oc.id.to_string(),
                oc.name.clone(),
                oc.status(now).to_string(),
                super::format_time(oc.orders_open_at),
                super::format_time(oc.orders_close_at),
                join_ids(&oc.schedule_ids),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "STATUS", "OPENS", "CLOSES", "SCHEDULES"], rows);
    Ok(())
}

fn show(admin: &OrderCycleAdmin<'_>, id: i64, json: bool) -> anyhow::Result<()> {
    let oc = admin.show(id)?;
    if json {
        print_json(&oc)?;
    } else {
        print_cycle(&oc);
    }
    Ok(())
}

fn new(admin: &OrderCycleAdmin<'_>, coordinator: Option<i64>, json: bool) -> anyhow::Result<()> {
    let draft = admin.new_order_cycle(coordinator)?;
    if json {
        print_json(&draft)?;
        return Ok(());
    }
    match draft {
        NewOrderCycle::Ready { order_cycle } => {
            let coordinator = order_cycle
                .coordinator_id
                .map(|id| id.to_string())
                .unwrap_or_default();
            println!("Coordinator: {coordinator}");
        }
        NewOrderCycle::ChooseCoordinator { candidates, notice } => {
            if let Some(notice) = notice {
                println!("{notice}");
            }
            println!("Choose a coordinator with --coordinator:");
            for e in candidates {
                println!("  [{}] {}", e.id, e.name);
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// bulk-update
// ---------------------------------------------------------------------------

fn bulk_update(admin: &OrderCycleAdmin<'_>, file: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let entries: Option<Vec<BulkEntry>> = match file {
        Some(path) => {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            if data.trim().is_empty() {
                None
            } else {
                serde_json::from_str(&data)
                    .with_context(|| format!("failed to parse {}", path.display()))?
            }
        }
        None => None,
    };

    let updated = admin.bulk_update(entries)?;
    if json {
        print_json(&updated)?;
    } else {
        println!("{} ({} order cycles)", messages::UPDATE_NOTICE, updated.len());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// clone / destroy
// ---------------------------------------------------------------------------

fn clone(admin: &OrderCycleAdmin<'_>, id: i64, json: bool) -> anyhow::Result<()> {
    let source = admin.show(id)?;
    let copy = admin.clone_order_cycle(id)?;
    if json {
        print_json(&copy)?;
    } else {
        println!("{}", messages::clone_notice(&source.name));
        println!("  [{}] {}", copy.id, copy.name);
    }
    Ok(())
}

fn destroy(admin: &OrderCycleAdmin<'_>, id: i64, json: bool) -> anyhow::Result<()> {
    let outcome = admin.destroy(id)?;
    if json {
        print_json(&serde_json::json!({
            "id": id,
            "outcome": outcome,
            "message": outcome.message(),
        }))?;
    } else if outcome.is_destroyed() {
        println!("{}", outcome.message());
    }
    if !outcome.is_destroyed() {
        anyhow::bail!("{}", outcome.message());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// notifications
// ---------------------------------------------------------------------------

fn notifications(ws: &super::Workspace, json: bool) -> anyhow::Result<()> {
    let jobs = ws.store.producer_notifications()?;
    if json {
        print_json(&jobs)?;
        return Ok(());
    }
    if jobs.is_empty() {
        println!("No producer notifications queued.");
        return Ok(());
    }
    let rows = jobs
        .iter()
        .map(|j| {
            vec![
                j.id.to_string(),
                j.order_cycle_id.to_string(),
                super::format_time(Some(j.enqueued_at)),
            ]
        })
        .collect();
    print_table(&["ID", "ORDER CYCLE", "ENQUEUED"], rows);
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn report_saved(saved: &Saved, notice: &str, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(saved)?;
        return Ok(());
    }
    println!("{notice}");
    print_cycle(&saved.order_cycle);
    if !saved.resynced.is_empty() {
        let ids: Vec<String> = saved.resynced.iter().map(|s| s.id.to_string()).collect();
        println!("Resynced subscriptions: {}", ids.join(","));
    }
    Ok(())
}

fn print_cycle(oc: &OrderCycle) {
    println!("[{}] {}", oc.id, oc.name);
    println!(
        "  coordinator: {}",
        oc.coordinator_id.map(|id| id.to_string()).unwrap_or_default()
    );
    println!("  opens:       {}", super::format_time(oc.orders_open_at));
    println!("  closes:      {}", super::format_time(oc.orders_close_at));
    println!("  schedules:   {}", join_ids(&oc.schedule_ids));
    println!("  incoming:    {}", join_ids(&oc.enterprise_ids(true)));
    println!("  outgoing:    {}", join_ids(&oc.enterprise_ids(false)));
}

fn join_ids<'a>(ids: impl IntoIterator<Item = &'a i64>) -> String {
    ids.into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
