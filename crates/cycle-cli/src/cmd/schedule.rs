use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum ScheduleSubcommand {
    /// Create a schedule, optionally attached to order cycles
    Add {
        name: String,
        /// Comma-separated order cycle ids
        #[arg(long, default_value = "")]
        order_cycles: String,
    },
    /// List schedules with the order cycles they cover
    List,
}

pub fn run(root: &Path, subcmd: ScheduleSubcommand, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    match subcmd {
        ScheduleSubcommand::Add { name, order_cycles } => {
            let ids = super::parse_ids(&order_cycles)?;
            let schedule = ws
                .store
                .insert_schedule(&name, &ids)
                .with_context(|| format!("failed to add schedule '{name}'"))?;
            if json {
                print_json(&serde_json::json!({
                    "id": schedule.id,
                    "name": schedule.name,
                    "order_cycle_ids": ids,
                }))?;
            } else {
                println!("Added schedule [{}]: {}", schedule.id, schedule.name);
            }
        }
        ScheduleSubcommand::List => {
            let schedules = ws.store.list_schedules()?;
            let ids = schedules.iter().map(|s| s.id).collect();
            let mut links = ws.store.order_cycle_ids_for_schedules(&ids)?;
            let listed: Vec<(_, Vec<i64>)> = schedules
                .into_iter()
                .map(|s| {
                    let cycles = links.remove(&s.id).unwrap_or_default();
                    (s, cycles.into_iter().collect())
                })
                .collect();

            if json {
                let value: Vec<_> = listed
                    .iter()
                    .map(|(s, cycles)| {
                        serde_json::json!({ "id": s.id, "name": s.name, "order_cycle_ids": cycles })
                    })
                    .collect();
                print_json(&value)?;
                return Ok(());
            }
            if listed.is_empty() {
                println!("No schedules.");
                return Ok(());
            }
            let rows = listed
                .iter()
                .map(|(s, cycles)| {
                    let cycles: Vec<String> = cycles.iter().map(|id| id.to_string()).collect();
                    vec![s.id.to_string(), s.name.clone(), cycles.join(",")]
                })
                .collect();
            print_table(&["ID", "NAME", "ORDER CYCLES"], rows);
        }
    }
    Ok(())
}
