use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum EnterpriseSubcommand {
    /// Register an enterprise
    Add {
        name: String,
        /// Supplies products (incoming exchanges)
        #[arg(long)]
        producer: bool,
        /// Sells to customers; required to coordinate a cycle
        #[arg(long)]
        distributor: bool,
    },
    /// List enterprises
    List,
}

pub fn run(root: &Path, subcmd: EnterpriseSubcommand, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    match subcmd {
        EnterpriseSubcommand::Add {
            name,
            producer,
            distributor,
        } => {
            let enterprise = ws
                .store
                .insert_enterprise(&name, producer, distributor)
                .context("failed to add enterprise")?;
            if json {
                print_json(&enterprise)?;
            } else {
                println!("Added enterprise [{}]: {}", enterprise.id, enterprise.name);
            }
        }
        EnterpriseSubcommand::List => {
            let enterprises = ws.store.list_enterprises()?;
            if json {
                print_json(&enterprises)?;
                return Ok(());
            }
            if enterprises.is_empty() {
                println!("No enterprises.");
                return Ok(());
            }
            let rows = enterprises
                .iter()
                .map(|e| {
                    vec![
                        e.id.to_string(),
                        e.name.clone(),
                        yes_no(e.is_producer),
                        yes_no(e.is_distributor),
                    ]
                })
                .collect();
            print_table(&["ID", "NAME", "PRODUCER", "DISTRIBUTOR"], rows);
        }
    }
    Ok(())
}

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}
