use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum OrderSubcommand {
    /// Record a customer order placed in an order cycle
    Add {
        order_cycle_id: i64,
        #[arg(long)]
        email: String,
    },
}

pub fn run(root: &Path, subcmd: OrderSubcommand, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    match subcmd {
        OrderSubcommand::Add {
            order_cycle_id,
            email,
        } => {
            let order = ws
                .store
                .insert_order(order_cycle_id, &email)
                .with_context(|| format!("failed to add order to order cycle {order_cycle_id}"))?;
            if json {
                print_json(&order)?;
            } else {
                println!("Added order [{}] to order cycle {order_cycle_id}", order.id);
            }
        }
    }
    Ok(())
}
