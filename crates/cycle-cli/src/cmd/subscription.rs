use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum SubscriptionSubcommand {
    /// Subscribe a customer of a shop to a schedule
    Add {
        #[arg(long)]
        schedule: i64,
        #[arg(long)]
        shop: i64,
        #[arg(long)]
        email: String,
    },
}

pub fn run(root: &Path, subcmd: SubscriptionSubcommand, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    match subcmd {
        SubscriptionSubcommand::Add {
            schedule,
            shop,
            email,
        } => {
            let subscription = ws
                .store
                .insert_subscription(schedule, shop, &email)
                .context("failed to add subscription")?;
            if json {
                print_json(&subscription)?;
            } else {
                println!(
                    "Added subscription [{}] on schedule {schedule} for {email}",
                    subscription.id
                );
            }
        }
    }
    Ok(())
}
