use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum UserSubcommand {
    /// Register a user
    Add {
        email: String,
        /// Grant access to every enterprise
        #[arg(long)]
        admin: bool,
    },
    /// Let a user manage an enterprise
    Manage { user_id: i64, enterprise_id: i64 },
}

pub fn run(root: &Path, subcmd: UserSubcommand, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    match subcmd {
        UserSubcommand::Add { email, admin } => {
            let user = ws
                .store
                .insert_user(&email, admin)
                .with_context(|| format!("failed to add user '{email}'"))?;
            if json {
                print_json(&user)?;
            } else {
                println!("Added user [{}]: {}", user.id, user.email);
            }
        }
        UserSubcommand::Manage {
            user_id,
            enterprise_id,
        } => {
            ws.store.add_manager(user_id, enterprise_id)?;
            if json {
                print_json(&serde_json::json!({
                    "user_id": user_id,
                    "enterprise_id": enterprise_id,
                }))?;
            } else {
                println!("User {user_id} now manages enterprise {enterprise_id}");
            }
        }
    }
    Ok(())
}
