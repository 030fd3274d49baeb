use anyhow::Context;
use cycle_core::{config::Config, io, paths, store::Store};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing cycles in: {}", root.display());

    let dir = paths::cycles_dir(root);
    io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let config = if paths::config_path(root).exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
        Config::load(root).context("failed to load config")?
    } else {
        let cfg = Config::default();
        cfg.save(root).context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
        cfg
    };

    let db = config.database_path(root);
    let existed = db.exists();
    Store::open(&db).with_context(|| format!("failed to create database {}", db.display()))?;
    if existed {
        println!("  exists:  {}", db.display());
    } else {
        println!("  created: {}", db.display());
    }

    Ok(())
}
