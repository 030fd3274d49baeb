#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn cycles(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("cycles").unwrap();
    cmd.current_dir(dir.path())
        .env("CYCLES_ROOT", dir.path())
        .env_remove("CYCLES_USER")
        .env_remove("RUST_LOG");
    cmd
}

fn json(mut cmd: Command, args: &[&str]) -> Value {
    let out = cmd.args(args).arg("--json").output().unwrap();
    assert!(
        out.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).unwrap()
}

fn id(value: &Value) -> i64 {
    value["id"].as_i64().unwrap()
}

fn ids(value: &Value) -> Vec<i64> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect()
}

struct Market {
    dir: TempDir,
    manager: i64,
    admin: i64,
    hub: i64,
    farm: i64,
    rival: i64,
}

impl Market {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        cycles(&dir).arg("init").assert().success();

        let hub = id(&json(cycles(&dir), &["enterprise", "add", "Hub", "--distributor"]));
        let farm = id(&json(cycles(&dir), &["enterprise", "add", "Farm", "--producer"]));
        let rival = id(&json(cycles(&dir), &["enterprise", "add", "Rival", "--distributor"]));
        let manager = id(&json(cycles(&dir), &["user", "add", "manager@example.com"]));
        let admin = id(&json(cycles(&dir), &["user", "add", "admin@example.com", "--admin"]));
        for enterprise in [hub, farm] {
            cycles(&dir)
                .args([
                    "user",
                    "manage",
                    manager.to_string().as_str(),
                    enterprise.to_string().as_str(),
                ])
                .assert()
                .success();
        }

        Market {
            dir,
            manager,
            admin,
            hub,
            farm,
            rival,
        }
    }

    fn cmd(&self) -> Command {
        cycles(&self.dir)
    }

    fn as_user(&self, user: i64) -> Command {
        let mut cmd = cycles(&self.dir);
        cmd.env("CYCLES_USER", user.to_string());
        cmd
    }

    fn create_cycle(&self, user: i64, name: &str, coordinator: i64, extra: &[&str]) -> i64 {
        let coordinator = coordinator.to_string();
        let mut args = vec![
            "order-cycle",
            "create",
            "--name",
            name,
            "--coordinator",
            coordinator.as_str(),
        ];
        args.extend_from_slice(extra);
        id(&json(self.as_user(user), &args)["order_cycle"])
    }

    fn schedule(&self, name: &str, order_cycles: &[i64]) -> i64 {
        let list: Vec<String> = order_cycles.iter().map(|id| id.to_string()).collect();
        id(&json(
            self.cmd(),
            &["schedule", "add", name, "--order-cycles", list.join(",").as_str()],
        ))
    }
}

// ---------------------------------------------------------------------------
// cycles init / config
// ---------------------------------------------------------------------------

#[test]
fn init_creates_config_and_database() {
    let dir = TempDir::new().unwrap();
    cycles(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("created: .cycles/config.yaml"));

    assert!(dir.path().join(".cycles/config.yaml").exists());
    assert!(dir.path().join(".cycles/cycles.db").exists());
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    cycles(&dir).arg("init").assert().success();
    cycles(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:  .cycles/config.yaml"));
}

#[test]
fn commands_require_init() {
    let dir = TempDir::new().unwrap();
    cycles(&dir)
        .args(["enterprise", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn config_validate_passes_on_defaults() {
    let dir = TempDir::new().unwrap();
    cycles(&dir).arg("init").assert().success();
    cycles(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_reports_errors() {
    let dir = TempDir::new().unwrap();
    cycles(&dir).arg("init").assert().success();
    std::fs::write(
        dir.path().join(".cycles/config.yaml"),
        "version: 7\ndatabase: cycles.db\n",
    )
    .unwrap();
    cycles(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("unsupported config version 7"));
}

// ---------------------------------------------------------------------------
// order-cycle create / update
// ---------------------------------------------------------------------------

#[test]
fn order_cycle_commands_require_a_user() {
    let m = Market::new();
    m.cmd()
        .args(["order-cycle", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--user"));
}

#[test]
fn create_rejects_unpermitted_coordinator() {
    let m = Market::new();
    m.as_user(m.manager)
        .args([
            "order-cycle",
            "create",
            "--name",
            "Weekly",
            "--coordinator",
            m.rival.to_string().as_str(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "You don't have permission to create an order cycle coordinated by that enterprise",
        ));
}

#[test]
fn create_reports_validation_errors() {
    let m = Market::new();
    m.as_user(m.manager)
        .args([
            "order-cycle",
            "create",
            "--name",
            "Weekly",
            "--coordinator",
            m.hub.to_string().as_str(),
            "--opens-at",
            "2026-03-02 10:00",
            "--closes-at",
            "2026-03-01 10:00",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Orders close at must be after orders open at",
        ));
}

#[test]
fn json_validation_errors_are_listed_separately() {
    let m = Market::new();
    let out = m
        .as_user(m.manager)
        .args([
            "order-cycle",
            "create",
            "--name",
            "",
            "--coordinator",
            m.hub.to_string().as_str(),
            "--opens-at",
            "2026-03-02",
            "--closes-at",
            "2026-03-01",
            "--json",
        ])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let body: Value = serde_json::from_slice(&out.stdout).unwrap();
    let errors: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e.as_str().unwrap())
        .collect();
    assert_eq!(
        errors,
        vec![
            "Name can't be blank",
            "Orders close at must be after orders open at",
        ]
    );
}

#[test]
fn json_bulk_update_without_data_lists_the_error() {
    let m = Market::new();
    let out = m
        .as_user(m.manager)
        .args(["order-cycle", "bulk-update", "--json"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let body: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(
        body["errors"][0],
        "Hm, something went wrong. No order cycle data found."
    );
}

#[test]
fn update_has_no_coordinator_flag() {
    let m = Market::new();
    let own = m.create_cycle(m.manager, "Own", m.hub, &[]);
    m.as_user(m.manager)
        .args([
            "order-cycle",
            "update",
            own.to_string().as_str(),
            "--coordinator",
            m.rival.to_string().as_str(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--coordinator"));
}

#[test]
fn update_keeps_schedules_the_user_cannot_edit() {
    let m = Market::new();
    let farm = m.farm.to_string();
    // Rival coordinates the shared cycle; the manager takes part through Farm.
    let shared = m.create_cycle(m.admin, "Shared", m.rival, &["--incoming", farm.as_str()]);
    let own = m.create_cycle(m.manager, "Own", m.hub, &[]);

    let s1 = m.schedule("S1", &[shared]);
    let s2 = m.schedule("S2", &[shared]);
    let s3 = m.schedule("S3", &[shared, own]);
    let s4 = m.schedule("S4", &[own]);
    m.schedule("S5", &[own]);
    let sub4 = id(&json(
        m.cmd(),
        &[
            "subscription",
            "add",
            "--schedule",
            s4.to_string().as_str(),
            "--shop",
            m.hub.to_string().as_str(),
            "--email",
            "customer@example.com",
        ],
    ));

    let requested = format!("{s2},{s3},{s4}");
    let saved = json(
        m.as_user(m.manager),
        &[
            "order-cycle",
            "update",
            shared.to_string().as_str(),
            "--schedules",
            requested.as_str(),
            "--name",
            "Renamed",
        ],
    );
    assert_eq!(ids(&saved["order_cycle"]["schedule_ids"]), vec![s1, s2, s3, s4]);
    assert_eq!(saved["order_cycle"]["name"], "Shared");
    let resynced: Vec<i64> = saved["resynced"]
        .as_array()
        .unwrap()
        .iter()
        .map(id)
        .collect();
    assert_eq!(resynced, vec![sub4]);

    let shown = json(m.as_user(m.manager), &["order-cycle", "show", shared.to_string().as_str()]);
    assert_eq!(ids(&shown["schedule_ids"]), vec![s1, s2, s3, s4]);
}

#[test]
fn update_without_schedules_leaves_them_alone() {
    let m = Market::new();
    let own = m.create_cycle(m.manager, "Own", m.hub, &[]);
    let s = m.schedule("S", &[own]);

    let saved = json(
        m.as_user(m.manager),
        &["order-cycle", "update", own.to_string().as_str(), "--name", "Own v2"],
    );
    assert_eq!(saved["order_cycle"]["name"], "Own v2");
    assert_eq!(ids(&saved["order_cycle"]["schedule_ids"]), vec![s]);

    let cleared = json(
        m.as_user(m.manager),
        &["order-cycle", "update", own.to_string().as_str(), "--schedules", ""],
    );
    assert!(ids(&cleared["order_cycle"]["schedule_ids"]).is_empty());
}

// ---------------------------------------------------------------------------
// order-cycle destroy
// ---------------------------------------------------------------------------

#[test]
fn destroy_refuses_cycle_with_schedule() {
    let m = Market::new();
    let own = m.create_cycle(m.manager, "Own", m.hub, &[]);
    m.schedule("Weekly box", &[own]);

    m.as_user(m.manager)
        .args(["order-cycle", "destroy", own.to_string().as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("linked to a schedule"));
    m.as_user(m.manager)
        .args(["order-cycle", "show", own.to_string().as_str()])
        .assert()
        .success();
}

#[test]
fn destroy_refuses_cycle_with_orders() {
    let m = Market::new();
    let own = m.create_cycle(m.manager, "Own", m.hub, &[]);
    m.cmd()
        .args(["order", "add", own.to_string().as_str(), "--email", "buyer@example.com"])
        .assert()
        .success();

    m.as_user(m.manager)
        .args(["order-cycle", "destroy", own.to_string().as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("selected by a customer"));
    m.as_user(m.manager)
        .args(["order-cycle", "show", own.to_string().as_str()])
        .assert()
        .success();
}

#[test]
fn destroy_removes_unused_cycle() {
    let m = Market::new();
    let own = m.create_cycle(m.manager, "Own", m.hub, &[]);

    m.as_user(m.manager)
        .args(["order-cycle", "destroy", own.to_string().as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("successfully removed"));
    m.as_user(m.manager)
        .args(["order-cycle", "show", own.to_string().as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("order cycle not found"));
}

// ---------------------------------------------------------------------------
// order-cycle list / bulk-update / clone / notify
// ---------------------------------------------------------------------------

#[test]
fn list_shows_only_accessible_cycles() {
    let m = Market::new();
    m.create_cycle(m.manager, "Own", m.hub, &[]);
    m.create_cycle(m.admin, "Theirs", m.rival, &[]);

    let listed = json(m.as_user(m.manager), &["order-cycle", "list"]);
    let names: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["order_cycle"]["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Own"]);

    let all = json(m.as_user(m.admin), &["order-cycle", "list"]);
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[test]
fn bulk_update_without_data_fails() {
    let m = Market::new();
    m.as_user(m.manager)
        .args(["order-cycle", "bulk-update"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No order cycle data found"));
}

#[test]
fn bulk_update_saves_managed_cycles() {
    let m = Market::new();
    let own = m.create_cycle(m.manager, "Own", m.hub, &[]);
    let theirs = m.create_cycle(m.admin, "Theirs", m.rival, &[]);
    let file = m.dir.path().join("bulk.json");
    std::fs::write(
        &file,
        format!(
            r#"[{{"id": {own}, "name": "Own v2", "orders_open_at": "2026-03-01T10:00:00Z", "orders_close_at": "2026-03-08T10:00:00Z"}},
               {{"id": {theirs}, "name": "Hijacked"}}]"#
        ),
    )
    .unwrap();

    let updated = json(
        m.as_user(m.manager),
        &["order-cycle", "bulk-update", "--file", file.to_str().unwrap()],
    );
    assert_eq!(updated.as_array().unwrap().len(), 1);

    let shown = json(m.as_user(m.admin), &["order-cycle", "show", theirs.to_string().as_str()]);
    assert_eq!(shown["name"], "Theirs");
    let shown = json(m.as_user(m.manager), &["order-cycle", "show", own.to_string().as_str()]);
    assert_eq!(shown["name"], "Own v2");
}

#[test]
fn clone_copies_without_schedules() {
    let m = Market::new();
    let farm = m.farm.to_string();
    let own = m.create_cycle(m.manager, "Weekly", m.hub, &["--incoming", farm.as_str()]);
    m.schedule("Box", &[own]);

    m.as_user(m.manager)
        .args(["order-cycle", "clone", own.to_string().as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Your order cycle Weekly has been cloned.",
        ))
        .stdout(predicate::str::contains("COPY OF Weekly"));
}

#[test]
fn notify_enqueues_a_job() {
    let m = Market::new();
    let own = m.create_cycle(m.manager, "Weekly", m.hub, &[]);

    m.as_user(m.manager)
        .args(["order-cycle", "notify", own.to_string().as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("queued for sending"));

    let jobs = json(m.cmd(), &["order-cycle", "notifications"]);
    assert_eq!(jobs.as_array().unwrap().len(), 1);
    assert_eq!(jobs[0]["order_cycle_id"].as_i64(), Some(own));
}

#[test]
fn new_picks_the_only_coordinator() {
    let m = Market::new();
    let draft = json(m.as_user(m.manager), &["order-cycle", "new"]);
    assert_eq!(draft["status"], "ready");
    assert_eq!(draft["order_cycle"]["coordinator_id"].as_i64(), Some(m.hub));
}
