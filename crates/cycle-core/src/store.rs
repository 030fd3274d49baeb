//! SQLite-backed storage.
//!
//! Foreign keys are enforced. `orders.order_cycle_id` has no cascade, so
//! deleting a cycle that orders reference fails with
//! `SQLITE_CONSTRAINT_FOREIGNKEY`; schedule links and exchanges cascade.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};
use tracing::debug;

use crate::destroy::{Deletion, OrderCycleDeleter};
use crate::enterprise::{Enterprise, User};
use crate::error::{CycleError, Result};
use crate::order_cycle::{Exchange, OrderCycle};
use crate::reconcile::{ScheduleLookup, ScheduleSet};
use crate::schedule::{Order, Schedule, Subscription};
use crate::types::{EnterpriseId, OrderCycleId, ScheduleId, UserId};

const SCHEMA: &str = r#"
    PRAGMA foreign_keys = ON;
    CREATE TABLE IF NOT EXISTS enterprises (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        is_producer INTEGER NOT NULL DEFAULT 0,
        is_distributor INTEGER NOT NULL DEFAULT 0
    );
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        admin INTEGER NOT NULL DEFAULT 0
    );
    CREATE TABLE IF NOT EXISTS enterprise_roles (
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        enterprise_id INTEGER NOT NULL REFERENCES enterprises(id) ON DELETE CASCADE,
        PRIMARY KEY (user_id, enterprise_id)
    );
    CREATE TABLE IF NOT EXISTS order_cycles (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        orders_open_at TEXT,
        orders_close_at TEXT,
        coordinator_id INTEGER REFERENCES enterprises(id),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS exchanges (
        order_cycle_id INTEGER NOT NULL REFERENCES order_cycles(id) ON DELETE CASCADE,
        enterprise_id INTEGER NOT NULL REFERENCES enterprises(id),
        incoming INTEGER NOT NULL,
        PRIMARY KEY (order_cycle_id, enterprise_id, incoming)
    );
    CREATE TABLE IF NOT EXISTS schedules (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS order_cycle_schedules (
        order_cycle_id INTEGER NOT NULL REFERENCES order_cycles(id) ON DELETE CASCADE,
        schedule_id INTEGER NOT NULL REFERENCES schedules(id) ON DELETE CASCADE,
        PRIMARY KEY (order_cycle_id, schedule_id)
    );
    CREATE TABLE IF NOT EXISTS subscriptions (
        id INTEGER PRIMARY KEY,
        schedule_id INTEGER NOT NULL REFERENCES schedules(id),
        shop_id INTEGER NOT NULL REFERENCES enterprises(id),
        customer_email TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY,
        order_cycle_id INTEGER NOT NULL REFERENCES order_cycles(id),
        customer_email TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS producer_notifications (
        id INTEGER PRIMARY KEY,
        order_cycle_id INTEGER NOT NULL REFERENCES order_cycles(id) ON DELETE CASCADE,
        enqueued_at TEXT NOT NULL
    );
"#;

const ORDER_CYCLE_COLUMNS: &str =
    "id, name, orders_open_at, orders_close_at, coordinator_id, created_at, updated_at";

/// A queued "email the producers" request.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ProducerNotification {
    pub id: i64,
    pub order_cycle_id: OrderCycleId,
    pub enqueued_at: DateTime<Utc>,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "opening store");
        let conn = Connection::open(path)?;
        Self::initialize(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // -----------------------------------------------------------------------
    // Enterprises and users
    // -----------------------------------------------------------------------

    pub fn insert_enterprise(
        &self,
        name: &str,
        is_producer: bool,
        is_distributor: bool,
    ) -> Result<Enterprise> {
        self.conn.execute(
            "INSERT INTO enterprises (name, is_producer, is_distributor) VALUES (?1, ?2, ?3)",
            params![name, is_producer, is_distributor],
        )?;
        Ok(Enterprise {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            is_producer,
            is_distributor,
        })
    }

    pub fn find_enterprise(&self, id: EnterpriseId) -> Result<Enterprise> {
        self.conn
            .query_row(
                "SELECT id, name, is_producer, is_distributor FROM enterprises WHERE id = ?1",
                params![id],
                enterprise_from_row,
            )
            .optional()?
            .ok_or(CycleError::EnterpriseNotFound(id))
    }

    pub fn list_enterprises(&self) -> Result<Vec<Enterprise>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, is_producer, is_distributor FROM enterprises ORDER BY id")?;
        let rows = stmt.query_map([], enterprise_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn insert_user(&self, email: &str, admin: bool) -> Result<User> {
        self.conn.execute(
            "INSERT INTO users (email, admin) VALUES (?1, ?2)",
            params![email, admin],
        )?;
        Ok(User {
            id: self.conn.last_insert_rowid(),
            email: email.to_string(),
            admin,
        })
    }

    pub fn find_user(&self, id: UserId) -> Result<User> {
        self.conn
            .query_row(
                "SELECT id, email, admin FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        admin: row.get(2)?,
                    })
                },
            )
            .optional()?
            .ok_or(CycleError::UserNotFound(id))
    }

    /// Grant `user_id` management of `enterprise_id`. Idempotent.
    pub fn add_manager(&self, user_id: UserId, enterprise_id: EnterpriseId) -> Result<()> {
        self.find_user(user_id)?;
        self.find_enterprise(enterprise_id)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO enterprise_roles (user_id, enterprise_id) VALUES (?1, ?2)",
            params![user_id, enterprise_id],
        )?;
        Ok(())
    }

    pub fn enterprise_ids_managed_by(&self, user_id: UserId) -> Result<BTreeSet<EnterpriseId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT enterprise_id FROM enterprise_roles WHERE user_id = ?1")?;
        let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<BTreeSet<_>>>()?)
    }

    // -----------------------------------------------------------------------
    // Schedules, subscriptions, orders
    // -----------------------------------------------------------------------

    /// Create a schedule attached to the given order cycles.
    pub fn insert_schedule(&self, name: &str, order_cycle_ids: &[OrderCycleId]) -> Result<Schedule> {
        for &id in order_cycle_ids {
            self.find_order_cycle_row(id)?;
        }
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("INSERT INTO schedules (name) VALUES (?1)", params![name])?;
        let id = tx.last_insert_rowid();
        for &order_cycle_id in order_cycle_ids {
            tx.execute(
                "INSERT OR IGNORE INTO order_cycle_schedules (order_cycle_id, schedule_id) VALUES (?1, ?2)",
                params![order_cycle_id, id],
            )?;
        }
        tx.commit()?;
        Ok(Schedule {
            id,
            name: name.to_string(),
        })
    }

    pub fn list_schedules(&self) -> Result<Vec<Schedule>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM schedules ORDER BY id")?;
        let rows = stmt.query_map([], schedule_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Order cycles each schedule in `ids` is attached to.
    pub fn order_cycle_ids_for_schedules(
        &self,
        ids: &ScheduleSet,
    ) -> Result<BTreeMap<ScheduleId, BTreeSet<OrderCycleId>>> {
        let mut out: BTreeMap<ScheduleId, BTreeSet<OrderCycleId>> = BTreeMap::new();
        if ids.is_empty() {
            return Ok(out);
        }
        let sql = format!(
            "SELECT schedule_id, order_cycle_id FROM order_cycle_schedules WHERE schedule_id IN ({})",
            placeholders(ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), |row| {
            Ok((row.get::<_, ScheduleId>(0)?, row.get::<_, OrderCycleId>(1)?))
        })?;
        for row in rows {
            let (schedule_id, order_cycle_id) = row?;
            out.entry(schedule_id).or_default().insert(order_cycle_id);
        }
        Ok(out)
    }

    pub fn insert_subscription(
        &self,
        schedule_id: ScheduleId,
        shop_id: EnterpriseId,
        customer_email: &str,
    ) -> Result<Subscription> {
        if self
            .find_schedules_by_ids(&ScheduleSet::from([schedule_id]))?
            .is_empty()
        {
            return Err(CycleError::ScheduleNotFound(schedule_id));
        }
        self.find_enterprise(shop_id)?;
        self.conn.execute(
            "INSERT INTO subscriptions (schedule_id, shop_id, customer_email) VALUES (?1, ?2, ?3)",
            params![schedule_id, shop_id, customer_email],
        )?;
        Ok(Subscription {
            id: self.conn.last_insert_rowid(),
            schedule_id,
            shop_id,
            customer_email: customer_email.to_string(),
        })
    }

    pub fn insert_order(&self, order_cycle_id: OrderCycleId, customer_email: &str) -> Result<Order> {
        self.find_order_cycle_row(order_cycle_id)?;
        self.conn.execute(
            "INSERT INTO orders (order_cycle_id, customer_email) VALUES (?1, ?2)",
            params![order_cycle_id, customer_email],
        )?;
        Ok(Order {
            id: self.conn.last_insert_rowid(),
            order_cycle_id,
            customer_email: customer_email.to_string(),
        })
    }

    // -----------------------------------------------------------------------
    // Order cycles
    // -----------------------------------------------------------------------

    fn find_order_cycle_row(&self, id: OrderCycleId) -> Result<OrderCycle> {
        self.conn
            .query_row(
                &format!("SELECT {ORDER_CYCLE_COLUMNS} FROM order_cycles WHERE id = ?1"),
                params![id],
                order_cycle_from_row,
            )
            .optional()?
            .ok_or(CycleError::OrderCycleNotFound(id))
    }

    pub fn find_order_cycle(&self, id: OrderCycleId) -> Result<OrderCycle> {
        let mut oc = self.find_order_cycle_row(id)?;

        let mut stmt = self.conn.prepare(
            "SELECT schedule_id FROM order_cycle_schedules WHERE order_cycle_id = ?1",
        )?;
        let rows = stmt.query_map(params![id], |row| row.get(0))?;
        oc.schedule_ids = rows.collect::<rusqlite::Result<ScheduleSet>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT enterprise_id, incoming FROM exchanges WHERE order_cycle_id = ?1 ORDER BY enterprise_id",
        )?;
        let rows = stmt.query_map(params![id], exchange_from_row)?;
        oc.exchanges = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        oc.exchanges.sort();
        Ok(oc)
    }

    pub fn list_order_cycles(&self) -> Result<Vec<OrderCycle>> {
        let mut schedules: BTreeMap<OrderCycleId, ScheduleSet> = BTreeMap::new();
        let mut stmt = self
            .conn
            .prepare("SELECT order_cycle_id, schedule_id FROM order_cycle_schedules")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, OrderCycleId>(0)?, row.get::<_, ScheduleId>(1)?))
        })?;
        for row in rows {
            let (oc_id, schedule_id) = row?;
            schedules.entry(oc_id).or_default().insert(schedule_id);
        }

        let mut exchanges: BTreeMap<OrderCycleId, Vec<Exchange>> = BTreeMap::new();
        let mut stmt = self
            .conn
            .prepare("SELECT order_cycle_id, enterprise_id, incoming FROM exchanges")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, OrderCycleId>(0)?,
                Exchange {
                    enterprise_id: row.get(1)?,
                    incoming: row.get(2)?,
                },
            ))
        })?;
        for row in rows {
            let (oc_id, exchange) = row?;
            exchanges.entry(oc_id).or_default().push(exchange);
        }

        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {ORDER_CYCLE_COLUMNS} FROM order_cycles ORDER BY id"))?;
        let rows = stmt.query_map([], order_cycle_from_row)?;
        let mut cycles = Vec::new();
        for row in rows {
            let mut oc = row?;
            oc.schedule_ids = schedules.remove(&oc.id).unwrap_or_default();
            oc.exchanges = exchanges.remove(&oc.id).unwrap_or_default();
            oc.exchanges.sort();
            cycles.push(oc);
        }
        Ok(cycles)
    }

    /// Insert a new cycle with its schedule links and exchanges; sets `oc.id`.
    pub fn insert_order_cycle(&self, oc: &mut OrderCycle) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO order_cycles (name, orders_open_at, orders_close_at, coordinator_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                oc.name,
                oc.orders_open_at,
                oc.orders_close_at,
                oc.coordinator_id,
                oc.created_at,
                oc.updated_at
            ],
        )?;
        oc.id = tx.last_insert_rowid();
        write_links(&tx, oc)?;
        tx.commit()?;
        debug!(order_cycle = oc.id, "order cycle inserted");
        Ok(())
    }

    pub fn update_order_cycle(&self, oc: &mut OrderCycle) -> Result<()> {
        self.update_order_cycles(std::slice::from_mut(oc))
    }

    /// Save every cycle in one transaction; nothing is written if any fails.
    pub fn update_order_cycles(&self, cycles: &mut [OrderCycle]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let now = Utc::now();
        for oc in cycles.iter_mut() {
            oc.updated_at = now;
            let changed = tx.execute(
                "UPDATE order_cycles
                 SET name = ?2, orders_open_at = ?3, orders_close_at = ?4, coordinator_id = ?5, updated_at = ?6
                 WHERE id = ?1",
                params![
                    oc.id,
                    oc.name,
                    oc.orders_open_at,
                    oc.orders_close_at,
                    oc.coordinator_id,
                    oc.updated_at
                ],
            )?;
            if changed == 0 {
                return Err(CycleError::OrderCycleNotFound(oc.id));
            }
            write_links(&tx, oc)?;
        }
        tx.commit()?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Producer notifications
    // -----------------------------------------------------------------------

    pub fn enqueue_producer_notification(
        &self,
        order_cycle_id: OrderCycleId,
    ) -> Result<ProducerNotification> {
        self.find_order_cycle_row(order_cycle_id)?;
        let enqueued_at = Utc::now();
        self.conn.execute(
            "INSERT INTO producer_notifications (order_cycle_id, enqueued_at) VALUES (?1, ?2)",
            params![order_cycle_id, enqueued_at],
        )?;
        Ok(ProducerNotification {
            id: self.conn.last_insert_rowid(),
            order_cycle_id,
            enqueued_at,
        })
    }

    pub fn producer_notifications(&self) -> Result<Vec<ProducerNotification>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, order_cycle_id, enqueued_at FROM producer_notifications ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ProducerNotification {
                id: row.get(0)?,
                order_cycle_id: row.get(1)?,
                enqueued_at: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

// ---------------------------------------------------------------------------
// Collaborator impls
// ---------------------------------------------------------------------------

impl ScheduleLookup for Store {
    fn find_schedules_by_ids(&self, ids: &ScheduleSet) -> Result<Vec<Schedule>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, name FROM schedules WHERE id IN ({}) ORDER BY id",
            placeholders(ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), schedule_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn find_subscriptions_by_schedule_ids(&self, ids: &ScheduleSet) -> Result<Vec<Subscription>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, schedule_id, shop_id, customer_email FROM subscriptions
             WHERE schedule_id IN ({}) ORDER BY id",
            placeholders(ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), |row| {
            Ok(Subscription {
                id: row.get(0)?,
                schedule_id: row.get(1)?,
                shop_id: row.get(2)?,
                customer_email: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl OrderCycleDeleter for Store {
    fn delete_order_cycle(&self, id: OrderCycleId) -> Result<Deletion> {
        match self
            .conn
            .execute("DELETE FROM order_cycles WHERE id = ?1", params![id])
        {
            Ok(0) => Err(CycleError::OrderCycleNotFound(id)),
            Ok(_) => Ok(Deletion::Deleted),
            Err(e) if is_foreign_key_violation(&e) => Ok(Deletion::Referenced),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn write_links(tx: &Transaction<'_>, oc: &OrderCycle) -> Result<()> {
    tx.execute(
        "DELETE FROM order_cycle_schedules WHERE order_cycle_id = ?1",
        params![oc.id],
    )?;
    for schedule_id in &oc.schedule_ids {
        tx.execute(
            "INSERT INTO order_cycle_schedules (order_cycle_id, schedule_id) VALUES (?1, ?2)",
            params![oc.id, schedule_id],
        )?;
    }
    tx.execute("DELETE FROM exchanges WHERE order_cycle_id = ?1", params![oc.id])?;
    for exchange in &oc.exchanges {
        tx.execute(
            "INSERT OR IGNORE INTO exchanges (order_cycle_id, enterprise_id, incoming) VALUES (?1, ?2, ?3)",
            params![oc.id, exchange.enterprise_id, exchange.incoming],
        )?;
    }
    Ok(())
}

fn enterprise_from_row(row: &Row<'_>) -> rusqlite::Result<Enterprise> {
    Ok(Enterprise {
        id: row.get(0)?,
        name: row.get(1)?,
        is_producer: row.get(2)?,
        is_distributor: row.get(3)?,
    })
}

fn schedule_from_row(row: &Row<'_>) -> rusqlite::Result<Schedule> {
    Ok(Schedule {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn exchange_from_row(row: &Row<'_>) -> rusqlite::Result<Exchange> {
    Ok(Exchange {
        enterprise_id: row.get(0)?,
        incoming: row.get(1)?,
    })
}

fn order_cycle_from_row(row: &Row<'_>) -> rusqlite::Result<OrderCycle> {
    Ok(OrderCycle {
        id: row.get(0)?,
        name: row.get(1)?,
        orders_open_at: row.get(2)?,
        orders_close_at: row.get(3)?,
        coordinator_id: row.get(4)?,
        schedule_ids: ScheduleSet::new(),
        exchanges: Vec::new(),
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with_cycle() -> (Store, OrderCycle) {
        let store = Store::open_in_memory().unwrap();
        let hub = store.insert_enterprise("Hub", false, true).unwrap();
        let mut oc = OrderCycle::new("Weekly", Some(hub.id));
        store.insert_order_cycle(&mut oc).unwrap();
        (store, oc)
    }

    #[test]
    fn order_cycle_round_trip_with_links() {
        let (store, mut oc) = store_with_cycle();
        let farm = store.insert_enterprise("Farm", true, false).unwrap();
        let schedule = store.insert_schedule("Weekly box", &[]).unwrap();
        oc.schedule_ids.insert(schedule.id);
        oc.set_exchanges(true, &[farm.id]);
        oc.orders_open_at = Some(Utc::now());
        store.update_order_cycle(&mut oc).unwrap();

        let loaded = store.find_order_cycle(oc.id).unwrap();
        assert_eq!(loaded.schedule_ids, ScheduleSet::from([schedule.id]));
        assert_eq!(loaded.exchanges, oc.exchanges);
        assert_eq!(loaded.orders_open_at, oc.orders_open_at);

        let listed = store.list_order_cycles().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].schedule_ids, loaded.schedule_ids);
    }

    #[test]
    fn missing_order_cycle_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        assert!(matches!(
            store.find_order_cycle(42),
            Err(CycleError::OrderCycleNotFound(42))
        ));
    }

    #[test]
    fn delete_with_orders_is_referenced() {
        let (store, oc) = store_with_cycle();
        store.insert_order(oc.id, "buyer@example.com").unwrap();
        assert_eq!(store.delete_order_cycle(oc.id).unwrap(), Deletion::Referenced);
        assert!(store.find_order_cycle(oc.id).is_ok());
    }

    #[test]
    fn delete_without_orders_removes_cycle() {
        let (store, oc) = store_with_cycle();
        store.enqueue_producer_notification(oc.id).unwrap();
        assert_eq!(store.delete_order_cycle(oc.id).unwrap(), Deletion::Deleted);
        assert!(store.find_order_cycle(oc.id).is_err());
        assert!(store.producer_notifications().unwrap().is_empty());
    }

    #[test]
    fn subscription_lookup_by_schedule() {
        let (store, oc) = store_with_cycle();
        let shop = store.insert_enterprise("Shop", false, true).unwrap();
        let a = store.insert_schedule("A", &[oc.id]).unwrap();
        let b = store.insert_schedule("B", &[]).unwrap();
        let sa = store.insert_subscription(a.id, shop.id, "a@example.com").unwrap();
        store.insert_subscription(b.id, shop.id, "b@example.com").unwrap();

        let found = store
            .find_subscriptions_by_schedule_ids(&ScheduleSet::from([a.id]))
            .unwrap();
        assert_eq!(found, vec![sa]);

        let links = store
            .order_cycle_ids_for_schedules(&ScheduleSet::from([a.id, b.id]))
            .unwrap();
        assert_eq!(links.get(&a.id), Some(&BTreeSet::from([oc.id])));
        assert!(links.get(&b.id).is_none());
    }

    #[test]
    fn bulk_update_is_all_or_nothing() {
        let (store, oc) = store_with_cycle();
        let mut ghost = oc.clone();
        ghost.id = 999;
        let mut renamed = oc.clone();
        renamed.name = "Renamed".into();
        let mut batch = vec![renamed, ghost];
        assert!(store.update_order_cycles(&mut batch).is_err());
        assert_eq!(store.find_order_cycle(oc.id).unwrap().name, "Weekly");
    }

    #[test]
    fn managers_are_idempotent() {
        let store = Store::open_in_memory().unwrap();
        let user = store.insert_user("m@example.com", false).unwrap();
        let hub = store.insert_enterprise("Hub", false, true).unwrap();
        store.add_manager(user.id, hub.id).unwrap();
        store.add_manager(user.id, hub.id).unwrap();
        assert_eq!(
            store.enterprise_ids_managed_by(user.id).unwrap(),
            BTreeSet::from([hub.id])
        );
    }

    #[test]
    fn open_on_disk_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cycles.db");
        {
            let store = Store::open(&path).unwrap();
            store.insert_enterprise("Hub", false, true).unwrap();
        }
        let store = Store::open(&path).unwrap();
        assert_eq!(store.list_enterprises().unwrap().len(), 1);
    }
}
