use diesel::connection::SimpleConnection as _;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use std::time::Duration;

use crate::models::Draw;

pub mod draws;

const CREATE_RESULTADOS: &str =
    include_str!("../migrations/2025-11-01-000000_create_resultados/up.sql");

pub type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;
pub type SqlitePooledConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

#[derive(Debug)]
struct SqliteConnectionCustomizer;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqliteConnectionCustomizer {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        // overlapping sync runs wait for each other's writes instead of failing
        diesel::sql_query("PRAGMA busy_timeout = 30000;")
            .execute(conn)
            .map_err(diesel::r2d2::Error::QueryError)?;

        // using WAL mode for better concurrency
        diesel::sql_query("PRAGMA journal_mode = WAL;")
            .execute(conn)
            .map_err(diesel::r2d2::Error::QueryError)?;

        // ! may lose last transaction on crash
        diesel::sql_query("PRAGMA synchronous = NORMAL;")
            .execute(conn)
            .map_err(diesel::r2d2::Error::QueryError)?;

        Ok(())
    }
}

/// Storage seen by the synchronizer
pub trait DrawStore: Send + Sync {
    /// Lowest and highest stored draw numbers, `None` when the table is empty
    fn draw_number_bounds(&self) -> anyhow::Result<Option<(i64, i64)>>;

    /// Stored draw numbers in `from..=to`, ascending
    fn draw_numbers_between(&self, from: i64, to: i64) -> anyhow::Result<Vec<i64>>;

    /// Conflict-safe insert. `Ok(false)` when the draw was already stored.
    fn insert_draw(&self, draw: &Draw) -> anyhow::Result<bool>;
}

/// Handle on the results database, built once at startup and shared by clone
#[derive(Clone)]
pub struct Datastore {
    pool: SqlitePool,
}

impl std::fmt::Debug for Datastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Datastore")
            .field("state", &self.pool.state())
            .finish()
    }
}

impl Datastore {
    pub fn connect(database_url: &str) -> anyhow::Result<Self> {
        let manager = ConnectionManager::<SqliteConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(10)
            .connection_timeout(Duration::from_secs(30))
            .connection_customizer(Box::new(SqliteConnectionCustomizer))
            .build(manager)
            .map_err(|e| {
                let err_message = format!("Error connecting to {database_url}: {e}");
                log::error!("{err_message}");
                anyhow::anyhow!("{err_message}")
            })?;

        log::info!("Connected to database at {database_url}");
        Ok(Self { pool })
    }

    /// Single-connection in-memory database; the connection is never recycled
    /// so the data lives as long as the handle.
    pub fn in_memory() -> anyhow::Result<Self> {
        let manager = ConnectionManager::<SqliteConnection>::new(":memory:");
        let pool = Pool::builder()
            .max_size(1)
            .min_idle(Some(1))
            .idle_timeout(None)
            .max_lifetime(None)
            .connection_customizer(Box::new(SqliteConnectionCustomizer))
            .build(manager)
            .map_err(|e| anyhow::anyhow!("Failed to create in-memory database: {e}"))?;

        Ok(Self { pool })
    }

    /// Apply the schema. Safe to run on every startup.
    pub fn migrate(&self) -> anyhow::Result<()> {
        let mut conn = self.connection()?;
        conn.batch_execute(CREATE_RESULTADOS)
            .map_err(|e| anyhow::anyhow!("Failed to apply schema: {e}"))?;
        log::debug!("Schema for resultados is in place");
        Ok(())
    }

    pub fn connection(&self) -> anyhow::Result<SqlitePooledConnection> {
        self.pool
            .get()
            .map_err(|e| anyhow::anyhow!("Failed to get DB connection: {e}"))
    }

    pub fn latest_draws(&self, limit: i64) -> anyhow::Result<Vec<Draw>> {
        draws::get_latest_draws(&mut *self.connection()?, limit)
    }

    pub fn get_draw(&self, draw_number: i64) -> anyhow::Result<Option<Draw>> {
        draws::get_draw_by_number(&mut *self.connection()?, draw_number)
    }

    pub fn count_draws(&self) -> anyhow::Result<i64> {
        draws::count_draws(&mut *self.connection()?)
    }
}

impl DrawStore for Datastore {
    fn draw_number_bounds(&self) -> anyhow::Result<Option<(i64, i64)>> {
        draws::get_draw_number_bounds(&mut *self.connection()?)
    }

    fn draw_numbers_between(&self, from: i64, to: i64) -> anyhow::Result<Vec<i64>> {
        draws::get_draw_numbers_between(&mut *self.connection()?, from, to)
    }

    fn insert_draw(&self, draw: &Draw) -> anyhow::Result<bool> {
        draws::insert_draw(&mut *self.connection()?, draw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_is_idempotent() -> anyhow::Result<()> {
        let store = Datastore::in_memory()?;
        store.migrate()?;
        store.migrate()?;

        assert_eq!(store.count_draws()?, 0);
        assert_eq!(store.draw_number_bounds()?, None);
        Ok(())
    }

    #[test]
    fn file_database_survives_reconnect() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let url = dir.path().join("resultados.db").display().to_string();

        let store = Datastore::connect(&url)?;
        store.migrate()?;
        let draw = Draw::new(
            1,
            "29/09/2003",
            &[2, 3, 5, 6, 9, 10, 11, 13, 14, 16, 18, 20, 23, 24, 25],
        )?;
        assert!(store.insert_draw(&draw)?);
        drop(store);

        let reopened = Datastore::connect(&url)?;
        assert_eq!(reopened.get_draw(1)?, Some(draw));
        Ok(())
    }
}
