//! SQLite trade log adapter.

use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use crate::domain::error::VolguardError;
use crate::domain::trade_log::{NewTrade, TradeRecord};
use crate::ports::config_port::ConfigPort;
use crate::ports::trade_store_port::TradeStorePort;

pub struct SqliteTradeStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteTradeStore {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, VolguardError> {
        let db_path =
            config
                .get_string("database", "path")
                .ok_or_else(|| VolguardError::ConfigMissing {
                    section: "database".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("database", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| VolguardError::Database {
                    reason: e.to_string(),
                })?;

        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, VolguardError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| VolguardError::Database {
                reason: e.to_string(),
            })?;

        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    pub fn initialize_schema(&self) -> Result<(), VolguardError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| VolguardError::Database {
                reason: e.to_string(),
            })?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS trades (
                id INTEGER PRIMARY KEY,
                strategy TEXT NOT NULL,
                entry_price REAL NOT NULL,
                exit_price REAL NOT NULL,
                pnl REAL NOT NULL,
                regime_score REAL NOT NULL,
                timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_trades_timestamp ON trades(timestamp);",
        )
        .map_err(|e: rusqlite::Error| VolguardError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }
}

impl TradeStorePort for SqliteTradeStore {
    fn insert_trade(&self, trade: &NewTrade) -> Result<i64, VolguardError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| VolguardError::Database {
                reason: e.to_string(),
            })?;

        conn.execute(
            "INSERT INTO trades (strategy, entry_price, exit_price, pnl, regime_score, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                trade.strategy,
                trade.entry_price,
                trade.exit_price,
                trade.pnl,
                trade.regime_score,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e: rusqlite::Error| VolguardError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(conn.last_insert_rowid())
    }

    fn list_trades(&self) -> Result<Vec<TradeRecord>, VolguardError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| VolguardError::Database {
                reason: e.to_string(),
            })?;

        let mut stmt = conn
            .prepare(
                "SELECT id, strategy, entry_price, exit_price, pnl, regime_score, timestamp
                 FROM trades ORDER BY timestamp ASC, id ASC",
            )
            .map_err(|e: rusqlite::Error| VolguardError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map([], |row| {
                let ts_str: String = row.get(6)?;
                let timestamp = ts_str
                    .parse::<DateTime<Utc>>()
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            ts_str.len(),
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;
                Ok(TradeRecord {
                    id: row.get(0)?,
                    strategy: row.get(1)?,
                    entry_price: row.get(2)?,
                    exit_price: row.get(3)?,
                    pnl: row.get(4)?,
                    regime_score: row.get(5)?,
                    timestamp,
                })
            })
            .map_err(|e: rusqlite::Error| VolguardError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut trades = Vec::new();
        for row in rows {
            trades.push(
                row.map_err(|e: rusqlite::Error| VolguardError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }

        Ok(trades)
    }
}
