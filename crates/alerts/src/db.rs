//! SQLite wallet registry.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;
use walletwatch_core::Wallet;
use walletwatch_engine::{StoreError, WalletStore};

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

type WalletRow = (i64, i64, String, String, String, String);

fn wallet_from_row((id, owner_id, network_key, address, label, watermark): WalletRow) -> Wallet {
    Wallet {
        id,
        owner_id,
        network_key,
        address,
        label,
        watermark_tx_id: watermark,
    }
}

/// Database connection for the wallet registry.
#[derive(Clone)]
pub struct WalletDb {
    pool: SqlitePool,
}

impl WalletDb {
    /// Connect to the SQLite database at the given url, creating it if
    /// missing.
    pub async fn connect(database_url: &str) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), DbError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS wallets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                network TEXT NOT NULL,
                address TEXT NOT NULL,
                label TEXT NOT NULL,
                last_tx TEXT NOT NULL DEFAULT '',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, network, address)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_user_wallets ON wallets(user_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Register a wallet. Returns `false` when the owner already monitors
    /// this address on this network.
    pub async fn add_wallet(
        &self,
        owner_id: i64,
        network_key: &str,
        address: &str,
        label: &str,
        baseline_tx: &str,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            "INSERT INTO wallets (user_id, network, address, label, last_tx) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(owner_id)
        .bind(network_key)
        .bind(address)
        .bind(label)
        .bind(baseline_tx)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                warn!(owner_id, network_key, "duplicate wallet registration");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a wallet, scoped to its owner. Returns `false` when nothing
    /// matched.
    pub async fn remove_wallet(&self, wallet_id: i64, owner_id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM wallets WHERE id = ? AND user_id = ?")
            .bind(wallet_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn wallets_for_owner(&self, owner_id: i64) -> Result<Vec<Wallet>, DbError> {
        let rows = sqlx::query_as::<_, WalletRow>(
            "SELECT id, user_id, network, address, label, last_tx FROM wallets WHERE user_id = ? ORDER BY id",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(wallet_from_row).collect())
    }

    pub async fn all_wallets(&self) -> Result<Vec<Wallet>, DbError> {
        let rows = sqlx::query_as::<_, WalletRow>(
            "SELECT id, user_id, network, address, label, last_tx FROM wallets ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(wallet_from_row).collect())
    }

    pub async fn set_watermark(&self, wallet_id: i64, tx_id: &str) -> Result<(), DbError> {
        sqlx::query("UPDATE wallets SET last_tx = ? WHERE id = ?")
            .bind(tx_id)
            .bind(wallet_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn count_all(&self) -> Result<i64, DbError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM wallets")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl WalletStore for WalletDb {
    async fn list_all(&self) -> Result<Vec<Wallet>, StoreError> {
        self.all_wallets()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn update_watermark(&self, wallet_id: i64, tx_id: &str) -> Result<(), StoreError> {
        self.set_watermark(wallet_id, tx_id)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ADDR: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";

    #[tokio::test]
    async fn test_add_and_list() {
        let db = WalletDb::connect("sqlite::memory:").await.unwrap();

        assert!(db.add_wallet(7, "tron", ADDR, "hot", "h0").await.unwrap());
        let wallets = db.wallets_for_owner(7).await.unwrap();
        assert_eq!(wallets.len(), 1);
        assert_eq!(wallets[0].label, "hot");
        assert_eq!(wallets[0].watermark_tx_id, "h0");
    }

    #[tokio::test]
    async fn test_duplicate_is_rejected_quietly() {
        let db = WalletDb::connect("sqlite::memory:").await.unwrap();

        assert!(db.add_wallet(7, "tron", ADDR, "hot", "").await.unwrap());
        assert!(!db.add_wallet(7, "tron", ADDR, "other label", "").await.unwrap());
        // Same address is fine for a different owner or network.
        assert!(db.add_wallet(8, "tron", ADDR, "hot", "").await.unwrap());
        assert!(db.add_wallet(7, "ethereum", ADDR, "hot", "").await.unwrap());

        assert_eq!(db.count_all().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_remove_is_owner_scoped() {
        let db = WalletDb::connect("sqlite::memory:").await.unwrap();
        db.add_wallet(7, "tron", ADDR, "hot", "").await.unwrap();
        let id = db.wallets_for_owner(7).await.unwrap()[0].id;

        assert!(!db.remove_wallet(id, 999).await.unwrap());
        assert!(db.remove_wallet(id, 7).await.unwrap());
        assert!(db.wallets_for_owner(7).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_watermark_roundtrip_via_store_trait() {
        let db = WalletDb::connect("sqlite::memory:").await.unwrap();
        db.add_wallet(7, "tron", ADDR, "hot", "h0").await.unwrap();

        let store: &dyn WalletStore = &db;
        let wallets = store.list_all().await.unwrap();
        store.update_watermark(wallets[0].id, "h5").await.unwrap();

        let wallets = store.list_all().await.unwrap();
        assert_eq!(wallets[0].watermark_tx_id, "h5");
    }
}
