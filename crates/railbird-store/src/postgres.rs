//! PostgreSQL storage implementation
//!
//! Stakes are stored as one JSONB document per row alongside indexed party
//! columns and a revision counter; the compare-and-swap contract of
//! `StakeStore::update_stake` maps onto a conditional UPDATE.

use {
    crate::traits::{ManualStakerDirectory, StakeStore, Versioned},
    async_trait::async_trait,
    railbird_common::{Error, ManualStaker, PostgresConfig, Result, Stake},
    sqlx::{
        postgres::{PgPool, PgPoolOptions, PgRow},
        Row,
    },
    tracing::info,
};

pub struct PostgresStore {
    pool: PgPool,
}

fn storage_error(e: sqlx::Error) -> Error {
    Error::Persistence(e.to_string())
}

impl PostgresStore {
    pub async fn connect(config: &PostgresConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.connection_string)
            .await
            .map_err(storage_error)?;

        let store = Self { pool };

        if config.create_tables {
            store.initialize_schema().await?;
            info!("Initialized postgres schema");
        }

        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stakes (
                id TEXT PRIMARY KEY,
                staker_user_id TEXT NOT NULL,
                staked_player_user_id TEXT NOT NULL,
                revision BIGINT NOT NULL,
                doc JSONB NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS stakes_staker_idx ON stakes (staker_user_id);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS stakes_player_idx ON stakes (staked_player_user_id);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS manual_stakers (
                id TEXT PRIMARY KEY,
                created_by_user_id TEXT NOT NULL,
                doc JSONB NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    fn stake_from_row(row: &PgRow) -> Result<Versioned<Stake>> {
        let revision: i64 = row.try_get("revision").map_err(storage_error)?;
        let doc: serde_json::Value = row.try_get("doc").map_err(storage_error)?;
        Ok(Versioned {
            revision: revision as u64,
            record: serde_json::from_value(doc)?,
        })
    }
}

#[async_trait]
impl StakeStore for PostgresStore {
    async fn insert_stake(&self, stake: Stake) -> Result<Versioned<Stake>> {
        let doc = serde_json::to_value(&stake)?;
        sqlx::query(
            r#"
            INSERT INTO stakes (id, staker_user_id, staked_player_user_id, revision, doc)
            VALUES ($1, $2, $3, 1, $4)
            "#,
        )
        .bind(&stake.id)
        .bind(&stake.staker_user_id)
        .bind(&stake.staked_player_user_id)
        .bind(doc)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(Versioned {
            revision: 1,
            record: stake,
        })
    }

    async fn get_stake(&self, id: &str) -> Result<Option<Versioned<Stake>>> {
        let row = sqlx::query("SELECT revision, doc FROM stakes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.as_ref().map(Self::stake_from_row).transpose()
    }

    async fn stakes_for_user(&self, user_id: &str) -> Result<Vec<Versioned<Stake>>> {
        let rows = sqlx::query(
            r#"
            SELECT revision, doc FROM stakes
            WHERE staker_user_id = $1 OR staked_player_user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.iter().map(Self::stake_from_row).collect()
    }

    async fn update_stake(&self, stake: Stake, expected_revision: u64) -> Result<Versioned<Stake>> {
        let doc = serde_json::to_value(&stake)?;
        let result = sqlx::query(
            r#"
            UPDATE stakes
            SET doc = $2,
                staker_user_id = $3,
                staked_player_user_id = $4,
                revision = revision + 1
            WHERE id = $1 AND revision = $5
            "#,
        )
        .bind(&stake.id)
        .bind(doc)
        .bind(&stake.staker_user_id)
        .bind(&stake.staked_player_user_id)
        .bind(expected_revision as i64)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            // Lost update or unknown id; re-read to tell them apart.
            return match self.get_stake(&stake.id).await? {
                Some(_) => Err(Error::ConcurrentModification { id: stake.id }),
                None => Err(Error::NotFound { id: stake.id }),
            };
        }

        Ok(Versioned {
            revision: expected_revision + 1,
            record: stake,
        })
    }

    async fn delete_stake(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM stakes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound { id: id.to_string() });
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

#[async_trait]
impl ManualStakerDirectory for PostgresStore {
    async fn upsert_manual_staker(&self, staker: ManualStaker) -> Result<()> {
        let doc = serde_json::to_value(&staker)?;
        sqlx::query(
            r#"
            INSERT INTO manual_stakers (id, created_by_user_id, doc)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc
            "#,
        )
        .bind(&staker.id)
        .bind(&staker.created_by_user_id)
        .bind(doc)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn manual_stakers_for_user(&self, user_id: &str) -> Result<Vec<ManualStaker>> {
        let rows = sqlx::query("SELECT doc FROM manual_stakers WHERE created_by_user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        rows.iter()
            .map(|row| {
                let doc: serde_json::Value = row.try_get("doc").map_err(storage_error)?;
                Ok(serde_json::from_value(doc)?)
            })
            .collect()
    }

    async fn delete_manual_staker(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM manual_stakers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound { id: id.to_string() });
        }
        Ok(())
    }
}
