//! Storage backends for categories, prompts and executions
//!
//! Every feature talks to storage through its repository trait. Two backends
//! implement all of them: PostgreSQL (the per-feature `Pg*Repository` types)
//! and [`MemoryStore`], which keeps everything in process and is what the
//! test suite runs against.

mod memory;

use std::sync::Arc;

use sqlx::PgPool;

use crate::core::config::{StorageBackend, StorageConfig};
use crate::core::database;
use crate::features::categories::repositories::{CategoryRepository, PgCategoryRepository};
use crate::features::executions::repositories::{ExecutionRepository, PgExecutionRepository};
use crate::features::prompts::repositories::{PgPromptRepository, PromptRepository};
use crate::features::stats::repositories::{PgStatsRepository, StatsRepository};

pub use memory::MemoryStore;

/// One handle per repository trait, all backed by the same store
#[derive(Clone)]
pub struct Repositories {
    pub categories: Arc<dyn CategoryRepository>,
    pub prompts: Arc<dyn PromptRepository>,
    pub executions: Arc<dyn ExecutionRepository>,
    pub stats: Arc<dyn StatsRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            categories: Arc::new(PgCategoryRepository::new(pool.clone())),
            prompts: Arc::new(PgPromptRepository::new(pool.clone())),
            executions: Arc::new(PgExecutionRepository::new(pool.clone())),
            stats: Arc::new(PgStatsRepository::new(pool)),
        }
    }

    pub fn memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            categories: store.clone(),
            prompts: store.clone(),
            executions: store.clone(),
            stats: store,
        }
    }

    /// Open the configured backend, running migrations for PostgreSQL
    pub async fn connect(config: &StorageConfig) -> anyhow::Result<Self> {
        match config.backend {
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on shutdown");
                Ok(Self::memory())
            }
            StorageBackend::Postgres => {
                let db_config = config
                    .database
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set for postgres storage"))?;

                let pool = database::create_pool(db_config)
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
                tracing::info!("Database connection established");

                database::run_migrations(&pool).await?;

                Ok(Self::postgres(pool))
            }
        }
    }
}
