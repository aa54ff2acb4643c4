//! # ponder-db
//!
//! PostgreSQL storage layer for the ponder thinking engine.
//!
//! This crate provides:
//! - Connection pool management
//! - Read-side queries over the note graph (links, tags, folders)
//! - Thinking session persistence with conditional save tracking
//! - A note writer for promoted drafts
//! - An in-memory store implementing the same traits for tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use ponder_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/ponder").await?;
//!     let session = db.sessions.get(session_id).await?;
//!     Ok(())
//! }
//! ```
pub mod context;
pub mod memory;
pub mod notes;
pub mod pool;
pub mod sessions;

// Re-export core types
pub use ponder_core::*;

pub use context::PgContextRepository;
pub use memory::InMemoryStore;
pub use notes::{PgNoteWriter, THINKING_LINK_KIND, THINKING_NOTE_SOURCE};
pub use pool::{create_pool, PoolConfig};
pub use sessions::PgSessionRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Note graph queries for relevance scoring.
    pub context: PgContextRepository,
    /// Thinking session storage.
    pub sessions: PgSessionRepository,
    /// Note creation for resolved drafts.
    pub notes: PgNoteWriter,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            context: PgContextRepository::new(pool.clone()),
            sessions: PgSessionRepository::new(pool.clone()),
            notes: PgNoteWriter::new(pool.clone()),
            pool,
        }
    }

    /// Connect using pool settings from the environment.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_config(url, PoolConfig::from_env()).await
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
