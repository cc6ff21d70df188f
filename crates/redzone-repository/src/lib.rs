//! Repository abstraction layer for the Red Zone engine
//!
//! Stores for rules, alerts, the activity log, customer snapshots and user
//! roles, with an in-memory backend and a PostgreSQL backend (`postgres`
//! feature).
//!
//! # Invariants enforced here
//!
//! - At most one `open` alert per `(customer_id, rule_id)`: a partial unique
//!   index in PostgreSQL, a single write lock in memory. Violations surface as
//!   [`RepositoryError::Conflict`].
//! - Every alert write is paired with its activity row in the same transaction.
//! - A resolved alert is never rewritten.
//!
//! # Quick Start
//!
//! ```no_run
//! use redzone_repository::{Repositories, RepositoryConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repos = Repositories::connect(&RepositoryConfig::memory()).await?;
//!     let rules = repos.rules.list_enabled_rules().await?;
//!     println!("{} enabled rules", rules.len());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │   Rule engine / Sweeper / Server       │
//! └──────────────┬─────────────────────────┘
//!                │ store traits
//!                ↓
//! ┌────────────────────────────────────────┐
//! │ RuleRepository  AlertRepository        │
//! │ CustomerSnapshotSource  UserDirectory  │
//! └──────────────┬─────────────────────────┘
//!       ┌────────┴────────┐
//!       ↓                 ↓
//! ┌──────────────┐  ┌──────────────────┐
//! │ MemoryStore  │  │  PostgreSQL      │
//! └──────────────┘  └──────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod models;
pub mod traits;

#[cfg(feature = "postgres")]
pub mod postgres;

// Re-exports - Configuration
pub use config::{Repositories, RepositoryConfig, RepositorySource};

// Re-exports - Error
pub use error::{RepositoryError, RepositoryResult};

// Re-exports - Repositories
pub use memory::MemoryStore;
pub use models::*;
pub use traits::*;

#[cfg(feature = "postgres")]
pub use postgres::PostgresRepository;
