// ============================================================================
// entity-sync Library
// ============================================================================

pub mod config;
pub mod core;
pub mod gateway;
pub mod orchestrator;
pub mod query;
pub mod store;

// Re-export main types for convenience
pub use crate::config::SyncConfig;
pub use crate::core::{
    CollectionPage, EntityId, EntityRecord, ErrorKind, MoodEntry, MoodType, PageLinks,
    PaginationDescriptor, Result, SortOrder, SyncError, UserRef,
};
pub use gateway::{HttpGateway, RemoteCollection, RequestClass, RequestKind};
pub use orchestrator::{MutationOutcome, RefreshHandle, RequestOrchestrator};
pub use query::{QuerySync, SortIndicator, SyncAction, decode, encode};
pub use store::{Commit, EntityState, EntityStore};

// ============================================================================
// High-level API
// ============================================================================

/// Orchestrator talking to a JSON REST endpoint.
///
/// # Examples
///
/// ```no_run
/// use entity_sync::{HttpOrchestrator, MoodEntry, QuerySync, SyncConfig};
///
/// # async fn run() -> entity_sync::Result<()> {
/// let config = SyncConfig::new("http://localhost:8080/");
/// let entries = HttpOrchestrator::<MoodEntry>::connect(&config)?;
///
/// let mut view = QuerySync::new(config.default_descriptor(), "?page=2&sort=date,DESC");
/// entries.fetch_list(view.descriptor().clone()).await?;
///
/// let action = view.sort("mood");
/// if action.fetch {
///     entries.fetch_list(view.descriptor().clone()).await?;
/// }
///
/// let state = entries.store().snapshot()?;
/// println!("{} of {} entries", state.entities.len(), state.total_items);
/// # Ok(())
/// # }
/// ```
pub type HttpOrchestrator<T> = RequestOrchestrator<T, HttpGateway<T>>;
