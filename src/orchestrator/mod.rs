//! Sequencing of remote calls against the entity store.
//!
//! Every request goes through the same three steps: the store issues a ticket
//! (dispatch transition), the gateway call runs without holding any lock, and
//! the result is handed back with the ticket so stale reads can be dropped.
//! Successful writes spawn one list refresh with the last descriptor the
//! caller asked for.

use crate::config::SyncConfig;
use crate::core::{EntityId, EntityRecord, PaginationDescriptor, Result, SyncError};
use crate::gateway::{HttpGateway, RemoteCollection, RequestKind};
use crate::store::{Commit, EntityStore, StoreEvent};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Follow-up list fetch started by a successful write.
///
/// Dropping the handle leaves the refresh running.
#[derive(Debug)]
pub struct RefreshHandle {
    task: JoinHandle<Result<Commit>>,
}

impl RefreshHandle {
    /// Waits for the refresh to resolve.
    pub async fn settled(self) -> Result<Commit> {
        self.task
            .await
            .map_err(|err| SyncError::Unknown(format!("refresh task failed: {err}")))?
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[derive(Debug)]
pub struct MutationOutcome<T> {
    /// Record returned by the server; `None` for deletes.
    pub record: Option<T>,
    pub refresh: Option<RefreshHandle>,
}

struct Shared<T, G> {
    gateway: G,
    store: EntityStore<T>,
    last_descriptor: Mutex<PaginationDescriptor>,
}

pub struct RequestOrchestrator<T, G> {
    shared: Arc<Shared<T, G>>,
}

impl<T, G> Clone for RequestOrchestrator<T, G> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, G> RequestOrchestrator<T, G>
where
    T: EntityRecord,
    G: RemoteCollection<T> + 'static,
{
    /// `initial` is what a refresh uses until the first explicit list fetch.
    pub fn new(gateway: G, store: EntityStore<T>, initial: PaginationDescriptor) -> Self {
        Self {
            shared: Arc::new(Shared {
                gateway,
                store,
                last_descriptor: Mutex::new(initial),
            }),
        }
    }

    pub fn store(&self) -> &EntityStore<T> {
        &self.shared.store
    }

    pub fn gateway(&self) -> &G {
        &self.shared.gateway
    }

    pub fn last_descriptor(&self) -> Result<PaginationDescriptor> {
        Ok(self.shared.last_descriptor.lock()?.clone())
    }

    fn resource(&self) -> &str {
        self.shared.gateway.resource()
    }

    /// Fetches one page and remembers `descriptor` for later refreshes.
    pub async fn fetch_list(&self, descriptor: PaginationDescriptor) -> Result<Commit> {
        *self.shared.last_descriptor.lock()? = descriptor.clone();

        let ticket = self.store().begin(RequestKind::List)?;
        debug!(
            resource = self.resource(),
            seq = ticket.seq,
            page = descriptor.active_page,
            sort = %descriptor.sort_param(),
            "list dispatched"
        );

        match self.shared.gateway.list(&descriptor).await {
            Ok(page) => {
                let total_items = page.total_items;
                let commit = self.store().commit(&ticket, StoreEvent::ListResolved(page))?;
                debug!(
                    resource = self.resource(),
                    seq = ticket.seq,
                    total_items,
                    ?commit,
                    "list resolved"
                );
                Ok(commit)
            }
            Err(err) => {
                warn!(resource = self.resource(), seq = ticket.seq, error = %err, "list failed");
                self.store()
                    .commit(&ticket, StoreEvent::Failed(RequestKind::List, err.to_string()))?;
                Err(err)
            }
        }
    }

    /// Re-fetches the page last asked for.
    pub async fn refresh(&self) -> Result<Commit> {
        let descriptor = self.last_descriptor()?;
        self.fetch_list(descriptor).await
    }

    pub async fn fetch_one(&self, id: EntityId) -> Result<Commit> {
        let ticket = self.store().begin(RequestKind::GetOne)?;
        debug!(resource = self.resource(), seq = ticket.seq, id, "get dispatched");

        match self.shared.gateway.get_one(id).await {
            Ok(record) => self.store().commit(&ticket, StoreEvent::GetResolved(record)),
            Err(err) => {
                warn!(resource = self.resource(), id, error = %err, "get failed");
                self.store()
                    .commit(&ticket, StoreEvent::Failed(RequestKind::GetOne, err.to_string()))?;
                Err(err)
            }
        }
    }

    pub async fn create(&self, record: T) -> Result<MutationOutcome<T>> {
        let gateway = &self.shared.gateway;
        self.mutate(RequestKind::Create, async move {
            gateway.create(&record).await.map(Some)
        })
        .await
    }

    pub async fn update(&self, record: T) -> Result<MutationOutcome<T>> {
        let gateway = &self.shared.gateway;
        self.mutate(RequestKind::Update, async move {
            gateway.update(&record).await.map(Some)
        })
        .await
    }

    pub async fn partial_update(&self, record: T) -> Result<MutationOutcome<T>> {
        let gateway = &self.shared.gateway;
        self.mutate(RequestKind::PartialUpdate, async move {
            gateway.partial_update(&record).await.map(Some)
        })
        .await
    }

    pub async fn delete(&self, id: EntityId) -> Result<MutationOutcome<T>> {
        let gateway = &self.shared.gateway;
        self.mutate(RequestKind::Delete, async move {
            gateway.remove(id).await.map(|()| None)
        })
        .await
    }

    /// Clears the detail record before a "create new" flow.
    pub fn reset(&self) -> Result<()> {
        self.store().reset()
    }

    /// Prevents in-flight list and get results from reaching the store.
    pub fn abandon_reads(&self) -> Result<()> {
        debug!(resource = self.resource(), "abandoning in-flight reads");
        self.store().abandon_reads()
    }

    async fn mutate<F>(&self, kind: RequestKind, call: F) -> Result<MutationOutcome<T>>
    where
        F: Future<Output = Result<Option<T>>>,
    {
        let ticket = self.store().begin(kind)?;
        debug!(resource = self.resource(), seq = ticket.seq, %kind, "mutation dispatched");

        let record = match call.await {
            Ok(record) => record,
            Err(err) => {
                warn!(resource = self.resource(), %kind, error = %err, "mutation failed");
                self.store()
                    .commit(&ticket, StoreEvent::Failed(kind, err.to_string()))?;
                return Err(err);
            }
        };

        let event = match &record {
            Some(saved) => StoreEvent::Saved(saved.clone()),
            None => StoreEvent::Deleted,
        };
        self.store().commit(&ticket, event)?;
        info!(
            resource = self.resource(),
            %kind,
            id = record.as_ref().and_then(|saved| saved.id()),
            "mutation committed"
        );

        let refresh = kind.triggers_refresh().then(|| self.spawn_refresh());
        Ok(MutationOutcome { record, refresh })
    }

    fn spawn_refresh(&self) -> RefreshHandle {
        let this = self.clone();
        RefreshHandle {
            task: tokio::spawn(async move { this.refresh().await }),
        }
    }
}

impl<T: EntityRecord> RequestOrchestrator<T, HttpGateway<T>> {
    /// Orchestrator over the REST endpoint described by `config`, with a fresh store.
    pub fn connect(config: &SyncConfig) -> Result<Self> {
        let gateway = HttpGateway::new(config)?;
        Ok(Self::new(gateway, EntityStore::new(), config.default_descriptor()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CollectionPage, MoodEntry, MoodType};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FixedGateway {
        lists: AtomicUsize,
        fail_writes: bool,
    }

    #[async_trait]
    impl RemoteCollection<MoodEntry> for FixedGateway {
        fn resource(&self) -> &str {
            "api/mood-entries"
        }

        async fn list(&self, _descriptor: &PaginationDescriptor) -> Result<CollectionPage<MoodEntry>> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            Ok(CollectionPage::new(vec![sample().with_id(1)], 1))
        }

        async fn get_one(&self, id: EntityId) -> Result<MoodEntry> {
            if id == 404 {
                return Err(SyncError::NotFound(format!("mood entry {id}")));
            }
            Ok(sample().with_id(id))
        }

        async fn create(&self, record: &MoodEntry) -> Result<MoodEntry> {
            if self.fail_writes {
                return Err(SyncError::Validation("mood: must not be null".to_string()));
            }
            Ok(record.clone().with_id(5))
        }

        async fn update(&self, record: &MoodEntry) -> Result<MoodEntry> {
            Ok(record.clone())
        }

        async fn partial_update(&self, record: &MoodEntry) -> Result<MoodEntry> {
            Ok(record.clone())
        }

        async fn remove(&self, _id: EntityId) -> Result<()> {
            Ok(())
        }
    }

    fn sample() -> MoodEntry {
        MoodEntry::new(NaiveDate::from_ymd_opt(2025, 7, 22).unwrap(), MoodType::Sad)
    }

    fn orchestrator(gateway: FixedGateway) -> RequestOrchestrator<MoodEntry, Arc<FixedGateway>> {
        RequestOrchestrator::new(
            Arc::new(gateway),
            EntityStore::new(),
            PaginationDescriptor::new(20, "id"),
        )
    }

    #[tokio::test]
    async fn test_fetch_one_not_found_sets_error() {
        let orchestrator = orchestrator(FixedGateway::default());

        let err = orchestrator.fetch_one(404).await.unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::NotFound);

        let state = orchestrator.store().snapshot().unwrap();
        assert!(!state.loading);
        assert_eq!(state.error_message, Some(err.to_string()));
    }

    #[tokio::test]
    async fn test_failed_write_does_not_refresh() {
        let orchestrator = orchestrator(FixedGateway {
            fail_writes: true,
            ..FixedGateway::default()
        });

        assert!(orchestrator.create(sample()).await.is_err());
        tokio::task::yield_now().await;

        let state = orchestrator.store().snapshot().unwrap();
        assert!(!state.updating);
        assert!(!state.update_success);
        assert!(state.error_message.unwrap().contains("must not be null"));
        assert_eq!(orchestrator.gateway().lists.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_refresh_uses_initial_descriptor_before_any_list() {
        let orchestrator = orchestrator(FixedGateway::default());

        let outcome = orchestrator.create(sample()).await.unwrap();
        assert_eq!(outcome.record.unwrap().id, Some(5));
        outcome.refresh.unwrap().settled().await.unwrap();

        assert_eq!(orchestrator.gateway().lists.load(Ordering::SeqCst), 1);
        assert_eq!(orchestrator.last_descriptor().unwrap(), PaginationDescriptor::new(20, "id"));
    }
}
