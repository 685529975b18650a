use super::state::{EntityState, StoreEvent};
use crate::core::Result;
use crate::gateway::RequestKind;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Proof that a request was dispatched through the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub kind: RequestKind,
    pub seq: u64,
    read_epoch: u64,
}

/// Outcome of handing a resolution to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    Applied,
    /// A newer list request or an abandon superseded this one.
    Discarded,
}

struct StoreInner<T> {
    state: EntityState<T>,
    next_seq: u64,
    latest_list_seq: u64,
    read_epoch: u64,
}

/// Shared handle to one resource's [`EntityState`].
///
/// Every transition runs under a single lock, so readers never observe a
/// half-applied event. Clones share the same state.
pub struct EntityStore<T> {
    inner: Arc<Mutex<StoreInner<T>>>,
}

impl<T> Clone for EntityStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EntityStore<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                state: EntityState::default(),
                next_seq: 0,
                latest_list_seq: 0,
                read_epoch: 0,
            })),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&EntityState<T>) -> R) -> Result<R> {
        let inner = self.inner.lock()?;
        Ok(f(&inner.state))
    }

    /// Applies the dispatch transition and issues a ticket with a fresh sequence number.
    pub fn begin(&self, kind: RequestKind) -> Result<Ticket> {
        let mut inner = self.inner.lock()?;
        inner.next_seq += 1;
        let seq = inner.next_seq;
        if kind == RequestKind::List {
            inner.latest_list_seq = seq;
        }
        inner.state.apply(StoreEvent::Dispatched(kind));
        Ok(Ticket {
            kind,
            seq,
            read_epoch: inner.read_epoch,
        })
    }

    /// Applies a resolution unless it has been superseded.
    ///
    /// A list result commits only when it belongs to the newest list request;
    /// read results are dropped after [`EntityStore::abandon_reads`]. Write
    /// results always commit.
    pub fn commit(&self, ticket: &Ticket, event: StoreEvent<T>) -> Result<Commit> {
        let mut inner = self.inner.lock()?;
        let superseded = match ticket.kind {
            RequestKind::List => {
                ticket.seq != inner.latest_list_seq || ticket.read_epoch != inner.read_epoch
            }
            RequestKind::GetOne => ticket.read_epoch != inner.read_epoch,
            _ => false,
        };
        if superseded {
            debug!(
                kind = %ticket.kind,
                seq = ticket.seq,
                latest_list_seq = inner.latest_list_seq,
                "discarding superseded result"
            );
            return Ok(Commit::Discarded);
        }
        inner.state.apply(event);
        Ok(Commit::Applied)
    }

    pub fn reset(&self) -> Result<()> {
        self.inner.lock()?.state.apply(StoreEvent::Reset);
        Ok(())
    }

    /// Makes every in-flight list and get request unable to commit.
    pub fn abandon_reads(&self) -> Result<()> {
        let mut inner = self.inner.lock()?;
        inner.read_epoch += 1;
        inner.state.apply(StoreEvent::ReadsAbandoned);
        Ok(())
    }
}

impl<T: Clone> EntityStore<T> {
    pub fn snapshot(&self) -> Result<EntityState<T>> {
        self.read(|state| state.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CollectionPage;

    #[test]
    fn test_only_newest_list_commits() {
        let store = EntityStore::<i64>::new();
        let older = store.begin(RequestKind::List).unwrap();
        let newer = store.begin(RequestKind::List).unwrap();
        assert!(newer.seq > older.seq);

        let applied = store
            .commit(&newer, StoreEvent::ListResolved(CollectionPage::new(vec![2], 1)))
            .unwrap();
        let discarded = store
            .commit(&older, StoreEvent::ListResolved(CollectionPage::new(vec![1], 1)))
            .unwrap();

        assert_eq!(applied, Commit::Applied);
        assert_eq!(discarded, Commit::Discarded);
        assert_eq!(store.snapshot().unwrap().entities, vec![2]);
    }

    #[test]
    fn test_stale_failure_is_discarded() {
        let store = EntityStore::<i64>::new();
        let older = store.begin(RequestKind::List).unwrap();
        let _newer = store.begin(RequestKind::List).unwrap();

        let commit = store
            .commit(&older, StoreEvent::Failed(RequestKind::List, "late".to_string()))
            .unwrap();

        assert_eq!(commit, Commit::Discarded);
        let state = store.snapshot().unwrap();
        assert!(state.loading);
        assert_eq!(state.error_message, None);
    }

    #[test]
    fn test_abandon_drops_reads_but_not_writes() {
        let store = EntityStore::<i64>::new();
        let list = store.begin(RequestKind::List).unwrap();
        let get = store.begin(RequestKind::GetOne).unwrap();
        let create = store.begin(RequestKind::Create).unwrap();

        store.abandon_reads().unwrap();
        assert!(!store.snapshot().unwrap().loading);

        assert_eq!(
            store
                .commit(&list, StoreEvent::ListResolved(CollectionPage::new(vec![1], 1)))
                .unwrap(),
            Commit::Discarded
        );
        assert_eq!(store.commit(&get, StoreEvent::GetResolved(1)).unwrap(), Commit::Discarded);
        assert_eq!(store.commit(&create, StoreEvent::Saved(3)).unwrap(), Commit::Applied);
        assert_eq!(store.snapshot().unwrap().entity, Some(3));
    }

    #[test]
    fn test_clones_share_state() {
        let store = EntityStore::<i64>::new();
        let view = store.clone();
        let ticket = store.begin(RequestKind::Create).unwrap();
        store.commit(&ticket, StoreEvent::Saved(8)).unwrap();
        assert_eq!(view.snapshot().unwrap().entity, Some(8));
    }
}
