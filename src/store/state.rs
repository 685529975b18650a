use crate::core::{CollectionPage, PageLinks};
use crate::gateway::{RequestClass, RequestKind};
use serde::Serialize;

/// Client-side cache of one resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityState<T> {
    /// Last committed list page, replaced wholesale.
    pub entities: Vec<T>,
    /// Last fetched, created or updated record.
    pub entity: Option<T>,
    pub loading: bool,
    pub updating: bool,
    pub update_success: bool,
    pub error_message: Option<String>,
    pub total_items: u64,
    pub links: PageLinks,
}

impl<T> Default for EntityState<T> {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            entity: None,
            loading: false,
            updating: false,
            update_success: false,
            error_message: None,
            total_items: 0,
            links: PageLinks::default(),
        }
    }
}

/// Inputs of the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent<T> {
    Dispatched(RequestKind),
    ListResolved(CollectionPage<T>),
    GetResolved(T),
    /// Create, update or partial update came back with the stored record.
    Saved(T),
    Deleted,
    Failed(RequestKind, String),
    Reset,
    /// In-flight reads were abandoned by the caller.
    ReadsAbandoned,
}

impl<T> EntityState<T> {
    pub fn apply(&mut self, event: StoreEvent<T>) {
        match event {
            StoreEvent::Dispatched(kind) => {
                self.error_message = None;
                self.update_success = false;
                match kind.class() {
                    RequestClass::Read => self.loading = true,
                    RequestClass::Write => self.updating = true,
                }
            }
            StoreEvent::ListResolved(page) => {
                self.entities = page.items;
                self.total_items = page.total_items;
                self.links = page.links;
                self.loading = false;
            }
            StoreEvent::GetResolved(record) => {
                self.entity = Some(record);
                self.loading = false;
            }
            StoreEvent::Saved(record) => {
                self.entity = Some(record);
                self.updating = false;
                self.update_success = true;
            }
            StoreEvent::Deleted => {
                self.entity = None;
                self.updating = false;
                self.update_success = true;
            }
            StoreEvent::Failed(kind, message) => {
                match kind.class() {
                    RequestClass::Read => self.loading = false,
                    RequestClass::Write => self.updating = false,
                }
                self.error_message = Some(message);
            }
            StoreEvent::Reset => {
                self.entity = None;
                self.update_success = false;
            }
            StoreEvent::ReadsAbandoned => {
                self.loading = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(ids: &[i64], total: u64) -> CollectionPage<i64> {
        CollectionPage::new(ids.to_vec(), total)
    }

    #[test]
    fn test_read_cycle() {
        let mut state = EntityState::<i64>::default();
        state.error_message = Some("old".to_string());
        state.update_success = true;

        state.apply(StoreEvent::Dispatched(RequestKind::List));
        assert!(state.loading);
        assert!(!state.update_success);
        assert_eq!(state.error_message, None);

        state.apply(StoreEvent::ListResolved(page(&[1, 2], 7)));
        assert!(!state.loading);
        assert_eq!(state.entities, vec![1, 2]);
        assert_eq!(state.total_items, 7);

        state.apply(StoreEvent::Dispatched(RequestKind::GetOne));
        state.apply(StoreEvent::GetResolved(2));
        assert_eq!(state.entity, Some(2));
        assert!(!state.loading);
    }

    #[test]
    fn test_list_page_is_replaced_not_merged() {
        let mut state = EntityState::<i64>::default();
        state.apply(StoreEvent::ListResolved(page(&[1, 2, 3], 3)));
        state.apply(StoreEvent::ListResolved(page(&[9], 1)));
        assert_eq!(state.entities, vec![9]);
        assert_eq!(state.total_items, 1);
    }

    #[test]
    fn test_write_cycle() {
        let mut state = EntityState::<i64>::default();

        state.apply(StoreEvent::Dispatched(RequestKind::Create));
        assert!(state.updating);
        assert!(!state.loading);

        state.apply(StoreEvent::Saved(5));
        assert_eq!(state.entity, Some(5));
        assert!(!state.updating);
        assert!(state.update_success);

        state.apply(StoreEvent::Dispatched(RequestKind::Delete));
        assert!(!state.update_success);
        state.apply(StoreEvent::Deleted);
        assert_eq!(state.entity, None);
        assert!(state.update_success);
    }

    #[test]
    fn test_failures_clear_only_their_own_flag() {
        let mut state = EntityState::<i64>::default();
        state.apply(StoreEvent::Dispatched(RequestKind::List));
        state.apply(StoreEvent::Dispatched(RequestKind::Update));

        state.apply(StoreEvent::Failed(RequestKind::Update, "bad".to_string()));
        assert!(state.loading);
        assert!(!state.updating);
        assert!(!state.update_success);
        assert_eq!(state.error_message.as_deref(), Some("bad"));

        state.apply(StoreEvent::Failed(RequestKind::List, "down".to_string()));
        assert!(!state.loading);
        assert_eq!(state.error_message.as_deref(), Some("down"));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut state = EntityState::<i64>::default();
        state.apply(StoreEvent::Saved(5));

        state.apply(StoreEvent::Reset);
        let once = state.clone();
        state.apply(StoreEvent::Reset);

        assert_eq!(state, once);
        assert_eq!(state.entity, None);
        assert!(!state.update_success);
    }
}
