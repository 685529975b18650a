use super::{LocationParams, decode, encode};
use crate::core::{PaginationDescriptor, SortOrder, is_sort_field};

/// What the caller has to do after the pagination state changed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncAction {
    /// The list must be fetched again with the current descriptor.
    pub fetch: bool,
    /// Location query (without `?`) the caller should navigate to.
    pub navigate: Option<String>,
}

impl SyncAction {
    pub fn none() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortIndicator {
    Unsorted,
    Ascending,
    Descending,
}

/// Keeps a list view's descriptor and its location query in step.
///
/// State changes coming from the user (`sort`, `set_page`) produce a fetch and,
/// when the location differs, a navigation. Location changes coming from the
/// router (`on_location_change`) update the descriptor and produce a fetch
/// when the descriptor actually moved.
#[derive(Debug, Clone)]
pub struct QuerySync {
    descriptor: PaginationDescriptor,
    location: String,
}

impl QuerySync {
    /// Starts from `defaults` overridden by whatever the initial location carries.
    pub fn new(defaults: PaginationDescriptor, location: &str) -> Self {
        Self {
            descriptor: decode(location, &defaults),
            location: normalize(location),
        }
    }

    pub fn descriptor(&self) -> &PaginationDescriptor {
        &self.descriptor
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Router reported a new location. Only a location carrying both `page`
    /// and `sort` overrides the descriptor.
    pub fn on_location_change(&mut self, location: &str) -> SyncAction {
        self.location = normalize(location);
        if !LocationParams::parse(location).is_complete() {
            return SyncAction::none();
        }

        let next = decode(location, &self.descriptor);
        if next == self.descriptor {
            return SyncAction::none();
        }
        self.descriptor = next;
        self.sync_list()
    }

    /// Toggles sorting on `field`. Names the location format cannot carry
    /// are ignored.
    pub fn sort(&mut self, field: &str) -> SyncAction {
        if !is_sort_field(field) {
            return SyncAction::none();
        }
        self.descriptor.toggle_sort(field);
        self.sync_list()
    }

    pub fn set_page(&mut self, page: u32) -> SyncAction {
        let page = page.max(1);
        if page == self.descriptor.active_page {
            return SyncAction::none();
        }
        self.descriptor.active_page = page;
        self.sync_list()
    }

    /// Fetch with the current descriptor and bring the location in line with it.
    pub fn sync_list(&mut self) -> SyncAction {
        let wanted = encode(&self.descriptor);
        let navigate = if wanted != self.location {
            self.location = wanted.clone();
            Some(wanted)
        } else {
            None
        };
        SyncAction {
            fetch: true,
            navigate,
        }
    }

    pub fn sort_indicator(&self, field: &str) -> SortIndicator {
        if self.descriptor.sort_field != field {
            return SortIndicator::Unsorted;
        }
        match self.descriptor.sort_order {
            SortOrder::Asc => SortIndicator::Ascending,
            SortOrder::Desc => SortIndicator::Descending,
        }
    }
}

fn normalize(location: &str) -> String {
    location.trim().trim_start_matches('?').to_string()
}
