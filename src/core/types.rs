use super::{Result, SyncError};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;
use std::str::FromStr;

pub type EntityId = i64;

/// A record of a remote resource.
///
/// `id()` is `None` until the server has persisted the record. `cleaned()`
/// returns the payload that is actually sent to the server, without the
/// derived or denormalised fields the server does not own.
pub trait EntityRecord:
    Serialize + DeserializeOwned + Clone + fmt::Debug + Default + Send + Sync + 'static
{
    fn id(&self) -> Option<EntityId>;

    fn cleaned(&self) -> Self {
        self.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = SyncError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortOrder::Asc),
            "DESC" => Ok(SortOrder::Desc),
            other => Err(SyncError::Validation(format!(
                "sort order must be ASC or DESC, got '{other}'"
            ))),
        }
    }
}

/// Page number, page size and ordering of a list request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaginationDescriptor {
    /// 1-based page shown to the user
    pub active_page: u32,
    pub items_per_page: u32,
    pub sort_field: String,
    pub sort_order: SortOrder,
}

impl PaginationDescriptor {
    pub fn new(items_per_page: u32, sort_field: impl Into<String>) -> Self {
        Self {
            active_page: 1,
            items_per_page: items_per_page.max(1),
            sort_field: sort_field.into(),
            sort_order: SortOrder::Asc,
        }
    }

    pub fn page(mut self, active_page: u32) -> Self {
        self.active_page = active_page.max(1);
        self
    }

    pub fn sorted_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_field = field.into();
        self.sort_order = order;
        self
    }

    /// Zero-based page index the server expects.
    pub fn server_page(&self) -> u32 {
        self.active_page.saturating_sub(1)
    }

    /// `field,ORDER` as used by both the URL and the list request.
    pub fn sort_param(&self) -> String {
        format!("{},{}", self.sort_field, self.sort_order)
    }

    /// Same field flips the order, another field keeps it.
    pub fn toggle_sort(&mut self, field: &str) {
        if self.sort_field == field {
            self.sort_order = self.sort_order.flipped();
        } else {
            self.sort_field = field.to_string();
        }
    }

    pub fn total_pages(&self, total_items: u64) -> u32 {
        let per_page = u64::from(self.items_per_page.max(1));
        u32::try_from(total_items.div_ceil(per_page)).unwrap_or(u32::MAX)
    }

    /// 1-based inclusive range of items shown on the active page, `None` when
    /// the page lies past the end of the collection.
    pub fn item_range(&self, total_items: u64) -> Option<(u64, u64)> {
        let per_page = u64::from(self.items_per_page.max(1));
        let start = u64::from(self.server_page()) * per_page + 1;
        if start > total_items {
            return None;
        }
        Some((start, (start + per_page - 1).min(total_items)))
    }

    pub fn is_valid(&self) -> bool {
        self.active_page >= 1 && self.items_per_page > 0 && is_sort_field(&self.sort_field)
    }
}

/// A sort field survives the `field,ORDER` location format only when it is
/// non-empty, carries no comma and has no surrounding whitespace.
pub fn is_sort_field(field: &str) -> bool {
    !field.is_empty() && field.trim() == field && !field.contains(',')
}

/// Navigation targets parsed from a `link` response header, as 1-based pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageLinks {
    pub first: Option<u32>,
    pub prev: Option<u32>,
    pub next: Option<u32>,
    pub last: Option<u32>,
}

/// One server-ordered page of records plus the size of the whole collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionPage<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    #[serde(default)]
    pub links: PageLinks,
}

impl<T> CollectionPage<T> {
    pub fn new(items: Vec<T>, total_items: u64) -> Self {
        Self {
            items,
            total_items,
            links: PageLinks::default(),
        }
    }

    pub fn with_links(mut self, links: PageLinks) -> Self {
        self.links = links;
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for CollectionPage<T> {
    fn default() -> Self {
        Self::new(Vec::new(), 0)
    }
}
