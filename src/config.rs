use crate::core::{PaginationDescriptor, Result, SortOrder, SyncError, is_sort_field};
use std::env;
use std::time::Duration;

pub const DEFAULT_ITEMS_PER_PAGE: u32 = 20;

/// Settings for synchronizing one remote resource.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Server root, e.g. `http://localhost:8080/`
    pub base_url: String,

    /// Resource path relative to `base_url`
    pub resource_path: String,

    /// Page size; local only, never written to the location
    pub items_per_page: u32,

    pub default_sort_field: String,

    pub default_sort_order: SortOrder,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/".to_string(),
            resource_path: "api/mood-entries".to_string(),
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            default_sort_field: "id".to_string(),
            default_sort_order: SortOrder::Asc,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl SyncConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn resource_path(mut self, path: &str) -> Self {
        self.resource_path = path.to_string();
        self
    }

    pub fn items_per_page(mut self, items: u32) -> Self {
        self.items_per_page = items;
        self
    }

    pub fn default_sort(mut self, field: &str, order: SortOrder) -> Self {
        self.default_sort_field = field.to_string();
        self.default_sort_order = order;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Loads `.env` if present, then reads `ENTITY_SYNC_*` variables over the defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from `ENTITY_SYNC_*` values supplied by `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(base_url) = lookup("ENTITY_SYNC_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(resource) = lookup("ENTITY_SYNC_RESOURCE") {
            config.resource_path = resource;
        }
        if let Some(raw) = lookup("ENTITY_SYNC_PAGE_SIZE") {
            config.items_per_page = raw.trim().parse::<u32>().map_err(|_| {
                SyncError::Config("ENTITY_SYNC_PAGE_SIZE must be a valid u32".to_string())
            })?;
        }
        if let Some(raw) = lookup("ENTITY_SYNC_SORT") {
            let (field, order) = raw.split_once(',').ok_or_else(|| {
                SyncError::Config("ENTITY_SYNC_SORT must look like 'field,ASC'".to_string())
            })?;
            config.default_sort_field = field.trim().to_string();
            config.default_sort_order = order
                .parse()
                .map_err(|err: SyncError| SyncError::Config(err.to_string()))?;
        }
        if let Some(raw) = lookup("ENTITY_SYNC_TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                SyncError::Config("ENTITY_SYNC_TIMEOUT_SECS must be a valid u64".to_string())
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(SyncError::Config("base_url cannot be empty".to_string()));
        }

        if self.resource_path.trim_matches('/').is_empty() {
            return Err(SyncError::Config("resource_path cannot be empty".to_string()));
        }

        if self.items_per_page == 0 {
            return Err(SyncError::Config("items_per_page must be > 0".to_string()));
        }

        if !is_sort_field(&self.default_sort_field) {
            return Err(SyncError::Config(
                "default_sort_field must be a non-empty field name".to_string(),
            ));
        }

        Ok(())
    }

    /// Descriptor a list view starts from before the location is consulted.
    pub fn default_descriptor(&self) -> PaginationDescriptor {
        PaginationDescriptor::new(self.items_per_page, self.default_sort_field.clone())
            .sorted_by(self.default_sort_field.clone(), self.default_sort_order)
    }
}
