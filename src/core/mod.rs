pub mod error;
pub mod model;
pub mod types;

pub use error::{ErrorKind, Result, SyncError};
pub use model::{MoodEntry, MoodType, UserRef};
pub use types::{
    CollectionPage, EntityId, EntityRecord, PageLinks, PaginationDescriptor, SortOrder,
    is_sort_field,
};
