//! Remote side of a resource: the request kinds the synchronizer knows about
//! and the capability that performs them.

pub mod http;
pub mod links;

pub use http::HttpGateway;

use crate::core::{CollectionPage, EntityId, EntityRecord, PaginationDescriptor, Result};
use async_trait::async_trait;
use reqwest::Method;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    List,
    GetOne,
    Create,
    Update,
    PartialUpdate,
    Delete,
}

/// Which of the two status flags a request drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// `loading`
    Read,
    /// `updating`
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestPolicy {
    pub class: RequestClass,
    pub refresh_after: bool,
}

impl RequestKind {
    pub const ALL: [RequestKind; 6] = [
        RequestKind::List,
        RequestKind::GetOne,
        RequestKind::Create,
        RequestKind::Update,
        RequestKind::PartialUpdate,
        RequestKind::Delete,
    ];

    pub const fn policy(self) -> RequestPolicy {
        use RequestClass::{Read, Write};
        let (class, refresh_after) = match self {
            RequestKind::List | RequestKind::GetOne => (Read, false),
            RequestKind::Create
            | RequestKind::Update
            | RequestKind::PartialUpdate
            | RequestKind::Delete => (Write, true),
        };
        RequestPolicy {
            class,
            refresh_after,
        }
    }

    /// HTTP verb the REST gateway sends for this kind.
    pub fn method(self) -> Method {
        match self {
            RequestKind::List | RequestKind::GetOne => Method::GET,
            RequestKind::Create => Method::POST,
            RequestKind::Update => Method::PUT,
            RequestKind::PartialUpdate => Method::PATCH,
            RequestKind::Delete => Method::DELETE,
        }
    }

    pub const fn class(self) -> RequestClass {
        self.policy().class
    }

    pub const fn triggers_refresh(self) -> bool {
        self.policy().refresh_after
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::List => "list",
            RequestKind::GetOne => "get_one",
            RequestKind::Create => "create",
            RequestKind::Update => "update",
            RequestKind::PartialUpdate => "partial_update",
            RequestKind::Delete => "delete",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote operations on one resource collection.
///
/// Implementations send `record.cleaned()` rather than the record itself.
#[async_trait]
pub trait RemoteCollection<T: EntityRecord>: Send + Sync {
    /// Name used in logs, usually the resource path.
    fn resource(&self) -> &str;

    async fn list(&self, descriptor: &PaginationDescriptor) -> Result<CollectionPage<T>>;
    async fn get_one(&self, id: EntityId) -> Result<T>;
    async fn create(&self, record: &T) -> Result<T>;
    async fn update(&self, record: &T) -> Result<T>;
    async fn partial_update(&self, record: &T) -> Result<T>;
    async fn remove(&self, id: EntityId) -> Result<()>;
}

#[async_trait]
impl<T, G> RemoteCollection<T> for Arc<G>
where
    T: EntityRecord,
    G: RemoteCollection<T> + ?Sized,
{
    fn resource(&self) -> &str {
        (**self).resource()
    }

    async fn list(&self, descriptor: &PaginationDescriptor) -> Result<CollectionPage<T>> {
        (**self).list(descriptor).await
    }

    async fn get_one(&self, id: EntityId) -> Result<T> {
        (**self).get_one(id).await
    }

    async fn create(&self, record: &T) -> Result<T> {
        (**self).create(record).await
    }

    async fn update(&self, record: &T) -> Result<T> {
        (**self).update(record).await
    }

    async fn partial_update(&self, record: &T) -> Result<T> {
        (**self).partial_update(record).await
    }

    async fn remove(&self, id: EntityId) -> Result<()> {
        (**self).remove(id).await
    }
}
