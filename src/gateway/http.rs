use super::{RemoteCollection, RequestKind};
use super::links::{LINK_HEADER, TOTAL_COUNT_HEADER, parse_link_header, parse_total_count};
use crate::config::SyncConfig;
use crate::core::{CollectionPage, EntityId, EntityRecord, PaginationDescriptor, Result, SyncError};
use crate::query::list_request_params;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value as JsonValue;
use std::marker::PhantomData;
use tracing::debug;
use url::Url;

const MERGE_PATCH_JSON: &str = "application/merge-patch+json";

/// [`RemoteCollection`] over a JSON REST endpoint.
pub struct HttpGateway<T> {
    client: Client,
    collection_url: Url,
    resource: String,
    _record: PhantomData<fn() -> T>,
}

impl<T: EntityRecord> HttpGateway<T> {
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| SyncError::Config(err.to_string()))?;
        Self::with_client(client, config)
    }

    /// Uses a caller-provided client, e.g. one sharing a connection pool or auth headers.
    pub fn with_client(client: Client, config: &SyncConfig) -> Result<Self> {
        config.validate()?;
        let collection_url = collection_url(&config.base_url, &config.resource_path)?;
        Ok(Self {
            client,
            collection_url,
            resource: config.resource_path.trim_matches('/').to_string(),
            _record: PhantomData,
        })
    }

    pub fn collection_url(&self) -> &Url {
        &self.collection_url
    }

    fn item_url(&self, id: EntityId) -> Result<Url> {
        let mut url = self.collection_url.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::Config(format!("{} cannot carry an id", self.collection_url)))?
            .push(&id.to_string());
        Ok(url)
    }

    fn request(&self, kind: RequestKind, url: Url) -> RequestBuilder {
        self.client.request(kind.method(), url)
    }

    fn require_id(record: &T) -> Result<EntityId> {
        record
            .id()
            .ok_or_else(|| SyncError::Validation("record has no id".to_string()))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(failure(response).await)
    }

    async fn send_record(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl<T: EntityRecord> RemoteCollection<T> for HttpGateway<T> {
    fn resource(&self) -> &str {
        &self.resource
    }

    async fn list(&self, descriptor: &PaginationDescriptor) -> Result<CollectionPage<T>> {
        let params = list_request_params(descriptor, Utc::now().timestamp_millis());
        debug!(resource = %self.resource, ?params, "GET list");

        let response = self
            .send(
                self.request(RequestKind::List, self.collection_url.clone())
                    .query(&params),
            )
            .await?;

        let total_header = header_str(&response, TOTAL_COUNT_HEADER);
        let links = header_str(&response, LINK_HEADER)
            .map(|header| parse_link_header(&header))
            .unwrap_or_default();

        let items = response.json::<Vec<T>>().await?;
        // records before this page plus the ones received
        let floor = u64::from(descriptor.server_page()) * u64::from(descriptor.items_per_page)
            + items.len() as u64;
        let total_items = parse_total_count(total_header.as_deref(), floor);

        Ok(CollectionPage::new(items, total_items).with_links(links))
    }

    async fn get_one(&self, id: EntityId) -> Result<T> {
        self.send_record(self.request(RequestKind::GetOne, self.item_url(id)?))
            .await
    }

    async fn create(&self, record: &T) -> Result<T> {
        let body = record.cleaned();
        self.send_record(
            self.request(RequestKind::Create, self.collection_url.clone())
                .json(&body),
        )
        .await
    }

    async fn update(&self, record: &T) -> Result<T> {
        let id = Self::require_id(record)?;
        let body = record.cleaned();
        self.send_record(self.request(RequestKind::Update, self.item_url(id)?).json(&body))
            .await
    }

    async fn partial_update(&self, record: &T) -> Result<T> {
        let id = Self::require_id(record)?;
        let body = serde_json::to_vec(&record.cleaned())?;
        self.send_record(
            self.request(RequestKind::PartialUpdate, self.item_url(id)?)
                .header(CONTENT_TYPE, MERGE_PATCH_JSON)
                .body(body),
        )
        .await
    }

    async fn remove(&self, id: EntityId) -> Result<()> {
        self.send(self.request(RequestKind::Delete, self.item_url(id)?))
            .await?;
        Ok(())
    }
}

fn collection_url(base_url: &str, resource_path: &str) -> Result<Url> {
    let mut base = base_url.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    let base = Url::parse(&base)?;
    Ok(base.join(resource_path.trim_matches('/'))?)
}

fn header_str(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Turns an error response into the taxonomy, keeping the server's own wording.
async fn failure(response: Response) -> SyncError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = problem_message(&body)
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_string()
        });
    SyncError::from_status(status.as_u16(), message)
}

/// Extracts a readable message from a problem-details or `{"error": ...}` body.
fn problem_message(body: &str) -> Option<String> {
    let json: JsonValue = serde_json::from_str(body).ok()?;
    let headline = ["detail", "title", "message", "error"]
        .iter()
        .find_map(|key| json.get(key).and_then(JsonValue::as_str))
        .map(str::to_string);

    let field_errors: Vec<String> = json
        .get("fieldErrors")
        .and_then(JsonValue::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|error| {
                    let field = error.get("field")?.as_str()?;
                    let message = error.get("message")?.as_str()?;
                    Some(format!("{field}: {message}"))
                })
                .collect()
        })
        .unwrap_or_default();

    match (headline, field_errors.is_empty()) {
        (Some(headline), true) => Some(headline),
        (Some(headline), false) => Some(format!("{headline} ({})", field_errors.join(", "))),
        (None, false) => Some(field_errors.join(", ")),
        (None, true) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MoodEntry;

    #[test]
    fn test_collection_url_joins_resource() {
        let url = collection_url("http://localhost:8080", "/api/mood-entries").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/mood-entries");

        let nested = collection_url("http://localhost:8080/app/", "api/mood-entries").unwrap();
        assert_eq!(nested.as_str(), "http://localhost:8080/app/api/mood-entries");
    }

    #[test]
    fn test_item_url() {
        let gateway =
            HttpGateway::<MoodEntry>::new(&SyncConfig::new("http://localhost:8080")).unwrap();
        assert_eq!(
            gateway.item_url(5).unwrap().as_str(),
            "http://localhost:8080/api/mood-entries/5"
        );
    }

    #[test]
    fn test_problem_message() {
        let body = r#"{"title":"Method argument not valid","fieldErrors":[{"field":"mood","message":"must not be null"}]}"#;
        assert_eq!(
            problem_message(body).as_deref(),
            Some("Method argument not valid (mood: must not be null)")
        );
        assert_eq!(
            problem_message(r#"{"error":"todo not found"}"#).as_deref(),
            Some("todo not found")
        );
        assert_eq!(problem_message("plain text"), None);
    }
}
