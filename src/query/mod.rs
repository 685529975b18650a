//! Conversion between a [`PaginationDescriptor`] and the query strings that
//! carry it: the navigable location (`page`, `sort`) and the list request
//! sent to the server (`page`, `size`, `sort`, `cacheBuster`).

pub mod sync;

pub use sync::{QuerySync, SortIndicator, SyncAction};

use crate::core::{PaginationDescriptor, SortOrder};
use url::form_urlencoded;

pub const PAGE_PARAM: &str = "page";
pub const SORT_PARAM: &str = "sort";
pub const SIZE_PARAM: &str = "size";
pub const CACHE_BUSTER_PARAM: &str = "cacheBuster";

/// Renders the location query for `descriptor`, without a leading `?`.
///
/// The page size is a local setting and never appears in the location.
pub fn encode(descriptor: &PaginationDescriptor) -> String {
    let field: String = form_urlencoded::byte_serialize(descriptor.sort_field.as_bytes()).collect();
    format!(
        "{PAGE_PARAM}={}&{SORT_PARAM}={field},{}",
        descriptor.active_page, descriptor.sort_order
    )
}

/// Reads `page` and `sort` out of a location query. Every part that is
/// missing or malformed is taken from `fallback`.
pub fn decode(query: &str, fallback: &PaginationDescriptor) -> PaginationDescriptor {
    let params = LocationParams::parse(query);
    let mut descriptor = fallback.clone();

    if let Some(page) = params.page.as_deref().and_then(parse_page) {
        descriptor.active_page = page;
    }
    if let Some((field, order)) = params.sort.as_deref().and_then(parse_sort) {
        descriptor.sort_field = field;
        descriptor.sort_order = order;
    }
    descriptor
}

/// Query pairs of the server list request. The page is zero-based on the wire.
pub fn list_request_params(
    descriptor: &PaginationDescriptor,
    cache_buster: i64,
) -> Vec<(&'static str, String)> {
    vec![
        (PAGE_PARAM, descriptor.server_page().to_string()),
        (SIZE_PARAM, descriptor.items_per_page.to_string()),
        (SORT_PARAM, descriptor.sort_param()),
        (CACHE_BUSTER_PARAM, cache_buster.to_string()),
    ]
}

/// Raw `page` and `sort` values of a location query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LocationParams {
    pub page: Option<String>,
    pub sort: Option<String>,
}

impl LocationParams {
    pub fn parse(query: &str) -> Self {
        let query = query.trim().trim_start_matches('?');
        let mut params = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                PAGE_PARAM if params.page.is_none() => params.page = Some(value.into_owned()),
                SORT_PARAM if params.sort.is_none() => params.sort = Some(value.into_owned()),
                _ => {}
            }
        }
        params
    }

    pub fn is_complete(&self) -> bool {
        self.page.is_some() && self.sort.is_some()
    }
}

fn parse_page(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|page| *page >= 1)
}

fn parse_sort(raw: &str) -> Option<(String, SortOrder)> {
    let tokens: Vec<&str> = raw.split(',').collect();
    if tokens.len() != 2 {
        return None;
    }
    let field = tokens[0].trim();
    if field.is_empty() {
        return None;
    }
    let order = tokens[1].parse::<SortOrder>().ok()?;
    Some((field.to_string(), order))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fallback() -> PaginationDescriptor {
        PaginationDescriptor::new(20, "id")
    }

    #[test]
    fn test_encode_omits_page_size() {
        let descriptor = fallback().page(3).sorted_by("date", SortOrder::Desc);
        assert_eq!(encode(&descriptor), "page=3&sort=date,DESC");
    }

    #[test]
    fn test_decode_reads_page_and_sort() {
        let descriptor = decode("?page=4&sort=mood,desc", &fallback());
        assert_eq!(descriptor.active_page, 4);
        assert_eq!(descriptor.sort_field, "mood");
        assert_eq!(descriptor.sort_order, SortOrder::Desc);
        assert_eq!(descriptor.items_per_page, 20);
    }

    #[test]
    fn test_decode_falls_back_per_field() {
        let base = fallback().page(2);

        let bad_page = decode("page=zero&sort=date,ASC", &base);
        assert_eq!(bad_page.active_page, 2);
        assert_eq!(bad_page.sort_field, "date");

        let no_page = decode("page=0&sort=date,ASC", &base);
        assert_eq!(no_page.active_page, 2);

        let too_many_tokens = decode("page=5&sort=date,ASC,extra", &base);
        assert_eq!(too_many_tokens.active_page, 5);
        assert_eq!(too_many_tokens.sort_field, "id");
        assert_eq!(too_many_tokens.sort_order, SortOrder::Asc);

        let one_token = decode("page=5&sort=date", &base);
        assert_eq!(one_token.sort_field, "id");

        let bad_order = decode("sort=date,sideways", &base);
        assert_eq!(bad_order, base);

        assert_eq!(decode("", &base), base);
    }

    #[test]
    fn test_list_request_params_use_zero_based_page() {
        let descriptor = fallback().sorted_by("date", SortOrder::Desc);
        let params = list_request_params(&descriptor, 1_700_000_000_000);
        assert_eq!(
            params,
            vec![
                ("page", "0".to_string()),
                ("size", "20".to_string()),
                ("sort", "date,DESC".to_string()),
                ("cacheBuster", "1700000000000".to_string()),
            ]
        );
    }

    #[test]
    fn test_location_params_completeness() {
        assert!(LocationParams::parse("?page=1&sort=id,ASC").is_complete());
        assert!(!LocationParams::parse("?page=1").is_complete());
    }
}
