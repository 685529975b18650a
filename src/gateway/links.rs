//! Pagination metadata carried in list response headers.

use crate::core::PageLinks;
use tracing::warn;
use url::form_urlencoded;

pub const TOTAL_COUNT_HEADER: &str = "x-total-count";
pub const LINK_HEADER: &str = "link";

/// Reads `x-total-count`. A missing or non-numeric header falls back to
/// `floor`, the number of records known to exist up to the end of the
/// received page.
pub fn parse_total_count(header: Option<&str>, floor: u64) -> u64 {
    match header.map(str::trim).map(str::parse::<u64>) {
        Some(Ok(total)) => total,
        Some(Err(_)) => {
            warn!(header = header.unwrap_or_default(), floor, "malformed total count header");
            floor
        }
        None => {
            warn!(floor, "list response without total count header");
            floor
        }
    }
}

/// Parses `<url>; rel="next", <url>; rel="last"` into 1-based page numbers.
///
/// The server puts zero-based `page` parameters in the link targets.
pub fn parse_link_header(header: &str) -> PageLinks {
    let mut links = PageLinks::default();
    for part in header.split('<').skip(1) {
        let Some((target, params)) = part.split_once('>') else {
            continue;
        };
        let Some(rel) = rel_of(params) else {
            continue;
        };
        let Some(page) = page_of(target) else {
            continue;
        };
        match rel {
            "first" => links.first = Some(page),
            "prev" => links.prev = Some(page),
            "next" => links.next = Some(page),
            "last" => links.last = Some(page),
            _ => {}
        }
    }
    links
}

fn rel_of(params: &str) -> Option<&str> {
    params.split(';').find_map(|param| {
        let (key, value) = param.split_once('=')?;
        (key.trim() == "rel").then(|| value.trim().trim_end_matches(',').trim().trim_matches('"'))
    })
}

fn page_of(target: &str) -> Option<u32> {
    let (_, query) = target.split_once('?')?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse::<u32>().ok())
        .map(|page| page + 1)
}
