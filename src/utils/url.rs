// src/utils/url.rs

//! Pagination query parameter helpers.

use url::Url;

/// Query parameters recognized as pagination, in lookup order.
pub const PAGINATION_PARAMS: [&str; 5] = ["page", "seite", "p", "pg", "offset"];

/// Find the first recognized pagination parameter and its numeric value.
///
/// # Examples
/// ```
/// use kjpp_monitor::utils::url::page_param;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/jobs?q=arzt&seite=3").unwrap();
/// assert_eq!(page_param(&url), Some(("seite".to_string(), 3)));
/// ```
pub fn page_param(url: &Url) -> Option<(String, u64)> {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.to_lowercase(), v.into_owned()))
        .collect();

    PAGINATION_PARAMS.iter().find_map(|name| {
        pairs
            .iter()
            .find(|(key, _)| key == name)
            .and_then(|(key, value)| value.trim().parse().ok().map(|n| (key.clone(), n)))
    })
}

/// Page number encoded in the URL, defaulting to 1.
///
/// Offsets carry no page number and also yield 1.
pub fn current_page(url: &Url) -> u64 {
    match page_param(url) {
        Some((key, n)) if key != "offset" => n.max(1),
        _ => 1,
    }
}

/// Synthesize the URL of the following page.
///
/// Increments the first recognized pagination parameter (`offset` by
/// `offset_step`, everything else by one) or appends `page=2` when the URL
/// carries none. Returns `None` for an offset with a zero step, a value
/// that would overflow, or a non-numeric `page` already in the query.
pub fn next_page_url(url: &Url, offset_step: usize) -> Option<Url> {
    let (key, next_value) = match page_param(url) {
        Some((key, _)) if key == "offset" && offset_step == 0 => return None,
        Some((key, value)) if key == "offset" => {
            (key, value.checked_add(u64::try_from(offset_step).ok()?)?)
        }
        Some((key, value)) => (key, value.checked_add(1)?),
        None if url.query_pairs().any(|(k, _)| k.eq_ignore_ascii_case("page")) => return None,
        None => ("page".to_string(), 2),
    };

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    match pairs.iter_mut().find(|(k, _)| k.to_lowercase() == key) {
        Some(pair) => pair.1 = next_value.to_string(),
        None => pairs.push((key, next_value.to_string())),
    }

    let mut next = url.clone();
    next.set_fragment(None);
    next.query_pairs_mut().clear().extend_pairs(pairs);
    Some(next)
}
