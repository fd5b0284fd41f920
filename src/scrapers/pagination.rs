//! Thread-list URL construction for the supported page addressing schemes.

use super::config::{PaginationConfig, PaginationMode};

/// Join a base URL and a subforum path without doubling or dropping slashes.
///
/// Absolute subforum URLs are returned unchanged.
pub fn join_base(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        format!("{}/", base)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Build the URL of page `page` (1-based) of a subforum's thread list.
///
/// Page 1 never carries a page suffix or parameter.
pub fn build_list_url(
    base_url: &str,
    subforum_path: &str,
    page: u32,
    config: &PaginationConfig,
) -> String {
    let url = join_base(base_url, subforum_path);
    if page <= 1 {
        return url;
    }

    match config.mode {
        PaginationMode::IndexHtml => {
            let (path, query) = split_query(&url);
            let sep = if path.ends_with('/') { "" } else { "/" };
            format!("{}{}index{}.html{}", path, sep, page, query)
        }
        PaginationMode::PagePath => {
            let (path, query) = split_query(&url);
            let trailing = if config.trailing_slash { "/" } else { "" };
            format!(
                "{}/{}{}{}{}",
                path.trim_end_matches('/'),
                config.segment,
                page,
                trailing,
                query
            )
        }
        PaginationMode::QueryParam => {
            let sep = if url.contains('?') { '&' } else { '?' };
            format!(
                "{}{}{}={}",
                url,
                sep,
                urlencoding::encode(&config.param_name),
                page
            )
        }
    }
}

/// Split `url` into the part before `?` and the query suffix (including `?`).
fn split_query(url: &str) -> (&str, &str) {
    match url.find('?') {
        Some(idx) => url.split_at(idx),
        None => (url, ""),
    }
}
