//! Catalog paging through the `Link` response header.
//!
//! ```text
//! <https://shop.com/products.json?limit=250&page_info=PREV>; rel="previous",
//! <https://shop.com/products.json?limit=250&page_info=NEXT>; rel="next"
//! ```

use reqwest::Url;

/// The `page_info` cursor of the `rel="next"` link, or `None` on the last page.
#[must_use]
pub fn extract_next_cursor(link_header: Option<&str>) -> Option<String> {
    let next = link_header?
        .split(',')
        .filter_map(parse_link)
        .find(|(_, rel)| rel.split_whitespace().any(|r| r == "next"))?;

    Url::parse(next.0)
        .ok()?
        .query_pairs()
        .find(|(name, _)| name == "page_info")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Splits `<url>; rel="x"` into its target and relation.
fn parse_link(directive: &str) -> Option<(&str, &str)> {
    let (target, params) = directive.trim().split_once(';')?;
    let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;
    let rel = params.split(';').find_map(|param| {
        let (key, value) = param.split_once('=')?;
        (key.trim().eq_ignore_ascii_case("rel")).then(|| value.trim().trim_matches('"'))
    })?;
    Some((target, rel))
}
