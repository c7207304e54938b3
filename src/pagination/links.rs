//! Page link building

use url::Url;

/// Set `key` to `value` on the query string of `url`
///
/// Any existing values for `key` are replaced. The remaining parameters are
/// kept and sorted by key so the same page always yields the same link;
/// repeated keys keep their relative order.
pub fn replace_query_param(url: &Url, key: &str, value: &str) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.push((key.to_string(), value.to_string()));
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let mut url = url.clone();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url.into()
}
