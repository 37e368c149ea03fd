//! Cookbook listing shapes served by the two Chef server generations.
//!
//! Legacy servers answer `GET /cookbooks` with `{"name": "url"}` and a
//! cookbook's versions with `{"name": ["0.1.0", ...]}`. Newer servers answer
//! both with `{"name": {"url": ..., "versions": [{"url": ..., "version": ...}]}}`.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::{error::CodecResult, json::decode_map};

#[derive(Debug, Deserialize)]
struct CookbookEntry {
    #[serde(default)]
    versions: Vec<VersionEntry>,
}

#[derive(Debug, Deserialize)]
struct VersionEntry {
    version: String,
}

pub(super) fn legacy_names(body: &str) -> CodecResult<BTreeSet<String>> {
    let listing = decode_map::<String, String>(body)?;
    Ok(listing.into_iter().map(|(name, _)| name).collect())
}

pub(super) fn modern_names(body: &str) -> CodecResult<BTreeSet<String>> {
    let listing = decode_map::<String, CookbookEntry>(body)?;
    Ok(listing.into_iter().map(|(name, _)| name).collect())
}

pub(super) fn legacy_versions(body: &str) -> CodecResult<BTreeSet<String>> {
    let listing = decode_map::<String, Vec<String>>(body)?;
    Ok(first_cookbook(listing)
        .map(|versions| versions.into_iter().collect())
        .unwrap_or_default())
}

pub(super) fn modern_versions(body: &str) -> CodecResult<BTreeSet<String>> {
    let listing = decode_map::<String, CookbookEntry>(body)?;
    Ok(first_cookbook(listing)
        .map(|entry| entry.versions.into_iter().map(|v| v.version).collect())
        .unwrap_or_default())
}

// "First" is the smallest name, not the first in document order: the map is
// hash-backed and does not remember member order. Single-cookbook responses,
// the shape the server sends for one cookbook's versions, are unaffected.
fn first_cookbook<V>(listing: impl IntoIterator<Item = (String, V)>) -> Option<V> {
    listing
        .into_iter()
        .min_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn legacy_names_are_the_listing_keys() {
        let body = r#"{"apache2":"http://chef/cookbooks/apache2","nginx":"http://chef/cookbooks/nginx"}"#;
        assert_eq!(legacy_names(body).unwrap(), set(&["apache2", "nginx"]));
    }

    #[test]
    fn modern_names_are_the_listing_keys() {
        let body = r#"{
            "apache2": {"url": "http://chef/cookbooks/apache2",
                        "versions": [{"url": "http://chef/cookbooks/apache2/1.0.0", "version": "1.0.0"}]},
            "nginx": {"url": "http://chef/cookbooks/nginx", "versions": []}
        }"#;
        assert_eq!(modern_names(body).unwrap(), set(&["apache2", "nginx"]));
    }

    #[test]
    fn repeated_cookbooks_collapse() {
        let body = r#"{"apache2":"old","apache2":"new"}"#;
        assert_eq!(legacy_names(body).unwrap(), set(&["apache2"]));

        let body = r#"{"apache2":["0.1.0"],"apache2":["0.2.0","0.3.0"]}"#;
        assert_eq!(legacy_versions(body).unwrap(), set(&["0.2.0", "0.3.0"]));
    }

    #[test]
    fn legacy_versions_of_single_cookbook() {
        let body = r#"{"apache2":["0.1.0","0.2.1"]}"#;
        assert_eq!(legacy_versions(body).unwrap(), set(&["0.1.0", "0.2.1"]));
    }

    #[test]
    fn modern_versions_of_single_cookbook() {
        let body = r#"{"apache2":{"url":"http://chef/cookbooks/apache2","versions":[
            {"url":"http://chef/cookbooks/apache2/0.2.1","version":"0.2.1"},
            {"url":"http://chef/cookbooks/apache2/0.1.0","version":"0.1.0"}]}}"#;
        assert_eq!(modern_versions(body).unwrap(), set(&["0.1.0", "0.2.1"]));
    }

    #[test]
    fn versions_come_from_the_smallest_name() {
        let body = r#"{"nginx":["9.9.9"],"apache2":["1.0.0"]}"#;
        assert_eq!(legacy_versions(body).unwrap(), set(&["1.0.0"]));
    }

    #[test]
    fn empty_listing_has_no_versions() {
        assert!(legacy_versions("{}").unwrap().is_empty());
        assert!(modern_versions("{}").unwrap().is_empty());
    }

    #[test]
    fn shape_mismatch_is_malformed() {
        let legacy_body = r#"{"apache2":"http://chef/cookbooks/apache2"}"#;
        assert_eq!(
            modern_names(legacy_body).unwrap_err().kind(),
            "malformed_document"
        );

        let modern_body = r#"{"apache2":{"url":"u","versions":[]}}"#;
        assert_eq!(
            legacy_versions(modern_body).unwrap_err().kind(),
            "malformed_document"
        );
    }
}
