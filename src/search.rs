// src/search.rs
use crate::config::AppConfig;

/// Build the content search URL from the stored hashtag.
///
/// The query always leads with the seed tag; a stored tag is cleaned of its
/// leading `#` and re-prefixed so a bare token stored by hand still works.
/// No stored tag means searching on the seed tag alone.
pub fn search_url(config: &AppConfig, stored_tag: Option<&str>) -> String {
    let cleaned = stored_tag
        .map(|tag| tag.trim().trim_start_matches('#').trim())
        .filter(|tag| !tag.is_empty());

    let query = match cleaned {
        Some(tag) => format!("{} #{}", config.seed_tag, tag),
        None => config.seed_tag.clone(),
    };

    format!(
        "{}{}&origin=GLOBAL_SEARCH_HEADER",
        config.search_base_url,
        urlencoding::encode(&query)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_and_stored_tag() {
        let url = search_url(&AppConfig::default(), Some("#backenddev"));
        assert_eq!(
            url,
            "https://www.linkedin.com/search/results/content/?keywords=%23hiring%20%23backenddev&origin=GLOBAL_SEARCH_HEADER"
        );
    }

    #[test]
    fn test_bare_token_gets_reprefixed() {
        let url = search_url(&AppConfig::default(), Some("backenddev"));
        assert!(url.contains("%23hiring%20%23backenddev"));
    }

    #[test]
    fn test_missing_or_blank_tag_falls_back_to_seed() {
        for stored in [None, Some(""), Some("   "), Some("#")] {
            let url = search_url(&AppConfig::default(), stored);
            assert!(url.contains("keywords=%23hiring&origin=GLOBAL_SEARCH_HEADER"));
        }
    }
}
