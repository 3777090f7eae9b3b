//! Cache key generation and invalidation helpers.
//!
//! Content representations embed their categories and faculties, so any
//! category or faculty mutation also invalidates content keys.

use crate::RedisCache;
use tracing::warn;

/// Prefix for all cache keys to avoid collisions with other Redis users.
const CACHE_PREFIX: &str = "h5p-hub";

fn build_key(parts: &[&str]) -> String {
    format!("{}:{}", CACHE_PREFIX, parts.join(":"))
}

/// Cache keys for content records.
pub mod contents {
    use super::*;

    pub fn by_id(content_id: i64) -> String {
        build_key(&["content", &content_id.to_string()])
    }

    pub fn list() -> String {
        build_key(&["contents", "list"])
    }

    /// Matches both `content:*` and `contents:*`.
    pub fn invalidation_pattern() -> String {
        format!("{}:content*", CACHE_PREFIX)
    }
}

pub mod categories {
    use super::*;

    pub fn by_id(category_id: i64) -> String {
        build_key(&["category", &category_id.to_string()])
    }

    pub fn list() -> String {
        build_key(&["categories", "list"])
    }

    /// Matches both `category:*` and `categories:*`.
    pub fn invalidation_pattern() -> String {
        format!("{}:categor*", CACHE_PREFIX)
    }
}

pub mod faculties {
    use super::*;

    pub fn by_id(faculty_id: i64) -> String {
        build_key(&["faculty", &faculty_id.to_string()])
    }

    pub fn list() -> String {
        build_key(&["faculties", "list"])
    }

    /// Matches both `faculty:*` and `faculties:*`.
    pub fn invalidation_pattern() -> String {
        format!("{}:facult*", CACHE_PREFIX)
    }
}

/// Invalidation entry points, one per mutated entity type.
///
/// All helpers are no-ops without a cache and only log on failure.
pub mod invalidate {
    use super::*;

    async fn pattern(cache: &RedisCache, pattern: String, what: &str) {
        if let Err(e) = cache.invalidate_pattern(&pattern).await {
            warn!(error = %e, cache.pattern = %pattern, "Failed to invalidate {} caches", what);
        }
    }

    /// Call after creating, updating or deleting a content, or changing its links.
    pub async fn content(cache: Option<&RedisCache>, content_id: Option<i64>) {
        let Some(cache) = cache else { return };

        if let Some(id) = content_id
            && let Err(e) = cache.invalidate(&contents::by_id(id)).await
        {
            warn!(error = %e, content_id = %id, "Failed to invalidate content cache");
        }

        pattern(cache, contents::invalidation_pattern(), "content").await;
    }

    /// Call after creating, updating or deleting a category.
    pub async fn category(cache: Option<&RedisCache>, category_id: Option<i64>) {
        let Some(cache) = cache else { return };

        if let Some(id) = category_id
            && let Err(e) = cache.invalidate(&categories::by_id(id)).await
        {
            warn!(error = %e, category_id = %id, "Failed to invalidate category cache");
        }

        pattern(cache, categories::invalidation_pattern(), "category").await;
        pattern(cache, contents::invalidation_pattern(), "content").await;
    }

    /// Call after creating, updating or deleting a faculty.
    pub async fn faculty(cache: Option<&RedisCache>, faculty_id: Option<i64>) {
        let Some(cache) = cache else { return };

        if let Some(id) = faculty_id
            && let Err(e) = cache.invalidate(&faculties::by_id(id)).await
        {
            warn!(error = %e, faculty_id = %id, "Failed to invalidate faculty cache");
        }

        pattern(cache, faculties::invalidation_pattern(), "faculty").await;
        pattern(cache, contents::invalidation_pattern(), "content").await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_keys() {
        assert_eq!(contents::by_id(42), "h5p-hub:content:42");
        assert_eq!(contents::list(), "h5p-hub:contents:list");
    }

    #[test]
    fn test_patterns_cover_singular_and_plural_keys() {
        let matches = |pattern: &str, key: &str| key.starts_with(pattern.trim_end_matches('*'));

        assert!(matches(&contents::invalidation_pattern(), &contents::by_id(1)));
        assert!(matches(&contents::invalidation_pattern(), &contents::list()));
        assert!(matches(&categories::invalidation_pattern(), &categories::by_id(1)));
        assert!(matches(&categories::invalidation_pattern(), &categories::list()));
        assert!(matches(&faculties::invalidation_pattern(), &faculties::by_id(1)));
        assert!(matches(&faculties::invalidation_pattern(), &faculties::list()));
    }

    #[test]
    fn test_patterns_do_not_overlap() {
        let category_prefix = categories::invalidation_pattern();
        assert!(!faculties::list().starts_with(category_prefix.trim_end_matches('*')));
        assert!(!contents::list().starts_with(category_prefix.trim_end_matches('*')));
    }

    #[tokio::test]
    async fn test_invalidation_without_cache_is_noop() {
        invalidate::content(None, Some(1)).await;
        invalidate::category(None, None).await;
        invalidate::faculty(None, Some(3)).await;
    }
}
