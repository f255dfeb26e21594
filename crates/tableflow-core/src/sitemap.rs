//! Cache manifest ("sitemap") builder.
//!
//! The sitemap maps a short cache key to the sorted list of cached blob keys
//! sharing it. It is rebuilt wholesale on every cache refresh and overwrites
//! the previous manifest object; it is not transactional with the blobs it
//! describes, and objects uploaded concurrently with the listing may be
//! omitted until the next refresh.

use std::collections::BTreeMap;

use tableflow_bucket::BucketStore;

use crate::error::Result;

pub const CACHE_PREFIX: &str = "cache";
pub const SITEMAP_KEY: &str = "cache/sitemap.json";

pub type CacheSitemap = BTreeMap<String, Vec<String>>;

/// Enumerate the cache and group blob keys by cache key. The cache key is
/// the blob's filename up to (not including) the first `.`; a filename with
/// no dot is its own cache key. Each group is sorted lexicographically.
pub async fn build_cache_sitemap(store: &dyn BucketStore) -> Result<CacheSitemap> {
    let mut sitemap = CacheSitemap::new();

    for key in store.list_objects(CACHE_PREFIX).await? {
        if key == SITEMAP_KEY {
            continue;
        }
        let cache_key = cache_key_for(&key);
        sitemap.entry(cache_key.to_string()).or_default().push(key);
    }

    for snapshots in sitemap.values_mut() {
        snapshots.sort();
    }

    Ok(sitemap)
}

fn cache_key_for(key: &str) -> &str {
    let filename = key.rsplit('/').next().unwrap_or(key);
    filename.split('.').next().unwrap_or(filename)
}
