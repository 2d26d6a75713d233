/// Read-through lookup against a [`Cache`](crate::db::Cache).
///
/// Evaluates to `Ok(value)` from the cache on a hit. On a miss it awaits
/// `$fetch`, queues the result under `$key` for `$ttl` seconds and evaluates
/// to that result. Cache read errors and fetch errors return early through
/// `?`, so the enclosing function must return an `AppResult`.
///
/// ```rust,ignore
/// let poster: Poster = cached!(cache, CacheKey::Poster(603), POSTER_CACHE_TTL, fetch(603))?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $fetch:expr) => {{
        let key = $key;
        match $cache.get(&key).await? {
            Some(hit) => Ok(hit),
            None => {
                let fresh = $fetch.await?;
                $cache.put(&key, &fresh, $ttl);
                Ok(fresh)
            }
        }
    }};
}
