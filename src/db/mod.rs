pub mod catalog;
pub mod redis;

pub use catalog::{load_catalog, CatalogData};
pub use self::redis::create_redis_client;
pub use self::redis::Cache;
pub use self::redis::CacheKey;
pub use self::redis::CacheWriterHandle;
pub use self::redis::WriterStats;
