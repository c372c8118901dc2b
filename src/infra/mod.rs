// Infrastructure layer - 基础设施层
// 负责外部资源：数据库连接池、Redis、缓存端口、外部商品服务

pub mod cache;
pub mod database;
pub mod product_api;
pub mod redis;

pub use cache::{CacheStore, MemoryCacheStore, RedisCacheStore};
pub use database::Database;
pub use product_api::{HttpProductCatalog, ProductCatalog};
pub use redis::RedisClient;
