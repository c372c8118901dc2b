//! 数据访问层
//!
//! 每个仓库以 trait 定义契约，PostgreSQL 实现与带缓存的包装实现可互换。

pub mod cached_favorite_repo;
pub mod client_repo;
pub mod favorite_repo;
pub mod session_repo;

pub use cached_favorite_repo::CachedFavoriteRepository;
pub use client_repo::{ClientRepository, PgClientRepository};
pub use favorite_repo::{FavoriteRepository, PgFavoriteRepository};
pub use session_repo::{PgSessionRepository, SessionRepository};
