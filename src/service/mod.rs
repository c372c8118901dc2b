// 业务服务层模块
pub mod auth_service;
pub mod client_service;
// 收藏服务（依赖外部商品目录）
pub mod favorite_service;
pub mod product_service;

pub use auth_service::AuthService;
pub use client_service::{ClientService, UpdateClient};
pub use favorite_service::FavoriteService;
pub use product_service::ProductService;
