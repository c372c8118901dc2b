//! 数据模型模块

pub mod client;
pub mod favorite;
pub mod product;

pub use client::Client;
pub use favorite::{FavoriteProduct, FavoriteRecord};
pub use product::Product;
