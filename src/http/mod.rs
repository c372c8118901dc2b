//! HTTP 服务器模块 - 使用 Axum 提供 REST API
//!
//! 功能包括：
//! - 登录 / 刷新 / 登出 / token 校验
//! - 客户注册与资料维护
//! - 外部商品目录查询
//! - 客户收藏管理

pub mod extract;
pub mod middleware;
pub mod routes;
pub mod server;

pub use server::{build_router, ApiHttpServer, HttpServerState, API_PREFIX};
