pub mod affiliate_service;
pub mod auth_service;
pub mod context;
pub mod crud_service;
pub mod form_service;
pub mod media_service;
pub mod media_store;
pub mod post_service;
pub mod role_service;
pub mod slug;
pub mod stats;
pub mod transaction;
pub mod user_service;

pub use context::ServiceContext;
