pub mod affiliate_click_dao;
pub mod affiliate_dao;
pub mod base;
pub mod base_traits;
mod context;
pub mod error;
pub mod form_dao;
pub mod media_dao;
pub mod model_has_media_dao;
pub mod permission_dao;
pub mod post_dao;
pub mod role_dao;
pub mod token_dao;
pub mod user_dao;

pub use affiliate_click_dao::{AffiliateClickDao, ClickSource};
pub use affiliate_dao::{AffiliateDao, NewAffiliate};
pub use base::{DaoBase, PaginatedResponse};
pub use base_traits::{HasCreatedAtColumn, HasIdActiveModel, TimestampedActiveModel};
pub use context::DaoContext;
pub use error::{DaoLayerError, DaoResult};
pub use form_dao::{FormAffiliateDao, FormEmailDao};
pub use media_dao::{MediaDao, MediaQuery};
pub use model_has_media_dao::{ModelHasMediaDao, ModelRef};
pub use permission_dao::PermissionDao;
pub use post_dao::PostDao;
pub use role_dao::RoleDao;
pub use token_dao::{TokenDao, TokenKind};
pub use user_dao::{NewUser, UserDao};
