#[allow(unused_imports)]
pub mod prelude {
    pub use super::affiliate::Entity as Affiliate;
    pub use super::affiliate_click::Entity as AffiliateClick;
    pub use super::form_affiliate::Entity as FormAffiliate;
    pub use super::form_email::Entity as FormEmail;
    pub use super::media::Entity as Media;
    pub use super::model_has_media::Entity as ModelHasMedia;
    pub use super::permission::Entity as Permission;
    pub use super::post::Entity as Post;
    pub use super::role::Entity as Role;
    pub use super::role_permission::Entity as RolePermission;
    pub use super::token::Entity as Token;
    pub use super::user::Entity as User;
}

pub mod affiliate;
pub mod affiliate_click;
pub mod form_affiliate;
pub mod form_email;
pub mod media;
pub mod model_has_media;
pub mod permission;
pub mod post;
pub mod role;
pub mod role_permission;
pub mod token;
pub mod user;
