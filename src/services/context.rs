use sea_orm::DatabaseConnection;

use crate::{
    auth::providers::AuthProviders,
    config::AppConfig,
    db::dao::DaoContext,
    services::{
        affiliate_service::AffiliateService,
        auth_service::AuthService,
        form_service::{FormAffiliateService, FormEmailService},
        media_service::{MediaService, UploadLimits},
        media_store::MediaStore,
        post_service::PostService,
        role_service::{PermissionService, RoleService},
        user_service::UserService,
    },
    state::AppState,
};

#[derive(Clone)]
pub struct ServiceContext {
    daos: DaoContext,
    store: MediaStore,
    limits: UploadLimits,
}

impl ServiceContext {
    pub fn new(db: &DatabaseConnection, cfg: &AppConfig) -> Self {
        Self {
            daos: DaoContext::new(db),
            store: MediaStore::new(&cfg.storage.upload_dir, &cfg.general.app_url),
            limits: UploadLimits::from(&cfg.storage),
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(&state.db, &state.config)
    }

    pub fn daos(&self) -> &DaoContext {
        &self.daos
    }

    pub fn auth<'a>(&self, providers: &'a AuthProviders) -> AuthService<'a> {
        AuthService::new(providers)
    }

    pub fn media(&self) -> MediaService {
        MediaService::new(&self.daos, self.store.clone(), self.limits)
    }

    pub fn user(&self) -> UserService {
        UserService::new(&self.daos, self.media())
    }

    pub fn role(&self) -> RoleService {
        RoleService::new(&self.daos)
    }

    pub fn permission(&self) -> PermissionService {
        PermissionService::new(&self.daos)
    }

    pub fn post(&self) -> PostService {
        PostService::new(&self.daos, self.media())
    }

    pub fn affiliate(&self) -> AffiliateService {
        AffiliateService::new(&self.daos)
    }

    pub fn form_email(&self) -> FormEmailService {
        FormEmailService::new(self.daos.form_email())
    }

    pub fn form_affiliate(&self) -> FormAffiliateService {
        FormAffiliateService::new(self.daos.form_affiliate())
    }
}
