use sea_orm::DatabaseConnection;

use super::{
    AffiliateClickDao, AffiliateDao, DaoBase, FormAffiliateDao, FormEmailDao, MediaDao,
    ModelHasMediaDao, PermissionDao, PostDao, RoleDao, TokenDao, UserDao,
};

#[derive(Clone)]
pub struct DaoContext {
    db: DatabaseConnection,
}

impl DaoContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn user(&self) -> UserDao {
        DaoBase::new(&self.db)
    }

    pub fn role(&self) -> RoleDao {
        DaoBase::new(&self.db)
    }

    pub fn permission(&self) -> PermissionDao {
        DaoBase::new(&self.db)
    }

    pub fn token(&self) -> TokenDao {
        DaoBase::new(&self.db)
    }

    pub fn affiliate(&self) -> AffiliateDao {
        DaoBase::new(&self.db)
    }

    pub fn affiliate_click(&self) -> AffiliateClickDao {
        DaoBase::new(&self.db)
    }

    pub fn media(&self) -> MediaDao {
        DaoBase::new(&self.db)
    }

    pub fn model_has_media(&self) -> ModelHasMediaDao {
        DaoBase::new(&self.db)
    }

    pub fn post(&self) -> PostDao {
        DaoBase::new(&self.db)
    }

    pub fn form_email(&self) -> FormEmailDao {
        DaoBase::new(&self.db)
    }

    pub fn form_affiliate(&self) -> FormAffiliateDao {
        DaoBase::new(&self.db)
    }
}
