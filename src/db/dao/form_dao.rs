use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::prelude::{FormAffiliate, FormEmail};
use crate::db::entities::form_email;

#[derive(Clone)]
pub struct FormEmailDao {
    db: DatabaseConnection,
}

impl DaoBase for FormEmailDao {
    type Entity = FormEmail;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl FormEmailDao {
    pub async fn email_taken(&self, email: &str, exclude: Option<Uuid>) -> DaoResult<bool> {
        let mut query = FormEmail::find().filter(form_email::Column::Email.eq(email));
        if let Some(id) = exclude {
            query = query.filter(form_email::Column::Id.ne(id));
        }
        let count = query.count(&self.db).await.map_err(DaoLayerError::Db)?;
        Ok(count > 0)
    }
}

#[derive(Clone)]
pub struct FormAffiliateDao {
    db: DatabaseConnection,
}

impl DaoBase for FormAffiliateDao {
    type Entity = FormAffiliate;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}
