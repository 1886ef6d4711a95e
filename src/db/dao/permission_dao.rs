use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use super::base::insert_new;
use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::{permission, prelude::Permission};

#[derive(Clone)]
pub struct PermissionDao {
    db: DatabaseConnection,
}

impl DaoBase for PermissionDao {
    type Entity = Permission;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl PermissionDao {
    pub async fn find_by_name_in<C: ConnectionTrait>(
        conn: &C,
        name: &str,
    ) -> DaoResult<Option<permission::Model>> {
        Permission::find()
            .filter(permission::Column::Name.eq(name))
            .one(conn)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn name_taken(&self, name: &str, exclude: Option<Uuid>) -> DaoResult<bool> {
        let mut query = Permission::find().filter(permission::Column::Name.eq(name));
        if let Some(id) = exclude {
            query = query.filter(permission::Column::Id.ne(id));
        }
        let count = query.count(&self.db).await.map_err(DaoLayerError::Db)?;
        Ok(count > 0)
    }

    pub async fn list(&self) -> DaoResult<Vec<permission::Model>> {
        self.find_all(Some((permission::Column::Name, Order::Asc)), |query| query)
            .await
    }

    /// Unknown ids are dropped rather than reported.
    pub async fn find_many_in<C: ConnectionTrait>(
        conn: &C,
        ids: &[Uuid],
    ) -> DaoResult<Vec<permission::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Permission::find()
            .filter(permission::Column::Id.is_in(ids.to_vec()))
            .all(conn)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn create_in<C: ConnectionTrait>(
        conn: &C,
        name: &str,
        description: Option<String>,
    ) -> DaoResult<permission::Model> {
        let model = permission::ActiveModel {
            name: Set(name.to_string()),
            description: Set(description),
            ..Default::default()
        };
        insert_new(conn, model).await
    }
}
