use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};
use uuid::Uuid;

use super::base::{insert_new, update_model};
use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::{post, prelude::Post};

#[derive(Clone)]
pub struct PostDao {
    db: DatabaseConnection,
}

impl DaoBase for PostDao {
    type Entity = Post;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl PostDao {
    pub async fn find_by_slug(&self, slug: &str) -> DaoResult<Option<post::Model>> {
        let slug = slug.to_string();
        self.find_first(move |query| query.filter(post::Column::Slug.eq(slug)))
            .await
    }

    pub async fn slug_taken_in<C: ConnectionTrait>(
        conn: &C,
        slug: &str,
        exclude: Option<Uuid>,
    ) -> DaoResult<bool> {
        let mut query = Post::find().filter(post::Column::Slug.eq(slug));
        if let Some(id) = exclude {
            query = query.filter(post::Column::Id.ne(id));
        }
        let count = query.count(conn).await.map_err(DaoLayerError::Db)?;
        Ok(count > 0)
    }

    pub async fn find_by_id_in<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> DaoResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(conn)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn list(&self) -> DaoResult<Vec<post::Model>> {
        self.find_all(None, |query| query).await
    }

    pub async fn insert_in<C: ConnectionTrait>(
        conn: &C,
        model: post::ActiveModel,
    ) -> DaoResult<post::Model> {
        insert_new(conn, model).await
    }

    pub async fn save_in<C, F>(conn: &C, model: post::Model, apply: F) -> DaoResult<post::Model>
    where
        C: ConnectionTrait,
        F: FnOnce(&mut post::ActiveModel),
    {
        update_model(conn, model, apply).await
    }

    pub async fn delete_in<C: ConnectionTrait>(conn: &C, id: Uuid) -> DaoResult<u64> {
        let result = Post::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(result.rows_affected)
    }
}
