use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Select,
};
use uuid::Uuid;

use super::base::{insert_with_id, update_model};
use super::{DaoBase, DaoLayerError, DaoResult, PaginatedResponse};
use crate::db::entities::{media, prelude::Media};

#[derive(Clone)]
pub struct MediaDao {
    db: DatabaseConnection,
}

impl DaoBase for MediaDao {
    type Entity = Media;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[derive(Debug, Clone, Default)]
pub struct MediaQuery {
    pub collection: Option<String>,
    pub search: Option<String>,
}

impl MediaQuery {
    fn apply(&self, query: Select<Media>) -> Select<Media> {
        let mut query = query;
        if let Some(collection) = self.collection.as_deref().filter(|c| !c.is_empty()) {
            query = query.filter(media::Column::CollectionName.eq(collection));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(media::Column::Name.contains(search))
                    .add(media::Column::FileName.contains(search)),
            );
        }
        query
    }
}

impl MediaDao {
    /// Newest first, with `total` counted under the same filter.
    pub async fn page(
        &self,
        filter: &MediaQuery,
        page: u64,
        per_page: u64,
    ) -> DaoResult<PaginatedResponse<media::Model>> {
        let total = self.count(|query| filter.apply(query)).await?;
        let mut response = self
            .find(page, per_page, None, |query| filter.apply(query))
            .await?;
        response.total = Some(total);
        Ok(response)
    }

    pub async fn collections(&self) -> DaoResult<Vec<String>> {
        Media::find()
            .select_only()
            .column(media::Column::CollectionName)
            .distinct()
            .order_by_asc(media::Column::CollectionName)
            .into_tuple::<String>()
            .all(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn find_many_in<C: ConnectionTrait>(
        conn: &C,
        ids: &[Uuid],
    ) -> DaoResult<Vec<media::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Media::find()
            .filter(media::Column::Id.is_in(ids.to_vec()))
            .all(conn)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn find_many(&self, ids: &[Uuid]) -> DaoResult<Vec<media::Model>> {
        Self::find_many_in(&self.db, ids).await
    }

    /// The id is chosen by the caller so files can be placed under it first.
    pub async fn insert_in<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
        model: media::ActiveModel,
    ) -> DaoResult<media::Model> {
        insert_with_id(conn, id, model).await
    }

    pub async fn set_custom_properties(
        &self,
        model: media::Model,
        properties: serde_json::Value,
    ) -> DaoResult<media::Model> {
        update_model(&self.db, model, |active: &mut media::ActiveModel| {
            active.custom_properties = sea_orm::Set(properties);
        })
        .await
    }

    pub async fn delete_in<C: ConnectionTrait>(conn: &C, id: Uuid) -> DaoResult<u64> {
        let result = Media::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(result.rows_affected)
    }
}
