use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::base::insert_new;
use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::{model_has_media, prelude::ModelHasMedia};

#[derive(Clone)]
pub struct ModelHasMediaDao {
    db: DatabaseConnection,
}

impl DaoBase for ModelHasMediaDao {
    type Entity = ModelHasMedia;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// The polymorphic owner of a link: any record named by type and id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRef<'a> {
    pub model_type: &'a str,
    pub model_id: Uuid,
}

impl ModelHasMediaDao {
    pub async fn links_for_in<C: ConnectionTrait>(
        conn: &C,
        owner: &ModelRef<'_>,
        field_type: Option<&str>,
    ) -> DaoResult<Vec<model_has_media::Model>> {
        let mut query = ModelHasMedia::find()
            .filter(model_has_media::Column::ModelType.eq(owner.model_type))
            .filter(model_has_media::Column::ModelId.eq(owner.model_id));
        if let Some(field_type) = field_type {
            query = query.filter(model_has_media::Column::FieldType.eq(field_type));
        }
        query
            .order_by_asc(model_has_media::Column::CreatedAt)
            .all(conn)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn links_for(&self, owner: &ModelRef<'_>) -> DaoResult<Vec<model_has_media::Model>> {
        Self::links_for_in(&self.db, owner, None).await
    }

    /// Links of many records of one type, for list views.
    pub async fn links_for_many(
        &self,
        model_type: &str,
        model_ids: Vec<Uuid>,
    ) -> DaoResult<Vec<model_has_media::Model>> {
        if model_ids.is_empty() {
            return Ok(Vec::new());
        }
        let model_type = model_type.to_string();
        self.find_all(
            Some((model_has_media::Column::CreatedAt, Order::Asc)),
            move |query| {
                query
                    .filter(model_has_media::Column::ModelType.eq(model_type))
                    .filter(model_has_media::Column::ModelId.is_in(model_ids))
            },
        )
        .await
    }

    pub async fn link_in<C: ConnectionTrait>(
        conn: &C,
        owner: &ModelRef<'_>,
        field_type: &str,
        media_id: Uuid,
    ) -> DaoResult<model_has_media::Model> {
        let model = model_has_media::ActiveModel {
            model_type: Set(owner.model_type.to_string()),
            model_id: Set(owner.model_id),
            field_type: Set(field_type.to_string()),
            media_id: Set(media_id),
            ..Default::default()
        };
        insert_new(conn, model).await
    }

    pub async fn delete_links_in<C: ConnectionTrait>(conn: &C, ids: Vec<Uuid>) -> DaoResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = ModelHasMedia::delete_many()
            .filter(model_has_media::Column::Id.is_in(ids))
            .exec(conn)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(result.rows_affected)
    }

    pub async fn delete_for_media_in<C: ConnectionTrait>(
        conn: &C,
        media_id: Uuid,
    ) -> DaoResult<u64> {
        let result = ModelHasMedia::delete_many()
            .filter(model_has_media::Column::MediaId.eq(media_id))
            .exec(conn)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(result.rows_affected)
    }

    pub async fn count_for_media_in<C: ConnectionTrait>(
        conn: &C,
        media_id: Uuid,
    ) -> DaoResult<u64> {
        ModelHasMedia::find()
            .filter(model_has_media::Column::MediaId.eq(media_id))
            .count(conn)
            .await
            .map_err(DaoLayerError::Db)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use super::{ModelHasMediaDao, ModelRef};
    use crate::db::entities::model_has_media;
    use crate::test_helpers::ts;

    #[tokio::test]
    async fn links_for_filters_by_owner() {
        let owner_id = Uuid::new_v4();
        let now = ts();
        let link = model_has_media::Model {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            model_type: "Post".to_string(),
            model_id: owner_id,
            field_type: "image".to_string(),
            media_id: Uuid::new_v4(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[link.clone()]])
            .into_connection();
        let owner = ModelRef {
            model_type: "Post",
            model_id: owner_id,
        };

        let links = ModelHasMediaDao::links_for_in(&db, &owner, Some("image"))
            .await
            .expect("query should succeed");
        assert_eq!(links, vec![link]);
    }

    #[tokio::test]
    async fn delete_links_skips_empty_input() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 3,
            }])
            .into_connection();

        let none = ModelHasMediaDao::delete_links_in(&db, Vec::new())
            .await
            .expect("noop should succeed");
        assert_eq!(none, 0);

        let some = ModelHasMediaDao::delete_links_in(&db, vec![Uuid::new_v4()])
            .await
            .expect("delete should succeed");
        assert_eq!(some, 3);
    }
}
