use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, IntoActiveModel, Order, PaginatorTrait, PrimaryKeyTrait, QueryOrder,
    QuerySelect, Select,
};
use uuid::Uuid;

use super::base_traits::{
    HasCreatedAtColumn, HasIdActiveModel, TimestampedActiveModel, stamp_new, stamp_updated,
};
use super::error::{DaoLayerError, DaoResult, entity_label};

/// One page of rows. `has_next` comes from fetching one row past the page;
/// `total` is only filled by callers that also ran a count.
#[derive(Debug, serde::Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub has_next: bool,
    pub total: Option<u64>,
}

#[async_trait::async_trait]
pub trait DaoBase: Clone + Send + Sync + Sized
where
    <Self::Entity as EntityTrait>::Model:
        FromQueryResult + IntoActiveModel<<Self::Entity as EntityTrait>::ActiveModel> + Send + Sync,
    <Self::Entity as EntityTrait>::ActiveModel:
        ActiveModelTrait<Entity = Self::Entity> + HasIdActiveModel + TimestampedActiveModel + Send,
    <<Self::Entity as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType:
        From<Uuid> + Send + Sync,
    Self::Entity: HasCreatedAtColumn,
{
    type Entity: EntityTrait + Send + Sync;
    const MAX_PAGE_SIZE: u64 = 100;

    fn new(db: &DatabaseConnection) -> Self;

    fn db(&self) -> &DatabaseConnection;

    async fn create(
        &self,
        data: impl IntoActiveModel<<Self::Entity as EntityTrait>::ActiveModel> + Send,
    ) -> DaoResult<<Self::Entity as EntityTrait>::Model> {
        let mut active = data.into_active_model();
        stamp_new(&mut active, Uuid::new_v4());
        active.insert(self.db()).await.map_err(DaoLayerError::Db)
    }

    async fn try_find_by_id(
        &self,
        id: Uuid,
    ) -> DaoResult<Option<<Self::Entity as EntityTrait>::Model>> {
        Self::Entity::find_by_id(id)
            .one(self.db())
            .await
            .map_err(DaoLayerError::Db)
    }

    async fn find_by_id(&self, id: Uuid) -> DaoResult<<Self::Entity as EntityTrait>::Model> {
        self.try_find_by_id(id)
            .await?
            .ok_or(DaoLayerError::NotFound {
                entity: entity_label::<Self::Entity>(),
                id,
            })
    }

    async fn find(
        &self,
        page: u64,
        page_size: u64,
        order: Option<(<Self::Entity as EntityTrait>::Column, Order)>,
        apply: impl FnOnce(Select<Self::Entity>) -> Select<Self::Entity> + Send,
    ) -> DaoResult<PaginatedResponse<<Self::Entity as EntityTrait>::Model>> {
        if page == 0 || page_size == 0 || page_size > Self::MAX_PAGE_SIZE {
            return Err(DaoLayerError::InvalidPagination { page, page_size });
        }

        let filtered = apply(Self::Entity::find());
        let ordered = match order {
            Some((column, order)) => filtered.order_by(column, order),
            None => filtered.order_by_desc(Self::Entity::created_at_column()),
        };
        let fetch_size = page_size.saturating_add(1);
        let offset = page.saturating_sub(1).saturating_mul(page_size);
        let mut data = ordered
            .limit(fetch_size)
            .offset(offset)
            .all(self.db())
            .await
            .map_err(DaoLayerError::Db)?;

        let has_next = data.len() > page_size as usize;
        if has_next {
            data.truncate(page_size as usize);
        }

        Ok(PaginatedResponse {
            data,
            page,
            page_size,
            has_next,
            total: None,
        })
    }

    /// Unpaged variant of [`DaoBase::find`], newest first unless ordered.
    async fn find_all(
        &self,
        order: Option<(<Self::Entity as EntityTrait>::Column, Order)>,
        apply: impl FnOnce(Select<Self::Entity>) -> Select<Self::Entity> + Send,
    ) -> DaoResult<Vec<<Self::Entity as EntityTrait>::Model>> {
        let filtered = apply(Self::Entity::find());
        let ordered = match order {
            Some((column, order)) => filtered.order_by(column, order),
            None => filtered.order_by_desc(Self::Entity::created_at_column()),
        };
        ordered.all(self.db()).await.map_err(DaoLayerError::Db)
    }

    async fn find_first(
        &self,
        apply: impl FnOnce(Select<Self::Entity>) -> Select<Self::Entity> + Send,
    ) -> DaoResult<Option<<Self::Entity as EntityTrait>::Model>> {
        apply(Self::Entity::find())
            .one(self.db())
            .await
            .map_err(DaoLayerError::Db)
    }

    async fn count(
        &self,
        apply: impl FnOnce(Select<Self::Entity>) -> Select<Self::Entity> + Send,
    ) -> DaoResult<u64>
    where
        <Self::Entity as EntityTrait>::Model: Sync,
    {
        apply(Self::Entity::find())
            .count(self.db())
            .await
            .map_err(DaoLayerError::Db)
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> DaoResult<<Self::Entity as EntityTrait>::Model>
    where
        F: for<'a> FnOnce(&'a mut <Self::Entity as EntityTrait>::ActiveModel) + Send,
    {
        let model = self.find_by_id(id).await?;

        let mut active = model.into_active_model();
        apply(&mut active);
        stamp_updated(&mut active);

        active.update(self.db()).await.map_err(DaoLayerError::Db)
    }

    async fn delete(&self, id: Uuid) -> DaoResult<Uuid> {
        let result = Self::Entity::delete_by_id(id)
            .exec(self.db())
            .await
            .map_err(DaoLayerError::Db)?;

        if result.rows_affected == 0 {
            return Err(DaoLayerError::NotFound {
                entity: entity_label::<Self::Entity>(),
                id,
            });
        }

        Ok(id)
    }
}

/// Inserts a new row on any connection, transactions included, filling the
/// injected id and timestamp columns first.
pub async fn insert_new<C, A>(conn: &C, active: A) -> DaoResult<<A::Entity as EntityTrait>::Model>
where
    C: ConnectionTrait,
    A: ActiveModelTrait + ActiveModelBehavior + HasIdActiveModel + TimestampedActiveModel + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    insert_with_id(conn, Uuid::new_v4(), active).await
}

/// Like [`insert_new`] for callers that need the id before the row exists.
pub async fn insert_with_id<C, A>(
    conn: &C,
    id: Uuid,
    mut active: A,
) -> DaoResult<<A::Entity as EntityTrait>::Model>
where
    C: ConnectionTrait,
    A: ActiveModelTrait + ActiveModelBehavior + HasIdActiveModel + TimestampedActiveModel + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    stamp_new(&mut active, id);
    active.insert(conn).await.map_err(DaoLayerError::Db)
}

pub async fn update_model<C, A, F>(
    conn: &C,
    model: <A::Entity as EntityTrait>::Model,
    apply: F,
) -> DaoResult<<A::Entity as EntityTrait>::Model>
where
    C: ConnectionTrait,
    A: ActiveModelTrait + ActiveModelBehavior + TimestampedActiveModel + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    F: FnOnce(&mut A),
{
    let mut active = model.into_active_model();
    apply(&mut active);
    stamp_updated(&mut active);
    active.update(conn).await.map_err(DaoLayerError::Db)
}
