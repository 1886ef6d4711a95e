use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
    sea_query::{Expr, ExprTrait},
};
use uuid::Uuid;

use super::base::insert_new;
use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::{affiliate, prelude::Affiliate};

#[derive(Clone)]
pub struct AffiliateDao {
    db: DatabaseConnection,
}

impl DaoBase for AffiliateDao {
    type Entity = Affiliate;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[derive(Debug, Clone)]
pub struct NewAffiliate {
    pub code: String,
    pub description: Option<String>,
    pub commission: f64,
    pub user_id: Uuid,
}

impl AffiliateDao {
    pub async fn find_by_code_in<C: ConnectionTrait>(
        conn: &C,
        code: &str,
    ) -> DaoResult<Option<affiliate::Model>> {
        Affiliate::find()
            .filter(affiliate::Column::Code.eq(code))
            .one(conn)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn code_taken_in<C: ConnectionTrait>(
        conn: &C,
        code: &str,
        exclude: Option<Uuid>,
    ) -> DaoResult<bool> {
        let mut query = Affiliate::find().filter(affiliate::Column::Code.eq(code));
        if let Some(id) = exclude {
            query = query.filter(affiliate::Column::Id.ne(id));
        }
        let count = query.count(conn).await.map_err(DaoLayerError::Db)?;
        Ok(count > 0)
    }

    pub async fn create_in<C: ConnectionTrait>(
        conn: &C,
        new_affiliate: NewAffiliate,
    ) -> DaoResult<affiliate::Model> {
        let model = affiliate::ActiveModel {
            code: Set(new_affiliate.code),
            description: Set(new_affiliate.description),
            commission: Set(new_affiliate.commission),
            clicks: Set(0),
            user_id: Set(new_affiliate.user_id),
            ..Default::default()
        };
        insert_new(conn, model).await
    }

    /// `owner` of `None` means unscoped (admin) access.
    pub async fn list_scoped(&self, owner: Option<Uuid>) -> DaoResult<Vec<affiliate::Model>> {
        self.find_all(None, move |query| match owner {
            Some(user_id) => query.filter(affiliate::Column::UserId.eq(user_id)),
            None => query,
        })
        .await
    }

    pub async fn find_scoped(
        &self,
        id: Uuid,
        owner: Option<Uuid>,
    ) -> DaoResult<Option<affiliate::Model>> {
        self.find_first(move |query| {
            let query = query.filter(affiliate::Column::Id.eq(id));
            match owner {
                Some(user_id) => query.filter(affiliate::Column::UserId.eq(user_id)),
                None => query,
            }
        })
        .await
    }

    pub async fn first_for_user_in<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
    ) -> DaoResult<Option<affiliate::Model>> {
        Affiliate::find()
            .filter(affiliate::Column::UserId.eq(user_id))
            .order_by_asc(affiliate::Column::CreatedAt)
            .one(conn)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn for_users(&self, user_ids: Vec<Uuid>) -> DaoResult<Vec<affiliate::Model>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.find_all(Some((affiliate::Column::CreatedAt, Order::Asc)), move |query| {
            query.filter(affiliate::Column::UserId.is_in(user_ids))
        })
        .await
    }

    pub async fn set_code_in<C: ConnectionTrait>(
        conn: &C,
        model: affiliate::Model,
        code: String,
    ) -> DaoResult<affiliate::Model> {
        super::base::update_model(conn, model, |active: &mut affiliate::ActiveModel| {
            active.code = Set(code);
        })
        .await
    }

    /// Atomic `clicks = clicks + 1`, safe against concurrent clicks on the
    /// same affiliate.
    pub async fn increment_clicks_in<C: ConnectionTrait>(conn: &C, id: Uuid) -> DaoResult<()> {
        Affiliate::update_many()
            .col_expr(
                affiliate::Column::Clicks,
                Expr::col(affiliate::Column::Clicks).add(1),
            )
            .filter(affiliate::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(())
    }

    pub async fn find_by_id_in<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> DaoResult<Option<affiliate::Model>> {
        Affiliate::find_by_id(id)
            .one(conn)
            .await
            .map_err(DaoLayerError::Db)
    }
}
