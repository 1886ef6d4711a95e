use chrono::{DateTime, FixedOffset};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use super::base::insert_new;
use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::{affiliate_click, prelude::AffiliateClick};

#[derive(Clone)]
pub struct AffiliateClickDao {
    db: DatabaseConnection,
}

impl DaoBase for AffiliateClickDao {
    type Entity = AffiliateClick;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[derive(Debug, Clone)]
pub struct ClickSource<'a> {
    pub ip_address: &'a str,
    pub user_agent: &'a str,
}

impl AffiliateClickDao {
    pub async fn token_used_in<C: ConnectionTrait>(conn: &C, token: &str) -> DaoResult<bool> {
        let count = AffiliateClick::find()
            .filter(affiliate_click::Column::Token.eq(token))
            .count(conn)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(count > 0)
    }

    /// Clicks on one affiliate from the same IP and user agent since `since`.
    pub async fn count_recent_in<C: ConnectionTrait>(
        conn: &C,
        affiliate_id: Uuid,
        source: &ClickSource<'_>,
        since: DateTime<FixedOffset>,
    ) -> DaoResult<u64> {
        AffiliateClick::find()
            .filter(affiliate_click::Column::AffiliateId.eq(affiliate_id))
            .filter(affiliate_click::Column::IpAddress.eq(source.ip_address))
            .filter(affiliate_click::Column::UserAgent.eq(source.user_agent))
            .filter(affiliate_click::Column::CreatedAt.gte(since))
            .count(conn)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn record_in<C: ConnectionTrait>(
        conn: &C,
        affiliate_id: Uuid,
        source: &ClickSource<'_>,
        token: &str,
    ) -> DaoResult<affiliate_click::Model> {
        let model = affiliate_click::ActiveModel {
            affiliate_id: Set(affiliate_id),
            ip_address: Set(source.ip_address.to_string()),
            user_agent: Set(source.user_agent.to_string()),
            token: Set(token.to_string()),
            ..Default::default()
        };
        insert_new(conn, model).await
    }

    pub async fn list_for_affiliate(
        &self,
        affiliate_id: Uuid,
    ) -> DaoResult<Vec<affiliate_click::Model>> {
        self.find_all(
            Some((affiliate_click::Column::CreatedAt, Order::Desc)),
            move |query| query.filter(affiliate_click::Column::AffiliateId.eq(affiliate_id)),
        )
        .await
    }

    /// Clicks in `[from, to)`, optionally limited to a set of affiliates.
    pub async fn in_range(
        &self,
        affiliate_ids: Option<Vec<Uuid>>,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> DaoResult<Vec<affiliate_click::Model>> {
        if matches!(&affiliate_ids, Some(ids) if ids.is_empty()) {
            return Ok(Vec::new());
        }
        self.find_all(
            Some((affiliate_click::Column::CreatedAt, Order::Asc)),
            move |query| {
                let query = query
                    .filter(affiliate_click::Column::CreatedAt.gte(from))
                    .filter(affiliate_click::Column::CreatedAt.lt(to));
                match affiliate_ids {
                    Some(ids) => query.filter(affiliate_click::Column::AffiliateId.is_in(ids)),
                    None => query,
                }
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use uuid::Uuid;

    use super::{AffiliateClickDao, ClickSource};
    use crate::db::dao::DaoBase;
    use crate::db::entities::affiliate_click;
    use crate::test_helpers::ts;

    #[tokio::test]
    async fn count_recent_reads_num_items() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[BTreeMap::from([(
                "num_items",
                Value::BigInt(Some(29)),
            )])]])
            .into_connection();
        let source = ClickSource {
            ip_address: "10.0.0.1",
            user_agent: "agent",
        };

        let count = AffiliateClickDao::count_recent_in(
            &db,
            Uuid::new_v4(),
            &source,
            ts() - Duration::minutes(60),
        )
        .await
        .expect("count should succeed");
        assert_eq!(count, 29);
    }

    #[tokio::test]
    async fn in_range_short_circuits_empty_affiliate_set() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let dao = AffiliateClickDao::new(&db);

        let rows = dao
            .in_range(Some(Vec::new()), ts(), ts() + Duration::days(1))
            .await
            .expect("query should succeed");
        assert_eq!(rows, Vec::<affiliate_click::Model>::new());
    }
}
