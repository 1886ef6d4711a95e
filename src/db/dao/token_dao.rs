use chrono::{DateTime, FixedOffset};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::token::{self, Entity as Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

#[derive(Clone)]
pub struct TokenDao {
    db: DatabaseConnection,
}

impl DaoBase for TokenDao {
    type Entity = Token;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl TokenDao {
    pub async fn store(
        &self,
        user_id: Uuid,
        value: &str,
        kind: TokenKind,
        expires_at: DateTime<FixedOffset>,
    ) -> DaoResult<token::Model> {
        let model = token::ActiveModel {
            user_id: Set(user_id),
            token: Set(value.to_string()),
            kind: Set(kind.as_str().to_string()),
            expires_at: Set(expires_at),
            ..Default::default()
        };
        self.create(model).await
    }

    /// Persisted copy of `value` that has not yet expired at `now`.
    pub async fn find_live(
        &self,
        value: &str,
        kind: TokenKind,
        now: DateTime<FixedOffset>,
    ) -> DaoResult<Option<token::Model>> {
        let value = value.to_string();
        self.find_first(move |query| {
            query
                .filter(token::Column::Token.eq(value))
                .filter(token::Column::Kind.eq(kind.as_str()))
                .filter(token::Column::ExpiresAt.gt(now))
        })
        .await
    }

    pub async fn delete_for_user(&self, user_id: Uuid) -> DaoResult<u64> {
        let result = Token::delete_many()
            .filter(token::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use super::{TokenDao, TokenKind};
    use crate::db::dao::{DaoBase, DaoLayerError};
    use crate::db::entities::token;
    use crate::test_helpers::ts;

    fn token_model(user_id: Uuid, value: &str) -> token::Model {
        let now = ts();
        token::Model {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            user_id,
            token: value.to_string(),
            kind: TokenKind::Refresh.as_str().to_string(),
            expires_at: now + Duration::days(7),
        }
    }

    #[tokio::test]
    async fn find_live_returns_matching_row() {
        let user_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[token_model(user_id, "jwt")]])
            .into_connection();
        let dao = TokenDao::new(&db);

        let row = dao
            .find_live("jwt", TokenKind::Refresh, ts())
            .await
            .expect("query should succeed")
            .expect("token should exist");
        assert_eq!(row.user_id, user_id);
        assert_eq!(row.kind, "refresh");
    }

    #[tokio::test]
    async fn delete_for_user_reports_removed_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            }])
            .into_connection();
        let dao = TokenDao::new(&db);

        let removed = dao
            .delete_for_user(Uuid::new_v4())
            .await
            .expect("delete should succeed");
        assert_eq!(removed, 2);
    }

    #[tokio::test]
    async fn delete_for_user_maps_database_errors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([DbErr::Custom("delete failed".to_string())])
            .into_connection();
        let dao = TokenDao::new(&db);

        let err = dao
            .delete_for_user(Uuid::new_v4())
            .await
            .expect_err("delete should fail");
        assert!(matches!(err, DaoLayerError::Db(_)));
    }

    #[test]
    fn serialized_token_hides_value() {
        let json = serde_json::to_value(token_model(Uuid::new_v4(), "jwt"))
            .expect("token should serialize");
        assert_eq!(json["kind"], "refresh");
        assert!(json.get("token").is_none());
    }
}
