use chrono::{DateTime, FixedOffset};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use super::base::{insert_new, update_model};
use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::{prelude::User, user};

#[derive(Clone)]
pub struct UserDao {
    db: DatabaseConnection,
}

impl DaoBase for UserDao {
    type Entity = User;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub role_id: Uuid,
}

impl UserDao {
    pub async fn find_by_email(&self, email: &str) -> DaoResult<Option<user::Model>> {
        Self::find_by_email_in(&self.db, email).await
    }

    pub async fn find_by_email_in<C: ConnectionTrait>(
        conn: &C,
        email: &str,
    ) -> DaoResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .one(conn)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn find_by_name(&self, name: &str) -> DaoResult<Option<user::Model>> {
        let name = name.to_string();
        self.find_first(move |query| query.filter(user::Column::Name.eq(name)))
            .await
    }

    pub async fn find_by_id_in<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> DaoResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(conn)
            .await
            .map_err(DaoLayerError::Db)
    }

    /// `exclude` skips the row being edited so a user can keep their own email.
    pub async fn email_taken_in<C: ConnectionTrait>(
        conn: &C,
        email: &str,
        exclude: Option<Uuid>,
    ) -> DaoResult<bool> {
        let mut query = User::find().filter(user::Column::Email.eq(email));
        if let Some(id) = exclude {
            query = query.filter(user::Column::Id.ne(id));
        }
        let count = query.count(conn).await.map_err(DaoLayerError::Db)?;
        Ok(count > 0)
    }

    pub async fn name_taken_in<C: ConnectionTrait>(
        conn: &C,
        name: &str,
        exclude: Option<Uuid>,
    ) -> DaoResult<bool> {
        let mut query = User::find().filter(user::Column::Name.eq(name));
        if let Some(id) = exclude {
            query = query.filter(user::Column::Id.ne(id));
        }
        let count = query.count(conn).await.map_err(DaoLayerError::Db)?;
        Ok(count > 0)
    }

    pub async fn create_user(&self, new_user: NewUser) -> DaoResult<user::Model> {
        Self::create_user_in(&self.db, new_user).await
    }

    pub async fn create_user_in<C: ConnectionTrait>(
        conn: &C,
        new_user: NewUser,
    ) -> DaoResult<user::Model> {
        let model = user::ActiveModel {
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            name: Set(new_user.name),
            role_id: Set(new_user.role_id),
            login_attempts: Set(0),
            last_login_attempt: Set(None),
            reset_token: Set(None),
            reset_token_expiry: Set(None),
            ..Default::default()
        };
        insert_new(conn, model).await
    }

    pub async fn save_in<C, F>(conn: &C, model: user::Model, apply: F) -> DaoResult<user::Model>
    where
        C: ConnectionTrait,
        F: FnOnce(&mut user::ActiveModel),
    {
        update_model(conn, model, apply).await
    }

    pub async fn record_failed_login(
        &self,
        model: user::Model,
        attempts: i32,
        at: DateTime<FixedOffset>,
    ) -> DaoResult<user::Model> {
        Self::save_in(&self.db, model, |active| {
            active.login_attempts = Set(attempts);
            active.last_login_attempt = Set(Some(at));
        })
        .await
    }

    pub async fn record_successful_login(
        &self,
        model: user::Model,
        at: DateTime<FixedOffset>,
    ) -> DaoResult<user::Model> {
        Self::save_in(&self.db, model, |active| {
            active.login_attempts = Set(0);
            active.last_login_attempt = Set(Some(at));
        })
        .await
    }

    pub async fn set_reset_token(
        &self,
        model: user::Model,
        token: String,
        expiry: DateTime<FixedOffset>,
    ) -> DaoResult<user::Model> {
        Self::save_in(&self.db, model, |active| {
            active.reset_token = Set(Some(token));
            active.reset_token_expiry = Set(Some(expiry));
        })
        .await
    }

    /// Stores the new hash and clears every lockout and reset field.
    pub async fn complete_password_reset(
        &self,
        model: user::Model,
        password_hash: String,
    ) -> DaoResult<user::Model> {
        Self::save_in(&self.db, model, |active| {
            active.password_hash = Set(password_hash);
            active.reset_token = Set(None);
            active.reset_token_expiry = Set(None);
            active.login_attempts = Set(0);
            active.last_login_attempt = Set(None);
        })
        .await
    }

    pub async fn list_except(&self, caller: Uuid) -> DaoResult<Vec<user::Model>> {
        self.find_all(Some((user::Column::CreatedAt, Order::Desc)), move |query| {
            query.filter(user::Column::Id.ne(caller))
        })
        .await
    }

    pub async fn find_many(&self, ids: Vec<Uuid>) -> DaoResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.find_all(None, move |query| query.filter(user::Column::Id.is_in(ids)))
            .await
    }

    pub async fn delete_in<C: ConnectionTrait>(conn: &C, id: Uuid) -> DaoResult<()> {
        let result = User::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(DaoLayerError::Db)?;
        if result.rows_affected == 0 {
            return Err(DaoLayerError::NotFound {
                entity: super::error::entity_label::<User>(),
                id,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use uuid::Uuid;

    use super::UserDao;
    use crate::db::dao::{DaoBase, DaoLayerError};
    use crate::db::entities::user;
    use crate::test_helpers::ts;

    fn user_model(id: Uuid, email: &str) -> user::Model {
        let now = ts();
        user::Model {
            id,
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            password_hash: "hash".to_string(),
            name: Some("alice".to_string()),
            role_id: Uuid::nil(),
            login_attempts: 0,
            last_login_attempt: None,
            reset_token: None,
            reset_token_expiry: None,
        }
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
    }

    #[tokio::test]
    async fn find_by_email_returns_first_match() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user_model(id, "alice@example.com")]])
            .into_connection();
        let dao = UserDao::new(&db);

        let result = dao
            .find_by_email("alice@example.com")
            .await
            .expect("query should succeed");
        assert_eq!(result.map(|u| u.id), Some(id));
    }

    #[tokio::test]
    async fn email_taken_reads_the_count() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(1)], [count_row(0)]])
            .into_connection();

        assert!(
            UserDao::email_taken_in(&db, "alice@example.com", None)
                .await
                .expect("count should succeed")
        );
        assert!(
            !UserDao::email_taken_in(&db, "alice@example.com", Some(Uuid::new_v4()))
                .await
                .expect("count should succeed")
        );
    }

    #[tokio::test]
    async fn failed_login_bumps_counter() {
        let id = Uuid::new_v4();
        let mut locked = user_model(id, "alice@example.com");
        locked.login_attempts = 3;
        locked.last_login_attempt = Some(ts());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[locked.clone()]])
            .into_connection();
        let dao = UserDao::new(&db);

        let saved = dao
            .record_failed_login(user_model(id, "alice@example.com"), 3, ts())
            .await
            .expect("update should succeed");
        assert_eq!(saved.login_attempts, 3);
        assert_eq!(saved.last_login_attempt, Some(ts()));
    }

    #[tokio::test]
    async fn delete_reports_missing_rows() {
        let missing = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let err = UserDao::delete_in(&db, missing)
            .await
            .expect_err("delete should fail");
        assert!(matches!(err, DaoLayerError::NotFound { id, .. } if id == missing));
    }

    #[test]
    fn serialized_user_hides_password_and_reset_token() {
        let mut row = user_model(Uuid::new_v4(), "alice@example.com");
        row.reset_token = Some("secret".to_string());

        let json = serde_json::to_value(&row).expect("user should serialize");
        assert_eq!(json["email"], "alice@example.com");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("reset_token").is_none());
    }
}
