use sea_orm::{EntityTrait, IntoActiveModel, Order, Select};
use uuid::Uuid;

use crate::db::dao::{DaoBase, DaoLayerError};
use crate::error::AppError;

type CrudEntity<D> = <D as DaoBase>::Entity;
type CrudModel<D> = <CrudEntity<D> as EntityTrait>::Model;
type CrudActiveModel<D> = <CrudEntity<D> as EntityTrait>::ActiveModel;
type CrudColumn<D> = <CrudEntity<D> as EntityTrait>::Column;

#[derive(Clone, Copy)]
pub struct CrudErrors {
    pub create_failed: &'static str,
    pub find_failed: &'static str,
    pub not_found: &'static str,
    pub update_failed: &'static str,
    pub delete_failed: &'static str,
}

impl Default for CrudErrors {
    fn default() -> Self {
        Self {
            create_failed: "Create failed",
            find_failed: "Find failed",
            not_found: "Resource not found",
            update_failed: "Update failed",
            delete_failed: "Delete failed",
        }
    }
}

#[derive(Clone, Copy)]
pub enum CrudOp {
    Create,
    Find,
    List,
    Update,
    Delete,
}

/// Plain record CRUD over a single DAO with per-resource error messages.
#[async_trait::async_trait]
pub trait CrudService {
    type Dao: DaoBase;

    fn dao(&self) -> &Self::Dao;

    fn errors(&self) -> CrudErrors {
        CrudErrors::default()
    }

    fn map_error(&self, op: CrudOp, err: DaoLayerError) -> AppError {
        let errors = self.errors();
        match err {
            DaoLayerError::Db(db_err) => {
                // Constraint violations keep their client-facing meaning.
                if db_err.sql_err().is_some() {
                    return AppError::from(db_err);
                }
                let context = match op {
                    CrudOp::Create => errors.create_failed,
                    CrudOp::Find | CrudOp::List => errors.find_failed,
                    CrudOp::Update => errors.update_failed,
                    CrudOp::Delete => errors.delete_failed,
                };
                tracing::error!(error = %db_err, "{context}");
                AppError::internal(format!(
                    "{context}. Please check the logs for more details"
                ))
            }
            DaoLayerError::NotFound { .. } => AppError::not_found(errors.not_found),
            DaoLayerError::InvalidPagination { .. } => AppError::bad_request(err.to_string()),
        }
    }

    async fn create<T>(&self, data: T) -> Result<CrudModel<Self::Dao>, AppError>
    where
        T: IntoActiveModel<CrudActiveModel<Self::Dao>> + Send,
    {
        self.dao()
            .create(data)
            .await
            .map_err(|err| self.map_error(CrudOp::Create, err))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<CrudModel<Self::Dao>, AppError> {
        self.dao()
            .find_by_id(id)
            .await
            .map_err(|err| self.map_error(CrudOp::Find, err))
    }

    async fn list<F>(
        &self,
        order: Option<(CrudColumn<Self::Dao>, Order)>,
        apply: F,
    ) -> Result<Vec<CrudModel<Self::Dao>>, AppError>
    where
        F: FnOnce(Select<CrudEntity<Self::Dao>>) -> Select<CrudEntity<Self::Dao>> + Send,
    {
        self.dao()
            .find_all(order, apply)
            .await
            .map_err(|err| self.map_error(CrudOp::List, err))
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> Result<CrudModel<Self::Dao>, AppError>
    where
        F: for<'a> FnOnce(&'a mut CrudActiveModel<Self::Dao>) + Send,
    {
        self.dao()
            .update(id, apply)
            .await
            .map_err(|err| self.map_error(CrudOp::Update, err))
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.dao()
            .delete(id)
            .await
            .map(|_| ())
            .map_err(|err| self.map_error(CrudOp::Delete, err))
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{
        DatabaseBackend, DatabaseConnection, DbErr, IntoMockRow, MockDatabase, MockExecResult,
        Set,
    };
    use uuid::Uuid;

    use super::{CrudErrors, CrudService};
    use crate::db::dao::{DaoBase, FormEmailDao};
    use crate::db::entities::form_email;
    use crate::test_helpers::ts;

    #[derive(Clone)]
    struct TestCrudService {
        dao: FormEmailDao,
        errors: CrudErrors,
    }

    #[async_trait::async_trait]
    impl CrudService for TestCrudService {
        type Dao = FormEmailDao;

        fn dao(&self) -> &Self::Dao {
            &self.dao
        }

        fn errors(&self) -> CrudErrors {
            self.errors
        }
    }

    struct CrudFixtureBuilder {
        mock: MockDatabase,
        errors: CrudErrors,
    }

    impl CrudFixtureBuilder {
        fn new() -> Self {
            Self {
                mock: MockDatabase::new(DatabaseBackend::Postgres),
                errors: CrudErrors::default(),
            }
        }

        fn with_errors(mut self, errors: CrudErrors) -> Self {
            self.errors = errors;
            self
        }

        fn with_query_results<T, I, II>(mut self, sets: II) -> Self
        where
            T: IntoMockRow,
            I: IntoIterator<Item = T>,
            II: IntoIterator<Item = I>,
        {
            self.mock = self.mock.append_query_results(sets);
            self
        }

        fn with_query_error(mut self, error: DbErr) -> Self {
            self.mock = self.mock.append_query_errors([error]);
            self
        }

        fn with_exec_result(mut self, rows_affected: u64) -> Self {
            self.mock = self.mock.append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected,
            }]);
            self
        }

        fn build(self) -> TestCrudService {
            let db: DatabaseConnection = self.mock.into_connection();
            TestCrudService {
                dao: FormEmailDao::new(&db),
                errors: self.errors,
            }
        }
    }

    fn model(id: Uuid, email: &str) -> form_email::Model {
        form_email::Model {
            id,
            created_at: ts(),
            updated_at: ts(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn create_returns_model_on_success() {
        let id = Uuid::new_v4();
        let service = CrudFixtureBuilder::new()
            .with_query_results([vec![model(id, "a@example.com")]])
            .build();

        let created = service
            .create(form_email::ActiveModel {
                email: Set("a@example.com".to_string()),
                ..Default::default()
            })
            .await
            .expect("create should succeed");

        assert_eq!(created.id, id);
    }

    #[tokio::test]
    async fn create_maps_db_error_to_internal_with_create_message() {
        let service = CrudFixtureBuilder::new()
            .with_query_error(DbErr::Custom("insert failed".to_string()))
            .build();

        let err = service
            .create(form_email::ActiveModel {
                email: Set("a@example.com".to_string()),
                ..Default::default()
            })
            .await
            .expect_err("create should fail");

        assert_eq!(
            err.message(),
            "Create failed. Please check the logs for more details"
        );
    }

    #[tokio::test]
    async fn find_by_id_maps_not_found_to_service_message() {
        let service = CrudFixtureBuilder::new()
            .with_errors(CrudErrors {
                not_found: "Email not found",
                ..CrudErrors::default()
            })
            .with_query_results([Vec::<form_email::Model>::new()])
            .build();

        let err = service
            .find_by_id(Uuid::new_v4())
            .await
            .expect_err("find_by_id should fail");

        assert_eq!(err.message(), "Email not found");
    }

    #[tokio::test]
    async fn list_returns_all_rows() {
        let service = CrudFixtureBuilder::new()
            .with_query_results([vec![
                model(Uuid::new_v4(), "a@example.com"),
                model(Uuid::new_v4(), "b@example.com"),
            ]])
            .build();

        let rows = service
            .list(None, |query| query)
            .await
            .expect("list should succeed");
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn update_applies_changes() {
        let id = Uuid::new_v4();
        let service = CrudFixtureBuilder::new()
            .with_query_results([
                vec![model(id, "old@example.com")],
                vec![model(id, "new@example.com")],
            ])
            .build();

        let updated = service
            .update(id, |active| {
                active.email = Set("new@example.com".to_string());
            })
            .await
            .expect("update should succeed");
        assert_eq!(updated.email, "new@example.com");
    }

    #[tokio::test]
    async fn delete_maps_zero_rows_to_not_found() {
        let service = CrudFixtureBuilder::new().with_exec_result(0).build();

        let err = service
            .delete(Uuid::new_v4())
            .await
            .expect_err("delete should fail");
        assert_eq!(err.message(), "Resource not found");
    }

    #[tokio::test]
    async fn delete_returns_unit_on_success() {
        let service = CrudFixtureBuilder::new().with_exec_result(1).build();

        service
            .delete(Uuid::new_v4())
            .await
            .expect("delete should succeed");
    }
}
