use sea_orm::{ActiveValue, Set};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::providers::local::validate_email,
    db::dao::{FormAffiliateDao, FormEmailDao},
    db::entities::{form_affiliate, form_email},
    error::AppError,
    services::crud_service::{CrudErrors, CrudService},
};

#[derive(Debug, Clone, Deserialize)]
pub struct FormEmailInput {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormAffiliateInput {
    pub username: String,
    pub link: String,
    pub code: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormAffiliatePatch {
    pub username: Option<String>,
    pub link: Option<String>,
    pub code: Option<String>,
    pub email: Option<String>,
}

fn required(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::bad_request(format!("{field} is required")));
    }
    Ok(())
}

fn set_if_some(slot: &mut ActiveValue<String>, value: Option<String>) {
    if let Some(value) = value {
        *slot = Set(value);
    }
}

#[derive(Clone)]
pub struct FormEmailService {
    dao: FormEmailDao,
}

#[async_trait::async_trait]
impl CrudService for FormEmailService {
    type Dao = FormEmailDao;

    fn dao(&self) -> &Self::Dao {
        &self.dao
    }

    fn errors(&self) -> CrudErrors {
        CrudErrors {
            not_found: "Email not found",
            ..CrudErrors::default()
        }
    }
}

impl FormEmailService {
    pub fn new(dao: FormEmailDao) -> Self {
        Self { dao }
    }

    async fn ensure_unique(&self, email: &str, exclude: Option<Uuid>) -> Result<(), AppError> {
        if self.dao.email_taken(email, exclude).await? {
            return Err(AppError::bad_request("Email already exists"));
        }
        Ok(())
    }

    pub async fn submit(&self, input: FormEmailInput) -> Result<form_email::Model, AppError> {
        let email = input.email.trim().to_string();
        validate_email(&email)?;
        self.ensure_unique(&email, None).await?;
        self.create(form_email::ActiveModel {
            email: Set(email),
            ..Default::default()
        })
        .await
    }

    pub async fn all(&self) -> Result<Vec<form_email::Model>, AppError> {
        self.list(None, |query| query).await
    }

    pub async fn change(
        &self,
        id: Uuid,
        input: FormEmailInput,
    ) -> Result<form_email::Model, AppError> {
        let email = input.email.trim().to_string();
        validate_email(&email)?;
        self.find_by_id(id).await?;
        self.ensure_unique(&email, Some(id)).await?;
        self.update(id, move |active| active.email = Set(email)).await
    }
}

#[derive(Clone)]
pub struct FormAffiliateService {
    dao: FormAffiliateDao,
}

#[async_trait::async_trait]
impl CrudService for FormAffiliateService {
    type Dao = FormAffiliateDao;

    fn dao(&self) -> &Self::Dao {
        &self.dao
    }

    fn errors(&self) -> CrudErrors {
        CrudErrors {
            not_found: "Form Affiliate not found",
            ..CrudErrors::default()
        }
    }
}

impl FormAffiliateService {
    pub fn new(dao: FormAffiliateDao) -> Self {
        Self { dao }
    }

    pub async fn submit(
        &self,
        input: FormAffiliateInput,
    ) -> Result<form_affiliate::Model, AppError> {
        required(&input.username, "Username")?;
        required(&input.link, "Link")?;
        required(&input.code, "Code")?;
        validate_email(&input.email)?;
        self.create(form_affiliate::ActiveModel {
            username: Set(input.username),
            link: Set(input.link),
            code: Set(input.code),
            email: Set(input.email),
            ..Default::default()
        })
        .await
    }

    pub async fn all(&self) -> Result<Vec<form_affiliate::Model>, AppError> {
        self.list(None, |query| query).await
    }

    pub async fn change(
        &self,
        id: Uuid,
        patch: FormAffiliatePatch,
    ) -> Result<form_affiliate::Model, AppError> {
        if let Some(email) = patch.email.as_deref() {
            validate_email(email)?;
        }
        self.update(id, move |active| {
            set_if_some(&mut active.username, patch.username);
            set_if_some(&mut active.link, patch.link);
            set_if_some(&mut active.code, patch.code);
            set_if_some(&mut active.email, patch.email);
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use uuid::Uuid;

    use super::{FormAffiliateInput, FormAffiliateService, FormEmailInput, FormEmailService};
    use crate::db::dao::DaoContext;
    use crate::db::entities::form_email;
    use crate::services::crud_service::CrudService;
    use crate::test_helpers::ts;

    fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(1)]])
            .into_connection();
        let service = FormEmailService::new(DaoContext::new(&db).form_email());

        let err = service
            .submit(FormEmailInput {
                email: "lead@example.com".to_string(),
            })
            .await
            .expect_err("duplicate should fail");
        assert_eq!(err.message(), "Email already exists");
    }

    #[tokio::test]
    async fn new_email_is_stored() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(0)]])
            .append_query_results([[form_email::Model {
                id,
                created_at: ts(),
                updated_at: ts(),
                email: "lead@example.com".to_string(),
            }]])
            .into_connection();
        let service = FormEmailService::new(DaoContext::new(&db).form_email());

        let stored = service
            .submit(FormEmailInput {
                email: " lead@example.com ".to_string(),
            })
            .await
            .expect("submit should succeed");
        assert_eq!(stored.id, id);
    }

    #[tokio::test]
    async fn missing_rows_use_resource_messages() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<form_email::Model>::new()])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let daos = DaoContext::new(&db);

        let err = FormEmailService::new(daos.form_email())
            .find_by_id(Uuid::new_v4())
            .await
            .expect_err("missing email");
        assert_eq!(err.message(), "Email not found");

        let err = FormAffiliateService::new(daos.form_affiliate())
            .delete(Uuid::new_v4())
            .await
            .expect_err("missing form affiliate");
        assert_eq!(err.message(), "Form Affiliate not found");
    }

    #[tokio::test]
    async fn affiliate_form_requires_fields() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = FormAffiliateService::new(DaoContext::new(&db).form_affiliate());

        let err = service
            .submit(FormAffiliateInput {
                username: " ".to_string(),
                link: "https://example.com".to_string(),
                code: "CODE".to_string(),
                email: "a@example.com".to_string(),
            })
            .await
            .expect_err("username required");
        assert_eq!(err.message(), "Username is required");
    }
}
