use sea_orm::{Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::dao::{DaoBase, DaoContext, PermissionDao, RoleDao, UserDao, base::update_model},
    db::entities::{permission, role},
    error::AppError,
    services::crud_service::{CrudErrors, CrudService},
    services::transaction::finish,
};

const FORBIDDEN_MESSAGE: &str = "You do not have permission to perform this action";

#[derive(Debug, Clone, Serialize)]
pub struct RoleView {
    #[serde(flatten)]
    pub role: role::Model,
    pub permissions: Vec<permission::Model>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleInput {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub permission_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RolePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permission_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PermissionInput {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PermissionPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

fn role_not_found() -> AppError {
    AppError::not_found("Role not found")
}

fn require_name(name: &str, what: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request(format!("{what} name is required")));
    }
    Ok(name.to_string())
}

#[derive(Clone)]
pub struct RoleService {
    roles: RoleDao,
    users: UserDao,
}

impl RoleService {
    pub fn new(daos: &DaoContext) -> Self {
        Self {
            roles: daos.role(),
            users: daos.user(),
        }
    }

    /// One lookup per request: the caller's role and its permission names.
    pub async fn authorize(&self, user_id: Uuid, required: &str) -> Result<(), AppError> {
        let user = self
            .users
            .try_find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("User not found"))?;
        let granted = self.roles.permission_names(user.role_id).await?;
        if granted.iter().any(|name| name == required) {
            Ok(())
        } else {
            Err(AppError::forbidden(FORBIDDEN_MESSAGE))
        }
    }

    async fn view(&self, role: role::Model) -> Result<RoleView, AppError> {
        let permissions = self.roles.permissions_of(role.id).await?;
        Ok(RoleView { role, permissions })
    }

    async fn require(&self, id: Uuid) -> Result<role::Model, AppError> {
        self.roles.try_find_by_id(id).await?.ok_or_else(role_not_found)
    }

    pub async fn list(&self) -> Result<Vec<RoleView>, AppError> {
        let mut views = Vec::new();
        for role in self.roles.list().await? {
            views.push(self.view(role).await?);
        }
        Ok(views)
    }

    pub async fn get(&self, id: Uuid) -> Result<RoleView, AppError> {
        let role = self.require(id).await?;
        self.view(role).await
    }

    #[tracing::instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: RoleInput) -> Result<RoleView, AppError> {
        let name = require_name(&input.name, "Role")?;
        if self.roles.name_taken(&name, None).await? {
            return Err(AppError::conflict("Role name already exists"));
        }

        let txn = self.roles.db().begin().await?;
        let outcome = async {
            let permission_ids = existing_permission_ids(&txn, &input.permission_ids).await?;
            let role = RoleDao::create_in(&txn, name, input.description).await?;
            RoleDao::grant_in(&txn, role.id, &permission_ids).await?;
            Ok::<_, AppError>(role)
        }
        .await;
        let role = finish(txn, outcome).await?;
        self.view(role).await
    }

    pub async fn update(&self, id: Uuid, patch: RolePatch) -> Result<RoleView, AppError> {
        let existing = self.require(id).await?;
        let name = patch
            .name
            .as_deref()
            .map(|name| require_name(name, "Role"))
            .transpose()?;
        if let Some(name) = name.as_deref()
            && self.roles.name_taken(name, Some(id)).await?
        {
            return Err(AppError::conflict("Role name already exists"));
        }

        let txn = self.roles.db().begin().await?;
        let outcome = async {
            let role = update_model(&txn, existing, |active: &mut role::ActiveModel| {
                if let Some(name) = name {
                    active.name = Set(name);
                }
                if let Some(description) = patch.description {
                    active.description = Set(Some(description));
                }
            })
            .await?;
            if let Some(permission_ids) = patch.permission_ids.as_deref() {
                let permission_ids = existing_permission_ids(&txn, permission_ids).await?;
                RoleDao::replace_permissions_in(&txn, id, &permission_ids).await?;
            }
            Ok::<_, AppError>(role)
        }
        .await;
        let role = finish(txn, outcome).await?;
        self.view(role).await
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        self.require(id).await?;
        let txn = self.roles.db().begin().await?;
        let outcome = async {
            RoleDao::clear_permissions_in(&txn, id).await?;
            RoleDao::delete_in(&txn, id).await?;
            Ok::<_, AppError>(())
        }
        .await;
        finish(txn, outcome).await
    }
}

/// Drops repeated ids, keeping first-seen order, and fails if any id is
/// unknown.
async fn existing_permission_ids<C: sea_orm::ConnectionTrait>(
    conn: &C,
    ids: &[Uuid],
) -> Result<Vec<Uuid>, AppError> {
    let mut unique: Vec<Uuid> = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }
    let found = PermissionDao::find_many_in(conn, &unique).await?;
    if found.len() != unique.len() {
        return Err(AppError::bad_request("Permission not found"));
    }
    Ok(unique)
}

#[derive(Clone)]
pub struct PermissionService {
    dao: PermissionDao,
}

#[async_trait::async_trait]
impl CrudService for PermissionService {
    type Dao = PermissionDao;

    fn dao(&self) -> &Self::Dao {
        &self.dao
    }

    fn errors(&self) -> CrudErrors {
        CrudErrors {
            not_found: "Permission not found",
            ..CrudErrors::default()
        }
    }
}

impl PermissionService {
    pub fn new(daos: &DaoContext) -> Self {
        Self {
            dao: daos.permission(),
        }
    }

    pub async fn all(&self) -> Result<Vec<permission::Model>, AppError> {
        Ok(self.dao.list().await?)
    }

    pub async fn add(&self, input: PermissionInput) -> Result<permission::Model, AppError> {
        let name = require_name(&input.name, "Permission")?;
        if self.dao.name_taken(&name, None).await? {
            return Err(AppError::conflict("Permission name already exists"));
        }
        self.create(permission::ActiveModel {
            name: Set(name),
            description: Set(input.description),
            ..Default::default()
        })
        .await
    }

    pub async fn change(
        &self,
        id: Uuid,
        patch: PermissionPatch,
    ) -> Result<permission::Model, AppError> {
        self.find_by_id(id).await?;
        let name = patch
            .name
            .as_deref()
            .map(|name| require_name(name, "Permission"))
            .transpose()?;
        if let Some(name) = name.as_deref()
            && self.dao.name_taken(name, Some(id)).await?
        {
            return Err(AppError::conflict("Permission name already exists"));
        }
        self.update(id, move |active| {
            if let Some(name) = name {
                active.name = Set(name);
            }
            if let Some(description) = patch.description {
                active.description = Set(Some(description));
            }
        })
        .await
    }
}
