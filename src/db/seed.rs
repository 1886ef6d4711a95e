use std::collections::HashMap;

use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use tracing::info;
use uuid::Uuid;

use crate::db::dao::{DaoResult, PermissionDao, RoleDao};

pub const PERMISSIONS: &[(&str, &str)] = &[
    ("create:post", "Create posts"),
    ("update:post", "Update posts"),
    ("delete:post", "Delete posts"),
    ("view:post", "View posts"),
    ("create:affiliate", "Create affiliates"),
    ("update:affiliate", "Update affiliates"),
    ("delete:affiliate", "Delete affiliates"),
    ("view:affiliate", "View affiliates"),
    ("create:user", "Create users"),
    ("update:user", "Update users"),
    ("delete:user", "Delete users"),
    ("view:user", "View users"),
    ("manage:roles", "Manage roles"),
    ("view:roles", "View roles"),
    ("manage:permissions", "Manage permissions"),
    ("view:permissions", "View permissions"),
];

const POST_PERMISSIONS: &[&str] = &["create:post", "update:post", "delete:post", "view:post"];
const AFFILIATE_PERMISSIONS: &[&str] = &[
    "create:affiliate",
    "update:affiliate",
    "delete:affiliate",
    "view:affiliate",
];

pub struct RoleSeed {
    pub name: &'static str,
    pub description: &'static str,
    /// `None` grants every seeded permission.
    pub grants: Option<Vec<&'static str>>,
}

pub fn role_seeds() -> Vec<RoleSeed> {
    vec![
        RoleSeed {
            name: "admin",
            description: "Full access",
            grants: None,
        },
        RoleSeed {
            name: "editor",
            description: "Manages posts and affiliates",
            grants: Some([POST_PERMISSIONS, AFFILIATE_PERMISSIONS].concat()),
        },
        RoleSeed {
            name: "affiliate_manager",
            description: "Manages affiliates",
            grants: Some(AFFILIATE_PERMISSIONS.to_vec()),
        },
        RoleSeed {
            name: "user",
            description: "Default role for new accounts",
            grants: Some(vec!["view:post", "view:affiliate"]),
        },
    ]
}

/// Inserts missing permissions and roles. Grants are only written when a
/// role is created, so edits made through the API survive restarts.
pub async fn seed_roles_and_permissions(db: &DatabaseConnection) -> anyhow::Result<()> {
    let txn = db.begin().await?;
    let permission_ids = ensure_permissions(&txn).await?;

    for seed in role_seeds() {
        if RoleDao::find_by_name_in(&txn, seed.name).await?.is_some() {
            continue;
        }
        let role =
            RoleDao::create_in(&txn, seed.name.to_string(), Some(seed.description.to_string()))
                .await?;
        let grants: Vec<Uuid> = match &seed.grants {
            None => permission_ids.values().copied().collect(),
            Some(names) => names
                .iter()
                .filter_map(|name| permission_ids.get(name).copied())
                .collect(),
        };
        RoleDao::grant_in(&txn, role.id, &grants).await?;
        info!(role = seed.name, permissions = grants.len(), "seeded role");
    }

    txn.commit().await?;
    Ok(())
}

async fn ensure_permissions<C: ConnectionTrait>(
    conn: &C,
) -> DaoResult<HashMap<&'static str, Uuid>> {
    let mut ids = HashMap::with_capacity(PERMISSIONS.len());
    for (name, description) in PERMISSIONS {
        let permission = match PermissionDao::find_by_name_in(conn, name).await? {
            Some(existing) => existing,
            None => PermissionDao::create_in(conn, name, Some(description.to_string())).await?,
        };
        ids.insert(*name, permission.id);
    }
    Ok(ids)
}
