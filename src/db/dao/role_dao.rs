use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::base::insert_new;
use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::prelude::{Permission, Role, RolePermission};
use crate::db::entities::{permission, role, role_permission};

#[derive(Clone)]
pub struct RoleDao {
    db: DatabaseConnection,
}

impl DaoBase for RoleDao {
    type Entity = Role;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl RoleDao {
    pub async fn find_by_name(&self, name: &str) -> DaoResult<Option<role::Model>> {
        Self::find_by_name_in(&self.db, name).await
    }

    pub async fn find_by_name_in<C: ConnectionTrait>(
        conn: &C,
        name: &str,
    ) -> DaoResult<Option<role::Model>> {
        Role::find()
            .filter(role::Column::Name.eq(name))
            .one(conn)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn find_by_id_in<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> DaoResult<Option<role::Model>> {
        Role::find_by_id(id)
            .one(conn)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn name_taken(&self, name: &str, exclude: Option<Uuid>) -> DaoResult<bool> {
        let mut query = Role::find().filter(role::Column::Name.eq(name));
        if let Some(id) = exclude {
            query = query.filter(role::Column::Id.ne(id));
        }
        let count = query.count(&self.db).await.map_err(DaoLayerError::Db)?;
        Ok(count > 0)
    }

    pub async fn list(&self) -> DaoResult<Vec<role::Model>> {
        self.find_all(Some((role::Column::Name, Order::Asc)), |query| query)
            .await
    }

    pub async fn find_many(&self, ids: Vec<Uuid>) -> DaoResult<Vec<role::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.find_all(None, move |query| query.filter(role::Column::Id.is_in(ids)))
            .await
    }

    /// Permissions granted to a role, ordered by name.
    pub async fn permissions_of(&self, role_id: Uuid) -> DaoResult<Vec<permission::Model>> {
        Self::permissions_of_in(&self.db, role_id).await
    }

    pub async fn permissions_of_in<C: ConnectionTrait>(
        conn: &C,
        role_id: Uuid,
    ) -> DaoResult<Vec<permission::Model>> {
        let permission_ids: Vec<Uuid> = RolePermission::find()
            .filter(role_permission::Column::RoleId.eq(role_id))
            .all(conn)
            .await
            .map_err(DaoLayerError::Db)?
            .into_iter()
            .map(|link| link.permission_id)
            .collect();
        if permission_ids.is_empty() {
            return Ok(Vec::new());
        }

        Permission::find()
            .filter(permission::Column::Id.is_in(permission_ids))
            .order_by_asc(permission::Column::Name)
            .all(conn)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn permission_names(&self, role_id: Uuid) -> DaoResult<Vec<String>> {
        Ok(self
            .permissions_of(role_id)
            .await?
            .into_iter()
            .map(|permission| permission.name)
            .collect())
    }

    pub async fn create_in<C: ConnectionTrait>(
        conn: &C,
        name: String,
        description: Option<String>,
    ) -> DaoResult<role::Model> {
        let model = role::ActiveModel {
            name: Set(name),
            description: Set(description),
            ..Default::default()
        };
        insert_new(conn, model).await
    }

    /// Replaces the role's permission set with exactly `permission_ids`.
    pub async fn replace_permissions_in<C: ConnectionTrait>(
        conn: &C,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> DaoResult<()> {
        Self::clear_permissions_in(conn, role_id).await?;
        Self::grant_in(conn, role_id, permission_ids).await
    }

    pub async fn grant_in<C: ConnectionTrait>(
        conn: &C,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> DaoResult<()> {
        for permission_id in permission_ids {
            let link = role_permission::ActiveModel {
                role_id: Set(role_id),
                permission_id: Set(*permission_id),
                ..Default::default()
            };
            insert_new(conn, link).await?;
        }
        Ok(())
    }

    pub async fn clear_permissions_in<C: ConnectionTrait>(
        conn: &C,
        role_id: Uuid,
    ) -> DaoResult<u64> {
        let result = RolePermission::delete_many()
            .filter(role_permission::Column::RoleId.eq(role_id))
            .exec(conn)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(result.rows_affected)
    }

    pub async fn delete_in<C: ConnectionTrait>(conn: &C, role_id: Uuid) -> DaoResult<u64> {
        let result = Role::delete_by_id(role_id)
            .exec(conn)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use super::RoleDao;
    use crate::db::dao::DaoBase;
    use crate::db::entities::{permission, role_permission};
    use crate::test_helpers::ts;

    fn link(role_id: Uuid, permission_id: Uuid) -> role_permission::Model {
        let now = ts();
        role_permission::Model {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            role_id,
            permission_id,
        }
    }

    fn permission_model(id: Uuid, name: &str) -> permission::Model {
        let now = ts();
        permission::Model {
            id,
            created_at: now,
            updated_at: now,
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn permission_names_follow_role_links() {
        let role_id = Uuid::new_v4();
        let create = Uuid::new_v4();
        let view = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[link(role_id, create), link(role_id, view)]])
            .append_query_results([[
                permission_model(create, "create:post"),
                permission_model(view, "view:post"),
            ]])
            .into_connection();
        let dao = RoleDao::new(&db);

        let names = dao
            .permission_names(role_id)
            .await
            .expect("lookup should succeed");
        assert_eq!(names, vec!["create:post", "view:post"]);
    }

    #[tokio::test]
    async fn role_without_links_skips_permission_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<role_permission::Model>::new()])
            .into_connection();
        let dao = RoleDao::new(&db);

        let names = dao
            .permission_names(Uuid::new_v4())
            .await
            .expect("lookup should succeed");
        assert!(names.is_empty());
    }
}
