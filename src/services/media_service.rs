use std::collections::{BTreeMap, HashMap, HashSet};

use axum::body::Bytes;
use sea_orm::{ConnectionTrait, DatabaseTransaction, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::StorageConfig,
    db::dao::{DaoBase, DaoContext, MediaDao, MediaQuery, ModelHasMediaDao, ModelRef},
    db::entities::{media, model_has_media},
    error::AppError,
};

use super::media_store::{MediaStore, is_name_char};

pub const DEFAULT_COLLECTION: &str = "Mặc định";
pub const DEFAULT_FIELD_TYPE: &str = "default";
const DEFAULT_PER_PAGE: u64 = 20;
const MAX_PER_PAGE: u64 = 100;
const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/jpg"];

/// A file pulled out of a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field_name: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Where uploaded files end up and who owns them.
#[derive(Debug, Clone)]
pub struct MediaTarget<'a> {
    pub owner: ModelRef<'a>,
    pub field_type: &'a str,
    pub collection: &'a str,
    pub user_id: Option<Uuid>,
}

/// Filesystem work that has to wait for the transaction outcome.
#[derive(Debug, Default)]
pub struct MediaChanges {
    pub stored: Vec<media::Model>,
    written: Vec<Uuid>,
    orphaned: Vec<Uuid>,
}

#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_files: usize,
    pub max_file_size: usize,
}

impl From<&StorageConfig> for UploadLimits {
    fn from(cfg: &StorageConfig) -> Self {
        Self {
            max_files: cfg.max_files,
            max_file_size: cfg.max_file_size_bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaRef {
    pub id: Uuid,
    pub file_name: String,
    pub url: String,
}

/// `field_type` to the media attached under it.
pub type MediaMap = BTreeMap<String, Vec<MediaRef>>;

#[derive(Debug, Clone, Serialize)]
pub struct MediaView {
    #[serde(flatten)]
    pub media: media::Model,
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub collection: Option<String>,
    pub search: Option<String>,
    /// Comma separated media ids.
    pub selected_ids: Option<String>,
    pub include_all_media: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaPage {
    pub data: Vec<MediaView>,
    pub current_page: u64,
    pub per_page: u64,
    pub total: u64,
    pub last_page: u64,
    pub collections: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_media: Option<Vec<MediaView>>,
}

#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub collection_name: Option<String>,
    pub model_type: Option<String>,
    pub model_id: Option<Uuid>,
    pub field_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkMediaInput {
    pub media_ids: Vec<Uuid>,
    pub model_type: String,
    pub model_id: Uuid,
    pub field_type: Option<String>,
}

fn media_not_found(id: Uuid) -> AppError {
    AppError::not_found(format!("Media with ID {id} not found"))
}

/// Blank means the default; anything outside `[A-Za-z0-9_-]` is refused since
/// the field type ends up in stored file names.
fn field_type_or_default(raw: Option<String>) -> Result<String, AppError> {
    match raw.filter(|field| !field.trim().is_empty()) {
        None => Ok(DEFAULT_FIELD_TYPE.to_string()),
        Some(field) if field.chars().all(is_name_char) => Ok(field),
        Some(_) => Err(AppError::bad_request("Invalid field type")),
    }
}

fn parse_selected_ids(raw: Option<&str>) -> Vec<Uuid> {
    raw.map(|raw| {
        raw.split(',')
            .filter_map(|part| Uuid::parse_str(part.trim()).ok())
            .collect()
    })
    .unwrap_or_default()
}

#[derive(Clone)]
pub struct MediaService {
    media: MediaDao,
    links: ModelHasMediaDao,
    store: MediaStore,
    limits: UploadLimits,
}

impl MediaService {
    pub fn new(daos: &DaoContext, store: MediaStore, limits: UploadLimits) -> Self {
        Self {
            media: daos.media(),
            links: daos.model_has_media(),
            store,
            limits,
        }
    }

    pub fn store(&self) -> &MediaStore {
        &self.store
    }

    pub fn view(&self, media: media::Model) -> MediaView {
        MediaView {
            url: self.store.url_for(&media.file_name),
            media,
        }
    }

    /// Count, size and type checks shared by every upload path.
    pub fn validate_images(&self, files: &[UploadedFile]) -> Result<(), AppError> {
        if files.len() > self.limits.max_files {
            return Err(AppError::bad_request(format!(
                "Too many files, at most {} allowed",
                self.limits.max_files
            )));
        }
        for file in files {
            if file.bytes.len() > self.limits.max_file_size {
                return Err(AppError::bad_request(format!(
                    "File too large: {}",
                    file.file_name
                )));
            }
            let content_type = file.content_type.to_ascii_lowercase();
            if !ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
                return Err(AppError::bad_request(
                    "Only JPEG, PNG, and JPG files are allowed!",
                ));
            }
        }
        Ok(())
    }

    /// Writes each file to disk and inserts its row, linking it when an
    /// owner is given.
    pub async fn store_files_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        changes: &mut MediaChanges,
        files: &[UploadedFile],
        collection: &str,
        user_id: Option<Uuid>,
        link: Option<(&ModelRef<'_>, &str)>,
    ) -> Result<(), AppError> {
        for file in files {
            let media_id = Uuid::new_v4();
            let field = link
                .map(|(_, field_type)| field_type)
                .unwrap_or(file.field_name.as_str());
            let stored_name = MediaStore::stored_name(field, &file.file_name, &file.content_type);
            changes.written.push(media_id);
            self.store.write(media_id, &stored_name, &file.bytes).await?;

            let row = media::ActiveModel {
                uuid: Set(Uuid::new_v4()),
                name: Set(file.file_name.clone()),
                file_name: Set(MediaStore::relative_path(media_id, &stored_name)),
                mime_type: Set(file.content_type.clone()),
                disk: Set("local".to_string()),
                size: Set(file.bytes.len() as i64),
                collection_name: Set(collection.to_string()),
                custom_properties: Set(serde_json::json!({ "alt": "", "title": "" })),
                user_id: Set(user_id),
                ..Default::default()
            };
            let stored = MediaDao::insert_in(conn, media_id, row).await?;
            if let Some((owner, field_type)) = link {
                ModelHasMediaDao::link_in(conn, owner, field_type, media_id).await?;
            }
            changes.stored.push(stored);
        }
        Ok(())
    }

    /// Drops every link of `owner`; media left without links are deleted and
    /// their directories queued for removal.
    pub async fn detach_model_in<C: ConnectionTrait>(
        conn: &C,
        changes: &mut MediaChanges,
        owner: &ModelRef<'_>,
    ) -> Result<(), AppError> {
        let links = ModelHasMediaDao::links_for_in(conn, owner, None).await?;
        if links.is_empty() {
            return Ok(());
        }

        let mut media_ids: Vec<Uuid> = Vec::with_capacity(links.len());
        for link in &links {
            if !media_ids.contains(&link.media_id) {
                media_ids.push(link.media_id);
            }
        }
        ModelHasMediaDao::delete_links_in(conn, links.into_iter().map(|link| link.id).collect())
            .await?;

        for media_id in media_ids {
            if ModelHasMediaDao::count_for_media_in(conn, media_id).await? == 0 {
                MediaDao::delete_in(conn, media_id).await?;
                changes.orphaned.push(media_id);
            }
        }
        Ok(())
    }

    /// New files replace whatever the owner had; no files leaves it untouched.
    pub async fn replace_uploads_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        changes: &mut MediaChanges,
        files: &[UploadedFile],
        target: &MediaTarget<'_>,
    ) -> Result<(), AppError> {
        if files.is_empty() {
            return Ok(());
        }
        Self::detach_model_in(conn, changes, &target.owner).await?;
        self.store_files_in(
            conn,
            changes,
            files,
            target.collection,
            target.user_id,
            Some((&target.owner, target.field_type)),
        )
        .await
    }

    /// Commits or rolls back, then applies the matching filesystem cleanup:
    /// orphaned directories go after a commit, fresh writes after a failure.
    pub async fn settle<T>(
        &self,
        txn: DatabaseTransaction,
        changes: MediaChanges,
        outcome: Result<T, AppError>,
    ) -> Result<T, AppError> {
        match outcome {
            Ok(value) => {
                if let Err(err) = txn.commit().await {
                    self.store.remove_dirs(&changes.written).await;
                    return Err(err.into());
                }
                self.store.remove_dirs(&changes.orphaned).await;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!(error = %rollback_err, "transaction rollback failed");
                }
                self.store.remove_dirs(&changes.written).await;
                Err(err)
            }
        }
    }

    pub async fn media_map_for(&self, owner: &ModelRef<'_>) -> Result<MediaMap, AppError> {
        let links = self.links.links_for(owner).await?;
        let mut maps = self.group_links(links).await?;
        Ok(maps.remove(&owner.model_id).unwrap_or_default())
    }

    pub async fn media_maps_for(
        &self,
        model_type: &str,
        model_ids: Vec<Uuid>,
    ) -> Result<HashMap<Uuid, MediaMap>, AppError> {
        let links = self.links.links_for_many(model_type, model_ids).await?;
        self.group_links(links).await
    }

    async fn group_links(
        &self,
        links: Vec<model_has_media::Model>,
    ) -> Result<HashMap<Uuid, MediaMap>, AppError> {
        let media_ids: Vec<Uuid> = links.iter().map(|link| link.media_id).collect();
        let media: HashMap<Uuid, media::Model> = self
            .media
            .find_many(&media_ids)
            .await?
            .into_iter()
            .map(|row| (row.id, row))
            .collect();

        let mut grouped: HashMap<Uuid, MediaMap> = HashMap::new();
        for link in links {
            let Some(row) = media.get(&link.media_id) else {
                continue;
            };
            grouped
                .entry(link.model_id)
                .or_default()
                .entry(link.field_type)
                .or_default()
                .push(MediaRef {
                    id: row.id,
                    file_name: row.file_name.clone(),
                    url: self.store.url_for(&row.file_name),
                });
        }
        Ok(grouped)
    }

    pub async fn list(&self, query: MediaListQuery) -> Result<MediaPage, AppError> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        let filter = MediaQuery {
            collection: query.collection.clone(),
            search: query.search.clone(),
        };

        let rows = self.media.page(&filter, page, per_page).await?;
        let total = rows.total.unwrap_or_default();
        let collections = self.media.collections().await?;

        let selected_ids = parse_selected_ids(query.selected_ids.as_deref());
        let wants_selected = query.include_all_media.unwrap_or(false) || page == 1;
        let selected_media = if wants_selected && !selected_ids.is_empty() {
            let selected = self.media.find_many(&selected_ids).await?;
            Some(selected.into_iter().map(|row| self.view(row)).collect())
        } else {
            None
        };

        Ok(MediaPage {
            data: rows.data.into_iter().map(|row| self.view(row)).collect(),
            current_page: page,
            per_page,
            total,
            last_page: total.div_ceil(per_page),
            collections,
            selected_media,
        })
    }

    pub async fn model_media(
        &self,
        owner: &ModelRef<'_>,
        collection: Option<&str>,
    ) -> Result<Vec<MediaView>, AppError> {
        let links = self.links.links_for(owner).await?;
        let ids: Vec<Uuid> = links.iter().map(|link| link.media_id).collect();
        let rows = self.media.find_many(&ids).await?;
        Ok(rows
            .into_iter()
            .filter(|row| collection.is_none_or(|name| row.collection_name == name))
            .map(|row| self.view(row))
            .collect())
    }

    #[tracing::instrument(skip(self, files, form), fields(files = files.len()))]
    pub async fn upload(
        &self,
        user_id: Uuid,
        files: Vec<UploadedFile>,
        form: UploadForm,
    ) -> Result<Vec<MediaView>, AppError> {
        if files.is_empty() {
            return Err(AppError::bad_request("No files were uploaded"));
        }
        self.validate_images(&files)?;

        let collection = form
            .collection_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string());
        let field_type = field_type_or_default(form.field_type)?;
        let owner = match (form.model_type.as_deref(), form.model_id) {
            (Some(model_type), Some(model_id)) if !model_type.is_empty() => Some(ModelRef {
                model_type,
                model_id,
            }),
            _ => None,
        };

        let txn = self.media.db().begin().await?;
        let mut changes = MediaChanges::default();
        let outcome = self
            .store_files_in(
                &txn,
                &mut changes,
                &files,
                &collection,
                Some(user_id),
                owner.as_ref().map(|owner| (owner, field_type.as_str())),
            )
            .await;
        let stored = std::mem::take(&mut changes.stored);
        self.settle(txn, changes, outcome).await?;
        Ok(stored.into_iter().map(|row| self.view(row)).collect())
    }

    pub async fn update_properties(
        &self,
        id: Uuid,
        custom_properties: serde_json::Value,
    ) -> Result<MediaView, AppError> {
        let row = self
            .media
            .try_find_by_id(id)
            .await?
            .ok_or_else(|| media_not_found(id))?;
        let updated = self.media.set_custom_properties(row, custom_properties).await?;
        Ok(self.view(updated))
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        if self.media.try_find_by_id(id).await?.is_none() {
            return Err(media_not_found(id));
        }

        let txn = self.media.db().begin().await?;
        let mut changes = MediaChanges::default();
        let outcome = async {
            ModelHasMediaDao::delete_for_media_in(&txn, id).await?;
            MediaDao::delete_in(&txn, id).await?;
            changes.orphaned.push(id);
            Ok::<_, AppError>(())
        }
        .await;
        self.settle(txn, changes, outcome).await
    }

    /// Links existing media to a model. Unknown ids and media already linked
    /// to the model are skipped.
    pub async fn link_to_model(
        &self,
        input: LinkMediaInput,
    ) -> Result<Vec<model_has_media::Model>, AppError> {
        let field_type = field_type_or_default(input.field_type)?;
        let owner = ModelRef {
            model_type: &input.model_type,
            model_id: input.model_id,
        };

        let txn = self.media.db().begin().await?;
        let outcome = async {
            let known = MediaDao::find_many_in(&txn, &input.media_ids).await?;
            let already: HashSet<Uuid> = ModelHasMediaDao::links_for_in(&txn, &owner, None)
                .await?
                .into_iter()
                .map(|link| link.media_id)
                .collect();

            let mut created = Vec::new();
            for row in known {
                if already.contains(&row.id) {
                    continue;
                }
                created.push(ModelHasMediaDao::link_in(&txn, &owner, &field_type, row.id).await?);
            }
            Ok::<_, AppError>(created)
        }
        .await;
        self.settle(txn, MediaChanges::default(), outcome).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use axum::body::Bytes;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use uuid::Uuid;

    use super::{
        LinkMediaInput, MediaChanges, MediaListQuery, MediaService, MediaTarget, UploadForm,
        UploadLimits, UploadedFile,
    };
    use crate::db::dao::{DaoContext, ModelRef};
    use crate::db::entities::{media, model_has_media};
    use crate::services::media_store::MediaStore;
    use crate::test_helpers::{media_model, ts};

    fn png(name: &str) -> UploadedFile {
        UploadedFile {
            field_name: "files".to_string(),
            file_name: name.to_string(),
            content_type: "image/png".to_string(),
            bytes: Bytes::from_static(b"\x89PNG"),
        }
    }

    fn service(db: &sea_orm::DatabaseConnection, root: &std::path::Path) -> MediaService {
        MediaService::new(
            &DaoContext::new(db),
            MediaStore::new(root, "http://localhost:3001"),
            UploadLimits {
                max_files: 2,
                max_file_size: 1024,
            },
        )
    }

    fn link(model_id: Uuid, media_id: Uuid) -> model_has_media::Model {
        model_has_media::Model {
            id: Uuid::new_v4(),
            created_at: ts(),
            updated_at: ts(),
            model_type: "Post".to_string(),
            model_id,
            field_type: "image".to_string(),
            media_id,
        }
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
    }

    #[test]
    fn rejects_non_images_and_oversized_files() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let tmp = tempfile::tempdir().expect("tempdir");
        let service = service(&db, tmp.path());

        let mut gif = png("a.gif");
        gif.content_type = "image/gif".to_string();
        let err = service.validate_images(&[gif]).expect_err("gif rejected");
        assert_eq!(err.message(), "Only JPEG, PNG, and JPG files are allowed!");

        let mut big = png("big.png");
        big.bytes = Bytes::from(vec![0u8; 2048]);
        assert!(service.validate_images(&[big]).is_err());

        assert!(
            service
                .validate_images(&[png("a.png"), png("b.png"), png("c.png")])
                .is_err()
        );
        assert!(service.validate_images(&[png("a.png")]).is_ok());
    }

    #[tokio::test]
    async fn upload_requires_files() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let tmp = tempfile::tempdir().expect("tempdir");
        let err = service(&db, tmp.path())
            .upload(Uuid::new_v4(), Vec::new(), UploadForm::default())
            .await
            .expect_err("empty upload should fail");
        assert_eq!(err.message(), "No files were uploaded");
    }

    #[tokio::test]
    async fn upload_writes_file_and_keeps_it_after_commit() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[media_model("photo.png")]])
            .into_connection();
        let service = service(&db, tmp.path());

        let stored = service
            .upload(Uuid::new_v4(), vec![png("photo.png")], UploadForm::default())
            .await
            .expect("upload should succeed");
        assert_eq!(stored.len(), 1);

        let dirs = std::fs::read_dir(tmp.path()).expect("read root").count();
        assert_eq!(dirs, 1, "one media directory should remain");
    }

    #[tokio::test]
    async fn failed_insert_removes_written_files() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([sea_orm::DbErr::Custom("insert failed".to_string())])
            .into_connection();
        let service = service(&db, tmp.path());

        let result = service
            .upload(Uuid::new_v4(), vec![png("photo.png")], UploadForm::default())
            .await;
        assert!(result.is_err());
        let dirs = std::fs::read_dir(tmp.path()).expect("read root").count();
        assert_eq!(dirs, 0, "written files should be cleaned up");
    }

    #[tokio::test]
    async fn detach_deletes_only_orphaned_media() {
        let owner_id = Uuid::new_v4();
        let shared = Uuid::new_v4();
        let orphan = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[link(owner_id, shared), link(owner_id, orphan)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            }])
            .append_query_results([[count_row(1)]])
            .append_query_results([[count_row(0)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let owner = ModelRef {
            model_type: "Post",
            model_id: owner_id,
        };

        let mut changes = MediaChanges::default();
        MediaService::detach_model_in(&db, &mut changes, &owner)
            .await
            .expect("detach should succeed");
        assert_eq!(changes.orphaned, vec![orphan]);
    }

    #[tokio::test]
    async fn replace_without_files_keeps_existing_media() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = service(&db, tmp.path());
        let target = MediaTarget {
            owner: ModelRef {
                model_type: "Post",
                model_id: Uuid::new_v4(),
            },
            field_type: "image",
            collection: "Post",
            user_id: None,
        };

        let mut changes = MediaChanges::default();
        service
            .replace_uploads_in(&db, &mut changes, &[], &target)
            .await
            .expect("noop should succeed");
        assert!(changes.stored.is_empty());
        assert!(changes.orphaned.is_empty());
    }

    #[tokio::test]
    async fn media_map_groups_by_field_type() {
        let owner_id = Uuid::new_v4();
        let row: media::Model = media_model("cover.png");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[link(owner_id, row.id)]])
            .append_query_results([[row.clone()]])
            .into_connection();
        let tmp = tempfile::tempdir().expect("tempdir");
        let owner = ModelRef {
            model_type: "Post",
            model_id: owner_id,
        };

        let map = service(&db, tmp.path())
            .media_map_for(&owner)
            .await
            .expect("map should load");
        let images = map.get("image").expect("image entry");
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].id, row.id);
        assert_eq!(
            images[0].url,
            format!("http://localhost:3001/uploads/{}", row.file_name)
        );
    }

    fn collection_row(name: &str) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("collection_name", Value::String(Some(name.to_string())))])
    }

    #[tokio::test]
    async fn upload_refuses_field_type_with_path_segments() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("a").join("uploads");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([sea_orm::DbErr::Custom("insert failed".to_string())])
            .into_connection();

        let err = service(&db, &root)
            .upload(
                Uuid::new_v4(),
                vec![png("photo.png")],
                UploadForm {
                    model_type: Some("Post".to_string()),
                    model_id: Some(Uuid::new_v4()),
                    field_type: Some("../../../escaped".to_string()),
                    ..UploadForm::default()
                },
            )
            .await
            .expect_err("field type should be refused");
        assert_eq!(err.message(), "Invalid field type");

        let entries = std::fs::read_dir(tmp.path()).expect("read tmp").count();
        assert_eq!(entries, 0, "nothing should be written anywhere");
    }

    #[tokio::test]
    async fn link_refuses_field_type_with_path_segments() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let tmp = tempfile::tempdir().expect("tempdir");

        let err = service(&db, tmp.path())
            .link_to_model(LinkMediaInput {
                media_ids: vec![Uuid::new_v4()],
                model_type: "Post".to_string(),
                model_id: Uuid::new_v4(),
                field_type: Some("a/b".to_string()),
            })
            .await
            .expect_err("field type should be refused");
        assert_eq!(err.message(), "Invalid field type");
    }

    #[tokio::test]
    async fn link_skips_unknown_and_already_linked_media() {
        let owner_id = Uuid::new_v4();
        let fresh = media_model("fresh.png");
        let linked = media_model("linked.png");
        let created = link(owner_id, fresh.id);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fresh.clone(), linked.clone()]])
            .append_query_results([[link(owner_id, linked.id)]])
            .append_query_results([[created.clone()]])
            .into_connection();
        let tmp = tempfile::tempdir().expect("tempdir");

        let links = service(&db, tmp.path())
            .link_to_model(LinkMediaInput {
                media_ids: vec![fresh.id, linked.id, Uuid::new_v4()],
                model_type: "Post".to_string(),
                model_id: owner_id,
                field_type: Some("image".to_string()),
            })
            .await
            .expect("link should succeed");
        assert_eq!(links, vec![created]);

        let inserts = db
            .into_transaction_log()
            .iter()
            .flat_map(|txn| txn.statements().to_vec())
            .filter(|stmt| stmt.sql.starts_with(r#"INSERT INTO "model_has_media""#))
            .count();
        assert_eq!(inserts, 1);
    }

    #[tokio::test]
    async fn remove_deletes_links_row_and_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let row = media_model("gone.png");
        let dir = tmp.path().join(row.id.to_string());
        std::fs::create_dir_all(&dir).expect("media dir");
        std::fs::write(dir.join("gone.png"), b"png").expect("media file");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[row.clone()]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        service(&db, tmp.path())
            .remove(row.id)
            .await
            .expect("remove should succeed");
        assert!(!dir.exists(), "media directory should be removed");

        let deletes: Vec<String> = db
            .into_transaction_log()
            .iter()
            .flat_map(|txn| txn.statements().to_vec())
            .map(|stmt| stmt.sql)
            .filter(|sql| sql.starts_with("DELETE"))
            .collect();
        assert_eq!(deletes.len(), 2);
        assert!(deletes[0].contains(r#""model_has_media""#));
        assert!(deletes[1].contains(r#""media""#));
    }

    #[tokio::test]
    async fn remove_unknown_media_is_not_found() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<media::Model>::new()])
            .into_connection();
        let id = Uuid::new_v4();

        let err = service(&db, tmp.path())
            .remove(id)
            .await
            .expect_err("missing media");
        assert_eq!(err.message(), format!("Media with ID {id} not found"));
    }

    #[tokio::test]
    async fn first_page_includes_selected_media_and_clamps_page_size() {
        let row = media_model("banner.png");
        let selected = media_model("chosen.png");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(1)]])
            .append_query_results([[row.clone()]])
            .append_query_results([[collection_row("Banner")]])
            .append_query_results([[selected.clone()]])
            .into_connection();
        let tmp = tempfile::tempdir().expect("tempdir");

        let page = service(&db, tmp.path())
            .list(MediaListQuery {
                per_page: Some(500),
                selected_ids: Some(format!("{}, not-a-uuid", selected.id)),
                ..MediaListQuery::default()
            })
            .await
            .expect("list should load");
        assert_eq!(page.current_page, 1);
        assert_eq!(page.per_page, 100);
        assert_eq!(page.total, 1);
        assert_eq!(page.last_page, 1);
        assert_eq!(page.collections, vec!["Banner".to_string()]);
        assert_eq!(page.data.len(), 1);
        let chosen = page.selected_media.expect("selected media on page 1");
        assert_eq!(chosen.len(), 1);
        assert_eq!(chosen[0].media.id, selected.id);
    }

    #[tokio::test]
    async fn later_pages_skip_selected_media_unless_asked() {
        let selected = media_model("chosen.png");
        let tmp = tempfile::tempdir().expect("tempdir");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(3)]])
            .append_query_results([[media_model("a.png")]])
            .append_query_results([[collection_row("Banner")]])
            .into_connection();

        let page = service(&db, tmp.path())
            .list(MediaListQuery {
                page: Some(2),
                per_page: Some(0),
                selected_ids: Some(selected.id.to_string()),
                ..MediaListQuery::default()
            })
            .await
            .expect("list should load");
        assert_eq!(page.per_page, 1);
        assert_eq!(page.last_page, 3);
        assert!(page.selected_media.is_none());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(3)]])
            .append_query_results([[media_model("a.png")]])
            .append_query_results([[collection_row("Banner")]])
            .append_query_results([[selected.clone()]])
            .into_connection();
        let page = service(&db, tmp.path())
            .list(MediaListQuery {
                page: Some(2),
                per_page: Some(1),
                selected_ids: Some(selected.id.to_string()),
                include_all_media: Some(true),
                ..MediaListQuery::default()
            })
            .await
            .expect("list should load");
        let chosen = page.selected_media.expect("selected media when asked");
        assert_eq!(chosen[0].media.id, selected.id);
    }
}
