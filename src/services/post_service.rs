use std::collections::HashMap;

use sea_orm::{ConnectionTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::dao::{DaoBase, DaoContext, ModelRef, PostDao, UserDao},
    db::entities::{post, user},
    error::AppError,
    services::{
        media_service::{
            DEFAULT_COLLECTION, MediaChanges, MediaMap, MediaService, MediaTarget, UploadedFile,
        },
        slug::{slugify, with_suffix},
    },
};

pub const POST_MODEL_TYPE: &str = "Post";
pub const POST_IMAGE_FIELD: &str = "image";
const MAX_TITLE_LEN: usize = 255;
const SLUG_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    pub description: Option<String>,
    pub published: Option<bool>,
    pub collection: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub description: Option<String>,
    pub published: Option<bool>,
    pub collection: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorRef {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
}

impl From<&user::Model> for AuthorRef {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: post::Model,
    pub author: Option<AuthorRef>,
    pub media: MediaMap,
}

fn post_not_found() -> AppError {
    AppError::not_found("Post not found")
}

fn validate_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::bad_request("Title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::bad_request("Title must be at most 255 characters"));
    }
    Ok(())
}

fn collection_or_default(collection: Option<&str>) -> &str {
    collection
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(DEFAULT_COLLECTION)
}

/// Slug for `title` that no other post uses; collisions get a random suffix.
pub async fn unique_slug_in<C: ConnectionTrait>(
    conn: &C,
    title: &str,
    exclude: Option<Uuid>,
) -> Result<String, AppError> {
    let base = slugify(title);
    if !PostDao::slug_taken_in(conn, &base, exclude).await? {
        return Ok(base);
    }
    for _ in 0..SLUG_ATTEMPTS {
        let candidate = with_suffix(&base);
        if !PostDao::slug_taken_in(conn, &candidate, exclude).await? {
            return Ok(candidate);
        }
    }
    Err(AppError::conflict("Could not generate a unique slug"))
}

#[derive(Clone)]
pub struct PostService {
    posts: PostDao,
    users: UserDao,
    media: MediaService,
}

impl PostService {
    pub fn new(daos: &DaoContext, media: MediaService) -> Self {
        Self {
            posts: daos.post(),
            users: daos.user(),
            media,
        }
    }

    fn owner(id: Uuid) -> ModelRef<'static> {
        ModelRef {
            model_type: POST_MODEL_TYPE,
            model_id: id,
        }
    }

    async fn view(&self, post: post::Model) -> Result<PostView, AppError> {
        let author = self.users.try_find_by_id(post.author_id).await?;
        let media = self.media.media_map_for(&Self::owner(post.id)).await?;
        Ok(PostView {
            author: author.as_ref().map(AuthorRef::from),
            media,
            post,
        })
    }

    pub async fn list(&self) -> Result<Vec<PostView>, AppError> {
        let posts = self.posts.list().await?;
        let mut author_ids: Vec<Uuid> = posts.iter().map(|post| post.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();
        let authors: HashMap<Uuid, AuthorRef> = self
            .users
            .find_many(author_ids)
            .await?
            .iter()
            .map(|user| (user.id, AuthorRef::from(user)))
            .collect();
        let mut media = self
            .media
            .media_maps_for(POST_MODEL_TYPE, posts.iter().map(|post| post.id).collect())
            .await?;

        Ok(posts
            .into_iter()
            .map(|post| PostView {
                author: authors.get(&post.author_id).cloned(),
                media: media.remove(&post.id).unwrap_or_default(),
                post,
            })
            .collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<PostView, AppError> {
        let post = self.posts.try_find_by_id(id).await?.ok_or_else(post_not_found)?;
        self.view(post).await
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<PostView, AppError> {
        if slug.trim().is_empty() {
            return Err(AppError::bad_request("Slug is required"));
        }
        let post = self.posts.find_by_slug(slug).await?.ok_or_else(post_not_found)?;
        self.view(post).await
    }

    #[tracing::instrument(skip(self, files, input), fields(files = files.len()))]
    pub async fn create(
        &self,
        author_id: Uuid,
        files: Vec<UploadedFile>,
        input: PostInput,
    ) -> Result<PostView, AppError> {
        if files.is_empty() {
            return Err(AppError::bad_request("No image file provided"));
        }
        validate_title(&input.title)?;
        if input.content.trim().is_empty() {
            return Err(AppError::bad_request("Content is required"));
        }
        self.media.validate_images(&files)?;

        let txn = self.posts.db().begin().await?;
        let mut changes = MediaChanges::default();
        let outcome = async {
            let slug = unique_slug_in(&txn, &input.title, None).await?;
            let post = PostDao::insert_in(
                &txn,
                post::ActiveModel {
                    title: Set(input.title.clone()),
                    slug: Set(slug),
                    description: Set(input.description.clone()),
                    content: Set(input.content.clone()),
                    published: Set(input.published.unwrap_or(false)),
                    author_id: Set(author_id),
                    ..Default::default()
                },
            )
            .await?;
            let target = MediaTarget {
                owner: Self::owner(post.id),
                field_type: POST_IMAGE_FIELD,
                collection: collection_or_default(input.collection.as_deref()),
                user_id: Some(author_id),
            };
            self.media
                .replace_uploads_in(&txn, &mut changes, &files, &target)
                .await?;
            Ok::<_, AppError>(post)
        }
        .await;
        let post = self.media.settle(txn, changes, outcome).await?;
        self.view(post).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        patch: PostPatch,
        files: Vec<UploadedFile>,
        user_id: Uuid,
    ) -> Result<PostView, AppError> {
        let existing = self.posts.try_find_by_id(id).await?.ok_or_else(post_not_found)?;
        if let Some(title) = patch.title.as_deref() {
            validate_title(title)?;
        }
        self.media.validate_images(&files)?;

        let txn = self.posts.db().begin().await?;
        let mut changes = MediaChanges::default();
        let outcome = async {
            let slug = match patch.title.as_deref() {
                Some(title) => Some(unique_slug_in(&txn, title, Some(id)).await?),
                None => None,
            };
            let target = MediaTarget {
                owner: Self::owner(id),
                field_type: POST_IMAGE_FIELD,
                collection: collection_or_default(patch.collection.as_deref()),
                user_id: Some(user_id),
            };
            self.media
                .replace_uploads_in(&txn, &mut changes, &files, &target)
                .await?;

            let post = PostDao::save_in(&txn, existing, |active| {
                if let Some(title) = patch.title.clone() {
                    active.title = Set(title);
                }
                if let Some(slug) = slug {
                    active.slug = Set(slug);
                }
                if let Some(description) = patch.description.clone() {
                    active.description = Set(Some(description));
                }
                if let Some(content) = patch.content.clone() {
                    active.content = Set(content);
                }
                if let Some(published) = patch.published {
                    active.published = Set(published);
                }
            })
            .await?;
            Ok::<_, AppError>(post)
        }
        .await;
        let post = self.media.settle(txn, changes, outcome).await?;
        self.view(post).await
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        if self.posts.try_find_by_id(id).await?.is_none() {
            return Err(post_not_found());
        }

        let txn = self.posts.db().begin().await?;
        let mut changes = MediaChanges::default();
        let outcome = async {
            MediaService::detach_model_in(&txn, &mut changes, &Self::owner(id)).await?;
            PostDao::delete_in(&txn, id).await?;
            Ok::<_, AppError>(())
        }
        .await;
        self.media.settle(txn, changes, outcome).await
    }
}
