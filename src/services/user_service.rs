use std::collections::HashMap;

use rand::Rng;
use sea_orm::{ConnectionTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{
        password::{
            ensure_passwords_match, hash_password, validate_password_strength, verify_password,
        },
        providers::local::validate_email,
    },
    db::dao::{
        AffiliateDao, DaoBase, DaoContext, ModelRef, NewAffiliate, NewUser, RoleDao, UserDao,
    },
    db::entities::{affiliate, role, user},
    error::AppError,
    services::media_service::{MediaChanges, MediaMap, MediaService, MediaTarget, UploadedFile},
};

pub const USER_MODEL_TYPE: &str = "User";
pub const AVATAR_FIELD: &str = "avatar";
pub const AVATAR_COLLECTION: &str = "Avatar";
const CODE_ATTEMPTS: usize = 10;
const CODE_SUFFIX_LEN: usize = 4;
const UPPER_BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Debug, Clone, Default)]
pub struct UserInput {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    pub role_id: Option<Uuid>,
    pub code_aff: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role_id: Option<Uuid>,
    pub code_aff: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffiliateRef {
    pub id: Uuid,
    pub code: String,
}

/// Public shape of a user; the password hash and reset fields stay behind.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: Option<RoleRef>,
    pub affiliates: Vec<AffiliateRef>,
    pub avatar: Option<String>,
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
    pub updated_at: chrono::DateTime<chrono::FixedOffset>,
}

impl UserView {
    fn build(
        user: user::Model,
        role: Option<&role::Model>,
        affiliates: &[affiliate::Model],
        media: Option<&MediaMap>,
    ) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: role.map(|role| RoleRef {
                id: role.id,
                name: role.name.clone(),
            }),
            affiliates: affiliates
                .iter()
                .filter(|affiliate| affiliate.user_id == user.id)
                .map(|affiliate| AffiliateRef {
                    id: affiliate.id,
                    code: affiliate.code.clone(),
                })
                .collect(),
            avatar: media
                .and_then(|map| map.get(AVATAR_FIELD))
                .and_then(|refs| refs.first())
                .map(|avatar| avatar.url.clone()),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

fn user_not_found() -> AppError {
    AppError::not_found("User not found")
}

fn owner(id: Uuid) -> ModelRef<'static> {
    ModelRef {
        model_type: USER_MODEL_TYPE,
        model_id: id,
    }
}

fn avatar_target(id: Uuid, uploader: Option<Uuid>) -> MediaTarget<'static> {
    MediaTarget {
        owner: owner(id),
        field_type: AVATAR_FIELD,
        collection: AVATAR_COLLECTION,
        user_id: uploader,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `AFF` + first 8 hex digits of the user id + 4 random base36 characters.
pub fn generate_affiliate_code(user_id: Uuid) -> String {
    let hex = user_id.simple().to_string();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..CODE_SUFFIX_LEN)
        .map(|_| UPPER_BASE36[rng.gen_range(0..UPPER_BASE36.len())] as char)
        .collect();
    format!("AFF{}{suffix}", hex[..8].to_uppercase())
}

async fn ensure_unique_identity<C: ConnectionTrait>(
    conn: &C,
    email: Option<&str>,
    name: Option<&str>,
    exclude: Option<Uuid>,
) -> Result<(), AppError> {
    if let Some(email) = email
        && UserDao::email_taken_in(conn, email, exclude).await?
    {
        return Err(AppError::bad_request("Email already in use"));
    }
    if let Some(name) = name
        && UserDao::name_taken_in(conn, name, exclude).await?
    {
        return Err(AppError::bad_request("Name already in use"));
    }
    Ok(())
}

async fn ensure_role_in<C: ConnectionTrait>(conn: &C, role_id: Uuid) -> Result<(), AppError> {
    if RoleDao::find_by_id_in(conn, role_id).await?.is_none() {
        return Err(AppError::not_found("Role not found"));
    }
    Ok(())
}

/// Gives a new user its first affiliate: the requested code, or a generated
/// one that nobody holds yet.
async fn assign_affiliate_in<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    requested: Option<String>,
) -> Result<affiliate::Model, AppError> {
    let (code, description) = match requested {
        Some(code) => {
            if AffiliateDao::code_taken_in(conn, &code, None).await? {
                return Err(AppError::bad_request("Affiliate code already exists"));
            }
            (code, "Custom affiliate code")
        }
        None => {
            let mut generated = None;
            for _ in 0..CODE_ATTEMPTS {
                let candidate = generate_affiliate_code(user_id);
                if !AffiliateDao::code_taken_in(conn, &candidate, None).await? {
                    generated = Some(candidate);
                    break;
                }
            }
            let code = generated
                .ok_or_else(|| AppError::conflict("Could not generate a unique affiliate code"))?;
            (code, "Auto-generated affiliate code")
        }
    };

    Ok(AffiliateDao::create_in(
        conn,
        NewAffiliate {
            code,
            description: Some(description.to_string()),
            commission: 0.0,
            user_id,
        },
    )
    .await?)
}

/// Moves the user's first affiliate to `code`, or creates one with it.
async fn change_affiliate_code_in<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    code: String,
) -> Result<(), AppError> {
    match AffiliateDao::first_for_user_in(conn, user_id).await? {
        Some(existing) if existing.code == code => Ok(()),
        Some(existing) => {
            if AffiliateDao::code_taken_in(conn, &code, Some(existing.id)).await? {
                return Err(AppError::bad_request("Affiliate code already exists"));
            }
            AffiliateDao::set_code_in(conn, existing, code).await?;
            Ok(())
        }
        None => {
            assign_affiliate_in(conn, user_id, Some(code)).await?;
            Ok(())
        }
    }
}

#[derive(Clone)]
pub struct UserService {
    users: UserDao,
    roles: RoleDao,
    affiliates: AffiliateDao,
    media: MediaService,
}

impl UserService {
    pub fn new(daos: &DaoContext, media: MediaService) -> Self {
        Self {
            users: daos.user(),
            roles: daos.role(),
            affiliates: daos.affiliate(),
            media,
        }
    }

    async fn require(&self, id: Uuid) -> Result<user::Model, AppError> {
        self.users.try_find_by_id(id).await?.ok_or_else(user_not_found)
    }

    async fn views(&self, users: Vec<user::Model>) -> Result<Vec<UserView>, AppError> {
        let ids: Vec<Uuid> = users.iter().map(|user| user.id).collect();
        let mut role_ids: Vec<Uuid> = users.iter().map(|user| user.role_id).collect();
        role_ids.sort_unstable();
        role_ids.dedup();

        let roles: HashMap<Uuid, role::Model> = self
            .roles
            .find_many(role_ids)
            .await?
            .into_iter()
            .map(|role| (role.id, role))
            .collect();
        let affiliates = self.affiliates.for_users(ids.clone()).await?;
        let media = self.media.media_maps_for(USER_MODEL_TYPE, ids).await?;

        Ok(users
            .into_iter()
            .map(|user| {
                let role = roles.get(&user.role_id);
                let media = media.get(&user.id);
                UserView::build(user, role, &affiliates, media)
            })
            .collect())
    }

    async fn view(&self, user: user::Model) -> Result<UserView, AppError> {
        self.views(vec![user])
            .await?
            .pop()
            .ok_or_else(user_not_found)
    }

    #[tracing::instrument(skip(self, input, avatar), fields(email = %input.email))]
    pub async fn create(
        &self,
        creator: Uuid,
        input: UserInput,
        avatar: Vec<UploadedFile>,
    ) -> Result<UserView, AppError> {
        let email = input.email.trim().to_string();
        validate_email(&email)?;
        validate_password_strength(&input.password)?;
        let role_id = input
            .role_id
            .ok_or_else(|| AppError::bad_request("Role is required"))?;
        let name = non_blank(input.name);
        let code_aff = non_blank(input.code_aff);
        self.media.validate_images(&avatar)?;
        let password_hash = hash_password(&input.password)?;

        let txn = self.users.db().begin().await?;
        let mut changes = MediaChanges::default();
        let outcome = async {
            ensure_unique_identity(&txn, Some(&email), name.as_deref(), None).await?;
            ensure_role_in(&txn, role_id).await?;
            let user = UserDao::create_user_in(
                &txn,
                NewUser {
                    email,
                    password_hash,
                    name,
                    role_id,
                },
            )
            .await?;
            assign_affiliate_in(&txn, user.id, code_aff).await?;
            self.media
                .replace_uploads_in(&txn, &mut changes, &avatar, &avatar_target(user.id, Some(creator)))
                .await?;
            Ok::<_, AppError>(user)
        }
        .await;
        let user = self.media.settle(txn, changes, outcome).await?;
        tracing::info!(user_id = %user.id, "user created");
        self.view(user).await
    }

    /// Everyone but the caller, newest first.
    pub async fn list(&self, caller: Uuid) -> Result<Vec<UserView>, AppError> {
        let users = self.users.list_except(caller).await?;
        self.views(users).await
    }

    pub async fn get(&self, id: Uuid) -> Result<UserView, AppError> {
        let user = self.require(id).await?;
        self.view(user).await
    }

    pub async fn by_name(&self, name: &str) -> Result<UserView, AppError> {
        let user = self
            .users
            .find_by_name(name.trim())
            .await?
            .ok_or_else(user_not_found)?;
        self.view(user).await
    }

    pub async fn update(
        &self,
        editor: Uuid,
        id: Uuid,
        patch: UserPatch,
        avatar: Vec<UploadedFile>,
    ) -> Result<UserView, AppError> {
        let existing = self.require(id).await?;
        let email = non_blank(patch.email);
        if let Some(email) = email.as_deref() {
            validate_email(email)?;
        }
        let name = non_blank(patch.name);
        let password_hash = match patch.password.filter(|password| !password.is_empty()) {
            Some(password) => {
                validate_password_strength(&password)?;
                Some(hash_password(&password)?)
            }
            None => None,
        };
        let code_aff = non_blank(patch.code_aff);
        self.media.validate_images(&avatar)?;

        let txn = self.users.db().begin().await?;
        let mut changes = MediaChanges::default();
        let outcome = async {
            ensure_unique_identity(&txn, email.as_deref(), name.as_deref(), Some(id)).await?;
            if let Some(role_id) = patch.role_id {
                ensure_role_in(&txn, role_id).await?;
            }
            let user = UserDao::save_in(&txn, existing, |active| {
                if let Some(email) = email {
                    active.email = Set(email);
                }
                if let Some(name) = name {
                    active.name = Set(Some(name));
                }
                if let Some(role_id) = patch.role_id {
                    active.role_id = Set(role_id);
                }
                if let Some(password_hash) = password_hash {
                    active.password_hash = Set(password_hash);
                }
            })
            .await?;
            if let Some(code) = code_aff {
                change_affiliate_code_in(&txn, id, code).await?;
            }
            self.media
                .replace_uploads_in(&txn, &mut changes, &avatar, &avatar_target(id, Some(editor)))
                .await?;
            Ok::<_, AppError>(user)
        }
        .await;
        let user = self.media.settle(txn, changes, outcome).await?;
        self.view(user).await
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        self.require(id).await?;
        let txn = self.users.db().begin().await?;
        let mut changes = MediaChanges::default();
        let outcome = async {
            MediaService::detach_model_in(&txn, &mut changes, &owner(id)).await?;
            UserDao::delete_in(&txn, id).await?;
            Ok::<_, AppError>(())
        }
        .await;
        self.media.settle(txn, changes, outcome).await?;
        tracing::info!(user_id = %id, "user removed");
        Ok(())
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<UserView, AppError> {
        self.get(user_id).await
    }

    /// Self-service edit; changing the password needs the current one.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        patch: ProfilePatch,
    ) -> Result<UserView, AppError> {
        let existing = self.require(user_id).await?;
        let email = non_blank(patch.email);
        if let Some(email) = email.as_deref() {
            validate_email(email)?;
        }
        let name = non_blank(patch.name);

        let password_hash = match patch.new_password.filter(|password| !password.is_empty()) {
            Some(new_password) => {
                let current = patch
                    .current_password
                    .filter(|password| !password.is_empty())
                    .ok_or_else(|| AppError::bad_request("Current password is required"))?;
                if !verify_password(&current, &existing.password_hash)? {
                    return Err(AppError::bad_request("Incorrect current password"));
                }
                validate_password_strength(&new_password)?;
                if let Some(confirm) = patch.confirm_password.as_deref() {
                    ensure_passwords_match(&new_password, confirm)?;
                }
                Some(hash_password(&new_password)?)
            }
            None => None,
        };

        ensure_unique_identity(self.users.db(), email.as_deref(), name.as_deref(), Some(user_id))
            .await?;
        let user = UserDao::save_in(self.users.db(), existing, |active| {
            if let Some(email) = email {
                active.email = Set(email);
            }
            if let Some(name) = name {
                active.name = Set(Some(name));
            }
            if let Some(password_hash) = password_hash {
                active.password_hash = Set(password_hash);
            }
        })
        .await?;
        self.view(user).await
    }
}
