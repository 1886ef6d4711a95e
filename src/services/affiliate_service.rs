use chrono::{Datelike, Duration, Utc};
use sea_orm::{Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::Claims,
    db::dao::{
        AffiliateClickDao, AffiliateDao, ClickSource, DaoBase, DaoContext, NewAffiliate, UserDao,
        base::update_model,
    },
    db::entities::{affiliate, affiliate_click},
    error::AppError,
    services::{
        stats::{self, AffiliateClicks, DashboardStats, StatsFilter, TimeStats, UserClicks},
        transaction::finish,
    },
};

/// Clicks allowed per affiliate, IP and user agent inside the window.
pub const CLICK_LIMIT: u64 = 30;
pub const CLICK_WINDOW_MINUTES: i64 = 60;

/// Who is asking; non-admins only ever see their own affiliates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub is_admin: bool,
}

impl Caller {
    pub fn from_claims(claims: &Claims) -> Result<Self, AppError> {
        Ok(Self {
            user_id: claims.user_id()?,
            is_admin: claims.is_admin(),
        })
    }

    pub fn scope(&self) -> Option<Uuid> {
        (!self.is_admin).then_some(self.user_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AffiliateInput {
    pub code: String,
    pub description: Option<String>,
    pub commission: Option<f64>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AffiliatePatch {
    pub code: Option<String>,
    pub description: Option<String>,
    pub commission: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClickInput {
    pub code: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClickResult {
    pub id: Uuid,
    pub code: String,
    pub clicks: i32,
}

fn validate_commission(commission: Option<f64>) -> Result<(), AppError> {
    match commission {
        Some(value) if !(0.0..=100.0).contains(&value) => Err(AppError::bad_request(
            "Commission must be between 0 and 100",
        )),
        _ => Ok(()),
    }
}

fn normalize_code(code: &str) -> Result<String, AppError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(AppError::bad_request("Affiliate code is required"));
    }
    Ok(code.to_string())
}

fn scoped_miss() -> AppError {
    AppError::not_found("Affiliate not found or access denied")
}

#[derive(Clone)]
pub struct AffiliateService {
    affiliates: AffiliateDao,
    clicks: AffiliateClickDao,
    users: UserDao,
}

impl AffiliateService {
    pub fn new(daos: &DaoContext) -> Self {
        Self {
            affiliates: daos.affiliate(),
            clicks: daos.affiliate_click(),
            users: daos.user(),
        }
    }

    pub async fn create(
        &self,
        caller: Caller,
        input: AffiliateInput,
    ) -> Result<affiliate::Model, AppError> {
        let code = normalize_code(&input.code)?;
        validate_commission(input.commission)?;
        let owner = match input.user_id {
            Some(user_id) if caller.is_admin => {
                if self.users.try_find_by_id(user_id).await?.is_none() {
                    return Err(AppError::bad_request("User not found"));
                }
                user_id
            }
            _ => caller.user_id,
        };

        let txn = self.affiliates.db().begin().await?;
        let outcome = async {
            if AffiliateDao::code_taken_in(&txn, &code, None).await? {
                return Err(AppError::bad_request("Affiliate code already exists"));
            }
            let created = AffiliateDao::create_in(
                &txn,
                NewAffiliate {
                    code,
                    description: input.description,
                    commission: input.commission.unwrap_or(0.0),
                    user_id: owner,
                },
            )
            .await?;
            Ok(created)
        }
        .await;
        finish(txn, outcome).await
    }

    pub async fn list(&self, caller: Caller) -> Result<Vec<affiliate::Model>, AppError> {
        Ok(self.affiliates.list_scoped(caller.scope()).await?)
    }

    pub async fn get(&self, caller: Caller, id: Uuid) -> Result<affiliate::Model, AppError> {
        self.affiliates
            .find_scoped(id, caller.scope())
            .await?
            .ok_or_else(|| AppError::not_found("Affiliate not found"))
    }

    pub async fn update(
        &self,
        caller: Caller,
        id: Uuid,
        patch: AffiliatePatch,
    ) -> Result<affiliate::Model, AppError> {
        let existing = self
            .affiliates
            .find_scoped(id, caller.scope())
            .await?
            .ok_or_else(scoped_miss)?;
        validate_commission(patch.commission)?;
        let code = patch.code.as_deref().map(normalize_code).transpose()?;

        let txn = self.affiliates.db().begin().await?;
        let outcome = async {
            if let Some(code) = code.as_deref()
                && AffiliateDao::code_taken_in(&txn, code, Some(id)).await?
            {
                return Err(AppError::bad_request("Affiliate code already exists"));
            }
            let updated = update_model(&txn, existing, |active: &mut affiliate::ActiveModel| {
                if let Some(code) = code {
                    active.code = Set(code);
                }
                if let Some(description) = patch.description {
                    active.description = Set(Some(description));
                }
                if let Some(commission) = patch.commission {
                    active.commission = Set(commission);
                }
            })
            .await?;
            Ok(updated)
        }
        .await;
        finish(txn, outcome).await
    }

    pub async fn remove(&self, caller: Caller, id: Uuid) -> Result<(), AppError> {
        if self.affiliates.find_scoped(id, caller.scope()).await?.is_none() {
            return Err(scoped_miss());
        }
        self.affiliates.delete(id).await?;
        Ok(())
    }

    pub async fn clicks(
        &self,
        caller: Caller,
        id: Uuid,
    ) -> Result<Vec<affiliate_click::Model>, AppError> {
        let affiliate = self.get(caller, id).await?;
        Ok(self.clicks.list_for_affiliate(affiliate.id).await?)
    }

    /// Records one click: replayed tokens and sources over the hourly limit
    /// are rejected, and the counter moves in the same transaction.
    #[tracing::instrument(skip(self, input, source), fields(code = %input.code))]
    pub async fn record_click(
        &self,
        input: ClickInput,
        source: ClickSource<'_>,
    ) -> Result<ClickResult, AppError> {
        let code = normalize_code(&input.code)?;
        let token = input.token.trim();
        if token.is_empty() {
            return Err(AppError::bad_request("Click token is required"));
        }
        if source.user_agent.trim().is_empty() {
            return Err(AppError::bad_request("User agent is required"));
        }

        let since = Utc::now().fixed_offset() - Duration::minutes(CLICK_WINDOW_MINUTES);
        let txn = self.affiliates.db().begin().await?;
        let outcome = async {
            let affiliate = AffiliateDao::find_by_code_in(&txn, &code)
                .await?
                .ok_or_else(|| AppError::not_found("Affiliate not found"))?;
            if AffiliateClickDao::token_used_in(&txn, token).await? {
                return Err(AppError::bad_request("Click token already used"));
            }
            let recent = AffiliateClickDao::count_recent_in(&txn, affiliate.id, &source, since)
                .await?;
            if recent >= CLICK_LIMIT {
                return Err(AppError::too_many_requests(
                    "Too many clicks, please try again later",
                    (CLICK_WINDOW_MINUTES * 60) as u64,
                ));
            }
            AffiliateClickDao::record_in(&txn, affiliate.id, &source, token).await?;
            AffiliateDao::increment_clicks_in(&txn, affiliate.id).await?;
            let updated = AffiliateDao::find_by_id_in(&txn, affiliate.id)
                .await?
                .ok_or_else(|| AppError::not_found("Affiliate not found"))?;
            Ok(ClickResult {
                id: updated.id,
                code: updated.code,
                clicks: updated.clicks,
            })
        }
        .await;
        finish(txn, outcome).await
    }

    async fn scoped_clicks(
        &self,
        caller: Caller,
        filter: &StatsFilter,
    ) -> Result<(Vec<affiliate::Model>, Vec<affiliate_click::Model>), AppError> {
        let range = filter.range(Utc::now().fixed_offset())?;
        let affiliates = self.affiliates.list_scoped(caller.scope()).await?;
        let ids = caller
            .scope()
            .map(|_| affiliates.iter().map(|affiliate| affiliate.id).collect());
        let clicks = self.clicks.in_range(ids, range.start, range.end).await?;
        Ok((affiliates, clicks))
    }

    pub async fn dashboard(
        &self,
        caller: Caller,
        filter: StatsFilter,
    ) -> Result<DashboardStats, AppError> {
        let (affiliates, clicks) = self.scoped_clicks(caller, &filter).await?;
        Ok(stats::dashboard(&affiliates, &clicks))
    }

    pub async fn top(
        &self,
        caller: Caller,
        filter: StatsFilter,
    ) -> Result<Vec<AffiliateClicks>, AppError> {
        let (affiliates, clicks) = self.scoped_clicks(caller, &filter).await?;
        Ok(stats::top_affiliates(&affiliates, &clicks, filter.limit()))
    }

    pub async fn user_stats(
        &self,
        caller: Caller,
        filter: StatsFilter,
    ) -> Result<Vec<UserClicks>, AppError> {
        let (affiliates, clicks) = self.scoped_clicks(caller, &filter).await?;
        let mut user_ids: Vec<Uuid> = affiliates.iter().map(|a| a.user_id).collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        let users = self.users.find_many(user_ids).await?;
        Ok(stats::user_totals(&affiliates, &users, &clicks, filter.limit()))
    }

    /// Monthly and quarterly buckets for the current year.
    pub async fn time_stats(
        &self,
        caller: Caller,
        affiliate_id: Option<Uuid>,
    ) -> Result<TimeStats, AppError> {
        let range = stats::year_range(Utc::now().year())?;
        let ids = match affiliate_id {
            Some(id) => Some(vec![self.get(caller, id).await?.id]),
            None => match caller.scope() {
                Some(owner) => Some(
                    self.affiliates
                        .list_scoped(Some(owner))
                        .await?
                        .into_iter()
                        .map(|affiliate| affiliate.id)
                        .collect(),
                ),
                None => None,
            },
        };
        let clicks = self.clicks.in_range(ids, range.start, range.end).await?;
        Ok(stats::time_stats(&clicks))
    }
}
