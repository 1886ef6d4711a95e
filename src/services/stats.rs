use std::collections::HashMap;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::entities::{affiliate, affiliate_click, user},
    error::AppError,
};

const DEFAULT_LIMIT: u64 = 10;
const MIN_YEAR: i32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Month,
    Quarter,
    Year,
}

/// Query parameters shared by the stats endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsFilter {
    pub period_type: Option<PeriodType>,
    pub month: Option<u32>,
    pub quarter: Option<u32>,
    pub year: Option<i32>,
    pub limit: Option<u64>,
}

/// Half-open `[start, end)` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodRange {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl StatsFilter {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.month.is_some_and(|month| !(1..=12).contains(&month)) {
            return Err(AppError::bad_request("Month must be between 1 and 12"));
        }
        if self.quarter.is_some_and(|quarter| !(1..=4).contains(&quarter)) {
            return Err(AppError::bad_request("Quarter must be between 1 and 4"));
        }
        if self.year.is_some_and(|year| year < MIN_YEAR) {
            return Err(AppError::bad_request("Year must be 2000 or later"));
        }
        if self.limit == Some(0) {
            return Err(AppError::bad_request("Limit must be at least 1"));
        }
        Ok(())
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT) as usize
    }

    /// Missing parts default to the period containing `now`; without a
    /// period type the month is used.
    pub fn range(&self, now: DateTime<FixedOffset>) -> Result<PeriodRange, AppError> {
        self.validate()?;
        let year = self.year.unwrap_or_else(|| now.year());
        let (first_month, months) = match self.period_type.unwrap_or(PeriodType::Month) {
            PeriodType::Month => (self.month.unwrap_or_else(|| now.month()), 1),
            PeriodType::Quarter => {
                let quarter = self.quarter.unwrap_or_else(|| quarter_of(now.month()));
                (quarter * 3 - 2, 3)
            }
            PeriodType::Year => (1, 12),
        };
        let start = month_start(year, first_month)?;
        let end_month = first_month + months;
        let end = if end_month > 12 {
            month_start(year + 1, end_month - 12)?
        } else {
            month_start(year, end_month)?
        };
        Ok(PeriodRange { start, end })
    }
}

pub fn year_range(year: i32) -> Result<PeriodRange, AppError> {
    Ok(PeriodRange {
        start: month_start(year, 1)?,
        end: month_start(year + 1, 1)?,
    })
}

fn quarter_of(month: u32) -> u32 {
    (month - 1) / 3 + 1
}

fn month_start(year: i32, month: u32) -> Result<DateTime<FixedOffset>, AppError> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
        .ok_or_else(|| AppError::bad_request("Invalid stats period"))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffiliateClicks {
    pub affiliate_id: Uuid,
    pub code: String,
    pub user_id: Uuid,
    pub clicks: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_affiliates: u64,
    pub total_clicks: i64,
    pub clicks_in_period: u64,
    pub top_affiliate: Option<AffiliateClicks>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthClicks {
    pub month: u32,
    pub clicks: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterClicks {
    pub quarter: u32,
    pub clicks: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeStats {
    pub monthly: Vec<MonthClicks>,
    pub quarterly: Vec<QuarterClicks>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserClicks {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub clicks: u64,
}

fn clicks_per_affiliate(clicks: &[affiliate_click::Model]) -> HashMap<Uuid, u64> {
    let mut counts = HashMap::new();
    for click in clicks {
        *counts.entry(click.affiliate_id).or_insert(0) += 1;
    }
    counts
}

/// Affiliates ranked by clicks in the window; ties keep code order.
pub fn top_affiliates(
    affiliates: &[affiliate::Model],
    clicks: &[affiliate_click::Model],
    limit: usize,
) -> Vec<AffiliateClicks> {
    let counts = clicks_per_affiliate(clicks);
    let mut ranked: Vec<AffiliateClicks> = affiliates
        .iter()
        .filter_map(|affiliate| {
            let clicks = counts.get(&affiliate.id).copied()?;
            Some(AffiliateClicks {
                affiliate_id: affiliate.id,
                code: affiliate.code.clone(),
                user_id: affiliate.user_id,
                clicks,
            })
        })
        .collect();
    ranked.sort_by(|a, b| b.clicks.cmp(&a.clicks).then_with(|| a.code.cmp(&b.code)));
    ranked.truncate(limit);
    ranked
}

pub fn dashboard(
    affiliates: &[affiliate::Model],
    period_clicks: &[affiliate_click::Model],
) -> DashboardStats {
    DashboardStats {
        total_affiliates: affiliates.len() as u64,
        total_clicks: affiliates.iter().map(|a| i64::from(a.clicks)).sum(),
        clicks_in_period: period_clicks.len() as u64,
        top_affiliate: top_affiliates(affiliates, period_clicks, 1).into_iter().next(),
    }
}

/// Twelve monthly and four quarterly buckets for clicks of a single year.
pub fn time_stats(clicks: &[affiliate_click::Model]) -> TimeStats {
    let mut monthly = [0u64; 12];
    for click in clicks {
        monthly[click.created_at.month0() as usize] += 1;
    }
    TimeStats {
        monthly: (1..=12)
            .map(|month| MonthClicks {
                month,
                clicks: monthly[month as usize - 1],
            })
            .collect(),
        quarterly: (1..=4)
            .map(|quarter| {
                let start = (quarter as usize - 1) * 3;
                QuarterClicks {
                    quarter,
                    clicks: monthly[start..start + 3].iter().sum(),
                }
            })
            .collect(),
    }
}

pub fn user_totals(
    affiliates: &[affiliate::Model],
    users: &[user::Model],
    clicks: &[affiliate_click::Model],
    limit: usize,
) -> Vec<UserClicks> {
    let counts = clicks_per_affiliate(clicks);
    let mut per_user: HashMap<Uuid, u64> = HashMap::new();
    for affiliate in affiliates {
        if let Some(count) = counts.get(&affiliate.id) {
            *per_user.entry(affiliate.user_id).or_insert(0) += count;
        }
    }

    let mut totals: Vec<UserClicks> = users
        .iter()
        .filter_map(|user| {
            let clicks = per_user.get(&user.id).copied()?;
            Some(UserClicks {
                user_id: user.id,
                name: user.name.clone(),
                email: user.email.clone(),
                clicks,
            })
        })
        .collect();
    totals.sort_by(|a, b| b.clicks.cmp(&a.clicks).then_with(|| a.email.cmp(&b.email)));
    totals.truncate(limit);
    totals
}
