//! SOQL template library.
//!
//! Every template is a pure function of its arguments. Listing templates take
//! a [`Limit`], so a caller can only reach them with a value already clamped
//! into `1..=100`.

pub mod donor;
pub mod literal;
pub mod opportunity;
pub mod questions;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

pub use questions::Period;

/// Row cap for listing queries, always within `MIN..=MAX`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Limit(u32);

impl Limit {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 100;
    pub const DEFAULT: Limit = Limit(25);

    /// Clamps any requested value into range.
    pub fn clamp(requested: i64) -> Self {
        let bounded = requested.clamp(i64::from(Self::MIN), i64::from(Self::MAX));
        Self(u32::try_from(bounded).unwrap_or(Self::MAX))
    }

    /// Accepts only values already in range.
    pub fn new(value: u32) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateName {
    LapsedDonors,
    MajorDonorsOver,
    RecentDonors,
    FirstTimeDonors,
    RecurringDonors,
    UpgradeCandidates,
    AtRiskDonors,
    MidLevelDonors,
    HighValueEngagedDonors,
    WarmProspects,
    OpportunitiesByStage,
    OpenPipeline,
    RecentlyWonOpportunities,
    MonthlyRevenue,
    QuarterlyPerformance,
    YearOverYearComparison,
    LargeGifts,
    GiftDistribution,
    ConversionMetrics,
    AverageDaysToClose,
    RecentlyLostOpportunities,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown template `{0}`")]
pub struct UnknownTemplate(pub String);

impl TemplateName {
    pub const ALL: [TemplateName; 21] = [
        Self::LapsedDonors,
        Self::MajorDonorsOver,
        Self::RecentDonors,
        Self::FirstTimeDonors,
        Self::RecurringDonors,
        Self::UpgradeCandidates,
        Self::AtRiskDonors,
        Self::MidLevelDonors,
        Self::HighValueEngagedDonors,
        Self::WarmProspects,
        Self::OpportunitiesByStage,
        Self::OpenPipeline,
        Self::RecentlyWonOpportunities,
        Self::MonthlyRevenue,
        Self::QuarterlyPerformance,
        Self::YearOverYearComparison,
        Self::LargeGifts,
        Self::GiftDistribution,
        Self::ConversionMetrics,
        Self::AverageDaysToClose,
        Self::RecentlyLostOpportunities,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LapsedDonors => "lapsed_donors",
            Self::MajorDonorsOver => "major_donors_over",
            Self::RecentDonors => "recent_donors",
            Self::FirstTimeDonors => "first_time_donors",
            Self::RecurringDonors => "recurring_donors",
            Self::UpgradeCandidates => "upgrade_candidates",
            Self::AtRiskDonors => "at_risk_donors",
            Self::MidLevelDonors => "mid_level_donors",
            Self::HighValueEngagedDonors => "high_value_engaged_donors",
            Self::WarmProspects => "warm_prospects",
            Self::OpportunitiesByStage => "opportunities_by_stage",
            Self::OpenPipeline => "open_pipeline",
            Self::RecentlyWonOpportunities => "recently_won_opportunities",
            Self::MonthlyRevenue => "monthly_revenue",
            Self::QuarterlyPerformance => "quarterly_performance",
            Self::YearOverYearComparison => "year_over_year_comparison",
            Self::LargeGifts => "large_gifts",
            Self::GiftDistribution => "gift_distribution",
            Self::ConversionMetrics => "conversion_metrics",
            Self::AverageDaysToClose => "average_days_to_close",
            Self::RecentlyLostOpportunities => "recently_lost_opportunities",
        }
    }

    pub fn is_donor_segment(self) -> bool {
        Self::ALL[..10].contains(&self)
    }

    /// Listing templates end in `LIMIT n`; aggregations have no row cap.
    pub fn is_listing(self) -> bool {
        !matches!(
            self,
            Self::OpportunitiesByStage
                | Self::MonthlyRevenue
                | Self::QuarterlyPerformance
                | Self::YearOverYearComparison
                | Self::GiftDistribution
                | Self::ConversionMetrics
                | Self::AverageDaysToClose
        )
    }

    pub fn donor_segments() -> impl Iterator<Item = TemplateName> {
        Self::ALL.into_iter().filter(|name| name.is_donor_segment())
    }

    pub fn analytics() -> impl Iterator<Item = TemplateName> {
        Self::ALL.into_iter().filter(|name| !name.is_donor_segment())
    }
}

impl fmt::Display for TemplateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateName {
    type Err = UnknownTemplate;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == wanted)
            .ok_or_else(|| UnknownTemplate(value.to_string()))
    }
}

/// Optional knobs for [`render`]. Anything left unset takes the template's
/// documented default.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TemplateParams {
    pub months: Option<u32>,
    pub days: Option<u32>,
    pub years: Option<u32>,
    pub amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub min_gifts: Option<u32>,
    pub current_year: Option<i32>,
}

/// Renders any template by name. `current_year` falls back to the UTC clock
/// only for `quarterly_performance`.
pub fn render(name: TemplateName, params: &TemplateParams, limit: Limit) -> String {
    use donor::*;
    use opportunity::*;

    match name {
        TemplateName::LapsedDonors => {
            lapsed_donors(params.months.unwrap_or(DEFAULT_LAPSED_MONTHS), limit)
        }
        TemplateName::MajorDonorsOver => {
            major_donors_over(params.amount.unwrap_or(DEFAULT_MAJOR_AMOUNT), limit)
        }
        TemplateName::RecentDonors => {
            recent_donors(params.months.unwrap_or(DEFAULT_RECENT_MONTHS), limit)
        }
        TemplateName::FirstTimeDonors => first_time_donors(limit),
        TemplateName::RecurringDonors => {
            recurring_donors(params.min_gifts.unwrap_or(DEFAULT_RECURRING_MIN_GIFTS), limit)
        }
        TemplateName::UpgradeCandidates => upgrade_candidates(
            params.amount.unwrap_or(DEFAULT_UPGRADE_MIN_AMOUNT),
            params.min_gifts.unwrap_or(DEFAULT_UPGRADE_MIN_GIFTS),
            limit,
        ),
        TemplateName::AtRiskDonors => at_risk_donors(
            DEFAULT_AT_RISK_HISTORICAL_MONTHS,
            params.months.unwrap_or(DEFAULT_AT_RISK_RECENT_MONTHS),
            params.min_gifts.unwrap_or(DEFAULT_AT_RISK_MIN_GIFTS),
            limit,
        ),
        TemplateName::MidLevelDonors => mid_level_donors(
            params.amount.unwrap_or(DEFAULT_MID_LEVEL_MIN),
            params.max_amount.unwrap_or(DEFAULT_MID_LEVEL_MAX),
            limit,
        ),
        TemplateName::HighValueEngagedDonors => high_value_engaged_donors(
            params.months.unwrap_or(DEFAULT_ENGAGED_RECENT_MONTHS),
            params.min_gifts.unwrap_or(DEFAULT_ENGAGED_MIN_GIFTS),
            params.amount.unwrap_or(DEFAULT_ENGAGED_MIN_AMOUNT),
            limit,
        ),
        TemplateName::WarmProspects => warm_prospects(limit),
        TemplateName::OpportunitiesByStage => opportunities_by_stage(),
        TemplateName::OpenPipeline => open_pipeline(limit),
        TemplateName::RecentlyWonOpportunities => {
            recently_won_opportunities(params.days.unwrap_or(DEFAULT_RECENT_DAYS), limit)
        }
        TemplateName::MonthlyRevenue => {
            monthly_revenue(params.months.unwrap_or(DEFAULT_TREND_MONTHS))
        }
        TemplateName::QuarterlyPerformance => {
            let current_year = params.current_year.unwrap_or_else(|| {
                use chrono::Datelike;
                chrono::Utc::now().year()
            });
            quarterly_performance(params.years.unwrap_or(DEFAULT_QUARTERLY_YEARS), current_year)
        }
        TemplateName::YearOverYearComparison => year_over_year_comparison(),
        TemplateName::LargeGifts => {
            large_gifts(params.amount.unwrap_or(DEFAULT_LARGE_GIFT), limit)
        }
        TemplateName::GiftDistribution => gift_distribution(),
        TemplateName::ConversionMetrics => {
            conversion_metrics(params.days.unwrap_or(DEFAULT_CONVERSION_DAYS))
        }
        TemplateName::AverageDaysToClose => {
            average_days_to_close(params.months.unwrap_or(DEFAULT_CLOSE_VELOCITY_MONTHS))
        }
        TemplateName::RecentlyLostOpportunities => {
            recently_lost_opportunities(params.days.unwrap_or(DEFAULT_RECENT_DAYS), limit)
        }
    }
}
