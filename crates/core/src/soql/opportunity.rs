//! Opportunity analytics: pipeline, revenue trends, gift sizes, velocity.
//!
//! Aggregations return one row per group and carry no `LIMIT`; listings
//! always end with the caller's limit.

use super::literal::{amount, days_for_months};
use super::Limit;

pub const DEFAULT_RECENT_DAYS: u32 = 30;
pub const DEFAULT_TREND_MONTHS: u32 = 12;
pub const DEFAULT_QUARTERLY_YEARS: u32 = 2;
pub const DEFAULT_LARGE_GIFT: f64 = 10_000.0;
pub const DEFAULT_CONVERSION_DAYS: u32 = 90;
pub const DEFAULT_CLOSE_VELOCITY_MONTHS: u32 = 6;

const GIFT_RANGE_CASE: &str = "CASE
        WHEN Amount < 100 THEN 'Under $100'
        WHEN Amount >= 100 AND Amount < 500 THEN '$100-$499'
        WHEN Amount >= 500 AND Amount < 1000 THEN '$500-$999'
        WHEN Amount >= 1000 AND Amount < 5000 THEN '$1,000-$4,999'
        WHEN Amount >= 5000 AND Amount < 10000 THEN '$5,000-$9,999'
        WHEN Amount >= 10000 THEN '$10,000+'
        ELSE 'Unknown'
      END";

pub fn opportunities_by_stage() -> String {
    "SELECT StageName, COUNT(Id) OpportunityCount, SUM(Amount) TotalAmount
    FROM Opportunity
    GROUP BY StageName
    ORDER BY TotalAmount DESC NULLS LAST"
        .to_string()
}

pub fn open_pipeline(limit: Limit) -> String {
    format!(
        "SELECT Id, Name, Amount, StageName, CloseDate, ContactId,
    (SELECT Contact.Name, Contact.Email FROM OpportunityContactRoles LIMIT 1)
    FROM Opportunity
    WHERE IsClosed = false
    ORDER BY Amount DESC NULLS LAST, CloseDate ASC
    LIMIT {limit}"
    )
}

pub fn recently_won_opportunities(days: u32, limit: Limit) -> String {
    format!(
        "SELECT Id, Name, Amount, CloseDate,
    (SELECT Contact.Name, Contact.Email FROM OpportunityContactRoles LIMIT 1)
    FROM Opportunity
    WHERE IsWon = true
    AND CloseDate = LAST_N_DAYS:{days}
    ORDER BY CloseDate DESC, Amount DESC
    LIMIT {limit}"
    )
}

pub fn monthly_revenue(months: u32) -> String {
    let days = days_for_months(months);
    format!(
        "SELECT CALENDAR_YEAR(CloseDate) Year, CALENDAR_MONTH(CloseDate) Month,
    COUNT(Id) GiftCount, SUM(Amount) TotalRevenue, AVG(Amount) AverageGift
    FROM Opportunity
    WHERE IsWon = true
    AND CloseDate = LAST_N_DAYS:{days}
    GROUP BY CALENDAR_YEAR(CloseDate), CALENDAR_MONTH(CloseDate)
    ORDER BY CALENDAR_YEAR(CloseDate) DESC, CALENDAR_MONTH(CloseDate) DESC"
    )
}

/// Quarters from `current_year - years` onward. The year is passed in so the
/// rendered text depends only on the arguments.
pub fn quarterly_performance(years: u32, current_year: i32) -> String {
    let since = i64::from(current_year) - i64::from(years);
    format!(
        "SELECT CALENDAR_YEAR(CloseDate) Year, CALENDAR_QUARTER(CloseDate) Quarter,
    COUNT(Id) GiftCount, SUM(Amount) TotalRevenue, AVG(Amount) AverageGift
    FROM Opportunity
    WHERE IsWon = true
    AND CALENDAR_YEAR(CloseDate) >= {since}
    GROUP BY CALENDAR_YEAR(CloseDate), CALENDAR_QUARTER(CloseDate)
    ORDER BY CALENDAR_YEAR(CloseDate) DESC, CALENDAR_QUARTER(CloseDate) DESC"
    )
}

pub fn year_over_year_comparison() -> String {
    "SELECT CALENDAR_YEAR(CloseDate) Year,
    COUNT(Id) GiftCount,
    SUM(Amount) TotalRevenue,
    AVG(Amount) AverageGift,
    MIN(Amount) SmallestGift,
    MAX(Amount) LargestGift
    FROM Opportunity
    WHERE IsWon = true
    AND (CALENDAR_YEAR(CloseDate) = THIS_YEAR OR CALENDAR_YEAR(CloseDate) = LAST_YEAR)
    GROUP BY CALENDAR_YEAR(CloseDate)
    ORDER BY CALENDAR_YEAR(CloseDate) DESC"
        .to_string()
}

pub fn large_gifts(min_amount: f64, limit: Limit) -> String {
    let min_amount = amount(min_amount);
    format!(
        "SELECT Id, Name, Amount, CloseDate, StageName,
    (SELECT Contact.Name, Contact.Email, Contact.Phone FROM OpportunityContactRoles ORDER BY IsPrimary DESC LIMIT 1)
    FROM Opportunity
    WHERE Amount >= {min_amount}
    AND IsWon = true
    ORDER BY Amount DESC, CloseDate DESC
    LIMIT {limit}"
    )
}

pub fn gift_distribution() -> String {
    format!(
        "SELECT
    {GIFT_RANGE_CASE} GiftRange,
    COUNT(Id) GiftCount,
    SUM(Amount) TotalRevenue
    FROM Opportunity
    WHERE IsWon = true
    GROUP BY
      {GIFT_RANGE_CASE}
    ORDER BY SUM(Amount) DESC NULLS LAST"
    )
}

pub fn conversion_metrics(days: u32) -> String {
    format!(
        "SELECT StageName,
    COUNT(Id) OpportunityCount,
    SUM(Amount) TotalAmount,
    COUNT(CASE WHEN IsWon = true THEN 1 END) WonCount,
    COUNT(CASE WHEN IsLost = true THEN 1 END) LostCount
    FROM Opportunity
    WHERE CreatedDate = LAST_N_DAYS:{days}
    GROUP BY StageName
    ORDER BY TotalAmount DESC NULLS LAST"
    )
}

/// Reads the `DAYS_TO_CLOSE__c` formula field that NPSP orgs commonly add.
pub fn average_days_to_close(months: u32) -> String {
    let days = days_for_months(months);
    format!(
        "SELECT
    AVG(DAYS_TO_CLOSE__c) AvgDaysToClose,
    MIN(DAYS_TO_CLOSE__c) MinDaysToClose,
    MAX(DAYS_TO_CLOSE__c) MaxDaysToClose
    FROM Opportunity
    WHERE IsWon = true
    AND CloseDate = LAST_N_DAYS:{days}"
    )
}

pub fn recently_lost_opportunities(days: u32, limit: Limit) -> String {
    format!(
        "SELECT Id, Name, Amount, CloseDate, StageName, Loss_Reason__c,
    (SELECT Contact.Name, Contact.Email FROM OpportunityContactRoles LIMIT 1)
    FROM Opportunity
    WHERE IsLost = true
    AND CloseDate = LAST_N_DAYS:{days}
    ORDER BY Amount DESC, CloseDate DESC
    LIMIT {limit}"
    )
}
