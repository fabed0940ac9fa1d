//! Donor segmentation queries over the NPSP Contact/Opportunity model.

use super::literal::{amount, days_for_months};
use super::Limit;

pub const DEFAULT_LAPSED_MONTHS: u32 = 12;
pub const DEFAULT_RECENT_MONTHS: u32 = 6;
pub const DEFAULT_MAJOR_AMOUNT: f64 = 1_000.0;
pub const DEFAULT_RECURRING_MIN_GIFTS: u32 = 3;
pub const DEFAULT_UPGRADE_MIN_AMOUNT: f64 = 1_000.0;
pub const DEFAULT_UPGRADE_MIN_GIFTS: u32 = 3;
pub const DEFAULT_AT_RISK_HISTORICAL_MONTHS: u32 = 24;
pub const DEFAULT_AT_RISK_RECENT_MONTHS: u32 = 6;
pub const DEFAULT_AT_RISK_MIN_GIFTS: u32 = 2;
pub const DEFAULT_MID_LEVEL_MIN: f64 = 500.0;
pub const DEFAULT_MID_LEVEL_MAX: f64 = 5_000.0;
pub const DEFAULT_ENGAGED_RECENT_MONTHS: u32 = 12;
pub const DEFAULT_ENGAGED_MIN_GIFTS: u32 = 3;
pub const DEFAULT_ENGAGED_MIN_AMOUNT: f64 = 5_000.0;

/// Gave at some point, but not within the last `months`.
pub fn lapsed_donors(months: u32, limit: Limit) -> String {
    let days = days_for_months(months);
    format!(
        "SELECT Id, Name, Email,
    (SELECT SUM(Amount) total FROM Opportunities WHERE IsWon=true) LifetimeGiving,
    (SELECT MAX(CloseDate) lastGiftDate FROM Opportunities WHERE IsWon=true) LastGiftDate
    FROM Contact
    WHERE Id IN (SELECT ContactId FROM OpportunityContactRole WHERE Opportunity.IsWon=true)
    AND Id NOT IN (SELECT ContactId FROM OpportunityContactRole WHERE Opportunity.IsWon=true AND Opportunity.CloseDate = LAST_N_DAYS:{days})
    LIMIT {limit}"
    )
}

/// Lifetime won amount strictly above `threshold`.
pub fn major_donors_over(threshold: f64, limit: Limit) -> String {
    let threshold = amount(threshold);
    format!(
        "SELECT Id, Name, Email, Phone, MailingAddress,
    (SELECT SUM(Amount) total FROM Opportunities WHERE IsWon=true) LifetimeGiving,
    (SELECT MAX(CloseDate) lastGiftDate FROM Opportunities WHERE IsWon=true) LastGiftDate,
    (SELECT COUNT() FROM Opportunities WHERE IsWon=true) TotalGifts
    FROM Contact
    WHERE Id IN (SELECT ContactId FROM OpportunityContactRole WHERE Opportunity.IsWon=true)
    AND Id IN (SELECT ContactId FROM OpportunityContactRole WHERE Opportunity.IsWon=true GROUP BY ContactId HAVING SUM(Opportunity.Amount) > {threshold})
    ORDER BY LifetimeGiving DESC
    LIMIT {limit}"
    )
}

/// At least one won gift inside the last `months`. The window is never
/// shorter than one day.
pub fn recent_donors(months: u32, limit: Limit) -> String {
    let days = days_for_months(months).max(1);
    format!(
        "SELECT Id, Name, Email, Phone,
    (SELECT MAX(CloseDate) lastGiftDate FROM Opportunities WHERE IsWon=true AND CloseDate = LAST_N_DAYS:{days}) LastGiftDate,
    (SELECT SUM(Amount) recentTotal FROM Opportunities WHERE IsWon=true AND CloseDate = LAST_N_DAYS:{days}) RecentTotal,
    (SELECT COUNT() FROM Opportunities WHERE IsWon=true AND CloseDate = LAST_N_DAYS:{days}) RecentGiftCount
    FROM Contact
    WHERE Id IN (SELECT ContactId FROM OpportunityContactRole WHERE Opportunity.IsWon=true AND Opportunity.CloseDate = LAST_N_DAYS:{days})
    ORDER BY RecentTotal DESC
    LIMIT {limit}"
    )
}

/// Exactly one won gift.
pub fn first_time_donors(limit: Limit) -> String {
    format!(
        "SELECT Id, Name, Email, Phone,
    (SELECT Amount, CloseDate FROM Opportunities WHERE IsWon=true LIMIT 1) FirstGift
    FROM Contact
    WHERE Id IN (SELECT ContactId FROM OpportunityContactRole WHERE Opportunity.IsWon=true GROUP BY ContactId HAVING COUNT(Opportunity.Id) = 1)
    ORDER BY FirstGift DESC NULLS LAST
    LIMIT {limit}"
    )
}

/// At least `min_gifts` won gifts. Gift count stands in for consecutive
/// periods since NPSP has no portable recurrence marker on Contact.
pub fn recurring_donors(min_gifts: u32, limit: Limit) -> String {
    format!(
        "SELECT Id, Name, Email,
    (SELECT COUNT() FROM Opportunities WHERE IsWon=true) TotalGifts,
    (SELECT SUM(Amount) FROM Opportunities WHERE IsWon=true) LifetimeGiving,
    (SELECT MAX(CloseDate) FROM Opportunities WHERE IsWon=true) LastGiftDate,
    (SELECT MIN(CloseDate) FROM Opportunities WHERE IsWon=true) FirstGiftDate
    FROM Contact
    WHERE Id IN (SELECT ContactId FROM OpportunityContactRole WHERE Opportunity.IsWon=true GROUP BY ContactId HAVING COUNT(Opportunity.Id) >= {min_gifts})
    ORDER BY TotalGifts DESC
    LIMIT {limit}"
    )
}

pub fn upgrade_candidates(min_lifetime: f64, min_gifts: u32, limit: Limit) -> String {
    let min_lifetime = amount(min_lifetime);
    format!(
        "SELECT Id, Name, Email, Phone,
    (SELECT SUM(Amount) total FROM Opportunities WHERE IsWon=true) LifetimeGiving,
    (SELECT COUNT() FROM Opportunities WHERE IsWon=true) TotalGifts,
    (SELECT AVG(Amount) FROM Opportunities WHERE IsWon=true) AverageGift,
    (SELECT MAX(Amount) FROM Opportunities WHERE IsWon=true) LargestGift,
    (SELECT MAX(CloseDate) FROM Opportunities WHERE IsWon=true) LastGiftDate
    FROM Contact
    WHERE Id IN (
      SELECT ContactId FROM OpportunityContactRole
      WHERE Opportunity.IsWon=true
      GROUP BY ContactId
      HAVING SUM(Opportunity.Amount) > {min_lifetime}
      AND COUNT(Opportunity.Id) >= {min_gifts}
    )
    ORDER BY LifetimeGiving DESC
    LIMIT {limit}"
    )
}

/// Met `min_gifts` inside the historical window but nothing inside the
/// recent one.
pub fn at_risk_donors(
    historical_months: u32,
    recent_months: u32,
    min_gifts: u32,
    limit: Limit,
) -> String {
    let historical_days = days_for_months(historical_months);
    let recent_days = days_for_months(recent_months);
    format!(
        "SELECT Id, Name, Email, Phone,
    (SELECT COUNT() FROM Opportunities WHERE IsWon=true AND CloseDate = LAST_N_DAYS:{historical_days}) HistoricalGifts,
    (SELECT SUM(Amount) FROM Opportunities WHERE IsWon=true) LifetimeGiving,
    (SELECT MAX(CloseDate) FROM Opportunities WHERE IsWon=true) LastGiftDate
    FROM Contact
    WHERE Id IN (
      SELECT ContactId FROM OpportunityContactRole
      WHERE Opportunity.IsWon=true
      AND Opportunity.CloseDate = LAST_N_DAYS:{historical_days}
      GROUP BY ContactId
      HAVING COUNT(Opportunity.Id) >= {min_gifts}
    )
    AND Id NOT IN (
      SELECT ContactId FROM OpportunityContactRole
      WHERE Opportunity.IsWon=true
      AND Opportunity.CloseDate = LAST_N_DAYS:{recent_days}
    )
    ORDER BY LifetimeGiving DESC
    LIMIT {limit}"
    )
}

/// Lifetime won amount inside the closed range `[min, max]`.
pub fn mid_level_donors(min: f64, max: f64, limit: Limit) -> String {
    let (min, max) = (amount(min), amount(max));
    format!(
        "SELECT Id, Name, Email, Phone,
    (SELECT SUM(Amount) total FROM Opportunities WHERE IsWon=true) LifetimeGiving,
    (SELECT AVG(Amount) FROM Opportunities WHERE IsWon=true) AverageGift,
    (SELECT MAX(CloseDate) FROM Opportunities WHERE IsWon=true) LastGiftDate,
    (SELECT COUNT() FROM Opportunities WHERE IsWon=true) TotalGifts
    FROM Contact
    WHERE Id IN (
      SELECT ContactId FROM OpportunityContactRole
      WHERE Opportunity.IsWon=true
      GROUP BY ContactId
      HAVING SUM(Opportunity.Amount) >= {min}
      AND SUM(Opportunity.Amount) <= {max}
    )
    ORDER BY LifetimeGiving DESC
    LIMIT {limit}"
    )
}

/// Top RFM cell: enough gifts, enough lifetime value, and a gift inside the
/// recent window.
pub fn high_value_engaged_donors(
    recent_months: u32,
    min_gifts: u32,
    min_lifetime: f64,
    limit: Limit,
) -> String {
    let days = days_for_months(recent_months);
    let min_lifetime = amount(min_lifetime);
    format!(
        "SELECT Id, Name, Email, Phone,
    (SELECT SUM(Amount) total FROM Opportunities WHERE IsWon=true) LifetimeGiving,
    (SELECT COUNT() FROM Opportunities WHERE IsWon=true) TotalGifts,
    (SELECT MAX(CloseDate) FROM Opportunities WHERE IsWon=true) LastGiftDate,
    (SELECT AVG(Amount) FROM Opportunities WHERE IsWon=true) AverageGift
    FROM Contact
    WHERE Id IN (
      SELECT ContactId FROM OpportunityContactRole
      WHERE Opportunity.IsWon=true
      GROUP BY ContactId
      HAVING COUNT(Opportunity.Id) >= {min_gifts}
      AND SUM(Opportunity.Amount) >= {min_lifetime}
    )
    AND Id IN (
      SELECT ContactId FROM OpportunityContactRole
      WHERE Opportunity.IsWon=true
      AND Opportunity.CloseDate = LAST_N_DAYS:{days}
    )
    ORDER BY LifetimeGiving DESC
    LIMIT {limit}"
    )
}

/// No won gifts, but completed tasks or events on record.
pub fn warm_prospects(limit: Limit) -> String {
    format!(
        "SELECT Id, Name, Email, Phone,
    (SELECT COUNT() FROM Tasks WHERE Status = 'Completed') CompletedTasks,
    (SELECT COUNT() FROM Events) TotalEvents,
    CreatedDate
    FROM Contact
    WHERE Id NOT IN (
      SELECT ContactId FROM OpportunityContactRole WHERE Opportunity.IsWon=true
    )
    AND (
      Id IN (SELECT WhoId FROM Task WHERE Status = 'Completed')
      OR Id IN (SELECT WhoId FROM Event)
    )
    ORDER BY CreatedDate DESC
    LIMIT {limit}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(value: i64) -> Limit {
        Limit::clamp(value)
    }

    #[test]
    fn lapsed_window_is_months_times_thirty() {
        let soql = lapsed_donors(12, Limit::default());

        assert!(soql.contains("LAST_N_DAYS:360"));
        assert!(soql.contains("Id NOT IN"));
        assert!(soql.ends_with("LIMIT 25"));
    }

    #[test]
    fn major_threshold_is_floored_into_having_clause() {
        let soql = major_donors_over(10_000.75, limit(10));

        assert!(soql.contains("HAVING SUM(Opportunity.Amount) > 10000)"));
        assert!(soql.ends_with("LIMIT 10"));
    }

    #[test]
    fn recent_window_never_drops_below_one_day() {
        let soql = recent_donors(0, Limit::default());

        assert!(soql.contains("LAST_N_DAYS:1)"));
        assert!(!soql.contains("LAST_N_DAYS:0"));
    }

    #[test]
    fn at_risk_uses_both_windows() {
        let soql = at_risk_donors(24, 6, 2, Limit::default());

        assert!(soql.contains("LAST_N_DAYS:720"));
        assert!(soql.contains("LAST_N_DAYS:180"));
        assert!(soql.contains("HAVING COUNT(Opportunity.Id) >= 2"));
    }

    #[test]
    fn mid_level_range_is_inclusive() {
        let soql = mid_level_donors(500.0, 5_000.0, Limit::default());

        assert!(soql.contains("SUM(Opportunity.Amount) >= 500"));
        assert!(soql.contains("SUM(Opportunity.Amount) <= 5000"));
    }

    #[test]
    fn engaged_donors_intersect_value_and_recency() {
        let soql = high_value_engaged_donors(12, 3, 5_000.0, Limit::default());

        assert!(soql.contains("COUNT(Opportunity.Id) >= 3"));
        assert!(soql.contains("SUM(Opportunity.Amount) >= 5000"));
        assert!(soql.contains("LAST_N_DAYS:360"));
    }

    #[test]
    fn warm_prospects_exclude_donors() {
        let soql = warm_prospects(limit(50));

        assert!(soql.contains("WHERE Id NOT IN"));
        assert!(soql.contains("FROM Task WHERE Status = 'Completed'"));
        assert!(soql.ends_with("LIMIT 50"));
    }
}
