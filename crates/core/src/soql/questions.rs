//! Single-purpose queries behind the question classifier.

use serde::Serialize;

use super::literal::days_for_months;
use super::Limit;

/// Salesforce relative date literal for "this ..." questions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Month,
    Quarter,
    Year,
}

impl Period {
    pub fn this_literal(self) -> &'static str {
        match self {
            Self::Month => "THIS_MONTH",
            Self::Quarter => "THIS_QUARTER",
            Self::Year => "THIS_YEAR",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }
}

pub fn donation_count(period: Period) -> String {
    format!(
        "SELECT COUNT() FROM Opportunity WHERE IsWon = true AND CloseDate = {}",
        period.this_literal()
    )
}

pub fn total_revenue(period: Period) -> String {
    format!(
        "SELECT SUM(Amount) TotalRevenue FROM Opportunity WHERE IsWon = true AND CloseDate = {}",
        period.this_literal()
    )
}

pub fn top_donors(period: Period, top: Limit) -> String {
    format!(
        "SELECT ContactId, SUM(Opportunity.Amount) total \
         FROM OpportunityContactRole \
         WHERE Opportunity.IsWon = true AND Opportunity.CloseDate = {} \
         GROUP BY ContactId ORDER BY SUM(Opportunity.Amount) DESC \
         LIMIT {top}",
        period.this_literal()
    )
}

pub fn gave_last_year_not_this_year(limit: Limit) -> String {
    format!(
        "SELECT Id, Name, Email FROM Contact WHERE Id IN (\
         SELECT ContactId FROM OpportunityContactRole WHERE Opportunity.IsWon=true AND Opportunity.CloseDate = LAST_YEAR) \
         AND Id NOT IN (SELECT ContactId FROM OpportunityContactRole WHERE Opportunity.IsWon=true AND Opportunity.CloseDate = THIS_YEAR) \
         LIMIT {limit}"
    )
}

pub fn average_gift(period: Period) -> String {
    format!(
        "SELECT AVG(Amount) AverageGift FROM Opportunity WHERE IsWon = true AND CloseDate = {}",
        period.this_literal()
    )
}

/// `None` means all time.
pub fn largest_gift(period: Option<Period>) -> String {
    let filter = match period {
        Some(period) => format!("WHERE IsWon = true AND CloseDate = {}", period.this_literal()),
        None => "WHERE IsWon = true".to_string(),
    };
    format!("SELECT Id, Name, Amount, CloseDate FROM Opportunity {filter} ORDER BY Amount DESC LIMIT 1")
}

pub fn lapsed_donor_count(months: u32) -> String {
    let days = days_for_months(months);
    format!(
        "SELECT COUNT(Id) FROM Contact \
         WHERE Id IN (SELECT ContactId FROM OpportunityContactRole WHERE Opportunity.IsWon=true) \
         AND Id NOT IN (SELECT ContactId FROM OpportunityContactRole WHERE Opportunity.IsWon=true AND Opportunity.CloseDate = LAST_N_DAYS:{days})"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_literals() {
        assert_eq!(
            donation_count(Period::Month),
            "SELECT COUNT() FROM Opportunity WHERE IsWon = true AND CloseDate = THIS_MONTH"
        );
        assert!(total_revenue(Period::Quarter).ends_with("CloseDate = THIS_QUARTER"));
        assert!(average_gift(Period::Year).ends_with("CloseDate = THIS_YEAR"));
    }

    #[test]
    fn top_donors_is_a_single_line_with_limit() {
        let soql = top_donors(Period::Quarter, Limit::clamp(5));

        assert!(!soql.contains('\n'));
        assert!(soql.contains("Opportunity.CloseDate = THIS_QUARTER GROUP BY ContactId"));
        assert!(soql.ends_with("LIMIT 5"));
    }

    #[test]
    fn largest_gift_all_time_drops_date_filter() {
        assert_eq!(
            largest_gift(None),
            "SELECT Id, Name, Amount, CloseDate FROM Opportunity WHERE IsWon = true ORDER BY Amount DESC LIMIT 1"
        );
        assert!(largest_gift(Some(Period::Month)).contains("CloseDate = THIS_MONTH ORDER BY"));
    }

    #[test]
    fn lapsed_count_uses_month_window() {
        assert!(lapsed_donor_count(18).contains("LAST_N_DAYS:540)"));
    }

    #[test]
    fn gave_last_year_compares_both_years() {
        let soql = gave_last_year_not_this_year(Limit::default());

        assert!(soql.contains("CloseDate = LAST_YEAR) AND Id NOT IN"));
        assert!(soql.contains("CloseDate = THIS_YEAR) LIMIT 25"));
    }
}
