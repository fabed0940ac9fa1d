//! Donor criteria classifier.
//!
//! Rules are evaluated top to bottom and the first predicate that matches
//! decides the segment. The order is part of the contract: "major donors who
//! lapsed" is a lapsed query, not a major-donor query.

use serde::Serialize;

use crate::parse::{parse_amount, parse_timeframe};
use crate::soql::{donor, Limit, TemplateName};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SegmentMatch {
    pub soql: String,
    pub meta: QueryMeta,
}

/// What the classifier decided, without having to re-read the SOQL.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMeta {
    pub segment: TemplateName,
    pub limit: Limit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub months: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<f64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub defaulted: bool,
}

impl QueryMeta {
    fn new(segment: TemplateName, limit: Limit) -> Self {
        Self { segment, limit, months: None, amount: None, min_amount: None, defaulted: false }
    }
}

struct Rule {
    name: &'static str,
    matches: fn(&str) -> bool,
    build: fn(&str, Limit) -> SegmentMatch,
}

const RULES: &[Rule] = &[
    Rule { name: "lapsed", matches: mentions_lapsed, build: lapsed },
    Rule { name: "major", matches: mentions_major, build: major },
    Rule { name: "recent", matches: mentions_recent_months, build: recent },
    Rule { name: "first_time", matches: mentions_first, build: first_time },
    Rule { name: "recurring", matches: mentions_recurring, build: recurring },
    Rule { name: "at_risk", matches: mentions_at_risk, build: at_risk },
    Rule { name: "upgrade", matches: mentions_upgrade, build: upgrade },
    Rule { name: "mid_level", matches: mentions_mid_level, build: mid_level },
];

/// Rule names in evaluation order, fallback excluded.
pub fn rule_order() -> impl Iterator<Item = &'static str> {
    RULES.iter().map(|rule| rule.name)
}

pub fn build_soql_from_criteria(criteria: &str, limit: Limit) -> SegmentMatch {
    let text = criteria.trim().to_lowercase();

    RULES
        .iter()
        .find(|rule| (rule.matches)(&text))
        .map(|rule| (rule.build)(&text, limit))
        .unwrap_or_else(|| fallback(limit))
}

fn mentions_lapsed(text: &str) -> bool {
    text.contains("lapsed")
}

fn mentions_major(text: &str) -> bool {
    text.contains("major") || text.contains("over") || text.contains('$')
}

fn mentions_recent_months(text: &str) -> bool {
    text.contains("recent") && text.contains("month")
}

fn mentions_first(text: &str) -> bool {
    text.contains("first")
}

fn mentions_recurring(text: &str) -> bool {
    text.contains("recurring") || text.contains("sustain")
}

fn mentions_at_risk(text: &str) -> bool {
    text.contains("at-risk") || text.contains("at risk")
}

fn mentions_upgrade(text: &str) -> bool {
    text.contains("upgrade") || text.contains("candidate")
}

fn mentions_mid_level(text: &str) -> bool {
    text.contains("mid-level") || text.contains("mid level")
}

fn months_or(text: &str, default: u32) -> u32 {
    parse_timeframe(text).map(|timeframe| timeframe.months()).unwrap_or(default)
}

fn positive_amount_or(text: &str, default: f64) -> f64 {
    parse_amount(text).filter(|amount| *amount > 0.0).unwrap_or(default)
}

fn lapsed(text: &str, limit: Limit) -> SegmentMatch {
    let months = months_or(text, donor::DEFAULT_LAPSED_MONTHS);
    let mut meta = QueryMeta::new(TemplateName::LapsedDonors, limit);
    meta.months = Some(months);
    SegmentMatch { soql: donor::lapsed_donors(months, limit), meta }
}

fn major(text: &str, limit: Limit) -> SegmentMatch {
    let amount = positive_amount_or(text, donor::DEFAULT_MAJOR_AMOUNT);
    let mut meta = QueryMeta::new(TemplateName::MajorDonorsOver, limit);
    meta.amount = Some(amount);
    SegmentMatch { soql: donor::major_donors_over(amount, limit), meta }
}

fn recent(text: &str, limit: Limit) -> SegmentMatch {
    let months = months_or(text, donor::DEFAULT_RECENT_MONTHS);
    let mut meta = QueryMeta::new(TemplateName::RecentDonors, limit);
    meta.months = Some(months);
    SegmentMatch { soql: donor::recent_donors(months, limit), meta }
}

fn first_time(_text: &str, limit: Limit) -> SegmentMatch {
    SegmentMatch {
        soql: donor::first_time_donors(limit),
        meta: QueryMeta::new(TemplateName::FirstTimeDonors, limit),
    }
}

fn recurring(_text: &str, limit: Limit) -> SegmentMatch {
    SegmentMatch {
        soql: donor::recurring_donors(donor::DEFAULT_RECURRING_MIN_GIFTS, limit),
        meta: QueryMeta::new(TemplateName::RecurringDonors, limit),
    }
}

fn at_risk(_text: &str, limit: Limit) -> SegmentMatch {
    SegmentMatch {
        soql: donor::at_risk_donors(
            donor::DEFAULT_AT_RISK_HISTORICAL_MONTHS,
            donor::DEFAULT_AT_RISK_RECENT_MONTHS,
            donor::DEFAULT_AT_RISK_MIN_GIFTS,
            limit,
        ),
        meta: QueryMeta::new(TemplateName::AtRiskDonors, limit),
    }
}

fn upgrade(text: &str, limit: Limit) -> SegmentMatch {
    let min_amount = positive_amount_or(text, donor::DEFAULT_UPGRADE_MIN_AMOUNT);
    let mut meta = QueryMeta::new(TemplateName::UpgradeCandidates, limit);
    meta.min_amount = Some(min_amount);
    SegmentMatch {
        soql: donor::upgrade_candidates(min_amount, donor::DEFAULT_UPGRADE_MIN_GIFTS, limit),
        meta,
    }
}

fn mid_level(_text: &str, limit: Limit) -> SegmentMatch {
    SegmentMatch {
        soql: donor::mid_level_donors(
            donor::DEFAULT_MID_LEVEL_MIN,
            donor::DEFAULT_MID_LEVEL_MAX,
            limit,
        ),
        meta: QueryMeta::new(TemplateName::MidLevelDonors, limit),
    }
}

fn fallback(limit: Limit) -> SegmentMatch {
    let months = donor::DEFAULT_RECENT_MONTHS;
    let mut meta = QueryMeta::new(TemplateName::RecentDonors, limit);
    meta.months = Some(months);
    meta.defaulted = true;
    SegmentMatch { soql: donor::recent_donors(months, limit), meta }
}

#[cfg(test)]
mod tests {
    use super::{build_soql_from_criteria, rule_order};
    use crate::soql::{Limit, TemplateName};

    fn classify(criteria: &str) -> super::SegmentMatch {
        build_soql_from_criteria(criteria, Limit::default())
    }

    #[test]
    fn lapsed_without_timeframe_defaults_to_twelve_months() {
        let matched = classify("show me lapsed donors");

        assert_eq!(matched.meta.segment, TemplateName::LapsedDonors);
        assert_eq!(matched.meta.months, Some(12));
        assert!(matched.soql.contains("LAST_N_DAYS:360"));
    }

    #[test]
    fn lapsed_honours_explicit_window() {
        let matched = classify("Lapsed donors from the last 18 months");

        assert_eq!(matched.meta.months, Some(18));
        assert!(matched.soql.contains("LAST_N_DAYS:540"));
    }

    #[test]
    fn major_donors_over_amount() {
        let matched = classify("major donors over $10k");

        assert_eq!(matched.meta.segment, TemplateName::MajorDonorsOver);
        assert_eq!(matched.meta.amount, Some(10_000.0));
        assert!(matched.soql.contains("10000"));
    }

    #[test]
    fn major_without_amount_defaults_to_one_thousand() {
        let matched = classify("major donors");

        assert_eq!(matched.meta.amount, Some(1_000.0));
        assert!(matched.soql.contains("> 1000)"));
    }

    #[test]
    fn dollar_sign_alone_selects_major() {
        assert_eq!(classify("gave $250").meta.segment, TemplateName::MajorDonorsOver);
    }

    #[test]
    fn lapsed_outranks_major() {
        let matched = classify("major donors who lapsed over the last 6 months");

        assert_eq!(matched.meta.segment, TemplateName::LapsedDonors);
        assert_eq!(matched.meta.months, Some(6));
        assert_eq!(matched.meta.amount, None);
    }

    #[test]
    fn recent_needs_month_keyword() {
        let with_month = classify("recent donors from the last 3 months");
        assert_eq!(with_month.meta.segment, TemplateName::RecentDonors);
        assert_eq!(with_month.meta.months, Some(3));
        assert!(!with_month.meta.defaulted);

        let recent_month_default = classify("recent donors this month");
        assert_eq!(recent_month_default.meta.months, Some(6));
        assert!(!recent_month_default.meta.defaulted);

        let without_month = classify("recent donors");
        assert!(without_month.meta.defaulted);
    }

    #[test]
    fn last_year_wording_keeps_default_window() {
        let matched = classify("recent donors this month, not last year");

        assert_eq!(matched.meta.segment, TemplateName::RecentDonors);
        assert_eq!(matched.meta.months, Some(6));
        assert!(matched.soql.contains("LAST_N_DAYS:180"));
    }

    #[test]
    fn keyword_segments_with_fixed_parameters() {
        assert_eq!(classify("first-time donors").meta.segment, TemplateName::FirstTimeDonors);
        assert_eq!(classify("monthly sustainers").meta.segment, TemplateName::RecurringDonors);
        assert_eq!(classify("at risk donors").meta.segment, TemplateName::AtRiskDonors);
        assert_eq!(classify("at-risk donors").meta.segment, TemplateName::AtRiskDonors);
        assert_eq!(classify("mid level donors").meta.segment, TemplateName::MidLevelDonors);

        let recurring = classify("recurring donors");
        assert!(recurring.soql.contains("COUNT(Opportunity.Id) >= 3"));

        let at_risk = classify("at-risk donors");
        assert!(at_risk.soql.contains("LAST_N_DAYS:720"));
        assert!(at_risk.soql.contains("LAST_N_DAYS:180"));
    }

    #[test]
    fn upgrade_candidates_take_min_amount() {
        let matched = classify("upgrade candidates above 2.5k");

        assert_eq!(matched.meta.segment, TemplateName::UpgradeCandidates);
        assert_eq!(matched.meta.min_amount, Some(2_500.0));
        assert!(matched.soql.contains("HAVING SUM(Opportunity.Amount) > 2500"));

        assert_eq!(classify("upgrade candidates").meta.min_amount, Some(1_000.0));
    }

    #[test]
    fn first_beats_recurring_and_upgrade() {
        assert_eq!(
            classify("first gift recurring upgrade").meta.segment,
            TemplateName::FirstTimeDonors
        );
    }

    #[test]
    fn unmatched_input_falls_back_to_recent_six_months() {
        let matched = classify("zzz unmatched input");

        assert_eq!(matched.meta.segment, TemplateName::RecentDonors);
        assert_eq!(matched.meta.months, Some(6));
        assert!(matched.meta.defaulted);
        assert!(matched.soql.contains("LAST_N_DAYS:180"));
    }

    #[test]
    fn empty_input_falls_back() {
        assert!(classify("   ").meta.defaulted);
    }

    #[test]
    fn meta_carries_limit_and_serializes_sparse() {
        let matched = build_soql_from_criteria("upgrade candidates", Limit::clamp(7));
        let json = serde_json::to_value(&matched.meta).expect("meta serializes");

        assert_eq!(json["segment"], "upgrade_candidates");
        assert_eq!(json["limit"], 7);
        assert_eq!(json["minAmount"], 1000.0);
        assert!(json.get("months").is_none());
        assert!(json.get("defaulted").is_none());
        assert!(matched.soql.ends_with("LIMIT 7"));
    }

    #[test]
    fn rule_order_is_stable() {
        let order: Vec<_> = rule_order().collect();
        assert_eq!(
            order,
            [
                "lapsed",
                "major",
                "recent",
                "first_time",
                "recurring",
                "at_risk",
                "upgrade",
                "mid_level"
            ]
        );
    }
}
