//! Fundraising question classifier.
//!
//! Independent of the donor criteria rules: different trigger phrases,
//! different defaults, same first-match-wins evaluation.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::parse::parse_amount;
use crate::soql::questions::{self, Period};
use crate::soql::{donor, opportunity, Limit};

const DEFAULT_TOP_DONORS: i64 = 10;
const DEFAULT_MAJOR_THRESHOLD: f64 = 10_000.0;

static COUNT_THIS_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"how\s+many\s+(?:donation|gift)s?.*this\s+month").expect("pattern is valid")
});
static COUNT_THIS_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"how\s+many\s+(?:donation|gift)s?.*this\s+year").expect("pattern is valid")
});
static TOTAL_REVENUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"total\s+(?:revenue|raised|donations?).*this\s+(?:month|quarter|year)")
        .expect("pattern is valid")
});
static THIS_PERIOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"this\s+(month|quarter|year)").expect("pattern is valid"));
static TOP_N_DONORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"top\s+(\d+)\s+donor").expect("pattern is valid"));
static LAST_N_MONTHS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"last\s*(\d+)\s*months?").expect("pattern is valid"));
static AVERAGE_GIFT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"average\s+(?:gift|donation)\s*(?:size|amount)?").expect("pattern is valid")
});
// Alternation binds loosely: "largest" or "biggest" alone is enough.
static LARGEST_GIFT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"largest|biggest|highest\s+(?:gift|donation)").expect("pattern is valid")
});
static HOW_MANY_LAPSED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"how\s+many.*lapsed").expect("pattern is valid"));
static ANY_MONTHS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*months?").expect("pattern is valid"));
static WHO_MAJOR_DONORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"who.*major\s+donors?").expect("pattern is valid"));
static MONTHLY_REVENUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"revenue.*by\s+month|monthly\s+(?:revenue|trends?)").expect("pattern is valid")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionIntent {
    DonationCount,
    TotalRevenue,
    TopDonors,
    GaveLastYearNotThisYear,
    RecentDonors,
    AverageGift,
    LargestGift,
    LapsedCount,
    MajorDonors,
    MonthlyRevenue,
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuestionMatch {
    pub intent: QuestionIntent,
    pub soql: String,
    pub explanation: String,
}

impl QuestionMatch {
    fn new(intent: QuestionIntent, soql: String, explanation: impl Into<String>) -> Self {
        Self { intent, soql, explanation: explanation.into() }
    }
}

type QuestionRule = fn(&str, Limit) -> Option<QuestionMatch>;

const RULES: &[QuestionRule] = &[
    count_this_month,
    count_this_year,
    total_revenue,
    top_donors,
    gave_last_year_not_this_year,
    recent_donors,
    average_gift,
    largest_gift,
    lapsed_count,
    major_donors,
    monthly_revenue,
];

pub fn nl_to_soql(question: &str, limit: Limit) -> QuestionMatch {
    let text = question.trim().to_lowercase();

    RULES.iter().find_map(|rule| rule(&text, limit)).unwrap_or_else(|| {
        QuestionMatch::new(
            QuestionIntent::Fallback,
            donor::recent_donors(donor::DEFAULT_RECENT_MONTHS, limit),
            "Fallback: recent donors in the last 6 months",
        )
    })
}

fn count_this_month(text: &str, _limit: Limit) -> Option<QuestionMatch> {
    COUNT_THIS_MONTH.is_match(text).then(|| {
        QuestionMatch::new(
            QuestionIntent::DonationCount,
            questions::donation_count(Period::Month),
            "Count of won opportunities in the current month",
        )
    })
}

fn count_this_year(text: &str, _limit: Limit) -> Option<QuestionMatch> {
    COUNT_THIS_YEAR.is_match(text).then(|| {
        QuestionMatch::new(
            QuestionIntent::DonationCount,
            questions::donation_count(Period::Year),
            "Count of won opportunities in the current year",
        )
    })
}

fn total_revenue(text: &str, _limit: Limit) -> Option<QuestionMatch> {
    if !TOTAL_REVENUE.is_match(text) {
        return None;
    }
    let period = THIS_PERIOD
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|period| match period.as_str() {
            "quarter" => Period::Quarter,
            "year" => Period::Year,
            _ => Period::Month,
        })
        .unwrap_or(Period::Month);

    Some(QuestionMatch::new(
        QuestionIntent::TotalRevenue,
        questions::total_revenue(period),
        format!("Total revenue for the current {}", period.label()),
    ))
}

fn top_donors(text: &str, _limit: Limit) -> Option<QuestionMatch> {
    if !(text.contains("top") && text.contains("donor")) {
        return None;
    }
    let requested = TOP_N_DONORS
        .captures(text)
        .and_then(|captures| captures.get(1))
        .and_then(|count| count.as_str().parse::<i64>().ok())
        .unwrap_or(DEFAULT_TOP_DONORS);
    let top = Limit::clamp(requested);

    // month wins over quarter when both appear
    let period = if text.contains("month") {
        Period::Month
    } else if text.contains("quarter") {
        Period::Quarter
    } else {
        Period::Year
    };

    Some(QuestionMatch::new(
        QuestionIntent::TopDonors,
        questions::top_donors(period, top),
        format!("Top {top} donors this {} by total won amount", period.label()),
    ))
}

fn gave_last_year_not_this_year(text: &str, limit: Limit) -> Option<QuestionMatch> {
    let mentions_last_year = text.contains("last year");
    let mentions_since = ["hasn't given since", "not since", "haven't given since"]
        .iter()
        .any(|phrase| text.contains(phrase));

    (mentions_last_year && mentions_since).then(|| {
        QuestionMatch::new(
            QuestionIntent::GaveLastYearNotThisYear,
            questions::gave_last_year_not_this_year(limit),
            "Contacts who gave last year but not yet this year",
        )
    })
}

fn recent_donors(text: &str, limit: Limit) -> Option<QuestionMatch> {
    if !(text.contains("donor") || text.contains("gift")) {
        return None;
    }
    let months = capture_u32(&LAST_N_MONTHS, text)?.max(1);

    Some(QuestionMatch::new(
        QuestionIntent::RecentDonors,
        donor::recent_donors(months, limit),
        format!("Contacts with gifts in the last {months} months"),
    ))
}

fn average_gift(text: &str, _limit: Limit) -> Option<QuestionMatch> {
    if !AVERAGE_GIFT.is_match(text) {
        return None;
    }
    let period = if text.contains("this quarter") {
        Period::Quarter
    } else if text.contains("this month") {
        Period::Month
    } else {
        Period::Year
    };

    Some(QuestionMatch::new(
        QuestionIntent::AverageGift,
        questions::average_gift(period),
        format!("Average gift size for the current {}", period.label()),
    ))
}

fn largest_gift(text: &str, _limit: Limit) -> Option<QuestionMatch> {
    if !LARGEST_GIFT.is_match(text) {
        return None;
    }
    let period = if text.contains("all time") || text.contains("ever") {
        None
    } else if text.contains("this quarter") {
        Some(Period::Quarter)
    } else if text.contains("this month") {
        Some(Period::Month)
    } else {
        Some(Period::Year)
    };

    let explanation = match period {
        Some(period) => format!("Largest gift for the current {}", period.label()),
        None => "Largest gift of all time".to_string(),
    };
    Some(QuestionMatch::new(QuestionIntent::LargestGift, questions::largest_gift(period), explanation))
}

fn lapsed_count(text: &str, _limit: Limit) -> Option<QuestionMatch> {
    if !HOW_MANY_LAPSED.is_match(text) {
        return None;
    }
    let months = capture_u32(&ANY_MONTHS, text).unwrap_or(donor::DEFAULT_LAPSED_MONTHS);

    Some(QuestionMatch::new(
        QuestionIntent::LapsedCount,
        questions::lapsed_donor_count(months),
        format!("Count of donors who haven't given in {months} months"),
    ))
}

fn major_donors(text: &str, limit: Limit) -> Option<QuestionMatch> {
    if !WHO_MAJOR_DONORS.is_match(text) {
        return None;
    }
    let threshold =
        parse_amount(text).filter(|amount| *amount > 0.0).unwrap_or(DEFAULT_MAJOR_THRESHOLD);

    Some(QuestionMatch::new(
        QuestionIntent::MajorDonors,
        donor::major_donors_over(threshold, limit),
        format!("Donors with lifetime giving over ${}", group_thousands(threshold)),
    ))
}

fn monthly_revenue(text: &str, _limit: Limit) -> Option<QuestionMatch> {
    MONTHLY_REVENUE.is_match(text).then(|| {
        QuestionMatch::new(
            QuestionIntent::MonthlyRevenue,
            opportunity::monthly_revenue(opportunity::DEFAULT_TREND_MONTHS),
            "Monthly revenue trends for the last 12 months",
        )
    })
}

fn capture_u32(pattern: &Regex, text: &str) -> Option<u32> {
    let raw = pattern.captures(text)?.get(1)?.as_str();
    Some(raw.parse::<u32>().unwrap_or(crate::parse::MAX_MONTHS).min(crate::parse::MAX_MONTHS))
}

fn group_thousands(amount: f64) -> String {
    let whole = crate::soql::literal::amount(amount).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
