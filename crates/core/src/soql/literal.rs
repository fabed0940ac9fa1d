//! The one place numbers are turned into SOQL literals.
//!
//! SOQL here has no parameter binding, so every value a template embeds
//! passes through these helpers and can only ever render as a bare
//! non-negative integer.

use crate::parse::months_to_days;

/// Money thresholds render as whole currency units. Non-finite or negative
/// input renders as zero.
pub fn amount(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        // float-to-int `as` saturates at u64::MAX
        value.floor() as u64
    } else {
        0
    }
}

/// `LAST_N_DAYS` operand for a month count.
pub fn days_for_months(months: u32) -> u32 {
    months_to_days(months)
}
