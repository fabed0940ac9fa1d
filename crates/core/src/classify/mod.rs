//! Natural-language classifiers that turn free text into SOQL.

pub mod criteria;
pub mod question;

pub use criteria::{build_soql_from_criteria, rule_order, QueryMeta, SegmentMatch};
pub use question::{nl_to_soql, QuestionIntent, QuestionMatch};
