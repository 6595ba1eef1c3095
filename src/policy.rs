use chrono::NaiveDate;

use crate::error::PolicyError;
use crate::gaps;

pub const DEFAULT_CADENCE_DAYS: i64 = 30;
pub const DEFAULT_TOP_N: i64 = 10;
/// Upper bound for cadence and due window, roughly a century.
pub const MAX_POLICY_DAYS: i64 = 36_500;

/// Validated parameters for one audit run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditPolicy {
    pub as_of: NaiveDate,
    pub cadence_days: i64,
    pub due_window_days: i64,
    /// Number of scholars kept in the top-gaps list; zero or less keeps all.
    pub top_n: i64,
    pub dedupe_by_day: bool,
}

impl AuditPolicy {
    pub fn new(
        as_of: NaiveDate,
        cadence_days: i64,
        due_window_days: Option<i64>,
        top_n: i64,
        dedupe_by_day: bool,
    ) -> Result<Self, PolicyError> {
        if cadence_days <= 0 {
            return Err(PolicyError::NonPositiveCadence(cadence_days));
        }
        if cadence_days > MAX_POLICY_DAYS {
            return Err(PolicyError::CadenceTooLarge(cadence_days));
        }
        let due_window_days = match due_window_days {
            Some(days) if days <= 0 => return Err(PolicyError::NonPositiveDueWindow(days)),
            Some(days) if days > MAX_POLICY_DAYS => {
                return Err(PolicyError::DueWindowTooLarge(days))
            }
            Some(days) => days,
            None => gaps::default_due_window(cadence_days),
        };

        Ok(Self {
            as_of,
            cadence_days,
            due_window_days,
            top_n,
            dedupe_by_day,
        })
    }
}
