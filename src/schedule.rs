//! Deterministic time-label scheduling
//!
//! Assigns an `HH:MM` label to every valid coupon from a start time, an
//! increment, and a grouping size. The valid set accounts for a partial last
//! page; everything else is cleared so no stale labels survive a re-run.

use chrono::{Duration, NaiveTime};

use crate::error::{Error, Result};
use crate::grid::Coupon;

/// Parameters driving schedule assignment
#[derive(Debug, Clone)]
pub struct ScheduleParams {
    /// Start time in HH:MM
    pub start_time: String,
    /// Minutes added per group
    pub increment_minutes: u32,
    /// Number of consecutive coupons sharing one time value
    pub group_size: u32,
    /// Coupons actually present on the last page, in [1, 12]
    pub last_page_count: u32,
}

impl Default for ScheduleParams {
    fn default() -> Self {
        Self {
            start_time: "08:00".to_string(),
            increment_minutes: 5,
            group_size: 1,
            last_page_count: 12,
        }
    }
}

/// Parse an `HH:MM` start time
pub fn parse_start_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| Error::InvalidTimeFormat(s.trim().to_string()))
}

/// Assign time labels to the valid coupon set, clearing everything else.
///
/// Valid coupons are those not on the last page, plus last-page coupons with
/// `position <= last_page_count`. The i-th valid coupon (0-based, in creation
/// order) receives `start + (i / group_size) * increment` minutes; addition
/// wraps past midnight. Returns the number of coupons labeled.
///
/// The start time is validated before any label is touched, so a malformed
/// time leaves the coupon set unchanged.
pub fn assign(coupons: &mut [Coupon], params: &ScheduleParams, total_pages: u32) -> Result<usize> {
    let start = parse_start_time(&params.start_time)?;
    let group_size = params.group_size.max(1) as usize;
    let increment = i64::from(params.increment_minutes.max(1));

    for coupon in coupons.iter_mut() {
        coupon.time_label.clear();
    }

    let mut index = 0usize;
    for coupon in coupons.iter_mut() {
        let on_last_page = coupon.page() == total_pages;
        if on_last_page && coupon.position() > params.last_page_count {
            continue;
        }

        let group = (index / group_size) as i64;
        // NaiveTime addition wraps around midnight, which is exactly the
        // 24-hour behavior wanted here
        let time = start + Duration::minutes(group * increment);
        coupon.time_label = time.format("%H:%M").to_string();
        index += 1;
    }

    Ok(index)
}

/// Number of coupons eligible for a label given a partial last page
pub fn valid_count(total_pages: u32, per_page: u32, last_page_count: u32) -> u32 {
    if total_pages == 0 {
        return 0;
    }
    (total_pages - 1) * per_page + last_page_count.min(per_page)
}
