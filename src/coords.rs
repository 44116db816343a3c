//! Coordinate resolution for time-label placement
//!
//! Each coupon position has two horizontal drawing slots (HE and HV) and one
//! shared vertical offset, stored as fractions of the page size. Resolution
//! is two-tier and explicit: a calibration override keyed by coupon identity
//! wins; otherwise the default table keyed by normalized position applies.

use std::collections::BTreeMap;

use crate::grid::{normalized_position, Coupon, CouponKey};

/// Fractional drawing coordinates for one coupon position.
///
/// `he_x` and `hv_x` are fractions of the page width; `y` is a fraction of
/// the page height measured from the top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateRecord {
    pub he_x: f64,
    pub hv_x: f64,
    pub y: f64,
}

impl CoordinateRecord {
    pub const fn new(he_x: f64, hv_x: f64, y: f64) -> Self {
        Self { he_x, hv_x, y }
    }
}

/// Returned for normalized positions outside the default table
pub const FALLBACK: CoordinateRecord = CoordinateRecord::new(0.17, 0.31, 0.50);

/// Hand-tuned defaults for the 6x2 label layout, indexed by normalized
/// position 1-12. Odd positions are the left column, even the right.
const DEFAULTS: [CoordinateRecord; 12] = [
    CoordinateRecord::new(0.175, 0.320, 0.145), // R01 - row 1, left
    CoordinateRecord::new(0.595, 0.735, 0.145), // R02 - row 1, right
    CoordinateRecord::new(0.175, 0.320, 0.295), // R03 - row 2, left
    CoordinateRecord::new(0.595, 0.735, 0.295), // R04 - row 2, right
    CoordinateRecord::new(0.175, 0.320, 0.440), // R05 - row 3, left
    CoordinateRecord::new(0.595, 0.735, 0.440), // R06 - row 3, right
    CoordinateRecord::new(0.175, 0.320, 0.585), // R07 - row 4, left
    CoordinateRecord::new(0.595, 0.735, 0.585), // R08 - row 4, right
    CoordinateRecord::new(0.175, 0.320, 0.735), // R09 - row 5, left
    CoordinateRecord::new(0.595, 0.735, 0.735), // R10 - row 5, right
    CoordinateRecord::new(0.175, 0.320, 0.880), // R11 - row 6, left
    CoordinateRecord::new(0.595, 0.735, 0.880), // R12 - row 6, right
];

/// Default coordinates for a normalized position, or the fixed fallback for
/// anything outside [1, 12]
pub fn default_coordinates(normalized: u32) -> CoordinateRecord {
    match normalized {
        1..=12 => DEFAULTS[(normalized - 1) as usize],
        _ => FALLBACK,
    }
}

/// Session-scoped calibration overrides, keyed by coupon identity.
///
/// Lives for one loaded document and is replaced wholesale when a new
/// document is loaded.
#[derive(Debug, Clone, Default)]
pub struct CalibrationTable {
    entries: BTreeMap<CouponKey, CoordinateRecord>,
}

impl CalibrationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: CouponKey, record: CoordinateRecord) {
        self.entries.insert(key, record);
    }

    pub fn clear(&mut self, key: &CouponKey) {
        self.entries.remove(key);
    }

    pub fn get(&self, key: &CouponKey) -> Option<&CoordinateRecord> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store `record` for every coupon at the given normalized position
    pub fn set_for_position(
        &mut self,
        position: u32,
        record: CoordinateRecord,
        coupons: &[Coupon],
    ) {
        for coupon in coupons {
            if normalized_position(coupon.position()) == position {
                self.set(coupon.key, record);
            }
        }
    }

    /// Apply the horizontal calibration to every position in the same column
    /// as `position`, keeping each row's default vertical placement
    pub fn copy_to_column(&mut self, position: u32, record: CoordinateRecord, coupons: &[Coupon]) {
        for coupon in coupons {
            let pos = normalized_position(coupon.position());
            if pos % 2 == position % 2 {
                let y = default_coordinates(pos).y;
                self.set(coupon.key, CoordinateRecord::new(record.he_x, record.hv_x, y));
            }
        }
    }

    /// Drop any overrides stored for coupons at the given normalized position
    pub fn reset_position(&mut self, position: u32, coupons: &[Coupon]) {
        for coupon in coupons {
            if normalized_position(coupon.position()) == position {
                self.entries.remove(&coupon.key);
            }
        }
    }
}

/// Resolve the coordinates to use for a coupon: calibration override first,
/// default table by normalized position otherwise
pub fn resolve(coupon: &Coupon, table: &CalibrationTable) -> CoordinateRecord {
    if let Some(record) = table.get(&coupon.key) {
        return *record;
    }
    default_coordinates(normalized_position(coupon.position()))
}

/// Coordinates currently in effect for a normalized position.
///
/// The first coupon in enumeration order whose normalized position matches
/// and which carries an override wins; otherwise the default table applies.
/// This answers "where would position P draw" before any coupon on the
/// currently viewed page has been calibrated.
pub fn resolve_by_position(
    position: u32,
    table: &CalibrationTable,
    coupons: &[Coupon],
) -> CoordinateRecord {
    for coupon in coupons {
        if normalized_position(coupon.position()) == position {
            if let Some(record) = table.get(&coupon.key) {
                return *record;
            }
        }
    }
    default_coordinates(position)
}
