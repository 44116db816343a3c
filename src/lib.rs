//! PDF Rotulos Library
//!
//! Stamps time labels onto fixed-layout PDF coupon sheets ("rotulos"),
//! 12 coupons per page in a 6x2 grid. This library provides functionality
//! to:
//! - Partition rasterized pages into a grid of coupon regions
//! - Derive a deterministic HH:MM schedule across the valid coupon set
//! - Resolve per-coupon drawing coordinates (calibration over defaults)
//! - Render on-screen previews, including a calibration mode
//! - Burn the labels into the source PDF as text annotations
//!
//! # Example
//!
//! ```no_run
//! use pdf_rotulos::grid::{plan_coupons, GridOptions};
//! use pdf_rotulos::schedule::{assign, ScheduleParams};
//! use pdf_rotulos::coords::CalibrationTable;
//! use pdf_rotulos::pdf::{stamp_times, StampOptions};
//! use std::path::Path;
//!
//! let grid = GridOptions::default();
//! let mut coupons = plan_coupons(3, &grid);
//! assign(&mut coupons, &ScheduleParams::default(), 3).expect("valid schedule");
//!
//! stamp_times(
//!     Path::new("rotulos.pdf"),
//!     Path::new("rotulos_con_horas.pdf"),
//!     &coupons,
//!     &CalibrationTable::new(),
//!     &StampOptions::default(),
//! ).expect("Failed to stamp PDF");
//! ```

pub mod coords;
pub mod error;
pub mod grid;
pub mod pdf;
pub mod preview;
pub mod raster;
pub mod schedule;
pub mod session;

// Re-export commonly used items
pub use error::{Error, Result};
