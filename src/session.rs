//! Session state for one loaded document
//!
//! All mutable state lives here: the source path, the rasterized pages, the
//! coupon set, and the calibration table. Loading a new document replaces
//! the whole session, which is the only teardown boundary. Every operation
//! is synchronous; there is exactly one active operation at a time.

use std::path::{Path, PathBuf};

use chrono::Local;
use image::RgbaImage;

use crate::coords::{
    resolve, resolve_by_position, CalibrationTable, CoordinateRecord,
};
use crate::error::{Error, Result};
use crate::grid::{partition_pages, Coupon, CouponKey, GridOptions};
use crate::pdf::stamp::{stamp_times, StampOptions};
use crate::preview::{render_calibration_preview, render_page_preview};
use crate::raster::PageRasterizer;
use crate::schedule::{assign, ScheduleParams};

/// State for one loaded document
pub struct Session {
    pdf_path: PathBuf,
    grid: GridOptions,
    pages: Vec<RgbaImage>,
    coupons: Vec<Coupon>,
    calibration: CalibrationTable,
}

impl Session {
    /// Load a document: rasterize its pages and partition them into coupons.
    /// Any previous session state, calibration included, is replaced.
    pub fn load(path: &Path, dpi: u32, grid: GridOptions) -> Result<Self> {
        let rasterizer = PageRasterizer::new()?;
        let pages = rasterizer.rasterize(path, dpi)?;
        let coupons = partition_pages(&pages, &grid);

        Ok(Self {
            pdf_path: path.to_path_buf(),
            grid,
            pages,
            coupons,
            calibration: CalibrationTable::new(),
        })
    }

    /// Build a session from pre-rendered pages. Lets callers supply their
    /// own rasterization (and keeps tests off the pdfium dependency).
    pub fn from_pages(path: &Path, pages: Vec<RgbaImage>, grid: GridOptions) -> Self {
        let coupons = partition_pages(&pages, &grid);
        Self {
            pdf_path: path.to_path_buf(),
            grid,
            pages,
            coupons,
            calibration: CalibrationTable::new(),
        }
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    pub fn coupons(&self) -> &[Coupon] {
        &self.coupons
    }

    pub fn calibration(&self) -> &CalibrationTable {
        &self.calibration
    }

    /// Assign time labels across the coupon set
    pub fn apply_schedule(&mut self, params: &ScheduleParams) -> Result<usize> {
        let total_pages = self.page_count();
        assign(&mut self.coupons, params, total_pages)
    }

    /// Store a calibration override for one coupon
    pub fn set_override(&mut self, key: CouponKey, record: CoordinateRecord) {
        self.calibration.set(key, record);
    }

    /// Store a calibration override for every coupon at a normalized position
    pub fn set_override_for_position(&mut self, position: u32, record: CoordinateRecord) {
        self.calibration
            .set_for_position(position, record, &self.coupons);
    }

    /// Remove a calibration override, restoring the default coordinates
    pub fn clear_override(&mut self, key: &CouponKey) {
        self.calibration.clear(key);
    }

    /// Coordinates currently in effect for one coupon
    pub fn effective_coordinates(&self, key: &CouponKey) -> CoordinateRecord {
        match self.coupons.iter().find(|c| c.key == *key) {
            Some(coupon) => resolve(coupon, &self.calibration),
            None => crate::coords::default_coordinates(crate::grid::normalized_position(
                key.position,
            )),
        }
    }

    /// Coordinates currently in effect for a normalized position
    pub fn effective_coordinates_for_position(&self, position: u32) -> CoordinateRecord {
        resolve_by_position(position, &self.calibration, &self.coupons)
    }

    /// Render the plain preview for a 1-based page number
    pub fn preview_page(&self, page: u32) -> Result<RgbaImage> {
        let image = self.page_image(page)?;
        let on_page: Vec<Coupon> = self
            .coupons
            .iter()
            .filter(|c| c.page() == page)
            .cloned()
            .collect();
        Ok(render_page_preview(image, &on_page, &self.calibration))
    }

    /// Render the calibration preview for a 1-based page number
    pub fn calibration_preview(
        &self,
        page: u32,
        selected_position: u32,
        live: &CoordinateRecord,
    ) -> Result<RgbaImage> {
        let image = self.page_image(page)?;
        let on_page: Vec<Coupon> = self
            .coupons
            .iter()
            .filter(|c| c.page() == page)
            .cloned()
            .collect();
        Ok(render_calibration_preview(
            image,
            selected_position,
            live,
            &on_page,
            &self.calibration,
            &self.grid,
        ))
    }

    /// Stamp the labels into the source document, writing a timestamped
    /// output file into `output_dir`. Returns the output path on success;
    /// on failure no file is materialized.
    pub fn generate_output(&self, output_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir)?;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let output_path = output_dir.join(format!("rotulos_con_horas_{timestamp}.pdf"));

        stamp_times(
            &self.pdf_path,
            &output_path,
            &self.coupons,
            &self.calibration,
            &StampOptions::default(),
        )?;

        Ok(output_path)
    }

    fn page_image(&self, page: u32) -> Result<&RgbaImage> {
        if page == 0 {
            return Err(Error::General("page numbers are 1-based".to_string()));
        }
        self.pages
            .get((page - 1) as usize)
            .ok_or_else(|| Error::General(format!("page {page} is out of range")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::default_coordinates;
    use image::Rgba;

    fn test_session(pages: u32) -> Session {
        let images = (0..pages)
            .map(|_| RgbaImage::from_pixel(800, 1000, Rgba([255, 255, 255, 255])))
            .collect();
        Session::from_pages(Path::new("test.pdf"), images, GridOptions::default())
    }

    #[test]
    fn test_load_builds_coupon_set() {
        let session = test_session(2);
        assert_eq!(session.page_count(), 2);
        assert_eq!(session.coupons().len(), 24);
        assert!(session.calibration().is_empty());
    }

    #[test]
    fn test_schedule_then_override_round_trip() {
        let mut session = test_session(1);
        session
            .apply_schedule(&ScheduleParams::default())
            .unwrap();

        let key = CouponKey::new(1, 4);
        let custom = CoordinateRecord::new(0.2, 0.3, 0.4);

        session.set_override(key, custom);
        assert_eq!(session.effective_coordinates(&key), custom);

        session.clear_override(&key);
        assert_eq!(session.effective_coordinates(&key), default_coordinates(4));
    }

    #[test]
    fn test_effective_coordinates_for_position() {
        let mut session = test_session(2);
        let custom = CoordinateRecord::new(0.15, 0.25, 0.35);

        session.set_override_for_position(9, custom);
        assert_eq!(session.effective_coordinates_for_position(9), custom);
        assert_eq!(
            session.effective_coordinates_for_position(10),
            default_coordinates(10)
        );
    }

    #[test]
    fn test_preview_requires_valid_page() {
        let session = test_session(1);
        assert!(session.preview_page(0).is_err());
        assert!(session.preview_page(2).is_err());
        assert!(session.preview_page(1).is_ok());
    }
}
