//! Coupon grid partitioning
//!
//! Splits rendered page images into a fixed grid of coupon regions (default
//! 6 rows x 2 columns) and gives each region a stable `(page, position)`
//! identity. Position numbering is row-major and 1-based: 1 = top-left,
//! 2 = top-right, 3 = second row left, and so on.

use image::RgbaImage;

use crate::error::{Error, Result};

/// Coupons per page in the fixed label layout. Normalized positions are
/// always reduced modulo this value, independent of the grid options in use.
pub const COUPONS_PER_PAGE: u32 = 12;

/// Grid layout options for partitioning a page into coupons
#[derive(Debug, Clone)]
pub struct GridOptions {
    /// Number of coupon columns per page
    pub columns: u32,
    /// Number of coupon rows per page
    pub rows: u32,
    /// Fraction of the page height reserved at the bottom, outside the grid
    pub bottom_margin: f64,
    /// Pixel inset applied on all sides of a cell before cropping
    pub inset_px: u32,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            columns: 2,
            rows: 6,
            bottom_margin: 0.05,
            inset_px: 5,
        }
    }
}

impl GridOptions {
    /// Coupons produced per full page with these options
    pub fn coupons_per_page(&self) -> u32 {
        self.columns * self.rows
    }
}

/// Structured coupon identity: 1-based page and position within the page.
///
/// All logic keys off this pair; the `P{page}_R{position:02}` string form is
/// a derived display label only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CouponKey {
    pub page: u32,
    pub position: u32,
}

impl CouponKey {
    pub fn new(page: u32, position: u32) -> Self {
        Self { page, position }
    }

    /// Display label, e.g. `P3_R07`
    pub fn display_id(&self) -> String {
        format!("P{}_R{:02}", self.page, self.position)
    }

    /// Parse a display label back into a key (`P3_R07` → page 3, position 7)
    pub fn parse(s: &str) -> Result<Self> {
        let rest = s
            .strip_prefix('P')
            .ok_or_else(|| Error::InvalidOverride(s.to_string()))?;
        let (page_str, pos_str) = rest
            .split_once("_R")
            .ok_or_else(|| Error::InvalidOverride(s.to_string()))?;
        let page: u32 = page_str
            .parse()
            .map_err(|_| Error::InvalidOverride(s.to_string()))?;
        let position: u32 = pos_str
            .parse()
            .map_err(|_| Error::InvalidOverride(s.to_string()))?;
        if page == 0 || position == 0 {
            return Err(Error::InvalidOverride(s.to_string()));
        }
        Ok(Self { page, position })
    }
}

/// Reduce a 1-based position into the normalized range [1, 12].
///
/// Pages beyond the first 12 positions reuse the same default layout, so
/// coordinate lookups always go through this reduction.
pub fn normalized_position(position: u32) -> u32 {
    (position - 1) % COUPONS_PER_PAGE + 1
}

/// One physical label region on one page
#[derive(Debug, Clone)]
pub struct Coupon {
    pub key: CouponKey,
    /// 1-based row within the page
    pub row: u32,
    /// 1-based column within the page
    pub column: u32,
    /// Cropped raster region, kept for preview purposes only.
    /// The stamping path works without it.
    pub image: Option<RgbaImage>,
    /// Assigned time label in HH:MM; empty means "no time assigned"
    pub time_label: String,
}

impl Coupon {
    fn new(page: u32, position: u32, columns: u32, image: Option<RgbaImage>) -> Self {
        Self {
            key: CouponKey::new(page, position),
            row: (position - 1) / columns + 1,
            column: (position - 1) % columns + 1,
            image,
            time_label: String::new(),
        }
    }

    pub fn page(&self) -> u32 {
        self.key.page
    }

    pub fn position(&self) -> u32 {
        self.key.position
    }

    pub fn has_label(&self) -> bool {
        !self.time_label.is_empty()
    }
}

/// Partition rendered page images into coupons, page-major then
/// position-minor.
///
/// Each cell is inset by `inset_px` on all sides and clamped to the usable
/// image area (page height minus the bottom margin). A cell that collapses
/// after clamping is skipped; that is a tolerance, not an error. Input
/// images are never mutated.
pub fn partition_pages(pages: &[RgbaImage], options: &GridOptions) -> Vec<Coupon> {
    let mut coupons = Vec::new();

    for (page_index, page) in pages.iter().enumerate() {
        let page_num = page_index as u32 + 1;
        let (width, height) = page.dimensions();

        let usable_height = (height as f64 * (1.0 - options.bottom_margin)) as u32;
        let cell_width = width / options.columns;
        let cell_height = usable_height / options.rows;

        for row in 0..options.rows {
            for col in 0..options.columns {
                let position = row * options.columns + col + 1;

                let x1 = (col * cell_width + options.inset_px).min(width);
                let y1 = (row * cell_height + options.inset_px).min(usable_height);
                let x2 = ((col + 1) * cell_width)
                    .saturating_sub(options.inset_px)
                    .min(width);
                let y2 = ((row + 1) * cell_height)
                    .saturating_sub(options.inset_px)
                    .min(usable_height);

                if x2 <= x1 || y2 <= y1 {
                    // Degenerate after insetting; skip silently
                    continue;
                }

                let crop = image::imageops::crop_imm(page, x1, y1, x2 - x1, y2 - y1).to_image();
                coupons.push(Coupon::new(page_num, position, options.columns, Some(crop)));
            }
        }
    }

    coupons
}

/// Produce the coupon set for a document without raster data.
///
/// Stamping needs only `(page, position)` identities, so a one-shot CLI run
/// can build coupons from the page count alone and skip rasterization.
pub fn plan_coupons(page_count: u32, options: &GridOptions) -> Vec<Coupon> {
    let per_page = options.coupons_per_page();
    let mut coupons = Vec::with_capacity((page_count * per_page) as usize);

    for page in 1..=page_count {
        for position in 1..=per_page {
            coupons.push(Coupon::new(page, position, options.columns, None));
        }
    }

    coupons
}
