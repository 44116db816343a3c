//! Page preview rendering
//!
//! Draws resolved time labels onto copies of rasterized page images. Two
//! modes: a plain preview showing every labeled coupon, and a calibration
//! preview that highlights one normalized position with live coordinate
//! values, guide lines, and slot markers. Both are pure; the input image is
//! never mutated.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};
use spleen_font::{PSF2Font, FONT_12X24};

use crate::coords::{resolve, CalibrationTable, CoordinateRecord};
use crate::grid::{normalized_position, Coupon, GridOptions};

const LABEL_FILL: Rgba<u8> = Rgba([255, 51, 51, 255]);
const LABEL_OUTLINE: Rgba<u8> = Rgba([0, 0, 0, 255]);
const SELECTED_FILL: Rgba<u8> = Rgba([0, 102, 255, 255]);
const SELECTED_OUTLINE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const GUIDE_COLOR: Rgba<u8> = Rgba([0, 102, 255, 255]);
const GRID_COLOR: Rgba<u8> = Rgba([204, 204, 204, 255]);

/// Spleen glyph cell size (12x24 font)
const GLYPH_WIDTH: u32 = 12;
const GLYPH_HEIGHT: u32 = 24;

/// Outline offsets for the plain preview
const OUTLINE_THIN: &[(i32, i32)] = &[(-1, -1), (-1, 1), (1, -1), (1, 1)];
/// Heavier outline used in calibration mode for legibility over guides
const OUTLINE_THICK: &[(i32, i32)] = &[
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
    (-2, 0),
    (2, 0),
    (0, -2),
    (0, 2),
];

/// Label height in pixels for a page image, proportional to its height
fn label_height_px(image_height: u32, fraction: f64) -> u32 {
    ((image_height as f64 * fraction) as u32).max(10)
}

/// Convert a fractional coordinate record to pixel positions on an image
fn to_pixels(record: &CoordinateRecord, width: u32, height: u32) -> (i32, i32, i32) {
    (
        (width as f64 * record.he_x) as i32,
        (width as f64 * record.hv_x) as i32,
        (height as f64 * record.y) as i32,
    )
}

/// Draw `text` with its top-left corner at `(x, y)`, scaling the 12x24
/// Spleen glyphs to `height` pixels with nearest-neighbor sampling.
fn draw_label(img: &mut RgbaImage, text: &str, x: i32, y: i32, height: u32, color: Rgba<u8>) {
    let mut font = match PSF2Font::new(FONT_12X24) {
        Ok(font) => font,
        Err(_) => return,
    };

    let char_height = height.max(8);
    let char_width = (char_height * GLYPH_WIDTH / GLYPH_HEIGHT).max(4);
    let (img_w, img_h) = img.dimensions();

    for (i, ch) in text.chars().enumerate() {
        let utf8 = ch.to_string();
        let Some(glyph) = font.glyph_for_utf8(utf8.as_bytes()) else {
            continue;
        };

        // Collect the glyph bitmap so it can be sampled at any scale
        let mut bitmap = [0u8; (GLYPH_WIDTH * GLYPH_HEIGHT) as usize];
        for (gy, row) in glyph.enumerate() {
            for (gx, on) in row.enumerate() {
                if on && gx < GLYPH_WIDTH as usize && gy < GLYPH_HEIGHT as usize {
                    bitmap[gy * GLYPH_WIDTH as usize + gx] = 1;
                }
            }
        }

        let origin_x = x + (i as u32 * char_width) as i32;
        for dy in 0..char_height {
            let sy = dy * GLYPH_HEIGHT / char_height;
            for dx in 0..char_width {
                let sx = dx * GLYPH_WIDTH / char_width;
                if bitmap[(sy * GLYPH_WIDTH + sx) as usize] == 0 {
                    continue;
                }
                let px = origin_x + dx as i32;
                let py = y + dy as i32;
                if px >= 0 && py >= 0 && (px as u32) < img_w && (py as u32) < img_h {
                    img.put_pixel(px as u32, py as u32, color);
                }
            }
        }
    }
}

/// Draw a label with offset outline copies under the fill copy
fn draw_outlined_label(
    img: &mut RgbaImage,
    text: &str,
    x: i32,
    y: i32,
    height: u32,
    fill: Rgba<u8>,
    outline: Rgba<u8>,
    offsets: &[(i32, i32)],
) {
    for &(dx, dy) in offsets {
        draw_label(img, text, x + dx, y + dy, height, outline);
    }
    draw_label(img, text, x, y, height, fill);
}

/// Render a preview of a page with every labeled coupon's times drawn at
/// their resolved coordinates. Coupons without a label are left untouched.
pub fn render_page_preview(
    page: &RgbaImage,
    coupons_on_page: &[Coupon],
    table: &CalibrationTable,
) -> RgbaImage {
    let mut img = page.clone();
    let (width, height) = img.dimensions();
    let label_height = label_height_px(height, 0.012);

    for coupon in coupons_on_page {
        if !coupon.has_label() {
            continue;
        }

        let record = resolve(coupon, table);
        let (px_he, px_hv, px_y) = to_pixels(&record, width, height);

        for x in [px_he, px_hv] {
            draw_outlined_label(
                &mut img,
                &coupon.time_label,
                x,
                px_y,
                label_height,
                LABEL_FILL,
                LABEL_OUTLINE,
                OUTLINE_THIN,
            );
        }
    }

    img
}

/// Render the calibration preview for a page.
///
/// The selected normalized position is drawn in blue at the live
/// (uncommitted) coordinates, with guide lines through its y offset and both
/// x slots, hollow circle markers, and HE/HV tags. All other coupons are
/// drawn in red at their committed resolution. Coupons without a label show
/// a `00:00` placeholder so every slot stays visible while calibrating. A
/// light reference grid marks the cell boundaries.
pub fn render_calibration_preview(
    page: &RgbaImage,
    selected_position: u32,
    live: &CoordinateRecord,
    coupons_on_page: &[Coupon],
    table: &CalibrationTable,
    grid: &GridOptions,
) -> RgbaImage {
    let mut img = page.clone();
    let (width, height) = img.dimensions();
    let label_height = label_height_px(height, 0.014);
    let tag_height = label_height_px(height, 0.010);

    for coupon in coupons_on_page {
        let label = if coupon.has_label() {
            coupon.time_label.clone()
        } else {
            "00:00".to_string()
        };

        let selected = normalized_position(coupon.position()) == selected_position;
        let (record, fill, outline) = if selected {
            (*live, SELECTED_FILL, SELECTED_OUTLINE)
        } else {
            (resolve(coupon, table), LABEL_FILL, LABEL_OUTLINE)
        };

        let (px_he, px_hv, px_y) = to_pixels(&record, width, height);
        for x in [px_he, px_hv] {
            draw_outlined_label(
                &mut img,
                &label,
                x,
                px_y,
                label_height,
                fill,
                outline,
                OUTLINE_THICK,
            );
        }

        if selected {
            let radius = (label_height / 2 + 3) as i32;
            for (x, tag) in [(px_he, "HE"), (px_hv, "HV")] {
                draw_hollow_circle_mut(&mut img, (x, px_y), radius, GUIDE_COLOR);
                draw_label(
                    &mut img,
                    tag,
                    x - 15,
                    px_y - radius - tag_height as i32 - 2,
                    tag_height,
                    GUIDE_COLOR,
                );
            }

            // Guide lines through the live coordinates
            let y = px_y as f32;
            draw_line_segment_mut(&mut img, (0.0, y), (width as f32, y), GUIDE_COLOR);
            for x in [px_he as f32, px_hv as f32] {
                draw_line_segment_mut(&mut img, (x, 0.0), (x, height as f32), GUIDE_COLOR);
            }
        }
    }

    draw_reference_grid(&mut img, grid);

    img
}

/// Light gray cell-boundary grid: one vertical line per column boundary and
/// one horizontal line per row boundary inside the usable area
fn draw_reference_grid(img: &mut RgbaImage, grid: &GridOptions) {
    let (width, height) = img.dimensions();
    let usable_height = (height as f64 * (1.0 - grid.bottom_margin)) as u32;
    let cell_height = usable_height / grid.rows.max(1);
    let cell_width = width / grid.columns.max(1);

    for col in 1..grid.columns {
        let x = (col * cell_width) as f32;
        draw_line_segment_mut(img, (x, 0.0), (x, height as f32), GRID_COLOR);
    }
    for row in 1..grid.rows {
        let y = (row * cell_height) as f32;
        draw_line_segment_mut(img, (0.0, y), (width as f32, y), GRID_COLOR);
    }
}
