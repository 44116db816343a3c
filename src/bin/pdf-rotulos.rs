//! PDF Rotulos CLI tool
//!
//! A command-line tool for stamping time labels onto fixed-layout PDF
//! coupon sheets.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use pdf_rotulos::coords::{CalibrationTable, CoordinateRecord};
use pdf_rotulos::grid::{plan_coupons, Coupon, CouponKey, GridOptions};
use pdf_rotulos::pdf::{count_pages, stamp_times, StampOptions};
use pdf_rotulos::schedule::{assign, valid_count, ScheduleParams};
use pdf_rotulos::session::Session;
use pdf_rotulos::Error;

/// PDF Rotulos - stamp time labels onto coupon sheets
#[derive(Parser)]
#[command(name = "pdf-rotulos")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Stamp times starting at 08:00, one label every 5 minutes
    pdf-rotulos stamp rotulos.pdf -o output.pdf --start 08:00 --increment 5

    # Same time on pairs of coupons, 7 coupons on the last page
    pdf-rotulos stamp rotulos.pdf -o output.pdf --every 2 --last-page 7

    # Nudge position R03 on every page before stamping
    pdf-rotulos stamp rotulos.pdf -o output.pdf --override \"R03=0.18,0.33,0.30\"

    # Write preview PNGs for page 1
    pdf-rotulos preview rotulos.pdf -o previews/ --page 1

    # Calibration preview for position R05
    pdf-rotulos preview rotulos.pdf -o previews/ --page 1 --calibrate 5 --y 0.45")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a schedule and stamp the times into the PDF
    Stamp {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Start time (HH:MM)
        #[arg(long, default_value = "08:00")]
        start: String,

        /// Minutes added per group
        #[arg(long, default_value_t = 5)]
        increment: u32,

        /// Number of consecutive coupons sharing one time value
        #[arg(long = "every", default_value_t = 1)]
        group_size: u32,

        /// Coupons present on the last page (1-12)
        #[arg(long = "last-page", default_value_t = 12)]
        last_page_count: u32,

        /// Calibration override: "P1_R03=he_x,hv_x,y" for one coupon or
        /// "R03=he_x,hv_x,y" for that position on every page. Repeatable.
        #[arg(long = "override")]
        overrides: Vec<String>,
    },

    /// Render preview images of the scheduled labels
    Preview {
        /// Input PDF file
        input: PathBuf,

        /// Output directory for PNG files
        #[arg(short, long)]
        output: PathBuf,

        /// Page to render (1-based); all pages when omitted
        #[arg(long)]
        page: Option<u32>,

        /// Rasterization resolution
        #[arg(long, default_value_t = 200)]
        dpi: u32,

        /// Start time (HH:MM)
        #[arg(long, default_value = "08:00")]
        start: String,

        /// Minutes added per group
        #[arg(long, default_value_t = 5)]
        increment: u32,

        /// Number of consecutive coupons sharing one time value
        #[arg(long = "every", default_value_t = 1)]
        group_size: u32,

        /// Coupons present on the last page (1-12)
        #[arg(long = "last-page", default_value_t = 12)]
        last_page_count: u32,

        /// Calibration override (same forms as `stamp`). Repeatable.
        #[arg(long = "override")]
        overrides: Vec<String>,

        /// Render the calibration preview for this normalized position (1-12)
        #[arg(long)]
        calibrate: Option<u32>,

        /// Live HE x fraction for the calibrated position
        #[arg(long = "he-x")]
        he_x: Option<f64>,

        /// Live HV x fraction for the calibrated position
        #[arg(long = "hv-x")]
        hv_x: Option<f64>,

        /// Live y fraction for the calibrated position
        #[arg(long)]
        y: Option<f64>,
    },

    /// Show information about a coupon PDF
    Info {
        /// PDF file to inspect
        input: PathBuf,

        /// Coupons present on the last page (1-12)
        #[arg(long = "last-page", default_value_t = 12)]
        last_page_count: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Stamp {
            input,
            output,
            start,
            increment,
            group_size,
            last_page_count,
            overrides,
        } => cmd_stamp(
            input,
            output,
            start,
            increment,
            group_size,
            last_page_count,
            overrides,
        ),
        Commands::Preview {
            input,
            output,
            page,
            dpi,
            start,
            increment,
            group_size,
            last_page_count,
            overrides,
            calibrate,
            he_x,
            hv_x,
            y,
        } => cmd_preview(
            input,
            output,
            page,
            dpi,
            start,
            increment,
            group_size,
            last_page_count,
            overrides,
            calibrate,
            he_x,
            hv_x,
            y,
        ),
        Commands::Info {
            input,
            last_page_count,
        } => cmd_info(input, last_page_count),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Parse repeated --override flags into a calibration table.
///
/// Accepts `P{page}_R{pos}=he_x,hv_x,y` for a single coupon and
/// `R{pos}=he_x,hv_x,y` for a normalized position on every page.
fn parse_overrides(
    expressions: &[String],
    coupons: &[Coupon],
) -> Result<CalibrationTable, Error> {
    let mut table = CalibrationTable::new();

    for expr in expressions {
        let (target, values) = expr
            .split_once('=')
            .ok_or_else(|| Error::InvalidOverride(expr.clone()))?;

        let parts: Vec<&str> = values.split(',').collect();
        if parts.len() != 3 {
            return Err(Error::InvalidOverride(expr.clone()));
        }
        let mut fractions = [0.0f64; 3];
        for (slot, part) in fractions.iter_mut().zip(&parts) {
            *slot = part
                .trim()
                .parse()
                .map_err(|_| Error::InvalidOverride(expr.clone()))?;
            if *slot < 0.0 || *slot > 1.0 {
                return Err(Error::InvalidOverride(expr.clone()));
            }
        }
        let record = CoordinateRecord::new(fractions[0], fractions[1], fractions[2]);

        if let Some(pos_str) = target.trim().strip_prefix('R') {
            let position: u32 = pos_str
                .parse()
                .map_err(|_| Error::InvalidOverride(expr.clone()))?;
            if !(1..=12).contains(&position) {
                return Err(Error::InvalidOverride(expr.clone()));
            }
            table.set_for_position(position, record, coupons);
        } else {
            let key = CouponKey::parse(target.trim())?;
            table.set(key, record);
        }
    }

    Ok(table)
}

fn schedule_params(
    start: String,
    increment: u32,
    group_size: u32,
    last_page_count: u32,
) -> ScheduleParams {
    ScheduleParams {
        start_time: start,
        increment_minutes: increment,
        group_size,
        last_page_count,
    }
}

/// Schedule and stamp in one step, without rasterizing
fn cmd_stamp(
    input: PathBuf,
    output: PathBuf,
    start: String,
    increment: u32,
    group_size: u32,
    last_page_count: u32,
    overrides: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }

    let grid = GridOptions::default();
    let page_count = count_pages(&input)? as u32;
    let mut coupons = plan_coupons(page_count, &grid);
    let table = parse_overrides(&overrides, &coupons)?;

    let params = schedule_params(start, increment, group_size, last_page_count);
    let labeled = assign(&mut coupons, &params, page_count)?;
    eprintln!(
        "Scheduling {} coupons across {} pages...",
        labeled, page_count
    );

    let stamped = stamp_times(&input, &output, &coupons, &table, &StampOptions::default())?;

    eprintln!("Stamped {} coupons", stamped);
    eprintln!("Output: {}", output.display());

    Ok(())
}

/// Rasterize and write preview PNGs
#[allow(clippy::too_many_arguments)]
fn cmd_preview(
    input: PathBuf,
    output: PathBuf,
    page: Option<u32>,
    dpi: u32,
    start: String,
    increment: u32,
    group_size: u32,
    last_page_count: u32,
    overrides: Vec<String>,
    calibrate: Option<u32>,
    he_x: Option<f64>,
    hv_x: Option<f64>,
    y: Option<f64>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }

    eprintln!("Rasterizing {} at {} DPI...", input.display(), dpi);
    let mut session = Session::load(&input, dpi, GridOptions::default())?;

    let params = schedule_params(start, increment, group_size, last_page_count);
    session.apply_schedule(&params)?;

    let table = parse_overrides(&overrides, session.coupons())?;
    let keys: Vec<CouponKey> = session.coupons().iter().map(|c| c.key).collect();
    for key in keys {
        if let Some(record) = table.get(&key) {
            session.set_override(key, *record);
        }
    }

    std::fs::create_dir_all(&output)?;

    let pages: Vec<u32> = match page {
        Some(p) => vec![p],
        None => (1..=session.page_count()).collect(),
    };

    for page_num in pages {
        let (image, name) = match calibrate {
            Some(position) => {
                // Live values default to whatever is currently in effect
                let current = session.effective_coordinates_for_position(position);
                let live = CoordinateRecord::new(
                    he_x.unwrap_or(current.he_x),
                    hv_x.unwrap_or(current.hv_x),
                    y.unwrap_or(current.y),
                );
                let image = session.calibration_preview(page_num, position, &live)?;
                (image, format!("calibration_page_{page_num}.png"))
            }
            None => {
                let image = session.preview_page(page_num)?;
                (image, format!("preview_page_{page_num}.png"))
            }
        };

        let path = output.join(name);
        image.save(&path)?;
        eprintln!("Wrote {}", path.display());
    }

    Ok(())
}

/// Show page and coupon math for a PDF
fn cmd_info(input: PathBuf, last_page_count: u32) -> Result<(), Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }

    let grid = GridOptions::default();
    let page_count = count_pages(&input)? as u32;
    let per_page = grid.coupons_per_page();

    println!("File: {}", input.display());
    println!("Pages: {}", page_count);
    println!("Coupons: {}", page_count * per_page);
    println!(
        "Valid coupons (last page {}): {}",
        last_page_count,
        valid_count(page_count, per_page, last_page_count)
    );

    Ok(())
}
