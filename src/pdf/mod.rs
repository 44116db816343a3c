//! PDF document access and stamping

pub mod meta;
pub mod stamp;

// Re-export commonly used items
pub use meta::{count_pages, page_size};
pub use stamp::{stamp_times, StampOptions};
