//! License classification and inference.
//!
//! - [`classifier`]: maps a free-text license to copyleft / other by keyword.
//! - [`inference`]: obtains a package's license: registry metadata first,
//!   then a scrape of the package's web page, then `"Unknown"`.

pub mod classifier;
pub mod inference;
