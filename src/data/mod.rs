//! Input data: CSV loading and synthetic series.

mod loader;
mod synthetic;

pub use loader::{detect_layout, load_csv, parse_month, parse_number, read_csv, Layout, LoadOptions};
pub use synthetic::{synthetic_retail, RETAIL_SEASONALITY};
