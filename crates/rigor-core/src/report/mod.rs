pub mod console;
pub mod json;

pub use console::format_summary;
pub use json::{report_json, write_json};
