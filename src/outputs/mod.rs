//! Output generation for the rendered feed.
//!
//! # Submodules
//!
//! - [`markdown`]: Renders the grouped feed as Markdown for the terminal and
//!   for the Markdown output directory
//! - [`json`]: Writes grouped-feed snapshots for API consumption
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! ├── 2025-05-06/
//! │   ├── morning.json
//! │   └── evening.json
//!
//! markdown_output_dir/
//! ├── 2025-05-06_morning.md
//! └── 2025-05-06_evening.md
//! ```

pub mod json;
pub mod markdown;
