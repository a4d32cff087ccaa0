//! Markdown rendering for ReviewCrew.
//!
//! Two directions live here:
//! - [`render_table`] turns a review [`Table`](reviewcrew_shared::Table) into a
//!   Markdown table for the analyzer's report.
//! - [`page_to_markdown`] turns a scraped HTML page into clean Markdown for the
//!   collector agent to read, using `htmd` plus a cleanup pipeline.

mod cleanup;
mod page;
mod table;

pub use page::{PageContent, page_to_markdown};
pub use table::render_table;
