//! CLI presentation: text and json formatters per command family.

mod listing;
mod shared;
mod status;
mod transfer;

pub use listing::{format_listing_json, format_listing_text};
pub use shared::{format_bytes, format_section_heading};
pub use status::{format_status_json, format_status_text};
pub use transfer::{format_transfers_json, format_transfers_text};
