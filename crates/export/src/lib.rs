// ABOUTME: Feed serialization library for blogport.
// ABOUTME: Writes extracted posts as WXR, JSON, CSV and link dumps, and parses raw post dates.

pub mod csv_export;
pub mod error;
pub mod json;
pub mod links;
pub mod options;
pub mod time_parse;
pub mod urls;
pub mod wxr;

pub use csv_export::{to_csv, write_csv, CSV_HEADER};
pub use error::ExportError;
pub use json::{to_json, to_json_at, write_json, JsonExport, JsonPost};
pub use links::{analyze_links, link_dump, write_link_dump, HostCount, LinkAnalysis, PostLinks};
pub use options::{exportable, ExportOptions};
pub use time_parse::{format_rfc2822, format_wp_date, parse_flexible_time, post_date_or};
pub use urls::{absolutize_links, base_domain, relativize_links, slug_from_url, slugify};
pub use wxr::{attachment_id, derive_id, to_wxr, to_wxr_at, write_wxr, WXR_VERSION};
