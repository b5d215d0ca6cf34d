//! Public types for the licat API.

pub mod date;
mod filter;
mod keyword;
mod license;

pub use date::{format_compact_date, parse_compact_date};
pub use filter::FilterParam;
pub use keyword::{Keyword, keyword_set};
pub use license::{License, Link, Links};
