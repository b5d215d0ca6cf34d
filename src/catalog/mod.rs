//! Remote catalog access.
//!
//! [`CatalogReader`] issues the listing requests. [`JsonArrayDecoder`] is the
//! incremental splitter behind the streaming tier.

mod decode;
mod reader;

pub use decode::JsonArrayDecoder;
pub use reader::{CatalogReader, LicenseStream};
