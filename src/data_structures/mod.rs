//! data structures

mod ordered_headers;
mod ordered_qs;

pub use self::ordered_headers::OrderedHeaders;
pub use self::ordered_qs::OrderedQs;
