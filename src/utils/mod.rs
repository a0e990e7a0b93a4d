//! utils

mod fluent;
mod request;
mod xml;

pub mod crypto;

pub use self::fluent::{Also, Apply};
pub use self::request::{read_body_limited, take_body, RequestExt};
pub use self::xml::XmlWriterExt;
