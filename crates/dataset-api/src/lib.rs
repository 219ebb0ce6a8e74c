//! Client side of the glyph dataset inspection service.

pub mod client;
pub mod decode;
pub mod error;
pub mod routes;
pub mod schema;

pub use client::*;
pub use decode::*;
pub use error::*;
pub use schema::*;
