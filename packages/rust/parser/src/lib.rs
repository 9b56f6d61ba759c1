//! Streaming XML → domain-model mapper for vendor product catalogs.
//!
//! The vendor format is shallow and context-dependent (a generic `node`
//! tag typed via attribute, flat child tags reused across group and
//! article contexts), so it cannot be mapped with a schema-driven
//! deserializer. Instead a depth-tracking state machine consumes
//! open/text/close events from a quick-xml tokenizer and builds nested
//! domain objects incrementally, without materializing a document tree.
//!
//! Entry points: [`parse_file`] and [`parse_str`], both yielding a
//! [`catfeed_shared::Catalog`].

mod driver;
mod mapper;
mod state;

pub use driver::{parse_file, parse_str};
