//! Incremental healing of truncated or conversationally-wrapped JSON.
//!
//! A [`Healer`] consumes a stream of text chunks, forwards whatever is safe to
//! forward immediately, and on [`Healer::finish`] synthesizes a closing tail that
//! terminates any open string/object/array and injects any object properties a
//! configured [`SchemaNode`] marks as `required` but which never appeared.
//!
//! The healer tracks just enough structure to answer three questions per
//! character — *am I inside a string?*, *am I inside an object or array?*, and
//! *what key is currently being filled in?* — and deliberately stops short of a
//! full JSON parser or schema validator.

#![deny(unsafe_code)]

mod frame;
mod healer;
mod resolver;
mod schema;

pub use healer::{Healer, MAX_PREAMBLE};
pub use schema::SchemaNode;
