//! Building blocks for materializing object graphs from node streams.
//!
//! This crate holds everything a node stream talks about, but not the engine
//! that executes one (that lives in `weft-writer`):
//!
//! - [`TypeDesc`] / [`MemberDesc`]: what the engine knows about types and
//!   members, registered in a [`SchemaContext`]
//! - [`Value`] and the [`Graph`] arena that owns materialized objects
//! - [`Invoker`]: how instances are created, read, written and populated
//! - [`ValueConverter`], [`MarkupExtension`] and [`DeferringLoader`]: the
//!   pluggable capabilities, each run against a [`ServiceContext`]
//! - [`NodeEvent`], [`NodeWriter`] and the replayable [`NodeList`]

#![deny(missing_docs, rustdoc::broken_intra_doc_links)]

mod context;
mod convert;
mod error;
mod graph;
mod invoker;
pub mod language;
mod markup;
mod nodes;
mod schema;
mod tracing_macros;
mod types;
mod value;

pub use context::*;
pub use convert::*;
pub use error::*;
pub use graph::*;
pub use invoker::*;
pub use markup::*;
pub use nodes::*;
pub use schema::*;
pub use types::*;
pub use value::*;
