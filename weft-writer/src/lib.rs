//! Materializes object graphs from weft node streams.
//!
//! An [`ObjectWriter`] accepts [`NodeEvent`]s through the
//! [`NodeWriter`](weft_core::NodeWriter) trait and executes them against a
//! [`SchemaContext`]: it constructs objects (directly, from constructor
//! arguments, positional parameters or factory methods), coerces values to
//! the types they are stored as, registers names, resolves forward references
//! once the root is complete and hands deferred member content to deferring
//! loaders.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use weft_core::{NodeEvent, SchemaContext};
//! # fn events() -> Vec<NodeEvent> { Vec::new() }
//! let schema = Arc::new(SchemaContext::new());
//! let built = weft_writer::materialize(schema, events(), Default::default())?;
//! println!("{}", built.root);
//! # Ok::<(), weft_writer::WriterError>(())
//! ```

#![deny(missing_docs, rustdoc::broken_intra_doc_links)]

mod coerce;
mod deferred;
mod engine;
mod error;
mod frame;
mod name_scope;
mod settings;
mod tracing_macros;
mod writer;

use std::sync::Arc;

use weft_core::{NodeEvent, SchemaContext, transform};

pub use coerce::coerce;
pub use error::*;
pub use name_scope::{NameResolver, NameScope, SharedNameScope};
pub use settings::*;
pub use writer::*;

/// Write `nodes` into a fresh [`ObjectWriter`], close it and return what it
/// built.
pub fn materialize(
    schema: Arc<SchemaContext>,
    nodes: impl IntoIterator<Item = NodeEvent>,
    settings: WriterSettings,
) -> Result<Materialized, WriterError> {
    let mut writer = ObjectWriter::new(schema, settings);
    transform(nodes, &mut writer)?;
    writer.finish()
}
