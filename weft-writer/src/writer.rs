//! The node writer that materializes what it is fed.

use std::fmt;
use std::sync::Arc;

use weft_core::{
    Graph, MemberRef, NamespaceDeclaration, NodeEvent, NodeWriter, SchemaContext, TypeRef, Value,
};

use crate::deferred::DeferredCapture;
use crate::engine::Engine;
use crate::tracing_macros::debug;
use crate::{SharedNameScope, WriterError, WriterErrorKind, WriterSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    Closed,
    Failed,
}

/// A [`NodeWriter`] that builds an object graph from the events written to
/// it.
///
/// The first error poisons the writer: every later write fails with
/// [`WriterErrorKind::Aborted`] and closing does nothing.
pub struct ObjectWriter {
    engine: Engine,
    capture: Option<DeferredCapture>,
    state: State,
}

/// The outcome of a completed build.
#[derive(Debug)]
pub struct Materialized {
    /// Arena holding every object created by the build.
    pub graph: Graph,
    /// The root object, as provided (markup extensions already evaluated).
    pub root: Value,
    /// Scope holding the names registered by the build.
    pub names: SharedNameScope,
}

fn event_name(event: &NodeEvent) -> &'static str {
    match event {
        NodeEvent::StartObject(_) => "StartObject",
        NodeEvent::GetObject => "GetObject",
        NodeEvent::StartMember(_) => "StartMember",
        NodeEvent::Value(_) => "Value",
        NodeEvent::EndMember => "EndMember",
        NodeEvent::EndObject => "EndObject",
        NodeEvent::NamespaceDeclaration(_) => "NamespaceDeclaration",
    }
}

impl ObjectWriter {
    /// Create a writer resolving types against `schema`.
    pub fn new(schema: Arc<SchemaContext>, settings: WriterSettings) -> Self {
        debug!(?settings, "creating object writer");
        Self {
            engine: Engine::new(schema, settings),
            capture: None,
            state: State::Open,
        }
    }

    /// The root object, once it is complete. A failed build has none.
    pub fn result(&self) -> Option<&Value> {
        match self.state {
            State::Failed => None,
            State::Open | State::Closed => self.engine.result(),
        }
    }

    /// The graph built so far.
    pub fn graph(&self) -> &Graph {
        self.engine.graph()
    }

    /// The scope names are registered into.
    pub fn root_name_scope(&self) -> &SharedNameScope {
        self.engine.scope()
    }

    /// Whether [`close`](NodeWriter::close) has completed.
    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }

    /// Close the writer and hand out what it built.
    pub fn finish(mut self) -> Result<Materialized, WriterError> {
        if self.state == State::Failed {
            return Err(WriterErrorKind::Aborted.into());
        }
        self.close()?;
        let (graph, root, names) = self.engine.into_parts();
        let root = root.ok_or(WriterErrorKind::UnexpectedEvent {
            event: "close",
            reason: "no root object was written",
        })?;
        Ok(Materialized { graph, root, names })
    }

    fn dispatch(&mut self, event: NodeEvent) -> Result<(), WriterError> {
        match self.state {
            State::Open => {}
            State::Failed => return Err(WriterErrorKind::Aborted.into()),
            State::Closed => {
                return Err(WriterErrorKind::UnexpectedEvent {
                    event: event_name(&event),
                    reason: "the writer is closed",
                }
                .into());
            }
        }
        let result = self.route(event);
        if let Err(_error) = &result {
            debug!(error = %_error, "materialization failed");
            self.state = State::Failed;
        }
        result
    }

    fn route(&mut self, event: NodeEvent) -> Result<(), WriterError> {
        if let Some(capture) = self.capture.as_mut() {
            if !capture.feed(event)? {
                return Ok(());
            }
            return self.load_deferred();
        }

        match event {
            NodeEvent::StartObject(ty) => self.engine.start_object(ty),
            NodeEvent::GetObject => self.engine.get_object(),
            NodeEvent::StartMember(member) => {
                self.engine.start_member(member.clone())?;
                if let Some(loader) = member.deferring_loader() {
                    self.capture = Some(DeferredCapture::new(member.clone(), loader.clone()));
                }
                Ok(())
            }
            NodeEvent::Value(value) => self.engine.value(value),
            NodeEvent::EndMember => self.engine.end_member(),
            NodeEvent::EndObject => self.engine.end_object(),
            NodeEvent::NamespaceDeclaration(decl) => {
                self.engine.namespace(decl);
                Ok(())
            }
        }
    }

    fn load_deferred(&mut self) -> Result<(), WriterError> {
        let Some(capture) = self.capture.take() else {
            return Ok(());
        };
        let (loader, member, nodes) = capture.into_parts();
        let value = loader
            .load(nodes, self.engine.services_mut())
            .map_err(|source| WriterErrorKind::DeferredLoad {
                member: member.to_string(),
                source,
            })?;
        self.engine.store_deferred(value)?;
        self.engine.end_member()
    }

    /// End every open member and object, innermost first.
    fn unwind(&mut self) -> Result<(), WriterError> {
        loop {
            if let Some(capture) = &self.capture {
                let event = if capture.in_member() {
                    NodeEvent::EndMember
                } else {
                    NodeEvent::EndObject
                };
                self.route(event)?;
            } else if self.engine.has_open_member() {
                self.engine.end_member()?;
            } else if self.engine.depth() > 0 {
                self.engine.end_object()?;
            } else {
                return Ok(());
            }
        }
    }
}

impl fmt::Debug for ObjectWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectWriter")
            .field("state", &self.state)
            .field("depth", &self.engine.depth())
            .field("capturing", &self.capture.is_some())
            .field("result", &self.engine.result())
            .finish_non_exhaustive()
    }
}

impl NodeWriter for ObjectWriter {
    type Error = WriterError;

    fn write_start_object(&mut self, ty: TypeRef) -> Result<(), WriterError> {
        self.dispatch(NodeEvent::StartObject(ty))
    }

    fn write_get_object(&mut self) -> Result<(), WriterError> {
        self.dispatch(NodeEvent::GetObject)
    }

    fn write_start_member(&mut self, member: MemberRef) -> Result<(), WriterError> {
        self.dispatch(NodeEvent::StartMember(member))
    }

    fn write_value(&mut self, value: Value) -> Result<(), WriterError> {
        self.dispatch(NodeEvent::Value(value))
    }

    fn write_end_member(&mut self) -> Result<(), WriterError> {
        self.dispatch(NodeEvent::EndMember)
    }

    fn write_end_object(&mut self) -> Result<(), WriterError> {
        self.dispatch(NodeEvent::EndObject)
    }

    fn write_namespace(&mut self, decl: NamespaceDeclaration) -> Result<(), WriterError> {
        self.dispatch(NodeEvent::NamespaceDeclaration(decl))
    }

    /// End whatever is still open, then close. Closing again does nothing,
    /// and neither does closing a failed writer.
    fn close(&mut self) -> Result<(), WriterError> {
        if self.state != State::Open {
            return Ok(());
        }
        let result = self.unwind();
        self.state = match result {
            Ok(()) => State::Closed,
            Err(_) => State::Failed,
        };
        result
    }
}
