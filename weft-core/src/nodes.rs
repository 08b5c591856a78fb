//! Node streams: the events describing how to build an object graph.

use std::fmt;

use crate::tracing_macros::trace;
use crate::{MemberRef, NodeError, TypeRef, Value};

/// A `prefix` ↔ namespace binding declared in the stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespaceDeclaration {
    /// The prefix; empty for the default namespace.
    pub prefix: String,
    /// The namespace URI.
    pub namespace: String,
}

impl NamespaceDeclaration {
    /// Bind `prefix` to `namespace`.
    pub fn new(prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            namespace: namespace.into(),
        }
    }
}

/// One event of a node stream.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeEvent {
    /// Begin constructing an object of the given type.
    StartObject(TypeRef),
    /// Continue with the existing value of the open member as the current
    /// object.
    GetObject,
    /// Open a member of the current object.
    StartMember(MemberRef),
    /// A value for the open member.
    Value(Value),
    /// Close the open member.
    EndMember,
    /// Close the current object.
    EndObject,
    /// Bind a namespace prefix.
    NamespaceDeclaration(NamespaceDeclaration),
}

impl fmt::Display for NodeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeEvent::StartObject(ty) => write!(f, "StartObject({ty})"),
            NodeEvent::GetObject => f.write_str("GetObject"),
            NodeEvent::StartMember(member) => write!(f, "StartMember({member})"),
            NodeEvent::Value(value) => write!(f, "Value({value})"),
            NodeEvent::EndMember => f.write_str("EndMember"),
            NodeEvent::EndObject => f.write_str("EndObject"),
            NodeEvent::NamespaceDeclaration(ns) => {
                write!(f, "NamespaceDeclaration({}={})", ns.prefix, ns.namespace)
            }
        }
    }
}

/// A sink for node streams.
pub trait NodeWriter {
    /// Error raised when an event can't be accepted.
    type Error;

    /// Begin constructing an object of type `ty`.
    fn write_start_object(&mut self, ty: TypeRef) -> Result<(), Self::Error>;

    /// Make the existing value of the open member the current object.
    fn write_get_object(&mut self) -> Result<(), Self::Error>;

    /// Open `member` on the current object.
    fn write_start_member(&mut self, member: MemberRef) -> Result<(), Self::Error>;

    /// Supply a value.
    fn write_value(&mut self, value: Value) -> Result<(), Self::Error>;

    /// Close the open member.
    fn write_end_member(&mut self) -> Result<(), Self::Error>;

    /// Close the current object.
    fn write_end_object(&mut self) -> Result<(), Self::Error>;

    /// Bind a namespace prefix.
    fn write_namespace(&mut self, decl: NamespaceDeclaration) -> Result<(), Self::Error>;

    /// Finish writing.
    fn close(&mut self) -> Result<(), Self::Error>;

    /// Dispatch a single event to the matching method.
    fn write_node(&mut self, node: NodeEvent) -> Result<(), Self::Error> {
        match node {
            NodeEvent::StartObject(ty) => self.write_start_object(ty),
            NodeEvent::GetObject => self.write_get_object(),
            NodeEvent::StartMember(member) => self.write_start_member(member),
            NodeEvent::Value(value) => self.write_value(value),
            NodeEvent::EndMember => self.write_end_member(),
            NodeEvent::EndObject => self.write_end_object(),
            NodeEvent::NamespaceDeclaration(decl) => self.write_namespace(decl),
        }
    }
}

/// A recorded node stream that can be replayed any number of times.
///
/// Written through its [`NodeWriter`] implementation, then closed; only a
/// closed list hands out readers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeList {
    nodes: Vec<NodeEvent>,
    closed: bool,
}

impl NodeList {
    /// An empty, open list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the list has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// A fresh cursor over the recorded events.
    pub fn reader(&self) -> Result<NodeReader<'_>, NodeError> {
        if !self.closed {
            return Err(NodeError::NotClosed);
        }
        Ok(NodeReader {
            nodes: self.nodes.iter(),
        })
    }

    fn push(&mut self, node: NodeEvent) -> Result<(), NodeError> {
        if self.closed {
            return Err(NodeError::Closed);
        }
        self.nodes.push(node);
        Ok(())
    }
}

impl FromIterator<NodeEvent> for NodeList {
    /// Collect events into a closed list.
    fn from_iter<I: IntoIterator<Item = NodeEvent>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
            closed: true,
        }
    }
}

impl NodeWriter for NodeList {
    type Error = NodeError;

    fn write_start_object(&mut self, ty: TypeRef) -> Result<(), NodeError> {
        self.push(NodeEvent::StartObject(ty))
    }

    fn write_get_object(&mut self) -> Result<(), NodeError> {
        self.push(NodeEvent::GetObject)
    }

    fn write_start_member(&mut self, member: MemberRef) -> Result<(), NodeError> {
        self.push(NodeEvent::StartMember(member))
    }

    fn write_value(&mut self, value: Value) -> Result<(), NodeError> {
        self.push(NodeEvent::Value(value))
    }

    fn write_end_member(&mut self) -> Result<(), NodeError> {
        self.push(NodeEvent::EndMember)
    }

    fn write_end_object(&mut self) -> Result<(), NodeError> {
        self.push(NodeEvent::EndObject)
    }

    fn write_namespace(&mut self, decl: NamespaceDeclaration) -> Result<(), NodeError> {
        self.push(NodeEvent::NamespaceDeclaration(decl))
    }

    fn close(&mut self) -> Result<(), NodeError> {
        self.closed = true;
        Ok(())
    }
}

/// Cursor over a closed [`NodeList`].
#[derive(Clone, Debug)]
pub struct NodeReader<'a> {
    nodes: std::slice::Iter<'a, NodeEvent>,
}

impl Iterator for NodeReader<'_> {
    type Item = NodeEvent;

    fn next(&mut self) -> Option<NodeEvent> {
        self.nodes.next().cloned()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.nodes.size_hint()
    }
}

impl ExactSizeIterator for NodeReader<'_> {}

/// Write every event of `nodes` into `writer`, then close it.
pub fn transform<W>(nodes: impl IntoIterator<Item = NodeEvent>, writer: &mut W) -> Result<(), W::Error>
where
    W: NodeWriter + ?Sized,
{
    for node in nodes {
        trace!(%node, "transform");
        writer.write_node(node)?;
    }
    writer.close()
}
