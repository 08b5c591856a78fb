//! Capture of member content that a deferring loader materializes later.

use std::sync::Arc;

use weft_core::{DeferringLoader, MemberRef, NodeEvent, NodeList, NodeWriter};

use crate::tracing_macros::trace;
use crate::{WriterError, WriterErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Object,
    Member,
}

/// Records the events inside a deferred member, balancing objects and
/// members, until the member itself ends.
pub(crate) struct DeferredCapture {
    loader: Arc<dyn DeferringLoader>,
    member: MemberRef,
    nodes: NodeList,
    open: Vec<Scope>,
}

impl DeferredCapture {
    /// Start capturing the content of `member`, which is already open.
    pub fn new(member: MemberRef, loader: Arc<dyn DeferringLoader>) -> Self {
        trace!(member = %member, "deferring member content");
        Self {
            loader,
            member,
            nodes: NodeList::new(),
            open: vec![Scope::Member],
        }
    }

    /// Record one event. Returns `true` once the deferred member has ended;
    /// its own `EndMember` is not recorded.
    pub fn feed(&mut self, event: NodeEvent) -> Result<bool, WriterError> {
        match &event {
            NodeEvent::StartObject(_) | NodeEvent::GetObject => self.open.push(Scope::Object),
            NodeEvent::StartMember(_) => self.open.push(Scope::Member),
            NodeEvent::EndMember => self.close_scope(Scope::Member, "EndMember")?,
            NodeEvent::EndObject => self.close_scope(Scope::Object, "EndObject")?,
            NodeEvent::Value(_) | NodeEvent::NamespaceDeclaration(_) => {}
        }
        if self.open.is_empty() {
            trace!(count = self.nodes.len(), "deferred capture complete");
            self.nodes.close().map_err(closed)?;
            return Ok(true);
        }
        self.nodes.write_node(event).map_err(closed)?;
        Ok(false)
    }

    /// Whether the innermost open scope is a member.
    pub fn in_member(&self) -> bool {
        self.open.last() == Some(&Scope::Member)
    }

    pub fn into_parts(self) -> (Arc<dyn DeferringLoader>, MemberRef, NodeList) {
        (self.loader, self.member, self.nodes)
    }

    fn close_scope(&mut self, expected: Scope, event: &'static str) -> Result<(), WriterError> {
        match self.open.pop() {
            Some(scope) if scope == expected => Ok(()),
            Some(_) => Err(WriterErrorKind::UnexpectedEvent {
                event,
                reason: "unbalanced deferred content",
            }
            .into()),
            None => Err(WriterErrorKind::UnexpectedEvent {
                event,
                reason: "deferred content already ended",
            }
            .into()),
        }
    }
}

fn closed(_: weft_core::NodeError) -> WriterError {
    WriterErrorKind::UnexpectedEvent {
        event: "capture",
        reason: "deferred content already ended",
    }
    .into()
}
