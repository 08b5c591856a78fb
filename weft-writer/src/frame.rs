//! Frames tracking the objects and members under construction.

use weft_core::{MemberRef, TypeRef, Value};

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub(crate) struct FrameFlags: u8 {
        /// `value` holds a real instance
        const INSTANTIATED = 1 << 0;
        /// The engine created the instance (not adopted, not retrieved)
        const ENGINE_CREATED = 1 << 1;
        /// Opened by `StartObject`, so lifecycle notifications apply
        const STARTED = 1 << 2;
        /// `before_properties` has fired
        const PROPERTIES_BEGUN = 1 << 3;
        /// Begin-init ran and end-init is owed
        const INITIALIZING = 1 << 4;
    }
}

/// What an object frame currently holds.
#[derive(Debug, Clone, Default)]
pub(crate) enum FrameValue {
    /// Nothing yet.
    #[default]
    Empty,
    /// The instance, or the frame's whole value.
    Instance(Value),
    /// Collecting positional or factory arguments. `saved` is restored when
    /// the argument member ends.
    Arguments {
        saved: Box<FrameValue>,
        args: Vec<Value>,
    },
}

impl FrameValue {
    /// The instance, if the frame holds one.
    pub fn instance(&self) -> Option<&Value> {
        match self {
            FrameValue::Instance(value) => Some(value),
            _ => None,
        }
    }
}

/// The member currently open on an object frame.
#[derive(Debug, Clone)]
pub(crate) struct MemberFrame {
    pub member: MemberRef,
    /// The value collected so far.
    pub value: Option<Value>,
    /// A forward reference was written and will be resolved later.
    pub fixup_pending: bool,
}

impl MemberFrame {
    pub fn new(member: MemberRef) -> Self {
        Self {
            member,
            value: None,
            fixup_pending: false,
        }
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some() || self.fixup_pending
    }
}

/// One object under construction.
#[derive(Debug, Clone)]
pub(crate) struct ObjectFrame {
    pub ty: TypeRef,
    pub value: FrameValue,
    pub flags: FrameFlags,
    pub factory_method: Option<String>,
    pub key: Option<Value>,
    /// Members applied before the instance existed, in write order.
    pub written: Vec<(MemberRef, Value)>,
    /// Every member started on this object, for duplicate detection.
    pub seen: Vec<MemberRef>,
    /// A name waiting for the instance to exist before registration.
    pub pending_name: Option<String>,
    /// Fix-ups recorded before the instance existed, by index.
    pub pending_fixups: Vec<usize>,
    pub member: Option<MemberFrame>,
}

impl ObjectFrame {
    pub fn new(ty: TypeRef, flags: FrameFlags) -> Self {
        Self {
            ty,
            value: FrameValue::Empty,
            flags,
            factory_method: None,
            key: None,
            written: Vec::new(),
            seen: Vec::new(),
            pending_name: None,
            pending_fixups: Vec::new(),
            member: None,
        }
    }

    pub fn is_instantiated(&self) -> bool {
        self.flags.contains(FrameFlags::INSTANTIATED)
    }

    /// The instance, or null when there is none yet.
    pub fn instance(&self) -> Value {
        self.value.instance().cloned().unwrap_or_default()
    }

    /// Store the frame's instance.
    pub fn set_instance(&mut self, value: Value) {
        self.value = FrameValue::Instance(value);
        self.flags |= FrameFlags::INSTANTIATED;
    }
}
