//! Storage locations: the registers and stack slots values live in.

use std::fmt;

use bitflags::bitflags;
use strum::{Display, EnumIter};

define_index!(
    /// Identifies a storage location within one [`Function`](crate::ir::Function).
    StorageId,
    "%"
);

/// What kind of storage a location is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum StorageKind {
    /// A virtual register, not yet assigned to hardware.
    #[strum(serialize = "vreg")]
    VirtualRegister,
    /// A hardware register.
    #[strum(serialize = "preg")]
    PhysicalRegister,
    /// A slot in the stack frame.
    #[strum(serialize = "slot")]
    StackSlot,
}

bitflags! {
    /// Properties of a storage location that the shadow analysis cares about.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StorageFlags: u8 {
        /// Preserved across calls and restored on function exit.
        const CALLEE_SAVED = 0x01;
        /// Redefined freely by the machine (stack pointer, condition codes); never verified.
        const PROTECTED = 0x02;
    }
}

/// A register or stack slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocation {
    id: StorageId,
    kind: StorageKind,
    name: String,
    flags: StorageFlags,
}

impl StorageLocation {
    /// Creates a storage location.
    #[must_use]
    pub fn new(id: StorageId, kind: StorageKind, name: impl Into<String>, flags: StorageFlags) -> Self {
        StorageLocation {
            id,
            kind,
            name: name.into(),
            flags,
        }
    }

    /// The id of this location.
    #[must_use]
    pub fn id(&self) -> StorageId {
        self.id
    }

    /// The kind of this location.
    #[must_use]
    pub fn kind(&self) -> StorageKind {
        self.kind
    }

    /// Human readable name, used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The property flags of this location.
    #[must_use]
    pub fn flags(&self) -> StorageFlags {
        self.flags
    }

    /// `true` for stack slots.
    #[must_use]
    pub fn is_stack_slot(&self) -> bool {
        self.kind == StorageKind::StackSlot
    }

    /// `true` for virtual and physical registers.
    #[must_use]
    pub fn is_register(&self) -> bool {
        !self.is_stack_slot()
    }

    /// `true` if the location is callee-saved.
    #[must_use]
    pub fn is_callee_saved(&self) -> bool {
        self.flags.contains(StorageFlags::CALLEE_SAVED)
    }

    /// `true` if the location is exempt from verification.
    #[must_use]
    pub fn is_protected(&self) -> bool {
        self.flags.contains(StorageFlags::PROTECTED)
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
