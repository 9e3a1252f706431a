//! Instructions and the memory accesses they perform.
//!
//! An [`Instruction`] carries both views the analyses need:
//!
//! - a memory view ([`MemoryAccess`]) for anti-dependence discovery between loads and stores,
//! - a storage view (defined and used [`StorageId`]s plus [`InstFlags`]) for live ranges,
//!   shadows and clobber queries.
//!
//! Instructions are described with [`InstructionData`] and placed into a function by the
//! [`FunctionBuilder`](crate::ir::FunctionBuilder), which assigns the owning block and the
//! position inside it.

use std::fmt;

use bitflags::bitflags;
use strum::{Display, EnumIter};

use crate::ir::{BlockId, StorageId};

define_index!(
    /// Identifies an instruction within one [`Function`](crate::ir::Function).
    ///
    /// Ids are assigned in creation order. Program order is given by
    /// [`SlotIndexes`](crate::ir::SlotIndexes), not by the id.
    InstId,
    "i"
);

/// Broad classification of an instruction's opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum OpcodeClass {
    /// Branches, calls and returns.
    #[strum(serialize = "control-flow")]
    ControlFlow,
    /// Loads, stores, spills and reloads.
    #[strum(serialize = "memory")]
    MemoryAccess,
    /// Arithmetic and logic.
    #[strum(serialize = "arith")]
    Arithmetic,
    /// Copies, markers and everything else.
    #[strum(serialize = "other")]
    Other,
}

bitflags! {
    /// Instruction properties consulted by the clobber and region queries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InstFlags: u8 {
        /// A call. Its defs are implicit and protected by the callee's entry boundary.
        const CALL = 0x01;
        /// A register copy `defs[0] <- uses[0]`.
        const COPY = 0x02;
        /// A copy whose source and destination are the same location.
        const IDENTITY_COPY = 0x04;
        /// A liveness marker ending the value of its use without computing anything.
        const KILL = 0x08;
        /// An idempotent region boundary marker.
        const BOUNDARY = 0x10;
        /// A function return.
        const RETURN = 0x20;
    }
}

/// An instruction operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    /// An immediate value.
    Const(i64),
    /// The value produced by another instruction.
    Value(InstId),
}

/// The base of an address expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressBase {
    /// An identified object (a global or a stack allocation). Distinct objects never overlap.
    Object(u32),
    /// A pointer computed by an instruction.
    Value(InstId),
    /// Nothing is known about the base.
    Unknown,
}

/// An address expression: a base plus a constant byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    /// Where the address points into.
    pub base: AddressBase,
    /// Byte offset from the base.
    pub offset: i64,
}

impl Address {
    /// An address `offset` bytes into identified object `object`.
    #[must_use]
    pub const fn object(object: u32, offset: i64) -> Self {
        Address {
            base: AddressBase::Object(object),
            offset,
        }
    }

    /// An address `offset` bytes past the pointer produced by `inst`.
    #[must_use]
    pub const fn value(inst: InstId, offset: i64) -> Self {
        Address {
            base: AddressBase::Value(inst),
            offset,
        }
    }

    /// An address about which nothing is known.
    #[must_use]
    pub const fn unknown() -> Self {
        Address {
            base: AddressBase::Unknown,
            offset: 0,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.base {
            AddressBase::Object(object) => write!(f, "obj{object}")?,
            AddressBase::Value(inst) => write!(f, "{inst}")?,
            AddressBase::Unknown => write!(f, "?")?,
        }
        if self.offset != 0 {
            write!(f, "{:+}", self.offset)?;
        }
        Ok(())
    }
}

/// The bytes `[address, address + size)` touched by an access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryLocation {
    /// Start of the accessed bytes.
    pub address: Address,
    /// Number of bytes accessed.
    pub size: u32,
}

/// Direction of a memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum AccessKind {
    /// Reads memory.
    #[strum(serialize = "load")]
    Load,
    /// Writes memory.
    #[strum(serialize = "store")]
    Store,
}

/// A memory read or write performed by an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryAccess {
    /// Read or write.
    pub kind: AccessKind,
    /// The bytes accessed.
    pub location: MemoryLocation,
}

/// Description of an instruction before it is placed into a function.
///
/// # Examples
///
/// ```rust
/// use idemregions::ir::{InstFlags, InstructionData, OpcodeClass, StorageId};
///
/// let data = InstructionData::new(OpcodeClass::Arithmetic, "add")
///     .with_defs(&[StorageId::new(0)])
///     .with_uses(&[StorageId::new(1), StorageId::new(2)]);
/// assert_eq!(data.uses.len(), 2);
/// assert_eq!(data.flags, InstFlags::empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionData {
    /// Opcode class.
    pub class: OpcodeClass,
    /// Opcode name, for diagnostics.
    pub mnemonic: String,
    /// Value operands.
    pub operands: Vec<Operand>,
    /// Memory read or written, if any.
    pub memory: Option<MemoryAccess>,
    /// Storage locations written.
    pub defs: Vec<StorageId>,
    /// Storage locations read.
    pub uses: Vec<StorageId>,
    /// Instruction properties.
    pub flags: InstFlags,
}

impl InstructionData {
    /// Creates a description with no operands, storage effects or flags.
    #[must_use]
    pub fn new(class: OpcodeClass, mnemonic: impl Into<String>) -> Self {
        InstructionData {
            class,
            mnemonic: mnemonic.into(),
            operands: Vec::new(),
            memory: None,
            defs: Vec::new(),
            uses: Vec::new(),
            flags: InstFlags::empty(),
        }
    }

    /// Sets the value operands.
    #[must_use]
    pub fn with_operands(mut self, operands: &[Operand]) -> Self {
        self.operands = operands.to_vec();
        self
    }

    /// Sets the memory access.
    #[must_use]
    pub fn with_memory(mut self, kind: AccessKind, address: Address, size: u32) -> Self {
        self.memory = Some(MemoryAccess {
            kind,
            location: MemoryLocation { address, size },
        });
        self
    }

    /// Sets the defined storage locations.
    #[must_use]
    pub fn with_defs(mut self, defs: &[StorageId]) -> Self {
        self.defs = defs.to_vec();
        self
    }

    /// Sets the used storage locations.
    #[must_use]
    pub fn with_uses(mut self, uses: &[StorageId]) -> Self {
        self.uses = uses.to_vec();
        self
    }

    /// Adds flags.
    #[must_use]
    pub fn with_flags(mut self, flags: InstFlags) -> Self {
        self.flags |= flags;
        self
    }
}

/// An instruction placed in a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub(crate) id: InstId,
    pub(crate) block: BlockId,
    pub(crate) position: usize,
    pub(crate) data: InstructionData,
}

impl Instruction {
    /// The id of this instruction.
    #[must_use]
    pub fn id(&self) -> InstId {
        self.id
    }

    /// The block containing this instruction.
    #[must_use]
    pub fn block(&self) -> BlockId {
        self.block
    }

    /// Index of this instruction within its block.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Opcode class.
    #[must_use]
    pub fn class(&self) -> OpcodeClass {
        self.data.class
    }

    /// Opcode name.
    #[must_use]
    pub fn mnemonic(&self) -> &str {
        &self.data.mnemonic
    }

    /// Value operands.
    #[must_use]
    pub fn operands(&self) -> &[Operand] {
        &self.data.operands
    }

    /// Memory access, if any.
    #[must_use]
    pub fn memory(&self) -> Option<&MemoryAccess> {
        self.data.memory.as_ref()
    }

    /// Storage locations written by this instruction.
    #[must_use]
    pub fn defs(&self) -> &[StorageId] {
        &self.data.defs
    }

    /// Storage locations read by this instruction.
    #[must_use]
    pub fn uses(&self) -> &[StorageId] {
        &self.data.uses
    }

    /// Instruction flags.
    #[must_use]
    pub fn flags(&self) -> InstFlags {
        self.data.flags
    }

    /// The location read, if this instruction is a load.
    #[must_use]
    pub fn load_location(&self) -> Option<MemoryLocation> {
        self.data
            .memory
            .filter(|access| access.kind == AccessKind::Load)
            .map(|access| access.location)
    }

    /// The location written, if this instruction is a store.
    #[must_use]
    pub fn store_location(&self) -> Option<MemoryLocation> {
        self.data
            .memory
            .filter(|access| access.kind == AccessKind::Store)
            .map(|access| access.location)
    }

    /// `true` for memory loads.
    #[must_use]
    pub fn is_load(&self) -> bool {
        self.load_location().is_some()
    }

    /// `true` for memory stores.
    #[must_use]
    pub fn is_store(&self) -> bool {
        self.store_location().is_some()
    }

    /// `true` for calls.
    #[must_use]
    pub fn is_call(&self) -> bool {
        self.data.flags.contains(InstFlags::CALL)
    }

    /// `true` for register copies.
    #[must_use]
    pub fn is_copy(&self) -> bool {
        self.data.flags.contains(InstFlags::COPY)
    }

    /// The source of a copy.
    #[must_use]
    pub fn copy_source(&self) -> Option<StorageId> {
        if self.is_copy() {
            self.data.uses.first().copied()
        } else {
            None
        }
    }

    /// `true` for copies that read and write the same location.
    #[must_use]
    pub fn is_identity_copy(&self) -> bool {
        if self.data.flags.contains(InstFlags::IDENTITY_COPY) {
            return true;
        }
        match (self.data.defs.first(), self.copy_source()) {
            (Some(&dst), Some(src)) => dst == src,
            _ => false,
        }
    }

    /// `true` for kill markers.
    #[must_use]
    pub fn is_kill(&self) -> bool {
        self.data.flags.contains(InstFlags::KILL)
    }

    /// `true` for region boundary markers.
    #[must_use]
    pub fn is_boundary(&self) -> bool {
        self.data.flags.contains(InstFlags::BOUNDARY)
    }

    /// `true` for returns.
    #[must_use]
    pub fn is_return(&self) -> bool {
        self.data.flags.contains(InstFlags::RETURN)
    }

    /// `true` if `storage` is among the defs.
    #[must_use]
    pub fn defines(&self, storage: StorageId) -> bool {
        self.data.defs.contains(&storage)
    }

    /// `true` if `storage` is among the uses.
    #[must_use]
    pub fn reads(&self, storage: StorageId) -> bool {
        self.data.uses.contains(&storage)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.id)?;
        if !self.data.defs.is_empty() {
            let defs: Vec<String> = self.data.defs.iter().map(ToString::to_string).collect();
            write!(f, "{} = ", defs.join(", "))?;
        }
        write!(f, "{}", self.data.mnemonic)?;

        let mut parts: Vec<String> = self.data.uses.iter().map(ToString::to_string).collect();
        parts.extend(self.data.operands.iter().map(|operand| match operand {
            Operand::Const(value) => format!("#{value}"),
            Operand::Value(inst) => inst.to_string(),
        }));
        if let Some(access) = &self.data.memory {
            parts.push(format!("[{}; {}]", access.location.address, access.location.size));
        }
        if !parts.is_empty() {
            write!(f, " {}", parts.join(", "))?;
        }
        Ok(())
    }
}
