//! The instruction graph analysed by every stage of the crate.
//!
//! - [`Function`] - blocks, control-flow edges, dominance, def/use index
//! - [`Instruction`] / [`InstructionData`] - opcode class, operands, memory access, storage effects
//! - [`StorageLocation`] - virtual registers, physical registers and stack slots
//! - [`SlotIndexes`] / [`ProgramPoint`] - linear program order for interval algebra
//! - [`FunctionBuilder`] - validated construction

mod builder;
mod function;
mod instruction;
mod slots;
mod storage;

pub use builder::FunctionBuilder;
pub use function::{BasicBlock, BlockId, Function};
pub use instruction::{
    AccessKind, Address, AddressBase, InstFlags, InstId, Instruction, InstructionData,
    MemoryAccess, MemoryLocation, OpcodeClass, Operand,
};
pub use slots::{ProgramPoint, SlotIndexes};
pub use storage::{StorageFlags, StorageId, StorageKind, StorageLocation};
