//! Incremental construction of [`Function`]s.
//!
//! The builder hands out ids immediately so that operands, addresses and edges can refer to
//! blocks and instructions before the function is complete. Validation happens once, in
//! [`FunctionBuilder::finish`].

use std::sync::OnceLock;

use crate::{
    ir::{
        AccessKind, Address, AddressBase, BasicBlock, BlockId, Function, InstFlags, InstId,
        Instruction, InstructionData, OpcodeClass, Operand, SlotIndexes, StorageFlags, StorageId,
        StorageKind, StorageLocation,
    },
    utils::graph::{DirectedGraph, Successors},
    Error, Result,
};

/// Builds a [`Function`] block by block.
///
/// Instructions are appended to the block selected with [`switch_to`](Self::switch_to). The
/// first block created is the entry block.
///
/// # Examples
///
/// ```rust
/// use idemregions::ir::{Address, FunctionBuilder};
///
/// let mut builder = FunctionBuilder::new("spill");
/// let value = builder.vreg("v");
/// let slot = builder.stack_slot("fi#0");
/// let entry = builder.block("entry");
///
/// builder.switch_to(entry);
/// builder.arith("li", &[value], &[]);
/// builder.spill(slot, value);
/// builder.ret(&[]);
///
/// let function = builder.finish()?;
/// assert_eq!(function.defs_of(slot).len(), 1);
/// # Ok::<(), idemregions::Error>(())
/// ```
#[derive(Debug)]
pub struct FunctionBuilder {
    name: String,
    blocks: Vec<(String, Vec<InstId>)>,
    instructions: Vec<(BlockId, InstructionData)>,
    storage: Vec<StorageLocation>,
    edges: Vec<(BlockId, BlockId)>,
    current: Option<BlockId>,
    pending_error: Option<Error>,
}

impl FunctionBuilder {
    /// Starts a new function.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        FunctionBuilder {
            name: name.into(),
            blocks: Vec::new(),
            instructions: Vec::new(),
            storage: Vec::new(),
            edges: Vec::new(),
            current: None,
            pending_error: None,
        }
    }

    /// Declares a storage location.
    pub fn storage(
        &mut self,
        kind: StorageKind,
        name: impl Into<String>,
        flags: StorageFlags,
    ) -> StorageId {
        let id = StorageId::new(self.storage.len());
        self.storage
            .push(StorageLocation::new(id, kind, name, flags));
        id
    }

    /// Declares a virtual register.
    pub fn vreg(&mut self, name: impl Into<String>) -> StorageId {
        self.storage(StorageKind::VirtualRegister, name, StorageFlags::empty())
    }

    /// Declares a physical register with the given flags.
    pub fn preg(&mut self, name: impl Into<String>, flags: StorageFlags) -> StorageId {
        self.storage(StorageKind::PhysicalRegister, name, flags)
    }

    /// Declares a stack slot.
    pub fn stack_slot(&mut self, name: impl Into<String>) -> StorageId {
        self.storage(StorageKind::StackSlot, name, StorageFlags::empty())
    }

    /// Creates a block. The first block created is the entry.
    pub fn block(&mut self, name: impl Into<String>) -> BlockId {
        let id = BlockId::new(self.blocks.len());
        self.blocks.push((name.into(), Vec::new()));
        id
    }

    /// Selects the block subsequent instructions are appended to.
    pub fn switch_to(&mut self, block: BlockId) {
        if block.index() >= self.blocks.len() {
            self.defer(malformed_error!("switch to unknown block {}", block));
            return;
        }
        self.current = Some(block);
    }

    /// Adds the control-flow edge `from -> to`.
    pub fn edge(&mut self, from: BlockId, to: BlockId) {
        self.edges.push((from, to));
    }

    /// Appends an instruction to the current block.
    pub fn push(&mut self, data: InstructionData) -> InstId {
        let id = InstId::new(self.instructions.len());
        let block = match self.current {
            Some(block) => block,
            None => {
                self.defer(malformed_error!("instruction {} added before any block was selected", id));
                BlockId::new(0)
            }
        };
        if let Some((_, insts)) = self.blocks.get_mut(block.index()) {
            insts.push(id);
        }
        self.instructions.push((block, data));
        id
    }

    /// Appends a load of `size` bytes from `address`.
    pub fn load(&mut self, address: Address, size: u32) -> InstId {
        self.push(
            InstructionData::new(OpcodeClass::MemoryAccess, "load").with_memory(
                AccessKind::Load,
                address,
                size,
            ),
        )
    }

    /// Appends a load of `size` bytes from `address` into `dst`.
    pub fn load_into(&mut self, dst: StorageId, address: Address, size: u32) -> InstId {
        self.push(
            InstructionData::new(OpcodeClass::MemoryAccess, "load")
                .with_memory(AccessKind::Load, address, size)
                .with_defs(&[dst]),
        )
    }

    /// Appends a store of `size` bytes to `address`.
    pub fn store(&mut self, address: Address, size: u32) -> InstId {
        self.push(
            InstructionData::new(OpcodeClass::MemoryAccess, "store").with_memory(
                AccessKind::Store,
                address,
                size,
            ),
        )
    }

    /// Appends a store of `src` (`size` bytes) to `address`.
    pub fn store_from(&mut self, src: StorageId, address: Address, size: u32) -> InstId {
        self.push(
            InstructionData::new(OpcodeClass::MemoryAccess, "store")
                .with_memory(AccessKind::Store, address, size)
                .with_uses(&[src]),
        )
    }

    /// Appends an arithmetic instruction.
    pub fn arith(&mut self, mnemonic: &str, defs: &[StorageId], uses: &[StorageId]) -> InstId {
        self.push(
            InstructionData::new(OpcodeClass::Arithmetic, mnemonic)
                .with_defs(defs)
                .with_uses(uses),
        )
    }

    /// Appends a copy `dst <- src`.
    pub fn copy(&mut self, dst: StorageId, src: StorageId) -> InstId {
        let mut flags = InstFlags::COPY;
        if dst == src {
            flags |= InstFlags::IDENTITY_COPY;
        }
        self.push(
            InstructionData::new(OpcodeClass::Other, "copy")
                .with_defs(&[dst])
                .with_uses(&[src])
                .with_flags(flags),
        )
    }

    /// Appends a call. `defs` are the registers the call clobbers or returns in.
    pub fn call(&mut self, callee: &str, defs: &[StorageId], uses: &[StorageId]) -> InstId {
        self.push(
            InstructionData::new(OpcodeClass::ControlFlow, format!("call {callee}"))
                .with_defs(defs)
                .with_uses(uses)
                .with_flags(InstFlags::CALL),
        )
    }

    /// Appends a kill marker for `storage`.
    pub fn kill(&mut self, storage: StorageId) -> InstId {
        self.push(
            InstructionData::new(OpcodeClass::Other, "kill")
                .with_uses(&[storage])
                .with_flags(InstFlags::KILL),
        )
    }

    /// Appends a region boundary marker.
    pub fn boundary(&mut self) -> InstId {
        self.push(InstructionData::new(OpcodeClass::Other, "idem").with_flags(InstFlags::BOUNDARY))
    }

    /// Appends a spill of `src` into stack slot `slot`.
    pub fn spill(&mut self, slot: StorageId, src: StorageId) -> InstId {
        self.push(
            InstructionData::new(OpcodeClass::MemoryAccess, "spill")
                .with_defs(&[slot])
                .with_uses(&[src]),
        )
    }

    /// Appends a reload of stack slot `slot` into `dst`.
    pub fn reload(&mut self, dst: StorageId, slot: StorageId) -> InstId {
        self.push(
            InstructionData::new(OpcodeClass::MemoryAccess, "reload")
                .with_defs(&[dst])
                .with_uses(&[slot]),
        )
    }

    /// Appends a branch reading `uses`.
    pub fn branch(&mut self, uses: &[StorageId]) -> InstId {
        self.push(InstructionData::new(OpcodeClass::ControlFlow, "br").with_uses(uses))
    }

    /// Appends a return reading `uses`.
    pub fn ret(&mut self, uses: &[StorageId]) -> InstId {
        self.push(
            InstructionData::new(OpcodeClass::ControlFlow, "ret")
                .with_uses(uses)
                .with_flags(InstFlags::RETURN),
        )
    }

    /// Validates the collected pieces and assembles the function.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] if the function has no blocks, a block has no
    /// instructions, an instruction refers to an unknown instruction or storage location, or
    /// an instruction was added with no block selected. Returns [`Error::GraphError`] for
    /// edges between unknown blocks.
    pub fn finish(mut self) -> Result<Function> {
        if let Some(error) = self.pending_error.take() {
            return Err(error);
        }
        if self.blocks.is_empty() {
            return Err(malformed_error!("function '{}' has no blocks", self.name));
        }
        if let Some((name, _)) = self.blocks.iter().find(|(_, insts)| insts.is_empty()) {
            return Err(malformed_error!("block '{}' has no instructions", name));
        }
        for (index, (_, data)) in self.instructions.iter().enumerate() {
            self.validate(InstId::new(index), data)?;
        }

        let mut graph = DirectedGraph::with_capacity(self.blocks.len());
        let mut instructions: Vec<Option<Instruction>> = vec![None; self.instructions.len()];
        let mut payloads: Vec<Option<InstructionData>> = self
            .instructions
            .into_iter()
            .map(|(_, data)| Some(data))
            .collect();

        for (index, (name, insts)) in self.blocks.into_iter().enumerate() {
            let block = BlockId::new(index);
            for (position, &inst) in insts.iter().enumerate() {
                if let Some(data) = payloads[inst.index()].take() {
                    instructions[inst.index()] = Some(Instruction {
                        id: inst,
                        block,
                        position,
                        data,
                    });
                }
            }
            graph.add_node(BasicBlock {
                id: block,
                name,
                instructions: insts,
            });
        }
        for (from, to) in self.edges {
            graph.add_edge(from, to)?;
        }

        let instructions: Vec<Instruction> = instructions.into_iter().flatten().collect();
        let layout: Vec<&[InstId]> = graph.nodes().iter().map(BasicBlock::instructions).collect();
        let slots = SlotIndexes::new(&layout, instructions.len());

        let mut defs = vec![Vec::new(); self.storage.len()];
        let mut uses = vec![Vec::new(); self.storage.len()];
        for &inst in slots.layout() {
            let instruction = &instructions[inst.index()];
            for storage in instruction.defs() {
                defs[storage.index()].push(inst);
            }
            for storage in instruction.uses() {
                uses[storage.index()].push(inst);
            }
        }
        for list in defs.iter_mut().chain(uses.iter_mut()) {
            list.dedup();
        }

        let exits = graph
            .nodes()
            .iter()
            .map(BasicBlock::id)
            .filter(|&block| graph.successors(block).next().is_none())
            .collect();

        Ok(Function {
            name: self.name,
            graph,
            instructions,
            storage: self.storage,
            entry: BlockId::new(0),
            exits,
            defs,
            uses,
            slots,
            dominators: OnceLock::new(),
        })
    }

    fn validate(&self, id: InstId, data: &InstructionData) -> Result<()> {
        let count = self.instructions.len();
        let operand_refs = data.operands.iter().filter_map(|operand| match operand {
            Operand::Value(inst) => Some(*inst),
            Operand::Const(_) => None,
        });
        let address_ref = data.memory.and_then(|access| match access.location.address.base {
            AddressBase::Value(inst) => Some(inst),
            _ => None,
        });
        if let Some(bad) = operand_refs.chain(address_ref).find(|inst| inst.index() >= count) {
            return Err(malformed_error!("{} refers to unknown instruction {}", id, bad));
        }
        if let Some(bad) = data
            .defs
            .iter()
            .chain(&data.uses)
            .find(|storage| storage.index() >= self.storage.len())
        {
            return Err(malformed_error!("{} refers to unknown storage {}", id, bad));
        }
        Ok(())
    }

    fn defer(&mut self, error: Error) {
        if self.pending_error.is_none() {
            self.pending_error = Some(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_function() {
        let result = FunctionBuilder::new("f").finish();
        assert!(matches!(result, Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_rejects_empty_block() {
        let mut b = FunctionBuilder::new("f");
        let entry = b.block("entry");
        b.block("hollow");
        b.switch_to(entry);
        b.ret(&[]);
        match b.finish() {
            Err(Error::Malformed { message, .. }) => assert!(message.contains("hollow")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_rejects_instruction_without_block() {
        let mut b = FunctionBuilder::new("f");
        b.ret(&[]);
        b.block("entry");
        assert!(matches!(b.finish(), Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_rejects_bad_edge() {
        let mut b = FunctionBuilder::new("f");
        let entry = b.block("entry");
        b.switch_to(entry);
        b.ret(&[]);
        b.edge(entry, BlockId::new(3));
        assert!(matches!(b.finish(), Err(Error::GraphError(_))));
    }

    #[test]
    fn test_rejects_unknown_operand() {
        let mut b = FunctionBuilder::new("f");
        let entry = b.block("entry");
        b.switch_to(entry);
        b.push(
            InstructionData::new(OpcodeClass::Arithmetic, "neg")
                .with_operands(&[Operand::Value(InstId::new(40))]),
        );
        assert!(matches!(b.finish(), Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_interleaved_blocks_are_laid_out_by_block() -> Result<()> {
        let mut b = FunctionBuilder::new("f");
        let entry = b.block("entry");
        let exit = b.block("exit");
        b.switch_to(exit);
        let late = b.ret(&[]);
        b.switch_to(entry);
        let early = b.branch(&[]);
        b.edge(entry, exit);
        let f = b.finish()?;

        assert_eq!(f.slots().layout(), &[early, late]);
        assert_eq!(f[late].block(), exit);
        assert_eq!(f[early].position(), 0);
        assert_eq!(f.exits(), &[exit]);
        Ok(())
    }

    #[test]
    fn test_identity_copy_flagged() -> Result<()> {
        let mut b = FunctionBuilder::new("f");
        let r = b.vreg("r");
        let entry = b.block("entry");
        b.switch_to(entry);
        let copy = b.copy(r, r);
        b.ret(&[r]);
        let f = b.finish()?;
        assert!(f[copy].is_identity_copy());
        assert!(f[copy].flags().contains(InstFlags::IDENTITY_COPY));
        Ok(())
    }
}
