//! The instruction graph of one function.
//!
//! [`Function`] owns its basic blocks, instructions and storage locations for the duration of
//! an analysis. Region models, live intervals and shadow trackers only hold references into
//! it, so any mutation means building a new function and recomputing those views.

use std::{ops::Index, sync::OnceLock};

use crate::{
    ir::{Instruction, InstId, SlotIndexes, StorageId, StorageLocation},
    utils::graph::{
        algorithms::{compute_dominators, DominatorTree},
        DirectedGraph, GraphBase, NodeId, Predecessors, RootedGraph, Successors,
    },
};

/// Identifies a basic block. Blocks are the nodes of the function's control-flow graph.
pub type BlockId = NodeId;

/// A straight-line sequence of instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    pub(crate) id: BlockId,
    pub(crate) name: String,
    pub(crate) instructions: Vec<InstId>,
}

impl BasicBlock {
    /// The id of this block.
    #[must_use]
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// The block label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instructions in order.
    #[must_use]
    pub fn instructions(&self) -> &[InstId] {
        &self.instructions
    }

    /// Number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// `true` if the block has no instructions. Finished functions never contain such blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The first instruction.
    #[must_use]
    pub fn first(&self) -> Option<InstId> {
        self.instructions.first().copied()
    }

    /// The last instruction.
    #[must_use]
    pub fn last(&self) -> Option<InstId> {
        self.instructions.last().copied()
    }
}

/// A function: blocks connected by control-flow edges, plus the storage they operate on.
///
/// Built with [`FunctionBuilder`](crate::ir::FunctionBuilder). The entry block is the first
/// block created; exit blocks are the blocks without successors.
///
/// # Examples
///
/// ```rust
/// use idemregions::ir::FunctionBuilder;
///
/// let mut builder = FunctionBuilder::new("f");
/// let entry = builder.block("entry");
/// let exit = builder.block("exit");
/// builder.switch_to(entry);
/// let first = builder.branch(&[]);
/// builder.switch_to(exit);
/// let last = builder.ret(&[]);
/// builder.edge(entry, exit);
///
/// let function = builder.finish()?;
/// assert_eq!(function.exits(), &[exit]);
/// assert!(function.inst_dominates(first, last));
/// # Ok::<(), idemregions::Error>(())
/// ```
#[derive(Debug)]
pub struct Function {
    pub(crate) name: String,
    pub(crate) graph: DirectedGraph<BasicBlock>,
    pub(crate) instructions: Vec<Instruction>,
    pub(crate) storage: Vec<StorageLocation>,
    pub(crate) entry: BlockId,
    pub(crate) exits: Vec<BlockId>,
    pub(crate) defs: Vec<Vec<InstId>>,
    pub(crate) uses: Vec<Vec<InstId>>,
    pub(crate) slots: SlotIndexes,
    pub(crate) dominators: OnceLock<DominatorTree>,
}

impl Function {
    /// The function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The entry block.
    #[must_use]
    pub fn entry(&self) -> BlockId {
        self.entry
    }

    /// Blocks without successors.
    #[must_use]
    pub fn exits(&self) -> &[BlockId] {
        &self.exits
    }

    /// Number of blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns a block by id.
    #[must_use]
    pub fn block(&self, block: BlockId) -> Option<&BasicBlock> {
        self.graph.node(block)
    }

    /// All blocks in creation order, which is also layout order.
    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock> {
        self.graph.nodes().iter()
    }

    /// Number of instructions.
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Returns an instruction by id.
    #[must_use]
    pub fn instruction(&self, inst: InstId) -> Option<&Instruction> {
        self.instructions.get(inst.index())
    }

    /// All instructions in layout order.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.slots
            .layout()
            .iter()
            .map(move |&inst| &self.instructions[inst.index()])
    }

    /// Instructions of `block` in order. Empty for unknown blocks.
    pub fn block_instructions(&self, block: BlockId) -> impl Iterator<Item = &Instruction> {
        self.block(block)
            .map(BasicBlock::instructions)
            .unwrap_or_default()
            .iter()
            .map(move |&inst| &self.instructions[inst.index()])
    }

    /// All memory stores in layout order.
    pub fn stores(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions().filter(|inst| inst.is_store())
    }

    /// Returns a storage location by id.
    #[must_use]
    pub fn storage(&self, storage: StorageId) -> Option<&StorageLocation> {
        self.storage.get(storage.index())
    }

    /// All storage locations.
    #[must_use]
    pub fn storage_locations(&self) -> &[StorageLocation] {
        &self.storage
    }

    /// Instructions defining `storage`, in layout order.
    #[must_use]
    pub fn defs_of(&self, storage: StorageId) -> &[InstId] {
        self.defs
            .get(storage.index())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Instructions reading `storage`, in layout order.
    #[must_use]
    pub fn uses_of(&self, storage: StorageId) -> &[InstId] {
        self.uses
            .get(storage.index())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Program point numbering of this function.
    #[must_use]
    pub fn slots(&self) -> &SlotIndexes {
        &self.slots
    }

    /// The dominator tree of the block graph, computed on first use.
    pub fn dominators(&self) -> &DominatorTree {
        self.dominators
            .get_or_init(|| compute_dominators(&self.graph, self.entry))
    }

    /// `true` if block `a` dominates block `b`.
    #[must_use]
    pub fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        self.dominators().dominates(a, b)
    }

    /// Immediate dominator of `block`.
    #[must_use]
    pub fn immediate_dominator(&self, block: BlockId) -> Option<BlockId> {
        self.dominators().immediate_dominator(block)
    }

    /// `true` if instruction `a` dominates instruction `b`.
    ///
    /// Within one block this is program order (an instruction dominates itself); across blocks
    /// it is block dominance.
    #[must_use]
    pub fn inst_dominates(&self, a: InstId, b: InstId) -> bool {
        let (a, b) = (&self.instructions[a.index()], &self.instructions[b.index()]);
        if a.block == b.block {
            a.position <= b.position
        } else {
            self.dominates(a.block, b.block)
        }
    }

    /// A `block:offset` locator for diagnostics, with 1-based offsets.
    #[must_use]
    pub fn locator(&self, inst: InstId) -> String {
        match self.instruction(inst) {
            Some(found) => {
                let block = self.block(found.block).map_or("?", BasicBlock::name);
                format!("{}:{}", block, found.position + 1)
            }
            None => format!("?:{inst}"),
        }
    }
}

impl Index<InstId> for Function {
    type Output = Instruction;

    fn index(&self, inst: InstId) -> &Instruction {
        &self.instructions[inst.index()]
    }
}

impl GraphBase for Function {
    fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        self.graph.node_ids()
    }
}

impl Successors for Function {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.graph.successors(node)
    }
}

impl Predecessors for Function {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.graph.predecessors(node)
    }
}

impl RootedGraph for Function {
    fn entry(&self) -> NodeId {
        self.entry
    }
}
