//! Shared fixtures for unit tests.
//!
//! Each factory returns the finished function together with the ids a test needs to refer
//! to, so tests read as assertions about named blocks and instructions.

use crate::{
    ir::{Address, BlockId, Function, FunctionBuilder, InstId},
    Result,
};

/// `entry -> {left, right} -> join`, with a load of `obj0` in `entry` and a store to it in
/// `join`.
pub struct Diamond {
    pub function: Function,
    pub entry: BlockId,
    pub left: BlockId,
    pub right: BlockId,
    pub join: BlockId,
    pub load: InstId,
    pub store: InstId,
}

pub fn diamond() -> Result<Diamond> {
    let mut b = FunctionBuilder::new("diamond");
    let entry = b.block("entry");
    let left = b.block("left");
    let right = b.block("right");
    let join = b.block("join");

    b.switch_to(entry);
    let load = b.load(Address::object(0, 0), 4);
    b.branch(&[]);
    b.switch_to(left);
    b.arith("nop", &[], &[]);
    b.branch(&[]);
    b.switch_to(right);
    b.arith("nop", &[], &[]);
    b.branch(&[]);
    b.switch_to(join);
    let store = b.store(Address::object(0, 0), 4);
    b.ret(&[]);

    b.edge(entry, left);
    b.edge(entry, right);
    b.edge(left, join);
    b.edge(right, join);

    Ok(Diamond {
        function: b.finish()?,
        entry,
        left,
        right,
        join,
        load,
        store,
    })
}

/// `entry -> header <-> body`, `header -> exit`. The body loads `obj0[0]` and then stores to
/// it, so the store reaches the load around the back edge as well as within the block.
pub struct Loop {
    pub function: Function,
    pub entry: BlockId,
    pub header: BlockId,
    pub body: BlockId,
    pub exit: BlockId,
    pub load: InstId,
    pub store: InstId,
}

pub fn counted_loop() -> Result<Loop> {
    let mut b = FunctionBuilder::new("loop");
    let entry = b.block("entry");
    let header = b.block("header");
    let body = b.block("body");
    let exit = b.block("exit");

    b.switch_to(entry);
    b.branch(&[]);
    b.switch_to(header);
    b.branch(&[]);
    b.switch_to(body);
    let load = b.load(Address::object(0, 0), 4);
    b.arith("add", &[], &[]);
    let store = b.store(Address::object(0, 0), 4);
    b.branch(&[]);
    b.switch_to(exit);
    b.ret(&[]);

    b.edge(entry, header);
    b.edge(header, body);
    b.edge(body, header);
    b.edge(header, exit);

    Ok(Loop {
        function: b.finish()?,
        entry,
        header,
        body,
        exit,
        load,
        store,
    })
}
