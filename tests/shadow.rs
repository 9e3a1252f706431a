//! Integration tests for shadow intervals and the coalescing-safety queries.

use idemregions::prelude::*;
use pretty_assertions::assert_eq;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn spans(shadow: &ShadowInterval) -> Vec<(usize, usize)> {
    shadow
        .ranges()
        .iter()
        .map(|r| (r.start.index(), r.end.index()))
        .collect()
}

fn p(index: usize) -> ProgramPoint {
    ProgramPoint::new(index)
}

/// Live ranges supplied by hand instead of computed from the function.
struct FixedLiveness(Vec<LiveInterval>);

impl LiveRangeOracle for FixedLiveness {
    fn interval(&self, storage: StorageId) -> Option<&LiveInterval> {
        self.0.iter().find(|interval| interval.storage() == storage)
    }
}

/// A counting loop whose store ends up as a boundary.
struct LoopFixture {
    function: Function,
    registers: Vec<StorageId>,
}

fn loop_fixture() -> Result<LoopFixture> {
    let mut b = FunctionBuilder::new("accumulate");
    let a = b.vreg("a");
    let n = b.vreg("n");
    let v = b.vreg("v");
    let c = b.vreg("c");
    let entry = b.block("entry");
    let head = b.block("head");
    let exit = b.block("exit");

    b.switch_to(entry);
    b.arith("li", &[a], &[]);
    b.arith("li", &[n], &[]);
    b.branch(&[]);
    b.switch_to(head);
    b.load_into(v, Address::object(0, 0), 4);
    b.arith("add", &[c], &[v, a]);
    b.store_from(c, Address::object(0, 0), 4);
    b.arith("sub", &[n], &[n]);
    b.branch(&[n]);
    b.switch_to(exit);
    b.ret(&[a]);

    b.edge(entry, head);
    b.edge(head, head);
    b.edge(head, exit);
    Ok(LoopFixture {
        function: b.finish()?,
        registers: vec![a, n, v, c],
    })
}

#[test]
fn test_unused_live_in_has_empty_shadow() -> Result<()> {
    init_logging();
    let mut b = FunctionBuilder::new("idle");
    let x = b.vreg("x");
    let entry = b.block("entry");
    b.switch_to(entry);
    b.arith("nop", &[], &[]); // 0,1
    b.boundary(); // 2,3
    b.arith("nop", &[], &[]); // 4,5
    b.ret(&[]); // 6,7
    let function = b.finish()?;

    let live = FixedLiveness(vec![LiveInterval::new(
        x,
        std::iter::once(p(0)..p(4)).collect(),
    )]);
    let regions = RegionModel::from_markers(&function);

    let mut tracker = ShadowIntervalTracker::new(&regions, &live, AnalysisConfig::default());
    assert!(tracker.shadow(x)?.is_empty());

    // Re-execution along any path keeps the whole second region in the shadow.
    let mut tracker =
        ShadowIntervalTracker::new(&regions, &live, AnalysisConfig::variable_control_flow());
    assert_eq!(spans(tracker.shadow(x)?), vec![(4, 8)]);
    Ok(())
}

#[test]
fn test_shadow_is_disjoint_from_live_interval() -> Result<()> {
    init_logging();
    let fx = loop_fixture()?;
    let boundaries = compute_boundaries(&fx.function, &BasicAliasOracle);
    assert_eq!(boundaries.len(), 1);

    let regions = RegionModel::new(&fx.function, &boundaries);
    let live = LiveIntervals::compute(&fx.function);

    for policy in [
        ControlFlowPolicy::InvariableControlFlow,
        ControlFlowPolicy::VariableControlFlow,
    ] {
        let mut tracker =
            ShadowIntervalTracker::new(&regions, &live, AnalysisConfig::new().with_policy(policy));
        for &storage in &fx.registers {
            let shadow = tracker.shadow(storage)?.clone();
            let Some(interval) = live.interval(storage) else {
                assert!(shadow.is_empty());
                continue;
            };
            for range in shadow.ranges().iter() {
                assert!(
                    !interval.ranges().overlaps(range),
                    "{shadow} overlaps {interval} under {policy}"
                );
            }
        }
    }
    Ok(())
}

#[test]
fn test_invariable_shadow_within_variable_shadow() -> Result<()> {
    let fx = loop_fixture()?;
    let boundaries = compute_boundaries(&fx.function, &BasicAliasOracle);
    let regions = RegionModel::new(&fx.function, &boundaries);
    let live = LiveIntervals::compute(&fx.function);

    let mut invariable = ShadowIntervalTracker::new(&regions, &live, AnalysisConfig::default());
    let mut variable =
        ShadowIntervalTracker::new(&regions, &live, AnalysisConfig::variable_control_flow());
    for &storage in &fx.registers {
        let narrow = invariable.shadow(storage)?.clone();
        let wide = variable.shadow(storage)?;
        for range in narrow.ranges().iter() {
            for index in range.start.index()..range.end.index() {
                assert!(wide.is_shadow_at(p(index)), "{narrow} not within {wide}");
            }
        }
    }
    Ok(())
}

#[test]
fn test_recompute_is_stable() -> Result<()> {
    let fx = loop_fixture()?;
    let boundaries = compute_boundaries(&fx.function, &BasicAliasOracle);
    let regions = RegionModel::new(&fx.function, &boundaries);
    let live = LiveIntervals::compute(&fx.function);
    let mut tracker = ShadowIntervalTracker::new(&regions, &live, AnalysisConfig::default());

    for &storage in &fx.registers {
        let first = tracker.shadow(storage)?.clone();
        let again = tracker.recompute_shadow(storage)?.clone();
        assert_eq!(first, again);
    }

    tracker.forget_all();
    assert!(fx.registers.iter().all(|&storage| !tracker.is_cached(storage)));
    Ok(())
}

#[test]
fn test_safe_coalescing_never_clobbers() -> Result<()> {
    init_logging();
    let fx = loop_fixture()?;
    let function = &fx.function;
    let boundaries = compute_boundaries(function, &BasicAliasOracle);
    let regions = RegionModel::new(function, &boundaries);
    let live = LiveIntervals::compute(function);
    let mut tracker = ShadowIntervalTracker::new(&regions, &live, AnalysisConfig::default());

    let mut rejected = 0;
    for &a in &fx.registers {
        for &b in &fx.registers {
            if a == b {
                continue;
            }
            if !tracker.is_register_coalescing_safe(a, b)? {
                rejected += 1;
                continue;
            }
            for (shadowed, writer) in [(a, b), (b, a)] {
                let shadow = tracker.shadow(shadowed)?.clone();
                for &def in function.defs_of(writer) {
                    let point = function.slots().def_point(def);
                    assert!(
                        !shadow.is_shadow_at(point),
                        "{} writes {writer} inside {shadow}",
                        function.locator(def)
                    );
                }
            }
        }
    }
    // `c` feeds the boundary store, so the loop's later writes may not reuse it.
    assert!(rejected > 0);
    Ok(())
}

/// x = li; boundary; use x; x = li; ret x, with `x` built by `make`.
fn redefined_live_in(
    make: impl FnOnce(&mut FunctionBuilder) -> StorageId,
) -> Result<(Function, StorageId, InstId)> {
    let mut b = FunctionBuilder::new("redefine");
    let x = make(&mut b);
    let entry = b.block("entry");
    b.switch_to(entry);
    b.arith("li", &[x], &[]); // 0,1
    b.boundary(); // 2,3
    b.arith("use", &[], &[x]); // 4,5
    let redefine = b.arith("li", &[x], &[]); // 6,7
    b.ret(&[x]); // 8,9
    Ok((b.finish()?, x, redefine))
}

#[test]
fn test_verification_reports_redefinition() -> Result<()> {
    init_logging();
    let (function, x, redefine) = redefined_live_in(|b| b.vreg("x"))?;
    let regions = RegionModel::from_markers(&function);
    let live = LiveIntervals::compute(&function);
    let mut tracker = ShadowIntervalTracker::new(&regions, &live, AnalysisConfig::verifying());

    match tracker.verify_function() {
        Err(Error::ShadowVerification {
            storage, clobber, ..
        }) => {
            assert_eq!(storage, x);
            assert_eq!(clobber, redefine);
        }
        other => panic!("expected a verification failure, got {other:?}"),
    }
    assert!(matches!(
        tracker.shadow(x),
        Err(Error::ShadowVerification { .. })
    ));
    assert!(!tracker.is_cached(x));

    let masked = tracker.with_ignore_query(
        move |inst: &Instruction| inst.id() == redefine,
        |tracker| tracker.verify_function(),
    );
    assert!(masked.is_ok());
    Ok(())
}

#[test]
fn test_protected_registers_are_not_verified() -> Result<()> {
    let (function, flags, _) =
        redefined_live_in(|b| b.preg("flags", StorageFlags::PROTECTED))?;
    let regions = RegionModel::from_markers(&function);
    let live = LiveIntervals::compute(&function);
    let mut tracker = ShadowIntervalTracker::new(&regions, &live, AnalysisConfig::verifying());

    tracker.verify_function()?;
    assert!(!tracker.shadow(flags)?.is_empty());
    Ok(())
}

#[test]
fn test_stack_slot_coalescing() -> Result<()> {
    init_logging();
    let mut b = FunctionBuilder::new("spills");
    let v = b.vreg("v");
    let w = b.vreg("w");
    let u = b.vreg("u");
    let s = b.stack_slot("s");
    let t = b.stack_slot("t");
    let idle = b.stack_slot("idle");
    let entry = b.block("entry");
    b.switch_to(entry);
    b.arith("li", &[v], &[]); // 0,1
    b.spill(s, v); // 2,3
    b.boundary(); // 4,5
    b.reload(w, s); // 6,7
    b.spill(t, w); // 8,9
    b.reload(u, t); // 10,11
    b.ret(&[u]); // 12,13
    let function = b.finish()?;

    let regions = RegionModel::from_markers(&function);
    let live = LiveIntervals::compute(&function);
    let mut tracker = ShadowIntervalTracker::new(&regions, &live, AnalysisConfig::default());

    // Slots stem from the region entry: everything after the reload is shadowed.
    assert_eq!(spans(tracker.shadow(s)?), vec![(7, 14)]);
    assert!(!tracker.is_stack_slot_coalescing_safe(s, t)?);
    assert!(tracker.is_stack_slot_coalescing_safe(s, idle)?);
    assert!(tracker.is_stack_slot_coalescing_safe(w, idle)?);

    assert!(matches!(
        tracker.is_stack_slot_coalescing_safe(v, w),
        Err(Error::StorageKindMismatch { .. })
    ));
    assert!(matches!(
        tracker.is_register_coalescing_safe(v, s),
        Err(Error::StorageKindMismatch { .. })
    ));
    Ok(())
}

#[test]
fn test_callee_saved_restore_on_any_exit() -> Result<()> {
    let mut b = FunctionBuilder::new("exits");
    let x = b.vreg("x");
    let saved = b.preg("rbx", StorageFlags::CALLEE_SAVED);
    let scratch = b.preg("rax", StorageFlags::empty());
    let slot = b.stack_slot("s");
    let entry = b.block("entry");
    let left = b.block("left");
    let right = b.block("right");

    b.switch_to(entry);
    b.arith("li", &[x], &[]); // 0,1
    b.boundary(); // 2,3
    b.branch(&[]); // 4,5
    b.switch_to(left);
    b.arith("use", &[], &[x]); // 6,7
    b.ret(&[]); // 8,9
    b.switch_to(right);
    b.ret(&[]); // 10,11

    b.edge(entry, left);
    b.edge(entry, right);
    let function = b.finish()?;

    let regions = RegionModel::from_markers(&function);
    let live = LiveIntervals::compute(&function);
    let mut tracker = ShadowIntervalTracker::new(&regions, &live, AnalysisConfig::default());

    assert_eq!(spans(tracker.shadow(x)?), vec![(7, 10)]);
    assert!(tracker.is_clobbered_by_callee_saved_restore_of(x, saved)?);
    assert!(!tracker.is_clobbered_by_callee_saved_restore_of(x, scratch)?);
    assert!(matches!(
        tracker.is_clobbered_by_callee_saved_restore_of(x, slot),
        Err(Error::StorageKindMismatch { .. })
    ));
    Ok(())
}
