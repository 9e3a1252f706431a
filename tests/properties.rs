//! Property tests over randomly generated control-flow graphs.

use std::collections::BTreeSet;

use idemregions::prelude::*;
use proptest::prelude::*;

const REGISTERS: usize = 3;
const OBJECTS: u32 = 3;

#[derive(Debug, Clone)]
enum Op {
    Load(usize, u32),
    Store(usize, u32),
    Arith(usize, usize),
    Copy(usize, usize),
}

#[derive(Debug, Clone)]
struct Shape {
    blocks: Vec<Vec<Op>>,
    extra_edges: Vec<(usize, usize)>,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..REGISTERS, 0..OBJECTS).prop_map(|(r, o)| Op::Load(r, o)),
        (0..REGISTERS, 0..OBJECTS).prop_map(|(r, o)| Op::Store(r, o)),
        (0..REGISTERS, 0..REGISTERS).prop_map(|(d, s)| Op::Arith(d, s)),
        (0..REGISTERS, 0..REGISTERS).prop_map(|(d, s)| Op::Copy(d, s)),
    ]
}

fn shape() -> impl Strategy<Value = Shape> {
    (1..6usize).prop_flat_map(|n| {
        (
            prop::collection::vec(prop::collection::vec(op(), 1..5), n),
            prop::collection::vec((0..n, 0..n), 0..4),
        )
            .prop_map(|(blocks, extra_edges)| Shape {
                blocks,
                extra_edges,
            })
    })
}

/// Builds the function; block `i` falls through to `i + 1`, so every block is reachable.
fn build(shape: &Shape) -> Result<(Function, Vec<StorageId>)> {
    let mut b = FunctionBuilder::new("generated");
    let registers: Vec<StorageId> = (0..REGISTERS).map(|i| b.vreg(format!("r{i}"))).collect();
    let blocks: Vec<BlockId> = (0..shape.blocks.len())
        .map(|i| b.block(format!("b{i}")))
        .collect();

    let mut edges: BTreeSet<(usize, usize)> = (1..blocks.len()).map(|i| (i - 1, i)).collect();
    edges.extend(shape.extra_edges.iter().copied());

    for (index, ops) in shape.blocks.iter().enumerate() {
        b.switch_to(blocks[index]);
        for op in ops {
            match *op {
                Op::Load(r, o) => b.load_into(registers[r], Address::object(o, 0), 4),
                Op::Store(r, o) => b.store_from(registers[r], Address::object(o, 0), 4),
                Op::Arith(d, s) => b.arith("add", &[registers[d]], &[registers[s]]),
                Op::Copy(d, s) => b.copy(registers[d], registers[s]),
            };
        }
        if edges.iter().any(|&(from, _)| from == index) {
            b.branch(&[]);
        } else {
            b.ret(&registers);
        }
    }
    for &(from, to) in &edges {
        b.edge(blocks[from], blocks[to]);
    }

    Ok((b.finish()?, registers))
}

fn fail(error: Error) -> TestCaseError {
    TestCaseError::fail(error.to_string())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn boundaries_cut_every_path(shape in shape()) {
        let (function, _) = build(&shape).map_err(fail)?;
        let analysis = IdempotenceAnalysis::run(&function, &BasicAliasOracle);

        prop_assert!(analysis.boundaries().covers(analysis.paths()));
        for path in analysis.paths() {
            prop_assert_eq!(path.stores()[0], path.pair().store);
            prop_assert!(path.stores().iter().all(|&s| function[s].is_store()));
        }

        let steps = analysis.selection();
        prop_assert!(steps.iter().all(|step| step.newly_covered > 0));
        prop_assert!(steps.windows(2).all(|w| w[0].covered < w[1].covered));
        if let Some(last) = steps.last() {
            prop_assert_eq!(last.covered, analysis.paths().len());
        }
    }

    #[test]
    fn every_instruction_has_a_region(shape in shape()) {
        let (function, _) = build(&shape).map_err(fail)?;
        let boundaries = compute_boundaries(&function, &BasicAliasOracle);
        let regions = RegionModel::new(&function, &boundaries);

        for boundary in boundaries.iter() {
            prop_assert!(regions.is_region_entry(boundary));
        }
        for inst in function.instructions() {
            let containing = regions.regions_containing(inst.id());
            prop_assert!(!containing.is_empty(), "{} has no region", function.locator(inst.id()));
            if let Some(region) = regions.region_at(inst.id()) {
                prop_assert!(containing.contains(&region.id()));
            }
        }
    }

    #[test]
    fn shadows_avoid_live_ranges(shape in shape(), variable in any::<bool>()) {
        let (function, registers) = build(&shape).map_err(fail)?;
        let boundaries = compute_boundaries(&function, &BasicAliasOracle);
        let regions = RegionModel::new(&function, &boundaries);
        let live = LiveIntervals::compute(&function);
        let config = if variable {
            AnalysisConfig::variable_control_flow()
        } else {
            AnalysisConfig::default()
        };
        let mut tracker = ShadowIntervalTracker::new(&regions, &live, config);

        for &storage in &registers {
            let shadow = tracker.shadow(storage).map_err(fail)?.clone();
            if let Some(interval) = live.interval(storage) {
                for range in shadow.ranges().iter() {
                    prop_assert!(!interval.ranges().overlaps(range));
                }
            }
            let again = tracker.recompute_shadow(storage).map_err(fail)?;
            prop_assert_eq!(&shadow, again);
        }
    }

    #[test]
    fn safe_coalescing_is_sound(shape in shape()) {
        let (function, registers) = build(&shape).map_err(fail)?;
        let boundaries = compute_boundaries(&function, &BasicAliasOracle);
        let regions = RegionModel::new(&function, &boundaries);
        let live = LiveIntervals::compute(&function);
        let mut tracker = ShadowIntervalTracker::new(&regions, &live, AnalysisConfig::default());

        for &a in &registers {
            for &b in &registers {
                if a == b || !tracker.is_register_coalescing_safe(a, b).map_err(fail)? {
                    continue;
                }
                for (shadowed, writer) in [(a, b), (b, a)] {
                    let shadow = tracker.shadow(shadowed).map_err(fail)?.clone();
                    for &def in function.defs_of(writer) {
                        let inst = &function[def];
                        if inst.copy_source() == Some(shadowed) || inst.is_identity_copy() {
                            continue;
                        }
                        prop_assert!(!shadow.is_shadow_at(function.slots().def_point(def)));
                    }
                }
            }
        }
    }
}
