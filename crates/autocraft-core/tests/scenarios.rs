//! End-to-end resolution scenarios.
//!
//! Covers the accounting identity over generated pattern graphs, full
//! satisfaction of acyclic graphs, cycle breaking, registration-order
//! tie-breaks, depth-first sibling order, budgets, and fuzzy lookup.

#![allow(
    clippy::unwrap_used,
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing
)]

use autocraft_core::{
    CraftingEnv, Interruption, ResolutionNode, ResolverConfig, Resolver, RunBudget,
    UnsatisfiedReason,
};
use autocraft_types::{FuzzyMode, Pattern, PatternId, ResourceKey, ResourceStack};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

// =============================================================================
// Helpers
// =============================================================================

fn key(id: &str) -> ResourceKey {
    ResourceKey::item(id)
}

fn stack(id: &str, amount: i64) -> ResourceStack {
    ResourceStack::new(key(id), amount)
}

fn add(env: &mut CraftingEnv, inputs: &[(&str, i64)], output: (&str, i64)) -> PatternId {
    let pattern = Pattern::new(
        inputs.iter().map(|(id, n)| stack(id, *n)).collect(),
        vec![stack(output.0, output.1)],
    )
    .unwrap();
    env.add_pattern(pattern).unwrap()
}

fn stock(env: &mut CraftingEnv, id: &str, amount: i64) {
    env.add_stored(&stack(id, amount)).unwrap();
}

fn unlimited() -> ResolverConfig {
    ResolverConfig {
        max_iterations: u64::MAX,
        max_duration_ms: 0,
        ..ResolverConfig::default()
    }
}

fn name(i: usize) -> String {
    format!("k{i}")
}

/// A random pattern graph over `keys` keys. When `acyclic`, patterns for
/// key `i` only consume keys `j > i`, and the last two keys are raw
/// materials with unlimited supply.
fn random_env(rng: &mut SmallRng, keys: usize, acyclic: bool) -> CraftingEnv {
    let mut env = CraftingEnv::new();
    let raw = if acyclic { keys - 2 } else { keys };
    for i in 0..keys {
        if i < raw {
            for _ in 0..rng.random_range(1..=2) {
                let mut inputs = Vec::new();
                for _ in 0..rng.random_range(0..=3) {
                    let j = if acyclic {
                        rng.random_range(i + 1..keys)
                    } else {
                        rng.random_range(0..keys)
                    };
                    inputs.push(ResourceStack::new(
                        ResourceKey::item(name(j)),
                        rng.random_range(1..=3),
                    ));
                }
                let output =
                    ResourceStack::new(ResourceKey::item(name(i)), rng.random_range(1..=3));
                let pattern = Pattern::new(inputs, vec![output]).unwrap();
                env.add_pattern(pattern).unwrap();
            }
        }
        let amount = rng.random_range(0..=20);
        env.add_stored(&ResourceStack::new(ResourceKey::item(name(i)), amount))
            .unwrap();
    }
    if acyclic {
        env.add_emitable(ResourceKey::item(name(keys - 1)));
        env.add_stored(&ResourceStack::new(
            ResourceKey::item(name(keys - 2)),
            1_000_000_000_000_000,
        ))
        .unwrap();
    }
    env
}

// =============================================================================
// Concrete scenarios
// =============================================================================

#[test]
fn iron_plate_scenario() {
    let mut env = CraftingEnv::new();
    stock(&mut env, "iron", 5);
    let p1 = add(&mut env, &[("iron", 2)], ("plate", 1));

    let (plan, ledger) = Resolver::new(env.index(), env.ledger().unwrap())
        .resolve_with_ledger(&key("plate"), 3)
        .unwrap();

    assert_eq!(plan.invocations_of(p1), 2);
    assert_eq!(plan.crafted, 2);
    assert_eq!(plan.residual, 1);
    assert_eq!(plan.stock_used_for(&key("iron")), 4);
    assert_eq!(ledger.available(&key("iron")), 1);
    assert_eq!(ledger.missing(&key("plate")), 1);
}

#[test]
fn emitable_water_scenario() {
    let mut env = CraftingEnv::new();
    let water = ResourceKey::fluid("water");
    env.add_emitable(water.clone());

    let plan = env.resolve(&water, 10, &unlimited()).unwrap();

    assert!(plan.is_complete());
    assert_eq!(plan.emitted, 10);
    assert_eq!(plan.stock_satisfied(), 10);
    assert!(plan.pattern_totals.is_empty());
    assert_eq!(plan.tree.sources, vec![ResolutionNode::Emit { amount: 10 }]);
}

#[test]
fn two_step_chain_resolves_fully() {
    let mut env = CraftingEnv::new();
    stock(&mut env, "ore", 8);
    let smelt = add(&mut env, &[("ore", 2)], ("ingot", 1));
    let press = add(&mut env, &[("ingot", 1)], ("plate", 2));

    let plan = env.resolve(&key("plate"), 7, &unlimited()).unwrap();

    assert!(plan.is_complete());
    assert_eq!(plan.invocations_of(press), 4);
    assert_eq!(plan.invocations_of(smelt), 4);
    assert_eq!(plan.stock_used_for(&key("ore")), 8);
    assert_eq!(
        plan.pattern_totals.iter().map(|t| t.pattern).collect::<Vec<_>>(),
        vec![press, smelt]
    );
}

// =============================================================================
// Accounting identity
// =============================================================================

#[test]
fn amounts_always_sum_to_request() {
    for seed in 0..64 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let env = random_env(&mut rng, 6, false);
        let target = ResourceKey::item(name(rng.random_range(0..6)));
        let amount = rng.random_range(1..=50);

        let plan = Resolver::new(env.index(), env.ledger().unwrap())
            .with_budget(RunBudget::iterations(10_000))
            .resolve(&target, amount)
            .unwrap();

        assert_eq!(
            plan.stock_satisfied() + plan.pattern_satisfied() + plan.residual,
            plan.requested,
            "seed {seed}"
        );
        assert_eq!(plan.requested, u64::try_from(amount).unwrap());
        assert!(plan.satisfied() <= plan.requested, "seed {seed}");
    }
}

#[test]
fn acyclic_graphs_with_enough_supply_resolve_fully() {
    for seed in 0..64 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let env = random_env(&mut rng, 8, true);
        let target = ResourceKey::item(name(rng.random_range(0..6)));
        let amount = rng.random_range(1..=50);

        let plan = env.resolve(&target, amount, &unlimited()).unwrap();

        assert_eq!(plan.residual, 0, "seed {seed}");
        assert!(plan.missing.is_empty(), "seed {seed}");
    }
}

#[test]
fn stock_claims_never_exceed_snapshot() {
    for seed in 0..32 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let env = random_env(&mut rng, 6, false);
        let target = ResourceKey::item(name(rng.random_range(0..6)));

        let plan = Resolver::new(env.index(), env.ledger().unwrap())
            .with_budget(RunBudget::iterations(10_000))
            .resolve(&target, 40)
            .unwrap();

        for used in &plan.stock_used {
            assert!(used.amount <= env.stored(&used.key), "seed {seed}");
        }
    }
}

// =============================================================================
// Cycles and depth
// =============================================================================

#[test]
fn two_key_cycle_is_unsatisfiable() {
    let mut env = CraftingEnv::new();
    add(&mut env, &[("b", 1)], ("a", 1));
    add(&mut env, &[("a", 1)], ("b", 1));

    let plan = env.resolve(&key("a"), 5, &unlimited()).unwrap();

    assert_eq!(plan.residual, 5);
    assert_eq!(plan.satisfied(), 0);
    assert!(!plan.is_interrupted());
    assert!(plan.iterations <= 2);
}

#[test]
fn cycle_falls_back_to_stock() {
    let mut env = CraftingEnv::new();
    add(&mut env, &[("b", 1)], ("a", 1));
    add(&mut env, &[("a", 1)], ("b", 1));
    stock(&mut env, "a", 2);

    // a: 2 from stock, 3 left; b needs 3 a, which is on the path and out
    // of stock.
    let plan = env.resolve(&key("a"), 5, &unlimited()).unwrap();

    assert_eq!(plan.reserved, 2);
    assert_eq!(plan.crafted, 0);
    assert_eq!(plan.residual, 3);
}

#[test]
fn non_ancestor_revisit_is_resolved_independently() {
    let mut env = CraftingEnv::new();
    stock(&mut env, "ore", 10);
    let smelt = add(&mut env, &[("ore", 1)], ("ingot", 1));
    add(&mut env, &[("ingot", 2)], ("rod", 1));
    add(&mut env, &[("ingot", 3)], ("plate", 1));
    add(&mut env, &[("rod", 1), ("plate", 1)], ("frame", 1));

    let plan = env.resolve(&key("frame"), 2, &unlimited()).unwrap();

    assert!(plan.is_complete());
    assert_eq!(plan.invocations_of(smelt), 10);
    assert_eq!(plan.stock_used_for(&key("ore")), 10);
}

#[test]
fn long_chain_stops_at_depth_cap() {
    let mut env = CraftingEnv::new();
    for i in 0..40 {
        add(&mut env, &[(name(i + 1).as_str(), 1)], (name(i).as_str(), 1));
    }
    stock(&mut env, &name(40), 100);
    let config = ResolverConfig {
        max_depth: 16,
        ..unlimited()
    };

    let plan = env.resolve(&key("k0"), 1, &config).unwrap();
    assert_eq!(plan.residual, 1);

    let deep = ResolverConfig {
        max_depth: 64,
        ..unlimited()
    };
    let plan = env.resolve(&key("k0"), 1, &deep).unwrap();
    assert!(plan.is_complete());
    assert_eq!(plan.tree.depth(), 41);
}

#[test]
fn chain_one_short_of_default_depth_cap_resolves() {
    let config = ResolverConfig::default();
    let levels = config.max_depth - 1;
    let mut env = CraftingEnv::new();
    for i in 0..levels {
        add(&mut env, &[(name(i + 1).as_str(), 1)], (name(i).as_str(), 1));
    }
    stock(&mut env, &name(levels), 1);

    let plan = env.resolve(&key("k0"), 1, &config).unwrap();
    assert!(plan.is_complete());
    assert_eq!(plan.crafted, 1);
    assert_eq!(plan.stock_used_for(&key(&name(levels))), 1);
    assert_eq!(plan.tree.depth(), levels + 1);
}

// =============================================================================
// Ordering
// =============================================================================

#[test]
fn first_registered_pattern_is_tried_first() {
    let mut env = CraftingEnv::new();
    stock(&mut env, "copper", 2);
    stock(&mut env, "tin", 10);
    let first = add(&mut env, &[("copper", 1)], ("wire", 1));
    let second = add(&mut env, &[("tin", 1)], ("wire", 1));

    let plan = env.resolve(&key("wire"), 5, &unlimited()).unwrap();

    assert!(plan.is_complete());
    assert_eq!(plan.invocations_of(first), 2);
    assert_eq!(plan.invocations_of(second), 3);
    let order: Vec<PatternId> = plan.tree.invocations().map(|inv| inv.pattern).collect();
    assert_eq!(order, vec![first, second]);
}

#[test]
fn second_pattern_unused_when_first_suffices() {
    let mut env = CraftingEnv::new();
    stock(&mut env, "copper", 9);
    stock(&mut env, "tin", 9);
    let first = add(&mut env, &[("copper", 1)], ("wire", 1));
    let second = add(&mut env, &[("tin", 1)], ("wire", 1));

    let plan = env.resolve(&key("wire"), 5, &unlimited()).unwrap();

    assert_eq!(plan.invocations_of(first), 5);
    assert_eq!(plan.invocations_of(second), 0);
    assert_eq!(plan.stock_used_for(&key("tin")), 0);
}

#[test]
fn identical_inputs_give_identical_plans() {
    let mut env = CraftingEnv::new();
    stock(&mut env, "copper", 3);
    stock(&mut env, "tin", 3);
    add(&mut env, &[("copper", 2)], ("wire", 1));
    add(&mut env, &[("tin", 1)], ("wire", 2));
    add(&mut env, &[("wire", 3)], ("coil", 1));

    let a = env.copy().resolve(&key("coil"), 3, &unlimited()).unwrap();
    let b = env.copy().resolve(&key("coil"), 3, &unlimited()).unwrap();

    assert_eq!(a.tree, b.tree);
    assert_eq!(a.pattern_totals, b.pattern_totals);
}

#[test]
fn siblings_resolve_depth_first_in_declaration_order() {
    let mut env = CraftingEnv::new();
    stock(&mut env, "x", 2);
    stock(&mut env, "y", 1);
    let kit = add(&mut env, &[("a", 1), ("b", 1)], ("kit", 1));
    let a_from_x = add(&mut env, &[("x", 2)], ("a", 1));
    let b_from_x = add(&mut env, &[("x", 2)], ("b", 1));
    let b_from_y = add(&mut env, &[("y", 1)], ("b", 1));

    let plan = env.resolve(&key("kit"), 1, &unlimited()).unwrap();

    // `a` is declared first and takes all the x; `b` falls back to y.
    assert!(plan.is_complete());
    assert_eq!(plan.invocations_of(a_from_x), 1);
    assert_eq!(plan.invocations_of(b_from_x), 0);
    assert_eq!(plan.invocations_of(b_from_y), 1);
    let order: Vec<PatternId> = plan.pattern_totals.iter().map(|t| t.pattern).collect();
    assert_eq!(order, vec![kit, a_from_x, b_from_y]);
}

#[test]
fn starved_sibling_discards_the_whole_attempt() {
    let mut env = CraftingEnv::new();
    stock(&mut env, "x", 2);
    add(&mut env, &[("a", 1), ("b", 1)], ("kit", 1));
    add(&mut env, &[("x", 2)], ("a", 1));
    add(&mut env, &[("x", 2)], ("b", 1));

    let (plan, ledger) = Resolver::new(env.index(), env.ledger().unwrap())
        .resolve_with_ledger(&key("kit"), 1)
        .unwrap();

    assert_eq!(plan.residual, 1);
    assert!(plan.stock_used.is_empty());
    assert_eq!(ledger.available(&key("x")), 2);
    assert_eq!(
        plan.tree.sources,
        vec![ResolutionNode::Unsatisfiable {
            amount: 1,
            reason: UnsatisfiedReason::NoViablePattern,
        }]
    );
}

// =============================================================================
// Budget
// =============================================================================

#[test]
fn zero_budget_still_serves_stock() {
    let mut env = CraftingEnv::new();
    stock(&mut env, "plate", 4);
    add(&mut env, &[("iron", 2)], ("plate", 1));

    let plan = Resolver::new(env.index(), env.ledger().unwrap())
        .with_budget(RunBudget::iterations(0))
        .resolve(&key("plate"), 4)
        .unwrap();

    assert!(plan.is_complete());
    assert!(!plan.is_interrupted());
    assert_eq!(plan.iterations, 0);
}

#[test]
fn zero_budget_makes_no_crafting_progress() {
    let mut env = CraftingEnv::new();
    stock(&mut env, "iron", 10);
    add(&mut env, &[("iron", 2)], ("plate", 1));

    let plan = Resolver::new(env.index(), env.ledger().unwrap())
        .with_budget(RunBudget::iterations(0))
        .resolve(&key("plate"), 4)
        .unwrap();

    assert_eq!(plan.satisfied(), 0);
    assert_eq!(plan.interruption, Some(Interruption::IterationLimit));
    assert_eq!(plan.stock_used_for(&key("iron")), 0);
}

#[test]
fn iteration_cap_preserves_committed_progress() {
    let mut env = CraftingEnv::new();
    stock(&mut env, "copper", 2);
    stock(&mut env, "tin", 10);
    let first = add(&mut env, &[("copper", 1)], ("wire", 1));
    let second = add(&mut env, &[("tin", 1)], ("wire", 1));

    // One trial for `first` (capped at 2 by copper), one retry that
    // commits, then the cap stops `second`.
    let plan = Resolver::new(env.index(), env.ledger().unwrap())
        .with_budget(RunBudget::iterations(2))
        .resolve(&key("wire"), 5)
        .unwrap();

    assert_eq!(plan.invocations_of(first), 2);
    assert_eq!(plan.invocations_of(second), 0);
    assert_eq!(plan.crafted, 2);
    assert_eq!(plan.residual, 3);
    assert_eq!(plan.iterations, 2);
    assert_eq!(plan.interruption, Some(Interruption::IterationLimit));
}

/// `plate <- ingot`, where `ingot` comes from 5 ore or from dust that
/// nothing can supply.
fn smelter_env() -> CraftingEnv {
    let mut env = CraftingEnv::new();
    stock(&mut env, "ore", 5);
    add(&mut env, &[("ingot", 1)], ("plate", 1));
    add(&mut env, &[("ore", 1)], ("ingot", 1));
    add(&mut env, &[("dust", 1)], ("ingot", 1));
    add(&mut env, &[("gravel", 1)], ("dust", 1));
    env
}

#[test]
fn budget_cut_inside_nested_trial_keeps_committed_subtree() {
    let env = smelter_env();

    for iterations in 2..=6 {
        let plan = Resolver::new(env.index(), env.ledger().unwrap())
            .with_budget(RunBudget::iterations(iterations))
            .resolve(&key("plate"), 10)
            .unwrap();

        assert_eq!(plan.satisfied(), 5, "budget {iterations}");
        assert_eq!(plan.residual, 5, "budget {iterations}");
        assert_eq!(plan.stock_used_for(&key("ore")), 5, "budget {iterations}");
        assert_eq!(
            plan.interruption,
            Some(Interruption::IterationLimit),
            "budget {iterations}"
        );
    }
}

#[test]
fn budget_cut_before_any_commit_makes_no_progress() {
    let env = smelter_env();

    let plan = Resolver::new(env.index(), env.ledger().unwrap())
        .with_budget(RunBudget::iterations(1))
        .resolve(&key("plate"), 10)
        .unwrap();

    assert_eq!(plan.satisfied(), 0);
    assert_eq!(plan.stock_used_for(&key("ore")), 0);
}

#[test]
fn enough_budget_settles_nested_trials() {
    let env = smelter_env();

    let plan = Resolver::new(env.index(), env.ledger().unwrap())
        .with_budget(RunBudget::iterations(7))
        .resolve(&key("plate"), 10)
        .unwrap();

    assert_eq!(plan.satisfied(), 5);
    assert!(!plan.is_interrupted());
}

// =============================================================================
// Fuzzy lookup
// =============================================================================

#[test]
fn fuzzy_lookup_finds_craftable_substitute() {
    let mut env = CraftingEnv::new();
    stock(&mut env, "iron", 6);
    let pristine = key("iron_pick").with_damage(0, 250);
    let pattern = Pattern::new(
        vec![stack("iron", 3)],
        vec![ResourceStack::new(pristine.clone(), 1)],
    )
    .unwrap();
    env.add_pattern(pattern).unwrap();

    let worn = key("iron_pick").with_damage(90, 250);
    assert!(env.index().patterns_for(&worn).is_empty());

    let substitute = env
        .index()
        .fuzzy_match(&worn, |candidate| candidate.damage() == 0)
        .cloned();
    assert_eq!(substitute.as_ref(), Some(&pristine));
    assert_eq!(
        env.index()
            .fuzzy_match_with(&worn, FuzzyMode::Percent75, |_| true),
        None
    );

    let plan = env
        .resolve(&substitute.unwrap(), 2, &unlimited())
        .unwrap();
    assert!(plan.is_complete());
}
