//! MCTS benchmarks for performance profiling.
//!
//! Run with: `cargo bench -p mcts`
//!
//! These benchmarks measure:
//! - Full planning requests with varying iteration budgets
//! - Cost of nesting (reasoning levels 1-3)
//! - Tree operations (selection, backpropagation, robust child)
//! - Rollout opponent modes (cached vs every step)

use std::f64::consts::PI;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use engine_core::{build_map, Action, ActionTable, JointState, MapKind, State, Target, VehicleParams, World};
use mcts::{Budget, MctsConfig, MctsTree, OpponentReplan, Planner};

/// Ego turning left across an oncoming vehicle on the default crossroads.
fn left_turn_world() -> World {
    let vehicles = vec![
        VehicleParams::new(
            0,
            "ego",
            State::new(-20.0, -2.0, 0.0, 4.0),
            Target {
                x: 0.0,
                y: 20.0,
                radius: 2.0,
            },
        ),
        VehicleParams::new(
            1,
            "oncoming",
            State::new(20.0, 2.0, PI, 4.0),
            Target {
                x: -20.0,
                y: 2.0,
                radius: 2.0,
            },
        ),
    ];
    World::new(
        build_map(MapKind::Crossroads, 25.0, 4.0),
        vehicles,
        ActionTable::default(),
    )
}

fn root_joint() -> JointState {
    JointState::new(vec![State::default()], 0.0)
}

// =============================================================================
// Full Planning Benchmarks
// =============================================================================

fn bench_plan_budgets(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_budgets");
    let world = left_turn_world();
    let joint = world.initial_joint_state();

    for budget in [50u32, 100, 200, 400, 800] {
        group.throughput(Throughput::Elements(budget as u64));
        group.bench_with_input(BenchmarkId::new("level1", budget), &budget, |b, &budget| {
            let planner = Planner::new(world.clone(), MctsConfig::default().with_budget(budget));
            b.iter(|| black_box(planner.plan(0, &joint, 1, Budget::Iterations(budget), 42)));
        });
    }

    group.finish();
}

// =============================================================================
// Level-k Nesting Benchmarks
// =============================================================================

fn bench_plan_levels(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_levels");
    group.sample_size(10);
    let world = left_turn_world();
    let joint = world.initial_joint_state();
    let config = MctsConfig::default().with_budget(100).with_max_step(6);

    for level in [1u32, 2, 3] {
        group.bench_with_input(BenchmarkId::new("budget100", level), &level, |b, &level| {
            let planner = Planner::new(world.clone(), config.clone());
            b.iter(|| black_box(planner.plan(0, &joint, level, config.budget(), 42)));
        });
    }

    group.finish();
}

// =============================================================================
// Tree Operation Benchmarks
// =============================================================================

fn bench_tree_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("mcts_tree_ops");

    // Benchmark node allocation
    group.bench_function("allocate_node", |b| {
        b.iter(|| {
            let mut tree = MctsTree::new(root_joint(), Action::ALL.to_vec(), None);

            // Allocate 100 child nodes
            for i in 0..100usize {
                tree.add_child(
                    tree.root(),
                    Action::ALL[i % Action::ALL.len()],
                    root_joint(),
                    0.0,
                    None,
                    Action::ALL.to_vec(),
                );
            }

            black_box(tree.len())
        });
    });

    // Benchmark child selection (UCT calculation)
    group.bench_function("best_child", |b| {
        let mut tree = MctsTree::new(root_joint(), Vec::new(), None);

        for (i, action) in Action::ALL.into_iter().enumerate() {
            let child_id = tree.add_child(tree.root(), action, root_joint(), 0.0, None, Vec::new());
            let child = tree.get_mut(child_id);
            child.visit_count = (i as u32 + 1) * 10;
            child.value_sum = (i as f64 - 3.0) * 0.5 * child.visit_count as f64;
        }
        tree.get_mut(tree.root()).visit_count = 210;

        b.iter(|| black_box(tree.best_child(tree.root(), 5.0)));
    });

    // Benchmark backpropagation
    group.bench_function("backpropagate_depth_8", |b| {
        b.iter_batched(
            || {
                let mut tree = MctsTree::new(root_joint(), Vec::new(), None);
                let mut parent = tree.root();
                for _ in 0..8 {
                    parent = tree.add_child(parent, Action::Maintain, root_joint(), 1.0, None, Vec::new());
                }
                (tree, parent)
            },
            |(mut tree, leaf)| {
                tree.backpropagate(leaf, 1.0, 0.9);
                black_box(tree)
            },
            criterion::BatchSize::SmallInput,
        );
    });

    // Benchmark robust child extraction
    group.bench_function("robust_child", |b| {
        let mut tree = MctsTree::new(root_joint(), Vec::new(), None);
        for (i, action) in Action::ALL.into_iter().enumerate() {
            let child_id = tree.add_child(tree.root(), action, root_joint(), 0.0, None, Vec::new());
            tree.get_mut(child_id).visit_count = (i as u32 % 3 + 1) * 50;
        }

        b.iter(|| black_box(tree.robust_child(tree.root())));
    });

    group.finish();
}

// =============================================================================
// Rollout Opponent Mode Benchmarks
// =============================================================================

fn bench_opponent_replan(c: &mut Criterion) {
    let mut group = c.benchmark_group("opponent_replan");
    group.sample_size(10);
    let world = left_turn_world();
    let joint = world.initial_joint_state();

    for (name, mode) in [
        ("cached", OpponentReplan::Cached),
        ("every_step", OpponentReplan::EveryStep),
    ] {
        group.bench_function(name, |b| {
            let config = MctsConfig::default()
                .with_budget(40)
                .with_max_step(4)
                .with_opponent_replan(mode);
            let planner = Planner::new(world.clone(), config);
            b.iter(|| black_box(planner.plan(0, &joint, 2, Budget::Iterations(40), 42)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_plan_budgets,
    bench_plan_levels,
    bench_tree_operations,
    bench_opponent_replan,
);

criterion_main!(benches);
