//! Property-based invariant checks, plus a small-trial smoke version of the
//! statistical calibration check done properly by the `bench` binary.
//!
//! These generate random small boards and random-ish reveal sequences rather
//! than hand-written scenarios, complementing the fixed-scenario tests in
//! `lib.rs` and the oracle-equivalence test in `partition_iter.rs`.

use proptest::prelude::*;
use rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::board::Board;
use crate::engine::Engine;

/// Plays up to `n_moves` safe reveals (stopping early on a bad reveal, a win,
/// or a rejected reveal) and checks invariants 1-3 after every accepted one.
fn play_and_check_invariants(width: u8, height: u8, total_bads: u16, seed: u64, n_moves: usize) {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let board = Board::random(width, height, total_bads, &mut rng);
    let Ok(mut engine) = Engine::new(width, height, total_bads) else {
        return; // over-budget combination from the strategy; nothing to check
    };

    let geo = engine.geometry();

    for _ in 0..n_moves {
        check_invariants(&engine, total_bads);

        let probs = engine.probabilities();
        let mut target: Option<(u8, u8)> = None;
        'find: for y in 0..geo.height {
            for x in 0..geo.width {
                if !engine.is_dug(x, y) {
                    let p = probs[usize::from(y) * usize::from(geo.width) + usize::from(x)];
                    if p < 1.0 {
                        target = Some((x, y));
                        break 'find;
                    }
                }
            }
        }
        let Some((x, y)) = target else {
            break; // nothing left worth revealing
        };

        let state = board.cell(x, y);
        if state.is_bad() {
            break;
        }
        if engine.reveal(x, y, state).is_err() {
            break;
        }
    }

    check_invariants(&engine, total_bads);
}

fn check_invariants(engine: &Engine, total_bads: u16) {
    let store = engine.store();
    let geo = store.geometry();

    // knownBad, knownSafe, constrainedUnopened, and unconstrainedUnopened
    // partition every still-unopened Hole.
    for i in 0..geo.cell_count() {
        let hole = crate::hole::HoleId(i as u16);
        if store.revealed_at(hole).is_some() {
            continue; // no longer a Hole once dug
        }
        let memberships = [
            store.is_known_bad(hole),
            store.is_known_safe(hole),
            store.constrained_unopened().contains(&hole),
            store.unconstrained_unopened().contains(&hole),
        ];
        let count = memberships.iter().filter(|&&m| m).count();
        assert_eq!(
            count, 1,
            "hole {i} belongs to {count} of knownBad/knownSafe/constrained/unconstrained, expected exactly 1"
        );
    }

    // Every active constraint's remaining is within [0, holes.len()].
    for (_, c) in store.constraints().active() {
        assert!(
            c.remaining as usize <= c.holes.len(),
            "constraint remaining {} exceeds hole count {}",
            c.remaining,
            c.holes.len()
        );
    }

    // Every probability is in [0, 1], and summed marginals equal total_bads
    // within tolerance.
    let probs = engine.probabilities();
    let mut sum = 0.0;
    for &p in &probs {
        assert!((0.0..=1.0).contains(&p), "probability {p} out of range");
        sum += p;
    }
    assert!(
        (sum - f64::from(total_bads)).abs() < 1e-6,
        "sum of probabilities {sum} != total_bads {total_bads}"
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The known-set partition, constraint, and probability invariants all
    /// hold after every reveal of a random self-play-ish sequence on small
    /// boards.
    #[test]
    fn invariants_hold_through_random_play(
        width in 2u8..6,
        height in 2u8..6,
        bad_pct in 0u32..50,
        seed in any::<u64>(),
        n_moves in 1usize..10,
    ) {
        let cell_count = u32::from(width) * u32::from(height);
        let total_bads = ((cell_count * bad_pct) / 100).min(cell_count.saturating_sub(1)) as u16;
        play_and_check_invariants(width, height, total_bads, seed, n_moves);
    }

    /// Revealing the same (x, y, state) twice in a row produces an
    /// identical probability matrix.
    #[test]
    fn idempotent_repeat_reveal(
        width in 2u8..6,
        height in 2u8..6,
        bad_pct in 0u32..50,
        seed in any::<u64>(),
    ) {
        let cell_count = u32::from(width) * u32::from(height);
        let total_bads = ((cell_count * bad_pct) / 100).min(cell_count.saturating_sub(1)) as u16;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let board = Board::random(width, height, total_bads, &mut rng);
        if let Ok(mut engine) = Engine::new(width, height, total_bads) {
            let state = board.cell(0, 0);
            if !state.is_bad() && engine.reveal(0, 0, state).is_ok() {
                let before = engine.probabilities();
                let _ = engine.reveal(0, 0, state);
                let after = engine.probabilities();
                prop_assert_eq!(before, after);
            }
        }
    }

    /// Two engines fed the same reveal sequence produce bit-identical
    /// probability outputs.
    #[test]
    fn deterministic_across_engine_instances(
        width in 2u8..6,
        height in 2u8..6,
        bad_pct in 0u32..50,
        seed in any::<u64>(),
        n_moves in 1usize..8,
    ) {
        let cell_count = u32::from(width) * u32::from(height);
        let total_bads = ((cell_count * bad_pct) / 100).min(cell_count.saturating_sub(1)) as u16;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let board = Board::random(width, height, total_bads, &mut rng);

        let (Ok(mut a), Ok(mut b)) = (
            Engine::new(width, height, total_bads),
            Engine::new(width, height, total_bads),
        ) else {
            return Ok(());
        };
        let geo = a.geometry();

        for _ in 0..n_moves {
            let probs = a.probabilities();
            let mut target: Option<(u8, u8)> = None;
            'find: for y in 0..geo.height {
                for x in 0..geo.width {
                    if !a.is_dug(x, y) {
                        let p = probs[usize::from(y) * usize::from(geo.width) + usize::from(x)];
                        if p < 1.0 {
                            target = Some((x, y));
                            break 'find;
                        }
                    }
                }
            }
            let Some((x, y)) = target else { break };
            let state = board.cell(x, y);
            if state.is_bad() {
                break;
            }
            if a.reveal(x, y, state).is_err() {
                break;
            }
            b.reveal(x, y, state).unwrap();
        }

        prop_assert_eq!(a.probabilities(), b.probabilities());
    }
}

/// Smoke version of the empirical calibration check: a handful of self-play
/// trials, checked against the `3*sqrt(p(1-p)/n)` tolerance band around each
/// reported probability. Not part of the default `cargo test` run -- the
/// real check is the `bench` binary over >=10,000 moves; `#[ignore]` keeps
/// this runnable on demand (`cargo test -- --ignored`) without slowing down
/// CI.
#[test]
#[ignore]
fn empirical_calibration_smoke() {
    use std::collections::HashMap;

    let mut buckets: HashMap<u64, (u64, u64)> = HashMap::new();
    let trials = 500;

    for trial in 0..trials {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(trial);
        let width = 8;
        let height = 8;
        let total_bads = 8;
        let board = Board::random(width, height, total_bads, &mut rng);
        let mut engine = Engine::new(width, height, total_bads).unwrap();
        let geo = engine.geometry();

        loop {
            let probs = engine.probabilities();
            let mut best: Option<(u8, u8, f64)> = None;
            for y in 0..geo.height {
                for x in 0..geo.width {
                    if engine.is_dug(x, y) {
                        continue;
                    }
                    let p = probs[usize::from(y) * usize::from(geo.width) + usize::from(x)];
                    if best.map_or(true, |(_, _, bp)| p < bp) {
                        best = Some((x, y, p));
                    }
                }
            }
            let Some((x, y, p)) = best else { break };
            let state = board.cell(x, y);
            let went_bad = state.is_bad();
            let key = (p * 1_000_000.0).round() as u64;
            let entry = buckets.entry(key).or_insert((0, 0));
            entry.0 += 1;
            if went_bad {
                entry.1 += 1;
            }
            if went_bad || engine.reveal(x, y, state).is_err() {
                break;
            }
            if board.has_won(|h| {
                let (hx, hy) = geo.coords_of(h);
                engine.is_dug(hx, hy)
            }) {
                break;
            }
        }
    }

    for (key, (plays, gone_bad)) in buckets {
        let p = key as f64 / 1_000_000.0;
        if plays < 5 {
            continue; // too few samples for the tolerance band to be meaningful
        }
        let rate = gone_bad as f64 / plays as f64;
        let tolerance = 3.0 * (p * (1.0 - p) / plays as f64).sqrt();
        assert!(
            (rate - p).abs() <= tolerance + 1e-6,
            "bucket p={p:.4} empirical rate {rate:.4} outside {p:.4} +/- {tolerance:.4} over {plays} plays"
        );
    }
}
