use std::collections::BTreeMap;

use caveprobe::{Board, CellState, Engine};
use clap::Parser;
use rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Self-play benchmark: repeatedly picks the lowest-probability unopened
/// cell, reveals it, and tracks how often cells at each reported
/// probability actually turn out bad.
#[derive(Parser)]
#[command(name = "bench", about = "Self-play calibration benchmark for caveprobe")]
struct Args {
    #[arg(long, default_value_t = 1000)]
    trials: u32,

    #[arg(long, default_value_t = 9)]
    width: u8,

    #[arg(long, default_value_t = 9)]
    height: u8,

    #[arg(long, default_value_t = 10)]
    total_bads: u16,

    #[arg(long, default_value_t = 1)]
    seed: u64,
}

/// Bucketed by the exact probability reported just before a cell was
/// revealed.
#[derive(Default, Clone, Copy)]
struct Bucket {
    plays: u64,
    gone_bad: u64,
}

fn bucket_key(p: f64) -> u64 {
    (p * 1_000_000.0).round() as u64
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(args.seed);

    let mut buckets: BTreeMap<u64, Bucket> = BTreeMap::new();

    for trial in 0..args.trials {
        let board = Board::random(args.width, args.height, args.total_bads, &mut rng);
        let mut engine = Engine::new(args.width, args.height, args.total_bads)
            .expect("fresh engine construction cannot be unsatisfiable");

        log::info!("trial {trial} starting");

        loop {
            let probs = engine.probabilities();
            let geo = engine.geometry();

            // lowest probability first; ties broken column-major (lowest y,
            // then lowest x).
            let mut best: Option<(u8, u8, f64)> = None;
            for y in 0..geo.height {
                for x in 0..geo.width {
                    if engine.is_dug(x, y) {
                        continue;
                    }
                    let p = probs[usize::from(y) * usize::from(geo.width) + usize::from(x)];
                    match best {
                        Some((_, _, bp)) if p >= bp => {}
                        _ => best = Some((x, y, p)),
                    }
                }
            }

            let Some((x, y, p)) = best else {
                break; // nothing left to reveal, board fully cleared
            };

            let state = board.cell(x, y);
            let went_bad = state.is_bad();

            let entry = buckets.entry(bucket_key(p)).or_default();
            entry.plays += 1;
            if went_bad {
                entry.gone_bad += 1;
            }

            if went_bad {
                let _ = engine.reveal(x, y, state);
                break;
            }

            match engine.reveal(x, y, state) {
                Ok(diag) => {
                    log::debug!(
                        "recompute: weight={} iters={} legal={} partitions={} sunken={} constrained={}",
                        diag.total_weight,
                        diag.total_iterations,
                        diag.legal_iterations,
                        diag.partitions,
                        diag.sunken_partitions,
                        diag.constrained_cells,
                    );
                }
                Err(err) => {
                    log::warn!("reveal at ({x}, {y}) rejected: {err}");
                    break;
                }
            }

            if board.has_won(|h| {
                let (hx, hy) = geo.coords_of(h);
                engine.is_dug(hx, hy)
            }) {
                break;
            }
        }
    }

    println!("probability\tplays\tempirical_bad_rate");
    for (key, b) in buckets {
        let p = key as f64 / 1_000_000.0;
        let rate = if b.plays > 0 {
            b.gone_bad as f64 / b.plays as f64
        } else {
            0.0
        };
        println!("{p:.6}\t{}\t{rate:.6}", b.plays);
    }
}
