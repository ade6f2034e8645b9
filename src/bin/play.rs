use std::io::{self, BufRead, Write};

use caveprobe::{Board, CellState, Engine};
use clap::Parser;
use rand::Rng;
use rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Interactive session against a random board, printing the live
/// probability grid and accepting `x y` reveal commands from stdin.
#[derive(Parser)]
#[command(name = "play", about = "Interactively drive the caveprobe engine")]
struct Args {
    #[arg(long, default_value_t = 9)]
    width: u8,

    #[arg(long, default_value_t = 9)]
    height: u8,

    #[arg(long, default_value_t = 10)]
    total_bads: u16,

    #[arg(long)]
    seed: Option<u64>,
}

fn print_grid(engine: &Engine, board: &Board) {
    let geo = engine.geometry();
    let probs = engine.probabilities();
    for y in 0..geo.height {
        for x in 0..geo.width {
            if engine.is_dug(x, y) {
                match board.cell(x, y) {
                    CellState::Bad(_) => print!(" * "),
                    CellState::Clue(n) => print!(" {n} "),
                    CellState::Reward(_) => print!(" $ "),
                    CellState::Undug => unreachable!(),
                }
            } else {
                let p = probs[usize::from(y) * usize::from(geo.width) + usize::from(x)];
                print!("{:>3.0} ", p * 100.0);
            }
        }
        println!();
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);

    let board = Board::random(args.width, args.height, args.total_bads, &mut rng);
    let mut engine = Engine::new(args.width, args.height, args.total_bads)
        .expect("fresh engine construction cannot be unsatisfiable");

    println!("caveprobe -- enter reveals as \"x y\", q to quit");
    print_grid(&engine, &board);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            break;
        }

        let mut parts = line.split_whitespace();
        let (Some(xs), Some(ys)) = (parts.next(), parts.next()) else {
            println!("expected: x y");
            continue;
        };
        let (Ok(x), Ok(y)) = (xs.parse::<u8>(), ys.parse::<u8>()) else {
            println!("expected two integers");
            continue;
        };
        if x >= args.width || y >= args.height {
            println!("reveal rejected: coordinates ({x}, {y}) are out of bounds");
            continue;
        }

        let state = board.cell(x, y);
        match engine.reveal(x, y, state) {
            Ok(_) => {
                if state.is_bad() {
                    println!("boom! game over.");
                    print_grid(&engine, &board);
                    return;
                }
                print_grid(&engine, &board);
                if board.has_won(|h| {
                    let geo = engine.geometry();
                    let (hx, hy) = geo.coords_of(h);
                    engine.is_dug(hx, hy)
                }) {
                    println!("cleared the board!");
                    return;
                }
            }
            Err(err) => println!("reveal rejected: {err}"),
        }
        io::stdout().flush().ok();
    }
}
