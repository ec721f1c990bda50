use anyhow::{Context, Result};
use clap::Parser;
use former::grid::Grid;
use former::playout::{rollout, RolloutPolicy};
use former::{GridMove, PuzzleState, Solver, SolverConfig};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about = "Measures rollout and search throughput", long_about = None)]
struct Args {
    /// Board file (default: random 7x9 board)
    #[arg(short, long)]
    board: Option<PathBuf>,

    /// Number of random playouts to time (default: 1000)
    #[arg(long, default_value_t = 1000)]
    playouts: usize,

    /// Moves to play before benchmarking, e.g. "1,1 2,2"
    #[arg(long, value_delimiter = ' ')]
    opening: Vec<GridMove>,

    /// Pick rollout moves weighted by group size
    #[arg(long, default_value_t = false, action = clap::ArgAction::SetTrue)]
    size_weighted: bool,

    /// Search iterations for the single-solve benchmark (0 skips it)
    #[arg(long, default_value_t = 2000)]
    search_iterations: u64,

    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(args.seed);

    let mut grid = match &args.board {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
            .parse::<Grid>()?,
        None => Grid::random(7, 9, &mut rng),
    };
    for mv in &args.opening {
        grid.remove_group_at(mv.origin)
            .with_context(|| format!("opening move {} starts on an empty cell", mv))?;
    }

    println!("Former Solver - Benchmark Tool");
    println!("==============================");
    print!("{}", grid);
    println!("Blocks: {}", grid.remaining());
    println!("Playouts: {}", args.playouts);
    println!("------------------------------");

    #[cfg(debug_assertions)]
    println!("WARNING: Running in debug mode. Performance will be significantly lower.\nUse --release for accurate benchmarks.\n");

    let policy = if args.size_weighted {
        RolloutPolicy::SizeWeighted
    } else {
        RolloutPolicy::Uniform
    };

    let mut times = Vec::with_capacity(args.playouts);
    let mut lengths = Vec::with_capacity(args.playouts);
    for _ in 0..args.playouts {
        let start = Instant::now();
        let playout = rollout(&grid, policy, usize::MAX, &mut rng)?;
        times.push(start.elapsed());
        lengths.push(playout.moves.len());
    }
    print_playout_stats(&times, &lengths);

    if args.search_iterations > 0 {
        println!("\nRunning single solve ({} iterations per move)...", args.search_iterations);
        let solver = Solver::new(SolverConfig::default().with_iterations(args.search_iterations));
        let start = Instant::now();
        let solution = solver.solve(&grid, &mut rng)?;
        let secs = start.elapsed().as_secs_f64();
        println!("  Moves: {}", solution.len());
        println!("  Time: {:.3}s", secs);
        println!("  Iterations/sec: {:.0}", solution.iterations as f64 / secs);
    }
    Ok(())
}

fn print_playout_stats(times: &[Duration], lengths: &[usize]) {
    if times.is_empty() {
        return;
    }
    let total: Duration = times.iter().sum();
    let avg_ms = 1000.0 * total.as_secs_f64() / times.len() as f64;
    let avg_moves = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;

    println!("Average time: {:.3} ms", avg_ms);
    println!("Min moves: {}", lengths.iter().min().copied().unwrap_or(0));
    println!("Average moves: {:.2}", avg_moves);
    println!("Max moves: {}", lengths.iter().max().copied().unwrap_or(0));
}
