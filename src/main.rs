//! # Former Solver
//!
//! Command-line entry point: reads (or generates) a board, runs root-parallel
//! single-player MCTS and prints the shortest solution found.
//!
//! ## Usage
//! Run with `cargo run --release -- --board board.txt` for best performance.
//! Set `RUST_LOG=debug` to log every committed move.

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use former::grid::MAX_SIDE;
use former::{Cell, Color, CollapsePolicy, Grid, PuzzleState, Solver, SolverConfig};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Board dimensions given as `WIDTHxHEIGHT`.
#[derive(Debug, Clone, Copy)]
struct Dimensions {
    width: usize,
    height: usize,
}

impl FromStr for Dimensions {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
        let width = w.trim().parse::<usize>().map_err(|e| e.to_string())?;
        let height = h.trim().parse::<usize>().map_err(|e| e.to_string())?;
        if width == 0 || height == 0 {
            return Err("dimensions must be positive".to_string());
        }
        if width > MAX_SIDE || height > MAX_SIDE {
            return Err(format!("dimensions must be at most {MAX_SIDE}x{MAX_SIDE}"));
        }
        Ok(Dimensions { width, height })
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Board file: one row per line, B/G/P/O for colors and '.' for empty
    #[arg(short, long, conflicts_with = "random")]
    board: Option<PathBuf>,

    /// Generate a random board of the given size instead (e.g. 7x9)
    #[arg(long)]
    random: Option<Dimensions>,

    /// TOML file with solver settings; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Search iterations per committed move
    #[arg(short, long, conflicts_with = "time_ms")]
    iterations: Option<u64>,

    /// Wall-clock search time per committed move (milliseconds)
    #[arg(long)]
    time_ms: Option<u64>,

    /// UCT exploration constant (C)
    #[arg(short = 'e', long)]
    exploration: Option<f64>,

    /// Single-player variance bonus weight (D)
    #[arg(short = 'd', long)]
    variance_weight: Option<f64>,

    /// Independent searches to run in parallel
    #[arg(short, long, default_value_t = num_cpus::get())]
    workers: usize,

    /// Base seed; worker i uses seed + i
    #[arg(short, long)]
    seed: Option<u64>,

    /// Give up after this many committed moves (default: one per cell, or
    /// the config file's value)
    #[arg(short = 'm', long)]
    max_moves: Option<usize>,

    /// Close empty columns by shifting the columns to their right
    #[arg(long, action = clap::ArgAction::SetTrue)]
    shift_columns: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_config(args: &Args) -> Result<SolverConfig> {
    let mut config = match &args.config {
        Some(path) => SolverConfig::load_from_path(path)?,
        None => SolverConfig::default(),
    };
    if let Some(n) = args.iterations {
        config = config.with_iterations(n);
    }
    if let Some(ms) = args.time_ms {
        config = config.with_time_limit(Duration::from_millis(ms));
    }
    if let Some(c) = args.exploration {
        config = config.with_exploration(c);
    }
    if let Some(d) = args.variance_weight {
        config = config.with_variance_weight(d);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(n) = args.max_moves {
        config = config.with_max_top_level_moves(n);
    }
    config.validate()?;
    Ok(config)
}

fn load_board(args: &Args, seed: u64) -> Result<Grid> {
    let grid = match (&args.board, args.random) {
        (Some(path), _) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read board file {}", path.display()))?;
            text.parse::<Grid>()
                .with_context(|| format!("failed to parse board file {}", path.display()))?
        }
        (None, Some(dims)) => {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
            Grid::random(dims.width, dims.height, &mut rng)
        }
        (None, None) => bail!("either --board or --random is required"),
    };
    let collapse = if args.shift_columns {
        CollapsePolicy::GravityAndShift
    } else {
        CollapsePolicy::Gravity
    };
    Ok(grid.with_collapse(collapse))
}

/// Without `--max-moves` or a config file, allow one move per cell, which is
/// always enough to clear the board.
fn default_move_cap(config: &mut SolverConfig, args: &Args, grid: &Grid) {
    if args.max_moves.is_none() && args.config.is_none() {
        config.max_top_level_moves = grid.move_bound();
    }
}

/// Renders the board with one colored square per block.
fn render(grid: &Grid) -> String {
    let mut out = String::new();
    for row in 0..grid.height() {
        for col in 0..grid.width() {
            let block = "■ ";
            let cell = match grid.cell(Cell::new(row, col)) {
                Some(Color::Blue) => block.blue(),
                Some(Color::Green) => block.green(),
                Some(Color::Purple) => block.magenta(),
                Some(Color::Orange) => block.yellow(),
                None => "  ".normal(),
            };
            out.push_str(&cell.to_string());
        }
        out.push('\n');
    }
    out
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let mut config = build_config(&args)?;
    let grid = load_board(&args, config.seed)?;
    default_move_cap(&mut config, &args, &grid);

    println!("{}", render(&grid));
    println!(
        "Board: {}x{}, {} blocks, {} groups",
        grid.width(),
        grid.height(),
        grid.remaining_block_count(),
        grid.legal_moves().len()
    );
    println!("Workers: {}  Budget: {:?}", args.workers, config.budget);

    let start = Instant::now();
    let solver = Solver::new(config);
    let merged = solver.solve_parallel(&grid, args.workers)?;
    let secs = start.elapsed().as_secs_f64();

    let mut replay = grid.clone();
    for (i, mv) in merged.best.moves.iter().enumerate() {
        println!("{:>3}. {} ({} blocks)", i + 1, mv, mv.size);
        replay.remove_group_at(mv.origin);
    }
    println!("{}", render(&replay));
    println!(
        "Best solution: {} moves (worker {}, {}/{} workers solved, {:.2}s)",
        merged.best.len(),
        merged.worker,
        merged.solved,
        merged.workers,
        secs
    );
    Ok(())
}
