mod bits;
mod board;
mod btype_solver;
mod deadlocks;
mod heuristic;
mod history;
mod levels;
mod lurd;
mod moves_solver;
mod os;
mod positions;
mod queue;
mod solver;
mod transposition;
mod zobrist;

use board::Board;
use btype_solver::BTypeSolver;
use clap::{Parser, Subcommand, ValueEnum};
use levels::Levels;
use lurd::try_convert_lurd_to_puzzle;
use moves_solver::MovesEqualsPushesSolver;
use solver::{Cancellation, LogProgress, SolveError, Solution};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SolverKind {
    /// BFS by pushes for puzzles solvable with moves == pushes
    MovesEqualsPushes,
    /// Parallel bidirectional search for b-type (zero-space) puzzles
    Btype,
}

#[derive(Parser)]
#[command(name = "pushover")]
#[command(about = "Sokoban solvers for moves-equals-pushes and b-type puzzles", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve levels from an XSB file
    Solve {
        /// Path to the levels file (XSB format)
        #[arg(value_name = "FILE")]
        levels_file: String,

        /// Level number to solve (1-indexed), or start of range
        #[arg(value_name = "LEVEL")]
        level_start: usize,

        /// Optional end of level range (inclusive, 1-indexed)
        #[arg(value_name = "LEVEL_END")]
        level_end: Option<usize>,

        /// Solver to use
        #[arg(short, long, value_enum, default_value = "btype")]
        solver: SolverKind,

        /// Print the solution LURD and the solved board
        #[arg(short, long)]
        print_solution: bool,

        /// Directory to save solution files into
        #[arg(long, value_name = "DIR")]
        save: Option<PathBuf>,
    },
    /// Rebuild a complete puzzle from a LURD solution trace
    Reconstruct {
        /// The solution trace; characters outside u,d,l,r,U,D,L,R are ignored
        #[arg(value_name = "LURD")]
        lurd: String,
    },
}

struct LevelStats {
    solved: bool,
    pushes: usize,
    positions: usize,
    elapsed_ms: u128,
}

fn solve_level(
    board: &Board,
    level_num: usize,
    solver_kind: SolverKind,
    print_solution: bool,
    save: Option<&PathBuf>,
) -> LevelStats {
    let cancellation = Cancellation::new();
    let start = Instant::now();

    let (result, positions) = match solver_kind {
        SolverKind::MovesEqualsPushes => {
            let mut solver = MovesEqualsPushesSolver::new(cancellation);
            let result = solver.solve(board, &LogProgress);
            (result, solver.positions_count())
        }
        SolverKind::Btype => {
            let mut solver = BTypeSolver::new(cancellation);
            let result = solver.solve(board, &LogProgress);
            (result, solver.positions_count())
        }
    };

    let elapsed_ms = start.elapsed().as_millis();

    let (solved_char, pushes) = match &result {
        Ok(solution) => ('Y', solution.push_count()),
        Err(SolveError::NoSolution) => ('N', 0),
        Err(SolveError::DeadlockAtStart) => ('X', 0),
        Err(SolveError::Cancelled) => ('C', 0),
        Err(SolveError::OutOfMemory) => ('M', 0),
    };

    println!(
        "level: {:<3}  solved: {}  pushes: {:<5}  positions: {:<12}  elapsed: {} ms",
        level_num, solved_char, pushes, positions, elapsed_ms
    );

    if let Ok(solution) = &result {
        if print_solution {
            print_solved_level(board, solution);
        }
        if let Some(directory) = save {
            if let Err(error) = save_solution(directory, level_num, solution) {
                eprintln!("Error saving solution for level {}: {}", level_num, error);
            }
        }
    }

    LevelStats {
        solved: result.is_ok(),
        pushes,
        positions,
        elapsed_ms,
    }
}

fn print_solved_level(board: &Board, solution: &Solution) {
    println!("\nStarting position:\n{}", board);
    println!("Solution ({}): {}", solution.name, solution.lurd);

    let mut replay = board.clone();
    let mut push_no = 0;
    let total = solution.push_count();
    for ch in solution.lurd.chars() {
        if let Err(error) = history::replay_lurd(&mut replay, &ch.to_string()) {
            eprintln!("Solution replay failed: {}", error);
            return;
        }
        if ch.is_ascii_uppercase() {
            push_no += 1;
            println!("Push {}/{}:\n{}", push_no, total, replay);
        }
    }
}

fn save_solution(
    directory: &PathBuf,
    level_num: usize,
    solution: &Solution,
) -> std::io::Result<()> {
    std::fs::create_dir_all(directory)?;
    let file_name = os::sanitize_file_name(&format!("level {} {}", level_num, solution.name));
    let path = directory.join(format!("{}.lurd", file_name));
    std::fs::write(path, format!("{}\n", solution.lurd))
}

fn run_solve(
    levels_file: &str,
    level_start: usize,
    level_end: Option<usize>,
    solver_kind: SolverKind,
    print_solution: bool,
    save: Option<PathBuf>,
) {
    let levels = match Levels::from_file(levels_file) {
        Ok(levels) => levels,
        Err(error) => {
            eprintln!("Error loading levels: {}", error);
            std::process::exit(1);
        }
    };

    let level_end = level_end.unwrap_or(level_start);
    if level_start == 0 {
        eprintln!("Error: level numbers must be at least 1");
        std::process::exit(1);
    }
    if level_end < level_start {
        eprintln!("Error: level end must be >= level start");
        std::process::exit(1);
    }
    if level_end > levels.len() {
        eprintln!(
            "Error: level {} not found (file contains {} levels)",
            level_end,
            levels.len()
        );
        std::process::exit(1);
    }

    let num_levels = level_end - level_start + 1;
    if print_solution && num_levels > 1 {
        eprintln!("Error: solution printing only supported when solving a single level");
        std::process::exit(1);
    }

    let mut total_solved = 0;
    let mut total_pushes = 0;
    let mut total_positions = 0;
    let mut total_time_ms = 0;

    for level_num in level_start..=level_end {
        let board = levels.get(level_num - 1).unwrap();
        let stats = solve_level(board, level_num, solver_kind, print_solution, save.as_ref());

        if stats.solved {
            total_solved += 1;
        }
        total_pushes += stats.pushes;
        total_positions += stats.positions;
        total_time_ms += stats.elapsed_ms;
    }

    if num_levels > 1 {
        println!("---");
        println!(
            "solved: {:>3}/{:<3}        pushes: {:<5}  positions: {:<12}  elapsed: {} ms",
            total_solved, num_levels, total_pushes, total_positions, total_time_ms
        );
    }
}

fn run_reconstruct(lurd: &str) {
    match try_convert_lurd_to_puzzle(lurd) {
        Ok(puzzle) if puzzle.is_empty() => {
            eprintln!("Error: the trace contains no moves");
            std::process::exit(1);
        }
        Ok(puzzle) => print!("{}", puzzle),
        Err(error) => {
            eprintln!("Error: invalid trace: {}", error);
            std::process::exit(1);
        }
    }
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    match args.command {
        Command::Solve {
            levels_file,
            level_start,
            level_end,
            solver,
            print_solution,
            save,
        } => run_solve(
            &levels_file,
            level_start,
            level_end,
            solver,
            print_solution,
            save,
        ),
        Command::Reconstruct { lurd } => run_reconstruct(&lurd),
    }
}
