use clap::{Parser, ValueEnum};
use log::info;
use sokoban_astar::{
    Action, Board, CostModel, DeadSquares, GoalDistanceHeuristic, Heuristic, HeuristicConfig,
    NullHeuristic, SolveResult, Solver, SolverConfig,
    levels::Levels,
    solver::Tracer,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum HeuristicType {
    GoalDistance,
    Null,
}

fn print_solution(board: &Board, actions: &[Action]) {
    println!("\nStarting position:\n{}", board);
    let mut board = board.clone();
    let total = actions.len();
    for (count, action) in actions.iter().enumerate() {
        action.perform(&mut board);
        println!("{} ({}/{}):\n{}", action, count + 1, total, board);
    }
}

struct VerboseTracer {
    trace_start: usize,
    trace_end: usize,
}

impl VerboseTracer {
    fn new(from_node: usize, to_node: usize) -> Self {
        Self {
            trace_start: from_node,
            trace_end: to_node,
        }
    }
}

impl Tracer for VerboseTracer {
    fn trace(
        &self,
        board: &Board,
        nodes_expanded: usize,
        f_cost: f64,
        g_cost: f64,
        action: Option<Action>,
    ) {
        if self.trace_start <= nodes_expanded && nodes_expanded <= self.trace_end {
            let action = action.map_or_else(|| "start".to_string(), |a| a.to_string());
            println!(
                "action={}, count={}, f_cost={:.1}, g_cost={:.1}:\n{}",
                action, nodes_expanded, f_cost, g_cost, board
            );
        }
    }
}

struct LevelStats {
    solved: bool,
    steps: usize,
    nodes_expanded: usize,
    elapsed_ms: u128,
}

struct SolveOpts {
    level_num: usize,
    config: SolverConfig,
    timeout: Option<Duration>,
    print_solution: bool,
    trace_range: Option<(usize, usize)>,
}

/// Raise the interrupt flag once the timeout expires. The timer thread is
/// left to finish on its own if the search ends first.
fn arm_timeout(timeout: Duration) -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let timer_flag = flag.clone();
    thread::spawn(move || {
        thread::sleep(timeout);
        timer_flag.store(true, Ordering::Relaxed);
    });
    flag
}

fn solve_level_helper<H: Heuristic>(board: &Board, opts: SolveOpts, heuristic: H) -> LevelStats {
    let start = Instant::now();
    let dead = DeadSquares::detect(board);
    info!(
        "level {}: {} dead squares\n{}",
        opts.level_num,
        dead.count(),
        dead
    );

    let mut solver = Solver::new(heuristic, opts.config);
    if let Some(timeout) = opts.timeout {
        solver.set_interrupt(arm_timeout(timeout));
    }
    if let Some((trace_start, trace_end)) = opts.trace_range {
        solver.set_tracer(Box::new(VerboseTracer::new(trace_start, trace_end)));
    }

    let result = solver.solve(board, &dead);
    let elapsed_ms = start.elapsed().as_millis();

    let (solved_char, steps, pushes, cost, solved) = match &result {
        SolveResult::Solved(solution) => (
            'Y',
            solution.actions.len(),
            solution.push_count(),
            solution.cost,
            true,
        ),
        SolveResult::Cutoff => ('N', 0, 0, 0.0, false),
        SolveResult::Impossible => ('X', 0, 0, 0.0, false),
    };

    println!(
        "level: {:<3}  solved: {}  steps: {:<5}  pushes: {:<4}  cost: {:<8.1}  states: {:<12}  elapsed: {} ms",
        opts.level_num,
        solved_char,
        steps,
        pushes,
        cost,
        solver.nodes_expanded(),
        elapsed_ms
    );

    if let SolveResult::Solved(solution) = result {
        info!("level {}: {}", opts.level_num, solution.lurd());
        if opts.print_solution {
            print_solution(board, &solution.actions);
        }
    }

    LevelStats {
        solved,
        steps,
        nodes_expanded: solver.nodes_expanded(),
        elapsed_ms,
    }
}

fn solve_level(
    board: &Board,
    opts: SolveOpts,
    heuristic_type: HeuristicType,
    heuristic_config: HeuristicConfig,
) -> LevelStats {
    match heuristic_type {
        HeuristicType::GoalDistance => solve_level_helper(
            board,
            opts,
            GoalDistanceHeuristic::new(board, heuristic_config),
        ),
        HeuristicType::Null => solve_level_helper(board, opts, NullHeuristic::new()),
    }
}

#[derive(Parser)]
#[command(name = "sokoban-astar")]
#[command(about = "A best-first Sokoban solver", long_about = None)]
struct Args {
    /// Path to the levels file (XSB format)
    #[arg(value_name = "FILE")]
    levels_file: String,

    /// Level number to solve (1-indexed), or start of range
    #[arg(value_name = "LEVEL")]
    level_start: usize,

    /// Optional end of level range (inclusive, 1-indexed)
    #[arg(value_name = "LEVEL_END")]
    level_end: Option<usize>,

    /// Print the solution step-by-step
    #[arg(short, long)]
    print_solution: bool,

    /// Maximum number of nodes to expand before giving up (0 = unlimited)
    #[arg(short = 'n', long, default_value = "5000000")]
    max_nodes_expanded: usize,

    /// Per-level wall-clock limit in seconds
    #[arg(short = 't', long)]
    timeout: Option<f64>,

    /// Heuristic to use for solving
    #[arg(short = 'H', long, value_enum, default_value = "goal-distance")]
    heuristic: HeuristicType,

    /// Use the never-overestimating heuristic configuration
    #[arg(long, default_value = "false")]
    admissible: bool,

    /// Penalty for a misplaced box on a dead square
    #[arg(long, conflicts_with = "admissible")]
    dead_penalty: Option<f64>,

    /// Penalty for each wall between a box and a goal
    #[arg(long, conflicts_with = "admissible")]
    wall_penalty: Option<f64>,

    /// Cost of a push (a move costs 1.0)
    #[arg(long, default_value = "1.1")]
    push_cost: f64,

    /// Range of expansion numbers to trace (start, end)
    #[arg(long, num_args = 2)]
    trace_range: Option<Vec<usize>>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    // Load levels from file
    let levels = match Levels::from_file(&args.levels_file) {
        Ok(levels) => levels,
        Err(e) => {
            eprintln!("Error loading levels: {}", e);
            std::process::exit(1);
        }
    };

    // Determine the range of levels to solve
    let level_end = args.level_end.unwrap_or(args.level_start);

    // Validate range
    if args.level_start == 0 {
        eprintln!("Error: level numbers must be at least 1");
        std::process::exit(1);
    }

    if level_end < args.level_start {
        eprintln!("Error: level end must be >= level start");
        std::process::exit(1);
    }

    let num_levels = level_end - args.level_start + 1;

    if level_end > levels.len() {
        eprintln!(
            "Error: level {} not found (file contains {} levels)",
            level_end,
            levels.len()
        );
        std::process::exit(1);
    }

    if args.print_solution && num_levels > 1 {
        eprintln!("Error: solution printing only supported when solving a single level");
        std::process::exit(1);
    }

    // Validate trace_range
    if let Some(ref range) = args.trace_range {
        if range[0] > range[1] {
            eprintln!("Error: trace range start must be <= end");
            std::process::exit(1);
        }
    }

    if !(args.push_cost.is_finite() && args.push_cost > 1.0) {
        eprintln!("Error: push cost must be greater than the move cost (1.0)");
        std::process::exit(1);
    }

    let timeout = match args.timeout {
        Some(secs) if secs > 0.0 && secs.is_finite() => Some(Duration::from_secs_f64(secs)),
        Some(_) => {
            eprintln!("Error: timeout must be a positive number of seconds");
            std::process::exit(1);
        }
        None => None,
    };

    for (name, penalty) in [
        ("dead penalty", args.dead_penalty),
        ("wall penalty", args.wall_penalty),
    ] {
        if penalty.is_some_and(|p| !(p.is_finite() && p >= 0.0)) {
            eprintln!("Error: {} must be a non-negative number", name);
            std::process::exit(1);
        }
    }

    let heuristic_config = if args.admissible {
        HeuristicConfig::admissible()
    } else {
        let defaults = HeuristicConfig::default();
        HeuristicConfig {
            dead_square_penalty: args.dead_penalty.or(defaults.dead_square_penalty),
            wall_penalty: args.wall_penalty.unwrap_or(defaults.wall_penalty),
        }
    };

    let config = SolverConfig {
        costs: CostModel {
            push_cost: args.push_cost,
            ..CostModel::default()
        },
        max_expansions: (args.max_nodes_expanded > 0).then_some(args.max_nodes_expanded),
    };

    // Parse trace_range from Vec to tuple
    let trace_range = args.trace_range.as_ref().map(|v| (v[0], v[1]));

    // Solve each level in the range
    let mut total_solved = 0;
    let mut total_steps = 0;
    let mut total_states = 0;
    let mut total_time_ms = 0;

    for level_num in args.level_start..=level_end {
        let Some(board) = levels.get(level_num - 1) else {
            continue;
        };
        let opts = SolveOpts {
            level_num,
            config,
            timeout,
            print_solution: args.print_solution,
            trace_range,
        };
        let stats = solve_level(board, opts, args.heuristic, heuristic_config);

        if stats.solved {
            total_solved += 1;
        }
        total_steps += stats.steps;
        total_states += stats.nodes_expanded;
        total_time_ms += stats.elapsed_ms;
    }

    // Print summary statistics if multiple levels were solved
    if num_levels > 1 {
        println!("---");
        println!(
            "solved: {:>3}/{:<3}        steps: {:<5}  states: {:<12}  elapsed: {} ms",
            total_solved, num_levels, total_steps, total_states, total_time_ms
        );
    }
}
