use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use slide2048::board::Board;
use slide2048::engine::Move;
use slide2048::expectimax::{Expectimax, ExpectimaxParallel, SearchConfig};
use slide2048::tables;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "slide2048", version, about = "Pick the expectimax move for a packed 2048 board")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); logs go to stderr
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the selected move code: 0 up, 1 down, 2 left, 3 right, -1 no legal move
    Select {
        /// Packed board, decimal or 0x-prefixed hexadecimal
        board: String,
        #[command(flatten)]
        search: SearchArgs,
        /// Score the four root moves on separate threads
        #[arg(long)]
        parallel: bool,
    },
    /// Print the value of every root move
    Branches {
        /// Packed board, decimal or 0x-prefixed hexadecimal
        board: String,
        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Cumulative spawn probability below which chance nodes are leaves
    #[arg(long, default_value_t = 1e-4)]
    prob_threshold: f32,
    /// Chance nodes at this depth or deeper are not cached
    #[arg(long, default_value_t = 15)]
    cache_depth_limit: u32,
    /// Disable the transposition cache
    #[arg(long)]
    no_cache: bool,
    /// Cap on the dynamic search depth
    #[arg(long)]
    depth_cap: Option<u32>,
    /// Node limit per root move
    #[arg(long)]
    node_budget: Option<u64>,
}

impl From<SearchArgs> for SearchConfig {
    fn from(args: SearchArgs) -> Self {
        SearchConfig {
            prob_threshold: args.prob_threshold,
            cache_depth_limit: args.cache_depth_limit,
            cache_enabled: !args.no_cache,
            depth_cap: args.depth_cap,
            node_budget: args.node_budget,
            cancel: None,
        }
    }
}

fn parse_board(raw: &str) -> anyhow::Result<Board> {
    raw.parse::<Board>().with_context(|| format!("reading board argument {raw:?}"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_max_level(level).init();
    tables::init();

    match cli.cmd {
        Command::Select { board, search, parallel } => {
            let board = parse_board(&board)?;
            let cfg = SearchConfig::from(search);
            let (selected, stats) = if parallel {
                let mut policy = ExpectimaxParallel::with_config(cfg);
                (policy.best_move(board), policy.last_stats())
            } else {
                let mut policy = Expectimax::with_config(cfg);
                (policy.best_move(board), policy.last_stats())
            };
            info!(?board, ?selected, nodes = stats.nodes, cache_hits = stats.cache_hits, "selected move");
            println!("{}", Move::code_of(selected));
        }
        Command::Branches { board, search } => {
            let board = parse_board(&board)?;
            let mut policy = Expectimax::with_config(SearchConfig::from(search));
            for branch in policy.branch_evals(board) {
                if branch.legal {
                    println!("{:?}\t{}\t{:.3}", branch.dir, branch.dir.code(), branch.ev);
                } else {
                    println!("{:?}\t{}\tillegal", branch.dir, branch.dir.code());
                }
            }
        }
    }
    Ok(())
}
