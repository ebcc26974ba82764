use clap::{Args, Parser as ClapParser, Subcommand};
use jpq::ResultOptions;
use jpq::cli::{self, CliError, QueryOptions};
use jpq::output::render;
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "jpq")]
#[command(about = "jpq - JSONPath queries with normalized paths and in-place edits")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// JSON input (reads from stdin if not provided)
    #[arg(short, long)]
    input: Option<String>,

    /// Pretty-print the output
    #[arg(short, long)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a path expression and print the matches
    Query {
        /// The path expression, e.g. '$.store.book[?(@.price < 10)]'
        expression: String,

        #[command(flatten)]
        io: InputArgs,

        /// Print normalized paths instead of values
        #[arg(long, conflicts_with = "pairs")]
        paths: bool,

        /// Print {"path", "value"} pairs
        #[arg(long)]
        pairs: bool,

        /// Drop repeated paths, keeping the first
        #[arg(long)]
        dedup: bool,

        /// Order matches by path
        #[arg(long)]
        sort: bool,

        /// Order matches by path, descending
        #[arg(long)]
        sort_desc: bool,

        /// Recursive descent depth limit
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Print the distinct normalized paths of the matches, in order
    Paths {
        expression: String,

        #[command(flatten)]
        io: InputArgs,
    },

    /// Validate an expression without evaluating it
    Check { expression: String },

    /// Remove every match and print the edited document
    Remove {
        expression: String,

        #[command(flatten)]
        io: InputArgs,
    },

    /// Overwrite every match with a JSON value and print the edited document
    Replace {
        expression: String,

        /// Replacement, as JSON
        #[arg(long)]
        value: String,

        #[command(flatten)]
        io: InputArgs,
    },

    /// Store a JSON value at one normalized path
    Set {
        /// Normalized path, e.g. "$['a'][0]" or $.a[0]
        path: String,

        /// New value, as JSON
        #[arg(long)]
        value: String,

        /// Create missing members, elements and containers
        #[arg(long)]
        create: bool,

        #[command(flatten)]
        io: InputArgs,
    },

    /// Map every leaf to its normalized path
    Flatten {
        #[command(flatten)]
        io: InputArgs,
    },

    /// Rebuild a document from flattened path/value pairs
    Unflatten {
        #[command(flatten)]
        io: InputArgs,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Query {
            expression,
            io,
            paths,
            pairs,
            dedup,
            sort,
            sort_desc,
            max_depth,
        } => run_query(expression, io, paths, pairs, dedup, sort, sort_desc, max_depth),
        Commands::Paths { expression, io } => {
            run_query(expression, io, true, false, true, true, false, None)
        }
        Commands::Check { expression } => {
            cli::execute_check(&expression).map(|()| println!("Expression is valid"))
        }
        Commands::Remove { expression, io } => read_input(io.input)
            .and_then(|input| cli::execute_remove(&expression, input.as_deref()))
            .map(|doc| println!("{}", render(&doc, io.pretty))),
        Commands::Replace {
            expression,
            value,
            io,
        } => read_input(io.input)
            .and_then(|input| cli::execute_replace(&expression, input.as_deref(), &value))
            .map(|doc| println!("{}", render(&doc, io.pretty))),
        Commands::Set {
            path,
            value,
            create,
            io,
        } => read_input(io.input)
            .and_then(|input| cli::execute_set(&path, input.as_deref(), &value, create))
            .map(|doc| println!("{}", render(&doc, io.pretty))),
        Commands::Flatten { io } => read_input(io.input)
            .and_then(|input| cli::execute_flatten(input.as_deref()))
            .map(|doc| println!("{}", render(&doc, io.pretty))),
        Commands::Unflatten { io } => read_input(io.input)
            .and_then(|input| cli::execute_unflatten(input.as_deref()))
            .map(|doc| println!("{}", render(&doc, io.pretty))),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

/// `--input` if given, otherwise stdin when it is not a terminal.
fn read_input(input: Option<String>) -> Result<Option<String>, CliError> {
    match input {
        Some(s) => Ok(Some(s)),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(Some(buffer))
        }
        None => Ok(None),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_query(
    expression: String,
    io: InputArgs,
    paths: bool,
    pairs: bool,
    dedup: bool,
    sort: bool,
    sort_desc: bool,
    max_depth: Option<usize>,
) -> Result<(), CliError> {
    let result = ResultOptions {
        want_value: !paths,
        want_path: paths || pairs,
        dedup,
        sort,
        sort_descending: sort_desc,
    };

    let options = QueryOptions {
        expression,
        input: read_input(io.input)?,
        result,
        max_depth,
    };

    let output = cli::execute_query(&options)?;
    println!("{}", render(&output, io.pretty));
    Ok(())
}
