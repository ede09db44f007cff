//! StrideDB interactive shell
//!
//! Statements end with `;` and may span several lines. Lines starting with
//! `.` are shell commands (see `.help`).

use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use stridedb::sql::QueryResult;
use stridedb::{logging, DbConfig, Interpreter, Table};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "stridedb-cli", version, about = "Interactive StrideDB shell")]
struct Args {
    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the table files (overrides the config file).
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    log_level: String,
}

/// Where statement output goes: the terminal or a file chosen with `.output`.
enum Sink {
    Stdout,
    File(PathBuf, BufWriter<File>),
}

impl Sink {
    fn writer(&mut self) -> Box<dyn Write + '_> {
        match self {
            Sink::Stdout => Box::new(io::stdout().lock()),
            Sink::File(_, file) => Box::new(file),
        }
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    logging::init(logging::parse_level(&args.log_level)).context("installing logger")?;

    let mut config = match &args.config {
        Some(path) => DbConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => DbConfig::default(),
    };
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }

    interactive_mode(Interpreter::new(config))
}

fn interactive_mode(interpreter: Interpreter) -> Result<()> {
    println!("StrideDB v{}", VERSION);
    println!("Data directory: {}", interpreter.config().data_dir.display());
    println!("Type '.help' for help, '.exit' to quit\n");

    let stdin = io::stdin();
    let mut buffer = String::new();
    let mut statement = String::new();
    let mut sink = Sink::Stdout;

    loop {
        if statement.is_empty() {
            print!("stridedb> ");
        } else {
            print!("       -> ");
        }
        io::stdout().flush()?;

        buffer.clear();
        if stdin.lock().read_line(&mut buffer)? == 0 {
            break;
        }
        let input = buffer.trim();

        if input.starts_with('.') {
            if !statement.is_empty() {
                eprintln!("⚠️  Incomplete statement discarded");
                statement.clear();
            }
            if !shell_command(&interpreter, input, &mut sink)? {
                break;
            }
            continue;
        }

        if input.is_empty() {
            continue;
        }

        statement.push_str(input);
        statement.push(' ');

        if input.ends_with(';') {
            let sql = statement.trim().trim_end_matches(';');
            let result = {
                let mut out = sink.writer();
                let result = interpreter.execute(sql, &mut out);
                out.flush()?;
                result
            };
            match result {
                Ok(result) => display_result(&result),
                Err(e) => eprintln!("❌ Error: {}", e),
            }
            statement.clear();
        }
    }

    Ok(())
}

/// Run one dot-command. Returns `false` when the shell should exit.
fn shell_command(interpreter: &Interpreter, input: &str, sink: &mut Sink) -> Result<bool> {
    let mut parts = input.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let argument = parts.next();

    match (command, argument) {
        (".exit" | ".quit", _) => {
            println!("Goodbye!");
            return Ok(false);
        }
        (".help", _) => print_interactive_help(),
        (".tables", _) => match Table::list(interpreter.config()) {
            Ok(tables) if tables.is_empty() => println!("No tables found"),
            Ok(tables) => {
                for table in tables {
                    println!("  {}", table);
                }
            }
            Err(e) => eprintln!("❌ Error: {}", e),
        },
        (".schema", Some(name)) => {
            let shown = Table::open(interpreter.config(), name)
                .map_err(stridedb::Error::from)
                .and_then(|table| table.render_header(&mut io::stdout().lock()));
            if let Err(e) = shown {
                eprintln!("❌ Error: {}", e);
            }
        }
        (".output", Some("stdout")) | (".output", None) => {
            *sink = Sink::Stdout;
            println!("Output: stdout");
        }
        (".output", Some(path)) => match File::create(path) {
            Ok(file) => {
                println!("Output: {}", path);
                *sink = Sink::File(PathBuf::from(path), BufWriter::new(file));
            }
            Err(e) => eprintln!("❌ Error: can't open {}: {}", path, e),
        },
        _ => {
            eprintln!("❌ Unknown command: {}", input);
            println!("Type '.help' for available commands");
        }
    }
    if let Sink::File(path, file) = sink {
        file.flush()
            .with_context(|| format!("flushing {}", path.display()))?;
    }
    Ok(true)
}

fn display_result(result: &QueryResult) {
    match result {
        QueryResult::Definition { message } => println!("✅ {}", message),
        QueryResult::Modification { affected_rows } => println!("✅ {} row(s) affected", affected_rows),
        QueryResult::Select { indices, .. } => println!("\n{} row(s) returned", indices.len()),
    }
}

fn print_interactive_help() {
    println!(
        r#"
Shell commands:
  .help              Show this help
  .exit, .quit       Leave the shell
  .tables            List tables in the data directory
  .schema <table>    Show the field names of a table
  .output <file>     Send statement output to a file
  .output stdout     Send statement output to the terminal

Statements (end each with ';'):
  CREATE TABLE people (name TEXT(10), age LONG);
  INSERT INTO people ('Ann', 31);
  SELECT name FROM people WHERE age > 30;
  SELECT * FROM people WHERE name LIKE 'A.*';
  UPDATE people SET age = age + 1 WHERE name IN ('Ann', 'Bob');
  DELETE FROM people WHERE NOT (age >= 18 AND age < 65);
  DROP TABLE people;

SELECT, UPDATE and DELETE need a WHERE clause; use WHERE ALL to match every
row.
"#
    );
}
