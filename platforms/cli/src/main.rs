use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::io::{self, BufRead};
use std::path::Path;
use std::process::ExitCode;
use std::thread;
use tmsim::{
    full_match, patterns, AutoRunner, Catalog, MachineError, Program, ProgramLoader,
    RunOutcome, RunnerConfig, Snapshot, Step, TuringMachine, Verdict, PREDEFINED_PATTERNS,
};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

const EXIT_REJECTED: u8 = 1;
const EXIT_UNFINISHED: u8 = 2;
const EXIT_ERROR: u8 = 3;

/// Cells of BLANK padding shown on each side of the tape in traces.
const TAPE_PADDING: usize = 2;

/// Step through Turing machines and check strings against patterns.
#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
#[clap(after_help = "EXAMPLES:
  tmsim list
  tmsim run '0*1*' 0011 --trace
  tmsim run machines/an-bn.tm aabb --delay-ms 200
  tmsim regex '(a|b)*abb' babb")]
struct Cli {
    /// Log engine activity (same as RUST_LOG=debug)
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the bundled machines
    List,
    /// Print the rules of a machine
    Show {
        /// Catalog name or path to a .tm file
        machine: String,
    },
    /// Run a machine on an input string
    Run(RunArgs),
    /// Check whether a whole string matches a pattern
    Regex { pattern: String, input: String },
    /// List the bundled patterns
    Patterns,
}

#[derive(Args)]
struct RunArgs {
    /// Catalog name or path to a .tm file
    machine: String,

    /// The input written on the tape
    #[clap(default_value = "")]
    input: String,

    /// Print the tape after every step
    #[clap(short, long)]
    trace: bool,

    /// Pause between steps, in milliseconds. Press Enter to pause an interactive run.
    #[clap(short, long, default_value_t = 0)]
    delay_ms: u64,

    /// Give up after this many steps
    #[clap(short, long)]
    max_steps: Option<usize>,

    /// Print the final state as JSON
    #[clap(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    machine: &'a str,
    input: &'a str,
    outcome: RunOutcome,
    snapshot: Snapshot,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::List => list_machines(),
        Command::Show { machine } => show_machine(&machine),
        Command::Run(args) => run_machine(&args),
        Command::Regex { pattern, input } => check_pattern(&pattern, &input),
        Command::Patterns => list_patterns(),
    };

    result.unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        ExitCode::from(EXIT_ERROR)
    })
}

/// Installs a stderr subscriber; `RUST_LOG` overrides the default filter.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Resolves a catalog name first, then a file path.
fn resolve(machine: &str) -> Result<Program, MachineError> {
    match Catalog::get_by_name(machine) {
        Ok(program) => Ok(program),
        Err(_) if Path::new(machine).is_file() => ProgramLoader::load_program(Path::new(machine)),
        Err(e) => Err(e),
    }
}

fn list_machines() -> Result<ExitCode, Box<dyn std::error::Error>> {
    for index in 0..Catalog::count() {
        let info = Catalog::info(index)?;
        println!(
            "{:>2}. {:<10} start={} states={} transitions={}",
            info.index, info.name, info.start, info.state_count, info.transition_count
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn show_machine(machine: &str) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let program = resolve(machine)?;
    let definition = &program.definition;

    let join = |states: &std::collections::BTreeSet<String>| {
        states.iter().cloned().collect::<Vec<_>>().join(", ")
    };

    println!("name: {}", program.name);
    println!("start: {}", definition.start());
    println!("accept: {}", join(definition.accept_states()));
    println!("reject: {}", join(definition.reject_states()));
    println!("rules:");

    let mut current: Option<String> = None;
    for rule in definition.transitions().rules() {
        if current.as_deref() != Some(rule.state.as_str()) {
            println!("  {}:", rule.state);
            current = Some(rule.state.clone());
        }
        println!(
            "    {} -> {}, {}, {}",
            format_symbol(rule.read),
            format_symbol(rule.write),
            rule.direction,
            rule.next
        );
    }

    Ok(ExitCode::SUCCESS)
}

/// Renders a symbol the way a `.tm` file spells it, quoting and escaping where needed.
fn format_symbol(symbol: char) -> String {
    match symbol {
        '\'' | '\\' => format!("'\\{symbol}'"),
        ',' | '#' => format!("'{symbol}'"),
        c if c.is_whitespace() => format!("'{c}'"),
        c => c.to_string(),
    }
}

fn run_machine(args: &RunArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let program = resolve(&args.machine)?;
    let mut machine = TuringMachine::with_input(program.definition, &args.input);

    let runner = AutoRunner::new(RunnerConfig {
        delay_ms: args.delay_ms,
        max_steps: args.max_steps,
    });

    if args.delay_ms > 0 && atty::is(atty::Stream::Stdin) {
        let token = runner.token();
        eprintln!("Press Enter to pause.");
        thread::spawn(move || {
            let mut line = String::new();
            if io::stdin().lock().read_line(&mut line).is_ok() {
                token.cancel();
            }
        });
    }

    if args.trace && !args.json {
        print_state(&machine, None);
    }

    let outcome = runner.run(&mut machine, |machine, step| {
        if args.trace && !args.json {
            print_state(machine, Some(step));
        }
    });

    debug!(?outcome, "run stopped");

    if args.json {
        let report = Report {
            machine: &program.name,
            input: &args.input,
            outcome,
            snapshot: machine.snapshot(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match outcome {
            RunOutcome::Finished(_) => {}
            RunOutcome::Cancelled => println!("Paused after {} steps.", machine.step_count()),
            RunOutcome::StepLimit => {
                println!("Step limit reached after {} steps.", machine.step_count())
            }
        }
        print_state(&machine, None);
        if let Some(verdict) = machine.result() {
            println!("Result: {}", verdict);
        }
    }

    let code = match machine.result() {
        Some(Verdict::Accepted) => ExitCode::SUCCESS,
        Some(Verdict::Rejected) => ExitCode::from(EXIT_REJECTED),
        None => ExitCode::from(EXIT_UNFINISHED),
    };

    Ok(code)
}

/// Prints one trace line: step count, state, tape with the head cell bracketed.
fn print_state(machine: &TuringMachine, step: Option<Step>) {
    let view = machine.view(TAPE_PADDING);
    let tape: String = view
        .cells
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if i == view.head {
                format!("[{c}]")
            } else {
                format!(" {c} ")
            }
        })
        .collect();

    match step {
        Some(step) => println!(
            "Step: {:>4}, State: {:<6} Tape: {} {}",
            machine.step_count(),
            machine.state(),
            tape,
            step
        ),
        None => println!(
            "Step: {:>4}, State: {:<6} Tape: {}",
            machine.step_count(),
            machine.state(),
            tape
        ),
    }
}

fn check_pattern(pattern: &str, input: &str) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let matched = full_match(pattern, input)?;

    if let Some(description) = patterns::describe(pattern) {
        println!("{}", description);
    }
    println!(
        "'{}' ~ /{}/ -> {}",
        input,
        pattern,
        if matched { "ACCEPTED" } else { "REJECTED" }
    );

    Ok(if matched {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_REJECTED)
    })
}

fn list_patterns() -> Result<ExitCode, Box<dyn std::error::Error>> {
    for info in PREDEFINED_PATTERNS {
        println!("{:<16} {}", info.pattern, info.description);
    }
    Ok(ExitCode::SUCCESS)
}
