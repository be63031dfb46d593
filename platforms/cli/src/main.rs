use clap::Parser;
use std::error::Error;
use std::io::{self, Read};
use std::path::Path;
use tmsim::{Definition, ProgramLoader, Snapshot, TuringMachine, Verdict, DEFAULT_MAX_STEPS};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Runs a deterministic single-tape Turing machine on one or more inputs.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(after_help = "EXAMPLES:
  tmsim-cli -m machines/ends-with-abb.tm -i aabb -i aab
  cat machines/zeros-then-ones.tm | tmsim-cli -i 0011 --debug")]
struct Cli {
    /// Path to a machine definition (.tm or .json).
    /// Read from stdin when omitted.
    #[clap(short, long)]
    machine: Option<String>,

    /// An input string to run. Repeat for several runs; runs the empty input when omitted.
    #[clap(short, long)]
    input: Vec<String>,

    /// Reject a run that has not halted after this many steps
    #[clap(long, default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: usize,

    /// Print each step of the execution
    #[clap(short = 'd', long)]
    debug: bool,

    /// Refuse inputs with symbols outside the input alphabet
    #[clap(long)]
    strict: bool,

    /// Blank cells shown on each side of the written tape
    #[clap(long, default_value_t = 2)]
    radius: usize,
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let cli = Cli::parse();

    let definition = match load_definition(&cli) {
        Ok(definition) => definition,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        machine = %definition.name,
        states = definition.states.len(),
        transitions = definition.transition_count(),
        "definition loaded"
    );

    let mut machine = TuringMachine::try_new(definition)?;

    let inputs = if cli.input.is_empty() {
        vec![String::new()]
    } else {
        cli.input.clone()
    };

    for input in &inputs {
        if cli.strict {
            if let Err(e) = machine.load_checked(input) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        } else {
            machine.load(input);
        }

        if cli.debug {
            trace_run(&mut machine, cli.max_steps, cli.radius);
        }

        // After a traced run this only applies the step limit policy
        let verdict = machine.run(cli.max_steps);
        print_result(input, &machine, verdict, cli.radius);
    }

    Ok(())
}

/// Installs the log subscriber. `RUST_LOG` overrides the default `warn` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

/// Loads the definition from `--machine`, or from stdin when it is piped.
fn load_definition(cli: &Cli) -> Result<Definition, String> {
    if let Some(path) = &cli.machine {
        ProgramLoader::load_definition(Path::new(path)).map_err(|e| e.to_string())
    } else if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {}", e))?;

        let definition = if buffer.trim_start().starts_with('{') {
            ProgramLoader::load_definition_from_json(&buffer)
        } else {
            ProgramLoader::load_definition_from_string(&buffer)
        };
        definition.map_err(|e| e.to_string())
    } else {
        Err("No machine definition given. Use --machine or pipe one on stdin.".to_string())
    }
}

/// Steps the machine, printing the run state before every transition.
fn trace_run(machine: &mut TuringMachine, max_steps: usize, radius: usize) {
    loop {
        let snapshot = machine.snapshot_with_radius(radius);
        println!(
            "Step: {}, State: {}, Head: {}, Symbol: '{}', Tape: {}",
            snapshot.step_count,
            snapshot.state,
            snapshot.head,
            snapshot.symbol,
            render_tape(&snapshot)
        );

        if machine.step_count() >= max_steps || !machine.step().can_continue() {
            break;
        }
    }
}

fn print_result(input: &str, machine: &TuringMachine, verdict: Verdict, radius: usize) {
    let outcome = match verdict {
        Verdict::Accepted => "accepted",
        Verdict::Rejected => "rejected",
        Verdict::Undecided => "undecided",
    };

    let reason = machine
        .rejection()
        .map(|rejection| format!(", {}", rejection))
        .unwrap_or_default();

    println!(
        "\"{}\": {} after {} steps (state {}, head {}{})",
        input,
        outcome,
        machine.step_count(),
        machine.state(),
        machine.head(),
        reason
    );
    println!("  {}", render_tape(&machine.snapshot_with_radius(radius)));
}

/// Renders the tape window with the head cell in brackets, e.g. ` _  a [b] _ `.
fn render_tape(snapshot: &Snapshot) -> String {
    snapshot
        .tape
        .iter()
        .map(|(&position, &symbol)| {
            if position == snapshot.head {
                format!("[{symbol}]")
            } else {
                format!(" {symbol} ")
            }
        })
        .collect()
}
