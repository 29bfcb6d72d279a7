//! `stinger` binary: the thin CLI adapter over the pipeline engine (spec
//! §6.3). Not part of core semantics — every command here is a translator
//! from a CLI invocation into the same `Pipeline` calls a library caller
//! would make.

mod cli;

use clap::Parser;
use cli::{Cli, Command};
use stinger_engine::{Pipeline, PipelineResult};

/// Preset `check-prompt`/`check-response` load when none is given: spec
/// §6.3 names `customer-service` as the CLI's default.
const DEFAULT_PRESET: &str = "customer_service";

/// A prompt chosen to exercise both the allow and block paths of the
/// default preset in one `demo` run.
const DEMO_BENIGN_PROMPT: &str = "What are your support hours?";
const DEMO_PII_PROMPT: &str = "Sure, my SSN is 123-45-6789, please update my account.";

const EXIT_SUCCESS: i32 = 0;
const EXIT_USER_ERROR: i32 = 1;
const EXIT_INTERNAL_ERROR: i32 = 2;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // `clap`'s own `exit()` uses code 2 for usage errors; spec §6.3 reserves
    // 2 for internal errors and wants 1 for user errors (bad/missing args),
    // so parse errors are mapped by hand rather than left to clap's default.
    let code = match Cli::try_parse() {
        Ok(cli) => run(cli.command).await,
        Err(err) if err.use_stderr() => {
            eprint!("{err}");
            EXIT_USER_ERROR
        }
        Err(err) => {
            print!("{err}");
            EXIT_SUCCESS
        }
    };
    std::process::exit(code);
}

async fn run(command: Command) -> i32 {
    match command {
        Command::CheckPrompt { text } => check_prompt(&text).await,
        Command::CheckResponse { text } => check_response(&text).await,
        Command::Demo => demo().await,
        Command::Health { detailed } => health(detailed),
        Command::Setup => setup(),
    }
}

fn load_default_pipeline() -> Result<Pipeline, i32> {
    Pipeline::from_preset(DEFAULT_PRESET).map_err(|err| {
        eprintln!("error: failed to load '{DEFAULT_PRESET}' preset: {err}");
        EXIT_INTERNAL_ERROR
    })
}

async fn check_prompt(text: &str) -> i32 {
    let pipeline = match load_default_pipeline() {
        Ok(p) => p,
        Err(code) => return code,
    };
    let result = pipeline.check_input_async(text, None, None).await;
    print_result(&result);
    EXIT_SUCCESS
}

async fn check_response(text: &str) -> i32 {
    let pipeline = match load_default_pipeline() {
        Ok(p) => p,
        Err(code) => return code,
    };
    let result = pipeline.check_output_async(text, None, None).await;
    print_result(&result);
    EXIT_SUCCESS
}

async fn demo() -> i32 {
    let pipeline = match load_default_pipeline() {
        Ok(p) => p,
        Err(code) => return code,
    };

    println!("Stinger demo — preset '{DEFAULT_PRESET}'\n");

    println!("> check-prompt: {DEMO_BENIGN_PROMPT:?}");
    let benign = pipeline.check_input_async(DEMO_BENIGN_PROMPT, None, None).await;
    print_result(&benign);

    println!("\n> check-prompt: {DEMO_PII_PROMPT:?}");
    let pii = pipeline.check_input_async(DEMO_PII_PROMPT, None, None).await;
    print_result(&pii);

    EXIT_SUCCESS
}

fn health(detailed: bool) -> i32 {
    let pipeline = match load_default_pipeline() {
        Ok(p) => p,
        Err(code) => return code,
    };
    let snapshot = pipeline.get_system_health(Default::default());
    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("error: failed to serialize health snapshot: {err}");
            return EXIT_INTERNAL_ERROR;
        }
    }

    if detailed {
        let configs = pipeline.get_guardrail_configs();
        match serde_json::to_string_pretty(&configs) {
            Ok(json) => println!("\nguardrail configs:\n{json}"),
            Err(err) => {
                eprintln!("error: failed to serialize guardrail configs: {err}");
                return EXIT_INTERNAL_ERROR;
            }
        }
        let errors = pipeline.construction_errors();
        if !errors.is_empty() {
            println!("\nconstruction errors:");
            for err in errors {
                println!("  - {err}");
            }
        }
    }

    EXIT_SUCCESS
}

/// `setup` is the interactive configuration wizard; it lives outside the
/// engine core (spec.md §1 lists CLI wizards as out of scope) so this
/// command is a stub that tells the operator as much rather than pretend
/// to be a real wizard.
fn setup() -> i32 {
    println!("setup: the interactive configuration wizard is not part of the engine core.");
    println!("Hand-author a pipeline config (see the bundled presets) and load it with");
    println!("`Pipeline::from_yaml_file` or one of the `--preset` style entry points instead.");
    EXIT_SUCCESS
}

fn print_result(result: &PipelineResult) {
    if result.blocked {
        println!("BLOCKED");
    } else if !result.warnings.is_empty() {
        println!("ALLOWED (with warnings)");
    } else {
        println!("ALLOWED");
    }
    for reason in &result.reasons {
        println!("  reason: {reason}");
    }
    for warning in &result.warnings {
        println!("  warning: {warning}");
    }
    println!("  processing_time_ms: {}", result.processing_time_ms);
}
