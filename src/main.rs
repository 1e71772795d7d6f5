//! Space Publish entry point.
//!
//! ## CLI Subcommands
//!
//! - `space-publish publish` - Generate a bundle and push it to a new space
//! - `space-publish render` - Generate a bundle into a local directory
//! - `space-publish config show|defaults|validate` - Inspect configuration

use std::process::ExitCode;

use space_publish::cli::{self, config_cmd};
use space_publish::config;
use space_publish::telemetry::{init_logging, LogError};

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");
    let rest = args.get(2..).unwrap_or_default();

    let code = match command {
        "publish" => {
            if wants_help(rest) {
                print_command_help("publish");
                cli::EXIT_SUCCESS
            } else {
                start_logging();
                cli::run_publish(rest).await
            }
        }
        "render" => {
            if wants_help(rest) {
                print_command_help("render");
                cli::EXIT_SUCCESS
            } else {
                start_logging();
                cli::run_render(rest)
            }
        }
        "config" => {
            let subcommand = rest.first().map(|s| s.as_str()).unwrap_or("show");
            match subcommand {
                "show" => {
                    config_cmd::run_show();
                    cli::EXIT_SUCCESS
                }
                "defaults" => {
                    config_cmd::run_defaults();
                    cli::EXIT_SUCCESS
                }
                "validate" => config_cmd::run_validate(),
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_command_help("config");
                    cli::EXIT_USAGE
                }
            }
        }
        "help" | "--help" | "-h" => {
            match rest.first() {
                Some(subcommand) => print_command_help(subcommand),
                None => print_usage(),
            }
            cli::EXIT_SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("space-publish {}", env!("CARGO_PKG_VERSION"));
            cli::EXIT_SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            cli::EXIT_USAGE
        }
    };

    ExitCode::from(code.clamp(0, 255) as u8)
}

fn wants_help(args: &[String]) -> bool {
    args.iter().any(|a| a == "--help" || a == "-h")
}

fn start_logging() {
    let log = config::load().log;
    match init_logging(&log) {
        Ok(()) | Err(LogError::AlreadyInitialized) => {}
        Err(e) => eprintln!("Warning: logging disabled: {}", e),
    }
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "space-publish v{}
Generate a prediction-service bundle for a model and publish it to a hosting space.

USAGE:
    space-publish <COMMAND> [OPTIONS]

COMMANDS:
    publish      Generate a bundle and push it to a new space
    render       Generate a bundle into a local directory
    config       Inspect configuration (show, defaults, validate)
    version      Show version information
    help         Show this help message

OPTIONS:
    -h, --help     Show help for command
    -V, --version  Show version information

EXAMPLES:
    space-publish publish --artifact model.pkl --name \"Credit Scorer\" --owner alice --schema @fields.json
    space-publish render --schema '[\"age\",\"income\"]' --name \"Credit Scorer\" --out ./bundle
    space-publish config validate

ENVIRONMENT:
    PUBLISH_ACCOUNT        Hosting account owning published spaces
    PUBLISH_TOKEN          Hosting token (never printed)
    PUBLISH_HOST           Remote host (default: huggingface.co)
    PUBLISH_STEP_TIMEOUT   Per-step timeout in seconds (default: 180)
    PUBLISH_LOG_FORMAT     json or pretty (default: json)
    PUBLISH_LOG_LEVEL      Log filter (default: info)
    PUBLISH_LOG_FILE       Append logs to this file instead of stderr
    See `space-publish config defaults` for the full list.

EXIT CODES:
    0    Success
    1    Publish failed (filesystem, command or timeout)
    2    Invalid arguments, input or configuration
    130  Interrupted
",
        version
    );
}

/// Print detailed help for a specific command.
fn print_command_help(command: &str) {
    match command {
        "publish" => {
            eprintln!(
                "space-publish publish - Publish a model

USAGE:
    space-publish publish --artifact <PATH> --name <NAME> --schema <JSON|@FILE> [--owner <OWNER>]

OPTIONS:
    --artifact PATH   Serialized model file
    --name NAME       Model display name (also the base of the space name)
    --schema JSON     Input fields: a JSON object or an array of names; @FILE reads a file
    --owner OWNER     Requesting user, recorded in logs

DESCRIPTION:
    Renders requirements.txt, Dockerfile, README.md and main.py, stages them
    with the artifact in a temporary workspace, and pushes a single commit
    to a new space under PUBLISH_ACCOUNT. Prints the space id and endpoint
    URL as JSON. The workspace is removed on every exit path, including
    Ctrl+C.

EXIT CODES:
    0    Published
    1    Filesystem, command or timeout failure
    2    Invalid arguments, schema, artifact or templates
    130  Interrupted
"
            );
        }
        "render" => {
            eprintln!(
                "space-publish render - Generate a bundle locally

USAGE:
    space-publish render --schema <JSON|@FILE> --name <NAME> --out <DIR> [--artifact-name <FILE>]

OPTIONS:
    --schema JSON          Input fields: a JSON object or an array of names; @FILE reads a file
    --name NAME            Model display name
    --out DIR              Directory to write the bundle into (created if missing)
    --artifact-name FILE   Artifact filename referenced by the Dockerfile (default: model.pkl)
"
            );
        }
        "config" => {
            eprintln!(
                "space-publish config - Inspect configuration

USAGE:
    space-publish config [show|defaults|validate]

SUBCOMMANDS:
    show       Print effective configuration (token redacted)
    defaults   Print default values
    validate   Check for missing credentials and bad paths (exit 2 on warnings)
"
            );
        }
        _ => {
            eprintln!("No detailed help for '{}'.", command);
            print_usage();
        }
    }
}
