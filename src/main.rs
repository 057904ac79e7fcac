//! livegen CLI Entry Point
//!
//! Reads a request document and writes the live workflow descriptor.
//!
//! # Usage
//!
//! ```bash
//! # Generate live.yaml from a request
//! livegen generate request.yaml
//!
//! # Write somewhere else, with annotated leaves
//! livegen generate request.json --output .apolo/live.yml --annotate
//!
//! # Reject job volume references to undeclared volumes
//! livegen generate request.yaml --strict-refs
//!
//! # Show defaults and field descriptions
//! livegen defaults
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use colored::Colorize;
use log::{error, info};

use livegen::generation::{GenerateError, Generator, GeneratorConfig};
use livegen::template::AnnotationMode;
use livegen::workflow::load_request;
use livegen::{APP_NAME, VERSION};

/// Exit code for requests the user has to fix.
const EXIT_CLIENT_ERROR: u8 = 2;

/// Subcommand selected on the command line.
#[derive(Debug, PartialEq)]
enum Command {
    Generate,
    Defaults,
}

/// Command-line configuration parsed from arguments.
#[derive(Debug)]
struct Config {
    command: Command,
    request_path: Option<PathBuf>,
    output: Option<PathBuf>,
    dockerfile: Option<PathBuf>,
    annotate: bool,
    strict_refs: bool,
    require_title: bool,
    json: bool,
    verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command: Command::Generate,
            request_path: None,
            output: None,
            dockerfile: None,
            annotate: false,
            strict_refs: false,
            require_title: false,
            json: false,
            verbose: false,
        }
    }
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints the application banner with version information.
fn print_banner() {
    println!();
    println!("{} v{}", APP_NAME, VERSION);
    println!("Live Workflow Descriptor Generator");
    println!();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: livegen [OPTIONS] generate <REQUEST_FILE>");
    println!("       livegen [OPTIONS] defaults");
    println!();
    println!("Arguments:");
    println!("  <REQUEST_FILE>       Request document (JSON or YAML)");
    println!();
    println!("Options:");
    println!("  --output PATH        Output file when the request has no output_file");
    println!("  --annotate           Emit every value with its description");
    println!("  --strict-refs        Reject job volumes that are not declared");
    println!("  --require-title      Reject requests without a title");
    println!("  --dockerfile PATH    Also write a Dockerfile to PATH");
    println!("  --json               Print the result as JSON");
    println!("  --verbose            Enable debug logging");
    println!("  --help               Show this help message");
    println!("  --version            Show version information");
    println!();
    println!("Examples:");
    println!("  livegen generate request.yaml");
    println!("  livegen generate request.json --output .apolo/live.yml --annotate");
    println!("  livegen defaults --json");
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut config = Config::default();
    let mut positional_index = 0;
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--annotate" => config.annotate = true,
            "--strict-refs" => config.strict_refs = true,
            "--require-title" => config.require_title = true,
            "--json" => config.json = true,
            "--verbose" | "-v" => config.verbose = true,
            "--output" | "-o" => {
                i += 1;
                if i >= args.len() {
                    return Err("--output requires a path argument".to_string());
                }
                config.output = Some(PathBuf::from(&args[i]));
            }
            "--dockerfile" => {
                i += 1;
                if i >= args.len() {
                    return Err("--dockerfile requires a path argument".to_string());
                }
                config.dockerfile = Some(PathBuf::from(&args[i]));
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                match positional_index {
                    0 => {
                        config.command = match arg.as_str() {
                            "generate" => Command::Generate,
                            "defaults" => Command::Defaults,
                            other => return Err(format!("Unknown command: {}", other)),
                        }
                    }
                    1 if config.command == Command::Generate => {
                        config.request_path = Some(PathBuf::from(arg))
                    }
                    _ => return Err(format!("Unexpected argument: {}", arg)),
                }
                positional_index += 1;
            }
        }
        i += 1;
    }

    if config.command == Command::Generate && config.request_path.is_none() {
        return Err("generate requires a request file".to_string());
    }

    Ok(config)
}

/// Builds the generator settings from the command line.
fn generator_config(config: &Config) -> GeneratorConfig {
    let mut settings = GeneratorConfig::default();

    if config.annotate {
        settings.mode = AnnotationMode::Annotated;
    }
    if let Some(output) = &config.output {
        settings.default_output = output.clone();
    }
    settings.strict_references = config.strict_refs;
    settings.require_title = config.require_title;
    settings.dockerfile = config.dockerfile.clone();

    settings
}

/// Prints the defaults overview.
fn show_defaults(generator: &Generator, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let overview = generator.defaults_overview();

    if json {
        println!("{}", serde_json::to_string_pretty(&overview)?);
    } else {
        print!("{}", serde_yaml::to_string(&overview)?);
    }
    Ok(())
}

/// Generates the document for the request file.
fn run_generate(generator: &Generator, config: &Config) -> Result<(), GenerateError> {
    let request_path = config.request_path.clone().unwrap_or_default();
    info!("Loading request: {}", request_path.display());

    let request = load_request(&request_path)?;
    let report = generator.generate(&request)?;

    if config.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to render report: {}", e),
        }
    } else {
        println!("{} {}", "✓".green(), report.message);
        if let Some(dockerfile) = &report.dockerfile {
            println!("{} '{}' has been generated successfully.", "✓".green(), dockerfile.display());
        }
    }

    Ok(())
}

/// Prints a generation failure in the requested format.
fn report_failure(err: &GenerateError, json: bool) {
    if json {
        let body = match err.validation_errors() {
            Some(errors) => serde_json::json!({ "errors": errors }),
            None => serde_json::json!({ "error": err.to_string() }),
        };
        println!("{}", body);
        return;
    }

    match err.validation_errors() {
        Some(errors) => {
            eprintln!("{}", "Request rejected:".red().bold());
            for message in errors {
                eprintln!("  {} {}", "-".red(), message);
            }
        }
        None => eprintln!("{} {}", "Error:".red().bold(), err),
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config = match parse_arguments(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            return ExitCode::from(EXIT_CLIENT_ERROR);
        }
    };

    setup_logging(config.verbose);

    if !config.json {
        print_banner();
    }

    let generator = Generator::new(generator_config(&config));

    match config.command {
        Command::Defaults => match show_defaults(&generator, config.json) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
        Command::Generate => match run_generate(&generator, &config) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                report_failure(&e, config.json);
                if e.is_client_error() {
                    ExitCode::from(EXIT_CLIENT_ERROR)
                } else {
                    ExitCode::FAILURE
                }
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("livegen")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_generate() {
        let config = parse_arguments(&args(&["generate", "req.yaml", "--annotate", "-o", "out.yml"])).unwrap();

        assert_eq!(config.command, Command::Generate);
        assert_eq!(config.request_path, Some(PathBuf::from("req.yaml")));
        assert_eq!(config.output, Some(PathBuf::from("out.yml")));
        assert!(config.annotate);
        assert!(!config.strict_refs);
    }

    #[test]
    fn test_parse_defaults() {
        let config = parse_arguments(&args(&["defaults", "--json"])).unwrap();
        assert_eq!(config.command, Command::Defaults);
        assert!(config.json);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_arguments(&args(&["generate"])).is_err());
        assert!(parse_arguments(&args(&["publish"])).is_err());
        assert!(parse_arguments(&args(&["generate", "a", "b"])).is_err());
        assert!(parse_arguments(&args(&["generate", "a", "--output"])).is_err());
        assert!(parse_arguments(&args(&["generate", "a", "--bogus"])).is_err());
    }

    #[test]
    fn test_generator_config_from_flags() {
        let config = parse_arguments(&args(&[
            "generate",
            "req.yaml",
            "--strict-refs",
            "--require-title",
            "--dockerfile",
            "Dockerfile",
        ]))
        .unwrap();
        let settings = generator_config(&config);

        assert_eq!(settings.mode, AnnotationMode::Plain);
        assert!(settings.strict_references);
        assert!(settings.require_title);
        assert_eq!(settings.dockerfile, Some(PathBuf::from("Dockerfile")));
    }
}
