//! ecucsheet CLI - ECU configuration extraction tool
//!
//! A command-line tool for extracting containers from AUTOSAR ECU
//! configuration files into Excel workbooks.

use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ecucsheet::render::{JsonFormat, RenderOptions};

/// Default log file, appended to on every run.
const DEFAULT_LOG_FILE: &str = "ecu_parser.log";

/// Extract ECU configuration containers into Excel workbooks
#[derive(Parser)]
#[command(
    name = "ecucsheet",
    version,
    about = "Extract ECU configuration containers into Excel workbooks",
    long_about = "ecucsheet - AUTOSAR ECU configuration extraction tool.\n\n\
                  Collects the SHORT-NAME and DEFINITION-REF of every container and\n\
                  sub-container and writes them to a two-sheet .xlsx workbook.\n\
                  Without a subcommand, prompts for the input and output paths."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Append timestamped messages to this file
    #[arg(long, global = true, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract from <INPUT> and write the workbook to <OUTPUT>
    #[command(visible_alias = "convert")]
    Cmd {
        /// ECU configuration XML file
        input: PathBuf,

        /// Output .xlsx file
        output: PathBuf,
    },

    /// Prompt for the input and output paths
    Interactive,

    /// Extract and print the records as JSON
    Json {
        /// ECU configuration XML file
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output compact JSON (no indentation)
        #[arg(long)]
        compact: bool,
    },

    /// Print the sheets of an .xlsx workbook
    Inspect {
        /// Workbook to read
        input: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_file) {
        eprintln!(
            "{}: cannot open log file {}: {}",
            "Warning".yellow().bold(),
            cli.log_file.display(),
            e
        );
    }

    if let Err(e) = run(cli.command.unwrap_or(Commands::Interactive)) {
        error!("Error occurred: {}", e);
        eprintln!("{}: An error occurred: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Cmd { input, output } => {
            extract_to_workbook(&input, &output)?;
        }

        Commands::Interactive => {
            let stdin = io::stdin();
            let mut lines = stdin.lock();

            let input = prompt(&mut lines, "Select ECU XML file:")?;
            if input.is_empty() {
                return Err("No file selected.".into());
            }

            let output = prompt(&mut lines, "Save as (.xlsx):")?;
            if output.is_empty() {
                return Err("No output file selected.".into());
            }

            extract_to_workbook(Path::new(&input), &with_default_extension(output))?;
        }

        Commands::Json {
            input,
            output,
            compact,
        } => {
            let format = if compact {
                JsonFormat::Compact
            } else {
                JsonFormat::Pretty
            };
            let json = with_spinner("Extracting containers...", |_| {
                ecucsheet::to_json(&input, format)
            })?;

            write_output(output.as_ref(), &json)?;

            if let Some(path) = output {
                info!("Wrote JSON for {} to {}", input.display(), path.display());
                println!("{} Converted to JSON: {}", "✓".green().bold(), path.display());
            }
        }

        Commands::Inspect { input } => {
            let reader = ecucsheet::xlsx::WorkbookReader::open(&input)?;

            for sheet in reader.read_all()? {
                println!("{}", sheet.name.cyan().bold());
                println!("{}", "─".repeat(40));
                let mut rows = sheet.rows.iter();
                if let Some(header) = rows.next() {
                    println!("{}", header.join("\t").bold());
                }
                for row in rows {
                    println!("{}", row.join("\t"));
                }
                println!();
            }
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

/// Extract from `input`, write the workbook, and report the outcome.
fn extract_to_workbook(input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    info!("Extracting {} into {}", input.display(), output.display());
    let result = with_spinner("Extracting containers...", |pb| {
        let result = ecucsheet::extract_file(input)?;
        pb.set_message("Writing workbook...");
        ecucsheet::render::write_xlsx(&result, output, &RenderOptions::default())?;
        Ok::<_, ecucsheet::Error>(result)
    })?;

    info!(
        "Extraction completed: {} containers, {} sub-containers",
        result.containers.len(),
        result.sub_containers.len()
    );
    println!(
        "{} Extraction completed successfully. {} containers, {} sub-containers written to {}",
        "✓".green().bold(),
        result.containers.len(),
        result.sub_containers.len(),
        output.display()
    );
    Ok(())
}

/// Ask a question on stdout and read one trimmed answer line.
fn prompt(input: &mut impl BufRead, question: &str) -> io::Result<String> {
    print!("{} ", question.cyan().bold());
    io::stdout().flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Append `.xlsx` to a path that has no extension.
fn with_default_extension(path: String) -> PathBuf {
    let mut path = PathBuf::from(path);
    if path.extension().is_none() {
        path.set_extension("xlsx");
    }
    path
}

fn print_version() {
    println!("{} {}", "ecucsheet".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("AUTOSAR ECU configuration extraction to Excel");
    println!();
    println!("Input: ECU configuration XML (.arxml, .xml)");
    println!("Output: Excel workbook (.xlsx)");
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Run `work` behind a spinner that is cleared whether or not it succeeds.
fn with_spinner<T, E>(
    message: &str,
    work: impl FnOnce(&ProgressBar) -> Result<T, E>,
) -> Result<T, E> {
    let pb = create_spinner(message);
    let outcome = work(&pb);
    pb.finish_and_clear();
    outcome
}

fn write_output(path: Option<&PathBuf>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", content)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_two_argument_mode() {
        let cli = Cli::try_parse_from(["ecucsheet", "cmd", "in.arxml", "out.xlsx"]).unwrap();
        match cli.command {
            Some(Commands::Cmd { input, output }) => {
                assert_eq!(input, PathBuf::from("in.arxml"));
                assert_eq!(output, PathBuf::from("out.xlsx"));
            }
            _ => panic!("expected cmd subcommand"),
        }
        assert_eq!(cli.log_file, PathBuf::from(DEFAULT_LOG_FILE));
    }

    #[test]
    fn test_cmd_requires_both_paths() {
        assert!(Cli::try_parse_from(["ecucsheet", "cmd", "in.arxml"]).is_err());
    }

    #[test]
    fn test_no_subcommand_is_interactive() {
        let cli = Cli::try_parse_from(["ecucsheet"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_default_extension() {
        assert_eq!(with_default_extension("report".into()), PathBuf::from("report.xlsx"));
        assert_eq!(with_default_extension("report.xls".into()), PathBuf::from("report.xls"));
    }

    #[test]
    fn test_prompt_trims_answer() {
        let mut input = io::Cursor::new(b"  EcuC.arxml \n".to_vec());
        assert_eq!(prompt(&mut input, "?").unwrap(), "EcuC.arxml");
    }

    #[test]
    fn test_cmd_writes_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("EcuC.arxml");
        let output = dir.path().join("EcuC.xlsx");
        fs::write(
            &input,
            "<AUTOSAR><CONTAINERS><ECUC-CONTAINER-VALUE><SHORT-NAME>EcuC</SHORT-NAME>\
             <DEFINITION-REF>/AUTOSAR/EcuC/EcucDef</DEFINITION-REF>\
             </ECUC-CONTAINER-VALUE></CONTAINERS></AUTOSAR>",
        )
        .unwrap();

        run(Commands::Cmd {
            input,
            output: output.clone(),
        })
        .unwrap();
        assert!(output.exists());
    }

    #[test]
    fn test_cmd_reports_malformed_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.arxml");
        let output = dir.path().join("broken.xlsx");
        fs::write(&input, "<AUTOSAR><CONTAINERS></AUTOSAR>").unwrap();

        let err = run(Commands::Cmd {
            input,
            output: output.clone(),
        })
        .unwrap_err();
        assert!(err.to_string().contains("extraction failed"));
        assert!(!output.exists());
    }

    #[test]
    fn test_spinner_cleared_on_failure() {
        let mut spinner = None;
        let outcome: Result<(), &str> = with_spinner("Working...", |pb| {
            spinner = Some(pb.clone());
            Err("boom")
        });
        assert_eq!(outcome, Err("boom"));
        assert!(spinner.unwrap().is_finished());
    }
}
