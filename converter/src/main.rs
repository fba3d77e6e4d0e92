//! Formbridge CLI - Convert SurveyCTO forms to Kobo XLSForm sheets
//!
//! # Main Commands
//!
//! ```bash
//! formbridge convert form/ -o kobo/        # Directory of CSV sheets → directory
//! formbridge convert form.json -o out.json # JSON workbook → JSON workbook
//! formbridge serve                         # Start HTTP server (port 3000)
//! ```
//!
//! # Inspection Commands
//!
//! ```bash
//! formbridge validate kobo/                # Check a converted workbook
//! formbridge stages                        # List pipeline stages
//! formbridge hierarchy                     # Print the cascading lists
//! ```

use clap::{Parser, Subcommand};
use formbridge::{
    convert_workbook, validate_form, write_sheet, ConvertOptions, ConvertedForm,
    LocationHierarchy, PipelineError, SheetKind, Stage, Workbook,
};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "formbridge")]
#[command(about = "Convert SurveyCTO XLSForm sheets to Kobo", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full conversion: SurveyCTO sheets → Kobo sheets
    Convert {
        /// Directory of survey/choices/settings CSV files, or a JSON workbook
        input: PathBuf,

        /// Output directory or `.json` file (default: JSON on stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Form title (default: input file name)
        #[arg(short, long)]
        form_name: Option<String>,

        #[command(flatten)]
        shared: SharedArgs,

        /// Write per-stage change reports as JSON
        #[arg(long)]
        report: Option<PathBuf>,

        /// Skip conformance checks
        #[arg(long)]
        no_validate: bool,
    },

    /// Check a converted workbook against Kobo rules
    Validate {
        /// Directory of CSV sheets, or a JSON workbook
        input: PathBuf,
    },

    /// List the pipeline stages in order
    Stages,

    /// Print the cascading location lists
    Hierarchy {
        /// Hierarchy JSON file (default: built-in sample)
        #[arg(long)]
        hierarchy: Option<PathBuf>,

        /// Print as a choices CSV sheet instead of JSON
        #[arg(long)]
        csv: bool,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "FORMBRIDGE_PORT", default_value = "3000")]
        port: u16,

        #[command(flatten)]
        shared: SharedArgs,
    },
}

/// Conversion settings shared by `convert` and `serve`.
#[derive(clap::Args)]
struct SharedArgs {
    /// Language forced into the settings sheet
    #[arg(long, env = "FORMBRIDGE_DEFAULT_LANGUAGE", default_value = "English")]
    default_language: String,

    /// Hierarchy JSON file replacing the built-in location lists
    #[arg(long)]
    hierarchy: Option<PathBuf>,
}

impl SharedArgs {
    fn options(&self, form_name: String) -> Result<ConvertOptions, PipelineError> {
        Ok(ConvertOptions {
            form_name,
            default_language: self.default_language.clone(),
            hierarchy: load_hierarchy(self.hierarchy.as_deref())?,
            skip_validation: false,
        })
    }
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            form_name,
            shared,
            report,
            no_validate,
        } => cmd_convert(
            &input,
            output.as_deref(),
            form_name,
            &shared,
            report.as_deref(),
            no_validate,
            &mut std::io::stdout().lock(),
        ),

        Commands::Validate { input } => cmd_validate(&input),

        Commands::Stages => cmd_stages(),

        Commands::Hierarchy { hierarchy, csv } => cmd_hierarchy(hierarchy.as_deref(), csv),

        Commands::Serve { port, shared } => cmd_serve(port, &shared).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Without `output`, the converted workbook JSON goes to `stdout`; every
/// progress line goes to stderr.
fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    form_name: Option<String>,
    shared: &SharedArgs,
    report: Option<&Path>,
    no_validate: bool,
    stdout: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let form_name = form_name.unwrap_or_else(|| default_form_name(input));
    let mut options = shared.options(form_name)?;
    options.skip_validation = no_validate;

    let workbook = Workbook::read(input)?;
    let missing = workbook.missing_sheets();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|k| k.as_str()).collect();
        eprintln!("   Missing sheets: {}", names.join(", "));
    }

    let form = convert_workbook(workbook, &options)?;

    if let Some(report_path) = report {
        std::fs::write(report_path, serde_json::to_string_pretty(&form.reports)?)?;
        eprintln!("   💾 Reports saved to: {}", report_path.display());
    }

    let violations = form.violations.len();
    let converted = form.into_workbook();
    match output {
        Some(path) => {
            for written in converted.write(path)? {
                eprintln!("💾 Written: {}", written.display());
            }
        }
        None => {
            writeln!(stdout, "{}", converted.to_json()?)?;
            stdout.flush()?;
        }
    }

    if violations > 0 {
        eprintln!("\n⚠️  Done with {} violations", violations);
    } else {
        eprintln!("\n✨ Done!");
    }
    Ok(())
}

fn cmd_validate(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Validating: {}", input.display());

    let workbook = Workbook::read(input)?;
    let form = ConvertedForm {
        survey: workbook.survey.ok_or(PipelineError::MissingSurvey)?,
        choices: workbook.choices.unwrap_or_default(),
        settings: workbook.settings.unwrap_or_default(),
        reports: Vec::new(),
        violations: Vec::new(),
    };

    let violations = validate_form(&form);
    for violation in violations.iter().take(20) {
        eprintln!("   ❌ {}", violation);
    }
    if violations.len() > 20 {
        eprintln!("   ... +{}", violations.len() - 20);
    }

    eprintln!("\n📊 Results: {} violations", violations.len());
    if !violations.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_stages() -> Result<(), Box<dyn std::error::Error>> {
    for (i, stage) in Stage::ALL.iter().enumerate() {
        let sheets: Vec<&str> = stage.sheets().iter().map(|k| k.as_str()).collect();
        println!("{:2}. {:<32} [{}]", i + 1, stage.title(), sheets.join(", "));
    }
    Ok(())
}

fn cmd_hierarchy(path: Option<&Path>, csv: bool) -> Result<(), Box<dyn std::error::Error>> {
    let hierarchy = load_hierarchy(path)?;
    eprintln!(
        "📋 {} lists, {} items: {}",
        hierarchy.levels.len(),
        hierarchy.item_count(),
        hierarchy.list_names().join(" → ")
    );
    if csv {
        let bytes = write_sheet(SheetKind::Choices.as_str(), &hierarchy.to_table())?;
        print!("{}", String::from_utf8_lossy(&bytes));
    } else {
        println!("{}", serde_json::to_string_pretty(&hierarchy)?);
    }
    Ok(())
}

async fn cmd_serve(port: u16, shared: &SharedArgs) -> Result<(), Box<dyn std::error::Error>> {
    let defaults = shared.options(ConvertOptions::default().form_name)?;
    formbridge::server::start_server(port, defaults).await?;
    Ok(())
}

fn load_hierarchy(path: Option<&Path>) -> Result<LocationHierarchy, PipelineError> {
    match path {
        Some(p) => {
            eprintln!("📥 Loading hierarchy: {}", p.display());
            Ok(LocationHierarchy::load(p)?)
        }
        None => Ok(LocationHierarchy::default()),
    }
}

/// File or directory name without extension.
fn default_form_name(input: &Path) -> String {
    input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("form")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_to_stdout_is_pure_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("survey.csv"), "type,name,label\ntext,Q1,First\n").unwrap();
        let shared = SharedArgs {
            default_language: "English".to_string(),
            hierarchy: None,
        };

        let mut out = Vec::new();
        cmd_convert(dir.path(), None, Some("demo".to_string()), &shared, None, false, &mut out).unwrap();

        let workbook = Workbook::from_json(std::str::from_utf8(&out).unwrap()).unwrap();
        let survey = workbook.survey.unwrap();
        assert!(survey.rows().iter().any(|r| r.get("name") == Some("q1")));
    }
}
