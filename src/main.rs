use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use noc_reconcile::config::Config;
use noc_reconcile::exit_codes::{self, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};
use noc_reconcile::i18n::Language;
use noc_reconcile::reconcile::{backfill, reconcile, BilingualLayout};
use noc_reconcile::record::WorkingSet;
use noc_reconcile::table::{read_table, write_table};
use noc_reconcile::translation::{Backend, Gateway, TranslateError};
use noc_reconcile::{combine, export, tools};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

#[derive(Parser)]
#[command(name = "noc-reconcile")]
#[command(about = "Merge and reconcile bilingual NOC classification CSV exports")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a secondary-language table into a primary-language table
    #[command(after_help = "\
Examples:
  noc-reconcile reconcile out/elements_en.csv out/elements_fr.csv -o out/elements.csv")]
    Reconcile {
        /// Primary-language table (e.g. elements_en.csv)
        primary: PathBuf,

        /// Secondary-language table (e.g. elements_fr.csv)
        secondary: PathBuf,

        /// Merged output table
        #[arg(long, short = 'o')]
        output: PathBuf,

        /// Linking identifier column
        #[arg(long, default_value = "noc_code")]
        id: String,

        /// Language of the primary table
        #[arg(long, default_value = "en")]
        primary_language: Language,

        /// Language of the secondary table
        #[arg(long, default_value = "fr")]
        secondary_language: Language,
    },

    /// Combine CSV files line for line, or by identifier with --id
    Combine {
        /// Source files, merged in order
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Output file
        #[arg(long, short = 'o')]
        output: PathBuf,

        /// Merge rows sharing this column's value instead of by position
        #[arg(long)]
        id: Option<String>,
    },

    /// Translate columns of a CSV file
    #[command(after_help = "\
Examples:
  noc-reconcile translate classes_en.csv --from en --to fr \\
      --keys-from name_english,description_english --keys-to name_french,description_french")]
    Translate {
        /// Source file
        source: PathBuf,

        /// Output file (defaults to rewriting the source)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Language of the source columns
        #[arg(long)]
        from: Language,

        /// Language to translate into
        #[arg(long)]
        to: Language,

        /// Columns to translate
        #[arg(long, value_delimiter = ',', required = true)]
        keys_from: Vec<String>,

        /// Columns receiving the translations, paired with --keys-from
        #[arg(long, value_delimiter = ',', required = true)]
        keys_to: Vec<String>,

        /// Translation backend: local-model or cloud-api
        #[arg(long, default_value = "local-model")]
        backend: Backend,
    },

    /// Fill missing French categories and names of a merged elements table
    FillMissing {
        /// Merged elements table
        source: PathBuf,

        /// Output file
        #[arg(long, short = 'o')]
        output: PathBuf,
    },

    /// Re-encode a CSV file, or every CSV file under a directory, as UTF-8
    Transcode {
        /// File or directory
        source: PathBuf,

        /// Output file or directory (defaults to rewriting in place)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Print every row of a CSV file as JSON
    Print {
        source: PathBuf,
    },

    /// Print the longest value of each column of a CSV file or directory
    PrintLongest {
        path: PathBuf,
    },

    /// Export the official NOC 2021 files into bilingual tables
    Export {
        /// Directory holding the four official NOC/CNP files
        source: PathBuf,

        /// Output directory
        destination: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file (ignored when the variables come from the environment)
    let _ = dotenvy::dotenv();

    if let Err(e) = init_logging() {
        eprintln!("error: {:#}", e);
        return ExitCode::from(EXIT_ERROR);
    }

    let cli = Cli::parse();

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            report(&e);
            ExitCode::from(exit_codes::for_error(&e))
        }
    }
}

fn init_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("noc_reconcile=info".parse()?),
        )
        .init();
    Ok(())
}

fn report(error: &anyhow::Error) {
    if let Some(TranslateError::Api { code, message }) = error.downcast_ref::<TranslateError>() {
        eprintln!("Error with the cloud translator:");
        eprintln!("Code: {}", code);
        eprintln!("Message: {}", message);
        return;
    }
    eprintln!("error: {:#}", error);
}

async fn run(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Reconcile {
            primary,
            secondary,
            output,
            id,
            primary_language,
            secondary_language,
        } => {
            let layout = BilingualLayout::new(&id, primary_language, secondary_language);
            cmd_reconcile(config, &primary, &secondary, &output, layout).await
        }
        Commands::Combine { sources, output, id } => cmd_combine(&sources, &output, id.as_deref()),
        Commands::Translate {
            source,
            output,
            from,
            to,
            keys_from,
            keys_to,
            backend,
        } => {
            let pairs = tools::column_pairs(&keys_from, &keys_to)?;
            let gateway = Gateway::new(config);
            tools::translate_file(&gateway, &source, output.as_deref(), from, to, &pairs, backend).await
        }
        Commands::FillMissing { source, output } => cmd_fill_missing(config, &source, &output).await,
        Commands::Transcode { source, output } => {
            let count = tools::transcode(&source, output.as_deref())?;
            info!("✓ Transcoded {} files", count);
            Ok(())
        }
        Commands::Print { source } => {
            let table = read_table(&source)?;
            print!("{}", tools::render_rows(&table.records)?);
            Ok(())
        }
        Commands::PrintLongest { path } => cmd_print_longest(&path),
        Commands::Export {
            source,
            destination,
        } => {
            let gateway = Gateway::new(config);
            let summary = export::export(&gateway, &source, &destination).await?;
            info!("✓ Export complete: {} files written", summary.written.len());
            Ok(())
        }
    }
}

async fn cmd_reconcile(
    config: &Config,
    primary: &Path,
    secondary: &Path,
    output: &Path,
    layout: BilingualLayout,
) -> Result<()> {
    let primary_table = read_table(primary)?;
    let secondary_table = read_table(secondary)?;

    let gateway = Gateway::new(config);
    let merged = reconcile(&gateway, layout, primary_table.records, &secondary_table.records)
        .await
        .with_context(|| format!("Failed to reconcile {} into {}", secondary.display(), primary.display()))?;

    write_table(merged.records(), output, secondary_table.encoding)?;
    info!("✓ Wrote {} records to {}", merged.len(), output.display());
    Ok(())
}

fn cmd_combine(sources: &[PathBuf], output: &Path, id: Option<&str>) -> Result<()> {
    let table = combine::combine_files(sources, id)?;
    write_table(&table.records, output, table.encoding)?;
    info!("✓ Combined {} files into {} rows", sources.len(), table.records.len());
    Ok(())
}

async fn cmd_fill_missing(config: &Config, source: &Path, output: &Path) -> Result<()> {
    let table = read_table(source)?;
    let mut set = WorkingSet::from(table.records);

    let gateway = Gateway::new(config);
    backfill(&gateway, &BilingualLayout::noc(), &mut set)
        .await
        .with_context(|| format!("Failed to fill missing values of {}", source.display()))?;

    write_table(set.records(), output, table.encoding)?;
    info!("✓ Wrote {} records to {}", set.len(), output.display());
    Ok(())
}

fn cmd_print_longest(path: &Path) -> Result<()> {
    let files = if path.is_dir() {
        tools::csv_files(path)
    } else {
        vec![path.to_path_buf()]
    };

    for file in files {
        let table = read_table(&file)?;
        println!("{}", tools::render_longest(&file, &tools::longest_values(&table.records)));
    }
    Ok(())
}
