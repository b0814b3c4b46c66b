use clap::Parser;
use parquet_csv_batch::runner::{
    ConvertArgsBuilder, ConvertSummary, FailurePolicy, FileResult, run_convert,
};
use std::path::PathBuf;

/// Convert every *.parquet file in a directory to a headerless CSV file
#[derive(Parser, Clone)]
#[command(version, about)]
struct Args {
    /// Directory containing the Parquet files (default: current directory)
    #[arg(default_value = ".")]
    source_dir: PathBuf,

    /// Keep converting the remaining files after one fails
    #[arg(long)]
    keep_going: bool,

    /// List the planned conversions without writing any file
    #[arg(long)]
    dry_run: bool,

    /// Quiet mode - minimal output, only show errors
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing(args.quiet);

    let failure_policy = if args.keep_going {
        FailurePolicy::ContinueOnError
    } else {
        FailurePolicy::FailFast
    };

    let convert_args = ConvertArgsBuilder::default()
        .source_dir(args.source_dir.clone())
        .failure_policy(failure_policy)
        .dry_run(args.dry_run)
        .quiet(args.quiet)
        .build()?;

    let summary = run_convert(convert_args).await?;

    if args.dry_run {
        print_plan(&summary);
        return Ok(());
    }

    if !args.quiet {
        print_summary(&summary);
    }

    let failed = summary.failed().count();
    if failed > 0 {
        anyhow::bail!(
            "{} of {} file(s) failed to convert",
            failed,
            summary.files.len()
        );
    }

    Ok(())
}

fn init_tracing(quiet: bool) {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            EnvFilter::new("parquet_csv_batch=warn")
        } else {
            EnvFilter::new("parquet_csv_batch=info")
        }
    });
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn print_plan(summary: &ConvertSummary) {
    println!("DRY RUN MODE - No files will be written");
    println!();
    if summary.files.is_empty() {
        println!("No parquet files found");
        return;
    }
    for outcome in &summary.files {
        println!(
            "  {} -> {}",
            outcome.pair.source.display(),
            outcome.pair.destination.display()
        );
    }
    println!();
    println!("To execute, run without --dry-run");
}

fn print_summary(summary: &ConvertSummary) {
    println!();
    println!("Conversion Summary");
    println!("==================");
    println!("Files converted: {}", summary.converted());
    println!("Rows written: {}", summary.rows_written());
    println!("Duration: {:.2}s", summary.duration.as_secs_f64());

    let failed: Vec<_> = summary.failed().collect();
    if !failed.is_empty() {
        println!();
        println!("Failed files:");
        for outcome in failed {
            if let FileResult::Failed(ref message) = outcome.result {
                println!("  {}: {}", outcome.pair.source.display(), message);
            }
        }
    }
}
