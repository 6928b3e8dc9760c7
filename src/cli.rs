use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "codex-meta",
    version,
    about = "Reconcile and validate multiplexed fluorescence imaging metadata"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Convert(ConvertArgs),
    Batch(BatchArgs),
    Inspect(InspectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DatasetFileArgs {
    #[arg(long, default_value = "missing1.xlsx")]
    pub qc_sheet: PathBuf,

    #[arg(long, default_value = "missing2.xlsx")]
    pub summary_sheet: PathBuf,

    #[arg(long, default_value = "exposure_times.txt")]
    pub exposure_table: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    #[arg(long)]
    pub dataset: PathBuf,

    #[arg(long)]
    pub output: PathBuf,

    #[command(flatten)]
    pub files: DatasetFileArgs,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    #[arg(long, default_value = ".")]
    pub workdir: PathBuf,

    #[arg(long)]
    pub input_map: Option<PathBuf>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,

    #[command(flatten)]
    pub files: DatasetFileArgs,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[arg(long)]
    pub dataset: PathBuf,

    #[command(flatten)]
    pub files: DatasetFileArgs,
}
