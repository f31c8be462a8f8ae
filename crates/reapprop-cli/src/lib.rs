mod config;
mod show;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{CommandFactory as _, Parser};
use reapprop::reconcile::ReconcileConfig;
use reapprop::report::{self, Summary};

use crate::config::Config;

const DEFAULT_ENACTED: &str = "2025 Enacted.pdf";
const DEFAULT_EXECUTIVE: &str = "2026 Executive.pdf";
const DEFAULT_TOP: usize = 10;

#[derive(Parser)]
#[command(
    name = "reapprop",
    about = "Find enacted budget items the executive budget fails to reappropriate"
)]
struct Args {
    /// Enacted budget PDF
    enacted: Option<PathBuf>,

    /// Executive budget PDF
    executive: Option<PathBuf>,

    /// Directory the CSV and JSON reports are written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Config file path (defaults to reapprop.toml or .reapprop.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of largest discrepancies to print
    #[arg(long)]
    top: Option<usize>,
}

pub fn run(args: impl IntoIterator<Item = String>) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "reapprop=info,reapprop_cli=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    clap_complete::CompleteEnv::with_factory(Args::command).complete();

    let args = Args::parse_from(args);

    let (base_dir, config) = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::find_and_load()?.unwrap_or_default(),
    };

    // arguments win over config, config paths are relative to the config file
    let in_config = |path: Option<PathBuf>| path.map(|path| base_dir.join(path));
    let enacted = args
        .enacted
        .or_else(|| in_config(config.input.enacted))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ENACTED));
    let executive = args
        .executive
        .or_else(|| in_config(config.input.executive))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_EXECUTIVE));
    let output_dir = args
        .output_dir
        .or_else(|| in_config(config.output.dir))
        .unwrap_or_else(|| PathBuf::from("."));
    let top = args.top.or(config.output.top).unwrap_or(DEFAULT_TOP);

    audit(&enacted, &executive, &output_dir, top, config.parser.0)
}

fn audit(
    enacted: &Path,
    executive: &Path,
    output_dir: &Path,
    top: usize,
    options: reapprop::ReadOptions,
) -> Result<()> {
    let state = ReconcileConfig::new(enacted.to_owned(), executive.to_owned(), options).read()?;
    let discrepancies = state.reconcile();
    let summary = Summary::new(&discrepancies);

    let files = report::write_outputs(
        output_dir,
        &state.enacted,
        &state.executive,
        &discrepancies,
        &summary,
    )?;

    show::show_report(&discrepancies, &summary, &files, top)
}
