use crate::git::{parse_date, GitRepo};
use crate::metric::{Metric, MetricCalculator};
use crate::model::WalkOptions;
use crate::pipeline::calculate_metrics;
use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "git-metrics")]
#[command(about = "Chart how a metric evolves over the history of a git repository")]
#[command(version)]
pub struct Cli {
    #[arg(
        short,
        long,
        help = "Path to repository. Defaults to the repository containing the current working directory"
    )]
    pub repo: Option<PathBuf>,

    #[arg(short, long, value_enum, help = "Name of metric to calculate")]
    pub metric: Metric,

    #[arg(short, long, default_value = "result.html", help = "File to output result to")]
    pub out: PathBuf,

    #[arg(long, help = "Stop after this many commits (newest first)")]
    pub max_commits: Option<usize>,

    #[arg(long, help = "Skip commits older than this date (RFC3339 or YYYY-MM-DD)")]
    pub since: Option<String>,

    #[arg(short, long, help = "Do not print progress")]
    pub quiet: bool,

    #[arg(short, long, help = "Print debug logs")]
    pub verbose: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        crate::logging::init(self.verbose);

        let mut options = WalkOptions::new().with_progress(!self.quiet);
        if let Some(max) = self.max_commits {
            options = options.with_max_commits(max);
        }
        if let Some(since) = self.since.as_deref() {
            options = options.with_since(parse_date(since).context("Invalid --since")?);
        }

        self.step("Opening repository...");
        let repo = GitRepo::open(self.repo.as_ref())
            .context("Could not find repo root. Are you in a git repository?")?;
        self.done();

        self.step("Calculating metrics...");
        let samples = calculate_metrics(&repo, &self.metric, &options)
            .context("Failed to calculate samples")?;
        self.done();
        tracing::info!(samples = samples.len(), metric = self.metric.name(), "collected samples");

        let file = File::create(&self.out)
            .with_context(|| format!("Failed to create result file {}", self.out.display()))?;
        let mut out = BufWriter::new(file);
        self.step("Rendering graph...");
        self.metric
            .render_graph(&samples, &mut out)
            .context("Failed to render graph")?;
        self.done();

        if !self.quiet {
            println!(
                "Wrote {} commits to {}",
                samples.len(),
                style(self.out.display()).bold()
            );
        }
        Ok(())
    }

    fn step(&self, message: &str) {
        if !self.quiet {
            print!("{message}");
            let _ = std::io::stdout().flush();
        }
    }

    fn done(&self) {
        if !self.quiet {
            println!("{}", style("Done").green());
        }
    }
}
