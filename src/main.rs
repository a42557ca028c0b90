use clap::CommandFactory;
use console::style;
use git_metrics::cli::Cli;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = cli.execute() {
        eprintln!("{} {:#}", style("error:").red().bold(), e);
        eprintln!("{}", Cli::command().render_usage());
        std::process::exit(1);
    }
}
