use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(
    name = "west-bump",
    about = "Point a west manifest project at a module pull request and open a manifest pull request",
    version,
    author
)]
pub struct Cli {
    /// Enable verbose output for debugging
    #[arg(short, long)]
    pub verbose: bool,

    /// Module that is updated, as <remote>/<repo>
    #[arg(long, value_name = "REMOTE/REPO")]
    pub module_path: String,

    /// Repository that contains the manifest file, as <owner>/<name>
    #[arg(long, value_name = "OWNER/NAME")]
    pub manifest_repo_path: String,

    /// Path to the manifest file in the manifest repository
    #[arg(long, value_name = "PATH")]
    pub manifest_file: String,

    /// Open the pull request against this branch instead of the default branch
    #[arg(long)]
    pub branch: Option<String>,

    /// Number of the pull request to the module
    #[arg(long, value_name = "NUMBER")]
    pub module_pull_nr: u64,

    /// Open the manifest pull request as a draft
    #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set)]
    pub draft_pr: bool,

    /// Commit to a work branch but do not open a pull request
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Fail when no manifest project matches the module
    #[arg(long)]
    pub strict: bool,
}
