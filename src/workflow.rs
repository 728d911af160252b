use crate::agents::{PatchReport, UpdateOrchestrator, UpdateOutcome};
use crate::config::UpdaterConfig;
use crate::error::Result;
use crate::host::RepositoryHost;
use colored::Colorize;
use jiff::Timestamp;

/// Execute the manifest update workflow
pub fn execute_update(
    config: &UpdaterConfig,
    host: &dyn RepositoryHost,
    now: Timestamp,
) -> Result<UpdateOutcome> {
    let request = &config.request;
    println!(
        "{}",
        format!(
            "Updating {} in {}:{} to pull request #{}...",
            request.module, request.manifest_repo, request.manifest_file, request.pull_number
        )
        .cyan()
        .bold()
    );
    tracing::debug!(
        api = %config.api_base,
        token = %format!("…{}", config.token_hint()),
        "using GitHub API"
    );

    let outcome = UpdateOrchestrator::new(host).run(request, now)?;

    println!(
        "\n{}",
        format!("1. Fork {} synced with {}", outcome.fork, request.manifest_repo).yellow()
    );
    println!(
        "   {} @ {}",
        outcome.target_branch.bright_cyan(),
        short_sha(&outcome.base_sha).dimmed()
    );

    println!("\n{}", "2. Patching manifest...".yellow());
    print_patch_report(&outcome.report);

    println!("\n{}", "3. Committing to work branch...".yellow());
    println!(
        "{}",
        format!(
            "✓ Committed {} to branch: {}",
            short_sha(&outcome.commit_sha),
            outcome.work_branch
        )
        .green()
    );

    match &outcome.pull_request {
        Some(pull) => {
            println!("\n{}", "4. Opening pull request...".yellow());
            println!(
                "{}",
                format!("✓ Pull request #{} opened: {}", pull.number, pull.url).green()
            );
        }
        None => {
            println!(
                "\n{}",
                "4. Dry run, pull request was not opened".yellow()
            );
            println!(
                "   Open it manually from {}:{}",
                outcome.fork.bright_cyan(),
                outcome.work_branch.bright_cyan()
            );
        }
    }

    println!("\n{}", "✨ Manifest update completed successfully!".green().bold());
    Ok(outcome)
}

fn print_patch_report(report: &PatchReport) {
    if report.is_empty() {
        println!(
            "{}",
            "⚠ No project matches the module, manifest left unchanged".red()
        );
        return;
    }

    println!("   Patched {} project(s):", report.count());
    for project in &report.patched {
        let old = project.old_revision.as_deref().unwrap_or("(none)");
        println!(
            "  • {} {} → {}",
            project.name.white().bold(),
            old.red(),
            project.new_revision.green()
        );
    }
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}
