//! pr-check - build the Spack recipes a pull request changes
//!
//! Usage (from a spack checkout with the PR branch checked out):
//!   pr-check                       Build every spec the PR touches
//!   pr-check -s 3                  Also build up to 3 known-good versions
//!   pr-check -d                    Download and checksum-check only
//!   pr-check -u                    Offer to uninstall already-installed specs
//!   pr-check -l                    Label the PR when everything passes

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use spack_pr_check::github::GhCli;
use spack_pr_check::report::{BuildReport, OsInfo};
use spack_pr_check::spack::{INSTALL_SKIP, SpackCli};
use spack_pr_check::{Spec, SpecSet, expand_specs, extract_specs, output};

/// Pause after a failed build so the failure tail is readable before the
/// next build floods the terminal.
const FAILURE_PAUSE: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "pr-check")]
#[command(about = "Build and validate Spack recipes changed in the current pull request")]
#[command(version)]
struct Cli {
    /// Also build up to <N> known-good versions of each changed recipe
    #[arg(short = 's', long = "safe-versions", value_name = "N")]
    safe_versions: Option<usize>,

    /// Download and checksum-check only, skip builds
    #[arg(short, long)]
    download: bool,

    /// Offer to uninstall already-installed specs before building
    #[arg(short, long)]
    uninstall: bool,

    /// Label the PR when every spec passes
    #[arg(short = 'l', long = "label-success")]
    label_success: bool,

    /// Path to the spack executable
    #[arg(long, env = "SPACK_BIN", default_value = "bin/spack")]
    spack: PathBuf,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let gh = GhCli::default();
    let spack = SpackCli::new(&cli.spack);

    let spinner = output::spinner("Fetching PR diff");
    let diff = gh.pr_diff();
    output::progress_done(spinner);
    let diff = diff?;

    if let Some(pr) = gh.pr_info() {
        output::info(&format!("Checking PR #{}: {} ({})", pr.number, pr.title, pr.url));
    }

    let mut specs = extract_specs(&diff);
    if specs.is_empty() {
        output::warning("no package recipes changed in this PR, nothing to check");
        return Ok(ExitCode::FAILURE);
    }
    output::info(&format!("Specs to check: {}", specs.to_strings().join(" ")));

    if let Some(max_versions) = cli.safe_versions.filter(|n| *n > 0) {
        output::action("Checking for existing safe versions of the packages to build or download");
        expand_specs(&mut specs, max_versions, &spack);
        output::info(&format!("Specs to check: {}", specs.to_strings().join(" ")));
    }

    // Download checks stand alone: some packages have no checksum and the
    // install command fetches anyway.
    if cli.download {
        return check_all_downloads(&spack, &specs);
    }

    let (mut installed, findings) = spack.find_installed(&specs)?;
    if !installed.is_empty() {
        output::info("These specs are already installed:");
        for finding in &findings {
            println!("{finding}\n");
        }
        if cli.uninstall && confirm("Uninstall them?") {
            output::action("Uninstalling");
            for spec in &installed {
                spack.uninstall(spec)?;
            }
            installed.clear();
        }
    }
    for spec in &installed {
        specs.remove(spec);
    }

    let (passed, failed) = install_all(&spack, &specs)?;

    let done: Vec<Spec> = installed.iter().chain(&passed).cloned().collect();
    let find_output = if done.is_empty() {
        String::new()
    } else {
        spack.find_report(&done)?
    };

    let report = BuildReport {
        os: OsInfo::detect(),
        installed,
        passed,
        failed,
        find_output,
    };
    println!("{}", report.render());

    if report.all_passed() && cli.label_success {
        output::info("All specs passed, labeling the PR.");
        gh.add_label(&report.os.success_label())?;
    }

    Ok(if report.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Run `spack fetch` over every spec, stopping at the first failure.
fn check_all_downloads(spack: &SpackCli, specs: &SpecSet) -> Result<ExitCode> {
    let total = specs.len();
    for (i, spec) in specs.iter().enumerate() {
        output::info(&format!("download+sha256 check {} of {}: {}", i + 1, total, spec));
        let code = spack.fetch(spec)?;
        if code != 0 {
            return Ok(exit_code(code));
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Build every spec in order, collecting pass/fail lists.
fn install_all(spack: &SpackCli, specs: &SpecSet) -> Result<(Vec<Spec>, Vec<Spec>)> {
    let mut passed = Vec::new();
    let mut failed = Vec::new();
    let total = specs.len();

    for (i, spec) in specs.iter().enumerate() {
        if INSTALL_SKIP.contains(&spec.recipe.as_str()) {
            output::skip(&format!("Skipping {}: impractical to build on a review host", spec));
            continue;
        }

        println!();
        output::action_numbered(i + 1, total, &format!("Installing {}", spec));
        if spack.install(spec)? {
            output::success(&format!("Passed {}", spec));
            passed.push(spec.clone());
        } else {
            output::error(&format!("FAILED {}", spec));
            output::detail(&format!("Failed command: {}", spack.install_command_line(spec)));
            thread::sleep(FAILURE_PAUSE);
            failed.push(spec.clone());
        }
    }

    Ok((passed, failed))
}

/// Ask a y/n question on the terminal.
fn confirm(prompt: &str) -> bool {
    print!("{} [y/n]: ", prompt);
    let _ = io::stdout().flush();
    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    answer.trim().eq_ignore_ascii_case("y")
}

/// Map a child exit code onto our own. Codes a u8 can't hold collapse
/// to a generic failure.
fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(clamp_exit(code))
}

fn clamp_exit(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}
