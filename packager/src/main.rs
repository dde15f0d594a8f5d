//! Release packager CLI entrypoint.
//!
//! Resets the staging directory, runs the build tool, collects artefacts and
//! writes the versioned release archive. Progress goes to stderr; the path of
//! the finished archive (or a JSON summary) goes to stdout.

use camino::Utf8PathBuf;
use clap::Parser;
use rendertoy_packager::builder::SystemCommandExecutor;
use rendertoy_packager::cli::Cli;
use rendertoy_packager::collector::Artifact;
use rendertoy_packager::config::ReleaseConfig;
use rendertoy_packager::error::{PackagerError, Result};
use rendertoy_packager::pipeline::{Pipeline, ReleaseOutput, Step};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn init_logging(cli: &Cli) {
    if env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .format_timestamp(None)
        .try_init()
        .is_err()
    {
        // A logger is already installed; keep it.
    }
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<()> {
    let root = resolve_root(cli.root.clone())?;
    let mut config = ReleaseConfig::load(&root, cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    let executor = SystemCommandExecutor;
    let pipeline = Pipeline::new(root, &config, &executor)?;

    if cli.dry_run {
        print_dry_run_info(&pipeline, cli, stderr);
        return Ok(());
    }

    let output = pipeline.run_reporting(cli.run_options(), &mut |step| {
        if !cli.quiet {
            write_stderr_line(stderr, step_message(&pipeline, step));
        }
    })?;

    report_output(&output, cli.json, stdout)
}

/// Resolves the project root from the CLI or the current directory.
fn resolve_root(cli_root: Option<Utf8PathBuf>) -> Result<Utf8PathBuf> {
    if let Some(root) = cli_root {
        return Ok(root);
    }
    let cwd = std::env::current_dir()?;
    Utf8PathBuf::try_from(cwd).map_err(|e| PackagerError::NonUtf8Path {
        path: e.into_path_buf().display().to_string(),
    })
}

fn step_message(pipeline: &Pipeline<'_>, step: Step) -> String {
    match step {
        Step::ResetStage => format!("Resetting staging directory {}...", pipeline.stage().path()),
        Step::Build => format!("Running {}...", pipeline.build_invoker().tool_path()),
        Step::Collect => format!("Collecting {} artefact(s)...", pipeline.artifacts().len()),
        Step::Archive => format!("Writing {}...", pipeline.archive_path()),
        Step::Verify => "Verifying archive contents...".to_owned(),
    }
}

fn report_output(output: &ReleaseOutput, json: bool, stdout: &mut dyn Write) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *stdout, output)?;
        writeln!(stdout)?;
    } else {
        writeln!(stdout, "Created {}", output.archive.path)?;
        writeln!(stdout, "sha256 {}", output.archive.sha256)?;
    }
    Ok(())
}

/// Prints the resolved release plan.
fn print_dry_run_info(pipeline: &Pipeline<'_>, cli: &Cli, stderr: &mut dyn Write) {
    write_stderr_line(stderr, "Dry run - no files will be modified");
    write_stderr_line(stderr, "");
    write_stderr_line(stderr, format!("Project root: {}", pipeline.root()));
    write_stderr_line(
        stderr,
        format!("Staging directory: {}", pipeline.stage().path()),
    );
    if cli.skip_build {
        write_stderr_line(stderr, "Build tool: skipped");
    } else {
        write_stderr_line(
            stderr,
            format!("Build tool: {}", pipeline.build_invoker().tool_path()),
        );
    }
    write_stderr_line(stderr, format!("Archive: {}", pipeline.archive_path()));
    write_stderr_line(stderr, format!("Verify: {}", cli.verify));

    write_stderr_line(stderr, "");
    write_stderr_line(stderr, "Artefacts to collect:");
    for artifact in pipeline.artifacts() {
        let line = match artifact {
            Artifact::File { source } => format!("  - {source}"),
            Artifact::Tree { source, dest } => format!("  - {source}/ -> {dest}/"),
        };
        write_stderr_line(stderr, line);
    }
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            let mut source = std::error::Error::source(&err);
            while let Some(cause) = source {
                write_stderr_line(stderr, format!("  caused by: {cause}"));
                source = cause.source();
            }
            1
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}
