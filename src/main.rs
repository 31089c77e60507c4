use anyhow::{Context, Result};
use ccheck::cli::Cli;
use ccheck::core::Severity;
use ccheck::io::create_writer;
use ccheck::runner::run_files;
use clap::Parser;
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Source extensions treated as C/C++ translation units or headers
static SOURCE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx", "h", "hpp"];

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let settings = cli.to_settings()?;

    if let Some(jobs) = cli.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.max(1))
            .build_global()
            .context("failed to configure the analysis thread pool")?;
    } else {
        log::debug!("using {} analysis threads", num_cpus::get());
    }

    let files = collect_source_files(&cli.paths)?;
    if files.is_empty() {
        anyhow::bail!("no C/C++ source files found under the given paths");
    }
    log::info!("analyzing {} file(s)", files.len());

    let diagnostics = run_files(&files, &settings);

    let mut writer = match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create output file {}", path.display()))?;
            create_writer(file, cli.format)
        }
        None => create_writer(std::io::stdout(), cli.format),
    };
    writer.write_diagnostics(&diagnostics)?;

    if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        std::process::exit(1);
    }
    Ok(())
}

fn collect_source_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path).follow_links(false) {
            let entry = entry.with_context(|| format!("cannot walk {}", path.display()))?;
            if entry.file_type().is_file() && has_source_extension(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
