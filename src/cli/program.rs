use crate::cli::clap_cli::Cli;
use crate::config::{self, AppEntry, Settings};
use crate::errors::Fatal;
use crate::java::{self, JavaRuntime};
use crate::patcher::{self, Generation, Patcher, ToolSet};
use crate::probe::{self, ProbeOutcome};
use crate::tools::ToolCache;
use crate::{download, github, progress};
use anyhow::Context;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// One validated positional argument: an APK on disk, or an app the
/// downloader knows by name.
#[derive(Debug)]
pub(crate) enum Input {
    File(PathBuf),
    App(&'static AppEntry),
}

pub fn program() -> anyhow::Result<()> {
    let argv = Cli::parse();
    let settings = resolve_settings(&argv);
    let source = config::patch_source(&argv.patch_src)
        .ok_or_else(|| Fatal::BadArgument(format!("unknown patch source '{}'", argv.patch_src)))?;

    // Validate every input before any network or process work begins.
    let inputs = resolve_inputs(&argv.inputs, &settings.src_dir)?;
    if inputs.is_empty() {
        warn!("nothing to patch: no inputs given and no APKs in {}", settings.src_dir.display());
        return Ok(());
    }

    // The patcher cannot run at all without a modern Java, so this halts
    // the run before any tool resolution.
    let java = java::locate()?;
    info!("using Java {} at {}", java.feature, java.binary.display());

    for dir in [&settings.out_dir, &settings.options_dir] {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    if let Some(parent) = settings.keystore.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let client = github::client()?;
    let cache = ToolCache::new(settings.tools_dir.join(source.cache_subdir));

    // The CLI tool goes first: its resolved version decides the argument
    // generation, which in turn decides whether integrations exist at all.
    let pb = progress::create_spinner("Resolving patch tools...");
    let cli_tool = cache.ensure(&client, &source.cli, &argv.cli_version)?;
    let generation = Generation::from_cli_version(cli_tool.version.as_ref());
    let patches_tool = cache.ensure(&client, &source.patches, &argv.patches_version)?;
    let integrations = match generation {
        Generation::V4 => {
            Some(cache.ensure(&client, &source.integrations, &argv.integrations_version)?.path)
        }
        Generation::V5 => None,
    };
    pb.finish_and_clear();

    let passthrough = argv.passthrough();
    if generation == Generation::V4 && !passthrough.is_empty() {
        warn!("generation-4 patcher selected: {} forwarded flags ignored", passthrough.len());
    }

    let tools = ToolSet {
        cli: cli_tool.path.clone(),
        patches: patches_tool.path.clone(),
        integrations,
    };
    let patcher = Patcher::new(
        java.clone(),
        generation,
        tools,
        source,
        &settings,
        passthrough,
    );

    let failed = run_batch(&patcher, &java, &cli_tool.path, &patches_tool.path, &inputs);
    if failed > 0 {
        // Per-item failures were already reported; they do not change the
        // exit status.
        warn!("{failed} of {} inputs failed", inputs.len());
    }
    Ok(())
}

fn resolve_settings(argv: &Cli) -> Settings {
    let defaults = Settings::defaults();
    Settings {
        src_dir: defaults.src_dir,
        out_dir: argv.out_dir.clone().unwrap_or(defaults.out_dir),
        tools_dir: argv.tools_dir.clone().unwrap_or(defaults.tools_dir),
        options_dir: argv.options_dir.clone().unwrap_or(defaults.options_dir),
        keystore: argv.keystore.clone().unwrap_or(defaults.keystore),
    }
}

/// Maps each positional argument to a file or a known app, rejecting the
/// whole run on the first argument that is neither. With no arguments,
/// falls back to every APK in the source directory.
fn resolve_inputs(raw: &[String], src_dir: &Path) -> anyhow::Result<Vec<Input>> {
    if raw.is_empty() {
        let mut paths: Vec<PathBuf> = fs::read_dir(src_dir)
            .map(|entries| {
                entries
                    .flatten()
                    .map(|e| e.path())
                    .filter(|p| {
                        p.is_file()
                            && p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("apk"))
                    })
                    .collect()
            })
            .unwrap_or_default();
        paths.sort();
        return Ok(paths.into_iter().map(Input::File).collect());
    }

    raw.iter()
        .map(|arg| {
            let path = Path::new(arg);
            if path.is_file() {
                Ok(Input::File(path.to_path_buf()))
            } else if let Some(entry) = config::find_app(arg) {
                Ok(Input::App(entry))
            } else {
                Err(Fatal::BadArgument(format!(
                    "'{arg}' is neither an existing file nor a known app name"
                ))
                .into())
            }
        })
        .collect()
}

/// Runs every input in the order given. A failing item is reported and the
/// loop moves on; it never aborts the batch. Returns the failure count.
pub(crate) fn run_batch(
    patcher: &Patcher,
    java: &JavaRuntime,
    cli_jar: &Path,
    patches: &Path,
    inputs: &[Input],
) -> usize {
    let mut failed = 0;
    for input in inputs {
        let (label, result) = match input {
            Input::File(path) => {
                let stem = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(patcher::options_stem)
                    .unwrap_or_default();
                (
                    path.display().to_string(),
                    patcher.patch(path, &stem).map(|_| ()),
                )
            }
            Input::App(entry) => (
                entry.name.to_string(),
                patch_app(patcher, java, cli_jar, patches, entry),
            ),
        };
        if let Err(err) = result {
            error!("{label}: {err:#}");
            failed += 1;
        }
    }
    failed
}

/// Probe, download, patch, then drop the downloaded source APK. Probe and
/// download failures abort this app only.
fn patch_app(
    patcher: &Patcher,
    java: &JavaRuntime,
    cli_jar: &Path,
    patches: &Path,
    entry: &AppEntry,
) -> anyhow::Result<()> {
    let version = match probe::supported_version(java, cli_jar, patches, entry.package_id)? {
        ProbeOutcome::Unsupported => {
            anyhow::bail!("{} is not supported by the selected patch bundle", entry.name)
        }
        ProbeOutcome::Supported(version) => version,
    };

    let apk = download::download_app(entry, version.as_ref())?;
    let result = patcher.patch(&apk, entry.name).map(|_| ());
    if let Err(err) = fs::remove_file(&apk) {
        warn!("could not remove downloaded {}: {err}", apk.display());
    }
    result
}
