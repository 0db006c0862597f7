use crate::config::{PatchSource, Settings};
use crate::java::JavaRuntime;
use crate::version::{self, Version};
use anyhow::Context;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// The argument interface of the external patcher changed shape at major
/// version 5: `--patch-bundle`/`--merge` became `--patches`, and
/// integrations merging disappeared as a concept rather than a flag.
/// Selected once at startup from the resolved CLI tool version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    V4,
    V5,
}

impl Generation {
    /// An unparseable release tag is treated as current upstream (V5).
    pub fn from_cli_version(version: Option<&Version>) -> Self {
        match version {
            Some(v) if v.major >= 5 => Self::V5,
            Some(_) => Self::V4,
            None => Self::V5,
        }
    }
}

/// Cached tool paths feeding one run of the patcher. `integrations` is only
/// fetched (and only meaningful) for generation 4.
#[derive(Debug, Clone)]
pub struct ToolSet {
    pub cli: PathBuf,
    pub patches: PathBuf,
    pub integrations: Option<PathBuf>,
}

/// Drives the external patch command. Built once per run from the selected
/// patch source and resolved tools; `patch` is then called per input.
pub struct Patcher {
    java: JavaRuntime,
    generation: Generation,
    tools: ToolSet,
    out_dir: PathBuf,
    out_prefix: &'static str,
    options_dir: PathBuf,
    keystore: PathBuf,
    /// `--enable/--disable/--exclusive/--options` flags forwarded verbatim
    /// to a generation-5 patcher.
    passthrough: Vec<String>,
    /// Generation 5 dropped the options-file convention; the rvx CLI still
    /// reads the old format behind this flag.
    legacy_options: bool,
    temp_dir: PathBuf,
}

impl Patcher {
    pub fn new(
        java: JavaRuntime,
        generation: Generation,
        tools: ToolSet,
        source: &PatchSource,
        settings: &Settings,
        passthrough: Vec<String>,
    ) -> Self {
        Self {
            java,
            generation,
            tools,
            out_dir: settings.out_dir.clone(),
            out_prefix: source.out_prefix,
            options_dir: settings.options_dir.clone(),
            keystore: settings.keystore.clone(),
            passthrough,
            legacy_options: generation == Generation::V5 && source.name == "rvx",
            temp_dir: std::env::temp_dir().join("revanced-resource-cache"),
        }
    }

    /// Patches one APK. The external tool inherits our stdio so its own
    /// progress output stays visible; its temp directory is purged after
    /// every attempt because its built-in cleanup is unreliable.
    pub fn patch(&self, src: &Path, options_stem: &str) -> anyhow::Result<PathBuf> {
        let src_file = src
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("source path {} has no file name", src.display()))?;
        let out_path = self.out_dir.join(format!("{}{src_file}", self.out_prefix));
        let args = self.build_args(src, &out_path, options_stem);

        info!("patching {src_file}...");
        let status = Command::new(&self.java.binary).args(&args).status();
        self.purge_temp_dir();

        let status = status.with_context(|| format!("failed to launch patcher for {src_file}"))?;
        if !status.success() {
            anyhow::bail!("patcher exited with {status} for {src_file}");
        }
        info!("finished patching {}", out_path.display());
        Ok(out_path)
    }

    fn build_args(&self, src: &Path, out_path: &Path, options_stem: &str) -> Vec<OsString> {
        let options_file = self.options_dir.join(format!("{options_stem}.json"));
        let mut args: Vec<OsString> = vec![
            "-jar".into(),
            self.tools.cli.clone().into_os_string(),
            "patch".into(),
        ];

        match self.generation {
            Generation::V4 => {
                args.push(format!("--patch-bundle={}", self.tools.patches.display()).into());
                if let Some(integrations) = &self.tools.integrations {
                    args.push(format!("--merge={}", integrations.display()).into());
                }
                args.push(format!("--options={}", options_file.display()).into());
            }
            Generation::V5 => {
                args.push(format!("--patches={}", self.tools.patches.display()).into());
                args.extend(self.passthrough.iter().map(OsString::from));
                if self.legacy_options {
                    args.push(format!("--legacy-options={}", options_file.display()).into());
                }
            }
        }

        args.push(format!("--keystore={}", self.keystore.display()).into());
        args.push(format!("--temporary-files-path={}", self.temp_dir.display()).into());
        args.push(format!("--out={}", out_path.display()).into());
        args.push(src.as_os_str().to_os_string());
        args
    }

    /// Advisory cleanup: log and continue on failure.
    fn purge_temp_dir(&self) {
        if let Err(err) = fs::remove_dir_all(&self.temp_dir) {
            if err.kind() != io::ErrorKind::NotFound {
                debug!("could not purge {}: {err}", self.temp_dir.display());
            }
        }
    }
}

/// The options file sits next to the others, named after the input with its
/// version token removed: `YouTube v19.16.39.apk` uses `YouTube.json`.
pub fn options_stem(src_file: &str) -> String {
    let stripped = version::strip(src_file);
    match stripped.rfind('.') {
        Some(dot) => stripped[..dot].to_string(),
        None => stripped,
    }
}
