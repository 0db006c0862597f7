use crate::config::{AppEntry, DEFAULT_ARCH, DEFAULT_DPI};
use crate::version::Version;
use anyhow::Context;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

/// One-shot configuration for the external `apkmd` download helper.
#[derive(Debug, Serialize)]
struct DownloadConfig<'a> {
    apps: Vec<AppDescriptor<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AppDescriptor<'a> {
    out_file: String,
    org: &'a str,
    repo: &'a str,
    arch: &'a str,
    dpi: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

impl<'a> AppDescriptor<'a> {
    fn for_app(entry: &'a AppEntry, version: Option<&Version>) -> Self {
        let label = version.map_or_else(|| "latest".to_string(), Version::to_string);
        Self {
            out_file: format!("{} {label}", entry.name),
            org: entry.org,
            repo: entry.repo,
            arch: entry.arch.unwrap_or(DEFAULT_ARCH),
            dpi: entry.dpi.unwrap_or(DEFAULT_DPI),
            version: version.map(Version::to_string),
        }
    }
}

/// Downloads `entry` from the mirror via apkmd and returns the APK path.
/// Any failure aborts this app only; the caller's batch keeps going. The
/// descriptor file is removed when this function returns, success or not.
pub fn download_app(entry: &AppEntry, version: Option<&Version>) -> anyhow::Result<PathBuf> {
    let helper = which::which("apkmd").context("apkmd not found on PATH")?;
    let temp_dir = std::env::temp_dir();

    let descriptor = AppDescriptor::for_app(entry, version);
    let artifact = temp_dir.join(format!("{}.apk", descriptor.out_file));
    let config = DownloadConfig {
        apps: vec![descriptor],
    };

    // Uniquely named so concurrent unrelated runs cannot collide; dropped
    // (and thereby deleted) unconditionally on every exit path.
    let mut config_file = tempfile::Builder::new()
        .prefix("rvpatch-dl-")
        .suffix(".json")
        .tempfile_in(&temp_dir)
        .context("failed to create download descriptor")?;
    serde_json::to_writer(&mut config_file, &config)
        .context("failed to write download descriptor")?;
    config_file.flush()?;

    debug!("invoking {} for {}", helper.display(), entry.name);
    let status = Command::new(&helper)
        .arg(config_file.path())
        .current_dir(&temp_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .context("failed to launch apkmd")?;

    if !status.success() {
        anyhow::bail!("apkmd exited with {status}");
    }
    if !artifact.exists() {
        // apkmd reports success even when the mirror has no such build.
        anyhow::bail!(
            "apkmd produced no {} (version not available on the mirror?)",
            artifact.display()
        );
    }
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;

    #[test]
    fn descriptor_names_the_requested_version() {
        let entry = config::find_app("youtube").unwrap();
        let version = Version::parse("19.16.39").unwrap();
        let descriptor = AppDescriptor::for_app(entry, Some(&version));
        assert_eq!(descriptor.out_file, "youtube 19.16.39");
        assert_eq!(descriptor.version.as_deref(), Some("19.16.39"));

        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["outFile"], "youtube 19.16.39");
        assert_eq!(json["org"], "google-inc");
    }

    #[test]
    fn unpinned_descriptor_omits_version() {
        let entry = config::find_app("music").unwrap();
        let descriptor = AppDescriptor::for_app(entry, None);
        assert_eq!(descriptor.out_file, "music latest");

        let json = serde_json::to_value(&descriptor).unwrap();
        assert!(json.get("version").is_none());
        assert_eq!(json["arch"], config::DEFAULT_ARCH);
        assert_eq!(json["dpi"], config::DEFAULT_DPI);
    }
}
