use crate::config::{ToolDescriptor, VersionSelector};
use crate::errors::Fatal;
use crate::version::{self, Version};
use crate::{github, progress};
use anyhow::Context;
use regex::Regex;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A tool that is now present on disk, plus the version the release tag
/// resolved to (used to pick the patcher generation).
#[derive(Debug, Clone)]
pub struct ResolvedTool {
    pub path: PathBuf,
    pub version: Option<Version>,
}

/// A directory holding at most one live asset per tool identity. Presence is
/// checked by file name only; a truncated earlier download looks complete to
/// us (upstream publishes no checksums to verify against).
pub struct ToolCache {
    dir: PathBuf,
}

impl ToolCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Resolves the selected release of the tool and makes sure its asset is
    /// present in the cache, downloading it only if the version-stamped file
    /// is missing. Stale versions of the same tool are pruned first.
    pub fn ensure(
        &self,
        client: &reqwest::blocking::Client,
        descriptor: &ToolDescriptor,
        selector: &VersionSelector,
    ) -> anyhow::Result<ResolvedTool> {
        let release = github::fetch_release(client, descriptor.project, selector)?;
        let name_filter = descriptor
            .asset_name
            .map(Regex::new)
            .transpose()
            .context("bad asset name filter")?;
        let asset = github::select_asset(&release, descriptor.content_type, name_filter.as_ref())
            .ok_or_else(|| Fatal::NoMatchingAsset {
                project: descriptor.project.to_string(),
                filter: descriptor.content_type.to_string(),
            })?;

        let resolved_version = release.version();
        let file_name = match &resolved_version {
            Some(v) => version::stamp(&asset.name, v),
            None => asset.name.clone(),
        };

        let (path, fetched) = self.ensure_file(&file_name, |dest| {
            download_asset(client, &asset.browser_download_url, &asset.name, dest)
        })?;
        if fetched {
            info!("downloaded {} {}", descriptor.project, release.tag_name);
        } else {
            debug!("{file_name} already cached");
        }

        Ok(ResolvedTool {
            path,
            version: resolved_version,
        })
    }

    /// Idempotent core: if `file_name` is already present no fetch happens;
    /// otherwise older files of the same identity are pruned and `fetch`
    /// runs exactly once. Returns the path and whether a fetch occurred.
    fn ensure_file(
        &self,
        file_name: &str,
        fetch: impl FnOnce(&Path) -> anyhow::Result<()>,
    ) -> anyhow::Result<(PathBuf, bool)> {
        let target = self.dir.join(file_name);
        if target.exists() {
            return Ok((target, false));
        }

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create tool cache at {}", self.dir.display()))?;
        self.prune_stale(file_name);
        fetch(&target)?;
        Ok((target, true))
    }

    /// Deletes cached files that share the new file's tool identity (same
    /// prefix-before-digits and extension). Removal is advisory: a file we
    /// cannot delete is logged and left behind, not retried.
    fn prune_stale(&self, file_name: &str) {
        let identity = version::identity(file_name);
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return;
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name != file_name && version::identity(name) == identity {
                if let Err(err) = fs::remove_file(entry.path()) {
                    warn!("could not remove stale tool {name}: {err}");
                }
            }
        }
    }
}

fn download_asset(
    client: &reqwest::blocking::Client,
    url: &str,
    name: &str,
    dest: &Path,
) -> anyhow::Result<()> {
    let mut response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("failed to download {url}"))?;

    let pb = progress::create_bytes_progress(
        format!("Downloading {name}"),
        response.content_length().unwrap_or(0),
    );
    let file = File::create(dest)
        .with_context(|| format!("failed to create {}", dest.display()))?;
    let mut writer = pb.wrap_write(BufWriter::new(file));
    response
        .copy_to(&mut writer)
        .with_context(|| format!("failed to write {}", dest.display()))?;
    writer.flush()?;
    pb.finish_and_clear();
    Ok(())
}
