use crate::version::Version;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Which release of a tool to resolve: the newest one upstream, or a pinned
/// tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSelector {
    Latest,
    Tagged(Version),
}

impl FromStr for VersionSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("latest") {
            return Ok(Self::Latest);
        }
        Version::parse(s)
            .map(Self::Tagged)
            .ok_or_else(|| format!("expected 'latest' or a version like 4.6.0, got '{s}'"))
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::Tagged(v) => write!(f, "{v}"),
        }
    }
}

/// Coordinates of one remote tool: the GitHub project it is released under
/// and the content type that identifies its downloadable asset. The content
/// type may be disjunctive (`a|b`); `asset_name` is an extra filename regex
/// for releases that attach several files of the same type.
#[derive(Debug, Clone, Copy)]
pub struct ToolDescriptor {
    pub project: &'static str,
    pub content_type: &'static str,
    pub asset_name: Option<&'static str>,
}

/// A named bundle of tool coordinates plus output naming conventions.
/// Selected once per run and never mutated.
#[derive(Debug, Clone, Copy)]
pub struct PatchSource {
    pub name: &'static str,
    pub cache_subdir: &'static str,
    pub out_prefix: &'static str,
    pub patches: ToolDescriptor,
    pub integrations: ToolDescriptor,
    pub cli: ToolDescriptor,
}

pub const SOURCES: &[PatchSource] = &[
    PatchSource {
        name: "rv",
        cache_subdir: "rv",
        out_prefix: "RV ",
        patches: ToolDescriptor {
            project: "revanced/revanced-patches",
            content_type: "application/java-archive",
            asset_name: None,
        },
        integrations: ToolDescriptor {
            project: "revanced/revanced-integrations",
            content_type: "application/vnd.android.package-archive",
            asset_name: None,
        },
        cli: ToolDescriptor {
            project: "revanced/revanced-cli",
            content_type: "application/java-archive",
            asset_name: Some(r"-all\.jar$"),
        },
    },
    PatchSource {
        name: "rvx",
        cache_subdir: "rvx",
        out_prefix: "RVX ",
        patches: ToolDescriptor {
            project: "inotia00/revanced-patches",
            content_type: "application/jar|application/java-archive",
            asset_name: None,
        },
        integrations: ToolDescriptor {
            project: "inotia00/revanced-integrations",
            content_type: "application/vnd.android.package-archive",
            asset_name: None,
        },
        cli: ToolDescriptor {
            project: "inotia00/revanced-cli",
            content_type: "application/jar|application/java-archive",
            asset_name: Some(r"-all\.jar$"),
        },
    },
];

pub fn patch_source(name: &str) -> Option<&'static PatchSource> {
    SOURCES.iter().find(|s| s.name.eq_ignore_ascii_case(name))
}

pub const DEFAULT_ARCH: &str = "arm64-v8a";
pub const DEFAULT_DPI: &str = "nodpi";

/// One entry in the static directory of apps the downloader knows how to
/// fetch from the mirror. Never mutated; `arch`/`dpi` override the defaults
/// where a specific build is required.
#[derive(Debug, Clone, Copy)]
pub struct AppEntry {
    pub name: &'static str,
    pub package_id: &'static str,
    pub org: &'static str,
    pub repo: &'static str,
    pub arch: Option<&'static str>,
    pub dpi: Option<&'static str>,
}

pub const APPS: &[AppEntry] = &[
    AppEntry {
        name: "youtube",
        package_id: "com.google.android.youtube",
        org: "google-inc",
        repo: "youtube",
        arch: Some("universal"),
        dpi: None,
    },
    AppEntry {
        name: "music",
        package_id: "com.google.android.apps.youtube.music",
        org: "google-inc",
        repo: "youtube-music",
        arch: None,
        dpi: None,
    },
    AppEntry {
        name: "reddit",
        package_id: "com.reddit.frontpage",
        org: "redditinc",
        repo: "reddit",
        arch: None,
        dpi: None,
    },
    AppEntry {
        name: "twitter",
        package_id: "com.twitter.android",
        org: "x-corp",
        repo: "twitter",
        arch: None,
        dpi: None,
    },
    AppEntry {
        name: "tiktok",
        package_id: "com.zhiliaoapp.musically",
        org: "tiktok-pte-ltd",
        repo: "tik-tok",
        arch: None,
        dpi: None,
    },
];

pub fn find_app(name: &str) -> Option<&'static AppEntry> {
    APPS.iter().find(|a| a.name.eq_ignore_ascii_case(name))
}

/// Resolved filesystem layout for one run. Defaults mirror the classic
/// script layout: sources next to the binary, output one directory up,
/// tools and options in subdirectories, keystore beside the binary.
#[derive(Debug, Clone)]
pub struct Settings {
    pub src_dir: PathBuf,
    pub out_dir: PathBuf,
    pub tools_dir: PathBuf,
    pub options_dir: PathBuf,
    pub keystore: PathBuf,
}

impl Settings {
    pub fn defaults() -> Self {
        let base = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            src_dir: base.clone(),
            out_dir: base.join(".."),
            tools_dir: base.join("tools"),
            options_dir: base.join("options"),
            keystore: base.join("patch.keystore"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_lookup_ignores_case() {
        assert!(find_app("YouTube").is_some());
        assert!(find_app("MUSIC").is_some());
        assert!(find_app("solitaire").is_none());
    }

    #[test]
    fn selector_accepts_latest_and_tags() {
        assert_eq!("latest".parse::<VersionSelector>().unwrap(), VersionSelector::Latest);
        assert!(matches!(
            "v4.6.0".parse::<VersionSelector>().unwrap(),
            VersionSelector::Tagged(_)
        ));
        assert!("newest".parse::<VersionSelector>().is_err());
    }

    #[test]
    fn both_sources_are_registered() {
        assert!(patch_source("rv").is_some());
        assert!(patch_source("rvx").is_some());
        assert_eq!(patch_source("rv").unwrap().out_prefix, "RV ");
    }
}
