use crate::config::VersionSelector;
use crate::version::Version;
use anyhow::Context;
use regex::Regex;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub content_type: String,
    pub browser_download_url: String,
}

impl Release {
    /// The version embedded in the release tag, if the tag parses as one.
    pub fn version(&self) -> Option<Version> {
        Version::parse(&self.tag_name)
    }
}

/// The GitHub API rejects requests without a User-Agent.
pub fn client() -> anyhow::Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")
}

/// Fetches the selected release of `project`: the latest one, or the release
/// tagged `v<version>` for a pinned selector.
pub fn fetch_release(
    client: &reqwest::blocking::Client,
    project: &str,
    selector: &VersionSelector,
) -> anyhow::Result<Release> {
    let url = match selector {
        VersionSelector::Latest => {
            format!("https://api.github.com/repos/{project}/releases/latest")
        }
        VersionSelector::Tagged(v) => {
            format!("https://api.github.com/repos/{project}/releases/tags/v{v}")
        }
    };
    client
        .get(&url)
        .send()
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("failed to fetch release metadata from {url}"))?
        .json()
        .with_context(|| format!("malformed release metadata from {url}"))
}

/// Picks the first asset whose content type matches the (possibly
/// disjunctive, `a|b`) filter and whose name matches the optional filename
/// regex. `None` means the release carries nothing usable, which callers
/// treat as a fatal configuration error.
pub fn select_asset<'a>(
    release: &'a Release,
    content_type: &str,
    name_filter: Option<&Regex>,
) -> Option<&'a ReleaseAsset> {
    release.assets.iter().find(|asset| {
        content_type.split('|').any(|t| t == asset.content_type)
            && name_filter.is_none_or(|re| re.is_match(&asset.name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(assets: Vec<ReleaseAsset>) -> Release {
        Release {
            tag_name: "v2.0.1".into(),
            assets,
        }
    }

    fn asset(name: &str, content_type: &str) -> ReleaseAsset {
        ReleaseAsset {
            name: name.into(),
            content_type: content_type.into(),
            browser_download_url: format!("https://example.invalid/{name}"),
        }
    }

    #[test]
    fn selects_by_content_type() {
        let rel = release(vec![
            asset("tool.jar", "application/jar"),
            asset("notes.txt", "text/plain"),
        ]);
        let chosen = select_asset(&rel, "application/jar", None).unwrap();
        assert_eq!(chosen.name, "tool.jar");
    }

    #[test]
    fn disjunctive_filter_matches_either_type() {
        let rel = release(vec![asset("tool.jar", "application/java-archive")]);
        assert!(select_asset(&rel, "application/jar|application/java-archive", None).is_some());
        assert!(select_asset(&rel, "application/jar", None).is_none());
    }

    #[test]
    fn name_filter_narrows_the_match() {
        let rel = release(vec![
            asset("tool-sources.jar", "application/jar"),
            asset("tool-all.jar", "application/jar"),
        ]);
        let re = Regex::new(r"-all\.jar$").unwrap();
        let chosen = select_asset(&rel, "application/jar", Some(&re)).unwrap();
        assert_eq!(chosen.name, "tool-all.jar");
    }

    #[test]
    fn selection_is_deterministic() {
        let rel = release(vec![
            asset("first.jar", "application/jar"),
            asset("second.jar", "application/jar"),
        ]);
        let a = select_asset(&rel, "application/jar", None).unwrap().name.clone();
        let b = select_asset(&rel, "application/jar", None).unwrap().name.clone();
        assert_eq!(a, b);
        assert_eq!(a, "first.jar");
    }

    #[test]
    fn release_version_comes_from_the_tag() {
        let rel = release(vec![]);
        assert_eq!(rel.version().unwrap().to_string(), "2.0.1");
    }
}
