use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;

/// A dotted numeric version token as it appears in release tags, cached
/// file names, and `list-patches` output. Ordering is numeric on the
/// `(major, minor, patch)` tuple, so `1.10.0` sorts above `1.2.10`.
#[derive(Debug, Clone)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
    pub suffix: Option<String>,
}

/// Matches a dotted version token, optionally `v`-prefixed and optionally
/// carrying a `-suffix` (e.g. `v4.6.0-all`).
static VERSION_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"v?\d+\.\d+(?:\.\d+)?(?:-[A-Za-z0-9.]+)?").expect("version regex"));

impl Version {
    /// Parses `X.Y[.Z][-suffix]`, tolerating a leading `v`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.strip_prefix('v').unwrap_or(text);
        let (numbers, suffix) = match text.split_once('-') {
            Some((n, s)) if !s.is_empty() => (n, Some(s.to_string())),
            Some((n, _)) => (n, None),
            None => (text, None),
        };

        let mut parts = numbers.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = match parts.next() {
            Some(p) => Some(p.parse().ok()?),
            None => None,
        };
        if parts.next().is_some() {
            return None;
        }

        Some(Self {
            major,
            minor,
            patch,
            suffix,
        })
    }

    /// Every version token found in `text`, in order of appearance.
    pub fn find_all(text: &str) -> Vec<Self> {
        VERSION_TOKEN
            .find_iter(text)
            .filter_map(|m| Self::parse(m.as_str()))
            .collect()
    }

    fn key(&self) -> (u32, u32, u32, Option<&str>) {
        (
            self.major,
            self.minor,
            self.patch.unwrap_or(0),
            self.suffix.as_deref(),
        )
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(patch) = self.patch {
            write!(f, ".{patch}")?;
        }
        if let Some(suffix) = &self.suffix {
            write!(f, "-{suffix}")?;
        }
        Ok(())
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Version {}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Stamps `version` into `name` before the extension so every cached file is
/// version-identifiable regardless of upstream naming: `tool.jar` becomes
/// `tool-2.0.1.jar`. A name that already embeds the version is returned
/// unchanged.
pub fn stamp(name: &str, version: &Version) -> String {
    let rendered = version.to_string();
    if name.contains(&rendered) {
        return name.to_string();
    }
    match name.rfind('.') {
        Some(dot) => format!("{}-{}{}", &name[..dot], rendered, &name[dot..]),
        None => format!("{name}-{rendered}"),
    }
}

/// Removes an embedded version token (and its separator) from a file name,
/// yielding the plain app/tool name: `YouTube v19.16.39.apk` → `YouTube.apk`.
pub fn strip(name: &str) -> String {
    static EMBEDDED: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[\s_-]*v?\d+\.\d+(?:\.\d+)?(?:-\S*)?").expect("strip regex"));
    EMBEDDED.replace_all(name, "").into_owned()
}

/// The identity shape of a cached tool file: everything before the version
/// digits (a `v` marker excluded), plus the extension. Two names share an
/// identity when both parts match, which is how stale versions of the same
/// tool are recognized for pruning (covers raw and `v`-prefixed legacy names
/// alike).
pub fn identity(name: &str) -> (&str, &str) {
    let prefix_end = name
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(name.len());
    let ext_start = name.rfind('.').unwrap_or(name.len());
    let prefix = &name[..prefix_end.min(ext_start)];
    (prefix.strip_suffix('v').unwrap_or(prefix), &name[ext_start..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tags_and_suffixes() {
        let v = Version::parse("v4.6.0-all").unwrap();
        assert_eq!(v.major, 4);
        assert_eq!(v.minor, 6);
        assert_eq!(v.patch, Some(0));
        assert_eq!(v.suffix.as_deref(), Some("all"));
        assert_eq!(v.to_string(), "4.6.0-all");

        assert!(Version::parse("latest").is_none());
        assert!(Version::parse("1").is_none());
        assert_eq!(Version::parse("2.1").unwrap().to_string(), "2.1");
    }

    #[test]
    fn orders_numerically_not_lexicographically() {
        let mut versions: Vec<Version> = ["1.2.3", "1.10.0", "1.2.10"]
            .iter()
            .map(|s| Version::parse(s).unwrap())
            .collect();
        versions.sort();
        assert_eq!(versions.last().unwrap().to_string(), "1.10.0");
    }

    #[test]
    fn stamp_inserts_before_extension() {
        let v = Version::parse("2.0.1").unwrap();
        assert_eq!(stamp("tool.jar", &v), "tool-2.0.1.jar");
        assert_eq!(stamp("tool-2.0.1.jar", &v), "tool-2.0.1.jar");
        assert_eq!(stamp("revanced-cli-2.0.1-all.jar", &v), "revanced-cli-2.0.1-all.jar");
    }

    #[test]
    fn strip_drops_version_and_separator() {
        assert_eq!(strip("YouTube v19.16.39.apk"), "YouTube.apk");
        assert_eq!(strip("music 6.51.52.apk"), "music.apk");
        assert_eq!(strip("plain.apk"), "plain.apk");
    }

    #[test]
    fn identity_is_prefix_plus_extension() {
        assert_eq!(identity("revanced-cli-4.6.0-all.jar"), ("revanced-cli-", ".jar"));
        assert_eq!(identity("tool.jar"), ("tool", ".jar"));
        assert_eq!(
            identity("revanced-cli-5.0.0.jar").0,
            identity("revanced-cli-4.6.0-all.jar").0
        );
        // a v-prefixed legacy name shares identity with the raw shape
        assert_eq!(identity("revanced-cli-v4.5.0.jar"), ("revanced-cli-", ".jar"));
    }

    #[test]
    fn find_all_extracts_every_token() {
        let found = Version::find_all("19.16.39 also 19.20.1 and noise 7");
        assert_eq!(found.len(), 2);
        assert_eq!(found.iter().max().unwrap().to_string(), "19.20.1");
    }
}
