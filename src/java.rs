use crate::errors::Fatal;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// revanced-cli ships class files for Java 11 (class-file major 55), so an
/// older runtime fails at load time. Checked once up front instead.
pub const MIN_CLASS_FILE_VERSION: u32 = 55;

// Class-file major = feature release + 44 (Java 11 -> 55).
const CLASS_FILE_BASE: u32 = 44;

/// A usable Java runtime: where its launcher lives and which feature
/// release it is.
#[derive(Debug, Clone)]
pub struct JavaRuntime {
    pub binary: PathBuf,
    pub feature: u32,
}

#[cfg(windows)]
const JAVA_EXE: &str = "java.exe";
#[cfg(not(windows))]
const JAVA_EXE: &str = "java";

/// Locates a Java runtime and verifies it is new enough to load the
/// patcher's class files. Any failure here is fatal for the whole run.
pub fn locate() -> Result<JavaRuntime, Fatal> {
    let binary = match java_locator::locate_java_home() {
        Ok(home) => PathBuf::from(home).join("bin").join(JAVA_EXE),
        Err(err) => {
            debug!("java-locator found nothing ({err}), trying PATH");
            which::which("java")
                .map_err(|_| Fatal::Java("no Java runtime found on this system".into()))?
        }
    };

    let output = Command::new(&binary)
        .arg("-version")
        .output()
        .map_err(|err| Fatal::Java(format!("failed to run {}: {err}", binary.display())))?;

    // `java -version` reports on stderr.
    let report = String::from_utf8_lossy(&output.stderr);
    let feature = parse_feature(&report)
        .ok_or_else(|| Fatal::Java(format!("could not parse Java version from: {report}")))?;

    if feature + CLASS_FILE_BASE < MIN_CLASS_FILE_VERSION {
        return Err(Fatal::Java(format!(
            "Java {feature} is too old: the patcher needs class-file version {MIN_CLASS_FILE_VERSION} (Java {})",
            MIN_CLASS_FILE_VERSION - CLASS_FILE_BASE
        )));
    }

    Ok(JavaRuntime { binary, feature })
}

/// Extracts the feature release from a `java -version` report, normalizing
/// the legacy `1.x` scheme (`1.8.0_292` is Java 8).
fn parse_feature(report: &str) -> Option<u32> {
    static QUOTED: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#""(\d+)(?:\.(\d+))?[^"]*""#).expect("java version regex"));
    let caps = QUOTED.captures(report)?;
    let major: u32 = caps.get(1)?.as_str().parse().ok()?;
    if major == 1 {
        caps.get(2)?.as_str().parse().ok()
    } else {
        Some(major)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modern_version_reports() {
        let report = r#"openjdk version "17.0.2" 2022-01-18"#;
        assert_eq!(parse_feature(report), Some(17));
    }

    #[test]
    fn normalizes_legacy_scheme() {
        let report = r#"java version "1.8.0_292""#;
        assert_eq!(parse_feature(report), Some(8));
    }

    #[test]
    fn rejects_unparseable_reports() {
        assert_eq!(parse_feature("command not found"), None);
    }

    #[test]
    fn threshold_is_java_11() {
        assert_eq!(MIN_CLASS_FILE_VERSION - CLASS_FILE_BASE, 11);
        assert!(8 + CLASS_FILE_BASE < MIN_CLASS_FILE_VERSION);
        assert!(11 + CLASS_FILE_BASE >= MIN_CLASS_FILE_VERSION);
    }
}
