use crate::java::JavaRuntime;
use crate::version::Version;
use anyhow::Context;
use std::path::Path;
use std::process::Command;

/// What the patch bundle has to say about a package.
#[derive(Debug, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The package never appears in the bundle's patch list; patching it
    /// with this bundle would be pointless.
    Unsupported,
    /// The bundle supports the package. `None` means no patch pins a
    /// version, so any build (the mirror's latest) will do.
    Supported(Option<Version>),
}

/// Asks the patcher which versions of `package_id` the selected patch
/// bundle supports, via its read-only `list-patches` mode.
pub fn supported_version(
    java: &JavaRuntime,
    cli_jar: &Path,
    patches: &Path,
    package_id: &str,
) -> anyhow::Result<ProbeOutcome> {
    let output = Command::new(&java.binary)
        .arg("-jar")
        .arg(cli_jar)
        .arg("list-patches")
        .arg(format!("--filter-package-name={package_id}"))
        .arg("--with-versions")
        .arg("--with-packages")
        .arg(patches)
        .output()
        .with_context(|| format!("failed to run list-patches for {package_id}"))?;

    if !output.status.success() {
        anyhow::bail!("list-patches exited with {}", output.status);
    }

    let listing = String::from_utf8_lossy(&output.stdout);
    Ok(parse_listing(&listing, package_id))
}

fn parse_listing(listing: &str, package_id: &str) -> ProbeOutcome {
    if !listing.contains(package_id) {
        return ProbeOutcome::Unsupported;
    }
    ProbeOutcome::Supported(Version::find_all(listing).into_iter().max())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_package_means_unsupported() {
        let listing = "Index: 0\nName: Hide ads\nPackage: com.other.app\n";
        assert_eq!(
            parse_listing(listing, "com.google.android.youtube"),
            ProbeOutcome::Unsupported
        );
    }

    #[test]
    fn picks_the_numerically_highest_version() {
        let listing = "Package: com.example.app\n1.2.3\n1.10.0\n1.2.10\n";
        let ProbeOutcome::Supported(Some(best)) = parse_listing(listing, "com.example.app") else {
            panic!("expected a supported version");
        };
        assert_eq!(best.to_string(), "1.10.0");
    }

    #[test]
    fn supported_without_versions_yields_none() {
        let listing = "Package: com.example.app\nCompatible with any version\n";
        assert_eq!(
            parse_listing(listing, "com.example.app"),
            ProbeOutcome::Supported(None)
        );
    }
}
