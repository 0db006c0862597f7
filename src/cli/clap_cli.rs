use crate::config::VersionSelector;
use clap::builder::TypedValueParser;
use clap::error::ErrorKind;
use clap::{Error, Parser};
use std::path::PathBuf;

#[derive(Clone)]
struct SelectorParser;

impl TypedValueParser for SelectorParser {
    type Value = VersionSelector;

    fn parse_ref(
        &self,
        _cmd: &clap::Command,
        _arg: Option<&clap::Arg>,
        value: &std::ffi::OsStr,
    ) -> Result<Self::Value, clap::Error> {
        let text = value
            .to_str()
            .ok_or_else(|| Error::raw(ErrorKind::InvalidUtf8, "invalid UTF-8 in version"))?;
        text.parse()
            .map_err(|err: String| Error::raw(ErrorKind::InvalidValue, err))
    }
}

/// Patch APKs with ReVanced or ReVanced Extended without the busywork.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// APK files or known app names to patch; every APK in the source
    /// directory when omitted
    pub inputs: Vec<String>,

    /// Keystore used to sign the patched APKs
    #[arg(short = 'k', long, value_name = "FILE")]
    pub keystore: Option<PathBuf>,

    /// Directory holding per-app patch options files
    #[arg(long, value_name = "DIR")]
    pub options_dir: Option<PathBuf>,

    /// Directory to write patched APKs to
    #[arg(short = 'o', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// "rv" for ReVanced, "rvx" for ReVanced Extended
    #[arg(long, default_value = "rv", value_parser = ["rv", "rvx"])]
    pub patch_src: String,

    /// Directory to cache the patcher tools in
    #[arg(long, value_name = "DIR")]
    pub tools_dir: Option<PathBuf>,

    /// revanced-cli version to use ("latest" or e.g. 4.6.0)
    #[arg(long, value_name = "VERSION", default_value = "latest", value_parser = SelectorParser)]
    pub cli_version: VersionSelector,

    /// Patch bundle version to use ("latest" or e.g. 4.8.1)
    #[arg(long, value_name = "VERSION", default_value = "latest", value_parser = SelectorParser)]
    pub patches_version: VersionSelector,

    /// Integrations version to use, generation 4 only
    #[arg(long, value_name = "VERSION", default_value = "latest", value_parser = SelectorParser)]
    pub integrations_version: VersionSelector,

    /// Patch to enable, forwarded to a generation-5 patcher (repeatable)
    #[arg(long = "enable", value_name = "PATCH")]
    pub enable: Vec<String>,

    /// Patch to disable, forwarded to a generation-5 patcher (repeatable)
    #[arg(long = "disable", value_name = "PATCH")]
    pub disable: Vec<String>,

    /// Only apply explicitly enabled patches, forwarded to a generation-5
    /// patcher
    #[arg(long)]
    pub exclusive: bool,

    /// Options file forwarded to a generation-5 patcher
    #[arg(long = "options", value_name = "FILE")]
    pub options: Option<PathBuf>,
}

impl Cli {
    /// The raw flags a generation-5 patcher receives verbatim.
    pub fn passthrough(&self) -> Vec<String> {
        let mut flags = Vec::new();
        for patch in &self.enable {
            flags.push(format!("--enable={patch}"));
        }
        for patch in &self.disable {
            flags.push(format!("--disable={patch}"));
        }
        if self.exclusive {
            flags.push("--exclusive".to_string());
        }
        if let Some(options) = &self.options {
            flags.push(format!("--options={}", options.display()));
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn version_selectors_are_validated_at_parse_time() {
        let argv = Cli::try_parse_from(["rvpatch", "--cli-version", "4.6.0"]).unwrap();
        assert!(matches!(argv.cli_version, VersionSelector::Tagged(_)));

        assert!(Cli::try_parse_from(["rvpatch", "--cli-version", "newest"]).is_err());
        assert!(Cli::try_parse_from(["rvpatch", "--patch-src", "other"]).is_err());
    }

    #[test]
    fn passthrough_flags_are_rendered_verbatim() {
        let argv = Cli::try_parse_from([
            "rvpatch",
            "--enable",
            "Hide ads",
            "--disable",
            "Debugging",
            "--exclusive",
        ])
        .unwrap();
        assert_eq!(
            argv.passthrough(),
            vec![
                "--enable=Hide ads".to_string(),
                "--disable=Debugging".to_string(),
                "--exclusive".to_string(),
            ]
        );
    }
}
