use thiserror::Error;

/// Fatal configuration/environment errors. Anything here aborts the whole
/// run before or during setup; per-item failures (probe, download, patch)
/// are plain `anyhow` errors that the dispatch loop logs and moves past.
#[derive(Debug, Error)]
pub enum Fatal {
    #[error("invalid argument: {0}")]
    BadArgument(String),

    #[error("{0}")]
    Java(String),

    #[error("no release asset of {project} matched content type '{filter}'")]
    NoMatchingAsset { project: String, filter: String },
}

impl Fatal {
    /// Distinct exit status per failure class; 0 is reserved for runs that
    /// completed, even when individual patch jobs failed.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BadArgument(_) => 2,
            Self::Java(_) => 3,
            Self::NoMatchingAsset { .. } => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let errors = [
            Fatal::BadArgument("x".into()),
            Fatal::Java("x".into()),
            Fatal::NoMatchingAsset {
                project: "a/b".into(),
                filter: "application/jar".into(),
            },
        ];
        let mut codes: Vec<i32> = errors.iter().map(Fatal::exit_code).collect();
        codes.dedup();
        assert_eq!(codes.len(), 3);
        assert!(codes.iter().all(|&c| c != 0));
    }
}
