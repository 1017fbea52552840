use std::{fmt, str::FromStr};

use crate::error::MetaError;

const BUILT_EXTENSION_SUFFIXES: [&str; 3] = [".Sources", ".Locale", ".Debug"];

/// Whether `id` names auxiliary content (sources, translations or debug symbols).
pub fn is_built_extension(id: &str) -> bool {
    BUILT_EXTENSION_SUFFIXES
        .iter()
        .any(|suffix| id.ends_with(suffix))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    App,
    Runtime,
}

impl RefKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefKind::App => "app",
            RefKind::Runtime => "runtime",
        }
    }
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ref as listed by a remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
    pub kind: RefKind,
    pub name: String,
    pub arch: String,
    pub branch: String,
    pub eol: Option<String>,
    pub eol_rebase: Option<String>,
    /// Raw metadata key file embedded in the remote summary, when the listing carries it.
    pub metadata: Option<Vec<u8>>,
}

impl RemoteRef {
    /// Parses `kind/name/arch/branch`.
    pub fn parse(reference: &str) -> Result<Self, MetaError> {
        let invalid = || MetaError::InvalidRef(reference.to_string());

        let mut parts = reference.split('/');
        let (Some(kind), Some(name), Some(arch), Some(branch), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(invalid());
        };

        let kind = match kind {
            "app" => RefKind::App,
            "runtime" => RefKind::Runtime,
            _ => return Err(invalid()),
        };
        if [name, arch, branch].iter().any(|part| part.is_empty()) {
            return Err(invalid());
        }

        Ok(Self {
            kind,
            name: name.to_string(),
            arch: arch.to_string(),
            branch: branch.to_string(),
            eol: None,
            eol_rebase: None,
            metadata: None,
        })
    }

    pub fn format_ref(&self) -> String {
        self.to_string()
    }

    pub fn is_eol(&self) -> bool {
        self.eol.is_some() || self.eol_rebase.is_some()
    }

    pub fn is_built_extension(&self) -> bool {
        is_built_extension(&self.name)
    }
}

impl FromStr for RemoteRef {
    type Err = MetaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RemoteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.kind, self.name, self.arch, self.branch
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_built_extension() {
        assert!(is_built_extension("org.foo.Sources"));
        assert!(is_built_extension("org.foo.Locale"));
        assert!(is_built_extension("org.foo.Debug"));
        assert!(!is_built_extension("org.foo.SourcesX"));
        assert!(!is_built_extension("org.foo"));
        assert!(!is_built_extension("org.foo.debug"));
        assert!(!is_built_extension(""));
    }

    #[test]
    fn test_parse_ref() {
        let r = RemoteRef::parse("app/org.gnome.Maps/x86_64/stable").unwrap();
        assert_eq!(r.kind, RefKind::App);
        assert_eq!(r.name, "org.gnome.Maps");
        assert_eq!(r.arch, "x86_64");
        assert_eq!(r.branch, "stable");
        assert!(!r.is_eol());
        assert_eq!(r.format_ref(), "app/org.gnome.Maps/x86_64/stable");
        assert_eq!(r.to_string(), r.format_ref());

        let r: RemoteRef = "runtime/org.gnome.Platform.Locale/aarch64/45"
            .parse()
            .unwrap();
        assert_eq!(r.kind, RefKind::Runtime);
        assert!(r.is_built_extension());
    }

    #[test]
    fn test_parse_invalid_ref() {
        for input in [
            "",
            "app/org.gnome.Maps/x86_64",
            "app/org.gnome.Maps/x86_64/stable/extra",
            "appstream/x86_64",
            "extension/org.foo/x86_64/stable",
            "app//x86_64/stable",
            "Ref",
        ] {
            assert!(
                matches!(RemoteRef::parse(input), Err(MetaError::InvalidRef(_))),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_eol_flags() {
        let mut r = RemoteRef::parse("app/org.old.App/x86_64/stable").unwrap();
        r.eol_rebase = Some("org.new.App".to_string());
        assert!(r.is_eol());

        r.eol_rebase = None;
        r.eol = Some("unmaintained".to_string());
        assert!(r.is_eol());
    }
}
