//! Value kinds of well-known Flatpak metadata keys.
//!
//! Anything not covered by a rule is read as a plain string.

use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Bool,
    StringList,
    Int,
}

/// Group and key patterns, both matched against the whole name.
#[derive(Debug)]
pub struct MetadataRule {
    group: Regex,
    key: Regex,
    kind: ValueKind,
}

impl MetadataRule {
    fn new(group: &str, key: &str, kind: ValueKind) -> Self {
        Self {
            group: anchored(group),
            key: anchored(key),
            kind,
        }
    }

    pub fn matches(&self, group: &str, key: &str) -> bool {
        self.group.is_match(group) && self.key.is_match(key)
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }
}

fn anchored(pattern: &str) -> Regex {
    Regex::new(&format!("^(?:{pattern})$")).expect("invalid metadata rule pattern")
}

static RULES: LazyLock<Vec<MetadataRule>> = LazyLock::new(|| {
    use ValueKind::*;

    [
        (r"Context", r".*", StringList),
        (r"Extension \S+", r"autodelete", Bool),
        (r"Extension \S+", r"no-autodownload", Bool),
        (r"Extension \S+", r"subdirectories", Bool),
        (r"Extension \S+", r"locale-subset", Bool),
        (r"Extension \S+", r"versions", StringList),
        (r"Extension \S+", r"merge-dirs", StringList),
        (r"ExtensionOf", r"priority", Int),
        (r"(Application|Runtime)", r"required-flatpak", StringList),
        (r"(Application|Runtime)", r"tags", StringList),
        (r"Build", r"built-extensions", StringList),
    ]
    .into_iter()
    .map(|(group, key, kind)| MetadataRule::new(group, key, kind))
    .collect()
});

/// The rule table, in evaluation order.
pub fn rules() -> &'static [MetadataRule] {
    &RULES
}

/// Kind of the first rule matching `group` and `key`, or [`ValueKind::String`].
pub fn classify(group: &str, key: &str) -> ValueKind {
    rules()
        .iter()
        .find(|rule| rule.matches(group, key))
        .map_or(ValueKind::String, MetadataRule::kind)
}
