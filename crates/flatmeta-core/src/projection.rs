//! Typed projection of a metadata key file into a JSON-ready mapping.

use std::collections::BTreeMap;

use serde::{ser::SerializeMap, Serialize, Serializer};
use tracing::warn;

use crate::{
    keyfile::{KeyFile, KeyfileError},
    schema::{classify, ValueKind},
};

/// Output key collecting all `Extension <id>` groups.
pub const EXTENSION_GROUP: &str = "Extension";

const EXTENSION_PREFIX: &str = "Extension ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i32),
    List(Vec<String>),
    String(String),
}

pub type Fields = BTreeMap<String, MetadataValue>;

/// Metadata of one ref: plain groups keyed by name, plus the extension groups
/// nested under [`EXTENSION_GROUP`] by extension id.
///
/// Keys of a bare `[Extension]` group sit next to the extension ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectedMetadata {
    groups: BTreeMap<String, Fields>,
    extensions: BTreeMap<String, Fields>,
    extension_fields: Fields,
}

impl ProjectedMetadata {
    pub fn group(&self, name: &str) -> Option<&Fields> {
        self.groups.get(name)
    }

    pub fn extension(&self, id: &str) -> Option<&Fields> {
        self.extensions.get(id)
    }

    fn has_extension_entry(&self) -> bool {
        !self.extensions.is_empty() || !self.extension_fields.is_empty()
    }
}

struct ExtensionEntry<'a>(&'a ProjectedMetadata);

impl Serialize for ExtensionEntry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let projected = self.0;
        let len = projected.extension_fields.len() + projected.extensions.len();
        let mut map = serializer.serialize_map(Some(len))?;
        for (key, value) in &projected.extension_fields {
            map.serialize_entry(key, value)?;
        }
        for (id, fields) in &projected.extensions {
            map.serialize_entry(id, fields)?;
        }
        map.end()
    }
}

impl Serialize for ProjectedMetadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.groups.len() + usize::from(self.has_extension_entry());
        let mut map = serializer.serialize_map(Some(len))?;
        for (name, fields) in &self.groups {
            map.serialize_entry(name, fields)?;
        }
        if self.has_extension_entry() {
            map.serialize_entry(EXTENSION_GROUP, &ExtensionEntry(self))?;
        }
        map.end()
    }
}

/// Extension id of an `Extension <id>` group name.
pub fn extension_id(group: &str) -> Option<&str> {
    group
        .strip_prefix(EXTENSION_PREFIX)
        .map(str::trim_start)
        .filter(|id| !id.is_empty())
}

/// Reads every entry through the accessor its [`classify`] kind calls for.
///
/// A value that does not parse as its kind fails the whole projection.
pub fn project(keyfile: &KeyFile) -> Result<ProjectedMetadata, KeyfileError> {
    let mut projected = ProjectedMetadata::default();

    for group in keyfile.groups() {
        let id = extension_id(group);
        for key in keyfile.keys(group)? {
            let value = read_value(keyfile, group, key)?;
            let fields = match id {
                Some(id) => projected.extensions.entry(id.to_string()).or_default(),
                None if group == EXTENSION_GROUP => &mut projected.extension_fields,
                None => projected.groups.entry(group.to_string()).or_default(),
            };
            fields.insert(key.to_string(), value);
        }
    }

    let extensions = &projected.extensions;
    projected.extension_fields.retain(|key, _| {
        let shadowed = extensions.contains_key(key);
        if shadowed {
            warn!("Dropping [{EXTENSION_GROUP}] key {key}, an extension has the same id");
        }
        !shadowed
    });

    Ok(projected)
}

fn read_value(keyfile: &KeyFile, group: &str, key: &str) -> Result<MetadataValue, KeyfileError> {
    Ok(match classify(group, key) {
        ValueKind::Bool => MetadataValue::Bool(keyfile.boolean(group, key)?),
        ValueKind::Int => MetadataValue::Int(keyfile.integer(group, key)?),
        ValueKind::StringList => MetadataValue::List(keyfile.string_list(group, key)?),
        ValueKind::String => MetadataValue::String(keyfile.string(group, key)?),
    })
}
