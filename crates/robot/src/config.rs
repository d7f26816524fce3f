//! Repository config loading.
//!
//! Apps keep their per-repository settings in YAML files under `.github/`.
//! Those files are untrusted input. Before anything is deserialized, the
//! document is walked event by event and any explicit tag (`!!js/function`,
//! `!<tag:yaml.org,2002:binary>`, `!custom`, even `!!str`) is rejected rather
//! than resolved or dropped. The parsed document is then converted to plain
//! JSON values and deep-merged over the caller's defaults.
//!
//! # Merge rules
//!
//! - Keys present in the file win over the defaults.
//! - Keys only present in the defaults are kept.
//! - Nested mappings are merged recursively. Sequences and scalars are
//!   replaced as a whole.

use hubbot_github::{ContentSource, decode_content};
use hubbot_protocol::RepoRef;
use serde_json::{Map, Number, Value};
use serde_yaml::Value as YamlValue;
use tracing::{debug, instrument};
use yaml_rust2::parser::{Event, EventReceiver, Parser};

use crate::error::{Error, Result};

/// Directory config files live in.
pub const CONFIG_DIR: &str = ".github";

/// Loads config files from repositories through a [`ContentSource`].
pub struct ConfigLoader<'a> {
    source: &'a dyn ContentSource,
}

impl<'a> ConfigLoader<'a> {
    /// Creates a loader fetching through `source`.
    #[must_use]
    pub fn new(source: &'a dyn ContentSource) -> Self {
        Self { source }
    }

    /// Loads `.github/<file_name>` from `repo`.
    ///
    /// Returns `Ok(None)` if the file does not exist and no defaults were
    /// given, or the defaults unchanged if it does not exist and they were.
    /// An empty file counts as an empty mapping.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigFormat`] if the file is not a safe YAML
    /// mapping, or [`Error::GitHub`] for any fetch failure other than the
    /// file not existing.
    #[instrument(skip(self, defaults), fields(repo = %repo.full_name()))]
    pub async fn load(
        &self,
        repo: &RepoRef,
        file_name: &str,
        defaults: Option<Value>,
    ) -> Result<Option<Value>> {
        let path = format!("{CONFIG_DIR}/{file_name}");

        let encoded = match self.source.fetch_file(repo, &path).await {
            Ok(encoded) => encoded,
            Err(e) if e.is_not_found() => {
                debug!(%path, with_defaults = defaults.is_some(), "config file not found");
                return Ok(defaults);
            }
            Err(e) => return Err(e.into()),
        };

        let text = decode_content(&path, &encoded)?;
        let loaded = parse_document(&path, &text)?;
        debug!(%path, "loaded config file");

        Ok(Some(match defaults {
            Some(defaults) => deep_merge(defaults, loaded),
            None => loaded,
        }))
    }
}

/// Parses a config document into a JSON mapping.
///
/// An empty document yields `{}`.
///
/// # Errors
///
/// Returns [`Error::ConfigFormat`] if `text` is not valid YAML, uses a tag,
/// has a top level other than a mapping, or contains a mapping key or number
/// with no JSON counterpart.
///
/// # Examples
///
/// ```
/// use hubbot_robot::config::parse_document;
/// use serde_json::json;
///
/// let doc = parse_document("bot.yml", "foo: 5\nbar: [a, b]\n").unwrap();
/// assert_eq!(doc, json!({"foo": 5, "bar": ["a", "b"]}));
///
/// assert!(parse_document("bot.yml", "evil: !!js/function 'function () {}'").is_err());
/// ```
pub fn parse_document(path: &str, text: &str) -> Result<Value> {
    let format_error = |reason: String| Error::ConfigFormat {
        path: path.to_string(),
        reason,
    };

    reject_tags(text).map_err(format_error)?;
    let document: YamlValue = serde_yaml::from_str(text).map_err(|e| format_error(e.to_string()))?;
    match to_json(document).map_err(format_error)? {
        Value::Null => Ok(Value::Object(Map::new())),
        mapping @ Value::Object(_) => Ok(mapping),
        other => Err(format_error(format!(
            "expected a mapping at the top level, found {}",
            kind_of(&other)
        ))),
    }
}

/// Merges `overlay` over `base`.
///
/// # Examples
///
/// ```
/// use hubbot_robot::config::deep_merge;
/// use serde_json::json;
///
/// let merged = deep_merge(json!({"foo": 10, "bar": 7}), json!({"foo": 5}));
/// assert_eq!(merged, json!({"foo": 5, "bar": 7}));
/// ```
#[must_use]
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            Value::Object(base)
        }
        (_, overlay) => overlay,
    }
}

/// Remembers the first explicit tag in a document.
///
/// serde_yaml resolves `!!` and verbatim tags on its own and hands back the
/// bare value, so tags have to be caught at the event level.
#[derive(Default)]
struct TagScan {
    first: Option<String>,
}

impl EventReceiver for TagScan {
    fn on_event(&mut self, event: Event) {
        let tag = match event {
            Event::Scalar(_, _, _, tag)
            | Event::SequenceStart(_, tag)
            | Event::MappingStart(_, tag) => tag,
            _ => None,
        };
        if let (None, Some(tag)) = (&self.first, tag) {
            self.first = Some(format!("{}{}", tag.handle, tag.suffix));
        }
    }
}

fn reject_tags(text: &str) -> std::result::Result<(), String> {
    let mut scan = TagScan::default();
    Parser::new(text.chars())
        .load(&mut scan, true)
        .map_err(|e| e.to_string())?;
    match scan.first {
        Some(tag) => Err(format!("unknown tag {tag}")),
        None => Ok(()),
    }
}

fn to_json(value: YamlValue) -> std::result::Result<Value, String> {
    Ok(match value {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(b),
        YamlValue::Number(n) => number_to_json(&n)?,
        YamlValue::String(s) => Value::String(s),
        YamlValue::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(to_json)
                .collect::<std::result::Result<_, _>>()?,
        ),
        YamlValue::Mapping(entries) => {
            let mut object = Map::with_capacity(entries.len());
            for (key, value) in entries {
                object.insert(key_to_string(key)?, to_json(value)?);
            }
            Value::Object(object)
        }
        YamlValue::Tagged(tagged) => return Err(format!("unknown tag {}", tagged.tag)),
    })
}

fn number_to_json(n: &serde_yaml::Number) -> std::result::Result<Value, String> {
    if let Some(i) = n.as_i64() {
        Ok(Value::from(i))
    } else if let Some(u) = n.as_u64() {
        Ok(Value::from(u))
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("unsupported number {n}"))
    }
}

fn key_to_string(key: YamlValue) -> std::result::Result<String, String> {
    match key {
        YamlValue::String(s) => Ok(s),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Tagged(tagged) => Err(format!("unknown tag {}", tagged.tag)),
        _ => Err("mapping keys must be scalars".to_string()),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
