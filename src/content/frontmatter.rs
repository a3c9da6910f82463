//! Front-matter parsing

use serde::de::{self, DeserializeOwned, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::fmt;

/// Accepts any YAML scalar and keeps its textual form
///
/// `date: 2024` or `title: 42` should not throw away the whole block just
/// because the value is not quoted.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ScalarString;

    impl<'de> Visitor<'de> for ScalarString {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, number or boolean")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(ScalarString)
}

/// A scalar front-matter value in its textual form
struct Scalar(Option<String>);

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        scalar_string(deserializer).map(Scalar)
    }
}

/// The `author` key: either a bare name or a `{ name, picture }` mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorField {
    pub name: Option<String>,
    pub picture: Option<String>,
}

impl<'de> Deserialize<'de> for AuthorField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AuthorVisitor;

        impl<'de> Visitor<'de> for AuthorVisitor {
            type Value = AuthorField;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an author name or a mapping with name and picture")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(AuthorField {
                    name: Some(value.to_string()),
                    picture: None,
                })
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(AuthorField::default())
            }

            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut author = AuthorField::default();
                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "name" => author.name = map.next_value::<Scalar>()?.0,
                        "picture" => author.picture = map.next_value::<Scalar>()?.0,
                        _ => {
                            map.next_value::<de::IgnoredAny>()?;
                        }
                    }
                }
                Ok(author)
            }
        }

        deserializer.deserialize_any(AuthorVisitor)
    }
}

/// The `ogImage` key
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OgImageField {
    #[serde(deserialize_with = "scalar_string")]
    pub url: Option<String>,
}

/// Front-matter data from a post
///
/// Unrecognized keys are ignored. A recognized key holding a value of the
/// wrong shape counts as missing; the other keys are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<String>,
    pub cover_image: Option<String>,
    pub author: Option<AuthorField>,
    pub excerpt: Option<String>,
    pub og_image: Option<OgImageField>,
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    ///
    /// Never fails: a missing, empty or malformed block yields the default
    /// front-matter.
    pub fn parse(content: &str) -> (Self, &str) {
        let trimmed = content.trim_start_matches(['\u{feff}', '\n', '\r']);

        match split_block(trimmed) {
            Some((yaml, body)) => {
                if yaml.trim().is_empty() {
                    return (FrontMatter::default(), body);
                }
                if !has_yaml_structure(yaml) {
                    // A leading thematic break, not front-matter
                    return (FrontMatter::default(), content);
                }
                match serde_yaml::from_str::<Value>(yaml) {
                    Ok(Value::Mapping(map)) => (FrontMatter::from_mapping(&map), body),
                    Ok(_) => {
                        tracing::warn!("YAML front-matter is not a mapping, using defaults");
                        (FrontMatter::default(), body)
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse YAML front-matter, using defaults: {}", e);
                        (FrontMatter::default(), body)
                    }
                }
            }
            None => (FrontMatter::default(), content),
        }
    }

    /// Pick the recognized keys out of a parsed block, one at a time
    fn from_mapping(map: &Mapping) -> Self {
        Self {
            title: field::<Scalar>(map, "title").and_then(|s| s.0),
            date: field::<Scalar>(map, "date").and_then(|s| s.0),
            cover_image: field::<Scalar>(map, "coverImage").and_then(|s| s.0),
            author: field(map, "author"),
            excerpt: field::<Scalar>(map, "excerpt").and_then(|s| s.0),
            og_image: field(map, "ogImage"),
        }
    }
}

/// Deserialize one key, treating a mistyped value as absent
fn field<T: DeserializeOwned>(map: &Mapping, key: &str) -> Option<T> {
    let value = map.get(key)?;
    match T::deserialize(value.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("Ignoring front-matter key {:?}: {}", key, e);
            None
        }
    }
}

/// Split `---\n<yaml>\n---\n<body>` into its two halves
fn split_block(content: &str) -> Option<(&str, &str)> {
    let first_end = content.find('\n')?;
    if content[..first_end].trim_end() != "---" {
        return None;
    }

    let yaml_start = first_end + 1;
    let mut offset = yaml_start;
    for line in content[yaml_start..].split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &content[yaml_start..offset];
            let body = &content[offset + line.len()..];
            return Some((yaml, body.trim_start_matches(['\n', '\r'])));
        }
        offset += line.len();
    }

    None
}

/// Whether the block has at least one `key: value` line
fn has_yaml_structure(yaml: &str) -> bool {
    yaml.lines().any(|line| {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return false;
        }
        if let Some(colon_pos) = trimmed.find(':') {
            let key = &trimmed[..colon_pos];
            let is_valid_key = !key.is_empty()
                && key
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
                && key != "http"
                && key != "https"
                && key != "ftp";
            if is_valid_key {
                let after_colon = &trimmed[colon_pos + 1..];
                return after_colon.is_empty() || after_colon.starts_with(' ');
            }
        }
        false
    })
}
