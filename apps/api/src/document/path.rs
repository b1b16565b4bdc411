//! Dot/bracket path addressing over the document value tree.
//!
//! Paths address both mapping fields and sequence indices uniformly:
//! `basics.name`, `sections.skills.items[2].level`, `metadata.layout[0][1]`.
//! Setting through an unmaterialized path is a silent no-op rather than an
//! error; only the final segment may create a new map key or append to a
//! sequence.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::document::DocumentError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// A parsed mutation path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotPath(Vec<Segment>);

impl DotPath {
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// The leading map key, if any (`"metadata"` for `metadata.layout`).
    pub fn head(&self) -> Option<&str> {
        match self.0.first() {
            Some(Segment::Key(k)) => Some(k),
            _ => None,
        }
    }

    pub fn key_at(&self, index: usize) -> Option<&str> {
        match self.0.get(index) {
            Some(Segment::Key(k)) => Some(k),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DotPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(k) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(k)?;
                }
                Segment::Index(n) => write!(f, "[{n}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for DotPath {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(DocumentError::InvalidPath(s.to_string()));
        }

        let invalid = || DocumentError::InvalidPath(s.to_string());
        let mut segments = Vec::new();
        let mut chars = s.chars().peekable();
        let mut expect_key = true;

        while let Some(&c) = chars.peek() {
            match c {
                '.' => {
                    // A dot is only legal after a completed segment, so a
                    // leading dot or a doubled dot is malformed.
                    if expect_key {
                        return Err(invalid());
                    }
                    chars.next();
                    expect_key = true;
                }
                '[' => {
                    chars.next();
                    let mut digits = String::new();
                    let mut closed = false;
                    for d in chars.by_ref() {
                        if d == ']' {
                            closed = true;
                            break;
                        }
                        digits.push(d);
                    }
                    if !closed {
                        return Err(invalid());
                    }
                    let index = digits.parse::<usize>().map_err(|_| invalid())?;
                    segments.push(Segment::Index(index));
                    expect_key = false;
                }
                _ => {
                    if !expect_key {
                        return Err(invalid());
                    }
                    let mut key = String::new();
                    while let Some(&k) = chars.peek() {
                        if k == '.' || k == '[' {
                            break;
                        }
                        key.push(k);
                        chars.next();
                    }
                    if key.is_empty() {
                        return Err(invalid());
                    }
                    segments.push(Segment::Key(key));
                    expect_key = false;
                }
            }
        }

        if segments.is_empty() || expect_key {
            return Err(invalid());
        }
        Ok(DotPath(segments))
    }
}

/// Result of applying a path set to a value tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Applied,
    /// An intermediate node was missing or of the wrong shape; nothing changed.
    NotMaterialized,
}

/// Sets `value` at `path` within `root`.
///
/// Intermediate segments must already exist. The final segment may insert a
/// new key into a map, replace a sequence element, or append when the index
/// equals the sequence length; anything past the end is a no-op.
pub fn set_at(root: &mut Value, path: &DotPath, value: Value) -> SetOutcome {
    let (last, parents) = match path.segments().split_last() {
        Some(split) => split,
        None => return SetOutcome::NotMaterialized,
    };

    let mut node = root;
    for segment in parents {
        node = match (segment, node) {
            (Segment::Key(k), Value::Object(map)) => match map.get_mut(k.as_str()) {
                Some(child) => child,
                None => return SetOutcome::NotMaterialized,
            },
            (Segment::Index(i), Value::Array(seq)) => match seq.get_mut(*i) {
                Some(child) => child,
                None => return SetOutcome::NotMaterialized,
            },
            _ => return SetOutcome::NotMaterialized,
        };
    }

    match (last, node) {
        (Segment::Key(k), Value::Object(map)) => {
            map.insert(k.clone(), value);
            SetOutcome::Applied
        }
        (Segment::Index(i), Value::Array(seq)) => {
            if *i < seq.len() {
                seq[*i] = value;
                SetOutcome::Applied
            } else if *i == seq.len() {
                seq.push(value);
                SetOutcome::Applied
            } else {
                SetOutcome::NotMaterialized
            }
        }
        _ => SetOutcome::NotMaterialized,
    }
}

/// Reads the value at `path`, if materialized.
pub fn get_at<'a>(root: &'a Value, path: &DotPath) -> Option<&'a Value> {
    let mut node = root;
    for segment in path.segments() {
        node = match (segment, node) {
            (Segment::Key(k), Value::Object(map)) => map.get(k.as_str())?,
            (Segment::Index(i), Value::Array(seq)) => seq.get(*i)?,
            _ => return None,
        };
    }
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(s: &str) -> DotPath {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_dot_and_bracket_segments() {
        let p = path("sections.skills.items[2].level");
        assert_eq!(
            p.segments(),
            &[
                Segment::Key("sections".into()),
                Segment::Key("skills".into()),
                Segment::Key("items".into()),
                Segment::Index(2),
                Segment::Key("level".into()),
            ]
        );
        assert_eq!(p.to_string(), "sections.skills.items[2].level");
    }

    #[test]
    fn test_parse_consecutive_brackets() {
        let p = path("metadata.layout[0][1]");
        assert_eq!(
            p.segments(),
            &[
                Segment::Key("metadata".into()),
                Segment::Key("layout".into()),
                Segment::Index(0),
                Segment::Index(1),
            ]
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("".parse::<DotPath>().is_err());
        assert!("a.".parse::<DotPath>().is_err());
        assert!("a[x]".parse::<DotPath>().is_err());
        assert!("a[1".parse::<DotPath>().is_err());
        assert!(".a".parse::<DotPath>().is_err());
        assert!("a..b".parse::<DotPath>().is_err());
        assert!(".".parse::<DotPath>().is_err());
    }

    #[test]
    fn test_set_replaces_leaf() {
        let mut tree = json!({"basics": {"name": "old"}});
        let outcome = set_at(&mut tree, &path("basics.name"), json!("new"));
        assert_eq!(outcome, SetOutcome::Applied);
        assert_eq!(tree["basics"]["name"], "new");
    }

    #[test]
    fn test_set_final_key_may_create() {
        let mut tree = json!({"sections": {"custom": {}}});
        let outcome = set_at(&mut tree, &path("sections.custom.abc"), json!({"id": "abc"}));
        assert_eq!(outcome, SetOutcome::Applied);
        assert_eq!(tree["sections"]["custom"]["abc"]["id"], "abc");
    }

    #[test]
    fn test_set_through_missing_intermediate_is_noop() {
        let mut tree = json!({"basics": {}});
        let before = tree.clone();
        let outcome = set_at(&mut tree, &path("basics.url.href"), json!("x"));
        assert_eq!(outcome, SetOutcome::NotMaterialized);
        assert_eq!(tree, before);
    }

    #[test]
    fn test_set_index_replace_and_append() {
        let mut tree = json!({"items": [1, 2]});
        assert_eq!(
            set_at(&mut tree, &path("items[1]"), json!(9)),
            SetOutcome::Applied
        );
        assert_eq!(tree["items"], json!([1, 9]));

        // index == len appends
        assert_eq!(
            set_at(&mut tree, &path("items[2]"), json!(3)),
            SetOutcome::Applied
        );
        assert_eq!(tree["items"], json!([1, 9, 3]));

        // past the end is a no-op
        assert_eq!(
            set_at(&mut tree, &path("items[5]"), json!(0)),
            SetOutcome::NotMaterialized
        );
        assert_eq!(tree["items"], json!([1, 9, 3]));
    }

    #[test]
    fn test_set_type_mismatch_is_noop() {
        let mut tree = json!({"basics": {"name": "x"}});
        let before = tree.clone();
        assert_eq!(
            set_at(&mut tree, &path("basics[0]"), json!("y")),
            SetOutcome::NotMaterialized
        );
        assert_eq!(tree, before);
    }

    #[test]
    fn test_get_at() {
        let tree = json!({"a": {"b": [{"c": 42}]}});
        assert_eq!(get_at(&tree, &path("a.b[0].c")), Some(&json!(42)));
        assert_eq!(get_at(&tree, &path("a.b[1]")), None);
        assert_eq!(get_at(&tree, &path("a.z")), None);
    }
}
