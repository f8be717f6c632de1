//! Front matter for agent description files
//!
//! Agent files may start with a block delimited by `---` lines. The block is
//! read with a deliberately small grammar, not a YAML implementation:
//!
//! ```text
//! block   := line*
//! line    := comment | pair | item | blank
//! comment := '#' any*
//! pair    := key ':' value?        (an empty value opens a list)
//! item    := '- ' value            (appended to the open list)
//! value   := '"' any* '"' | "'" any* "'" | bool | null | int | float | bare
//! bool    := true | yes | on | false | no | off     (case-insensitive)
//! null    := null | none | ~                         (case-insensitive)
//! ```
//!
//! Items outside an open list are ignored. Nested maps are not supported.

use std::collections::BTreeMap;
use std::fmt;

/// A front matter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Null,
    List(Vec<String>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Null => Ok(()),
            Value::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

/// Parsed front matter keys, in sorted order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    entries: BTreeMap<String, Value>,
}

impl FrontMatter {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// The value rendered as text; `None` for missing or null values.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.entries.get(key)? {
            Value::Null => None,
            value => Some(value.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Splits `content` into front matter and body.
///
/// Content without a complete `---` block yields empty front matter and the
/// unchanged content as body.
pub fn parse(content: &str) -> (FrontMatter, &str) {
    if !content.starts_with("---") {
        return (FrontMatter::default(), content);
    }

    let mut parts = content.splitn(3, "---");
    let _ = parts.next();
    match (parts.next(), parts.next()) {
        (Some(block), Some(body)) => (parse_block(block), body.trim()),
        _ => (FrontMatter::default(), content),
    }
}

/// Parses the inside of a front matter block.
pub fn parse_block(block: &str) -> FrontMatter {
    let mut entries = BTreeMap::new();
    let mut open_list: Option<String> = None;

    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(item) = line.strip_prefix("- ") {
            if let Some(Value::List(items)) = open_list.as_ref().and_then(|k| entries.get_mut(k)) {
                items.push(unquote(item.trim()).to_string());
            }
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_string();
        let value = value.trim();

        if value.is_empty() {
            entries.insert(key.clone(), Value::List(Vec::new()));
            open_list = Some(key);
        } else {
            entries.insert(key, parse_scalar(value));
            open_list = None;
        }
    }

    FrontMatter { entries }
}

fn unquote(value: &str) -> &str {
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if quoted {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Parses a single scalar value.
pub fn parse_scalar(value: &str) -> Value {
    let value = value.trim();
    if value.is_empty() {
        return Value::Null;
    }

    let unquoted = unquote(value);
    if unquoted.len() != value.len() {
        return Value::String(unquoted.to_string());
    }

    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => return Value::Bool(true),
        "false" | "no" | "off" => return Value::Bool(false),
        "null" | "none" | "~" => return Value::Null,
        _ => {}
    }

    if value.contains('.') {
        if let Ok(x) = value.parse::<f64>() {
            return Value::Float(x);
        }
    } else if let Ok(i) = value.parse::<i64>() {
        return Value::Int(i);
    }

    Value::String(value.to_string())
}
