use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::persist::FileStore;
use crate::error::{DbError, Result};

/// Declared type of a table column.
///
/// Every column carries exactly one of these; values are coerced to the
/// declared type on insert and on row edit. The serialized names (`int`,
/// `float`, `string`, `file`) are the same names the command surface uses
/// in `wt->Users->id:int,name:string`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    /// 64-bit signed integer
    #[serde(rename = "int")]
    Int,
    /// 64-bit floating point
    #[serde(rename = "float")]
    Float,
    /// UTF-8 text
    #[serde(rename = "string")]
    Text,
    /// Path to a file copied into the database's file store
    #[serde(rename = "file")]
    File,
}

impl ColumnType {
    /// Parses a type name as written in a column list.
    ///
    /// Accepts the canonical names plus the common aliases `integer`, `str`
    /// and `text`. Anything else is a parse error.
    pub fn parse(name: &str) -> Result<ColumnType> {
        match name.trim() {
            "int" | "integer" => Ok(ColumnType::Int),
            "float" => Ok(ColumnType::Float),
            "string" | "str" | "text" => Ok(ColumnType::Text),
            "file" => Ok(ColumnType::File),
            other => Err(DbError::Parse(format!("Unknown column type '{other}'"))),
        }
    }

    /// Canonical lowercase name, as used on the command surface.
    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Text => "string",
            ColumnType::File => "file",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One column of a table schema: a name plus a declared type.
///
/// A table's schema is an ordered `Vec<ColumnDef>`, so "names and types have
/// the same length and order" holds structurally instead of by convention.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> ColumnDef {
        ColumnDef { name: name.into(), ty }
    }

    /// Parses a `name[:type]` column declaration; a bare name defaults to
    /// type `string`.
    pub fn parse(decl: &str) -> Result<ColumnDef> {
        let decl = decl.trim();
        match decl.split_once(':') {
            Some((name, ty)) if !name.trim().is_empty() => {
                Ok(ColumnDef::new(name.trim(), ColumnType::parse(ty)?))
            }
            None if !decl.is_empty() => Ok(ColumnDef::new(decl, ColumnType::Text)),
            _ => Err(DbError::Parse(format!("Invalid column declaration '{decl}'"))),
        }
    }
}

/// A single stored value.
///
/// Serialization is untagged, so a row serializes to the natural JSON form
/// (`{"id": 1, "name": "Alice", "height": 1.7, "email": null}`) and the
/// on-disk document stays human-readable. File-reference values are stored
/// as their relative path inside the file store, i.e. as [Value::Text].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Empty / missing value (new columns are backfilled with this)
    Null,
    /// 64-bit signed integer value
    Int(i64),
    /// 64-bit floating point value
    Float(f64),
    /// UTF-8 text value
    Text(String),
}

impl Value {
    /// Infers a typed value from a raw command token.
    ///
    /// Used for insert value lists, where the column types are not known at
    /// parse time:
    /// - a token wrapped in matching single or double quotes is text (one
    ///   quote layer stripped)
    /// - otherwise integer, then float, then trimmed text
    ///
    /// This replaces the "evaluate the token as code" trick some ad hoc
    /// stores use; input is never executed.
    pub fn infer(raw: &str) -> Value {
        let token = raw.trim();
        if let Some(inner) = strip_quotes(token) {
            return Value::Text(inner.to_string());
        }
        if let Ok(i) = token.parse::<i64>() {
            return Value::Int(i);
        }
        if let Ok(f) = token.parse::<f64>() {
            return Value::Float(f);
        }
        Value::Text(token.to_string())
    }

    /// Interprets the right-hand side of a comparison.
    ///
    /// Unlike [Value::infer], a quoted numeric literal is still numeric
    /// (`age='25'` compares against the number 25) and a decimal comma is
    /// accepted as a decimal separator (`price>30,5`).
    pub fn comparison_literal(raw: &str) -> Value {
        let token = raw.trim();
        let token = strip_quotes(token).unwrap_or(token);
        if let Ok(i) = token.parse::<i64>() {
            return Value::Int(i);
        }
        if let Ok(f) = token.replace(',', ".").parse::<f64>() {
            return Value::Float(f);
        }
        Value::Text(token.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Coerces a value to a column's declared type.
///
/// Called on insert and on row edit, never on update (updates merge raw
/// values as-is). The rules per declared type:
///
/// - **int**: integer values pass through; text must parse as a signed
///   integer; anything else fails
/// - **float**: integer and float values pass through (integers widen);
///   text parses with `.` or `,` as the decimal separator
/// - **string**: text passes through; numbers render to their text form
/// - **file**: the value is treated as a filesystem path; if it names an
///   existing regular file it is copied into `files` and the stored value
///   becomes the relative path inside the store. A path that does not
///   resolve, or a failed copy, keeps the literal text with a logged
///   warning; file values may legitimately be plain strings
///
/// Only int and float coercion can fail; file coercion degrades instead so
/// a bad path never rejects the whole row.
pub fn coerce(raw: &Value, ty: ColumnType, files: &FileStore) -> Result<Value> {
    match ty {
        ColumnType::Int => match raw {
            Value::Int(_) => Ok(raw.clone()),
            Value::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| DbError::Coerce { value: s.clone(), ty: "int" }),
            other => Err(DbError::Coerce { value: other.to_string(), ty: "int" }),
        },
        ColumnType::Float => match raw {
            Value::Int(i) => Ok(Value::Float(*i as f64)),
            Value::Float(_) => Ok(raw.clone()),
            Value::Text(s) => s
                .trim()
                .replace(',', ".")
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| DbError::Coerce { value: s.clone(), ty: "float" }),
            Value::Null => Err(DbError::Coerce { value: String::new(), ty: "float" }),
        },
        ColumnType::Text => match raw {
            Value::Text(_) => Ok(raw.clone()),
            Value::Null => Err(DbError::Coerce { value: String::new(), ty: "string" }),
            other => Ok(Value::Text(other.to_string())),
        },
        ColumnType::File => {
            let text = match raw {
                Value::Text(s) => s.clone(),
                other => other.to_string(),
            };
            match files.ingest(&text) {
                Ok(Some(stored)) => Ok(Value::Text(stored)),
                Ok(None) => {
                    warn!(value = %text, "not a path to an existing file, keeping literal text");
                    Ok(Value::Text(text))
                }
                Err(e) => {
                    warn!(value = %text, error = %e, "file copy failed, keeping literal text");
                    Ok(Value::Text(text))
                }
            }
        }
    }
}

/// Returns the inside of one layer of matching single or double quotes,
/// or `None` if the string is not quoted.
fn strip_quotes(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 && (bytes[0] == b'\'' || bytes[0] == b'"') && bytes[bytes.len() - 1] == bytes[0] {
        Some(&s[1..s.len() - 1])
    } else {
        None
    }
}
