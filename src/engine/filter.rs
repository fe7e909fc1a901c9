use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::engine::value::Value;
use crate::engine::Row;
use crate::error::{DbError, Result};

/// Comparison operator of a single filter leaf.
///
/// `=` and `==` are synonyms on the command surface; both parse to
/// [CompareOp::Eq]. Serialized as the operator symbol so conditions stay
/// readable on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
}

/// Operator symbols ordered so two-character operators match before their
/// one-character prefixes.
const OPERATORS: [(&str, CompareOp); 7] = [
    ("<=", CompareOp::Le),
    (">=", CompareOp::Ge),
    ("!=", CompareOp::Ne),
    ("==", CompareOp::Eq),
    ("=", CompareOp::Eq),
    ("<", CompareOp::Lt),
    (">", CompareOp::Gt),
];

impl CompareOp {
    /// Splits an optional leading operator off a map-condition value:
    /// `">=18"` becomes `(Ge, "18")`, a bare `"18"` defaults to `(Eq, "18")`.
    pub fn split_leading(s: &str) -> (CompareOp, &str) {
        let s = s.trim_start();
        for (symbol, op) in OPERATORS {
            if let Some(rest) = s.strip_prefix(symbol) {
                return (op, rest);
            }
        }
        (CompareOp::Eq, s)
    }
}

/// One `column OP value` leaf of a condition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub column: String,
    pub op: CompareOp,
    pub value: Value,
}

impl Comparison {
    pub fn new(column: impl Into<String>, op: CompareOp, value: Value) -> Comparison {
        Comparison { column: column.into(), op, value }
    }

    /// Evaluates this leaf against one row. A column absent from the row, a
    /// null row value, and type-incomparable operands all evaluate to
    /// `false` rather than raising.
    pub fn matches(&self, row: &Row) -> bool {
        let Some(actual) = row.get(&self.column) else {
            return false;
        };
        let Some(ord) = compare(actual, &self.value) else {
            return false;
        };
        match self.op {
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::Ne => ord != Ordering::Equal,
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Le => ord != Ordering::Greater,
            CompareOp::Ge => ord != Ordering::Less,
        }
    }
}

/// A row predicate in disjunctive normal form: OR across groups, AND within
/// a group.
///
/// Both condition surfaces normalize into this one shape at the parser
/// boundary, so the evaluator never branches on where a condition came
/// from:
///
/// - a map condition (`u->id:2,age:>18->...`) becomes a single AND group
/// - a textual expression (`age>18 & name=Bob || age=20`) splits on `||`
///   first (lowest precedence), then each side on `&`
///
/// An empty condition matches every row.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub groups: Vec<Vec<Comparison>>,
}

impl Condition {
    /// The empty condition, which matches every row.
    pub fn all() -> Condition {
        Condition::default()
    }

    /// Builds a map-form condition: one AND group over all pairs.
    pub fn and_group(comparisons: Vec<Comparison>) -> Condition {
        if comparisons.is_empty() {
            Condition::all()
        } else {
            Condition { groups: vec![comparisons] }
        }
    }

    /// Parses a textual boolean expression.
    ///
    /// Grammar: `expr := conj ('||' conj)*`, `conj := leaf ('&' leaf)*`,
    /// `leaf := column OP literal` with
    /// `OP ∈ {=, ==, !=, <, >, <=, >=}`. `&` binds tighter than `||`.
    /// Literals follow [Value::comparison_literal]: one quote layer is
    /// stripped and numeric interpretation is attempted first.
    ///
    /// ## Example
    /// ```text
    /// age>18 & name=Bob || age=20
    /// ```
    /// matches rows where (age>18 AND name=Bob) OR age=20.
    pub fn parse(expr: &str) -> Result<Condition> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Ok(Condition::all());
        }
        let mut groups = Vec::new();
        for disjunct in expr.split("||") {
            let mut group = Vec::new();
            for leaf in disjunct.split('&') {
                group.push(parse_leaf(leaf)?);
            }
            groups.push(group);
        }
        Ok(Condition { groups })
    }

    /// True when any AND group holds for the row; the empty condition holds
    /// for every row. Never raises.
    pub fn matches(&self, row: &Row) -> bool {
        if self.groups.is_empty() {
            return true;
        }
        self.groups
            .iter()
            .any(|group| group.iter().all(|c| c.matches(row)))
    }
}

/// Parses one `column OP value` leaf.
fn parse_leaf(leaf: &str) -> Result<Comparison> {
    let leaf = leaf.trim();
    for (symbol, op) in OPERATORS {
        if let Some(pos) = leaf.find(symbol) {
            let column = leaf[..pos].trim();
            let literal = &leaf[pos + symbol.len()..];
            if column.is_empty() {
                break;
            }
            return Ok(Comparison::new(column, op, Value::comparison_literal(literal)));
        }
    }
    Err(DbError::Parse(format!(
        "Expected 'column OP value', got '{leaf}'"
    )))
}

/// Compares two values, promoting integers to floats for mixed numeric
/// comparisons. Returns `None` for incomparable operands (text against a
/// number, anything against null).
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Int(x), Value::Float(y)) => (*x as f64).partial_cmp(y),
        (Value::Float(x), Value::Int(y)) => x.partial_cmp(&(*y as f64)),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::Text(x), Value::Text(y)) => Some(x.as_str().cmp(y.as_str())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn leading_operator_split() {
        assert_eq!(CompareOp::split_leading(">=18"), (CompareOp::Ge, "18"));
        assert_eq!(CompareOp::split_leading("!=x"), (CompareOp::Ne, "x"));
        assert_eq!(CompareOp::split_leading("18"), (CompareOp::Eq, "18"));
    }

    #[test]
    fn or_binds_looser_than_and() {
        let r = row(&[("age", Value::Int(20)), ("name", Value::Text("Alice".into()))]);
        // Left AND branch is false, right OR branch is true
        let cond = Condition::parse("age>18 & name=Bob || age=20").unwrap();
        assert!(cond.matches(&r));
        // Both branches false
        let cond = Condition::parse("age>18 & name=Bob || age=21").unwrap();
        assert!(!cond.matches(&r));
    }

    #[test]
    fn comparison_operators() {
        let r = row(&[("age", Value::Int(25)), ("name", Value::Text("Bob".into()))]);
        for (expr, expected) in [
            ("age=25", true),
            ("age==25", true),
            ("age!=25", false),
            ("age<26", true),
            ("age<=25", true),
            ("age>25", false),
            ("age>=25", true),
            ("name='Bob'", true),
            ("name<Carol", true),
        ] {
            let cond = Condition::parse(expr).unwrap();
            assert_eq!(cond.matches(&r), expected, "{expr}");
        }
    }

    #[test]
    fn mixed_numeric_comparison() {
        let r = row(&[("price", Value::Float(25.0))]);
        assert!(Condition::parse("price=25").unwrap().matches(&r));
        assert!(Condition::parse("price>24,5").unwrap().matches(&r));
    }

    #[test]
    fn incomparable_operands_never_match() {
        let r = row(&[("name", Value::Text("Alice".into())), ("note", Value::Null)]);
        assert!(!Condition::parse("name>1").unwrap().matches(&r));
        assert!(!Condition::parse("name!=1").unwrap().matches(&r));
        assert!(!Condition::parse("note=x").unwrap().matches(&r));
        // Absent column
        assert!(!Condition::parse("age=1").unwrap().matches(&r));
    }

    #[test]
    fn empty_condition_matches_everything() {
        assert!(Condition::parse("").unwrap().matches(&row(&[])));
        assert!(Condition::all().matches(&row(&[("x", Value::Int(1))])));
    }

    #[test]
    fn map_form_is_an_and_group() {
        let cond = Condition::and_group(vec![
            Comparison::new("id", CompareOp::Eq, Value::Int(2)),
            Comparison::new("age", CompareOp::Gt, Value::Int(18)),
        ]);
        assert!(cond.matches(&row(&[("id", Value::Int(2)), ("age", Value::Int(30))])));
        assert!(!cond.matches(&row(&[("id", Value::Int(2)), ("age", Value::Int(10))])));
    }

    #[test]
    fn malformed_leaf_is_a_parse_error() {
        assert!(Condition::parse("age 18").is_err());
        assert!(Condition::parse("=18").is_err());
    }
}
