use crate::engine::{Assignment, ColumnDef, CompareOp, Comparison, Condition, Value};
use crate::error::{DbError, Result};

pub mod dispatch;

pub use dispatch::dispatch;

/// Segment delimiter of the command grammar.
const ARROW: &str = "->";

/// A fully parsed command with a fixed, statically checked argument shape.
///
/// One variant per operation replaces "call the method named X" dispatch:
/// a command that parses is a command the engine knows how to execute, and
/// unknown names are rejected here with a descriptive error.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// `wd->DB`
    CreateDatabase { name: String },
    /// `sd->DB`
    SelectDatabase { name: String },
    /// `dd->DB`
    DropDatabase { name: String },
    /// `wt->TABLE->col1:type1,col2:type2`
    CreateTable { name: String, columns: Vec<ColumnDef> },
    /// `st->TABLE`
    SelectTable { name: String },
    /// `dt->TABLE`
    DropTable { name: String },
    /// `i->v1,v2,...`
    Insert { values: Vec<Value> },
    /// `u->col:val,...->col:val,...`
    Update { condition: Condition, assignments: Vec<Assignment> },
    /// `d->col:val,...` or `d->col OP val`
    Delete { condition: Condition },
    /// `e->ac->name[:type]`
    AddColumn { column: ColumnDef },
    /// `e->id:ID->set:col=val[,col=val...]`
    EditRow { id: String, assignments: Vec<Assignment> },
    /// `show`
    Show,
    /// `select->cols->[condition]`
    Select { columns: Vec<String>, condition: Condition },
}

/// Parses one arrow-delimited command line.
///
/// The line is split on `->` into a command token followed by positional
/// segments. Each command has a fixed signature over argument kinds:
///
/// | Command | Segments |
/// |---|---|
/// | `wd` `sd` `dd` | database name |
/// | `wt` | table name, column list (`name[:type]`, type defaults to `string`) |
/// | `st` `dt` | table name |
/// | `i` | comma-split value list, types inferred per [Value::infer] |
/// | `u` | condition map, assignment map |
/// | `d` | condition map, or a textual predicate when no `:` is present |
/// | `select` | column list or `*`, then an optional condition: a map when it contains `:`, a boolean expression otherwise |
/// | `e` | `ac` + column declaration, or `id:ID` + `set:` assignment list |
/// | `show` | none |
///
/// Missing trailing segments default to empty arguments (an omitted select
/// condition matches every row); segments that are meaningless to omit,
/// like the name of `wd` or the column of `e->ac`, are required. Unknown
/// command names fail with [DbError::UnknownCommand].
pub fn parse(input: &str) -> Result<Command> {
    let segments: Vec<&str> = input.split(ARROW).map(str::trim).collect();
    let name = segments[0];
    let seg = |i: usize| segments.get(i).copied().unwrap_or("");

    match name {
        "wd" => Ok(Command::CreateDatabase { name: required(name, seg(1))? }),
        "sd" => Ok(Command::SelectDatabase { name: required(name, seg(1))? }),
        "dd" => Ok(Command::DropDatabase { name: required(name, seg(1))? }),
        "wt" => Ok(Command::CreateTable {
            name: required(name, seg(1))?,
            columns: parse_column_list(seg(2))?,
        }),
        "st" => Ok(Command::SelectTable { name: required(name, seg(1))? }),
        "dt" => Ok(Command::DropTable { name: required(name, seg(1))? }),
        "i" => Ok(Command::Insert { values: parse_value_list(seg(1)) }),
        "u" => Ok(Command::Update {
            condition: Condition::and_group(parse_pairs(seg(1))?),
            assignments: parse_assignments(seg(2))?,
        }),
        "d" => Ok(Command::Delete { condition: parse_condition(seg(1))? }),
        "select" => {
            let columns = if seg(1).is_empty() {
                vec!["*".to_string()]
            } else {
                parse_name_list(seg(1))
            };
            Ok(Command::Select { columns, condition: parse_condition(seg(2))? })
        }
        "e" => parse_edit(&segments),
        "show" => Ok(Command::Show),
        other => Err(DbError::UnknownCommand(other.to_string())),
    }
}

/// The `e` command has two bespoke forms, selected by its first segment.
fn parse_edit(segments: &[&str]) -> Result<Command> {
    let seg = |i: usize| segments.get(i).copied().unwrap_or("");
    match seg(1) {
        // e->ac->name[:type]
        "ac" => {
            if seg(2).is_empty() {
                return Err(DbError::BadArguments {
                    command: "e".into(),
                    detail: "add-column needs a column name".into(),
                });
            }
            Ok(Command::AddColumn { column: ColumnDef::parse(seg(2))? })
        }
        // e->id:ID->set:col=val[,col=val...]
        selector if selector.starts_with("id:") => {
            let id = selector["id:".len()..].trim().to_string();
            let Some(list) = seg(2).strip_prefix("set:") else {
                return Err(DbError::BadArguments {
                    command: "e".into(),
                    detail: "row edit needs a 'set:' assignment list".into(),
                });
            };
            let mut assignments = Vec::new();
            // Commas inside quoted values do not split the list
            for pair in split_unquoted(list, ',') {
                let Some((column, value)) = pair.split_once('=') else {
                    return Err(DbError::Parse(format!(
                        "Expected 'column=value', got '{pair}'"
                    )));
                };
                assignments.push(Assignment::new(column.trim(), Value::infer(value)));
            }
            Ok(Command::EditRow { id, assignments })
        }
        other => Err(DbError::BadArguments {
            command: "e".into(),
            detail: format!("expected 'ac' or 'id:<value>', got '{other}'"),
        }),
    }
}

fn required(command: &str, segment: &str) -> Result<String> {
    if segment.is_empty() {
        Err(DbError::BadArguments {
            command: command.to_string(),
            detail: "expected a name".into(),
        })
    } else {
        Ok(segment.to_string())
    }
}

/// Comma-split list of plain names (select projections).
fn parse_name_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Comma-split list of `name[:type]` column declarations.
fn parse_column_list(s: &str) -> Result<Vec<ColumnDef>> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    s.split(',').map(ColumnDef::parse).collect()
}

/// Comma-split value list with per-token type inference.
fn parse_value_list(s: &str) -> Vec<Value> {
    if s.trim().is_empty() {
        return Vec::new();
    }
    s.split(',').map(Value::infer).collect()
}

/// Comma-split `key:value` (or `key=value`) pairs; each value may carry a
/// leading comparison operator, defaulting to `=`.
fn parse_pairs(s: &str) -> Result<Vec<Comparison>> {
    let mut pairs = Vec::new();
    for pair in s.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let split = pair
            .split_once(':')
            .or_else(|| pair.split_once('='));
        let Some((key, value)) = split else {
            return Err(DbError::Parse(format!(
                "Expected 'key:value', got '{pair}'"
            )));
        };
        let (op, literal) = CompareOp::split_leading(value);
        pairs.push(Comparison::new(key.trim(), op, Value::comparison_literal(literal)));
    }
    Ok(pairs)
}

/// Comma-split `column:value` assignment list. Unlike condition pairs, the
/// value follows [Value::infer]: a quoted numeric stays text, the same as
/// on the insert and `set:` surfaces. A stray comparison operator on the
/// value is taken as the `=` it stands for.
fn parse_assignments(s: &str) -> Result<Vec<Assignment>> {
    let mut assignments = Vec::new();
    for pair in split_unquoted(s, ',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let split = pair
            .split_once(':')
            .or_else(|| pair.split_once('='));
        let Some((column, value)) = split else {
            return Err(DbError::Parse(format!(
                "Expected 'column:value', got '{pair}'"
            )));
        };
        let (_, literal) = CompareOp::split_leading(value);
        assignments.push(Assignment::new(column.trim(), Value::infer(literal)));
    }
    Ok(assignments)
}

/// A condition segment is a legacy map when it contains `:`, a free-form
/// boolean expression otherwise; omission means "match every row".
fn parse_condition(s: &str) -> Result<Condition> {
    let s = s.trim();
    if s.is_empty() {
        Ok(Condition::all())
    } else if s.contains(':') {
        Ok(Condition::and_group(parse_pairs(s)?))
    } else {
        Condition::parse(s)
    }
}

/// Splits on `sep` only outside matching single or double quote pairs.
fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            None if ch == '\'' || ch == '"' => quote = Some(ch),
            None if ch == sep => {
                parts.push(&s[start..i]);
                start = i + sep.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}
