//! Wire protocol: one JSON request per line, one JSON reply per line.
//!
//! A request is `{"command": <name>, "args": [<values>]}`; a reply is
//! `{"status": "ok"|"error", "msg": <string or row list>}`. `select`
//! replies with a list of row objects, every other success with a
//! confirmation string, every failure with an error description.
//!
//! The command-name registry below is the single mapping between wire
//! names and [Command] variants; [encode] and [decode] are exact inverses
//! over it, and an unknown name fails [decode] with a descriptive error
//! instead of surfacing later as a runtime surprise.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::command::Command;
use crate::engine::{Assignment, ColumnDef, Condition, Row, Value};
use crate::error::{DbError, Result};

pub const CREATE_DATABASE: &str = "wd";
pub const SELECT_DATABASE: &str = "sd";
pub const DROP_DATABASE: &str = "dd";
pub const CREATE_TABLE: &str = "wt";
pub const SELECT_TABLE: &str = "st";
pub const DROP_TABLE: &str = "dt";
pub const INSERT: &str = "i";
pub const UPDATE: &str = "u";
pub const DELETE: &str = "d";
pub const EDIT: &str = "e";
pub const SHOW: &str = "show";
pub const SELECT: &str = "select";

/// Subcommand tags of the `e` command's first argument.
const ADD_COLUMN: &str = "ac";
const ROW_EDIT: &str = "row_edit";

/// One client request: a command name plus positional arguments.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: String,
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
}

impl Request {
    fn new(command: &str, args: Vec<serde_json::Value>) -> Request {
        Request { command: command.to_string(), args }
    }
}

/// Outcome tag of a reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Status::Ok => "ok",
            Status::Error => "error",
        })
    }
}

/// Reply payload: a message string, or a row list for `select`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplyMsg {
    Text(String),
    Rows(Vec<Row>),
}

/// One server reply per request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Reply {
    pub status: Status,
    pub msg: ReplyMsg,
}

impl Reply {
    pub fn ok(msg: ReplyMsg) -> Reply {
        Reply { status: Status::Ok, msg }
    }

    pub fn error(msg: impl Into<String>) -> Reply {
        Reply { status: Status::Error, msg: ReplyMsg::Text(msg.into()) }
    }
}

/// Encodes a parsed command into its wire request.
pub fn encode(command: &Command) -> Request {
    match command {
        Command::CreateDatabase { name } => Request::new(CREATE_DATABASE, vec![json!(name)]),
        Command::SelectDatabase { name } => Request::new(SELECT_DATABASE, vec![json!(name)]),
        Command::DropDatabase { name } => Request::new(DROP_DATABASE, vec![json!(name)]),
        Command::CreateTable { name, columns } => {
            Request::new(CREATE_TABLE, vec![json!(name), json!(columns)])
        }
        Command::SelectTable { name } => Request::new(SELECT_TABLE, vec![json!(name)]),
        Command::DropTable { name } => Request::new(DROP_TABLE, vec![json!(name)]),
        Command::Insert { values } => {
            Request::new(INSERT, values.iter().map(|v| json!(v)).collect())
        }
        Command::Update { condition, assignments } => {
            Request::new(UPDATE, vec![json!(condition), json!(assignments)])
        }
        Command::Delete { condition } => Request::new(DELETE, vec![json!(condition)]),
        Command::AddColumn { column } => {
            Request::new(EDIT, vec![json!(ADD_COLUMN), json!(column)])
        }
        Command::EditRow { id, assignments } => {
            Request::new(EDIT, vec![json!(ROW_EDIT), json!(id), json!(assignments)])
        }
        Command::Show => Request::new(SHOW, Vec::new()),
        Command::Select { columns, condition } => {
            Request::new(SELECT, vec![json!(columns), json!(condition)])
        }
    }
}

/// Decodes a wire request back into a typed command.
///
/// Malformed or missing arguments fail with [DbError::BadArguments];
/// unknown command names with [DbError::UnknownCommand]. Neither
/// disconnects the client.
pub fn decode(request: Request) -> Result<Command> {
    let Request { command, mut args } = request;
    match command.as_str() {
        CREATE_DATABASE => Ok(Command::CreateDatabase { name: arg(&mut args, 0, &command)? }),
        SELECT_DATABASE => Ok(Command::SelectDatabase { name: arg(&mut args, 0, &command)? }),
        DROP_DATABASE => Ok(Command::DropDatabase { name: arg(&mut args, 0, &command)? }),
        CREATE_TABLE => Ok(Command::CreateTable {
            name: arg(&mut args, 0, &command)?,
            columns: arg::<Vec<ColumnDef>>(&mut args, 1, &command)?,
        }),
        SELECT_TABLE => Ok(Command::SelectTable { name: arg(&mut args, 0, &command)? }),
        DROP_TABLE => Ok(Command::DropTable { name: arg(&mut args, 0, &command)? }),
        INSERT => {
            let values = args
                .into_iter()
                .map(serde_json::from_value::<Value>)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| bad_args(&command, e))?;
            Ok(Command::Insert { values })
        }
        UPDATE => Ok(Command::Update {
            condition: arg::<Condition>(&mut args, 0, &command)?,
            assignments: arg::<Vec<Assignment>>(&mut args, 1, &command)?,
        }),
        DELETE => Ok(Command::Delete { condition: arg::<Condition>(&mut args, 0, &command)? }),
        EDIT => {
            let tag: String = arg(&mut args, 0, &command)?;
            match tag.as_str() {
                ADD_COLUMN => Ok(Command::AddColumn {
                    column: arg::<ColumnDef>(&mut args, 1, &command)?,
                }),
                ROW_EDIT => Ok(Command::EditRow {
                    id: arg(&mut args, 1, &command)?,
                    assignments: arg::<Vec<Assignment>>(&mut args, 2, &command)?,
                }),
                other => Err(DbError::BadArguments {
                    command,
                    detail: format!("unknown edit form '{other}'"),
                }),
            }
        }
        SHOW => Ok(Command::Show),
        SELECT => Ok(Command::Select {
            columns: arg::<Vec<String>>(&mut args, 0, &command)?,
            condition: arg::<Condition>(&mut args, 1, &command)?,
        }),
        other => Err(DbError::UnknownCommand(other.to_string())),
    }
}

/// Pulls and deserializes one positional argument.
fn arg<T: DeserializeOwned>(
    args: &mut [serde_json::Value],
    idx: usize,
    command: &str,
) -> Result<T> {
    let value = args
        .get_mut(idx)
        .map(serde_json::Value::take)
        .unwrap_or(serde_json::Value::Null);
    serde_json::from_value(value).map_err(|e| bad_args(command, e))
}

fn bad_args(command: &str, e: serde_json::Error) -> DbError {
    DbError::BadArguments { command: command.to_string(), detail: e.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::parse;

    #[test]
    fn commands_survive_the_wire() {
        for line in [
            "wd->TestDB",
            "wt->Users->id:int,name:string",
            "i->1,'Alice',23",
            "u->id:2->age:26",
            "d->age>30",
            "select->name,age->age>18 & name=Bob || age=20",
            "e->ac->email",
            "e->id:2->set:age=27",
            "show",
        ] {
            let command = parse(line).unwrap();
            let request = encode(&command);
            assert_eq!(decode(request).unwrap(), command, "{line}");
        }
    }

    #[test]
    fn request_wire_shape() {
        let request = encode(&parse("i->1,'Alice'").unwrap());
        let text = serde_json::to_string(&request).unwrap();
        assert_eq!(text, r#"{"command":"i","args":[1,"Alice"]}"#);
    }

    #[test]
    fn reply_wire_shape() {
        let reply = Reply::error("Database 'X' does not exist");
        let text = serde_json::to_string(&reply).unwrap();
        assert_eq!(text, r#"{"status":"error","msg":"Database 'X' does not exist"}"#);

        let reply = Reply::ok(ReplyMsg::Rows(vec![Row::from([(
            "id".to_string(),
            Value::Int(1),
        )])]));
        let text = serde_json::to_string(&reply).unwrap();
        assert_eq!(text, r#"{"status":"ok","msg":[{"id":1}]}"#);
    }

    #[test]
    fn unknown_command_and_bad_args_fail_cleanly() {
        let request = Request::new("frobnicate", Vec::new());
        assert!(matches!(decode(request), Err(DbError::UnknownCommand(_))));

        let request = Request::new(CREATE_DATABASE, Vec::new());
        assert!(matches!(decode(request), Err(DbError::BadArguments { .. })));
    }
}
