use crate::command::Command;
use crate::engine::{Engine, Session};
use crate::error::Result;
use crate::protocol::{Reply, ReplyMsg};

/// Executes one parsed command against the engine on behalf of a session.
///
/// This is the single boundary where engine errors become structured error
/// replies: every [crate::error::DbError] turns into
/// `{"status": "error", "msg": <description>}` and nothing propagates as a
/// crash. `select` replies with the filtered, projected row list; every
/// other command replies with its confirmation string.
pub fn dispatch(engine: &Engine, session: &mut Session, command: Command) -> Reply {
    let outcome: Result<ReplyMsg> = match command {
        Command::CreateDatabase { name } => engine.create_database(&name).map(ReplyMsg::Text),
        Command::SelectDatabase { name } => {
            engine.select_database(session, &name).map(ReplyMsg::Text)
        }
        Command::DropDatabase { name } => engine.drop_database(session, &name).map(ReplyMsg::Text),
        Command::CreateTable { name, columns } => {
            engine.create_table(session, &name, columns).map(ReplyMsg::Text)
        }
        Command::SelectTable { name } => engine.select_table(session, &name).map(ReplyMsg::Text),
        Command::DropTable { name } => engine.drop_table(session, &name).map(ReplyMsg::Text),
        Command::Insert { values } => engine.insert(session, values).map(ReplyMsg::Text),
        Command::Update { condition, assignments } => engine
            .update(session, &condition, &assignments)
            .map(ReplyMsg::Text),
        Command::Delete { condition } => engine.delete(session, &condition).map(ReplyMsg::Text),
        Command::AddColumn { column } => engine.add_column(session, column).map(ReplyMsg::Text),
        Command::EditRow { id, assignments } => {
            engine.edit_row(session, &id, &assignments).map(ReplyMsg::Text)
        }
        Command::Show => engine.show(session).map(ReplyMsg::Text),
        Command::Select { columns, condition } => engine
            .select(session, &columns, &condition)
            .map(ReplyMsg::Rows),
    };

    match outcome {
        Ok(msg) => Reply::ok(msg),
        Err(e) => Reply::error(e.to_string()),
    }
}
