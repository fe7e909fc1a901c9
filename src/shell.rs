use std::io::Write as _;

use anyhow::Result;
use tokio::io::{stdin, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::command;
use crate::protocol::{self, Reply, ReplyMsg};

/// Command-surface cheat sheet printed by `help` / `-h`.
const HELP_TEXT: &str = r#"
# ---------------- DATABASES ----------------
wd->TestDB
sd->TestDB
dd->TestDB

# ---------------- TABLES ----------------
wt->Users->id:int,name:string,age:int
wt->Products->id:int,name:string,price:float,manual:file
st->Users
dt->Users

# ---------------- INSERT ----------------
i->1,'Alice',23
i->2,'Bernardo',25
i->101,'Laptop',1200.50,manuals/laptop.pdf

# ---------------- UPDATE ----------------
u->id:2->age:26
u->id:3->name:'Carla Silva',age:25

# ---------------- DELETE ----------------
d->id:1
d->age>30

# ---------------- SELECT ----------------
select->*
select->id,name
select->name,age->age:25
select->*->age>18 & name=Bob || age=20

# ---------------- EDIT ----------------
e->ac->email
e->ac->height:float
e->id:2->set:age=27
e->id:3->set:name='Carla M.'

# ---------------- OTHER ----------------
show
exit
"#;

/// Runs the interactive client shell against a server.
///
/// Each input line is parsed locally into a typed command, encoded as one
/// request line, and the reply is printed as `[ok]` or `[error]` plus the
/// message (row lists pretty-printed). `help`/`-h` and `exit`/`quit` are
/// handled locally and never reach the server; a line that fails to parse
/// is reported without sending anything.
pub async fn run(addr: &str) -> Result<()> {
    let stream = TcpStream::connect(addr).await?;
    let (r, mut w) = stream.into_split();
    let mut replies = BufReader::new(r).lines();
    let mut input = BufReader::new(stdin()).lines();

    println!("Connected to quiverdb at {addr} (format: cmd->args, -h for help)");
    loop {
        print!("quiverdb> ");
        std::io::stdout().flush()?;
        let Some(line) = input.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "-h" || line == "help" {
            println!("{HELP_TEXT}");
            continue;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            println!("Closing client...");
            break;
        }

        // Parse locally; a bad line never reaches the server
        let command = match command::parse(line) {
            Ok(command) => command,
            Err(e) => {
                println!("[error] {e}");
                continue;
            }
        };

        let request = serde_json::to_string(&protocol::encode(&command))?;
        w.write_all(request.as_bytes()).await?;
        w.write_all(b"\n").await?;

        let Some(text) = replies.next_line().await? else {
            println!("Server closed the connection.");
            break;
        };
        let reply: Reply = serde_json::from_str(&text)?;
        match reply.msg {
            ReplyMsg::Text(msg) => println!("[{}] {msg}", reply.status),
            ReplyMsg::Rows(rows) => {
                println!("[{}] {}", reply.status, serde_json::to_string_pretty(&rows)?)
            }
        }
    }
    Ok(())
}
