//! # quiverdb - A Tiny Record Store over TCP
//!
//! This is a minimal record-oriented data store featuring:
//! - **Arrow-command DSL**: `wd->TestDB`, `i->1,'Alice',23`, `select->*->age>20`
//! - **Typed columns**: integer, float, string, and file-reference values
//! - **Boolean filters**: `=,!=,<,>,<=,>=` combined with `&` and `||`
//! - **JSON persistence**: one human-readable document per database
//! - **Concurrent clients**: per-connection sessions over one shared engine
//! - **File store**: file-typed values are copied into the database and
//!   referenced by relative path
//!
//! ## Architecture Overview
//!
//! The store consists of three main layers:
//!
//! 1. **Transport Layer** (`server` and `shell` modules): line-framed JSON
//!    requests and replies over TCP, plus the interactive client
//! 2. **Command Layer** (`command` and `protocol` modules): the arrow
//!    grammar, the typed command registry, and dispatch
//! 3. **Engine Layer** (`engine` module): value coercion, condition
//!    evaluation, storage, and persistence
//!
//! ## Key Components
//!
//! - **Engine**: the storage engine behind one coarse lock, mirroring every
//!   database document on disk
//! - **Session**: one (current database, current table) cursor per
//!   connection
//! - **Condition**: AND/OR filter expressions normalized to one shape, with
//!   `&` binding tighter than `||`
//! - **FileStore**: per-database directory of copied file-reference payloads
//!
//! ## Usage Example
//!
//! ```bash
//! # Start the server
//! cargo run -- --data ./data --listen 127.0.0.1:65432
//!
//! # Connect with the interactive shell
//! cargo run -- --connect 127.0.0.1:65432
//!
//! # Or speak the wire protocol directly
//! echo '{"command":"wd","args":["TestDB"]}' | nc 127.0.0.1 65432
//! ```

/// Arrow-grammar parsing and command dispatch
pub mod command;

/// Storage engine: values, conditions, tables, persistence
pub mod engine;

/// Error taxonomy shared across the crate
pub mod error;

/// Wire protocol types and the command-name registry
pub mod protocol;

/// TCP server and client connection handling
pub mod server;

/// Interactive client shell
pub mod shell;
