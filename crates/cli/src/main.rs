//! # CLI — `kvimage` command-line front end
//!
//! A thin shell over [`store::Store`]: parses `argv` by hand into one of
//! twelve subcommands, runs the matching facade call, and maps the result
//! onto a process exit code. No argument-parsing crate is used — subcommand
//! dispatch is a manual `match` on `argv[1]`, in keeping with the rest of
//! this stack never reaching for a parsing dependency it doesn't need.
//!
//! ## Commands
//!
//! ```text
//! kvimage init DATA_FILE
//! kvimage clear DATA_FILE
//! kvimage add DATA_FILE KEY VALUE
//! kvimage add_file DATA_FILE KEY PATH_TO_FILE
//! kvimage get DATA_FILE KEY
//! kvimage get_file DATA_FILE KEY PATH_TO_OUTPUT_FILE
//! kvimage contains DATA_FILE KEY
//! kvimage erase DATA_FILE KEY
//! kvimage change DATA_FILE KEY {file|data} VALUE
//! kvimage check_validity_of_file DATA_FILE   (alias: cvf)
//! kvimage add_package DATA_FILE [-f CSV_FILE]
//! kvimage get_all_keys DATA_FILE
//! ```
//!
//! ## Exit codes
//!
//! | Code | Meaning |
//! |---|---|
//! | 0 | success |
//! | 1 | not a data file |
//! | 2 | data file already exists |
//! | 3 | file missing |
//! | 4 | key already used |
//! | 5 | tree full |
//! | 6 | out of memory |
//! | 7 | payload too big |
//! | 8 | no such key |
//! | 9 | invalid csv |
//! | 100 | any other failure |
//!
//! Success messages go to standard output; error messages go to standard
//! error. There are no environment variables.

mod commands;

use anyhow::Result;
use std::process::ExitCode;
use store::StoreError;

fn main() -> ExitCode {
    let argv: Vec<String> = std::env::args().collect();
    match run(&argv) {
        Ok(message) => {
            println!("{message}");
            ExitCode::from(0)
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

fn run(argv: &[String]) -> Result<String> {
    let Some(command) = argv.get(1) else {
        return Ok(usage());
    };
    let Some(data_file) = argv.get(2) else {
        anyhow::bail!("usage: kvimage {command} DATA_FILE ...");
    };
    let rest = &argv[3..];

    match command.as_str() {
        "init" => commands::init(data_file),
        "clear" => commands::clear(data_file),
        "add" => commands::add(data_file, rest),
        "add_file" => commands::add_file(data_file, rest),
        "get" => commands::get(data_file, rest),
        "get_file" => commands::get_file(data_file, rest),
        "contains" => commands::contains(data_file, rest),
        "erase" => commands::erase(data_file, rest),
        "change" => commands::change(data_file, rest),
        "check_validity_of_file" | "cvf" => commands::check_validity_of_file(data_file),
        "add_package" => commands::add_package(data_file, rest),
        "get_all_keys" => commands::get_all_keys(data_file),
        other => anyhow::bail!("unknown command: {other}"),
    }
}

fn usage() -> String {
    "usage: kvimage <init|clear|add|add_file|get|get_file|contains|erase|change|\
check_validity_of_file|add_package|get_all_keys> DATA_FILE ..."
        .to_string()
}

/// Maps a failure onto the process exit code table. Anything that isn't one
/// of the nine domain [`StoreError`] variants (argument-shape mistakes, I/O
/// errors not already wrapped into a domain kind) falls through to 100.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<StoreError>() {
        Some(StoreError::NotADataFile(_)) => 1,
        Some(StoreError::DataFileAlreadyExists(_)) => 2,
        Some(StoreError::FileMissing(_)) => 3,
        Some(StoreError::UsedKey(_)) => 4,
        Some(StoreError::TreeFull(_)) => 5,
        Some(StoreError::OutOfMemory(_)) => 6,
        Some(StoreError::PayloadTooBig) => 7,
        Some(StoreError::NoSuchKey { .. }) => 8,
        Some(StoreError::InvalidCsv(_)) => 9,
        None => 100,
    }
}
