//! glyph CLI — parses, indexes, and rewrites C/C++ translation units.
//!
//! This binary provides the `glyph` command with `rewrite`, `scan`, `db`,
//! and `completion` subcommands. See `glyph --help` for usage.

use clap::Parser;

mod cli_args;
mod commands;

use cli_args::{Cli, Commands, DbCommands};

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Rewrite { file, write, clang_args } => {
            commands::rewrite::run(&file, write, &clang_args, cli.json)
        }
        Commands::Scan { root, ext, ignore, clang_args } => {
            commands::scan::run(&root, &ext, &ignore, &clang_args, cli.json)
        }
        Commands::Db { command } => match command {
            DbCommands::Init { db } => commands::db::init(&db, cli.json),
            DbCommands::Ingest { db, files, clang_args } => {
                commands::db::ingest(&db, &files, &clang_args, cli.json)
            }
            DbCommands::Show { db, gid } => commands::db::show(&db, &gid, cli.json),
            DbCommands::Callers { db, gid } => commands::db::callers(&db, &gid, cli.json),
            DbCommands::Callees { db, gid } => commands::db::callees(&db, &gid, cli.json),
            DbCommands::Search { db, query, limit } => {
                commands::db::search(&db, &query, limit, cli.json)
            }
            DbCommands::Resolve { db } => commands::db::resolve(&db, cli.json),
            DbCommands::Vacuum { db } => commands::db::vacuum(&db),
            DbCommands::Analyze { db } => commands::db::analyze(&db),
        },
        Commands::Completion { shell } => commands::completion::run(&shell),
    };

    std::process::exit(exit_code);
}
