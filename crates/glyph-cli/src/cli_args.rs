use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "glyph", version, about = "C/C++ code index and marker-rewriter")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as structured JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Insert GLYPH:S/GLYPH:E markers around top-level entities in a file
    Rewrite {
        /// Source file to rewrite
        file: String,
        /// Write the result back to `file` instead of printing to stdout
        #[arg(long)]
        write: bool,
        /// Extra clang argument, may be repeated
        #[arg(long = "clang-arg")]
        clang_args: Vec<String>,
    },

    /// Walk a source tree and print a repo-wide entity/call summary
    Scan {
        /// Root directory to walk
        root: String,
        /// Comma-separated source extensions
        #[arg(long, default_value = ".c,.h,.cc,.cpp,.cxx,.hpp,.hh,.hxx")]
        ext: String,
        /// Comma-separated path components to skip
        #[arg(long, default_value = ".git,.glyph,build")]
        ignore: String,
        /// Extra clang argument, may be repeated
        #[arg(long = "clang-arg")]
        clang_args: Vec<String>,
    },

    /// Inspect and maintain the glyph store
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate for: bash, zsh, fish, elvish, powershell
        shell: String,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum DbCommands {
    /// Create (or open) a glyph store, applying schema migrations
    Init {
        /// Path to the database file
        db: String,
    },

    /// Parse and ingest one or more files into the store
    Ingest {
        /// Path to the database file
        db: String,
        /// Source files to ingest
        files: Vec<String>,
        /// Extra clang argument, may be repeated
        #[arg(long = "clang-arg")]
        clang_args: Vec<String>,
    },

    /// Print one entity by GID
    Show {
        /// Path to the database file
        db: String,
        /// Entity GID
        gid: String,
    },

    /// List the GIDs that call a given entity
    Callers {
        /// Path to the database file
        db: String,
        /// Entity GID
        gid: String,
    },

    /// List the entities a given entity calls
    Callees {
        /// Path to the database file
        db: String,
        /// Entity GID
        gid: String,
    },

    /// Full-text search over entity names and signatures
    Search {
        /// Path to the database file
        db: String,
        /// Natural-language query
        query: String,
        /// Maximum results to return
        #[arg(long, default_value = "50")]
        limit: usize,
    },

    /// Link unresolved calls with a unique name match to their definition
    Resolve {
        /// Path to the database file
        db: String,
    },

    /// Reclaim free space (`VACUUM`)
    Vacuum {
        /// Path to the database file
        db: String,
    },

    /// Refresh query planner statistics (`ANALYZE`)
    Analyze {
        /// Path to the database file
        db: String,
    },
}
