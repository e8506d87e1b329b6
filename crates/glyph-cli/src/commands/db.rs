use std::path::Path;

use glyph_core::store::Store;

use super::load_config;

fn open(db: &str) -> Result<Store, i32> {
    Store::open(db).map_err(|e| {
        eprintln!("glyph db: failed to open {db}: {e}");
        2
    })
}

pub fn init(db: &str, json: bool) -> i32 {
    let store = match open(db) {
        Ok(s) => s,
        Err(code) => return code,
    };
    match store.schema_version() {
        Ok(v) if json => {
            println!("{}", serde_json::json!({"db": db, "schema_version": v}));
            0
        }
        Ok(v) => {
            println!("glyph db init: {db} (schema v{v})");
            0
        }
        Err(e) => {
            eprintln!("glyph db init: {e}");
            2
        }
    }
}

pub fn ingest(db: &str, files: &[String], clang_args: &[String], json: bool) -> i32 {
    if files.is_empty() {
        eprintln!("glyph db ingest: no files given");
        return 2;
    }
    let store = match open(db) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let config = load_config();
    let mut extra_args = config.clang.extra_args.clone();
    extra_args.extend(clang_args.iter().cloned());

    let mut ingested = 0usize;
    let mut failed = 0usize;
    for file in files {
        let path = Path::new(file);
        match glyph_parsers::index_file(path, None, &extra_args, config.ids.length, &config.ids.separator) {
            Ok((unit, bytes)) => {
                if let Err(e) = store.ingest_file(path, &unit.entities, &unit.calls, &unit.includes, Some(&bytes), true) {
                    eprintln!("glyph db ingest: {file}: {e}");
                    failed += 1;
                } else {
                    ingested += 1;
                }
            }
            Err(e) => {
                eprintln!("glyph db ingest: {file}: {e}");
                failed += 1;
            }
        }
    }

    if json {
        println!("{}", serde_json::json!({"ingested": ingested, "failed": failed}));
    } else {
        println!("glyph db ingest: {ingested} ingested, {failed} failed");
    }
    if failed > 0 && ingested == 0 { 2 } else { 0 }
}

pub fn show(db: &str, gid: &str, json: bool) -> i32 {
    let store = match open(db) {
        Ok(s) => s,
        Err(code) => return code,
    };
    match store.get_entity(gid) {
        Ok(Some(entity)) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&entity).unwrap_or_default());
            } else {
                println!(
                    "{}  {}  {}  {}:{}..{}",
                    entity.gid, entity.kind, entity.decl_sig, entity.file_path, entity.start, entity.end
                );
            }
            0
        }
        Ok(None) => {
            eprintln!("glyph db show: no entity with gid {gid}");
            1
        }
        Err(e) => {
            eprintln!("glyph db show: {e}");
            2
        }
    }
}

pub fn callers(db: &str, gid: &str, json: bool) -> i32 {
    let store = match open(db) {
        Ok(s) => s,
        Err(code) => return code,
    };
    match store.callers(gid) {
        Ok(gids) => {
            print_gid_list(&gids, json);
            0
        }
        Err(e) => {
            eprintln!("glyph db callers: {e}");
            2
        }
    }
}

pub fn callees(db: &str, gid: &str, json: bool) -> i32 {
    let store = match open(db) {
        Ok(s) => s,
        Err(code) => return code,
    };
    match store.callees(gid) {
        Ok(pairs) => {
            let gids: Vec<String> = pairs.into_iter().filter_map(|(g, _)| g).collect();
            print_gid_list(&gids, json);
            0
        }
        Err(e) => {
            eprintln!("glyph db callees: {e}");
            2
        }
    }
}

fn print_gid_list(gids: &[String], json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(gids).unwrap_or_default());
    } else {
        for g in gids {
            println!("{g}");
        }
    }
}

pub fn search(db: &str, query: &str, limit: usize, json: bool) -> i32 {
    let store = match open(db) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let config = load_config();
    match store.fts_search(query, limit, config.fts.max_terms) {
        Ok(hits) => {
            if json {
                let rows: Vec<_> = hits
                    .iter()
                    .map(|(gid, name, decl_sig)| serde_json::json!({"gid": gid, "name": name, "decl_sig": decl_sig}))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows).unwrap_or_default());
            } else {
                for (gid, name, decl_sig) in &hits {
                    println!("{gid}  {name}  {decl_sig}");
                }
            }
            0
        }
        Err(e) => {
            eprintln!("glyph db search: {e}");
            2
        }
    }
}

pub fn resolve(db: &str, json: bool) -> i32 {
    let store = match open(db) {
        Ok(s) => s,
        Err(code) => return code,
    };
    match store.resolve_unlinked_calls() {
        Ok(n) => {
            if json {
                println!("{}", serde_json::json!({"resolved": n}));
            } else {
                println!("glyph db resolve: linked {n} call(s)");
            }
            0
        }
        Err(e) => {
            eprintln!("glyph db resolve: {e}");
            2
        }
    }
}

pub fn vacuum(db: &str) -> i32 {
    let store = match open(db) {
        Ok(s) => s,
        Err(code) => return code,
    };
    match store.vacuum() {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("glyph db vacuum: {e}");
            2
        }
    }
}

pub fn analyze(db: &str) -> i32 {
    let store = match open(db) {
        Ok(s) => s,
        Err(code) => return code,
    };
    match store.analyze() {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("glyph db analyze: {e}");
            2
        }
    }
}
