use std::path::Path;

use super::load_config;

/// Run `glyph rewrite <file>` — parse `file`, insert GLYPH:S/GLYPH:E
/// markers around its top-level entities, and either print the rewritten
/// bytes to stdout or write them back in place.
pub fn run(file: &str, write: bool, clang_args: &[String], json: bool) -> i32 {
    let config = load_config();
    let path = Path::new(file);

    let mut extra_args = config.clang.extra_args.clone();
    extra_args.extend(clang_args.iter().cloned());

    let (unit, bytes) = match glyph_parsers::index_file(
        path,
        None,
        &extra_args,
        config.ids.length,
        &config.ids.separator,
    ) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("glyph rewrite: {file}: {e}");
            return 2;
        }
    };

    let (rewritten, changed) = glyph_parsers::rewrite::rewrite(&bytes, &unit.entities);

    if write {
        if let Err(e) = std::fs::write(path, &rewritten) {
            eprintln!("glyph rewrite: failed to write {file}: {e}");
            return 2;
        }
    } else if json {
        let payload = serde_json::json!({
            "file": file,
            "changed": changed,
            "entities": unit.entities.len(),
            "bytes": String::from_utf8_lossy(&rewritten),
        });
        println!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
    } else {
        print!("{}", String::from_utf8_lossy(&rewritten));
    }

    0
}
