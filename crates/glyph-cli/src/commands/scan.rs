use std::path::Path;

use glyph_retriever::summary::summarize_repo;

use super::load_config;

/// Run `glyph scan <root>` — walk the source tree and print a repo-wide
/// entity/call summary (the data-producing half of the original's
/// `summarize_repo`; rendering a human tree/pack view is an external
/// collaborator's job).
pub fn run(root: &str, ext_csv: &str, ignore_csv: &str, clang_args: &[String], json: bool) -> i32 {
    let config = load_config();
    let root_path = Path::new(root);
    if !root_path.is_dir() {
        eprintln!("glyph scan: {root} is not a directory");
        return 2;
    }

    let extensions: Vec<String> = ext_csv.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
    let ignore: Vec<String> = ignore_csv.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();

    let mut extra_args = config.clang.extra_args.clone();
    extra_args.extend(clang_args.iter().cloned());

    let summary = match summarize_repo(
        root_path,
        &extensions,
        &ignore,
        &extra_args,
        config.ids.length,
        &config.ids.separator,
    ) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("glyph scan: {e}");
            return 2;
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary).unwrap_or_default());
    } else {
        println!("glyph scan: {}", summary.root);
        for (k, v) in &summary.totals {
            println!("  {k:<18} {v}");
        }
    }

    0
}
