use anyhow::Result;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::ManualConfig;
use crate::models::ManualPair;

/// Pair `{base}{prompt_suffix}` files with `{base}{example_suffix}` files
/// directly under `dir`.
///
/// Hidden entries are ignored, prompts without an example are dropped, and
/// the result is sorted by file name.
pub fn scan_manual_dir(dir: &Path, config: &ManualConfig) -> Result<Vec<ManualPair>> {
    let mut pairs = Vec::new();

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        if file_name.starts_with('.') {
            continue;
        }

        // `_prompt.txt` alone pairs with `_example.c` under an empty base name.
        let Some(base_name) = file_name.strip_suffix(config.prompt_suffix.as_str()) else {
            continue;
        };

        let example_path = dir.join(format!("{}{}", base_name, config.example_suffix));
        if !example_path.is_file() {
            debug!(prompt = %entry.path().display(), "no matching example file; skipped");
            continue;
        }

        pairs.push(ManualPair {
            base_name: base_name.to_string(),
            prompt_path: entry.path().to_path_buf(),
            example_path,
        });
    }

    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), name).unwrap();
    }

    #[test]
    fn test_pairs_matched_and_sorted() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        touch(dir, "paging_prompt.txt");
        touch(dir, "paging_example.c");
        touch(dir, "gdt_prompt.txt");
        touch(dir, "gdt_example.c");

        let pairs = scan_manual_dir(dir, &ManualConfig::default()).unwrap();
        let names: Vec<&str> = pairs.iter().map(|p| p.base_name.as_str()).collect();
        assert_eq!(names, vec!["gdt", "paging"]);
        assert_eq!(pairs[0].prompt_path, dir.join("gdt_prompt.txt"));
        assert_eq!(pairs[0].example_path, dir.join("gdt_example.c"));
    }

    #[test]
    fn test_prompt_without_example_dropped() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        touch(dir, "lonely_prompt.txt");
        touch(dir, "other_example.c");

        let pairs = scan_manual_dir(dir, &ManualConfig::default()).unwrap();
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_hidden_and_unrelated_entries_ignored() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        touch(dir, ".hidden_prompt.txt");
        touch(dir, ".hidden_example.c");
        touch(dir, "notes.txt");
        fs::create_dir(dir.join("nested_prompt.txt")).unwrap();
        touch(dir, "nested_example.c");

        let pairs = scan_manual_dir(dir, &ManualConfig::default()).unwrap();
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_bare_suffix_pairs_with_empty_base() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        touch(dir, "_prompt.txt");
        touch(dir, "_example.c");

        let pairs = scan_manual_dir(dir, &ManualConfig::default()).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].base_name, "");
        assert_eq!(pairs[0].example_path, dir.join("_example.c"));
    }

    #[test]
    fn test_nested_directories_not_descended() {
        let tmp = TempDir::new().unwrap();
        let sub = tmp.path().join("sub");
        fs::create_dir(&sub).unwrap();
        touch(&sub, "deep_prompt.txt");
        touch(&sub, "deep_example.c");

        let pairs = scan_manual_dir(tmp.path(), &ManualConfig::default()).unwrap();
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_missing_dir_is_error() {
        let tmp = TempDir::new().unwrap();
        assert!(scan_manual_dir(&tmp.path().join("nope"), &ManualConfig::default()).is_err());
    }
}
