use std::path::{Path, PathBuf};

/// Resolves a path of the configuration against the directory of the configuration.
pub fn resolve_path(root: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}

// The answers are read as CSV only when the extension says so.
pub fn infer_provider(path: &str) -> String {
    let is_csv = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if is_csv {
        "csv".to_string()
    } else {
        "json".to_string()
    }
}

/// Flattens repeated and comma-separated command line values.
pub fn split_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn providers() {
        assert_eq!(infer_provider("answers.csv"), "csv");
        assert_eq!(infer_provider("ANSWERS.CSV"), "csv");
        assert_eq!(infer_provider("answers.json"), "json");
        assert_eq!(infer_provider("answers"), "json");
    }

    #[test]
    fn lists() {
        let values = vec!["t1, t2".to_string(), "".to_string(), "t3,".to_string()];
        assert_eq!(split_list(&values), vec!["t1", "t2", "t3"]);
        assert!(split_list(&[]).is_empty());
    }

    #[test]
    fn paths() {
        let root = Path::new("/data");
        assert_eq!(resolve_path(root, "a.json"), PathBuf::from("/data/a.json"));
        assert_eq!(resolve_path(root, "/tmp/a.json"), PathBuf::from("/tmp/a.json"));
    }
}
