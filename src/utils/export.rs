//! JSON export of search results.

use std::fs;
use std::path::Path;

use crate::models::Article;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Write `articles` to `path` as pretty-printed UTF-8 JSON.
///
/// Returns `Ok(false)` without touching the filesystem when there is nothing
/// to save.
pub fn save_results(articles: &[Article], path: &Path) -> Result<bool, ExportError> {
    if articles.is_empty() {
        tracing::info!("No results to save");
        return Ok(false);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(articles)?;
    fs::write(path, json)?;
    tracing::info!(count = articles.len(), path = %path.display(), "Saved results");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleBuilder;
    use tempfile::tempdir;

    #[test]
    fn test_save_results() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("results.json");
        let articles = vec![ArticleBuilder::new()
            .pmid("42")
            .title("Étude sur la sepsis")
            .build()
            .unwrap()];

        assert!(save_results(&articles, &path).unwrap());

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("Étude sur la sepsis"));
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value[0]["pmid"], "42");
        assert_eq!(value[0]["url"], "https://pubmed.ncbi.nlm.nih.gov/42/");
    }

    #[test]
    fn test_empty_results_write_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.json");
        assert!(!save_results(&[], &path).unwrap());
        assert!(!path.exists());
    }
}
