//! Resume loading.

use tracing::error;

/// Loads the resume text from the configured path. A missing or unreadable
/// file degrades to a fixed placeholder rather than failing startup.
pub fn load_resume(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            error!("Failed to load resume from '{path}': {e}");
            "Resume not available.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_loads_resume_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Jane Doe\n5 years of Go.").unwrap();
        let text = load_resume(file.path().to_str().unwrap());
        assert!(text.contains("Jane Doe"));
    }

    #[test]
    fn test_missing_file_degrades_to_placeholder() {
        assert_eq!(
            load_resume("/nonexistent/resume.txt"),
            "Resume not available."
        );
    }
}
