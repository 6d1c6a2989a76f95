//! System prompt selection
//!
//! The persona sent ahead of every user turn. The built-in research
//! assistant prompt can be replaced by a file without touching the
//! session logic.

use std::io;
use std::path::Path;

/// Built-in research assistant persona
pub const RESEARCH_ASSISTANT_PROMPT: &str = "You are an AI chatbot specialized in assisting with research-related inquiries, providing accurate, well-cited, and in-depth responses. You offer insights into academic research, literature reviews, methodologies, AI/ML trends, and technical implementations. You guide users in writing research papers, structuring content, and ensuring ethical standards like proper citation and avoiding plagiarism. You provide programming assistance for AI and data science while encouraging best research practices such as reproducibility and peer review. When discussing recent research, you suggest reliable sources like Google Scholar, arXiv, and IEEE Xplore. You engage users by recommending relevant journals, conferences, and step-by-step research guidance. You must response Not in Html or Markdown.";

/// Load the prompt from `override_path` if given, else the built-in one.
///
/// A blank override file is rejected rather than sending an empty persona.
pub fn load_system_prompt(override_path: Option<&Path>) -> io::Result<String> {
    let Some(path) = override_path else {
        return Ok(RESEARCH_ASSISTANT_PROMPT.to_string());
    };

    let content = std::fs::read_to_string(path)?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("system prompt file {} is empty", path.display()),
        ));
    }

    tracing::info!(path = %path.display(), chars = trimmed.len(), "Loaded system prompt override");
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_prompt_forbids_markup() {
        let prompt = load_system_prompt(None).unwrap();
        assert!(prompt.contains("research-related inquiries"));
        assert!(prompt.ends_with("Not in Html or Markdown."));
    }

    #[test]
    fn test_override_file_is_trimmed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("persona.txt");
        fs::write(&path, "\n  You are a terse librarian.  \n").unwrap();

        let prompt = load_system_prompt(Some(&path)).unwrap();
        assert_eq!(prompt, "You are a terse librarian.");
    }

    #[test]
    fn test_blank_override_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blank.txt");
        fs::write(&path, "   \n").unwrap();

        let err = load_system_prompt(Some(&path)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_missing_override_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(load_system_prompt(Some(&temp.path().join("nope.txt"))).is_err());
    }
}
