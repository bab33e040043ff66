//! Blog text → title + paragraphs

use tracing::debug;

use super::SynthesisError;

/// A synthesized blog post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogContent {
    pub title: String,
    pub paragraphs: Vec<String>,
}

/// Split model output into a title and body paragraphs
///
/// The title is the first non-blank line. Everything after it is split on
/// blank lines; the lines of each block are trimmed and joined with a space.
pub fn parse_blog_text(text: &str) -> Result<BlogContent, SynthesisError> {
    debug!(text_len = text.len(), "parse_blog_text: called");
    let mut lines = text.lines().map(str::trim).skip_while(|line| line.is_empty());

    let title = lines.next().ok_or(SynthesisError::EmptyTitle)?.to_string();

    let mut paragraphs = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    for line in lines {
        if line.is_empty() {
            if !block.is_empty() {
                paragraphs.push(block.join(" "));
                block.clear();
            }
        } else {
            block.push(line);
        }
    }
    if !block.is_empty() {
        paragraphs.push(block.join(" "));
    }

    if paragraphs.is_empty() {
        return Err(SynthesisError::NoParagraphs);
    }

    debug!(%title, paragraph_count = paragraphs.len(), "parse_blog_text: parsed");
    Ok(BlogContent { title, paragraphs })
}
