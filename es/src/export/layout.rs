//! Page layout: title and paragraphs → positioned lines on pages
//!
//! Pure geometry, no I/O. Coordinates are PDF points with the origin at the
//! bottom-left corner; `y` is the text baseline.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ExportError;
use super::fonts::{FontFace, sanitize};
use crate::synthesis::BlogContent;

/// Page geometry and type sizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    #[serde(rename = "page-width-pt")]
    pub page_width_pt: f32,

    #[serde(rename = "page-height-pt")]
    pub page_height_pt: f32,

    #[serde(rename = "margin-pt")]
    pub margin_pt: f32,

    #[serde(rename = "title-font-size")]
    pub title_font_size: f32,

    /// Gap between the title and the first paragraph
    #[serde(rename = "title-space-after")]
    pub title_space_after: f32,

    #[serde(rename = "body-font-size")]
    pub body_font_size: f32,

    /// Baseline-to-baseline distance for body text
    #[serde(rename = "body-leading")]
    pub body_leading: f32,

    /// Gap after each paragraph
    #[serde(rename = "paragraph-spacing")]
    pub paragraph_spacing: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        // US Letter with one-inch margins
        Self {
            page_width_pt: 612.0,
            page_height_pt: 792.0,
            margin_pt: 72.0,
            title_font_size: 24.0,
            title_space_after: 30.0,
            body_font_size: 10.0,
            body_leading: 12.0,
            paragraph_spacing: 12.0,
        }
    }
}

impl LayoutConfig {
    fn content_width(&self) -> f32 {
        self.page_width_pt - 2.0 * self.margin_pt
    }

    fn title_leading(&self) -> f32 {
        self.title_font_size * 1.2
    }

    /// Reject geometry where no line could ever be placed
    pub fn validate(&self) -> Result<(), ExportError> {
        let usable_height = self.page_height_pt - 2.0 * self.margin_pt;
        if self.content_width() <= 0.0 || usable_height < self.title_leading().max(self.body_leading) {
            return Err(ExportError::Layout(format!(
                "page {}x{}pt with {}pt margins leaves no room for text",
                self.page_width_pt, self.page_height_pt, self.margin_pt
            )));
        }
        if self.title_font_size <= 0.0 || self.body_font_size <= 0.0 || self.body_leading <= 0.0 {
            return Err(ExportError::Layout("font sizes and leading must be positive".to_string()));
        }
        Ok(())
    }
}

/// One line of text at a fixed position
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub face: FontFace,
    pub size: f32,
    pub x: f32,
    pub y: f32,
}

/// Lines on one page, top to bottom
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub lines: Vec<PlacedLine>,
}

/// Greedy word wrap to `max_width` points
///
/// Words wider than a full line are split between characters.
pub fn wrap_text(text: &str, face: FontFace, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if face.text_width(&candidate, size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if face.text_width(word, size) <= max_width {
            current = word.to_string();
            continue;
        }

        for c in word.chars() {
            current.push(c);
            if face.text_width(&current, size) > max_width && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(c);
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Flows lines down pages, starting a new page at the bottom margin
struct Flow<'a> {
    config: &'a LayoutConfig,
    pages: Vec<PageLayout>,
    cursor: f32,
}

impl<'a> Flow<'a> {
    fn new(config: &'a LayoutConfig) -> Self {
        Self {
            config,
            pages: vec![PageLayout::default()],
            cursor: config.page_height_pt - config.margin_pt,
        }
    }

    fn at_page_top(&self) -> bool {
        self.cursor >= self.config.page_height_pt - self.config.margin_pt
    }

    fn place(&mut self, text: String, face: FontFace, size: f32, leading: f32) {
        if self.cursor - leading < self.config.margin_pt && !self.at_page_top() {
            self.pages.push(PageLayout::default());
            self.cursor = self.config.page_height_pt - self.config.margin_pt;
        }
        let line = PlacedLine {
            text,
            face,
            size,
            x: self.config.margin_pt,
            y: self.cursor - size,
        };
        if let Some(page) = self.pages.last_mut() {
            page.lines.push(line);
        }
        self.cursor -= leading;
    }

    fn space(&mut self, gap: f32) {
        if !self.at_page_top() {
            self.cursor -= gap;
        }
    }
}

/// Lay out a blog post: heading first, then paragraphs in order
pub fn layout_document(content: &BlogContent, config: &LayoutConfig) -> Result<Vec<PageLayout>, ExportError> {
    debug!(paragraphs = content.paragraphs.len(), "layout_document: called");
    config.validate()?;

    let width = config.content_width();
    let mut flow = Flow::new(config);

    let title = sanitize(&content.title);
    for line in wrap_text(&title, FontFace::HelveticaBold, config.title_font_size, width) {
        flow.place(line, FontFace::HelveticaBold, config.title_font_size, config.title_leading());
    }
    flow.space(config.title_space_after);

    for paragraph in &content.paragraphs {
        let paragraph = sanitize(paragraph);
        for line in wrap_text(&paragraph, FontFace::Helvetica, config.body_font_size, width) {
            flow.place(line, FontFace::Helvetica, config.body_font_size, config.body_leading);
        }
        flow.space(config.paragraph_spacing);
    }

    debug!(pages = flow.pages.len(), "layout_document: done");
    Ok(flow.pages)
}
