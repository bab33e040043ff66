//! PDF serialization of laid-out pages

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, Pt};
use tracing::debug;

use super::ExportError;
use super::fonts::FontFace;
use super::layout::{LayoutConfig, PageLayout};

const LAYER_NAME: &str = "Text";

fn render_err(e: impl std::fmt::Display) -> ExportError {
    ExportError::Render(e.to_string())
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self, ExportError> {
        Ok(Self {
            regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(render_err)?,
            bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(render_err)?,
        })
    }

    fn get(&self, face: FontFace) -> &IndirectFontRef {
        match face {
            FontFace::Helvetica => &self.regular,
            FontFace::HelveticaBold => &self.bold,
        }
    }
}

/// Render pages into an in-memory PDF
pub fn render_pdf(title: &str, pages: &[PageLayout], config: &LayoutConfig) -> Result<Vec<u8>, ExportError> {
    debug!(%title, pages = pages.len(), "render_pdf: called");
    let width = Mm::from(Pt(config.page_width_pt));
    let height = Mm::from(Pt(config.page_height_pt));

    let (doc, first_page, first_layer) = PdfDocument::new(title, width, height, LAYER_NAME);
    let fonts = Fonts::load(&doc)?;

    for (index, page) in pages.iter().enumerate() {
        let (page_index, layer_index) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(width, height, LAYER_NAME)
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);

        for line in &page.lines {
            layer.use_text(
                line.text.as_str(),
                line.size,
                Mm::from(Pt(line.x)),
                Mm::from(Pt(line.y)),
                fonts.get(line.face),
            );
        }
    }

    let bytes = doc.save_to_bytes().map_err(render_err)?;
    debug!(bytes = bytes.len(), "render_pdf: serialized");
    Ok(bytes)
}
