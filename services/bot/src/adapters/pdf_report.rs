//! services/bot/src/adapters/pdf_report.rs
//!
//! This module contains the adapter that lays out an `AvatarReport` as an A4 PDF.
//! It implements the `ReportRenderer` port from the `core` crate.

use async_trait::async_trait;
use avatar_core::calculator::MISSING_RECOMMENDATIONS;
use avatar_core::ports::{PortError, PortResult, ReportRenderer};
use avatar_core::report::{AvatarReport, ReportSection};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

//=========================================================================================
// Page Geometry (points)
//=========================================================================================

pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
pub const MARGIN: f32 = 50.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const LINE_SPACING: f32 = 1.4;
/// Average glyph advance as a fraction of the font size. Used for wrapping and centring.
const AVG_GLYPH_WIDTH: f32 = 0.55;

const TITLE_SIZE: f32 = 20.0;
const HEADING_SIZE: f32 = 16.0;
const AVATAR_TITLE_SIZE: f32 = 13.0;
const BODY_SIZE: f32 = 11.0;
const FOOTER_SIZE: f32 = 9.0;

const IMAGE_MAX_SIDE: f32 = 160.0;
const IMAGE_DPI: f32 = 300.0;

fn mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

//=========================================================================================
// Layout Cursor
//=========================================================================================

/// Tracks the vertical write position, measured in points from the top of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCursor {
    y: f32,
    page: usize,
}

impl Default for LayoutCursor {
    fn default() -> Self {
        Self { y: MARGIN, page: 0 }
    }
}

impl LayoutCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes room for a block of `height` points.
    ///
    /// Returns `true` when the block does not fit above the bottom margin and a
    /// new page has been started. A fresh page never breaks again.
    pub fn reserve(&mut self, height: f32) -> bool {
        if self.y + height <= PAGE_HEIGHT - MARGIN || self.y <= MARGIN {
            return false;
        }
        self.page += 1;
        self.y = MARGIN;
        true
    }

    pub fn advance(&mut self, height: f32) {
        self.y += height;
    }

    /// The PDF y coordinate (from the bottom) of the lower edge of a block of `height`.
    pub fn bottom_of(&self, height: f32) -> f32 {
        PAGE_HEIGHT - self.y - height
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn y(&self) -> f32 {
        self.y
    }
}

//=========================================================================================
// Text Measurement
//=========================================================================================

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_GLYPH_WIDTH
}

/// Greedy word wrap to at most `max_chars` characters per line.
/// Explicit newlines are kept; words longer than a line are cut.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let needed = if current.is_empty() {
                word.len()
            } else {
                current_len + 1 + word.len()
            };
            if needed > max_chars {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if !current.is_empty() {
                current.push(' ');
                current_len += 1;
            }
            current_len += word.len();
            current.extend(word);
        }
        lines.push(current);
    }
    lines
}

fn chars_per_line(width: f32, size: f32) -> usize {
    (width / (size * AVG_GLYPH_WIDTH)).floor() as usize
}

//=========================================================================================
// Assets
//=========================================================================================

/// Fonts and images read from disk. Fonts are read once, at construction.
struct ReportAssets {
    images_dir: PathBuf,
    regular_font: Option<Vec<u8>>,
    bold_font: Option<Vec<u8>>,
}

fn read_font(path: &Path) -> Option<Vec<u8>> {
    match std::fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!("Font {} unavailable, falling back: {}", path.display(), e);
            None
        }
    }
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    /// Regular: TTF, else Helvetica. Bold: bold TTF, else the regular TTF, else Helvetica-Bold.
    fn load(doc: &PdfDocumentReference, assets: &ReportAssets) -> Result<Self, printpdf::Error> {
        let external = |bytes: &Option<Vec<u8>>| {
            bytes
                .as_deref()
                .and_then(|bytes| match doc.add_external_font(bytes) {
                    Ok(font) => Some(font),
                    Err(e) => {
                        warn!("Could not embed font: {}", e);
                        None
                    }
                })
        };

        let regular_ttf = external(&assets.regular_font);
        let bold = match external(&assets.bold_font).or_else(|| regular_ttf.clone()) {
            Some(font) => font,
            None => doc.add_builtin_font(BuiltinFont::HelveticaBold)?,
        };
        let regular = match regular_ttf {
            Some(font) => font,
            None => doc.add_builtin_font(BuiltinFont::Helvetica)?,
        };
        Ok(Self { regular, bold })
    }
}

//=========================================================================================
// Writer
//=========================================================================================

#[derive(Clone, Copy)]
enum Align {
    Left,
    Center,
}

struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    cursor: LayoutCursor,
    fonts: Fonts,
}

impl PdfWriter {
    fn new(title: &str, assets: &ReportAssets) -> Result<Self, printpdf::Error> {
        let (doc, page, layer) =
            PdfDocument::new(title, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);
        let fonts = Fonts::load(&doc, assets)?;
        Ok(Self {
            doc,
            layer,
            cursor: LayoutCursor::new(),
            fonts,
        })
    }

    fn ensure(&mut self, height: f32) {
        if self.cursor.reserve(height) {
            let (page, layer) = self
                .doc
                .add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
        }
    }

    fn line(&mut self, text: &str, size: f32, bold: bool, align: Align) {
        let height = size * LINE_SPACING;
        self.ensure(height);
        let x = match align {
            Align::Left => MARGIN,
            Align::Center => (PAGE_WIDTH - text_width(text, size)).max(2.0 * MARGIN) / 2.0,
        };
        // Baseline sits one font size below the top of the line box.
        let baseline = PAGE_HEIGHT - self.cursor.y() - size;
        let font = if bold { &self.fonts.bold } else { &self.fonts.regular };
        if !text.is_empty() {
            self.layer.use_text(text, size, mm(x), mm(baseline), font);
        }
        self.cursor.advance(height);
    }

    fn paragraph(&mut self, text: &str, size: f32, bold: bool, align: Align) {
        for line in wrap_text(text, chars_per_line(CONTENT_WIDTH, size)) {
            self.line(&line, size, bold, align);
        }
    }

    fn bullet(&mut self, text: &str) {
        let indent = "  ";
        let width = chars_per_line(CONTENT_WIDTH, BODY_SIZE).saturating_sub(2);
        for (i, line) in wrap_text(text, width).into_iter().enumerate() {
            let prefix = if i == 0 { "• " } else { indent };
            self.line(&format!("{prefix}{line}"), BODY_SIZE, false, Align::Left);
        }
    }

    fn gap(&mut self, height: f32) {
        self.cursor.advance(height);
    }

    /// Places the image centred. Missing or undecodable files are skipped.
    fn image(&mut self, path: &Path) {
        let image = match printpdf::image_crate::open(path) {
            Ok(image) => image,
            Err(e) => {
                debug!("Skipping image {}: {}", path.display(), e);
                return;
            }
        };
        let (px_w, px_h) = (image.width() as f32, image.height() as f32);
        if px_w <= 0.0 || px_h <= 0.0 {
            return;
        }

        let natural_w = px_w * 72.0 / IMAGE_DPI;
        let natural_h = px_h * 72.0 / IMAGE_DPI;
        let scale = (IMAGE_MAX_SIDE / natural_w).min(IMAGE_MAX_SIDE / natural_h);
        let (width, height) = (natural_w * scale, natural_h * scale);

        self.ensure(height);
        let transform = ImageTransform {
            translate_x: Some(mm((PAGE_WIDTH - width) / 2.0)),
            translate_y: Some(mm(self.cursor.bottom_of(height))),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        };
        Image::from_dynamic_image(&image).add_to_layer(self.layer.clone(), transform);
        self.cursor.advance(height + 10.0);
    }

    fn finish(self) -> Result<Vec<u8>, printpdf::Error> {
        self.doc.save_to_bytes()
    }
}

//=========================================================================================
// Report Layout
//=========================================================================================

fn layout(assets: &ReportAssets, report: &AvatarReport) -> Result<Vec<u8>, printpdf::Error> {
    let mut writer = PdfWriter::new(report.heading(), assets)?;

    writer.paragraph(report.heading(), TITLE_SIZE, true, Align::Center);
    writer.gap(6.0);
    writer.line(&report.date_line(), BODY_SIZE + 1.0, false, Align::Center);
    writer.gap(18.0);

    for section in &report.sections {
        layout_section(&mut writer, assets, section);
    }

    writer.gap(10.0);
    writer.paragraph(&report.footer, FOOTER_SIZE, false, Align::Center);
    writer.finish()
}

fn layout_section(writer: &mut PdfWriter, assets: &ReportAssets, section: &ReportSection) {
    // Keep the heading with at least the first lines that follow it.
    writer.ensure(HEADING_SIZE * LINE_SPACING + 3.0 * BODY_SIZE * LINE_SPACING);
    writer.line(section.heading(), HEADING_SIZE, true, Align::Left);
    writer.paragraph(section.intro, BODY_SIZE, false, Align::Left);
    writer.gap(4.0);
    writer.paragraph(
        &format!("{} ({})", section.avatar_title, section.index),
        AVATAR_TITLE_SIZE,
        true,
        Align::Left,
    );
    writer.gap(4.0);

    if let Some(image) = &section.image {
        writer.image(&assets.images_dir.join(image));
    }

    writer.paragraph(&section.description, BODY_SIZE, false, Align::Left);
    if let Some(recommendations) = &section.recommendations {
        writer.gap(6.0);
        writer.line(&section.recommendations_heading(), BODY_SIZE + 1.0, true, Align::Left);
        if recommendations.is_empty() {
            writer.paragraph(MISSING_RECOMMENDATIONS, BODY_SIZE, false, Align::Left);
        } else {
            for item in recommendations {
                writer.bullet(item);
            }
        }
    }
    writer.gap(16.0);
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `ReportRenderer` port with `printpdf`.
#[derive(Clone)]
pub struct PdfReportRenderer {
    assets: Arc<ReportAssets>,
}

impl PdfReportRenderer {
    /// Creates a new `PdfReportRenderer`, reading the font files up front.
    pub fn new(
        images_dir: impl Into<PathBuf>,
        font_path: impl AsRef<Path>,
        font_bold_path: impl AsRef<Path>,
    ) -> Self {
        Self {
            assets: Arc::new(ReportAssets {
                images_dir: images_dir.into(),
                regular_font: read_font(font_path.as_ref()),
                bold_font: read_font(font_bold_path.as_ref()),
            }),
        }
    }
}

#[async_trait]
impl ReportRenderer for PdfReportRenderer {
    async fn render_report(&self, report: &AvatarReport) -> PortResult<Vec<u8>> {
        let assets = self.assets.clone();
        let report = report.clone();

        let bytes = tokio::task::spawn_blocking(move || layout(&assets, &report))
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .map_err(|e| PortError::Unexpected(format!("PDF layout failed: {}", e)))?;

        debug!("Rendered report ({} bytes)", bytes.len());
        Ok(bytes)
    }
}
