//! Flattening: composite page rasters and field visuals into a new PDF.
//!
//! The output document is built from scratch with `lopdf`: one page per
//! source page at its document-point size, the cached raster embedded as
//! an image XObject for the background (blank white fill when a page has
//! no raster), then every field drawn in creation order through
//! hand-written content-stream operators. Both export paths share the
//! same composition, so file and preview output are visually identical.
//!
//! Stored geometry is top-left-origin; PDF content streams are
//! bottom-left-origin. The flip happens here and only here.

use crate::document::FormDocument;
use crate::field::{export_font_size, icon_size, Field, FieldPayload};
use crate::raster::PageRasterCache;
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use pdf_engine::{PdfEngine, RgbaImage};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Bézier circle approximation constant.
const KAPPA: f32 = 0.552_284_8;

/// Horizontal text inset and wrap margin, mirroring the editor rendering.
const TEXT_INSET: f32 = 5.0;
const WRAP_MARGIN: f32 = 10.0;

/// Line leading as a multiple of the font size.
const LINE_HEIGHT: f32 = 1.15;

/// Baseline offset below the vertical center for middle-anchored labels,
/// as a fraction of the font size.
const MIDDLE_BASELINE: f32 = 0.35;

/// Average Helvetica glyph width as a fraction of the font size; used to
/// estimate wrap columns.
const AVG_GLYPH_WIDTH: f32 = 0.5;

const DROPDOWN_PLACEHOLDER: &str = "Select an option";

#[derive(Debug, thiserror::Error)]
pub enum FlattenError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF generation error: {0}")]
    Pdf(#[from] lopdf::Error),
}

/// Flatten to a file on disk. Pages without a cached raster get a blank
/// white background; nothing is rendered on demand here.
pub fn flatten_to_file<P: AsRef<Path>>(
    document: &FormDocument,
    rasters: &PageRasterCache,
    path: P,
) -> Result<(), FlattenError> {
    let bytes = flatten(document, rasters)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Flatten to an in-memory byte buffer for preview. Every page is
/// rasterized first; pages that fail to render fall back to a blank fill
/// rather than failing the export.
pub fn flatten_to_bytes<E: PdfEngine>(
    document: &FormDocument,
    rasters: &mut PageRasterCache,
    engine: &E,
) -> Result<Vec<u8>, FlattenError> {
    let failures = rasters.render_all(engine, document);
    if !failures.is_empty() {
        log::warn!("{} page(s) missing rasters, using blank fill", failures.len());
    }
    flatten(document, rasters)
}

/// Shared composition: identical for both export paths.
fn flatten(document: &FormDocument, rasters: &PageRasterCache) -> Result<Vec<u8>, FlattenError> {
    let mut out = Document::with_version("1.5");
    let pages_id = out.new_object_id();

    let font_id = out.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::with_capacity(document.pages().len());
    for page in document.pages() {
        let raster = rasters.get(page.number);
        let image_id = raster.map(|bitmap| out.add_object(image_xobject(bitmap)));

        let content = page_content(
            page.size.width_pt,
            page.size.height_pt,
            image_id.is_some(),
            document.fields().fields_on(page.number),
        );
        let content_id = out.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let mut resources = dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        };
        if let Some(image_id) = image_id {
            resources.set("XObject", dictionary! { "Bg" => image_id });
        }

        let page_id = out.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                page.size.width_pt.into(),
                page.size.height_pt.into(),
            ],
            "Resources" => resources,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    out.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = out.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    out.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    out.save_to(&mut bytes)?;
    Ok(bytes)
}

/// Uncompressed RGB image XObject from an RGBA raster (alpha discarded;
/// rasters are opaque page bitmaps).
fn image_xobject(bitmap: &RgbaImage) -> Stream {
    let mut rgb = Vec::with_capacity(bitmap.width() as usize * bitmap.height() as usize * 3);
    for pixel in bitmap.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
    }

    let dict: Dictionary = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => bitmap.width() as i64,
        "Height" => bitmap.height() as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };
    Stream::new(dict, rgb)
}

/// Content stream for one page: background first, then fields in z-order.
fn page_content(width: f32, height: f32, has_raster: bool, fields: &[Field]) -> String {
    let mut s = String::new();

    if has_raster {
        // Stretch the bitmap over the full page.
        let _ = writeln!(s, "q {width} 0 0 {height} 0 0 cm /Bg Do Q");
    } else {
        let _ = writeln!(s, "1 1 1 rg 0 0 {width} {height} re f");
    }

    for field in fields {
        draw_field(&mut s, field, height);
    }

    s
}

fn draw_field(s: &mut String, field: &Field, page_h: f32) {
    let r = field.rect;
    let font_size = export_font_size(&r);
    let icon = icon_size(&r, font_size);

    // White backing over the field area, like the editor's opaque widget.
    let _ = writeln!(
        s,
        "1 1 1 rg {} {} {} {} re f",
        r.left,
        page_h - r.bottom(),
        r.width,
        r.height
    );
    let _ = writeln!(s, "0 g 0 G 1 w");

    match &field.payload {
        FieldPayload::Text { content } => {
            let lines = wrap_text(content, r.width - WRAP_MARGIN, font_size);
            let _ = writeln!(s, "BT /F1 {font_size} Tf");
            for (i, line) in lines.iter().enumerate() {
                // Top-anchored: first baseline one font size below the top.
                let baseline = r.top + font_size + i as f32 * font_size * LINE_HEIGHT;
                let _ = writeln!(
                    s,
                    "1 0 0 1 {} {} Tm ({}) Tj",
                    r.left + TEXT_INSET,
                    page_h - baseline,
                    escape_pdf_string(line)
                );
            }
            let _ = writeln!(s, "ET");
        }
        FieldPayload::Checkbox { checked, label } => {
            let box_x = r.left + TEXT_INSET;
            let box_top = r.top + (r.height - icon) / 2.0;
            let _ = writeln!(s, "{} {} {} {} re S", box_x, page_h - box_top - icon, icon, icon);

            if *checked {
                let _ = writeln!(s, "{} w", icon * 0.1);
                let _ = writeln!(
                    s,
                    "{} {} m {} {} l S",
                    box_x + icon * 0.2,
                    page_h - (box_top + icon * 0.5),
                    box_x + icon * 0.4,
                    page_h - (box_top + icon * 0.7)
                );
                let _ = writeln!(
                    s,
                    "{} {} m {} {} l S",
                    box_x + icon * 0.4,
                    page_h - (box_top + icon * 0.7),
                    box_x + icon * 0.8,
                    page_h - (box_top + icon * 0.3)
                );
                let _ = writeln!(s, "1 w");
            }

            draw_middle_label(s, label, field, font_size, icon, page_h);
        }
        FieldPayload::Radio { checked, label, .. } => {
            let cx = r.left + TEXT_INSET + icon / 2.0;
            let cy = page_h - (r.top + r.height / 2.0);
            circle_path(s, cx, cy, icon / 2.0);
            let _ = writeln!(s, "S");

            if *checked {
                circle_path(s, cx, cy, icon / 4.0);
                let _ = writeln!(s, "f");
            }

            draw_middle_label(s, label, field, font_size, icon, page_h);
        }
        FieldPayload::Dropdown { selected, .. } => {
            // Only the current selection is flattened; the option list is
            // not enumerated in the output.
            let text = selected.as_deref().unwrap_or(DROPDOWN_PLACEHOLDER);
            let baseline = r.top + r.height / 2.0 + MIDDLE_BASELINE * font_size;
            let _ = writeln!(s, "BT /F1 {font_size} Tf");
            let _ = writeln!(
                s,
                "1 0 0 1 {} {} Tm ({}) Tj",
                r.left + TEXT_INSET,
                page_h - baseline,
                escape_pdf_string(text)
            );
            let _ = writeln!(s, "ET");
        }
    }
}

/// Kind label to the right of the icon, vertically centered.
fn draw_middle_label(
    s: &mut String,
    label: &str,
    field: &Field,
    font_size: f32,
    icon: f32,
    page_h: f32,
) {
    let r = field.rect;
    let baseline = r.top + r.height / 2.0 + MIDDLE_BASELINE * font_size;
    let _ = writeln!(s, "BT /F1 {font_size} Tf");
    let _ = writeln!(
        s,
        "1 0 0 1 {} {} Tm ({}) Tj",
        r.left + icon + 2.0 * TEXT_INSET,
        page_h - baseline,
        escape_pdf_string(label)
    );
    let _ = writeln!(s, "ET");
}

/// Outlined circle as four Bézier segments, in PDF coordinates.
fn circle_path(s: &mut String, cx: f32, cy: f32, radius: f32) {
    let k = radius * KAPPA;
    let _ = writeln!(s, "{} {} m", cx + radius, cy);
    let _ = writeln!(
        s,
        "{} {} {} {} {} {} c",
        cx + radius,
        cy + k,
        cx + k,
        cy + radius,
        cx,
        cy + radius
    );
    let _ = writeln!(
        s,
        "{} {} {} {} {} {} c",
        cx - k,
        cy + radius,
        cx - radius,
        cy + k,
        cx - radius,
        cy
    );
    let _ = writeln!(
        s,
        "{} {} {} {} {} {} c",
        cx - radius,
        cy - k,
        cx - k,
        cy - radius,
        cx,
        cy - radius
    );
    let _ = writeln!(
        s,
        "{} {} {} {} {} {} c",
        cx + k,
        cy - radius,
        cx + radius,
        cy - k,
        cx + radius,
        cy
    );
}

/// Word-wrap to the field's usable width using the average-glyph-width
/// estimate for Helvetica.
fn wrap_text(content: &str, avail_width: f32, font_size: f32) -> Vec<String> {
    let columns = ((avail_width / (AVG_GLYPH_WIDTH * font_size)).floor() as usize).max(1);
    let mut lines = Vec::new();
    for paragraph in content.split('\n') {
        if paragraph.is_empty() {
            lines.push(String::new());
            continue;
        }
        for wrapped in textwrap::wrap(paragraph, columns) {
            lines.push(wrapped.into_owned());
        }
    }
    lines
}

fn escape_pdf_string(text: &str) -> String {
    text.replace('\\', "\\\\").replace('(', "\\(").replace(')', "\\)")
}
