//! A4 report with a title, a generation stamp and a paged table

use chrono::{DateTime, Local};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb,
};
use std::ops::Range;

use super::{ExportError, ExportRow, COLUMNS};

const TITLE: &str = "Reimbursement Report";

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_X: f32 = 14.0;

// Distances from the top edge, in mm
const TITLE_TOP: f32 = 15.0;
const STAMP_TOP: f32 = 25.0;
const TABLE_TOP_FIRST: f32 = 35.0;
const TABLE_TOP: f32 = 15.0;
const BOTTOM_MARGIN: f32 = 15.0;

const ROW_HEIGHT: f32 = 7.0;
const CELL_PADDING: f32 = 1.5;
const BODY_FONT_SIZE: f32 = 8.0;

/// Sums to the printable width (210 - 2 * 14)
const COLUMN_WIDTHS: [f32; 6] = [36.0, 30.0, 26.0, 20.0, 30.0, 40.0];

/// Rough Helvetica advance at 8pt
const CHAR_WIDTH: f32 = 1.45;

const HEADER_FILL: (u8, u8, u8) = (41, 128, 185);
const STRIPE_FILL: (u8, u8, u8) = (245, 245, 245);

pub fn render(rows: &[ExportRow], generated_at: DateTime<Local>) -> Result<Vec<u8>, ExportError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(TITLE, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");

    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?;

    for (index, range) in plan_pages(rows.len()).into_iter().enumerate() {
        let (layer, mut top) = if index == 0 {
            let layer = doc.get_page(first_page).get_layer(first_layer);
            set_fill(&layer, (0, 0, 0));
            layer.use_text(TITLE, 16.0, Mm(MARGIN_X), from_top(TITLE_TOP), &regular);
            layer.use_text(
                format!("Generated on: {}", generated_at.format("%-m/%-d/%Y, %-I:%M:%S %p")),
                10.0,
                Mm(MARGIN_X),
                from_top(STAMP_TOP),
                &regular,
            );
            (layer, TABLE_TOP_FIRST)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            (doc.get_page(page).get_layer(layer), TABLE_TOP)
        };

        draw_header_row(&layer, top, &bold);
        top += ROW_HEIGHT;

        for (i, row) in rows[range].iter().enumerate() {
            draw_body_row(&layer, top, row, i % 2 == 1, &regular);
            top += ROW_HEIGHT;
        }
    }

    doc.save_to_bytes().map_err(pdf_error)
}

/// Row ranges for each page; always at least one page so the header prints
fn plan_pages(row_count: usize) -> Vec<Range<usize>> {
    let first = rows_per_page(TABLE_TOP_FIRST);
    let rest = rows_per_page(TABLE_TOP);

    let mut pages = vec![0..row_count.min(first)];
    let mut start = pages[0].end;
    while start < row_count {
        let end = (start + rest).min(row_count);
        pages.push(start..end);
        start = end;
    }
    pages
}

/// Body rows that fit under the header between `table_top` and the bottom margin
fn rows_per_page(table_top: f32) -> usize {
    let usable = PAGE_HEIGHT - table_top - BOTTOM_MARGIN;
    ((usable / ROW_HEIGHT).floor() as usize).saturating_sub(1).max(1)
}

fn draw_header_row(layer: &PdfLayerReference, top: f32, font: &IndirectFontRef) {
    fill_row(layer, top, HEADER_FILL);
    set_fill(layer, (255, 255, 255));
    draw_cells(layer, top, &COLUMNS, font);
}

fn draw_body_row(
    layer: &PdfLayerReference,
    top: f32,
    row: &ExportRow,
    striped: bool,
    font: &IndirectFontRef,
) {
    if striped {
        fill_row(layer, top, STRIPE_FILL);
    }
    set_fill(layer, (0, 0, 0));
    draw_cells(layer, top, &row.cells(), font);
}

fn draw_cells(layer: &PdfLayerReference, top: f32, cells: &[&str], font: &IndirectFontRef) {
    let baseline = from_top(top + ROW_HEIGHT - 2.2);
    let mut x = MARGIN_X;
    for (cell, width) in cells.iter().zip(COLUMN_WIDTHS) {
        let text = fit_to_width(cell, width - 2.0 * CELL_PADDING);
        layer.use_text(text, BODY_FONT_SIZE, Mm(x + CELL_PADDING), baseline, font);
        x += width;
    }
}

fn fill_row(layer: &PdfLayerReference, top: f32, rgb: (u8, u8, u8)) {
    set_fill(layer, rgb);
    let width: f32 = COLUMN_WIDTHS.iter().sum();
    layer.add_rect(Rect::new(
        Mm(MARGIN_X),
        from_top(top + ROW_HEIGHT),
        Mm(MARGIN_X + width),
        from_top(top),
    ));
}

fn set_fill(layer: &PdfLayerReference, (r, g, b): (u8, u8, u8)) {
    layer.set_fill_color(Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    )));
}

/// PDF y runs bottom-up
fn from_top(mm: f32) -> Mm {
    Mm(PAGE_HEIGHT - mm)
}

/// Truncate with an ellipsis when the text would overflow its cell
fn fit_to_width(text: &str, width_mm: f32) -> String {
    let max_chars = (width_mm / CHAR_WIDTH).floor() as usize;
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

fn pdf_error<E: std::fmt::Debug>(e: E) -> ExportError {
    ExportError::Pdf(format!("{:?}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::sample_rows;

    #[test]
    fn test_pages_cover_every_row_once() {
        for n in [0, 1, 33, 34, 35, 120] {
            let pages = plan_pages(n);
            let covered: usize = pages.iter().map(|r| r.len()).sum();
            assert_eq!(covered, n, "rows {}", n);

            for pair in pages.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
        }
    }

    #[test]
    fn test_empty_view_gets_one_page() {
        assert_eq!(plan_pages(0), vec![0..0]);
    }

    #[test]
    fn test_long_tables_flow_onto_more_pages() {
        let first = rows_per_page(TABLE_TOP_FIRST);
        assert_eq!(plan_pages(first).len(), 1);
        assert_eq!(plan_pages(first + 1).len(), 2);
    }

    #[test]
    fn test_fit_to_width() {
        assert_eq!(fit_to_width("Fuel", 30.0), "Fuel");
        let cut = fit_to_width("A very long expense category name", 20.0);
        assert!(cut.ends_with("..."));
        assert!(cut.chars().count() <= (20.0 / CHAR_WIDTH) as usize);
    }

    #[test]
    fn test_render_produces_pdf() {
        let bytes = render(&sample_rows(80), Local::now()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
