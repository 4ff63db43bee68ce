//! PDF export: a titled grid of bordered cells on A4 pages.
//!
//! The grid shows the header row and at most [`MAX_PDF_ROWS`] data rows.
//! Cells are 40 mm wide and 10 mm tall, text is set in the built-in
//! Helvetica font with `WinAnsiEncoding`, so every character must fit in a
//! single Latin-1 byte. Rows that would cross the bottom margin start a new
//! page.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tracing::debug;

use crate::error::SweepError;
use crate::table::{Table, Value};

/// Data rows rendered at most; the rest are omitted.
pub const MAX_PDF_ROWS: usize = 10;

// Geometry in PDF points (1 mm ≈ 2.835 pt).
const PAGE_W: i64 = 595;
const PAGE_H: i64 = 842;
const MARGIN: i64 = 28;
const BOTTOM_MARGIN: i64 = 43;
const TITLE_W: i64 = 567;
const CELL_W: i64 = 113;
const ROW_H: i64 = 28;
const PAD: i64 = 3;
const FONT_SIZE: i64 = 12;
/// Average Helvetica advance as a fraction of the font size.
const GLYPH_EM: f64 = 0.5;

/// Encode `text` as Latin-1, failing on the first character outside it.
fn latin1(text: &str) -> Result<Vec<u8>, SweepError> {
    text.chars()
        .map(|ch| {
            u8::try_from(u32::from(ch)).map_err(|_| {
                SweepError::encoding(
                    "PDF",
                    format!("character '{ch}' (U+{:04X}) is outside Latin-1", u32::from(ch)),
                )
            })
        })
        .collect()
}

fn text_width(bytes: &[u8]) -> i64 {
    (bytes.len() as f64 * FONT_SIZE as f64 * GLYPH_EM).round() as i64
}

/// Truncate so the text fits between the cell's padding.
fn fit(mut bytes: Vec<u8>, width: i64) -> Vec<u8> {
    let max = ((width - 2 * PAD) as f64 / (FONT_SIZE as f64 * GLYPH_EM)).floor() as usize;
    bytes.truncate(max);
    bytes
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Missing => "nan".to_string(),
        other => other.to_string(),
    }
}

/// Lays out cells top-down, starting a new page when a row would not fit.
struct GridWriter {
    done: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    /// Distance from the top edge of the current page.
    y: i64,
}

impl GridWriter {
    fn new() -> Self {
        Self {
            done: Vec::new(),
            current: Vec::new(),
            y: MARGIN,
        }
    }

    fn ensure_room(&mut self, h: i64) {
        if self.y + h > PAGE_H - BOTTOM_MARGIN {
            self.done.push(std::mem::take(&mut self.current));
            self.y = MARGIN;
        }
    }

    fn text(&mut self, x: i64, bytes: Vec<u8>) {
        let baseline = PAGE_H - (self.y + ROW_H / 2 + FONT_SIZE * 3 / 10);
        self.current.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), Object::Integer(FONT_SIZE)]),
            Operation::new("Td", vec![Object::Integer(x), Object::Integer(baseline)]),
            Operation::new("Tj", vec![Object::string_literal(bytes)]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn bordered_cell(&mut self, x: i64, bytes: Vec<u8>) {
        self.current.extend([
            Operation::new(
                "re",
                vec![
                    Object::Integer(x),
                    Object::Integer(PAGE_H - self.y - ROW_H),
                    Object::Integer(CELL_W),
                    Object::Integer(ROW_H),
                ],
            ),
            Operation::new("S", vec![]),
        ]);
        self.text(x + PAD, fit(bytes, CELL_W));
    }

    fn title(&mut self, bytes: Vec<u8>) {
        let bytes = fit(bytes, TITLE_W);
        let x = MARGIN + (TITLE_W - text_width(&bytes)) / 2;
        self.text(x, bytes);
        // Title line plus a blank line of the same height.
        self.y += 2 * ROW_H;
    }

    fn row(&mut self, cells: Vec<Vec<u8>>) {
        self.ensure_room(ROW_H);
        for (i, bytes) in cells.into_iter().enumerate() {
            self.bordered_cell(MARGIN + i as i64 * CELL_W, bytes);
        }
        self.y += ROW_H;
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        self.done.push(self.current);
        self.done
    }
}

/// Lay out the grid into per-page operation lists.
fn layout(
    title: &str,
    header: &[String],
    rows: &[Vec<String>],
) -> Result<Vec<Vec<Operation>>, SweepError> {
    let mut writer = GridWriter::new();
    writer.title(latin1(title)?);
    writer.row(
        header
            .iter()
            .map(|h| latin1(h))
            .collect::<Result<Vec<_>, _>>()?,
    );
    for row in rows {
        writer.row(
            row.iter()
                .map(|c| latin1(c))
                .collect::<Result<Vec<_>, _>>()?,
        );
    }
    Ok(writer.finish())
}

/// Render the first [`MAX_PDF_ROWS`] rows of `table` as a PDF document.
pub fn render(table: &Table, source_name: &str) -> Result<Vec<u8>, SweepError> {
    let shown = table.n_rows().min(MAX_PDF_ROWS);
    if table.n_rows() > shown {
        debug!(
            "PDF export shows {shown} of {} rows, {} omitted",
            table.n_rows(),
            table.n_rows() - shown
        );
    }

    let rows: Vec<Vec<String>> = table
        .head(shown)
        .rows()
        .map(|row| row.into_iter().map(cell_text).collect())
        .collect();
    let pages = layout(
        &format!("Data Table: {source_name}"),
        &table.column_names(),
        &rows,
    )?;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations }
            .encode()
            .map_err(|e| SweepError::encoding("PDF", e))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_W),
                Object::Integer(PAGE_H),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| SweepError::encoding("PDF", e))?;
    debug!("PDF grid: {} rows × {} columns", shown, table.n_cols());
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn count(ops: &[Operation], op: &str) -> usize {
        ops.iter().filter(|o| o.operator == op).count()
    }

    fn first_page_ops(pdf: &[u8]) -> Vec<Operation> {
        let doc = Document::load_mem(pdf).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = *pages.values().next().unwrap();
        Content::decode(&doc.get_page_content(page_id).unwrap())
            .unwrap()
            .operations
    }

    fn numbered(n: i64) -> Table {
        Table::new(vec![
            Column::new("n", (0..n).map(Value::Int).collect()),
            Column::new("half", (0..n).map(|i| Value::Float(i as f64 / 2.0)).collect()),
        ])
        .unwrap()
    }

    #[test]
    fn test_pdf_caps_rows_at_ten() {
        let pdf = render(&numbered(15), "nums.csv").unwrap();
        let ops = first_page_ops(&pdf);
        // Header plus ten data rows, two cells each.
        assert_eq!(count(&ops, "re"), 11 * 2);
        // Title plus one text run per cell.
        assert_eq!(count(&ops, "Tj"), 1 + 11 * 2);
    }

    #[test]
    fn test_pdf_short_table_shows_every_row() {
        let ops = first_page_ops(&render(&numbered(3), "nums.csv").unwrap());
        assert_eq!(count(&ops, "re"), 4 * 2);
    }

    #[test]
    fn test_pdf_title_and_missing_text() {
        let t = Table::new(vec![Column::new("v", vec![Value::Missing])]).unwrap();
        let ops = first_page_ops(&render(&t, "gaps.csv").unwrap());
        let texts: Vec<Vec<u8>> = ops
            .iter()
            .filter(|o| o.operator == "Tj")
            .map(|o| o.operands[0].as_str().unwrap().to_vec())
            .collect();
        assert_eq!(texts[0], b"Data Table: gaps.csv");
        assert_eq!(texts[1], b"v");
        assert_eq!(texts[2], b"nan");
    }

    #[test]
    fn test_pdf_rejects_non_latin1() {
        let t = Table::new(vec![Column::new("city", vec![Value::Text("東京".into())])]).unwrap();
        match render(&t, "cities.csv").unwrap_err() {
            SweepError::Encoding { format, detail } => {
                assert_eq!(format, "PDF");
                assert!(detail.contains('東'));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_latin1_accepts_accents() {
        assert_eq!(latin1("café").unwrap(), vec![b'c', b'a', b'f', 0xE9]);
    }

    #[test]
    fn test_long_text_is_truncated_to_cell() {
        let fitted = fit(vec![b'x'; 200], CELL_W);
        assert!(text_width(&fitted) <= CELL_W - 2 * PAD);
        assert!(!fitted.is_empty());
    }

    #[test]
    fn test_layout_breaks_pages() {
        let header = vec!["a".to_string()];
        let rows: Vec<Vec<String>> = (0..60).map(|i| vec![i.to_string()]).collect();
        let pages = layout("t", &header, &rows).unwrap();
        assert!(pages.len() > 1);
        let cells: usize = pages.iter().map(|p| count(p, "re")).sum();
        assert_eq!(cells, 61);
    }
}
