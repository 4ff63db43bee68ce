//! Ingest: parse an uploaded file into a [`Table`], dispatching on extension.
//!
//! * `.csv`  — header row + comma-separated records, column types inferred
//! * `.xlsx` — first worksheet, first row as header
//! * `.pdf`  — text of every page that has any, joined with `\n`, wrapped
//!   as one cell of an `Extracted Text` column
//!
//! PDF ingestion does not attempt to recover tables from the page layout.
//! A PDF always becomes a 1 × 1 table; this is a known limitation.

use std::collections::HashSet;
use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, DataType, Reader, Xlsx};
use chrono::{NaiveDateTime, Timelike};
use lopdf::Document;
use once_cell::sync::Lazy;
use tracing::{debug, info, warn};

use super::input::{FileKind, UploadedFile};
use crate::error::SweepError;
use crate::table::{Column, Table, Value};

/// Column name used for text extracted from a PDF.
pub const EXTRACTED_TEXT_COLUMN: &str = "Extracted Text";

/// Cell strings read as missing values.
static NA_VALUES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
        "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
    ]
    .into_iter()
    .collect()
});

/// Parse an uploaded file into a table.
///
/// # Errors
/// * [`SweepError::UnsupportedType`] when the extension is not csv/xlsx/pdf
/// * [`SweepError::Parse`] when the content is malformed for its format
pub fn ingest(file: &UploadedFile) -> Result<Table, SweepError> {
    let kind = file.kind().ok_or_else(|| SweepError::UnsupportedType {
        extension: if file.extension().is_empty() {
            "(no extension)".to_string()
        } else {
            file.extension().to_string()
        },
    })?;

    info!("Ingesting {} as {:?}", file.name(), kind);
    let table = match kind {
        FileKind::Csv => parse_csv(file.bytes())?,
        FileKind::Xlsx => parse_xlsx(file.bytes())?,
        FileKind::Pdf => parse_pdf(file.bytes())?,
    };
    info!(
        "Ingested {}: {} rows × {} columns",
        file.name(),
        table.n_rows(),
        table.n_cols()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn parse_csv(bytes: &[u8]) -> Result<Table, SweepError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| SweepError::parse("CSV", e))?
        .clone();
    if headers.is_empty() {
        return Err(SweepError::parse("CSV", "No columns to parse from file"));
    }
    let width = headers.len();

    let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); width];
    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|e| SweepError::parse("CSV", e))?;
        if record.len() > width {
            let line = record
                .position()
                .map(|p| p.line())
                .unwrap_or(row_no as u64 + 2);
            return Err(SweepError::parse(
                "CSV",
                format!(
                    "Expected {width} fields in line {line}, saw {}",
                    record.len()
                ),
            ));
        }
        for (col, cells) in raw.iter_mut().enumerate() {
            cells.push(record.get(col).map(str::to_string));
        }
    }

    let names = normalise_headers(headers.iter().map(str::to_string));
    let columns = names
        .into_iter()
        .zip(raw)
        .map(|(name, cells)| infer_column(name, cells))
        .collect();
    Table::new(columns)
}

fn is_na(s: &str) -> bool {
    NA_VALUES.contains(s)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim() {
        "True" | "TRUE" | "true" => Some(true),
        "False" | "FALSE" | "false" => Some(false),
        _ => None,
    }
}

/// Pick the narrowest type that every present cell of a CSV column fits.
fn infer_column(name: String, cells: Vec<Option<String>>) -> Column {
    let present: Vec<Option<&str>> = cells
        .iter()
        .map(|c| c.as_deref().filter(|s| !is_na(s)))
        .collect();

    let values = if all_present(&present, |s| s.trim().parse::<i64>().is_ok()) {
        map_present(&present, |s| {
            s.trim().parse().map(Value::Int).unwrap_or(Value::Missing)
        })
    } else if all_present(&present, |s| s.trim().parse::<f64>().is_ok()) {
        map_present(&present, |s| {
            s.trim().parse().map(Value::Float).unwrap_or(Value::Missing)
        })
    } else if all_present(&present, |s| parse_bool(s).is_some()) {
        map_present(&present, |s| {
            parse_bool(s).map(Value::Bool).unwrap_or(Value::Missing)
        })
    } else {
        map_present(&present, |s| Value::Text(s.to_string()))
    };
    Column::new(name, values)
}

fn all_present(present: &[Option<&str>], pred: impl Fn(&str) -> bool) -> bool {
    present.iter().flatten().all(|&s| pred(s))
}

fn map_present(present: &[Option<&str>], f: impl Fn(&str) -> Value) -> Vec<Value> {
    present
        .iter()
        .map(|c| c.map(&f).unwrap_or(Value::Missing))
        .collect()
}

/// Give blank headers a positional name and make repeated names unique.
fn normalise_headers(raw: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    raw.into_iter()
        .enumerate()
        .map(|(i, h)| {
            let base = if h.trim().is_empty() {
                format!("Unnamed: {i}")
            } else {
                h
            };
            let mut name = base.clone();
            let mut k = 1;
            while used.contains(&name) {
                name = format!("{base}.{k}");
                k += 1;
            }
            used.insert(name.clone());
            name
        })
        .collect()
}

// ---------------------------------------------------------------------------
// XLSX
// ---------------------------------------------------------------------------

fn parse_xlsx(bytes: &[u8]) -> Result<Table, SweepError> {
    let mut workbook: Xlsx<Cursor<&[u8]>> =
        open_workbook_from_rs(Cursor::new(bytes)).map_err(|e| SweepError::parse("Excel", e))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SweepError::parse("Excel", "workbook has no worksheet"))?
        .map_err(|e| SweepError::parse("Excel", e))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        debug!("First worksheet is empty");
        return Ok(Table::default());
    };

    let names = normalise_headers(header.iter().map(|cell| match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }));

    let mut columns: Vec<Vec<Value>> = vec![Vec::new(); names.len()];
    for row in rows {
        for (col, cell) in columns.iter_mut().zip(row) {
            col.push(cell_value(cell));
        }
    }

    let columns = names
        .into_iter()
        .zip(columns)
        .map(|(name, values)| unify_column(name, values))
        .collect();
    Table::new(columns)
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Missing,
        Data::Int(i) => Value::Int(*i),
        Data::Float(f) => Value::Float(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) if s.is_empty() => Value::Missing,
        Data::String(s) => Value::Text(s.clone()),
        Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_datetime() {
            Some(dt) => Value::Text(format_datetime(&dt)),
            None => Value::Text(cell.to_string()),
        },
        other => Value::Text(other.to_string()),
    }
}

/// `YYYY-MM-DD` for midnight, `YYYY-MM-DD HH:MM:SS` otherwise.
fn format_datetime(dt: &NaiveDateTime) -> String {
    if dt.time().num_seconds_from_midnight() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Give a spreadsheet column one type.
///
/// Spreadsheets store every number as a float; a numeric column whose values
/// are all integral is read back as integers. A column mixing text with
/// other values becomes text.
fn unify_column(name: String, values: Vec<Value>) -> Column {
    let numeric = values.iter().all(|v| v.is_numeric() || v.is_missing());
    if numeric {
        let integral = values.iter().all(|v| match v {
            Value::Float(f) => f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15,
            _ => true,
        });
        let values = if integral {
            values
                .into_iter()
                .map(|v| match v {
                    Value::Float(f) => Value::Int(f as i64),
                    other => other,
                })
                .collect()
        } else {
            values
        };
        return Column::new(name, values);
    }

    if values
        .iter()
        .all(|v| matches!(v, Value::Bool(_) | Value::Missing))
    {
        return Column::new(name, values);
    }

    let values = values
        .into_iter()
        .map(|v| match v {
            Value::Missing => Value::Missing,
            Value::Text(s) => Value::Text(s),
            other => Value::Text(other.to_string()),
        })
        .collect();
    Column::new(name, values)
}

// ---------------------------------------------------------------------------
// PDF
// ---------------------------------------------------------------------------

fn parse_pdf(bytes: &[u8]) -> Result<Table, SweepError> {
    let document = Document::load_mem(bytes).map_err(|e| SweepError::parse("PDF", e))?;
    if document.trailer.get(b"Encrypt").is_ok() {
        return Err(SweepError::parse("PDF", "document is encrypted"));
    }

    let pages = document.get_pages();
    let mut texts: Vec<String> = Vec::with_capacity(pages.len());
    for page_num in pages.keys() {
        match document.extract_text(&[*page_num]) {
            Ok(text) => {
                // Extraction ends every text block with a line break.
                let text = text.trim_end_matches(['\r', '\n']);
                if text.is_empty() {
                    debug!("Page {page_num} has no extractable text, skipping");
                } else {
                    texts.push(text.to_string());
                }
            }
            Err(e) => warn!("Text extraction failed on page {page_num}, skipping: {e}"),
        }
    }
    debug!("Extracted text from {}/{} pages", texts.len(), pages.len());

    Table::new(vec![Column::new(
        EXTRACTED_TEXT_COLUMN,
        vec![Value::Text(texts.join("\n"))],
    )])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv_file(content: &str) -> UploadedFile {
        UploadedFile::from_bytes("data.csv", content.as_bytes().to_vec())
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ingest(&UploadedFile::from_bytes("notes.txt", b"hi".to_vec())).unwrap_err();
        match err {
            SweepError::UnsupportedType { extension } => assert_eq!(extension, ".txt"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_csv_type_inference() {
        let t = ingest(&csv_file(
            "id,price,name,active\n1,2.5,apple,true\n2,,pear,False\n3,4,NA,TRUE\n",
        ))
        .unwrap();
        assert_eq!(t.column_names(), vec!["id", "price", "name", "active"]);
        assert_eq!(t.n_rows(), 3);
        assert_eq!(
            t.column("id").unwrap().values,
            vec![Value::Int(1), Value::Int(2), Value::Int(3)]
        );
        assert_eq!(
            t.column("price").unwrap().values,
            vec![Value::Float(2.5), Value::Missing, Value::Float(4.0)]
        );
        assert_eq!(t.column("name").unwrap().values[2], Value::Missing);
        assert_eq!(t.column("active").unwrap().values[1], Value::Bool(false));
    }

    #[test]
    fn test_csv_mixed_column_is_text() {
        let t = ingest(&csv_file("code\n10\nA7\n")).unwrap();
        assert_eq!(
            t.column("code").unwrap().values,
            vec![Value::Text("10".into()), Value::Text("A7".into())]
        );
    }

    #[test]
    fn test_csv_short_rows_padded_long_rows_rejected() {
        let t = ingest(&csv_file("a,b,c\n1,2\n")).unwrap();
        assert_eq!(t.column("c").unwrap().values, vec![Value::Missing]);

        let err = ingest(&csv_file("a,b\n1,2\n3,4,5\n")).unwrap_err();
        assert!(matches!(err, SweepError::Parse { format: "CSV", .. }));
        assert!(err.to_string().contains("saw 3"), "got: {err}");
    }

    #[test]
    fn test_csv_empty_file_is_parse_error() {
        let err = ingest(&csv_file("")).unwrap_err();
        assert!(matches!(err, SweepError::Parse { .. }));
    }

    #[test]
    fn test_csv_header_only_has_no_rows() {
        let t = ingest(&csv_file("a,b\n")).unwrap();
        assert_eq!(t.n_cols(), 2);
        assert_eq!(t.n_rows(), 0);
    }

    #[test]
    fn test_csv_bom_and_header_normalisation() {
        let t = ingest(&csv_file("\u{FEFF}x,,x,x\n1,2,3,4\n")).unwrap();
        assert_eq!(t.column_names(), vec!["x", "Unnamed: 1", "x.1", "x.2"]);
    }

    #[test]
    fn test_csv_invalid_utf8() {
        let f = UploadedFile::from_bytes("bad.csv", b"a\n\xff\xfe\n".to_vec());
        assert!(matches!(ingest(&f), Err(SweepError::Parse { .. })));
    }

    #[test]
    fn test_xlsx_garbage_is_parse_error() {
        let f = UploadedFile::from_bytes("book.xlsx", b"not a zip archive".to_vec());
        assert!(matches!(
            ingest(&f),
            Err(SweepError::Parse { format: "Excel", .. })
        ));
    }

    #[test]
    fn test_pdf_garbage_is_parse_error() {
        let f = UploadedFile::from_bytes("doc.pdf", b"hello".to_vec());
        assert!(matches!(
            ingest(&f),
            Err(SweepError::Parse { format: "PDF", .. })
        ));
    }

    #[test]
    fn test_xlsx_date_cells_become_date_strings() {
        use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let date_fmt = Format::new().set_num_format("yyyy-mm-dd");
        let stamp_fmt = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
        sheet.write_string(0, 0, "when").unwrap();
        let day = ExcelDateTime::from_ymd(2024, 1, 15).unwrap();
        sheet.write_datetime_with_format(1, 0, &day, &date_fmt).unwrap();
        let stamp = ExcelDateTime::from_ymd(2024, 3, 2)
            .unwrap()
            .and_hms(14, 30, 0)
            .unwrap();
        sheet.write_datetime_with_format(2, 0, &stamp, &stamp_fmt).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let t = ingest(&UploadedFile::from_bytes("dates.xlsx", bytes)).unwrap();
        assert_eq!(
            t.column("when").unwrap().values,
            vec![
                Value::Text("2024-01-15".into()),
                Value::Text("2024-03-02 14:30:00".into()),
            ]
        );
    }

    #[test]
    fn test_unify_column_integral_floats_become_ints() {
        let c = unify_column(
            "n".into(),
            vec![Value::Float(1.0), Value::Missing, Value::Float(3.0)],
        );
        assert_eq!(c.values, vec![Value::Int(1), Value::Missing, Value::Int(3)]);

        let c = unify_column("f".into(), vec![Value::Float(1.5), Value::Float(3.0)]);
        assert_eq!(c.values, vec![Value::Float(1.5), Value::Float(3.0)]);
    }

    #[test]
    fn test_unify_column_mixed_becomes_text() {
        let c = unify_column(
            "m".into(),
            vec![Value::Text("a".into()), Value::Int(2), Value::Missing],
        );
        assert_eq!(
            c.values,
            vec![Value::Text("a".into()), Value::Text("2".into()), Value::Missing]
        );
    }
}
