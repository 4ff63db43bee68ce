//! Integration tests for the sweep pipeline.
//!
//! Every fixture is built in memory (CSV text, `rust_xlsxwriter` workbooks,
//! `lopdf` documents) or in a `tempfile` directory, so these run offline
//! with no files checked into the repository.
//!
//! Run with:
//!   cargo test --test pipeline

use data_sweeper::{
    deduplicate, export, fill_missing, ingest, inspect, select_columns, sweep, sweep_batch,
    sweep_path, sweep_to_dir, Column, SweepError, SweepProgressCallback, SweepRequest, Table,
    TargetFormat, UploadedFile, Value, EXTRACTED_TEXT_COLUMN, MAX_PDF_ROWS,
};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn csv(name: &str, content: &str) -> UploadedFile {
    UploadedFile::from_bytes(name, content.as_bytes().to_vec())
}

fn sample_table() -> Table {
    Table::new(vec![
        Column::new(
            "id",
            vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(2)],
        ),
        Column::new(
            "price",
            vec![
                Value::Float(9.5),
                Value::Missing,
                Value::Float(-0.25),
                Value::Missing,
            ],
        ),
        Column::new(
            "city",
            vec![
                Value::Text("Paris".into()),
                Value::Text("Lyon, FR".into()),
                Value::Missing,
                Value::Text("Lyon, FR".into()),
            ],
        ),
        Column::new(
            "active",
            vec![
                Value::Bool(true),
                Value::Bool(false),
                Value::Bool(true),
                Value::Bool(false),
            ],
        ),
    ])
    .unwrap()
}

/// A PDF whose pages carry the given text; an empty string gives a page
/// with an empty content stream.
fn pdf_with_pages(texts: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in texts {
        let operations = if text.is_empty() {
            vec![]
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), Object::Integer(12)]),
                Operation::new("Td", vec![Object::Integer(72), Object::Integer(700)]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations }.encode().unwrap();
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
                Object::Integer(595),
                Object::Integer(842),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Number of bordered cells drawn on the single page of a PDF.
fn pdf_cell_count(pdf: &[u8]) -> usize {
    let doc = Document::load_mem(pdf).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 1, "grid should fit on one page");
    let page_id = *pages.values().next().unwrap();
    Content::decode(&doc.get_page_content(page_id).unwrap())
        .unwrap()
        .operations
        .iter()
        .filter(|op| op.operator == "re")
        .count()
}

// ── Ingest ───────────────────────────────────────────────────────────────────

#[test]
fn test_txt_is_unsupported() {
    let err = ingest(&csv("notes.txt", "a,b\n1,2\n")).unwrap_err();
    match err {
        SweepError::UnsupportedType { extension } => assert_eq!(extension, ".txt"),
        other => panic!("expected UnsupportedType, got {other}"),
    }

    let err = sweep(&csv("notes.txt", "a\n1\n"), &SweepRequest::default()).unwrap_err();
    assert!(err.to_string().contains(".txt"), "got: {err}");
}

#[test]
fn test_pdf_skips_pages_without_text() {
    let file = UploadedFile::from_bytes("doc.pdf", pdf_with_pages(&["Alpha", "", "Gamma"]));
    let table = ingest(&file).unwrap();

    assert_eq!(table.column_names(), vec![EXTRACTED_TEXT_COLUMN]);
    assert_eq!(table.n_rows(), 1);
    assert_eq!(
        table.column(EXTRACTED_TEXT_COLUMN).unwrap().values[0],
        Value::Text("Alpha\nGamma".into())
    );
}

#[test]
fn test_pdf_keeps_whitespace_only_pages() {
    let file = UploadedFile::from_bytes("doc.pdf", pdf_with_pages(&["Alpha", "  ", "Gamma"]));
    let table = ingest(&file).unwrap();
    assert_eq!(
        table.column(EXTRACTED_TEXT_COLUMN).unwrap().values[0],
        Value::Text("Alpha\n  \nGamma".into())
    );
}

#[test]
fn test_pdf_without_any_text_gives_empty_cell() {
    let file = UploadedFile::from_bytes("scan.pdf", pdf_with_pages(&["", ""]));
    let table = ingest(&file).unwrap();
    assert_eq!(table.n_rows(), 1);
    assert_eq!(
        table.column(EXTRACTED_TEXT_COLUMN).unwrap().values[0],
        Value::Text(String::new())
    );
}

#[test]
fn test_xlsx_ingest_infers_types() {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "qty").unwrap();
    sheet.write_string(0, 1, "ratio").unwrap();
    sheet.write_string(0, 2, "label").unwrap();
    sheet.write_number(1, 0, 1.0).unwrap();
    sheet.write_number(1, 1, 0.5).unwrap();
    sheet.write_string(1, 2, "a").unwrap();
    sheet.write_number(2, 0, 4.0).unwrap();
    sheet.write_string(2, 2, "b").unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    let table = ingest(&UploadedFile::from_bytes("book.xlsx", bytes)).unwrap();
    assert_eq!(table.column_names(), vec!["qty", "ratio", "label"]);
    assert_eq!(
        table.column("qty").unwrap().values,
        vec![Value::Int(1), Value::Int(4)]
    );
    assert_eq!(
        table.column("ratio").unwrap().values,
        vec![Value::Float(0.5), Value::Missing]
    );
    assert_eq!(
        table.column("label").unwrap().values,
        vec![Value::Text("a".into()), Value::Text("b".into())]
    );
}

// ── Round trips ──────────────────────────────────────────────────────────────

#[test]
fn test_csv_round_trip_keeps_columns_and_values() {
    let original = sample_table();
    let artifact = export(&original, TargetFormat::Csv, "sample.csv").unwrap();
    let back = ingest(&UploadedFile::from_bytes(
        artifact.file_name.clone(),
        artifact.bytes.clone(),
    ))
    .unwrap();

    assert_eq!(back.column_names(), original.column_names());
    assert_eq!(back.n_rows(), original.n_rows());
    for (a, b) in original.columns().iter().zip(back.columns()) {
        for (x, y) in a.values.iter().zip(&b.values) {
            match (x.as_f64(), y.as_f64()) {
                (Some(xf), Some(yf)) => assert_eq!(xf, yf, "column {}", a.name),
                _ => assert_eq!(x, y, "column {}", a.name),
            }
        }
    }
}

#[test]
fn test_xlsx_round_trip() {
    let original = sample_table();
    let artifact = export(&original, TargetFormat::Excel, "sample.csv").unwrap();
    assert_eq!(artifact.file_name, "sample.xlsx");

    let back = ingest(&UploadedFile::from_bytes(
        artifact.file_name.clone(),
        artifact.bytes.clone(),
    ))
    .unwrap();
    assert_eq!(back, original);
}

// ── Clean & select ───────────────────────────────────────────────────────────

#[test]
fn test_deduplicate_is_idempotent() {
    let (once, removed) = deduplicate(&sample_table());
    assert_eq!(removed, 1);
    let (twice, removed_again) = deduplicate(&once);
    assert_eq!(twice, once);
    assert_eq!(removed_again, 0);
}

#[test]
fn test_fill_missing_only_touches_missing_numeric_cells() {
    let original = sample_table();
    let (filled, report) = fill_missing(&original).unwrap();

    assert_eq!(report.cells_filled, 2);
    assert_eq!(filled.column("city"), original.column("city"));
    assert_eq!(filled.column("active"), original.column("active"));
    for (before, after) in original.columns().iter().zip(filled.columns()) {
        for (b, a) in before.values.iter().zip(&after.values) {
            if !b.is_missing() {
                assert_eq!(a, b);
            }
        }
    }
    // Mean of 9.5 and -0.25.
    assert_eq!(
        filled.column("price").unwrap().values[1],
        Value::Float(4.625)
    );
}

#[test]
fn test_select_all_columns_is_identity() {
    let t = sample_table();
    assert_eq!(select_columns(&t, &t.column_names()).unwrap(), t);
}

// ── PDF export ───────────────────────────────────────────────────────────────

#[test]
fn test_pdf_export_caps_at_ten_rows() {
    let rows = 15;
    let table = Table::new(vec![
        Column::new("n", (0..rows).map(Value::Int).collect()),
        Column::new("sq", (0..rows).map(|i| Value::Int(i * i)).collect()),
        Column::new(
            "tag",
            (0..rows).map(|i| Value::Text(format!("row {i}"))).collect(),
        ),
    ])
    .unwrap();

    let artifact = export(&table, TargetFormat::Pdf, "numbers.csv").unwrap();
    assert_eq!(artifact.file_name, "numbers.pdf");
    assert_eq!(artifact.mime_type, "application/pdf");
    assert!(artifact.bytes.starts_with(b"%PDF-"));
    assert_eq!(pdf_cell_count(&artifact.bytes), (MAX_PDF_ROWS + 1) * 3);
}

#[test]
fn test_pdf_export_rejects_characters_outside_latin1() {
    let table = Table::new(vec![Column::new("mood", vec![Value::Text("🙂".into())])]).unwrap();
    let err = export(&table, TargetFormat::Pdf, "moods.csv").unwrap_err();
    assert!(matches!(err, SweepError::Encoding { format: "PDF", .. }));
}

// ── Driver ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
}

impl RecordingCallback {
    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl SweepProgressCallback for RecordingCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.push(format!("start {total_files}"));
    }
    fn on_file_start(&self, index: usize, _total: usize, name: &str) {
        self.push(format!("file {index} {name}"));
    }
    fn on_file_complete(&self, index: usize, _total: usize, _artifact_len: usize) {
        self.push(format!("ok {index}"));
    }
    fn on_file_error(&self, index: usize, _total: usize, _error: &str) {
        self.push(format!("err {index}"));
    }
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        self.push(format!("done {success_count}/{total_files}"));
    }
}

#[test]
fn test_batch_continues_after_a_bad_file() {
    let recorder = Arc::new(RecordingCallback::default());
    let request = SweepRequest::builder()
        .remove_duplicates(true)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    let files = vec![
        csv("a.csv", "x,y\n1,2\n1,2\n"),
        csv("notes.txt", "hello"),
        csv("c.csv", "x,y\n3,4\n"),
    ];
    let report = sweep_batch(&files, &request);

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.succeeded().count(), 2);
    let failed: Vec<&str> = report.failed().map(|(name, _)| name).collect();
    assert_eq!(failed, vec!["notes.txt"]);
    assert_eq!(
        report.outcomes[0].result.as_ref().unwrap().clean_stats.duplicates_removed,
        1
    );

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "start 3",
            "file 0 a.csv",
            "ok 0",
            "file 1 notes.txt",
            "err 1",
            "file 2 c.csv",
            "ok 2",
            "done 2/3",
        ]
    );
}

#[test]
fn test_sweep_to_dir_writes_named_artifact() {
    let input_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let input = input_dir.path().join("sales.csv");
    std::fs::write(&input, "region,revenue\nNorth,10\nSouth,\nNorth,10\n").unwrap();

    let request = SweepRequest::builder()
        .remove_duplicates(true)
        .fill_missing(true)
        .visualize(true)
        .target(TargetFormat::Excel)
        .build()
        .unwrap();
    let (path, output) = sweep_to_dir(&input, out_dir.path().join("nested"), &request).unwrap();

    assert_eq!(path, out_dir.path().join("nested").join("sales.xlsx"));
    assert_eq!(std::fs::read(&path).unwrap(), output.artifact.bytes);
    assert!(out_dir.path().join("nested").join("sales_chart.png").exists());
    assert_eq!(output.table.n_rows(), 2);
    assert_eq!(
        output.table.column("revenue").unwrap().values,
        vec![Value::Int(10), Value::Float(10.0)]
    );

    // Only the two finished files remain; no temporaries are left behind.
    let names: Vec<String> = std::fs::read_dir(out_dir.path().join("nested"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 2, "unexpected files: {names:?}");
}

#[test]
fn test_sweep_path_missing_file() {
    let err = sweep_path("/no/such/dir/data.csv", &SweepRequest::default()).unwrap_err();
    assert!(matches!(err, SweepError::FileNotFound { .. }));
}

#[test]
fn test_inspect_reports_summary_and_preview() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.csv");
    let body: String = std::iter::once("n\n".to_string())
        .chain((0..20).map(|i| format!("{i}\n")))
        .collect();
    std::fs::write(&path, &body).unwrap();

    let info = inspect(&path, 5).unwrap();
    assert_eq!(info.summary.name, "big.csv");
    assert_eq!(info.summary.rows, 20);
    assert_eq!(info.summary.columns, 1);
    assert_eq!(info.summary.size_bytes, body.len());
    assert_eq!(info.preview.n_rows(), 5);
}
