//! Export: encode a table as CSV, XLSX or a PDF grid.
//!
//! Every format produces an in-memory [`ExportArtifact`]; writing it to disk
//! is the caller's business (see [`crate::sweep_to_dir`]).

use std::io::Cursor;

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::TargetFormat;
use crate::error::SweepError;
use crate::pipeline::input::derive_file_name;
use crate::pipeline::pdf_grid;
use crate::table::{Table, Value};

/// Encoded table, ready to download or write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportArtifact {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// `<source stem>.<format extension>`.
    pub file_name: String,
    pub mime_type: &'static str,
    pub format: TargetFormat,
}

impl ExportArtifact {
    /// Reader positioned at the start of the encoded bytes.
    pub fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encode `table` in `format`. `source_name` is the uploaded file's name;
/// it supplies the output stem and the PDF title.
pub fn export(
    table: &Table,
    format: TargetFormat,
    source_name: &str,
) -> Result<ExportArtifact, SweepError> {
    let bytes = match format {
        TargetFormat::Csv => to_csv(table)?,
        TargetFormat::Excel => to_xlsx(table)?,
        TargetFormat::Pdf => pdf_grid::render(table, source_name)?,
    };
    let artifact = ExportArtifact {
        bytes,
        file_name: derive_file_name(source_name, format.extension()),
        mime_type: format.mime_type(),
        format,
    };
    info!(
        "Exported {} as {} ({} bytes)",
        source_name,
        artifact.file_name,
        artifact.len()
    );
    Ok(artifact)
}

/// Header line then one line per row; missing cells become empty fields.
pub fn to_csv(table: &Table) -> Result<Vec<u8>, SweepError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(table.columns().iter().map(|c| c.name.as_str()))
        .map_err(|e| SweepError::encoding("CSV", e))?;
    for row in table.rows() {
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .map_err(|e| SweepError::encoding("CSV", e))?;
    }

    writer
        .into_inner()
        .map_err(|e| SweepError::encoding("CSV", e.error()))
}

fn xlsx_err(e: XlsxError) -> SweepError {
    SweepError::encoding("Excel", e)
}

/// Single worksheet with a bold header row; missing cells stay blank.
pub fn to_xlsx(table: &Table) -> Result<Vec<u8>, SweepError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    for (c, column) in table.columns().iter().enumerate() {
        let col = u16::try_from(c)
            .map_err(|_| SweepError::encoding("Excel", format!("too many columns ({c})")))?;
        sheet
            .write_string_with_format(0, col, &column.name, &header)
            .map_err(xlsx_err)?;

        for (r, value) in column.values.iter().enumerate() {
            let row = u32::try_from(r + 1)
                .map_err(|_| SweepError::encoding("Excel", format!("too many rows ({r})")))?;
            match value {
                Value::Missing => {}
                Value::Bool(b) => {
                    sheet.write_boolean(row, col, *b).map_err(xlsx_err)?;
                }
                Value::Int(i) => {
                    sheet.write_number(row, col, *i as f64).map_err(xlsx_err)?;
                }
                Value::Float(f) => {
                    sheet.write_number(row, col, *f).map_err(xlsx_err)?;
                }
                Value::Text(s) => {
                    sheet.write_string(row, col, s).map_err(xlsx_err)?;
                }
            }
        }
    }

    debug!(
        "Wrote {} rows × {} columns to worksheet",
        table.n_rows(),
        table.n_cols()
    );
    workbook.save_to_buffer().map_err(xlsx_err)
}
