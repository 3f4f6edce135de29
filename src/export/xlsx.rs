//! XLSX writer
//!
//! Same columns as the CSV export, plus workbook niceties: a bold shaded
//! header, clickable `file:///` links, date-typed timestamp cells, and
//! autofitted columns.

use std::path::Path;

use rust_xlsxwriter::{
    Color, ExcelDateTime, Format, FormatAlign, FormatBorder, Url, Workbook,
};

use crate::error::ExportError;

use super::{CancelFlag, ExportRow, COLUMNS};

pub(super) fn write_xlsx(
    path: &Path,
    rows: &[ExportRow],
    cancel: &CancelFlag,
) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_background_color(Color::RGB(0xD9D9D9))
        .set_border(FormatBorder::Thin);
    let body_format = Format::new().set_border(FormatBorder::Thin);
    let date_format = Format::new()
        .set_num_format("yyyy-mm-dd hh:mm:ss")
        .set_border(FormatBorder::Thin);

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Entries")?;

    for (col, title) in COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &header_format)?;
    }

    for (i, row) in rows.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }
        let r = (i + 1) as u32;

        let texts = [
            &row.id,
            &row.title,
            &row.category,
            &row.material,
            &row.surface,
            &row.description,
            &row.city,
            &row.district,
            &row.creator_hash,
        ];
        for (col, text) in texts.iter().enumerate() {
            worksheet.write_string_with_format(r, col as u16, text.as_str(), &body_format)?;
        }

        worksheet.write_string_with_format(r, 9, &row.near_path, &body_format)?;
        write_link(worksheet, r, 10, &row.near_path, &body_format)?;
        worksheet.write_string_with_format(r, 11, &row.far_path, &body_format)?;
        write_link(worksheet, r, 12, &row.far_path, &body_format)?;

        write_millis(worksheet, r, 13, row.created_at, &date_format)?;
        write_millis(worksheet, r, 14, row.updated_at, &date_format)?;
    }

    worksheet.autofit();
    workbook.save(path)?;
    Ok(())
}

fn write_link(
    worksheet: &mut rust_xlsxwriter::Worksheet,
    row: u32,
    col: u16,
    path: &str,
    blank_format: &Format,
) -> Result<(), ExportError> {
    if path.trim().is_empty() {
        worksheet.write_string_with_format(row, col, "", blank_format)?;
    } else {
        let url = Url::new(format!("file:///{path}")).set_text("open");
        worksheet.write_url(row, col, url)?;
    }
    Ok(())
}

fn write_millis(
    worksheet: &mut rust_xlsxwriter::Worksheet,
    row: u32,
    col: u16,
    millis: i64,
    format: &Format,
) -> Result<(), ExportError> {
    let datetime = ExcelDateTime::from_timestamp(millis / 1000)?;
    worksheet.write_datetime_with_format(row, col, &datetime, format)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_workbook_written_with_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let rows = vec![ExportRow {
            id: "id-1".to_string(),
            title: "Mural".to_string(),
            category: "غرافيتي".to_string(),
            material: String::new(),
            surface: String::new(),
            description: String::new(),
            city: "Berlin".to_string(),
            district: String::new(),
            creator_hash: "abc123".to_string(),
            near_path: "/photos/a near.jpg".to_string(),
            far_path: String::new(),
            created_at: 1_700_000_000_000,
            updated_at: 1_700_000_000_000,
        }];

        write_xlsx(&path, &rows, &CancelFlag::new()).unwrap();
        assert!(path.exists());
        // XLSX containers start with the PK zip signature
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_header_only_workbook() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");
        write_xlsx(&path, &[], &CancelFlag::new()).unwrap();
        assert!(path.exists());
    }
}
