//! Integration tests for workbook output, read back with calamine

use amsreport_core::{CellValue, EnvironmentWorkbook, HighlightSet, SheetData, Table, WorkbookWriter};
use amsreport_render::{ExcelWorkbookWriter, RetryPolicy};
use calamine::{open_workbook, open_workbook_from_rs, Data, Reader, Xlsx};
use pretty_assertions::assert_eq;
use std::io::{Cursor, Read};
use std::time::Duration;
use zip::ZipArchive;

fn all_data() -> Table {
    Table::from_rows(
        &["InstanceId", "Max CPU (%)", "Engine", "Date_Report", "Environment"],
        vec![
            vec!["i-1".into(), 5.into(), "mysql".into(), "11-18-2025".into(), "Patikar".into()],
            vec!["i-2".into(), 40.into(), CellValue::Empty, "11-19-2025".into(), "Patikar".into()],
        ],
    )
}

fn workbook() -> EnvironmentWorkbook {
    let table = all_data();
    let mut highlights = HighlightSet::new();
    highlights.insert(0, "Max CPU (%)");

    let first_date = Table::from_rows(
        &["InstanceId", "Max CPU (%)", "Engine", "Date_Report", "Environment"],
        vec![table.rows()[0].clone()],
    );
    let mut date_highlights = HighlightSet::new();
    date_highlights.insert(0, "Max CPU (%)");

    EnvironmentWorkbook {
        environment: "Patikar".into(),
        file_name: "Patikar_Consolidated.xlsx".into(),
        sheets: vec![
            SheetData {
                name: "All_Data".into(),
                table,
                highlights,
                highlight_columns: vec!["Max CPU (%)".into()],
            },
            SheetData {
                name: "11_18_2025".into(),
                table: first_date,
                highlights: date_highlights,
                highlight_columns: vec!["Max CPU (%)".into()],
            },
        ],
    }
}

#[test]
fn sheets_and_values_round_trip() {
    let bytes = ExcelWorkbookWriter::new().render_to_bytes(&workbook()).unwrap();
    let mut book: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();

    assert_eq!(book.sheet_names(), vec!["All_Data".to_string(), "11_18_2025".to_string()]);

    let range = book.worksheet_range("All_Data").unwrap();
    assert_eq!(range.get_size(), (3, 5));
    assert_eq!(range.get_value((0, 1)), Some(&Data::String("Max CPU (%)".into())));
    assert_eq!(range.get_value((1, 1)), Some(&Data::Float(5.0)));
    assert_eq!(range.get_value((2, 0)), Some(&Data::String("i-2".into())));
    assert_eq!(range.get_value((2, 2)), Some(&Data::Empty));
    assert_eq!(range.get_value((2, 4)), Some(&Data::String("Patikar".into())));

    let dated = book.worksheet_range("11_18_2025").unwrap();
    assert_eq!(dated.get_size(), (2, 5));
    assert_eq!(dated.get_value((1, 3)), Some(&Data::String("11-18-2025".into())));
}

#[test]
fn rendering_is_deterministic() {
    let writer = ExcelWorkbookWriter::new();
    let first = writer.render_to_bytes(&workbook()).unwrap();
    let second = writer.render_to_bytes(&workbook()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn writes_into_output_dir_and_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("Consolidated_Reports");
    let writer = ExcelWorkbookWriter::new()
        .output_dir(&output)
        .retry(RetryPolicy::new(1, Duration::ZERO));

    let path = writer.write_workbook(&workbook()).unwrap();
    assert_eq!(path, output.join("Patikar_Consolidated.xlsx"));
    let first = std::fs::read(&path).unwrap();

    let again = writer.write_workbook(&workbook()).unwrap();
    assert_eq!(again, path);
    assert_eq!(std::fs::read(&path).unwrap(), first);

    let mut book: Xlsx<_> = open_workbook(&path).unwrap();
    let range = book.worksheet_range("All_Data").unwrap();
    assert_eq!(range.height(), 3);
}

fn package_part(bytes: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut xml = String::new();
    part.read_to_string(&mut xml).unwrap();
    xml
}

/// Style index (`s` attribute) of a cell, `None` for unstyled cells
fn cell_style(sheet_xml: &str, cell: &str) -> Option<usize> {
    let start = sheet_xml.find(&format!("<c r=\"{cell}\"")).unwrap();
    let tag = &sheet_xml[start..start + sheet_xml[start..].find('>').unwrap()];
    let at = tag.find(" s=\"")? + 4;
    let len = tag[at..].find('"').unwrap();
    Some(tag[at..at + len].parse().unwrap())
}

/// `fillId` of every cell format, in index order
fn xf_fill_ids(styles_xml: &str) -> Vec<usize> {
    let section = &styles_xml[styles_xml.find("<cellXfs").unwrap()..styles_xml.find("</cellXfs>").unwrap()];
    section
        .split("<xf ")
        .skip(1)
        .map(|xf| {
            let at = xf.find("fillId=\"").unwrap() + 8;
            let len = xf[at..].find('"').unwrap();
            xf[at..at + len].parse().unwrap()
        })
        .collect()
}

fn fills(styles_xml: &str) -> Vec<&str> {
    let section = &styles_xml[styles_xml.find("<fills").unwrap()..styles_xml.find("</fills>").unwrap()];
    section.split("<fill>").skip(1).collect()
}

#[test]
fn highlighted_cells_get_the_green_style() {
    let bytes = ExcelWorkbookWriter::new().render_to_bytes(&workbook()).unwrap();
    let styles = package_part(&bytes, "xl/styles.xml");
    let sheet = package_part(&bytes, "xl/worksheets/sheet1.xml");

    assert!(styles.contains("FFC6EFCE"), "{styles}");
    assert!(styles.contains("FF006100"), "{styles}");

    // B2 holds the highlighted 5, B3 the plain 40
    let highlighted = cell_style(&sheet, "B2").expect("highlighted cell is styled");
    assert_eq!(cell_style(&sheet, "B3"), None);
    assert_ne!(cell_style(&sheet, "A1"), Some(highlighted));

    let fill_id = xf_fill_ids(&styles)[highlighted];
    assert!(fills(&styles)[fill_id].contains("FFC6EFCE"));
}
