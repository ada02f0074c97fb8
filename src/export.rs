use crate::errors::Result;
use crate::types::WrestlerEntry;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

pub const SHEET_NAME: &str = "Wrestlers";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const COLUMNS: [(&str, f64); 7] = [
    ("name", 28.0),
    ("grade", 8.0),
    ("school", 28.0),
    ("seed", 8.0),
    ("place", 20.0),
    ("weight", 8.0),
    ("tournament", 24.0),
];

/// Renders the roster as a single-sheet xlsx workbook held in memory.
/// Missing values are left as empty cells.
pub fn roster_to_xlsx(entries: &[WrestlerEntry]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    write_header(worksheet)?;
    for (i, entry) in entries.iter().enumerate() {
        write_entry(worksheet, i as u32 + 1, entry)?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_header(worksheet: &mut Worksheet) -> Result<()> {
    let bold = Format::new().set_bold();
    for (col, (title, width)) in COLUMNS.iter().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, *title, &bold)?;
        worksheet.set_column_width(col, *width)?;
    }
    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn write_entry(worksheet: &mut Worksheet, row: u32, entry: &WrestlerEntry) -> Result<()> {
    worksheet.write_string(row, 0, entry.name.as_str())?;
    if let Some(grade) = entry.grade {
        worksheet.write_number(row, 1, f64::from(grade))?;
    }
    if !entry.school.is_empty() {
        worksheet.write_string(row, 2, entry.school.as_str())?;
    }
    if let Some(seed) = &entry.seed {
        worksheet.write_string(row, 3, seed.as_str())?;
    }
    if let Some(place) = &entry.place {
        worksheet.write_string(row, 4, place.as_str())?;
    }
    if let Some(weight) = entry.weight {
        worksheet.write_number(row, 5, f64::from(weight))?;
    }
    worksheet.write_string(row, 6, entry.tournament.as_str())?;
    Ok(())
}

/// `wrestlers_<tournament>.xlsx`, with characters that would break a file
/// name or a Content-Disposition header replaced by `_`.
pub fn export_file_name(tournament: &str) -> String {
    let safe: String = tournament
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.' | '(' | ')') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("wrestlers_{}.xlsx", safe)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> WrestlerEntry {
        WrestlerEntry {
            name: name.to_string(),
            grade: Some(10),
            school: "Lincoln High".to_string(),
            seed: Some("1st".to_string()),
            place: None,
            weight: Some(106),
            tournament: "State".to_string(),
        }
    }

    #[test]
    fn test_workbook_is_a_zip_container() {
        let bytes = roster_to_xlsx(&[entry("Jane Doe"), entry("John Roe")]).unwrap();
        // xlsx files are zip archives
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_sheet_layout_and_empty_cells() {
        use calamine::{Data, Reader, Xlsx};
        use std::io::Cursor;

        let sparse = WrestlerEntry {
            grade: None,
            seed: None,
            place: Some("3rd Place".to_string()),
            ..entry("John Roe")
        };
        let bytes = roster_to_xlsx(&[entry("Jane Doe"), sparse]).unwrap();

        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec![SHEET_NAME.to_string()]);
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();

        let text = |row: u32, col: u32| match range.get_value((row, col)) {
            Some(Data::String(s)) => s.clone(),
            Some(Data::Float(f)) => f.to_string(),
            _ => String::new(),
        };

        let header: Vec<String> = (0..7).map(|col| text(0, col)).collect();
        assert_eq!(
            header,
            vec!["name", "grade", "school", "seed", "place", "weight", "tournament"]
        );

        let first: Vec<String> = (0..7).map(|col| text(1, col)).collect();
        assert_eq!(
            first,
            vec!["Jane Doe", "10", "Lincoln High", "1st", "", "106", "State"]
        );
        assert_eq!(range.get_value((1, 1)), Some(&Data::Float(10.0)));

        assert!(matches!(range.get_value((2, 1)), None | Some(Data::Empty)));
        assert!(matches!(range.get_value((2, 3)), None | Some(Data::Empty)));
        assert_eq!(text(2, 4), "3rd Place");
        assert_eq!(text(2, 6), "State");
    }

    #[test]
    fn test_empty_roster_still_exports() {
        let bytes = roster_to_xlsx(&[]).unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("State Finals"), "wrestlers_State Finals.xlsx");
        assert_eq!(export_file_name("a/b\"c"), "wrestlers_a_b_c.xlsx");
        assert_eq!(export_file_name("Área 5"), "wrestlers__rea 5.xlsx");
    }
}
