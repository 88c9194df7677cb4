use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use derive_more::Display;
use once_cell::sync::Lazy;

use crate::model::city::NewCityStandard;
use crate::model::salary::NewSalaryRecord;

#[derive(Debug, Display, PartialEq)]
pub enum SheetError {
    #[display(fmt = "file is empty or its format was not recognized")]
    Unreadable,

    #[display(fmt = "spreadsheet contains no data rows")]
    NoRows,

    #[display(fmt = "missing required column `{}`", _0)]
    MissingColumn(&'static str),

    #[display(fmt = "row {}: invalid value in column `{}`", row, column)]
    BadCell { row: usize, column: &'static str },
}

impl std::error::Error for SheetError {}

/// Header alias -> canonical column name. Uploaded sheets come with either
/// English or Chinese headers; `city_namte` is a known misspelling that
/// exists in circulating templates and must keep working.
static SALARY_HEADER_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("employee_id", "employee_id"),
        ("员工工号", "employee_id"),
        ("employee_name", "employee_name"),
        ("员工姓名", "employee_name"),
        ("month", "month"),
        ("月份", "month"),
        ("salary_amount", "salary_amount"),
        ("工资金额", "salary_amount"),
    ])
});

static CITY_HEADER_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("city_name", "city_name"),
        ("城市名", "city_name"),
        ("city_namte", "city_name"),
        ("year", "year"),
        ("年份", "year"),
        ("base_min", "base_min"),
        ("基数下限", "base_min"),
        ("base_max", "base_max"),
        ("基数上限", "base_max"),
        ("rate", "rate"),
        ("缴纳比例", "rate"),
    ])
});

static EMPTY_CELL: Data = Data::Empty;

/// Parse the first worksheet of an uploaded file into salary rows.
pub fn parse_salaries(bytes: &[u8], filename: &str) -> Result<Vec<NewSalaryRecord>, SheetError> {
    let rows = decode_rows(bytes, filename)?;
    let Some((header_row, data_rows)) = rows.split_first() else {
        return Err(SheetError::NoRows);
    };
    let headers = header_strings(header_row);

    let col_id = find_column(&headers, &SALARY_HEADER_ALIASES, "employee_id")?;
    let col_name = find_column(&headers, &SALARY_HEADER_ALIASES, "employee_name")?;
    let col_month = find_column(&headers, &SALARY_HEADER_ALIASES, "month")?;
    let col_amount = find_column(&headers, &SALARY_HEADER_ALIASES, "salary_amount")?;

    let mut out = Vec::new();
    for (i, row) in data_rows.iter().enumerate() {
        if is_blank_row(row) {
            continue;
        }
        let line = i + 2; // 1-based, counting the header row

        out.push(NewSalaryRecord {
            employee_id: cell_to_string(cell(row, col_id)).ok_or(SheetError::BadCell {
                row: line,
                column: "employee_id",
            })?,
            employee_name: cell_to_string(cell(row, col_name)).ok_or(SheetError::BadCell {
                row: line,
                column: "employee_name",
            })?,
            month: cell_to_string(cell(row, col_month)).ok_or(SheetError::BadCell {
                row: line,
                column: "month",
            })?,
            salary_amount: cell_to_f64(cell(row, col_amount)).ok_or(SheetError::BadCell {
                row: line,
                column: "salary_amount",
            })?,
        });
    }

    if out.is_empty() {
        return Err(SheetError::NoRows);
    }
    Ok(out)
}

/// Parse the first worksheet of an uploaded file into city-standard rows.
pub fn parse_cities(bytes: &[u8], filename: &str) -> Result<Vec<NewCityStandard>, SheetError> {
    let rows = decode_rows(bytes, filename)?;
    let Some((header_row, data_rows)) = rows.split_first() else {
        return Err(SheetError::NoRows);
    };
    let headers = header_strings(header_row);

    let col_city = find_column(&headers, &CITY_HEADER_ALIASES, "city_name")?;
    let col_year = find_column(&headers, &CITY_HEADER_ALIASES, "year")?;
    let col_min = find_column(&headers, &CITY_HEADER_ALIASES, "base_min")?;
    let col_max = find_column(&headers, &CITY_HEADER_ALIASES, "base_max")?;
    let col_rate = find_column(&headers, &CITY_HEADER_ALIASES, "rate")?;

    let mut out = Vec::new();
    for (i, row) in data_rows.iter().enumerate() {
        if is_blank_row(row) {
            continue;
        }
        let line = i + 2;

        out.push(NewCityStandard {
            city_name: cell_to_string(cell(row, col_city)).ok_or(SheetError::BadCell {
                row: line,
                column: "city_name",
            })?,
            year: cell_to_string(cell(row, col_year)).ok_or(SheetError::BadCell {
                row: line,
                column: "year",
            })?,
            base_min: cell_to_f64(cell(row, col_min)).ok_or(SheetError::BadCell {
                row: line,
                column: "base_min",
            })?,
            base_max: cell_to_f64(cell(row, col_max)).ok_or(SheetError::BadCell {
                row: line,
                column: "base_max",
            })?,
            rate: cell_to_f64(cell(row, col_rate)).ok_or(SheetError::BadCell {
                row: line,
                column: "rate",
            })?,
        });
    }

    if out.is_empty() {
        return Err(SheetError::NoRows);
    }
    Ok(out)
}

/// Decode an upload into a uniform cell grid. CSV by extension, otherwise
/// whatever workbook format calamine can sniff (xlsx/xls/ods).
fn decode_rows(bytes: &[u8], filename: &str) -> Result<Vec<Vec<Data>>, SheetError> {
    if filename.to_ascii_lowercase().ends_with(".csv") {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|_| SheetError::Unreadable)?;
            rows.push(
                record
                    .iter()
                    .map(|f| Data::String(f.to_string()))
                    .collect(),
            );
        }
        Ok(rows)
    } else {
        let mut workbook =
            open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|_| SheetError::Unreadable)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(SheetError::Unreadable)?
            .map_err(|_| SheetError::Unreadable)?;
        Ok(range.rows().map(|r| r.to_vec()).collect())
    }
}

fn header_strings(header_row: &[Data]) -> Vec<String> {
    header_row
        .iter()
        .map(|c| cell_to_string(c).unwrap_or_default())
        .collect()
}

fn find_column(
    headers: &[String],
    aliases: &HashMap<&'static str, &'static str>,
    canonical: &'static str,
) -> Result<usize, SheetError> {
    headers
        .iter()
        .position(|h| aliases.get(normalize(h).as_str()).copied() == Some(canonical))
        .ok_or(SheetError::MissingColumn(canonical))
}

fn normalize(header: &str) -> String {
    header.trim().to_lowercase()
}

fn cell<'a>(row: &'a [Data], idx: usize) -> &'a Data {
    row.get(idx).unwrap_or(&EMPTY_CELL)
}

fn is_blank_row(row: &[Data]) -> bool {
    row.iter().all(|c| match c {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    })
}

/// String coercion matching how spreadsheets hand back identifier-ish cells:
/// numeric ids and months like `202401` must come out without a decimal tail.
fn cell_to_string(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                Some(format!("{}", *f as i64))
            } else {
                Some(format!("{}", f))
            }
        }
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTimeIso(s) => Some(s.clone()),
        Data::DateTime(dt) => Some(format!("{}", dt.as_f64())),
        _ => None,
    }
}

fn cell_to_f64(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().parse::<f64>().ok(),
        Data::DateTime(dt) => Some(dt.as_f64()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_salary_csv_with_english_headers() {
        let csv = "employee_id,employee_name,month,salary_amount\n\
                   1001,Alice,202401,8000\n\
                   1001,Alice,202402,9000\n";
        let rows = parse_salaries(csv.as_bytes(), "salaries.csv").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].employee_id, "1001");
        assert_eq!(rows[0].employee_name, "Alice");
        assert_eq!(rows[0].month, "202401");
        assert_eq!(rows[0].salary_amount, 8000.0);
        assert_eq!(rows[1].salary_amount, 9000.0);
    }

    #[test]
    fn parses_salary_csv_with_chinese_headers() {
        let csv = "员工工号,员工姓名,月份,工资金额\n1001,小王,202401,8000\n";
        let rows = parse_salaries(csv.as_bytes(), "salaries.csv").unwrap();

        assert_eq!(rows[0].employee_name, "小王");
        assert_eq!(rows[0].salary_amount, 8000.0);
    }

    #[test]
    fn accepts_misspelled_city_name_header_with_trailing_space() {
        let csv = "city_namte ,year,base_min,base_max,rate\nShanghai,2024,3000,8500,0.16\n";
        let rows = parse_cities(csv.as_bytes(), "cities.csv").unwrap();

        assert_eq!(rows[0].city_name, "Shanghai");
        assert_eq!(rows[0].year, "2024");
        assert_eq!(rows[0].base_min, 3000.0);
        assert_eq!(rows[0].base_max, 8500.0);
        assert_eq!(rows[0].rate, 0.16);
    }

    #[test]
    fn missing_column_is_reported_by_canonical_name() {
        let csv = "city_name,year,base_min,base_max\nShanghai,2024,3000,8500\n";
        let err = parse_cities(csv.as_bytes(), "cities.csv").unwrap_err();

        assert_eq!(err, SheetError::MissingColumn("rate"));
    }

    #[test]
    fn bad_amount_cell_names_the_row() {
        let csv = "employee_id,employee_name,month,salary_amount\n1001,Alice,202401,abc\n";
        let err = parse_salaries(csv.as_bytes(), "salaries.csv").unwrap_err();

        assert_eq!(
            err,
            SheetError::BadCell {
                row: 2,
                column: "salary_amount"
            }
        );
    }

    #[test]
    fn empty_and_header_only_files_are_rejected() {
        assert_eq!(
            parse_salaries(b"", "salaries.csv").unwrap_err(),
            SheetError::NoRows
        );

        let header_only = "employee_id,employee_name,month,salary_amount\n";
        assert_eq!(
            parse_salaries(header_only.as_bytes(), "salaries.csv").unwrap_err(),
            SheetError::NoRows
        );
    }

    #[test]
    fn blank_rows_are_skipped() {
        let csv = "employee_id,employee_name,month,salary_amount\n\
                   1001,Alice,202401,8000\n\
                   ,,,\n\
                   1002,Bob,202401,6000\n";
        let rows = parse_salaries(csv.as_bytes(), "salaries.csv").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].employee_name, "Bob");
    }

    #[test]
    fn numeric_cells_coerce_to_clean_strings() {
        assert_eq!(cell_to_string(&Data::Float(202401.0)).unwrap(), "202401");
        assert_eq!(cell_to_string(&Data::Float(8000.5)).unwrap(), "8000.5");
        assert_eq!(cell_to_string(&Data::Int(7)).unwrap(), "7");
        assert_eq!(cell_to_string(&Data::String("  1001 ".into())).unwrap(), "1001");
        assert!(cell_to_string(&Data::Empty).is_none());
    }

    #[test]
    fn string_cells_coerce_to_numbers() {
        assert_eq!(cell_to_f64(&Data::String(" 8000.5 ".into())).unwrap(), 8000.5);
        assert_eq!(cell_to_f64(&Data::Int(8000)).unwrap(), 8000.0);
        assert!(cell_to_f64(&Data::String("abc".into())).is_none());
        assert!(cell_to_f64(&Data::Empty).is_none());
    }
}
