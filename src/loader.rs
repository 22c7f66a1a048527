use crate::dataset::{CellValue, Dataset};
use calamine::{Data, Reader, open_workbook_auto};
use std::path::Path;

/// Reasons an uploaded file cannot be turned into a [`Dataset`]
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{0}")]
    Workbook(#[from] calamine::Error),

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("workbook has no worksheets")]
    NoWorksheet,

    #[error("unsupported file type: {0}")]
    Unsupported(String),
}

/// Extensions handed to calamine
const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "xla", "ods"];

/// Detect file type and load appropriate format
///
/// This function examines the file extension and calls the appropriate loader
/// for CSV or workbook files. The first row supplies the column names.
///
/// # Arguments
/// * `filepath` - Path to the file to load
///
/// # Returns
/// * `Result<Dataset, LoadError>` - The loaded dataset or an error
///
/// # Examples
/// ```no_run
/// use boxplot_web::loader::load_dataset;
///
/// match load_dataset("uploads/measurements.xlsx") {
///     Ok(dataset) => println!("Loaded {} rows", dataset.len()),
///     Err(e) => eprintln!("Error loading file: {}", e),
/// }
/// ```
pub fn load_dataset(filepath: impl AsRef<Path>) -> Result<Dataset, LoadError> {
    let path = filepath.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension.as_deref() {
        Some("csv") => from_csv(path),
        Some(ext) if WORKBOOK_EXTENSIONS.contains(&ext) => from_workbook(path),
        Some(ext) => Err(LoadError::Unsupported(ext.to_string())),
        None => Err(LoadError::Unsupported("file has no extension".to_string())),
    }
}

/// Load the first worksheet of a workbook
///
/// Any format calamine recognises is accepted. Error cells are treated as
/// missing; booleans and dates keep their textual form. The first non-blank
/// row is the header. Blank leading columns are kept, so a sheet starting
/// at column B has an `Unnamed: 0` column first.
pub fn from_workbook(filepath: impl AsRef<Path>) -> Result<Dataset, LoadError> {
    let mut workbook = open_workbook_auto(filepath)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::NoWorksheet)??;
    // calamine starts the range at the first used cell
    let lead = range.start().map_or(0, |(_, column)| column as usize);

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Dataset::default());
    };

    let header = std::iter::repeat_n(String::new(), lead)
        .chain(header.iter().map(header_name))
        .collect();
    let mut dataset = Dataset::new(header);
    for row in rows {
        let row = std::iter::repeat_n(CellValue::Missing, lead)
            .chain(row.iter().map(cell_value))
            .collect();
        dataset.push_row(row);
    }

    Ok(dataset)
}

/// Load a comma-separated file
///
/// Fields that parse as numbers are numeric, empty fields are missing and
/// everything else is text. Ragged rows are accepted.
pub fn from_csv(filepath: impl AsRef<Path>) -> Result<Dataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(filepath)?;

    let header = reader.headers()?.iter().map(str::to_string).collect();
    let mut dataset = Dataset::new(header);

    for record in reader.records() {
        let record = record?;
        dataset.push_row(record.iter().map(parse_field).collect());
    }

    Ok(dataset)
}

fn header_name(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Missing,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) if s.trim().is_empty() => CellValue::Missing,
        Data::String(s) => CellValue::Text(s.clone()),
        other => CellValue::Text(other.to_string()),
    }
}

fn parse_field(field: &str) -> CellValue {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return CellValue::Missing;
    }
    match trimmed.parse::<f64>() {
        Ok(n) => CellValue::Number(n),
        Err(_) => CellValue::Text(field.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn csv_fields_are_typed() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "group,value,,value").unwrap();
        writeln!(file, "A,1.5,x,2").unwrap();
        writeln!(file, "\"B, C\",,y").unwrap();
        file.flush().unwrap();

        let ds = load_dataset(file.path()).unwrap();
        assert_eq!(ds.columns(), ["group", "value", "Unnamed: 2", "value.1"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.cell(0, 1), &CellValue::Number(1.5));
        assert_eq!(ds.cell(1, 0), &CellValue::Text("B, C".to_string()));
        assert_eq!(ds.cell(1, 1), &CellValue::Missing);
        assert_eq!(ds.cell(1, 3), &CellValue::Missing);
    }

    #[test]
    fn workbook_keeps_blank_leading_columns() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(1, 1, "g").unwrap();
        sheet.write_string(1, 2, "v").unwrap();
        sheet.write_string(2, 1, "A").unwrap();
        sheet.write_number(2, 2, 4.0).unwrap();
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        workbook.save(file.path()).unwrap();

        let ds = load_dataset(file.path()).unwrap();
        assert_eq!(ds.columns(), ["Unnamed: 0", "g", "v"]);
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.cell(0, 0), &CellValue::Missing);
        assert_eq!(ds.cell(0, 1), &CellValue::Text("A".to_string()));
        assert_eq!(ds.cell(0, 2), &CellValue::Number(4.0));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_dataset("notes.txt").unwrap_err();
        assert!(matches!(err, LoadError::Unsupported(ext) if ext == "txt"));
    }

    #[test]
    fn workbook_cells_are_typed() {
        assert_eq!(cell_value(&Data::Int(3)), CellValue::Number(3.0));
        assert_eq!(cell_value(&Data::Empty), CellValue::Missing);
        assert_eq!(cell_value(&Data::String("  ".into())), CellValue::Missing);
        assert_eq!(cell_value(&Data::Bool(true)), CellValue::Text("true".into()));
        assert_eq!(header_name(&Data::Float(2024.0)), "2024");
    }
}
