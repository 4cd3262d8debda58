//! Report parsing: uploaded bytes to a [`RawTable`].
//!
//! Two families of input are accepted:
//!
//! - spreadsheets (`xlsx`, `xlsm`, `xlsb`, `xls`, `ods`), first sheet read as-is
//! - delimited text (`csv`, `tsv`, `txt`), with a metadata preamble skipped
//!   before the header row, plus encoding and delimiter auto-detection

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use std::path::Path;

use crate::error::{ParseError, ParseResult};
use crate::models::{Cell, RawTable, Row};

/// Metadata lines the safety portal writes above the header of its exports.
pub const DEFAULT_METADATA_LINES: usize = 10;

/// Input family, decided from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Spreadsheet,
    Delimited,
}

impl TableFormat {
    /// Format for `file_name`, or `None` when the extension is unsupported.
    pub fn detect(file_name: &str) -> Option<Self> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(TableFormat::Spreadsheet),
            "csv" | "tsv" | "txt" => Some(TableFormat::Delimited),
            _ => None,
        }
    }
}

/// Parser settings.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Lines to drop before the header row of delimited text.
    pub metadata_lines: usize,
    /// Fixed delimiter, ASCII only; auto-detected from the header line when `None`.
    pub delimiter: Option<char>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            metadata_lines: DEFAULT_METADATA_LINES,
            delimiter: None,
        }
    }
}

/// A parsed table with how it was read.
#[derive(Debug, Clone)]
pub struct ParsedReport {
    pub table: RawTable,
    pub format: TableFormat,
    /// Detected encoding, delimited text only.
    pub encoding: Option<String>,
    /// Detected or forced delimiter, delimited text only.
    pub delimiter: Option<char>,
}

/// Parse uploaded bytes in the given format.
pub fn parse_bytes(
    bytes: &[u8],
    format: TableFormat,
    options: &ParseOptions,
) -> ParseResult<ParsedReport> {
    if bytes.is_empty() {
        return Err(ParseError::EmptyFile);
    }
    match format {
        TableFormat::Spreadsheet => Ok(ParsedReport {
            table: parse_spreadsheet(bytes)?,
            format,
            encoding: None,
            delimiter: None,
        }),
        TableFormat::Delimited => parse_delimited_auto(bytes, options),
    }
}

/// Parse a report file from disk, picking the format from its extension.
pub fn parse_file<P: AsRef<Path>>(
    path: P,
    options: &ParseOptions,
) -> Result<ParsedReport, crate::error::PipelineError> {
    let path = path.as_ref();
    let name = path.to_string_lossy();
    let format = TableFormat::detect(&name)
        .ok_or_else(|| crate::error::PipelineError::UnsupportedFormat(name.to_string()))?;
    let bytes = std::fs::read(path).map_err(ParseError::from)?;
    Ok(parse_bytes(&bytes, format, options)?)
}

// =============================================================================
// Spreadsheets
// =============================================================================

/// Read the first worksheet. Row 1 is the header.
pub fn parse_spreadsheet(bytes: &[u8]) -> ParseResult<RawTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ParseError::Spreadsheet(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ParseError::NoWorksheet)?
        .map_err(|e| ParseError::Spreadsheet(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|c| data_to_cell(c).display()).collect(),
        None => return Err(ParseError::EmptyFile),
    };

    let body: Vec<Row> = rows
        .map(|r| r.iter().map(data_to_cell).collect::<Row>())
        .filter(|r| r.iter().any(|c| !c.is_empty()))
        .collect();

    Ok(RawTable::new(headers, body))
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::from(s.as_str()),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) | Data::Empty => Cell::Empty,
    }
}

// =============================================================================
// Delimited text
// =============================================================================

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes with the given encoding. Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => {
            let (text, _, _) = encoding_rs::UTF_8.decode(bytes);
            text.into_owned()
        }
    }
}

/// Pick the separator that occurs most often in `header_line`.
pub fn detect_delimiter(header_line: &str) -> char {
    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = header_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Decode, skip the preamble, detect the delimiter, then parse.
pub fn parse_delimited_auto(bytes: &[u8], options: &ParseOptions) -> ParseResult<ParsedReport> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let body = skip_metadata(&content, options.metadata_lines)?;

    let header_line = body.lines().next().unwrap_or("");
    let delimiter = options
        .delimiter
        .unwrap_or_else(|| detect_delimiter(header_line));

    let table = parse_delimited(body, delimiter, options.metadata_lines)?;

    Ok(ParsedReport {
        table,
        format: TableFormat::Delimited,
        encoding: Some(encoding),
        delimiter: Some(delimiter),
    })
}

/// Drop the first `skip` lines.
fn skip_metadata(content: &str, skip: usize) -> ParseResult<&str> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    if content.trim().is_empty() {
        return Err(ParseError::EmptyFile);
    }

    let mut offset = 0;
    for seen in 0..skip {
        match content[offset..].find('\n') {
            Some(pos) => offset += pos + 1,
            None => {
                return Err(ParseError::MissingHeaderRow {
                    skip,
                    found: seen + usize::from(!content[offset..].is_empty()),
                })
            }
        }
    }

    let body = &content[offset..];
    if body.trim().is_empty() {
        return Err(ParseError::MissingHeaderRow {
            skip,
            found: skip,
        });
    }
    Ok(body)
}

/// Parse delimited text whose first line is the header.
///
/// `line_offset` is added to reported line numbers so errors point into the
/// original file.
pub fn parse_delimited(body: &str, delimiter: char, line_offset: usize) -> ParseResult<RawTable> {
    if !delimiter.is_ascii() {
        return Err(ParseError::InvalidDelimiter(delimiter));
    }
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .has_headers(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(e, line_offset))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(e, line_offset))?;
        let row: Row = record.iter().map(|v| Cell::from(v.trim())).collect();
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        rows.push(row);
    }

    Ok(RawTable::new(headers, rows))
}

fn csv_error(err: csv::Error, line_offset: usize) -> ParseError {
    let line = err
        .position()
        .map(|p| p.line() as usize + line_offset)
        .unwrap_or(line_offset + 1);
    ParseError::Delimited {
        line,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preamble(lines: usize) -> String {
        (0..lines).map(|i| format!("Report meta {}\n", i)).collect()
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(TableFormat::detect("report.XLSX"), Some(TableFormat::Spreadsheet));
        assert_eq!(TableFormat::detect("report.ods"), Some(TableFormat::Spreadsheet));
        assert_eq!(TableFormat::detect("export.csv"), Some(TableFormat::Delimited));
        assert_eq!(TableFormat::detect("notes.pdf"), None);
        assert_eq!(TableFormat::detect("no_extension"), None);
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c"), ';');
        assert_eq!(detect_delimiter("a,b,c"), ',');
        assert_eq!(detect_delimiter("a\tb\tc"), '\t');
        assert_eq!(detect_delimiter("a|b|c"), '|');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_delimited_skips_metadata() {
        let content = format!(
            "{}Driver Name,U Turn,Speeding Violations\nJane,1,0\nJoe,,2\n",
            preamble(10)
        );
        let report = parse_bytes(content.as_bytes(), TableFormat::Delimited, &ParseOptions::default()).unwrap();

        assert_eq!(report.delimiter, Some(','));
        assert_eq!(report.encoding.as_deref(), Some("utf-8"));
        let table = report.table;
        assert_eq!(table.headers(), ["Driver Name", "U Turn", "Speeding Violations"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(&table.rows()[1], "U Turn"), &Cell::Empty);
        assert_eq!(table.value(&table.rows()[1], "Speeding Violations").coerce_number(), 2.0);
    }

    #[test]
    fn test_custom_metadata_lines() {
        let content = "Name;U Turn\nA;1\n";
        let options = ParseOptions {
            metadata_lines: 0,
            delimiter: None,
        };
        let report = parse_bytes(content.as_bytes(), TableFormat::Delimited, &options).unwrap();
        assert_eq!(report.delimiter, Some(';'));
        assert_eq!(report.table.headers(), ["Name", "U Turn"]);
    }

    #[test]
    fn test_preamble_too_short() {
        let content = preamble(4);
        let err = parse_bytes(content.as_bytes(), TableFormat::Delimited, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::MissingHeaderRow { skip: 10, found: 4 }));
    }

    #[test]
    fn test_quoted_fields_and_blank_lines() {
        let content = "Name,Violations\n\"Doe, Jane\",3\n\n,\n";
        let table = parse_delimited(content, ',', 0).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0][0], Cell::Text("Doe, Jane".into()));
    }

    #[test]
    fn test_ragged_rows_accepted() {
        let content = "Name,U Turn,High G\nA,1\nB,0,2,extra\n";
        let table = parse_delimited(content, ',', 0).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(&table.rows()[0], "High G"), &Cell::Empty);
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let options = ParseOptions {
            metadata_lines: 0,
            delimiter: Some('§'),
        };
        let err = parse_bytes("Name§U Turn\nA§1\n".as_bytes(), TableFormat::Delimited, &options).unwrap_err();
        assert!(matches!(err, ParseError::InvalidDelimiter('§')));
    }

    #[test]
    fn test_empty_file() {
        let err = parse_bytes(b"", TableFormat::Delimited, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::EmptyFile));
    }

    #[test]
    fn test_garbage_spreadsheet_is_parse_error() {
        let err = parse_bytes(b"definitely not a zip", TableFormat::Spreadsheet, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::Spreadsheet(_)));
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }
}
