//! CSV sheets with encoding and delimiter auto-detection.
//!
//! Converts raw sheet bytes into a [`Table`] and back. No XLSForm-specific
//! logic here beyond dropping rows where every cell is blank.

use std::collections::{HashMap, HashSet};

use crate::error::{WorkbookError, WorkbookResult};
use crate::models::Table;
use crate::text::is_blank;

/// Result of parsing a sheet with metadata
#[derive(Debug, Clone)]
pub struct ParsedSheet {
    /// Parsed table
    pub table: Table,
    /// Detected encoding
    pub encoding: String,
    /// Detected delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes.
///
/// Valid UTF-8 always wins; chardet only guesses for other content.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(sheet: &str, bytes: &[u8], encoding: &str) -> WorkbookResult<String> {
    let text = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => String::from_utf8_lossy(bytes).to_string(),
        },
        "iso-8859-1" | "latin-1" | "latin1" => {
            let (decoded, _, had_errors) = encoding_rs::ISO_8859_15.decode(bytes);
            if had_errors {
                return Err(WorkbookError::Encoding {
                    sheet: sheet.to_string(),
                    encoding: encoding.to_string(),
                });
            }
            decoded.to_string()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        // Anything else chardet reports (UTF-16, KOI8-R, ...) by its WHATWG label
        other => {
            let unsupported = || WorkbookError::Encoding {
                sheet: sheet.to_string(),
                encoding: encoding.to_string(),
            };
            let codec = encoding_rs::Encoding::for_label(other.as_bytes()).ok_or_else(unsupported)?;
            let (decoded, _, had_errors) = codec.decode(bytes);
            if had_errors {
                return Err(unsupported());
            }
            decoded.into_owned()
        }
    };
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse decoded sheet text with an explicit delimiter.
///
/// The first record is the header. Rows where every cell is blank are
/// dropped; short rows are padded with blanks.
///
/// # Example
/// ```
/// use formbridge::workbook::parse_sheet;
///
/// let table = parse_sheet("survey", "type,name\ntext,q1\n,\n", ',').unwrap();
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.rows()[0].name(), Some("q1"));
/// ```
pub fn parse_sheet(sheet: &str, content: &str, delimiter: char) -> WorkbookResult<Table> {
    let csv_err = |e: csv::Error| WorkbookError::Csv {
        sheet: sheet.to_string(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .has_headers(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(WorkbookError::NoHeaders(sheet.to_string()));
    }
    let headers = unique_headers(headers);

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        let values: Vec<String> = record.iter().map(str::to_string).collect();
        if values.iter().all(|v| is_blank(Some(v.as_str()))) {
            continue;
        }
        records.push(values);
    }

    Ok(Table::from_records(&headers, &records))
}

/// Give every header a distinct name so no column shadows another.
///
/// Blank headers become `Unnamed: <index>`; repeats get `.1`, `.2`, ...
/// suffixes, skipping names already used elsewhere in the header:
///
/// ```text
/// label, label, , label   →   label, label.1, Unnamed: 2, label.2
/// ```
fn unique_headers(headers: Vec<String>) -> Vec<String> {
    let taken: HashSet<String> = headers.iter().cloned().collect();
    let mut used: HashSet<String> = HashSet::new();
    let mut counters: HashMap<String, usize> = HashMap::new();

    headers
        .into_iter()
        .enumerate()
        .map(|(i, header)| {
            let base = if header.is_empty() {
                format!("Unnamed: {}", i)
            } else {
                header
            };
            if used.insert(base.clone()) {
                return base;
            }
            let counter = counters.entry(base.clone()).or_insert(0);
            loop {
                *counter += 1;
                let candidate = format!("{}.{}", base, counter);
                if !taken.contains(&candidate) && used.insert(candidate.clone()) {
                    return candidate;
                }
            }
        })
        .collect()
}

/// Parse sheet bytes with auto-detection of encoding and delimiter.
pub fn parse_sheet_bytes(sheet: &str, bytes: &[u8]) -> WorkbookResult<ParsedSheet> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(sheet, bytes, &encoding)?;
    if content.trim().is_empty() {
        return Err(WorkbookError::NoHeaders(sheet.to_string()));
    }
    let delimiter = detect_delimiter(&content);
    let table = parse_sheet(sheet, &content, delimiter)?;

    Ok(ParsedSheet {
        table,
        encoding,
        delimiter,
    })
}

/// Serialize a table as UTF-8, comma-separated CSV.
pub fn write_sheet(sheet: &str, table: &Table) -> WorkbookResult<Vec<u8>> {
    let csv_err = |message: String| WorkbookError::Csv {
        sheet: sheet.to_string(),
        message,
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(table.columns())
        .map_err(|e| csv_err(e.to_string()))?;
    for record in table.to_records() {
        writer
            .write_record(&record)
            .map_err(|e| csv_err(e.to_string()))?;
    }
    writer.into_inner().map_err(|e| csv_err(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_sheet() {
        let table = parse_sheet("survey", "type,name,label\ntext,q1,Name\ninteger,q2,Age", ',').unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.columns(), &["type", "name", "label"]);
        assert_eq!(table.rows()[1].get("type"), Some("integer"));
    }

    #[test]
    fn test_quoted_values_keep_delimiters() {
        let content = "name,relevant\nq1,\"selected(${a}, 'x')\"";
        let table = parse_sheet("survey", content, ',').unwrap();

        assert_eq!(table.rows()[0].get("relevant"), Some("selected(${a}, 'x')"));
    }

    #[test]
    fn test_blank_rows_dropped() {
        let content = "type,name\ntext,q1\n,\nnan,NaN\nnote,q2\n";
        let table = parse_sheet("survey", content, ',').unwrap();

        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_short_rows_padded() {
        let table = parse_sheet("survey", "a;b;c\n1", ';').unwrap();

        assert_eq!(table.rows()[0].get("a"), Some("1"));
        assert_eq!(table.rows()[0].get("c"), None);
    }

    #[test]
    fn test_empty_sheet_error() {
        let result = parse_sheet_bytes("choices", b"");
        assert!(matches!(result, Err(WorkbookError::NoHeaders(_))));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc"), '\t');
        assert_eq!(detect_delimiter("a|b|c"), '|');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_auto_parse_strips_bom() {
        let bytes = "\u{feff}type;name\ntext;q1".as_bytes();
        let parsed = parse_sheet_bytes("survey", bytes).unwrap();

        assert_eq!(parsed.delimiter, ';');
        assert_eq!(parsed.table.columns(), &["type", "name"]);
    }

    #[test]
    fn test_arabic_utf8() {
        let bytes = "name,label::Arabic\nq1,العمر".as_bytes();
        let parsed = parse_sheet_bytes("survey", bytes).unwrap();

        assert_eq!(parsed.encoding, "utf-8");
        assert_eq!(parsed.table.rows()[0].get("label::Arabic"), Some("العمر"));
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content("survey", bytes, "iso-8859-1").unwrap();
        assert!(decoded.contains("Soci"));
    }

    #[test]
    fn test_duplicate_headers_keep_every_value() {
        let table = parse_sheet("survey", "type,name,label,label\ntext,q1,Age,\n", ',').unwrap();

        assert_eq!(table.columns(), &["type", "name", "label", "label.1"]);
        assert_eq!(table.rows()[0].get("label"), Some("Age"));
        assert_eq!(table.rows()[0].get("label.1"), None);
    }

    #[test]
    fn test_duplicate_headers_avoid_existing_names() {
        let headers = ["a", "a.1", "a", "", ""].map(String::from).to_vec();
        assert_eq!(
            unique_headers(headers),
            ["a", "a.1", "a.2", "Unnamed: 3", "Unnamed: 4"]
        );
    }

    #[test]
    fn test_utf16_decoded_by_label() {
        // "a,b" in UTF-16LE with BOM
        let bytes: &[u8] = &[0xFF, 0xFE, b'a', 0, b',', 0, b'b', 0];
        let decoded = decode_content("survey", bytes, "UTF-16LE").unwrap();
        assert_eq!(decoded, "a,b");
    }

    #[test]
    fn test_unknown_encoding_rejected() {
        let result = decode_content("survey", b"abc", "x-made-up");
        assert!(matches!(result, Err(WorkbookError::Encoding { .. })));
    }

    #[test]
    fn test_write_sheet() {
        let table = parse_sheet("survey", "type,name,label\ntext,q1,\"Hello, world\"\nnote,,", ',').unwrap();
        let bytes = write_sheet("survey", &table).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(text, "type,name,label\ntext,q1,\"Hello, world\"\nnote,,\n");
    }
}
