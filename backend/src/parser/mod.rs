//! Wide-table reader with encoding and delimiter auto-detection.
//!
//! Produces a [`RawTable`]: the literal key column header, the period
//! labels, and one row of raw strings per data line. No dimension parsing
//! happens here; see [`crate::transform::normalize`].

use std::path::Path;

use crate::error::{TsvError, TsvResult};
use crate::models::{RawRow, RawTable};

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub table: RawTable,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding.to_lowercase().as_str() {
        // WHATWG maps the latin1 labels onto windows-1252.
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    match decoded.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => decoded,
    }
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// Ties resolve in favour of tab, since the compound key header itself
/// contains commas.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    // Commas inside the key header do not count as column separators.
    let key_commas = first_line
        .split(['\t', ';', '|'])
        .next()
        .map_or(0, |key| key.matches(',').count());

    let separators = ['\t', ';', '|', ','];
    let mut best_sep = '\t';
    let mut best_count = 0;

    for &sep in &separators {
        let mut count = first_line.matches(sep).count();
        if sep == ',' {
            count = count.saturating_sub(key_commas);
        }
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse a decoded wide table with an explicit delimiter.
///
/// # Example
/// ```ignore
/// let tsv = "freq,nace_r2,unit,isced11,geo\\TIME_PERIOD\t2019 \t2020 \n\
///            A,HTC,PC_EMP,ED5-8,DE\t4.1 \t4.3 b\n";
/// let table = parse_table(tsv, '\t').unwrap();
/// assert_eq!(table.periods, vec!["2019", "2020"]);
/// assert_eq!(table.rows[0].values[1], "4.3 b");
/// ```
pub fn parse_table(content: &str, delimiter: char) -> TsvResult<RawTable> {
    let delimiter = u8::try_from(delimiter)
        .map_err(|_| TsvError::parse(1, format!("Unsupported delimiter '{}'", delimiter)))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut records = reader.records();

    let header = match records.next() {
        Some(Ok(record)) => record,
        Some(Err(e)) => return Err(csv_error(e, 1)),
        None => return Err(TsvError::EmptyFile),
    };

    let mut cells = header.iter().map(str::to_string);
    let key_header = match cells.next() {
        Some(h) if !h.is_empty() => h,
        _ => return Err(TsvError::EmptyFile),
    };
    let periods: Vec<String> = cells.collect();
    if periods.is_empty() {
        return Err(TsvError::NoPeriods);
    }

    let mut rows = Vec::new();
    for (idx, result) in records.enumerate() {
        let fallback_line = idx + 2;
        let record = result.map_err(|e| csv_error(e, fallback_line))?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(fallback_line);

        if record.iter().all(str::is_empty) {
            continue;
        }

        let key = record.get(0).unwrap_or("").to_string();
        let values = (0..periods.len())
            .map(|i| record.get(i + 1).unwrap_or("").to_string())
            .collect();

        rows.push(RawRow { line, key, values });
    }

    Ok(RawTable {
        key_header,
        periods,
        rows,
    })
}

fn csv_error(err: csv::Error, fallback_line: usize) -> TsvError {
    let line = err
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or(fallback_line);
    TsvError::parse(line, err.to_string())
}

/// Parse bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> TsvResult<ParseResult> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(TsvError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    let table = parse_table(&content, delimiter)?;

    Ok(ParseResult {
        table,
        encoding,
        delimiter,
    })
}

/// Parse a file with auto-detection of encoding and delimiter.
pub fn parse_file_auto<P: AsRef<Path>>(path: P) -> TsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "freq,nace_r2,unit,isced11,geo\\TIME_PERIOD\t2019 \t2020 \n\
                          A,HTC,PC_EMP,ED5-8,DE\t4.1 \t4.3 b\n\
                          A,HTC,PC_EMP,ED0-2,DE\t: \t1.2\n";

    #[test]
    fn test_simple_table() {
        let table = parse_table(SAMPLE, '\t').unwrap();

        assert_eq!(table.key_header, "freq,nace_r2,unit,isced11,geo\\TIME_PERIOD");
        assert_eq!(table.periods, vec!["2019", "2020"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].key, "A,HTC,PC_EMP,ED5-8,DE");
        assert_eq!(table.rows[0].values, vec!["4.1", "4.3 b"]);
        assert_eq!(table.rows[1].values, vec![":", "1.2"]);
    }

    #[test]
    fn test_line_numbers_are_one_based() {
        let table = parse_table(SAMPLE, '\t').unwrap();
        assert_eq!(table.rows[0].line, 2);
        assert_eq!(table.rows[1].line, 3);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let tsv = "k\\t\t2019\t2020\nA,B,C,D,E\t1\n";
        let table = parse_table(tsv, '\t').unwrap();
        assert_eq!(table.rows[0].values, vec!["1", ""]);
    }

    #[test]
    fn test_extra_cells_ignored() {
        let tsv = "k\\t\t2019\nA,B,C,D,E\t1\t2\t3\n";
        let table = parse_table(tsv, '\t').unwrap();
        assert_eq!(table.rows[0].values, vec!["1"]);
    }

    #[test]
    fn test_empty_lines_skipped() {
        let tsv = "k\\t\t2019\nA,B,C,D,E\t1\n\nA,B,C,D,F\t2\n";
        let table = parse_table(tsv, '\t').unwrap();
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_empty_input_error() {
        assert!(matches!(parse_table("", '\t'), Err(TsvError::EmptyFile)));
        assert!(matches!(parse_bytes_auto(b"  \n"), Err(TsvError::EmptyFile)));
    }

    #[test]
    fn test_header_without_periods() {
        let result = parse_table("freq,nace_r2,unit,isced11,geo\\TIME_PERIOD\n", '\t');
        assert!(matches!(result, Err(TsvError::NoPeriods)));
    }

    #[test]
    fn test_detect_delimiter_tab_despite_key_commas() {
        assert_eq!(detect_delimiter(SAMPLE), '\t');
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        let content = "freq,nace_r2,unit,isced11,geo\\TIME_PERIOD;2019;2020\n";
        assert_eq!(detect_delimiter(content), ';');
    }

    #[test]
    fn test_auto_parse() {
        let result = parse_bytes_auto(SAMPLE.as_bytes()).unwrap();
        assert_eq!(result.delimiter, '\t');
        assert_eq!(result.encoding, "utf-8");
        assert_eq!(result.table.rows.len(), 2);
    }

    #[test]
    fn test_bom_is_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(SAMPLE.as_bytes());
        let result = parse_bytes_auto(&bytes).unwrap();
        assert!(result.table.key_header.starts_with("freq"));
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_latin1_currency_sign() {
        assert_eq!(decode_content(&[0xA4], "iso-8859-1"), "\u{a4}");
        assert_eq!(decode_content(&[0x80], "latin1"), "\u{20ac}");
    }

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let result = parse_file_auto(file.path()).unwrap();
        assert_eq!(result.table.periods.len(), 2);
    }
}
