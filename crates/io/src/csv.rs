// CSV/TSV branch exports

use std::io::Read;
use std::path::Path;

use stockscope_engine::RawTable;

use crate::error::IoError;

/// Read a delimited branch export into a raw table.
///
/// The delimiter is sniffed, non-UTF-8 input is decoded as Windows-1252,
/// and a leading byte-order mark is dropped.
pub fn read_table(path: &Path) -> Result<RawTable, IoError> {
    let content = read_file_as_utf8(path)?;
    parse_table(&path.display().to_string(), &content).map_err(|message| IoError::Csv {
        path: path.to_path_buf(),
        message,
    })
}

pub fn parse_table(name: &str, content: &str) -> Result<RawTable, String> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let delimiter = sniff_delimiter(content);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| e.to_string())?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(RawTable::new(name, rows))
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(10)
        .collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Exports often open with a one-cell title line; score on the widest line instead
        let target = counts.iter().copied().max().unwrap_or(0);
        if target <= 1 {
            continue;
        }

        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let read_err = |source| IoError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut file = std::fs::File::open(path).map_err(read_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(read_err)?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            log::debug!("{}: not UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn sniffs_semicolons_past_a_title_line() {
        let t = parse_table("t", "Reporte HI\nCve_Prod;Desc_Prod;Inv\n001;Martillo, 16oz;5\n").unwrap();
        assert_eq!(t.rows[1], vec!["Cve_Prod", "Desc_Prod", "Inv"]);
        assert_eq!(t.rows[2], vec!["001", "Martillo, 16oz", "5"]);
    }

    #[test]
    fn sniffs_tabs_and_commas() {
        assert_eq!(sniff_delimiter("a\tb\tc\n1\t2\t3"), b'\t');
        assert_eq!(sniff_delimiter("a,b\n1,2"), b',');
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn quoted_fields_and_ragged_rows() {
        let t = parse_table("t", "a,b,c\n\"x, y\",2\n").unwrap();
        assert_eq!(t.rows[1], vec!["x, y", "2"]);
    }

    #[test]
    fn strips_bom() {
        let t = parse_table("t", "\u{feff}code,desc\n1,x\n").unwrap();
        assert_eq!(t.rows[0][0], "code");
    }

    #[test]
    fn windows_1252_fallback() {
        let mut f = NamedTempFile::new().unwrap();
        // "Cañería" in Windows-1252
        f.write_all(b"001,Ca\xf1er\xeda,3\n").unwrap();
        let t = read_table(f.path()).unwrap();
        assert_eq!(t.rows[0][1], "Cañería");
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = read_table(Path::new("/nonexistent/branch.csv")).unwrap_err();
        assert!(matches!(err, IoError::Read { .. }));
    }
}
