//! Batch mode: read a list of UAs and write one report block per UA.

use crate::aggregate::Aggregator;
use crate::error::{Error, Result};
use rayon::prelude::*;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Collect the UAs to dump.
///
/// The input file wins when it yields anything: a JSON array of strings, or
/// failing that one UA per trimmed, non-empty line. The inline list is used
/// otherwise. With neither, [`Error::NoInput`].
pub fn read_input(path: Option<&Path>, inline: &[String]) -> Result<Vec<String>> {
    if let Some(path) = path.filter(|p| p.exists()) {
        let uas = parse_input(&fs::read_to_string(path)?);
        if !uas.is_empty() {
            tracing::debug!(path = %path.display(), count = uas.len(), "read UAs from file");
            return Ok(uas);
        }
    }
    if !inline.is_empty() {
        return Ok(inline.to_vec());
    }
    let name = path.map_or_else(|| "uas.txt".to_string(), |p| p.display().to_string());
    Err(Error::NoInput(name))
}

fn parse_input(content: &str) -> Vec<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if trimmed.starts_with('[') {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
            return items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect();
        }
    }
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Render every UA and write the blocks to `output` in input order. The
/// file is truncated first. Returns the number of UAs written.
pub fn dump(aggregator: &Aggregator, uas: &[String], output: &Path) -> Result<usize> {
    let mut writer = BufWriter::new(File::create(output)?);

    let blocks: Vec<String> = uas.par_iter().map(|ua| aggregator.render(ua)).collect();
    for (i, block) in blocks.iter().enumerate() {
        writer.write_all(block.as_bytes())?;
        tracing::info!("wrote UA {}/{}", i + 1, blocks.len());
    }
    writer.flush()?;

    tracing::info!(output = %output.display(), "all done");
    Ok(blocks.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::BackendKind;
    use crate::builtin;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn input_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn json_array_input() {
        let file = input_file(r#"["curl/8.5.0", "Wget/1.21"]"#);
        let uas = read_input(Some(file.path()), &[]).unwrap();
        assert_eq!(uas, vec!["curl/8.5.0", "Wget/1.21"]);
    }

    #[test]
    fn line_input_skips_blanks() {
        let file = input_file("  curl/8.5.0  \r\n\n[not json\n");
        let uas = read_input(Some(file.path()), &[]).unwrap();
        assert_eq!(uas, vec!["curl/8.5.0", "[not json"]);
    }

    #[test]
    fn file_beats_inline() {
        let file = input_file("curl/8.5.0\n");
        let inline = vec!["Wget/1.21".to_string()];
        assert_eq!(read_input(Some(file.path()), &inline).unwrap(), vec!["curl/8.5.0"]);
    }

    #[test]
    fn empty_file_falls_back_to_inline() {
        let file = input_file("   \n");
        let inline = vec!["Wget/1.21".to_string()];
        assert_eq!(read_input(Some(file.path()), &inline).unwrap(), inline);
        assert_eq!(read_input(Some(Path::new("/nonexistent/uas.txt")), &inline).unwrap(), inline);
    }

    #[test]
    fn nothing_to_read() {
        let err = read_input(Some(Path::new("/nonexistent/uas.txt")), &[]).unwrap_err();
        assert!(matches!(err, Error::NoInput(_)));
        assert!(matches!(read_input(None, &[]), Err(Error::NoInput(_))));
    }

    #[test]
    fn dump_keeps_input_order() {
        let aggregator = Aggregator::with_backends(&builtin::registry(), &[BackendKind::Woothee]);
        let uas = vec![
            "curl/8.5.0".to_string(),
            "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)".to_string(),
        ];
        let output = input_file("stale content that must be truncated");

        assert_eq!(dump(&aggregator, &uas, output.path()).unwrap(), 2);

        let written = fs::read_to_string(output.path()).unwrap();
        assert!(!written.contains("stale content"));
        let curl = written.find("\"user-agent\": \"curl/8.5.0\"").unwrap();
        let googlebot = written.find("Googlebot/2.1").unwrap();
        assert!(curl < googlebot);
        assert_eq!(written.matches("woothee Parsed Info:").count(), 2);
        assert_eq!(written, uas.iter().map(|ua| aggregator.render(ua)).collect::<String>());
    }
}
