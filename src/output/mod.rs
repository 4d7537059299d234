//! Output formatters for analysis results.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::core::Result;

/// Output format enum.
#[derive(Clone, Copy, Debug, Default)]
pub enum Format {
    #[default]
    Json,
    Markdown,
    Text,
}

impl Format {
    /// Format any serializable value to the writer.
    pub fn format<T: Serialize, W: Write>(&self, data: &T, writer: &mut W) -> Result<()> {
        let value = serde_json::to_value(data)?;
        match self {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, &value)?;
                writeln!(writer)?;
            }
            Format::Markdown => write_markdown(&value, writer, 1)?,
            Format::Text => write_text(&value, writer, 0)?,
        }
        Ok(())
    }
}

/// Write a pretty JSON result file.
pub fn write_json_file<T: Serialize>(data: &T, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)?;
    writeln!(writer)?;
    Ok(())
}

fn write_markdown<W: Write>(value: &Value, writer: &mut W, depth: usize) -> Result<()> {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                match val {
                    Value::Object(_) | Value::Array(_) => {
                        writeln!(writer, "{} {}\n", "#".repeat(depth.min(6)), title_case(key))?;
                        write_markdown(val, writer, depth + 1)?;
                    }
                    _ => writeln!(writer, "**{}**: {}\n", title_case(key), scalar(val))?,
                }
            }
        }
        Value::Array(items) => {
            if items.is_empty() {
                writeln!(writer, "_none_\n")?;
            }
            for item in items {
                match item {
                    Value::Object(_) | Value::Array(_) => {
                        writeln!(writer, "---\n")?;
                        write_markdown(item, writer, depth)?;
                    }
                    _ => writeln!(writer, "- {}", scalar(item))?,
                }
            }
        }
        _ => writeln!(writer, "{}\n", scalar(value))?,
    }
    Ok(())
}

fn write_text<W: Write>(value: &Value, writer: &mut W, indent: usize) -> Result<()> {
    let prefix = "  ".repeat(indent);
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                match val {
                    Value::Object(_) | Value::Array(_) => {
                        writeln!(writer, "{prefix}{}:", title_case(key))?;
                        write_text(val, writer, indent + 1)?;
                    }
                    _ => writeln!(writer, "{prefix}{}: {}", title_case(key), scalar(val))?,
                }
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                writeln!(writer, "{prefix}[{i}]")?;
                write_text(item, writer, indent + 1)?;
            }
        }
        _ => writeln!(writer, "{prefix}{}", scalar(value))?,
    }
    Ok(())
}

fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() != 0.0 => format!("{f:.3}"),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_format_round_trips() {
        let data = json!({"satd_count": 3, "chains": [{"id": "chain-1"}]});
        let mut out = Vec::new();
        Format::Json.format(&data, &mut out).unwrap();
        let parsed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, data);
    }

    #[test]
    fn test_text_format_indents() {
        let data = json!({"summary": {"total": 2}});
        let mut out = Vec::new();
        Format::Text.format(&data, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Summary:"));
        assert!(text.contains("  Total: 2"));
    }

    #[test]
    fn test_markdown_headers_and_scalars() {
        let data = json!({"report": {"score": 0.5}});
        let mut out = Vec::new();
        Format::Markdown.format(&data, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("# Report"));
        assert!(text.contains("**Score**: 0.500"));
    }

    #[test]
    fn test_write_json_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("out.json");
        write_json_file(&json!({"ok": true}), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"ok\": true"));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("satd_count"), "Satd Count");
        assert_eq!(title_case("duration_ms"), "Duration Ms");
    }
}
