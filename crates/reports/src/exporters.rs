//! Report exporters - CSV, JSON, Markdown
//!
//! Every report is a title, a header row, data rows and a short summary;
//! exporters only decide how those are rendered.

use std::fmt;
use std::str::FromStr;

/// Renders a [`ReportData`] into one output format
pub trait ReportExporter {
    fn export(&self, report: &dyn ReportData) -> String;

    /// File extension, without the dot
    fn extension(&self) -> &'static str;

    fn mime_type(&self) -> &'static str;
}

/// Tabular data behind a report
pub trait ReportData {
    fn title(&self) -> &str;

    fn headers(&self) -> Vec<String>;

    fn rows(&self) -> Vec<Vec<String>>;

    /// Key/value lines shown above the table
    fn summary(&self) -> Vec<(String, String)>;
}

/// Output format selected by name (`csv`, `json`, `md`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn exporter(&self) -> Box<dyn ReportExporter> {
        match self {
            ReportFormat::Csv => Box::new(CsvExporter::new()),
            ReportFormat::Json => Box::new(JsonExporter::new()),
            ReportFormat::Markdown => Box::new(MarkdownExporter::new()),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ReportFormat::Csv),
            "json" => Ok(ReportFormat::Json),
            "md" | "markdown" => Ok(ReportFormat::Markdown),
            other => Err(format!("unknown report format '{}' (csv, json, md)", other)),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
            ReportFormat::Markdown => "md",
        };
        write!(f, "{}", name)
    }
}

// ============================================================================
// CSV Exporter
// ============================================================================

/// CSV exporter. Spreadsheets in es-CL locales want `with_delimiter(';')`.
pub struct CsvExporter {
    delimiter: char,
    include_header: bool,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self {
            delimiter: ',',
            include_header: true,
        }
    }
}

impl CsvExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn without_header(mut self) -> Self {
        self.include_header = false;
        self
    }

    fn escape(&self, field: &str) -> String {
        let needs_quotes = field.contains(self.delimiter)
            || field.contains('"')
            || field.contains('\n')
            || field.contains('\r');
        if needs_quotes {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn write_line(&self, output: &mut String, fields: &[String]) {
        let line: Vec<String> = fields.iter().map(|f| self.escape(f)).collect();
        output.push_str(&line.join(&self.delimiter.to_string()));
        output.push('\n');
    }
}

impl ReportExporter for CsvExporter {
    fn export(&self, report: &dyn ReportData) -> String {
        let mut output = String::new();

        if self.include_header {
            self.write_line(&mut output, &report.headers());
        }
        for row in report.rows() {
            self.write_line(&mut output, &row);
        }

        output
    }

    fn extension(&self) -> &'static str {
        "csv"
    }

    fn mime_type(&self) -> &'static str {
        "text/csv"
    }
}

// ============================================================================
// JSON Exporter
// ============================================================================

pub struct JsonExporter {
    pretty: bool,
}

impl Default for JsonExporter {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl JsonExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }
}

impl ReportExporter for JsonExporter {
    fn export(&self, report: &dyn ReportData) -> String {
        use serde_json::{Map, Value};

        let headers = report.headers();

        let data: Vec<Value> = report
            .rows()
            .into_iter()
            .map(|row| {
                let obj: Map<String, Value> = headers
                    .iter()
                    .cloned()
                    .zip(row.into_iter().map(Value::String).chain(std::iter::repeat(Value::Null)))
                    .collect();
                Value::Object(obj)
            })
            .collect();

        let summary: Map<String, Value> = report
            .summary()
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();

        let output = serde_json::json!({
            "title": report.title(),
            "summary": summary,
            "data": data,
        });

        let rendered = if self.pretty {
            serde_json::to_string_pretty(&output)
        } else {
            serde_json::to_string(&output)
        };
        rendered.unwrap_or_default()
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn mime_type(&self) -> &'static str {
        "application/json"
    }
}

// ============================================================================
// Markdown Exporter
// ============================================================================

pub struct MarkdownExporter {
    include_summary: bool,
}

impl Default for MarkdownExporter {
    fn default() -> Self {
        Self {
            include_summary: true,
        }
    }
}

impl MarkdownExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_summary(mut self) -> Self {
        self.include_summary = false;
        self
    }

    fn cell(value: &str) -> String {
        value.replace('|', "\\|").replace('\n', " ")
    }

    fn table_line(cells: &[String]) -> String {
        let cells: Vec<String> = cells.iter().map(|c| Self::cell(c)).collect();
        format!("| {} |\n", cells.join(" | "))
    }
}

impl ReportExporter for MarkdownExporter {
    fn export(&self, report: &dyn ReportData) -> String {
        let mut output = format!("# {}\n\n", report.title());

        if self.include_summary {
            output.push_str("## Summary\n\n");
            for (key, value) in report.summary() {
                output.push_str(&format!("- **{}**: {}\n", key, value));
            }
            output.push('\n');
        }

        let headers = report.headers();
        if headers.is_empty() {
            return output;
        }

        output.push_str(&Self::table_line(&headers));
        output.push_str(&Self::table_line(&vec!["---".to_string(); headers.len()]));

        let rows = report.rows();
        if rows.is_empty() {
            output.push_str("\n_No rows._\n");
        }
        for row in rows {
            output.push_str(&Self::table_line(&row));
        }

        output
    }

    fn extension(&self) -> &'static str {
        "md"
    }

    fn mime_type(&self) -> &'static str {
        "text/markdown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        rows: Vec<Vec<String>>,
    }

    impl ReportData for Fixture {
        fn title(&self) -> &str {
            "Fixture"
        }

        fn headers(&self) -> Vec<String> {
            vec!["RUT".to_string(), "Faltantes".to_string()]
        }

        fn rows(&self) -> Vec<Vec<String>> {
            self.rows.clone()
        }

        fn summary(&self) -> Vec<(String, String)> {
            vec![("Persons".to_string(), self.rows.len().to_string())]
        }
    }

    fn fixture() -> Fixture {
        Fixture {
            rows: vec![
                vec!["12345678-5".to_string(), "license, induction".to_string()],
                vec!["11111111-1".to_string(), "a|b".to_string()],
            ],
        }
    }

    #[test]
    fn test_csv_quotes_delimiter_and_quotes() {
        let output = CsvExporter::new().export(&fixture());

        assert!(output.starts_with("RUT,Faltantes\n"));
        assert!(output.contains("12345678-5,\"license, induction\""));
    }

    #[test]
    fn test_csv_semicolon_without_header() {
        let output = CsvExporter::new()
            .with_delimiter(';')
            .without_header()
            .export(&fixture());

        assert!(!output.contains("RUT"));
        assert!(output.contains("12345678-5;license, induction\n"));
    }

    #[test]
    fn test_json_rows_keyed_by_header() {
        let output = JsonExporter::new().compact().export(&fixture());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["title"], "Fixture");
        assert_eq!(value["summary"]["Persons"], "2");
        assert_eq!(value["data"][0]["RUT"], "12345678-5");
        assert_eq!(value["data"][1]["Faltantes"], "a|b");
    }

    #[test]
    fn test_markdown_escapes_pipes() {
        let exporter = MarkdownExporter::new();
        let output = exporter.export(&fixture());

        assert!(output.contains("# Fixture"));
        assert!(output.contains("- **Persons**: 2"));
        assert!(output.contains("| RUT | Faltantes |"));
        assert!(output.contains("| --- | --- |"));
        assert!(output.contains("| 11111111-1 | a\\|b |"));
        assert_eq!(exporter.extension(), "md");
    }

    #[test]
    fn test_markdown_empty_table() {
        let output = MarkdownExporter::new()
            .without_summary()
            .export(&Fixture { rows: Vec::new() });

        assert!(!output.contains("## Summary"));
        assert!(output.contains("_No rows._"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<ReportFormat>().unwrap(), ReportFormat::Csv);
        assert_eq!("markdown".parse::<ReportFormat>().unwrap(), ReportFormat::Markdown);
        assert!("xlsx".parse::<ReportFormat>().is_err());
        assert_eq!(ReportFormat::Json.exporter().mime_type(), "application/json");
    }
}
