//! Result output formatting.

use crate::OutputFormat;
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

/// Named values collected by a command, printed in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Report {
    pub title: String,
    pub fields: Vec<(String, Value)>,
}

impl Report {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            fields: Vec::new(),
        }
    }

    pub fn push(&mut self, name: &str, value: impl Serialize) -> Result<()> {
        self.fields.push((name.to_string(), serde_json::to_value(value)?));
        Ok(())
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn to_json(&self) -> Value {
        let fields = self.fields.iter().cloned().collect::<serde_json::Map<_, _>>();
        serde_json::json!({
            "title": self.title,
            "fields": fields,
        })
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Text => Ok(self.to_text()),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&self.to_json())?),
        }
    }

    fn to_text(&self) -> String {
        let mut out = format!("{}\n{}\n", self.title, "=".repeat(self.title.len()));
        let width = self.fields.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
        for (name, value) in &self.fields {
            match value {
                Value::Array(items) if !items.is_empty() => {
                    out.push_str(&format!("{name}:\n"));
                    for item in items {
                        out.push_str(&format!("  - {}\n", text_value(item)));
                    }
                }
                _ => out.push_str(&format!("{:<width$}  {}\n", format!("{name}:"), text_value(value), width = width + 1)),
            }
        }
        out
    }
}

fn text_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.is_empty() => "(none)".to_string(),
        other => other.to_string(),
    }
}

/// Print a report to stdout.
pub fn print_report(report: &Report, format: OutputFormat) -> Result<()> {
    println!("{}", report.render(format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> Report {
        let mut report = Report::new("Andor");
        report.push("code", 20075).unwrap();
        report.push("name", "DRV_NOT_INITIALIZED").unwrap();
        report.push("message", None::<String>).unwrap();
        report
    }

    #[test]
    fn test_text_output() {
        let text = report().render(OutputFormat::Text).unwrap();
        assert_eq!(
            text,
            "Andor\n=====\ncode:     20075\nname:     DRV_NOT_INITIALIZED\nmessage:  -\n"
        );
    }

    #[test]
    fn test_lists_one_item_per_line() {
        let mut report = Report::new("APT");
        report.push("units", [31, 48]).unwrap();
        report.push("empty", Vec::<i32>::new()).unwrap();
        let text = report.render(OutputFormat::Text).unwrap();
        assert!(text.contains("units:\n  - 31\n  - 48\n"));
        assert!(text.contains("empty:  (none)\n"));
    }

    #[test]
    fn test_json_output() {
        let json: Value = serde_json::from_str(&report().render(OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["title"], "Andor");
        assert_eq!(json["fields"]["code"], 20075);
        assert_eq!(json["fields"]["message"], Value::Null);
    }

    #[test]
    fn test_get() {
        assert_eq!(report().get("name"), Some(&Value::from("DRV_NOT_INITIALIZED")));
        assert_eq!(report().get("missing"), None);
    }
}
