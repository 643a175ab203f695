//! Downloadable renditions of the visible record list.

use crate::GlossaryRecord;
use std::fmt;
use std::str::FromStr;

pub const EXPORT_BASENAME: &str = "crust-and-crumb-glossary";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Markdown,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "md",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Markdown => "text/markdown",
        }
    }

    pub fn file_name(self) -> String {
        format!("{EXPORT_BASENAME}.{}", self.extension())
    }

    pub fn render(self, records: &[&GlossaryRecord]) -> Result<String, serde_json::Error> {
        match self {
            ExportFormat::Json => serde_json::to_string_pretty(records),
            ExportFormat::Csv => Ok(to_csv(records)),
            ExportFormat::Markdown => Ok(to_markdown(records)),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            other => Err(format!("unknown export format {other:?}")),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

pub fn to_csv(records: &[&GlossaryRecord]) -> String {
    let mut lines = vec!["Term,Definition,Category,Difficulty,Tips".to_string()];
    lines.extend(records.iter().map(|record| {
        [
            record.term.as_str(),
            record.definition.as_str(),
            record.category.as_str(),
            record.difficulty.as_str(),
            record.henrys_tips.join("; ").as_str(),
        ]
        .iter()
        .map(|field| csv_field(field))
        .collect::<Vec<_>>()
        .join(",")
    }));
    lines.join("\n")
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

pub fn to_markdown(records: &[&GlossaryRecord]) -> String {
    let mut out = String::from("| Term | Category | Difficulty | Definition | Tips |\n|---|---|---|---|---|\n");
    let rows: Vec<String> = records
        .iter()
        .map(|record| {
            format!(
                "| **{}** | {} | {} | {} | {} |",
                md_cell(&record.term),
                md_cell(&record.category),
                md_cell(&record.difficulty),
                md_cell(&record.definition),
                record
                    .henrys_tips
                    .iter()
                    .map(|tip| md_cell(tip))
                    .collect::<Vec<_>>()
                    .join("<br>")
            )
        })
        .collect();
    out.push_str(&rows.join("\n"));
    out
}

fn md_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}
