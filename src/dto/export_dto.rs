use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Excel,
    Pdf,
    Word,
}

impl ExportFormat {
    pub fn parse(value: Option<&str>) -> Result<Self> {
        match value.map(str::trim).unwrap_or("excel") {
            "" | "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "pdf" => Ok(ExportFormat::Pdf),
            "doc" | "docx" | "word" => Ok(ExportFormat::Word),
            other => Err(Error::BadRequest(format!("Unsupported format: {}", other))),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Word => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Excel => "xlsx",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Word => "docx",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExportQuery {
    pub format: Option<String>,
    pub search: Option<String>,
    pub ids: Option<String>,
}

impl ExportQuery {
    pub fn export_format(&self) -> Result<ExportFormat> {
        ExportFormat::parse(self.format.as_deref())
    }

    /// `ids=1,2,3`; blank entries are skipped, anything else non-numeric is
    /// rejected.
    pub fn selected_ids(&self) -> Result<Vec<i32>> {
        let Some(raw) = self.ids.as_deref() else {
            return Ok(Vec::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<i32>()
                    .map_err(|_| Error::BadRequest(format!("Invalid id in selection: {}", part)))
            })
            .collect()
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_defaults_to_excel() {
        assert_eq!(ExportFormat::parse(None).unwrap(), ExportFormat::Excel);
        assert_eq!(ExportFormat::parse(Some("pdf")).unwrap(), ExportFormat::Pdf);
        assert_eq!(ExportFormat::parse(Some("doc")).unwrap(), ExportFormat::Word);
        assert!(ExportFormat::parse(Some("csv")).is_err());
    }

    #[test]
    fn parses_id_selection() {
        let query = ExportQuery {
            ids: Some("1, 2,,7".into()),
            ..Default::default()
        };
        assert_eq!(query.selected_ids().unwrap(), vec![1, 2, 7]);

        let bad = ExportQuery {
            ids: Some("1,x".into()),
            ..Default::default()
        };
        assert!(bad.selected_ids().is_err());
        assert!(ExportQuery::default().selected_ids().unwrap().is_empty());
    }
}
