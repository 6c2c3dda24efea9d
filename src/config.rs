use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

use crate::RenderOptions;

/// Dashboard configuration, loaded from a JSON file. Only the spreadsheet
/// handle is required; everything else has defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Path or URL of the tax spreadsheet.
    pub spreadsheet: String,
    /// Company line shown with the summary.
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub schema: Schema,
    #[serde(default)]
    pub render: RenderOptions,
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .context(format!("Failed to open config file '{}'", path.display()))?;
        serde_json::from_reader(file)
            .context(format!("Failed to parse config file '{}'", path.display()))
    }

    /// Minimal configuration around a spreadsheet handle.
    pub fn for_spreadsheet(handle: &str) -> Self {
        Self {
            spreadsheet: handle.to_string(),
            company: None,
            schema: Schema::default(),
            render: RenderOptions::default(),
        }
    }
}

/// Column names of the tax sheet. Defaults match the sheet this dashboard
/// was built for; override any field for a differently-labeled sheet.
#[derive(Debug, Clone, Deserialize)]
pub struct Schema {
    #[serde(default = "default_year")]
    pub year: String,
    #[serde(default = "default_tax")]
    pub tax: String,
    #[serde(default = "default_paid")]
    pub paid: String,
    #[serde(default = "default_recoverable")]
    pub recoverable: String,
    #[serde(default = "default_period")]
    pub period: String,
    #[serde(default = "default_interest")]
    pub interest: String,
    #[serde(default = "default_net")]
    pub net: String,
}

fn default_year() -> String {
    "ano_base".to_string()
}
fn default_tax() -> String {
    "tributo".to_string()
}
fn default_paid() -> String {
    "total_pago".to_string()
}
fn default_recoverable() -> String {
    "recuperavel_estimado".to_string()
}
fn default_period() -> String {
    "prazo_recuperacao".to_string()
}
fn default_interest() -> String {
    "juros_estimado".to_string()
}
fn default_net() -> String {
    "liquido_receber".to_string()
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            year: default_year(),
            tax: default_tax(),
            paid: default_paid(),
            recoverable: default_recoverable(),
            period: default_period(),
            interest: default_interest(),
            net: default_net(),
        }
    }
}

impl Schema {
    /// Every column a complete sheet carries, in sheet order. Used for the
    /// once-per-cycle schema report.
    pub fn expected_columns(&self) -> Vec<String> {
        vec![
            self.year.clone(),
            self.tax.clone(),
            self.paid.clone(),
            self.recoverable.clone(),
            self.period.clone(),
            self.interest.clone(),
            self.net.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OutputFormat;
    use std::io::Write;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: DashboardConfig =
            serde_json::from_str(r#"{"spreadsheet": "data/tributos.csv"}"#).unwrap();
        assert_eq!(config.spreadsheet, "data/tributos.csv");
        assert_eq!(config.schema.year, "ano_base");
        assert_eq!(config.schema.net, "liquido_receber");
        assert_eq!(config.render.width, 800);
        assert!(config.company.is_none());
    }

    #[test]
    fn test_full_config_overrides() {
        let raw = r#"{
            "spreadsheet": "https://sheets.example/export?format=csv",
            "company": "Nova Era Tecnologia LTDA",
            "schema": {"year": "ano", "paid": "pago"},
            "render": {"width": 1024, "height": 768, "type": "svg"}
        }"#;
        let config: DashboardConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.company.as_deref(), Some("Nova Era Tecnologia LTDA"));
        assert_eq!(config.schema.year, "ano");
        assert_eq!(config.schema.paid, "pago");
        // Unspecified schema fields keep their defaults
        assert_eq!(config.schema.tax, "tributo");
        assert_eq!(config.render.width, 1024);
        assert!(matches!(config.render.format, OutputFormat::Svg));
    }

    #[test]
    fn test_missing_spreadsheet_is_an_error() {
        let result = serde_json::from_str::<DashboardConfig>("{}");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"spreadsheet": "x.csv"}}"#).unwrap();
        let config = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.spreadsheet, "x.csv");
    }

    #[test]
    fn test_from_file_missing() {
        let result = DashboardConfig::from_file(Path::new("nope/taxdash.json"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("taxdash.json"));
    }

    #[test]
    fn test_expected_columns_in_sheet_order() {
        let columns = Schema::default().expected_columns();
        assert_eq!(columns.first().map(String::as_str), Some("ano_base"));
        assert_eq!(columns.len(), 7);
    }
}
