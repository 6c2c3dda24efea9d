// Library exports for taxdash

pub mod frame;
pub mod notify;
pub mod prepare;
pub mod figure;
pub mod plot;
pub mod metrics;
pub mod filter;
pub mod source;
pub mod palette;
pub mod render;
pub mod config;
pub mod dashboard;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            format: OutputFormat::Png,
        }
    }
}
