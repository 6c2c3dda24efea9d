use plotters::prelude::*;
use std::collections::HashMap;

/// Categorical color cycle for grouped series and pie slices.
pub struct ColorPalette {
    colors: Vec<&'static str>,
}

impl ColorPalette {
    /// The ten-color "category10" cycle.
    pub fn category10() -> Self {
        Self {
            colors: vec![
                "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd",
                "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf",
            ],
        }
    }

    /// Assign a color to each key in the given order, cycling when there
    /// are more keys than colors.
    pub fn assign_colors(&self, keys: &[String]) -> HashMap<String, String> {
        keys.iter()
            .enumerate()
            .map(|(i, key)| (key.clone(), self.colors[i % self.colors.len()].to_string()))
            .collect()
    }
}

/// Parse a color string to RGBColor: `#rrggbb` hex or a named color
/// (case and spaces ignored, so "light blue" works). Unknown input falls
/// back to the palette's leading blue.
pub fn parse_color(input: &str) -> RGBColor {
    if let Some(hex) = input.strip_prefix('#') {
        if hex.len() == 6 && hex.is_ascii() {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return RGBColor(r, g, b);
            }
        }
    }

    match input.to_ascii_lowercase().replace(' ', "").as_str() {
        "red" => RED,
        "green" => GREEN,
        "blue" => BLUE,
        "black" => BLACK,
        "yellow" => YELLOW,
        "cyan" => CYAN,
        "magenta" => MAGENTA,
        "white" => WHITE,
        "lightblue" => RGBColor(173, 216, 230),
        "orange" => RGBColor(255, 165, 0),
        "purple" => RGBColor(128, 0, 128),
        "gray" | "grey" => RGBColor(128, 128, 128),
        _ => RGBColor(31, 119, 180),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_colors_in_order() {
        let keys: Vec<String> = vec!["COFINS".to_string(), "ICMS".to_string(), "PIS".to_string()];
        let map = ColorPalette::category10().assign_colors(&keys);
        assert_eq!(map["COFINS"], "#1f77b4");
        assert_eq!(map["ICMS"], "#ff7f0e");
        assert_eq!(map["PIS"], "#2ca02c");
    }

    #[test]
    fn test_assign_colors_cycles_past_ten() {
        let keys: Vec<String> = (0..12).map(|i| format!("k{}", i)).collect();
        let map = ColorPalette::category10().assign_colors(&keys);
        assert_eq!(map["k0"], map["k10"]);
        assert_eq!(map["k1"], map["k11"]);
    }

    #[test]
    fn test_parse_color_hex() {
        assert_eq!(parse_color("#1f77b4"), RGBColor(31, 119, 180));
        assert_eq!(parse_color("#FF0000"), RGBColor(255, 0, 0));
    }

    #[test]
    fn test_parse_color_named_with_spaces() {
        assert_eq!(parse_color("light blue"), RGBColor(173, 216, 230));
        assert_eq!(parse_color("Red"), RED);
    }

    #[test]
    fn test_parse_color_unknown_falls_back() {
        assert_eq!(parse_color("chartreuse-ish"), RGBColor(31, 119, 180));
        assert_eq!(parse_color("#12"), RGBColor(31, 119, 180));
    }
}
