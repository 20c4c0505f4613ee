//! Human-readable plot descriptions.
//!
//! Three output styles are supported; `Custom` substitutes a fixed set
//! of placeholders into a user-supplied template.

use serde::{Deserialize, Serialize};

/// The user's preferred notification style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// `Mist 1-1 (Small, 3.187m)`
    #[default]
    Simple,
    /// `@SmallMist 1-1 (3.187m)` -- suited to Discord-style ping relays.
    Pings,
    /// A user template with `{placeholder}` substitution.
    Custom,
}

/// Everything a formatter needs to describe one plot.
///
/// Ward and plot numbers are 1-based here; callers convert from the
/// 0-based wire indices.
#[derive(Debug, Clone)]
pub struct PlotSummary {
    pub district_name: String,
    pub world_name: String,
    pub ward_number: u16,
    pub plot_number: u16,
    pub price: u32,
    /// Raw size index: 0 small, 1 medium, anything else large.
    pub size: u8,
}

/// Map a raw plot size index to its display name.
pub fn house_size_name(size: u8) -> &'static str {
    match size {
        0 => "Small",
        1 => "Medium",
        _ => "Large",
    }
}

/// Render one plot in the requested style.
///
/// `custom_template` is only consulted for [`OutputFormat::Custom`].
pub fn format_plot(format: OutputFormat, custom_template: &str, plot: &PlotSummary) -> String {
    let size_name = house_size_name(plot.size);
    let millions = format!("{:.3}", plot.price as f64 / 1_000_000.0);
    let district_no_spaces = plot.district_name.replace(' ', "");

    match format {
        OutputFormat::Simple => format!(
            "{} {}-{} ({}, {}m)",
            plot.district_name, plot.ward_number, plot.plot_number, size_name, millions
        ),
        OutputFormat::Pings => format!(
            "@{}{} {}-{} ({}m)",
            size_name, district_no_spaces, plot.ward_number, plot.plot_number, millions
        ),
        OutputFormat::Custom => custom_template
            .replace("{districtName}", &plot.district_name)
            .replace("{districtNameNoSpaces}", &district_no_spaces)
            .replace("{worldName}", &plot.world_name)
            .replace("{wardNum}", &plot.ward_number.to_string())
            .replace("{plotNum}", &plot.plot_number.to_string())
            .replace("{housePrice}", &plot.price.to_string())
            .replace("{housePriceMillions}", &millions)
            .replace("{houseSizeName}", size_name),
    }
}
