//! Plain-text rendering of a full assessment, used by the one-shot `predict`
//! command. The interactive form draws the same `Presentation` with ratatui.

use crate::chart::{format_value, render_text};
use crate::pipeline::Assessment;
use crate::present::{Advice, ConcernLevel, RiskLabel};
use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::Path;

pub const APP_TITLE: &str = "Breast Cancer Risk Prediction";
pub const APP_SUBTITLE: &str =
    "Use this tool to estimate your breast cancer risk based on lifestyle and reproductive factors.";

/// Reads the banner shown above the title.
///
/// A missing or unreadable file is not an error: the banner is skipped and a
/// warning is logged.
pub fn load_logo(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) if !text.trim().is_empty() => Some(text.trim_end().to_string()),
        Ok(_) => {
            log::warn!("Logo file {} is empty; skipping it", path.display());
            None
        }
        Err(e) => {
            log::warn!("Could not read logo {}: {e}; skipping it", path.display());
            None
        }
    }
}

/// Options for `render_report`.
#[derive(Debug, Clone, Copy)]
pub struct ReportStyle {
    pub chart_width: usize,
    pub colored: bool,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            chart_width: 40,
            colored: false,
        }
    }
}

/// Renders the header, the BMI line, the result and, on the High path, both charts.
pub fn render_report(assessment: &Assessment, logo: Option<&str>, style: ReportStyle) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail, so the results below are ignored.
    if let Some(logo) = logo {
        let _ = writeln!(out, "{logo}\n");
    }
    let _ = writeln!(out, "{APP_TITLE}\n{APP_SUBTITLE}\n");

    let inputs = &assessment.inputs;
    let _ = writeln!(
        out,
        "Calculated BMI: {:.1} (weight {} kg, height {} cm)\n",
        assessment.bmi(),
        format_value(inputs.weight_kg),
        format_value(inputs.height_cm)
    );

    let presentation = &assessment.presentation;
    let marker = match presentation.label {
        RiskLabel::High => "[!]",
        RiskLabel::Low => "[ok]",
    };
    let _ = writeln!(out, "{marker} {}\n", presentation.headline());

    if let Some(chart) = &presentation.contributions {
        let _ = writeln!(out, "{}\n", render_text(chart, style.chart_width, style.colored));
    }
    write_advice(&mut out, presentation.advice);
    if let Some(chart) = &presentation.profile {
        let _ = writeln!(out, "\n{}", render_text(chart, style.chart_width, style.colored));
        let _ = writeln!(out, "{}", concern_legend());
    }
    if let Some(about) = presentation.about_dataset {
        let _ = writeln!(out, "\n{about}");
    }
    out
}

fn concern_legend() -> String {
    let entries: Vec<String> = [ConcernLevel::High, ConcernLevel::Moderate, ConcernLevel::Low]
        .iter()
        .map(|level| format!("{} = {}", level.color_name(), level.describe()))
        .collect();
    format!("Legend: {}", entries.join(", "))
}

fn write_advice(out: &mut String, advice: &Advice) {
    let _ = writeln!(out, "{}:", advice.heading);
    for point in advice.points {
        let _ = writeln!(out, "  - {point}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode;
    use crate::inputs::RiskInputs;
    use crate::model::RiskClass;
    use crate::present::present;

    fn assessment(class: RiskClass) -> Assessment {
        let inputs = RiskInputs::default();
        let features = encode(&inputs);
        let presentation = present(&features, class);
        Assessment {
            inputs,
            features,
            class,
            presentation,
        }
    }

    #[test]
    fn high_report_shows_both_charts_and_actions() {
        let text = render_report(&assessment(RiskClass::High), None, ReportStyle::default());
        assert!(text.contains("Calculated BMI: 22.0 (weight 60 kg, height 165 cm)"));
        assert!(text.contains("[!] Predicted Risk: High for Breast Cancer"));
        assert!(text.contains("Your Risk Factor Contributions"));
        assert!(text.contains("Your Personal Risk Profile"));
        assert!(text.contains("Recommended Actions:"));
        assert!(text.contains(
            "Legend: red = high concern, orange = moderate concern, green = low concern"
        ));
        assert!(!text.contains("Simulated Breast Cancer Risk Dataset"));
    }

    #[test]
    fn low_report_has_no_charts() {
        let text = render_report(
            &assessment(RiskClass::Low),
            Some("LOGO"),
            ReportStyle::default(),
        );
        assert!(text.starts_with("LOGO\n"));
        assert!(text.contains("[ok] Predicted Risk: Low for Breast Cancer"));
        assert!(text.contains("You're Doing Well:"));
        assert!(text.contains("Simulated Breast Cancer Risk Dataset"));
        assert!(!text.contains("Your Risk Factor Contributions"));
        assert!(!text.contains("Your Personal Risk Profile"));
        assert!(!text.contains("Legend:"));
    }

    #[test]
    fn missing_logo_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_logo(&dir.path().join("logo.txt")), None);

        let path = dir.path().join("banner.txt");
        fs::write(&path, "  /\\_/\\\n ( o.o )\n\n").unwrap();
        assert_eq!(load_logo(&path).as_deref(), Some("  /\\_/\\\n ( o.o )"));
    }
}
