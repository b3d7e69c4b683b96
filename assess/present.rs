//! # Risk Presentation
//!
//! Everything shown after the Predict trigger: the risk label, the two bar charts
//! and the fixed advice text. Nothing here feeds back into the prediction.

use crate::chart::{BarTone, ChartBar, ChartData};
use crate::encode::{Factor, FeatureVector};
use crate::model::RiskClass;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskLabel {
    Low,
    High,
}

impl From<RiskClass> for RiskLabel {
    fn from(class: RiskClass) -> Self {
        match class {
            RiskClass::High => RiskLabel::High,
            RiskClass::Low => RiskLabel::Low,
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskLabel::Low => "Low",
            RiskLabel::High => "High",
        })
    }
}

/// Presentation-only severity of a single factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConcernLevel {
    Low,
    Moderate,
    High,
}

impl ConcernLevel {
    /// Name of the color the level is drawn in.
    pub fn color_name(self) -> &'static str {
        match self {
            ConcernLevel::High => "red",
            ConcernLevel::Moderate => "orange",
            ConcernLevel::Low => "green",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            ConcernLevel::High => "high concern",
            ConcernLevel::Moderate => "moderate concern",
            ConcernLevel::Low => "low concern",
        }
    }
}

/// Factors that turn red as soon as they are present (encoded value >= 1).
pub const HIGH_CONCERN_FACTORS: [Factor; 6] = [
    Factor::Age,
    Factor::Bmi,
    Factor::FamilyHistory,
    Factor::HormoneTherapy,
    Factor::Smoking,
    Factor::PollutionExposure,
];

/// Hand-authored coloring rule for the risk profile chart.
///
/// This is a fixed display heuristic, unrelated to how the classifier weighs its
/// inputs. Rules are tried in order: a listed factor at 1 or more is high
/// concern, anything at 0.5 or more is moderate, everything else is low.
pub fn classify_concern(factor: Factor, encoded_value: f64) -> ConcernLevel {
    if HIGH_CONCERN_FACTORS.contains(&factor) && encoded_value >= 1.0 {
        ConcernLevel::High
    } else if encoded_value >= 0.5 {
        ConcernLevel::Moderate
    } else {
        ConcernLevel::Low
    }
}

/// Static text shown under the result, picked by the label alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advice {
    pub heading: &'static str,
    pub points: &'static [&'static str],
}

pub const HIGH_RISK_ADVICE: Advice = Advice {
    heading: "Recommended Actions",
    points: &[
        "Please consult a healthcare professional for proper screening (e.g., mammogram).",
        "Consider lifestyle changes like reducing alcohol, increasing physical activity.",
        "Maintain regular self-breast examinations.",
        "If you're over 40, follow up with a clinical breast exam and imaging.",
    ],
};

pub const LOW_RISK_ADVICE: Advice = Advice {
    heading: "You're Doing Well",
    points: &[
        "Continue regular health checkups and maintain healthy habits.",
        "Stay physically active and eat a balanced diet.",
        "Know your family history and report changes to your doctor.",
        "Do routine breast self-exams and follow screening guidelines based on your age.",
    ],
};

pub const ABOUT_DATASET: &str = "\
Simulated Breast Cancer Risk Dataset

This tool is powered by a simulated dataset designed to reflect real-world breast \
cancer risk factors based on clinical guidelines, epidemiological research and risk \
prediction frameworks.

Features cover demographics (age, education), reproductive history (age at first \
pregnancy, parity), lifestyle (BMI, smoking, alcohol intake, physical activity), \
environmental exposures (air pollution, urban residence) and medical history \
(hormone therapy, oral contraceptive use, family history).

Disclaimer: this tool is for educational and research purposes only. The dataset \
does not represent real patient records and must not be used for clinical \
decision-making.";

pub const CONTRIBUTIONS_TITLE: &str = "Your Risk Factor Contributions";
pub const CONTRIBUTIONS_AXIS: &str = "Reported Level / Presence of Risk";
pub const PROFILE_TITLE: &str = "Your Personal Risk Profile";
pub const PROFILE_AXIS: &str = "Relative Level / Risk Presence";

pub fn advice_for(label: RiskLabel) -> &'static Advice {
    match label {
        RiskLabel::High => &HIGH_RISK_ADVICE,
        RiskLabel::Low => &LOW_RISK_ADVICE,
    }
}

/// The complete result panel for one prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    pub label: RiskLabel,
    /// Raw encoded values in a single color. High only.
    pub contributions: Option<ChartData>,
    /// Encoded values colored by concern level. High only.
    pub profile: Option<ChartData>,
    pub advice: &'static Advice,
    /// Dataset background, shown on the Low path.
    pub about_dataset: Option<&'static str>,
}

impl Presentation {
    pub fn headline(&self) -> String {
        format!("Predicted Risk: {} for Breast Cancer", self.label)
    }
}

/// Builds the result panel in a single pass over the feature vector.
pub fn present(features: &FeatureVector, class: RiskClass) -> Presentation {
    let label = RiskLabel::from(class);
    match label {
        RiskLabel::High => Presentation {
            label,
            contributions: Some(contributions_chart(features)),
            profile: Some(profile_chart(features)),
            advice: advice_for(label),
            about_dataset: None,
        },
        RiskLabel::Low => Presentation {
            label,
            contributions: None,
            profile: None,
            advice: advice_for(label),
            about_dataset: Some(ABOUT_DATASET),
        },
    }
}

fn contributions_chart(features: &FeatureVector) -> ChartData {
    ChartData {
        title: CONTRIBUTIONS_TITLE,
        axis_label: CONTRIBUTIONS_AXIS,
        bars: features
            .factors()
            .map(|(factor, value)| ChartBar {
                label: factor.label(),
                value,
                tone: BarTone::Uniform,
            })
            .collect(),
    }
}

fn profile_chart(features: &FeatureVector) -> ChartData {
    ChartData {
        title: PROFILE_TITLE,
        axis_label: PROFILE_AXIS,
        bars: features
            .factors()
            .map(|(factor, value)| ChartBar {
                label: factor.label(),
                value,
                tone: BarTone::Concern(classify_concern(factor, value)),
            })
            .collect(),
    }
}
