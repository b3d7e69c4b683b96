//! # Form Inputs
//!
//! The raw values a user selects on the form, before any numeric encoding.
//! Every numeric field carries a fixed widget range; the categorical fields are
//! closed enums so an unknown choice can never reach the encoder.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ========================================================================================
//                                 WIDGET RANGES
// ========================================================================================

/// Inclusive range and default for a numeric form widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRange {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub step: f64,
}

impl FieldRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.default;
        }
        value.clamp(self.min, self.max)
    }

    fn check(&self, value: f64) -> Result<(), InputError> {
        if !value.is_finite() {
            return Err(InputError::NotFinite { field: self.name });
        }
        if !self.contains(value) {
            return Err(InputError::OutOfRange {
                field: self.name,
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

pub const AGE: FieldRange = FieldRange {
    name: "age",
    min: 18.0,
    max: 90.0,
    default: 30.0,
    step: 1.0,
};
pub const WEIGHT_KG: FieldRange = FieldRange {
    name: "weight",
    min: 30.0,
    max: 200.0,
    default: 60.0,
    step: 0.5,
};
pub const HEIGHT_CM: FieldRange = FieldRange {
    name: "height",
    min: 100.0,
    max: 250.0,
    default: 165.0,
    step: 0.5,
};
pub const MENARCHE_AGE: FieldRange = FieldRange {
    name: "menarche_age",
    min: 8.0,
    max: 18.0,
    default: 12.0,
    step: 1.0,
};
pub const FIRST_PREGNANCY_AGE: FieldRange = FieldRange {
    name: "first_pregnancy_age",
    min: 12.0,
    max: 50.0,
    default: 25.0,
    step: 1.0,
};
pub const PARITY: FieldRange = FieldRange {
    name: "parity",
    min: 0.0,
    max: 10.0,
    default: 2.0,
    step: 1.0,
};
pub const ALCOHOL_INTAKE: FieldRange = FieldRange {
    name: "alcohol_intake",
    min: 0.0,
    max: 10.0,
    default: 1.0,
    step: 0.1,
};

// ========================================================================================
//                                    ERRORS
// ========================================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("'{field}' is {value}, outside the allowed range [{min}, {max}].")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("'{field}' must be a finite number.")]
    NotFinite { field: &'static str },
    #[error("'{value}' is not a valid choice for {field}. Expected one of: {expected}.")]
    UnknownChoice {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

// ========================================================================================
//                                CATEGORICAL CHOICES
// ========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum YesNo {
    #[default]
    No,
    Yes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SmokingStatus {
    #[default]
    Never,
    Former,
    Current,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActivityLevel {
    #[default]
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EducationLevel {
    #[default]
    None,
    Primary,
    Secondary,
    Tertiary,
}

/// A closed set of form choices. The numeric code of a choice is its position
/// in `ALL`, which is also the order the form lists them in.
pub trait Choice: Copy + PartialEq + Sized + 'static {
    const FIELD: &'static str;
    const ALL: &'static [Self];

    fn label(self) -> &'static str;

    fn expected() -> &'static str;

    fn index(self) -> usize {
        Self::ALL.iter().position(|&c| c == self).unwrap_or(0)
    }

    fn code(self) -> f64 {
        self.index() as f64
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    fn parse_choice(s: &str) -> Result<Self, InputError> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| InputError::UnknownChoice {
                field: Self::FIELD,
                value: wanted.to_string(),
                expected: Self::expected(),
            })
    }
}

impl Choice for YesNo {
    const FIELD: &'static str = "yes/no answer";
    const ALL: &'static [Self] = &[YesNo::No, YesNo::Yes];

    fn label(self) -> &'static str {
        match self {
            YesNo::No => "No",
            YesNo::Yes => "Yes",
        }
    }

    fn expected() -> &'static str {
        "No, Yes"
    }
}

impl Choice for SmokingStatus {
    const FIELD: &'static str = "smoking status";
    const ALL: &'static [Self] = &[
        SmokingStatus::Never,
        SmokingStatus::Former,
        SmokingStatus::Current,
    ];

    fn label(self) -> &'static str {
        match self {
            SmokingStatus::Never => "Never",
            SmokingStatus::Former => "Former",
            SmokingStatus::Current => "Current",
        }
    }

    fn expected() -> &'static str {
        "Never, Former, Current"
    }
}

impl Choice for ActivityLevel {
    const FIELD: &'static str = "physical activity level";
    const ALL: &'static [Self] = &[
        ActivityLevel::Low,
        ActivityLevel::Moderate,
        ActivityLevel::High,
    ];

    fn label(self) -> &'static str {
        match self {
            ActivityLevel::Low => "Low",
            ActivityLevel::Moderate => "Moderate",
            ActivityLevel::High => "High",
        }
    }

    fn expected() -> &'static str {
        "Low, Moderate, High"
    }
}

impl Choice for EducationLevel {
    const FIELD: &'static str = "education level";
    const ALL: &'static [Self] = &[
        EducationLevel::None,
        EducationLevel::Primary,
        EducationLevel::Secondary,
        EducationLevel::Tertiary,
    ];

    fn label(self) -> &'static str {
        match self {
            EducationLevel::None => "None",
            EducationLevel::Primary => "Primary",
            EducationLevel::Secondary => "Secondary",
            EducationLevel::Tertiary => "Tertiary",
        }
    }

    fn expected() -> &'static str {
        "None, Primary, Secondary, Tertiary"
    }
}

macro_rules! choice_traits {
    ($($ty:ty),+) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.label())
                }
            }

            impl FromStr for $ty {
                type Err = InputError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    <$ty as Choice>::parse_choice(s)
                }
            }
        )+
    };
}

choice_traits!(YesNo, SmokingStatus, ActivityLevel, EducationLevel);

// ========================================================================================
//                                  RISK INPUTS
// ========================================================================================

/// Everything the form collects for one assessment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskInputs {
    pub age: u32,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub menarche_age: u32,
    pub first_pregnancy_age: u32,
    pub parity: u32,
    pub family_history: YesNo,
    pub oral_contraceptive_use: YesNo,
    pub hormone_therapy_use: YesNo,
    pub urban_residence: YesNo,
    pub exposure_to_pollution: YesNo,
    pub breastfeeding_history: YesNo,
    pub smoking_status: SmokingStatus,
    pub alcohol_intake: f64,
    pub physical_activity_level: ActivityLevel,
    pub education_level: EducationLevel,
}

impl Default for RiskInputs {
    /// The form's initial widget state.
    fn default() -> Self {
        Self {
            age: AGE.default as u32,
            weight_kg: WEIGHT_KG.default,
            height_cm: HEIGHT_CM.default,
            menarche_age: MENARCHE_AGE.default as u32,
            first_pregnancy_age: FIRST_PREGNANCY_AGE.default as u32,
            parity: PARITY.default as u32,
            family_history: YesNo::default(),
            oral_contraceptive_use: YesNo::default(),
            hormone_therapy_use: YesNo::default(),
            urban_residence: YesNo::default(),
            exposure_to_pollution: YesNo::default(),
            breastfeeding_history: YesNo::default(),
            smoking_status: SmokingStatus::default(),
            alcohol_intake: ALCOHOL_INTAKE.default,
            physical_activity_level: ActivityLevel::default(),
            education_level: EducationLevel::default(),
        }
    }
}

impl RiskInputs {
    /// Body-mass index from weight and height, rounded to one decimal place.
    ///
    /// Computed as `weight / (height in metres)^2` in floating point, so 80 kg at
    /// 160 cm is 31.2499... and is reported as 31.2.
    pub fn bmi(&self) -> f64 {
        round_one_decimal(bmi_raw(self.weight_kg, self.height_cm))
    }

    /// Checks every numeric field against its widget range.
    pub fn validate(&self) -> Result<(), InputError> {
        AGE.check(f64::from(self.age))?;
        WEIGHT_KG.check(self.weight_kg)?;
        HEIGHT_CM.check(self.height_cm)?;
        MENARCHE_AGE.check(f64::from(self.menarche_age))?;
        FIRST_PREGNANCY_AGE.check(f64::from(self.first_pregnancy_age))?;
        PARITY.check(f64::from(self.parity))?;
        ALCOHOL_INTAKE.check(self.alcohol_intake)?;
        Ok(())
    }

    /// Returns a copy with every numeric field pulled back into its widget range.
    pub fn clamped(&self) -> Self {
        Self {
            age: AGE.clamp(f64::from(self.age)) as u32,
            weight_kg: WEIGHT_KG.clamp(self.weight_kg),
            height_cm: HEIGHT_CM.clamp(self.height_cm),
            menarche_age: MENARCHE_AGE.clamp(f64::from(self.menarche_age)) as u32,
            first_pregnancy_age: FIRST_PREGNANCY_AGE.clamp(f64::from(self.first_pregnancy_age))
                as u32,
            parity: PARITY.clamp(f64::from(self.parity)) as u32,
            alcohol_intake: ALCOHOL_INTAKE.clamp(self.alcohol_intake),
            ..*self
        }
    }
}

fn bmi_raw(weight_kg: f64, height_cm: f64) -> f64 {
    weight_kg / (height_cm / 100.0).powi(2)
}

pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bmi_rounds_to_one_decimal() {
        let inputs = RiskInputs {
            weight_kg: 60.0,
            height_cm: 165.0,
            ..RiskInputs::default()
        };
        assert_eq!(inputs.bmi(), 22.0);
    }

    #[test]
    fn bmi_rounds_the_metre_based_quotient() {
        // 1.6^2 is slightly above 2.56, so these quotients sit just below the half.
        let bmi = |weight_kg| {
            RiskInputs {
                weight_kg,
                height_cm: 160.0,
                ..RiskInputs::default()
            }
            .bmi()
        };
        assert!(bmi_raw(80.0, 160.0) < 31.25);
        assert_eq!(bmi(80.0), 31.2);
        assert_eq!(bmi(48.0), 18.7);
        assert_eq!(bmi(112.0), 43.7);
        assert_eq!(bmi(176.0), 68.7);
    }

    #[test]
    fn exact_halves_round_to_even() {
        assert_eq!(round_one_decimal(0.25), 0.2);
        assert_eq!(round_one_decimal(0.75), 0.8);
    }

    #[test]
    fn defaults_match_initial_widgets_and_validate() {
        let inputs = RiskInputs::default();
        assert_eq!(inputs.age, 30);
        assert_eq!(inputs.parity, 2);
        assert_eq!(inputs.smoking_status, SmokingStatus::Never);
        assert_eq!(inputs.education_level, EducationLevel::None);
        assert!(inputs.validate().is_ok());
    }

    #[test]
    fn out_of_range_age_is_rejected() {
        let inputs = RiskInputs {
            age: 95,
            ..RiskInputs::default()
        };
        match inputs.validate() {
            Err(InputError::OutOfRange { field, value, .. }) => {
                assert_eq!(field, "age");
                assert_eq!(value, 95.0);
            }
            other => panic!("Expected OutOfRange for age, got {other:?}"),
        }
    }

    #[test]
    fn non_finite_weight_is_rejected() {
        let inputs = RiskInputs {
            weight_kg: f64::NAN,
            ..RiskInputs::default()
        };
        assert_eq!(
            inputs.validate(),
            Err(InputError::NotFinite { field: "weight" })
        );
    }

    #[test]
    fn clamped_pulls_fields_into_range() {
        let wild = RiskInputs {
            age: 7,
            weight_kg: 500.0,
            height_cm: f64::NAN,
            parity: 40,
            alcohol_intake: -3.0,
            ..RiskInputs::default()
        };
        let tame = wild.clamped();
        assert_eq!(tame.age, 18);
        assert_eq!(tame.weight_kg, 200.0);
        assert_eq!(tame.height_cm, 165.0);
        assert_eq!(tame.parity, 10);
        assert_eq!(tame.alcohol_intake, 0.0);
        assert!(tame.validate().is_ok());
    }

    #[test]
    fn choices_parse_case_insensitively() {
        assert_eq!("yes".parse::<YesNo>(), Ok(YesNo::Yes));
        assert_eq!(" Current ".parse::<SmokingStatus>(), Ok(SmokingStatus::Current));
        assert_eq!("TERTIARY".parse::<EducationLevel>(), Ok(EducationLevel::Tertiary));
        assert!(matches!(
            "sometimes".parse::<ActivityLevel>(),
            Err(InputError::UnknownChoice { .. })
        ));
    }

    #[test]
    fn choice_codes_follow_form_order() {
        assert_eq!(YesNo::No.code(), 0.0);
        assert_eq!(YesNo::Yes.code(), 1.0);
        assert_eq!(SmokingStatus::Former.code(), 1.0);
        assert_eq!(ActivityLevel::High.code(), 2.0);
        assert_eq!(EducationLevel::Secondary.code(), 2.0);
    }

    #[test]
    fn choices_cycle_in_both_directions() {
        assert_eq!(SmokingStatus::Current.next(), SmokingStatus::Never);
        assert_eq!(SmokingStatus::Never.prev(), SmokingStatus::Current);
        assert_eq!(YesNo::No.next(), YesNo::Yes);
    }
}
