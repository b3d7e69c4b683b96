//! # Feature Encoding
//!
//! Turns a `RiskInputs` into the fixed-order numeric vector the classifier was
//! trained on. The order of `Factor::ALL` is the contract with the model
//! artifact; the artifact stores the same names and is rejected at load time if
//! they disagree.

use crate::inputs::{Choice, RiskInputs};
use ndarray::{Array1, ArrayView1};
use std::fmt;
use std::ops::Deref;

/// Number of features the classifier consumes.
pub const FEATURE_COUNT: usize = 15;

/// One input factor of the feature vector, in canonical model order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Factor {
    Age,
    Bmi,
    MenarcheAge,
    FirstPregnancyAge,
    Parity,
    FamilyHistory,
    OralContraceptives,
    HormoneTherapy,
    Smoking,
    AlcoholIntake,
    PhysicalActivity,
    Education,
    UrbanResidence,
    PollutionExposure,
    Breastfeeding,
}

impl Factor {
    pub const ALL: [Factor; FEATURE_COUNT] = [
        Factor::Age,
        Factor::Bmi,
        Factor::MenarcheAge,
        Factor::FirstPregnancyAge,
        Factor::Parity,
        Factor::FamilyHistory,
        Factor::OralContraceptives,
        Factor::HormoneTherapy,
        Factor::Smoking,
        Factor::AlcoholIntake,
        Factor::PhysicalActivity,
        Factor::Education,
        Factor::UrbanResidence,
        Factor::PollutionExposure,
        Factor::Breastfeeding,
    ];

    /// Column name used by the training data and stored in the model artifact.
    pub fn feature_name(self) -> &'static str {
        match self {
            Factor::Age => "age",
            Factor::Bmi => "bmi",
            Factor::MenarcheAge => "menarche_age",
            Factor::FirstPregnancyAge => "first_pregnancy_age",
            Factor::Parity => "parity",
            Factor::FamilyHistory => "family_history",
            Factor::OralContraceptives => "oral_contraceptive_use",
            Factor::HormoneTherapy => "hormone_therapy_use",
            Factor::Smoking => "smoking_status",
            Factor::AlcoholIntake => "alcohol_intake",
            Factor::PhysicalActivity => "physical_activity_level",
            Factor::Education => "education_level",
            Factor::UrbanResidence => "urban_residence",
            Factor::PollutionExposure => "exposure_to_pollution",
            Factor::Breastfeeding => "breastfeeding_history",
        }
    }

    /// Label shown next to the factor's bar in the charts.
    pub fn label(self) -> &'static str {
        match self {
            Factor::Age => "Age",
            Factor::Bmi => "BMI",
            Factor::MenarcheAge => "Menarche Age",
            Factor::FirstPregnancyAge => "First Pregnancy Age",
            Factor::Parity => "Parity",
            Factor::FamilyHistory => "Family History",
            Factor::OralContraceptives => "Oral Contraceptives",
            Factor::HormoneTherapy => "Hormone Therapy",
            Factor::Smoking => "Smoking",
            Factor::AlcoholIntake => "Alcohol Intake",
            Factor::PhysicalActivity => "Physical Activity",
            Factor::Education => "Education",
            Factor::UrbanResidence => "Urban Residence",
            Factor::PollutionExposure => "Pollution Exposure",
            Factor::Breastfeeding => "Breastfeeding",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The canonical feature names, in model order.
pub fn feature_names() -> Vec<String> {
    Factor::ALL
        .iter()
        .map(|f| f.feature_name().to_string())
        .collect()
}

/// The encoded inputs for one assessment. Always `FEATURE_COUNT` long.
#[repr(transparent)]
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureVector(Array1<f64>);

impl FeatureVector {
    pub fn as_view(&self) -> ArrayView1<'_, f64> {
        self.0.view()
    }

    pub fn get(&self, factor: Factor) -> f64 {
        self.0[factor.index()]
    }

    /// Pairs every factor with its encoded value, in model order.
    pub fn factors(&self) -> impl Iterator<Item = (Factor, f64)> + '_ {
        Factor::ALL.iter().copied().zip(self.0.iter().copied())
    }
}

impl Deref for FeatureVector {
    type Target = Array1<f64>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Encodes the form inputs into the classifier's feature vector.
///
/// Yes/No answers become 1/0 and ordinal choices become their position in the
/// form (`Never, Former, Current` -> 0, 1, 2). BMI is computed and rounded;
/// every other numeric field passes through unchanged. No range checking happens
/// here: callers validate first.
pub fn encode(inputs: &RiskInputs) -> FeatureVector {
    let values = Factor::ALL.map(|factor| match factor {
        Factor::Age => f64::from(inputs.age),
        Factor::Bmi => inputs.bmi(),
        Factor::MenarcheAge => f64::from(inputs.menarche_age),
        Factor::FirstPregnancyAge => f64::from(inputs.first_pregnancy_age),
        Factor::Parity => f64::from(inputs.parity),
        Factor::FamilyHistory => inputs.family_history.code(),
        Factor::OralContraceptives => inputs.oral_contraceptive_use.code(),
        Factor::HormoneTherapy => inputs.hormone_therapy_use.code(),
        Factor::Smoking => inputs.smoking_status.code(),
        Factor::AlcoholIntake => inputs.alcohol_intake,
        Factor::PhysicalActivity => inputs.physical_activity_level.code(),
        Factor::Education => inputs.education_level.code(),
        Factor::UrbanResidence => inputs.urban_residence.code(),
        Factor::PollutionExposure => inputs.exposure_to_pollution.code(),
        Factor::Breastfeeding => inputs.breastfeeding_history.code(),
    });
    FeatureVector(Array1::from_vec(values.to_vec()))
}
