//! The form's request/response cycle as a pure function of the widget state.
//!
//! Every widget change recomputes the feature vector with `prepare`; the Predict
//! trigger additionally runs the classifier and the presenter through `assess`.
//! No state survives between calls.

use crate::encode::{FeatureVector, encode};
use crate::inputs::{InputError, RiskInputs};
use crate::model::{ModelError, RiskClass, RiskClassifier};
use crate::present::{Presentation, present};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssessError {
    #[error("Invalid form input: {0}")]
    Input(#[from] InputError),
    #[error("Prediction failed: {0}")]
    Model(#[from] ModelError),
}

/// Result of one Predict press.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub inputs: RiskInputs,
    pub features: FeatureVector,
    pub class: RiskClass,
    pub presentation: Presentation,
}

impl Assessment {
    pub fn bmi(&self) -> f64 {
        self.inputs.bmi()
    }
}

/// Validates the inputs and encodes them. Out-of-range values are rejected.
pub fn prepare(inputs: &RiskInputs) -> Result<FeatureVector, InputError> {
    inputs.validate()?;
    Ok(encode(inputs))
}

/// Runs the full cycle: validate, encode, predict, present.
pub fn assess(
    model: &dyn RiskClassifier,
    inputs: &RiskInputs,
) -> Result<Assessment, AssessError> {
    let features = prepare(inputs)?;
    log::debug!("Encoded features: {:?}", features.to_vec());

    let class = model.predict(features.as_view())?;
    log::info!("Predicted class {} ({:?})", class.code(), class);

    let presentation = present(&features, class);
    Ok(Assessment {
        inputs: *inputs,
        features,
        class,
        presentation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayView1;

    /// Always answers with the same class and remembers nothing.
    struct Fixed(RiskClass);

    impl RiskClassifier for Fixed {
        fn predict(&self, features: ArrayView1<f64>) -> Result<RiskClass, ModelError> {
            assert_eq!(features.len(), crate::encode::FEATURE_COUNT);
            Ok(self.0)
        }
    }

    #[test]
    fn invalid_inputs_never_reach_the_model() {
        struct Unreachable;
        impl RiskClassifier for Unreachable {
            fn predict(&self, _: ArrayView1<f64>) -> Result<RiskClass, ModelError> {
                panic!("model must not be called with invalid inputs");
            }
        }

        let inputs = RiskInputs {
            height_cm: 20.0,
            ..RiskInputs::default()
        };
        match assess(&Unreachable, &inputs) {
            Err(AssessError::Input(InputError::OutOfRange { field, .. })) => {
                assert_eq!(field, "height")
            }
            other => panic!("Expected an input error, got {other:?}"),
        }
    }

    #[test]
    fn assessment_follows_the_model_label() {
        let inputs = RiskInputs::default();
        let high = assess(&Fixed(RiskClass::High), &inputs).unwrap();
        assert!(high.presentation.profile.is_some());
        assert_eq!(high.bmi(), 22.0);

        let low = assess(&Fixed(RiskClass::Low), &inputs).unwrap();
        assert!(low.presentation.profile.is_none());
        assert_eq!(low.features, high.features);
    }
}
