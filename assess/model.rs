use crate::encode::{FEATURE_COUNT, feature_names};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

// --- Public Data Structures ---
// These structs define the public, human-readable format of the trained classifier
// when serialized to a TOML file.

/// Version of the artifact layout this build reads and writes.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// The binary outcome the classifier predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskClass {
    /// Class 0.
    Low,
    /// Class 1.
    High,
}

impl RiskClass {
    pub fn code(self) -> u8 {
        match self {
            RiskClass::Low => 0,
            RiskClass::High => 1,
        }
    }

}

/// One node of a decision tree, stored in a flat array.
///
/// A split sends a sample to `left` when `value <= threshold` and to `right`
/// otherwise. Children always sit at a larger index than their parent, so every
/// walk from the root terminates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Class weights at the leaf, indexed by class code. Normalised on use.
        probabilities: Vec<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

/// The top-level, self-contained, trained classifier artifact.
/// This is the structure that gets saved to and loaded from a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedForest {
    pub format_version: u32,
    /// Feature order the forest was trained on. Must equal the encoder's order.
    pub feature_names: Vec<String>,
    pub classes: Vec<u8>,
    pub trees: Vec<DecisionTree>,
}

/// Custom error type for model loading, saving, and prediction.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read or write model file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML model file: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Failed to serialize model to TOML format: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
    #[error("Model file format version {found} is not supported (expected {expected}).")]
    FormatVersion { found: u32, expected: u32 },
    #[error("Model was trained on {found} features, but the form produces {expected}.")]
    FeatureCountMismatch { found: usize, expected: usize },
    #[error(
        "Model feature {position} is '{found}', but the form encodes '{expected}' there. Feature order must match exactly."
    )]
    FeatureOrderMismatch {
        position: usize,
        found: String,
        expected: String,
    },
    #[error("Model classes must be exactly [0, 1], found {0:?}.")]
    UnsupportedClasses(Vec<u8>),
    #[error("Model contains no trees.")]
    EmptyForest,
    #[error("Tree {tree} contains no nodes.")]
    EmptyTree { tree: usize },
    #[error("Tree {tree}, node {node}: child index {child} is invalid (must be after the node and below {len}).")]
    ChildOutOfBounds {
        tree: usize,
        node: usize,
        child: usize,
        len: usize,
    },
    #[error("Tree {tree}, node {node}: feature index {feature} is out of bounds.")]
    FeatureOutOfBounds {
        tree: usize,
        node: usize,
        feature: usize,
    },
    #[error("Tree {tree}, node {node}: split threshold is not finite.")]
    NonFiniteThreshold { tree: usize, node: usize },
    #[error(
        "Tree {tree}, node {node}: leaf probabilities must be {expected} finite non-negative weights with a positive sum."
    )]
    BadLeafProbabilities {
        tree: usize,
        node: usize,
        expected: usize,
    },
    #[error("Prediction input has {found} features, but the model expects {expected}.")]
    InputLength { found: usize, expected: usize },
}

/// The single operation the rest of the application needs from a model.
pub trait RiskClassifier {
    fn predict(&self, features: ArrayView1<f64>) -> Result<RiskClass, ModelError>;
}

impl TrainedForest {
    /// Checks the artifact against the encoder's contract and its own structure.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ModelError::FormatVersion {
                found: self.format_version,
                expected: ARTIFACT_FORMAT_VERSION,
            });
        }

        if self.feature_names.len() != FEATURE_COUNT {
            return Err(ModelError::FeatureCountMismatch {
                found: self.feature_names.len(),
                expected: FEATURE_COUNT,
            });
        }
        for (position, (found, expected)) in self
            .feature_names
            .iter()
            .zip(feature_names())
            .enumerate()
        {
            if *found != expected {
                return Err(ModelError::FeatureOrderMismatch {
                    position,
                    found: found.clone(),
                    expected,
                });
            }
        }

        if self.classes != [RiskClass::Low.code(), RiskClass::High.code()] {
            return Err(ModelError::UnsupportedClasses(self.classes.clone()));
        }

        if self.trees.is_empty() {
            return Err(ModelError::EmptyForest);
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            validate_tree(tree_idx, tree, self.classes.len())?;
        }
        Ok(())
    }

    /// Mean class probabilities across all trees.
    ///
    /// The forest is validated first, so a hand-built forest with a broken tree
    /// is reported as an error rather than walked.
    pub fn predict_proba(&self, features: ArrayView1<f64>) -> Result<[f64; 2], ModelError> {
        self.validate()?;
        if features.len() != FEATURE_COUNT {
            return Err(ModelError::InputLength {
                found: features.len(),
                expected: FEATURE_COUNT,
            });
        }

        let mut totals = [0.0f64; 2];
        for tree in &self.trees {
            let leaf = internal::leaf_for(tree, features);
            let sum: f64 = leaf.iter().sum();
            for (total, weight) in totals.iter_mut().zip(leaf) {
                *total += weight / sum;
            }
        }
        let n_trees = self.trees.len() as f64;
        Ok(totals.map(|t| t / n_trees))
    }

    /// Saves the forest to a file in a human-readable TOML format.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut file = BufWriter::new(fs::File::create(path)?);
        file.write_all(toml_string.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Loads a forest from a TOML file and validates it.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let toml_string = fs::read_to_string(path)?;
        let forest: TrainedForest = toml::from_str(&toml_string)?;
        forest.validate()?;
        log::info!(
            "Loaded model from {} ({} trees, {} features)",
            path.display(),
            forest.trees.len(),
            forest.feature_names.len()
        );
        Ok(forest)
    }
}

impl RiskClassifier for TrainedForest {
    /// Soft voting: the class with the highest mean leaf probability wins, and a
    /// tie goes to `Low`.
    fn predict(&self, features: ArrayView1<f64>) -> Result<RiskClass, ModelError> {
        let [p_low, p_high] = self.predict_proba(features)?;
        log::debug!("Forest probabilities: low={p_low:.4}, high={p_high:.4}");
        Ok(if p_high > p_low {
            RiskClass::High
        } else {
            RiskClass::Low
        })
    }
}

fn validate_tree(tree_idx: usize, tree: &DecisionTree, n_classes: usize) -> Result<(), ModelError> {
    let len = tree.nodes.len();
    if len == 0 {
        return Err(ModelError::EmptyTree { tree: tree_idx });
    }
    for (node_idx, node) in tree.nodes.iter().enumerate() {
        match node {
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if *feature >= FEATURE_COUNT {
                    return Err(ModelError::FeatureOutOfBounds {
                        tree: tree_idx,
                        node: node_idx,
                        feature: *feature,
                    });
                }
                if !threshold.is_finite() {
                    return Err(ModelError::NonFiniteThreshold {
                        tree: tree_idx,
                        node: node_idx,
                    });
                }
                for &child in [left, right] {
                    if child <= node_idx || child >= len {
                        return Err(ModelError::ChildOutOfBounds {
                            tree: tree_idx,
                            node: node_idx,
                            child,
                            len,
                        });
                    }
                }
            }
            TreeNode::Leaf { probabilities } => {
                let well_formed = probabilities.len() == n_classes
                    && probabilities.iter().all(|p| p.is_finite() && *p >= 0.0)
                    && probabilities.iter().sum::<f64>() > 0.0;
                if !well_formed {
                    return Err(ModelError::BadLeafProbabilities {
                        tree: tree_idx,
                        node: node_idx,
                        expected: n_classes,
                    });
                }
            }
        }
    }
    Ok(())
}

/// Internal module for prediction-specific implementation details.
mod internal {
    use super::*;

    /// Walks a validated tree from the root to the leaf selected by `features`.
    pub(super) fn leaf_for<'a>(tree: &'a DecisionTree, features: ArrayView1<f64>) -> &'a [f64] {
        let mut idx = 0;
        loop {
            match &tree.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                TreeNode::Leaf { probabilities } => return probabilities,
            }
        }
    }
}

// ========================================================================================
//                              PROCESS-WIDE MODEL
// ========================================================================================

static SHARED_MODEL: OnceLock<(PathBuf, TrainedForest)> = OnceLock::new();

/// Loads the model on first use and hands out the same instance afterwards.
///
/// Only the first call reads from disk; later calls ignore `path` apart from a
/// warning when it differs from the one that was loaded.
pub fn load_shared(path: &Path) -> Result<&'static TrainedForest, ModelError> {
    if let Some((loaded_from, model)) = SHARED_MODEL.get() {
        if loaded_from != path {
            log::warn!(
                "Model already loaded from {}; ignoring {}",
                loaded_from.display(),
                path.display()
            );
        }
        return Ok(model);
    }

    let model = TrainedForest::load(path)?;
    let (_, shared) = SHARED_MODEL.get_or_init(|| (path.to_path_buf(), model));
    Ok(shared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    fn stump(feature: usize, threshold: f64, below: [f64; 2], above: [f64; 2]) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf {
                    probabilities: below.to_vec(),
                },
                TreeNode::Leaf {
                    probabilities: above.to_vec(),
                },
            ],
        }
    }

    fn forest(trees: Vec<DecisionTree>) -> TrainedForest {
        TrainedForest {
            format_version: ARTIFACT_FORMAT_VERSION,
            feature_names: feature_names(),
            classes: vec![0, 1],
            trees,
        }
    }

    fn features_with(index: usize, value: f64) -> Array1<f64> {
        let mut features = Array1::zeros(FEATURE_COUNT);
        features[index] = value;
        features
    }

    #[test]
    fn single_stump_follows_threshold() {
        let model = forest(vec![stump(0, 50.0, [0.9, 0.1], [0.2, 0.8])]);
        model.validate().unwrap();

        let young = features_with(0, 50.0);
        let old = features_with(0, 50.5);
        assert_eq!(model.predict(young.view()).unwrap(), RiskClass::Low);
        assert_eq!(model.predict(old.view()).unwrap(), RiskClass::High);
    }

    #[test]
    fn soft_voting_averages_normalised_leaves() {
        // Leaf weights are sample counts here; each tree contributes equally.
        let model = forest(vec![
            stump(0, 50.0, [90.0, 10.0], [30.0, 70.0]),
            stump(5, 0.5, [60.0, 40.0], [10.0, 90.0]),
        ]);
        let features = features_with(0, 60.0);
        let [p_low, p_high] = model.predict_proba(features.view()).unwrap();
        approx::assert_abs_diff_eq!(p_low, (0.3 + 0.6) / 2.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(p_high, (0.7 + 0.4) / 2.0, epsilon = 1e-12);
        assert_eq!(model.predict(features.view()).unwrap(), RiskClass::High);
    }

    #[test]
    fn exact_tie_resolves_to_low() {
        let model = forest(vec![
            stump(0, 50.0, [1.0, 0.0], [1.0, 0.0]),
            stump(0, 50.0, [0.0, 1.0], [0.0, 1.0]),
        ]);
        let features = features_with(0, 40.0);
        assert_eq!(model.predict(features.view()).unwrap(), RiskClass::Low);
    }

    #[test]
    fn broken_forest_built_in_code_is_an_error_not_a_panic() {
        let features = features_with(0, 40.0);

        let mut dangling = forest(vec![DecisionTree {
            nodes: vec![TreeNode::Split {
                feature: 0,
                threshold: 50.0,
                left: 5,
                right: 5,
            }],
        }]);
        assert!(matches!(
            dangling.predict(features.view()),
            Err(ModelError::ChildOutOfBounds { child: 5, len: 1, .. })
        ));

        dangling.trees[0] = stump(0, 50.0, [1.0, 0.0], [0.0, 1.0]);
        dangling.trees[0].nodes[0] = TreeNode::Split {
            feature: 0,
            threshold: 50.0,
            left: 0,
            right: 2,
        };
        assert!(matches!(
            dangling.predict(features.view()),
            Err(ModelError::ChildOutOfBounds { child: 0, .. })
        ));

        let mut short_leaf = forest(vec![stump(0, 50.0, [1.0, 0.0], [0.0, 1.0])]);
        short_leaf.trees[0].nodes[1] = TreeNode::Leaf {
            probabilities: vec![1.0],
        };
        assert!(matches!(
            short_leaf.predict_proba(features.view()),
            Err(ModelError::BadLeafProbabilities { node: 1, .. })
        ));
    }

    #[test]
    fn wrong_input_length_is_reported() {
        let model = forest(vec![stump(0, 50.0, [1.0, 0.0], [0.0, 1.0])]);
        let short = Array1::<f64>::zeros(3);
        match model.predict(short.view()) {
            Err(ModelError::InputLength { found, expected }) => {
                assert_eq!(found, 3);
                assert_eq!(expected, FEATURE_COUNT);
            }
            other => panic!("Expected InputLength error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_reordered_features() {
        let mut model = forest(vec![stump(0, 50.0, [1.0, 0.0], [0.0, 1.0])]);
        model.feature_names.swap(0, 1);
        match model.validate() {
            Err(ModelError::FeatureOrderMismatch {
                position,
                found,
                expected,
            }) => {
                assert_eq!(position, 0);
                assert_eq!(found, "bmi");
                assert_eq!(expected, "age");
            }
            other => panic!("Expected FeatureOrderMismatch, got {other:?}"),
        }
    }

    #[test]
    fn rejects_structural_defects() {
        let mut backwards = forest(vec![stump(0, 50.0, [1.0, 0.0], [0.0, 1.0])]);
        backwards.trees[0].nodes[0] = TreeNode::Split {
            feature: 0,
            threshold: 50.0,
            left: 0,
            right: 2,
        };
        assert!(matches!(
            backwards.validate(),
            Err(ModelError::ChildOutOfBounds { child: 0, .. })
        ));

        let bad_feature = forest(vec![stump(FEATURE_COUNT, 1.0, [1.0, 0.0], [0.0, 1.0])]);
        assert!(matches!(
            bad_feature.validate(),
            Err(ModelError::FeatureOutOfBounds { .. })
        ));

        let nan_threshold = forest(vec![stump(0, f64::NAN, [1.0, 0.0], [0.0, 1.0])]);
        assert!(matches!(
            nan_threshold.validate(),
            Err(ModelError::NonFiniteThreshold { .. })
        ));

        let zero_leaf = forest(vec![stump(0, 50.0, [0.0, 0.0], [0.0, 1.0])]);
        assert!(matches!(
            zero_leaf.validate(),
            Err(ModelError::BadLeafProbabilities { node: 1, .. })
        ));

        assert!(matches!(forest(vec![]).validate(), Err(ModelError::EmptyForest)));
        assert!(matches!(
            forest(vec![DecisionTree { nodes: vec![] }]).validate(),
            Err(ModelError::EmptyTree { tree: 0 })
        ));

        let mut three_classes = forest(vec![stump(0, 50.0, [1.0, 0.0], [0.0, 1.0])]);
        three_classes.classes = vec![0, 1, 2];
        assert!(matches!(
            three_classes.validate(),
            Err(ModelError::UnsupportedClasses(_))
        ));

        let mut future = forest(vec![stump(0, 50.0, [1.0, 0.0], [0.0, 1.0])]);
        future.format_version = 2;
        assert!(matches!(
            future.validate(),
            Err(ModelError::FormatVersion { found: 2, .. })
        ));
    }

    /// Tests that the forest can be saved to and loaded from a file,
    /// preserving all its contents exactly.
    #[test]
    fn test_save_load_functionality() {
        use tempfile::NamedTempFile;

        let original = forest(vec![
            stump(0, 50.0, [0.9, 0.1], [0.2, 0.8]),
            DecisionTree {
                nodes: vec![
                    TreeNode::Split {
                        feature: 1,
                        threshold: 30.0,
                        left: 1,
                        right: 2,
                    },
                    TreeNode::Leaf {
                        probabilities: vec![12.0, 3.0],
                    },
                    TreeNode::Split {
                        feature: 8,
                        threshold: 1.5,
                        left: 3,
                        right: 4,
                    },
                    TreeNode::Leaf {
                        probabilities: vec![5.0, 5.0],
                    },
                    TreeNode::Leaf {
                        probabilities: vec![1.0, 9.0],
                    },
                ],
            },
        ]);

        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        original.save(temp_file.path()).expect("Failed to save model");
        let loaded = TrainedForest::load(temp_file.path()).expect("Failed to load model");
        assert_eq!(loaded, original);

        let features = features_with(1, 31.2);
        assert_eq!(
            loaded.predict_proba(features.view()).unwrap(),
            original.predict_proba(features.view()).unwrap()
        );
    }

    #[test]
    fn loading_missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = TrainedForest::load(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ModelError::IoError(_))));
    }

    #[test]
    fn loading_corrupt_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.toml");
        fs::write(&path, "format_version = [this is not toml").unwrap();
        assert!(matches!(
            TrainedForest::load(&path),
            Err(ModelError::TomlParseError(_))
        ));
    }
}
