use crate::ml::models::ModelType;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Raw output of a binary classifier for one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassOutput {
    /// Predicted class, 0 or 1
    pub class: u8,

    /// Score backing the class
    pub score: f64,
}

/// Trait for fitted binary classifiers
pub trait Classifier: Send + Sync + std::fmt::Debug {
    /// Number of input features the classifier was fitted on
    fn n_features(&self) -> usize;

    /// Predict the class of a single normalized sample.
    ///
    /// Callers guarantee `x.len() == self.n_features()`.
    fn predict(&self, x: ArrayView1<'_, f64>) -> ClassOutput;

    /// Get model type
    fn model_type(&self) -> ModelType;
}

/// Serialized classifier as stored in the model artifact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierParams {
    LogisticRegression(LinearParams),
    LinearSvm(LinearParams),
    DecisionTree(TreeParams),
    RandomForest(ForestParams),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinearParams {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreeParams {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForestParams {
    pub trees: Vec<TreeParams>,
}

/// Node of a fitted decision tree. Node 0 is the root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    /// Go to `left` when `x[feature] <= threshold`, otherwise to `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Fraction of positive training samples that reached this leaf
    Leaf { positive_fraction: f64 },
}

impl ClassifierParams {
    /// Validate the parameters and build the classifier.
    ///
    /// `n_features` is the width of the paired scaler.
    pub fn build(self, n_features: usize) -> Result<Box<dyn Classifier>, String> {
        let classifier: Box<dyn Classifier> = match self {
            ClassifierParams::LogisticRegression(params) => {
                Box::new(LogisticRegressionClassifier::new(params, n_features)?)
            }
            ClassifierParams::LinearSvm(params) => {
                Box::new(LinearSvmClassifier::new(params, n_features)?)
            }
            ClassifierParams::DecisionTree(params) => {
                Box::new(DecisionTreeClassifier::new(params, n_features)?)
            }
            ClassifierParams::RandomForest(params) => {
                Box::new(RandomForestClassifier::new(params, n_features)?)
            }
        };
        Ok(classifier)
    }
}

/// Shared weights of the linear models
#[derive(Debug, Clone)]
struct LinearWeights {
    coefficients: Array1<f64>,
    intercept: f64,
}

impl LinearWeights {
    fn new(params: LinearParams, n_features: usize) -> Result<Self, String> {
        if params.coefficients.len() != n_features {
            return Err(format!(
                "classifier has {} coefficients but the scaler has {} features",
                params.coefficients.len(),
                n_features
            ));
        }
        if !params.intercept.is_finite() || params.coefficients.iter().any(|c| !c.is_finite()) {
            return Err("classifier weights must be finite".to_string());
        }

        Ok(Self {
            coefficients: Array1::from_vec(params.coefficients),
            intercept: params.intercept,
        })
    }

    fn decision(&self, x: ArrayView1<'_, f64>) -> f64 {
        self.coefficients.dot(&x) + self.intercept
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Logistic Regression Classifier
#[derive(Debug, Clone)]
pub struct LogisticRegressionClassifier {
    weights: LinearWeights,
}

impl LogisticRegressionClassifier {
    pub fn new(params: LinearParams, n_features: usize) -> Result<Self, String> {
        Ok(Self {
            weights: LinearWeights::new(params, n_features)?,
        })
    }
}

impl Classifier for LogisticRegressionClassifier {
    fn n_features(&self) -> usize {
        self.weights.coefficients.len()
    }

    fn predict(&self, x: ArrayView1<'_, f64>) -> ClassOutput {
        let decision = self.weights.decision(x);
        ClassOutput {
            class: u8::from(decision > 0.0),
            score: sigmoid(decision),
        }
    }

    fn model_type(&self) -> ModelType {
        ModelType::LogisticRegression
    }
}

/// Linear SVM Classifier
#[derive(Debug, Clone)]
pub struct LinearSvmClassifier {
    weights: LinearWeights,
}

impl LinearSvmClassifier {
    pub fn new(params: LinearParams, n_features: usize) -> Result<Self, String> {
        Ok(Self {
            weights: LinearWeights::new(params, n_features)?,
        })
    }
}

impl Classifier for LinearSvmClassifier {
    fn n_features(&self) -> usize {
        self.weights.coefficients.len()
    }

    fn predict(&self, x: ArrayView1<'_, f64>) -> ClassOutput {
        let decision = self.weights.decision(x);
        ClassOutput {
            class: u8::from(decision > 0.0),
            score: decision,
        }
    }

    fn model_type(&self) -> ModelType {
        ModelType::LinearSvm
    }
}

/// Decision Tree Classifier
#[derive(Debug, Clone)]
pub struct DecisionTreeClassifier {
    nodes: Vec<TreeNode>,
    n_features: usize,
}

impl DecisionTreeClassifier {
    pub fn new(params: TreeParams, n_features: usize) -> Result<Self, String> {
        if params.nodes.is_empty() {
            return Err("decision tree has no nodes".to_string());
        }

        let n_nodes = params.nodes.len();
        for (idx, node) in params.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(format!(
                            "node {} splits on feature {} but the scaler has {} features",
                            idx, feature, n_features
                        ));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {} has a NaN threshold", idx));
                    }
                    // children must come after their parent so traversal terminates
                    for child in [left, right] {
                        if child <= idx || child >= n_nodes {
                            return Err(format!(
                                "node {} has invalid child index {}",
                                idx, child
                            ));
                        }
                    }
                }
                TreeNode::Leaf { positive_fraction } => {
                    if !(0.0..=1.0).contains(&positive_fraction) {
                        return Err(format!(
                            "leaf {} has positive fraction {} outside [0, 1]",
                            idx, positive_fraction
                        ));
                    }
                }
            }
        }

        Ok(Self {
            nodes: params.nodes,
            n_features,
        })
    }

    /// Positive fraction of the leaf reached by `x`
    fn leaf_fraction(&self, x: ArrayView1<'_, f64>) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[feature] <= threshold { left } else { right };
                }
                TreeNode::Leaf { positive_fraction } => return positive_fraction,
            }
        }
    }
}

impl Classifier for DecisionTreeClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, x: ArrayView1<'_, f64>) -> ClassOutput {
        let fraction = self.leaf_fraction(x);
        ClassOutput {
            class: u8::from(fraction > 0.5),
            score: fraction,
        }
    }

    fn model_type(&self) -> ModelType {
        ModelType::DecisionTree
    }
}

/// Random Forest Classifier (mean of per-tree leaf fractions)
#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    trees: Vec<DecisionTreeClassifier>,
    n_features: usize,
}

impl RandomForestClassifier {
    pub fn new(params: ForestParams, n_features: usize) -> Result<Self, String> {
        if params.trees.is_empty() {
            return Err("random forest has no trees".to_string());
        }

        let trees = params
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, tree)| {
                DecisionTreeClassifier::new(tree, n_features).map_err(|e| format!("tree {}: {}", i, e))
            })
            .collect::<Result<Vec<_>, String>>()?;

        Ok(Self { trees, n_features })
    }
}

impl Classifier for RandomForestClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, x: ArrayView1<'_, f64>) -> ClassOutput {
        let total: f64 = self.trees.iter().map(|tree| tree.leaf_fraction(x)).sum();
        let mean = total / self.trees.len() as f64;
        ClassOutput {
            class: u8::from(mean > 0.5),
            score: mean,
        }
    }

    fn model_type(&self) -> ModelType {
        ModelType::RandomForest
    }
}
