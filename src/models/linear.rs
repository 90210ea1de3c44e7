//! Multi-class linear classifier (one-vs-rest logistic regression)

use super::{check_training_data, unique_classes, Classifier, TrainedClassifier};
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// One-vs-rest logistic regression trained by bounded gradient descent.
///
/// Weights initialize to zero, so fitting is fully deterministic; the seed
/// field exists to keep the trainer interface uniform with stochastic
/// variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearClassifier {
    /// Per-class weight rows, shape (n_classes, n_features)
    weights: Option<Array2<f64>>,
    /// Per-class intercepts
    intercepts: Option<Array1<f64>>,
    /// Class codes in weight-row order
    classes: Vec<f64>,
    /// Iteration cap for the optimizer
    pub max_iter: usize,
    /// Gradient descent step size
    pub learning_rate: f64,
    /// L2 regularization strength
    pub alpha: f64,
    /// Convergence tolerance on the gradient norm
    pub tol: f64,
    /// Seed (unused by the zero-init optimizer, kept for interface parity)
    pub seed: u64,
    is_fitted: bool,
}

impl Default for LinearClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearClassifier {
    pub fn new() -> Self {
        Self {
            weights: None,
            intercepts: None,
            classes: Vec::new(),
            max_iter: 200,
            learning_rate: 0.1,
            alpha: 0.01,
            tol: 1e-6,
            seed: 42,
            is_fitted: false,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }

    /// Fit one binary logistic sub-problem: class vs rest.
    fn fit_binary(&self, x: &Array2<f64>, targets: &Array1<f64>) -> (Array1<f64>, f64) {
        let n_samples = x.nrows() as f64;
        let mut weights = Array1::zeros(x.ncols());
        let mut bias = 0.0;

        for _ in 0..self.max_iter {
            let linear = x.dot(&weights) + bias;
            let predictions = Self::sigmoid(&linear);

            let errors = &predictions - targets;
            let dw = (x.t().dot(&errors) / n_samples) + (self.alpha * &weights);
            let db = errors.mean().unwrap_or(0.0);

            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < self.tol {
                break;
            }

            weights = weights - self.learning_rate * dw;
            bias -= self.learning_rate * db;
        }

        (weights, bias)
    }

    /// Raw decision scores, shape (n_samples, n_classes).
    fn decision_scores(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let weights = self.weights.as_ref().ok_or(PipelineError::ModelNotFitted)?;
        let intercepts = self.intercepts.as_ref().ok_or(PipelineError::ModelNotFitted)?;

        if x.ncols() != weights.ncols() {
            return Err(PipelineError::Shape {
                expected: format!("{} features", weights.ncols()),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.dot(&weights.t()) + intercepts)
    }
}

impl Classifier for LinearClassifier {
    fn name(&self) -> &'static str {
        "Logistic Regression"
    }

    fn slug(&self) -> &'static str {
        "logistic_regression"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_training_data(x, y)?;

        self.classes = unique_classes(y);

        let mut weights = Array2::zeros((self.classes.len(), x.ncols()));
        let mut intercepts = Array1::zeros(self.classes.len());

        for (row, &class) in self.classes.iter().enumerate() {
            let targets: Array1<f64> =
                y.mapv(|v| if (v - class).abs() < 0.5 { 1.0 } else { 0.0 });
            let (w, b) = self.fit_binary(x, &targets);
            weights.row_mut(row).assign(&w);
            intercepts[row] = b;
        }

        self.weights = Some(weights);
        self.intercepts = Some(intercepts);
        self.is_fitted = true;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let scores = self.decision_scores(x)?;

        let predictions: Vec<f64> = scores
            .axis_iter(Axis(0))
            .map(|row| {
                let mut best = 0;
                for (idx, &score) in row.iter().enumerate() {
                    if score > row[best] {
                        best = idx;
                    }
                }
                self.classes[best]
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    fn snapshot(&self) -> TrainedClassifier {
        TrainedClassifier::Linear(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn three_class_data() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [0.0, 0.1],
            [0.2, 0.0],
            [0.1, 0.2],
            [5.0, 5.1],
            [5.2, 5.0],
            [5.1, 5.2],
            [10.0, 0.1],
            [10.2, 0.0],
            [10.1, 0.2],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0];
        (x, y)
    }

    #[test]
    fn test_separable_multiclass() {
        let (x, y) = three_class_data();
        let mut model = LinearClassifier::new().with_max_iter(500);
        model.fit(&x, &y).unwrap();

        let predictions = model.predict(&x).unwrap();
        let correct = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, a)| (*p - *a).abs() < 0.5)
            .count();
        assert!(correct >= 8, "only {} of 9 correct", correct);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = three_class_data();

        let mut a = LinearClassifier::new();
        a.fit(&x, &y).unwrap();
        let mut b = LinearClassifier::new();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let model = LinearClassifier::new();
        let x = array![[1.0, 2.0]];
        assert!(matches!(
            model.predict(&x).unwrap_err(),
            PipelineError::ModelNotFitted
        ));
    }

    #[test]
    fn test_single_class_rejected() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 1.0];
        let mut model = LinearClassifier::new();
        assert!(matches!(
            model.fit(&x, &y).unwrap_err(),
            PipelineError::Training(_)
        ));
    }

    #[test]
    fn test_feature_count_mismatch() {
        let (x, y) = three_class_data();
        let mut model = LinearClassifier::new();
        model.fit(&x, &y).unwrap();

        let bad = array![[1.0, 2.0, 3.0]];
        assert!(matches!(
            model.predict(&bad).unwrap_err(),
            PipelineError::Shape { .. }
        ));
    }
}
