// Evaluation metrics over a binary test partition. Fraud (1) is the positive class.
use std::fmt;
use std::fs;
use std::path::Path;
use ndarray::Array1;
use tracing::info;
use crate::error::Result;

// Rows are the true class, columns the predicted class, both ordered [legitimate, fraud]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfusionMatrix {
    pub counts: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    pub fn from_labels(truth: &Array1<usize>, predicted: &Array1<usize>) -> Self {
        let mut counts = [[0usize; 2]; 2];
        for (&t, &p) in truth.iter().zip(predicted.iter()) {
            counts[t.min(1)][p.min(1)] += 1;
        }
        Self { counts }
    }

    pub fn true_negatives(&self) -> usize {
        self.counts[0][0]
    }

    pub fn false_positives(&self) -> usize {
        self.counts[0][1]
    }

    pub fn false_negatives(&self) -> usize {
        self.counts[1][0]
    }

    pub fn true_positives(&self) -> usize {
        self.counts[1][1]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[[{} {}]", self.counts[0][0], self.counts[0][1])?;
        write!(f, " [{} {}]]", self.counts[1][0], self.counts[1][1])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub mcc: f64,
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 { 0.0 } else { numerator / denominator }
}

impl EvaluationMetrics {
    pub fn from_confusion(cm: &ConfusionMatrix) -> Self {
        let tp = cm.true_positives() as f64;
        let tn = cm.true_negatives() as f64;
        let fp = cm.false_positives() as f64;
        let fn_ = cm.false_negatives() as f64;

        let accuracy = ratio(tp + tn, cm.total() as f64);
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1_score = ratio(2.0 * tp, 2.0 * tp + fp + fn_);
        let mcc_denominator = ((tp + fp) * (tp + fn_) * (tn + fp) * (tn + fn_)).sqrt();
        let mcc = ratio(tp * tn - fp * fn_, mcc_denominator);

        Self { accuracy, precision, recall, f1_score, mcc }
    }

    // Metric names and values in report order
    pub fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("accuracy", self.accuracy),
            ("precision", self.precision),
            ("recall", self.recall),
            ("f1_score", self.f1_score),
            ("mcc", self.mcc),
        ]
    }

    pub fn report_lines(&self) -> Vec<String> {
        self.entries()
            .iter()
            .map(|(name, value)| format!("{}: {:.4}", capitalize(name), value))
            .collect()
    }

    pub fn write_report<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut content = self.report_lines().join("\n");
        content.push('\n');
        fs::write(path.as_ref(), content)?;
        info!(path = %path.as_ref().display(), "metrics report written");
        Ok(())
    }
}

// First character upper-cased, the rest lower-cased ("f1_score" -> "F1_score")
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
