// Interactive scoring state: the loaded model, the last single prediction, the
// results panel, the current fraud set and the chart built from the last upload.
use std::path::Path;
use tracing::{info, warn};
use crate::artifact::ModelArtifact;
use crate::chart::ScatterChart;
use crate::csv_reader::{
    parse_transaction, read_table, write_table, Table, AMOUNT_COLUMN, CLASS_COLUMN,
    PREDICTION_COLUMN, TIME_COLUMN,
};
use crate::error::{FraudError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Alert,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Fraudulent,
    NonFraudulent,
}

impl Verdict {
    pub fn from_label(label: usize) -> Self {
        if label == 1 { Verdict::Fraudulent } else { Verdict::NonFraudulent }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Fraudulent => "Fraudulent",
            Verdict::NonFraudulent => "Non-Fraudulent",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Verdict::Fraudulent => Severity::Alert,
            Verdict::NonFraudulent => Severity::Success,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelMessage {
    pub severity: Severity,
    pub text: String,
}

impl PanelMessage {
    fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self { severity, text: text.into() }
    }
}

#[derive(Debug)]
pub struct Scorer {
    model: ModelArtifact,
    prediction: Option<Verdict>,
    results: Vec<PanelMessage>,
    fraud_set: Option<Table>,
    chart: Option<ScatterChart>,
}

impl Scorer {
    pub fn new(model: ModelArtifact) -> Self {
        Self {
            model,
            prediction: None,
            results: Vec::new(),
            fraud_set: None,
            chart: None,
        }
    }

    // Fails when the artifact cannot be loaded; there is no scorer without a model
    pub fn open<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model = ModelArtifact::load(model_path)?;
        Ok(Self::new(model))
    }

    pub fn model(&self) -> &ModelArtifact {
        &self.model
    }

    pub fn prediction(&self) -> Option<Verdict> {
        self.prediction
    }

    pub fn prediction_text(&self) -> String {
        format!("Prediction: {}", self.prediction.map_or("N/A", |v| v.label()))
    }

    pub fn results(&self) -> &[PanelMessage] {
        &self.results
    }

    pub fn fraud_set(&self) -> Option<&Table> {
        self.fraud_set.as_ref()
    }

    pub fn chart(&self) -> Option<&ScatterChart> {
        self.chart.as_ref()
    }

    pub fn download_visible(&self) -> bool {
        self.fraud_set.as_ref().is_some_and(|t| !t.is_empty())
    }

    pub fn predict_single(&mut self, raw: &str) -> Result<Verdict> {
        let features = parse_transaction(raw)?;
        let verdict = Verdict::from_label(self.model.predict_one(&features)?);

        self.prediction = Some(verdict);
        self.results.push(PanelMessage::new(
            verdict.severity(),
            format!("Prediction: {}", verdict.label()),
        ));
        info!(verdict = verdict.label(), "single transaction scored");
        Ok(verdict)
    }

    // Scores every row of a CSV file. All new state is built first and swapped
    // in at the end, so a failure leaves the previous panel, fraud set and chart intact.
    pub fn predict_bulk<P: AsRef<Path>>(&mut self, file_path: P) -> Result<Table> {
        let path = file_path.as_ref();
        let table = read_table(path)?;

        for required in [TIME_COLUMN, AMOUNT_COLUMN] {
            table.require_column(required)?;
        }
        let features = if table.has_column(CLASS_COLUMN) {
            table.drop_column(CLASS_COLUMN)?
        } else {
            table.clone()
        };
        self.model.check_schema(&features)?;

        let predictions = self.model.predict(&features.to_array()?)?;
        let values: Vec<f64> = predictions.iter().map(|&p| p as f64).collect();
        let annotated = table.with_column(PREDICTION_COLUMN, &values)?;

        let prediction_idx = annotated.require_column(PREDICTION_COLUMN)?;
        let fraud_set = annotated.filter_rows(|row| row[prediction_idx] == 1.0);
        let chart = ScatterChart::from_annotated(&annotated)?;
        let results = fraud_panel(&fraud_set)?;

        info!(
            path = %path.display(),
            rows = annotated.len(),
            flagged = fraud_set.len(),
            "bulk file scored"
        );

        self.results = results;
        self.fraud_set = Some(fraud_set);
        self.chart = Some(chart);
        Ok(annotated)
    }

    pub fn export_fraud_set<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let fraud_set = match &self.fraud_set {
            Some(t) if !t.is_empty() => t,
            _ => {
                warn!("export requested with no fraud data");
                return Err(FraudError::NoData);
            }
        };

        write_table(fraud_set, path)?;
        let rows = fraud_set.len();
        self.results.push(PanelMessage::new(
            Severity::Success,
            format!("Data saved to {}", path.display()),
        ));
        info!(path = %path.display(), rows, "fraud data exported");
        Ok(rows)
    }
}

fn fraud_panel(fraud_set: &Table) -> Result<Vec<PanelMessage>> {
    let amount = fraud_set.require_column(AMOUNT_COLUMN)?;
    let time = fraud_set.require_column(TIME_COLUMN)?;

    let mut messages = vec![PanelMessage::new(
        Severity::Alert,
        format!("{} Fraudulent Transactions:", fraud_set.len()),
    )];
    for (row, idx) in fraud_set.rows.iter().zip(&fraud_set.index) {
        messages.push(PanelMessage::new(
            Severity::Alert,
            format!("• Index: {}, Amount: {}, Time: {}", idx, row[amount], row[time]),
        ));
    }
    Ok(messages)
}
