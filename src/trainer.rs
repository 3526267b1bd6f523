// Offline training pipeline: load -> split -> fit -> evaluate -> persist -> report.
use std::collections::BTreeMap;
use std::path::Path;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{info, warn};
use crate::artifact::ModelArtifact;
use crate::config::{AppConfig, ForestConfig, TrainingConfig};
use crate::csv_reader::{read_table, Table, AMOUNT_COLUMN, CLASS_COLUMN, TIME_COLUMN};
use crate::error::{FraudError, Result};
use crate::forest::RandomForest;
use crate::metrics::{ConfusionMatrix, EvaluationMetrics};

pub struct Split {
    pub feature_names: Vec<String>,
    pub train_x: Array2<f64>,
    pub test_x: Array2<f64>,
    pub train_y: Array1<usize>,
    pub test_y: Array1<usize>,
}

pub struct Evaluation {
    pub metrics: EvaluationMetrics,
    pub confusion: ConfusionMatrix,
}

pub struct TrainingOutcome {
    pub model: ModelArtifact,
    pub evaluation: Evaluation,
    pub train_rows: usize,
    pub test_rows: usize,
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let table = read_table(path)?;
    info!(path = %path.display(), rows = table.len(), columns = table.headers.len(), "data loaded");
    Ok(table)
}

fn label_of(value: f64, row: usize) -> Result<usize> {
    if value == 0.0 {
        Ok(0)
    } else if value == 1.0 {
        Ok(1)
    } else {
        Err(FraudError::Schema(format!(
            "'{}' must be 0 or 1, found {} in row {}",
            CLASS_COLUMN, value, row
        )))
    }
}

fn test_count(n: usize, test_size: f64) -> usize {
    (n as f64 * test_size).ceil() as usize
}

// Shuffles row positions with the given seed and cuts the first ceil(n * test_size)
// off as the test partition. With `stratify` each class is cut separately.
fn partition(labels: &[usize], config: &TrainingConfig) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(config.seed);

    if !config.stratify {
        let mut positions: Vec<usize> = (0..labels.len()).collect();
        positions.shuffle(&mut rng);
        let n_test = test_count(labels.len(), config.test_size);
        let train = positions.split_off(n_test.min(positions.len()));
        return (train, positions);
    }

    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (pos, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(pos);
    }

    let mut train = Vec::new();
    let mut test = Vec::new();
    for (_, mut positions) in by_class {
        positions.shuffle(&mut rng);
        let n_test = ((positions.len() as f64 * config.test_size).round() as usize).min(positions.len());
        let rest = positions.split_off(n_test);
        test.extend(positions);
        train.extend(rest);
    }
    train.shuffle(&mut rng);
    test.shuffle(&mut rng);
    (train, test)
}

pub fn split(table: &Table, config: &TrainingConfig) -> Result<Split> {
    // The scorer plots and reports on these two columns
    for required in [TIME_COLUMN, AMOUNT_COLUMN] {
        table.require_column(required)?;
    }
    let labels = table
        .column(CLASS_COLUMN)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| label_of(value, row))
        .collect::<Result<Vec<usize>>>()?;
    let features = table.drop_column(CLASS_COLUMN)?;

    let (train_pos, test_pos) = partition(&labels, config);
    if train_pos.is_empty() || test_pos.is_empty() {
        return Err(FraudError::Schema(format!(
            "dataset too small to split: {} rows gives {} train / {} test",
            table.len(),
            train_pos.len(),
            test_pos.len()
        )));
    }

    let pick = |positions: &[usize]| -> Array1<usize> {
        positions.iter().map(|&p| labels[p]).collect()
    };

    let split = Split {
        feature_names: features.headers.clone(),
        train_x: features.select_rows(&train_pos).to_array()?,
        test_x: features.select_rows(&test_pos).to_array()?,
        train_y: pick(&train_pos),
        test_y: pick(&test_pos),
    };
    info!(
        train = split.train_y.len(),
        test = split.test_y.len(),
        stratified = config.stratify,
        "data preprocessed: training and testing split complete"
    );
    Ok(split)
}

pub fn fit(split: &Split, forest: &ForestConfig, seed: u64) -> Result<ModelArtifact> {
    let forest = RandomForest::fit(&split.train_x, &split.train_y, forest, seed)?;
    info!("model successfully created and trained");
    Ok(ModelArtifact {
        feature_names: split.feature_names.clone(),
        forest,
    })
}

pub fn evaluate(model: &ModelArtifact, test_x: &Array2<f64>, test_y: &Array1<usize>) -> Result<Evaluation> {
    let predicted = model.predict(test_x)?;
    let confusion = ConfusionMatrix::from_labels(test_y, &predicted);
    let metrics = EvaluationMetrics::from_confusion(&confusion);
    if confusion.true_positives() + confusion.false_negatives() == 0 {
        warn!("test partition holds no fraud rows; precision, recall and f1 are reported as 0");
    }
    Ok(Evaluation { metrics, confusion })
}

pub fn persist<P: AsRef<Path>>(model: &ModelArtifact, path: P) -> Result<()> {
    model.save(path)
}

pub fn report<P: AsRef<Path>>(metrics: &EvaluationMetrics, path: P) -> Result<()> {
    metrics.write_report(path)
}

// Runs the full pipeline with the paths and parameters from `config`
pub fn run(config: &AppConfig) -> Result<TrainingOutcome> {
    let table = load(&config.paths.dataset)?;
    let split = split(&table, &config.training)?;
    let model = fit(&split, &config.forest, config.training.seed)?;
    let evaluation = evaluate(&model, &split.test_x, &split.test_y)?;
    persist(&model, &config.paths.model)?;
    report(&evaluation.metrics, &config.paths.metrics)?;

    Ok(TrainingOutcome {
        model,
        evaluation,
        train_rows: split.train_y.len(),
        test_rows: split.test_y.len(),
    })
}
