use ndarray::{Array1, Array2, Axis};
use linfa::prelude::*;
use linfa_trees::{DecisionTree, SplitQuality};
use rand::rngs::StdRng;
use rand::{seq::index, Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use crate::config::ForestConfig;
use crate::error::{FraudError, Result};

// One bagged tree together with the feature columns it was grown on
#[derive(Debug, Serialize, Deserialize)]
pub struct ForestTree {
    pub features: Vec<usize>,
    pub tree: DecisionTree<f64, usize>,
}

// Random forest: bootstrap-sampled decision trees, each on a random feature subset,
// combined by majority vote.
#[derive(Debug, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub trees: Vec<ForestTree>,
}

fn features_per_tree(config: &ForestConfig, n_features: usize) -> usize {
    let k = config
        .max_features
        .unwrap_or_else(|| (n_features as f64).sqrt().floor() as usize);
    k.clamp(1, n_features)
}

fn fit_tree(
    records: &Array2<f64>,
    targets: &Array1<usize>,
    config: &ForestConfig,
    n_subset: usize,
    seed: u64,
) -> Result<ForestTree> {
    let mut rng = StdRng::seed_from_u64(seed);
    let n_samples = records.nrows();

    // Bootstrap sample of the rows, then a sorted feature subset
    let rows: Vec<usize> = (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
    let mut features = index::sample(&mut rng, records.ncols(), n_subset).into_vec();
    features.sort_unstable();

    let sample = records.select(Axis(0), &rows).select(Axis(1), &features);
    let sample_targets = targets.select(Axis(0), &rows);
    let dataset = Dataset::new(sample, sample_targets);

    let tree = DecisionTree::params()
        .split_quality(SplitQuality::Gini)
        .max_depth(config.max_depth)
        .min_weight_split(config.min_samples_split as f32)
        .min_weight_leaf(1.0)
        .fit(&dataset)
        .map_err(|e| FraudError::Model(e.to_string()))?;

    Ok(ForestTree { features, tree })
}

impl RandomForest {
    pub fn fit(
        records: &Array2<f64>,
        targets: &Array1<usize>,
        config: &ForestConfig,
        seed: u64,
    ) -> Result<Self> {
        let (n_samples, n_features) = records.dim();
        if n_samples == 0 || n_features == 0 {
            return Err(FraudError::Model("cannot fit a forest on an empty training set".to_string()));
        }
        if targets.len() != n_samples {
            return Err(FraudError::Model(format!(
                "{} labels for {} training rows",
                targets.len(),
                n_samples
            )));
        }

        let n_subset = features_per_tree(config, n_features);

        // Seeds are drawn up front so the forest does not depend on thread scheduling
        let mut master = StdRng::seed_from_u64(seed);
        let seeds: Vec<u64> = (0..config.n_trees).map(|_| master.gen()).collect();

        info!(
            trees = config.n_trees,
            samples = n_samples,
            features = n_features,
            features_per_tree = n_subset,
            "fitting random forest"
        );

        let grow = || {
            seeds
                .par_iter()
                .map(|&s| fit_tree(records, targets, config, n_subset, s))
                .collect::<Result<Vec<_>>>()
        };

        let trees = match config.n_jobs {
            Some(n_jobs) => rayon::ThreadPoolBuilder::new()
                .num_threads(n_jobs)
                .build()
                .map_err(|e| FraudError::Model(e.to_string()))?
                .install(grow)?,
            None => grow()?,
        };

        debug!(trees = trees.len(), "random forest fitted");
        Ok(Self { n_features, trees })
    }

    // Majority vote per row; ties go to the legitimate class
    pub fn predict(&self, records: &Array2<f64>) -> Result<Array1<usize>> {
        if records.ncols() != self.n_features {
            return Err(FraudError::DimensionMismatch {
                expected: self.n_features,
                actual: records.ncols(),
            });
        }

        let mut votes = vec![0usize; records.nrows()];
        for member in &self.trees {
            let subset = records.select(Axis(1), &member.features);
            let labels: Array1<usize> = member.tree.predict(&subset);
            for (count, &label) in votes.iter_mut().zip(labels.iter()) {
                if label == 1 {
                    *count += 1;
                }
            }
        }

        let n_trees = self.trees.len();
        Ok(votes.into_iter()
            .map(|v| if v * 2 > n_trees { 1 } else { 0 })
            .collect())
    }
}
