// Read-only dataset diagnostics for the `stats` subcommand.
use std::fmt;
use crate::csv_reader::{Table, AMOUNT_COLUMN, CLASS_COLUMN};
use crate::error::Result;

// Summary of one numeric column. Empty input yields count 0 and NaN elsewhere;
// std is the sample standard deviation and is NaN below two values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

impl Describe {
    pub fn of(values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let mean = if n == 0 { f64::NAN } else { sorted.iter().sum::<f64>() / n as f64 };
        let std = if n < 2 {
            f64::NAN
        } else {
            let ss: f64 = sorted.iter().map(|x| (x - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        };

        Self {
            count: n,
            mean,
            std,
            min: sorted.first().copied().unwrap_or(f64::NAN),
            q25: quantile(&sorted, 0.25),
            q50: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted.last().copied().unwrap_or(f64::NAN),
        }
    }
}

impl fmt::Display for Describe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  count {}", self.count)?;
        writeln!(f, "  mean  {:.4}", self.mean)?;
        writeln!(f, "  std   {:.4}", self.std)?;
        writeln!(f, "  min   {:.4}", self.min)?;
        writeln!(f, "  25%   {:.4}", self.q25)?;
        writeln!(f, "  50%   {:.4}", self.q50)?;
        writeln!(f, "  75%   {:.4}", self.q75)?;
        write!(f, "  max   {:.4}", self.max)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStats {
    pub shape: (usize, usize),
    pub fraud_cases: usize,
    pub valid_cases: usize,
    // fraud / valid; None when there are no valid rows
    pub outlier_fraction: Option<f64>,
    pub fraud_amount: Describe,
    pub valid_amount: Describe,
}

pub fn dataset_stats(table: &Table) -> Result<DatasetStats> {
    let class = table.require_column(CLASS_COLUMN)?;
    let amount = table.require_column(AMOUNT_COLUMN)?;

    let mut fraud_amounts = Vec::new();
    let mut valid_amounts = Vec::new();
    for row in &table.rows {
        if row[class] == 1.0 {
            fraud_amounts.push(row[amount]);
        } else if row[class] == 0.0 {
            valid_amounts.push(row[amount]);
        }
    }

    let fraud_cases = fraud_amounts.len();
    let valid_cases = valid_amounts.len();
    let outlier_fraction = if valid_cases == 0 {
        None
    } else {
        Some(fraud_cases as f64 / valid_cases as f64)
    };

    Ok(DatasetStats {
        shape: (table.len(), table.headers.len()),
        fraud_cases,
        valid_cases,
        outlier_fraction,
        fraud_amount: Describe::of(&fraud_amounts),
        valid_amount: Describe::of(&valid_amounts),
    })
}

impl fmt::Display for DatasetStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Shape: {} rows x {} columns", self.shape.0, self.shape.1)?;
        writeln!(f, "Fraud Cases: {}", self.fraud_cases)?;
        writeln!(f, "Valid Transactions: {}", self.valid_cases)?;
        match self.outlier_fraction {
            Some(fraction) => writeln!(f, "Outlier Fraction: {:.6}", fraction)?,
            None => writeln!(f, "Outlier Fraction: n/a (no valid transactions)")?,
        }
        writeln!(f, "Amount details of fraudulent transactions:")?;
        writeln!(f, "{}", self.fraud_amount)?;
        writeln!(f, "Amount details of valid transactions:")?;
        write!(f, "{}", self.valid_amount)
    }
}
