use std::path::Path;
use csv::{ReaderBuilder, Trim, Writer};
use ndarray::Array2;
use crate::error::{FraudError, Result};

pub const CLASS_COLUMN: &str = "Class";
pub const PREDICTION_COLUMN: &str = "Prediction";
pub const TIME_COLUMN: &str = "Time";
pub const AMOUNT_COLUMN: &str = "Amount";

// Numeric table loaded from CSV. `index` keeps each row's position in the
// source file so filtered subsets can still point back at it.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub index: Vec<usize>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != headers.len()) {
            return Err(FraudError::Schema(format!(
                "row {} has {} values but there are {} columns",
                i,
                row.len(),
                headers.len()
            )));
        }
        let index = (0..rows.len()).collect();
        Ok(Self { headers, rows, index })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column(&self, name: &str) -> Result<Vec<f64>> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(|row| row[idx]).collect())
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| FraudError::Schema(format!("missing required column '{}'", name)))
    }

    pub fn drop_column(&self, name: &str) -> Result<Table> {
        let idx = self.require_column(name)?;
        let mut headers = self.headers.clone();
        headers.remove(idx);
        let rows = self.rows.iter()
            .map(|row| {
                let mut row = row.clone();
                row.remove(idx);
                row
            })
            .collect();
        Ok(Table { headers, rows, index: self.index.clone() })
    }

    pub fn with_column(mut self, name: &str, values: &[f64]) -> Result<Table> {
        if values.len() != self.rows.len() {
            return Err(FraudError::Schema(format!(
                "column '{}' has {} values for {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }
        self.headers.push(name.to_string());
        for (row, &value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(self)
    }

    // Keeps rows for which `keep` holds, preserving their original index
    pub fn filter_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&[f64]) -> bool,
    {
        let mut rows = Vec::new();
        let mut index = Vec::new();
        for (row, &idx) in self.rows.iter().zip(&self.index) {
            if keep(row) {
                rows.push(row.clone());
                index.push(idx);
            }
        }
        Table { headers: self.headers.clone(), rows, index }
    }

    pub fn select_rows(&self, positions: &[usize]) -> Table {
        Table {
            headers: self.headers.clone(),
            rows: positions.iter().map(|&p| self.rows[p].clone()).collect(),
            index: positions.iter().map(|&p| self.index[p]).collect(),
        }
    }

    pub fn to_array(&self) -> Result<Array2<f64>> {
        let flat: Vec<f64> = self.rows.iter().flatten().copied().collect();
        Array2::from_shape_vec((self.rows.len(), self.headers.len()), flat)
            .map_err(|e| FraudError::Schema(e.to_string()))
    }
}

pub fn read_table<P: AsRef<Path>>(file_path: P) -> Result<Table> {
    let path = file_path.as_ref();
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| FraudError::load(path, e))?;

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| FraudError::load(path, e))?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(FraudError::load(path, "file has no header row"));
    }

    let rows: Vec<Vec<f64>> = rdr
        .deserialize()
        .collect::<std::result::Result<Vec<Vec<f64>>, csv::Error>>()
        .map_err(|e| FraudError::load(path, e))?;

    Table::new(headers, rows)
}

pub fn write_table<P: AsRef<Path>>(table: &Table, file_path: P) -> Result<()> {
    let mut wtr = Writer::from_path(file_path)?;
    wtr.write_record(&table.headers)?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(|v| v.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

// Parses one comma-separated transaction as typed into the entry field
pub fn parse_transaction(raw: &str) -> Result<Vec<f64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FraudError::Parse("Please enter valid data.".to_string()));
    }
    raw.split(',')
        .map(|token| {
            let token = token.trim();
            token.parse::<f64>().map_err(|_| {
                FraudError::Parse(format!("Invalid input: '{}' is not a number", token))
            })
        })
        .collect()
}
