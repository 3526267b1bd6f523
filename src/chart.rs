// Time vs Amount scatter of the rows the model flagged in the last upload
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};
use crate::csv_reader::{Table, AMOUNT_COLUMN, PREDICTION_COLUMN, TIME_COLUMN};
use crate::error::Result;

pub const CHART_TITLE: &str = "Fraud: Time vs Amount";

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<(f64, f64)>,
}

// Axis range over the finite values. A single value gets a unit margin so the
// point does not sit on the frame, and no values at all gives [0, 1].
pub fn axis_bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo > hi {
        [0.0, 1.0]
    } else if lo == hi {
        [lo - 1.0, hi + 1.0]
    } else {
        [lo, hi]
    }
}

fn axis_labels(bounds: [f64; 2]) -> Vec<Span<'static>> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .iter()
        .map(|v| Span::raw(format!("{:.1}", v)))
        .collect()
}

impl ScatterChart {
    pub fn from_annotated(table: &Table) -> Result<Self> {
        let time = table.require_column(TIME_COLUMN)?;
        let amount = table.require_column(AMOUNT_COLUMN)?;
        let prediction = table.require_column(PREDICTION_COLUMN)?;

        let points = table.rows.iter()
            .filter(|row| row[prediction] == 1.0)
            .map(|row| (row[time], row[amount]))
            .collect();

        Ok(Self {
            title: CHART_TITLE.to_string(),
            x_label: TIME_COLUMN.to_string(),
            y_label: AMOUNT_COLUMN.to_string(),
            points,
        })
    }

    // Points that can be placed on the canvas
    pub fn plottable(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .copied()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect()
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(" {} ", self.title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));

        let points = self.plottable();
        if points.is_empty() {
            let empty = Paragraph::new("(no flagged transactions to plot)")
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let x_bounds = axis_bounds(points.iter().map(|p| p.0));
        let y_bounds = axis_bounds(points.iter().map(|p| p.1));

        let dataset = Dataset::default()
            .name("Fraud")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Red))
            .data(&points);

        let chart = Chart::new(vec![dataset])
            .block(block)
            .x_axis(
                Axis::default()
                    .title(self.x_label.clone())
                    .style(Style::default().fg(Color::Gray))
                    .bounds(x_bounds)
                    .labels(axis_labels(x_bounds)),
            )
            .y_axis(
                Axis::default()
                    .title(self.y_label.clone())
                    .style(Style::default().fg(Color::Gray))
                    .bounds(y_bounds)
                    .labels(axis_labels(y_bounds)),
            );
        frame.render_widget(chart, area);
    }
}
