//! Tabular aggregation.
//!
//! Turns the first HTML table (or a CSV file, or a text table lifted out of
//! a PDF page) into a [`Grid`], picks the numeric column to aggregate and
//! applies the operation the question asks for.
//!
//! Column choice: among columns with at least one numeric cell, a column
//! whose header mentions "value" or "amount" wins; otherwise the column with
//! the largest variance. Value-named columns always beat variance.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::debug;

/// Header names that mark the column holding the values to aggregate.
const VALUE_COLUMN_NAMES: &[&str] = &["value", "amount"];

/// A parsed table: header names plus string cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Grid {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }

    pub fn header(&self, idx: usize) -> String {
        self.headers
            .get(idx)
            .cloned()
            .unwrap_or_else(|| idx.to_string())
    }

    /// Numeric values of a column, skipping cells that do not coerce.
    pub fn numeric_column(&self, idx: usize) -> Vec<f64> {
        self.rows
            .iter()
            .filter_map(|row| row.get(idx))
            .filter_map(|cell| coerce_number(cell))
            .collect()
    }
}

/// Aggregation requested by the question text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Sum,
    Mean,
    Count,
    Max,
    Min,
}

impl Operation {
    /// Infer the operation from question text.
    ///
    /// The earliest keyword mentioned wins; no keyword means `Sum`.
    pub fn infer(text: &str) -> Self {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| {
            Regex::new(r"(?i)\b(sum|total|average|mean|count|maximum|max|minimum|min)\b")
                .expect("valid regex")
        });
        let Some(m) = re.find(text) else {
            return Operation::Sum;
        };
        match m.as_str().to_ascii_lowercase().as_str() {
            "average" | "mean" => Operation::Mean,
            "count" => Operation::Count,
            "max" | "maximum" => Operation::Max,
            "min" | "minimum" => Operation::Min,
            _ => Operation::Sum,
        }
    }

    /// Apply to a non-empty column. `Count` yields an integer, the rest a
    /// float. Non-finite results are rejected.
    pub fn apply(self, values: &[f64]) -> Option<Value> {
        if values.is_empty() {
            return None;
        }
        let result = match self {
            Operation::Count => return Some(Value::from(values.len() as u64)),
            Operation::Sum => values.iter().sum::<f64>(),
            Operation::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Operation::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Operation::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        };
        serde_json::Number::from_f64(result).map(Value::Number)
    }
}

/// Coerce a cell to a number: trims, drops thousands separators and a
/// leading currency sign.
pub fn coerce_number(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .trim()
        .trim_start_matches(['$', '€', '£'])
        .chars()
        .filter(|c| *c != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn population_variance(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Pick the column to aggregate, or `None` if no column is numeric.
pub fn select_column(grid: &Grid) -> Option<usize> {
    let numeric: Vec<(usize, Vec<f64>)> = (0..grid.column_count())
        .map(|idx| (idx, grid.numeric_column(idx)))
        .filter(|(_, values)| !values.is_empty())
        .collect();

    if let Some((idx, _)) = numeric.iter().find(|(idx, _)| {
        let name = grid.header(*idx).to_lowercase();
        VALUE_COLUMN_NAMES.iter().any(|v| name.contains(v))
    }) {
        return Some(*idx);
    }

    let mut best: Option<(usize, f64)> = None;
    for (idx, values) in &numeric {
        let var = population_variance(values);
        if best.map_or(true, |(_, b)| var > b) {
            best = Some((*idx, var));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Select a column and aggregate it with the operation named in `question`.
pub fn aggregate_grid(grid: &Grid, question: &str) -> Option<Value> {
    let column = select_column(grid)?;
    let op = Operation::infer(question);
    let values = grid.numeric_column(column);
    let result = op.apply(&values);
    debug!(
        column = %grid.header(column),
        op = ?op,
        rows = values.len(),
        result = ?result,
        "aggregated table column"
    );
    result
}

/// Parse the first `<table>` in `markup` and aggregate it.
pub fn aggregate_markup(markup: &str, question: &str) -> Option<Value> {
    let grid = parse_first_table(markup)?;
    aggregate_grid(&grid, question)
}

/// Parse the first `<table>` in `markup`.
///
/// A first row inside `<thead>`, or made only of `<th>` cells, becomes the
/// header; otherwise columns are named by position. A leading `<th>` used as
/// a row label does not make a header row.
pub fn parse_first_table(markup: &str) -> Option<Grid> {
    let document = Html::parse_document(markup);
    let table_sel = Selector::parse("table").ok()?;
    let row_sel = Selector::parse("tr").ok()?;
    let cell_sel = Selector::parse("th, td").ok()?;

    let table = document.select(&table_sel).next()?;
    let mut rows = table.select(&row_sel).peekable();

    let mut headers = Vec::new();
    if let Some(first) = rows.peek() {
        if is_header_row(first, &cell_sel) {
            headers = first.select(&cell_sel).map(cell_text).collect();
            rows.next();
        }
    }

    let body: Vec<Vec<String>> = rows
        .map(|row| row.select(&cell_sel).map(cell_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect();

    if headers.is_empty() && body.is_empty() {
        return None;
    }
    Some(Grid::new(headers, body))
}

fn is_header_row(row: &ElementRef<'_>, cell_sel: &Selector) -> bool {
    let in_thead = row
        .parent()
        .and_then(|p| p.value().as_element().map(|el| el.name() == "thead"))
        .unwrap_or(false);
    let mut cells = row.select(cell_sel).peekable();
    cells.peek().is_some() && (in_thead || cells.all(|c| c.value().name() == "th"))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

fn column_gap_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\t|\s{2,}").expect("valid regex"))
}

/// Split one line of page text into fields. Lines laid out with wide gaps
/// split on the gaps, so single spaces stay inside a cell.
fn split_fields(line: &str) -> Vec<String> {
    let line = line.trim();
    if column_gap_re().is_match(line) {
        column_gap_re()
            .split(line)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        line.split_whitespace().map(str::to_string).collect()
    }
}

/// Fit a line to `width` columns. Surplus leading fields are folded into
/// the first cell ("New York 3" under "city value"), but only when the line
/// still ends in a number; anything else ends the table.
fn fit_row(fields: &[String], width: usize) -> Option<Vec<String>> {
    if fields.len() == width {
        return Some(fields.to_vec());
    }
    if fields.len() < width || coerce_number(fields.last()?).is_none() {
        return None;
    }
    let surplus = fields.len() - width;
    let mut row = vec![fields[..=surplus].join(" ")];
    row.extend(fields[surplus + 1..].iter().cloned());
    Some(row)
}

/// Lift the first whitespace-aligned table out of plain text (PDF pages).
///
/// Blank lines are ignored: text extraction puts them between rows whenever
/// the line pitch exceeds single spacing. The header is the first line with
/// two or more fields followed by a line that fits its width; the table runs
/// while lines keep fitting.
pub fn parse_text_table(text: &str) -> Option<Grid> {
    let lines: Vec<Vec<String>> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(split_fields)
        .collect();

    for start in 0..lines.len() {
        let width = lines[start].len();
        if width < 2 {
            continue;
        }
        let rows: Vec<Vec<String>> = lines[start + 1..]
            .iter()
            .map_while(|fields| fit_row(fields, width))
            .collect();
        if !rows.is_empty() {
            return Some(Grid::new(lines[start].clone(), rows));
        }
    }
    None
}
