// src/chart.rs
//! Turns model-completion text into a rendered figure.
//!
//! The completion is never executed. The single `px.*` call is extracted,
//! parsed into a closed [`ChartSpec`] grammar (chart kind, column
//! references, an optional row filter, a handful of flags), validated
//! against the table, and only then rendered into plotly-compatible figure
//! JSON. Anything outside the grammar is rejected, and every failure on
//! this path degrades to a placeholder figure titled with the error text.

use crate::dataset::{Cell, Table};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error("no px function call found in completion")]
    NoCall,
    #[error("unsupported chart function: px.{0}")]
    UnsupportedKind(String),
    #[error("malformed chart call: {0}")]
    Malformed(String),
    #[error("unsupported option: {0}")]
    UnsupportedOption(String),
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    #[error("px.{kind} needs the {arg} argument")]
    MissingArgument { kind: String, arg: &'static str },
}

/// The chart family the interpreter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Scatter,
    Bar,
    Histogram,
    Area,
}

impl ChartKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "line" => Some(ChartKind::Line),
            "scatter" => Some(ChartKind::Scatter),
            "bar" => Some(ChartKind::Bar),
            "histogram" => Some(ChartKind::Histogram),
            "area" => Some(ChartKind::Area),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Scatter => "scatter",
            ChartKind::Bar => "bar",
            ChartKind::Histogram => "histogram",
            ChartKind::Area => "area",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Number(f64),
    Text(String),
}

/// Restricted `df.query("col <op> literal")` row filter.
#[derive(Debug, Clone, PartialEq)]
pub struct RowFilter {
    pub column: String,
    pub op: FilterOp,
    pub value: FilterValue,
}

impl RowFilter {
    fn matches(&self, cell: &Cell) -> bool {
        match &self.value {
            FilterValue::Number(rhs) => match cell.as_number() {
                Some(lhs) => match self.op {
                    FilterOp::Eq => lhs == *rhs,
                    FilterOp::Ne => lhs != *rhs,
                    FilterOp::Gt => lhs > *rhs,
                    FilterOp::Ge => lhs >= *rhs,
                    FilterOp::Lt => lhs < *rhs,
                    FilterOp::Le => lhs <= *rhs,
                },
                None => false,
            },
            FilterValue::Text(rhs) => match self.op {
                FilterOp::Eq => cell.display() == *rhs,
                FilterOp::Ne => cell.display() != *rhs,
                // Ordering on text is rejected at parse time.
                _ => false,
            },
        }
    }
}

/// Typed, closed form of one charting call.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub x: Option<String>,
    pub y: Option<String>,
    pub color: Option<String>,
    pub filter: Option<RowFilter>,
    pub log_x: bool,
    pub log_y: bool,
    pub title: Option<String>,
    pub nbins: Option<u32>,
}

impl ChartSpec {
    fn new(kind: ChartKind) -> Self {
        Self {
            kind,
            x: None,
            y: None,
            color: None,
            filter: None,
            log_x: false,
            log_y: false,
            title: None,
            nbins: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Figure JSON

pub const FIGURE_TEMPLATE: &str = "plotly_white";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub trace_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbinsx: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub template: String,
    pub margin: Margin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub xaxis: Axis,
    pub yaxis: Axis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Margin {
    pub l: u32,
    pub r: u32,
    pub t: u32,
    pub b: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub axis_type: Option<String>,
}

fn base_layout(title: Option<String>) -> Layout {
    Layout {
        template: FIGURE_TEMPLATE.to_string(),
        margin: Margin { l: 0, r: 0, t: 30, b: 0 },
        title,
        xaxis: Axis::default(),
        yaxis: Axis::default(),
    }
}

/// Empty figure carrying a message in its title. Used both for the initial
/// "tell me what you want to see" placeholder and for every failure on the
/// completion path.
pub fn placeholder_figure(title: &str) -> Figure {
    Figure {
        data: vec![],
        layout: base_layout(Some(title.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Extraction

/// Pull the single charting call out of free-form completion text: strip
/// fences and backticks, keep from the first `px.` token to end of line,
/// then cut after the balanced closing parenthesis so trailing commentary
/// on the same line is dropped.
pub fn extract_call(completion: &str) -> Result<String, ChartError> {
    let cleaned = completion.replace("```python", "").replace("```", "").replace('`', "");
    let start = cleaned.find("px.").ok_or(ChartError::NoCall)?;
    let line = cleaned[start..].lines().next().unwrap_or("").trim_end();
    Ok(truncate_at_balanced_paren(line))
}

fn truncate_at_balanced_paren(line: &str) -> String {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut seen_open = false;

    for (i, c) in line.char_indices() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                '(' => {
                    depth += 1;
                    seen_open = true;
                }
                ')' => {
                    depth = depth.saturating_sub(1);
                    if seen_open && depth == 0 {
                        return line[..=i].to_string();
                    }
                }
                _ => {}
            },
        }
    }
    line.to_string()
}

// ---------------------------------------------------------------------------
// Parsing

lazy_static! {
    static ref CALL_HEAD: Regex = Regex::new(r"^px\.([A-Za-z_]+)\s*\(").unwrap();
    static ref QUERY_EXPR: Regex = Regex::new(r"^\s*(.+?)\s*(==|!=|>=|<=|>|<)\s*(.+?)\s*$").unwrap();
}

/// Parse one extracted call into a [`ChartSpec`]. Only the closed grammar
/// is accepted: `px.<kind>(df[.query("...")], key=value, ...)`.
pub fn parse_call(call: &str) -> Result<ChartSpec, ChartError> {
    let call = call.trim();
    let head = CALL_HEAD
        .captures(call)
        .ok_or_else(|| ChartError::Malformed("expected px.<function>(...)".to_string()))?;
    let kind_name = head.get(1).unwrap().as_str();
    let kind = ChartKind::from_name(kind_name)
        .ok_or_else(|| ChartError::UnsupportedKind(kind_name.to_string()))?;

    if !call.ends_with(')') {
        return Err(ChartError::Malformed("unbalanced parentheses".to_string()));
    }
    let inner = &call[head.get(0).unwrap().end()..call.len() - 1];

    let args = split_top_level_args(inner);
    let mut args = args.iter().map(|a| a.trim());
    let data_arg = args
        .next()
        .ok_or_else(|| ChartError::Malformed("missing dataframe argument".to_string()))?;

    let mut spec = ChartSpec::new(kind);
    spec.filter = parse_data_arg(data_arg)?;

    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| ChartError::Malformed(format!("expected key=value, got '{}'", arg)))?;
        let key = key.trim();
        let value = value.trim();
        match key {
            "x" => spec.x = Some(parse_string_value(key, value)?),
            "y" => spec.y = Some(parse_string_value(key, value)?),
            "color" => spec.color = Some(parse_string_value(key, value)?),
            "title" => spec.title = Some(parse_string_value(key, value)?),
            "log_x" => spec.log_x = parse_bool_value(key, value)?,
            "log_y" => spec.log_y = parse_bool_value(key, value)?,
            "nbins" => {
                spec.nbins = Some(value.parse::<u32>().map_err(|_| {
                    ChartError::Malformed(format!("nbins must be an integer, got '{}'", value))
                })?)
            }
            other => return Err(ChartError::UnsupportedOption(other.to_string())),
        }
    }

    Ok(spec)
}

/// Split call arguments on top-level commas, leaving quoted strings and
/// nested parentheses intact.
fn split_top_level_args(inner: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for c in inner.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    current.push(c);
                }
                '(' => {
                    depth += 1;
                    current.push(c);
                }
                ')' => {
                    depth = depth.saturating_sub(1);
                    current.push(c);
                }
                ',' if depth == 0 => {
                    args.push(current.clone());
                    current.clear();
                }
                _ => current.push(c),
            },
        }
    }
    if !current.trim().is_empty() {
        args.push(current);
    }
    args
}

/// First positional argument: bare `df`, or `df.query("...")` carrying the
/// row filter.
fn parse_data_arg(arg: &str) -> Result<Option<RowFilter>, ChartError> {
    if arg == "df" {
        return Ok(None);
    }
    let query = arg
        .strip_prefix("df.query(")
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| {
            ChartError::Malformed(format!("first argument must be df or df.query(...), got '{}'", arg))
        })?;
    let expr = strip_quotes(query.trim()).ok_or_else(|| {
        ChartError::Malformed("query expression must be a quoted string".to_string())
    })?;
    parse_filter(&expr).map(Some)
}

fn parse_filter(expr: &str) -> Result<RowFilter, ChartError> {
    let caps = QUERY_EXPR
        .captures(expr)
        .ok_or_else(|| ChartError::Malformed(format!("unsupported query expression '{}'", expr)))?;
    let column = strip_quotes(caps.get(1).unwrap().as_str())
        .unwrap_or_else(|| caps.get(1).unwrap().as_str().to_string());
    let op = match caps.get(2).unwrap().as_str() {
        "==" => FilterOp::Eq,
        "!=" => FilterOp::Ne,
        ">" => FilterOp::Gt,
        ">=" => FilterOp::Ge,
        "<" => FilterOp::Lt,
        "<=" => FilterOp::Le,
        _ => unreachable!(),
    };
    let raw_value = caps.get(3).unwrap().as_str();
    let value = match strip_quotes(raw_value) {
        Some(text) => FilterValue::Text(text),
        None => match raw_value.parse::<f64>() {
            Ok(n) => FilterValue::Number(n),
            Err(_) => FilterValue::Text(raw_value.to_string()),
        },
    };

    if matches!(value, FilterValue::Text(_))
        && !matches!(op, FilterOp::Eq | FilterOp::Ne)
    {
        return Err(ChartError::Malformed(format!(
            "ordering comparison needs a numeric value in '{}'",
            expr
        )));
    }

    Ok(RowFilter { column, op, value })
}

fn strip_quotes(value: &str) -> Option<String> {
    let value = value.trim();
    if value.len() >= 2 {
        let first = value.chars().next().unwrap();
        if (first == '\'' || first == '"') && value.ends_with(first) {
            return Some(value[1..value.len() - 1].to_string());
        }
    }
    None
}

fn parse_string_value(key: &str, value: &str) -> Result<String, ChartError> {
    strip_quotes(value)
        .ok_or_else(|| ChartError::Malformed(format!("{} must be a quoted string, got '{}'", key, value)))
}

fn parse_bool_value(key: &str, value: &str) -> Result<bool, ChartError> {
    match value {
        "True" | "true" => Ok(true),
        "False" | "false" => Ok(false),
        _ => Err(ChartError::Malformed(format!(
            "{} must be True or False, got '{}'",
            key, value
        ))),
    }
}

// ---------------------------------------------------------------------------
// Rendering

/// Validate the spec against the table and render the figure.
pub fn render(spec: &ChartSpec, table: &Table) -> Result<Figure, ChartError> {
    let resolve = |name: &str| {
        table
            .column_index(name)
            .ok_or_else(|| ChartError::UnknownColumn(name.to_string()))
    };

    let x_idx = match &spec.x {
        Some(name) => Some(resolve(name)?),
        None => None,
    };
    let y_idx = match &spec.y {
        Some(name) => Some(resolve(name)?),
        None => None,
    };
    let color_idx = match &spec.color {
        Some(name) => Some(resolve(name)?),
        None => None,
    };
    let filter_idx = match &spec.filter {
        Some(filter) => Some(resolve(&filter.column)?),
        None => None,
    };

    let x_idx = x_idx.ok_or(ChartError::MissingArgument {
        kind: spec.kind.name().to_string(),
        arg: "x",
    })?;
    if spec.kind != ChartKind::Histogram && y_idx.is_none() {
        return Err(ChartError::MissingArgument {
            kind: spec.kind.name().to_string(),
            arg: "y",
        });
    }

    let rows: Vec<&Vec<Cell>> = table
        .rows
        .iter()
        .filter(|row| match (&spec.filter, filter_idx) {
            (Some(filter), Some(idx)) => row.get(idx).map(|c| filter.matches(c)).unwrap_or(false),
            _ => true,
        })
        .collect();

    // One trace per color-group (first-appearance order), or a single
    // unnamed trace when no color column was given.
    let groups: Vec<(Option<String>, Vec<&Vec<Cell>>)> = match color_idx {
        Some(idx) => {
            let mut order: Vec<String> = Vec::new();
            let mut grouped: std::collections::HashMap<String, Vec<&Vec<Cell>>> =
                std::collections::HashMap::new();
            for &row in &rows {
                let key = row.get(idx).map(Cell::display).unwrap_or_default();
                if !grouped.contains_key(&key) {
                    order.push(key.clone());
                }
                grouped.entry(key).or_default().push(row);
            }
            order
                .into_iter()
                .map(|key| {
                    let rows = grouped.remove(&key).unwrap_or_default();
                    (Some(key), rows)
                })
                .collect()
        }
        None => vec![(None, rows)],
    };

    let column_values = |rows: &[&Vec<Cell>], idx: usize| -> Vec<Value> {
        rows.iter()
            .map(|row| match row.get(idx) {
                Some(Cell::Number(n)) => serde_json::json!(n),
                Some(Cell::Text(s)) => serde_json::json!(s),
                _ => Value::Null,
            })
            .collect()
    };

    let data = groups
        .into_iter()
        .map(|(name, rows)| {
            let (trace_type, mode, fill) = match spec.kind {
                ChartKind::Line => ("scatter", Some("lines"), None),
                ChartKind::Scatter => ("scatter", Some("markers"), None),
                ChartKind::Area => ("scatter", Some("lines"), Some("tozeroy")),
                ChartKind::Bar => ("bar", None, None),
                ChartKind::Histogram => ("histogram", None, None),
            };
            Trace {
                trace_type: trace_type.to_string(),
                x: Some(column_values(&rows, x_idx)),
                y: y_idx.map(|idx| column_values(&rows, idx)),
                name,
                mode: mode.map(|m| m.to_string()),
                fill: fill.map(|f| f.to_string()),
                nbinsx: if spec.kind == ChartKind::Histogram {
                    spec.nbins
                } else {
                    None
                },
            }
        })
        .collect();

    let mut layout = base_layout(spec.title.clone());
    layout.xaxis.title = spec.x.clone();
    layout.yaxis.title = spec.y.clone();
    if spec.log_x {
        layout.xaxis.axis_type = Some("log".to_string());
    }
    if spec.log_y {
        layout.yaxis.axis_type = Some("log".to_string());
    }

    Ok(Figure { data, layout })
}

/// Parse and render one extracted call. Never fails: any error becomes a
/// placeholder figure titled with the error text.
pub fn figure_from_call(call: &str, table: &Table) -> Figure {
    match parse_call(call).and_then(|spec| render(&spec, table)) {
        Ok(figure) => figure,
        Err(e) => {
            tracing::warn!("chart call rejected: {}", e);
            placeholder_figure(&e.to_string())
        }
    }
}

/// Full completion-to-figure pipeline with the same never-fails contract.
pub fn figure_from_completion(completion: &str, table: &Table) -> Figure {
    match extract_call(completion) {
        Ok(call) => figure_from_call(&call, table),
        Err(e) => {
            tracing::warn!("no usable chart call in completion: {}", e);
            placeholder_figure(&e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::sample_table;

    #[test]
    fn test_extract_strips_fences_and_commentary() {
        let completion = "```python\npx.line(df, x='year', y='lifeExp')\n```";
        assert_eq!(extract_call(completion).unwrap(), "px.line(df, x='year', y='lifeExp')");

        let completion = "Sure! px.line(df, x='year', y='lifeExp')  # a nice trend\nmore text";
        assert_eq!(extract_call(completion).unwrap(), "px.line(df, x='year', y='lifeExp')");
    }

    #[test]
    fn test_extract_keeps_first_line_only() {
        let completion = "px.line(df, x='year', y='pop')\npx.bar(df, x='country', y='pop')";
        assert_eq!(extract_call(completion).unwrap(), "px.line(df, x='year', y='pop')");
    }

    #[test]
    fn test_extract_without_call_token_is_rejected() {
        assert_eq!(extract_call("I cannot chart that."), Err(ChartError::NoCall));
    }

    #[test]
    fn test_extract_handles_paren_inside_quotes() {
        let completion = "px.line(df, x='year', y='pop', title='pop (millions)') trailing";
        assert_eq!(
            extract_call(completion).unwrap(),
            "px.line(df, x='year', y='pop', title='pop (millions)')"
        );
    }

    #[test]
    fn test_parse_full_call() {
        let call = "px.line(df.query(\"continent == 'Oceania'\"), x='year', y='lifeExp', color='country', log_y=False, log_x=False)";
        let spec = parse_call(call).unwrap();
        assert_eq!(spec.kind, ChartKind::Line);
        assert_eq!(spec.x.as_deref(), Some("year"));
        assert_eq!(spec.y.as_deref(), Some("lifeExp"));
        assert_eq!(spec.color.as_deref(), Some("country"));
        assert!(!spec.log_x && !spec.log_y);
        let filter = spec.filter.unwrap();
        assert_eq!(filter.column, "continent");
        assert_eq!(filter.op, FilterOp::Eq);
        assert_eq!(filter.value, FilterValue::Text("Oceania".to_string()));
    }

    #[test]
    fn test_parse_numeric_query() {
        let spec = parse_call("px.scatter(df.query(\"year > 1990\"), x='gdpPercap', y='lifeExp', log_x=True)").unwrap();
        let filter = spec.filter.unwrap();
        assert_eq!(filter.op, FilterOp::Gt);
        assert_eq!(filter.value, FilterValue::Number(1990.0));
        assert!(spec.log_x);
    }

    #[test]
    fn test_parse_rejects_outside_grammar() {
        assert_eq!(
            parse_call("px.pie(df, names='country')"),
            Err(ChartError::UnsupportedKind("pie".to_string()))
        );
        assert!(matches!(
            parse_call("px.line(other_df, x='a', y='b')"),
            Err(ChartError::Malformed(_))
        ));
        assert_eq!(
            parse_call("px.line(df, x='a', y='b', animation_frame='year')"),
            Err(ChartError::UnsupportedOption("animation_frame".to_string()))
        );
        assert!(matches!(
            parse_call("px.line(df, x='a', y='b', log_y=maybe)"),
            Err(ChartError::Malformed(_))
        ));
        // Ordering against a text literal makes no sense.
        assert!(matches!(
            parse_call("px.line(df.query(\"country > 'Japan'\"), x='year', y='pop')"),
            Err(ChartError::Malformed(_))
        ));
    }

    #[test]
    fn test_render_groups_by_color() {
        let table = sample_table();
        let call = "px.line(df.query(\"continent == 'Oceania'\"), x='year', y='lifeExp', color='country')";
        let figure = figure_from_call(call, &table);
        // Two Oceania countries in the sample, one trace each.
        assert_eq!(figure.data.len(), 2);
        assert_eq!(figure.data[0].name.as_deref(), Some("Australia"));
        assert_eq!(figure.data[1].name.as_deref(), Some("New Zealand"));
        assert_eq!(figure.data[0].trace_type, "scatter");
        assert_eq!(figure.data[0].mode.as_deref(), Some("lines"));
        assert_eq!(figure.data[0].x.as_ref().unwrap().len(), 12);
    }

    #[test]
    fn test_render_numeric_filter() {
        let table = sample_table();
        let spec = parse_call("px.scatter(df.query(\"year >= 2002\"), x='gdpPercap', y='lifeExp')").unwrap();
        let figure = render(&spec, &table).unwrap();
        assert_eq!(figure.data.len(), 1);
        // 4 countries x 2 surveys (2002, 2007).
        assert_eq!(figure.data[0].x.as_ref().unwrap().len(), 8);
        assert_eq!(figure.data[0].mode.as_deref(), Some("markers"));
    }

    #[test]
    fn test_render_histogram_without_y() {
        let table = sample_table();
        let spec = parse_call("px.histogram(df, x=\"continent\", nbins=4)").unwrap();
        let figure = render(&spec, &table).unwrap();
        assert_eq!(figure.data[0].trace_type, "histogram");
        assert!(figure.data[0].y.is_none());
        assert_eq!(figure.data[0].nbinsx, Some(4));
    }

    #[test]
    fn test_render_rejects_unknown_column() {
        let table = sample_table();
        let spec = parse_call("px.line(df, x='year', y='life_expectancy')").unwrap();
        assert_eq!(
            render(&spec, &table),
            Err(ChartError::UnknownColumn("life_expectancy".to_string()))
        );
    }

    #[test]
    fn test_render_requires_axes() {
        let table = sample_table();
        let spec = parse_call("px.line(df, x='year')").unwrap();
        assert!(matches!(
            render(&spec, &table),
            Err(ChartError::MissingArgument { arg: "y", .. })
        ));
    }

    #[test]
    fn test_figure_styling() {
        let table = sample_table();
        let figure = figure_from_call("px.line(df, x='year', y='pop', log_y=True)", &table);
        assert_eq!(figure.layout.template, FIGURE_TEMPLATE);
        assert_eq!(figure.layout.margin.l, 0);
        assert_eq!(figure.layout.margin.r, 0);
        assert_eq!(figure.layout.margin.t, 30);
        assert_eq!(figure.layout.margin.b, 0);
        assert_eq!(figure.layout.yaxis.axis_type.as_deref(), Some("log"));
        assert_eq!(figure.layout.xaxis.title.as_deref(), Some("year"));
    }

    #[test]
    fn test_failures_degrade_to_titled_placeholder() {
        let table = sample_table();

        let figure = figure_from_completion("no code here", &table);
        assert!(figure.data.is_empty());
        assert_eq!(
            figure.layout.title.as_deref(),
            Some(ChartError::NoCall.to_string().as_str())
        );

        let figure = figure_from_completion("px.line(df, x='year', y='nope')", &table);
        assert_eq!(
            figure.layout.title.as_deref(),
            Some("unknown column: nope")
        );
        // Styling still applies to the placeholder.
        assert_eq!(figure.layout.template, FIGURE_TEMPLATE);
    }
}
