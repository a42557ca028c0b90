//! Chart.js documents.
//!
//! A [`Chart`] is a set of labelled coordinate series plus axis settings. It
//! is written out as a standalone HTML page that loads Chart.js and embeds
//! the chart configuration as JSON.

use crate::error::Result;
use crate::model::{Sample, Series};
use serde::Serialize;
use serde_json::{json, Value};
use std::io::Write;

const CHART_JS_URL: &str = "https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisKind {
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Bottom,
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub kind: AxisKind,
    pub position: Position,
    pub title: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub grid: bool,
}

impl Axis {
    pub fn linear(title: &str, position: Position, min: f64, max: f64) -> Self {
        Self {
            kind: AxisKind::Linear,
            position,
            title: title.to_string(),
            min: Some(min),
            max: Some(max),
            grid: true,
        }
    }

    fn to_json(&self) -> Value {
        let mut axis = json!({
            "type": self.kind,
            "position": self.position,
            "title": { "display": true, "text": self.title },
            "grid": { "display": self.grid },
        });
        if let Some(min) = self.min {
            axis["min"] = json!(min);
        }
        if let Some(max) = self.max {
            axis["max"] = json!(max);
        }
        axis
    }
}

#[derive(Debug, Clone)]
pub struct Chart {
    pub title: String,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub series: Vec<Series>,
    pub tooltips: bool,
    /// Tooltip title for every commit index.
    pub point_labels: Vec<String>,
}

impl Chart {
    /// A stacked percentage chart over the commit indices of `samples`:
    /// X spans 0..N-1 at the bottom, Y spans 0..100 on the left.
    pub fn stacked_percentages(
        title: &str,
        y_title: &str,
        samples: &[Sample],
        series: Vec<Series>,
    ) -> Self {
        let point_labels: Vec<String> = samples
            .iter()
            .map(|s| {
                format!(
                    "{} {} ({})",
                    s.commit.short_id(),
                    s.commit.message,
                    s.commit.timestamp.format("%Y-%m-%d")
                )
            })
            .collect();
        let last = point_labels.len().saturating_sub(1) as f64;

        Self {
            title: title.to_string(),
            x_axis: Axis::linear("Commit", Position::Bottom, 0.0, last),
            y_axis: Axis::linear(y_title, Position::Left, 0.0, 100.0),
            series,
            tooltips: true,
            point_labels,
        }
    }

    /// The Chart.js configuration object.
    pub fn to_config(&self) -> Value {
        let datasets: Vec<Value> = self
            .series
            .iter()
            .enumerate()
            .map(|(i, s)| {
                json!({
                    "label": s.label,
                    "data": s.points,
                    "borderColor": s.color.css(1.0),
                    "backgroundColor": s.color.css(0.6),
                    // first area down to the axis, every other one down to the previous line
                    "fill": if i == 0 { json!("origin") } else { json!("-1") },
                    "pointRadius": 0,
                    "tension": 0,
                })
            })
            .collect();

        json!({
            "type": "line",
            "data": { "datasets": datasets },
            "options": {
                "responsive": true,
                "interaction": { "mode": "index", "intersect": false },
                "plugins": {
                    "title": { "display": true, "text": self.title },
                    "tooltip": { "enabled": self.tooltips },
                },
                "scales": {
                    "x": self.x_axis.to_json(),
                    "y": self.y_axis.to_json(),
                },
            },
        })
    }
}

/// Writes `chart` as a self-contained HTML page.
pub fn write_html(chart: &Chart, out: &mut dyn Write) -> Result<()> {
    let config = script_json(&chart.to_config())?;
    let labels = script_json(&json!(chart.point_labels))?;

    write!(
        out,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <script src="{CHART_JS_URL}"></script>
</head>
<body>
    <canvas id="chart"></canvas>
    <script>
        const config = {config};
        const pointLabels = {labels};
        config.options.plugins.tooltip.callbacks = {{
            title: (items) => items.length ? pointLabels[items[0].parsed.x] : ""
        }};
        new Chart(document.getElementById("chart"), config);
    </script>
</body>
</html>
"#,
        title = escape_html(&chart.title),
    )?;
    out.flush()?;
    Ok(())
}

// JSON is valid JavaScript, but "</script>" inside a string would end the tag.
fn script_json(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
