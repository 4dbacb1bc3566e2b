//! Renderer seam and the top-level `visualize` entry point.

use crate::config::{ChartConfig, OutputFormat};
use crate::data::Dataset;
use crate::error::{Result, VizError};
use crate::graph::PlotRenderer;
use crate::pipeline::{Pipeline, PipelineParams};
use crate::projection::{project, ChartSpec, ChartType, Projection};
use serde::Serialize;
use tracing::{error, info};

/// A charting backend. Receives data already shaped for `chart`.
pub trait ChartRenderer {
    fn render(&self, chart: ChartType, projection: &Projection, config: &ChartConfig) -> anyhow::Result<Vec<u8>>;
}

/// Emits the projection as pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

#[derive(Serialize)]
struct JsonChart<'a> {
    chart: ChartType,
    title: Option<&'a str>,
    projection: &'a Projection,
}

impl ChartRenderer for JsonRenderer {
    fn render(&self, chart: ChartType, projection: &Projection, config: &ChartConfig) -> anyhow::Result<Vec<u8>> {
        let doc = JsonChart {
            chart,
            title: config.title.as_deref(),
            projection,
        };
        Ok(serde_json::to_vec_pretty(&doc)?)
    }
}

/// Renderer matching an output format.
pub fn renderer_for(format: OutputFormat) -> Box<dyn ChartRenderer> {
    match format {
        OutputFormat::Json => Box::new(JsonRenderer),
        OutputFormat::Png | OutputFormat::Svg => Box::new(PlotRenderer),
    }
}

/// Render through `renderer`. Any backend failure is logged with the chart
/// type and reported as [`VizError::VisualizationFailed`].
pub fn render_chart(
    renderer: &dyn ChartRenderer,
    chart: ChartType,
    projection: &Projection,
    config: &ChartConfig,
) -> Result<Vec<u8>> {
    renderer.render(chart, projection, config).map_err(|e| {
        error!("Failed to render {} chart: {:#}", chart, e);
        VizError::VisualizationFailed
    })
}

/// Run the pipeline over `dataset`, project for `chart`, and render.
pub fn visualize(
    dataset: &Dataset,
    params: &PipelineParams,
    chart: &ChartSpec,
    renderer: &dyn ChartRenderer,
    config: &ChartConfig,
) -> Result<Vec<u8>> {
    let output = Pipeline::new(params.clone()).run(dataset)?;
    chart.validate(dataset)?;

    let projection = project(&output.records, chart, &output.columns);
    info!(
        "Rendering {} chart from {} records",
        chart.chart_type(),
        output.records.len()
    );
    render_chart(renderer, chart.chart_type(), &projection, config)
}
