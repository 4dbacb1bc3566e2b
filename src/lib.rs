// Library exports for vizpipe

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod csv_reader;
pub mod data;
pub mod error;
pub mod filter;
pub mod graph;
pub mod heatmap;
pub mod normalize;
pub mod outliers;
pub mod parser;
pub mod pipeline;
pub mod projection;
pub mod render;
pub mod sort;

pub use config::{ChartConfig, OutputFormat};
pub use data::{Dataset, FeatureType, Record, Value};
pub use error::{Result, VizError};
pub use pipeline::{AggregationSpec, Pipeline, PipelineOutput, PipelineParams};
pub use projection::{ChartSpec, ChartType, Projection};
pub use render::{render_chart, visualize, ChartRenderer, JsonRenderer};
pub use graph::PlotRenderer;
