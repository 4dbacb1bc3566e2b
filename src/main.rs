use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use vizpipe::classify::numeric_features;
use vizpipe::csv_reader::{read_csv, read_csv_from_stdin};
use vizpipe::outliers::DEFAULT_IQR_THRESHOLD;
use vizpipe::parser::{parse_aggregation, parse_filter, parse_sort};
use vizpipe::render::renderer_for;
use vizpipe::{visualize, ChartConfig, ChartSpec, ChartType, Dataset, OutputFormat, PipelineParams};

/// Number of allowed values listed per feature by `--describe`.
const DESCRIBE_VALUE_LIMIT: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "vizpipe")]
#[command(about = "Filter, reshape and chart tabular data", long_about = None)]
struct Args {
    /// Input dataset (.json or .csv). CSV is read from stdin when omitted.
    input: Option<PathBuf>,

    /// Chart type
    #[arg(long, value_enum, default_value_t = ChartType::Line)]
    chart: ChartType,

    /// X column (line, scatter)
    #[arg(short = 'x', long)]
    x: Option<String>,

    /// Y column (line, scatter)
    #[arg(short = 'y', long)]
    y: Option<String>,

    /// Value column (bar, heatmap)
    #[arg(long)]
    value: Option<String>,

    /// Bar label column
    #[arg(long)]
    label: Option<String>,

    /// Heatmap row column
    #[arg(long)]
    row: Option<String>,

    /// Heatmap column, or the histogram's value column
    #[arg(long)]
    column: Option<String>,

    /// Table columns, comma separated (all columns when omitted)
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Filter expression, e.g. 'age >= 30'. Repeatable; all must match.
    #[arg(short = 'f', long = "filter")]
    filters: Vec<String>,

    /// Drop records outside the IQR fences of any numeric column
    #[arg(long)]
    remove_outliers: bool,

    /// IQR multiplier used by --remove-outliers
    #[arg(long, default_value_t = DEFAULT_IQR_THRESHOLD)]
    iqr_threshold: f64,

    /// Min-max scale numeric columns to [0, 1]
    #[arg(long)]
    normalize: bool,

    /// Aggregation expression, e.g. 'sum(amount) by region'
    #[arg(long)]
    aggregate: Option<String>,

    /// Sort expression, e.g. 'amount:desc'
    #[arg(long)]
    sort: Option<String>,

    /// Pipeline parameters as JSON; flags above are applied on top
    #[arg(long)]
    params: Option<PathBuf>,

    /// Chart configuration as JSON; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    x_label: Option<String>,

    #[arg(long)]
    y_label: Option<String>,

    /// Series color (red, green, blue, black, yellow, cyan, magenta)
    #[arg(long)]
    color: Option<String>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Histogram bin count
    #[arg(long)]
    bins: Option<usize>,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print features, their types and allowed values, then exit
    #[arg(long)]
    describe: bool,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

/// Logs go to stderr; stdout carries the chart.
fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_dataset(input: Option<&Path>) -> Result<Dataset> {
    let Some(path) = input else {
        let csv = read_csv_from_stdin().context("Failed to read CSV from stdin")?;
        return Ok(Dataset::from_csv(csv));
    };

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Dataset::from_json_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
    } else {
        let file = fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let csv = read_csv(file).with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Dataset::from_csv(csv))
    }
}

fn pipeline_params(args: &Args) -> Result<PipelineParams> {
    let mut params = match &args.params {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))?
        }
        None => PipelineParams::default(),
    };

    for expr in &args.filters {
        params.filters.push(parse_filter(expr)?);
    }
    if args.remove_outliers {
        params.outlier_threshold = Some(args.iqr_threshold);
    }
    if args.normalize {
        params.normalize = true;
    }
    if let Some(expr) = &args.aggregate {
        params.aggregation = Some(parse_aggregation(expr)?);
    }
    if let Some(expr) = &args.sort {
        params.sort = Some(parse_sort(expr)?);
    }
    Ok(params)
}

fn required(value: &Option<String>, flag: &str, chart: ChartType) -> Result<String> {
    value
        .clone()
        .ok_or_else(|| anyhow!("--chart {} requires {}", chart, flag))
}

fn chart_spec(args: &Args) -> Result<ChartSpec> {
    let chart = args.chart;
    Ok(match chart {
        ChartType::Line => ChartSpec::Line {
            x: required(&args.x, "-x", chart)?,
            y: required(&args.y, "-y", chart)?,
        },
        ChartType::Scatter => ChartSpec::Scatter {
            x: required(&args.x, "-x", chart)?,
            y: required(&args.y, "-y", chart)?,
        },
        ChartType::Bar => ChartSpec::Bar {
            value: required(&args.value, "--value", chart)?,
            label: args.label.clone(),
        },
        ChartType::Heatmap => ChartSpec::Heatmap {
            row: required(&args.row, "--row", chart)?,
            column: required(&args.column, "--column", chart)?,
            value: required(&args.value, "--value", chart)?,
        },
        ChartType::Histogram => ChartSpec::Histogram {
            column: required(&args.column, "--column", chart)?,
        },
        ChartType::Table => ChartSpec::Table {
            columns: args.columns.clone(),
        },
    })
}

fn chart_config(args: &Args) -> Result<ChartConfig> {
    let mut config = match &args.config {
        Some(path) => ChartConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ChartConfig::default(),
    };
    if let Some(format) = args.format {
        config.format = format;
    }
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(bins) = args.bins {
        config.histogram_bins = bins;
    }
    config.title = args.title.clone().or(config.title);
    config.x_label = args.x_label.clone().or(config.x_label);
    config.y_label = args.y_label.clone().or(config.y_label);
    config.color = args.color.clone().or(config.color);
    Ok(config)
}

fn describe(dataset: &Dataset) -> Result<String> {
    let numeric = numeric_features(&dataset.records, &dataset.features, &dataset.types)?;
    let mut out = format!("{} records\n", dataset.records.len());
    for (feature, ty) in dataset.features.iter().zip(&dataset.types) {
        let marker = if numeric.contains(feature) { " (numeric)" } else { "" };
        let values = dataset.allowed_values(feature);
        let shown: Vec<String> = values
            .iter()
            .take(DESCRIBE_VALUE_LIMIT)
            .map(|v| v.label())
            .collect();
        let more = if values.len() > DESCRIBE_VALUE_LIMIT { ", ..." } else { "" };
        out.push_str(&format!(
            "{}: {}{} [{}{}]\n",
            feature,
            ty.as_str(),
            marker,
            shown.join(", "),
            more
        ));
    }
    Ok(out)
}

fn write_output(bytes: &[u8], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} bytes to {}", bytes.len(), path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(bytes).context("Failed to write chart to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let dataset = load_dataset(args.input.as_deref())?;
    debug!(
        "Loaded {} records with {} features",
        dataset.records.len(),
        dataset.features.len()
    );

    if args.describe {
        let text = describe(&dataset)?;
        return write_output(text.as_bytes(), args.output.as_deref());
    }

    let params = pipeline_params(&args)?;
    let spec = chart_spec(&args)?;
    let config = chart_config(&args)?;
    let renderer = renderer_for(config.format);

    let bytes = visualize(&dataset, &params, &spec, renderer.as_ref(), &config)
        .context("Failed to render chart")?;

    write_output(&bytes, args.output.as_deref())
}
