use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use img2eq::{
    EquationOptions, EquationStyle, MaskConfig, MaskMethod, ThresholdMethod, TracingConfig,
    TurnPolicy, YAxis,
};

#[derive(Parser)]
#[command(
    name = "img2eq",
    about = "Trace image edges into cubic bezier curves and write them as parametric equations"
)]
struct Cli {
    /// Input image path (PNG, JPEG, BMP)
    #[arg(short, long)]
    input: PathBuf,

    /// Output file, one equation per line
    #[arg(short, long, default_value = "equations.txt")]
    output: PathBuf,

    /// Drop contours enclosing fewer pixels than this
    #[arg(long, default_value = "50")]
    turdsize: u64,

    /// How ambiguous diagonal pixel junctions are resolved
    #[arg(long, value_enum, default_value = "minority")]
    turnpolicy: TurnPolicy,

    /// Corner threshold (0 = all corners, above 1.34 = no corners)
    #[arg(long, default_value = "1.3")]
    alphamax: f64,

    /// Keep one curve per polygon vertex instead of merging runs
    #[arg(long)]
    no_opticurve: bool,

    /// Largest deviation (pixels) allowed when merging curves
    #[arg(long, default_value = "0.03")]
    opttolerance: f64,

    /// Canny low threshold
    #[arg(long, default_value = "150")]
    canny_low: f32,

    /// Canny high threshold
    #[arg(long, default_value = "150")]
    canny_high: f32,

    /// Trace dark regions below this brightness (0-255) instead of edges
    #[arg(long, conflicts_with = "otsu")]
    threshold: Option<u8>,

    /// Trace dark regions using Otsu's automatic threshold instead of edges
    #[arg(long)]
    otsu: bool,

    /// Invert the mask before tracing
    #[arg(long)]
    invert: bool,

    /// Equation layout
    #[arg(long, value_enum, default_value = "nested")]
    style: EquationStyle,

    /// Keep image coordinates (y grows downward) instead of flipping y
    #[arg(long)]
    y_down: bool,

    /// Digits after the decimal point (shortest exact form if omitted)
    #[arg(long)]
    precision: Option<usize>,

    /// Also write the trace result as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Also write a PNG preview of the mask and traced curves
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Preview pixels per mask pixel
    #[arg(long, default_value = "2")]
    preview_scale: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "  {}", record.args()))
        .init();

    let cli = Cli::parse();

    let method = match (cli.threshold, cli.otsu) {
        (Some(t), _) => MaskMethod::Threshold(ThresholdMethod::Fixed(t)),
        (None, true) => MaskMethod::Threshold(ThresholdMethod::Otsu),
        (None, false) => MaskMethod::Canny {
            low: cli.canny_low,
            high: cli.canny_high,
        },
    };
    let mask_config = MaskConfig {
        method,
        invert: cli.invert,
    };

    let config = TracingConfig {
        min_area: cli.turdsize,
        turn_policy: cli.turnpolicy,
        alphamax: cli.alphamax,
        opticurve: !cli.no_opticurve,
        opttolerance: cli.opttolerance,
    };

    let options = EquationOptions {
        style: cli.style,
        y_axis: if cli.y_down { YAxis::Down } else { YAxis::Up },
        precision: cli.precision,
    };

    // Header
    eprintln!();
    eprintln!("  img2eq \u{00b7} {}", cli.input.display());
    eprintln!();

    // Pipeline (lib logs step-by-step progress to stderr)
    let (mask, result) = img2eq::trace_image(&cli.input, &mask_config, &config)?;

    let equations = img2eq::equation::emit(&result, &options);
    let out = BufWriter::new(File::create(&cli.output)?);
    img2eq::equation::write_equations(out, &equations)?;

    if let Some(json_path) = &cli.json {
        let file = BufWriter::new(File::create(json_path)?);
        serde_json::to_writer_pretty(file, &result)?;
        eprintln!("  JSON        {}", json_path.display());
    }

    if let Some(preview_path) = &cli.preview {
        img2eq::render::render_preview(&mask, &result, preview_path, cli.preview_scale)?;
    }

    // Footer
    eprintln!();
    eprintln!(
        "  \u{2713} {} ({} equations)",
        cli.output.display(),
        equations.len()
    );
    eprintln!();

    Ok(())
}
