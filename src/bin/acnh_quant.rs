use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;

use acnh_quant::{
    CanvasOptions, HsvColor, LegalPalette, QuantizedImage, RangeConvention, ResizeFilter,
    quantize_to_canvas,
};

/// Enumerate every color selectable in the design editor and quantize images
/// onto that palette.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every legal color
    Colors {
        /// Format for the printed colors
        #[arg(short, long, value_enum, default_value_t = ColorMode::Rgb)]
        mode: ColorMode,

        /// Print the total number of entries at the end
        #[arg(short, long, conflicts_with = "json")]
        total: bool,

        /// Channel range convention of the picker grid
        #[arg(short, long, value_enum, default_value_t = ConventionArg::Standard360)]
        convention: ConventionArg,

        /// Emit a JSON array instead of one color per line
        #[arg(long)]
        json: bool,
    },

    /// Print the picker coordinates nearest to an HSV value
    Index {
        /// Hue channel value
        hue: f64,

        /// Saturation channel value
        sat: f64,

        /// Value channel value
        val: f64,

        /// Ranges the inputs are expressed against; rescaled onto the
        /// convention's ranges before rounding
        #[arg(long, num_args = 3, value_names = ["H_MAX", "S_MAX", "V_MAX"])]
        ranges: Option<Vec<f64>>,

        /// Channel range convention of the picker grid
        #[arg(short, long, value_enum, default_value_t = ConventionArg::Standard360)]
        convention: ConventionArg,
    },

    /// Quantize an image onto the legal palette for the 32x32 design canvas
    Quantize {
        /// Location of the image to quantize
        input: PathBuf,

        /// Location to save the quantized image
        #[arg(short, long, default_value = "./output.png")]
        output: PathBuf,

        /// Seed the clustering randomly; runs then produce different images.
        /// Omitting this gives a deterministic image
        #[arg(long)]
        random_seed: bool,

        /// Print the color palette used in the final image
        #[arg(short, long, value_enum)]
        palette: Option<PaletteReport>,

        /// Quantize at full resolution before the canvas resize
        #[arg(long)]
        prequantize: bool,

        /// Resampling filter for the canvas resize
        #[arg(short, long, value_enum, default_value_t = FilterArg::Lanczos)]
        filter: FilterArg,

        /// Channel range convention of the picker grid
        #[arg(short, long, value_enum, default_value_t = ConventionArg::Standard360)]
        convention: ConventionArg,

        /// Emit the palette report as JSON
        #[arg(long, requires = "palette")]
        json: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ColorMode {
    /// RGB triples with float channels
    Rgb,
    /// RGB triples rounded to integers
    RgbRounded,
    /// HSV grid values
    Hsv,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ConventionArg {
    /// Hue 0-255 in 29 steps, saturation and value 0-255
    #[value(name = "legacy-255", alias = "legacy")]
    Legacy255,
    /// Hue 0-360 in steps of 12, saturation and value 0-100
    #[value(name = "standard-360", alias = "standard")]
    Standard360,
}

impl From<ConventionArg> for RangeConvention {
    fn from(arg: ConventionArg) -> Self {
        match arg {
            ConventionArg::Legacy255 => RangeConvention::Legacy255,
            ConventionArg::Standard360 => RangeConvention::Standard360,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PaletteReport {
    /// RGB format (0-255 per channel)
    Rgb,
    /// HSV format in the grid's channel values
    Hsv,
    /// Picker index triples
    Ac,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FilterArg {
    Nearest,
    Box,
    Bilinear,
    Hamming,
    Bicubic,
    Lanczos,
}

impl From<FilterArg> for ResizeFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Nearest => ResizeFilter::Nearest,
            FilterArg::Box => ResizeFilter::Box,
            FilterArg::Bilinear => ResizeFilter::Bilinear,
            FilterArg::Hamming => ResizeFilter::Hamming,
            FilterArg::Bicubic => ResizeFilter::Bicubic,
            FilterArg::Lanczos => ResizeFilter::Lanczos,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Colors {
            mode,
            total,
            convention,
            json,
        } => run_colors(mode, total, convention.into(), json),
        Command::Index {
            hue,
            sat,
            val,
            ranges,
            convention,
        } => run_index(HsvColor::new(hue, sat, val), ranges, convention.into()),
        Command::Quantize {
            input,
            output,
            random_seed,
            palette,
            prequantize,
            filter,
            convention,
            json,
        } => {
            let opts = CanvasOptions {
                deterministic: !random_seed,
                prequantize,
                filter: filter.into(),
            };
            run_quantize(&input, &output, opts, palette, convention.into(), json)
        }
    }
}

fn run_colors(mode: ColorMode, total: bool, convention: RangeConvention, json: bool) -> Result<()> {
    let palette = LegalPalette::generate(convention);

    let count = match mode {
        ColorMode::Hsv => {
            let colors = palette.hsv_colors();
            if json {
                let values: Vec<_> = colors.iter().map(|c| json!([c.hue, c.sat, c.val])).collect();
                println!("{}", serde_json::Value::from(values));
            } else {
                for c in colors {
                    println!("({}, {}, {})", c.hue, c.sat, c.val);
                }
            }
            colors.len()
        }
        ColorMode::Rgb => {
            let colors = palette.rgb_colors();
            if json {
                let values: Vec<_> = colors
                    .iter()
                    .map(|c| json!([c.red, c.green, c.blue]))
                    .collect();
                println!("{}", serde_json::Value::from(values));
            } else {
                for c in colors {
                    println!("({}, {}, {})", c.red, c.green, c.blue);
                }
            }
            colors.len()
        }
        ColorMode::RgbRounded => {
            let colors = palette.rgb_colors();
            if json {
                let values: Vec<_> = colors
                    .iter()
                    .map(|c| {
                        let [r, g, b] = c.rounded();
                        json!([r, g, b])
                    })
                    .collect();
                println!("{}", serde_json::Value::from(values));
            } else {
                for c in colors {
                    let [r, g, b] = c.rounded();
                    println!("({r}, {g}, {b})");
                }
            }
            colors.len()
        }
    };

    if total {
        println!("{count} total colors.");
    }

    Ok(())
}

fn run_index(color: HsvColor, ranges: Option<Vec<f64>>, convention: RangeConvention) -> Result<()> {
    let palette = LegalPalette::generate(convention);
    let index = match ranges {
        Some(r) => palette.index_of_scaled(color, [r[0], r[1], r[2]]),
        None => palette.index_of(color),
    };
    println!("({}, {}, {})", index.hue, index.sat, index.val);
    Ok(())
}

fn run_quantize(
    input: &Path,
    output: &Path,
    opts: CanvasOptions,
    report: Option<PaletteReport>,
    convention: RangeConvention,
    json: bool,
) -> Result<()> {
    let palette = LegalPalette::generate(convention);
    let img = image::open(input).with_context(|| format!("unable to open {}", input.display()))?;

    let quantized = quantize_to_canvas(&img, &palette, opts)?;

    quantized
        .to_image()
        .save(output)
        .with_context(|| format!("unable to save {}", output.display()))?;
    println!("Saved → {}", output.display());

    if let Some(report) = report {
        print_report(&quantized, &palette, report, json)?;
    }

    Ok(())
}

fn print_report(
    quantized: &QuantizedImage,
    palette: &LegalPalette,
    report: PaletteReport,
    json: bool,
) -> Result<()> {
    let colors = quantized.distinct_colors();

    match report {
        PaletteReport::Hsv => {
            if json {
                let values: Vec<_> = colors.iter().map(|c| json!([c.hue, c.sat, c.val])).collect();
                println!("{}", serde_json::Value::from(values));
            } else {
                for c in &colors {
                    println!("({}, {}, {})", c.hue, c.sat, c.val);
                }
            }
        }
        PaletteReport::Rgb => {
            let mut rgb = Vec::with_capacity(colors.len());
            for c in &colors {
                let legal = palette
                    .rgb_for_hsv(c)
                    .context("quantized color missing from the legal palette")?;
                rgb.push(*legal);
            }
            if json {
                let values: Vec<_> = rgb
                    .iter()
                    .map(|c| json!([c.red, c.green, c.blue]))
                    .collect();
                println!("{}", serde_json::Value::from(values));
            } else {
                for c in &rgb {
                    println!("({}, {}, {})", c.red, c.green, c.blue);
                }
            }
        }
        PaletteReport::Ac => {
            let indexes: Vec<_> = colors.iter().map(|c| palette.index_of(*c)).collect();
            if json {
                let values: Vec<_> = indexes
                    .iter()
                    .map(|i| json!([i.hue, i.sat, i.val]))
                    .collect();
                println!("{}", serde_json::Value::from(values));
            } else {
                for i in &indexes {
                    println!("({}, {}, {})", i.hue, i.sat, i.val);
                }
            }
        }
    }

    Ok(())
}
