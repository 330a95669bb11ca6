use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::image_processing::classify::{ChannelBand, ClassifierSpec, ReferenceColor, UnitBand};
use crate::utils::parse_hex_color;

#[derive(Debug, Clone, ValueEnum, PartialEq, Eq)]
pub enum Strategy {
    /// Exact reference color match with a per-channel tolerance
    #[value(name = "exact-tolerance")]
    ExactTolerance,
    /// Independent closed ranges per RGB channel
    #[value(name = "range")]
    Range,
    /// Euclidean distance with a soft feathering band for anti-aliased edges
    #[value(name = "distance-feather")]
    DistanceFeather,
    /// Closed ranges over normalized hue/saturation/value
    #[value(name = "hsv-range")]
    HsvRange,
}

#[derive(Parser, Debug)]
#[command(
    name = "sprite-processor",
    about = "High-performance chroma-key background remover for game sprite frames",
    long_about = "
Sprite Processor - Chroma-Key Background Remover

This tool strips a known background color (and its shading variants) from
batches of sprite frames, producing alpha-transparent PNGs ready for use as
game assets. Four interchangeable classification strategies cover the usual
trade-offs, from strict per-pixel matching to hue-based matching that is
robust against exposure drift between frames.

Key Features:
• Parallel batch processing with progress tracking
• Automatic background color detection from frame corners
• Soft feathered edges instead of hard halos around sprites
• Optional trimming of fully-transparent border area
• Per-file failure isolation: one broken frame never aborts the batch

Example Usage:
  # Remove an exact background color with a small tolerance
  sprite-processor -i ~/sprites -o ~/processed --reference-color '#47646f' --tolerance 10

  # Sample the background from the frame corners and feather the edges
  sprite-processor -i ~/sprites -o ~/processed --strategy distance-feather \\
    --reference-color auto --inner-threshold 80 --outer-threshold 120

  # Match a narrow per-channel band observed in compressed frames
  sprite-processor -i ~/sprites -o ~/processed --strategy range \\
    --red-range 68-74 --green-range 96-101 --blue-range 106-111

  # Hue-based matching for frames with varying exposure, then trim
  sprite-processor -i ~/sprites -o ~/processed --strategy hsv-range \\
    --hue-range 0.43-0.60 --saturation-range 0.15-1.0 --value-range 0.30-0.55 --trim

  # Overwrite sources in place instead of writing an output tree
  sprite-processor -i ~/sprites --destructive --trim

  # Dry run: show what would happen without writing anything
  sprite-processor -i ~/sprites -o ~/processed --dry-run --verbose"
)]
pub struct Args {
    /// Input directories or single image files (can be specified multiple times)
    #[arg(short = 'i', long = "input", required = true, value_name = "DIR|FILE")]
    pub input_paths: Vec<PathBuf>,

    /// Output directory for processed frames (ignored with --destructive)
    #[arg(short = 'o', long = "output", default_value = ".", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Classification strategy
    #[arg(long = "strategy", default_value = "exact-tolerance")]
    pub strategy: Strategy,

    /// Background reference color: '#RRGGBB' or 'auto' to sample the frame corners
    #[arg(long = "reference-color", default_value = "auto", value_name = "COLOR")]
    pub reference_color: String,

    /// Per-channel tolerance for exact-tolerance matching
    #[arg(long = "tolerance", default_value = "10", value_name = "N")]
    pub tolerance: u8,

    /// Red channel band for range matching (format: LO-HI)
    #[arg(long = "red-range", default_value = "68-74", value_name = "LO-HI")]
    pub red_range: String,

    /// Green channel band for range matching (format: LO-HI)
    #[arg(long = "green-range", default_value = "96-101", value_name = "LO-HI")]
    pub green_range: String,

    /// Blue channel band for range matching (format: LO-HI)
    #[arg(long = "blue-range", default_value = "106-111", value_name = "LO-HI")]
    pub blue_range: String,

    /// Distance below which a pixel is fully removed (distance-feather)
    #[arg(long = "inner-threshold", default_value = "80", value_name = "DIST")]
    pub inner_threshold: f32,

    /// Distance above which a pixel is fully kept (distance-feather)
    #[arg(long = "outer-threshold", default_value = "120", value_name = "DIST")]
    pub outer_threshold: f32,

    /// Normalized hue band for hsv-range matching (format: LO-HI, each in 0..1)
    #[arg(long = "hue-range", default_value = "0.43-0.60", value_name = "LO-HI")]
    pub hue_range: String,

    /// Normalized saturation band for hsv-range matching
    #[arg(
        long = "saturation-range",
        default_value = "0.15-1.0",
        value_name = "LO-HI"
    )]
    pub saturation_range: String,

    /// Normalized value band for hsv-range matching
    #[arg(long = "value-range", default_value = "0.30-0.55", value_name = "LO-HI")]
    pub value_range: String,

    /// Corner sampling inset in pixels for --reference-color auto
    #[arg(long = "sample-inset", default_value = "10", value_name = "N")]
    pub sample_inset: u32,

    /// Trim fully-transparent border area after background removal
    #[arg(long = "trim")]
    pub trim: bool,

    /// Overwrite source files in place instead of writing to the output directory
    #[arg(long = "destructive")]
    pub destructive: bool,

    /// Comma-separated list of image extensions to process
    #[arg(long = "extensions", default_value = "png,jpg,jpeg,bmp")]
    pub extensions_str: String,

    /// Number of parallel processing jobs (0 = auto-detect CPU cores)
    #[arg(short = 'j', long = "jobs", default_value = "0", value_name = "N")]
    pub jobs: usize,

    /// Enable verbose output with detailed progress information
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Force processing even if output files already exist
    #[arg(long = "force")]
    pub force: bool,

    /// Simulate processing without writing any files
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Optional JSON configuration file merged beneath explicit flags
    #[arg(long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,
}

impl Args {
    /// Parse the extensions string into a vector
    pub fn parse_extensions(&self) -> Vec<String> {
        self.extensions_str
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Parse the reference color: 'auto' or a '#RRGGBB' hex triple
    pub fn parse_reference_color(&self) -> Result<ReferenceColor, String> {
        if self.reference_color.eq_ignore_ascii_case("auto") {
            return Ok(ReferenceColor::Auto);
        }
        parse_hex_color(&self.reference_color).map(ReferenceColor::Fixed)
    }

    /// Assemble the classifier spec for the selected strategy.
    ///
    /// Only parses; semantic validation (inverted bands, threshold order)
    /// happens once in the processing core before any file is touched.
    pub fn build_spec(&self) -> Result<ClassifierSpec, String> {
        match self.strategy {
            Strategy::ExactTolerance => Ok(ClassifierSpec::ExactTolerance {
                reference: self.parse_reference_color()?,
                tolerance: self.tolerance,
            }),
            Strategy::Range => Ok(ClassifierSpec::ChannelRange {
                red: parse_channel_range(&self.red_range)?,
                green: parse_channel_range(&self.green_range)?,
                blue: parse_channel_range(&self.blue_range)?,
            }),
            Strategy::DistanceFeather => Ok(ClassifierSpec::DistanceFeather {
                reference: self.parse_reference_color()?,
                inner: self.inner_threshold,
                outer: self.outer_threshold,
            }),
            Strategy::HsvRange => Ok(ClassifierSpec::HsvRange {
                hue: parse_unit_range(&self.hue_range)?,
                saturation: parse_unit_range(&self.saturation_range)?,
                value: parse_unit_range(&self.value_range)?,
            }),
        }
    }
}

/// Parse a 'LO-HI' band of 8-bit channel values
pub fn parse_channel_range(range: &str) -> Result<ChannelBand, String> {
    let (lo, hi) = split_range(range)?;
    let lo = lo
        .parse::<u8>()
        .map_err(|_| format!("Invalid channel value: '{}'", lo))?;
    let hi = hi
        .parse::<u8>()
        .map_err(|_| format!("Invalid channel value: '{}'", hi))?;
    Ok(ChannelBand::new(lo, hi))
}

/// Parse a 'LO-HI' band of normalized [0,1] values
pub fn parse_unit_range(range: &str) -> Result<UnitBand, String> {
    let (lo, hi) = split_range(range)?;
    let lo = lo
        .parse::<f32>()
        .map_err(|_| format!("Invalid value: '{}'", lo))?;
    let hi = hi
        .parse::<f32>()
        .map_err(|_| format!("Invalid value: '{}'", hi))?;
    Ok(UnitBand::new(lo, hi))
}

fn split_range(range: &str) -> Result<(&str, &str), String> {
    let parts: Vec<&str> = range.split('-').collect();
    if parts.len() != 2 {
        return Err(format!(
            "Invalid range format '{}'. Use LO-HI (e.g., 68-74)",
            range
        ));
    }
    Ok((parts[0].trim(), parts[1].trim()))
}


// Default implementation for tests
#[cfg(test)]
impl Default for Args {
    fn default() -> Self {
        Self {
            input_paths: vec![],
            output_dir: PathBuf::from("."),
            strategy: Strategy::ExactTolerance,
            reference_color: "auto".to_string(),
            tolerance: 10,
            red_range: "68-74".to_string(),
            green_range: "96-101".to_string(),
            blue_range: "106-111".to_string(),
            inner_threshold: 80.0,
            outer_threshold: 120.0,
            hue_range: "0.43-0.60".to_string(),
            saturation_range: "0.15-1.0".to_string(),
            value_range: "0.30-0.55".to_string(),
            sample_inset: 10,
            trim: false,
            destructive: false,
            extensions_str: "png,jpg,jpeg,bmp".to_string(),
            jobs: 0,
            verbose: false,
            force: false,
            dry_run: false,
            config_file: None,
        }
    }
}
