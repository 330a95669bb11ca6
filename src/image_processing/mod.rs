pub mod classify;
pub mod composite;
pub mod sampler;
pub mod trim;

use anyhow::{Context, Result};
use image::{ImageFormat, Rgb};
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use walkdir::WalkDir;

use crate::error::Error;
use crate::utils::{has_valid_extension, verbose_println};
use self::classify::ClassifierSpec;

#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    pub spec: ClassifierSpec,
    pub sample_inset: u32,
    pub trim: bool,
    pub destructive: bool,
    pub extensions: Vec<String>,
    pub verbose: bool,
    pub parallel_jobs: usize,
    pub force: bool,
    pub dry_run: bool,
}

/// A discovered source frame and its path relative to the input root it came
/// from, used to mirror the directory structure under the output root.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub path: PathBuf,
    pub relative: PathBuf,
}

pub struct ProcessingEngine {
    config: ProcessingConfig,
}

impl ProcessingEngine {
    pub fn new(config: ProcessingConfig) -> Result<Self> {
        // A malformed parameter set would silently misclassify every pixel
        // of every frame, so it aborts before any file is touched.
        config.spec.validate()?;

        // Initialize thread pool with specified number of jobs
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_jobs)
            .build_global()
            .context("Failed to initialize thread pool")?;

        Ok(Self { config })
    }

    /// Discover all image files in the input paths (files are taken as-is,
    /// directories are walked recursively).
    pub fn discover_images(&self, input_paths: &[PathBuf]) -> Result<Vec<SourceImage>> {
        let mut sources = Vec::new();

        for input_path in input_paths {
            if input_path.is_file() {
                let relative = input_path
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("image"));
                sources.push(SourceImage {
                    path: input_path.clone(),
                    relative,
                });
                continue;
            }

            verbose_println(
                self.config.verbose,
                &format!("Scanning directory: {}", input_path.display()),
            );

            let walker = WalkDir::new(input_path)
                .follow_links(false)
                .max_depth(10); // Reasonable depth limit

            for entry in walker {
                let entry = entry.context("Failed to read directory entry")?;
                let path = entry.path();

                if path.is_file() && has_valid_extension(path, &self.config.extensions) {
                    let relative = path.strip_prefix(input_path).unwrap_or(path).to_path_buf();
                    sources.push(SourceImage {
                        path: path.to_path_buf(),
                        relative,
                    });
                }
            }
        }

        // Sort for consistent processing order
        sources.sort_by(|a, b| a.path.cmp(&b.path));

        verbose_println(
            self.config.verbose,
            &format!("Found {} image files", sources.len()),
        );
        Ok(sources)
    }

    /// Where the processed frame lands. Destructive mode writes back next to
    /// the source; otherwise the source-relative path is mirrored under the
    /// output root. The extension always becomes `.png` so transparency
    /// survives even when the source was a JPEG or BMP.
    pub fn output_path_for(&self, source: &SourceImage, output_root: &Path) -> PathBuf {
        if self.config.destructive {
            source.path.with_extension("png")
        } else {
            output_root.join(&source.relative).with_extension("png")
        }
    }

    /// Run a batch of frames through the pipeline in parallel.
    ///
    /// Frames whose output already exists are set aside up front (unless
    /// `--force` or destructive mode). Per-file failures are collected
    /// alongside their source, not propagated, so one broken frame never
    /// aborts the batch.
    pub fn process_batch(
        &self,
        sources: &[SourceImage],
        output_root: &Path,
        progress: &ProgressBar,
    ) -> (
        Vec<(SourceImage, Result<ProcessingResult, Error>)>,
        Vec<SkippedResult>,
    ) {
        let mut pending = Vec::new();
        let mut skipped = Vec::new();
        for source in sources {
            let output_path = self.output_path_for(source, output_root);
            if !self.config.force && !self.config.destructive && output_path.exists() {
                skipped.push(SkippedResult {
                    input_path: source.path.clone(),
                    existing_output_path: output_path,
                });
            } else {
                pending.push(source.clone());
            }
        }

        let processed_count = AtomicUsize::new(0);
        let total = pending.len();

        let results: Vec<(SourceImage, Result<ProcessingResult, Error>)> = pending
            .par_iter()
            .map(|source| {
                if let Some(filename) = source.path.file_name().and_then(|f| f.to_str()) {
                    progress.set_message(format!("Processing {}", filename));
                }

                let result = self.process_single_image(source, output_root);

                let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
                progress.inc(1);
                progress.set_message(format!("Completed: {}/{}", count, total));

                (source.clone(), result)
            })
            .collect();

        (results, skipped)
    }

    /// Process a single frame: decode, resolve the classifier, composite,
    /// optionally trim, then persist as PNG.
    fn process_single_image(
        &self,
        source: &SourceImage,
        output_root: &Path,
    ) -> Result<ProcessingResult, Error> {
        let start = Instant::now();
        verbose_println(
            self.config.verbose,
            &format!("Processing: {}", source.path.display()),
        );

        let img = image::open(&source.path)
            .map_err(|e| Error::Decode {
                path: source.path.clone(),
                source: e,
            })?
            .to_rgba8();
        let original_size = img.dimensions();

        let classifier = self.config.spec.resolve(&img, self.config.sample_inset)?;
        let background = classifier.reference();
        if self.config.spec.samples_reference() {
            if let Some(color) = background {
                verbose_println(
                    self.config.verbose,
                    &format!(
                        "Sampled background color: #{:02x}{:02x}{:02x}",
                        color[0], color[1], color[2]
                    ),
                );
            }
        }

        let (composited, pixels_cleared) = composite::apply(&img, &classifier);

        let output = if self.config.trim {
            trim::trim(&composited, trim::alpha_extent(&composited))
        } else {
            composited
        };
        let output_size = output.dimensions();

        let output_path = self.output_path_for(source, output_root);

        // Rewriting a frame that came out identical to its source would only
        // churn timestamps, so in-place runs skip it.
        let unchanged =
            pixels_cleared == 0 && output_size == original_size && output_path == source.path;

        let outcome = if unchanged {
            Outcome::Unchanged
        } else if self.config.dry_run {
            Outcome::DryRun
        } else {
            if let Some(parent) = output_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            output
                .save_with_format(&output_path, ImageFormat::Png)
                .map_err(|e| Error::Encode {
                    path: output_path.clone(),
                    source: e,
                })?;
            Outcome::Written
        };

        Ok(ProcessingResult {
            input_path: source.path.clone(),
            output_path,
            background,
            pixels_cleared,
            original_size,
            output_size,
            outcome,
            processing_time: start.elapsed(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Output written.
    Written,
    /// Nothing changed; the in-place write was elided.
    Unchanged,
    /// Dry run; the write was simulated.
    DryRun,
}

#[derive(Debug)]
pub struct ProcessingResult {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Resolved reference color, when the strategy uses one.
    pub background: Option<Rgb<u8>>,
    /// Pixels whose alpha was lowered by classification.
    pub pixels_cleared: usize,
    pub original_size: (u32, u32),
    pub output_size: (u32, u32),
    pub outcome: Outcome,
    pub processing_time: Duration,
}

/// A frame set aside because its output already exists.
#[derive(Debug)]
pub struct SkippedResult {
    pub input_path: PathBuf,
    pub existing_output_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::classify::ReferenceColor;

    fn test_config(destructive: bool) -> ProcessingConfig {
        ProcessingConfig {
            spec: ClassifierSpec::ExactTolerance {
                reference: ReferenceColor::Fixed(Rgb([71, 99, 109])),
                tolerance: 10,
            },
            sample_inset: 10,
            trim: false,
            destructive,
            extensions: vec!["png".to_string(), "jpg".to_string()],
            verbose: false,
            parallel_jobs: 1,
            force: false,
            dry_run: false,
        }
    }

    fn engine(destructive: bool) -> ProcessingEngine {
        // Bypasses `new` so tests do not install a global thread pool.
        ProcessingEngine {
            config: test_config(destructive),
        }
    }

    #[test]
    fn test_output_path_mirrors_relative_structure() {
        let engine = engine(false);
        let source = SourceImage {
            path: PathBuf::from("/assets/punch/1/frame_001.png"),
            relative: PathBuf::from("1/frame_001.png"),
        };
        assert_eq!(
            engine.output_path_for(&source, Path::new("/out")),
            PathBuf::from("/out/1/frame_001.png")
        );
    }

    #[test]
    fn test_output_path_switches_extension_to_png() {
        let engine = engine(false);
        let source = SourceImage {
            path: PathBuf::from("/assets/stand.jpg"),
            relative: PathBuf::from("stand.jpg"),
        };
        assert_eq!(
            engine.output_path_for(&source, Path::new("/out")),
            PathBuf::from("/out/stand.png")
        );
    }

    #[test]
    fn test_output_path_destructive_writes_beside_source() {
        let engine = engine(true);
        let source = SourceImage {
            path: PathBuf::from("/assets/punch/frame_001.png"),
            relative: PathBuf::from("frame_001.png"),
        };
        assert_eq!(
            engine.output_path_for(&source, Path::new("/out")),
            PathBuf::from("/assets/punch/frame_001.png")
        );
    }
}
