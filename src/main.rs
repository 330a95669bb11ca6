use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Instant;

use sprite_processor::cli::Args;
use sprite_processor::image_processing::{Outcome, ProcessingConfig, ProcessingEngine};
use sprite_processor::utils::{create_progress_bar, format_duration, validate_inputs};

fn main() -> Result<()> {
    let start_time = Instant::now();
    let mut args = Args::parse();

    // Print banner
    println!(
        "{}",
        style("Sprite Processor - Chroma-Key Background Remover")
            .bold()
            .blue()
    );
    println!(
        "{}",
        style("Alpha-transparent sprite frames from chroma-keyed captures").dim()
    );
    println!();

    // Merge optional config file beneath explicit flags
    args.load_and_merge_config()?;

    // Validate inputs
    validate_inputs(&args)?;

    // Assemble the classifier parameters. A malformed set is fatal here,
    // before any file is touched.
    let spec = args.build_spec().map_err(|e| anyhow::anyhow!(e))?;

    let config = ProcessingConfig {
        spec,
        sample_inset: args.sample_inset,
        trim: args.trim,
        destructive: args.destructive,
        extensions: args.parse_extensions(),
        verbose: args.verbose,
        parallel_jobs: if args.jobs == 0 {
            num_cpus::get()
        } else {
            args.jobs
        },
        force: args.force,
        dry_run: args.dry_run,
    };

    if config.verbose {
        println!("{}", style("Configuration:").bold());
        println!("  Strategy: {:?}", args.strategy);
        println!("  Reference color: {}", args.reference_color);
        println!("  Sample inset: {}", config.sample_inset);
        println!("  Trim after keying: {}", config.trim);
        println!("  Destructive mode: {}", config.destructive);
        println!("  Parallel jobs: {}", config.parallel_jobs);
        println!("  Extensions: {:?}", config.extensions);
        if config.dry_run {
            println!("  Dry run mode: enabled (simulation only - no files will be written)");
        }
        println!();
    }

    // Create output directory (not needed in dry-run or destructive mode)
    if !config.dry_run && !config.destructive {
        std::fs::create_dir_all(&args.output_dir).context("Failed to create output directory")?;
    }

    let dry_run_mode = config.dry_run;

    // Initialize processing engine (rejects malformed classifier parameters)
    let engine = ProcessingEngine::new(config)?;

    // Initialize multi-progress system
    let multi_progress = MultiProgress::new();

    // Discovery progress bar
    let discovery_pb = multi_progress.add(ProgressBar::new(args.input_paths.len() as u64));
    discovery_pb.set_style(
        ProgressStyle::with_template("{bar:20.green/blue} {pos:>2}/{len:2} {msg}")?
            .progress_chars("██▌ "),
    );
    discovery_pb.set_message("Scanning directories...");

    let sources = engine.discover_images(&args.input_paths)?;
    discovery_pb.finish_with_message(format!("✓ Found {} images", sources.len()));

    if sources.is_empty() {
        println!(
            "{}",
            style("No images found with specified extensions").red()
        );
        return Ok(());
    }

    // Main processing progress bar
    let main_progress = multi_progress.add(create_progress_bar(sources.len() as u64));
    main_progress.set_message("Processing images");

    let (results, skipped_results) =
        engine.process_batch(&sources, &args.output_dir, &main_progress);

    main_progress.finish_with_message("✓ Processing complete!");
    println!();

    // Print results summary
    let successful = results.iter().filter(|(_, r)| r.is_ok()).count();
    let failed = results.len() - successful;
    let skipped = skipped_results.len();
    let total_time = start_time.elapsed();

    let mut pixels_cleared_total = 0usize;
    let mut unchanged = 0usize;
    let mut trimmed = 0usize;
    for result in results.iter().filter_map(|(_, r)| r.as_ref().ok()) {
        pixels_cleared_total += result.pixels_cleared;
        if result.outcome == Outcome::Unchanged {
            unchanged += 1;
        }
        if result.output_size != result.original_size {
            trimmed += 1;
        }
    }

    let header = if dry_run_mode {
        style("Dry Run Results Summary:").bold().cyan()
    } else {
        style("Results Summary:").bold().green()
    };
    println!("{}", header);

    let processed_label = if dry_run_mode {
        "Would be processed"
    } else {
        "Successfully processed"
    };
    println!("  {}: {}", processed_label, style(successful).bold().green());
    if failed > 0 {
        println!("  Failed: {}", style(failed).bold().red());
    }
    if skipped > 0 {
        println!(
            "  Skipped (already exist): {}",
            style(skipped).bold().yellow()
        );
    }
    if unchanged > 0 {
        println!(
            "  Unchanged (write elided): {}",
            style(unchanged).bold().yellow()
        );
    }
    println!(
        "  Background pixels cleared: {}",
        style(pixels_cleared_total).bold().cyan()
    );
    if trimmed > 0 {
        println!("  Frames trimmed: {}", style(trimmed).bold().cyan());
    }

    // Detailed per-file results
    if successful > 0 && (args.verbose || dry_run_mode) {
        println!();
        let detailed_header = if dry_run_mode {
            style("Detailed Simulation Results:").bold().blue()
        } else {
            style("Detailed Processing Results:").bold().blue()
        };
        println!("{}", detailed_header);

        let mut success_count = 0;
        for result in results.iter().filter_map(|(_, r)| r.as_ref().ok()) {
            success_count += 1;
            let filename = result
                .input_path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("unknown");

            let background_info = match result.background {
                Some(color) => format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2]),
                None => "band match".to_string(),
            };

            let size_info = if result.output_size != result.original_size {
                format!(
                    "{}x{} → {}x{}",
                    result.original_size.0,
                    result.original_size.1,
                    result.output_size.0,
                    result.output_size.1
                )
            } else {
                format!("{}x{}", result.original_size.0, result.original_size.1)
            };

            println!(
                "  {}: {} [{}] - {} px cleared, {}",
                style(format!("#{}", success_count)).dim(),
                style(filename).bold(),
                style(background_info).cyan(),
                style(result.pixels_cleared).green(),
                style(size_info).dim()
            );
        }
    }

    println!();
    println!("{}", style("Performance:").bold().blue());
    println!(
        "  Total processing time: {}",
        style(format_duration(total_time)).bold()
    );
    println!(
        "  Average time per image: {}",
        style(format_duration(total_time / sources.len() as u32)).dim()
    );

    println!();
    let output_header = if dry_run_mode {
        style("Output files (would be created):").bold().cyan()
    } else {
        style("Output files:").bold().green()
    };
    println!("{}", output_header);
    if args.destructive {
        println!("  Written in place next to the sources");
    } else {
        println!("  All files: {}", args.output_dir.display());
    }

    if dry_run_mode {
        println!();
        println!("{}", style("Dry Run Mode:").bold().yellow());
        println!("  • No files were written during this simulation");
        println!("  • Remove --dry-run to actually process the images");
    }

    if failed > 0 {
        println!();
        println!("{}", style("Errors encountered:").bold().red());
        let mut error_count = 0;
        for (source, result) in &results {
            if let Err(e) = result {
                error_count += 1;
                let filename = source
                    .path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or("unknown");
                println!(
                    "  {}: {} - {}",
                    style(format!("#{}", error_count)).dim(),
                    style(filename).bold().red(),
                    e
                );
            }
        }

        println!();
        println!(
            "{}",
            style(format!("⚠ {} errors occurred during processing", failed))
                .bold()
                .yellow()
        );
        println!("  Check image files and try again with --verbose for more details");
    }

    // Show skipped files if any
    if !skipped_results.is_empty() {
        println!();
        println!(
            "{}",
            style("Skipped files (already exist):").bold().yellow()
        );
        for (i, skipped) in skipped_results.iter().enumerate() {
            let filename = skipped
                .input_path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("unknown");

            let existing_filename = skipped
                .existing_output_path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("unknown");

            println!(
                "  {}: {} (existing: {})",
                style(format!("#{}", i + 1)).dim(),
                style(filename).bold().yellow(),
                style(existing_filename).dim()
            );
        }

        println!();
        println!(
            "{}",
            style(format!(
                "ℹ {} files skipped to avoid overwriting existing outputs",
                skipped_results.len()
            ))
            .bold()
            .blue()
        );
        println!("  Use --force to process all files regardless of existing outputs");
    }

    Ok(())
}
