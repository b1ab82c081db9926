use book_splitter::config::split::{load_config, SplitToolConfig};
use book_splitter::image::io::{load_rgba_image, save_png, write_json_file};
use book_splitter::split::SplitCandidate;
use book_splitter::{PageSplitter, SplitReport};
use std::env;
use std::fs;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;
    let params = config.splitter_params()?;

    let rgba = load_rgba_image(&config.input)?;
    let splitter = PageSplitter::new(params);
    let report = splitter
        .split(&rgba.as_view(), config.pages)
        .map_err(|e| e.to_string())?;

    print_text_summary(&report, config.output.top_candidates());
    save_outputs(&config, &report)?;
    Ok(())
}

fn print_text_summary(report: &SplitReport, top: usize) {
    let det = &report.detection;
    println!("Split summary");
    println!("  input: {}x{}", det.input.width, det.input.height);
    match det.input.expected_pages {
        Some(p) => println!("  mode: guided ({p} pages)"),
        None => println!("  mode: automatic"),
    }
    println!("  min page height: {}px", det.input.min_page_height);
    println!("  split points: {:?}", det.points.as_slice());
    println!(
        "  candidates: {} (showing top {})",
        det.candidates.len(),
        top.min(det.candidates.len())
    );
    for (rank, c) in det.top_candidates(top).iter().enumerate() {
        println!(
            "    #{:<2} y={:<6} rows={}..{} h={:<3} gray={:.2} uniform={:.2} brightness={:.1} score={:.2}",
            rank + 1,
            c.middle,
            c.start,
            c.end,
            c.height,
            c.gray_ratio,
            c.uniformity,
            c.brightness,
            c.score
        );
    }

    let synthesized: Vec<usize> = det
        .selection
        .picks
        .iter()
        .filter(|p| p.is_synthesized())
        .map(SplitCandidate::middle)
        .collect();
    if det.selection.even_division {
        println!("  selection: even division (no candidates)");
    } else if !synthesized.is_empty() {
        println!("  selection: repaired, synthesized at {synthesized:?}");
    }

    println!("\nPage distribution");
    for span in &det.pages {
        println!(
            "  page {:<3} rows {:>6}..{:<6} h={:<6} {:5.1}%",
            span.index, span.start_y, span.end_y, span.height, span.percent
        );
    }

    println!("\nClassification");
    for v in &report.classification.verdicts {
        let mut reasons = Vec::new();
        if v.too_short {
            reasons.push("too short");
        }
        if v.gray_separator {
            reasons.push("gray separator");
        }
        if v.uniform_gray {
            reasons.push("uniform gray");
        }
        let status = if reasons.is_empty() {
            "keep".to_string()
        } else {
            format!("filter ({})", reasons.join(", "))
        };
        println!(
            "  slice {:<3} h={:<6} brightness={:.1} gray={:.2} variance={:.1} -> {status}",
            v.slice.index + 1,
            v.slice.height,
            v.analysis.avg_brightness,
            v.analysis.gray_ratio,
            v.analysis.color_variance
        );
    }
    if report.classification.fallback_to_unfiltered {
        println!("  every slice was flagged; keeping all of them");
    }

    println!(
        "\nTimings (ms): {} total={:.3}",
        det.timings
            .stages
            .iter()
            .map(|s| format!("{}={:.3}", s.label, s.elapsed_ms))
            .collect::<Vec<_>>()
            .join(" "),
        det.timings.total_ms
    );
}

fn save_outputs(config: &SplitToolConfig, report: &SplitReport) -> Result<(), String> {
    if let Some(dir) = &config.output.pages_dir {
        fs::create_dir_all(dir)
            .map_err(|e| format!("Failed to create {}: {e}", dir.display()))?;
        let mut written = 0usize;
        for (n, page) in report.pages().enumerate() {
            let path = dir.join(format!("{}_{:03}.png", config.output.prefix(), n + 1));
            save_png(&page.pixels, &path)?;
            written += 1;
        }
        println!("\nSaved {written} pages to {}", dir.display());
    }

    if let Some(path) = &config.output.report_json {
        write_json_file(path, report)?;
        println!("JSON report written to {}", path.display());
    }
    Ok(())
}

fn usage() -> String {
    "Usage: split_pages <config.json>".to_string()
}
