use book_splitter::analyzer::{analyze_image, ImageReport};
use book_splitter::config::analyze::load_config;
use book_splitter::diagnostics::EventLog;
use book_splitter::image::io::{load_rgba_image, write_json_file};
use std::env;
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

    let rgba = load_rgba_image(&config.input)?;
    let mut events = EventLog::new();
    let mut report = analyze_image(&rgba.as_view(), &config.analyzer, None, &mut events)
        .map_err(|e| e.to_string())?;

    print_text_summary(&report, config.output.max_listed.unwrap_or(20));

    if let Some(path) = &config.output.report_json {
        if !config.output.include_rows {
            report.rows.clear();
        }
        write_json_file(path, &report)?;
        println!("\nJSON report written to {}", path.display());
    }
    Ok(())
}

fn print_text_summary(report: &ImageReport, max_listed: usize) {
    let s = &report.stats;
    println!("Strip analysis");
    println!(
        "  input: {}x{} ({} rows sampled, every {} rows)",
        report.width, report.height, s.total_rows, report.row_stride
    );
    println!(
        "  brightness: min={:.2} max={:.2} avg={:.2} range={:.2}",
        s.min_brightness,
        s.max_brightness,
        s.avg_brightness,
        s.brightness_range()
    );
    println!(
        "  variance:   min={:.2} max={:.2} avg={:.2} range={:.2}",
        s.min_variance,
        s.max_variance,
        s.avg_variance,
        s.variance_range()
    );

    println!(
        "\nPossible separators: {} (showing {})",
        report.possible_separators.len(),
        max_listed.min(report.possible_separators.len())
    );
    for sep in report.possible_separators.iter().take(max_listed) {
        println!(
            "  y={:<6} {:?} brightness={:.1} (d={:.1}) variance={:.1} (d={:.1}) gray={:.2} white={:.2}",
            sep.y,
            sep.kind,
            sep.brightness,
            sep.brightness_delta,
            sep.variance,
            sep.variance_delta,
            sep.gray_ratio,
            sep.white_ratio
        );
    }

    if !report.diagnosis.is_empty() {
        println!("\nDiagnosis");
        for d in &report.diagnosis {
            println!("  {d:?}: {}", d.advice());
        }
    }
}

fn usage() -> String {
    "Usage: analyze_strip <config.json>".to_string()
}
