use std::time::Duration;

use console::Style;
use spe2fits_core::convert::{BatchReport, ConversionReport};

struct Styles {
    title: Style,
    label: Style,
    value: Style,
    ok: Style,
    warning: Style,
    error: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            ok: Style::new().green(),
            warning: Style::new().yellow(),
            error: Style::new().red().bold(),
            path: Style::new().underlined(),
        }
    }
}

/// One line per output, plus any metadata warnings.
pub fn print_conversion(report: &ConversionReport) {
    let s = Styles::new();

    println!(
        "  {} {} {}",
        s.ok.apply_to("\u{2713}"),
        s.path.apply_to(report.input.display()),
        s.label.apply_to(format!("({}, {} frame(s))", report.version, report.frames))
    );
    for output in &report.outputs {
        println!("      {} {}", s.label.apply_to("\u{2192}"), output.display());
    }
    for warning in &report.warnings {
        println!("      {} {}", s.warning.apply_to("warning:"), warning);
    }
}

pub fn print_batch_summary(report: &BatchReport, elapsed: Duration) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("SPE \u{2192} FITS"));
    println!(
        "  {}",
        s.title.apply_to("\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}")
    );
    println!();

    for converted in &report.converted {
        print_conversion(converted);
    }
    for (input, err) in &report.failed {
        println!(
            "  {} {} {}",
            s.error.apply_to("\u{2717}"),
            s.path.apply_to(input.display()),
            s.error.apply_to(err)
        );
    }

    println!();
    println!(
        "  {:<12}{}",
        s.label.apply_to("Converted"),
        s.value.apply_to(report.converted.len())
    );
    if !report.failed.is_empty() {
        println!(
            "  {:<12}{}",
            s.label.apply_to("Failed"),
            s.error.apply_to(report.failed.len())
        );
    }
    println!(
        "  {:<12}{}",
        s.label.apply_to("Elapsed"),
        s.value.apply_to(format!("{:.2}s", elapsed.as_secs_f64()))
    );
    println!();
}
