use std::path::Path;

use console::Style;
use diffim_core::config::SubtractionConfig;
use diffim_core::stats::DifferenceStats;
use diffim_core::BoundingBox;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_subtract_summary(
    config: &SubtractionConfig,
    template: &Path,
    science: &Path,
    output: &Path,
) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Image Subtraction"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(17)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Template"),
        s.path.apply_to(template.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Science"),
        s.path.apply_to(science.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(output.display())
    );
    println!();

    println!("  {}", s.header.apply_to("Matching"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Kernel"),
        s.method.apply_to(&config.kernel)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Convolve"),
        s.method.apply_to(config.target)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Sign"),
        s.value.apply_to(if config.invert {
            "science - model"
        } else {
            "model - science"
        })
    );
    println!();

    println!("  {}", s.header.apply_to("Background"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Model"),
        s.method.apply_to(&config.background)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Variance"),
        s.method.apply_to(config.variance)
    );
    println!();

    if config.bad_mask_planes.is_empty() {
        println!(
            "  {:<14}{}",
            s.header.apply_to("Bad planes"),
            s.disabled.apply_to("none")
        );
    } else {
        println!(
            "  {:<14}{}",
            s.header.apply_to("Bad planes"),
            s.value.apply_to(config.bad_mask_planes.join(", "))
        );
    }
    println!();
}

pub fn print_difference_stats(stats: &DifferenceStats, bbox: BoundingBox) {
    let s = Styles::new();

    println!();
    println!("  {}", s.header.apply_to("Residuals"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Bounds"),
        s.value.apply_to(bbox)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Pixels"),
        s.value.apply_to(format!(
            "{} used, {} rejected",
            stats.n_used, stats.n_rejected
        ))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Mean"),
        s.value.apply_to(format!("{:.6}", stats.mean))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("RMS"),
        s.value.apply_to(format!("{:.6}", stats.rms))
    );
    if stats.std_normalized > 0.0 {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Norm. std"),
            s.value.apply_to(format!("{:.3}", stats.std_normalized))
        );
    } else {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Norm. std"),
            s.disabled.apply_to("no variance")
        );
    }
}
