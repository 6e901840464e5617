//! Text and JSON output for the CLI.

use dashboard::detail::DetailView;
use dashboard::metrics::{ActionView, PanelSummary};
use dashboard::{Agreement, PanelSnapshot};
use serde::Serialize;

use super::OutputFormat;

const BAR_WIDTH: usize = 20;

#[derive(Serialize)]
pub struct PanelReport {
    title: &'static str,
    #[serde(flatten)]
    snapshot: PanelSnapshot,
    summary: PanelSummary,
    views: Vec<ActionView>,
}

impl PanelReport {
    pub fn new(title: &'static str, snapshot: PanelSnapshot) -> Self {
        Self {
            title,
            summary: snapshot.summary(),
            views: snapshot.views(),
            snapshot,
        }
    }
}

/// `#####.....` for a width in percent.
pub fn bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

/// Support/neutral/oppose in whole percent.
fn agreement(agreement: &Agreement) -> String {
    format!(
        "{:.0}/{:.0}/{:.0}",
        agreement.support * 100.0,
        agreement.neutral * 100.0,
        agreement.oppose * 100.0
    )
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_panels(reports: &[PanelReport], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(reports),
        OutputFormat::Table => {
            for (index, report) in reports.iter().enumerate() {
                if index > 0 {
                    println!();
                }
                print_panel(report);
            }
            Ok(())
        }
    }
}

fn print_panel(report: &PanelReport) {
    let snapshot = &report.snapshot;
    println!("{} [{}] {}", report.title, snapshot.id, snapshot.query);

    if let Some(message) = &snapshot.error_message {
        println!("  {message}");
        return;
    }
    if snapshot.actions.is_empty() {
        println!("  No actions.");
        return;
    }

    let summary = &report.summary;
    println!(
        "  average score {:+.3}  slider {:.1}%  leaning {}  (R {} / C {} / D {})",
        summary.average_score,
        summary.slider_position,
        summary.leaning.label(),
        summary.republican,
        summary.center,
        summary.democrat
    );
    println!(
        "  {:<2} {:>5} {:<width$} {:>11}  Description",
        "",
        "Cov",
        "Relative",
        "Agree S/N/O",
        width = BAR_WIDTH
    );
    for view in &report.views {
        println!(
            "  {:<2} {:>5} {} {:>11}  {}",
            view.class.label(),
            view.coverage_display,
            bar(view.coverage_percent),
            agreement(&view.agreement),
            view.description
        );
    }
}

pub fn print_detail(view: &DetailView, format: OutputFormat) -> anyhow::Result<()> {
    if let OutputFormat::Json = format {
        return print_json(view);
    }

    println!("{} ({})", view.description, view.date);
    println!("  correlated by {:?}", view.strategy);
    for row in std::iter::once(&view.overall).chain(view.publishers.iter()) {
        println!(
            "  {:<28} {:>6.2}% {} {:>11}",
            row.label,
            row.coverage_share * 100.0,
            bar(row.coverage_width),
            agreement(&row.agreement)
        );
    }
    Ok(())
}
