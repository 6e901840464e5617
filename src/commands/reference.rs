use std::sync::Arc;

use clap::Args;
use dashboard::reference::{ReferenceData, format_date};
use dashboard::{DashboardApi, model::format_param_date};
use serde::Serialize;

use super::OutputFormat;
use super::render::print_json;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

pub async fn publishers(api: Arc<DashboardApi>, args: ListArgs) -> anyhow::Result<()> {
    let reference = ReferenceData::new(api);
    let publishers = reference.publishers().await?;

    match args.format {
        OutputFormat::Json => print_json(publishers),
        OutputFormat::Table => {
            for publisher in publishers {
                println!(
                    "{:<16} {:<10} {}",
                    publisher.id,
                    publisher.leaning.as_str(),
                    publisher.name
                );
            }
            eprintln!("{} publisher(s).", publishers.len());
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct DateRow {
    date: String,
    label: String,
}

pub async fn dates(api: Arc<DashboardApi>, args: ListArgs) -> anyhow::Result<()> {
    let reference = ReferenceData::new(api);
    let rows: Vec<DateRow> = reference
        .dates()
        .await?
        .into_iter()
        .map(|date| DateRow {
            date: format_param_date(date),
            label: format_date(date),
        })
        .collect();

    match args.format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            for row in &rows {
                println!("{}  {}", row.date, row.label);
            }
            Ok(())
        }
    }
}
