use anyhow::{bail, Context};
use campaign_reconciler::*;
use std::io::{self, Write};

fn usage() -> &'static str {
    "usage: reconcile_files --spend <file.csv>... --revenue <file.csv>... [--options <options.json>]"
}

fn main() -> anyhow::Result<()> {
    let mut spend_paths = Vec::new();
    let mut revenue_paths = Vec::new();
    let mut options = ReconcileOptions::default();

    let mut args = std::env::args().skip(1);
    while let Some(flag) = args.next() {
        let value = args.next().with_context(|| format!("{flag} needs a value\n{}", usage()))?;
        match flag.as_str() {
            "--spend" => spend_paths.push(value),
            "--revenue" => revenue_paths.push(value),
            "--options" => {
                let text = std::fs::read_to_string(&value)
                    .with_context(|| format!("reading options from {value}"))?;
                options = serde_json::from_str(&text)?;
            }
            other => bail!("unknown flag {other}\n{}", usage()),
        }
    }

    if spend_paths.is_empty() {
        bail!("at least one --spend file is required\n{}", usage());
    }

    let spend = spend_paths
        .iter()
        .map(RawTable::from_csv_path)
        .collect::<Result<Vec<_>>>()?;
    let revenue = revenue_paths
        .iter()
        .map(RawTable::from_csv_path)
        .collect::<Result<Vec<_>>>()?;

    let report = Reconciler::new(options).reconcile_sources(spend, revenue)?;

    let stdout = io::stdout();
    report.table().write_csv(stdout.lock())?;

    let mut stderr = io::stderr().lock();
    writeln!(
        stderr,
        "{} rows, spend {:.2}, revenue {:.2}, profit/loss {:.2}",
        report.totals.record_count,
        report.totals.spend,
        report.totals.revenue,
        report.totals.profit_loss
    )?;
    if let Some(reason) = report.empty_reason {
        writeln!(stderr, "empty report: {reason:?}")?;
    }
    writeln!(
        stderr,
        "{} input rows excluded",
        report.diagnostics.excluded_count
    )?;
    for sample in &report.diagnostics.samples {
        writeln!(
            stderr,
            "  {} row {}: {} [{}]",
            sample.source, sample.row, sample.error, sample.raw
        )?;
    }

    Ok(())
}
