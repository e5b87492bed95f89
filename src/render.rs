use crate::model::{Site, Wlan};
use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;
use std::io::Write;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
}

pub fn render_sites<W: Write>(out: &mut W, sites: &[Site], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(out, sites),
        OutputFormat::Pretty => {
            let rows = sites
                .iter()
                .map(|s| vec![s.name.clone(), s.id.clone()])
                .collect();
            print_table(out, &["name", "id"], rows)
        }
    }
}

pub fn render_wlans<W: Write>(out: &mut W, wlans: &[Wlan], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(out, wlans),
        OutputFormat::Pretty => {
            let rows = wlans
                .iter()
                .map(|w| {
                    vec![
                        w.ssid.clone(),
                        w.vlan_label(),
                        w.extra.get("enabled").map(value_to_str).unwrap_or_default(),
                        w.id.clone().unwrap_or_default(),
                    ]
                })
                .collect();
            print_table(out, &["ssid", "vlan_id", "enabled", "id"], rows)
        }
    }
}

/// String form of `value[key]`, empty when missing.
pub fn field_str(value: &Value, key: &str) -> String {
    value.get(key).map(value_to_str).unwrap_or_default()
}

fn print_json<W: Write, T: Serialize + ?Sized>(out: &mut W, items: &T) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(items)?)?;
    Ok(())
}

fn print_table<W: Write>(out: &mut W, columns: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
    if rows.is_empty() {
        writeln!(out, "No resources found.")?;
        return Ok(());
    }

    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let header: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
    write_row(out, &header, &widths)?;
    // Separator
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_row(out, &separator, &widths)?;
    for row in &rows {
        write_row(out, row, &widths)?;
    }
    Ok(())
}

fn write_row<W: Write>(out: &mut W, cells: &[String], widths: &[usize]) -> Result<()> {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(out, "{}", line.trim_end())?;
    Ok(())
}

fn value_to_str(value: &Value) -> String {
    match value {
        Value::Null => "".into(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}
