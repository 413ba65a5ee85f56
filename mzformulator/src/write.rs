use std::io::prelude::*;

use itertools::Itertools;
use serde::Serialize;
use serde_json::{json, Map, Value};

use mzformula::{
    masses::MASS_TABLE, CoarsenessLevel, IonMode, LevelScan, Metal, SearchParameters,
    SearchResult,
};

use crate::args::OutputFormat;
use crate::driver::MZFormulatorError;

const NO_MATCHES: &str = "No matches found.";
const NO_NEW_HITS: &str = "(no new hits)";

/// The outcome of one queried m/z
#[derive(Debug, Clone)]
pub enum QueryReport {
    Search {
        mz: f64,
        results: Vec<SearchResult>,
    },
    Scan {
        mz: f64,
        levels: Vec<LevelScan>,
    },
}

impl QueryReport {
    pub fn mz(&self) -> f64 {
        match self {
            QueryReport::Search { mz, .. } => *mz,
            QueryReport::Scan { mz, .. } => *mz,
        }
    }

    /// The number of distinct results reported for this query
    pub fn total_hits(&self) -> usize {
        match self {
            QueryReport::Search { results, .. } => results.len(),
            QueryReport::Scan { levels, .. } => levels.iter().map(|l| l.new_results.len()).sum(),
        }
    }
}

/// The search settings a report was produced with, echoed in JSON output
#[derive(Debug, Clone, Serialize)]
struct QueryDescription {
    mz: f64,
    ppm: f64,
    mode: IonMode,
    coarseness: Option<CoarsenessLevel>,
    metal: Metal,
    charges: Vec<i32>,
    max_hits_per_combination: usize,
}

impl QueryDescription {
    fn new(report: &QueryReport, params: &SearchParameters) -> Self {
        let coarseness = match report {
            QueryReport::Search { .. } => Some(params.coarseness),
            QueryReport::Scan { .. } => None,
        };
        Self {
            mz: report.mz(),
            ppm: params.ppm,
            mode: params.mode,
            coarseness,
            metal: params.metal,
            charges: params.charges(),
            max_hits_per_combination: params.max_hits_per_combination,
        }
    }
}

fn text_header() -> String {
    format!(
        "{:<32} {:>11} {:>3} {:<10} {:>12} {:>10}",
        "Formula", "m/z", "z", "Adduct", "Neutral", "Error(ppm)"
    )
}

fn text_row(result: &SearchResult) -> String {
    format!(
        "{:<32} {:>11.4} {:>+3} {:<10} {:>12.5} {:>+10.3}",
        result.formula(),
        result.mz,
        result.charge,
        result.adduct,
        result.neutral_mass,
        result.ppm_error()
    )
}

fn write_text_results<W: Write>(writer: &mut W, results: &[SearchResult]) -> std::io::Result<()> {
    if results.is_empty() {
        writeln!(writer, "{NO_MATCHES}")?;
        return Ok(());
    }
    let header = text_header();
    writeln!(writer, "{header}")?;
    writeln!(writer, "{}", "-".repeat(header.chars().count()))?;
    for result in results {
        writeln!(writer, "{}", text_row(result))?;
    }
    Ok(())
}

fn write_markdown_results<W: Write>(
    writer: &mut W,
    results: &[SearchResult],
) -> std::io::Result<()> {
    if results.is_empty() {
        writeln!(writer, "{NO_MATCHES}")?;
        return Ok(());
    }
    writeln!(
        writer,
        "| Formula | m/z | z | Adduct | Neutral mass | Error (ppm) |"
    )?;
    writeln!(writer, "|---|---:|---:|---|---:|---:|")?;
    for r in results {
        writeln!(
            writer,
            "| {} | {:.4} | {} | {} | {:.5} | {:.3} |",
            r.formula(),
            r.mz,
            r.charge,
            r.adduct,
            r.neutral_mass,
            r.ppm_error()
        )?;
    }
    Ok(())
}

fn describe(params: &SearchParameters) -> String {
    format!(
        "{} mode, {}, {} ppm, charges {}",
        params.mode,
        params.metal.name(),
        params.ppm,
        params.charges().iter().join(",")
    )
}

fn write_report_text<W: Write>(
    writer: &mut W,
    report: &QueryReport,
    params: &SearchParameters,
    markdown: bool,
) -> std::io::Result<()> {
    let write_results = if markdown {
        write_markdown_results::<W>
    } else {
        write_text_results::<W>
    };
    let heading = if markdown { "## " } else { "" };
    match report {
        QueryReport::Search { mz, results } => {
            writeln!(
                writer,
                "{heading}m/z {mz:.4} ({}, coarseness {})",
                describe(params),
                params.coarseness
            )?;
            if !markdown {
                writeln!(writer)?;
            }
            write_results(writer, results)?;
        }
        QueryReport::Scan { mz, levels } => {
            writeln!(writer, "{heading}m/z {mz:.4} ({})", describe(params))?;
            for level in levels {
                writeln!(writer)?;
                writeln!(
                    writer,
                    "{}Level {} ({}): {} new of {} results",
                    if markdown { "### " } else { "" },
                    level.level.level(),
                    level.level,
                    level.new_results.len(),
                    level.total
                )?;
                if !markdown {
                    writeln!(writer, "{}", level.params)?;
                }
                writeln!(writer)?;
                if level.new_results.is_empty() {
                    writeln!(writer, "{NO_NEW_HITS}")?;
                    continue;
                }
                write_results(writer, &level.new_results)?;
            }
        }
    }
    Ok(())
}

fn report_json(
    report: &QueryReport,
    params: &SearchParameters,
) -> Result<Value, MZFormulatorError> {
    let query = serde_json::to_value(QueryDescription::new(report, params))?;
    let value = match report {
        QueryReport::Search { results, .. } => json!({
            "query": query,
            "total_hits": results.len(),
            "results": results,
        }),
        QueryReport::Scan { levels, .. } => {
            let mut by_level = Map::new();
            for level in levels {
                by_level.insert(
                    level.level.level().to_string(),
                    json!({
                        "name": level.level.name(),
                        "params": level.params,
                        "total": level.total,
                        "new_results": level.new_results,
                    }),
                );
            }
            json!({
                "query": query,
                "total_hits": report.total_hits(),
                "levels": by_level,
            })
        }
    };
    Ok(value)
}

/// Render every report in `format`. A single JSON report is written as an
/// object, several as an array in query order.
pub fn write_reports<W: Write>(
    writer: &mut W,
    reports: &[QueryReport],
    params: &SearchParameters,
    format: OutputFormat,
) -> Result<(), MZFormulatorError> {
    match format {
        OutputFormat::Json => {
            let mut values = reports
                .iter()
                .map(|r| report_json(r, params))
                .collect::<Result<Vec<_>, _>>()?;
            let doc = if values.len() == 1 {
                values.remove(0)
            } else {
                Value::Array(values)
            };
            serde_json::to_writer_pretty(&mut *writer, &doc)?;
            writeln!(writer)?;
        }
        OutputFormat::Text | OutputFormat::Markdown => {
            for (i, report) in reports.iter().enumerate() {
                if i > 0 {
                    writeln!(writer)?;
                }
                write_report_text(writer, report, params, format == OutputFormat::Markdown)?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

/// Describe the supported metals, adducts, coarseness levels and masses
pub fn write_tables<W: Write>(writer: &mut W, format: OutputFormat) -> Result<(), MZFormulatorError> {
    let modes = [IonMode::Negative, IonMode::Positive];
    match format {
        OutputFormat::Json => {
            let adducts: Map<String, Value> = modes
                .iter()
                .map(|mode| {
                    let table: Vec<Value> = mode
                        .default_adducts()
                        .iter()
                        .map(|a| json!({"label": a.label, "mass": a.mass}))
                        .collect();
                    (mode.name().to_string(), Value::Array(table))
                })
                .collect();
            let levels: Map<String, Value> = CoarsenessLevel::ALL
                .iter()
                .map(|level| {
                    (
                        level.level().to_string(),
                        json!({"name": level.name(), "params": level.params()}),
                    )
                })
                .collect();
            let masses: Map<String, Value> = MASS_TABLE
                .iter()
                .map(|(symbol, mass)| (symbol.to_string(), json!(mass)))
                .collect();
            let metals: Vec<Value> = Metal::ALL
                .iter()
                .map(|m| json!({"symbol": m.symbol(), "name": m.name(), "mass": m.mass()}))
                .collect();
            let doc = json!({
                "metals": metals,
                "adducts": adducts,
                "coarseness_levels": levels,
                "masses": masses,
            });
            serde_json::to_writer_pretty(&mut *writer, &doc)?;
            writeln!(writer)?;
        }
        OutputFormat::Text | OutputFormat::Markdown => {
            let markdown = format == OutputFormat::Markdown;
            let heading = if markdown { "## " } else { "" };
            writeln!(writer, "{heading}Metals")?;
            for metal in Metal::ALL {
                writeln!(
                    writer,
                    "{}{:<3} {:<10} {:.5}",
                    if markdown { "- " } else { "  " },
                    metal.symbol(),
                    metal.name(),
                    metal.mass()
                )?;
            }
            for mode in modes {
                writeln!(writer)?;
                writeln!(writer, "{heading}Adducts ({mode})")?;
                for adduct in mode.default_adducts().iter() {
                    writeln!(
                        writer,
                        "{}{:<10} {:.6}",
                        if markdown { "- " } else { "  " },
                        adduct.label,
                        adduct.mass
                    )?;
                }
            }
            writeln!(writer)?;
            writeln!(writer, "{heading}Coarseness levels")?;
            for level in CoarsenessLevel::ALL {
                writeln!(
                    writer,
                    "{}{} {:<9} {}",
                    if markdown { "- " } else { "  " },
                    level.level(),
                    level.name(),
                    level.params()
                )?;
            }
            writeln!(writer)?;
            writeln!(writer, "{heading}Masses")?;
            for (symbol, mass) in MASS_TABLE {
                writeln!(
                    writer,
                    "{}{:<7} {:.8}",
                    if markdown { "- " } else { "  " },
                    symbol,
                    mass
                )?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}
