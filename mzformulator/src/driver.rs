use std::fs;
use std::io::{self, prelude::*};
use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use clap::Parser;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use thiserror::Error;

use tracing::{debug, info, warn};

use mzformula::{scan_levels, CoarsenessLevel, CountBounds, FormulaSearchError, SearchParameters};

use crate::args::{positive_float_f64, ArgIonMode, ArgMetal, ChargeList, OutputFormat};
use crate::peak_list::read_peak_list_path;
use crate::write::{write_reports, write_tables, QueryReport};

#[derive(Debug, Error)]
pub enum MZFormulatorError {
    #[error("An IO error occurred: {0}")]
    IOError(
        #[source]
        #[from]
        io::Error,
    ),
    #[error("Invalid search parameters: {0}")]
    SearchError(
        #[source]
        #[from]
        FormulaSearchError,
    ),
    #[error("Failed to load configuration: {0}")]
    ConfigurationError(
        #[source]
        #[from]
        Box<figment::Error>,
    ),
    #[error("Failed to write JSON: {0}")]
    JSONError(
        #[source]
        #[from]
        serde_json::Error,
    ),
    #[error("Failed to build the thread pool: {0}")]
    ThreadPoolError(
        #[source]
        #[from]
        rayon::ThreadPoolBuildError,
    ),
    #[error("Malformed peak list line {line}: {text:?}")]
    MalformedPeakListLine { line: usize, text: String },
    #[error("m/z must be a finite number greater than zero, got {0}")]
    InvalidMZ(f64),
    #[error("The ppm tolerance must be a finite number greater than zero, got {0}")]
    InvalidPPM(f64),
    #[error("The hit limit per charge state and adduct must be at least 1, got {0}")]
    InvalidMaxHits(u32),
    #[error("No m/z values to search, pass them as arguments or with --peak-list")]
    NoQueries,
}

impl From<figment::Error> for MZFormulatorError {
    fn from(value: figment::Error) -> Self {
        Self::ConfigurationError(Box::new(value))
    }
}

/// Match observed m/z values to metal-carboxylate complex formulas.
///
/// Each m/z is converted into neutral mass hypotheses for every charge state and
/// adduct of the ion mode, and candidate formulas within the ppm tolerance of
/// each hypothesis are reported, best first.
///
/// Options that are not given on the command line fall back to the
/// configuration file, then to their defaults.
#[derive(Parser, Debug, Default, Deserialize, Serialize)]
#[command(author, version, allow_negative_numbers = true)]
#[serde(default)]
pub struct MZFormulator {
    /// The observed m/z values to search
    #[arg(value_parser = positive_float_f64)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mz: Vec<f64>,

    /// The mass accuracy tolerance in parts-per-million [default: 10]
    #[arg(short = 'p', long = "ppm", value_parser = positive_float_f64)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ppm: Option<f64>,

    /// The ion mode the m/z values were observed in [default: negative]
    #[arg(short = 'm', long = "mode", ignore_case = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ArgIonMode>,

    /// How many secondary atoms a formula may carry, 1 (strict) to 3 (loose) [default: 2]
    #[arg(short = 'c', long = "coarseness", value_parser = parse_coarseness)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coarseness: Option<CoarsenessLevel>,

    /// The metal base of the complexes [default: y]
    #[arg(short = 'e', long = "metal", ignore_case = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metal: Option<ArgMetal>,

    /// Comma separated charge states to consider [default: -1 in negative mode, 1 in positive mode]
    #[arg(short = 'z', long = "charges", allow_hyphen_values = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charges: Option<ChargeList>,

    /// The most hits to keep for each charge state and adduct [default: 30]
    #[arg(short = 'n', long = "max-hits", value_parser = clap::value_parser!(u32).range(1..))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_hits: Option<u32>,

    /// Search every coarseness level, reporting each formula at the strictest level that finds it
    #[arg(long = "scan-all")]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub scan_all: bool,

    /// A text file of m/z values, one peak per line, to search in addition to any given directly
    #[arg(short = 'i', long = "peak-list")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_list: Option<PathBuf>,

    /// The format to write results in [default: text]
    #[arg(short = 'f', long = "format", ignore_case = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,

    /// The path to write the output to, or if '-' is passed, write to STDOUT
    #[arg(short = 'o', long = "output-file")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,

    /// The path to write a log file to, in addition to STDERR
    #[arg(short = 'l', long = "log-file")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    /// A TOML configuration file to read additional parameters from.
    ///
    /// Configurations are also read from `mzformulator.toml` in the working directory.
    /// Environment variables prefixed with `MZFORMULATOR_` will be read too.
    #[arg(long = "config-file")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,

    /// The number of threads to use for peak lists, passing a value < 1 to use all available threads
    #[arg(short = 't', long = "threads")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<i32>,

    /// The maximum hydrogen count, overriding the coarseness level
    #[arg(long = "h-max")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h_max: Option<u32>,

    /// The maximum carbon count, overriding the coarseness level
    #[arg(long = "c-max")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_max: Option<u32>,

    /// The maximum fluorine count, overriding the coarseness level
    #[arg(long = "f-max")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f_max: Option<u32>,

    /// The maximum nitrogen count, overriding the coarseness level
    #[arg(long = "n-max")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_max: Option<u32>,

    /// Show the supported metals, adducts, coarseness levels and masses, then exit
    #[arg(long = "show-tables")]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub show_tables: bool,
}

fn parse_coarseness(s: &str) -> Result<CoarsenessLevel, FormulaSearchError> {
    s.parse()
}

impl MZFormulator {
    fn create_threadpool(&self) -> Result<rayon::ThreadPool, MZFormulatorError> {
        let num_threads = match self.threads {
            Some(n) if n > 0 => n as usize,
            _ => thread::available_parallelism()?.into(),
        };
        debug!("Using {} cores", num_threads);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()?;
        Ok(pool)
    }

    pub fn format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }

    /// Build the search parameters these options describe
    pub fn search_parameters(&self) -> Result<SearchParameters, MZFormulatorError> {
        let ppm = self.ppm.unwrap_or(10.0);
        if !ppm.is_finite() || ppm <= 0.0 {
            return Err(MZFormulatorError::InvalidPPM(ppm));
        }
        let max_hits = self.max_hits.unwrap_or(30);
        if max_hits == 0 {
            return Err(MZFormulatorError::InvalidMaxHits(max_hits));
        }
        let bounds = CountBounds {
            hydrogen: self.h_max,
            carbon: self.c_max,
            fluorine: self.f_max,
            nitrogen: self.n_max,
            ..Default::default()
        };
        let mut params = SearchParameters::new(self.mode.unwrap_or_default().into())
            .with_ppm(ppm)
            .with_metal(self.metal.unwrap_or_default().into())
            .with_coarseness(self.coarseness.unwrap_or_default())
            .with_bounds(bounds)
            .with_max_hits_per_combination(max_hits as usize);
        if let Some(charges) = self.charges.as_ref() {
            params = params.with_charges(charges.0.clone());
        }
        Ok(params)
    }

    /// Collect the m/z values to search, those given directly first and then
    /// those from the peak list, in the order they were given
    pub fn queries(&self) -> Result<Vec<f64>, MZFormulatorError> {
        let mut queries = Vec::with_capacity(self.mz.len());
        for mz in self.mz.iter().copied() {
            if !mz.is_finite() || mz <= 0.0 {
                return Err(MZFormulatorError::InvalidMZ(mz));
            }
            queries.push(mz);
        }
        if let Some(path) = self.peak_list.as_ref() {
            let peaks = read_peak_list_path(path)?;
            info!("Read {} peaks from {}", peaks.len(), path.display());
            queries.extend(peaks);
        }
        Ok(queries)
    }

    fn search_all(
        &self,
        queries: &[f64],
        params: &SearchParameters,
    ) -> Result<Vec<QueryReport>, MZFormulatorError> {
        let run_query = |mz: f64| {
            if self.scan_all {
                QueryReport::Scan {
                    mz,
                    levels: scan_levels(mz, params),
                }
            } else {
                QueryReport::Search {
                    mz,
                    results: params.search(mz),
                }
            }
        };
        if queries.len() == 1 {
            return Ok(vec![run_query(queries[0])]);
        }
        let pool = self.create_threadpool()?;
        let reports: Vec<QueryReport> =
            pool.install(|| queries.par_iter().map(|mz| run_query(*mz)).collect());
        Ok(reports)
    }

    fn open_output(&self) -> Result<Box<dyn Write>, MZFormulatorError> {
        match self.output_file.as_ref() {
            Some(path) if path != &PathBuf::from("-") => {
                info!("Output: {}", path.display());
                Ok(Box::new(io::BufWriter::new(fs::File::create(path)?)))
            }
            _ => Ok(Box::new(io::BufWriter::new(io::stdout()))),
        }
    }

    pub fn main(&self) -> Result<(), MZFormulatorError> {
        info!(
            "mzformulator v{}",
            option_env!("CARGO_PKG_VERSION").unwrap_or("unknown")
        );
        if self.show_tables {
            let mut writer = self.open_output()?;
            return write_tables(&mut writer, self.format());
        }

        let params = self.search_parameters()?;
        let queries = self.queries()?;
        if queries.is_empty() {
            return Err(MZFormulatorError::NoQueries);
        }
        info!(
            "Searching {} m/z values in {} mode with {} at {} ppm, coarseness {}{}",
            queries.len(),
            params.mode,
            params.metal.name(),
            params.ppm,
            params.coarseness,
            if self.scan_all { " (scanning all levels)" } else { "" }
        );

        let start = Instant::now();
        let reports = self.search_all(&queries, &params)?;
        let elapsed = Instant::now() - start;

        let n_hits: usize = reports.iter().map(|r| r.total_hits()).sum();
        let n_empty = reports.iter().filter(|r| r.total_hits() == 0).count();
        info!("Found {n_hits} hits for {} m/z values", reports.len());
        if n_empty > 0 {
            warn!("{n_empty} m/z values had no matching formula");
        }
        info!("Elapsed Time: {:0.3?}", elapsed);

        let mut writer = self.open_output()?;
        write_reports(&mut writer, &reports, &params, self.format())?;
        Ok(())
    }
}
