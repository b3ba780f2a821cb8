//! Command-line parsing.

use std::env;
use std::path::PathBuf;

use crate::features::WeatherObservation;

/// Default system size offered by the dashboard (kW).
pub const DEFAULT_CAPACITY_KW: f64 = 5.0;

/// Conditions used when a manual prediction leaves a field out.
pub const DEFAULT_WEATHER: WeatherObservation = WeatherObservation {
    ambient_temp: 28.0,
    irradiation: 0.75,
    humidity: 60,
    cloud_cover: 40,
    wind_speed: 10,
};

#[derive(Debug, Clone, PartialEq)]
pub struct CliOptions {
    /// TOML config; built-in defaults when absent.
    pub config: Option<PathBuf>,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Download hourly history for every catalog city.
    Fetch,
    /// Impute the weather table and write the labelled corpus.
    Generate,
    /// Fit the forest and write model artifacts.
    Train,
    /// Print a forecast for one set of conditions.
    Predict(PredictArgs),
    /// Run the HTTP API.
    Serve { port: Option<u16> },
    /// List catalog cities and whether the model knows them.
    Cities,
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredictArgs {
    /// Every weather field from the command line or its default.
    Manual {
        city: String,
        weather: WeatherObservation,
        capacity_kw: f64,
    },
    /// Nearest catalog city and its live weather.
    Locate { lat: f64, lon: f64, capacity_kw: f64 },
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

/// Parses `[--config <path>] <command> [options]`.
pub fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut config = None;

    while let Some(arg) = args.get(i) {
        match arg.as_str() {
            "--config" => {
                i += 1;
                let path = args
                    .next_or_err(i, "missing value for --config (expected a TOML file path)")?;
                if config.replace(PathBuf::from(path)).is_some() {
                    return Err("--config provided more than once".to_string());
                }
                i += 1;
            }
            "--help" | "-h" => {
                return Ok(CliOptions {
                    config,
                    command: Command::Help,
                });
            }
            _ => break,
        }
    }

    let Some(name) = args.get(i) else {
        return Err("missing command".to_string());
    };
    let rest = &args[i + 1..];
    let command = match name.as_str() {
        "fetch" => no_options("fetch", rest, Command::Fetch)?,
        "generate" => no_options("generate", rest, Command::Generate)?,
        "train" => no_options("train", rest, Command::Train)?,
        "cities" => no_options("cities", rest, Command::Cities)?,
        "serve" => parse_serve(rest)?,
        "predict" => Command::Predict(parse_predict(rest)?),
        "help" => Command::Help,
        other => return Err(format!("unknown command: {other}")),
    };

    Ok(CliOptions { config, command })
}

fn no_options(name: &str, rest: &[String], command: Command) -> Result<Command, String> {
    match rest.first() {
        None => Ok(command),
        Some(arg) => Err(format!("`{name}` takes no arguments, got {arg}")),
    }
}

fn parse_serve(args: &[String]) -> Result<Command, String> {
    let mut port = None;
    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                i += 1;
                let v = args.next_or_err(i, "missing value for --port (expected a u16)")?;
                let p = v
                    .parse::<u16>()
                    .map_err(|_| format!("--port value \"{v}\" is not a valid u16"))?;
                port = Some(p);
            }
            other => return Err(format!("unknown argument for `serve`: {other}")),
        }
        i += 1;
    }
    Ok(Command::Serve { port })
}

fn parse_predict(args: &[String]) -> Result<PredictArgs, String> {
    let mut city = None;
    let mut lat = None;
    let mut lon = None;
    let mut capacity_kw = DEFAULT_CAPACITY_KW;
    let mut weather = DEFAULT_WEATHER;

    let mut i = 0usize;
    while i < args.len() {
        let flag = args[i].as_str();
        i += 1;
        match flag {
            "--city" => city = Some(args.next_or_err(i, "missing value for --city")?.to_string()),
            "--lat" => lat = Some(parse_value::<f64>(args, i, flag)?),
            "--lon" => lon = Some(parse_value::<f64>(args, i, flag)?),
            "--capacity" => capacity_kw = parse_value(args, i, flag)?,
            "--temp" => weather.ambient_temp = parse_value(args, i, flag)?,
            "--irradiation" => weather.irradiation = parse_value(args, i, flag)?,
            "--humidity" => weather.humidity = parse_value(args, i, flag)?,
            "--cloud" => weather.cloud_cover = parse_value(args, i, flag)?,
            "--wind" => weather.wind_speed = parse_value(args, i, flag)?,
            other => return Err(format!("unknown argument for `predict`: {other}")),
        }
        i += 1;
    }

    match (city, lat, lon) {
        (Some(city), None, None) => Ok(PredictArgs::Manual {
            city,
            weather,
            capacity_kw,
        }),
        (None, Some(lat), Some(lon)) => Ok(PredictArgs::Locate {
            lat,
            lon,
            capacity_kw,
        }),
        (Some(_), _, _) => Err("--city and --lat/--lon are mutually exclusive".to_string()),
        (None, Some(_), None) | (None, None, Some(_)) => {
            Err("--lat and --lon must be given together".to_string())
        }
        (None, None, None) => Err("predict needs --city or --lat/--lon".to_string()),
    }
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> Result<T, String> {
    let v = args.next_or_err(i, &format!("missing value for {flag}"))?;
    v.parse::<T>()
        .map_err(|_| format!("{flag} value \"{v}\" is not valid"))
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("sunsight: solar PV output prediction for Indian cities");
    eprintln!();
    eprintln!("Usage: sunsight [--config <path>] <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  fetch                    Download hourly weather history (needs `fetch` feature)");
    eprintln!("  generate                 Build the labelled training corpus");
    eprintln!("  train                    Fit the model and write artifacts");
    eprintln!("  predict [options]        Forecast output for one set of conditions");
    eprintln!("  serve [--port <u16>]     Start the REST API (needs `api` feature)");
    eprintln!("  cities                   List supported cities");
    eprintln!();
    eprintln!("Predict options:");
    eprintln!("  --city <name>            Trained city (manual mode)");
    eprintln!("  --lat <f64> --lon <f64>  Locate nearest city, use live weather");
    eprintln!("  --capacity <kW>          System size (default: 5.0)");
    eprintln!("  --temp <°C>              Ambient temperature (default: 28.0)");
    eprintln!("  --irradiation <kW/m²>    Irradiation (default: 0.75)");
    eprintln!("  --humidity <%>           Relative humidity (default: 60)");
    eprintln!("  --cloud <%>              Cloud cover (default: 40)");
    eprintln!("  --wind <km/h>            Wind speed (default: 10)");
}
