//! sunsight entry point: CLI wiring and config-driven job dispatch.

use std::error::Error;
use std::process;

use tracing_subscriber::EnvFilter;

use sunsight::cities::{self, CATALOG};
use sunsight::cli::{self, Command, PredictArgs};
use sunsight::config::AppConfig;
use sunsight::features::{SystemConfig, WeatherObservation};
use sunsight::metrics;
use sunsight::pipeline;
use sunsight::predictor::LoadedModel;
use sunsight::training;

type BoxError = Box<dyn Error + Send + Sync>;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads `--config` if given, otherwise the defaults, and validates it.
fn load_config(path: Option<&std::path::Path>) -> AppConfig {
    let config = match path {
        Some(p) => match AppConfig::from_toml_file(p) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        },
        None => AppConfig::default(),
    };

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    config
}

fn load_model(config: &AppConfig) -> Result<LoadedModel, BoxError> {
    Ok(LoadedModel::load(&config.model.model_path, &config.model.metadata_path)?)
}

fn fetch(config: &AppConfig) -> Result<(), BoxError> {
    #[cfg(feature = "fetch")]
    {
        let today = chrono::Local::now().date_naive();
        let job = pipeline::fetch_weather(&config.fetch, &config.corpus, today);
        let rows = tokio::runtime::Runtime::new()?.block_on(job)?;
        println!("Fetched {rows} weather rows into {}", config.corpus.weather_path.display());
        Ok(())
    }
    #[cfg(not(feature = "fetch"))]
    {
        let _ = config;
        Err("`fetch` requires building with `--features fetch`".into())
    }
}

fn predict(config: &AppConfig, args: PredictArgs) -> Result<(), BoxError> {
    let (city, weather, capacity_kw) = match args {
        PredictArgs::Manual {
            city,
            weather,
            capacity_kw,
        } => {
            let errors = weather.validate();
            if let Some(first) = errors.into_iter().next() {
                return Err(first.into());
            }
            if let Some(known) = cities::find(&city) {
                println!("City: {} ({}), panel tilt {}°", known.name, known.state, known.tilt);
            }
            (city, weather, capacity_kw)
        }
        PredictArgs::Locate {
            lat,
            lon,
            capacity_kw,
        } => {
            let nearest = cities::nearest(lat, lon);
            let weather = live_weather(config, lat, lon)?;
            println!(
                "Nearest city: {} ({}), live weather at {lat:.2}, {lon:.2}",
                nearest.name, nearest.state
            );
            (nearest.name.to_string(), weather, capacity_kw)
        }
    };

    let system = SystemConfig::new(city, capacity_kw)?;
    let model = load_model(config)?;
    let result = metrics::predict_summary(&model, &weather, &system, config.features.unknown_city)?;
    println!("{result}");
    Ok(())
}

fn live_weather(config: &AppConfig, lat: f64, lon: f64) -> Result<WeatherObservation, BoxError> {
    #[cfg(feature = "fetch")]
    {
        use sunsight::weather::client::WeatherClient;
        let client = WeatherClient::new(config.fetch.clone())?;
        let current = tokio::runtime::Runtime::new()?.block_on(client.fetch_current(lat, lon))?;
        Ok(current.to_observation())
    }
    #[cfg(not(feature = "fetch"))]
    {
        let _ = (config, lat, lon);
        Err("location lookup requires building with `--features fetch`".into())
    }
}

fn serve(config: &AppConfig, port: Option<u16>) -> Result<(), BoxError> {
    #[cfg(feature = "api")]
    {
        use std::net::{IpAddr, SocketAddr};
        use std::sync::Arc;

        let ip: IpAddr = config.server.host.parse()?;
        let addr = SocketAddr::new(ip, port.unwrap_or(config.server.port));
        let state = Arc::new(sunsight::api::AppState {
            model: load_model(config)?,
            policy: config.features.unknown_city,
        });
        let server = sunsight::api::serve(state, addr, &config.server.cors_origins);
        tokio::runtime::Runtime::new()?.block_on(server)?;
        Ok(())
    }
    #[cfg(not(feature = "api"))]
    {
        let _ = (config, port);
        Err("`serve` requires building with `--features api`".into())
    }
}

fn list_cities(config: &AppConfig) {
    let model = LoadedModel::load(&config.model.model_path, &config.model.metadata_path).ok();
    for c in &CATALOG {
        let trained = match &model {
            Some(m) if m.schema().cities().contains(c.name) => "trained",
            Some(_) => "untrained",
            None => "",
        };
        println!(
            "{:<14} {:<18} {:>6.2} {:>6.2}  tilt {:>2}°  {trained}",
            c.name, c.state, c.lat, c.lon, c.tilt
        );
    }
}

fn run(command: Command, config: &AppConfig) -> Result<(), BoxError> {
    match command {
        Command::Fetch => fetch(config),
        Command::Generate => {
            let rows = pipeline::generate_corpus(&config.corpus)?;
            println!("Wrote {rows} corpus rows to {}", config.corpus.corpus_path.display());
            Ok(())
        }
        Command::Train => {
            let report =
                training::run(&config.corpus.corpus_path, &config.model, &config.training)?;
            println!("{report}");
            Ok(())
        }
        Command::Predict(args) => predict(config, args),
        Command::Serve { port } => serve(config, port),
        Command::Cities => {
            list_cities(config);
            Ok(())
        }
        Command::Help => {
            cli::print_usage();
            Ok(())
        }
    }
}

fn main() {
    let opts = match cli::parse_args() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(1);
        }
    };
    if opts.command == Command::Help {
        cli::print_usage();
        return;
    }

    init_tracing();
    let config = load_config(opts.config.as_deref());

    if let Err(e) = run(opts.command, &config) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
