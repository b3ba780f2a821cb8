//! Offline data jobs that tie ingestion, labelling and storage together.

use tracing::info;

use crate::config::CorpusConfig;
use crate::error::CorpusError;
use crate::io;
use crate::label::{LabelGenerator, impute_city_means};

/// Labels the weather table and writes the corpus.
///
/// Returns the number of corpus rows written.
///
/// # Errors
///
/// Returns `CorpusError::Empty` when no row survives imputation, or an I/O
/// or CSV error for either file.
pub fn generate_corpus(config: &CorpusConfig) -> Result<usize, CorpusError> {
    let records = io::read_weather(&config.weather_path)?;
    info!(rows = records.len(), path = %config.weather_path.display(), "weather table loaded");

    let weather = impute_city_means(records);
    if weather.is_empty() {
        return Err(CorpusError::Empty);
    }

    let corpus = LabelGenerator::new(config.seed).build_corpus(&weather, &config.capacities_w);
    io::write_corpus(&corpus, &config.corpus_path)?;
    info!(rows = corpus.len(), path = %config.corpus_path.display(), "corpus written");
    Ok(corpus.len())
}

/// Downloads history for every catalog city and writes the weather table.
///
/// Returns the number of weather rows written.
///
/// # Errors
///
/// Returns a `FetchError` if nothing could be fetched or the table cannot
/// be written.
#[cfg(feature = "fetch")]
pub async fn fetch_weather(
    fetch: &crate::config::FetchConfig,
    corpus: &CorpusConfig,
    today: chrono::NaiveDate,
) -> Result<usize, crate::weather::client::FetchError> {
    use crate::weather::client::{WeatherClient, history_window};

    let (start, end) = history_window(today, fetch.history_days, fetch.end_offset_days);
    info!(%start, %end, cities = crate::cities::CATALOG.len(), "fetching weather history");

    let client = WeatherClient::new(fetch.clone())?;
    let records = client
        .fetch_history(&crate::cities::CATALOG, start, end)
        .await?;
    io::write_weather(&records, &corpus.weather_path)?;
    info!(rows = records.len(), path = %corpus.weather_path.display(), "weather table written");
    Ok(records.len())
}
