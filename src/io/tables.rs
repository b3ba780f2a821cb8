//! Header-first CSV tables backed by the `csv` crate.
//!
//! Column names come from the serde renames on [`WeatherRecord`] and
//! [`TrainingRow`]; missing weather values are written as empty cells.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CorpusError;
use crate::label::TrainingRow;
use crate::weather::WeatherRecord;

/// Writes raw weather rows to `path`.
///
/// # Errors
///
/// Returns a `CorpusError` if the file cannot be created or written.
pub fn write_weather(records: &[WeatherRecord], path: &Path) -> Result<(), CorpusError> {
    write_rows(records, io::BufWriter::new(File::create(path)?))
}

/// Reads raw weather rows from `path`.
///
/// # Errors
///
/// Returns a `CorpusError` if the file is missing or a row does not parse.
pub fn read_weather(path: &Path) -> Result<Vec<WeatherRecord>, CorpusError> {
    read_rows(File::open(path)?)
}

/// Writes the labelled corpus to `path`.
///
/// # Errors
///
/// Returns a `CorpusError` if the file cannot be created or written.
pub fn write_corpus(rows: &[TrainingRow], path: &Path) -> Result<(), CorpusError> {
    write_rows(rows, io::BufWriter::new(File::create(path)?))
}

/// Reads the labelled corpus from `path`.
///
/// # Errors
///
/// Returns a `CorpusError` if the file is missing or a row does not parse.
pub fn read_corpus(path: &Path) -> Result<Vec<TrainingRow>, CorpusError> {
    read_rows(File::open(path)?)
}

/// Serializes `rows` with a header line to any writer.
pub fn write_rows<T: Serialize>(rows: &[T], writer: impl Write) -> Result<(), CorpusError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Deserializes header-first CSV from any reader.
pub fn read_rows<T: DeserializeOwned>(reader: impl Read) -> Result<Vec<T>, CorpusError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let rows = rdr.deserialize().collect::<Result<Vec<T>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hour: u32, temp: Option<f64>) -> WeatherRecord {
        WeatherRecord {
            date_time: format!("2024-05-01T{hour:02}:00"),
            ambient_temperature: temp,
            irradiation: Some(450.0),
            humidity: Some(40.0),
            cloud_cover: None,
            wind_speed: Some(3.5),
            city: "Jaipur".to_string(),
        }
    }

    #[test]
    fn weather_header_and_empty_cells() {
        let mut buf = Vec::new();
        write_rows(&[record(9, None)], &mut buf).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("DATE_TIME,AMBIENT_TEMPERATURE,IRRADIATION,HUMIDITY,CLOUD_COVER,WIND_SPEED,CITY")
        );
        assert_eq!(lines.next(), Some("2024-05-01T09:00,,450.0,40.0,,3.5,Jaipur"));
    }

    #[test]
    fn weather_table_reads_back_gaps_as_none() {
        let rows = vec![record(9, None), record(10, Some(31.5))];
        let mut buf = Vec::new();
        write_rows(&rows, &mut buf).expect("write");
        let back: Vec<WeatherRecord> = read_rows(buf.as_slice()).expect("read");
        assert_eq!(back, rows);
    }

    #[test]
    fn corpus_columns_in_order() {
        let row = TrainingRow {
            date_time: "2024-05-01T12:00".to_string(),
            ambient_temperature: 30.0,
            irradiation: 0.8,
            humidity: 35.0,
            cloud_cover: 10.0,
            wind_speed: 2.0,
            city: "Kota".to_string(),
            system_capacity_w: 3000.0,
            module_temperature: 48.5,
            dc_power: 2500.0,
        };
        let mut buf = Vec::new();
        write_rows(&[row], &mut buf).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with(
            "DATE_TIME,AMBIENT_TEMPERATURE,IRRADIATION,HUMIDITY,CLOUD_COVER,WIND_SPEED,CITY,\
             SYSTEM_CAPACITY_W,MODULE_TEMPERATURE,DC_POWER\n"
        ));
    }

    #[test]
    fn corpus_file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("corpus.csv");
        assert!(read_corpus(&path).is_err());

        let rows = vec![TrainingRow {
            date_time: "2024-05-01T12:00".to_string(),
            ambient_temperature: 30.0,
            irradiation: 0.8,
            humidity: 35.0,
            cloud_cover: 10.0,
            wind_speed: 2.0,
            city: "Kota".to_string(),
            system_capacity_w: 4500.0,
            module_temperature: 48.5,
            dc_power: 3100.25,
        }];
        write_corpus(&rows, &path).expect("write");
        assert_eq!(read_corpus(&path).expect("read"), rows);
    }

    #[test]
    fn malformed_number_is_an_error() {
        let csv = "DATE_TIME,AMBIENT_TEMPERATURE,IRRADIATION,HUMIDITY,CLOUD_COVER,WIND_SPEED,CITY\n\
                   2024-05-01T09:00,warm,450,40,0,3,Jaipur\n";
        let rows: Result<Vec<WeatherRecord>, _> = read_rows(csv.as_bytes());
        assert!(matches!(rows, Err(CorpusError::Csv(_))));
    }
}
