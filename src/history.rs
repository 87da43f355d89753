//! Historical pitch records.
//!
//! Loads the read-only pitch-by-pitch table that backs player lookup and the
//! first-pitch reference rows.

use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

use crate::error::ResourceLoadError;

/// Columns the table must carry.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "player_name",
    "pitcher",
    "p_throws",
    "game_date",
    "inning",
    "at_bat_number",
    "pitch_number",
    "pitch_type",
    "release_speed",
];

/// One observed pitch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalPitchRecord {
    /// Display name, "Last, First".
    pub player_name: String,
    pub pitcher: i64,
    pub p_throws: String,
    pub game_date: NaiveDate,
    pub inning: i64,
    pub at_bat_number: i64,
    pub pitch_number: i64,
    pub pitch_type: Option<String>,
    pub release_speed: Option<f64>,
}

impl HistoricalPitchRecord {
    /// Inning 1, first at-bat, first pitch.
    pub fn is_first_pitch_of_game(&self) -> bool {
        self.inning == 1 && self.at_bat_number == 1 && self.pitch_number == 1
    }
}

/// In-memory historical table, rows kept in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalTable {
    rows: Vec<HistoricalPitchRecord>,
}

impl HistoricalTable {
    pub fn from_records(rows: Vec<HistoricalPitchRecord>) -> Self {
        Self { rows }
    }

    /// Load from CSV or Parquet, picked by extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ResourceLoadError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let df = match extension.as_deref() {
            Some("csv") => CsvReadOptions::default()
                .with_has_header(true)
                .try_into_reader_with_file_path(Some(path.to_path_buf()))
                .and_then(|reader| reader.finish()),
            Some("parquet") | Some("pq") => {
                LazyFrame::scan_parquet(path, Default::default()).and_then(|lf| lf.collect())
            }
            _ => {
                return Err(ResourceLoadError::UnsupportedFormat {
                    path: path.to_path_buf(),
                })
            }
        }
        .map_err(|source| ResourceLoadError::Table {
            path: path.to_path_buf(),
            source,
        })?;

        let table = Self::from_dataframe(&df, path)?;
        info!(
            "Loaded historical table {}: {} rows",
            path.display(),
            table.len()
        );
        Ok(table)
    }

    /// Convert a loaded frame into typed rows.
    ///
    /// Rows with a null or unparsable identity or scenario field are dropped;
    /// `pitch_type` and `release_speed` may be null.
    pub fn from_dataframe(df: &DataFrame, path: &Path) -> Result<Self, ResourceLoadError> {
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|name| df.column(name).is_err())
            .collect();
        if !missing.is_empty() {
            return Err(ResourceLoadError::Schema {
                path: path.to_path_buf(),
                reason: format!("missing columns: {}", missing.join(", ")),
            });
        }

        let table_err = |source: PolarsError| ResourceLoadError::Table {
            path: path.to_path_buf(),
            source,
        };
        let cast = |name: &str, dtype: DataType| -> Result<Column, ResourceLoadError> {
            df.column(name)
                .and_then(|col| col.cast(&dtype))
                .map_err(table_err)
        };

        let names = cast("player_name", DataType::String)?;
        let pitchers = cast("pitcher", DataType::Float64)?;
        let throws = cast("p_throws", DataType::String)?;
        let dates = game_dates(df, path)?;
        let innings = cast("inning", DataType::Int64)?;
        let at_bats = cast("at_bat_number", DataType::Int64)?;
        let pitch_numbers = cast("pitch_number", DataType::Int64)?;
        let pitch_types = cast("pitch_type", DataType::String)?;
        let speeds = cast("release_speed", DataType::Float64)?;

        let names = names.str().map_err(table_err)?;
        let pitchers = pitchers.f64().map_err(table_err)?;
        let throws = throws.str().map_err(table_err)?;
        let innings = innings.i64().map_err(table_err)?;
        let at_bats = at_bats.i64().map_err(table_err)?;
        let pitch_numbers = pitch_numbers.i64().map_err(table_err)?;
        let pitch_types = pitch_types.str().map_err(table_err)?;
        let speeds = speeds.f64().map_err(table_err)?;

        let mut rows = Vec::with_capacity(df.height());
        let mut dropped = 0usize;

        for i in 0..df.height() {
            let record = match (
                names.get(i),
                pitchers.get(i).filter(|p| p.is_finite()),
                throws.get(i),
                dates[i],
                innings.get(i),
                at_bats.get(i),
                pitch_numbers.get(i),
            ) {
                (
                    Some(name),
                    Some(pitcher),
                    Some(hand),
                    Some(game_date),
                    Some(inning),
                    Some(at_bat_number),
                    Some(pitch_number),
                ) => HistoricalPitchRecord {
                    player_name: name.to_string(),
                    pitcher: pitcher as i64,
                    p_throws: hand.to_string(),
                    game_date,
                    inning,
                    at_bat_number,
                    pitch_number,
                    pitch_type: pitch_types.get(i).map(str::to_string),
                    release_speed: speeds.get(i),
                },
                _ => {
                    dropped += 1;
                    continue;
                }
            };
            rows.push(record);
        }

        if dropped > 0 {
            warn!(
                "Dropped {} of {} rows from {} with missing identity or scenario fields",
                dropped,
                df.height(),
                path.display()
            );
        }

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[HistoricalPitchRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// `game_date` as calendar dates, one per row.
///
/// Native date and datetime columns are truncated to their day directly,
/// timezone-aware ones in UTC. Anything else is read as text.
fn game_dates(df: &DataFrame, path: &Path) -> Result<Vec<Option<NaiveDate>>, ResourceLoadError> {
    let table_err = |source: PolarsError| ResourceLoadError::Table {
        path: path.to_path_buf(),
        source,
    };
    let column = df.column("game_date").map_err(table_err)?;

    match column.dtype() {
        DataType::Date | DataType::Datetime(_, _) => {
            let days = column.cast(&DataType::Date).map_err(table_err)?;
            Ok(days.date().map_err(table_err)?.as_date_iter().collect())
        }
        _ => {
            let text = column.cast(&DataType::String).map_err(table_err)?;
            Ok(text
                .str()
                .map_err(table_err)?
                .into_iter()
                .map(|raw| raw.and_then(parse_game_date))
                .collect())
        }
    }
}

/// Parse a game date in any of the shapes exports commonly use.
///
/// Datetime strings are cut to their date part.
pub fn parse_game_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    for format in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }
    if raw.len() > 10 && raw.is_char_boundary(10) {
        return NaiveDate::parse_from_str(&raw[..10], "%Y-%m-%d").ok();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "\
player_name,pitcher,p_throws,game_date,inning,at_bat_number,pitch_number,pitch_type,release_speed
\"Cole, Gerrit\",543037.0,R,2023-09-27,1,1,1,FF,97.8
\"Cole, Gerrit\",543037.0,R,2023-09-27,1,1,2,SL,88.1
\"Sale, Chris\",519242.0,L,2023-09-26 00:00:00,1,1,1,,
\"Broken, Row\",,R,2023-09-26,1,1,1,FF,93.0
";

    fn write_file(suffix: &str, body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_csv() {
        let file = write_file(".csv", CSV);
        let table = HistoricalTable::load(file.path()).unwrap();

        // The row without a pitcher id is dropped
        assert_eq!(table.len(), 3);

        let first = &table.rows()[0];
        assert_eq!(first.player_name, "Cole, Gerrit");
        assert_eq!(first.pitcher, 543037);
        assert_eq!(first.p_throws, "R");
        assert_eq!(first.game_date, NaiveDate::from_ymd_opt(2023, 9, 27).unwrap());
        assert!(first.is_first_pitch_of_game());
        assert_eq!(first.pitch_type.as_deref(), Some("FF"));
        assert_eq!(first.release_speed, Some(97.8));

        assert!(!table.rows()[1].is_first_pitch_of_game());

        let sale = &table.rows()[2];
        assert_eq!(sale.game_date, NaiveDate::from_ymd_opt(2023, 9, 26).unwrap());
        assert_eq!(sale.pitch_type, None);
        assert_eq!(sale.release_speed, None);
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let file = write_file(".csv", "player_name,pitcher\n\"Cole, Gerrit\",543037\n");
        let err = HistoricalTable::load(file.path()).unwrap_err();

        match err {
            ResourceLoadError::Schema { reason, .. } => {
                assert!(reason.contains("p_throws"));
                assert!(reason.contains("release_speed"));
            }
            other => panic!("Expected Schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_table_error() {
        let err = HistoricalTable::load("does/not/exist.csv").unwrap_err();
        assert!(matches!(err, ResourceLoadError::Table { .. }));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_file(".xlsx", "");
        let err = HistoricalTable::load(file.path()).unwrap_err();
        assert!(matches!(err, ResourceLoadError::UnsupportedFormat { .. }));
    }

    // 2023-09-27 and 2023-09-26
    const EPOCH_DAYS: [i32; 2] = [19627, 19626];
    const MS_PER_DAY: i64 = 86_400_000;

    fn frame(game_date: Column) -> DataFrame {
        DataFrame::new(vec![
            Column::new("player_name".into(), ["Cole, Gerrit", "Sale, Chris"]),
            Column::new("pitcher".into(), [543037i64, 519242]),
            Column::new("p_throws".into(), ["R", "L"]),
            game_date,
            Column::new("inning".into(), [1i64, 1]),
            Column::new("at_bat_number".into(), [1i64, 1]),
            Column::new("pitch_number".into(), [1i64, 1]),
            Column::new("pitch_type".into(), [Some("FF"), None]),
            Column::new("release_speed".into(), [Some(97.8), None]),
        ])
        .unwrap()
    }

    /// Evening start times, 23:05 UTC on each game day.
    fn datetime_column(tz: Option<&str>) -> Column {
        let millis: Vec<i64> = EPOCH_DAYS
            .iter()
            .map(|&d| d as i64 * MS_PER_DAY + 83_100_000)
            .collect();
        Column::new("game_date".into(), millis)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, tz.map(Into::into)))
            .unwrap()
    }

    fn assert_game_days(table: &HistoricalTable) {
        let dates: Vec<String> = table
            .rows()
            .iter()
            .map(|r| r.game_date.format("%Y-%m-%d").to_string())
            .collect();
        assert_eq!(dates, vec!["2023-09-27", "2023-09-26"]);
    }

    #[test]
    fn test_native_date_column() {
        let dates = Column::new("game_date".into(), EPOCH_DAYS)
            .cast(&DataType::Date)
            .unwrap();
        let table = HistoricalTable::from_dataframe(&frame(dates), Path::new("x.parquet")).unwrap();
        assert_game_days(&table);
    }

    #[test]
    fn test_naive_datetime_column() {
        let df = frame(datetime_column(None));
        let table = HistoricalTable::from_dataframe(&df, Path::new("x.parquet")).unwrap();
        assert_game_days(&table);
    }

    #[test]
    fn test_timezone_aware_datetime_column() {
        for tz in ["UTC", "America/New_York"] {
            let df = frame(datetime_column(Some(tz)));
            let dtype = df.column("game_date").unwrap().dtype().clone();
            assert!(matches!(dtype, DataType::Datetime(_, Some(_))));

            let table = HistoricalTable::from_dataframe(&df, Path::new("x.parquet")).unwrap();
            assert_game_days(&table);
        }
    }

    #[test]
    fn test_load_parquet() {
        let mut df = frame(datetime_column(Some("UTC")));
        for suffix in [".parquet", ".pq"] {
            let file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
            ParquetWriter::new(std::fs::File::create(file.path()).unwrap())
                .finish(&mut df)
                .unwrap();

            let table = HistoricalTable::load(file.path()).unwrap();
            assert_eq!(table.len(), 2);
            assert_game_days(&table);

            let sale = &table.rows()[1];
            assert_eq!(sale.pitcher, 519242);
            assert_eq!(sale.p_throws, "L");
            assert_eq!(sale.pitch_type, None);
            assert_eq!(sale.release_speed, None);
            assert_eq!(table.rows()[0].release_speed, Some(97.8));
        }
    }

    #[test]
    fn test_parse_game_date_shapes() {
        let expected = NaiveDate::from_ymd_opt(2024, 4, 1);
        assert_eq!(parse_game_date("2024-04-01"), expected);
        assert_eq!(parse_game_date("2024-04-01 00:00:00"), expected);
        assert_eq!(parse_game_date("2024-04-01T13:05:00.000"), expected);
        assert_eq!(parse_game_date("04/01/2024"), expected);
        assert_eq!(parse_game_date("yesterday"), None);
    }
}
