//! Historical first-pitch reference rows.

use serde::{Deserialize, Serialize};

use crate::history::HistoricalPitchRecord;

/// Most rows ever returned.
pub const MAX_REFERENCE_ROWS: usize = 5;

/// Order in which qualifying rows are returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryOrder {
    /// Order of the underlying table. Only chronological if the table is.
    #[default]
    Table,
    /// Most recent game first.
    NewestFirst,
}

/// One recorded first pitch of a game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FirstPitch {
    /// `YYYY-MM-DD`
    pub date: String,
    pub speed_mph: Option<f64>,
    pub pitch_type: Option<String>,
}

/// First pitches of games thrown by `pitcher_id`, at most `limit` (capped at
/// [`MAX_REFERENCE_ROWS`]). An empty result is not an error.
pub fn find_first_pitches(
    pitcher_id: i64,
    rows: &[HistoricalPitchRecord],
    limit: usize,
    order: HistoryOrder,
) -> Vec<FirstPitch> {
    let limit = limit.min(MAX_REFERENCE_ROWS);
    let qualifying = rows
        .iter()
        .filter(|r| r.pitcher == pitcher_id && r.is_first_pitch_of_game());

    let selected: Vec<&HistoricalPitchRecord> = match order {
        HistoryOrder::Table => qualifying.take(limit).collect(),
        HistoryOrder::NewestFirst => {
            let mut all: Vec<_> = qualifying.collect();
            all.sort_by(|a, b| b.game_date.cmp(&a.game_date));
            all.truncate(limit);
            all
        }
    };

    selected
        .into_iter()
        .map(|r| FirstPitch {
            date: r.game_date.format("%Y-%m-%d").to_string(),
            speed_mph: r.release_speed,
            pitch_type: r.pitch_type.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn pitch(
        pitcher: i64,
        day: u32,
        inning: i64,
        at_bat: i64,
        number: i64,
    ) -> HistoricalPitchRecord {
        HistoricalPitchRecord {
            player_name: "Cole, Gerrit".to_string(),
            pitcher,
            p_throws: "R".to_string(),
            game_date: NaiveDate::from_ymd_opt(2023, 5, day).unwrap(),
            inning,
            at_bat_number: at_bat,
            pitch_number: number,
            pitch_type: Some("FF".to_string()),
            release_speed: Some(95.0 + day as f64 / 10.0),
        }
    }

    #[test]
    fn test_filters_to_first_pitch_of_game() {
        let rows = vec![
            pitch(543037, 1, 1, 1, 1),
            pitch(543037, 1, 1, 1, 2),
            pitch(543037, 1, 1, 2, 1),
            pitch(543037, 1, 2, 1, 1),
            pitch(519242, 2, 1, 1, 1),
            pitch(543037, 3, 1, 1, 1),
        ];

        let found = find_first_pitches(543037, &rows, 5, HistoryOrder::Table);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].date, "2023-05-01");
        assert_eq!(found[1].date, "2023-05-03");
        assert_eq!(found[0].pitch_type.as_deref(), Some("FF"));
    }

    #[test]
    fn test_never_more_than_five() {
        let rows: Vec<_> = (1..=12).map(|d| pitch(543037, d, 1, 1, 1)).collect();

        assert_eq!(find_first_pitches(543037, &rows, 5, HistoryOrder::Table).len(), 5);
        assert_eq!(find_first_pitches(543037, &rows, 50, HistoryOrder::Table).len(), 5);
        assert_eq!(find_first_pitches(543037, &rows, 3, HistoryOrder::Table).len(), 3);
    }

    #[test]
    fn test_table_order_preserved() {
        let rows = vec![
            pitch(543037, 20, 1, 1, 1),
            pitch(543037, 2, 1, 1, 1),
            pitch(543037, 11, 1, 1, 1),
        ];

        let dates: Vec<_> = find_first_pitches(543037, &rows, 5, HistoryOrder::Table)
            .into_iter()
            .map(|p| p.date)
            .collect();
        assert_eq!(dates, vec!["2023-05-20", "2023-05-02", "2023-05-11"]);
    }

    #[test]
    fn test_newest_first() {
        let rows: Vec<_> = [4, 28, 9, 17, 1, 22, 13]
            .iter()
            .map(|&d| pitch(543037, d, 1, 1, 1))
            .collect();

        let dates: Vec<_> = find_first_pitches(543037, &rows, 5, HistoryOrder::NewestFirst)
            .into_iter()
            .map(|p| p.date)
            .collect();
        assert_eq!(
            dates,
            vec!["2023-05-28", "2023-05-22", "2023-05-17", "2023-05-13", "2023-05-09"]
        );
    }

    #[test]
    fn test_no_history_is_empty() {
        let rows = vec![pitch(519242, 1, 1, 1, 1)];
        assert!(find_first_pitches(543037, &rows, 5, HistoryOrder::Table).is_empty());
    }

    #[test]
    fn test_order_deserializes_snake_case() {
        let order: HistoryOrder = serde_json::from_str("\"newest_first\"").unwrap();
        assert_eq!(order, HistoryOrder::NewestFirst);
    }
}
