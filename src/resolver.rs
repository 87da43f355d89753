//! Player lookup against the historical table.

use serde::Serialize;
use tracing::warn;

use crate::history::HistoricalPitchRecord;

/// Identity fields the encoder needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PitcherIdentity {
    pub pitcher: i64,
    pub throws: String,
}

impl PitcherIdentity {
    /// Integer id in string form, as the mapping keys it.
    pub fn id(&self) -> String {
        self.pitcher.to_string()
    }
}

/// Outcome of a name lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found {
        identity: PitcherIdentity,
        /// Identities on later matching rows that disagree with the first.
        conflicts: Vec<PitcherIdentity>,
    },
    NotFound(String),
}

/// Exact, case-sensitive match of `full_name` against `player_name`.
///
/// The first matching row supplies the identity. Later rows for the same
/// name are still scanned so a name shared by distinct pitchers is reported
/// instead of silently trusted.
pub fn resolve(full_name: &str, rows: &[HistoricalPitchRecord]) -> Resolution {
    let mut matches = rows.iter().filter(|r| r.player_name == full_name);

    let Some(first) = matches.next() else {
        return Resolution::NotFound(full_name.to_string());
    };

    let identity = identity_of(first);
    let mut conflicts: Vec<PitcherIdentity> = Vec::new();
    for row in matches {
        let other = identity_of(row);
        if other != identity && !conflicts.contains(&other) {
            conflicts.push(other);
        }
    }

    if !conflicts.is_empty() {
        warn!(
            "Name '{}' maps to more than one pitcher: using {}/{}, also saw {:?}",
            full_name, identity.pitcher, identity.throws, conflicts
        );
    }

    Resolution::Found {
        identity,
        conflicts,
    }
}

fn identity_of(row: &HistoricalPitchRecord) -> PitcherIdentity {
    PitcherIdentity {
        pitcher: row.pitcher,
        throws: row.p_throws.clone(),
    }
}
