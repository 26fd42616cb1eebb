//! Setup-time role pool and start constraints.
//!
//! While building a not-yet-started game the host toggles roles in a
//! [`RolePool`]: two disjoint lists of good and bad roles, each entry carrying
//! a selected flag and, on the bad side, an assassin-eligibility flag. The
//! pool keeps its selection counters incrementally on every toggle; the
//! counters are required to equal a full recount at all times, not merely as
//! an optimization (see [`RolePool::recount`]).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The role whose presence alone satisfies the assassin requirement.
pub const ASSASSIN_ROLE: &str = "Assassin";

/// Required number of bad roles per total player count (index 0..=13).
///
/// `-1` marks player counts that are not supported; starting is rejected for
/// those outright.
pub const BAD_ROLES_FOR_PLAYER_COUNT: [i8; 14] = [-1, 0, 1, -1, 1, 2, 2, 3, 3, 3, 4, 4, 5, 5];

/// Look up how many bad roles a table of `total_players` requires.
///
/// Returns `None` for unsupported player counts (out of table range or the
/// `-1` sentinel).
pub fn required_bad_roles(total_players: usize) -> Option<usize> {
    match BAD_ROLES_FOR_PLAYER_COUNT.get(total_players) {
        Some(&n) if n >= 0 => Some(n as usize),
        _ => None,
    }
}

/// One selectable role, in the exact shape the `start_game` action sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleChoice {
    pub name: String,
    pub checked: bool,
    /// Assassin-eligibility; meaningful only for bad roles.
    #[serde(default)]
    pub assassin: bool,
}

impl RoleChoice {
    fn unchecked(name: &str) -> Self {
        Self {
            name: name.to_string(),
            checked: false,
            assassin: false,
        }
    }
}

/// Why a start attempt was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    /// The table has a player count with no configuration.
    #[error("unsupported player count: {0}")]
    UnsupportedPlayerCount(usize),

    /// Selected roles do not cover every seated player.
    #[error("{selected} roles selected for {required} seated players")]
    PoolIncomplete { required: usize, selected: usize },

    /// The bad-role count does not match the table requirement exactly.
    #[error("{selected} bad roles selected, exactly {required} required")]
    WrongBadCount { required: usize, selected: usize },

    /// No selected bad role can act as the assassin.
    #[error("no assassin-eligible role selected")]
    MissingAssassin,

    /// A toggle referenced a role that is not in the pool.
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

/// Snapshot of the pool's selection counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolCounts {
    pub good: usize,
    pub bad: usize,
    pub total: usize,
}

/// The working set of selectable roles during game creation.
#[derive(Debug, Clone)]
pub struct RolePool {
    good: Vec<RoleChoice>,
    bad: Vec<RoleChoice>,
    selected_good: usize,
    selected_bad: usize,
    /// Selected bad roles currently flagged assassin-eligible.
    assassin_eligible_selected: usize,
    assassin_role_selected: bool,
}

impl RolePool {
    /// Build a pool from custom good/bad role names, all unselected.
    pub fn new<G, B>(good: G, bad: B) -> Self
    where
        G: IntoIterator,
        G::Item: AsRef<str>,
        B: IntoIterator,
        B::Item: AsRef<str>,
    {
        Self {
            good: good
                .into_iter()
                .map(|n| RoleChoice::unchecked(n.as_ref()))
                .collect(),
            bad: bad
                .into_iter()
                .map(|n| RoleChoice::unchecked(n.as_ref()))
                .collect(),
            selected_good: 0,
            selected_bad: 0,
            assassin_eligible_selected: 0,
            assassin_role_selected: false,
        }
    }

    /// The full standard role roster of the Round Table game.
    pub fn standard() -> Self {
        Self::new(
            [
                "Merlin",
                "Percival",
                "Good-Angel",
                "Titanya",
                "Nimue",
                "Galahad",
                "Sir-Kay",
                "Seer",
                "King-Arthur",
                "Puck",
                "Viviana",
                "Tristan",
                "Iseult",
                "Prince-Claudin",
                "Nirlem",
                "Sir-Robin",
                "Pellinore",
                "Lot",
                "Cordana",
                "The-Coward",
                "Loyal-Servent-Of-Arthur",
                "Loyal-Servent-Of-Arthur1",
                "Loyal-Servent-Of-Arthur2",
                "Loyal-Servent-Of-Arthur3",
                "Loyal-Servent-Of-Arthur4",
                "Merlin-Apprentice",
                "Guinevere",
                "Lancelot-Good",
                "Raven",
                "Balain",
                "Sir-Gawain",
                "Stray",
                "Ector",
                "Elaine",
                "Blanchefleur",
                "Tom-Thumb",
                "Gornemant",
                "Dagonet",
                "Meliagant",
                "Bors",
                "Uther-Pendragon",
            ],
            [
                "Morgana",
                ASSASSIN_ROLE,
                "Mordred",
                "Oberon",
                "Bad-Angel",
                "King-Claudin",
                "Ginerva",
                "Polygraph",
                "The-Questing-Beast",
                "Accolon",
                "Gawain",
                "Lancelot-Bad",
                "Queen-Mab",
                "Balin",
                "Maeve",
                "Agravain",
                "Nerzhul",
                "Mora",
                "Melwas",
                "Claudas",
                "Minion-Of-Mordred",
                "Minion-Of-Mordred1",
                "Minion-Of-Mordred2",
            ],
        )
    }

    // ── Toggles ─────────────────────────────────────────────────────

    /// Select or deselect a good role.
    ///
    /// Redundant toggles (already in the requested state) are no-ops, so the
    /// counters stay equal to a full recount under any toggle sequence.
    /// Returns whether the entry changed.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::UnknownRole`] if no good role has that name.
    pub fn set_good(&mut self, name: &str, checked: bool) -> Result<bool, SetupError> {
        let entry = self
            .good
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| SetupError::UnknownRole(name.to_string()))?;
        if entry.checked == checked {
            return Ok(false);
        }
        entry.checked = checked;
        if checked {
            self.selected_good += 1;
        } else {
            self.selected_good -= 1;
        }
        Ok(true)
    }

    /// Select or deselect a bad role. Same no-op rule as [`set_good`].
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::UnknownRole`] if no bad role has that name.
    ///
    /// [`set_good`]: RolePool::set_good
    pub fn set_bad(&mut self, name: &str, checked: bool) -> Result<bool, SetupError> {
        let entry = self
            .bad
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| SetupError::UnknownRole(name.to_string()))?;
        if entry.checked == checked {
            return Ok(false);
        }
        entry.checked = checked;
        if checked {
            self.selected_bad += 1;
            if entry.assassin {
                self.assassin_eligible_selected += 1;
            }
        } else {
            self.selected_bad -= 1;
            if entry.assassin {
                self.assassin_eligible_selected -= 1;
            }
        }
        if entry.name == ASSASSIN_ROLE {
            self.assassin_role_selected = checked;
        }
        Ok(true)
    }

    /// Flag or unflag a bad role as assassin-eligible.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::UnknownRole`] if no bad role has that name.
    pub fn set_assassin_eligible(&mut self, name: &str, eligible: bool) -> Result<bool, SetupError> {
        let entry = self
            .bad
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| SetupError::UnknownRole(name.to_string()))?;
        if entry.assassin == eligible {
            return Ok(false);
        }
        entry.assassin = eligible;
        if entry.checked {
            if eligible {
                self.assassin_eligible_selected += 1;
            } else {
                self.assassin_eligible_selected -= 1;
            }
        }
        Ok(true)
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn good_roles(&self) -> &[RoleChoice] {
        &self.good
    }

    pub fn bad_roles(&self) -> &[RoleChoice] {
        &self.bad
    }

    /// Incrementally maintained selection counters.
    pub fn counts(&self) -> PoolCounts {
        PoolCounts {
            good: self.selected_good,
            bad: self.selected_bad,
            total: self.selected_good + self.selected_bad,
        }
    }

    /// Full recount over the pool. Must always equal [`counts`](RolePool::counts).
    pub fn recount(&self) -> PoolCounts {
        let good = self.good.iter().filter(|r| r.checked).count();
        let bad = self.bad.iter().filter(|r| r.checked).count();
        PoolCounts {
            good,
            bad,
            total: good + bad,
        }
    }

    /// Whether the assassin requirement is satisfied: some selected bad role
    /// flagged assassin-eligible, or the `Assassin` role itself selected.
    pub fn has_assassin(&self) -> bool {
        self.assassin_eligible_selected > 0 || self.assassin_role_selected
    }

    /// Every role with its current flags, goods first — the `start_game`
    /// wire shape.
    pub fn selections(&self) -> Vec<RoleChoice> {
        self.good.iter().chain(self.bad.iter()).cloned().collect()
    }

    /// Check whether a game may start for the given seated-player count.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint as a [`SetupError`].
    pub fn validate_start(&self, total_players: usize) -> Result<(), SetupError> {
        let required_bad = required_bad_roles(total_players)
            .ok_or(SetupError::UnsupportedPlayerCount(total_players))?;

        let counts = self.counts();
        if counts.total != total_players {
            return Err(SetupError::PoolIncomplete {
                required: total_players,
                selected: counts.total,
            });
        }
        if counts.bad != required_bad {
            return Err(SetupError::WrongBadCount {
                required: required_bad,
                selected: counts.bad,
            });
        }
        if !self.has_assassin() {
            return Err(SetupError::MissingAssassin);
        }
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    fn seven_player_pool() -> RolePool {
        // 7 players require exactly 3 bad roles.
        let mut pool = RolePool::standard();
        for name in ["Merlin", "Percival", "Galahad", "Nimue"] {
            pool.set_good(name, true).unwrap();
        }
        for name in ["Morgana", "Mordred", "Oberon"] {
            pool.set_bad(name, true).unwrap();
        }
        pool
    }

    #[test]
    fn table_matches_required_counts() {
        assert_eq!(required_bad_roles(5), Some(2));
        assert_eq!(required_bad_roles(7), Some(3));
        assert_eq!(required_bad_roles(10), Some(4));
        assert_eq!(required_bad_roles(13), Some(5));
    }

    #[test]
    fn unsupported_player_counts_are_sentineled() {
        assert_eq!(required_bad_roles(0), None);
        assert_eq!(required_bad_roles(3), None);
        assert_eq!(required_bad_roles(14), None);
        assert_eq!(required_bad_roles(100), None);
    }

    #[test]
    fn seven_players_without_assassin_is_rejected() {
        let pool = seven_player_pool();
        assert_eq!(pool.validate_start(7), Err(SetupError::MissingAssassin));
    }

    #[test]
    fn seven_players_with_eligible_flag_is_accepted() {
        let mut pool = seven_player_pool();
        pool.set_assassin_eligible("Morgana", true).unwrap();
        assert_eq!(pool.validate_start(7), Ok(()));
    }

    #[test]
    fn assassin_role_itself_satisfies_the_requirement() {
        let mut pool = seven_player_pool();
        pool.set_bad("Oberon", false).unwrap();
        pool.set_bad(ASSASSIN_ROLE, true).unwrap();
        assert_eq!(pool.validate_start(7), Ok(()));
    }

    #[test]
    fn wrong_bad_count_is_rejected() {
        let mut pool = seven_player_pool();
        pool.set_assassin_eligible("Morgana", true).unwrap();
        pool.set_bad("Oberon", false).unwrap();
        pool.set_good("Seer", true).unwrap();
        assert_eq!(
            pool.validate_start(7),
            Err(SetupError::WrongBadCount {
                required: 3,
                selected: 2
            })
        );
    }

    #[test]
    fn incomplete_pool_is_rejected() {
        let mut pool = seven_player_pool();
        pool.set_assassin_eligible("Morgana", true).unwrap();
        assert_eq!(
            pool.validate_start(8),
            Err(SetupError::PoolIncomplete {
                required: 8,
                selected: 7
            })
        );
    }

    #[test]
    fn unsupported_count_is_rejected_before_anything_else() {
        let pool = RolePool::standard();
        assert_eq!(
            pool.validate_start(3),
            Err(SetupError::UnsupportedPlayerCount(3))
        );
    }

    #[test]
    fn counters_match_recount_after_arbitrary_toggles() {
        let mut pool = RolePool::standard();
        let script: [(&str, bool, bool); 12] = [
            ("Merlin", true, true),
            ("Merlin", true, true), // redundant double-check
            ("Percival", true, true),
            ("Merlin", true, false),
            ("Merlin", true, false), // redundant double-uncheck
            ("Morgana", false, true),
            ("Mordred", false, true),
            ("Morgana", false, false),
            ("Morgana", false, true),
            ("Galahad", true, true),
            ("Nimue", true, true),
            ("Nimue", true, false),
        ];
        for (name, good, checked) in script {
            if good {
                pool.set_good(name, checked).unwrap();
            } else {
                pool.set_bad(name, checked).unwrap();
            }
            assert_eq!(pool.counts(), pool.recount());
        }
        assert_eq!(
            pool.counts(),
            PoolCounts {
                good: 2,
                bad: 2,
                total: 4
            }
        );
    }

    #[test]
    fn redundant_toggles_report_no_change() {
        let mut pool = RolePool::standard();
        assert!(pool.set_good("Merlin", true).unwrap());
        assert!(!pool.set_good("Merlin", true).unwrap());
        assert!(pool.set_good("Merlin", false).unwrap());
        assert!(!pool.set_good("Merlin", false).unwrap());
    }

    #[test]
    fn eligibility_flag_tracks_selection_state() {
        let mut pool = RolePool::standard();
        // Flag before selection: not yet counted.
        pool.set_assassin_eligible("Morgana", true).unwrap();
        assert!(!pool.has_assassin());
        pool.set_bad("Morgana", true).unwrap();
        assert!(pool.has_assassin());
        // Unflagging a selected role withdraws it.
        pool.set_assassin_eligible("Morgana", false).unwrap();
        assert!(!pool.has_assassin());
        // Deselecting a flagged role withdraws it too.
        pool.set_assassin_eligible("Morgana", true).unwrap();
        pool.set_bad("Morgana", false).unwrap();
        assert!(!pool.has_assassin());
    }

    #[test]
    fn unknown_role_is_an_error() {
        let mut pool = RolePool::standard();
        assert_eq!(
            pool.set_good("Sauron", true),
            Err(SetupError::UnknownRole("Sauron".into()))
        );
        // Sides are disjoint: a good name is unknown on the bad side.
        assert!(pool.set_bad("Merlin", true).is_err());
    }

    #[test]
    fn standard_pool_contains_the_assassin() {
        let pool = RolePool::standard();
        assert!(pool.bad_roles().iter().any(|r| r.name == ASSASSIN_ROLE));
        assert!(pool.good_roles().iter().all(|r| !r.checked));
    }

    #[test]
    fn selections_cover_the_whole_pool_goods_first() {
        let mut pool = RolePool::standard();
        pool.set_good("Merlin", true).unwrap();
        pool.set_bad("Morgana", true).unwrap();
        let selections = pool.selections();
        assert_eq!(
            selections.len(),
            pool.good_roles().len() + pool.bad_roles().len()
        );
        assert_eq!(selections[0].name, "Merlin");
        assert!(selections.iter().any(|r| r.name == "Morgana" && r.checked));
    }

    #[test]
    fn role_choice_wire_shape() {
        let choice = RoleChoice {
            name: "Morgana".into(),
            checked: true,
            assassin: true,
        };
        let json = serde_json::to_string(&choice).unwrap();
        assert_eq!(
            json,
            r#"{"name":"Morgana","checked":true,"assassin":true}"#
        );
    }
}
