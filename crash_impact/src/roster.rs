//! Static roster and race tables the generator draws from.

use crate::{Rider, Team};

pub struct TeamEntry {
    pub name: &'static str,
    pub country: &'static str,
    pub riders: &'static [(&'static str, u32)],
}

pub struct RaceRoute {
    pub name: &'static str,
    /// Crash sites valid for this race; never empty.
    pub locations: &'static [&'static str],
}

pub const TEAMS: &[TeamEntry] = &[
    TeamEntry {
        name: "Team Velocity",
        country: "Belgium",
        riders: &[
            ("James Smith", 11),
            ("Mary Johnson", 12),
            ("Robert Williams", 13),
            ("Linda Brown", 14),
            ("Thomas Jones", 15),
            ("Sarah Miller", 16),
        ],
    },
    TeamEntry {
        name: "Rapid Wheels",
        country: "France",
        riders: &[
            ("John Davis", 21),
            ("Patricia Garcia", 22),
            ("Michael Rodriguez", 23),
            ("Jennifer Wilson", 24),
            ("William Martinez", 25),
        ],
    },
    TeamEntry {
        name: "Alpine Riders",
        country: "Switzerland",
        riders: &[
            ("David Anderson", 31),
            ("Elizabeth Taylor", 32),
            ("Richard Thomas", 33),
            ("Barbara Hernandez", 34),
            ("Joseph Moore", 35),
            ("Susan Martin", 36),
            ("Charles Jackson", 37),
        ],
    },
    TeamEntry {
        name: "Coastal Sprinters",
        country: "Netherlands",
        riders: &[
            ("Jessica Thompson", 41),
            ("Karen White", 42),
            ("Daniel Harris", 43),
            ("Nancy Clark", 44),
            ("Mark Lewis", 45),
        ],
    },
    TeamEntry {
        name: "Mountain Climbers",
        country: "Colombia",
        riders: &[
            ("Paul Walker", 51),
            ("Laura Hall", 52),
            ("Steven Allen", 53),
            ("Emily Young", 54),
            ("Kevin King", 55),
            ("Anna Wright", 56),
        ],
    },
    TeamEntry {
        name: "Urban Pedalers",
        country: "Italy",
        riders: &[
            ("Brian Scott", 61),
            ("Helen Green", 62),
            ("George Baker", 63),
            ("Ruth Adams", 64),
            ("Edward Nelson", 65),
        ],
    },
];

pub const RACES: &[RaceRoute] = &[
    RaceRoute {
        name: "Paris-Roubaix",
        locations: &["Carrefour de l'Arbre", "Trouée d'Arenberg"],
    },
    RaceRoute {
        name: "Tour de France",
        locations: &[
            "Champs-Élysées",
            "Col du Tourmalet",
            "Alpe d'Huez",
            "Mont Ventoux",
            "Col du Galibier",
        ],
    },
    RaceRoute {
        name: "Giro d'Italia",
        locations: &["Passo dello Stelvio", "Passo del Mortirolo"],
    },
    RaceRoute {
        name: "Vuelta a España",
        locations: &["Alto de l'Angliru", "Lagos de Covadonga"],
    },
    RaceRoute {
        name: "Milan-San Remo",
        locations: &["Poggio", "Cipressa", "Via Roma"],
    },
    RaceRoute {
        name: "Liège-Bastogne-Liège",
        locations: &["La Redoute", "Côte de la Roche-aux-Faucons"],
    },
    RaceRoute {
        name: "Tour of Flanders",
        locations: &[
            "Oude Kwaremont",
            "Koppenberg",
            "Paterberg",
            "Muur van Geraardsbergen",
        ],
    },
    RaceRoute {
        name: "Amstel Gold Race",
        locations: &["Cauberg"],
    },
    RaceRoute {
        name: "La Flèche Wallonne",
        locations: &["Mur de Huy"],
    },
    RaceRoute {
        name: "Strade Bianche",
        locations: &["Monte Sante Marie", "Piazza del Campo"],
    },
];

/// Valid crash sites for `race`, or `None` for a race outside the table.
pub fn locations_for(race: &str) -> Option<&'static [&'static str]> {
    RACES
        .iter()
        .find(|route| route.name == race)
        .map(|route| route.locations)
}

/// Materialize the roster with sequential team ids and team-scoped rider ids.
pub fn build_teams() -> Vec<Team> {
    TEAMS
        .iter()
        .enumerate()
        .map(|(team_idx, entry)| {
            let team_id = format!("team-{}", team_idx + 1);
            let riders = entry
                .riders
                .iter()
                .enumerate()
                .map(|(rider_idx, &(name, number))| Rider {
                    id: format!("{}-rider-{}", team_id, rider_idx + 1),
                    name: name.to_string(),
                    number,
                    team: entry.name.to_string(),
                })
                .collect();
            Team {
                id: team_id,
                name: entry.name.to_string(),
                country: entry.country.to_string(),
                riders,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_race_has_locations() {
        assert_eq!(RACES.len(), 10);
        for route in RACES {
            assert!(!route.locations.is_empty(), "{} has no locations", route.name);
        }
    }

    #[test]
    fn test_locations_for_paris_roubaix() {
        let sites = locations_for("Paris-Roubaix").unwrap();
        assert_eq!(sites, &["Carrefour de l'Arbre", "Trouée d'Arenberg"]);
        assert_eq!(locations_for("Amstel Gold Race").unwrap(), &["Cauberg"]);
        assert!(locations_for("Unknown Classic").is_none());
    }

    #[test]
    fn test_roster_identities_are_unique() {
        let teams = build_teams();
        assert_eq!(teams.len(), TEAMS.len());
        let team_ids: HashSet<_> = teams.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(team_ids.len(), teams.len());

        let rider_ids: Vec<_> = teams
            .iter()
            .flat_map(|t| t.riders.iter().map(|r| r.id.as_str()))
            .collect();
        let unique: HashSet<_> = rider_ids.iter().copied().collect();
        assert_eq!(unique.len(), rider_ids.len());
    }

    #[test]
    fn test_riders_carry_their_team() {
        for team in build_teams() {
            assert!(!team.riders.is_empty());
            assert!(team.riders.iter().all(|r| r.team == team.name));
        }
        assert_eq!(build_teams()[0].riders[0].id, "team-1-rider-1");
    }
}
