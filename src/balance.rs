//! Population balance heuristics
//!
//! Advisory checks over the parsed entity counts. The balance warning is
//! surfaced to the log and the oracle prompt context but never blocks an
//! iteration; the viability check is what ends the loop.

use crate::counts::CountMap;

/// The four animal species tracked by the simulator.
pub const ANIMAL_ENTITIES: [&str; 4] = ["Wolves", "Bobcats", "Squirrels", "Grouse"];

/// The two plant species tracked by the simulator.
pub const PLANT_ENTITIES: [&str; 2] = ["Seeds", "Berries"];

/// An entity this many times above the cross-entity mean is imbalanced.
const IMBALANCE_FACTOR: f64 = 5.0;

/// Both plants must individually exceed this count for plant dominance.
const PLANT_DOMINANCE_MIN_COUNT: u32 = 1000;

/// Combined plants beyond this multiple of combined animals is dominance.
const PLANT_DOMINANCE_FACTOR: u32 = 7;

/// Check population balance across all six recognized entities.
///
/// Returns a warning string when an imbalance is detected, `None` when the
/// populations look acceptable. Heuristic only.
pub fn check_population_balance(counts: &CountMap) -> Option<String> {
    let populations: Vec<u32> = ANIMAL_ENTITIES
        .iter()
        .chain(PLANT_ENTITIES.iter())
        .filter_map(|name| counts.get(*name).map(|c| c.total))
        .collect();
    if populations.is_empty() {
        return Some("No entities present to check population balance.".to_string());
    }

    let average = populations.iter().map(|&p| p as u64).sum::<u64>() as f64
        / populations.len() as f64;
    let imbalanced: Vec<&str> = ANIMAL_ENTITIES
        .iter()
        .chain(PLANT_ENTITIES.iter())
        .filter(|name| {
            counts
                .get(**name)
                .is_some_and(|c| c.total as f64 > IMBALANCE_FACTOR * average)
        })
        .copied()
        .collect();

    if !imbalanced.is_empty() {
        return Some(format!(
            "High population imbalance detected for: {}. Average population (all entities): {:.2}",
            imbalanced.join(", "),
            average
        ));
    }

    // Totals and the dominance product are computed in u64: unparseable
    // counts saturate to u32::MAX upstream, which would overflow u32 here.
    let plant_total: u64 = PLANT_ENTITIES
        .iter()
        .filter_map(|name| counts.get(*name).map(|c| c.total as u64))
        .sum();
    let animal_total: u64 = ANIMAL_ENTITIES
        .iter()
        .filter_map(|name| counts.get(*name).map(|c| c.total as u64))
        .sum();
    let plants_abundant = PLANT_ENTITIES
        .iter()
        .all(|name| counts.get(*name).is_some_and(|c| c.total > PLANT_DOMINANCE_MIN_COUNT));

    if plants_abundant && plant_total > PLANT_DOMINANCE_FACTOR as u64 * animal_total {
        return Some(
            "Plant populations (Seeds, Berries) are significantly dominating the ecosystem."
                .to_string(),
        );
    }

    None
}

/// Animal species whose population has dropped to zero.
///
/// An animal absent from the counts entirely is not reported; only an
/// explicit zero total counts as extinct.
pub fn extinct_animals(counts: &CountMap) -> Vec<&'static str> {
    ANIMAL_ENTITIES
        .iter()
        .filter(|name| counts.get(**name).is_some_and(|c| c.total == 0))
        .copied()
        .collect()
}

/// Viable means no animal population is at zero this step. This is a
/// per-step snapshot, not a trend measurement.
pub fn is_viable(counts: &CountMap) -> bool {
    extinct_animals(counts).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counts::EntityCount;

    fn counts_from(entries: &[(&str, u32)]) -> CountMap {
        entries
            .iter()
            .map(|(name, total)| {
                let count = if PLANT_ENTITIES.contains(name) {
                    EntityCount::plant(*total)
                } else {
                    EntityCount::animal(*total, total / 2, total - total / 2)
                };
                (name.to_string(), count)
            })
            .collect()
    }

    #[test]
    fn flags_single_outlier_above_five_times_mean() {
        let counts = counts_from(&[
            ("Wolves", 10),
            ("Bobcats", 10),
            ("Squirrels", 10),
            ("Grouse", 10),
            ("Seeds", 10),
            ("Berries", 10000),
        ]);
        let warning = check_population_balance(&counts).unwrap();
        assert!(warning.contains("Berries"));
        assert!(!warning.contains("Wolves"));
    }

    #[test]
    fn flags_plant_dominance_at_thresholds() {
        // 4000 plants vs 400 animals: over 7x, and both plants above 1000.
        let counts = counts_from(&[
            ("Wolves", 100),
            ("Bobcats", 100),
            ("Squirrels", 100),
            ("Grouse", 100),
            ("Seeds", 2000),
            ("Berries", 2000),
        ]);
        let warning = check_population_balance(&counts).unwrap();
        assert!(warning.contains("dominating"));
    }

    #[test]
    fn dominance_requires_both_plants_above_min_count() {
        let counts = counts_from(&[
            ("Wolves", 10),
            ("Bobcats", 10),
            ("Squirrels", 10),
            ("Grouse", 10),
            ("Seeds", 900),
            ("Berries", 950),
        ]);
        // 1850 > 7 * 40, but neither plant clears the 1000 floor.
        assert!(check_population_balance(&counts).is_none());
    }

    #[test]
    fn saturated_counts_do_not_overflow_dominance_check() {
        // Unparseable table cells saturate to u32::MAX; the dominance
        // product and the plant sum must not wrap.
        let counts = counts_from(&[
            ("Wolves", 10),
            ("Bobcats", 10),
            ("Squirrels", 10),
            ("Grouse", 10),
            ("Seeds", u32::MAX),
            ("Berries", u32::MAX),
        ]);
        let warning = check_population_balance(&counts).unwrap();
        assert!(warning.contains("dominating"));
    }

    #[test]
    fn balanced_populations_produce_no_warning() {
        let counts = counts_from(&[
            ("Wolves", 40),
            ("Bobcats", 35),
            ("Squirrels", 60),
            ("Grouse", 55),
            ("Seeds", 80),
            ("Berries", 70),
        ]);
        assert!(check_population_balance(&counts).is_none());
    }

    #[test]
    fn empty_counts_warn_rather_than_divide_by_zero() {
        let warning = check_population_balance(&CountMap::new()).unwrap();
        assert!(warning.contains("No entities"));
    }

    #[test]
    fn any_zero_animal_is_non_viable() {
        for name in ANIMAL_ENTITIES {
            let mut counts = counts_from(&[
                ("Wolves", 5),
                ("Bobcats", 5),
                ("Squirrels", 5),
                ("Grouse", 5),
            ]);
            counts.insert(name.to_string(), EntityCount::animal(0, 0, 0));
            assert!(!is_viable(&counts));
            assert_eq!(extinct_animals(&counts), vec![name]);
        }
    }

    #[test]
    fn all_animals_alive_is_viable() {
        let counts = counts_from(&[
            ("Wolves", 1),
            ("Bobcats", 2),
            ("Squirrels", 3),
            ("Grouse", 4),
        ]);
        assert!(is_viable(&counts));
    }
}
