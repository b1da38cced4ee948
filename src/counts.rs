//! Population table parsing
//!
//! Scrapes the simulator's pipe-delimited field report into per-entity
//! counts. The simulator prints one animal table (name/total/male/female)
//! and one plant table (name/total) per frame; only the last complete
//! plant section before end of output is kept.

use regex::Regex;
use std::collections::BTreeMap;

/// Population counts for a single entity.
///
/// Plants have no gender breakdown, so `male`/`female` are optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityCount {
    pub total: u32,
    pub male: Option<u32>,
    pub female: Option<u32>,
}

impl EntityCount {
    pub fn animal(total: u32, male: u32, female: u32) -> Self {
        Self {
            total,
            male: Some(male),
            female: Some(female),
        }
    }

    pub fn plant(total: u32) -> Self {
        Self {
            total,
            male: None,
            female: None,
        }
    }

    /// One-line rendering used in prompts and the tuning log.
    pub fn describe(&self, name: &str) -> String {
        match (self.male, self.female) {
            (Some(male), Some(female)) => format!(
                "- {}: Total={}, Male={}, Female={}",
                name, self.total, male, female
            ),
            _ => format!("- {}: Total={}", name, self.total),
        }
    }
}

/// Entity name -> counts, rebuilt fresh from each simulation run.
pub type CountMap = BTreeMap<String, EntityCount>;

/// Parse the full stdout capture of one simulation run.
///
/// Animal rows overwrite by key across frames. Plant rows accumulate in a
/// scratch map that is only merged into the result once the section's
/// closing dash row arrives, so a truncated trailing section is dropped.
/// Unrecognized lines are ignored; no usable rows yields an empty map.
pub fn parse_entity_counts(output: &str) -> CountMap {
    let animal_row = Regex::new(r"^\| (\w+) +\| +(\d+) +\| +(\d+) +\| +(\d+) +\|")
        .expect("animal row pattern");
    let plant_row = Regex::new(r"^\| (\w+)\s*\| +(\d+) +\|").expect("plant row pattern");

    let mut counts = CountMap::new();
    let mut in_plant_section = false;
    let mut plant_header_seen = false;
    let mut pending_plants = CountMap::new();

    for line in output.lines() {
        if let Some(caps) = animal_row.captures(line) {
            let name = caps[1].to_string();
            let total = parse_u32(&caps[2]);
            let male = parse_u32(&caps[3]);
            let female = parse_u32(&caps[4]);
            counts.insert(name, EntityCount::animal(total, male, female));
            in_plant_section = false;
        }

        if line.contains("| Plant") {
            in_plant_section = true;
            plant_header_seen = false;
            pending_plants.clear();
            continue;
        }

        if in_plant_section {
            if !plant_header_seen {
                if line.starts_with("+---") {
                    plant_header_seen = true;
                }
                continue;
            }
            if let Some(caps) = plant_row.captures(line) {
                pending_plants.insert(caps[1].to_string(), EntityCount::plant(parse_u32(&caps[2])));
            } else if line.starts_with("+---") {
                counts.append(&mut pending_plants);
                in_plant_section = false;
            }
        }
    }

    counts
}

fn parse_u32(digits: &str) -> u32 {
    // Capture groups are \d+ so this only fails on overflow.
    digits.trim().parse().unwrap_or(u32::MAX)
}
