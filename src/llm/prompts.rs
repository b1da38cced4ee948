//! Prompt construction
//!
//! The priming message establishes the session context (optionally with the
//! full simulator codebase); the per-iteration prompt carries the current
//! population state, the previous suggestion, and the fixed attribute
//! reference, and asks for a JSON object over the enumerated key set.

use crate::counts::CountMap;
use crate::llm::Suggestion;

/// Priming message sent when no codebase dump is available.
pub const NO_CODEBASE_PRIMING: &str = "For this and all future iterations, I will NOT be \
providing the codebase. Please rely on your general knowledge of predator-prey simulations \
and the information provided in each prompt to suggest attribute adjustments.";

/// Every attribute key the model may adjust, in the order they appear in
/// the requested JSON object. The patcher routes a subset of these to
/// source files; the rest are context the simulator exposes but the tuner
/// does not rewrite.
pub const ADJUSTMENT_KEYS: [&str; 34] = [
    "WOLF_CREATION_PROBABILITY",
    "BOBCAT_CREATION_PROBABILITY",
    "SQUIRREL_CREATION_PROBABILITY",
    "GROUSE_CREATION_PROBABILITY",
    "SEEDS_CREATION_PROBABILITY",
    "BERRIES_CREATION_PROBABILITY",
    "WOLF_BREEDING_PROBABILITY",
    "BOBCAT_BREEDING_PROBABILITY",
    "SQUIRREL_BREEDING_PROBABILITY",
    "GROUSE_BREEDING_PROBABILITY",
    "WOLF_BREEDING_AGE",
    "BOBCAT_BREEDING_AGE",
    "SQUIRREL_BREEDING_AGE",
    "GROUSE_BREEDING_AGE",
    "WOLF_MAX_AGE",
    "BOBCAT_MAX_AGE",
    "SQUIRREL_MAX_AGE",
    "GROUSE_MAX_AGE",
    "WOLF_MAX_LITTER_SIZE",
    "BOBCAT_MAX_LITTER_SIZE",
    "SQUIRREL_MAX_LITTER_SIZE",
    "GROUSE_MAX_LITTER_SIZE",
    "SEEDS_GROWTH_RATE",
    "SEEDS_REPRODUCTION_RATE",
    "SEEDS_LIFE_SPAN",
    "SEEDS_SPREAD_RATE",
    "SEEDS_GROWTH_START_HOUR",
    "SEEDS_GROWTH_END_HOUR",
    "BERRIES_GROWTH_RATE",
    "BERRIES_REPRODUCTION_RATE",
    "BERRIES_LIFE_SPAN",
    "BERRIES_SPREAD_RATE",
    "BERRIES_GROWTH_START_HOUR",
    "BERRIES_GROWTH_END_HOUR",
];

/// Fixed reference block describing attribute semantics and numeric
/// constraints, sent with every adjustment request.
pub const ATTRIBUTE_GUIDE: &str = r#"// === Animal Attributes ===

1. Breeding Age:
   - Purpose: Minimum age at which an animal can breed.
   - Constraints: Must be >= 0; set in subclass constructors.

2. Maximum Age:
   - Purpose: Age at which the animal dies of old age.
   - Constraints: Must be > breeding age.

3. Breeding Probability:
   - Purpose: Chance (0.0-1.0) of breeding per step.
   - Constraints: Double between 0.0-1.0.

4. Maximum Litter Size:
   - Purpose: Max offspring per breeding event.
   - Constraints: >= 1.

// === Plant Attributes ===

1. Growth Rate:
   - Purpose: Steps between growth stage increments.
   - Constraints: >= 0 (to avoid division by zero).

2. Reproduction Rate:
   - Purpose: Steps between reproduction attempts.
   - Constraints: >= 0.

3. Lifespan:
   - Purpose: Total steps before death (-1 = immortal).
   - Constraints: No upper limit except memory.

4. Spread Rate:
   - Purpose: Steps between spreading to adjacent tiles.
   - Constraints: >= 0 (0 disables spreading).

5. Growth Start/End Hour:
   - Purpose: Time window (0-23) for growth.
   - Constraints: Valid 24-hour format.

// === Creation Probability (All Entities) ===
- Purpose: Likelihood (0.0-1.0) of spawning during initialization.
- Constraints:
  - Double between 0.0 (never) and 1.0 (always).
  - Sum of probabilities per location should ideally be <= 1.0.

// === Global Constraints ===
1. Division by Zero: Plant growth/reproduction/spread rates must be >= 0 if used in modulo operations.
2. Immortality: Plants with lifespan = -1 bypass age checks.
3. Gender Logic: Animals require a mate of opposite gender nearby to breed."#;

/// Priming message carrying the full simulator codebase.
pub fn codebase_priming(codebase: &str) -> String {
    format!(
        "Here is the codebase for a predator-prey simulation, please analyse it to \
         understand the code:\n```\n{}\n```\n",
        codebase
    )
}

/// Build the adjustment request for one iteration.
pub fn adjustment_prompt(
    iteration: u32,
    counts: &CountMap,
    previous: Option<&Suggestion>,
) -> String {
    let mut prompt = format!(
        "Predator-prey simulation attribute adjustment task. This is iteration {}.\n\n\
         Simulation Goal: Achieve population stability and ecosystem balance.\n\n\
         Important Constraints (Do NOT violate):\n\
         - Plant growth rates and reproduction rates MUST be > 0.\n\n\
         Population Balance Analysis: Check for imbalances, especially plant dominance.\n\n\
         Current Entity Counts:\n```\n",
        iteration
    );
    for (name, count) in counts {
        prompt.push_str(&count.describe(name));
        prompt.push('\n');
    }
    prompt.push_str("```\n");

    if let Some(previous) = previous {
        prompt.push_str(&format!(
            "\nAttributes used in the previous simulation run (Iteration {}):\n```\n",
            iteration.saturating_sub(1)
        ));
        for line in previous.describe_attributes() {
            prompt.push_str(&line);
            prompt.push('\n');
        }
        prompt.push_str("```\n");
    }

    prompt.push_str("\n**Attribute Ranges and Constraints:**\n\n");
    prompt.push_str(ATTRIBUTE_GUIDE);

    prompt.push_str(
        "\n\nBased on the current entity counts, the population balance analysis, and the \
         attribute ranges and constraints above, suggest adjustments in JSON format to \
         improve long-term population stability and ecosystem balance. Aim to prevent any \
         population from collapsing, avoid division by zero errors, and reduce extreme \
         population imbalances, especially plant population dominance which is indicated \
         when plant populations are way higher than animal populations. Pay special \
         attention to Grouse and plant populations, and remember the constraint about \
         plant growth and reproduction rates not being zero. If there are population \
         imbalances, especially plant dominance, prioritize adjustments that control plant \
         populations (decreasing their creation, growth, or reproduction rates) or boost \
         animal populations (especially herbivores like Squirrels and Grouse, or their \
         predators if herbivore populations are too high).\n\n\
         Attributes to adjust (JSON response should ONLY include these):\n```json\n{\n",
    );
    for key in ADJUSTMENT_KEYS {
        prompt.push_str(&format!("  \"{}\": ...,\n", key));
    }
    prompt.push_str(
        "  \"reasoning\": \"...\"\n}\n```\n\n\
         Explain your reasoning for each suggested adjustment in the \"reasoning\" field, \
         and be concise. Specifically mention if you considered the division by zero \
         constraint for plant growth and reproduction rates, and if you addressed any \
         population imbalances, especially potential plant dominance.\n",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counts::EntityCount;

    #[test]
    fn prompt_embeds_counts_with_gender_breakdown() {
        let mut counts = CountMap::new();
        counts.insert("Wolves".into(), EntityCount::animal(12, 5, 7));
        counts.insert("Seeds".into(), EntityCount::plant(400));
        let prompt = adjustment_prompt(3, &counts, None);
        assert!(prompt.contains("This is iteration 3."));
        assert!(prompt.contains("- Wolves: Total=12, Male=5, Female=7"));
        assert!(prompt.contains("- Seeds: Total=400"));
        assert!(!prompt.contains("previous simulation run"));
    }

    #[test]
    fn prompt_includes_previous_attributes_when_present() {
        let mut previous = Suggestion::default();
        previous
            .attributes
            .insert("SEEDS_GROWTH_RATE".into(), serde_json::json!(4));
        let prompt = adjustment_prompt(2, &CountMap::new(), Some(&previous));
        assert!(prompt.contains("previous simulation run (Iteration 1)"));
        assert!(prompt.contains("- SEEDS_GROWTH_RATE: 4"));
    }

    #[test]
    fn prompt_enumerates_every_adjustment_key() {
        let prompt = adjustment_prompt(1, &CountMap::new(), None);
        for key in ADJUSTMENT_KEYS {
            assert!(prompt.contains(key), "missing {key}");
        }
        assert!(prompt.contains("\"reasoning\""));
    }
}
