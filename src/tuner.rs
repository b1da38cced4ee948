//! Tuning loop
//!
//! The top-level driver: compile, run, parse, evaluate, request an
//! adjustment, patch, recompile, repeat. Compile and run failures consume
//! an iteration rather than aborting; patch conversion and I/O failures
//! propagate out and end the run. The loop exits `Stable` on the first
//! pass with every animal population alive.

use crate::balance;
use crate::config::Config;
use crate::context;
use crate::counts;
use crate::llm::{Suggestion, SuggestionOracle};
use crate::patch::{self, RegexInjector};
use crate::report::TuningLog;
use crate::sim::{Invocation, Simulator};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Terminal state of a tuning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// All animal populations survived a pass.
    Stable { iterations: u32 },
    /// The iteration bound was reached first.
    TimedOut { iterations: u32 },
}

enum IterationStatus {
    Stable,
    Continue,
}

pub struct Tuner<O> {
    dir: PathBuf,
    sim: Simulator,
    oracle: O,
    config: Config,
}

impl<O: SuggestionOracle> Tuner<O> {
    pub fn new(dir: &Path, config: Config, oracle: O) -> Self {
        Self {
            dir: dir.to_path_buf(),
            sim: Simulator::new(dir, &config.compiler, &config.runner),
            oracle,
            config,
        }
    }

    /// Run the tuning loop to a terminal outcome.
    pub async fn run(&mut self, log: &mut TuningLog) -> Result<Outcome> {
        let dump = if self.config.send_codebase {
            context::codebase_dump(&self.dir)?
        } else {
            None
        };
        self.oracle.prime(dump.as_deref(), log).await?;

        let mut previous: Option<Suggestion> = None;
        let mut iteration = 0;

        while iteration < self.config.max_iterations {
            iteration += 1;
            log.note(&format!("\n----- Iteration {} -----", iteration));
            let started = Instant::now();

            let status = self.iterate(iteration, &mut previous, log).await?;

            if matches!(status, IterationStatus::Stable) {
                log.note("\nSimulation reached stability!");
                log.note(&format!("Stability achieved in {} iterations.", iteration));
                return Ok(Outcome::Stable { iterations: iteration });
            }

            log.note(&format!(
                "Iteration {} took {:.2} seconds",
                iteration,
                started.elapsed().as_secs_f64()
            ));
        }

        log.note(&format!(
            "\nStability not reached within {} iterations. Timed out.",
            self.config.max_iterations
        ));
        Ok(Outcome::TimedOut { iterations: iteration })
    }

    async fn iterate(
        &mut self,
        iteration: u32,
        previous: &mut Option<Suggestion>,
        log: &mut TuningLog,
    ) -> Result<IterationStatus> {
        match self.sim.compile()? {
            Invocation::Completed(_) => {}
            Invocation::Failed(stderr) => {
                log.note("Compilation was unsuccessful. Cannot run simulation.");
                log.note_quiet(&stderr);
                return Ok(IterationStatus::Continue);
            }
        }

        let stdout = match self.sim.run()? {
            Invocation::Completed(stdout) => stdout,
            Invocation::Failed(stderr) => {
                log.note("Simulation run failed.");
                log.note_quiet(&stderr);
                return Ok(IterationStatus::Continue);
            }
        };

        let counts = counts::parse_entity_counts(&stdout);
        if counts.is_empty() {
            log.note("Simulation produced no usable population data.");
            return Ok(IterationStatus::Continue);
        }

        log.note("\nEntity Counts:");
        for (name, count) in &counts {
            log.note(&count.describe(name));
        }

        match balance::check_population_balance(&counts) {
            Some(warning) => log.note(&format!("  [Population Balance Check] {}", warning)),
            None => log.note(
                "  [Population Balance Check] Population balance is within acceptable limits.",
            ),
        }

        let extinct = balance::extinct_animals(&counts);
        if extinct.is_empty() {
            log.note("  [Viability Check] Viable: All animal populations are present.");
            return Ok(IterationStatus::Stable);
        }
        log.note(&format!(
            "  [Viability Check] Unstable: {} populations dropped to zero.",
            extinct.join(", ")
        ));

        let suggestion = self
            .oracle
            .request_adjustments(iteration, &counts, previous.as_ref(), log)
            .await;

        let Some(mut suggestion) = suggestion else {
            log.note("Could not get attribute suggestions from the model.");
            return Ok(IterationStatus::Continue);
        };

        patch::apply_rate_floors(&mut suggestion, log);

        log.note("\nSuggested Attribute Adjustments:");
        for line in suggestion.describe_attributes() {
            log.note(&line);
        }
        if let Some(reasoning) = &suggestion.reasoning {
            log.note(&format!("\nReasoning: {}", reasoning));
        }

        patch::apply_suggestion(&self.dir, &suggestion, &RegexInjector, log)?;

        match self.sim.compile()? {
            Invocation::Completed(_) => {
                log.note("Recompilation successful after source modification.");
            }
            Invocation::Failed(stderr) => {
                log.note("Recompilation FAILED after source modification.");
                log.note_quiet(&stderr);
            }
        }

        // Retained as context for the next prompt even when nothing was
        // actually rewritten.
        *previous = Some(suggestion);

        Ok(IterationStatus::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counts::CountMap;
    use serde_json::json;
    use std::fs;

    struct StubOracle {
        primed: bool,
        requests: u32,
        canned: Option<Suggestion>,
    }

    impl StubOracle {
        fn silent() -> Self {
            Self {
                primed: false,
                requests: 0,
                canned: None,
            }
        }

        fn with_suggestion(suggestion: Suggestion) -> Self {
            Self {
                primed: false,
                requests: 0,
                canned: Some(suggestion),
            }
        }
    }

    impl SuggestionOracle for StubOracle {
        async fn prime(&mut self, _codebase: Option<&str>, _log: &mut TuningLog) -> Result<()> {
            self.primed = true;
            Ok(())
        }

        async fn request_adjustments(
            &mut self,
            _iteration: u32,
            _counts: &CountMap,
            _previous: Option<&Suggestion>,
            _log: &mut TuningLog,
        ) -> Option<Suggestion> {
            self.requests += 1;
            self.canned.clone()
        }
    }

    const VIABLE_TABLE: &str = "\
+-----------------+----------+--------+--------+
| Animal          | Total    | Male   | Female |
+-----------------+----------+--------+--------+
| Wolves          | 12       | 6      | 6      |
| Bobcats         | 9        | 4      | 5      |
| Squirrels       | 80       | 40     | 40     |
| Grouse          | 45       | 22     | 23     |
+-----------------+----------+--------+--------+
+-----------------+----------+
| Plant           | Total    |
+-----------------+----------+
| Seeds           | 400      |
| Berries         | 250      |
+-----------------+----------+
";

    const EXTINCT_TABLE: &str = "\
+-----------------+----------+--------+--------+
| Animal          | Total    | Male   | Female |
+-----------------+----------+--------+--------+
| Wolves          | 0        | 0      | 0      |
| Bobcats         | 9        | 4      | 5      |
| Squirrels       | 80       | 40     | 40     |
| Grouse          | 45       | 22     | 23     |
+-----------------+----------+--------+--------+
";

    fn test_config(max_iterations: u32) -> Config {
        Config {
            max_iterations,
            send_codebase: false,
            compiler: "true".to_string(),
            runner: "sh".to_string(),
            ..Config::default()
        }
    }

    /// Install a shell script named Main so `sh Main` stands in for the
    /// simulator run.
    fn install_main(dir: &Path, table: &str) {
        fs::write(
            dir.join("Main"),
            format!("cat <<'TABLE'\n{}TABLE\n", table),
        )
        .unwrap();
    }

    fn test_log(dir: &Path) -> TuningLog {
        TuningLog::create(&dir.join("tuning.txt")).unwrap()
    }

    #[tokio::test]
    async fn viable_first_pass_is_stable_without_a_suggestion_request() {
        let dir = tempfile::tempdir().unwrap();
        install_main(dir.path(), VIABLE_TABLE);
        let mut log = test_log(dir.path());

        let mut tuner = Tuner::new(dir.path(), test_config(5), StubOracle::silent());
        let outcome = tuner.run(&mut log).await.unwrap();

        assert_eq!(outcome, Outcome::Stable { iterations: 1 });
        assert!(tuner.oracle.primed);
        assert_eq!(tuner.oracle.requests, 0);
    }

    #[tokio::test]
    async fn persistent_extinction_times_out_at_the_bound() {
        let dir = tempfile::tempdir().unwrap();
        install_main(dir.path(), EXTINCT_TABLE);
        let mut log = test_log(dir.path());

        let mut tuner = Tuner::new(dir.path(), test_config(3), StubOracle::silent());
        let outcome = tuner.run(&mut log).await.unwrap();

        assert_eq!(outcome, Outcome::TimedOut { iterations: 3 });
        assert_eq!(tuner.oracle.requests, 3);
    }

    #[tokio::test]
    async fn compile_failure_consumes_iterations_without_running() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = test_log(dir.path());
        let mut config = test_config(2);
        config.compiler = "false".to_string();

        let mut tuner = Tuner::new(dir.path(), config, StubOracle::silent());
        let outcome = tuner.run(&mut log).await.unwrap();

        assert_eq!(outcome, Outcome::TimedOut { iterations: 2 });
        assert_eq!(tuner.oracle.requests, 0);
    }

    #[tokio::test]
    async fn run_failure_consumes_iterations_without_consulting_the_model() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Main"), "echo boom >&2\nexit 3\n").unwrap();
        let mut log = test_log(dir.path());

        let mut tuner = Tuner::new(dir.path(), test_config(2), StubOracle::silent());
        let outcome = tuner.run(&mut log).await.unwrap();

        assert_eq!(outcome, Outcome::TimedOut { iterations: 2 });
        assert_eq!(tuner.oracle.requests, 0);
        let transcript = fs::read_to_string(log.path()).unwrap();
        assert!(transcript.contains("Simulation run failed."));
        assert!(transcript.contains("boom"));
    }

    #[tokio::test]
    async fn suggestion_is_floored_patched_and_retained() {
        let dir = tempfile::tempdir().unwrap();
        install_main(dir.path(), EXTINCT_TABLE);
        fs::write(
            dir.path().join("Seeds.java"),
            "class Seeds { private static final int GROWTH_RATE = 5; }\n",
        )
        .unwrap();
        let mut log = test_log(dir.path());

        let mut suggestion = Suggestion::default();
        suggestion
            .attributes
            .insert("SEEDS_GROWTH_RATE".to_string(), json!(0));
        let mut tuner = Tuner::new(
            dir.path(),
            test_config(1),
            StubOracle::with_suggestion(suggestion),
        );
        let outcome = tuner.run(&mut log).await.unwrap();
        drop(log);

        assert_eq!(outcome, Outcome::TimedOut { iterations: 1 });
        let seeds = fs::read_to_string(dir.path().join("Seeds.java")).unwrap();
        assert!(seeds.contains("GROWTH_RATE = 1;"));
        let log_text = fs::read_to_string(dir.path().join("tuning.txt")).unwrap();
        assert!(log_text.contains("SEEDS_GROWTH_RATE=0, corrected to 1"));
        assert!(log_text.contains("Recompilation successful"));
    }
}
