use crate::provenance::{
    detail::Detail,
    error::{InvalidRange, StageTransformError},
    panel::{PanelId, SharedPanel},
};
use std::rc::Rc;

/// Monotonic number of a source snapshot handed to the pipeline.
pub type Generation = u64;

/// A transformation that turns source text into an ordered detail sequence.
pub trait Stage {
    fn name(&self) -> &str;

    fn transform(&self, source: &str) -> Result<Vec<Detail>, StageTransformError>;
}

/// Source text captured by [`PipelineRunner::begin`].
#[derive(Clone, Debug)]
pub struct SourceSnapshot {
    pub generation: Generation,
    pub text: Rc<str>,
}

pub struct StageResult {
    pub stage: usize,
    pub result: Result<Vec<Detail>, StageTransformError>,
}

/// Finished transforms for one snapshot, waiting to be applied.
pub struct CompletedRun {
    pub generation: Generation,
    pub results: Vec<StageResult>,
}

#[derive(Debug)]
pub enum StageOutcome {
    Rendered { details: usize },
    Failed(StageTransformError),
    Rejected(InvalidRange),
    /// A newer snapshot already reached this panel; the result was dropped.
    Stale { newer: Generation },
    /// The panel was borrowed elsewhere and could not be updated.
    PanelBusy,
}

#[derive(Debug)]
pub struct PipelineReport {
    pub generation: Generation,
    pub outcomes: Vec<(String, StageOutcome)>,
}

impl PipelineReport {
    pub fn outcome(&self, stage: &str) -> Option<&StageOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == stage)
            .map(|(_, outcome)| outcome)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &StageOutcome)> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| {
                matches!(outcome, StageOutcome::Failed(_) | StageOutcome::Rejected(_))
            })
            .map(|(name, outcome)| (name.as_str(), outcome))
    }
}

struct StageBinding {
    stage: Box<dyn Stage>,
    panel_id: PanelId,
    panel: SharedPanel,
    /// Newest snapshot whose result (success or failure) reached the panel.
    applied: Option<Generation>,
}

/// Feeds each source snapshot through every stage and renders the results
/// into the stage's panel.
///
/// Running is split in three steps (`begin`, `run`, `complete`) so a caller
/// that transforms asynchronously can finish runs out of order; a result is
/// only applied if no newer snapshot has reached that panel yet.
#[derive(Default)]
pub struct PipelineRunner {
    bindings: Vec<StageBinding>,
    issued: Generation,
}

impl PipelineRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stage(&mut self, stage: Box<dyn Stage>, panel: SharedPanel) {
        let panel_id = panel.borrow().id();
        self.bindings.push(StageBinding {
            stage,
            panel_id,
            panel,
            applied: None,
        });
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.bindings
            .iter()
            .map(|binding| binding.stage.name())
            .collect()
    }

    pub fn panels(&self) -> Vec<SharedPanel> {
        self.bindings
            .iter()
            .map(|binding| Rc::clone(&binding.panel))
            .collect()
    }

    pub fn panel(&self, id: PanelId) -> Option<SharedPanel> {
        self.bindings
            .iter()
            .find(|binding| binding.panel_id == id)
            .map(|binding| Rc::clone(&binding.panel))
    }

    pub fn latest_generation(&self) -> Generation {
        self.issued
    }

    /// Runs every stage on `text` and applies the results.
    pub fn set_source(&mut self, text: &str) -> PipelineReport {
        let snapshot = self.begin(text);
        let run = self.run(&snapshot);
        self.complete(run)
    }

    pub fn begin(&mut self, text: &str) -> SourceSnapshot {
        self.issued += 1;
        tracing::debug!(generation = self.issued, bytes = text.len(), "source snapshot");
        SourceSnapshot {
            generation: self.issued,
            text: Rc::from(text),
        }
    }

    pub fn run(&self, snapshot: &SourceSnapshot) -> CompletedRun {
        CompletedRun {
            generation: snapshot.generation,
            results: (0..self.bindings.len())
                .map(|stage| self.run_stage(snapshot, stage))
                .collect(),
        }
    }

    pub fn run_stage(&self, snapshot: &SourceSnapshot, stage: usize) -> StageResult {
        let result = match self.bindings.get(stage) {
            Some(binding) => binding.stage.transform(&snapshot.text),
            None => Err(StageTransformError::new(
                format!("#{stage}"),
                "no such stage registered",
            )),
        };
        StageResult { stage, result }
    }

    pub fn complete(&mut self, run: CompletedRun) -> PipelineReport {
        let generation = run.generation;
        let mut outcomes = Vec::with_capacity(run.results.len());

        for StageResult { stage, result } in run.results {
            let Some(binding) = self.bindings.get_mut(stage) else {
                continue;
            };
            let name = binding.stage.name().to_string();
            let outcome = apply(binding, generation, result);
            match &outcome {
                StageOutcome::Rendered { details } => {
                    tracing::debug!(stage = %name, generation, details, "stage rendered");
                }
                StageOutcome::Failed(err) => {
                    tracing::warn!(stage = %name, generation, error = %err.summary(), "stage failed");
                }
                StageOutcome::Rejected(err) => {
                    tracing::warn!(stage = %name, generation, error = %err, "stage output rejected");
                }
                StageOutcome::Stale { newer } => {
                    tracing::warn!(stage = %name, generation, newer, "dropping stale stage output");
                }
                StageOutcome::PanelBusy => {
                    tracing::warn!(stage = %name, generation, "panel busy, stage output dropped");
                }
            }
            outcomes.push((name, outcome));
        }

        PipelineReport {
            generation,
            outcomes,
        }
    }
}

fn apply(
    binding: &mut StageBinding,
    generation: Generation,
    result: Result<Vec<Detail>, StageTransformError>,
) -> StageOutcome {
    if let Some(newer) = binding.applied.filter(|applied| *applied > generation) {
        return StageOutcome::Stale { newer };
    }
    let Ok(mut panel) = binding.panel.try_borrow_mut() else {
        return StageOutcome::PanelBusy;
    };
    binding.applied = Some(generation);

    match result {
        Ok(details) => {
            let count = details.len();
            match panel.render(details) {
                Ok(()) => StageOutcome::Rendered { details: count },
                Err(err) => {
                    panel.mark_failed(err.to_string());
                    StageOutcome::Rejected(err)
                }
            }
        }
        Err(err) => {
            panel.mark_failed(err.summary());
            StageOutcome::Failed(err)
        }
    }
}
