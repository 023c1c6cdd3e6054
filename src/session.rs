use crate::{
    config::Config,
    provenance::{
        BroadcastReport, HoverOutcome, PanelId, PipelineReport, PipelineRunner, SharedPanel,
        SourceLine, StagePanel, SyncController,
    },
    view::render_panel,
};

/// Program shown when no file or inline code is given.
pub const SAMPLE_PROGRAM: &str = "\
// sum of the odd numbers below ten
let total = 0;
let i = 0;
while i < 10 {
    if i % 2 == 1 {
        total = total + i;
    }
    i = i + 1;
}
out(total);
out(2 * 3 + 1);
";

/// The configured panels wired to one pipeline and one hover controller.
pub struct Session {
    runner: PipelineRunner,
    sync: SyncController,
    panels: Vec<(String, SharedPanel)>,
    source_name: String,
    source: String,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        let mut runner = PipelineRunner::new();
        let mut sync = SyncController::new();
        let mut panels = Vec::with_capacity(config.stages.len());

        for (id, kind) in config.stages.iter().enumerate() {
            let panel = StagePanel::shared(PanelId(id), kind.title(), config.panel_height);
            sync.register(&panel);
            runner.add_stage(Box::new(*kind), SharedPanel::clone(&panel));
            panels.push((kind.name().to_string(), panel));
        }

        Self {
            runner,
            sync,
            panels,
            source_name: String::new(),
            source: String::new(),
        }
    }

    pub fn set_source(&mut self, name: impl Into<String>, source: impl Into<String>) -> PipelineReport {
        self.source_name = name.into();
        self.source = source.into();
        let report = self.runner.set_source(&self.source);
        tracing::info!(
            source = %self.source_name,
            generation = report.generation,
            failures = report.failures().count(),
            "source loaded"
        );
        report
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.runner.stage_names()
    }

    /// Finds a panel by stage name or by its position.
    pub fn find_panel(&self, key: &str) -> Option<PanelId> {
        if let Some(position) = self
            .panels
            .iter()
            .position(|(name, _)| name == key)
        {
            return Some(PanelId(position));
        }
        key.parse::<usize>()
            .ok()
            .filter(|position| *position < self.panels.len())
            .map(PanelId)
    }

    pub fn hover(&mut self, panel: PanelId, row: usize) -> HoverOutcome {
        self.sync.on_hover(panel, row)
    }

    /// Highlights `line` everywhere, as hovering that line in the source
    /// would.
    pub fn hover_line(&mut self, line: SourceLine) -> BroadcastReport {
        self.sync.broadcast(line)
    }

    pub fn render(&self, panel: PanelId) -> Option<String> {
        let (_, panel) = self.panels.get(panel.0)?;
        let panel = panel.try_borrow().ok()?;
        Some(render_panel(&panel))
    }

    pub fn render_all(&self) -> String {
        (0..self.panels.len())
            .filter_map(|position| self.render(PanelId(position)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
