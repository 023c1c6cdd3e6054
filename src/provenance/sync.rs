use crate::provenance::{
    detail::SourceLine,
    panel::{PanelId, SharedPanel, StagePanel},
};
use std::{cell::RefCell, rc::Weak};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Synchronizing { line: SourceLine },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BroadcastReport {
    pub line: SourceLine,
    /// Panels that received the highlight.
    pub updated: Vec<PanelId>,
    /// Panels that were dropped or busy and got skipped.
    pub skipped: Vec<PanelId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HoverOutcome {
    /// The origin panel is not registered, was dropped, or is busy.
    UnknownPanel,
    /// The hovered row carries no source line; no panel was touched.
    NoSourceLine,
    Broadcast(BroadcastReport),
}

struct RegisteredPanel {
    id: PanelId,
    panel: Weak<RefCell<StagePanel>>,
}

/// Fans a hover in any panel out to every registered panel.
///
/// Holds only weak references: panels are owned by whoever created them and
/// silently drop out of broadcasts once released.
pub struct SyncController {
    panels: Vec<RegisteredPanel>,
    state: SyncState,
    last_line: Option<SourceLine>,
}

impl Default for SyncController {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncController {
    pub fn new() -> Self {
        Self {
            panels: Vec::new(),
            state: SyncState::Idle,
            last_line: None,
        }
    }

    pub fn register(&mut self, panel: &SharedPanel) {
        let id = panel.borrow().id();
        self.panels.retain(|registered| registered.id != id);
        self.panels.push(RegisteredPanel {
            id,
            panel: std::rc::Rc::downgrade(panel),
        });
    }

    pub fn unregister(&mut self, id: PanelId) {
        self.panels.retain(|registered| registered.id != id);
    }

    pub fn panel_ids(&self) -> Vec<PanelId> {
        self.panels.iter().map(|registered| registered.id).collect()
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Source line of the most recent broadcast.
    pub fn last_line(&self) -> Option<SourceLine> {
        self.last_line
    }

    pub fn on_hover(&mut self, origin: PanelId, row: usize) -> HoverOutcome {
        let Some(panel) = self
            .panels
            .iter()
            .find(|registered| registered.id == origin)
            .and_then(|registered| registered.panel.upgrade())
        else {
            tracing::debug!(%origin, "hover from unregistered panel");
            return HoverOutcome::UnknownPanel;
        };

        let line = match panel.try_borrow() {
            Ok(panel) => panel.resolve_hover_to_source_line(row),
            Err(_) => {
                tracing::warn!(%origin, "origin panel busy, hover dropped");
                return HoverOutcome::UnknownPanel;
            }
        };

        match line {
            Some(line) => {
                tracing::trace!(%origin, row, line, "hover resolved");
                HoverOutcome::Broadcast(self.broadcast(line))
            }
            None => {
                tracing::trace!(%origin, row, "hover over row without source line");
                HoverOutcome::NoSourceLine
            }
        }
    }

    /// Applies the highlight for `line` to every registered panel. A panel
    /// that cannot be updated is skipped; the others are still updated.
    pub fn broadcast(&mut self, line: SourceLine) -> BroadcastReport {
        self.state = SyncState::Synchronizing { line };
        let mut report = BroadcastReport {
            line,
            updated: Vec::new(),
            skipped: Vec::new(),
        };

        for registered in &self.panels {
            let Some(panel) = registered.panel.upgrade() else {
                report.skipped.push(registered.id);
                continue;
            };
            let borrowed = panel.try_borrow_mut();
            match borrowed {
                Ok(mut panel) => {
                    panel.apply_highlight(line);
                    report.updated.push(registered.id);
                }
                Err(_) => {
                    tracing::warn!(panel = %registered.id, line, "panel busy, highlight skipped");
                    report.skipped.push(registered.id);
                }
            }
        }

        tracing::debug!(
            line,
            updated = report.updated.len(),
            skipped = report.skipped.len(),
            "highlight broadcast"
        );
        self.last_line = Some(line);
        self.state = SyncState::Idle;
        report
    }
}
