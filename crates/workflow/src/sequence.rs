use serde::{Deserialize, Serialize};

use crate::Stage;

/// Identifies one outstanding request issued for a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTicket {
    pub stage: Stage,
    pub seq: u64,
}

/// Per-stage monotonically increasing request counters.
///
/// Only the most recently issued ticket of a stage is current. Invalidating
/// a stage bumps its counter so that every ticket already handed out for it
/// goes stale.
#[derive(Debug, Clone, Default)]
pub struct RequestSequencer {
    counters: [u64; 4],
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, stage: Stage) -> RequestTicket {
        let slot = &mut self.counters[stage.index()];
        *slot += 1;
        RequestTicket { stage, seq: *slot }
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.counters[ticket.stage.index()] == ticket.seq
    }

    pub fn invalidate(&mut self, stages: &[Stage]) {
        for st in stages {
            self.counters[st.index()] += 1;
        }
    }

    pub fn invalidate_all(&mut self) {
        self.invalidate(&Stage::ALL);
    }
}
