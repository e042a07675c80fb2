// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The hot orchestrator's state, and the decision it reaches each tick.
//!
//! Mirrors `update(Msg, Model) -> (Model, Vec<Effect>)`. `NextAction` is a
//! tagged sum type for what happened, never a class hierarchy.

use crate::clock::Clock;
use crate::event::Event;
use crate::project::{Project, WebSocketConnection};

/// Where the orchestrator currently is between "watching" and "compiling".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotState {
    /// No pending filesystem events; nothing in flight.
    Idle,
    /// Events have arrived and the debounce timer is running; more events
    /// collapse into the same batch until the timer fires.
    DebouncePending { pending: Vec<Event> },
    /// A compile/postprocess batch is in flight for one or more outputs.
    Compiling,
    /// An `elm-watch.json` edit or dependency change requires tearing down
    /// and relaunching the whole run.
    Restarting,
}

/// What `getNextAction` decided to do with a settled batch of events.
#[derive(Debug, Clone, PartialEq)]
pub enum NextAction {
    /// Nothing settled yet; keep waiting.
    Wait,
    /// None of the batched events touched a file any enabled output depends
    /// on — print them to the timeline and go back to idle.
    PrintNonInterestingEvents { events: Vec<Event> },
    /// At least one event is relevant to an enabled output; compile it.
    Compile { events: Vec<Event> },
    /// The project configuration itself changed; restart the whole run.
    Restart { events: Vec<Event>, reasons: Vec<String> },
}

/// Top-level state for one `hot` run.
#[derive(Debug, Clone)]
pub struct Model<C: Clock> {
    pub clock: C,
    pub project: Project,
    pub hot_state: HotState,
    pub connections: Vec<WebSocketConnection>,
    next_timer_id: u64,
    next_connection_id: u64,
}

impl<C: Clock> Model<C> {
    pub fn new(clock: C, project: Project) -> Self {
        Self {
            clock,
            project,
            hot_state: HotState::Idle,
            connections: Vec::new(),
            next_timer_id: 0,
            next_connection_id: 0,
        }
    }

    pub fn next_timer_id(&mut self) -> crate::id::TimerId {
        let id = crate::id::TimerId::new(self.next_timer_id);
        self.next_timer_id += 1;
        id
    }

    pub fn next_connection_id(&mut self) -> crate::id::ConnectionId {
        let id = crate::id::ConnectionId::new(self.next_connection_id);
        self.next_connection_id += 1;
        id
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.hot_state, HotState::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use indexmap::IndexMap;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn empty_project() -> Project {
        Project {
            watch_root: PathBuf::from("/project"),
            config_path: PathBuf::from("/project/elm-watch.json"),
            elm_jsons: IndexMap::new(),
            elm_json_errors: Vec::new(),
            disabled_outputs: HashSet::new(),
        }
    }

    #[test]
    fn fresh_model_starts_idle_with_no_connections() {
        let model = Model::new(FakeClock::new(), empty_project());
        assert!(model.is_idle());
        assert!(model.connections.is_empty());
    }

    #[test]
    fn timer_and_connection_ids_are_distinct_and_increasing() {
        let mut model = Model::new(FakeClock::new(), empty_project());
        let t0 = model.next_timer_id();
        let t1 = model.next_timer_id();
        assert_ne!(t0, t1);
        let c0 = model.next_connection_id();
        assert_eq!(c0.0, 0);
    }
}
