//! Background search agents.
//!
//! `Scheduler` is the pure registry/state machine: it decides which agents
//! are due, marks them running, and folds execution outcomes back into the
//! agent records. `SchedulerService` wires it to the clock and persistence
//! ports and can drive a whole tick against a `QueryExecutor`.
//!
//! An agent is never executed concurrently with itself: a tick that finds
//! the agent still running skips it outright.

use std::collections::{BTreeSet, HashSet};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::agent::{Agent, AgentDraft, ValidationError};
use crate::constants::AGENT_PALETTE;
use crate::persist::{KeyValueStore, PersistError, load_agents, save_agents};
use crate::ranking::ResultRecord;
use crate::search::{ExecutionError, QueryExecutor, QueryRequest};
use crate::time::{Clock, Timestamp};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentState {
    Inactive,
    ActiveIdle,
    ActiveRunning,
}

/// Payload routed to the notification sink.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Notification {
    NewResults {
        agent_id: Uuid,
        new_results_count: usize,
    },
    ExecutionFailed {
        agent_id: Uuid,
        error: String,
    },
}

impl Notification {
    pub fn agent_id(&self) -> Uuid {
        match self {
            Self::NewResults { agent_id, .. } | Self::ExecutionFailed { agent_id, .. } => {
                *agent_id
            }
        }
    }
}

pub trait NotificationSink {
    fn notify(&self, notification: Notification);
}

impl<F: Fn(Notification)> NotificationSink for F {
    fn notify(&self, notification: Notification) {
        self(notification)
    }
}

/// Sink that keeps everything it receives.
#[derive(Debug, Default)]
pub struct CollectingSink {
    received: Mutex<Vec<Notification>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.received.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl NotificationSink for CollectingSink {
    fn notify(&self, notification: Notification) {
        self.received
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification);
    }
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no agent with id {0}")]
    UnknownAgent(Uuid),
    #[error("agent {0} is already running")]
    AlreadyRunning(Uuid),
    #[error(transparent)]
    Persistence(#[from] PersistError),
}

/// One agent execution handed out by the scheduler.
#[derive(Clone, Debug, PartialEq)]
pub struct Dispatch {
    pub agent_id: Uuid,
    pub request: QueryRequest,
}

/// What a scheduler pass decided.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickPlan {
    pub dispatches: Vec<Dispatch>,
    /// Due agents whose previous execution was still in flight.
    pub skipped_running: Vec<Uuid>,
}

/// Summary of a tick driven end to end by `SchedulerService::run_tick`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub dispatched: usize,
    pub skipped_running: usize,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    agents: Vec<Agent>,
    running: HashSet<Uuid>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_agents(agents: Vec<Agent>) -> Self {
        Self {
            agents,
            running: HashSet::new(),
        }
    }

    /// Adopt a registry written elsewhere. Running flags are kept only for
    /// agents that are still present.
    pub fn replace_agents(&mut self, agents: Vec<Agent>) {
        self.running.retain(|id| agents.iter().any(|a| a.id == *id));
        self.agents = agents;
    }

    /// Agents in registry (creation) order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn get(&self, id: Uuid) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    fn get_mut(&mut self, id: Uuid) -> Result<&mut Agent, SchedulerError> {
        self.agents
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(SchedulerError::UnknownAgent(id))
    }

    pub fn is_running(&self, id: Uuid) -> bool {
        self.running.contains(&id)
    }

    pub fn state(&self, id: Uuid) -> Option<AgentState> {
        let agent = self.get(id)?;
        Some(if !agent.active {
            AgentState::Inactive
        } else if self.is_running(id) {
            AgentState::ActiveRunning
        } else {
            AgentState::ActiveIdle
        })
    }

    /// When the agent next becomes eligible; `None` for inactive or
    /// unknown agents.
    pub fn next_due(&self, id: Uuid) -> Option<Timestamp> {
        self.get(id).filter(|a| a.active).map(Agent::due_at)
    }

    pub fn create_agent(
        &mut self,
        draft: AgentDraft,
        now: Timestamp,
    ) -> Result<&Agent, ValidationError> {
        let color = AGENT_PALETTE[self.agents.len() % AGENT_PALETTE.len()];
        let agent = Agent::create(draft, now, color)?;
        self.agents.push(agent);
        Ok(&self.agents[self.agents.len() - 1])
    }

    /// Flip `active`. Run history is left untouched. Returns the new value.
    pub fn toggle_agent(&mut self, id: Uuid) -> Result<bool, SchedulerError> {
        let agent = self.get_mut(id)?;
        agent.active = !agent.active;
        Ok(agent.active)
    }

    /// Remove the agent. A completion arriving for it later is discarded.
    pub fn delete_agent(&mut self, id: Uuid) -> Result<Agent, SchedulerError> {
        let idx = self
            .agents
            .iter()
            .position(|a| a.id == id)
            .ok_or(SchedulerError::UnknownAgent(id))?;
        self.running.remove(&id);
        Ok(self.agents.remove(idx))
    }

    /// One scheduler pass: every active agent whose cadence elapsed is
    /// marked running and dispatched, in registry order.
    pub fn begin_tick(&mut self, now: Timestamp) -> TickPlan {
        let mut plan = TickPlan::default();
        for agent in self.agents.iter().filter(|a| a.active && a.is_due(now)) {
            if self.running.contains(&agent.id) {
                plan.skipped_running.push(agent.id);
                continue;
            }
            plan.dispatches.push(Dispatch {
                agent_id: agent.id,
                request: agent.query_request(now),
            });
        }
        for dispatch in &plan.dispatches {
            self.running.insert(dispatch.agent_id);
        }
        plan
    }

    /// Dispatch an agent immediately, ignoring its cadence and `active`.
    pub fn begin_run_now(&mut self, id: Uuid, now: Timestamp) -> Result<Dispatch, SchedulerError> {
        let agent = self.get(id).ok_or(SchedulerError::UnknownAgent(id))?;
        if self.running.contains(&id) {
            return Err(SchedulerError::AlreadyRunning(id));
        }
        let dispatch = Dispatch {
            agent_id: id,
            request: agent.query_request(now),
        };
        self.running.insert(id);
        Ok(dispatch)
    }

    /// Fold an execution outcome into the agent and clear its running flag.
    ///
    /// Success advances `last_run` to `now` and replaces the remembered ids;
    /// failure leaves `last_run` alone so the next eligible tick retries.
    pub fn complete(
        &mut self,
        agent_id: Uuid,
        outcome: Result<Vec<ResultRecord>, ExecutionError>,
        now: Timestamp,
    ) -> Option<Notification> {
        self.running.remove(&agent_id);
        let agent = self.agents.iter_mut().find(|a| a.id == agent_id)?;

        match outcome {
            Ok(results) => {
                let ids: BTreeSet<Uuid> = results.iter().map(|r| r.id).collect();
                let new_count = agent.count_new(&ids);
                agent.last_result_ids = Some(ids);
                agent.last_run = Some(now);
                (new_count > 0 && agent.notify_on_results).then_some(Notification::NewResults {
                    agent_id,
                    new_results_count: new_count,
                })
            }
            Err(e) => Some(Notification::ExecutionFailed {
                agent_id,
                error: e.to_string(),
            }),
        }
    }
}

/// Scheduler bound to its clock and persistence ports.
///
/// The store is the source of truth: every operation re-reads the agent
/// list first, so agents created, toggled or deleted through another
/// handle on the same store are honored by a long-running service.
pub struct SchedulerService<C, K> {
    scheduler: Scheduler,
    clock: C,
    store: K,
    skipped_on_load: usize,
}

impl<C: Clock, K: KeyValueStore> SchedulerService<C, K> {
    /// Load persisted agents. Entries that no longer parse are dropped.
    pub fn new(clock: C, store: K) -> Result<Self, SchedulerError> {
        let loaded = load_agents(&store)?;
        Ok(Self {
            scheduler: Scheduler::from_agents(loaded.items),
            clock,
            store,
            skipped_on_load: loaded.skipped,
        })
    }

    fn reload(&mut self) -> Result<(), SchedulerError> {
        let loaded = load_agents(&self.store)?;
        self.skipped_on_load = loaded.skipped;
        self.scheduler.replace_agents(loaded.items);
        Ok(())
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn agents(&self) -> &[Agent] {
        self.scheduler.agents()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    /// Unreadable entries dropped by the most recent load.
    pub fn skipped_on_load(&self) -> usize {
        self.skipped_on_load
    }

    pub fn state(&self, id: Uuid) -> Option<AgentState> {
        self.scheduler.state(id)
    }

    pub fn next_due(&self, id: Uuid) -> Option<Timestamp> {
        self.scheduler.next_due(id)
    }

    fn persist(&self) -> Result<(), SchedulerError> {
        save_agents(&self.store, self.scheduler.agents())?;
        Ok(())
    }

    /// Validate, register and persist. Nothing is kept when validation or
    /// the write fails.
    pub fn create_agent(&mut self, draft: AgentDraft) -> Result<Agent, SchedulerError> {
        self.reload()?;
        let now = self.clock.now();
        let agent = self.scheduler.create_agent(draft, now)?.clone();
        if let Err(e) = self.persist() {
            self.scheduler.delete_agent(agent.id)?;
            return Err(e);
        }
        Ok(agent)
    }

    pub fn toggle_agent(&mut self, id: Uuid) -> Result<bool, SchedulerError> {
        self.reload()?;
        let active = self.scheduler.toggle_agent(id)?;
        self.persist()?;
        Ok(active)
    }

    pub fn delete_agent(&mut self, id: Uuid) -> Result<Agent, SchedulerError> {
        self.reload()?;
        let agent = self.scheduler.delete_agent(id)?;
        self.persist()?;
        Ok(agent)
    }

    /// Plan a tick against the agents currently in the store.
    pub fn begin_tick(&mut self) -> Result<TickPlan, SchedulerError> {
        self.reload()?;
        let now = self.clock.now();
        Ok(self.scheduler.begin_tick(now))
    }

    pub fn begin_run_now(&mut self, id: Uuid) -> Result<Dispatch, SchedulerError> {
        self.reload()?;
        let now = self.clock.now();
        self.scheduler.begin_run_now(id, now)
    }

    /// Fold an outcome into the freshly loaded registry, deliver its
    /// notification, then persist. Outcomes for agents deleted in the
    /// meantime are dropped. The sink sees the notification even when the
    /// write fails.
    pub fn complete<N: NotificationSink + ?Sized>(
        &mut self,
        dispatch: &Dispatch,
        outcome: Result<Vec<ResultRecord>, ExecutionError>,
        sink: &N,
    ) -> Result<Option<Notification>, SchedulerError> {
        let reloaded = self.reload();
        let now = self.clock.now();
        // Clears the running flag even when the reload failed.
        let notification = self.scheduler.complete(dispatch.agent_id, outcome, now);
        if let Some(n) = &notification {
            sink.notify(n.clone());
        }
        reloaded?;
        if self.scheduler.get(dispatch.agent_id).is_some() {
            self.persist()?;
        }
        Ok(notification)
    }

    /// Run every due agent to completion, one after another.
    pub async fn run_tick<E, N>(
        &mut self,
        executor: &E,
        sink: &N,
    ) -> Result<TickReport, SchedulerError>
    where
        E: QueryExecutor,
        N: NotificationSink + ?Sized,
    {
        let plan = self.begin_tick()?;
        self.drive(plan, executor, sink).await
    }

    /// Execute one agent now, cadence notwithstanding.
    pub async fn run_now<E, N>(
        &mut self,
        id: Uuid,
        executor: &E,
        sink: &N,
    ) -> Result<Option<Notification>, SchedulerError>
    where
        E: QueryExecutor,
        N: NotificationSink + ?Sized,
    {
        let dispatch = self.begin_run_now(id)?;
        let outcome = executor.execute(&dispatch.request).await;
        self.complete(&dispatch, outcome, sink)
    }

    async fn drive<E, N>(
        &mut self,
        plan: TickPlan,
        executor: &E,
        sink: &N,
    ) -> Result<TickReport, SchedulerError>
    where
        E: QueryExecutor,
        N: NotificationSink + ?Sized,
    {
        let mut report = TickReport {
            dispatched: plan.dispatches.len(),
            skipped_running: plan.skipped_running.len(),
            notifications: Vec::new(),
        };
        let mut first_error = None;

        for dispatch in &plan.dispatches {
            let outcome = executor.execute(&dispatch.request).await;
            match self.complete(dispatch, outcome, sink) {
                Ok(Some(n)) => report.notifications.push(n),
                Ok(None) => {}
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }
}
