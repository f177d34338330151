//! The match engine: turn/phase state machine and trigger dispatch.
//!
//! A `Match` owns the entity registry, the variable store, and a
//! seeded RNG stream. Everything advances through `tick()`: one
//! command, one target of a multi-target command, or one state
//! transition per call. Suspension points are exactly those
//! boundaries, so external callers can interleave their own work (or
//! animation pacing) between steps and rely on multi-tick settling.
//!
//! Raising a trigger pushes frames onto an explicit stack: a `Raise`
//! frame holds the events still to deliver, a `Dispatch` frame the
//! FIFO of gathered rules for one event, a `Commands` frame one
//! running command list. The stack replaces coroutine nesting while
//! preserving its ordering: a card move's left-zone rules finish
//! before its entered-zone event is even gathered.

mod exec;
mod rule;
mod trigger;

pub use rule::{Rule, RuleData};
pub use trigger::TriggerLabel;

use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clause::ClauseError;
use crate::command::Command;
use crate::condition::ConditionNode;
use crate::core::{format_number, EvalContext, MatchRng, RuleId, VariableStore};
use crate::entities::{CardData, Game, ZoneData, ZonePlacement};

use exec::TargetLoop;

/// Everything needed to start a match.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct MatchSetup {
    #[serde(default)]
    pub match_number: u32,
    #[serde(default)]
    pub seed: u64,
    /// Phase names, cycled once per turn.
    pub phases: Vec<String>,
    #[serde(default)]
    pub cards: Vec<CardData>,
    #[serde(default)]
    pub zones: Vec<ZoneData>,
    #[serde(default)]
    pub rules: Vec<RuleData>,
}

/// Where the match currently is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchState {
    NotStarted,
    Setup,
    Started,
    TurnStart,
    PhaseStart,
    PhaseBody,
    PhaseEnd,
    TurnEnd,
    Ended,
}

/// What a `tick()` accomplished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickStatus {
    /// A command, target, or transition was processed.
    Working,
    /// The phase body is waiting for commands.
    Idle,
    /// The match has ended; further ticks do nothing.
    Finished,
}

/// One event waiting to be delivered, with the system variables it
/// sets on delivery.
#[derive(Debug)]
struct RaiseEvent {
    label: TriggerLabel,
    vars: Vec<(String, String)>,
}

/// A rule gathered for dispatch.
#[derive(Debug)]
struct Activation {
    rule: RuleId,
    run_else: bool,
}

/// One running command list.
#[derive(Debug)]
struct CommandRun {
    commands: Vec<Command>,
    index: usize,
    targets: Option<TargetLoop>,
    /// Id and name of the owning rule, if any.
    origin: Option<(RuleId, String)>,
    /// Raise `OnRuleActivated` on completion.
    activated: bool,
}

impl CommandRun {
    fn external(command: Command) -> Self {
        Self {
            commands: vec![command],
            index: 0,
            targets: None,
            origin: None,
            activated: false,
        }
    }

    fn finished(&self) -> bool {
        self.index >= self.commands.len() && self.targets.is_none()
    }
}

#[derive(Debug)]
enum Frame {
    Raise(VecDeque<RaiseEvent>),
    Dispatch(VecDeque<Activation>),
    Commands(CommandRun),
}

struct SubphaseLoop {
    names: Vec<String>,
    index: usize,
}

/// A raw listener: condition-gated observer fired synchronously when
/// its trigger is raised, before any rule dispatch for the same event.
struct Listener {
    trigger: TriggerLabel,
    condition: Option<ConditionNode>,
    action: Box<dyn FnMut(&Game, &VariableStore)>,
}

/// A running match.
pub struct Match {
    game: Game,
    vars: VariableStore,
    rng: MatchRng,
    phases: Vec<String>,
    state: MatchState,
    turn_number: u32,
    phase_index: usize,
    subphases: Option<SubphaseLoop>,
    subphase_pending: Option<Vec<String>>,
    pending: VecDeque<Command>,
    pending_hashes: FxHashSet<u64>,
    frames: Vec<Frame>,
    listeners: Vec<Listener>,
    end_phase: bool,
    end_subphase_loop: bool,
    end_match: bool,
    max_depth: Option<usize>,
}

impl Match {
    /// Build a match: assign entity ids, parse every rule clause once,
    /// seed the RNG. Ill-formed rules are logged and skipped.
    #[must_use]
    pub fn new(setup: &MatchSetup) -> Self {
        let mut game = Game::new();
        for zone in &setup.zones {
            game.add_zone(zone);
        }
        for card in &setup.cards {
            let id = game.add_card(card);
            if let Some(label) = &card.zone {
                match game.find_zone(label).map(|z| z.id.clone()) {
                    Some(zone) => {
                        game.move_card(&id, &zone, ZonePlacement::Top);
                    }
                    None => warn!(card = %id, zone = label, "starting zone not found"),
                }
            }
        }
        for data in &setup.rules {
            match Rule::from_data(data) {
                Ok(rule) => {
                    game.add_rule(rule);
                }
                Err(err) => warn!(rule = data.name, %err, "skipping ill-formed rule"),
            }
        }
        let mut vars = VariableStore::new();
        vars.set_system("matchNumber", format_number(f64::from(setup.match_number)));
        Self {
            game,
            vars,
            rng: MatchRng::new(setup.seed),
            phases: setup.phases.clone(),
            state: MatchState::NotStarted,
            turn_number: 0,
            phase_index: 0,
            subphases: None,
            subphase_pending: None,
            pending: VecDeque::new(),
            pending_hashes: FxHashSet::default(),
            frames: Vec::new(),
            listeners: Vec::new(),
            end_phase: false,
            end_subphase_loop: false,
            end_match: false,
            max_depth: None,
        }
    }

    /// Cap the frame stack; raises past the cap are logged and
    /// dropped. Default is unbounded: a rule set that triggers itself
    /// forever will spin forever, exactly as authored.
    pub fn set_max_depth(&mut self, depth: Option<usize>) {
        self.max_depth = depth;
    }

    // === Driving ===

    /// Advance by one unit of work.
    pub fn tick(&mut self) -> TickStatus {
        if !self.frames.is_empty() {
            self.step_frame();
            return TickStatus::Working;
        }
        if self.state == MatchState::Ended {
            return TickStatus::Finished;
        }
        if self.end_match {
            self.state = MatchState::Ended;
            self.raise(TriggerLabel::OnMatchEnded, Vec::new());
            return TickStatus::Working;
        }
        match self.state {
            MatchState::NotStarted => {
                self.state = MatchState::Setup;
                self.raise(TriggerLabel::OnMatchSetup, Vec::new());
            }
            MatchState::Setup => {
                self.state = MatchState::Started;
                self.raise(TriggerLabel::OnMatchStarted, Vec::new());
            }
            MatchState::Started | MatchState::TurnEnd => self.begin_turn(),
            MatchState::TurnStart => {
                self.phase_index = 0;
                if self.phases.is_empty() {
                    self.end_turn();
                } else {
                    self.begin_phase();
                }
            }
            MatchState::PhaseStart => {
                // Subphases have no body of their own: each re-enters
                // start/end so rules can fire, and the loop advances.
                if self.subphases.is_some() {
                    self.state = MatchState::PhaseEnd;
                    self.raise(TriggerLabel::OnPhaseEnded, Vec::new());
                } else {
                    self.state = MatchState::PhaseBody;
                }
            }
            MatchState::PhaseBody => return self.phase_body_tick(),
            MatchState::PhaseEnd => self.after_phase(),
            MatchState::Ended => unreachable!("handled above"),
        }
        TickStatus::Working
    }

    /// Tick until idle, finished, or `limit` ticks have passed.
    pub fn settle(&mut self, limit: usize) -> TickStatus {
        let mut status = TickStatus::Working;
        for _ in 0..limit {
            status = self.tick();
            if status != TickStatus::Working {
                break;
            }
        }
        status
    }

    fn begin_turn(&mut self) {
        self.turn_number += 1;
        self.vars
            .set_system("turnNumber", self.turn_number.to_string());
        self.state = MatchState::TurnStart;
        self.raise(TriggerLabel::OnTurnStarted, Vec::new());
    }

    fn end_turn(&mut self) {
        self.state = MatchState::TurnEnd;
        self.raise(TriggerLabel::OnTurnEnded, Vec::new());
    }

    fn begin_phase(&mut self) {
        let name = self.phases[self.phase_index].clone();
        self.vars.set_system("phase", name);
        self.state = MatchState::PhaseStart;
        self.raise(TriggerLabel::OnPhaseStarted, Vec::new());
    }

    fn begin_subphase(&mut self) {
        let Some(sub) = &self.subphases else { return };
        let name = sub.names[sub.index].clone();
        self.vars.set_system("subphase", name);
        self.state = MatchState::PhaseStart;
        self.raise(TriggerLabel::OnPhaseStarted, Vec::new());
    }

    fn phase_body_tick(&mut self) -> TickStatus {
        if self.end_phase {
            self.end_phase = false;
            self.state = MatchState::PhaseEnd;
            self.raise(TriggerLabel::OnPhaseEnded, Vec::new());
            return TickStatus::Working;
        }
        if let Some(names) = self.subphase_pending.take() {
            if !names.is_empty() {
                self.subphases = Some(SubphaseLoop { names, index: 0 });
                self.begin_subphase();
                return TickStatus::Working;
            }
        }
        if let Some(command) = self.pending.pop_front() {
            self.pending_hashes.remove(&command.structural_hash());
            self.frames.push(Frame::Commands(CommandRun::external(command)));
            return TickStatus::Working;
        }
        TickStatus::Idle
    }

    fn after_phase(&mut self) {
        if let Some(sub) = &mut self.subphases {
            if self.end_subphase_loop || self.end_match {
                self.end_subphase_loop = false;
                self.subphases = None;
                self.vars.set_system("subphase", "");
                // The outer phase's body resumes where the loop
                // interrupted it.
                self.state = MatchState::PhaseBody;
                return;
            }
            sub.index += 1;
            if sub.index >= sub.names.len() {
                sub.index = 0;
            }
            self.begin_subphase();
            return;
        }
        self.phase_index += 1;
        if self.phase_index >= self.phases.len() {
            self.end_turn();
        } else {
            self.begin_phase();
        }
    }

    // === Frames ===

    fn step_frame(&mut self) {
        match self.frames.pop() {
            None => {}
            Some(Frame::Raise(mut queue)) => {
                if let Some(event) = queue.pop_front() {
                    if !queue.is_empty() {
                        self.frames.push(Frame::Raise(queue));
                    }
                    self.process_raise(event);
                }
            }
            Some(Frame::Dispatch(mut queue)) => {
                if let Some(activation) = queue.pop_front() {
                    if !queue.is_empty() {
                        self.frames.push(Frame::Dispatch(queue));
                    }
                    self.dispatch(activation);
                }
            }
            Some(Frame::Commands(run)) => {
                if run.finished() {
                    self.finish_run(run);
                } else {
                    let mut run = run;
                    let raised = self.exec_step(&mut run);
                    self.frames.push(Frame::Commands(run));
                    if let Some(events) = raised {
                        self.frames.push(Frame::Raise(events));
                    }
                }
            }
        }
    }

    fn raise(&mut self, label: TriggerLabel, vars: Vec<(String, String)>) {
        self.frames
            .push(Frame::Raise(VecDeque::from([RaiseEvent { label, vars }])));
    }

    /// Deliver one event: set its system variables, fire listeners,
    /// gather matching rules, push their dispatch frame.
    fn process_raise(&mut self, event: RaiseEvent) {
        for (name, value) in &event.vars {
            self.vars.set_system(name, value.clone());
        }
        self.fire_listeners(event.label);
        if let Some(depth) = self.max_depth {
            if self.frames.len() >= depth {
                warn!(label = %event.label, depth, "frame stack cap reached, dropping raise");
                return;
            }
        }
        let mut queue = VecDeque::new();
        {
            let mut ctx = EvalContext::new(&self.game, &self.vars, &mut self.rng);
            for rule in self.game.all_rules() {
                if rule.trigger != event.label {
                    continue;
                }
                let pass = rule
                    .condition
                    .as_ref()
                    .map_or(true, |c| c.evaluate(&mut ctx));
                if pass {
                    queue.push_back(Activation {
                        rule: rule.id.clone(),
                        run_else: false,
                    });
                } else if !rule.else_commands.is_empty() {
                    queue.push_back(Activation {
                        rule: rule.id.clone(),
                        run_else: true,
                    });
                }
            }
        }
        if !queue.is_empty() {
            self.frames.push(Frame::Dispatch(queue));
        }
    }

    fn fire_listeners(&mut self, label: TriggerLabel) {
        for i in 0..self.listeners.len() {
            if self.listeners[i].trigger != label {
                continue;
            }
            let pass = {
                let mut ctx = EvalContext::new(&self.game, &self.vars, &mut self.rng);
                self.listeners[i]
                    .condition
                    .as_ref()
                    .map_or(true, |c| c.evaluate(&mut ctx))
            };
            if pass {
                (self.listeners[i].action)(&self.game, &self.vars);
            }
        }
    }

    fn dispatch(&mut self, activation: Activation) {
        let Some(rule) = self.game.rule(&activation.rule) else {
            return;
        };
        let commands = if activation.run_else {
            rule.else_commands.clone()
        } else {
            rule.commands.clone()
        };
        debug!(rule = %rule.id, name = rule.name, else_branch = activation.run_else, "dispatching rule");
        self.frames.push(Frame::Commands(CommandRun {
            commands,
            index: 0,
            targets: None,
            origin: Some((rule.id.clone(), rule.name.clone())),
            activated: !activation.run_else,
        }));
    }

    fn finish_run(&mut self, run: CommandRun) {
        if !run.activated {
            return;
        }
        let Some((id, name)) = run.origin else { return };
        self.frames.push(Frame::Raise(VecDeque::from([RaiseEvent {
            label: TriggerLabel::OnRuleActivated,
            vars: vec![
                ("rule".into(), id.as_str().to_string()),
                ("ruleName".into(), name),
            ],
        }])));
    }

    // === External command issue ===

    /// Parse and queue a command clause. Returns `Ok(false)` when a
    /// structurally identical command is already pending.
    pub fn enqueue(&mut self, clause: &str) -> Result<bool, ClauseError> {
        let command = Command::parse(clause)?;
        Ok(self.enqueue_command(command))
    }

    /// Queue an already-parsed command, unless its structural twin is
    /// already pending.
    pub fn enqueue_command(&mut self, command: Command) -> bool {
        let hash = command.structural_hash();
        if self.pending_hashes.contains(&hash) {
            debug!(verb = command.verb(), "duplicate pending command dropped");
            return false;
        }
        self.pending_hashes.insert(hash);
        self.pending.push_back(command);
        true
    }

    /// Queue a `UseCard` for the given card selector text.
    pub fn use_card(&mut self, selector: &str) -> Result<bool, ClauseError> {
        self.enqueue(&format!("UseCard({selector})"))
    }

    /// Queue a `UseZone` for the given zone selector text.
    pub fn use_zone(&mut self, selector: &str) -> Result<bool, ClauseError> {
        self.enqueue(&format!("UseZone({selector})"))
    }

    /// Queue a named action.
    pub fn use_action(&mut self, name: &str) -> Result<bool, ClauseError> {
        self.enqueue(&format!("UseAction({name})"))
    }

    /// Register a raw listener for a trigger, optionally gated by a
    /// condition clause.
    pub fn add_listener(
        &mut self,
        trigger: TriggerLabel,
        condition: Option<&str>,
        action: impl FnMut(&Game, &VariableStore) + 'static,
    ) -> Result<(), ClauseError> {
        let condition = condition.map(ConditionNode::parse).transpose()?;
        self.listeners.push(Listener {
            trigger,
            condition,
            action: Box::new(action),
        });
        Ok(())
    }

    // === Observation ===

    /// The entity registry.
    #[must_use]
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Mutable registry access for external setup between ticks.
    pub fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    /// The variable store.
    #[must_use]
    pub fn variables(&self) -> &VariableStore {
        &self.vars
    }

    /// Externally set a variable; reserved names are rejected with a
    /// warning.
    pub fn set_variable(&mut self, name: &str, value: impl Into<String>) -> bool {
        self.vars.set(name, value)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> MatchState {
        self.state
    }

    /// Current turn number, starting at 1.
    #[must_use]
    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    /// Name of the current phase, once the first has started.
    #[must_use]
    pub fn current_phase(&self) -> Option<&str> {
        self.vars.get("phase")
    }
}
