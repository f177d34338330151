//! Command execution.
//!
//! Commands parse into pure data; the bindings to registry access
//! live here, on `Match`, so a command list can be parsed long before
//! a match exists. `exec_step` performs one unit of work: one simple
//! command, or one target of a multi-target move/use. Returned raise
//! events are delivered by the frame stack before the next unit runs.

use std::collections::VecDeque;

use tracing::warn;

use crate::command::{CommandKind, MoveOptions};
use crate::core::{format_number, is_reserved, CardId, EvalContext, Value, ZoneId};
use crate::entities::{RevealState, ZonePlacement};
use crate::getter::Getter;

use super::{CommandRun, Match, RaiseEvent, TriggerLabel};

/// Per-target worklist of a multi-target command.
#[derive(Debug)]
pub(super) enum TargetLoop {
    Move {
        cards: VecDeque<CardId>,
        zone: ZoneId,
        options: MoveOptions,
    },
    UseCards(VecDeque<CardId>),
    UseZones(VecDeque<ZoneId>),
}

impl Match {
    /// One unit of work from a command run. Returns the events the
    /// unit raised, in delivery order.
    pub(super) fn exec_step(&mut self, run: &mut CommandRun) -> Option<VecDeque<RaiseEvent>> {
        if run.targets.is_none() {
            let raised = self.begin_command(run);
            if run.targets.is_none() {
                return raised;
            }
        }
        self.process_target(run)
    }

    /// Execute a simple command outright, or resolve a multi-target
    /// command's worklist.
    fn begin_command(&mut self, run: &mut CommandRun) -> Option<VecDeque<RaiseEvent>> {
        let command = run.commands[run.index].clone();
        match command.kind {
            CommandKind::EndCurrentPhase => {
                run.index += 1;
                self.end_phase = true;
                None
            }
            CommandKind::EndTheMatch => {
                run.index += 1;
                self.end_match = true;
                None
            }
            CommandKind::EndSubphaseLoop => {
                run.index += 1;
                self.end_subphase_loop = true;
                None
            }
            CommandKind::StartSubphaseLoop { phases } => {
                run.index += 1;
                self.subphase_pending = Some(phases);
                None
            }
            CommandKind::UseAction { name } => {
                run.index += 1;
                let text = self.eval(&name).as_text();
                Some(one_event(
                    TriggerLabel::OnActionUsed,
                    vec![("actionName".into(), text)],
                ))
            }
            CommandKind::SendMessage { message } => {
                run.index += 1;
                let text = self.eval(&message).as_text();
                Some(one_event(
                    TriggerLabel::OnMessageSent,
                    vec![("message".into(), text)],
                ))
            }
            CommandKind::SetVariable {
                name,
                value,
                min,
                max,
            } => {
                run.index += 1;
                self.exec_set_variable(&name, &value, min.as_ref(), max.as_ref())
            }
            CommandKind::SetCardFieldValue {
                cards,
                field,
                value,
                min,
                max,
            } => {
                run.index += 1;
                self.exec_set_field(&cards, &field, &value, min.as_ref(), max.as_ref());
                None
            }
            CommandKind::Shuffle { zones } => {
                run.index += 1;
                let targets = {
                    let mut ctx = EvalContext::new(&self.game, &self.vars, &mut self.rng);
                    zones.zones(&mut ctx)
                };
                for zone in targets {
                    self.game.shuffle_zone(&zone, &mut self.rng);
                }
                None
            }
            CommandKind::AddTagToCard { cards, tag } => {
                run.index += 1;
                for id in self.resolve_cards(&cards) {
                    if let Some(card) = self.game.card_mut(&id) {
                        card.add_tag(&tag);
                    }
                }
                None
            }
            CommandKind::RemoveTagFromCard { cards, tag } => {
                run.index += 1;
                for id in self.resolve_cards(&cards) {
                    if let Some(card) = self.game.card_mut(&id) {
                        card.remove_tag(&tag);
                    }
                }
                None
            }
            CommandKind::UseCard { cards } => {
                let targets = self.resolve_cards(&cards);
                if targets.is_empty() {
                    run.index += 1;
                } else {
                    run.targets = Some(TargetLoop::UseCards(targets.into()));
                }
                None
            }
            CommandKind::UseZone { zones } => {
                let targets = {
                    let mut ctx = EvalContext::new(&self.game, &self.vars, &mut self.rng);
                    zones.zones(&mut ctx)
                };
                if targets.is_empty() {
                    run.index += 1;
                } else {
                    run.targets = Some(TargetLoop::UseZones(targets.into()));
                }
                None
            }
            CommandKind::MoveCardToZone {
                cards,
                zone,
                options,
            } => {
                let (mut targets, dest) = {
                    let mut ctx = EvalContext::new(&self.game, &self.vars, &mut self.rng);
                    (cards.cards(&mut ctx), zone.zones(&mut ctx).into_iter().next())
                };
                let Some(dest) = dest else {
                    warn!("move destination selected no zone");
                    run.index += 1;
                    return None;
                };
                if targets.is_empty() {
                    run.index += 1;
                    return None;
                }
                if options.keep_order {
                    // Insertion happens one card at a time, so the
                    // iteration order decides the final stacking.
                    targets.sort_by_key(|id| {
                        let pos = self.game.position_in_zone(id).map_or(-1, |p| p as i64);
                        if options.to_bottom {
                            -pos
                        } else {
                            pos
                        }
                    });
                }
                run.targets = Some(TargetLoop::Move {
                    cards: targets.into(),
                    zone: dest,
                    options,
                });
                None
            }
        }
    }

    /// Move or use one target, raising its per-card events.
    fn process_target(&mut self, run: &mut CommandRun) -> Option<VecDeque<RaiseEvent>> {
        let Some(targets) = &mut run.targets else {
            return None;
        };
        let raised = match targets {
            TargetLoop::Move {
                cards,
                zone,
                options,
            } => cards.pop_front().and_then(|card| {
                let old = self.game.card(&card).and_then(|c| c.zone.clone());
                let placement = match (options.slot, options.to_bottom) {
                    (Some(slot), _) => ZonePlacement::Slot(slot),
                    (None, true) => ZonePlacement::Bottom,
                    (None, false) => ZonePlacement::Top,
                };
                if !self.game.move_card(&card, zone, placement) {
                    return None;
                }
                if let Some(face_up) = options.reveal {
                    if let Some(c) = self.game.card_mut(&card) {
                        c.reveal = if face_up {
                            RevealState::FaceUp
                        } else {
                            RevealState::FaceDown
                        };
                    }
                }
                let vars = vec![
                    ("movedCard".into(), card.as_str().to_string()),
                    (
                        "oldZone".into(),
                        old.as_ref().map(|z| z.as_str().to_string()).unwrap_or_default(),
                    ),
                    ("newZone".into(), zone.as_str().to_string()),
                ];
                let mut events = VecDeque::new();
                if old.is_some() {
                    events.push_back(RaiseEvent {
                        label: TriggerLabel::OnCardLeftZone,
                        vars: vars.clone(),
                    });
                }
                events.push_back(RaiseEvent {
                    label: TriggerLabel::OnCardEnteredZone,
                    vars,
                });
                Some(events)
            }),
            TargetLoop::UseCards(cards) => cards.pop_front().map(|card| {
                one_event(
                    TriggerLabel::OnCardUsed,
                    vec![("usedCard".into(), card.as_str().to_string())],
                )
            }),
            TargetLoop::UseZones(zones) => zones.pop_front().map(|zone| {
                one_event(
                    TriggerLabel::OnZoneUsed,
                    vec![("usedZone".into(), zone.as_str().to_string())],
                )
            }),
        };
        let exhausted = match &run.targets {
            Some(TargetLoop::Move { cards, .. }) => cards.is_empty(),
            Some(TargetLoop::UseCards(cards)) => cards.is_empty(),
            Some(TargetLoop::UseZones(zones)) => zones.is_empty(),
            None => true,
        };
        if exhausted {
            run.targets = None;
            run.index += 1;
        }
        raised
    }

    fn exec_set_variable(
        &mut self,
        name: &str,
        value: &Getter,
        min: Option<&Getter>,
        max: Option<&Getter>,
    ) -> Option<VecDeque<RaiseEvent>> {
        if is_reserved(name) {
            warn!(name, "refusing to set reserved variable");
            return None;
        }
        let (resolved, lo, hi) = {
            let mut ctx = EvalContext::new(&self.game, &self.vars, &mut self.rng);
            (
                value.get(&mut ctx),
                min.and_then(|g| g.get(&mut ctx).as_number()),
                max.and_then(|g| g.get(&mut ctx).as_number()),
            )
        };
        let encoded = match value.relative {
            Some(op) => {
                let Some(operand) = resolved.as_number() else {
                    warn!(name, "relative update with non-numeric operand");
                    return None;
                };
                let current = self.vars.get_num(name).unwrap_or(0.0);
                format_number(clamp(op.apply(current, operand), lo, hi))
            }
            None => match resolved.as_number() {
                Some(n) => format_number(clamp(n, lo, hi)),
                None => resolved.as_text(),
            },
        };
        if !self.vars.set(name, encoded.clone()) {
            return None;
        }
        Some(one_event(
            TriggerLabel::OnVariableChanged,
            vec![
                ("variable".into(), name.to_string()),
                ("value".into(), encoded),
            ],
        ))
    }

    fn exec_set_field(
        &mut self,
        cards: &crate::selector::Selector,
        field: &str,
        value: &Getter,
        min: Option<&Getter>,
        max: Option<&Getter>,
    ) {
        let (targets, resolved, lo, hi) = {
            let mut ctx = EvalContext::new(&self.game, &self.vars, &mut self.rng);
            (
                cards.cards(&mut ctx),
                value.get(&mut ctx),
                min.and_then(|g| g.get(&mut ctx).as_number()),
                max.and_then(|g| g.get(&mut ctx).as_number()),
            )
        };
        for id in targets {
            let encoded = match value.relative {
                Some(op) => {
                    let Some(operand) = resolved.as_number() else {
                        warn!(field, "relative update with non-numeric operand");
                        return;
                    };
                    let current = self
                        .game
                        .card(&id)
                        .and_then(|c| c.num_field(field))
                        .unwrap_or(0.0);
                    format_number(clamp(op.apply(current, operand), lo, hi))
                }
                None => match resolved.as_number() {
                    Some(n) => format_number(clamp(n, lo, hi)),
                    None => resolved.as_text(),
                },
            };
            if let Some(card) = self.game.card_mut(&id) {
                card.set_field(field, &encoded);
            }
        }
    }

    fn eval(&mut self, getter: &Getter) -> Value {
        let mut ctx = EvalContext::new(&self.game, &self.vars, &mut self.rng);
        getter.get(&mut ctx)
    }

    fn resolve_cards(&mut self, selector: &crate::selector::Selector) -> Vec<CardId> {
        let mut ctx = EvalContext::new(&self.game, &self.vars, &mut self.rng);
        selector.cards(&mut ctx)
    }
}

fn one_event(label: TriggerLabel, vars: Vec<(String, String)>) -> VecDeque<RaiseEvent> {
    VecDeque::from([RaiseEvent { label, vars }])
}

fn clamp(value: f64, min: Option<f64>, max: Option<f64>) -> f64 {
    let mut value = value;
    if let Some(lo) = min {
        value = value.max(lo);
    }
    if let Some(hi) = max {
        value = value.min(hi);
    }
    value
}
