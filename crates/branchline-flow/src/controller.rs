//! Dialogue flow controller.
//!
//! Plays a dialogue graph from its root until a node yields no successor.
//! Each node goes through the same life cycle: reveal its line (skippable),
//! wait out the anti-spam cooldown, then either reveal its choices and wait
//! for a confirmed selection, or wait for the player to advance. The
//! controller is the only owner of the current node and the navigator, and
//! runs as a single sequential task.

use std::future::{self, Future};
use std::sync::Arc;

use branchline_core::config::FlowConfig;
use branchline_core::event::{DialogueObserver, TextRole};
use branchline_core::signal::{SkipScope, completion};
use branchline_graph::domain::node::{NodeKind, NodeRef};
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, info, instrument, trace, warn};

use crate::handle::{DialogueHandle, DialogueInput, FlowPhase, FlowStatus};
use crate::navigator::ChoiceNavigator;
use crate::reveal::TextRevealer;

/// How a dialogue run finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    /// A node yielded no successor.
    Completed {
        /// Number of nodes played.
        steps: usize,
    },
    /// Every input sender was dropped while the dialogue waited on the player.
    Abandoned {
        /// Number of nodes started.
        steps: usize,
    },
}

/// Result of playing a single node.
enum Step {
    Next(Option<NodeRef>),
    Abandoned,
}

/// Owns and drives one dialogue session.
pub struct FlowController {
    config: FlowConfig,
    observer: Arc<dyn DialogueObserver>,
    revealer: TextRevealer,
    navigator: ChoiceNavigator,
    status: watch::Sender<FlowStatus>,
}

impl std::fmt::Debug for FlowController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowController")
            .field("config", &self.config)
            .field("status", &*self.status.borrow())
            .finish_non_exhaustive()
    }
}

impl FlowController {
    /// Creates a controller publishing to `observer`.
    #[must_use]
    pub fn new(config: FlowConfig, observer: Arc<dyn DialogueObserver>) -> Self {
        let (status, _) = watch::channel(FlowStatus::idle());
        Self {
            config,
            revealer: TextRevealer::new(
                config.reveal_interval,
                config.choice_cooldown,
                observer.clone(),
            ),
            navigator: ChoiceNavigator::new(config.grid_columns, observer.clone()),
            observer,
            status,
        }
    }

    /// Returns a receiver that tracks this controller's status.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FlowStatus> {
        self.status.subscribe()
    }

    /// Runs the dialogue from `root` on a new task and returns its handle.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn spawn(self, root: NodeRef) -> DialogueHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let status = self.subscribe();
        let task = tokio::spawn(self.run(root, rx));
        DialogueHandle::new(tx, status, task)
    }

    /// Runs the dialogue from `root`, reading player signals from `inputs`.
    #[instrument(skip_all, fields(root = %preview(root.text())))]
    pub async fn run(
        mut self,
        root: NodeRef,
        inputs: mpsc::UnboundedReceiver<DialogueInput>,
    ) -> FlowOutcome {
        let mut inputs = InputQueue::new(inputs);
        info!("dialogue started");
        self.observer.on_dialogue_started();

        let mut current = Some(root);
        let mut steps = 0;
        let outcome = loop {
            let Some(node) = current.take() else {
                break FlowOutcome::Completed { steps };
            };
            steps += 1;
            match self.play_node(&node, steps, &mut inputs).await {
                Step::Next(next) => current = next,
                Step::Abandoned => {
                    warn!(step = steps, "input closed, abandoning dialogue");
                    break FlowOutcome::Abandoned { steps };
                }
            }
            tokio::task::yield_now().await;
        };

        self.set_phase(steps, FlowPhase::Ended);
        info!(?outcome, "dialogue ended");
        self.observer.on_dialogue_ended();
        outcome
    }

    async fn play_node(&mut self, node: &NodeRef, step: usize, inputs: &mut InputQueue) -> Step {
        debug!(step, text = %preview(node.text()), "reading line");
        self.observer.on_line_started(node.speaker(), node.text());

        self.set_phase(step, FlowPhase::Revealing);
        self.reveal_line(node, inputs).await;

        self.set_phase(step, FlowPhase::Cooldown);
        discard_inputs_during(sleep(self.config.advance_cooldown), inputs, "cooldown").await;

        match node.kind() {
            NodeKind::MultiWay { choices } if choices.is_empty() => {
                warn!(step, "multi-way node has no choices, ending dialogue");
                Step::Next(None)
            }
            NodeKind::MultiWay { .. } => self.select_choice(node, step, inputs).await,
            NodeKind::OneWay { .. } => self.await_advance(node, step, inputs).await,
        }
    }

    async fn reveal_line(&mut self, node: &NodeRef, inputs: &mut InputQueue) {
        let scope = SkipScope::new();
        let mut token = scope.token();
        let reveal = self
            .revealer
            .reveal(TextRole::DialogueText, node.text(), 0, &mut token);
        tokio::pin!(reveal);

        loop {
            tokio::select! {
                biased;
                outcome = &mut reveal => {
                    debug!(?outcome, "line revealed");
                    break;
                }
                input = inputs.recv() => match input {
                    Some(DialogueInput::Skip | DialogueInput::Advance) => scope.cancel(),
                    Some(other) => trace!(?other, "input ignored while revealing"),
                    None => {}
                },
            }
        }
    }

    async fn select_choice(&mut self, node: &NodeRef, step: usize, inputs: &mut InputQueue) -> Step {
        self.set_phase(step, FlowPhase::RevealingChoices);
        let labels = node.choices_text();
        debug!(step, choice_count = labels.len(), "revealing choices");
        for (slot, label) in (0..=u8::MAX).zip(&labels) {
            discard_inputs_during(
                self.revealer.reveal_choice(label, slot),
                inputs,
                "choice reveal",
            )
            .await;
        }

        if inputs.is_closed() {
            return Step::Abandoned;
        }
        self.navigator.initialize(labels.len());
        let Some(mut selection) = self.navigator.selection() else {
            return Step::Next(None);
        };
        self.set_phase(step, FlowPhase::AwaitingChoice);

        let selected = loop {
            tokio::select! {
                biased;
                selected = selection.wait() => break selected,
                input = inputs.recv() => match input {
                    Some(DialogueInput::Navigate(direction)) => self.navigator.navigate(direction),
                    Some(DialogueInput::Confirm) => self.navigator.confirm(),
                    Some(other) => trace!(?other, "input ignored while choosing"),
                    None => return Step::Abandoned,
                },
            }
        };

        match selected {
            Some(index) => {
                debug!(step, selected = index, "advancing along chosen branch");
                Step::Next(node.next(index))
            }
            None => Step::Next(None),
        }
    }

    async fn await_advance(&mut self, node: &NodeRef, step: usize, inputs: &mut InputQueue) -> Step {
        if inputs.is_closed() {
            return Step::Abandoned;
        }
        let (advance, mut advanced) = completion::<()>();
        self.set_phase(step, FlowPhase::AwaitingAdvance);

        loop {
            tokio::select! {
                biased;
                _ = advanced.wait() => break,
                input = inputs.recv() => match input {
                    Some(DialogueInput::Advance) => {
                        advance.complete(());
                    }
                    Some(other) => trace!(?other, "input ignored while awaiting advance"),
                    None => return Step::Abandoned,
                },
            }
        }

        debug!(step, "advancing to next line");
        Step::Next(node.next(0))
    }

    fn set_phase(&self, step: usize, phase: FlowPhase) {
        self.status.send_replace(FlowStatus { step, phase });
    }
}

/// Player inputs, remembering when every sender is gone.
struct InputQueue {
    rx: mpsc::UnboundedReceiver<DialogueInput>,
    closed: bool,
}

impl InputQueue {
    fn new(rx: mpsc::UnboundedReceiver<DialogueInput>) -> Self {
        Self { rx, closed: false }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    /// Next input. Yields `None` once when the channel closes and never
    /// resolves afterwards.
    async fn recv(&mut self) -> Option<DialogueInput> {
        if self.closed {
            return future::pending().await;
        }
        let input = self.rx.recv().await;
        if input.is_none() {
            self.closed = true;
        }
        input
    }
}

/// Drives `fut` to completion, dropping any inputs that arrive meanwhile.
async fn discard_inputs_during<F: Future>(
    fut: F,
    inputs: &mut InputQueue,
    phase: &'static str,
) -> F::Output {
    tokio::pin!(fut);
    loop {
        tokio::select! {
            biased;
            output = &mut fut => return output,
            input = inputs.recv() => {
                if let Some(input) = input {
                    trace!(?input, phase, "input discarded");
                }
            }
        }
    }
}

fn preview(text: &str) -> &str {
    text.char_indices().nth(30).map_or(text, |(end, _)| &text[..end])
}
