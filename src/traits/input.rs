use crate::model::NoteKind;

/// A discrete button transition on a note lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub kind: NoteKind,
    pub lane: usize,
    pub pressed: bool,
}

/// Abstraction over input sources.
/// Implementations: an HID poller (production), ScriptedInput (testing).
///
/// Events must be delivered from the frame thread, between frames; the
/// engine assumes no concurrent mutation. A host with interrupt-driven
/// input marshals events onto the frame thread before polling.
pub trait InputSource {
    /// The events observed since the last poll, in order.
    fn poll_events(&mut self) -> Vec<InputEvent>;
}

/// Scripted input for deterministic testing: pushed events drain on the
/// next poll.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    queue: Vec<InputEvent>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: NoteKind, lane: usize, pressed: bool) {
        self.queue.push(InputEvent {
            kind,
            lane,
            pressed,
        });
    }
}

impl InputSource for ScriptedInput {
    fn poll_events(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_input_drains_on_poll() {
        let mut input = ScriptedInput::new();
        input.push(NoteKind::Bt, 0, true);
        input.push(NoteKind::Fx, 1, false);

        let events = input.poll_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, NoteKind::Bt);
        assert!(input.poll_events().is_empty());
    }
}
