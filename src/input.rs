//! Input collaborator
//!
//! The frame loop polls one batch of discrete events per frame.

use std::collections::VecDeque;

use glam::Vec2;

/// A discrete input event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    Quit,
    /// Leave the menu / acknowledge a finished session
    Start,
    /// Pointer position in screen space
    PointerMoved(Vec2),
    /// Resume key: lock in the aimed platform
    Resume,
    /// Timer tick with nothing else to report
    Tick,
}

/// Abstraction over input sources
pub trait InputSource {
    /// Events since the last poll
    fn poll(&mut self) -> Vec<Input>;
}

/// Replays a fixed per-frame schedule, then reports `Quit`
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: VecDeque<Vec<Input>>,
}

impl ScriptedInput {
    pub fn new(frames: impl IntoIterator<Item = Vec<Input>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Queue `count` empty frames
    pub fn idle(mut self, count: usize) -> Self {
        self.frames.extend(std::iter::repeat_n(Vec::new(), count));
        self
    }

    /// Queue one frame with these events
    pub fn then(mut self, events: Vec<Input>) -> Self {
        self.frames.push_back(events);
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> Vec<Input> {
        self.frames.pop_front().unwrap_or_else(|| vec![Input::Quit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_input_order() {
        let mut input = ScriptedInput::default()
            .then(vec![Input::Start])
            .idle(2)
            .then(vec![Input::PointerMoved(Vec2::new(1.0, 2.0)), Input::Resume]);
        assert_eq!(input.remaining(), 4);
        assert_eq!(input.poll(), vec![Input::Start]);
        assert!(input.poll().is_empty());
        assert!(input.poll().is_empty());
        assert_eq!(input.poll().len(), 2);
        assert_eq!(input.poll(), vec![Input::Quit]);
    }
}
