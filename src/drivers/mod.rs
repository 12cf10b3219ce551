//! Terminal input and output behind small traits, so the event loop and
//! the runner can be driven by a scripted source in tests.

pub mod console;
pub mod keyboard;

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use ::crossterm::event::Event;

use crate::ui::UiFrame;

pub trait InputDriver {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool>;
    fn read(&mut self) -> io::Result<Event>;
    fn set_mouse_capture(&mut self, _enabled: bool) -> io::Result<()> {
        Ok(())
    }
}

impl<T: InputDriver + ?Sized> InputDriver for &mut T {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        (**self).poll(timeout)
    }

    fn read(&mut self) -> io::Result<Event> {
        (**self).read()
    }

    fn set_mouse_capture(&mut self, enabled: bool) -> io::Result<()> {
        (**self).set_mouse_capture(enabled)
    }
}

pub trait OutputDriver {
    fn enter(&mut self) -> io::Result<()>;
    fn exit(&mut self) -> io::Result<()>;

    fn draw<F>(&mut self, f: F) -> io::Result<()>
    where
        F: FnOnce(UiFrame<'_>);
}

/// Replays a fixed list of events. A pause makes one poll report no input,
/// which gives the loop an idle tick.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    events: VecDeque<Option<Event>>,
    mouse_capture: Option<bool>,
}

impl ScriptedInput {
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: events.into_iter().map(Some).collect(),
            mouse_capture: None,
        }
    }

    pub fn push(&mut self, event: Event) {
        self.events.push_back(Some(event));
    }

    pub fn pause(&mut self) {
        self.events.push_back(None);
    }

    pub fn remaining(&self) -> usize {
        self.events.iter().flatten().count()
    }

    /// Last value passed to `set_mouse_capture`.
    pub fn mouse_capture(&self) -> Option<bool> {
        self.mouse_capture
    }
}

impl InputDriver for ScriptedInput {
    fn poll(&mut self, _timeout: Duration) -> io::Result<bool> {
        match self.events.front() {
            Some(Some(_)) => Ok(true),
            Some(None) => {
                self.events.pop_front();
                Ok(false)
            }
            None => Ok(false),
        }
    }

    fn read(&mut self) -> io::Result<Event> {
        while let Some(next) = self.events.pop_front() {
            if let Some(event) = next {
                return Ok(event);
            }
        }
        Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "script exhausted",
        ))
    }

    fn set_mouse_capture(&mut self, enabled: bool) -> io::Result<()> {
        self.mouse_capture = Some(enabled);
        Ok(())
    }
}
