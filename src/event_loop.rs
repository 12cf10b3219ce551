use std::io;
use std::time::Duration;

use crossterm::event::Event;

use crate::drivers::InputDriver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    Continue,
    Quit,
}

/// Owns the input driver and the UI thread.
///
/// The handler is called with `None` once per iteration before polling
/// (the place to run placement passes and draw) and with `Some(event)` for
/// every event read. Everything runs on one thread: listeners, mailbox pumps
/// and painting never overlap.
pub struct EventLoop<D> {
    driver: D,
    poll_interval: Duration,
}

impl<D: InputDriver> EventLoop<D> {
    pub fn new(driver: D, poll_interval: Duration) -> Self {
        Self {
            driver,
            poll_interval,
        }
    }

    pub fn poll(&mut self) -> io::Result<Option<Event>> {
        if self.driver.poll(self.poll_interval)? {
            Ok(Some(self.driver.read()?))
        } else {
            Ok(None)
        }
    }

    pub fn driver(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Run until the handler returns [`ControlFlow::Quit`].
    pub fn run<F>(&mut self, mut handler: F) -> io::Result<()>
    where
        F: FnMut(&mut D, Option<Event>) -> io::Result<ControlFlow>,
    {
        loop {
            if let ControlFlow::Quit = handler(&mut self.driver, None)? {
                break;
            }

            if self.driver.poll(self.poll_interval)? {
                // Drain bursts (drags, wheel scrolling) before the next frame.
                loop {
                    let event = self.driver.read()?;
                    if let ControlFlow::Quit = handler(&mut self.driver, Some(event))? {
                        return Ok(());
                    }
                    if !self.driver.poll(Duration::from_millis(0))? {
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use super::*;
    use crate::drivers::ScriptedInput;

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    #[test]
    fn burst_is_drained_between_frames() {
        let script = ScriptedInput::new([key('a'), key('b'), key('q')]);
        let mut event_loop = EventLoop::new(script, Duration::ZERO);
        let mut seen = Vec::new();
        event_loop
            .run(|_, event| {
                seen.push(event.clone());
                Ok(match event {
                    Some(e) if e == key('q') => ControlFlow::Quit,
                    _ => ControlFlow::Continue,
                })
            })
            .unwrap();
        assert_eq!(seen, vec![None, Some(key('a')), Some(key('b')), Some(key('q'))]);
    }

    #[test]
    fn idle_tick_can_quit() {
        let mut event_loop = EventLoop::new(ScriptedInput::default(), Duration::ZERO);
        let mut ticks = 0;
        event_loop
            .run(|_, _| {
                ticks += 1;
                Ok(if ticks == 3 {
                    ControlFlow::Quit
                } else {
                    ControlFlow::Continue
                })
            })
            .unwrap();
        assert_eq!(ticks, 3);
        assert!(event_loop.poll().unwrap().is_none());
    }
}
