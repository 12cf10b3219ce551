//! Glue between the event loop, a [`Scene`] and an output driver.

use std::io;
use std::time::Duration;

use crossterm::event::Event;

use crate::drivers::{InputDriver, OutputDriver};
use crate::event_loop::{ControlFlow, EventLoop};
use crate::keybindings::{Action, KeyBindings};
use crate::paint::paint;
use crate::scene::Scene;
use crate::ui::UiFrame;

pub trait SceneApp {
    fn scene(&mut self) -> &mut Scene;

    fn render(&mut self, frame: &mut UiFrame<'_>) {
        paint(self.scene().document(), frame);
    }

    /// Handle `event` before the scene does. Return `true` to consume it.
    fn handle_app_event(&mut self, _event: &Event) -> bool {
        false
    }

    /// Runs after the scene handled an event; the place to feed controlled
    /// values back in.
    fn after_event(&mut self) {}

    /// Checked on every event and once per idle tick (`None`).
    fn should_quit(&mut self, event: Option<&Event>) -> bool {
        matches!(
            event,
            Some(Event::Key(key)) if KeyBindings::global().matches(Action::Quit, key)
        )
    }
}

/// Drive `app` until it asks to quit. The output is entered before the
/// first frame and left again on every exit path.
pub fn run_scene_app<O, D, A>(
    output: &mut O,
    driver: D,
    app: &mut A,
    poll_interval: Duration,
) -> io::Result<()>
where
    O: OutputDriver,
    D: InputDriver,
    A: SceneApp,
{
    output.enter()?;
    let mut event_loop = EventLoop::new(driver, poll_interval);
    let result = event_loop
        .driver()
        .set_mouse_capture(true)
        .and_then(|()| event_loop.run(|_, event| step(output, app, event)));
    let exited = output.exit();
    result.and(exited)
}

fn step<O, A>(output: &mut O, app: &mut A, event: Option<Event>) -> io::Result<ControlFlow>
where
    O: OutputDriver,
    A: SceneApp,
{
    let Some(event) = event else {
        if app.should_quit(None) {
            return Ok(ControlFlow::Quit);
        }
        app.scene().frame();
        output.draw(|mut frame| app.render(&mut frame))?;
        return Ok(ControlFlow::Continue);
    };
    if app.should_quit(Some(&event)) {
        return Ok(ControlFlow::Quit);
    }
    if !app.handle_app_event(&event) {
        app.scene().handle_event(&event);
        app.after_event();
    }
    Ok(ControlFlow::Continue)
}

#[cfg(test)]
mod tests {
    use crossterm::event::{
        KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    };
    use ratatui::buffer::Buffer;
    use ratatui::layout::Rect;

    use super::*;
    use crate::drivers::ScriptedInput;
    use crate::element::{Element, NodeSpec, PopoverProps};
    use crate::layout::Viewport;
    use crate::overlay::ContentOptions;

    struct BufferOutput {
        buffer: Buffer,
        draws: usize,
        entered: bool,
    }

    impl BufferOutput {
        fn new(width: u16, height: u16) -> Self {
            Self {
                buffer: Buffer::empty(Rect::new(0, 0, width, height)),
                draws: 0,
                entered: false,
            }
        }
    }

    impl OutputDriver for BufferOutput {
        fn enter(&mut self) -> io::Result<()> {
            self.entered = true;
            Ok(())
        }

        fn exit(&mut self) -> io::Result<()> {
            self.entered = false;
            Ok(())
        }

        fn draw<F>(&mut self, f: F) -> io::Result<()>
        where
            F: FnOnce(UiFrame<'_>),
        {
            self.draws += 1;
            let area = self.buffer.area;
            f(UiFrame::from_parts(area, &mut self.buffer));
            Ok(())
        }
    }

    struct Demo {
        scene: Scene,
    }

    impl SceneApp for Demo {
        fn scene(&mut self) -> &mut Scene {
            &mut self.scene
        }
    }

    fn mouse(kind: MouseEventKind) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column: 1,
            row: 0,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn clicking_the_trigger_paints_the_popover() {
        let mut scene = Scene::new(Viewport::new(30, 10));
        scene
            .mount(
                Element::popover(PopoverProps::new("menu"))
                    .child(Element::trigger("Menu"))
                    .child(
                        Element::content(ContentOptions::new().label("Menu"))
                            .child(Element::node(NodeSpec::button("Save"))),
                    ),
            )
            .unwrap();
        let mut app = Demo { scene };
        let mut output = BufferOutput::new(30, 10);
        let mut script = ScriptedInput::new([
            mouse(MouseEventKind::Down(MouseButton::Left)),
            mouse(MouseEventKind::Up(MouseButton::Left)),
        ]);
        run_until_quit(&mut output, &mut script, &mut app);

        assert!(app.scene.popover("menu").unwrap().is_open());
        assert!(!output.entered);
        assert_eq!(output.draws, 2);
        assert_eq!(script.mouse_capture(), Some(true));
        let painted: String = (0..30)
            .flat_map(|x| (0..10).map(move |y| (x, y)))
            .map(|(x, y)| output.buffer[(x, y)].symbol().to_string())
            .collect();
        assert!(painted.contains('╭'));
    }

    // Appends Ctrl+Q after one idle frame so the loop ends.
    fn run_until_quit(output: &mut BufferOutput, script: &mut ScriptedInput, app: &mut Demo) {
        script.pause();
        script.push(Event::Key(KeyEvent::new(
            KeyCode::Char('q'),
            KeyModifiers::CONTROL,
        )));
        run_scene_app(output, &mut *script, app, Duration::ZERO).unwrap();
    }
}
