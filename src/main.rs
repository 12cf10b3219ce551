use std::cell::Cell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use crossterm::event::Event;
use tracing::Level;

use term_popover::dom::{InputKind, NodeId, Role};
use term_popover::drivers::OutputDriver;
use term_popover::drivers::console::{ConsoleInputDriver, ConsoleOutputDriver};
use term_popover::element::{Element, NodeSpec, PopoverProps};
use term_popover::keybindings::{Action, KeyBindings};
use term_popover::layout::{Align, Bounds, GeometryConfig, Side, Viewport};
use term_popover::log_buffer::{LogBuffer, set_global_log_buffer};
use term_popover::overlay::ContentOptions;
use term_popover::paint::paint;
use term_popover::runner::{SceneApp, run_scene_app};
use term_popover::scene::Scene;
use term_popover::tracing_sub;
use term_popover::ui::UiFrame;

const HELP: &str = indoc::indoc! {"
    Open a popover with its trigger. A click outside closes the innermost one.
"};

const HINTED: [Action; 6] = [
    Action::FocusNext,
    Action::FocusPrev,
    Action::Activate,
    Action::Dismiss,
    Action::ToggleLog,
    Action::Quit,
];

/// One line per action, keys first, read from the active bindings.
fn key_hints(bindings: &KeyBindings) -> Vec<String> {
    HINTED
        .into_iter()
        .map(|action| format!("{}: {action}", bindings.combos_for(action).join(" / ")))
        .collect()
}

#[derive(Parser, Debug)]
#[command(
    name = "term-popover",
    version = env!("CARGO_PKG_VERSION"),
    about = "Interactive demo of anchored popovers in the terminal"
)]
struct DemoCli {
    /// Side of the trigger the settings popover opens on.
    #[arg(long, value_enum, default_value_t = SideArg::Bottom)]
    side: SideArg,

    /// Alignment along the trigger's edge.
    #[arg(long, value_enum, default_value_t = AlignArg::Start)]
    align: AlignArg,

    /// Gap between trigger and content, in cells.
    #[arg(long, default_value_t = 1)]
    offset: i32,

    /// Minimum distance kept from the terminal edges, in cells.
    #[arg(long, default_value_t = 1)]
    padding: u16,

    /// Hide the arrow pointing at the trigger.
    #[arg(long)]
    no_arrow: bool,

    /// Let the demo own the settings popover's open state.
    #[arg(long)]
    controlled: bool,

    /// Start with the settings popover open.
    #[arg(long)]
    default_open: bool,

    /// Input poll interval in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 16)]
    poll_ms: u64,

    /// Log placement passes and focus wraps as well.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum SideArg {
    Top,
    Right,
    Bottom,
    Left,
}

impl From<SideArg> for Side {
    fn from(value: SideArg) -> Self {
        match value {
            SideArg::Top => Side::Top,
            SideArg::Right => Side::Right,
            SideArg::Bottom => Side::Bottom,
            SideArg::Left => Side::Left,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum AlignArg {
    Start,
    Center,
    End,
}

impl From<AlignArg> for Align {
    fn from(value: AlignArg) -> Self {
        match value {
            AlignArg::Start => Align::Start,
            AlignArg::Center => Align::Center,
            AlignArg::End => Align::End,
        }
    }
}

fn main() -> io::Result<()> {
    let args = DemoCli::parse();

    let log = LogBuffer::default();
    set_global_log_buffer(log.clone());
    tracing_sub::init(if args.verbose {
        Level::TRACE
    } else {
        Level::DEBUG
    });

    let mut output = ConsoleOutputDriver::new()?;
    let (width, height) = output.size()?;
    let mut app = DemoApp::new(&args, Viewport::new(width, height), log)?;
    let result = run_scene_app(
        &mut output,
        ConsoleInputDriver::new(),
        &mut app,
        Duration::from_millis(args.poll_ms),
    );
    output.exit()?;
    result
}

struct DemoApp {
    scene: Scene,
    page: NodeId,
    log: LogBuffer,
    show_log: bool,
    // Open value requested through the change callback in controlled mode.
    requested: Option<Rc<Cell<Option<bool>>>>,
}

impl DemoApp {
    fn new(args: &DemoCli, viewport: Viewport, log: LogBuffer) -> io::Result<Self> {
        let requested: Option<Rc<Cell<Option<bool>>>> = args.controlled.then(Rc::default);
        let mut settings = PopoverProps::new("settings")
            .side(args.side.into())
            .align(args.align.into())
            .side_offset(args.offset)
            .default_open(args.default_open)
            .geometry(GeometryConfig {
                viewport_padding: i32::from(args.padding),
            });
        if let Some(requested) = &requested {
            let sink = Rc::clone(requested);
            settings = settings
                .open(args.default_open)
                .on_open_change(move |open| sink.set(Some(open)));
        }

        let mut scene = Scene::new(viewport);
        let page = scene
            .mount(page(viewport, settings, !args.no_arrow, args.padding))
            .map_err(io::Error::other)?;
        Ok(Self {
            scene,
            page,
            log,
            show_log: false,
            requested,
        })
    }
}

fn page(viewport: Viewport, settings: PopoverProps, arrow: bool, padding: u16) -> Element {
    let geometry = GeometryConfig {
        viewport_padding: i32::from(padding),
    };
    let compact = |id: &str| PopoverProps::new(id).side_offset(1).geometry(geometry);
    let help = Element::node(NodeSpec::container().stack_vertical()).children(
        HELP.lines()
            .map(str::to_string)
            .chain(key_hints(KeyBindings::global()))
            .map(|line| Element::node(NodeSpec::text(line))),
    );

    let more = Element::popover(compact("advanced").side(Side::Right))
        .child(Element::trigger("Advanced"))
        .child(
            Element::content(ContentOptions::new().label("Advanced").arrow(arrow)).children([
                Element::node(NodeSpec::input(InputKind::Checkbox, "Wrap lines")),
                Element::node(NodeSpec::input(InputKind::Checkbox, "Show hidden")),
                Element::node(NodeSpec::button("Reset")),
            ]),
        );

    let settings = Element::popover(settings)
        .child(Element::trigger("Settings"))
        .child(
            Element::content(ContentOptions::new().label("Dimensions").arrow(arrow)).children([
                Element::node(NodeSpec::text("Set the panel size.")),
                Element::node(NodeSpec::input(InputKind::Text, "Width   100%").size(20, 1)),
                Element::node(NodeSpec::input(InputKind::Text, "Height  25px").size(20, 1)),
                Element::node(NodeSpec::select("Units")),
                Element::node(NodeSpec::text_area("Notes").size(20, 2)),
                more,
            ]),
        );

    let account = Element::popover(compact("account").align(Align::End))
        .child(Element::trigger_as_child(Element::node(NodeSpec::link(
            "Account", "#account",
        ))))
        .child(
            Element::content(ContentOptions::new().label("Account").arrow(arrow)).children([
                Element::node(NodeSpec::text("signed in as guest")),
                Element::node(NodeSpec::button("Sign out")),
            ]),
        );

    let row = Element::node(NodeSpec::container().stack_horizontal().gap(3)).children([
        settings,
        account,
        Element::node(NodeSpec::button("Plain button")),
        Element::node(NodeSpec::button("Disabled").disabled()),
    ]);

    let items = (1..=8).map(|i| {
        if i == 4 {
            Element::popover(compact("item-details").side(Side::Right))
                .child(Element::trigger(format!("Item {i} details")))
                .child(
                    Element::content(ContentOptions::new().label("Details").arrow(arrow))
                        .child(Element::node(NodeSpec::text("Scroll the list: I follow."))),
                )
        } else {
            Element::node(NodeSpec::button(format!("Item {i}")))
        }
    });
    let list = Element::node(
        NodeSpec::container()
            .size(28, 4)
            .scrollable()
            .stack_vertical(),
    )
    .children(items);

    Element::node(
        NodeSpec::new(Role::Container, "term-popover")
            .size(viewport.width, viewport.height)
            .bordered()
            .stack_vertical()
            .inset(1)
            .gap(1),
    )
    .child(help)
    .child(row)
    .child(Element::node(NodeSpec::text("Scrollable list:")))
    .child(list)
}

impl SceneApp for DemoApp {
    fn scene(&mut self) -> &mut Scene {
        &mut self.scene
    }

    fn render(&mut self, frame: &mut UiFrame<'_>) {
        paint(self.scene.document(), frame);
        if self.show_log {
            let area = frame.area();
            let height = (area.height / 3).max(3);
            let top = i32::from(area.height.saturating_sub(height));
            self.log
                .render(frame, Bounds::new(top, 0, area.width, height));
        }
    }

    fn handle_app_event(&mut self, event: &Event) -> bool {
        match event {
            Event::Key(key) if KeyBindings::global().matches(Action::ToggleLog, key) => {
                self.show_log = !self.show_log;
                true
            }
            Event::Resize(width, height) => {
                self.scene
                    .document_mut()
                    .set_size(self.page, *width, *height);
                false
            }
            _ => false,
        }
    }

    fn after_event(&mut self) {
        let Some(requested) = &self.requested else {
            return;
        };
        if let Some(open) = requested.take() {
            self.scene.set_open("settings", Some(open));
        }
    }
}
