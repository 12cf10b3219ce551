use term_popover::layout::{
    Align, Bounds, GeometryConfig, Placement, Position, Side, Viewport, compute_position,
    compute_position_with,
};

const SIDES: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];
const ALIGNS: [Align; 3] = [Align::Start, Align::Center, Align::End];

fn trigger() -> Bounds {
    Bounds::new(100, 100, 40, 20)
}

fn content() -> Bounds {
    Bounds::new(0, 0, 200, 100)
}

#[test]
fn bottom_center_below_trigger() {
    let placement = Placement::new(Side::Bottom, Align::Center, 8);
    assert_eq!(placement, Placement::default());
    let position = compute_position(trigger(), content(), placement, Viewport::new(800, 600));
    assert_eq!(position, Position::new(128, 20));
}

#[test]
fn narrow_viewport_clamps_to_padding() {
    let position = compute_position(
        trigger(),
        content(),
        Placement::default(),
        Viewport::new(150, 600),
    );
    assert_eq!(position, Position::new(128, 8));
}

#[test]
fn unattached_content_gets_unclamped_primary_axis() {
    let position = compute_position(
        Bounds::new(-50, 700, 40, 20),
        Bounds::ZERO,
        Placement::new(Side::Top, Align::Start, 8),
        Viewport::new(80, 24),
    );
    assert_eq!(position, Position::new(-58, 700));
}

#[test]
fn fitting_content_always_lands_inside_the_padded_viewport() {
    for pad in [0, 1, 8] {
        let config = GeometryConfig {
            viewport_padding: pad,
        };
        for (vw, vh) in [(40u16, 20u16), (80, 24), (200, 60)] {
            let viewport = Viewport::new(vw, vh);
            for (cw, ch) in [(1u16, 1u16), (10, 4), (vw - 2 * pad as u16, vh - 2 * pad as u16)] {
                let content = Bounds::new(0, 0, cw, ch);
                for top in [-30, 0, 5, i32::from(vh) - 1, i32::from(vh) + 30] {
                    for left in [-30, 0, 7, i32::from(vw) - 1, i32::from(vw) + 30] {
                        let trigger = Bounds::new(top, left, 6, 1);
                        for side in SIDES {
                            for align in ALIGNS {
                                let placement = Placement::new(side, align, 3);
                                let p = compute_position_with(
                                    config, trigger, content, placement, viewport,
                                );
                                let max_top = i32::from(vh) - i32::from(ch) - pad;
                                let max_left = i32::from(vw) - i32::from(cw) - pad;
                                assert!(
                                    (pad..=max_top).contains(&p.top)
                                        && (pad..=max_left).contains(&p.left),
                                    "{p:?} escaped for {trigger:?} {content:?} {placement:?} {viewport:?}"
                                );
                            }
                        }
                    }
                }
            }
        }
    }
}
