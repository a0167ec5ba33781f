//! Declarative description of what the map should display.
//! See [`RenderPlan`].

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{distance::DistanceResult, gis::Position, input::TrackingState, surface};

/// Zoom level used to center on a single position.
pub const SINGLE_POSITION_ZOOM: u8 = 15;
/// Padding (in pixels, on each side) used when fitting both positions in view.
pub const FIT_PADDING_PX: u32 = 80;
/// Maximum zoom used when fitting both positions in view, so that close positions don't zoom in
/// too far.
pub const FIT_MAX_ZOOM: u8 = 16;

/// Which of the two tracked positions a marker represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Your own position.
    Me,
    /// The missing device.
    Target,
}

impl Role {
    /// Both roles, in drawing order.
    pub const ALL: [Role; 2] = [Role::Me, Role::Target];

    /// Popup title for markers with this role.
    pub fn title(self) -> &'static str {
        match self {
            Role::Me => "Your Location",
            Role::Target => "Missing Phone",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Role::Me => "me",
                Role::Target => "target",
            }
        )
    }
}

/// A marker placed on the map.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Determines the icon and popup title.
    pub role: Role,
    /// Where the marker is placed.
    pub position: Position,
}

impl Marker {
    /// Construct a new [`Marker`].
    pub fn new(role: Role, position: Position) -> Self {
        Self { role, position }
    }

    /// Popup body: the coordinates with six decimal places.
    pub fn popup(&self) -> String {
        self.position.to_string()
    }
}

/// Stroke style of the connecting line.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LineStyle {
    /// CSS color.
    pub color: &'static str,
    /// Stroke width in pixels.
    pub weight: u8,
    /// Stroke opacity in `[0, 1]`.
    pub opacity: f32,
    /// SVG `stroke-dasharray`, `None` for a solid line.
    pub dash_array: Option<&'static str>,
}

impl LineStyle {
    /// Dashed cyan line drawn between the two positions.
    pub const CONNECTION: LineStyle = LineStyle {
        color: "#00d4ff",
        weight: 3,
        opacity: 0.7,
        dash_array: Some("10, 10"),
    };
}

impl Default for LineStyle {
    fn default() -> Self {
        Self::CONNECTION
    }
}

/// Line connecting your position to the tracked device.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ConnectionLine {
    /// Your position.
    pub from: Position,
    /// The tracked device position.
    pub to: Position,
    /// Stroke style.
    pub style: LineStyle,
}

/// How the map should reposition itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewportCommand {
    /// Leave the viewport where it is.
    Unchanged,
    /// Center on a position at a zoom level.
    Center {
        /// New center of the map.
        center: Position,
        /// Zoom level.
        zoom: u8,
    },
    /// Fit all positions in view.
    FitBounds {
        /// Positions that must be visible.
        points: Vec<Position>,
        /// Padding around the bounds, in pixels.
        padding_px: u32,
        /// Never zoom in further than this.
        max_zoom: u8,
    },
}

/// Everything the map surface should display for one [`TrackingState`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderPlan {
    /// Markers to place, after clearing the previous ones.
    pub markers: Vec<Marker>,
    /// Drawn only when both positions are present.
    pub line: Option<ConnectionLine>,
    /// `Some` exactly when the distance panel is shown.
    pub distance: Option<DistanceResult>,
    /// How the map moves to show the markers.
    pub viewport: ViewportCommand,
}

impl RenderPlan {
    /// Derive the plan for `state`.
    pub fn from_state(state: &TrackingState) -> Self {
        let markers: Vec<Marker> = [(Role::Me, state.me), (Role::Target, state.target)]
            .into_iter()
            .filter_map(|(role, position)| position.map(|position| Marker::new(role, position)))
            .collect();

        match (state.me, state.target) {
            (Some(me), Some(target)) => Self {
                markers,
                line: Some(ConnectionLine {
                    from: me,
                    to: target,
                    style: LineStyle::CONNECTION,
                }),
                distance: Some(DistanceResult::between(&me, &target)),
                viewport: ViewportCommand::FitBounds {
                    points: vec![me, target],
                    padding_px: FIT_PADDING_PX,
                    max_zoom: FIT_MAX_ZOOM,
                },
            },
            (Some(position), None) | (None, Some(position)) => Self {
                markers,
                line: None,
                distance: None,
                viewport: ViewportCommand::Center {
                    center: position,
                    zoom: SINGLE_POSITION_ZOOM,
                },
            },
            (None, None) => Self {
                markers,
                line: None,
                distance: None,
                viewport: ViewportCommand::Unchanged,
            },
        }
    }

    /// Whether the distance panel should be visible.
    pub fn distance_panel_visible(&self) -> bool {
        self.distance.is_some()
    }

    /// Issue the plan to `surface`. Previous markers and line are always cleared first.
    pub fn apply<S: surface::Port + ?Sized>(&self, surface: &mut S) {
        for role in Role::ALL {
            surface.clear_marker(role);
        }
        surface.clear_line();

        for marker in &self.markers {
            surface.place_marker(marker);
        }
        if let Some(line) = &self.line {
            surface.draw_line(&line.from, &line.to, &line.style);
        }

        match &self.viewport {
            ViewportCommand::Unchanged => {}
            ViewportCommand::Center { center, zoom } => surface.set_viewport_center(center, *zoom),
            ViewportCommand::FitBounds {
                points,
                padding_px,
                max_zoom,
            } => surface.fit_viewport(points, *padding_px, *max_zoom),
        }
    }
}

#[cfg(test)]
mod test {
    use mockall::{predicate::eq, Sequence};

    use crate::{gis::Position, input::TrackingState, surface};

    use super::{LineStyle, Marker, RenderPlan, Role, ViewportCommand};

    #[test]
    fn test_plan_empty() {
        let plan = RenderPlan::from_state(&TrackingState::default());
        assert!(plan.markers.is_empty());
        assert!(plan.line.is_none());
        assert!(!plan.distance_panel_visible());
        assert_eq!(ViewportCommand::Unchanged, plan.viewport);
    }

    #[test]
    fn test_plan_target_only() {
        let target = Position::new(-33.86, 151.21);
        let plan = RenderPlan::from_state(&TrackingState {
            me: None,
            target: Some(target),
        });
        assert_eq!(vec![Marker::new(Role::Target, target)], plan.markers);
        assert!(plan.line.is_none());
        assert_eq!(
            ViewportCommand::Center {
                center: target,
                zoom: 15
            },
            plan.viewport
        );
    }

    #[test]
    fn test_marker_popup() {
        let marker = Marker::new(Role::Me, Position::new(40.0, -75.0));
        assert_eq!("Your Location", marker.role.title());
        assert_eq!("40.000000, -75.000000", marker.popup());
        assert_eq!("Missing Phone", Role::Target.title());
    }

    #[test]
    fn test_serialize_viewport() {
        let viewport = ViewportCommand::Center {
            center: Position::new(1.0, 2.0),
            zoom: 15,
        };
        assert_eq!(
            serde_json::json!({
                "type": "center",
                "center": { "latitude": 1.0, "longitude": 2.0 },
                "zoom": 15,
            }),
            serde_json::to_value(&viewport).unwrap()
        );
    }

    #[test]
    fn test_apply_clears_before_drawing() {
        let me = Position::new(40.0, -75.0);
        let target = Position::new(40.0, -74.0);
        let plan = RenderPlan::from_state(&TrackingState {
            me: Some(me),
            target: Some(target),
        });

        let mut seq = Sequence::new();
        let mut surface = surface::MockPort::new();
        surface
            .expect_clear_marker()
            .with(eq(Role::Me))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {});
        surface
            .expect_clear_marker()
            .with(eq(Role::Target))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {});
        surface
            .expect_clear_line()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| {});
        surface
            .expect_place_marker()
            .withf(move |marker| *marker == Marker::new(Role::Me, me))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {});
        surface
            .expect_place_marker()
            .withf(move |marker| *marker == Marker::new(Role::Target, target))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {});
        surface
            .expect_draw_line()
            .withf(move |from, to, style| {
                *from == me && *to == target && *style == LineStyle::CONNECTION
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| {});
        surface
            .expect_fit_viewport()
            .withf(move |points, padding_px, max_zoom| {
                points.to_vec() == vec![me, target] && *padding_px == 80 && *max_zoom == 16
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| {});
        surface.expect_set_viewport_center().never();

        plan.apply(&mut surface);
    }
}
