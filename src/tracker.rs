//! See [`GeoTrackerController`].

use crate::{
    input::{CoordinateInputs, TrackingState},
    location::{self, DeviceFix, LocationError, PositionOptions},
    plan::RenderPlan,
    surface,
};

/// Successful outcome of [`GeoTrackerController::locate_self()`].
#[derive(Clone, Debug, PartialEq)]
pub struct Located {
    /// The reported device position, now copied into your own position fields.
    pub fix: DeviceFix,
    /// The map update, if the tracked device position was already present.
    pub plan: Option<RenderPlan>,
}

/// Owns the coordinate form and keeps a map surface in sync with it.
///
/// Every [`GeoTrackerController::update()`] resolves the raw inputs from scratch, derives a
/// [`RenderPlan`] and applies it to the surface. Invalid or partial input is never an error, it
/// simply isn't drawn.
pub struct GeoTrackerController<S, L> {
    surface: S,
    locator: L,
    inputs: CoordinateInputs,
    state: TrackingState,
}

impl<S: surface::Port, L: location::Port> GeoTrackerController<S, L> {
    /// Construct a new [`GeoTrackerController`] with an empty form.
    pub fn new(surface: S, locator: L) -> Self {
        Self::with_inputs(surface, locator, CoordinateInputs::default())
    }

    /// Construct a new [`GeoTrackerController`] with a pre-filled (e.g. restored) form. Nothing is
    /// drawn until the first [`GeoTrackerController::update()`].
    pub fn with_inputs(surface: S, locator: L, inputs: CoordinateInputs) -> Self {
        Self {
            surface,
            locator,
            inputs,
            state: TrackingState::default(),
        }
    }

    /// The current raw form values.
    pub fn inputs(&self) -> &CoordinateInputs {
        &self.inputs
    }

    /// The state drawn by the last update.
    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    /// The map surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Replace the form values and redraw the map.
    pub fn update(&mut self, inputs: CoordinateInputs) -> RenderPlan {
        self.inputs = inputs;
        self.track()
    }

    /// Redraw the map from the current form values.
    pub fn track(&mut self) -> RenderPlan {
        self.state = self.inputs.resolve();
        let plan = RenderPlan::from_state(&self.state);
        tracing::debug!(
            "Tracking {} position(s), distance: {:?}",
            self.state.len(),
            plan.distance.as_ref().map(|distance| distance.display.as_str())
        );
        plan.apply(&mut self.surface);
        plan
    }

    /// Fill in your own position from the device location.
    ///
    /// On success the map is redrawn only if the tracked device position is already present. On
    /// failure the form is left untouched.
    #[tracing::instrument(skip(self))]
    pub async fn locate_self(&mut self) -> Result<Located, LocationError> {
        let fix = self
            .locator
            .request_current_position(&PositionOptions::LOCATE_SELF)
            .await
            .map_err(|error| {
                tracing::warn!("Location request failed: {}", error);
                error
            })?;
        tracing::info!(
            "Located at {} (accuracy: {:?} m)",
            fix.position,
            fix.accuracy
        );

        self.inputs.set_me(&fix.position);

        let plan = if self.inputs.target().is_some() {
            Some(self.track())
        } else {
            None
        };

        Ok(Located { fix, plan })
    }
}

#[cfg(test)]
mod test {
    use approx::assert_abs_diff_eq;
    use mockall::predicate::eq;

    use crate::{
        gis::Position,
        input::CoordinateInputs,
        location::{self, DeviceFix, LocationError, PositionOptions},
        plan::{Marker, Role, ViewportCommand},
        surface::{self, GeoJsonGateway},
    };

    use super::GeoTrackerController;

    fn controller() -> GeoTrackerController<GeoJsonGateway, location::MockPort> {
        GeoTrackerController::new(GeoJsonGateway::new(), location::MockPort::new())
    }

    fn locator_reporting(result: Result<DeviceFix, LocationError>) -> location::MockPort {
        let mut locator = location::MockPort::new();
        locator
            .expect_request_current_position()
            .with(eq(PositionOptions::LOCATE_SELF))
            .times(1)
            .returning(move |_| result);
        locator
    }

    #[test]
    fn test_update_me_only() {
        let mut tracker = controller();
        let plan = tracker.update(CoordinateInputs::new("40.0", "-75.0", "", ""));

        let me = Position::new(40.0, -75.0);
        assert_eq!(vec![Marker::new(Role::Me, me)], plan.markers);
        assert!(plan.line.is_none());
        assert!(!plan.distance_panel_visible());
        assert_eq!(
            ViewportCommand::Center {
                center: me,
                zoom: 15
            },
            plan.viewport
        );

        assert_eq!(1, tracker.surface().markers().count());
        assert_eq!(&plan.viewport, tracker.surface().viewport());
    }

    #[test]
    fn test_update_both() {
        let mut tracker = controller();
        let plan = tracker.update(CoordinateInputs::new("40.0", "-75.0", "40.0", "-74.0"));

        let me = Position::new(40.0, -75.0);
        let target = Position::new(40.0, -74.0);
        assert_eq!(
            vec![Marker::new(Role::Me, me), Marker::new(Role::Target, target)],
            plan.markers
        );
        let line = plan.line.unwrap();
        assert_eq!((me, target), (line.from, line.to));
        assert_eq!(Some("10, 10"), line.style.dash_array);

        let distance = plan.distance.as_ref().unwrap();
        assert_abs_diff_eq!(85.2, distance.kilometers, epsilon = 0.5);
        assert_eq!("85.2 km", distance.display);

        assert_eq!(
            ViewportCommand::FitBounds {
                points: vec![me, target],
                padding_px: 80,
                max_zoom: 16
            },
            plan.viewport
        );
        assert!(tracker.surface().line().is_some());
    }

    #[test]
    fn test_update_empty_issues_no_viewport_command() {
        let mut surface = surface::MockPort::new();
        surface.expect_clear_marker().times(2).returning(|_| {});
        surface.expect_clear_line().times(1).returning(|| {});
        surface.expect_place_marker().never();
        surface.expect_draw_line().never();
        surface.expect_set_viewport_center().never();
        surface.expect_fit_viewport().never();

        let mut tracker = GeoTrackerController::new(surface, location::MockPort::new());
        let plan = tracker.update(CoordinateInputs::new("", "abc", " ", "--"));
        assert!(plan.markers.is_empty());
        assert!(plan.line.is_none());
        assert!(!plan.distance_panel_visible());
        assert_eq!(ViewportCommand::Unchanged, plan.viewport);
    }

    #[test]
    fn test_update_treats_invalid_input_as_absent() {
        let mut tracker = controller();

        // Partial pair.
        let plan = tracker.update(CoordinateInputs::new("40.0", "", "41.0", "-74.0"));
        assert_eq!(1, plan.markers.len());
        assert_eq!(Role::Target, plan.markers[0].role);
        assert!(!plan.distance_panel_visible());

        // Out of range latitude.
        let plan = tracker.update(CoordinateInputs::new("95", "10", "41.0", "-74.0"));
        assert_eq!(1, plan.markers.len());
        assert!(tracker.state().me.is_none());
    }

    #[test]
    fn test_update_clears_previous_layers() {
        let mut tracker = controller();
        tracker.update(CoordinateInputs::new("40.0", "-75.0", "40.0", "-74.0"));
        tracker.update(CoordinateInputs::default());
        assert_eq!(0, tracker.surface().markers().count());
        assert!(tracker.surface().line().is_none());
        // The viewport is left where the last plan put it.
        assert!(matches!(
            tracker.surface().viewport(),
            ViewportCommand::FitBounds { .. }
        ));
    }

    #[tokio::test]
    async fn test_locate_self_without_target_does_not_redraw() {
        let fix = DeviceFix {
            position: Position::new(-37.8245005, 145.3032913),
            accuracy: Some(12.0),
        };
        let mut tracker =
            GeoTrackerController::new(GeoJsonGateway::new(), locator_reporting(Ok(fix)));

        let located = tracker.locate_self().await.unwrap();
        assert_eq!(fix, located.fix);
        assert!(located.plan.is_none());
        assert_eq!("-37.8245005", tracker.inputs().my_latitude);
        assert_eq!("145.3032913", tracker.inputs().my_longitude);
        assert_eq!(0, tracker.surface().markers().count());
    }

    #[tokio::test]
    async fn test_locate_self_with_target_redraws() {
        let fix = DeviceFix {
            position: Position::new(40.0, -75.0),
            accuracy: None,
        };
        let mut tracker = GeoTrackerController::with_inputs(
            GeoJsonGateway::new(),
            locator_reporting(Ok(fix)),
            CoordinateInputs::new("", "", "40.0", "-74.0"),
        );

        let located = tracker.locate_self().await.unwrap();
        let plan = located.plan.unwrap();
        assert_eq!(2, plan.markers.len());
        assert!(plan.distance_panel_visible());
        assert_eq!(Some(Position::new(40.0, -75.0)), tracker.state().me);
        assert_eq!(2, tracker.surface().markers().count());
    }

    #[tokio::test]
    async fn test_locate_self_permission_denied_keeps_inputs() {
        let inputs = CoordinateInputs::new("1.5", "2.5", "40.0", "-74.0");
        let mut tracker = GeoTrackerController::with_inputs(
            GeoJsonGateway::new(),
            locator_reporting(Err(LocationError::PermissionDenied)),
            inputs.clone(),
        );

        assert_eq!(
            Err(LocationError::PermissionDenied),
            tracker.locate_self().await
        );
        assert_eq!(&inputs, tracker.inputs());
        assert_eq!(0, tracker.surface().markers().count());
    }

    #[tokio::test]
    async fn test_locate_self_failure_kinds_pass_through() {
        for error in [
            LocationError::PositionUnavailable,
            LocationError::Timeout,
            LocationError::Unknown { code: 42 },
            LocationError::Unsupported,
        ] {
            let mut tracker =
                GeoTrackerController::new(GeoJsonGateway::new(), locator_reporting(Err(error)));
            assert_eq!(Err(error), tracker.locate_self().await);
            assert!(tracker.inputs().my_latitude.is_empty());
        }
    }
}
