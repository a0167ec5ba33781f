//! The map surface that markers, lines and viewport changes are drawn on.
//! See [`Port`].

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::{
    gis::Position,
    plan::{ConnectionLine, LineStyle, Marker, Role, ViewportCommand},
};

/// Center of the map before anything has been tracked.
pub const INITIAL_CENTER: (f64, f64) = (20.0, 0.0);
/// Zoom of the map before anything has been tracked.
pub const INITIAL_ZOOM: u8 = 2;

/// Drawing primitives of a map rendering widget. Rendering failures are not reported back.
/// See [`GeoJsonGateway`] for a headless implementation.
#[cfg_attr(test, mockall::automock)]
pub trait Port: Send {
    /// Place (or replace) the marker for `marker.role`.
    fn place_marker(&mut self, marker: &Marker);
    /// Remove the marker for `role`, if any.
    fn clear_marker(&mut self, role: Role);
    /// Draw (or replace) the line between two positions.
    fn draw_line(&mut self, from: &Position, to: &Position, style: &LineStyle);
    /// Remove the line, if any.
    fn clear_line(&mut self);
    /// Center the view on `center` at `zoom`.
    fn set_viewport_center(&mut self, center: &Position, zoom: u8);
    /// Fit all `points` in view, leaving `padding_px` on each side, zooming in no further than
    /// `max_zoom`.
    fn fit_viewport(&mut self, points: &[Position], padding_px: u32, max_zoom: u8);
}

/// Headless implementation of [`Port`] which keeps the current map layers in memory and exports
/// them as a GeoJSON `FeatureCollection`.
#[derive(Clone, Debug)]
pub struct GeoJsonGateway {
    markers: BTreeMap<Role, Marker>,
    line: Option<ConnectionLine>,
    viewport: ViewportCommand,
}

impl Default for GeoJsonGateway {
    fn default() -> Self {
        let (latitude, longitude) = INITIAL_CENTER;
        Self {
            markers: BTreeMap::new(),
            line: None,
            viewport: ViewportCommand::Center {
                center: Position::new(latitude, longitude),
                zoom: INITIAL_ZOOM,
            },
        }
    }
}

impl GeoJsonGateway {
    /// Construct a new [`GeoJsonGateway`] showing the initial world view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Markers currently on the map, ordered by [`Role`].
    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.values()
    }

    /// The marker for `role`, if placed.
    pub fn marker(&self, role: Role) -> Option<&Marker> {
        self.markers.get(&role)
    }

    /// The connecting line, if drawn.
    pub fn line(&self) -> Option<&ConnectionLine> {
        self.line.as_ref()
    }

    /// The last viewport change applied to the map.
    pub fn viewport(&self) -> &ViewportCommand {
        &self.viewport
    }

    /// Export the map as a GeoJSON `FeatureCollection`. The viewport is included as the foreign
    /// member `viewport`, and a `bbox` is added when the view fits several points.
    pub fn to_geojson(&self) -> Value {
        let mut features: Vec<Value> = self
            .markers
            .values()
            .map(|marker| {
                json!({
                    "type": "Feature",
                    "geometry": {
                        "type": "Point",
                        "coordinates": coordinates(&marker.position),
                    },
                    "properties": {
                        "role": marker.role,
                        "title": marker.role.title(),
                        "popup": marker.popup(),
                    },
                })
            })
            .collect();

        if let Some(line) = &self.line {
            features.push(json!({
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": [coordinates(&line.from), coordinates(&line.to)],
                },
                "properties": {
                    "stroke": line.style.color,
                    "stroke-width": line.style.weight,
                    "stroke-opacity": line.style.opacity,
                    "stroke-dasharray": line.style.dash_array,
                },
            }));
        }

        let mut collection = json!({
            "type": "FeatureCollection",
            "features": features,
            "viewport": self.viewport,
        });

        if let ViewportCommand::FitBounds { points, .. } = &self.viewport {
            if let Some(bbox) = bounding_box(points) {
                collection["bbox"] = json!(bbox);
            }
        }

        collection
    }
}

/// GeoJSON positions are `[longitude, latitude]`.
fn coordinates(position: &Position) -> [f64; 2] {
    [position.longitude, position.latitude]
}

/// `[west, south, east, north]`
fn bounding_box(points: &[Position]) -> Option<[f64; 4]> {
    let first = points.first()?;
    Some(points.iter().fold(
        [
            first.longitude,
            first.latitude,
            first.longitude,
            first.latitude,
        ],
        |[west, south, east, north], point| {
            [
                west.min(point.longitude),
                south.min(point.latitude),
                east.max(point.longitude),
                north.max(point.latitude),
            ]
        },
    ))
}

impl Port for GeoJsonGateway {
    fn place_marker(&mut self, marker: &Marker) {
        tracing::trace!("place {} marker at {}", marker.role, marker.position);
        self.markers.insert(marker.role, *marker);
    }

    fn clear_marker(&mut self, role: Role) {
        self.markers.remove(&role);
    }

    fn draw_line(&mut self, from: &Position, to: &Position, style: &LineStyle) {
        tracing::trace!("draw line from {} to {}", from, to);
        self.line = Some(ConnectionLine {
            from: *from,
            to: *to,
            style: *style,
        });
    }

    fn clear_line(&mut self) {
        self.line = None;
    }

    fn set_viewport_center(&mut self, center: &Position, zoom: u8) {
        self.viewport = ViewportCommand::Center {
            center: *center,
            zoom,
        };
    }

    fn fit_viewport(&mut self, points: &[Position], padding_px: u32, max_zoom: u8) {
        self.viewport = ViewportCommand::FitBounds {
            points: points.to_vec(),
            padding_px,
            max_zoom,
        };
    }
}

#[cfg(test)]
mod test {
    use crate::{
        gis::Position,
        input::TrackingState,
        plan::{RenderPlan, Role, ViewportCommand},
    };

    use super::{GeoJsonGateway, Port};

    fn both() -> TrackingState {
        TrackingState {
            me: Some(Position::new(40.0, -75.0)),
            target: Some(Position::new(41.0, -74.0)),
        }
    }

    #[test]
    fn test_initial_view() {
        let surface = GeoJsonGateway::new();
        assert_eq!(0, surface.markers().count());
        assert_eq!(
            &ViewportCommand::Center {
                center: Position::new(20.0, 0.0),
                zoom: 2
            },
            surface.viewport()
        );
    }

    #[test]
    fn test_apply_plans_replaces_layers() {
        let mut surface = GeoJsonGateway::new();
        RenderPlan::from_state(&both()).apply(&mut surface);
        assert_eq!(2, surface.markers().count());
        assert!(surface.line().is_some());

        RenderPlan::from_state(&TrackingState {
            me: None,
            target: Some(Position::new(1.0, 1.0)),
        })
        .apply(&mut surface);
        assert!(surface.marker(Role::Me).is_none());
        assert_eq!(
            Position::new(1.0, 1.0),
            surface.marker(Role::Target).unwrap().position
        );
        assert!(surface.line().is_none());

        // An empty plan clears the layers but keeps the viewport.
        RenderPlan::from_state(&TrackingState::default()).apply(&mut surface);
        assert_eq!(0, surface.markers().count());
        assert_eq!(
            &ViewportCommand::Center {
                center: Position::new(1.0, 1.0),
                zoom: 15
            },
            surface.viewport()
        );
    }

    #[test]
    fn test_to_geojson() {
        let mut surface = GeoJsonGateway::new();
        RenderPlan::from_state(&both()).apply(&mut surface);
        let geojson = surface.to_geojson();

        assert_eq!("FeatureCollection", geojson["type"]);
        let features = geojson["features"].as_array().unwrap();
        assert_eq!(3, features.len());
        assert_eq!(
            serde_json::json!({
                "type": "Point",
                "coordinates": [-75.0, 40.0],
            }),
            features[0]["geometry"]
        );
        assert_eq!("me", features[0]["properties"]["role"]);
        assert_eq!("Your Location", features[0]["properties"]["title"]);
        assert_eq!("40.000000, -75.000000", features[0]["properties"]["popup"]);
        assert_eq!("target", features[1]["properties"]["role"]);
        assert_eq!("LineString", features[2]["geometry"]["type"]);
        assert_eq!("10, 10", features[2]["properties"]["stroke-dasharray"]);
        assert_eq!("fit_bounds", geojson["viewport"]["type"]);
        assert_eq!(80, geojson["viewport"]["padding_px"]);
        assert_eq!(serde_json::json!([-75.0, 40.0, -74.0, 41.0]), geojson["bbox"]);
    }

    #[test]
    fn test_to_geojson_without_fit_has_no_bbox() {
        let mut surface = GeoJsonGateway::new();
        surface.set_viewport_center(&Position::new(5.0, 6.0), 15);
        let geojson = surface.to_geojson();
        assert!(geojson.get("bbox").is_none());
        assert_eq!(0, geojson["features"].as_array().unwrap().len());
    }
}
