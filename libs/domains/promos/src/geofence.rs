//! Point-in-polygon test for event geofences.
//!
//! Coordinates are treated as planar (`lng` = x, `lat` = y), which is accurate
//! enough for city-scale event areas that do not cross the antimeridian.

use crate::models::Coordinate;

const EPSILON: f64 = 1e-12;

/// A polygon borrowed from an event's `event_location`.
#[derive(Debug, Clone, Copy)]
pub struct Geofence<'a> {
    vertices: &'a [Coordinate],
}

impl<'a> Geofence<'a> {
    pub fn new(vertices: &'a [Coordinate]) -> Self {
        Self { vertices }
    }

    /// An empty geofence places no restriction.
    pub fn is_unbounded(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Ray casting; points on an edge or vertex count as inside.
    pub fn contains(&self, point: Coordinate) -> bool {
        if self.is_unbounded() {
            return true;
        }

        let n = self.vertices.len();
        let mut inside = false;
        let mut j = n - 1;

        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[j];

            if on_segment(a, b, point) {
                return true;
            }

            if (a.lat > point.lat) != (b.lat > point.lat) {
                let crossing_lng = (b.lng - a.lng) * (point.lat - a.lat) / (b.lat - a.lat) + a.lng;
                if point.lng < crossing_lng {
                    inside = !inside;
                }
            }

            j = i;
        }

        inside
    }
}

fn on_segment(a: Coordinate, b: Coordinate, p: Coordinate) -> bool {
    let cross = (b.lng - a.lng) * (p.lat - a.lat) - (b.lat - a.lat) * (p.lng - a.lng);
    if cross.abs() > EPSILON {
        return false;
    }

    p.lng >= a.lng.min(b.lng) - EPSILON
        && p.lng <= a.lng.max(b.lng) + EPSILON
        && p.lat >= a.lat.min(b.lat) - EPSILON
        && p.lat <= a.lat.max(b.lat) + EPSILON
}
