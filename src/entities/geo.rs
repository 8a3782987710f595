use geo::{Bearing, Closest, ClosestPoint, Distance, Haversine, Line, LineInterpolatePoint};
use geo_types::{Coord, LineString, Point};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance in meters.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        Haversine::distance(Point::from(*self), Point::from(*other))
    }

    /// Linear interpolation in coordinate space, `fraction` in [0, 1].
    pub fn lerp(&self, other: &GeoPoint, fraction: f64) -> GeoPoint {
        segment(*self, *other)
            .line_interpolate_point(fraction.clamp(0.0, 1.0))
            .map(GeoPoint::from)
            .unwrap_or(*self)
    }

    /// Initial bearing towards `other` in degrees, clockwise from north.
    pub fn bearing_to(&self, other: &GeoPoint) -> f64 {
        Haversine::bearing(Point::from(*self), Point::from(*other)).rem_euclid(360.0)
    }
}

impl From<GeoPoint> for Point<f64> {
    fn from(point: GeoPoint) -> Self {
        Point::new(point.longitude, point.latitude)
    }
}

impl From<GeoPoint> for Coord<f64> {
    fn from(point: GeoPoint) -> Self {
        Coord {
            x: point.longitude,
            y: point.latitude,
        }
    }
}

impl From<Point<f64>> for GeoPoint {
    fn from(point: Point<f64>) -> Self {
        GeoPoint::new(point.y(), point.x())
    }
}

fn segment(a: GeoPoint, b: GeoPoint) -> Line<f64> {
    Line::new(Coord::from(a), Coord::from(b))
}

fn segment_length(line: &Line<f64>) -> f64 {
    Haversine::distance(line.start_point(), line.end_point())
}

/// Sum of the haversine lengths of consecutive segments.
pub fn polyline_length(points: &[GeoPoint]) -> f64 {
    line_string(points).lines().map(|l| segment_length(&l)).sum()
}

/// Point located `distance` meters along the polyline; clamped to its ends.
pub fn point_along(points: &[GeoPoint], distance: f64) -> Option<GeoPoint> {
    let first = points.first()?;

    if distance <= 0.0 {
        return Some(*first);
    }

    let mut travelled = 0.0;

    for line in line_string(points).lines() {
        let length = segment_length(&line);

        if length > 0.0 && travelled + length >= distance {
            return line
                .line_interpolate_point((distance - travelled) / length)
                .map(GeoPoint::from);
        }

        travelled += length;
    }

    points.last().copied()
}

/// Where a position lands when snapped onto a polyline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub point: GeoPoint,
    /// Meters from the polyline start to `point`.
    pub distance_along: f64,
    /// Meters between the original position and `point`.
    pub offset: f64,
}

/// Snaps `position` onto the nearest segment of `points`.
pub fn project(points: &[GeoPoint], position: &GeoPoint) -> Option<Projection> {
    if points.len() == 1 {
        return Some(Projection {
            point: points[0],
            distance_along: 0.0,
            offset: points[0].distance_to(position),
        });
    }

    let target = Point::from(*position);
    let mut best: Option<Projection> = None;
    let mut travelled = 0.0;

    for line in line_string(points).lines() {
        let closest = match line.closest_point(&target) {
            Closest::Intersection(p) | Closest::SinglePoint(p) => p,
            Closest::Indeterminate => line.start_point(),
        };

        let candidate = Projection {
            point: GeoPoint::from(closest),
            distance_along: travelled + Haversine::distance(line.start_point(), closest),
            offset: Haversine::distance(closest, target),
        };

        if best.map_or(true, |p| candidate.offset < p.offset) {
            best = Some(candidate);
        }

        travelled += segment_length(&line);
    }

    best
}

pub fn line_string(points: &[GeoPoint]) -> LineString<f64> {
    points.iter().map(|&p| Coord::from(p)).collect::<Vec<_>>().into()
}

#[test]
fn distance_between_known_points() {
    // one degree of latitude is roughly 111.2 km
    let a = GeoPoint::new(52.0, 4.0);
    let b = GeoPoint::new(53.0, 4.0);

    let d = a.distance_to(&b);
    assert!((d - 111_195.0).abs() < 100.0, "distance was {}", d);
}

#[test]
fn point_along_is_clamped_to_the_polyline() {
    let points = vec![
        GeoPoint::new(0.0, 0.0),
        GeoPoint::new(0.0, 0.01),
        GeoPoint::new(0.0, 0.02),
    ];
    let length = polyline_length(&points);

    assert_eq!(point_along(&points, -5.0), Some(points[0]));
    assert_eq!(point_along(&points, length + 10.0), Some(points[2]));

    let half = point_along(&points, length / 2.0).unwrap();
    assert!((half.longitude - 0.01).abs() < 1e-9);
    assert!(point_along(&[], 10.0).is_none());
}

#[test]
fn line_string_uses_lon_lat_order() {
    let line = line_string(&[GeoPoint::new(52.37, 4.89)]);
    let coord = line.0[0];

    assert_eq!(coord.x, 4.89);
    assert_eq!(coord.y, 52.37);
}

#[test]
fn project_snaps_to_nearest_segment() {
    let points = vec![
        GeoPoint::new(0.0, 0.0),
        GeoPoint::new(0.0, 0.01),
        GeoPoint::new(0.01, 0.01),
    ];

    let projection = project(&points, &GeoPoint::new(0.001, 0.005)).unwrap();

    assert!((projection.point.latitude - 0.0).abs() < 1e-9);
    assert!((projection.point.longitude - 0.005).abs() < 1e-9);
    assert!((projection.distance_along - points[0].distance_to(&points[1]) / 2.0).abs() < 1.0);
    assert!((projection.offset - 111.2).abs() < 1.0);

    let on_second = project(&points, &GeoPoint::new(0.005, 0.0102)).unwrap();
    assert!((on_second.point.longitude - 0.01).abs() < 1e-9);
    assert!(on_second.distance_along > points[0].distance_to(&points[1]));
    assert!(project(&[], &points[0]).is_none());
}

#[test]
fn bearing_follows_compass() {
    let origin = GeoPoint::new(35.0, 139.0);

    assert!(origin.bearing_to(&GeoPoint::new(36.0, 139.0)).abs() < 0.1);
    assert!((origin.bearing_to(&GeoPoint::new(35.0, 140.0)) - 90.0).abs() < 1.0);
    assert!((origin.bearing_to(&GeoPoint::new(34.0, 139.0)) - 180.0).abs() < 0.1);
    assert!((origin.bearing_to(&GeoPoint::new(35.0, 138.0)) - 270.0).abs() < 1.0);
}
