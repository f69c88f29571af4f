//! State boundaries for the participation map.
//!
//! The boundary document is a GeoJSON `FeatureCollection` with one feature
//! per state, identified by `properties.name`. Participation counts are
//! keyed by state code, so they are joined through [`state_display_name`].

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::data::views::StateCount;
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// State codes
// ---------------------------------------------------------------------------

const STATE_NAMES: [(&str, &str); 27] = [
    ("AC", "Acre"),
    ("AL", "Alagoas"),
    ("AP", "Amapá"),
    ("AM", "Amazonas"),
    ("BA", "Bahia"),
    ("CE", "Ceará"),
    ("DF", "Distrito Federal"),
    ("ES", "Espírito Santo"),
    ("GO", "Goiás"),
    ("MA", "Maranhão"),
    ("MT", "Mato Grosso"),
    ("MS", "Mato Grosso do Sul"),
    ("MG", "Minas Gerais"),
    ("PA", "Pará"),
    ("PB", "Paraíba"),
    ("PR", "Paraná"),
    ("PE", "Pernambuco"),
    ("PI", "Piauí"),
    ("RJ", "Rio de Janeiro"),
    ("RN", "Rio Grande do Norte"),
    ("RS", "Rio Grande do Sul"),
    ("RO", "Rondônia"),
    ("RR", "Roraima"),
    ("SC", "Santa Catarina"),
    ("SP", "São Paulo"),
    ("SE", "Sergipe"),
    ("TO", "Tocantins"),
];

/// Display name for a state code, as used by the boundary document.
/// Unknown codes (or values that already are names) come back unchanged.
pub fn state_display_name(code: &str) -> &str {
    STATE_NAMES
        .iter()
        .find(|(uf, _)| uf.eq_ignore_ascii_case(code.trim()))
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

// ---------------------------------------------------------------------------
// GeoJSON
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: Properties,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Properties {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    #[serde(other)]
    Unsupported,
}

/// A closed ring of `[lon, lat]` points.
pub type Ring = Vec<[f64; 2]>;

/// One state's outline. Only outer rings are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct StateShape {
    pub name: String,
    pub rings: Vec<Ring>,
    /// Fill triangles per ring, as indices into that ring.
    pub triangles: Vec<Vec<[usize; 3]>>,
}

impl StateShape {
    /// Even-odd hit test against every ring.
    pub fn contains(&self, point: [f64; 2]) -> bool {
        self.rings.iter().any(|ring| ring_contains(ring, point))
    }
}

/// Parsed boundary document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateBoundaries {
    pub shapes: Vec<StateShape>,
}

impl StateBoundaries {
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        let collection: FeatureCollection = serde_json::from_str(body)?;
        let shapes = collection
            .features
            .into_iter()
            .map(|feature| {
                let rings = feature.geometry.map(outer_rings).unwrap_or_default();
                let triangles = rings.iter().map(|ring| triangulate(ring)).collect();
                StateShape {
                    name: feature.properties.name,
                    rings,
                    triangles,
                }
            })
            .collect();
        Ok(Self { shapes })
    }

    /// `(min, max)` corners over every ring, as `[lon, lat]`.
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        self.shapes
            .iter()
            .flat_map(|shape| shape.rings.iter().flatten())
            .fold(None, |acc, &[x, y]| match acc {
                None => Some(([x, y], [x, y])),
                Some(([x0, y0], [x1, y1])) => {
                    Some(([x0.min(x), y0.min(y)], [x1.max(x), y1.max(y)]))
                }
            })
    }

    /// Blocking fetch and parse. No retry; the caller decides.
    pub fn fetch(url: &str) -> Result<Self, DashboardError> {
        let unavailable = |reason: String| DashboardError::DependencyUnavailable {
            url: url.to_string(),
            reason,
        };

        log::info!("Fetching state boundaries from {url}");
        let response = ureq::get(url)
            .call()
            .map_err(|err| unavailable(format!("request failed: {err}")))?;
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|err| unavailable(format!("reading body failed: {err}")))?;
        Self::parse(&body).map_err(|err| unavailable(format!("invalid GeoJSON: {err}")))
    }

    /// Shape under `point`, if any.
    pub fn shape_at(&self, point: [f64; 2]) -> Option<&StateShape> {
        self.shapes.iter().find(|shape| shape.contains(point))
    }
}

fn to_ring(points: Vec<Vec<f64>>) -> Ring {
    points
        .into_iter()
        .filter(|p| p.len() >= 2)
        .map(|p| [p[0], p[1]])
        .collect()
}

fn outer_rings(geometry: Geometry) -> Vec<Ring> {
    match geometry {
        Geometry::Polygon { coordinates } => {
            coordinates.into_iter().take(1).map(to_ring).collect()
        }
        Geometry::MultiPolygon { coordinates } => coordinates
            .into_iter()
            .filter_map(|polygon| polygon.into_iter().next())
            .map(to_ring)
            .collect(),
        Geometry::Unsupported => Vec::new(),
    }
}

fn ring_contains(ring: &[[f64; 2]], [x, y]: [f64; 2]) -> bool {
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for i in 0..ring.len() {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn cross(o: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

fn signed_area(points: &[[f64; 2]]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let [x0, y0] = points[i];
            let [x1, y1] = points[(i + 1) % n];
            x0 * y1 - x1 * y0
        })
        .sum::<f64>()
        / 2.0
}

fn in_triangle(p: [f64; 2], a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> bool {
    cross(a, b, p) >= 0.0 && cross(b, c, p) >= 0.0 && cross(c, a, p) >= 0.0
}

/// Ear-clipping triangulation of a simple polygon. A repeated closing
/// point is ignored. Degenerate leftovers are fanned so the fill never has
/// holes.
pub fn triangulate(ring: &[[f64; 2]]) -> Vec<[usize; 3]> {
    let mut n = ring.len();
    if n >= 2 && ring[0] == ring[n - 1] {
        n -= 1;
    }
    if n < 3 {
        return Vec::new();
    }

    let mut remaining: Vec<usize> = if signed_area(&ring[..n]) >= 0.0 {
        (0..n).collect()
    } else {
        (0..n).rev().collect()
    };
    let mut triangles = Vec::with_capacity(n - 2);
    let mut pos = 0;
    let mut stalled = 0;

    while remaining.len() > 3 {
        let m = remaining.len();
        let prev = remaining[(pos + m - 1) % m];
        let cur = remaining[pos];
        let next = remaining[(pos + 1) % m];
        let (a, b, c) = (ring[prev], ring[cur], ring[next]);
        let turn = cross(a, b, c);

        // Collinear vertices add no area and would block every ear around them.
        if turn.abs() < 1e-12 {
            remaining.remove(pos);
            if pos >= remaining.len() {
                pos = 0;
            }
            stalled = 0;
            continue;
        }

        let is_ear = turn > 0.0
            && remaining.iter().all(|&k| {
                let p = ring[k];
                p == a || p == b || p == c || !in_triangle(p, a, b, c)
            });

        if is_ear {
            triangles.push([prev, cur, next]);
            remaining.remove(pos);
            if pos >= remaining.len() {
                pos = 0;
            }
            stalled = 0;
        } else {
            pos = (pos + 1) % m;
            stalled += 1;
            if stalled >= m {
                log::debug!("triangulation stalled with {m} vertices left, fanning");
                break;
            }
        }
    }

    for k in 1..remaining.len().saturating_sub(1) {
        triangles.push([remaining[0], remaining[k], remaining[k + 1]]);
    }
    triangles
}

// ---------------------------------------------------------------------------
// Choropleth join
// ---------------------------------------------------------------------------

/// Participation joined onto the boundary features.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChoroplethJoin {
    /// One entry per feature, in document order; 0 when not counted.
    pub values: Vec<(String, u64)>,
    /// Counted state codes that matched no feature.
    pub unmatched: Vec<String>,
}

impl ChoroplethJoin {
    pub fn max_value(&self) -> u64 {
        self.values.iter().map(|(_, v)| *v).max().unwrap_or(0)
    }
}

/// Join per-state counts to features by display name.
pub fn join_participation(boundaries: &StateBoundaries, counts: &[StateCount]) -> ChoroplethJoin {
    // A code and its spelled-out name land on the same feature.
    let mut by_name: BTreeMap<&str, u64> = BTreeMap::new();
    for c in counts {
        *by_name.entry(state_display_name(&c.state_code)).or_default() += c.count;
    }

    let values = boundaries
        .shapes
        .iter()
        .map(|shape| {
            let count = by_name.get(shape.name.as_str()).copied().unwrap_or(0);
            (shape.name.clone(), count)
        })
        .collect();

    let unmatched = counts
        .iter()
        .filter(|c| {
            let name = state_display_name(&c.state_code);
            !boundaries.shapes.iter().any(|shape| shape.name == name)
        })
        .map(|c| c.state_code.clone())
        .collect();

    ChoroplethJoin { values, unmatched }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"name": "São Paulo", "sigla": "SP"},
                "geometry": {"type": "Polygon", "coordinates": [
                    [[0, 0], [4, 0], [4, 4], [0, 4], [0, 0]],
                    [[1, 1], [2, 1], [2, 2], [1, 1]]
                ]}
            },
            {
                "type": "Feature",
                "properties": {"name": "Bahia"},
                "geometry": {"type": "MultiPolygon", "coordinates": [
                    [[[10, 0], [12, 0], [12, 2], [10, 0]]],
                    [[[20, 0, 5], [22, 0, 5], [22, 2, 5], [20, 0, 5]]]
                ]}
            },
            {
                "type": "Feature",
                "properties": {"name": "Acre"},
                "geometry": {"type": "Point", "coordinates": [1, 1]}
            }
        ]
    }"#;

    #[test]
    fn parses_polygons_and_multipolygons() {
        let boundaries = StateBoundaries::parse(DOC).unwrap();
        assert_eq!(boundaries.shapes.len(), 3);
        assert_eq!(boundaries.shapes[0].rings.len(), 1);
        assert_eq!(boundaries.shapes[1].rings.len(), 2);
        assert_eq!(boundaries.shapes[1].rings[1][0], [20.0, 0.0]);
        assert!(boundaries.shapes[2].rings.is_empty());
    }

    #[test]
    fn hit_test_finds_state() {
        let boundaries = StateBoundaries::parse(DOC).unwrap();
        assert_eq!(boundaries.shape_at([3.0, 3.0]).unwrap().name, "São Paulo");
        assert_eq!(boundaries.shape_at([21.5, 0.5]).unwrap().name, "Bahia");
        assert!(boundaries.shape_at([8.0, 8.0]).is_none());
    }

    #[test]
    fn bounds_cover_every_ring() {
        let boundaries = StateBoundaries::parse(DOC).unwrap();
        assert_eq!(boundaries.bounds(), Some(([0.0, 0.0], [22.0, 4.0])));
        assert_eq!(StateBoundaries::default().bounds(), None);
    }

    fn triangle_area(ring: &[[f64; 2]], t: [usize; 3]) -> f64 {
        cross(ring[t[0]], ring[t[1]], ring[t[2]]).abs() / 2.0
    }

    #[test]
    fn triangulates_concave_ring_without_losing_area() {
        // L shape, clockwise, closed.
        let ring = vec![
            [0.0, 0.0],
            [0.0, 3.0],
            [1.0, 3.0],
            [1.0, 1.0],
            [3.0, 1.0],
            [3.0, 0.0],
            [0.0, 0.0],
        ];
        let triangles = triangulate(&ring);
        assert_eq!(triangles.len(), 4);
        let area: f64 = triangles.iter().map(|&t| triangle_area(&ring, t)).sum();
        assert!((area - 5.0).abs() < 1e-9, "area {area}");
    }

    #[test]
    fn collinear_vertices_are_dropped_not_fanned() {
        // The L shape again, with extra points along two straight edges.
        let ring = vec![
            [0.0, 0.0],
            [0.0, 1.5],
            [0.0, 3.0],
            [1.0, 3.0],
            [1.0, 1.0],
            [2.0, 1.0],
            [3.0, 1.0],
            [3.0, 0.0],
            [0.0, 0.0],
        ];
        let triangles = triangulate(&ring);
        assert_eq!(triangles.len(), 4);
        assert!(triangles.iter().all(|&t| triangle_area(&ring, t) > 1e-9));
        let area: f64 = triangles.iter().map(|&t| triangle_area(&ring, t)).sum();
        assert!((area - 5.0).abs() < 1e-9, "area {area}");
    }

    #[test]
    fn degenerate_rings_have_no_triangles() {
        assert!(triangulate(&[[0.0, 0.0], [1.0, 1.0]]).is_empty());
        assert_eq!(triangulate(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]).len(), 1);
    }

    #[test]
    fn codes_map_to_display_names() {
        assert_eq!(state_display_name("SP"), "São Paulo");
        assert_eq!(state_display_name("df"), "Distrito Federal");
        assert_eq!(state_display_name("Goiás"), "Goiás");
    }

    #[test]
    fn join_fills_missing_states_with_zero() {
        let boundaries = StateBoundaries::parse(DOC).unwrap();
        let counts = vec![
            StateCount { state_code: "SP".into(), count: 12 },
            StateCount { state_code: "XX".into(), count: 1 },
        ];
        let join = join_participation(&boundaries, &counts);
        assert_eq!(
            join.values,
            vec![
                ("São Paulo".to_string(), 12),
                ("Bahia".to_string(), 0),
                ("Acre".to_string(), 0),
            ]
        );
        assert_eq!(join.unmatched, vec!["XX".to_string()]);
        assert_eq!(join.max_value(), 12);
    }

    #[test]
    fn join_sums_codes_and_names_of_the_same_state() {
        let boundaries = StateBoundaries::parse(DOC).unwrap();
        let counts = vec![
            StateCount { state_code: "SP".into(), count: 10 },
            StateCount { state_code: "São Paulo".into(), count: 5 },
            StateCount { state_code: "sp".into(), count: 2 },
        ];
        let join = join_participation(&boundaries, &counts);
        assert_eq!(join.values[0], ("São Paulo".to_string(), 17));
        assert!(join.unmatched.is_empty());
    }

    #[test]
    fn unreachable_boundary_source_is_a_dependency_error() {
        let err = StateBoundaries::fetch("http://127.0.0.1:1/x.json").unwrap_err();
        assert!(matches!(err, DashboardError::DependencyUnavailable { .. }));
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(StateBoundaries::parse(r#"{"features": 3}"#).is_err());
    }
}
