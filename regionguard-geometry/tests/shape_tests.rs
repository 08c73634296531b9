use pretty_assertions::assert_eq;
use regionguard_geometry::{Cuboid, GeometryError, Polygon, Shape, ShapeKind};
use regionguard_types::{BlockVector2, BlockVector3};

fn v3(x: i32, y: i32, z: i32) -> BlockVector3 {
    BlockVector3::new(x, y, z)
}

fn v2(x: i32, z: i32) -> BlockVector2 {
    BlockVector2::new(x, z)
}

fn polygon(points: &[(i32, i32)], min_y: i32, max_y: i32) -> Shape {
    let points = points.iter().map(|&(x, z)| v2(x, z)).collect();
    Shape::Polygon(Polygon::new(points, min_y, max_y).unwrap())
}

// ── Containment ─────────────────────────────────────────────────

#[test]
fn cuboid_contains_max_corner_inclusively() {
    let shape = Shape::cuboid(v3(0, 0, 0), v3(10, 10, 10));
    assert!(shape.contains(v3(10, 10, 10)));
    assert!(shape.contains(v3(0, 0, 0)));
    assert!(!shape.contains(v3(11, 10, 10)));
    assert!(!shape.contains(v3(10, 11, 10)));
    assert!(!shape.contains(v3(10, 10, 11)));
    assert!(!shape.contains(v3(-1, 0, 0)));
}

#[test]
fn cuboid_corners_are_normalised() {
    let c = Cuboid::new(v3(5, 9, -2), v3(-5, 1, 2));
    assert_eq!(c.min(), v3(-5, 1, -2));
    assert_eq!(c.max(), v3(5, 9, 2));
}

#[test]
fn polygon_contains_interior_edges_and_corners() {
    let tri = polygon(&[(0, 0), (10, 0), (0, 10)], 0, 5);
    assert!(tri.contains(v3(2, 2, 2)));
    assert!(tri.contains(v3(0, 0, 0)), "corner");
    assert!(tri.contains(v3(5, 3, 0)), "edge");
    assert!(tri.contains(v3(5, 3, 5)), "hypotenuse");
    assert!(!tri.contains(v3(6, 3, 6)));
    assert!(!tri.contains(v3(2, 6, 2)), "above max y");
    assert!(!tri.contains(v3(2, -1, 2)), "below min y");
}

#[test]
fn concave_polygon_excludes_notch() {
    // U shape with the notch between x=4..6 above z=4
    let u = polygon(
        &[(0, 0), (10, 0), (10, 10), (6, 10), (6, 4), (4, 4), (4, 10), (0, 10)],
        0,
        0,
    );
    assert!(u.contains(v3(2, 0, 8)));
    assert!(u.contains(v3(8, 0, 8)));
    assert!(!u.contains(v3(5, 0, 8)));
    assert!(u.contains(v3(5, 0, 2)));
}

#[test]
fn polygon_requires_three_points() {
    let err = Polygon::new(vec![v2(0, 0), v2(1, 1)], 0, 1).unwrap_err();
    assert_eq!(err, GeometryError::TooFewPoints(2));
}

#[test]
fn global_contains_everything() {
    assert!(Shape::Global.contains(v3(i32::MIN, i32::MAX, 0)));
    assert!(!Shape::Global.is_physical());
    assert_eq!(Shape::Global.kind(), ShapeKind::Global);
}

// ── Intersection ────────────────────────────────────────────────

fn square() -> Shape {
    Shape::cuboid(v3(100, 40, 0), v3(140, 128, 40))
}

fn assert_intersection(a: &Shape, b: &Shape, expected: bool) {
    assert_eq!(a.intersects(b), expected, "{a:?} vs {b:?}");
    assert_eq!(b.intersects(a), expected, "{b:?} vs {a:?}");
}

#[test]
fn cuboid_against_cuboids() {
    let sq = square();
    assert_intersection(&sq, &Shape::cuboid(v3(80, 40, -20), v3(120, 128, 20)), true);
    assert_intersection(&sq, &Shape::cuboid(v3(98, 45, 20), v3(103, 50, 25)), true);
    assert_intersection(&sq, &Shape::cuboid(v3(-500, 0, -600), v3(1000, 128, 1000)), true);
    assert_intersection(&sq, &Shape::cuboid(v3(50, 40, -1), v3(150, 128, 2)), true);
    assert_intersection(&sq, &Shape::cuboid(v3(0, 40, 5), v3(1000, 128, 8)), true);
    assert_intersection(&sq, &Shape::cuboid(v3(141, 40, 0), v3(150, 128, 40)), false);
}

#[test]
fn cuboid_against_triangles() {
    let sq = square();
    assert_intersection(&sq, &polygon(&[(90, -10), (120, -10), (90, 20)], 0, 128), true);
    assert_intersection(&sq, &polygon(&[(90, -10), (105, -10), (90, 5)], 0, 128), false);
    assert_intersection(&sq, &polygon(&[(100, -10), (120, 50), (140, -20)], 60, 80), true);
}

#[test]
fn polygon_outside_height_range_does_not_intersect() {
    let sq = square();
    assert_intersection(&sq, &polygon(&[(90, -10), (120, -10), (90, 20)], 0, 39), false);
}

#[test]
fn rotated_triangle_touches_cuboid() {
    let cuboid = Shape::cuboid(v3(-3, -3, -3), v3(3, 3, 3));
    let rotations: [[(i32, i32); 3]; 4] = [
        [(1, 0), (4, 3), (4, -3)],
        [(0, 1), (-3, 4), (3, 4)],
        [(-1, 0), (-4, -3), (-4, 3)],
        [(0, -1), (3, -4), (-3, -4)],
    ];
    for tri in rotations {
        assert_intersection(&cuboid, &polygon(&tri, -3, 3), true);
    }
}

#[test]
fn nested_shapes_intersect_without_crossing_edges() {
    let outer = polygon(&[(0, 0), (100, 0), (100, 100), (0, 100)], 0, 10);
    let inner = Shape::cuboid(v3(40, 2, 40), v3(60, 4, 60));
    assert_intersection(&outer, &inner, true);

    let tiny = polygon(&[(50, 50), (52, 50), (51, 52)], 0, 10);
    assert_intersection(&outer, &tiny, true);
}

#[test]
fn global_intersects_everything() {
    assert_intersection(&Shape::Global, &square(), true);
    assert_intersection(&Shape::Global, &Shape::Global, true);
}

// ── Volume ──────────────────────────────────────────────────────

#[test]
fn volumes() {
    assert_eq!(Shape::cuboid(v3(0, 0, 0), v3(9, 9, 9)).volume(), 1000);
    assert_eq!(polygon(&[(0, 0), (9, 0), (9, 9), (0, 9)], 0, 9).volume(), 1000);
    assert_eq!(Shape::Global.volume(), u64::MAX);
}

#[test]
fn shape_serde_is_tagged() {
    let shape = polygon(&[(0, 0), (4, 0), (0, 4)], 3, 1);
    let json = serde_json::to_value(&shape).unwrap();
    assert_eq!(json["type"], "polygon");
    assert_eq!(json["min_y"], 1);
    let back: Shape = serde_json::from_value(json).unwrap();
    assert_eq!(back, shape);

    let bad = serde_json::json!({"type": "polygon", "points": [], "min_y": 0, "max_y": 1});
    assert!(serde_json::from_value::<Shape>(bad).is_err());
}
