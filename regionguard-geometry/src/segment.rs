//! Integer 2-D primitives shared by the polygon and intersection code.
//!
//! Everything is computed in `i64` so that products of two `i32`
//! differences never overflow.

use regionguard_types::BlockVector2;

fn cross(o: BlockVector2, a: BlockVector2, b: BlockVector2) -> i64 {
    let (ox, oz) = (i64::from(o.x), i64::from(o.z));
    (i64::from(a.x) - ox) * (i64::from(b.z) - oz) - (i64::from(a.z) - oz) * (i64::from(b.x) - ox)
}

/// `r` is collinear with `p..q`; checks it lies within the segment's box.
fn within(p: BlockVector2, q: BlockVector2, r: BlockVector2) -> bool {
    r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.z >= p.z.min(q.z) && r.z <= p.z.max(q.z)
}

/// Closed segment intersection: touching endpoints and collinear overlap
/// both count.
pub(crate) fn segments_intersect(
    a1: BlockVector2,
    a2: BlockVector2,
    b1: BlockVector2,
    b2: BlockVector2,
) -> bool {
    let d1 = cross(b1, b2, a1).signum();
    let d2 = cross(b1, b2, a2).signum();
    let d3 = cross(a1, a2, b1).signum();
    let d4 = cross(a1, a2, b2).signum();

    if d1 * d2 < 0 && d3 * d4 < 0 {
        return true;
    }

    (d1 == 0 && within(b1, b2, a1))
        || (d2 == 0 && within(b1, b2, a2))
        || (d3 == 0 && within(a1, a2, b1))
        || (d4 == 0 && within(a1, a2, b2))
}

/// Returns true if any edge of outline `a` touches any edge of outline `b`.
/// Both outlines are treated as closed rings.
pub(crate) fn edges_intersect(a: &[BlockVector2], b: &[BlockVector2]) -> bool {
    let (Some(&last_a), Some(&last_b)) = (a.last(), b.last()) else {
        return false;
    };

    let mut prev_a = last_a;
    for &pa in a {
        let mut prev_b = last_b;
        for &pb in b {
            if segments_intersect(prev_a, pa, prev_b, pb) {
                return true;
            }
            prev_b = pb;
        }
        prev_a = pa;
    }
    false
}

/// Point-in-polygon by crossing count, with vertices and edges counted as
/// inside.
pub(crate) fn ring_contains(points: &[BlockVector2], target: BlockVector2) -> bool {
    let Some(&last) = points.last() else {
        return false;
    };

    let (tx, tz) = (i64::from(target.x), i64::from(target.z));
    let mut inside = false;
    let mut old = last;

    for &new in points {
        if new == target {
            return true;
        }

        let (p1, p2) = if new.x > old.x { (old, new) } else { (new, old) };
        let (x1, z1) = (i64::from(p1.x), i64::from(p1.z));
        let (x2, z2) = (i64::from(p2.x), i64::from(p2.z));

        if x1 <= tx && tx <= x2 {
            let crossproduct = (tz - z1) * (x2 - x1) - (z2 - z1) * (tx - x1);
            if crossproduct == 0 {
                if (z1 <= tz) == (tz <= z2) {
                    return true;
                }
            } else if crossproduct < 0 && x1 != tx {
                inside = !inside;
            }
        }

        old = new;
    }

    inside
}

fn gcd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Number of lattice columns covered by a simple polygon, boundary included.
///
/// Pick's theorem: `A = I + B/2 - 1`, so `I + B = A + B/2 + 1`.
pub(crate) fn lattice_area(points: &[BlockVector2]) -> u64 {
    let Some(&last) = points.last() else {
        return 0;
    };

    let mut twice_area: i128 = 0;
    let mut boundary: i128 = 0;
    let mut prev = last;
    for &p in points {
        twice_area += i128::from(prev.x) * i128::from(p.z) - i128::from(p.x) * i128::from(prev.z);
        let dx = (i64::from(p.x) - i64::from(prev.x)).abs();
        let dz = (i64::from(p.z) - i64::from(prev.z)).abs();
        boundary += i128::from(gcd(dx, dz));
        prev = p;
    }

    let blocks = (twice_area.abs() + boundary) / 2 + 1;
    u64::try_from(blocks).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: i32, z: i32) -> BlockVector2 {
        BlockVector2::new(x, z)
    }

    #[test]
    fn crossing_and_touching_segments() {
        assert!(segments_intersect(v(0, 0), v(10, 10), v(0, 10), v(10, 0)));
        assert!(segments_intersect(v(0, 0), v(5, 0), v(5, 0), v(5, 5)));
        assert!(segments_intersect(v(0, 0), v(10, 0), v(3, 0), v(7, 0)));
        assert!(!segments_intersect(v(0, 0), v(5, 0), v(6, 0), v(9, 0)));
        assert!(!segments_intersect(v(0, 0), v(0, 5), v(1, 0), v(1, 5)));
    }

    #[test]
    fn lattice_area_of_square() {
        let square = [v(0, 0), v(9, 0), v(9, 9), v(0, 9)];
        assert_eq!(lattice_area(&square), 100);
    }

    #[test]
    fn lattice_area_of_triangle() {
        // 0..=4 right triangle: 15 lattice points (1+2+3+4+5)
        let tri = [v(0, 0), v(4, 0), v(0, 4)];
        assert_eq!(lattice_area(&tri), 15);
    }
}
