// Exact 2-D predicates and small shape types shared by the layout engine
// and the primitive emitter. Degenerate and touching cases count as
// intersecting.

use serde::Serialize;

pub type Point = (f32, f32);

const EPS: f32 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Line {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Line {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn from_points(a: Point, b: Point) -> Self {
        Self::new(a.0, a.1, b.0, b.1)
    }

    pub fn start(&self) -> Point {
        (self.x1, self.y1)
    }

    pub fn end(&self) -> Point {
        (self.x2, self.y2)
    }

    pub fn length(&self) -> f32 {
        norm(self.x2 - self.x1, self.y2 - self.y1)
    }

    pub fn midpoint(&self) -> Point {
        (0.5 * (self.x1 + self.x2), 0.5 * (self.y1 + self.y2))
    }

    /// Unit direction from start to end, or `None` when degenerate.
    pub fn direction(&self) -> Option<Point> {
        let len = self.length();
        if len < EPS {
            return None;
        }
        Some(((self.x2 - self.x1) / len, (self.y2 - self.y1) / len))
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x1 + dx, self.y1 + dy, self.x2 + dx, self.y2 + dy)
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        *self = self.offset(dx, dy);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Oval {
    pub cx: f32,
    pub cy: f32,
    pub rw: f32,
    pub rh: f32,
}

impl Oval {
    pub fn new(cx: f32, cy: f32, rw: f32, rh: f32) -> Self {
        Self { cx, cy, rw, rh }
    }

    pub fn bbox(&self) -> BBox {
        BBox::new(self.cx - self.rw, self.cy - self.rh, 2.0 * self.rw, 2.0 * self.rh)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BBox {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_points(points: &[Point]) -> Self {
        let Some(&(x0, y0)) = points.first() else {
            return Self::default();
        };
        let (mut lo_x, mut lo_y, mut hi_x, mut hi_y) = (x0, y0, x0, y0);
        for &(x, y) in &points[1..] {
            lo_x = lo_x.min(x);
            lo_y = lo_y.min(y);
            hi_x = hi_x.max(x);
            hi_y = hi_y.max(y);
        }
        Self::new(lo_x, lo_y, hi_x - lo_x, hi_y - lo_y)
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.w
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.h
    }

    pub fn inflate(&self, pad: f32) -> Self {
        Self::new(self.x - pad, self.y - pad, self.w + 2.0 * pad, self.h + 2.0 * pad)
    }

    pub fn union(&self, other: &BBox) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self::new(x, y, self.max_x().max(other.max_x()) - x, self.max_y().max(other.max_y()) - y)
    }
}

pub fn norm(dx: f32, dy: f32) -> f32 {
    (dx * dx + dy * dy).sqrt()
}

/// Signed smallest difference `a - b`, wrapped into (-PI, PI].
pub fn angle_diff(a: f32, b: f32) -> f32 {
    let mut d = a - b;
    while d > std::f32::consts::PI {
        d -= std::f32::consts::TAU;
    }
    while d <= -std::f32::consts::PI {
        d += std::f32::consts::TAU;
    }
    d
}

/// Closed-interval overlap; touching boxes intersect.
pub fn rects_intersect(a: &BBox, b: &BBox) -> bool {
    a.x <= b.max_x() && b.x <= a.max_x() && a.y <= b.max_y() && b.y <= a.max_y()
}

fn orientation(a: Point, b: Point, c: Point) -> f32 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

fn within_span(p: Point, a: Point, b: Point) -> bool {
    p.0 >= a.0.min(b.0) - EPS
        && p.0 <= a.0.max(b.0) + EPS
        && p.1 >= a.1.min(b.1) - EPS
        && p.1 <= a.1.max(b.1) + EPS
}

/// True when segments a-b and c-d cross, touch, or overlap collinearly.
pub fn do_line_segs_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    let o1 = orientation(a, b, c);
    let o2 = orientation(a, b, d);
    let o3 = orientation(c, d, a);
    let o4 = orientation(c, d, b);
    let crosses = ((o1 > EPS && o2 < -EPS) || (o1 < -EPS && o2 > EPS))
        && ((o3 > EPS && o4 < -EPS) || (o3 < -EPS && o4 > EPS));
    if crosses {
        return true;
    }
    (o1.abs() <= EPS && within_span(c, a, b))
        || (o2.abs() <= EPS && within_span(d, a, b))
        || (o3.abs() <= EPS && within_span(a, c, d))
        || (o4.abs() <= EPS && within_span(b, c, d))
}

/// Intersection of the infinite lines through a-b and c-d.
pub fn line_intersect(a: Point, b: Point, c: Point, d: Point) -> Option<Point> {
    let denom = (a.0 - b.0) * (c.1 - d.1) - (a.1 - b.1) * (c.0 - d.0);
    if denom.abs() < EPS {
        return None;
    }
    let t = ((a.0 - c.0) * (c.1 - d.1) - (a.1 - c.1) * (c.0 - d.0)) / denom;
    Some((a.0 + t * (b.0 - a.0), a.1 + t * (b.1 - a.1)))
}

/// Parameter `t` in [0, 1] along a-b where it meets segment c-d.
pub fn segment_param(a: Point, b: Point, c: Point, d: Point) -> Option<f32> {
    let rx = b.0 - a.0;
    let ry = b.1 - a.1;
    let sx = d.0 - c.0;
    let sy = d.1 - c.1;
    let denom = rx * sy - ry * sx;
    if denom.abs() < EPS {
        return None;
    }
    let t = ((c.0 - a.0) * sy - (c.1 - a.1) * sx) / denom;
    let u = ((c.0 - a.0) * ry - (c.1 - a.1) * rx) / denom;
    if (-EPS..=1.0 + EPS).contains(&t) && (-EPS..=1.0 + EPS).contains(&u) {
        Some(t.clamp(0.0, 1.0))
    } else {
        None
    }
}

/// Even-odd containment; points on the boundary count as inside.
pub fn point_in_polygon(p: Point, poly: &[Point]) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        if orientation(a, b, p).abs() <= EPS && within_span(p, a, b) {
            return true;
        }
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = poly[i];
        let (xj, yj) = poly[j];
        if (yi > p.1) != (yj > p.1) && p.0 < (xj - xi) * (p.1 - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// True when the polygons share any area or boundary point.
pub fn polygons_overlap(a: &[Point], b: &[Point]) -> bool {
    let na = a.len();
    let nb = b.len();
    for i in 0..na {
        let (p1, p2) = (a[i], a[(i + 1) % na]);
        for j in 0..nb {
            if do_line_segs_intersect(p1, p2, b[j], b[(j + 1) % nb]) {
                return true;
            }
        }
    }
    a.first().is_some_and(|&p| point_in_polygon(p, b))
        || b.first().is_some_and(|&p| point_in_polygon(p, a))
}

pub fn rect_polygon(x: f32, y: f32, w: f32, h: f32) -> Vec<Point> {
    vec![(x, y), (x + w, y), (x + w, y + h), (x, y + h)]
}

/// Quad enclosing `line` with the given half-width on either side.
pub fn line_polygon(line: &Line, half_width: f32) -> Vec<Point> {
    let (dx, dy) = line.direction().unwrap_or((1.0, 0.0));
    let (ox, oy) = (-dy * half_width, dx * half_width);
    vec![
        (line.x1 + ox, line.y1 + oy),
        (line.x2 + ox, line.y2 + oy),
        (line.x2 - ox, line.y2 - oy),
        (line.x1 - ox, line.y1 - oy),
    ]
}

/// Convex hull by QuickHull, returned counter-clockwise (in y-up terms).
pub fn quick_hull(points: &[Point]) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let mut lo = 0;
    let mut hi = 0;
    for (i, p) in points.iter().enumerate() {
        if p.0 < points[lo].0 || (p.0 == points[lo].0 && p.1 < points[lo].1) {
            lo = i;
        }
        if p.0 > points[hi].0 || (p.0 == points[hi].0 && p.1 > points[hi].1) {
            hi = i;
        }
    }
    let (a, b) = (points[lo], points[hi]);
    if a == b {
        return vec![a];
    }
    let above: Vec<Point> = points
        .iter()
        .copied()
        .filter(|&p| orientation(a, b, p) > EPS)
        .collect();
    let below: Vec<Point> = points
        .iter()
        .copied()
        .filter(|&p| orientation(b, a, p) > EPS)
        .collect();

    let mut hull = vec![a];
    hull_side(a, b, &below, &mut hull);
    hull.push(b);
    hull_side(b, a, &above, &mut hull);
    hull
}

fn hull_side(a: Point, b: Point, candidates: &[Point], hull: &mut Vec<Point>) {
    let Some(&far) = candidates.iter().max_by(|p, q| {
        orientation(b, a, **p)
            .abs()
            .total_cmp(&orientation(b, a, **q).abs())
    }) else {
        return;
    };
    let left: Vec<Point> = candidates
        .iter()
        .copied()
        .filter(|&p| orientation(far, a, p) > EPS)
        .collect();
    let right: Vec<Point> = candidates
        .iter()
        .copied()
        .filter(|&p| orientation(b, far, p) > EPS)
        .collect();
    hull_side(a, far, &left, hull);
    hull.push(far);
    hull_side(far, b, &right, hull);
}
