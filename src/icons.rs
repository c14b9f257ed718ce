//! Icon glyph geometry.
//!
//! Every glyph is centered in its box and every measurement is a fixed
//! proportion of the box's shorter side, so icons scale with the field and
//! need no size of their own. Coordinates are Y up; the preview flips them.

use std::f64::consts::PI;

use crate::coords::{Point, Rect};
use crate::field::{Color, IconVariant};

/// One drawing primitive of a glyph.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Line { from: Point, to: Point, thickness: f64 },
    Circle { center: Point, radius: f64, thickness: f64, filled: bool },
    Rect { rect: Rect, thickness: f64, filled: bool },
}

/// A glyph ready to hand to a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub color: Color,
    pub primitives: Vec<Primitive>,
}

fn thickness(size: f64, factor: f64) -> f64 {
    (size * factor).max(1.0)
}

fn line(from: Point, to: Point, thickness: f64) -> Primitive {
    Primitive::Line { from, to, thickness }
}

pub fn check(b: Rect) -> Vec<Primitive> {
    let size = b.size();
    let c = b.center();
    let arm = 0.35 * size;
    let offset = 0.15 * size;
    let t = thickness(size, 0.12);
    let left = Point::new(c.x - arm, c.y);
    let valley = Point::new(c.x - offset, c.y - arm + offset);
    let right = Point::new(c.x + arm, c.y + arm - offset);
    vec![line(left, valley, t), line(valley, right, t)]
}

pub fn cross(b: Rect) -> Vec<Primitive> {
    let size = b.size();
    let c = b.center();
    let r = 0.4 * size;
    let t = thickness(size, 0.12);
    vec![
        line(Point::new(c.x - r, c.y - r), Point::new(c.x + r, c.y + r), t),
        line(Point::new(c.x - r, c.y + r), Point::new(c.x + r, c.y - r), t),
    ]
}

pub fn circle(b: Rect, filled: bool) -> Vec<Primitive> {
    let size = b.size();
    vec![Primitive::Circle {
        center: b.center(),
        radius: 0.4 * size,
        thickness: thickness(size, 0.1),
        filled,
    }]
}

pub fn square(b: Rect, filled: bool) -> Vec<Primitive> {
    let size = b.size();
    let c = b.center();
    vec![Primitive::Rect {
        rect: Rect::new(c.x - size / 2.0, c.y - size / 2.0, size, size),
        thickness: thickness(size, 0.1),
        filled,
    }]
}

/// Five point star from ten alternating outer/inner vertices, top point up.
pub fn star(b: Rect) -> Vec<Primitive> {
    let size = b.size();
    let c = b.center();
    let outer = 0.45 * size;
    let inner = 0.4 * outer;
    let t = thickness(size, 0.08);
    let vertices: Vec<Point> = (0..10)
        .map(|i| {
            let r = if i % 2 == 0 { outer } else { inner };
            let angle = PI / 2.0 + f64::from(i) * PI / 5.0;
            Point::new(c.x + r * angle.cos(), c.y + r * angle.sin())
        })
        .collect();
    (0..10)
        .map(|i| line(vertices[i], vertices[(i + 1) % 10], t))
        .collect()
}

/// Two lobes on top and two diagonals meeting at the bottom tip.
pub fn heart(b: Rect) -> Vec<Primitive> {
    let size = b.size();
    let c = b.center();
    let lobe = 0.2 * size;
    let lobe_y = c.y + 0.1 * size;
    let tip = Point::new(c.x, c.y - 0.35 * size);
    let t = thickness(size, 0.1);
    vec![
        Primitive::Circle { center: Point::new(c.x - lobe, lobe_y), radius: lobe, thickness: t, filled: false },
        Primitive::Circle { center: Point::new(c.x + lobe, lobe_y), radius: lobe, thickness: t, filled: false },
        line(Point::new(c.x - 2.0 * lobe, lobe_y), tip, t),
        line(Point::new(c.x + 2.0 * lobe, lobe_y), tip, t),
    ]
}

/// Shaft along `(dx, dy)` with two head segments at ±135° from it.
pub fn arrow(b: Rect, dx: f64, dy: f64) -> Vec<Primitive> {
    let size = b.size();
    let c = b.center();
    let half = 0.35 * size;
    let head = 0.25 * size;
    let t = thickness(size, 0.1);
    let start = Point::new(c.x - dx * half, c.y - dy * half);
    let end = Point::new(c.x + dx * half, c.y + dy * half);
    let barb = |angle: f64| {
        let (s, co) = angle.sin_cos();
        let (rx, ry) = (dx * co - dy * s, dx * s + dy * co);
        Point::new(end.x + rx * head, end.y + ry * head)
    };
    vec![
        line(start, end, t),
        line(end, barb(3.0 * PI / 4.0), t),
        line(end, barb(-3.0 * PI / 4.0), t),
    ]
}

pub fn plus(b: Rect) -> Vec<Primitive> {
    let size = b.size();
    let c = b.center();
    let r = 0.4 * size;
    let t = thickness(size, 0.12);
    vec![
        line(Point::new(c.x - r, c.y), Point::new(c.x + r, c.y), t),
        line(Point::new(c.x, c.y - r), Point::new(c.x, c.y + r), t),
    ]
}

pub fn diamond(b: Rect) -> Vec<Primitive> {
    let size = b.size();
    let c = b.center();
    let r = 0.45 * size;
    let t = thickness(size, 0.08);
    let pts = [
        Point::new(c.x, c.y + r),
        Point::new(c.x + r, c.y),
        Point::new(c.x, c.y - r),
        Point::new(c.x - r, c.y),
    ];
    (0..4).map(|i| line(pts[i], pts[(i + 1) % 4], t)).collect()
}

/// Geometry for `variant` inside `b`. Unknown variants draw a check.
pub fn shape(variant: IconVariant, b: Rect) -> Vec<Primitive> {
    match variant {
        IconVariant::Check | IconVariant::Unknown => check(b),
        IconVariant::Cross => cross(b),
        IconVariant::Circle => circle(b, false),
        IconVariant::CircleFilled => circle(b, true),
        IconVariant::Square => square(b, false),
        IconVariant::SquareFilled => square(b, true),
        IconVariant::Star => star(b),
        IconVariant::Heart => heart(b),
        IconVariant::ArrowUp => arrow(b, 0.0, 1.0),
        IconVariant::ArrowDown => arrow(b, 0.0, -1.0),
        IconVariant::ArrowLeft => arrow(b, -1.0, 0.0),
        IconVariant::ArrowRight => arrow(b, 1.0, 0.0),
        IconVariant::Plus => plus(b),
        IconVariant::Diamond => diamond(b),
    }
}

pub fn glyph(variant: IconVariant, b: Rect, color: Color) -> Glyph {
    Glyph { color, primitives: shape(variant, b) }
}
