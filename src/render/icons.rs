use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use image::RgbaImage;
use kurbo::{BezPath, Circle, Ellipse, Line, Point, Rect, Vec2};

use crate::assets::decode::decode_image;
use crate::data::weather::IconKind;
use crate::foundation::core::Rgba8;
use crate::providers::IconSource;
use crate::render::surface::Painter;

const SUN: Rgba8 = Rgba8::opaque(255, 196, 0);
const CLOUD: Rgba8 = Rgba8::opaque(245, 247, 250);
const CLOUD_SHADE: Rgba8 = Rgba8::opaque(120, 128, 140);
const STORM_CLOUD: Rgba8 = Rgba8::opaque(96, 104, 118);
const RAIN: Rgba8 = Rgba8::opaque(40, 110, 230);
const SNOW: Rgba8 = Rgba8::opaque(70, 140, 220);
const BOLT: Rgba8 = Rgba8::opaque(255, 214, 0);
const FOG: Rgba8 = Rgba8::opaque(150, 156, 166);

/// Draw a vector weather icon centered in `rect`.
pub(crate) fn draw_procedural(p: &mut Painter, kind: IconKind, rect: Rect) {
    let s = rect.width().min(rect.height());
    if s <= 0.0 {
        return;
    }
    let origin = Point::new(
        rect.x0 + (rect.width() - s) / 2.0,
        rect.y0 + (rect.height() - s) / 2.0,
    );
    // Unit-square coordinates to pixels.
    let at = |x: f64, y: f64| Point::new(origin.x + x * s, origin.y + y * s);

    match kind {
        IconKind::Sunny => sun(p, at(0.5, 0.5), s, 0.22),
        IconKind::Partly => {
            sun(p, at(0.36, 0.36), s, 0.15);
            cloud(p, at(0.58, 0.62), s * 0.8, CLOUD);
        }
        IconKind::Cloudy => cloud(p, at(0.5, 0.55), s, CLOUD),
        IconKind::Rain => {
            cloud(p, at(0.5, 0.42), s, CLOUD);
            for i in 0..3 {
                let x = 0.32 + 0.18 * f64::from(i);
                p.stroke(&Line::new(at(x, 0.66), at(x - 0.06, 0.86)), s * 0.045, RAIN);
            }
        }
        IconKind::Storm => {
            cloud(p, at(0.5, 0.40), s, STORM_CLOUD);
            let mut bolt = BezPath::new();
            bolt.move_to(at(0.54, 0.52));
            bolt.line_to(at(0.40, 0.74));
            bolt.line_to(at(0.50, 0.74));
            bolt.line_to(at(0.44, 0.94));
            bolt.line_to(at(0.62, 0.66));
            bolt.line_to(at(0.52, 0.66));
            bolt.line_to(at(0.60, 0.52));
            bolt.close_path();
            p.fill(&bolt, BOLT);
        }
        IconKind::Snow => {
            cloud(p, at(0.5, 0.42), s, CLOUD);
            for (x, y) in [(0.32, 0.76), (0.5, 0.84), (0.68, 0.76)] {
                snowflake(p, at(x, y), s * 0.07);
            }
        }
        IconKind::Fog => {
            cloud(p, at(0.5, 0.36), s * 0.85, CLOUD);
            for (i, (x0, x1)) in [(0.18, 0.82), (0.26, 0.74), (0.20, 0.70)].iter().enumerate() {
                let y = 0.64 + 0.1 * i as f64;
                p.stroke(&Line::new(at(*x0, y), at(*x1, y)), s * 0.05, FOG);
            }
        }
    }
}

fn sun(p: &mut Painter, center: Point, s: f64, r: f64) {
    let disc = r * s;
    for i in 0..8 {
        let a = f64::from(i) * std::f64::consts::FRAC_PI_4;
        let dir = Vec2::from_angle(a);
        p.stroke(
            &Line::new(center + dir * disc * 1.35, center + dir * disc * 1.85),
            s * 0.05,
            SUN,
        );
    }
    p.fill(&Circle::new(center, disc), SUN);
}

fn cloud(p: &mut Painter, center: Point, s: f64, color: Rgba8) {
    let lobes = |dy: f64| {
        [
            Ellipse::new(center + Vec2::new(0.0, 0.06 * s + dy), (0.30 * s, 0.12 * s), 0.0),
            Ellipse::new(center + Vec2::new(-0.13 * s, -0.01 * s + dy), (0.13 * s, 0.13 * s), 0.0),
            Ellipse::new(center + Vec2::new(0.06 * s, -0.07 * s + dy), (0.17 * s, 0.17 * s), 0.0),
        ]
    };
    // A shade pass underneath keeps white clouds visible on pale backgrounds.
    for e in lobes(0.02 * s) {
        p.fill(&e, CLOUD_SHADE);
    }
    for e in lobes(0.0) {
        p.fill(&e, color);
    }
}

fn snowflake(p: &mut Painter, center: Point, r: f64) {
    for i in 0..3 {
        let dir = Vec2::from_angle(f64::from(i) * std::f64::consts::PI / 3.0) * r;
        p.stroke(&Line::new(center - dir, center + dir), r * 0.35, SNOW);
    }
}

struct IconCacheInner {
    icons: HashMap<String, Arc<RgbaImage>>,
    lru: VecDeque<String>,
    misses: HashMap<String, Instant>,
}

/// How long a failed icon fetch is remembered before it is retried.
pub const ICON_MISS_TTL: Duration = Duration::from_secs(300);

/// Bounded LRU of decoded bitmap icons, keyed by provider icon code.
pub struct IconCache {
    inner: RwLock<IconCacheInner>,
    capacity: usize,
    miss_ttl: Duration,
}

impl IconCache {
    pub fn new(capacity: usize) -> Self {
        Self::with_miss_ttl(capacity, ICON_MISS_TTL)
    }

    pub fn with_miss_ttl(capacity: usize, miss_ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(IconCacheInner {
                icons: HashMap::new(),
                lru: VecDeque::new(),
                misses: HashMap::new(),
            }),
            capacity: capacity.max(1),
            miss_ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.icons.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached icon for `code`, fetching and decoding it on a miss.
    ///
    /// Fetch or decode failures return `None`; the code is not retried until the miss expires.
    pub fn get_or_fetch(&self, code: &str, source: &dyn IconSource) -> Option<Arc<RgbaImage>> {
        if let Ok(mut inner) = self.inner.write() {
            if let Some(icon) = inner.icons.get(code).cloned() {
                touch(&mut inner.lru, code);
                return Some(icon);
            }
            if inner
                .misses
                .get(code)
                .is_some_and(|at| at.elapsed() < self.miss_ttl)
            {
                return None;
            }
        }

        let icon = match source.fetch(code).and_then(|bytes| decode_image(&bytes)) {
            Ok(img) => Arc::new(img),
            Err(e) => {
                tracing::warn!(code, error = %e, "weather icon unavailable");
                if let Ok(mut inner) = self.inner.write() {
                    let ttl = self.miss_ttl;
                    inner.misses.retain(|_, at| at.elapsed() < ttl);
                    inner.misses.insert(code.to_owned(), Instant::now());
                }
                return None;
            }
        };

        if let Ok(mut inner) = self.inner.write() {
            inner.misses.remove(code);
            inner.icons.insert(code.to_owned(), icon.clone());
            touch(&mut inner.lru, code);
            while inner.lru.len() > self.capacity {
                if let Some(old) = inner.lru.pop_front() {
                    inner.icons.remove(&old);
                }
            }
        }
        Some(icon)
    }
}

fn touch(lru: &mut VecDeque<String>, code: &str) {
    if let Some(pos) = lru.iter().position(|c| c == code) {
        lru.remove(pos);
    }
    lru.push_back(code.to_owned());
}

#[cfg(test)]
#[path = "../../tests/unit/render/icons.rs"]
mod tests;
