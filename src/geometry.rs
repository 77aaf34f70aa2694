//! Pure geometry helpers shared by the motion engine and hover highlighting.

/// Fraction of a route over which indicators fade in and out.
pub const EDGE_FADE_ZONE: f32 = 0.05;

/// Euclidean distance between two points.
pub fn distance(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let dx = ax - bx;
    let dy = ay - by;
    (dx * dx + dy * dy).sqrt()
}

/// Smoothstep falloff: 1 at `dist = 0`, 0 at `dist >= radius`, flat at both ends.
pub fn influence(dist: f32, radius: f32) -> f32 {
    if dist >= radius {
        return 0.0;
    }
    let t = 1.0 - dist / radius;
    t * t * (3.0 - 2.0 * t)
}

/// Opacity ramp hiding indicators near route endpoints.
pub fn edge_fade(progress: f32) -> f32 {
    let fade = if progress < EDGE_FADE_ZONE {
        progress / EDGE_FADE_ZONE
    } else if progress > 1.0 - EDGE_FADE_ZONE {
        (1.0 - progress) / EDGE_FADE_ZONE
    } else {
        1.0
    };
    fade.clamp(0.0, 1.0)
}

/// Decelerating curve: fast start, flat finish.
pub fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

/// Accelerating curve: flat start, fast finish.
pub fn ease_in_cubic(t: f32) -> f32 {
    t * t * t
}
