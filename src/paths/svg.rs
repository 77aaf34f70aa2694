//! SVG path data parsing.
//!
//! Routes are authored as the `d` attribute of SVG `<path>` elements. This
//! module turns that string into absolute line / quadratic / cubic
//! segments. Elliptical arcs are not supported.

use bevy::math::Vec2;
use nom::{
    character::complete::{char, multispace0, one_of},
    combinator::{all_consuming, opt, value},
    multi::many0,
    number::complete::float,
    sequence::{preceded, terminated, tuple},
    IResult,
};

/// One drawable piece of a path, in absolute coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Segment {
    Line(Vec2, Vec2),
    Quadratic(Vec2, Vec2, Vec2),
    Cubic(Vec2, Vec2, Vec2, Vec2),
}

impl Segment {
    pub fn start(&self) -> Vec2 {
        match *self {
            Segment::Line(a, _) | Segment::Quadratic(a, _, _) | Segment::Cubic(a, _, _, _) => a,
        }
    }

    pub fn end(&self) -> Vec2 {
        match *self {
            Segment::Line(_, b) | Segment::Quadratic(_, _, b) | Segment::Cubic(_, _, _, b) => b,
        }
    }

    /// Evaluate the segment at parameter `t` in [0, 1].
    pub fn eval(&self, t: f32) -> Vec2 {
        let u = 1.0 - t;
        match *self {
            Segment::Line(a, b) => a.lerp(b, t),
            // B(t) = (1-t)²P0 + 2(1-t)tP1 + t²P2
            Segment::Quadratic(p0, p1, p2) => u * u * p0 + 2.0 * u * t * p1 + t * t * p2,
            Segment::Cubic(p0, p1, p2, p3) => {
                u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
            }
        }
    }
}

/// Parse SVG path data into absolute segments.
pub fn parse_path_data(data: &str) -> Result<Vec<Segment>, String> {
    let (_, commands) = command_list(data).map_err(|e| format!("malformed path data: {e}"))?;
    build_segments(&commands)
}

fn separator(input: &str) -> IResult<&str, ()> {
    value((), tuple((multispace0, opt(char(',')), multispace0)))(input)
}

fn command(input: &str) -> IResult<&str, (char, Vec<f32>)> {
    tuple((
        preceded(multispace0, one_of("MmLlHhVvCcSsQqTtZzAa")),
        many0(preceded(separator, float)),
    ))(input)
}

fn command_list(input: &str) -> IResult<&str, Vec<(char, Vec<f32>)>> {
    all_consuming(terminated(many0(command), multispace0))(input)
}

fn arity(cmd: char) -> usize {
    match cmd.to_ascii_uppercase() {
        'M' | 'L' | 'T' => 2,
        'H' | 'V' => 1,
        'S' | 'Q' => 4,
        'C' => 6,
        'A' => 7,
        _ => 0,
    }
}

/// Pen state while walking the command list.
#[derive(Default)]
struct Pen {
    current: Vec2,
    subpath_start: Vec2,
    /// Second control point of the previous cubic, for `S`.
    last_cubic: Option<Vec2>,
    /// Control point of the previous quadratic, for `T`.
    last_quad: Option<Vec2>,
    started: bool,
}

impl Pen {
    fn resolve(&self, relative: bool, x: f32, y: f32) -> Vec2 {
        if relative {
            self.current + Vec2::new(x, y)
        } else {
            Vec2::new(x, y)
        }
    }

    fn reflect(&self, control: Option<Vec2>) -> Vec2 {
        control.map_or(self.current, |c| 2.0 * self.current - c)
    }
}

fn build_segments(commands: &[(char, Vec<f32>)]) -> Result<Vec<Segment>, String> {
    let mut pen = Pen::default();
    let mut segments = Vec::new();

    for (cmd, args) in commands {
        let cmd = *cmd;
        let relative = cmd.is_ascii_lowercase();
        let upper = cmd.to_ascii_uppercase();

        if upper == 'A' {
            return Err("arc commands are not supported".to_string());
        }
        if !pen.started && upper != 'M' {
            return Err(format!("path must start with a moveto, found `{cmd}`"));
        }

        let n = arity(cmd);
        if n == 0 {
            if !args.is_empty() {
                return Err(format!("`{cmd}` takes no arguments"));
            }
        } else if args.is_empty() || args.len() % n != 0 {
            return Err(format!(
                "`{cmd}` expects a multiple of {n} numbers, got {}",
                args.len()
            ));
        }

        if upper == 'Z' {
            if pen.current != pen.subpath_start {
                segments.push(Segment::Line(pen.current, pen.subpath_start));
            }
            pen.current = pen.subpath_start;
            pen.last_cubic = None;
            pen.last_quad = None;
            continue;
        }

        for (i, a) in args.chunks(n).enumerate() {
            let start = pen.current;
            let mut cubic_ctrl = None;
            let mut quad_ctrl = None;

            match upper {
                // Pairs after the first moveto are implicit linetos.
                'M' if i == 0 => {
                    let p = pen.resolve(relative, a[0], a[1]);
                    pen.current = p;
                    pen.subpath_start = p;
                    pen.started = true;
                }
                'M' | 'L' => {
                    let p = pen.resolve(relative, a[0], a[1]);
                    segments.push(Segment::Line(start, p));
                    pen.current = p;
                }
                'H' => {
                    let x = if relative { start.x + a[0] } else { a[0] };
                    let p = Vec2::new(x, start.y);
                    segments.push(Segment::Line(start, p));
                    pen.current = p;
                }
                'V' => {
                    let y = if relative { start.y + a[0] } else { a[0] };
                    let p = Vec2::new(start.x, y);
                    segments.push(Segment::Line(start, p));
                    pen.current = p;
                }
                'C' => {
                    let c1 = pen.resolve(relative, a[0], a[1]);
                    let c2 = pen.resolve(relative, a[2], a[3]);
                    let p = pen.resolve(relative, a[4], a[5]);
                    segments.push(Segment::Cubic(start, c1, c2, p));
                    pen.current = p;
                    cubic_ctrl = Some(c2);
                }
                'S' => {
                    let c1 = pen.reflect(pen.last_cubic);
                    let c2 = pen.resolve(relative, a[0], a[1]);
                    let p = pen.resolve(relative, a[2], a[3]);
                    segments.push(Segment::Cubic(start, c1, c2, p));
                    pen.current = p;
                    cubic_ctrl = Some(c2);
                }
                'Q' => {
                    let c = pen.resolve(relative, a[0], a[1]);
                    let p = pen.resolve(relative, a[2], a[3]);
                    segments.push(Segment::Quadratic(start, c, p));
                    pen.current = p;
                    quad_ctrl = Some(c);
                }
                'T' => {
                    let c = pen.reflect(pen.last_quad);
                    let p = pen.resolve(relative, a[0], a[1]);
                    segments.push(Segment::Quadratic(start, c, p));
                    pen.current = p;
                    quad_ctrl = Some(c);
                }
                _ => return Err(format!("unknown command `{cmd}`")),
            }

            pen.last_cubic = cubic_ctrl;
            pen.last_quad = quad_ctrl;
        }
    }

    if segments.is_empty() {
        return Err("path draws nothing".to_string());
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_absolute_line() {
        let segments = parse_path_data("M0 0 L100 0").unwrap();
        assert_eq!(
            segments,
            vec![Segment::Line(Vec2::ZERO, Vec2::new(100.0, 0.0))]
        );
    }

    #[test]
    fn parses_relative_and_implicit_linetos() {
        let segments = parse_path_data("m10,10 20,0 0,20").unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].end(), Vec2::new(30.0, 10.0));
        assert_eq!(segments[1].end(), Vec2::new(30.0, 30.0));
    }

    #[test]
    fn parses_horizontal_vertical_and_close() {
        let segments = parse_path_data("M0 0H50V50h-50z").unwrap();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[3], Segment::Line(Vec2::new(0.0, 50.0), Vec2::ZERO));
    }

    #[test]
    fn parses_compact_numbers() {
        // "-.5.5" is two numbers, and signs separate numbers too.
        let segments = parse_path_data("M1-1L-.5.5").unwrap();
        assert_eq!(
            segments,
            vec![Segment::Line(Vec2::new(1.0, -1.0), Vec2::new(-0.5, 0.5))]
        );
    }

    #[test]
    fn parses_exponents() {
        let segments = parse_path_data("M0 0 L1e2 2.5E1").unwrap();
        assert_eq!(segments[0].end(), Vec2::new(100.0, 25.0));
    }

    #[test]
    fn smooth_cubic_reflects_previous_control() {
        let segments = parse_path_data("M0 0 C10 10 20 10 30 0 S50 -10 60 0").unwrap();
        let Segment::Cubic(start, c1, _, end) = segments[1] else {
            panic!("expected cubic");
        };
        assert_eq!(start, Vec2::new(30.0, 0.0));
        assert_eq!(c1, Vec2::new(40.0, -10.0));
        assert_eq!(end, Vec2::new(60.0, 0.0));
    }

    #[test]
    fn smooth_quadratic_reflects_previous_control() {
        let segments = parse_path_data("M0 0 Q10 10 20 0 T40 0").unwrap();
        let Segment::Quadratic(_, c, _) = segments[1] else {
            panic!("expected quadratic");
        };
        assert_eq!(c, Vec2::new(30.0, -10.0));
    }

    #[test]
    fn rejects_arcs_and_garbage() {
        assert!(parse_path_data("M0 0 A10 10 0 0 1 20 20").is_err());
        assert!(parse_path_data("M0 0 L10").is_err());
        assert!(parse_path_data("L10 10").is_err());
        assert!(parse_path_data("M0 0 X").is_err());
        assert!(parse_path_data("M0 0").is_err());
    }

    #[test]
    fn segment_eval_hits_endpoints() {
        let cubic = Segment::Cubic(
            Vec2::ZERO,
            Vec2::new(0.0, 10.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(10.0, 0.0),
        );
        assert_eq!(cubic.eval(0.0), Vec2::ZERO);
        assert_eq!(cubic.eval(1.0), Vec2::new(10.0, 0.0));
        assert!((cubic.eval(0.5) - Vec2::new(5.0, 7.5)).length() < 1e-5);
    }
}
