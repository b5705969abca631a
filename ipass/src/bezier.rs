//! Scalar bicubic Bernstein polynomials.
//!
//! A [`Coefficients`] grid holds one coordinate of a patch's 4×4 control
//! points, `c[row][col]`, with `row` running along `u` and `col` along `v`.

use ultraviolet::Vec3;

/// Bernstein coefficients of one coordinate of a bicubic patch.
pub type Coefficients = [[f32; 4]; 4];

/// Extract one coordinate (`0` = x, `1` = y, `2` = z) of a row-major 4×4
/// control point array.
pub fn coefficients(control_points: &[Vec3; 16], axis: usize) -> Coefficients {
    let mut c = [[0.0; 4]; 4];
    for (i, point) in control_points.iter().enumerate() {
        c[i / 4][i % 4] = match axis {
            0 => point.x,
            1 => point.y,
            _ => point.z,
        };
    }
    c
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// The blossom (polar form) of a cubic, `f(t0, t1, t2)`.
///
/// Each de Casteljau level uses its own parameter; `f(t, t, t)` is the curve
/// point at `t`.
pub fn blossom(c: [f32; 4], t: [f32; 3]) -> f32 {
    let mut p = c;
    for (level, &ti) in t.iter().enumerate() {
        for i in 0..3 - level {
            p[i] = lerp(p[i], p[i + 1], ti);
        }
    }
    p[0]
}

/// Evaluate a cubic Bernstein polynomial at `t`.
#[inline]
pub fn evaluate_cubic(c: [f32; 4], t: f32) -> f32 {
    blossom(c, [t, t, t])
}

/// Bernstein coefficients of the cubic restricted to `[a, b]`,
/// reparameterized over `[0, 1]`.
pub fn restrict_cubic(c: [f32; 4], a: f32, b: f32) -> [f32; 4] {
    [
        blossom(c, [a, a, a]),
        blossom(c, [a, a, b]),
        blossom(c, [a, b, b]),
        blossom(c, [b, b, b]),
    ]
}

/// Evaluate the bicubic patch at `(u, v)`.
pub fn evaluate(c: &Coefficients, u: f32, v: f32) -> f32 {
    let column = [
        evaluate_cubic(c[0], v),
        evaluate_cubic(c[1], v),
        evaluate_cubic(c[2], v),
        evaluate_cubic(c[3], v),
    ];
    evaluate_cubic(column, u)
}

/// Evaluate all three coordinates of a patch at `(u, v)`.
pub fn evaluate_point(control_points: &[Vec3; 16], u: f32, v: f32) -> Vec3 {
    Vec3::new(
        evaluate(&coefficients(control_points, 0), u, v),
        evaluate(&coefficients(control_points, 1), u, v),
        evaluate(&coefficients(control_points, 2), u, v),
    )
}

/// Bernstein coefficients of the patch restricted to the parameter
/// rectangle `[u.0, u.1] × [v.0, v.1]`.
pub fn restrict(c: &Coefficients, u: (f32, f32), v: (f32, f32)) -> Coefficients {
    let rows = c.map(|row| restrict_cubic(row, v.0, v.1));

    let mut out = [[0.0; 4]; 4];
    for col in 0..4 {
        let column = restrict_cubic(
            [rows[0][col], rows[1][col], rows[2][col], rows[3][col]],
            u.0,
            u.1,
        );
        for row in 0..4 {
            out[row][col] = column[row];
        }
    }
    out
}

/// Coefficients of the bilinear interpolant of the four corners, degree
/// raised to bicubic.
///
/// By linear precision of the Bernstein basis these are the corner values
/// interpolated at `(row / 3, col / 3)`.
pub fn bilinear_coefficients(c: &Coefficients) -> Coefficients {
    let mut out = [[0.0; 4]; 4];
    for (row, out_row) in out.iter_mut().enumerate() {
        let s = row as f32 / 3.0;
        let left = lerp(c[0][0], c[3][0], s);
        let right = lerp(c[0][3], c[3][3], s);
        for (col, value) in out_row.iter_mut().enumerate() {
            *value = lerp(left, right, col as f32 / 3.0);
        }
    }
    out
}

/// Minimum that keeps `NaN` instead of discarding it like [`f32::min`].
#[inline]
pub(crate) fn nan_min(a: f32, b: f32) -> f32 {
    if a.is_nan() || b.is_nan() {
        f32::NAN
    } else {
        a.min(b)
    }
}

/// Maximum that keeps `NaN` instead of discarding it like [`f32::max`].
#[inline]
pub(crate) fn nan_max(a: f32, b: f32) -> f32 {
    if a.is_nan() || b.is_nan() {
        f32::NAN
    } else {
        a.max(b)
    }
}
