use nalgebra as na;
use ndarray::Array2;

/// Even-odd ray casting test.
pub fn in_bounds(p: na::Point2<f32>, poly: &[na::Point2<f32>]) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut p1 = poly[0];
    let mut xints = 0.0;

    for i in 1..=n {
        let p2 = poly[i % n];

        if p.y > f32::min(p1.y, p2.y) && p.y <= f32::max(p1.y, p2.y) && p.x <= f32::max(p1.x, p2.x)
        {
            if (p1.y - p2.y).abs() > f32::EPSILON {
                xints = (p.y - p1.y) * (p2.x - p1.x) / (p2.y - p1.y) + p1.x;
            }

            if (p1.x - p2.x).abs() < f32::EPSILON || p.x <= xints {
                inside = !inside;
            }
        }

        p1 = p2;
    }

    inside
}

/// Rasterizes a polygon into a `height x width` mask; a pixel is set when its centre lies inside.
pub fn fill_mask(poly: &[[i32; 2]], width: usize, height: usize) -> Array2<bool> {
    let mut mask = Array2::from_elem((height, width), false);

    if poly.len() < 3 || width == 0 || height == 0 {
        return mask;
    }

    let points: Vec<na::Point2<f32>> = poly
        .iter()
        .map(|&[x, y]| na::Point2::new(x as f32, y as f32))
        .collect();

    // only the polygon's bounding rectangle can contain set pixels
    let clamp = |v: i64, max: usize| v.clamp(0, max as i64) as usize;
    let xs = || poly.iter().map(|p| p[0] as i64);
    let ys = || poly.iter().map(|p| p[1] as i64);
    let x0 = clamp(xs().min().unwrap_or(0), width);
    let x1 = clamp(xs().max().unwrap_or(0) + 1, width);
    let y0 = clamp(ys().min().unwrap_or(0), height);
    let y1 = clamp(ys().max().unwrap_or(0) + 1, height);

    for y in y0..y1 {
        for x in x0..x1 {
            let centre = na::Point2::new(x as f32 + 0.5, y as f32 + 0.5);
            mask[[y, x]] = in_bounds(centre, &points);
        }
    }

    mask
}
