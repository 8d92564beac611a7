//! Parks-McClellan (Remez exchange) equiripple FIR design.
//!
//! Port of the public-domain exchange routine the original decimation code
//! vendored. Only type-I designs (odd length, positive symmetry) are
//! supported; every filter the resampler requests has `N*scale*2 + 1` taps,
//! which is always odd. The routine is pure and deterministic: identical
//! inputs yield identical coefficient vectors.

use thiserror::Error;

/// Grid points per approximation ripple.
const GRID_DENSITY: usize = 16;
/// Exchange iterations before giving up on convergence.
const MAX_ITERATIONS: usize = 40;

const PI: f64 = std::f64::consts::PI;
const TWO_PI: f64 = 2.0 * PI;

/// Response shape of the requested design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Piecewise-constant multiband magnitude (covers low-pass as a
    /// two-band design with desired response `[1, 0]`).
    Bandpass,
}

#[derive(Error, Debug)]
pub enum RemezError {
    #[error("invalid band specification")]
    InvalidBands,

    #[error("tap count must be odd and at least 3, got {0}")]
    InvalidTapCount(usize),

    #[error("exchange located {found} extrema, needs {expected}")]
    MissingExtrema { expected: usize, found: usize },
}

/// Design a linear-phase FIR filter.
///
/// `bands` holds `2 * desired.len()` normalized edge frequencies in
/// `[0, 0.5]`, non-decreasing; `desired` and `weights` carry one entry per
/// band. Returns `numtaps` coefficients, symmetric about the center tap.
pub fn remez(
    numtaps: usize,
    bands: &[f64],
    desired: &[f64],
    weights: &[f64],
    _kind: FilterKind,
) -> Result<Vec<f64>, RemezError> {
    if numtaps < 3 || numtaps % 2 == 0 {
        return Err(RemezError::InvalidTapCount(numtaps));
    }
    let numbands = desired.len();
    if numbands == 0 || bands.len() != 2 * numbands || weights.len() != numbands {
        return Err(RemezError::InvalidBands);
    }
    if bands.windows(2).any(|w| w[1] < w[0]) || bands[0] < 0.0 || bands[2 * numbands - 1] > 0.5 {
        return Err(RemezError::InvalidBands);
    }

    // Number of extremal frequencies for a type-I design.
    let r = numtaps / 2 + 1;

    let (grid, des, wt) = dense_grid(r, bands, desired, weights);
    let gridsize = grid.len();
    if gridsize < r + 1 {
        return Err(RemezError::InvalidBands);
    }

    // Initial guess: extremals evenly spread over the dense grid.
    let mut ext: Vec<usize> = (0..=r).map(|i| i * (gridsize - 1) / r).collect();

    let mut x = vec![0.0; r + 1];
    let mut y = vec![0.0; r + 1];
    let mut ad = vec![0.0; r + 1];
    let mut err = vec![0.0; gridsize];

    for _ in 0..MAX_ITERATIONS {
        calc_params(r, &ext, &grid, &des, &wt, &mut ad, &mut x, &mut y);
        for i in 0..gridsize {
            let a = compute_a(grid[i], r, &ad, &x, &y);
            err[i] = wt[i] * (des[i] - a);
        }
        ext = search_extrema(r, gridsize, &err)?;
        if is_done(r, &ext, &err) {
            break;
        }
    }

    calc_params(r, &ext, &grid, &des, &wt, &mut ad, &mut x, &mut y);

    // Sample the final approximation at the DFT frequencies and invert
    // (frequency sampling); type-I symmetry gives a purely cosine series.
    let half = numtaps / 2;
    let mut taps = vec![0.0; half + 1];
    for (i, tap) in taps.iter_mut().enumerate() {
        *tap = compute_a(i as f64 / numtaps as f64, r, &ad, &x, &y);
    }

    let m = (numtaps - 1) as f64 / 2.0;
    let mut h = vec![0.0; numtaps];
    for (n, out) in h.iter_mut().enumerate() {
        let mut val = taps[0];
        let xf = TWO_PI * (n as f64 - m) / numtaps as f64;
        for (k, &tap) in taps.iter().enumerate().skip(1) {
            val += 2.0 * tap * (xf * k as f64).cos();
        }
        *out = val / numtaps as f64;
    }

    Ok(h)
}

/// Lay out the dense frequency grid with per-point desired response and
/// weight.
fn dense_grid(
    r: usize,
    bands: &[f64],
    desired: &[f64],
    weights: &[f64],
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let delf = 0.5 / (GRID_DENSITY * r) as f64;

    let mut grid = Vec::new();
    let mut des = Vec::new();
    let mut wt = Vec::new();

    for band in 0..desired.len() {
        let lowf = bands[2 * band];
        let highf = bands[2 * band + 1];
        let k = (((highf - lowf) / delf) + 0.5) as usize;
        let k = k.max(1);
        for i in 0..k {
            grid.push(lowf + i as f64 * delf);
            des.push(desired[band]);
            wt.push(weights[band]);
        }
        // Pin the last point of each band to its exact edge.
        if let Some(last) = grid.last_mut() {
            *last = highf;
        }
    }

    (grid, des, wt)
}

/// Barycentric interpolation parameters over the current extremal set
/// (Oppenheim & Schafer eqs. 7.131-7.133).
fn calc_params(
    r: usize,
    ext: &[usize],
    grid: &[f64],
    des: &[f64],
    wt: &[f64],
    ad: &mut [f64],
    x: &mut [f64],
    y: &mut [f64],
) {
    for i in 0..=r {
        x[i] = (TWO_PI * grid[ext[i]]).cos();
    }

    // Interleaved product order keeps the denominators away from
    // rounding blow-up on long filters.
    let ld = (r - 1) / 15 + 1;
    for i in 0..=r {
        let mut denom = 1.0f64;
        let xi = x[i];
        for j in 0..ld {
            let mut k = j;
            while k <= r {
                if k != i {
                    denom *= 2.0 * (xi - x[k]);
                }
                k += ld;
            }
        }
        if denom.abs() < 1e-5 {
            denom = if denom < 0.0 { -1e-5 } else { 1e-5 };
        }
        ad[i] = 1.0 / denom;
    }

    let mut numer = 0.0;
    let mut denom = 0.0;
    let mut sign = 1.0;
    for i in 0..=r {
        numer += ad[i] * des[ext[i]];
        denom += sign * ad[i] / wt[ext[i]];
        sign = -sign;
    }
    let delta = numer / denom;

    let mut sign = 1.0;
    for i in 0..=r {
        y[i] = des[ext[i]] - sign * delta / wt[ext[i]];
        sign = -sign;
    }
}

/// Evaluate the barycentric interpolant at `freq`.
fn compute_a(freq: f64, r: usize, ad: &[f64], x: &[f64], y: &[f64]) -> f64 {
    let xc = (TWO_PI * freq).cos();
    let mut numer = 0.0;
    let mut denom = 0.0;
    for i in 0..=r {
        let c = xc - x[i];
        if c.abs() < 1e-7 {
            return y[i];
        }
        let c = ad[i] / c;
        denom += c;
        numer += c * y[i];
    }
    numer / denom
}

/// Pick the `r + 1` alternating error extrema for the next exchange step.
fn search_extrema(r: usize, gridsize: usize, err: &[f64]) -> Result<Vec<usize>, RemezError> {
    let mut found: Vec<usize> = Vec::with_capacity(2 * r);

    if (err[0] > 0.0 && err[0] > err[1]) || (err[0] < 0.0 && err[0] < err[1]) {
        found.push(0);
    }
    for i in 1..gridsize - 1 {
        if (err[i] >= err[i - 1] && err[i] > err[i + 1] && err[i] > 0.0)
            || (err[i] <= err[i - 1] && err[i] < err[i + 1] && err[i] < 0.0)
        {
            found.push(i);
        }
    }
    let j = gridsize - 1;
    if (err[j] > 0.0 && err[j] > err[j - 1]) || (err[j] < 0.0 && err[j] < err[j - 1]) {
        found.push(j);
    }

    if found.len() < r + 1 {
        return Err(RemezError::MissingExtrema {
            expected: r + 1,
            found: found.len(),
        });
    }

    // Thin the surplus: drop the smallest extremum of any non-alternating
    // pair until exactly r + 1 remain.
    while found.len() > r + 1 {
        let mut up = err[found[0]] > 0.0;
        let mut smallest = 0;
        let mut alternating = true;

        for j in 1..found.len() {
            if err[found[j]].abs() < err[found[smallest]].abs() {
                smallest = j;
            }
            let positive = err[found[j]] > 0.0;
            if up && !positive {
                up = false;
            } else if !up && positive {
                up = true;
            } else {
                alternating = false;
                break;
            }
        }

        // All alternating: the surplus sits at one end; drop the weaker
        // of the first/last extremals.
        if alternating {
            let last = found.len() - 1;
            smallest = if err[found[last]].abs() < err[found[0]].abs() {
                last
            } else {
                0
            };
        }

        found.remove(smallest);
    }

    Ok(found)
}

/// Converged once the extremal error magnitudes agree to 0.01%.
fn is_done(r: usize, ext: &[usize], err: &[f64]) -> bool {
    let mut min = err[ext[0]].abs();
    let mut max = min;
    for &e in ext.iter().take(r + 1).skip(1) {
        let current = err[e].abs();
        min = min.min(current);
        max = max.max(current);
    }
    (max - min) / max < 0.0001
}
