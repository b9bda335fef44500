//! 1D scale-space blob detection on short signals.
//!
//! A signal is iteratively blurred into a stack of Gaussian layers, the
//! differences of consecutive layers approximate the Laplacian, and blobs
//! are the local minima of that stack over position and scale.

use crate::core::Center2D;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};

// Process-wide Gaussian kernel cache, keyed by the radius within 1%
// precision. Read-mostly: a kernel is computed once per distinct sigma.
static KERNELS: LazyLock<RwLock<HashMap<u64, Arc<Vec<f64>>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

fn get_kernel(sigma: f64) -> Arc<Vec<f64>> {
    let key = (100.0 * sigma) as u64;
    if let Some(k) = KERNELS.read().unwrap().get(&key) {
        return k.clone();
    }
    let m = (((sigma * 4.0 + 0.5) as usize) * 2 + 1) | 1;
    let half = (m / 2) as isize;
    let mut kernel: Vec<f64> = (0..m)
        .map(|i| (-((i as isize - half) as f64).powi(2) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f64 = kernel.iter().sum();
    for v in kernel.iter_mut() {
        *v /= sum;
    }
    KERNELS
        .write()
        .unwrap()
        .entry(key)
        .or_insert_with(|| Arc::new(kernel))
        .clone()
}

// Reflect-101 border indexing: gfedcb|abcdefgh|gfedcba
fn border_index(mut i: isize, len: usize) -> usize {
    let len = len as isize;
    while i < 0 || i >= len {
        if i < 0 {
            i = -i;
        }
        if i >= len {
            i = 2 * (len - 1) - i;
        }
    }
    i as usize
}

fn gaussian_blur(signal: &[f64], sigma: f64) -> Vec<f64> {
    let kernel = get_kernel(sigma);
    let m = kernel.len();
    let half = (m / 2) as isize;
    (0..signal.len())
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(x, k)| signal[border_index(i as isize - x as isize + half, signal.len())] * k)
                .sum()
        })
        .collect()
}

/// Blob detection over one octave of scales on a 1D signal.
pub struct OctaveFinder1D {
    width: usize,
    n_layers: usize,
    preblur_radius: f64,
    prefactor: f64,
    sizes: Vec<usize>,
    iterative_radii: Vec<f64>,
    layers_g: Vec<Vec<f64>>,
    layers: Vec<Vec<f64>>,
    centers_no_subpix: Vec<(usize, usize)>,
}

impl OctaveFinder1D {
    pub fn new(width: usize, n_layers: usize, preblur_radius: f64) -> Self {
        let n = n_layers as f64;
        // target blurring radii and corresponding blob sizes
        let sigmas: Vec<f64> = (0..n_layers + 3)
            .map(|i| preblur_radius * (2.0f64).powf(i as f64 / n))
            .collect();
        let prefactor = (2.0 * (2.0f64).ln() / n / ((2.0f64).powf(2.0 / n) - 1.0)).sqrt();
        let sizes = sigmas
            .iter()
            .map(|s| (s * prefactor + 0.5) as usize)
            .collect();
        let iterative_radii = (0..n_layers + 2)
            .map(|i| (sigmas[i + 1] * sigmas[i + 1] - sigmas[i] * sigmas[i]).sqrt())
            .collect();
        Self {
            width,
            n_layers,
            preblur_radius,
            prefactor,
            sizes,
            iterative_radii,
            layers_g: vec![vec![0.0; width]; n_layers + 3],
            layers: vec![vec![0.0; width]; n_layers + 2],
            centers_no_subpix: Vec::new(),
        }
    }

    pub fn with_width(width: usize) -> Self {
        Self::new(width, 3, 1.6)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    fn fill(&mut self, input: &[f64]) {
        assert!(
            input.len() == self.width,
            "the input length ({}) must match the width of the finder ({})",
            input.len(),
            self.width
        );
        self.layers_g[0].copy_from_slice(input);
        // iterative Gaussian blur
        for i in 0..self.layers_g.len() - 1 {
            self.layers_g[i + 1] = gaussian_blur(&self.layers_g[i], self.iterative_radii[i]);
        }
        // difference of Gaussians
        for i in 0..self.layers.len() {
            self.layers[i] = self.layers_g[i + 1]
                .iter()
                .zip(&self.layers_g[i])
                .map(|(a, b)| a - b)
                .collect();
        }
    }

    fn preblur_and_fill(&mut self, input: &[f64]) {
        let blurred = gaussian_blur(input, self.preblur_radius);
        self.fill(&blurred);
    }

    /// Detects local minima of the scale space with the dynamic block
    /// scheme of Neubeck and Van Gool.
    fn initialize_binary(&mut self) {
        self.centers_no_subpix.clear();
        let mut k = 1;
        while k + 1 < self.layers.len() {
            let si = self.sizes[k];
            let end = self.width.saturating_sub(si + 1);
            let mut i = si + 1;
            while i < end {
                let ngb = [
                    self.layers[k][i],
                    self.layers[k][i + 1],
                    self.layers[k + 1][i],
                    self.layers[k + 1][i + 1],
                ];
                let (ml, &mval) = ngb
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1.total_cmp(b.1))
                    .unwrap();
                if mval >= 0.0 {
                    i += 2;
                    continue;
                }
                let mi = i + (ml & 1);
                let mk = k + ((ml & 2) >> 1);
                // minima cannot sit on the last layer or on signal edges
                if mk > self.n_layers
                    || mi < self.sizes[mk]
                    || mi + self.sizes[mk] >= self.width
                {
                    i += 2;
                    continue;
                }
                // only negative minima that are actually different from zero
                let mut good = mval < 0.0 && 1.0 + mval * mval > 1.0;
                // discard if a neighbour outside the block is lower;
                // layer 0 only localizes and takes no part here, so that
                // discontinuities sharper than the preblur stay assignable
                // to the finest detectable scale
                for k2 in (mk - 1).max(1)..=(mk + 1) {
                    for i2 in (mi - 1)..=(mi + 1) {
                        if !good {
                            break;
                        }
                        if k2 < k || i2 < i || k2 > k + 1 || i2 > i + 1 {
                            good = self.layers[mk][mi] <= self.layers[k2][i2];
                        }
                    }
                }
                // edge response rejection: the ratio between Laplacian and
                // gradient must be large
                if good {
                    let g = &self.layers_g[mk];
                    good = ((g[mi + 1] + g[mi - 1] - 2.0 * g[mi]) / (g[mi + 1] - g[mi - 1]))
                        .abs()
                        > 0.5;
                }
                if good {
                    self.centers_no_subpix.push((mi, mk));
                }
                i += 2;
            }
            k += 2;
        }
    }

    // Response of the Gaussian stack at a fractional scale.
    fn gaussian_response(&self, i: usize, scale: f64) -> f64 {
        assert!(scale >= -1e-9, "the scale must be positive");
        let scale = scale.max(0.0);
        let k = (scale as usize).min(self.layers_g.len() - 1);
        let frac = scale - k as f64;
        if 1.0 + frac * frac == 1.0 {
            return self.layers_g[k][i];
        }
        let sigma = self.iterative_radius(scale, k as f64);
        let kernel = get_kernel(sigma);
        let m = kernel.len();
        let half = (m / 2) as isize;
        kernel
            .iter()
            .enumerate()
            .map(|(x, ker)| {
                self.layers_g[k][border_index(i as isize - x as isize + half, self.width)] * ker
            })
            .sum()
    }

    fn iterative_radius(&self, larger: f64, smaller: f64) -> f64 {
        let n = self.n_layers as f64;
        self.preblur_radius
            * ((2.0f64).powf(2.0 * larger / n) - (2.0f64).powf(2.0 * smaller / n)).sqrt()
    }

    // Quadratic interpolation of the position on the Gaussian layer below
    // the detected scale, where the spatial resolution is better.
    fn spatial_subpix(&self, i: usize, k: usize) -> (f64, f64) {
        let g = &self.layers_g[if k > 0 { k - 1 } else { k }];
        let grad = g[i + 1] - g[i - 1];
        let lap = g[i + 1] - 2.0 * g[i] + g[i - 1];
        let offset = if lap == 0.0 { 0.0 } else { grad / 2.0 / lap };
        let x = i as f64 + 0.5 - offset;
        let intensity = self.layers[k][i] - 0.25 * (x - i as f64) * grad;
        (x, intensity)
    }

    // Scale refinement from a quadratic estimate of the derivative of the
    // Gaussian response, with an empirical correction.
    fn scale_subpix(&self, i: usize, k: usize) -> f64 {
        let h = 1.0 / 3.0;
        let mut a = [0.0; 7];
        for (u, v) in a.iter_mut().enumerate() {
            *v = self.gaussian_response(i, k as f64 - 3.0 * h + u as f64 * h);
        }
        let denom = a[6] - 3.0 * a[4] + 3.0 * a[2] - a[0];
        let s = if 1.0 + denom * denom == 1.0 {
            0.0
        } else {
            2.0 * h * (a[5] - 2.0 * a[3] + a[1]) / denom
        };
        let n = self.n_layers as f64;
        k as f64 - 1.05 * s + 0.08 * s * s - (2.0f64).powf(-2.0 / n) + 0.025 * k as f64 - 0.025
    }

    /// Runs the whole detection pipeline on a signal.
    pub fn get_centers(&mut self, signal: &[f64]) -> Vec<Center2D> {
        self.preblur_and_fill(signal);
        self.initialize_binary();
        let n = self.n_layers as f64;
        self.centers_no_subpix
            .iter()
            .map(|&(i, k)| {
                let (x, intensity) = self.spatial_subpix(i, k);
                let s = self.scale_subpix(i, k);
                let r = self.prefactor * self.preblur_radius * (2.0f64).powf(s / n);
                Center2D {
                    x,
                    y: 0.0,
                    r,
                    intensity,
                }
            })
            .collect()
    }
}

// An octave must be wide enough for the block scan to see anything.
const MIN_OCTAVE_WIDTH: usize = 12;

/// Multiscale blob finder: one octave at native resolution, then
/// half-resolution octaves as long as the signal stays long enough.
/// Centers are reported in native signal coordinates.
pub struct MultiscaleFinder1D {
    octaves: Vec<OctaveFinder1D>,
}

impl MultiscaleFinder1D {
    pub fn new(width: usize) -> Self {
        let mut octaves = vec![OctaveFinder1D::with_width(width)];
        let mut w = width;
        while w / 2 >= MIN_OCTAVE_WIDTH {
            w /= 2;
            octaves.push(OctaveFinder1D::with_width(w));
        }
        debug!("multiscale finder of width {} with {} octaves", width, octaves.len());
        Self { octaves }
    }

    pub fn nb_octaves(&self) -> usize {
        self.octaves.len()
    }

    /// Detected blobs, sorted by position. Blobs found by coarser octaves
    /// are kept only where no finer blob overlaps them.
    pub fn get_centers(&mut self, signal: &[f64]) -> Vec<Center2D> {
        let mut centers: Vec<Center2D> = Vec::new();
        let mut sig = signal.to_vec();
        for (o, oct) in self.octaves.iter_mut().enumerate() {
            if o > 0 {
                sig = decimate(&sig);
            }
            let factor = (1usize << o) as f64;
            for mut c in oct.get_centers(&sig) {
                // sample j of a decimated signal averages samples 2j and
                // 2j+1 of its parent, hence the half-sample shift
                c.x = c.x * factor + (factor - 1.0) / 2.0;
                c.r *= factor;
                if centers
                    .iter()
                    .all(|kept| (kept.x - c.x).abs() >= kept.r.min(c.r))
                {
                    centers.push(c);
                }
            }
        }
        centers.sort_by(|a, b| a.x.total_cmp(&b.x));
        centers
    }
}

fn decimate(signal: &[f64]) -> Vec<f64> {
    (0..signal.len() / 2)
        .map(|i| 0.5 * (signal[2 * i] + signal[2 * i + 1]))
        .collect()
}
