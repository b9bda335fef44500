use crate::core::{Aabb, LinkError, MultiscaleFinder1D, RTree, TrajIndex};
use log::{debug, warn};
use std::collections::VecDeque;

/// A detection in a single 2D frame: planar position, scale and intensity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Center2D {
    pub x: f64,
    pub y: f64,
    pub r: f64,
    pub intensity: f64,
}

/// A detection placed in the 3D stack; z is the frame coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Center3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub r: f64,
    pub intensity: f64,
}

impl Center3D {
    pub fn from_2d(c: &Center2D, t: usize) -> Self {
        Self {
            x: c.x,
            y: c.y,
            z: t as f64,
            r: c.r,
            intensity: c.intensity,
        }
    }
}

/// All the detections of one z (or time) level.
pub type Frame = Vec<Center2D>;

/// The detections belonging to one 3D particle, by increasing frame.
pub type Cluster = Vec<Center3D>;

// Margin of zero padding around the signals fed to the blob finder,
// so that blobs remain localizable on short signals.
const MARGIN: usize = 6;

// A cluster shorter than this holds too few samples for blob tracking.
const MIN_CLUSTER_LEN: usize = 6;

fn bb_of(c: &Center2D, tolerance: f64) -> Aabb<2> {
    Aabb::new(
        [c.x - c.r * tolerance, c.y - c.r * tolerance],
        [c.x + c.r * tolerance, c.y + c.r * tolerance],
    )
}

fn planar_dist2(a: &Center2D, b: &Center2D) -> f64 {
    (a.x - b.x).powi(2) + (a.y - b.y).powi(2)
}

/// Assembles 2D detections stacked over z into 3D particles.
///
/// Frames are linked one at a time into trajectories; each trajectory
/// accumulates its detections into a cluster. Once all frames are in,
/// clusters are split at planar discontinuities and each cluster yields
/// its particles from blobs of the radius and intensity sequences.
#[derive(Debug, Default)]
pub struct Reconstructor {
    clusters: VecDeque<Cluster>,
    trajectories: Option<TrajIndex>,
    last_frame: Frame,
}

impl Reconstructor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_none()
    }

    /// Number of frames inserted so far.
    pub fn nb_frames(&self) -> usize {
        self.trajectories.as_ref().map_or(0, |t| t.nb_frames())
    }

    pub fn nb_clusters(&self) -> usize {
        self.clusters.len()
    }

    pub fn clusters(&self) -> &VecDeque<Cluster> {
        &self.clusters
    }

    pub fn trajectories(&self) -> Option<&TrajIndex> {
        self.trajectories.as_ref()
    }

    pub fn clear(&mut self) {
        self.clusters.clear();
        self.trajectories = None;
        self.last_frame.clear();
    }

    /// Inserts the next frame.
    ///
    /// `tolerance` is the accepted fraction of the contact distance
    /// (sum of radii); `tolerance <= 1` accepts overlap only.
    pub fn push_back(&mut self, frame: Frame, tolerance: f64) -> Result<(), LinkError> {
        if frame.is_empty() {
            warn!("inserting an empty frame at t={}", self.nb_frames());
        }
        match self.trajectories.as_mut() {
            None => {
                self.trajectories = Some(TrajIndex::new(frame.len()));
                for c in &frame {
                    self.clusters.push_back(vec![Center3D::from_2d(c, 0)]);
                }
            }
            Some(trajectories) => {
                let (distances, from, to) = links_by_rtree(&self.last_frame, &frame, tolerance);
                let t = trajectories.nb_frames();
                let old_traj = trajectories.len();
                trajectories.add_frame(frame.len(), &distances, &from, &to)?;
                for (p, c) in frame.iter().enumerate() {
                    let tr = trajectories.traj_of(t, p);
                    if tr < old_traj {
                        // the trajectory already existed: grow its cluster
                        self.clusters[tr].push(Center3D::from_2d(c, t));
                    } else {
                        self.clusters.push_back(vec![Center3D::from_2d(c, t)]);
                    }
                }
            }
        }
        self.last_frame = frame;
        Ok(())
    }

    /// Splits every long enough cluster at the discontinuities of its
    /// planar position.
    pub fn split_clusters(&mut self) {
        let cl_end = self.clusters.len();
        for cl in 0..cl_end {
            if self.clusters[cl].len() < MIN_CLUSTER_LEN {
                continue;
            }
            // squared planar displacement between successive frames
            let grad: Vec<f64> = self.clusters[cl]
                .windows(2)
                .map(|w| (w[0].x - w[1].x).powi(2) + (w[0].y - w[1].y).powi(2))
                .collect();
            let mut finder = MultiscaleFinder1D::new(grad.len());
            let blobs = finder.get_centers(&grad);
            if blobs.is_empty() {
                continue;
            }
            debug!("cluster {} split at {} discontinuities", cl, blobs.len());
            // split from the last blob so earlier positions stay valid
            for b in blobs.iter().rev() {
                let pos = b.x.round().max(0.0) as usize;
                if pos == 0 || pos >= self.clusters[cl].len() {
                    continue;
                }
                let tail = self.clusters[cl].split_off(pos);
                self.clusters.push_back(tail);
            }
        }
    }

    /// One 3D particle per blob of the per-cluster radius sequence, plus
    /// the blobs of the negated intensity sequence that overlap none of
    /// the former. Positions are interpolated between the two cluster
    /// elements bracketing the blob; z carries the calibration offset.
    pub fn get_blobs(&self) -> Vec<Center3D> {
        let mut centers = Vec::new();
        for cl in &self.clusters {
            if cl.len() < MIN_CLUSTER_LEN {
                continue;
            }
            let len = cl.len() + 2 * MARGIN;
            let mut signal = vec![0.0; len];
            for (i, c) in cl.iter().enumerate() {
                signal[i + MARGIN] = c.r;
            }
            let mut finder = MultiscaleFinder1D::new(len);
            let mut blobs = finder.get_centers(&signal);

            // the same on minus the intensity
            for v in signal.iter_mut() {
                *v = 0.0;
            }
            for (i, c) in cl.iter().enumerate() {
                signal[i + MARGIN] = -c.intensity;
            }
            let intensity_blobs = finder.get_centers(&signal);
            // keep intensity blobs only away from any radius blob
            for b in intensity_blobs {
                if blobs.iter().all(|a| (b.x - a.x).abs() >= b.r + a.r) {
                    blobs.push(b);
                }
            }

            for b in &blobs {
                let pos = b.x as usize;
                if pos < MARGIN || pos > cl.len() + MARGIN {
                    continue;
                }
                let frac = b.x - pos as f64;
                let i0 = pos - MARGIN;
                if i0 >= cl.len() {
                    continue;
                }
                let c0 = &cl[i0];
                let c1 = &cl[(i0 + 1).min(cl.len() - 1)];
                centers.push(Center3D {
                    x: c0.x + frac * (c1.x - c0.x),
                    y: c0.y + frac * (c1.y - c0.y),
                    z: c0.z + frac * (c1.z - c0.z) - 0.5,
                    r: c0.r + frac * (c1.r - c0.r),
                    intensity: c0.intensity + frac * (c1.intensity - c0.intensity),
                });
            }
        }
        centers
    }
}

/// Candidate links between consecutive frames through a 2D R*-tree:
/// a pair is kept when the planar distance is below the tolerance
/// fraction of the contact distance. Distances are squared.
pub fn links_by_rtree(
    last_frame: &Frame,
    frame: &Frame,
    tolerance: f64,
) -> (Vec<f64>, Vec<usize>, Vec<usize>) {
    let n = 12 * frame.len().max(last_frame.len());
    let mut distances = Vec::with_capacity(n);
    let mut from = Vec::with_capacity(n);
    let mut to = Vec::with_capacity(n);

    // spatially index the new frame
    let tree = RTree::<2>::build(frame.iter().enumerate().map(|(p, c)| (p, bb_of(c, 1.0))));

    // every detection of the new frame overlapping the tolerance-grown
    // box of a previous detection is a candidate
    for (p, c) in last_frame.iter().enumerate() {
        for t in tree.query_overlap(&bb_of(c, tolerance)) {
            let d2 = planar_dist2(c, &frame[t]);
            if d2 < ((c.r + frame[t].r) * tolerance).powi(2) {
                distances.push(d2);
                from.push(p);
                to.push(t);
            }
        }
    }
    (distances, from, to)
}

/// Reference candidate generation enumerating every pair, for testing
/// the spatial version against.
pub fn links_by_brute_force(
    last_frame: &Frame,
    frame: &Frame,
) -> (Vec<f64>, Vec<usize>, Vec<usize>) {
    let n = last_frame.len() * frame.len();
    let mut distances = Vec::with_capacity(n);
    let mut from = Vec::with_capacity(n);
    let mut to = Vec::with_capacity(n);
    for (p, c) in last_frame.iter().enumerate() {
        for (t, d) in frame.iter().enumerate() {
            distances.push(planar_dist2(c, d));
            from.push(p);
            to.push(t);
        }
    }
    (distances, from, to)
}
