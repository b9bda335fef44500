use crate::core::{BooData, BondSet, BoundingBox, NgbList, Pos, RTree, Vector3d};
use itertools::Itertools;
use log::debug;
use rayon::prelude::*;
use std::f64::consts::PI;

/// Strategy deciding how differences and query boxes are computed:
/// an open box, or an axis-aligned periodic box with minimum image
/// convention.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Boundary {
    #[default]
    Open,
    Periodic {
        period: Vector3d,
    },
}

impl Boundary {
    /// Separation vector from `a` to `b`.
    #[inline]
    pub fn diff(&self, a: &Pos, b: &Pos) -> Vector3d {
        match self {
            Boundary::Open => b - a,
            Boundary::Periodic { period } => {
                let mut d = b - a;
                for i in 0..3 {
                    d[i] -= period[i] * (d[i] / period[i]).round();
                }
                d
            }
        }
    }

    /// Query box centered on a position.
    #[inline]
    pub fn bounds(&self, p: &Pos, r: f64) -> BoundingBox {
        BoundingBox::bounds(p, r)
    }
}

/// An ordered set of particle positions sharing one radius.
///
/// The index of a position is the identity of the particle. A spatial
/// index and a neighbour list can be attached on demand; both are
/// invalidated by hand when the positions change (`make_index`,
/// `make_ngb_list` rebuild them).
#[derive(Debug, Clone, Default)]
pub struct Particles {
    positions: Vec<Pos>,
    pub radius: f64,
    pub bb: BoundingBox,
    pub boundary: Boundary,
    index: Option<RTree<3>>,
    ngb: Option<NgbList>,
}

impl Particles {
    /// `n` particles of radius `radius`, all at the origin.
    pub fn new(n: usize, radius: f64) -> Self {
        Self {
            positions: vec![Pos::origin(); n],
            radius,
            ..Default::default()
        }
    }

    /// From explicit positions; the bounding box is computed from the data.
    pub fn from_positions(positions: Vec<Pos>, radius: f64) -> Self {
        let mut ret = Self {
            positions,
            radius,
            ..Default::default()
        };
        ret.bb = ret.data_box();
        ret
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn pos(&self, i: usize) -> &Pos {
        &self.positions[i]
    }

    pub fn positions(&self) -> &[Pos] {
        &self.positions
    }

    pub fn iter_pos(&self) -> impl Iterator<Item = &Pos> {
        self.positions.iter()
    }

    /// Separation vector between two particles, honouring the boundary.
    #[inline]
    pub fn diff(&self, i: usize, j: usize) -> Vector3d {
        self.boundary.diff(&self.positions[i], &self.positions[j])
    }

    /// Appends a position, keeping the spatial index consistent.
    pub fn push_back(&mut self, p: Pos) {
        if let Some(index) = self.index.as_mut() {
            index.insert(self.positions.len(), BoundingBox::bounds(&p, 0.0));
        }
        self.positions.push(p);
    }

    /// Builds the spatial index over the current positions.
    pub fn make_index(&mut self) {
        debug!("indexing {} particles", self.len());
        self.index = Some(RTree::build(
            self.positions
                .iter()
                .enumerate()
                .map(|(i, p)| (i, BoundingBox::bounds(p, 0.0))),
        ));
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    fn index(&self) -> &RTree<3> {
        self.index
            .as_ref()
            .expect("spatial query issued without an index")
    }

    /// Minimal box around the data, ignoring the stored `bb`.
    pub fn data_box(&self) -> BoundingBox {
        let mut bb = BoundingBox::default();
        if let Some(first) = self.positions.first() {
            bb = BoundingBox::bounds(first, 0.0);
            for p in &self.positions[1..] {
                bb.merge(&BoundingBox::bounds(p, 0.0));
            }
        }
        bb
    }

    /// The overall box: from the index when present, else from the data.
    pub fn overall_box(&self) -> BoundingBox {
        match &self.index {
            Some(index) => index.overall_box(),
            None => self.data_box(),
        }
    }

    /// Rescales positions and box componentwise.
    pub fn scale(&mut self, v: &Vector3d) {
        assert!(v.iter().all(|&c| c > 0.0), "scale factors must be positive");
        for p in self.positions.iter_mut() {
            p.coords.component_mul_assign(v);
        }
        self.bb.scale(v);
        self.index = None;
    }

    /// Uniform rescaling of positions, box and radius.
    pub fn scale_uniform(&mut self, s: f64) {
        self.scale(&Vector3d::new(s, s, s));
        self.radius *= s;
    }

    /// Translates positions, box and index.
    pub fn translate(&mut self, v: &Vector3d) {
        for p in self.positions.iter_mut() {
            *p += v;
        }
        self.bb.translate_by(v);
        if let Some(index) = self.index.as_mut() {
            index.translate(&[v.x, v.y, v.z]);
        }
    }

    /// Ids of the particles whose position lies in `bb`. Requires an index.
    pub fn enclosed(&self, bb: &BoundingBox) -> Vec<usize> {
        self.index().query_overlap(bb)
    }

    /// Ids of the particles strictly closer than `range` to `center`.
    pub fn euclidean_neighbours(&self, center: &Pos, range: f64) -> Vec<usize> {
        let r2 = range * range;
        self.enclosed(&self.boundary.bounds(center, range))
            .into_iter()
            .filter(|&q| self.boundary.diff(center, &self.positions[q]).norm_squared() < r2)
            .collect()
    }

    /// Ids of the particles strictly closer than `range` to particle
    /// `center`, excluding `center` itself.
    pub fn euclidean_neighbours_of(&self, center: usize, range: f64) -> Vec<usize> {
        let r2 = range * range;
        let c = &self.positions[center];
        self.enclosed(&self.boundary.bounds(c, range))
            .into_iter()
            .filter(|&q| {
                q != center && self.boundary.diff(c, &self.positions[q]).norm_squared() < r2
            })
            .collect()
    }

    /// Neighbours sorted by increasing squared distance to `center`.
    pub fn euclidean_neighbours_by_sqdist(&self, center: &Pos, range: f64) -> Vec<(f64, usize)> {
        let r2 = range * range;
        let mut found: Vec<(f64, usize)> = self
            .enclosed(&self.boundary.bounds(center, range))
            .into_iter()
            .filter_map(|q| {
                let d2 = self.boundary.diff(center, &self.positions[q]).norm_squared();
                (d2 < r2).then_some((d2, q))
            })
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0));
        found
    }

    /// The particle closest to `center`. The guess radius is grown by 10%
    /// until at least one candidate is found. `None` only when the set
    /// is empty.
    pub fn nearest(&self, center: &Pos, guess_r: f64) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let mut range = guess_r;
        let mut ngb = self.euclidean_neighbours(center, range);
        while ngb.is_empty() {
            range *= 1.1;
            ngb = self.euclidean_neighbours(center, range);
        }
        if range != guess_r {
            debug!("nearest: guess radius grown to {:.3}", range);
        }
        ngb.into_iter().min_by(|&a, &b| {
            let da = self.boundary.diff(center, &self.positions[a]).norm_squared();
            let db = self.boundary.diff(center, &self.positions[b]).norm_squared();
            da.total_cmp(&db)
        })
    }

    /// A copy containing no pair closer than `sep`, first come first
    /// served. The copy is indexed.
    pub fn cut(&self, sep: f64) -> Particles {
        let mut out = Particles {
            radius: self.radius,
            bb: self.bb,
            boundary: self.boundary,
            ..Default::default()
        };
        out.make_index();
        for p in self.positions.iter() {
            if out.euclidean_neighbours(p, sep).is_empty() {
                out.push_back(*p);
            }
        }
        out
    }

    /// A copy where *both* members of any pair closer than `sep` are
    /// discarded. Requires an index on the source. The copy is not indexed.
    pub fn remove_short_range(&self, sep: f64) -> Particles {
        assert!(
            self.has_index(),
            "set a spatial index before doing spatial queries"
        );
        let mut out = Particles {
            radius: self.radius,
            bb: self.bb,
            boundary: self.boundary,
            ..Default::default()
        };
        for p in 0..self.len() {
            if self.euclidean_neighbours_of(p, sep).is_empty() {
                out.push_back(self.positions[p]);
            }
        }
        out
    }

    /// Builds the neighbour list from a maximum bond length given in
    /// diameter units. Queries run in parallel against the shared index.
    pub fn make_ngb_list(&mut self, bond_length: f64) -> &NgbList {
        let sep = 2.0 * bond_length * self.radius;
        debug!("neighbour list at separation {:.3}", sep);
        let lists: Vec<Vec<usize>> = (0..self.len())
            .into_par_iter()
            .map(|p| {
                let mut ngb = self.euclidean_neighbours_of(p, sep);
                ngb.sort_unstable();
                ngb
            })
            .collect();
        self.ngb = Some(NgbList::from_lists(lists));
        self.ngb.as_ref().unwrap()
    }

    /// Builds the neighbour list from an explicit bond set.
    pub fn make_ngb_list_from_bonds(&mut self, bonds: &BondSet) -> &NgbList {
        let mut lists = vec![Vec::new(); self.len()];
        for b in bonds.iter() {
            lists[b.low()].push(b.high());
            lists[b.high()].push(b.low());
        }
        for l in lists.iter_mut() {
            l.sort_unstable();
        }
        self.ngb = Some(NgbList::from_lists(lists));
        self.ngb.as_ref().unwrap()
    }

    /// The attached neighbour list.
    pub fn ngb_list(&self) -> &NgbList {
        self.ngb
            .as_ref()
            .expect("neighbour list requested before construction")
    }

    pub fn has_ngb_list(&self) -> bool {
        self.ngb.is_some()
    }

    /// Ids of the particles inside the overall box shrunk by `margin`
    /// on each side, optionally ignoring the z dimension.
    pub fn inside(&self, margin: f64, no_z: bool) -> Vec<usize> {
        let mut target = self.overall_box().shrunk(margin);
        if no_z {
            let full = self.overall_box();
            target.lo[2] = full.lo[2];
            target.hi[2] = full.hi[2];
        }
        (0..self.len())
            .filter(|&p| target.contains_pos(&self.positions[p]))
            .collect()
    }

    /// Angle at `origin` between the bonds to `a` and `b`, in [0, pi].
    pub fn angle(&self, origin: usize, a: usize, b: usize) -> f64 {
        let va = self.diff(origin, a);
        let vb = self.diff(origin, b);
        (va.dot(&vb) / (va.norm() * vb.norm())).clamp(-1.0, 1.0).acos()
    }

    /// Number of particles per unit volume of the overall box.
    pub fn number_density(&self) -> f64 {
        self.len() as f64 / self.overall_box().area()
    }

    /// Volume fraction occupied by the particles.
    pub fn volume_fraction(&self) -> f64 {
        4.0 * PI * self.radius.powi(3) / 3.0 * self.number_density()
    }

    /// Smallest upper bound of the bounding box.
    pub fn min_dim(&self) -> f64 {
        self.bb.hi.iter().fold(f64::INFINITY, |a, &b| a.min(b))
    }

    /// Bond angle distribution around particle `i`, one bin per degree.
    /// Scaled by the number of bond angles.
    pub fn angular_distribution(&self, i: usize) -> [f64; 180] {
        let mut hist = [0.0; 180];
        let ngb = &self.ngb_list()[i];
        let nb = ngb.len();
        if nb > 1 {
            let scale = if nb > 2 {
                1.0 / ((nb - 1) * (nb - 2) / 2) as f64
            } else {
                1.0
            };
            for (&pa, &pb) in ngb.iter().tuple_combinations() {
                let bin = (self.angle(i, pa, pb) * 180.0 / PI) as usize;
                hist[bin.min(179)] = scale;
            }
        }
        hist
    }

    /// Radial distribution function of the selection over `nbins` bins up
    /// to `cutoff_diams` diameters, normalized by the ideal gas shell
    /// population.
    pub fn rdf(&self, selection: &[usize], nbins: usize, cutoff_diams: f64) -> Vec<f64> {
        let cutoff = 2.0 * self.radius * cutoff_diams;
        let scale = nbins as f64 / cutoff;
        let mut g = selection
            .par_iter()
            .fold(
                || vec![0.0; nbins],
                |mut hist, &p| {
                    for q in self.euclidean_neighbours_of(p, cutoff) {
                        let bin = (scale * self.diff(p, q).norm()) as usize;
                        if bin < nbins {
                            hist[bin] += 1.0;
                        }
                    }
                    hist
                },
            )
            .reduce(
                || vec![0.0; nbins],
                |mut a, b| {
                    for (x, y) in a.iter_mut().zip(b) {
                        *x += y;
                    }
                    a
                },
            );
        g[0] = 0.0;
        let norm = 4.0 * PI * self.number_density() / scale.powi(3) * selection.len() as f64;
        for (r, v) in g.iter_mut().enumerate().skip(1) {
            *v /= norm * (r * r) as f64;
        }
        g
    }

    /// Radial distribution function of the particles farther than the
    /// cutoff from the box edge, so no shell sticks out of the data.
    pub fn rdf_inside(&self, nbins: usize, cutoff_diams: f64) -> Vec<f64> {
        let margin = 2.0 * self.radius * cutoff_diams;
        let selection = self.index().inside(margin);
        self.rdf(&selection, nbins, cutoff_diams)
    }

    //--------------------------------------------------------------
    // Bond orientational order
    //--------------------------------------------------------------

    /// Spherical harmonics of the bond from `center` to `neighbour`.
    pub fn sph_harm_one_bond(&self, center: usize, neighbour: usize) -> BooData {
        BooData::from_bond(&self.diff(center, neighbour))
    }

    /// Orientational order around one particle: the mean of the bond
    /// harmonics over its neighbours. Zero without bonds.
    pub fn boo(&self, center: usize) -> BooData {
        let ngb = &self.ngb_list()[center];
        let mut boo = BooData::default();
        if !ngb.is_empty() {
            for &q in ngb.iter() {
                boo += &self.sph_harm_one_bond(center, q);
            }
            boo /= ngb.len() as f64;
        }
        boo
    }

    /// Orientational order of every particle, in parallel.
    ///
    /// Stored harmonics all have even l, so the harmonics of a bond are
    /// identical seen from both ends and the per-bond accumulation of the
    /// symmetric traversal reduces to an independent gather per particle.
    pub fn boos_all(&self) -> Vec<BooData> {
        (0..self.len()).into_par_iter().map(|p| self.boo(p)).collect()
    }

    /// Coarse-grained orientational order around one particle: the mean
    /// of the descriptor of the particle and of all its neighbours.
    pub fn cg_boo(&self, boos: &[BooData], center: usize) -> BooData {
        let ngb = &self.ngb_list()[center];
        let mut av = boos[center];
        for &q in ngb.iter() {
            av += &boos[q];
        }
        av /= (1 + ngb.len()) as f64;
        av
    }

    /// Coarse-grained orientational order of every particle, in parallel.
    /// The input descriptors must be fully computed beforehand.
    pub fn cg_boos_all(&self, boos: &[BooData]) -> Vec<BooData> {
        (0..self.len())
            .into_par_iter()
            .map(|p| self.cg_boo(boos, p))
            .collect()
    }

    /// Orientational order including surface bonds: every bond also
    /// contributes to the common neighbours of its endpoints.
    /// Particles touched by no bond keep the zero descriptor.
    pub fn surf_boos_all(&self) -> Vec<BooData> {
        (0..self.len())
            .into_par_iter()
            .map(|p| self.surf_boo(p))
            .collect()
    }

    // Gathered form of the surface accumulation: particle p receives its
    // own bonds plus every bond linking two of its neighbours.
    fn surf_boo(&self, p: usize) -> BooData {
        let ngb_list = self.ngb_list();
        let ngb = &ngb_list[p];
        let mut boo = BooData::default();
        let mut touches = 0usize;
        for &q in ngb.iter() {
            boo += &self.sph_harm_one_bond(p, q);
            touches += 1;
        }
        // pa < pb since the list is ascending
        for (&pa, &pb) in ngb.iter().tuple_combinations() {
            if ngb_list[pa].binary_search(&pb).is_ok() {
                boo += &self.sph_harm_one_bond(pa, pb);
                touches += 1;
            }
        }
        if touches > 0 {
            boo /= touches as f64;
        }
        boo
    }

    /// Standard and surface orientational order in one pass.
    pub fn boos_surf_boos_all(&self) -> (Vec<BooData>, Vec<BooData>) {
        (0..self.len())
            .into_par_iter()
            .map(|p| (self.boo(p), self.surf_boo(p)))
            .unzip()
    }

    /// Averages each particle's descriptor with the half-turn-rotated
    /// descriptors of its bonded neighbours, the rotation axis being the
    /// bond itself. Bonds with a zero descriptor at either end are skipped.
    pub fn flip_boos_all(&self, boos: &[BooData], bonds: &BondSet) -> Vec<BooData> {
        let mut flip: Vec<BooData> = boos.to_vec();
        let mut nb = vec![1usize; boos.len()];
        for b in bonds.iter() {
            let (lo, hi) = (b.low(), b.high());
            if boos[lo].0[0].norm() == 0.0 || boos[hi].0[0].norm() == 0.0 {
                continue;
            }
            let d = self.diff(lo, hi);
            flip[lo] += &boos[hi].rotate_by_pi(&d);
            flip[hi] += &boos[lo].rotate_by_pi(&d);
            nb[lo] += 1;
            nb[hi] += 1;
        }
        for (f, n) in flip.iter_mut().zip(nb) {
            *f /= n as f64;
        }
        flip
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gas() -> Particles {
        // 4x4x4 cubic grid, lattice constant 1
        let mut pos = Vec::new();
        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    pos.push(Pos::new(i as f64, j as f64, k as f64));
                }
            }
        }
        let mut parts = Particles::from_positions(pos, 0.5);
        parts.make_index();
        parts
    }

    #[test]
    fn enclosed_and_strictness() {
        let parts = gas();
        // range exactly 1: the 6 lattice neighbours are at distance 1,
        // excluded by the strict comparison
        assert!(parts
            .euclidean_neighbours(&Pos::new(1.0, 1.0, 1.0), 1.0)
            .len()
            == 1); // only the particle itself
        let n = parts.euclidean_neighbours(&Pos::new(1.0, 1.0, 1.0), 1.01);
        assert_eq!(n.len(), 7);
    }

    #[test]
    fn self_exclusion_with_coincident_positions() {
        let mut parts = Particles::from_positions(
            vec![Pos::new(0.0, 0.0, 0.0), Pos::new(0.0, 0.0, 0.0)],
            0.5,
        );
        parts.make_index();
        let ngb = parts.euclidean_neighbours_of(0, 0.5);
        assert_eq!(ngb, vec![1]);
    }

    #[test]
    fn push_back_updates_index() {
        let mut parts = gas();
        parts.push_back(Pos::new(0.5, 0.5, 0.5));
        let found = parts.euclidean_neighbours(&Pos::new(0.5, 0.5, 0.5), 0.1);
        assert_eq!(found, vec![64]);
    }

    #[test]
    fn nearest_grows_range() {
        let parts = gas();
        let n = parts.nearest(&Pos::new(10.0, 10.0, 10.0), 0.1);
        assert_eq!(n, Some(63)); // corner particle (3,3,3)
        assert_eq!(Particles::default().nearest(&Pos::origin(), 1.0), None);
    }

    #[test]
    fn cut_respects_separation() {
        let mut pos = Vec::new();
        for i in 0..20 {
            pos.push(Pos::new(i as f64 * 0.3, 0.0, 0.0));
        }
        let parts = Particles::from_positions(pos, 0.5);
        let out = parts.cut(0.5);
        for i in 0..out.len() {
            for j in (i + 1)..out.len() {
                assert!((out.pos(j) - out.pos(i)).norm() >= 0.5);
            }
        }
        assert!(out.len() > 1);
    }

    #[test]
    fn remove_short_range_discards_both() {
        let mut parts = Particles::from_positions(
            vec![
                Pos::new(0.0, 0.0, 0.0),
                Pos::new(0.1, 0.0, 0.0),
                Pos::new(5.0, 0.0, 0.0),
            ],
            0.5,
        );
        parts.make_index();
        let out = parts.remove_short_range(0.5);
        assert_eq!(out.len(), 1);
        assert_eq!(out.pos(0), &Pos::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn ngb_list_is_symmetric_and_sorted() {
        let mut parts = gas();
        parts.make_ngb_list(1.01); // sep = 1.01 diameters
        let ngb = parts.ngb_list();
        for i in 0..parts.len() {
            assert!(ngb[i].windows(2).all(|w| w[0] < w[1]));
            assert!(!ngb[i].contains(&i));
            for &j in ngb[i].iter() {
                assert!(ngb[j].contains(&i), "bond {}-{} not symmetric", i, j);
            }
        }
        // interior particle has 6 lattice neighbours
        let center = parts
            .iter_pos()
            .position(|p| *p == Pos::new(1.0, 1.0, 1.0))
            .unwrap();
        assert_eq!(ngb[center].len(), 6);
    }

    #[test]
    fn translation_moves_queries_along() {
        let mut parts = gas();
        parts.translate(&Vector3d::new(100.0, 0.0, 0.0));
        let found = parts.euclidean_neighbours(&Pos::new(100.0, 0.0, 0.0), 0.1);
        assert_eq!(found, vec![0]);
    }

    #[test]
    fn inside_margin_no_z() {
        let parts = gas();
        let all_inner = parts.inside(0.5, false);
        assert_eq!(all_inner.len(), 8); // 2x2x2 core
        let xy_inner = parts.inside(0.5, true);
        assert_eq!(xy_inner.len(), 16); // 2x2x4 column
    }

    #[test]
    fn angle_is_in_range() {
        let mut parts = Particles::from_positions(
            vec![
                Pos::new(0.0, 0.0, 0.0),
                Pos::new(1.0, 0.0, 0.0),
                Pos::new(-1.0, 0.0, 0.0),
            ],
            0.5,
        );
        parts.make_index();
        assert!((parts.angle(0, 1, 2) - PI).abs() < 1e-12);
        assert!((parts.angle(1, 0, 2)).abs() < 1e-12);
    }

    #[test]
    fn periodic_diff_takes_minimum_image() {
        let boundary = Boundary::Periodic {
            period: Vector3d::new(10.0, 10.0, 10.0),
        };
        let d = boundary.diff(&Pos::new(0.5, 0.0, 0.0), &Pos::new(9.5, 0.0, 0.0));
        assert!((d.x + 1.0).abs() < 1e-12);
    }

    #[test]
    fn rdf_peaks_at_the_lattice_constant() {
        let parts = gas();
        // cutoff of 2 diameters = 2.0, so a bin covers 0.01
        let inner = parts.inside(0.5, false);
        let g = parts.rdf(&inner, 200, 2.0);
        let peak = g
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap()
            .0;
        assert_eq!(peak, 100); // lattice constant 1.0
        assert_eq!(g[0], 0.0);
        assert_eq!(g[50], 0.0);
    }

    #[test]
    fn boo_gather_matches_bond_scatter() {
        // The per-particle gather must equal the per-bond symmetric
        // accumulation it replaces
        let mut parts = gas();
        parts.make_ngb_list(1.01);
        let boos = parts.boos_all();

        let n = parts.len();
        let mut scatter = vec![BooData::default(); n];
        let mut nbs = vec![0usize; n];
        let ngb = parts.ngb_list().clone();
        for p in 0..n {
            for &q in ngb[p].iter().filter(|&&q| q > p) {
                let harm = parts.sph_harm_one_bond(p, q);
                scatter[p] += &harm;
                nbs[p] += 1;
                scatter[q] += &harm;
                nbs[q] += 1;
            }
        }
        for p in 0..n {
            if nbs[p] > 0 {
                scatter[p] /= nbs[p] as f64;
            }
            for i in 0..crate::core::BOO_LEN {
                assert!((scatter[p].0[i] - boos[p].0[i]).norm() < 1e-12);
            }
        }
    }

    #[test]
    fn cg_boo_expands_to_neighbour_average() {
        let mut parts = gas();
        parts.make_ngb_list(1.01);
        let boos = parts.boos_all();
        let cg = parts.cg_boos_all(&boos);
        for p in 0..parts.len() {
            let ngb = &parts.ngb_list()[p];
            let mut expect = boos[p];
            for &q in ngb.iter() {
                expect += &boos[q];
            }
            expect /= (1 + ngb.len()) as f64;
            for i in 0..crate::core::BOO_LEN {
                assert!((cg[p].0[i] - expect.0[i]).norm() < 1e-12);
            }
        }
    }

    #[test]
    fn isolated_particle_zero_boo() {
        let mut parts = Particles::from_positions(
            vec![Pos::new(0.0, 0.0, 0.0), Pos::new(100.0, 0.0, 0.0)],
            0.5,
        );
        parts.make_index();
        parts.make_ngb_list(2.0);
        let boos = parts.boos_all();
        for &l in &[0usize, 2, 4, 6, 8, 10] {
            let (q, w) = boos[0].invariants(l);
            assert_eq!(q, 0.0);
            assert_eq!(w, 0.0);
        }
        let surf = parts.surf_boos_all();
        assert_eq!(surf[0], BooData::default());
    }

    #[test]
    fn two_particle_bond_along_z() {
        let mut parts = Particles::from_positions(
            vec![Pos::new(0.0, 0.0, 0.0), Pos::new(0.0, 0.0, 1.0)],
            0.5,
        );
        parts.make_index();
        parts.make_ngb_list(1.5);
        let boos = parts.boos_all();
        // only m=0 coefficients survive, Q_2 = sqrt(5/(4 pi)) * sqrt(4 pi/5)
        assert!((boos[0].ql(2) - 1.0).abs() < 1e-12);
        for i in 0..crate::core::BOO_LEN {
            if crate::core::I2M[i] != 0 {
                assert!(boos[0].0[i].norm() < 1e-12);
            }
        }
    }
}
