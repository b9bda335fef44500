use thiserror::Error;

/// A single trajectory: one position index per frame, over consecutive
/// frames starting at `start`. Once a frame passes without a link the
/// trajectory is terminated for good.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traj {
    start: usize,
    steps: Vec<usize>,
}

impl Traj {
    pub fn new(start: usize, pos: usize) -> Self {
        Self {
            start,
            steps: vec![pos],
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// Number of frames spanned.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        false // a trajectory always holds at least its starting position
    }

    /// Last frame this trajectory exists in.
    pub fn last_frame(&self) -> usize {
        self.start + self.steps.len() - 1
    }

    pub fn contains(&self, t: usize) -> bool {
        (self.start..=self.last_frame()).contains(&t)
    }

    /// Position index at absolute frame `t`.
    pub fn at(&self, t: usize) -> usize {
        self.steps[t - self.start]
    }

    pub fn positions(&self) -> &[usize] {
        &self.steps
    }

    fn push(&mut self, pos: usize) {
        self.steps.push(pos);
    }
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("link arrays must have the same size, got {0}, {1} and {2}")]
    Sizes(usize, usize, usize),

    #[error("target position {0} is out of the new frame of size {1}")]
    TargetRange(usize, usize),
}

// A candidate link between a position of the previous frame and one of
// the new frame.
#[derive(Debug, Clone, Copy)]
struct Link {
    distance: f64,
    from: usize,
    to: usize,
}

/// Incremental frame-to-frame linker.
///
/// Keeps the dual mapping between trajectories and per-frame position
/// indices: `tr2pos` maps a trajectory to its positions, `pos2tr` maps
/// frame and position to the owning trajectory.
#[derive(Debug, Clone)]
pub struct TrajIndex {
    tr2pos: Vec<Traj>,
    pos2tr: Vec<Vec<usize>>,
}

impl TrajIndex {
    /// One singleton trajectory per position of the initial frame.
    pub fn new(nb_initial_positions: usize) -> Self {
        Self {
            tr2pos: (0..nb_initial_positions).map(|p| Traj::new(0, p)).collect(),
            pos2tr: vec![(0..nb_initial_positions).collect()],
        }
    }

    /// Number of trajectories, terminated ones included.
    pub fn len(&self) -> usize {
        self.tr2pos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tr2pos.is_empty()
    }

    /// Number of frames seen so far.
    pub fn nb_frames(&self) -> usize {
        self.pos2tr.len()
    }

    pub fn traj(&self, tr: usize) -> &Traj {
        &self.tr2pos[tr]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Traj> {
        self.tr2pos.iter()
    }

    /// Trajectory owning position `p` of frame `t`.
    pub fn traj_of(&self, t: usize, p: usize) -> usize {
        self.pos2tr[t][p]
    }

    /// Links the new frame to the previous one.
    ///
    /// The three slices describe candidate links: `from[i]` in the
    /// previous frame, `to[i]` in the new frame, at planar distance
    /// `distances[i]`. Links are consumed greedily by increasing
    /// distance, each end at most once. Un-linked new positions start
    /// new trajectories; un-linked previous positions terminate theirs.
    pub fn add_frame(
        &mut self,
        frame_size: usize,
        distances: &[f64],
        from: &[usize],
        to: &[usize],
    ) -> Result<(), LinkError> {
        if distances.len() != from.len() || from.len() != to.len() {
            return Err(LinkError::Sizes(distances.len(), from.len(), to.len()));
        }
        if let Some(&max_to) = to.iter().max() {
            if max_to >= frame_size {
                return Err(LinkError::TargetRange(max_to, frame_size));
            }
        }
        let mut links: Vec<Link> = (0..distances.len())
            .map(|i| Link {
                distance: distances[i],
                from: from[i],
                to: to[i],
            })
            .collect();
        // stable: equal distances keep submission order
        links.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        // any position can be linked only once
        let mut from_used = vec![false; self.pos2tr.last().map_or(0, |f| f.len())];
        let mut to_used = vec![false; frame_size];
        let t = self.pos2tr.len();
        let mut new_frame = vec![0usize; frame_size];
        for l in links {
            if !from_used[l.from] && !to_used[l.to] {
                from_used[l.from] = true;
                to_used[l.to] = true;
                let tr = self.pos2tr[t - 1][l.from];
                new_frame[l.to] = tr;
                self.tr2pos[tr].push(l.to);
            }
        }
        // trajectories of the previous frame that were not linked are
        // terminated by construction; unlinked new positions start fresh
        for (p, used) in to_used.iter().enumerate() {
            if !used {
                new_frame[p] = self.tr2pos.len();
                self.tr2pos.push(Traj::new(t, p));
            }
        }
        self.pos2tr.push(new_frame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_frame_is_singletons() {
        let ti = TrajIndex::new(3);
        assert_eq!(ti.len(), 3);
        assert_eq!(ti.nb_frames(), 1);
        for p in 0..3 {
            assert_eq!(ti.traj_of(0, p), p);
            assert_eq!(ti.traj(p).positions(), &[p]);
        }
    }

    #[test]
    fn greedy_takes_shortest_first() {
        // Previous frame [A, B], new frame [A', B', C'] with candidates
        // (A->A', 0.1), (A->B', 0.05), (B->B', 0.2), (B->A', 0.3).
        // A->B' wins first; B->B' and A->A' are then blocked; B->A' links.
        // C' starts a new trajectory.
        let mut ti = TrajIndex::new(2);
        ti.add_frame(3, &[0.1, 0.05, 0.2, 0.3], &[0, 0, 1, 1], &[0, 1, 1, 0])
            .unwrap();
        assert_eq!(ti.len(), 3);
        assert_eq!(ti.traj(0).positions(), &[0, 1]); // A then B'
        assert_eq!(ti.traj(1).positions(), &[1, 0]); // B then A'
        assert_eq!(ti.traj(2).positions(), &[2]); // C'
        assert_eq!(ti.traj(2).start(), 1);
    }

    #[test]
    fn inverse_mapping_invariant() {
        let mut ti = TrajIndex::new(4);
        ti.add_frame(3, &[0.5, 0.1, 0.4], &[0, 1, 3], &[2, 0, 1]).unwrap();
        ti.add_frame(2, &[0.2, 0.9], &[0, 2], &[1, 0]).unwrap();
        for t in 0..ti.nb_frames() {
            for p in 0..ti.pos2tr[t].len() {
                let tr = ti.traj_of(t, p);
                assert!(ti.traj(tr).contains(t));
                assert_eq!(ti.traj(tr).at(t), p);
            }
        }
    }

    #[test]
    fn every_new_position_owned_once() {
        let mut ti = TrajIndex::new(2);
        ti.add_frame(5, &[0.1, 0.2], &[0, 1], &[3, 3]).unwrap();
        // position 3 linked once, the rest start new trajectories
        let owners: Vec<usize> = (0..5).map(|p| ti.traj_of(1, p)).collect();
        let mut sorted = owners.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 5);
        // no trajectory holds two positions of the same frame
        for tr in 0..ti.len() {
            let traj = ti.traj(tr);
            assert!(traj.len() <= ti.nb_frames());
        }
    }

    #[test]
    fn terminated_never_revived() {
        let mut ti = TrajIndex::new(1);
        ti.add_frame(1, &[], &[], &[]).unwrap(); // trajectory 0 terminates
        assert_eq!(ti.traj(0).last_frame(), 0);
        ti.add_frame(1, &[0.1], &[0], &[0]).unwrap(); // links traj 1, not 0
        assert_eq!(ti.traj(0).positions(), &[0]);
        assert_eq!(ti.traj(1).positions(), &[0, 0]);
    }

    #[test]
    fn argument_errors() {
        let mut ti = TrajIndex::new(2);
        assert!(matches!(
            ti.add_frame(2, &[0.1], &[0, 1], &[0]),
            Err(LinkError::Sizes(..))
        ));
        assert!(matches!(
            ti.add_frame(2, &[0.1], &[0], &[2]),
            Err(LinkError::TargetRange(2, 2))
        ));
    }
}
