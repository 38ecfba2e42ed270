use fixedbitset::FixedBitSet;

/// Handle into a [`LabelArena`]. Cheap to copy; stable for the lifetime of
/// the arena that produced it.
pub type LabelHandle = u32;

/// A partial path through the graph, as defined in the label-setting
/// algorithm of Feillet et al. with the Boland-Dethridge-Dumitrescu
/// reachable-set tightening.
///
/// Labels form a tree of back-pointers rooted at the seed label; they are
/// never cloned deeply, only referenced by [`LabelHandle`] into the owning
/// [`LabelArena`].
#[derive(Debug, Clone)]
pub struct Label {
    pub node: usize,
    pub reduced_cost: f64,
    pub routing_time: f64,
    pub demand: f64,
    pub predecessor: Option<LabelHandle>,
    reachable: FixedBitSet,
    reachable_count: usize,
}

impl Label {
    pub fn reachable_count(&self) -> usize {
        self.reachable_count
    }

    pub fn is_reachable(&self, node: usize) -> bool {
        self.reachable.contains(node)
    }

    pub fn reachable_bits(&self) -> &FixedBitSet {
        &self.reachable
    }

    /// Dominance rule of the label-setting engine.
    ///
    /// At the sink, only reduced cost matters. Everywhere else, `self`
    /// dominates `other` when it is weakly better on every resource and can
    /// reach at least the set of nodes `other` can reach.
    pub fn dominates(&self, other: &Label, is_sink: bool) -> bool {
        if is_sink {
            return self.reduced_cost < other.reduced_cost;
        }

        if self.demand > other.demand
            || self.reduced_cost > other.reduced_cost
            || self.routing_time > other.routing_time
        {
            return false;
        }
        if self.reachable_count < other.reachable_count {
            return false;
        }
        // self.reachable must be a superset of other.reachable: no bit set in
        // `other` may be clear in `self`.
        other.reachable.difference(&self.reachable).next().is_none()
    }
}

/// Owns every label produced during a single solve.
///
/// Backed by a flat `Vec` indexed by [`LabelHandle`] so that predecessor
/// chains are plain integers instead of reference-counted pointers.
#[derive(Debug, Default)]
pub struct LabelArena {
    labels: Vec<Label>,
}

impl LabelArena {
    pub fn new() -> Self {
        Self { labels: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.labels.clear();
    }

    pub fn get(&self, handle: LabelHandle) -> &Label {
        &self.labels[handle as usize]
    }

    /// Inserts the seed label at `node` (normally the source) with an
    /// explicit starting reachability set.
    pub fn insert_seed(&mut self, node: usize, reachable: FixedBitSet) -> LabelHandle {
        let reachable_count = reachable.count_ones(..);
        self.labels.push(Label {
            node,
            reduced_cost: 0.0,
            routing_time: 0.0,
            demand: 0.0,
            predecessor: None,
            reachable,
            reachable_count,
        });
        (self.labels.len() - 1) as LabelHandle
    }

    /// Inserts a successor label extended from `predecessor`.
    #[allow(clippy::too_many_arguments)]
    pub fn insert_successor(
        &mut self,
        node: usize,
        reduced_cost: f64,
        routing_time: f64,
        demand: f64,
        predecessor: LabelHandle,
        reachable: FixedBitSet,
    ) -> LabelHandle {
        let reachable_count = reachable.count_ones(..);
        self.labels.push(Label {
            node,
            reduced_cost,
            routing_time,
            demand,
            predecessor: Some(predecessor),
            reachable,
            reachable_count,
        });
        (self.labels.len() - 1) as LabelHandle
    }

    /// Walks the back-pointer chain from `handle` to the seed and returns the
    /// visited node-id sequence in forward (source-to-terminal) order.
    pub fn visited_path(&self, handle: LabelHandle) -> Vec<usize> {
        let mut path = Vec::new();
        let mut cur = Some(handle);
        while let Some(h) = cur {
            let label = self.get(h);
            path.push(label.node);
            cur = label.predecessor;
        }
        path.reverse();
        path
    }

    /// Equality used only as a dominance short-circuit: same terminal node,
    /// demand, routing time, and an identical visited node-id sequence.
    /// Reduced cost is deliberately excluded (see design notes).
    pub fn labels_equal(&self, a: LabelHandle, b: LabelHandle) -> bool {
        let la = self.get(a);
        let lb = self.get(b);
        if la.node != lb.node || la.demand != lb.demand || la.routing_time != lb.routing_time {
            return false;
        }

        let mut ca = la.predecessor;
        let mut cb = lb.predecessor;
        loop {
            match (ca, cb) {
                (None, None) => return true,
                (Some(ha), Some(hb)) => {
                    if self.get(ha).node != self.get(hb).node {
                        return false;
                    }
                    ca = self.get(ha).predecessor;
                    cb = self.get(hb).predecessor;
                }
                _ => return false,
            }
        }
    }
}
