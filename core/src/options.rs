/// How much path-scoped reconciliation trusts its caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PathReconciliation {
    /// Only the nodes along the path are re-synchronized. Children off the
    /// path are assumed unchanged and are not looked at.
    #[default]
    TrustCaller,
    /// Ignore the path and re-synchronize the whole subtree.
    VerifyAll,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeOptions {
    pub path_reconciliation: PathReconciliation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessorOptions {
    /// Worker threads for entry processing. `None` uses rayon's global pool.
    pub num_threads: Option<usize>,
}
