/// Supplies the tenant (store) every query is scoped to.
pub trait StoreContext: Send + Sync {
    fn current_store_id(&self) -> i64;
}

/// A store context pinned to a single store id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedStore(pub i64);

impl StoreContext for FixedStore {
    fn current_store_id(&self) -> i64 {
        self.0
    }
}
