//! Target binding: canonical track paths resolve to opaque handles at
//! instantiation time. Hosts implement `TargetResolver`; an unresolved path
//! leaves the track unbound and its contributions are skipped per step.

/// Opaque target handle (small string key).
pub type TargetHandle = String;

/// Trait for resolving canonical target paths to opaque handles.
/// Adapters implement this and pass it into `Engine::instantiate`.
pub trait TargetResolver {
    fn resolve(&mut self, path: &str) -> Option<TargetHandle>;
}

/// Identity resolver: every path is its own handle. Convenient for hosts
/// whose property store is keyed directly by path.
#[derive(Default, Debug)]
pub struct IdentityResolver;

impl TargetResolver for IdentityResolver {
    fn resolve(&mut self, path: &str) -> Option<TargetHandle> {
        Some(path.to_string())
    }
}
