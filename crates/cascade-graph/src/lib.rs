mod discover;
mod order;
mod types;

pub use discover::discover;
pub use order::schedule;
pub use types::{DependencyEdge, PackageGraph, PackageNode, ROOT_ID};

#[cfg(test)]
mod tests;
