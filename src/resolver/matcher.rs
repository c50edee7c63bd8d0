//! Sibling matching.
//!
//! Decides whether a dependency declared by one workspace package can be
//! satisfied by linking another workspace package instead of installing it.

use crate::core::Package;
use crate::resolver::version::satisfies;

/// Outcome of looking for a sibling that satisfies a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiblingMatch<'a> {
    /// A sibling with a compatible version; link it
    Linked(&'a Package),
    /// A sibling with the same name but an incompatible version; install
    /// the dependency instead, and tell the user
    Mismatch {
        sibling: &'a Package,
        range: &'a str,
    },
    /// No sibling with that name; install it
    External,
}

impl SiblingMatch<'_> {
    /// Whether the dependency must be installed.
    pub fn needs_install(&self) -> bool {
        !matches!(self, SiblingMatch::Linked(_))
    }
}

/// Check whether `candidate` satisfies a request for `name` at `range`.
pub fn matches(candidate: &Package, name: &str, range: &str) -> bool {
    candidate.name() == name && satisfies(candidate.version(), range)
}

/// Matches dependencies against the packages of a workspace.
#[derive(Debug, Clone, Copy)]
pub struct DependencyMatcher<'a> {
    packages: &'a [Package],
}

impl<'a> DependencyMatcher<'a> {
    pub fn new(packages: &'a [Package]) -> Self {
        DependencyMatcher { packages }
    }

    /// Whether a workspace package has this name.
    pub fn has_sibling(&self, name: &str) -> bool {
        self.packages.iter().any(|p| p.name() == name)
    }

    /// Look up the sibling for one of `requester`'s dependencies.
    ///
    /// A package never satisfies its own dependencies.
    pub fn find_satisfying_sibling(&self, requester: &'a Package, name: &str) -> SiblingMatch<'a> {
        let Some(range) = requester.dependency_range(name) else {
            return SiblingMatch::External;
        };
        let Some(sibling) = self
            .packages
            .iter()
            .find(|p| p.name() == name && *p != requester)
        else {
            return SiblingMatch::External;
        };

        if matches(sibling, name, range) {
            SiblingMatch::Linked(sibling)
        } else {
            SiblingMatch::Mismatch { sibling, range }
        }
    }

    /// Siblings that satisfy `requester`'s dependencies, in dependency order.
    pub fn linked_dependencies(&self, requester: &'a Package) -> Vec<&'a Package> {
        requester
            .dependencies()
            .keys()
            .filter_map(|name| match self.find_satisfying_sibling(requester, name) {
                SiblingMatch::Linked(sibling) => Some(sibling),
                _ => None,
            })
            .collect()
    }
}
