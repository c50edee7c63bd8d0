//! Dependency hoisting.
//!
//! Given the packages that install their external dependencies at the
//! workspace root, find for every dependency name the range most packages
//! ask for and install it once at the root. Packages asking for anything
//! else get their own local install of the range they declared.
//!
//! Workspace packages that were not linked because of a version mismatch
//! are never hoisted: the root copy would shadow the sibling for every other
//! consumer, so each requester installs its own.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use semver::Version;
use serde::Serialize;

use crate::core::manifest::installed_version;
use crate::core::Package;
use crate::resolver::matcher::DependencyMatcher;
use crate::resolver::version::satisfies;

/// Where a batch of dependencies is installed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InstallTarget {
    /// The workspace root, visible to every package by walk-up
    Root,
    /// One package's own directory
    Package(String),
}

impl fmt::Display for InstallTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallTarget::Root => f.write_str("<root>"),
            InstallTarget::Package(name) => f.write_str(name),
        }
    }
}

/// One `name@range` argument for the installer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Specifier {
    pub name: String,
    pub range: String,
}

impl Specifier {
    pub fn new(name: impl Into<String>, range: impl Into<String>) -> Self {
        Specifier {
            name: name.into(),
            range: range.into(),
        }
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.range.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}@{}", self.name, self.range)
        }
    }
}

/// A package that will install a different range than the hoisted one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoistWarning {
    pub package: String,
    pub dependency: String,
    pub range: String,
    pub common: String,
}

impl fmt::Display for HoistWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\" package depends on {}@{}, which differs from the more common {}@{}",
            self.package, self.dependency, self.range, self.dependency, self.common
        )
    }
}

/// Every install the bootstrap will perform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallPlan {
    installs: BTreeMap<InstallTarget, Vec<Specifier>>,
    common: BTreeMap<String, String>,
    warnings: Vec<HoistWarning>,
}

impl InstallPlan {
    /// Specifiers installed at the workspace root.
    pub fn root(&self) -> &[Specifier] {
        self.target(&InstallTarget::Root)
    }

    /// Specifiers installed into one package.
    pub fn for_package(&self, name: &str) -> &[Specifier] {
        self.target(&InstallTarget::Package(name.to_string()))
    }

    fn target(&self, target: &InstallTarget) -> &[Specifier] {
        self.installs.get(target).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All non-empty targets, root first.
    pub fn targets(&self) -> impl Iterator<Item = (&InstallTarget, &[Specifier])> {
        self.installs
            .iter()
            .filter(|(_, specs)| !specs.is_empty())
            .map(|(target, specs)| (target, specs.as_slice()))
    }

    /// Package targets only.
    pub fn package_targets(&self) -> impl Iterator<Item = (&str, &[Specifier])> {
        self.targets().filter_map(|(target, specs)| match target {
            InstallTarget::Package(name) => Some((name.as_str(), specs)),
            InstallTarget::Root => None,
        })
    }

    /// The range chosen as most common for a dependency name.
    pub fn common_range(&self, name: &str) -> Option<&str> {
        self.common.get(name).map(String::as_str)
    }

    /// All chosen common ranges.
    pub fn common_ranges(&self) -> &BTreeMap<String, String> {
        &self.common
    }

    /// Packages diverging from the common range.
    pub fn warnings(&self) -> &[HoistWarning] {
        &self.warnings
    }

    /// Total number of specifiers across all targets.
    pub fn specifier_count(&self) -> usize {
        self.installs.values().map(Vec::len).sum()
    }

    /// Whether nothing needs installing.
    pub fn is_empty(&self) -> bool {
        self.specifier_count() == 0
    }

    fn push(&mut self, target: InstallTarget, spec: Specifier) {
        let specs = self.installs.entry(target).or_default();
        if !specs.contains(&spec) {
            specs.push(spec);
        }
    }
}

/// Read-only view of what is already installed on disk.
pub trait InstallState: Sync {
    /// Version of `name` installed under `dir/node_modules`, if any.
    fn installed_version(&self, dir: &Path, name: &str) -> Option<Version>;

    /// Whether `dir` already holds a copy of `name` satisfying `range`.
    fn has_compatible(&self, dir: &Path, name: &str, range: &str) -> bool {
        self.installed_version(dir, name)
            .is_some_and(|v| satisfies(&v, range))
    }
}

/// Reads installed manifests from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskInstallState;

impl InstallState for DiskInstallState {
    fn installed_version(&self, dir: &Path, name: &str) -> Option<Version> {
        installed_version(dir, name)
    }
}

/// One dependency a package needs installed.
#[derive(Debug, Clone, Copy)]
pub struct DependencyRequest<'a> {
    pub requester: &'a Package,
    pub name: &'a str,
    pub range: &'a str,
}

/// Requests for one range of one dependency name.
struct RangeGroup<'a> {
    range: &'a str,
    requesters: Vec<&'a Package>,
}

/// Computes the [`InstallPlan`] of a workspace.
pub struct HoistPlanner<'a> {
    matcher: DependencyMatcher<'a>,
    root: &'a Path,
    state: &'a dyn InstallState,
}

impl<'a> HoistPlanner<'a> {
    pub fn new(matcher: DependencyMatcher<'a>, root: &'a Path, state: &'a dyn InstallState) -> Self {
        HoistPlanner {
            matcher,
            root,
            state,
        }
    }

    /// Dependencies of `pkg` that no sibling satisfies.
    pub fn requests(&self, pkg: &'a Package) -> Vec<DependencyRequest<'a>> {
        pkg.dependencies()
            .iter()
            .filter(|(name, _)| self.matcher.find_satisfying_sibling(pkg, name).needs_install())
            .map(|(name, range)| DependencyRequest {
                requester: pkg,
                name,
                range,
            })
            .collect()
    }

    /// Plan installs for `hoisted` packages (external strategy `root`) and
    /// `local` packages (external strategy `default`).
    pub fn plan(&self, hoisted: &[&'a Package], local: &[&'a Package]) -> InstallPlan {
        let mut plan = InstallPlan::default();
        self.plan_hoisted(hoisted, &mut plan);
        self.plan_local(local, &mut plan);
        plan
    }

    fn plan_hoisted(&self, packages: &[&'a Package], plan: &mut InstallPlan) {
        // name -> ranges in first-seen order
        let mut groups: BTreeMap<&'a str, Vec<RangeGroup<'a>>> = BTreeMap::new();

        for pkg in packages {
            for request in self.requests(pkg) {
                let ranges = groups.entry(request.name).or_default();
                match ranges.iter_mut().find(|g| g.range == request.range) {
                    Some(group) => group.requesters.push(request.requester),
                    None => ranges.push(RangeGroup {
                        range: request.range,
                        requesters: vec![request.requester],
                    }),
                }
            }
        }

        for (name, ranges) in groups {
            let Some(common) = most_common(&ranges) else {
                continue;
            };
            plan.common.insert(name.to_string(), common.to_string());

            let internal = self.matcher.has_sibling(name);
            if internal {
                tracing::debug!("not hoisting `{}`: it is a workspace package", name);
            } else if self.state.has_compatible(self.root, name, common) {
                tracing::debug!("{}@{} is already installed at the root", name, common);
            } else {
                plan.push(InstallTarget::Root, Specifier::new(name, common));
            }

            for group in &ranges {
                if group.range == common && !internal {
                    continue;
                }
                for requester in &group.requesters {
                    if group.range != common {
                        plan.warnings.push(HoistWarning {
                            package: requester.name().to_string(),
                            dependency: name.to_string(),
                            range: group.range.to_string(),
                            common: common.to_string(),
                        });
                    }
                    if self
                        .state
                        .has_compatible(requester.location(), name, group.range)
                    {
                        continue;
                    }
                    plan.push(
                        InstallTarget::Package(requester.name().to_string()),
                        Specifier::new(name, group.range),
                    );
                }
            }
        }
    }

    fn plan_local(&self, packages: &[&'a Package], plan: &mut InstallPlan) {
        for pkg in packages {
            for request in self.requests(pkg) {
                if self
                    .state
                    .has_compatible(pkg.location(), request.name, request.range)
                {
                    continue;
                }
                plan.push(
                    InstallTarget::Package(pkg.name().to_string()),
                    Specifier::new(request.name, request.range),
                );
            }
        }
    }
}

/// The range with the most requests; ties go to the range seen first.
fn most_common<'a>(ranges: &[RangeGroup<'a>]) -> Option<&'a str> {
    let mut best: Option<&RangeGroup<'a>> = None;
    for group in ranges {
        match best {
            Some(b) if group.requesters.len() <= b.requesters.len() => {}
            _ => best = Some(group),
        }
    }
    best.map(|g| g.range)
}
