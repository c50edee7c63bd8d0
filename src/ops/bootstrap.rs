//! Implementation of `tether bootstrap`.
//!
//! A bootstrap runs in two halves. Planning reads the workspace and
//! produces every link action and install without touching the disk; it
//! fails on configuration errors before anything is written. Execution
//! then installs external dependencies (root first), links binaries of
//! root-installed packages, and finally applies the link actions.

use std::collections::HashMap;
use std::fmt;

use anyhow::Result;
use semver::Version;
use serde::Serialize;

use crate::core::manifest::{PackageManifest, MANIFEST_NAME};
use crate::core::strategy::{ExternalStrategy, LocalStrategy, StrategySetting};
use crate::core::{Package, Strategy, StrategyResolver, Workspace};
use crate::linker::LinkAction;
use crate::resolver::{
    satisfies, DependencyMatcher, DiskInstallState, HoistPlanner, InstallPlan, InstallState,
    SiblingMatch,
};
use crate::sources::Installer;
use crate::util::config::default_concurrency;
use crate::util::fs::ensure_dir;
use crate::util::{run_parallel, run_series, task, Progress, Task};

/// Options for the bootstrap command.
#[derive(Debug, Clone, Default)]
pub struct BootstrapOptions {
    /// Run-level strategy, overriding `tether.toml`
    pub strategy: Option<String>,

    /// Glob over package names to skip, overriding `tether.toml`
    pub ignore: Option<String>,

    /// Maximum concurrent actions (None = config, then CPU count; 0 = unbounded)
    pub concurrency: Option<usize>,

    /// Show progress bars
    pub progress: bool,
}

/// A sibling that has the right name but the wrong version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionMismatch {
    pub package: String,
    pub dependency: String,
    pub range: String,
    pub found: Version,
}

impl fmt::Display for VersionMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Version mismatch inside \"{}\". Depends on \"{}@{}\" instead of \"{}\".",
            self.package, self.dependency, self.range, self.found
        )
    }
}

/// Everything the bootstrap does for one package.
#[derive(Debug)]
pub struct PackagePlan<'a> {
    pub package: &'a Package,
    pub strategy: Strategy,
    /// Link actions, applied in order
    pub actions: Vec<LinkAction>,
    pub mismatches: Vec<VersionMismatch>,
}

impl PackagePlan<'_> {
    /// Whether the package's own `node_modules` receives anything.
    pub fn uses_node_modules(&self, installs: &InstallPlan) -> bool {
        self.strategy.external == ExternalStrategy::Default
            || !self.actions.is_empty()
            || !installs.for_package(self.package.name()).is_empty()
    }
}

/// The complete bootstrap of a workspace.
#[derive(Debug)]
pub struct BootstrapPlan<'a> {
    /// Bootstrapped packages, in workspace order
    pub packages: Vec<PackagePlan<'a>>,

    /// Placements of `link`-strategy siblings in the root `node_modules`
    pub root_links: Vec<LinkAction>,

    /// External installs
    pub installs: InstallPlan,

    /// Effective concurrency limit
    pub concurrency: usize,
}

impl BootstrapPlan<'_> {
    /// Number of link actions across packages and the root.
    pub fn link_count(&self) -> usize {
        self.packages.iter().map(|p| p.actions.len()).sum::<usize>() + self.root_links.len()
    }

    /// All version mismatches found while matching siblings.
    pub fn mismatches(&self) -> impl Iterator<Item = &VersionMismatch> {
        self.packages.iter().flat_map(|p| p.mismatches.iter())
    }
}

/// What a finished bootstrap did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapSummary {
    /// Packages bootstrapped
    pub packages: usize,
    /// Specifiers handed to the installer
    pub installed: usize,
    /// Link actions applied
    pub links: usize,
}

/// Compute the bootstrap of `ws` without touching the filesystem.
pub fn plan_bootstrap<'a>(
    ws: &'a Workspace,
    opts: &BootstrapOptions,
    state: &dyn InstallState,
) -> Result<BootstrapPlan<'a>> {
    let config = &ws.config().bootstrap;

    let ignore = opts.ignore.as_deref().or(config.ignore.as_deref());
    let selected = ws.filter_packages(ignore)?;

    let concurrency = opts
        .concurrency
        .or(config.concurrency)
        .unwrap_or_else(default_concurrency);

    // Every package is resolved, ignored ones included: they can still be
    // linked into others.
    let resolver = StrategyResolver::new(
        opts.strategy.as_deref().map(StrategySetting::from),
        config.strategy.clone(),
    );
    resolver.validate()?;
    let mut strategies: HashMap<&str, Strategy> = HashMap::new();
    for pkg in ws.packages() {
        let strategy = resolver.resolve_for(pkg)?;
        tracing::debug!("{} uses strategy {}", pkg.name(), strategy);
        strategies.insert(pkg.name(), strategy);
    }
    let strategy_of = |pkg: &Package| strategies.get(pkg.name()).copied().unwrap_or_default();

    let matcher = DependencyMatcher::new(ws.packages());
    let mut packages = Vec::with_capacity(selected.len());
    let mut root_placed: Vec<&Package> = Vec::new();

    for &pkg in &selected {
        let mut actions = Vec::new();
        let mut mismatches = Vec::new();

        for name in pkg.dependencies().keys() {
            match matcher.find_satisfying_sibling(pkg, name) {
                SiblingMatch::Linked(sibling) => {
                    let local = strategy_of(sibling).local;
                    let dest = pkg.node_modules().join(sibling.name());
                    match local {
                        LocalStrategy::Default => actions.push(LinkAction::SymlinkPackage {
                            src: sibling.location().to_path_buf(),
                            dest,
                        }),
                        LocalStrategy::Copy => {
                            let files = &sibling.overrides().files;
                            if !files.is_empty() {
                                actions.push(LinkAction::CopyFiles {
                                    src_dir: sibling.location().to_path_buf(),
                                    dest_dir: dest,
                                    files: files.clone(),
                                });
                            }
                        }
                        LocalStrategy::Link => {
                            if !root_placed.contains(&sibling) {
                                root_placed.push(sibling);
                            }
                        }
                    }

                    let bins = sibling.bin_entries();
                    if local != LocalStrategy::Copy && !bins.is_empty() {
                        actions.push(LinkAction::SymlinkBinaries {
                            src_pkg_dir: sibling.location().to_path_buf(),
                            dest_dir: pkg.node_modules(),
                            bins,
                        });
                    }
                }
                SiblingMatch::Mismatch { sibling, range } => {
                    let mismatch = VersionMismatch {
                        package: pkg.name().to_string(),
                        dependency: sibling.name().to_string(),
                        range: range.to_string(),
                        found: sibling.version().clone(),
                    };
                    tracing::warn!("{}", mismatch);
                    mismatches.push(mismatch);
                }
                SiblingMatch::External => {}
            }
        }

        packages.push(PackagePlan {
            package: pkg,
            strategy: strategy_of(pkg),
            actions,
            mismatches,
        });
    }

    let root_links = root_placements(ws, &root_placed);

    let (hoisted, local): (Vec<&Package>, Vec<&Package>) = selected
        .iter()
        .copied()
        .partition(|p| strategy_of(*p).external == ExternalStrategy::Root);
    let planner = HoistPlanner::new(matcher, ws.root(), state);
    let installs = planner.plan(&hoisted, &local);

    for warning in installs.warnings() {
        tracing::warn!("{}", warning);
    }

    Ok(BootstrapPlan {
        packages,
        root_links,
        installs,
        concurrency,
    })
}

/// Root `node_modules` entries for siblings using the `link` strategy.
fn root_placements(ws: &Workspace, siblings: &[&Package]) -> Vec<LinkAction> {
    let root_nm = ws.root_node_modules();
    let shim_prefix = ws.config().shim_prefix();
    let mut actions = Vec::new();

    for sibling in siblings {
        let src = sibling.location().to_path_buf();
        let dest = root_nm.join(sibling.name());
        actions.push(match shim_prefix {
            Some(prefix) => LinkAction::WriteShim {
                src: src.clone(),
                dest,
                name: sibling.name().to_string(),
                prefix: prefix.to_string(),
            },
            None => LinkAction::SymlinkPackage {
                src: src.clone(),
                dest,
            },
        });

        let bins = sibling.bin_entries();
        if !bins.is_empty() {
            actions.push(LinkAction::SymlinkBinaries {
                src_pkg_dir: src,
                dest_dir: root_nm.clone(),
                bins,
            });
        }
    }
    actions
}

/// Bootstrap the workspace, reading installed versions from disk.
pub fn bootstrap(
    ws: &Workspace,
    opts: &BootstrapOptions,
    installer: &dyn Installer,
) -> Result<BootstrapSummary> {
    bootstrap_with(ws, opts, installer, &DiskInstallState)
}

/// Bootstrap the workspace.
///
/// Stops at the first error. Nothing is rolled back; running again
/// converges.
pub fn bootstrap_with(
    ws: &Workspace,
    opts: &BootstrapOptions,
    installer: &dyn Installer,
    state: &dyn InstallState,
) -> Result<BootstrapSummary> {
    let plan = plan_bootstrap(ws, opts, state)?;
    tracing::info!("Bootstrapping {} packages", plan.packages.len());

    for pkg_plan in &plan.packages {
        if pkg_plan.uses_node_modules(&plan.installs) {
            ensure_dir(&pkg_plan.package.node_modules())?;
        }
    }

    let installed = run_installs(ws, &plan, installer, opts.progress)?;

    let root_bins = root_binary_links(ws, &plan, state);
    if !root_bins.is_empty() {
        tracing::info!("Symlinking binaries of {} root dependencies", root_bins.len());
    }
    run_parallel(apply_each(&root_bins), plan.concurrency)?;

    let progress = Progress::new(opts.progress, plan.packages.len(), "Linking");
    let tasks: Vec<Task<'_>> = plan
        .packages
        .iter()
        .map(|pkg_plan| {
            let progress = progress.clone();
            task(move || {
                run_series(apply_each(&pkg_plan.actions))?;
                progress.tick(pkg_plan.package.name());
                Ok(())
            })
        })
        .collect();
    let linked = run_parallel(tasks, plan.concurrency);
    progress.finish();
    linked?;

    if !plan.root_links.is_empty() {
        tracing::info!("Linking {} actions at the root", plan.root_links.len());
    }
    run_parallel(apply_each(&plan.root_links), plan.concurrency)?;

    Ok(BootstrapSummary {
        packages: plan.packages.len(),
        installed,
        links: plan.link_count() + root_bins.len(),
    })
}

fn apply_each(actions: &[LinkAction]) -> Vec<Task<'_>> {
    actions.iter().map(|a| task(move || a.apply())).collect()
}

/// Install at the root, then into every package in parallel.
fn run_installs(
    ws: &Workspace,
    plan: &BootstrapPlan<'_>,
    installer: &dyn Installer,
    show_progress: bool,
) -> Result<usize> {
    let installs = &plan.installs;
    if installs.is_empty() {
        return Ok(0);
    }
    tracing::info!(
        "Installing {} external dependencies with {}",
        installs.specifier_count(),
        installer.name()
    );

    let root = installs.root();
    if !root.is_empty() {
        installer.install_into(ws.root(), root)?;
    }

    let targets: Vec<_> = installs
        .package_targets()
        .filter_map(|(name, specs)| ws.package(name).map(|pkg| (pkg, specs)))
        .collect();
    let progress = Progress::new(show_progress, targets.len(), "Installing");

    let tasks: Vec<Task<'_>> = targets
        .into_iter()
        .map(|(pkg, specs)| {
            let progress = progress.clone();
            task(move || {
                installer.install_into(pkg.location(), specs)?;
                progress.tick(pkg.name());
                Ok(())
            })
        })
        .collect();
    let result = run_parallel(tasks, plan.concurrency);
    progress.finish();
    result?;

    Ok(installs.specifier_count())
}

/// Links from every bootstrapped package's `.bin` to the binaries of
/// dependencies hoisted to the root.
///
/// A package keeping its own copy of the dependency, because it asks for
/// another range, keeps the binaries of that copy.
fn root_binary_links(
    ws: &Workspace,
    plan: &BootstrapPlan<'_>,
    state: &dyn InstallState,
) -> Vec<LinkAction> {
    let root_nm = ws.root_node_modules();
    let mut actions = Vec::new();

    for (name, common) in plan.installs.common_ranges() {
        if ws.package(name).is_some() {
            continue;
        }
        let dir = root_nm.join(name);
        let manifest = match PackageManifest::load(&dir.join(MANIFEST_NAME)) {
            Ok(manifest) => manifest,
            Err(e) => {
                tracing::debug!("no binaries for `{}`: {:#}", name, e);
                continue;
            }
        };
        let bins = manifest
            .bin
            .map(|bin| bin.entries(name))
            .unwrap_or_default();
        if bins.is_empty() {
            continue;
        }

        for pkg_plan in &plan.packages {
            let pkg = pkg_plan.package;
            let installs_own = plan
                .installs
                .for_package(pkg.name())
                .iter()
                .any(|spec| &spec.name == name);
            let has_other_copy = state
                .installed_version(pkg.location(), name)
                .is_some_and(|v| !satisfies(&v, common));
            if installs_own || has_other_copy {
                tracing::debug!("`{}` keeps its own binaries of `{}`", pkg.name(), name);
                continue;
            }

            actions.push(LinkAction::SymlinkBinaries {
                src_pkg_dir: dir.clone(),
                dest_dir: pkg.node_modules(),
                bins: bins.clone(),
            });
        }
    }
    actions
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::core::StrategyError;
    use crate::test_support::{basic_workspace, link_topology, RecordingInstaller, WorkspaceFixture};
    use serde_json::json;
    use std::fs;

    fn opts(strategy: &str) -> BootstrapOptions {
        BootstrapOptions {
            strategy: Some(strategy.to_string()),
            concurrency: Some(4),
            ..BootstrapOptions::default()
        }
    }

    fn specs(list: &[crate::resolver::Specifier]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plan_basic_workspace_hoisted() {
        let fixture = basic_workspace();
        let ws = fixture.load();

        let plan = plan_bootstrap(&ws, &opts("default:root"), &DiskInstallState).unwrap();

        assert_eq!(specs(plan.installs.root()), vec!["foo@^1.0.0"]);
        assert_eq!(specs(plan.installs.for_package("package-3")), vec!["foo@0.1.12"]);
        assert_eq!(
            specs(plan.installs.for_package("package-4")),
            vec!["package-1@^0.0.0"]
        );
        assert!(plan.installs.for_package("package-1").is_empty());

        let p1 = &plan.packages[0];
        assert_eq!(p1.package.name(), "package-1");
        assert_eq!(
            p1.actions,
            vec![LinkAction::SymlinkPackage {
                src: fixture.package_dir("package-2"),
                dest: fixture.package_dir("package-1").join("node_modules/package-2"),
            }]
        );

        let mismatches: Vec<_> = plan.mismatches().collect();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(
            mismatches[0].to_string(),
            "Version mismatch inside \"package-4\". Depends on \"package-1@^0.0.0\" instead of \"1.0.0\"."
        );
    }

    #[test]
    fn test_plan_without_hoisting_installs_per_package() {
        let fixture = basic_workspace();
        let ws = fixture.load();

        let plan = plan_bootstrap(&ws, &BootstrapOptions::default(), &DiskInstallState).unwrap();

        assert!(plan.installs.root().is_empty());
        assert_eq!(specs(plan.installs.for_package("package-1")), vec!["foo@^1.0.0"]);
        assert_eq!(specs(plan.installs.for_package("package-3")), vec!["foo@0.1.12"]);
    }

    #[test]
    fn test_bootstrap_installs_root_before_packages() {
        let fixture = basic_workspace();
        let ws = fixture.load();
        let installer = RecordingInstaller::new();

        let summary = bootstrap(&ws, &opts("default:root"), &installer).unwrap();

        let calls = installer.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].dir, fixture.root());
        assert_eq!(calls[0].specs, vec!["foo@^1.0.0"]);
        assert_eq!(
            installer.specs_for(&fixture.package_dir("package-3")),
            Some(vec!["foo@0.1.12".to_string()])
        );
        assert_eq!(summary.packages, 4);
        assert_eq!(summary.installed, 3);

        let link = fixture.package_dir("package-1").join("node_modules/package-2");
        assert_eq!(fs::read_link(link).unwrap(), fixture.package_dir("package-2"));
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let fixture = basic_workspace();
        let ws = fixture.load();
        let installer = RecordingInstaller::populating();

        bootstrap(&ws, &opts("default:root"), &installer).unwrap();
        let first = link_topology(fixture.root());
        let first_calls = installer.calls().len();

        let summary = bootstrap(&ws, &opts("default:root"), &installer).unwrap();
        let second = link_topology(fixture.root());

        assert_eq!(first, second);
        assert_eq!(installer.calls().len(), first_calls);
        assert_eq!(summary.installed, 0);
    }

    #[test]
    fn test_satisfied_root_install_is_skipped() {
        let fixture = basic_workspace().installed(".", "foo", "1.0.0");
        let ws = fixture.load();
        let installer = RecordingInstaller::new();

        bootstrap(&ws, &opts("default:root"), &installer).unwrap();

        assert!(installer.specs_for(fixture.root()).is_none());
        assert_eq!(
            installer.specs_for(&fixture.package_dir("package-3")),
            Some(vec!["foo@0.1.12".to_string()])
        );
    }

    #[test]
    fn test_sibling_binaries_are_linked_into_consumers() {
        let fixture = WorkspaceFixture::new()
            .manifest(
                "package-1",
                json!({ "name": "package-1", "version": "1.0.0", "bin": { "foo": "cli.js" } }),
            )
            .package("package-2", "1.0.0", &[("package-1", "^1.0.0")])
            .package("package-3", "1.0.0", &[("package-1", "^1.0.0")]);
        let ws = fixture.load();
        let installer = RecordingInstaller::new();

        bootstrap(&ws, &opts("default"), &installer).unwrap();
        bootstrap(&ws, &opts("default"), &installer).unwrap();

        let target = fixture.package_dir("package-1").join("cli.js");
        for consumer in ["package-2", "package-3"] {
            let link = fixture.package_dir(consumer).join("node_modules/.bin/foo");
            assert_eq!(fs::read_link(&link).unwrap(), target);
        }
        assert!(installer.calls().is_empty());
    }

    #[test]
    fn test_root_installed_binaries_are_linked_into_packages() {
        let fixture = WorkspaceFixture::new()
            .package("package-1", "1.0.0", &[("tool", "^2.0.0")])
            .package("package-2", "1.0.0", &[("tool", "^2.0.0")]);
        let ws = fixture.load();
        let installer = RecordingInstaller::populating().with_bin("tool", "bin/tool.js");

        let summary = bootstrap(&ws, &opts("default:root"), &installer).unwrap();

        let target = fixture.path("node_modules/tool/bin/tool.js");
        for pkg in ["package-1", "package-2"] {
            let link = fixture.package_dir(pkg).join("node_modules/.bin/tool");
            assert_eq!(fs::read_link(&link).unwrap(), target);
        }
        assert_eq!(summary.links, 2);
    }

    #[test]
    fn test_local_copy_keeps_its_own_binaries() {
        let fixture = WorkspaceFixture::new()
            .package("package-1", "1.0.0", &[("tool", "^2.0.0")])
            .package("package-2", "1.0.0", &[("tool", "^2.0.0")])
            .package("package-3", "1.0.0", &[("tool", "^1.0.0")]);
        let ws = fixture.load();
        let installer = RecordingInstaller::populating().with_bin("tool", "cli.js");

        let summary = bootstrap(&ws, &opts("default:root"), &installer).unwrap();
        assert_eq!(summary.links, 2);

        let root_cli = fixture.path("node_modules/tool/cli.js");
        let own_bin = fixture.package_dir("package-3").join("node_modules/.bin/tool");
        assert_eq!(
            fs::read_link(fixture.package_dir("package-1").join("node_modules/.bin/tool")).unwrap(),
            root_cli
        );
        assert!(fs::symlink_metadata(&own_bin).is_err());

        // The local copy is already installed on the second run
        let summary = bootstrap(&ws, &opts("default:root"), &installer).unwrap();
        assert_eq!(summary.installed, 0);
        assert_eq!(summary.links, 2);
        assert!(fs::symlink_metadata(&own_bin).is_err());
    }

    #[test]
    fn test_link_strategy_places_sibling_at_root() {
        let fixture = WorkspaceFixture::new()
            .manifest(
                "lib",
                json!({
                    "name": "lib",
                    "version": "1.0.0",
                    "bin": "cli.js",
                    "tether": { "strategy": "link" }
                }),
            )
            .package("app", "1.0.0", &[("lib", "^1.0.0")]);
        let ws = fixture.load();

        bootstrap(&ws, &BootstrapOptions::default(), &RecordingInstaller::new()).unwrap();

        assert_eq!(
            fs::read_link(fixture.path("node_modules/lib")).unwrap(),
            fixture.package_dir("lib")
        );
        assert!(fs::symlink_metadata(fixture.package_dir("app").join("node_modules/lib")).is_err());
        assert_eq!(
            fs::read_link(fixture.package_dir("app").join("node_modules/.bin/lib")).unwrap(),
            fixture.package_dir("lib").join("cli.js")
        );
        assert!(fs::symlink_metadata(fixture.path("node_modules/.bin/lib")).is_ok());
    }

    #[test]
    fn test_link_strategy_writes_shim_when_configured() {
        let fixture = WorkspaceFixture::new()
            .config("[linked-files]\nprefix = \"// linked\\n\"\n")
            .manifest(
                "lib",
                json!({ "name": "lib", "version": "3.1.0", "tether": { "strategy": "link" } }),
            )
            .package("app", "1.0.0", &[("lib", "^3.0.0")]);
        let ws = fixture.load();

        bootstrap(&ws, &BootstrapOptions::default(), &RecordingInstaller::new()).unwrap();

        let shim = fixture.path("node_modules/lib");
        assert!(!fs::symlink_metadata(&shim).unwrap().file_type().is_symlink());
        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(shim.join("package.json")).unwrap()).unwrap();
        assert_eq!(manifest["version"], "3.1.0");
        let entry = fs::read_to_string(shim.join("index.js")).unwrap();
        assert!(entry.starts_with("// linked\nmodule.exports = require("));
    }

    #[test]
    fn test_copy_strategy_copies_files() {
        let fixture = WorkspaceFixture::new()
            .manifest(
                "lib",
                json!({
                    "name": "lib",
                    "version": "1.0.0",
                    "tether": { "strategy": "copy", "files": ["package.json", "dist/**"] }
                }),
            )
            .file("packages/lib/dist/index.js", "module.exports = 1;")
            .file("packages/lib/src/index.ts", "export default 1;")
            .package("app", "1.0.0", &[("lib", "^1.0.0")]);
        let ws = fixture.load();

        bootstrap(&ws, &BootstrapOptions::default(), &RecordingInstaller::new()).unwrap();

        let dest = fixture.package_dir("app").join("node_modules/lib");
        assert!(!fs::symlink_metadata(&dest).unwrap().file_type().is_symlink());
        assert!(dest.join("package.json").is_file());
        assert!(dest.join("dist/index.js").is_file());
        assert!(!dest.join("src").exists());
    }

    #[test]
    fn test_copy_strategy_without_files_does_nothing() {
        let fixture = WorkspaceFixture::new()
            .manifest(
                "lib",
                json!({ "name": "lib", "version": "1.0.0", "tether": { "strategy": "copy" } }),
            )
            .package("app", "1.0.0", &[("lib", "^1.0.0")]);
        let ws = fixture.load();

        let plan = plan_bootstrap(&ws, &BootstrapOptions::default(), &DiskInstallState).unwrap();
        assert!(plan.packages.iter().all(|p| p.actions.is_empty()));
    }

    #[test]
    fn test_ignored_packages_are_still_link_sources() {
        let fixture = basic_workspace();
        let ws = fixture.load();
        let options = BootstrapOptions {
            ignore: Some("package-2".to_string()),
            ..BootstrapOptions::default()
        };

        let plan = plan_bootstrap(&ws, &options, &DiskInstallState).unwrap();

        let names: Vec<_> = plan.packages.iter().map(|p| p.package.name()).collect();
        assert_eq!(names, vec!["package-1", "package-3", "package-4"]);
        assert_eq!(plan.packages[0].actions.len(), 1);
    }

    #[test]
    fn test_ignore_from_config() {
        let fixture = basic_workspace().config("[bootstrap]\nignore = \"package-[34]\"\n");
        let ws = fixture.load();

        let plan = plan_bootstrap(&ws, &BootstrapOptions::default(), &DiskInstallState).unwrap();
        assert_eq!(plan.packages.len(), 2);
    }

    #[test]
    fn test_invalid_strategy_fails_before_any_mutation() {
        let fixture = basic_workspace();
        let ws = fixture.load();
        let installer = RecordingInstaller::new();

        let err = bootstrap(&ws, &opts("default:global"), &installer).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<StrategyError>(),
            Some(StrategyError::InvalidExternal { .. })
        ));
        assert!(installer.calls().is_empty());
        assert!(link_topology(fixture.root()).is_empty());
        assert!(!fixture.package_dir("package-1").join("node_modules").exists());
    }

    #[test]
    fn test_invalid_package_override_names_the_package() {
        let fixture = WorkspaceFixture::new().manifest(
            "odd",
            json!({ "name": "odd", "version": "1.0.0", "tether": { "strategy": 42 } }),
        );
        let ws = fixture.load();

        let err = plan_bootstrap(&ws, &BootstrapOptions::default(), &DiskInstallState).unwrap_err();
        assert!(err.to_string().contains("must be a string"));
        assert!(err.to_string().contains("package `odd`"));
    }

    #[test]
    fn test_install_failure_is_returned() {
        let fixture = basic_workspace();
        let ws = fixture.load();
        let installer = RecordingInstaller::new().failing_on("foo");

        let err = bootstrap(&ws, &opts("default:root"), &installer).unwrap_err();

        assert!(err.to_string().contains("install of `foo` failed"));
        // The root install failed, so no package install was started
        assert_eq!(installer.calls().len(), 1);
    }

    #[test]
    fn test_concurrency_falls_back_to_config() {
        let fixture = basic_workspace().config("[bootstrap]\nconcurrency = 2\n");
        let ws = fixture.load();

        let plan = plan_bootstrap(&ws, &BootstrapOptions::default(), &DiskInstallState).unwrap();
        assert_eq!(plan.concurrency, 2);

        let options = BootstrapOptions {
            concurrency: Some(7),
            ..BootstrapOptions::default()
        };
        let plan = plan_bootstrap(&ws, &options, &DiskInstallState).unwrap();
        assert_eq!(plan.concurrency, 7);
    }
}
