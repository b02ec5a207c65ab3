//! Servicing Operation Router
//!
//! Mutations (enable/disable feature, add/remove package):
//! - native success: report it, leave the simulated store alone
//! - native failure: report the tool's diagnostic as an error, no fallback
//! - tool missing, or host without the tool: apply to the simulated store
//!
//! Queries follow the same delegate-first order, but every failure path ends
//! in the reference catalog overlaid with simulated records for the target.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::cli::{Invocation, ServicingCommand};
use crate::core::{image_probe, package_name, OperationClass, PackageRef, StateKey, Target};
use crate::engine::command::NativeCommand;
use crate::engine::delegate::{NativeTool, ToolRunner};
use crate::engine::report::Report;
use crate::engine::strategy::{Execution, Strategy};
use crate::error::{Result, ServicingError};
use crate::state::ServicingContext;
use crate::storage::reference::{self, ReferenceEntry};
use crate::storage::{ItemMap, ItemRecord, ItemState, Removal, SAMPLE_DRIVERS, SAMPLE_FEATURES, SAMPLE_PACKAGES};

const SIM_MARKER: &str = " [SIM]";

/// One row of a features/packages listing after overlaying simulated state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedItem {
    pub name: String,
    pub state: ItemState,
    pub simulated: bool,
}

/// Overlay simulated records on a reference catalog.
///
/// Reference rows keep their order; a simulated record with the same name
/// (case-insensitive) replaces the state and sets the marker. Simulated
/// records with no reference counterpart follow, sorted by name.
pub fn merge_with_reference(catalog: &[ReferenceEntry], simulated: &ItemMap) -> Vec<ListedItem> {
    let mut listed: Vec<ListedItem> = catalog
        .iter()
        .map(|entry| {
            match simulated.iter().find(|(name, _)| name.eq_ignore_ascii_case(entry.name)) {
                Some((_, record)) => ListedItem {
                    name: entry.name.to_string(),
                    state: record.state,
                    simulated: true,
                },
                None => ListedItem {
                    name: entry.name.to_string(),
                    state: entry.state,
                    simulated: false,
                },
            }
        })
        .collect();

    for (name, record) in simulated {
        if !catalog.iter().any(|entry| entry.name.eq_ignore_ascii_case(name)) {
            listed.push(ListedItem {
                name: name.clone(),
                state: record.state,
                simulated: true,
            });
        }
    }

    listed
}

pub struct ServicingRouter<R: ToolRunner = NativeTool> {
    ctx: ServicingContext,
    runner: R,
}

impl ServicingRouter<NativeTool> {
    /// Router delegating to the tool named in the context's configuration.
    pub fn with_native_tool(ctx: ServicingContext) -> Self {
        let runner = NativeTool::new(ctx.config.tool.clone());
        Self::new(ctx, runner)
    }
}

impl<R: ToolRunner> ServicingRouter<R> {
    pub fn new(ctx: ServicingContext, runner: R) -> Self {
        Self { ctx, runner }
    }

    pub fn context(&self) -> &ServicingContext {
        &self.ctx
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn dispatch(&mut self, invocation: &Invocation) -> Result<Report> {
        let target = &invocation.target;
        match &invocation.command {
            ServicingCommand::MountImage { image_file, mount_dir, index, read_only } => {
                self.mount_image(image_file, mount_dir, *index, *read_only)
            }
            ServicingCommand::UnmountImage { mount_dir, commit, discard } => {
                self.unmount_image(mount_dir, *commit, *discard)
            }
            ServicingCommand::GetMountedImageInfo => Ok(self.mounted_image_info()),
            ServicingCommand::GetImageInfo { image_file, index } => self.image_info(image_file, *index),
            ServicingCommand::GetFeatures => Ok(self.get_features(target)),
            ServicingCommand::GetFeatureInfo { name } => Ok(self.feature_info(target, name)),
            ServicingCommand::EnableFeature { name, all } => self.enable_feature(target, name, *all),
            ServicingCommand::DisableFeature { name, remove } => self.disable_feature(target, name, *remove),
            ServicingCommand::GetPackages => Ok(self.get_packages(target)),
            ServicingCommand::GetPackageInfo { package } => Ok(self.package_info(target, package)),
            ServicingCommand::AddPackage { path, ignore_check, prevent_pending } => {
                self.add_package(target, path, *ignore_check, *prevent_pending)
            }
            ServicingCommand::RemovePackage { package } => self.remove_package(target, package),
            ServicingCommand::GetDrivers => Ok(self.get_drivers(target)),
        }
    }

    fn execute(&self, command: &NativeCommand<'_>) -> Execution {
        Strategy::probe(&self.ctx.config).execute(&self.runner, command)
    }

    // ========== IMAGES ==========

    pub fn mount_image(&mut self, image_file: &Path, mount_dir: &Path, index: u32, read_only: bool) -> Result<Report> {
        tracing::info!("Mounting image {} to {}", image_file.display(), mount_dir.display());

        if !image_file.exists() {
            return Err(ServicingError::ImageNotFound(image_file.to_path_buf()));
        }
        fs::create_dir_all(mount_dir)?;

        let record = self.ctx.mounts.mount(image_file, mount_dir, index, read_only);
        tracing::debug!("Mount registry now tracks {:?}", record);

        let mut report = Report::new();
        report.line(format!("Image mounted successfully at {}", mount_dir.display()));
        Ok(report)
    }

    pub fn unmount_image(&mut self, mount_dir: &Path, commit: bool, discard: bool) -> Result<Report> {
        let record = self
            .ctx
            .mounts
            .get(mount_dir)
            .cloned()
            .ok_or_else(|| ServicingError::NotMounted(mount_dir.to_path_buf()))?;

        let mut report = Report::new();

        if commit && !discard {
            tracing::info!("Committing changes to {}", record.source_image.display());
            match self.execute(&NativeCommand::CommitImage { mount_dir }) {
                Execution::Native(output) => {
                    tracing::info!("Native commit output: {}", output.stdout.trim());
                    report.line("Changes committed successfully to image.");
                }
                Execution::Rejected { stderr, .. } => {
                    tracing::error!("Failed to commit image changes: {}", stderr.trim());
                    report.line(format!("Warning: Failed to commit changes: {}", stderr.trim()));
                }
                Execution::Simulated => {
                    report.line("[SIMULATION] Changes would be committed to image file");
                }
            }
        } else if discard {
            tracing::info!("Discarding changes to {}", record.source_image.display());
        }

        tracing::info!("Unmounting image from {}", mount_dir.display());
        self.ctx.mounts.unmount(mount_dir)?;

        report.line(format!("Image unmounted successfully from {}", mount_dir.display()));
        Ok(report)
    }

    pub fn mounted_image_info(&self) -> Report {
        let mut report = Report::new();
        if self.ctx.mounts.is_empty() {
            report.line("No images are currently mounted.");
            return report;
        }

        report.blank().line("Mounted Images:").rule(80);
        for record in self.ctx.mounts.list() {
            report
                .line(format!("Mount Path: {}", record.mount_path.display()))
                .line(format!("Image File: {}", record.source_image.display()))
                .line(format!("Index: {}", record.index))
                .line(format!("Read Only: {}", record.read_only))
                .line(format!("Status: {}", record.status))
                .rule(80);
        }
        report
    }

    pub fn image_info(&self, image_file: &Path, index: Option<u32>) -> Result<Report> {
        if !image_file.exists() {
            return Err(ServicingError::ImageNotFound(image_file.to_path_buf()));
        }
        let metadata = fs::metadata(image_file)?;

        let mut report = Report::new();
        report
            .blank()
            .line(format!("Image Information for: {}", image_file.display()))
            .rule(50)
            .line(format!("File Size: {} bytes", metadata.len()))
            .line(format!("File Type: {}", image_probe::extension_label(image_file)));
        match index {
            Some(index) => report.line(format!("Index: {}", index)),
            None => report.line("Index: All available indexes"),
        };

        if let Some(stdout) = self.native_answer(&NativeCommand::GetImageInfo { image_file, index }) {
            report.blank().line("Detailed Image Information:").verbatim(&stdout);
            return Ok(report);
        }

        report
            .blank()
            .line("[BASIC ANALYSIS] Limited information available without Windows DISM:")
            .line(format!("Creation Time: {}", epoch_label(metadata.created())))
            .line(format!("Modification Time: {}", epoch_label(metadata.modified())));

        match image_probe::probe(image_file) {
            Ok(kind) => report.line(format!("Image Type: {}", kind.description())),
            Err(e) => {
                tracing::warn!("Could not read image header: {}", e);
                report.line("Image Type: Could not determine")
            }
        };

        Ok(report)
    }

    // ========== FEATURES ==========

    pub fn get_features(&self, target: &Target) -> Report {
        let mut report = Report::new();
        report.blank().line(format!("Windows Features in {}:", target)).rule(50);

        if self.query(&mut report, &NativeCommand::GetFeatures { target }) {
            return report;
        }

        report.line("[SIMULATION] Sample Windows features (actual query requires Windows DISM):");
        let simulated = self.ctx.store.load(&StateKey::derive(OperationClass::Features, target));
        for item in merge_with_reference(SAMPLE_FEATURES, &simulated) {
            report.line(format!("{:<40} | {}{}", item.name, item.state, marker(item.simulated)));
        }
        report
    }

    pub fn feature_info(&self, target: &Target, name: &str) -> Report {
        let mut report = Report::new();
        report.blank().line(format!("Feature Information in {}:", target)).rule(50);

        if self.query(&mut report, &NativeCommand::GetFeatureInfo { target, name }) {
            return report;
        }

        report.line("[SIMULATION] Feature details (actual query requires Windows DISM):");
        let key = StateKey::derive(OperationClass::Features, target);
        self.describe_item(&mut report, "Feature Name", &key, SAMPLE_FEATURES, name);
        report
    }

    pub fn enable_feature(&self, target: &Target, name: &str, all: bool) -> Result<Report> {
        tracing::info!("Enabling feature {} in {}", name, target);
        let mut report = Report::new();
        report.line(format!("Enabling feature: {}", name));
        if target.is_online() {
            report.line("Note: Online feature changes require administrator privileges");
        }
        if all {
            tracing::debug!("/All requested for {}; parent features are not modelled in simulation", name);
        }

        let command = NativeCommand::EnableFeature { target, name, all };
        self.mutate(&mut report, &command, |router, report| {
            router.simulate_feature(report, target, name, ItemState::Enabled)
        })?;
        Ok(report)
    }

    pub fn disable_feature(&self, target: &Target, name: &str, remove: bool) -> Result<Report> {
        tracing::info!("Disabling feature {} in {}", name, target);
        let mut report = Report::new();
        report.line(format!("Disabling feature: {}", name));
        if target.is_online() {
            report.line("Note: Online feature changes require administrator privileges");
        }

        let command = NativeCommand::DisableFeature { target, name, remove };
        self.mutate(&mut report, &command, |router, report| {
            router.simulate_feature(report, target, name, ItemState::Disabled)
        })?;
        Ok(report)
    }

    fn simulate_feature(&self, report: &mut Report, target: &Target, name: &str, state: ItemState) {
        let verb = if state == ItemState::Enabled { "Enabled" } else { "Disabled" };
        match target {
            Target::Online => {
                report
                    .line(format!("[SIMULATION] {} feature {} on {}", verb, name, std::env::consts::OS))
                    .line("Note: Actual Windows feature management requires a Windows environment");
            }
            Target::Image(path) => {
                report
                    .line(format!("[SIMULATION] {} feature {} in offline image {}", verb, name, path))
                    .line("Note: Actual offline Windows image modification requires Windows DISM tools");
            }
        }

        let key = StateKey::derive(OperationClass::Features, target);
        let record = ItemRecord::simulated(state, target.image_path().map(String::from));
        if !self.ctx.store.upsert(&key, name, record) {
            report.line("Warning: Could not save simulated feature state");
        }
    }

    // ========== PACKAGES ==========

    pub fn get_packages(&self, target: &Target) -> Report {
        let mut report = Report::new();
        report.blank().line(format!("Packages in {}:", target)).rule(80);

        if self.query(&mut report, &NativeCommand::GetPackages { target }) {
            return report;
        }

        report.line("[SIMULATION] Sample Windows packages (actual query requires Windows DISM):");
        let simulated = self.ctx.store.load(&StateKey::derive(OperationClass::Packages, target));
        for item in merge_with_reference(SAMPLE_PACKAGES, &simulated) {
            report.line(format!("{:<50} | {}{}", item.name, item.state, marker(item.simulated)));
        }
        report
    }

    pub fn package_info(&self, target: &Target, package: &PackageRef) -> Report {
        let mut report = Report::new();
        report.blank().line(format!("Package Information in {}:", target)).rule(80);

        if self.query(&mut report, &NativeCommand::GetPackageInfo { target, package }) {
            return report;
        }

        report.line("[SIMULATION] Package details (actual query requires Windows DISM):");
        let key = StateKey::derive(OperationClass::Packages, target);
        self.describe_item(&mut report, "Package Identity", &key, SAMPLE_PACKAGES, &package.identity());
        report
    }

    pub fn add_package(&self, target: &Target, path: &str, ignore_check: bool, prevent_pending: bool) -> Result<Report> {
        let name = package_name(path);
        tracing::info!("Adding package {} ({}) to {}", name, path, target);

        let mut report = Report::new();
        report.line(format!("Adding package: {}", path));

        let command = NativeCommand::AddPackage { target, path, ignore_check, prevent_pending };
        self.mutate(&mut report, &command, |router, report| {
            report.line(format!("[SIMULATION] Installed package {} in {}", name, target));
            let key = StateKey::derive(OperationClass::Packages, target);
            let record = ItemRecord::simulated(ItemState::Installed, target.image_path().map(String::from));
            if !router.ctx.store.upsert(&key, &name, record) {
                report.line("Warning: Could not save simulated package state");
            }
        })?;
        Ok(report)
    }

    pub fn remove_package(&self, target: &Target, package: &PackageRef) -> Result<Report> {
        let name = package.identity();
        tracing::info!("Removing package {} ({}) from {}", name, package, target);

        let mut report = Report::new();
        report.line(format!("Removing package: {}", package));

        let command = NativeCommand::RemovePackage { target, package };
        self.mutate(&mut report, &command, |router, report| {
            let key = StateKey::derive(OperationClass::Packages, target);
            match router.ctx.store.remove(&key, &name) {
                Removal::Removed => {
                    report.line(format!("[SIMULATION] Removed package {} from {}", name, target));
                }
                Removal::Unsaved => {
                    report
                        .line(format!("[SIMULATION] Removed package {} from {}", name, target))
                        .line("Warning: Could not save simulated package state");
                }
                Removal::Absent => {
                    report.line(format!("[SIMULATION] Package {} has no simulated installation in {}", name, target));
                }
            }
        })?;
        Ok(report)
    }

    // ========== DRIVERS ==========

    pub fn get_drivers(&self, target: &Target) -> Report {
        let mut report = Report::new();
        report.blank().line(format!("Drivers in {}:", target)).rule(80);

        if self.query(&mut report, &NativeCommand::GetDrivers { target }) {
            return report;
        }

        report.line("[SIMULATION] Sample drivers (actual query requires Windows DISM):");
        for driver in SAMPLE_DRIVERS {
            report.line(format!("{:<30} | {:<15} | {}", driver.name, driver.version, driver.provider));
        }
        report
    }

    // ========== SHARED PATHS ==========

    /// Run a mutation under the selected strategy. `simulate` runs only when
    /// the native tool is absent.
    fn mutate<F>(&self, report: &mut Report, command: &NativeCommand<'_>, simulate: F) -> Result<()>
    where
        F: FnOnce(&Self, &mut Report),
    {
        match self.execute(command) {
            Execution::Native(output) => {
                tracing::info!("Native tool output: {}", output.stdout.trim());
                let mut done = command.describe();
                if let Some(first) = done.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                report.line(format!("{}: completed successfully.", done));
                Ok(())
            }
            Execution::Rejected { stderr, exit_code } => Err(ServicingError::ToolInvocation {
                operation: command.describe(),
                exit_code,
                stderr: stderr.trim().to_string(),
            }),
            Execution::Simulated => {
                simulate(self, report);
                Ok(())
            }
        }
    }

    /// Print native output if the tool answered. False means fall back.
    fn query(&self, report: &mut Report, command: &NativeCommand<'_>) -> bool {
        match self.native_answer(command) {
            Some(stdout) => {
                report.verbatim(&stdout);
                true
            }
            None => false,
        }
    }

    /// Native stdout for a query. Rejection and absence both mean fall back.
    fn native_answer(&self, command: &NativeCommand<'_>) -> Option<String> {
        match self.execute(command) {
            Execution::Native(output) => Some(output.stdout),
            Execution::Rejected { stderr, .. } => {
                tracing::warn!("Native {} failed, using sample data: {}", command.describe(), stderr.trim());
                None
            }
            Execution::Simulated => None,
        }
    }

    fn describe_item(
        &self,
        report: &mut Report,
        label: &str,
        key: &StateKey,
        catalog: &'static [ReferenceEntry],
        name: &str,
    ) {
        if let Some((stored, record)) = self.ctx.store.get(key, name) {
            report
                .line(format!("{} : {}", label, stored))
                .line(format!("State : {}{}", record.state, SIM_MARKER));
            if let Some(image) = record.target {
                report.line(format!("Target : {}", image));
            }
        } else if let Some(entry) = reference::find(catalog, name) {
            report
                .line(format!("{} : {}", label, entry.name))
                .line(format!("State : {}", entry.state));
        } else {
            report
                .line(format!("{} : {}", label, name))
                .line("State : Unknown (not present in the sample catalog)");
        }
    }
}

fn marker(simulated: bool) -> &'static str {
    if simulated { SIM_MARKER } else { "" }
}

fn epoch_label(time: std::io::Result<SystemTime>) -> String {
    match time.map(|t| t.duration_since(UNIX_EPOCH)) {
        Ok(Ok(elapsed)) => elapsed.as_secs().to_string(),
        _ => "unavailable".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::engine::delegate::testing::ScriptedRunner;

    fn simulated_router(dir: &Path) -> ServicingRouter<ScriptedRunner> {
        let ctx = ServicingContext::new(Config::simulated(dir.join("scratch")));
        ServicingRouter::new(ctx, ScriptedRunner::succeeding("should never run"))
    }

    fn native_router(dir: &Path, runner: ScriptedRunner) -> ServicingRouter<ScriptedRunner> {
        let ctx = ServicingContext::new(Config::native(dir.join("scratch"), "dism"));
        ServicingRouter::new(ctx, runner)
    }

    fn line_for<'a>(report: &'a Report, name: &str) -> Option<&'a String> {
        report.lines().iter().find(|l| l.starts_with(&format!("{} ", name)))
    }

    #[test]
    fn test_merge_overlays_and_appends() {
        let mut simulated = ItemMap::new();
        simulated.insert("iis-webserver".into(), ItemRecord::simulated(ItemState::Enabled, None));
        simulated.insert("Zeta".into(), ItemRecord::simulated(ItemState::Disabled, None));

        let listed = merge_with_reference(SAMPLE_FEATURES, &simulated);
        assert_eq!(listed.len(), SAMPLE_FEATURES.len() + 1);

        let iis = listed.iter().find(|i| i.name == "IIS-WebServer").unwrap();
        assert_eq!(iis.state, ItemState::Enabled);
        assert!(iis.simulated);

        let last = listed.last().unwrap();
        assert_eq!(last.name, "Zeta");
        assert!(last.simulated);

        let untouched = listed.iter().find(|i| i.name == "VirtualMachinePlatform").unwrap();
        assert!(!untouched.simulated);
    }

    #[test]
    fn test_offline_enable_then_query_shows_simulated_feature() {
        let dir = tempfile::tempdir().unwrap();
        let router = simulated_router(dir.path());
        let offline = Target::Image("/images/offline".into());

        let report = router.enable_feature(&offline, "TestFeature", false).unwrap();
        assert!(report.contains("[SIMULATION] Enabled feature TestFeature in offline image /images/offline"));

        let key = StateKey::derive(OperationClass::Features, &offline);
        let stored = router.context().store.load(&key);
        assert_eq!(
            stored.get("TestFeature"),
            Some(&ItemRecord::simulated(ItemState::Enabled, Some("/images/offline".into())))
        );

        let listing = router.get_features(&offline);
        let line = line_for(&listing, "TestFeature").unwrap();
        assert!(line.ends_with("| Enabled [SIM]"), "got {:?}", line);
        for entry in SAMPLE_FEATURES {
            let line = line_for(&listing, entry.name).unwrap();
            assert!(line.ends_with(&format!("| {}", entry.state)), "got {:?}", line);
        }
    }

    #[test]
    fn test_online_enable_not_visible_offline() {
        let dir = tempfile::tempdir().unwrap();
        let router = simulated_router(dir.path());

        router.enable_feature(&Target::Online, "F", false).unwrap();
        let online = router.get_features(&Target::Online);
        assert!(line_for(&online, "F").unwrap().ends_with("| Enabled [SIM]"));

        let other = router.get_features(&Target::Image("/images/unrelated".into()));
        assert!(line_for(&other, "F").is_none());
        assert!(!other.contains(SIM_MARKER));
    }

    #[test]
    fn test_disable_reference_feature_overrides_state() {
        let dir = tempfile::tempdir().unwrap();
        let router = simulated_router(dir.path());

        router.disable_feature(&Target::Online, "VirtualMachinePlatform", true).unwrap();
        let listing = router.get_features(&Target::Online);
        assert!(line_for(&listing, "VirtualMachinePlatform").unwrap().ends_with("| Disabled [SIM]"));
    }

    #[test]
    fn test_package_install_then_remove_is_invisible() {
        let dir = tempfile::tempdir().unwrap();
        let router = simulated_router(dir.path());
        let offline = Target::Image("/images/offline".into());

        let before = router.get_packages(&offline);
        router.add_package(&offline, "/pkgs/Contoso-Tools.cab", false, false).unwrap();

        let during = router.get_packages(&offline);
        assert!(line_for(&during, "Contoso-Tools").unwrap().ends_with("| Installed [SIM]"));

        let removed = router.remove_package(&offline, &PackageRef::Name("Contoso-Tools".into())).unwrap();
        assert!(removed.contains("[SIMULATION] Removed package Contoso-Tools"));
        assert_eq!(router.get_packages(&offline), before);
    }

    #[test]
    fn test_remove_by_path_simulates_under_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let router = simulated_router(dir.path());
        let offline = Target::Image("/images/offline".into());

        router.add_package(&offline, "/pkgs/Contoso-Tools.cab", false, false).unwrap();
        let removed = router
            .remove_package(&offline, &PackageRef::Path("/other/place/Contoso-Tools.cab".into()))
            .unwrap();
        assert!(removed.contains("Removing package: /other/place/Contoso-Tools.cab"));
        assert!(removed.contains("[SIMULATION] Removed package Contoso-Tools"));

        let key = StateKey::derive(OperationClass::Packages, &offline);
        assert!(router.context().store.load(&key).is_empty());
    }

    #[test]
    fn test_remove_warns_when_state_cannot_be_saved() {
        let dir = tempfile::tempdir().unwrap();
        let router = simulated_router(dir.path());
        router.add_package(&Target::Online, "/pkgs/Contoso-Tools.cab", false, false).unwrap();

        let key = StateKey::derive(OperationClass::Packages, &Target::Online);
        fs::create_dir(router.context().store.path_for(&key).with_extension("json.tmp")).unwrap();

        let report = router.remove_package(&Target::Online, &PackageRef::Name("Contoso-Tools".into())).unwrap();
        assert!(report.contains("Warning: Could not save simulated package state"));
    }

    #[test]
    fn test_remove_absent_package_still_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let router = simulated_router(dir.path());
        let report = router.remove_package(&Target::Online, &PackageRef::Name("Ghost-Package".into())).unwrap();
        assert!(report.contains("has no simulated installation"));
    }

    #[test]
    fn test_native_success_does_not_touch_store() {
        let dir = tempfile::tempdir().unwrap();
        let router = native_router(dir.path(), ScriptedRunner::succeeding("The operation completed successfully."));

        let report = router.enable_feature(&Target::Online, "NetFx3", true).unwrap();
        assert!(report.contains("Enable feature NetFx3: completed successfully."));
        assert_eq!(
            router.runner().last_call().unwrap(),
            vec!["/Online", "/Enable-Feature", "/FeatureName:NetFx3", "/All"]
        );

        let key = StateKey::derive(OperationClass::Features, &Target::Online);
        assert!(router.context().store.load(&key).is_empty());
    }

    #[test]
    fn test_native_rejection_is_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let router = native_router(dir.path(), ScriptedRunner::failing("Error: 50 The request is not supported.", 50));
        let target = Target::Image("/images/offline".into());

        let err = router.add_package(&target, "/pkgs/kb.cab", false, false).unwrap_err();
        match &err {
            ServicingError::ToolInvocation { exit_code, stderr, operation } => {
                assert_eq!(*exit_code, Some(50));
                assert!(stderr.contains("not supported"));
                assert_eq!(operation, "add package /pkgs/kb.cab in offline image");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!err.is_input_validation());

        let key = StateKey::derive(OperationClass::Packages, &target);
        assert!(router.context().store.load(&key).is_empty());
    }

    #[test]
    fn test_missing_tool_falls_back_to_simulation() {
        let dir = tempfile::tempdir().unwrap();
        let router = native_router(dir.path(), ScriptedRunner::unavailable());

        let report = router.disable_feature(&Target::Online, "TestFeature", false).unwrap();
        assert!(report.contains("[SIMULATION] Disabled feature TestFeature"));
        assert_eq!(router.runner().call_count(), 1);

        let key = StateKey::derive(OperationClass::Features, &Target::Online);
        assert_eq!(router.context().store.load(&key)["TestFeature"].state, ItemState::Disabled);
    }

    #[test]
    fn test_query_prints_native_output_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let router = native_router(dir.path(), ScriptedRunner::succeeding("Feature Name : A\nState : Enabled\n"));

        let report = router.get_features(&Target::Image("/img".into()));
        assert!(report.contains("Feature Name : A"));
        assert!(!report.contains("[SIMULATION]"));
        assert_eq!(router.runner().last_call().unwrap(), vec!["/Image:/img", "/Get-Features"]);
    }

    #[test]
    fn test_native_remove_by_path_passes_path_to_tool() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = native_router(dir.path(), ScriptedRunner::succeeding("The operation completed successfully."));
        let parsed = crate::cli::parse_args([
            "/Online",
            "/Remove-Package",
            r"/PackagePath:C:\pkgs\Windows10.0-KB5001-x64.cab",
        ])
        .unwrap();
        let crate::cli::ParsedArgs::Run(invocation) = parsed else { panic!("expected a command") };

        router.dispatch(&invocation).unwrap();
        assert_eq!(
            router.runner().last_call().unwrap(),
            vec!["/Online", "/Remove-Package", r"/PackagePath:C:\pkgs\Windows10.0-KB5001-x64.cab"]
        );
    }

    #[test]
    fn test_query_rejection_falls_back_to_reference() {
        let dir = tempfile::tempdir().unwrap();
        let router = native_router(dir.path(), ScriptedRunner::failing("boom", 2));

        let drivers = router.get_drivers(&Target::Online);
        assert!(drivers.contains("[SIMULATION] Sample drivers"));
        assert!(drivers.contains("Network Adapter Driver"));

        let packages = router.get_packages(&Target::Online);
        assert!(packages.contains("Microsoft-Windows-NetFx3-OnDemand-Package"));
    }

    #[test]
    fn test_rejected_feature_query_keeps_simulated_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let router = native_router(dir.path(), ScriptedRunner::failing("Error: 87", 87));
        let offline = Target::Image("/images/offline".into());

        let key = StateKey::derive(OperationClass::Features, &offline);
        let record = ItemRecord::simulated(ItemState::Enabled, Some("/images/offline".into()));
        assert!(router.context().store.upsert(&key, "TestFeature", record));

        let listing = router.get_features(&offline);
        assert_eq!(router.runner().call_count(), 1);
        assert!(listing.contains("[SIMULATION] Sample Windows features"));
        assert!(line_for(&listing, "TestFeature").unwrap().ends_with("| Enabled [SIM]"));
    }

    #[test]
    fn test_feature_and_package_info_fallbacks() {
        let dir = tempfile::tempdir().unwrap();
        let router = simulated_router(dir.path());

        let reference = router.feature_info(&Target::Online, "microsoft-hyper-v-all");
        assert!(reference.contains("Feature Name : Microsoft-Hyper-V-All"));
        assert!(reference.contains("State : Disabled"));

        router.enable_feature(&Target::Online, "Microsoft-Hyper-V-All", false).unwrap();
        let simulated = router.feature_info(&Target::Online, "Microsoft-Hyper-V-All");
        assert!(simulated.contains("State : Enabled [SIM]"));

        let unknown = router.package_info(&Target::Online, &PackageRef::Name("Nope".into()));
        assert!(unknown.contains("State : Unknown"));
    }

    #[test]
    fn test_mount_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("test.wim");
        fs::write(&image, vec![b'0'; 1024]).unwrap();
        let mount = dir.path().join("mount");

        let mut router = simulated_router(dir.path());
        router.mount_image(&image, &mount, 1, false).unwrap();
        assert!(mount.is_dir());
        assert!(router.context().mounts.get(&mount).is_some());
        assert!(router.mounted_image_info().contains(&format!("Image File: {}", image.display())));

        let report = router.unmount_image(&mount, true, false).unwrap();
        assert!(report.contains("[SIMULATION] Changes would be committed to image file"));
        assert!(router.context().mounts.get(&mount).is_none());
        assert!(router.mounted_image_info().contains("No images are currently mounted."));
    }

    #[test]
    fn test_mount_missing_image_leaves_registry_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = simulated_router(dir.path());
        let mount = dir.path().join("mount");

        let err = router.mount_image(&dir.path().join("nonexistent.wim"), &mount, 1, false).unwrap_err();
        assert!(matches!(err, ServicingError::ImageNotFound(_)));
        assert!(err.is_input_validation());
        assert!(router.context().mounts.is_empty());
        assert!(!mount.exists());
    }

    #[test]
    fn test_unmount_without_mount_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = simulated_router(dir.path());
        let err = router.unmount_image(&dir.path().join("mount"), false, false).unwrap_err();
        assert!(matches!(err, ServicingError::NotMounted(_)));
    }

    #[test]
    fn test_rejected_commit_still_unmounts() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("test.wim");
        fs::write(&image, b"MSWIM\x00\x00\x00").unwrap();
        let mount = dir.path().join("mount");

        let mut router = native_router(dir.path(), ScriptedRunner::failing("locked", 1));
        router.mount_image(&image, &mount, 1, true).unwrap();
        assert_eq!(router.runner().call_count(), 0);

        let report = router.unmount_image(&mount, true, false).unwrap();
        assert!(report.contains("Warning: Failed to commit changes: locked"));
        assert!(report.contains("Image unmounted successfully"));
        assert!(router.context().mounts.is_empty());
    }

    #[test]
    fn test_discard_skips_commit() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("test.wim");
        fs::write(&image, b"x").unwrap();
        let mount = dir.path().join("mount");

        let mut router = native_router(dir.path(), ScriptedRunner::succeeding(""));
        router.mount_image(&image, &mount, 1, false).unwrap();
        router.unmount_image(&mount, true, true).unwrap();
        assert_eq!(router.runner().call_count(), 0);
    }

    #[test]
    fn test_image_info_basic_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("install.wim");
        fs::write(&image, b"MSWIM\x00\x00\x00 rest of header").unwrap();

        let router = simulated_router(dir.path());
        let report = router.image_info(&image, Some(2)).unwrap();
        assert!(report.contains("File Size: 23 bytes"));
        assert!(report.contains("File Type: .WIM"));
        assert!(report.contains("Index: 2"));
        assert!(report.contains("[BASIC ANALYSIS]"));
        assert!(report.contains("Image Type: Windows Imaging Format (WIM)"));
    }

    #[test]
    fn test_rejected_image_info_falls_back_to_basic_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("disk.vhdx");
        fs::write(&image, b"vhdxfile and more").unwrap();

        let router = native_router(dir.path(), ScriptedRunner::failing("Error: 11 bad format", 11));
        let report = router.image_info(&image, Some(1)).unwrap();
        assert_eq!(router.runner().last_call().unwrap()[0], "/Get-ImageInfo");
        assert!(!report.contains("Detailed Image Information:"));
        assert!(report.contains("[BASIC ANALYSIS]"));
        assert!(report.contains("Image Type: Virtual Hard Disk v2 (VHDX)"));
    }

    #[test]
    fn test_image_info_native_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("disk.vhd");
        fs::write(&image, b"conectix").unwrap();

        let router = native_router(dir.path(), ScriptedRunner::succeeding("Details : Index 1"));
        let report = router.image_info(&image, None).unwrap();
        assert!(report.contains("Index: All available indexes"));
        assert!(report.contains("Detailed Image Information:"));
        assert!(report.contains("Details : Index 1"));

        let err = router.image_info(&dir.path().join("nonexistent.wim"), None).unwrap_err();
        assert!(matches!(err, ServicingError::ImageNotFound(_)));
    }

    #[test]
    fn test_dispatch_routes_parsed_invocation() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = simulated_router(dir.path());
        let parsed = crate::cli::parse_args(["/Image:/images/offline", "/Enable-Feature", "/FeatureName:TestFeature"]).unwrap();
        let crate::cli::ParsedArgs::Run(invocation) = parsed else { panic!("expected a command") };

        router.dispatch(&invocation).unwrap();
        let listing = router.get_features(&Target::Image("/images/offline".into()));
        assert!(line_for(&listing, "TestFeature").unwrap().ends_with("| Enabled [SIM]"));
    }
}
