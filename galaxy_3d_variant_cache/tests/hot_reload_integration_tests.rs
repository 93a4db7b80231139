//! Integration tests for shader variants and hot reload
//!
//! These tests drive a ResourceManager over real files in a temporary
//! directory. No GPU required.
//!
//! Run with: cargo test --test hot_reload_integration_tests

mod test_utils;

use galaxy_3d_variant_cache::galaxy3d::{DiagnosticKind, Error, ResourceManager, ResourceManagerConfig};
use galaxy_3d_variant_cache::galaxy3d::fs::StdFileSystem;
use galaxy_3d_variant_cache::galaxy3d::shader::{DefineSet, ReloadState};
use std::sync::{Arc, Mutex};
use test_utils::{RecordingBackend, TestDir};

// ============================================================================
// HELPERS
// ============================================================================

const SOURCE: &str = "#version 1\nvoid main(){}";

fn create_manager() -> (ResourceManager, Arc<Mutex<RecordingBackend>>) {
    let backend = Arc::new(Mutex::new(RecordingBackend::new()));
    let manager = ResourceManager::new(backend.clone(), Arc::new(StdFileSystem));
    (manager, backend)
}

fn cycle_length(manager: &ResourceManager) -> usize {
    manager.source_store().stage_count() + manager.program_cache().variant_count()
}

// ============================================================================
// HOT RELOAD TESTS
// ============================================================================

#[test]
fn test_integration_touched_stage_relinks_after_full_cycle() {
    let mut dir = TestDir::new("touched_stage");
    let v = dir.write("v.src", SOURCE);
    let f = dir.write("f.src", SOURCE);
    let (mut manager, _backend) = create_manager();

    let h1 = manager.get_or_create_program(&v, &f, &DefineSet::new()).unwrap();

    dir.touch("f.src");
    let ticks = cycle_length(&manager);
    for _ in 0..ticks - 1 {
        manager.tick().unwrap();
        assert_eq!(manager.get_or_create_program(&v, &f, &DefineSet::new()).unwrap(), h1);
    }
    manager.tick().unwrap();

    let h2 = manager.get_or_create_program(&v, &f, &DefineSet::new()).unwrap();
    assert_ne!(h1, h2);
    assert!(manager.take_diagnostics().is_empty());
}

#[test]
fn test_integration_idle_ticks_are_idempotent() {
    let mut dir = TestDir::new("idle_ticks");
    let v = dir.write("v.src", SOURCE);
    let f = dir.write("f.src", SOURCE);
    let (mut manager, backend) = create_manager();

    let h1 = manager.get_or_create_program(&v, &f, &DefineSet::new()).unwrap();
    let h2 = manager.get_or_create_program(&v, &f, &DefineSet::new().with("SHADOWS", "")).unwrap();
    let compiled = backend.lock().unwrap().compiled.len();

    for _ in 0..cycle_length(&manager) * 5 {
        manager.tick().unwrap();
    }

    assert_eq!(manager.get_or_create_program(&v, &f, &DefineSet::new()).unwrap(), h1);
    assert_eq!(manager.get_or_create_program(&v, &f, &DefineSet::new().with("SHADOWS", "")).unwrap(), h2);
    assert_eq!(backend.lock().unwrap().compiled.len(), compiled);
}

#[test]
fn test_integration_broken_edit_then_fix() {
    let mut dir = TestDir::new("broken_edit");
    let v = dir.write("v.src", SOURCE);
    let f = dir.write("f.src", SOURCE);
    let (mut manager, backend) = create_manager();
    let h1 = manager.get_or_create_program(&v, &f, &DefineSet::new()).unwrap();
    let links = backend.lock().unwrap().links;

    // Broken edit: stage keeps its handle, nothing relinks
    dir.write("v.src", "#version 1\n#error unterminated comment");
    for _ in 0..cycle_length(&manager) {
        manager.tick().unwrap();
    }
    assert_eq!(manager.get_or_create_program(&v, &f, &DefineSet::new()).unwrap(), h1);
    assert_eq!(backend.lock().unwrap().links, links);
    let diagnostics = manager.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::CompileFailure);

    // Fix: picked up on the next cycle
    dir.write("v.src", "#version 1\nvoid main(){ }");
    for _ in 0..cycle_length(&manager) {
        manager.tick().unwrap();
    }
    let h2 = manager.get_or_create_program(&v, &f, &DefineSet::new()).unwrap();
    assert_ne!(h1, h2);
    assert!(backend.lock().unwrap().live_programs.contains(&h2));
    assert!(!backend.lock().unwrap().live_programs.contains(&h1));
}

#[test]
fn test_integration_deleted_source_keeps_last_good_program() {
    let mut dir = TestDir::new("deleted_source");
    let v = dir.write("v.src", SOURCE);
    let f = dir.write("f.src", SOURCE);
    let (mut manager, _backend) = create_manager();
    let h1 = manager.get_or_create_program(&v, &f, &DefineSet::new()).unwrap();

    dir.remove("f.src");
    for _ in 0..cycle_length(&manager) * 3 {
        manager.tick().unwrap();
    }

    assert_eq!(manager.get_or_create_program(&v, &f, &DefineSet::new()).unwrap(), h1);
    let diagnostics = manager.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::MissingFile);

    dir.write("f.src", SOURCE);
    for _ in 0..cycle_length(&manager) {
        manager.tick().unwrap();
    }
    assert_ne!(manager.get_or_create_program(&v, &f, &DefineSet::new()).unwrap(), h1);
}

#[test]
fn test_integration_defines_reach_the_backend() {
    let mut dir = TestDir::new("defines");
    let v = dir.write("v.src", SOURCE);
    let f = dir.write("f.src", SOURCE);
    let (mut manager, backend) = create_manager();

    let defines = DefineSet::new().with("MAX_LIGHTS", "4").with("USE_FOG", "");
    manager.get_or_create_program(&v, &f, &defines).unwrap();

    let backend = backend.lock().unwrap();
    let last = backend.compiled.last().unwrap();
    assert_eq!(last, "#version 1\n#define MAX_LIGHTS 4\n#define USE_FOG\nvoid main(){}");
}

#[test]
fn test_integration_malformed_source_uses_configured_version() {
    let mut dir = TestDir::new("malformed");
    let v = dir.write("v.src", "void main(){}");
    let f = dir.write("f.src", SOURCE);
    let backend = Arc::new(Mutex::new(RecordingBackend::new()));
    let config = ResourceManagerConfig {
        default_version_line: "#version 330 core".to_string(),
        ..Default::default()
    };
    let mut manager = ResourceManager::with_config(backend.clone(), Arc::new(StdFileSystem), config);

    manager.get_or_create_program(&v, &f, &DefineSet::new()).unwrap();

    let diagnostics = manager.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::MalformedSource);
    assert!(backend.lock().unwrap().compiled[0].starts_with("#version 330 core\nvoid main"));
}

#[test]
fn test_integration_missing_source_on_first_reference() {
    let mut dir = TestDir::new("missing_first");
    let v = dir.write("v.src", SOURCE);
    let (mut manager, _backend) = create_manager();

    let result = manager.get_or_create_program(&v, dir.path("f.src"), &DefineSet::new());

    assert!(matches!(result, Err(Error::MissingFile(_))));
    assert_eq!(manager.program_cache().variant_count(), 0);
}

#[test]
fn test_integration_force_full_recompile() {
    let mut dir = TestDir::new("force");
    let v = dir.write("v.src", SOURCE);
    let f = dir.write("f.src", SOURCE);
    let (mut manager, _backend) = create_manager();
    let h1 = manager.get_or_create_program(&v, &f, &DefineSet::new()).unwrap();

    assert_eq!(manager.force_full_recompile().unwrap(), 2);
    assert_eq!(manager.scheduler().state(), ReloadState::UpdateVariants);
    assert_eq!(manager.get_or_create_program(&v, &f, &DefineSet::new()).unwrap(), h1);

    manager.tick().unwrap();
    assert_ne!(manager.get_or_create_program(&v, &f, &DefineSet::new()).unwrap(), h1);
}

#[test]
fn test_integration_force_full_recompile_with_hot_reload_disabled() {
    let mut dir = TestDir::new("force_disabled");
    let v = dir.write("v.src", SOURCE);
    let f = dir.write("f.src", SOURCE);
    let config = ResourceManagerConfig {
        hot_reload_enabled: false,
        ..Default::default()
    };
    let backend = Arc::new(Mutex::new(RecordingBackend::new()));
    let mut manager = ResourceManager::with_config(backend.clone(), Arc::new(StdFileSystem), config);
    let h1 = manager.get_or_create_program(&v, &f, &DefineSet::new()).unwrap();

    dir.write("f.src", "#version 1\nvoid main(){ }");
    assert_eq!(manager.force_full_recompile().unwrap(), 2);
    for _ in 0..cycle_length(&manager) * 2 {
        manager.tick().unwrap();
    }

    let h2 = manager.get_or_create_program(&v, &f, &DefineSet::new()).unwrap();
    assert_ne!(h1, h2);
    assert_eq!(backend.lock().unwrap().links, 2);
    assert_eq!(manager.scheduler().state(), ReloadState::UnmarkStages);
}
