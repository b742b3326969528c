//! Integration tests for ConfigManager and configuration file handling
//!
//! These tests verify:
//! - Configuration loading and saving
//! - Default configuration generation
//! - Partial files fall back to per-field defaults
//! - Integration with StateManager and MergeEngine

use camino::Utf8PathBuf;
use file_factory::models::LineEnding;
use file_factory::services::RecordingReporter;
use file_factory::{ConfigManager, MergeEngine, StateManager, UserConfig};
use std::fs;
use tempfile::TempDir;

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, config_path)
}

#[test]
fn test_create_config_manager() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    assert_eq!(manager.config_dir(), config_path.as_path());
    assert_eq!(
        manager.user_config_path(),
        config_path.join("FileFactory Config.yaml").as_path()
    );
}

#[test]
fn test_load_default_user_config() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    // User config file doesn't exist, should return defaults
    let settings = manager.load_user_config().unwrap().merge_settings;

    assert!(!settings.append_mode);
    assert_eq!(settings.report_divisions, 6);
    assert_eq!(settings.header_line_ending, LineEnding::Lf);
    assert!(!settings.follow_symlinks);
    assert_eq!(settings.copy_buffer_size, 65536);
    assert!(!settings.debug_mode);
    assert_eq!(settings.log_directory, "logs");
}

#[test]
fn test_save_writes_expected_keys() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    manager.save_user_config(&UserConfig::default()).unwrap();
    let yaml = fs::read_to_string(manager.user_config_path()).unwrap();

    for key in [
        "FileFactory_Settings:",
        "Append Mode: false",
        "Report Divisions: 6",
        "Header Line Ending: lf",
        "Follow Symlinks: false",
        "Copy Buffer Size: 65536",
        "Debug Mode: false",
        "Log Directory: logs",
    ] {
        assert!(yaml.contains(key), "missing {:?} in:\n{}", key, yaml);
    }
}

#[test]
fn test_partial_config_uses_field_defaults() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(
        manager.user_config_path(),
        "FileFactory_Settings:\n  Append Mode: true\n  Header Line Ending: crlf\n",
    )
    .unwrap();

    let settings = manager.load_user_config().unwrap().merge_settings;
    assert!(settings.append_mode);
    assert_eq!(settings.header_line_ending, LineEnding::Crlf);
    assert_eq!(settings.report_divisions, 6);
    assert_eq!(settings.log_directory, "logs");
}

#[test]
fn test_empty_settings_section_uses_defaults() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();
    fs::write(manager.user_config_path(), "{}\n").unwrap();

    let settings = manager.load_user_config().unwrap().merge_settings;
    assert_eq!(settings.report_divisions, 6);
}

#[test]
fn test_invalid_line_ending_is_rejected() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();
    fs::write(
        manager.user_config_path(),
        "FileFactory_Settings:\n  Header Line Ending: cr\n",
    )
    .unwrap();

    assert!(manager.load_user_config().is_err());
}

#[test]
fn test_config_integration_with_state_manager() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let mut config = UserConfig::default();
    config.merge_settings.append_mode = true;
    config.merge_settings.report_divisions = 3;
    manager.save_user_config(&config).unwrap();

    let state = StateManager::new();
    state.load_from_user_config(&manager.load_user_config().unwrap());

    let snapshot = state.snapshot();
    assert!(snapshot.append_mode);
    assert_eq!(snapshot.report_divisions, 3);
}

#[test]
fn test_zero_divisions_behave_as_one() {
    let (_temp_dir, root) = create_test_config_dir();
    let manager = ConfigManager::new(root.join("config")).unwrap();
    fs::write(
        manager.user_config_path(),
        "FileFactory_Settings:\n  Report Divisions: 0\n  Copy Buffer Size: 0\n",
    )
    .unwrap();
    let settings = manager.load_user_config().unwrap().merge_settings;

    let source = root.join("a.txt");
    fs::write(&source, "1\n2\n3\n4\n").unwrap();

    let mut reporter = RecordingReporter::new();
    MergeEngine::from_settings(&settings)
        .run(&[source], &root.join("out.txt"), false, &mut reporter)
        .unwrap();

    // A single division means one threshold at the full total
    assert_eq!(reporter.file_processed_count(), 1);
}
