//! Tests for Preferences
//!
//! These tests verify:
//! - Typed reads with defaults
//! - Editor commit/apply semantics (clear, remove, reuse)
//! - Persistence across reopen
//! - The initial load gate in both load modes
//! - Listener registration

use std::collections::BTreeSet;
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use prefstore::worker::{Executor, Job};
use prefstore::{Config, InlineExecutor, LoadMode, Preferences, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn config_in(temp_dir: &TempDir, mode: LoadMode) -> Config {
    Config::builder()
        .path(temp_dir.path().join("settings.prefs"))
        .load_mode(mode)
        .worker_threads(2)
        .build()
}

fn setup_temp_prefs() -> (TempDir, Preferences) {
    let temp_dir = TempDir::new().unwrap();
    let prefs = Preferences::open(config_in(&temp_dir, LoadMode::Inline)).unwrap();
    (temp_dir, prefs)
}

fn reopen(temp_dir: &TempDir) -> Preferences {
    Preferences::open(config_in(temp_dir, LoadMode::Inline)).unwrap()
}

fn set_of(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Holds jobs until the test runs them
#[derive(Default)]
struct ManualExecutor {
    queue: Mutex<Vec<Job>>,
}

impl ManualExecutor {
    fn run_all(&self) {
        let jobs: Vec<Job> = self.queue.lock().drain(..).collect();
        for job in jobs {
            job();
        }
    }
}

impl Executor for ManualExecutor {
    fn execute(&self, job: Job) -> Result<(), Job> {
        self.queue.lock().push(job);
        Ok(())
    }
}

// =============================================================================
// Read Tests
// =============================================================================

#[test]
fn test_missing_keys_return_defaults() {
    let (_temp, prefs) = setup_temp_prefs();

    assert_eq!(prefs.get_int("missing", 7), 7);
    assert_eq!(prefs.get_long("missing", 8), 8);
    assert_eq!(prefs.get_float("missing", 1.5), 1.5);
    assert!(prefs.get_boolean("missing", true));
    assert_eq!(prefs.get_string("missing", "dflt"), "dflt");
    assert_eq!(prefs.get_string_set("missing", set_of(&["x"])), set_of(&["x"]));
    assert!(!prefs.contains("missing"));
    assert!(prefs.get("missing").is_none());
}

#[test]
fn test_typed_round_trip_in_memory() {
    let (_temp, prefs) = setup_temp_prefs();

    let mut editor = prefs.edit();
    editor
        .put_string("name", "Ada")
        .put_string_set("tags", ["b", "a"])
        .put_int("count", 42)
        .put_long("big", 1 << 40)
        .put_float("ratio", 0.5)
        .put_boolean("enabled", true);
    assert!(editor.commit());

    assert_eq!(prefs.get_string("name", ""), "Ada");
    assert_eq!(prefs.get_string_set("tags", BTreeSet::new()), set_of(&["a", "b"]));
    assert_eq!(prefs.get_int("count", 0), 42);
    assert_eq!(prefs.get_long("big", 0), 1 << 40);
    assert_eq!(prefs.get_float("ratio", 0.0), 0.5);
    assert!(prefs.get_boolean("enabled", false));
    assert_eq!(prefs.len(), 6);
}

#[test]
fn test_wrong_kind_returns_default() {
    let (_temp, prefs) = setup_temp_prefs();
    prefs.edit().put_string("count", "not a number").commit();

    assert_eq!(prefs.get_int("count", -1), -1);
    assert!(prefs.contains("count"));
}

#[test]
fn test_get_all_copies_entries() {
    let (_temp, prefs) = setup_temp_prefs();
    prefs.edit().put_int("a", 1).put_int("b", 2).commit();

    let all = prefs.get_all();
    prefs.edit().put_int("c", 3).commit();

    assert_eq!(all.len(), 2);
    assert_eq!(all.get("a"), Some(&Value::Int(1)));
    assert_eq!(prefs.get_all().len(), 3);
}

// =============================================================================
// Editor Tests
// =============================================================================

#[test]
fn test_changes_invisible_until_commit() {
    let (_temp, prefs) = setup_temp_prefs();

    let mut editor = prefs.edit();
    editor.put_int("a", 1);
    assert!(!prefs.contains("a"));
    assert_eq!(editor.pending_len(), 1);

    assert!(editor.commit());
    assert!(prefs.contains("a"));
}

#[test]
fn test_clear_then_put_leaves_only_new_key() {
    let (_temp, prefs) = setup_temp_prefs();
    prefs.edit().put_int("x", 1).put_string("y", "z").commit();

    assert!(prefs.edit().clear().put_int("a", 1).commit());

    let all = prefs.get_all();
    assert_eq!(all.len(), 1);
    assert_eq!(all.get("a"), Some(&Value::Int(1)));
}

#[test]
fn test_remove_deletes_existing_key() {
    let (_temp, prefs) = setup_temp_prefs();
    prefs.edit().put_int("a", 1).commit();

    assert!(prefs.edit().remove("a").commit());

    assert!(!prefs.contains("a"));
}

#[test]
fn test_put_after_remove_in_same_batch_wins() {
    let (_temp, prefs) = setup_temp_prefs();

    prefs.edit().remove("a").put_int("a", 5).commit();

    assert_eq!(prefs.get_int("a", 0), 5);
}

#[test]
fn test_editor_is_reusable_after_commit() {
    let (_temp, prefs) = setup_temp_prefs();
    let mut editor = prefs.edit();

    editor.clear().put_int("a", 1);
    assert!(editor.commit());
    assert_eq!(editor.pending_len(), 0);

    // The clear flag must not carry over into the next batch
    editor.put_int("b", 2);
    assert!(editor.commit());

    assert_eq!(prefs.get_int("a", 0), 1);
    assert_eq!(prefs.get_int("b", 0), 2);
}

#[test]
fn test_empty_commit_still_writes() {
    let (temp, prefs) = setup_temp_prefs();

    assert!(prefs.edit().commit());

    assert!(temp.path().join("settings.prefs").exists());
    assert_eq!(prefs.writes_performed(), 1);
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_commit_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let prefs = reopen(&temp_dir);
        prefs
            .edit()
            .put_string("s", "v")
            .put_string_set("set", ["one", "two"])
            .put_long("l", -3)
            .commit();
    }

    let prefs = reopen(&temp_dir);
    assert_eq!(prefs.get_string("s", ""), "v");
    assert_eq!(prefs.get_string_set("set", BTreeSet::new()), set_of(&["one", "two"]));
    assert_eq!(prefs.get_long("l", 0), -3);
}

#[test]
fn test_apply_survives_reopen_after_flush() {
    let temp_dir = TempDir::new().unwrap();
    {
        let prefs = reopen(&temp_dir);
        prefs.edit().put_int("a", 1).apply();
        assert!(prefs.flush());
    }

    assert_eq!(reopen(&temp_dir).get_int("a", 0), 1);
}

#[test]
fn test_remove_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let prefs = reopen(&temp_dir);
        prefs.edit().put_int("a", 1).put_int("b", 2).commit();
        prefs.edit().remove("a").commit();
    }

    let prefs = reopen(&temp_dir);
    assert!(!prefs.contains("a"));
    assert!(prefs.contains("b"));
}

#[test]
fn test_corrupt_file_loads_empty() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("settings.prefs"), [0, 0, 0, 1, 0, 1, b'k', 0x2a]).unwrap();

    let prefs = reopen(&temp_dir);

    assert!(prefs.is_loaded());
    assert!(prefs.is_empty());
    assert_eq!(prefs.get_int("missing", 7), 7);

    // The store stays usable and overwrites the corrupt file
    assert!(prefs.edit().put_int("k", 1).commit());
    assert_eq!(reopen(&temp_dir).get_int("k", 0), 1);
}

#[test]
fn test_commit_to_unwritable_location_returns_false() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .path(temp_dir.path().join("absent-dir").join("settings.prefs"))
        .load_mode(LoadMode::Inline)
        .build();
    let prefs = Preferences::open(config).unwrap();

    assert!(!prefs.edit().put_int("a", 1).commit());

    // Memory still reflects the merge
    assert_eq!(prefs.get_int("a", 0), 1);
    assert!(prefs.flush_idle());
}

#[test]
fn test_oversized_string_blocks_writes_until_removed() {
    let (temp, prefs) = setup_temp_prefs();
    prefs.edit().put_int("a", 1).commit();

    assert!(!prefs.edit().put_string("huge", "x".repeat(70_000)).commit());
    assert_eq!(prefs.get_string("huge", "").len(), 70_000);
    assert!(!prefs.edit().put_int("b", 2).commit());

    assert!(prefs.edit().remove("huge").commit());

    let reloaded = reopen(&temp);
    assert_eq!(reloaded.get_int("a", 0), 1);
    assert_eq!(reloaded.get_int("b", 0), 2);
    assert!(!reloaded.contains("huge"));
}

// =============================================================================
// Loader Tests
// =============================================================================

#[test]
fn test_background_load_gates_first_read() {
    let temp_dir = TempDir::new().unwrap();
    reopen(&temp_dir).edit().put_int("a", 1).commit();

    let executor = Arc::new(ManualExecutor::default());
    let prefs =
        Preferences::with_executor(config_in(&temp_dir, LoadMode::Background), executor.clone())
            .unwrap();
    assert!(!prefs.is_loaded());

    let reader = {
        let prefs = prefs.clone();
        thread::spawn(move || prefs.get_int("a", 0))
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!reader.is_finished());

    executor.run_all();

    assert_eq!(reader.join().unwrap(), 1);
    assert!(prefs.is_loaded());
}

#[test]
fn test_background_load_with_pool() {
    let temp_dir = TempDir::new().unwrap();
    reopen(&temp_dir).edit().put_string("who", "me").commit();

    let prefs = Preferences::open(config_in(&temp_dir, LoadMode::Background)).unwrap();

    assert_eq!(prefs.get_string("who", ""), "me");
}

#[test]
fn test_write_waits_for_initial_load() {
    let temp_dir = TempDir::new().unwrap();
    reopen(&temp_dir).edit().put_int("old", 1).commit();

    let executor = Arc::new(ManualExecutor::default());
    let prefs =
        Preferences::with_executor(config_in(&temp_dir, LoadMode::Background), executor.clone())
            .unwrap();

    let writer = {
        let prefs = prefs.clone();
        thread::spawn(move || prefs.edit().put_int("new", 2).commit())
    };

    thread::sleep(Duration::from_millis(50));
    executor.run_all();
    assert!(writer.join().unwrap());

    // The loaded entry was not clobbered by the early write
    let reloaded = reopen(&temp_dir);
    assert_eq!(reloaded.get_int("old", 0), 1);
    assert_eq!(reloaded.get_int("new", 0), 2);
}

#[test]
fn test_inline_executor_makes_apply_synchronous() {
    let temp_dir = TempDir::new().unwrap();
    let prefs =
        Preferences::with_executor(config_in(&temp_dir, LoadMode::Background), Arc::new(InlineExecutor))
            .unwrap();
    assert!(prefs.is_loaded());

    prefs.edit().put_int("a", 1).apply();

    assert!(prefs.flush_idle());
    assert_eq!(reopen(&temp_dir).get_int("a", 0), 1);
}

#[test]
fn test_invalid_config_rejected() {
    let config = Config::builder().worker_threads(0).build();
    assert!(Preferences::open(config).is_err());
}

// =============================================================================
// Listener Tests
// =============================================================================

#[test]
fn test_listener_registration() {
    let (_temp, prefs) = setup_temp_prefs();

    let token = prefs.register_change_listener(Arc::new(|_: &str| {}));
    assert_eq!(prefs.listener_count(), 1);

    assert!(prefs.unregister_change_listener(token));
    assert!(!prefs.unregister_change_listener(token));
    assert_eq!(prefs.listener_count(), 0);
}
