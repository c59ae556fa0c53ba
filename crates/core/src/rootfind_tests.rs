// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn test_find_root_from_walks_upward() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join(ROOT_MARKER), "# root\n").unwrap();
    let nested = dir.path().join("a/b/c");
    std::fs::create_dir_all(&nested).unwrap();

    let found = find_root_from(&nested).unwrap();
    assert_eq!(found.canonicalize().unwrap(), dir.path().canonicalize().unwrap());
}

#[test]
fn test_find_root_from_none_without_marker() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("x/y");
    std::fs::create_dir_all(&nested).unwrap();
    // The walk may escape the tempdir; it must not find a marker inside it.
    if let Some(root) = find_root_from(&nested) {
        assert!(!root.starts_with(dir.path()) || root.join(ROOT_MARKER).exists());
    }
}

#[test]
fn test_paths_are_root_relative() {
    let paths = Paths::new("/srv/forge");
    assert_eq!(
        paths.spell_state(),
        PathBuf::from("/srv/forge/.spell_gate_state.json")
    );
    assert_eq!(
        paths.daemon_log("singer"),
        PathBuf::from("/srv/forge/.daemon_logs/singer.log")
    );
    assert_eq!(
        paths.governance_files(),
        vec![PathBuf::from("/srv/forge/AGENTS.md")]
    );
}
