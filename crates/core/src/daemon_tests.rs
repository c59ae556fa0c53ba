// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn spec() -> DaemonSpec {
    DaemonSpec {
        key: "singer".into(),
        display_name: "Singer of Strife and Splendor".into(),
        port: Port::P4,
        commander: "Red Regnant".into(),
        program: PathBuf::from("/usr/local/bin/hfo"),
        default_args: vec!["singer".into(), "--interval".into(), "120".into()],
        model_need: ModelNeed::Expensive,
        required_model: Some("phi4:14b".into()),
        min_memory_gb: 8.0,
        cycle_interval_s: 120.0,
        priority: 2,
        spell_cast: "SONGS_OF_STRIFE_AND_SPLENDOR".into(),
        is_persistent: true,
    }
}

#[parameterized(
    none = { ModelNeed::None, false, false },
    cheap = { ModelNeed::Cheap, true, false },
    expensive = { ModelNeed::Expensive, false, true },
    both = { ModelNeed::Both, true, true },
)]
fn test_model_need(need: ModelNeed, cheap: bool, expensive: bool) {
    assert_eq!(need.needs_cheap(), cheap);
    assert_eq!(need.needs_expensive(), expensive);
    assert_eq!(need.needs_any(), cheap || expensive);
}

#[test]
fn test_command_line_appends_extra_args() {
    let line = spec().command_line(&["--dry-run".into()]);
    assert_eq!(line, "/usr/local/bin/hfo singer --interval 120 --dry-run");
}
