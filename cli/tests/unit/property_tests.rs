//! Property-based tests for archive path containment and env-file rendering.

use std::path::{Component, Path};

use appd_buildpack::domain::EnvVarSet;
use appd_buildpack::domain::archive::resolve_entry_path;
use appd_buildpack::domain::envfile::render;
use proptest::prelude::*;

fn entry_name() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("..".to_string()),
            Just(".".to_string()),
            Just(String::new()),
            "[a-z]{1,6}",
            "[a-z]{1,3}\\.xml",
        ],
        1..6,
    )
    .prop_map(|segments| segments.join("/"))
}

proptest! {
    /// Whatever an entry is called, an accepted destination lies strictly
    /// below the root and never contains `..`.
    #[test]
    fn accepted_entries_stay_below_root(name in entry_name()) {
        let root = Path::new("/tmp/install");
        if let Ok(dest) = resolve_entry_path(root, &name) {
            prop_assert!(dest.starts_with(root), "{} escapes", dest.display());
            prop_assert_ne!(dest.as_path(), root);
            prop_assert!(!dest.components().any(|c| c == Component::ParentDir));
        }
    }

    /// Entries made only of plain names are always accepted, with `\`
    /// treated as a separator.
    #[test]
    fn plain_entries_are_accepted(segments in prop::collection::vec("[a-z]{1,6}", 1..5), backslash in any::<bool>()) {
        let sep = if backslash { "\\" } else { "/" };
        let name = segments.join(sep);
        let dest = resolve_entry_path(Path::new("/tmp/install"), &name);
        prop_assert_eq!(dest.ok(), Some(Path::new("/tmp/install").join(segments.join("/"))));
    }

    /// One agent line plus one line per variable, in name order.
    #[test]
    fn rendered_env_file_has_one_line_per_variable(
        vars in prop::collection::btree_map("[A-Z_][A-Z0-9_]{0,12}", "[ -~]{0,20}", 0..8),
    ) {
        let set: EnvVarSet = vars.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let text = render(&set, Path::new("/opt/agent"), "node").expect("printable values render");
        let lines: Vec<&str> = text.lines().collect();
        prop_assert_eq!(lines.len(), vars.len() + 1);
        prop_assert!(text.ends_with('\n'));
        for (line, name) in lines[1..].iter().zip(vars.keys()) {
            let prefix = format!("export {name}=\"");
            prop_assert!(line.starts_with(&prefix));
        }
    }
}
