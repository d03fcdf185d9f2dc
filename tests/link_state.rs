//! Link-state scenarios: idempotence, collision handling, partial state,
//! and the relocate round trip, driven through the CLI context.

use std::fs;
use std::path::Path;

use linkset::error::LinksetError;
use linkset::tooling::cli::{CliContext, Commands, KindArg};
use tempfile::TempDir;

fn workspace() -> (TempDir, CliContext) {
    let temp = TempDir::new().unwrap();
    let ctx = CliContext::new(temp.path().to_path_buf(), None).unwrap();
    (temp, ctx)
}

fn seed_command(root: &Path, group: &str, name: &str) {
    let dir = root.join("library").join("commands").join(group);
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join(name),
        format!("---\ndescription: {}\n---\nbody\n", name),
    )
    .unwrap();
}

fn list_json(ctx: &mut CliContext) -> serde_json::Value {
    let output = ctx
        .execute(&Commands::List {
            kind: None,
            format: "json".to_string(),
        })
        .unwrap();
    serde_json::from_str(&output).unwrap()
}

fn group_entry(status: &serde_json::Value, kind: &str, name: &str) -> serde_json::Value {
    status
        .get(kind)
        .and_then(|v| v.as_array())
        .and_then(|groups| {
            groups
                .iter()
                .find(|g| g.get("name").and_then(|n| n.as_str()) == Some(name))
        })
        .cloned()
        .unwrap_or_else(|| panic!("group {} not in {} status", name, kind))
}

#[test]
fn enable_links_status_disable_round_trip() {
    let (temp, mut ctx) = workspace();
    seed_command(temp.path(), "demo", "a.md");
    seed_command(temp.path(), "demo", "b.md");

    let output = ctx
        .execute(&Commands::On {
            kind: KindArg::Command,
            group: "demo".to_string(),
        })
        .unwrap();
    assert!(output.contains("2 links created"), "{}", output);

    let entry = group_entry(&list_json(&mut ctx), "commands", "demo");
    assert_eq!(entry["active"], 2);
    assert_eq!(entry["total"], 2);
    assert_eq!(entry["enabled"], true);

    let output = ctx
        .execute(&Commands::Off {
            kind: KindArg::Command,
            group: "demo".to_string(),
        })
        .unwrap();
    assert!(output.contains("2 links removed"), "{}", output);

    let entry = group_entry(&list_json(&mut ctx), "commands", "demo");
    assert_eq!(entry["active"], 0);
    assert_eq!(entry["enabled"], false);
}

#[test]
fn enable_and_disable_are_idempotent() {
    let (temp, mut ctx) = workspace();
    seed_command(temp.path(), "demo", "a.md");

    let on = Commands::On {
        kind: KindArg::Command,
        group: "demo".to_string(),
    };
    assert!(ctx.execute(&on).unwrap().contains("1 links created"));

    let link = temp.path().join("commands").join("a.md");
    let target_before = fs::read_link(&link).unwrap();
    assert!(ctx.execute(&on).unwrap().contains("0 links created"));
    assert_eq!(fs::read_link(&link).unwrap(), target_before);

    let off = Commands::Off {
        kind: KindArg::Command,
        group: "demo".to_string(),
    };
    assert!(ctx.execute(&off).unwrap().contains("1 links removed"));
    assert!(ctx.execute(&off).unwrap().contains("0 links removed"));
}

#[test]
fn stray_is_scanned_moved_and_relinked() {
    let (temp, mut ctx) = workspace();
    seed_command(temp.path(), "demo", "a.md");
    let runtime = temp.path().join("commands");
    fs::create_dir_all(&runtime).unwrap();
    fs::write(runtime.join("stray.md"), "---\ndescription: s\n---\n").unwrap();

    let output = ctx
        .execute(&Commands::Scan {
            format: "json".to_string(),
        })
        .unwrap();
    let report: serde_json::Value = serde_json::from_str(&output).unwrap();
    let strays = report["strays"].as_array().unwrap();
    assert_eq!(strays.len(), 1);
    assert_eq!(strays[0]["identity"], "stray.md");
    assert_eq!(strays[0]["kind"], "command");
    assert_eq!(strays[0]["is_dir"], false);

    ctx.execute(&Commands::MoveCommand {
        identity: "stray.md".to_string(),
        group: Some("demo".to_string()),
    })
    .unwrap();

    // Canonically stored, runtime entry is now a link, nothing left to scan.
    assert!(temp
        .path()
        .join("library/commands/demo/stray.md")
        .is_file());
    assert!(fs::symlink_metadata(runtime.join("stray.md"))
        .unwrap()
        .file_type()
        .is_symlink());
    let output = ctx
        .execute(&Commands::Scan {
            format: "json".to_string(),
        })
        .unwrap();
    let report: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert!(report["strays"].as_array().unwrap().is_empty());
}

#[test]
fn move_round_trip_reproduces_link_target() {
    let (temp, mut ctx) = workspace();
    seed_command(temp.path(), "demo", "a.md");
    let runtime = temp.path().join("commands");
    fs::create_dir_all(&runtime).unwrap();
    fs::write(runtime.join("stray.md"), "x").unwrap();

    ctx.execute(&Commands::MoveCommand {
        identity: "stray.md".to_string(),
        group: Some("demo".to_string()),
    })
    .unwrap();
    let target_after_move = fs::read_link(runtime.join("stray.md")).unwrap();

    ctx.execute(&Commands::Off {
        kind: KindArg::Command,
        group: "demo".to_string(),
    })
    .unwrap();
    assert!(fs::symlink_metadata(runtime.join("stray.md")).is_err());

    ctx.execute(&Commands::On {
        kind: KindArg::Command,
        group: "demo".to_string(),
    })
    .unwrap();
    assert_eq!(
        fs::read_link(runtime.join("stray.md")).unwrap(),
        target_after_move
    );
}

#[test]
fn move_collision_leaves_both_files_untouched() {
    let (temp, mut ctx) = workspace();
    seed_command(temp.path(), "demo", "x.md");
    let runtime = temp.path().join("commands");
    fs::create_dir_all(&runtime).unwrap();
    fs::write(runtime.join("x.md"), "stray copy").unwrap();

    let result = ctx.execute(&Commands::MoveCommand {
        identity: "x.md".to_string(),
        group: Some("demo".to_string()),
    });
    assert!(matches!(result, Err(LinksetError::Collision { .. })));
    assert_eq!(
        fs::read_to_string(runtime.join("x.md")).unwrap(),
        "stray copy"
    );
    let canonical = temp.path().join("library/commands/demo/x.md");
    assert!(fs::read_to_string(canonical).unwrap().contains("description"));
}

#[test]
fn collision_law_skip_if_link_and_replace_real() {
    let (temp, mut ctx) = workspace();
    seed_command(temp.path(), "a", "x.md");
    seed_command(temp.path(), "b", "x.md");
    let runtime = temp.path().join("commands");

    // Skip-if-link half: A's link survives enabling B.
    ctx.execute(&Commands::On {
        kind: KindArg::Command,
        group: "a".to_string(),
    })
    .unwrap();
    let output = ctx
        .execute(&Commands::On {
            kind: KindArg::Command,
            group: "b".to_string(),
        })
        .unwrap();
    assert!(output.contains("0 links created"), "{}", output);
    let target = fs::read_link(runtime.join("x.md")).unwrap();
    assert!(target.ends_with(Path::new("a/x.md")), "{:?}", target);

    // Replace-real half: a real file at the identity is replaced, so the
    // last-enabled group wins.
    fs::remove_file(runtime.join("x.md")).unwrap();
    fs::write(runtime.join("x.md"), "real entry").unwrap();
    let output = ctx
        .execute(&Commands::On {
            kind: KindArg::Command,
            group: "b".to_string(),
        })
        .unwrap();
    assert!(output.contains("1 links created"), "{}", output);
    let target = fs::read_link(runtime.join("x.md")).unwrap();
    assert!(target.ends_with(Path::new("b/x.md")), "{:?}", target);
}

#[test]
fn register_skill_group_from_nothing() {
    let (temp, mut ctx) = workspace();

    let output = ctx
        .execute(&Commands::RegisterSkillGroup {
            name: "newgrp".to_string(),
        })
        .unwrap();
    assert!(output.contains("0 links created"), "{}", output);
    assert!(temp.path().join("library/skills/newgrp").is_dir());

    let entry = group_entry(&list_json(&mut ctx), "skills", "newgrp");
    assert_eq!(entry["active"], 0);
    assert_eq!(entry["total"], 0);
    assert_eq!(entry["enabled"], false);
}

#[test]
fn register_group_auto_enables_existing_assets() {
    let (temp, mut ctx) = workspace();
    let skill = temp.path().join("library/skills/pack/research");
    fs::create_dir_all(&skill).unwrap();
    fs::write(skill.join("SKILL.md"), "# skill").unwrap();

    let output = ctx
        .execute(&Commands::RegisterSkillGroup {
            name: "pack".to_string(),
        })
        .unwrap();
    assert!(output.contains("1 links created"), "{}", output);
    let link = temp.path().join("skills").join("research");
    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert!(link.join("SKILL.md").is_file());
}

#[test]
fn unknown_group_aborts_with_precondition_error() {
    let (_temp, mut ctx) = workspace();
    let result = ctx.execute(&Commands::On {
        kind: KindArg::Command,
        group: "ghost".to_string(),
    });
    match result {
        Err(e) => assert!(e.is_precondition(), "unexpected error: {}", e),
        Ok(output) => panic!("expected failure, got: {}", output),
    }
}

#[test]
fn partial_state_is_valid() {
    let (temp, mut ctx) = workspace();
    seed_command(temp.path(), "demo", "a.md");
    seed_command(temp.path(), "demo", "b.md");
    ctx.execute(&Commands::On {
        kind: KindArg::Command,
        group: "demo".to_string(),
    })
    .unwrap();
    fs::remove_file(temp.path().join("commands/a.md")).unwrap();

    let entry = group_entry(&list_json(&mut ctx), "commands", "demo");
    assert_eq!(entry["active"], 1);
    assert_eq!(entry["total"], 2);
    assert_eq!(entry["enabled"], true);
}

#[test]
fn runtime_dirs_are_added_to_gitignore_once() {
    let (temp, mut ctx) = workspace();
    seed_command(temp.path(), "demo", "a.md");
    let on = Commands::On {
        kind: KindArg::Command,
        group: "demo".to_string(),
    };
    ctx.execute(&on).unwrap();
    ctx.execute(&on).unwrap();

    let ignore = fs::read_to_string(temp.path().join(".gitignore")).unwrap();
    assert_eq!(
        ignore.lines().filter(|l| *l == "commands/").count(),
        1,
        "{}",
        ignore
    );
}
