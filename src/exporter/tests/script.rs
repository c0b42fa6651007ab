use super::*;
use insta::assert_snapshot;

#[test]
fn test_groups_only_script() {
    let storage = staff_storage();
    let (exporter, _) = exporter(&storage, test_config().with_users(false));

    let (result, script) = export_to_string(&exporter);
    let stats = result.unwrap();

    assert_eq!(stats.groups, 3);
    assert_eq!(stats.tracks, 0);
    assert_eq!(stats.users, 0);
    assert!(script.ends_with("essentials.spawn true\n\n\n\n"));
    assert_snapshot!(script.trim_end(), @r"
    # Permission Export File
    # Generated by console at 2026-10-16 12:00:00 +00:00

    # Create groups
    /lp creategroup admin
    /lp creategroup mod

    # Export group: admin
    /lp group admin parent add mod
    /lp group admin permission set essentials.* true

    # Export group: mod
    /lp group mod permission set essentials.kick true

    # Export group: default
    /lp group default permission set essentials.spawn true
    ");
}

#[test]
fn test_tracks_section() {
    let storage = staff_storage();
    storage.insert_track(Track::new("staff", ["mod", "admin"]));
    storage.insert_track(Track::new("donor", ["vip", "vip+", "mvp"]));
    let (exporter, _) = exporter(&storage, test_config().with_users(false));

    let (result, script) = export_to_string(&exporter);
    assert_eq!(result.unwrap().tracks, 2);

    let (_, tracks) = script.split_once("# Create tracks").unwrap();
    assert!(tracks.ends_with("append mvp\n\n\n\n"));
    assert_snapshot!(tracks.trim(), @r"
    /lp createtrack staff
    /lp createtrack donor

    # Export track: staff
    /lp track staff append mod
    /lp track staff append admin

    # Export track: donor
    /lp track donor append vip
    /lp track donor append vip+
    /lp track donor append mvp
    ");
}

#[test]
fn test_no_tracks_no_track_section() {
    let storage = staff_storage();
    let (exporter, _) = exporter(&storage, test_config().with_users(false));

    let (_, script) = export_to_string(&exporter);
    assert!(!script.contains("track"));
    assert!(!script.contains("# Export users"));
}

#[test]
fn test_default_group_is_never_created() {
    let storage = MemoryStorage::new();
    storage.insert_group(Group::new("Default").with_node(Node::new("chat.use")));
    storage.insert_group(Group::new("member").with_weight(1));
    let storage = Arc::new(storage);
    let (exporter, _) = exporter(&storage, test_config().with_users(false));

    let (_, script) = export_to_string(&exporter);
    assert!(script.contains("/lp creategroup member"));
    assert!(!script.contains("creategroup Default"));
    assert!(script.contains("# Export group: Default\n/lp group Default permission set chat.use true\n"));
}

#[test]
fn test_custom_prefix_and_default_group() {
    let storage = staff_storage();
    let config = test_config()
        .with_users(false)
        .with_command_prefix("/perms")
        .with_default_group("mod");
    let (exporter, _) = exporter(&storage, config);

    let (_, script) = export_to_string(&exporter);
    assert!(script.contains("/perms creategroup admin"));
    assert!(script.contains("/perms creategroup default"));
    assert!(!script.contains("creategroup mod"));
    assert!(!script.contains("/lp "));
}

#[test]
fn test_stage_messages() {
    let storage = staff_storage();
    let (exporter, observer) = exporter(&storage, test_config().with_users(false));

    export_to_string(&exporter).0.unwrap();

    assert_eq!(
        observer.messages(),
        vec![
            "[Export] Starting.",
            "[Export] Starting group export.",
            "[Export] Exported 3 groups.",
            "[Export] Starting track export.",
            "[Export] Exported 0 tracks.",
            "Successfully exported to memory",
        ]
    );
}

#[test]
fn test_group_milestones() {
    let storage = MemoryStorage::new();
    for i in 0..5 {
        storage.insert_group(Group::new(format!("rank{i}")).with_weight(i));
    }
    let storage = Arc::new(storage);
    let (exporter, observer) =
        exporter(&storage, test_config().with_users(false).with_notify_every(2));

    export_to_string(&exporter).0.unwrap();

    let milestones: Vec<String> = observer
        .messages()
        .into_iter()
        .filter(|m| m.contains("so far"))
        .collect();
    assert_eq!(
        milestones,
        vec![
            "[Export] Exported 2 groups so far.",
            "[Export] Exported 4 groups so far.",
        ]
    );
}

#[test]
fn test_actor_line_break_is_flattened() {
    let storage = staff_storage();
    let exporter = Exporter::new(storage, test_config().with_users(false), "evil\nactor")
        .with_timestamp(fixed_time());

    let (_, script) = export_to_string(&exporter);
    assert!(script.starts_with(
        "# Permission Export File\n# Generated by evil actor at 2026-10-16 12:00:00 +00:00\n\n"
    ));
}
