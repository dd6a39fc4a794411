//! Dirty propagation and commit reporting

mod common;

use std::collections::BTreeMap;

use rstest::rstest;

use common::{probe_tree, ProbeScene, ProbeTree};
use scenetree::config::Settings;
use scenetree::domain::{scene_keys, DirtyReport, DirtySceneKeys, KeyedScene, NodeTree, Scene};
use scenetree::infrastructure::MemoryStore;
use scenetree::util::testing;

fn touch(scene: &mut ProbeScene, keys: &[&str]) {
    scene.pending = Some(scene_keys(keys.iter().copied()));
}

fn dirty(scene: &str, keys: &[&str]) -> DirtySceneKeys {
    DirtySceneKeys::from([(scene.to_string(), scene_keys(keys.iter().copied()))])
}

#[rstest]
fn given_dirty_scene_in_child_when_root_commits_then_reports_once_and_then_nothing() {
    let (mut tree, log) = probe_tree();
    let root = tree.create_node("R", "Root");
    let a = tree.create_node("A", "Child");
    tree.mount_child(root, "A", a).unwrap();
    tree.add_scene(a, "s1", || log.clone()).unwrap();

    tree.record_dirty_scene_keys(a, "s1", scene_keys(["k"]));
    tree.mark_scene_dirty(a, "s1");
    tree.commit(root);

    assert_eq!(*log.borrow(), vec!["commit A/s1".to_string()]);
    assert_eq!(
        tree.store_mut().take_reports(),
        vec![
            DirtyReport::new("A", dirty("s1", &["k"])),
            DirtyReport::new("R", DirtySceneKeys::new()),
        ]
    );

    tree.commit(root);

    let reports = tree.store().reports();
    assert_eq!(reports, &[DirtyReport::new("R", DirtySceneKeys::new())]);
    assert_eq!(log.borrow().len(), 1, "no scene commits on a clean tree");
}

#[rstest]
fn given_deep_scene_mark_when_inspecting_ancestors_then_every_level_records_child() {
    let (mut tree, log) = probe_tree();
    let root = tree.create_node("r", "R");
    let a = tree.spawn_child(root, "a", "A").unwrap().unwrap();
    let b = tree.spawn_child(a, "b", "B").unwrap().unwrap();
    tree.add_scene(b, "s", || log.clone()).unwrap();

    tree.modify_scene(b, "s", |s| touch(s, &["x"])).unwrap();

    assert_eq!(tree.dirty_scenes(b).collect::<Vec<_>>(), vec!["s"]);
    assert_eq!(tree.dirty_children(a).collect::<Vec<_>>(), vec!["b"]);
    assert_eq!(tree.dirty_children(root).collect::<Vec<_>>(), vec!["a"]);

    tree.commit(root);

    for node in [root, a, b] {
        assert!(!tree.is_dirty(node));
    }
    let b_reports: Vec<_> = tree.store().reports_for("b").collect();
    assert_eq!(b_reports.len(), 1);
    assert_eq!(b_reports[0].scenes, dirty("s", &["x"]));
}

#[rstest]
fn given_untouched_sibling_when_root_commits_then_sibling_is_skipped() {
    let (mut tree, log) = probe_tree();
    let root = tree.create_node("r", "R");
    let a = tree.spawn_child(root, "a", "A").unwrap().unwrap();
    let c = tree.spawn_child(root, "c", "C").unwrap().unwrap();
    tree.add_scene(a, "s", || log.clone()).unwrap();
    tree.add_scene(c, "s", || log.clone()).unwrap();

    tree.modify_scene(a, "s", |s| touch(s, &["k"])).unwrap();
    tree.commit(root);

    assert_eq!(*log.borrow(), vec!["commit a/s".to_string()]);
    assert_eq!(tree.store().reports_for("c").count(), 0);
    assert_eq!(tree.store().reports_for("a").count(), 1);
}

#[rstest]
fn given_only_clean_scenes_touched_when_modify_then_nothing_marked() {
    let (mut tree, log) = probe_tree();
    let root = tree.create_node("r", "R");
    let a = tree.spawn_child(root, "a", "A").unwrap().unwrap();
    tree.add_scene(a, "s", || log.clone()).unwrap();

    let label = tree.modify_scene(a, "s", |s| s.label.clone()).unwrap();

    assert_eq!(label.as_deref(), Some("a/s"));
    assert!(!tree.is_dirty(a));
    assert!(!tree.is_dirty(root));
}

#[rstest]
fn given_keyed_scene_write_when_committed_then_entity_reflects_it() {
    testing::init_test_setup();
    let mut tree: NodeTree<KeyedScene<String>, MemoryStore> = NodeTree::new(MemoryStore::default());
    let root = tree.create_node("r", "R");
    let a = tree.spawn_child(root, "a", "A").unwrap().unwrap();
    tree.add_scene(a, "props", BTreeMap::new).unwrap();

    tree.modify_scene(a, "props", |s| {
        s.set("title", "hello".to_string());
        s.set("color", "red".to_string());
    })
    .unwrap();
    assert!(tree.get_scene_entity(a, "props").unwrap().unwrap().is_empty());

    tree.commit(root);

    let entity = tree.get_scene_entity(a, "props").unwrap().unwrap();
    assert_eq!(entity.get("title").map(String::as_str), Some("hello"));
    let a_report = tree.store().reports_for("a").next().unwrap();
    assert_eq!(a_report.scenes, dirty("props", &["color", "title"]));
}

#[rstest]
fn given_clean_reports_disabled_when_commit_clean_tree_then_store_sees_nothing() {
    let (_, log) = probe_tree();
    let settings = Settings {
        report_clean_commits: false,
        ..Settings::default()
    };
    let mut tree: ProbeTree = NodeTree::with_settings(MemoryStore::new("tm"), settings);
    let root = tree.create_node("r", "R");
    let a = tree.spawn_child(root, "a", "A").unwrap().unwrap();
    tree.add_scene(a, "s", || log.clone()).unwrap();

    tree.modify_scene(a, "s", |s| touch(s, &["k"])).unwrap();
    tree.commit(root);
    assert_eq!(
        tree.store().reports(),
        &[DirtyReport::new("a", dirty("s", &["k"]))]
    );

    tree.commit(root);
    assert_eq!(tree.store().reports().len(), 1);
}

#[rstest]
fn given_dirty_detached_node_when_mounted_then_new_ancestors_become_dirty() {
    let (mut tree, log) = probe_tree();
    let root = tree.create_node("r", "R");
    let a = tree.spawn_child(root, "a", "A").unwrap().unwrap();
    let x = tree.create_node("x", "X");
    tree.add_scene(x, "s", || log.clone()).unwrap();
    tree.modify_scene(x, "s", |s| touch(s, &["k"])).unwrap();
    assert!(!tree.is_dirty(root));

    tree.mount_child(a, "x", x).unwrap();

    assert_eq!(tree.dirty_children(a).collect::<Vec<_>>(), vec!["x"]);
    assert_eq!(tree.dirty_children(root).collect::<Vec<_>>(), vec!["a"]);
    tree.commit(root);
    assert_eq!(tree.store().reports_for("x").count(), 1);
}

#[rstest]
fn given_dirty_child_when_unmounted_then_parent_forgets_it() {
    let (mut tree, log) = probe_tree();
    let root = tree.create_node("r", "R");
    let a = tree.spawn_child(root, "a", "A").unwrap().unwrap();
    tree.add_scene(a, "s", || log.clone()).unwrap();
    tree.modify_scene(a, "s", |s| touch(s, &["k"])).unwrap();

    tree.unmount_child(root, "a").unwrap();
    tree.commit(root);

    assert_eq!(tree.dirty_children(root).count(), 0);
    assert_eq!(tree.store().reports_for("a").count(), 0);
    assert!(tree.is_dirty(a), "detached node keeps its own pending state");
}

#[rstest]
fn given_dirty_scene_when_deleted_then_its_keys_are_not_reported() {
    let (mut tree, log) = probe_tree();
    let n = tree.create_node("n", "N");
    tree.add_scene(n, "s", || log.clone()).unwrap();
    tree.modify_scene(n, "s", |s| touch(s, &["k"])).unwrap();

    tree.delete_scene(n, "s").unwrap();
    tree.commit(n);

    assert_eq!(*log.borrow(), vec!["destroy n/s".to_string()]);
    assert_eq!(tree.store().reports(), &[DirtyReport::new("n", DirtySceneKeys::new())]);
}

#[rstest]
fn given_keys_recorded_without_mark_when_commit_then_keys_reported_without_scene_commit() {
    let (mut tree, log) = probe_tree();
    let n = tree.create_node("n", "N");
    tree.add_scene(n, "s", || log.clone()).unwrap();

    tree.record_dirty_scene_keys(n, "s", scene_keys(["k"]));
    tree.commit(n);

    assert!(log.borrow().is_empty());
    assert_eq!(tree.store().reports(), &[DirtyReport::new("n", dirty("s", &["k"]))]);
}

#[rstest]
fn given_destroyed_node_when_marked_and_committed_then_nothing_happens() {
    let (mut tree, log) = probe_tree();
    let n = tree.create_node("n", "N");
    tree.add_scene(n, "s", || log.clone()).unwrap();
    tree.destroy(n);

    tree.mark_scene_dirty(n, "s");
    tree.record_dirty_scene_keys(n, "s", scene_keys(["k"]));
    tree.commit(n);

    assert!(tree.store().reports().is_empty());
    assert!(!tree.is_dirty(n));
}

#[rstest]
fn given_child_marked_directly_when_root_commits_then_mark_climbed_and_child_reached() {
    let (mut tree, log) = probe_tree();
    let root = tree.create_node("r", "R");
    let a = tree.spawn_child(root, "a", "A").unwrap().unwrap();
    let b = tree.spawn_child(a, "b", "B").unwrap().unwrap();
    tree.add_scene(b, "s", || log.clone()).unwrap();
    tree.record_dirty_scene_keys(b, "s", scene_keys(["k"]));

    tree.mark_child_dirty(a, "b");

    assert_eq!(tree.dirty_children(a).collect::<Vec<_>>(), vec!["b"]);
    assert_eq!(tree.dirty_children(root).collect::<Vec<_>>(), vec!["a"]);

    tree.commit(root);

    let b_reports: Vec<_> = tree.store().reports_for("b").collect();
    assert_eq!(b_reports.len(), 1);
    assert_eq!(b_reports[0].scenes, dirty("s", &["k"]));
    assert!(!tree.is_dirty(root));
}

#[rstest]
fn given_unknown_child_id_when_marked_then_ancestors_stay_clean() {
    let (mut tree, _) = probe_tree();
    let root = tree.create_node("r", "R");
    let a = tree.spawn_child(root, "a", "A").unwrap().unwrap();
    tree.spawn_child(a, "b", "B").unwrap();

    tree.mark_child_dirty(a, "missing");

    assert!(!tree.is_dirty(a));
    assert!(!tree.is_dirty(root));
}

#[rstest]
fn given_scene_flushed_inside_modify_when_commit_then_earlier_keys_not_reported() {
    let (mut tree, log) = probe_tree();
    let n = tree.create_node("n", "N");
    tree.add_scene(n, "s", || log.clone()).unwrap();
    tree.modify_scene(n, "s", |s| touch(s, &["k"])).unwrap();

    tree.modify_scene(n, "s", |s| s.commit()).unwrap();

    assert!(tree.dirty_scene_keys(n).unwrap().is_empty());
    tree.commit(n);
    assert_eq!(tree.store().reports(), &[DirtyReport::new("n", DirtySceneKeys::new())]);
}
