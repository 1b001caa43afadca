//! Tests for NodeService and the service container

use std::sync::Arc;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use rsnest::application::services::PositionOutcome;
use rsnest::application::ApplicationError;
use rsnest::config::Settings;
use rsnest::domain::{validate, DomainError, Node, NodeId, PayloadFormat, Violation};
use rsnest::infrastructure::store::MemoryStore;
use rsnest::infrastructure::ServiceContainer;
use rsnest::util::testing::init_test_setup;

/// Container over an in-memory store holding
///
/// ```text
/// 1
/// ├── 2
/// │   └── 3
/// └── 4
/// 5
/// ```
#[fixture]
fn container() -> ServiceContainer {
    init_test_setup();
    let container =
        ServiceContainer::with_store(Settings::default(), Arc::new(MemoryStore::new()));
    let nodes = &container.nodes;
    let one = nodes.create(None).unwrap();
    let two = nodes.create(Some(one.id)).unwrap();
    nodes.create(Some(two.id)).unwrap();
    nodes.create(Some(one.id)).unwrap();
    nodes.create(None).unwrap();
    container
}

fn ids_in_order(container: &ServiceContainer) -> Vec<(u64, u32)> {
    container
        .nodes
        .list()
        .unwrap()
        .iter()
        .map(|n| (n.id.0, n.depth))
        .collect()
}

fn assert_valid(container: &ServiceContainer) {
    let violations = container.nodes.check().unwrap();
    assert!(violations.is_empty(), "{violations:?}");
}

#[rstest]
fn given_created_nodes_when_listing_then_tree_order_with_depths(container: ServiceContainer) {
    assert_eq!(
        ids_in_order(&container),
        vec![(1, 0), (2, 1), (3, 2), (4, 1), (5, 0)]
    );
    let one = container.nodes.read(NodeId(1)).unwrap();
    assert_eq!((one.lft, one.rgt), (1, 8));
    assert_valid(&container);
}

#[rstest]
fn given_unknown_parent_when_creating_then_node_not_found(container: ServiceContainer) {
    let err = container.nodes.create(Some(NodeId(99))).unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::NodeNotFound(NodeId(99)))
    ));
    assert_eq!(container.nodes.list().unwrap().len(), 5);
}

#[rstest]
fn given_node_when_moving_under_other_root_then_subtree_follows(container: ServiceContainer) {
    let moved = container
        .nodes
        .update_parent(NodeId(2), Some(NodeId(5)))
        .unwrap();

    assert_eq!(moved.parent_id, Some(NodeId(5)));
    assert_eq!(moved.depth, 1);
    assert_eq!(
        ids_in_order(&container),
        vec![(1, 0), (4, 1), (5, 0), (2, 1), (3, 2)]
    );
    assert_valid(&container);
}

#[rstest]
fn given_node_when_moving_to_root_then_depth_resets(container: ServiceContainer) {
    let moved = container.nodes.update_parent(NodeId(3), None).unwrap();

    assert!(moved.is_root());
    assert_eq!(moved.depth, 0);
    assert_valid(&container);
}

#[rstest]
#[case::itself(1, 1)]
#[case::child(1, 2)]
#[case::grandchild(1, 3)]
fn given_target_inside_subtree_when_moving_then_invalid_move(
    container: ServiceContainer,
    #[case] node: u64,
    #[case] parent: u64,
) {
    let before = container.nodes.list().unwrap();

    let err = container
        .nodes
        .update_parent(NodeId(node), Some(NodeId(parent)))
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::InvalidMove { .. })
    ));
    assert_eq!(container.nodes.list().unwrap(), before);
}

#[rstest]
fn given_inner_node_when_deleting_then_removes_subtree(container: ServiceContainer) {
    let removed = container.nodes.delete(NodeId(2)).unwrap();

    assert_eq!(removed, vec![NodeId(2), NodeId(3)]);
    assert_eq!(ids_in_order(&container), vec![(1, 0), (4, 1), (5, 0)]);
    let one = container.nodes.read(NodeId(1)).unwrap();
    assert_eq!((one.lft, one.rgt), (1, 4));
    assert_valid(&container);
}

#[rstest]
fn given_unknown_node_when_deleting_then_node_not_found(container: ServiceContainer) {
    let err = container.nodes.delete(NodeId(42)).unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::NodeNotFound(NodeId(42)))
    ));
}

#[rstest]
fn given_forest_when_rendering_then_one_tree_per_root(container: ServiceContainer) {
    let forest = container.nodes.forest().unwrap();
    assert_eq!(forest.roots().len(), 2);
    assert_eq!(forest.len(), 5);
    assert_eq!(forest.height(), 3);
}

#[test]
fn given_corrupted_bounds_when_rebuilding_then_check_passes_again() {
    init_test_setup();
    let corrupted = vec![
        Node {
            id: NodeId(1),
            parent_id: None,
            lft: 1,
            rgt: 3,
            depth: 0,
        },
        Node {
            id: NodeId(2),
            parent_id: Some(NodeId(1)),
            lft: 2,
            rgt: 5,
            depth: 3,
        },
    ];
    let container = ServiceContainer::with_store(
        Settings::default(),
        Arc::new(MemoryStore::with_nodes(corrupted)),
    );

    let violations = container.nodes.check().unwrap();
    assert!(violations.contains(&Violation::PartialOverlap {
        a: NodeId(1),
        b: NodeId(2)
    }));

    assert_eq!(container.nodes.rebuild().unwrap(), 2);
    assert_valid(&container);
}

#[test]
fn given_parent_cycle_when_rebuilding_then_cycle_detected() {
    init_test_setup();
    let cyclic = vec![
        Node {
            id: NodeId(1),
            parent_id: Some(NodeId(2)),
            lft: 1,
            rgt: 2,
            depth: 0,
        },
        Node {
            id: NodeId(2),
            parent_id: Some(NodeId(1)),
            lft: 3,
            rgt: 4,
            depth: 0,
        },
    ];
    let container = ServiceContainer::with_store(
        Settings::default(),
        Arc::new(MemoryStore::with_nodes(cyclic)),
    );

    let err = container.nodes.rebuild().unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::CycleDetected(NodeId(1)))
    ));
}

#[test]
fn given_json_store_when_reordering_then_result_survives_reopen() {
    init_test_setup();
    let temp = TempDir::new().unwrap();
    let settings = Settings {
        store_path: temp.path().join("nodes.json"),
        ..Settings::default()
    };

    let container = ServiceContainer::new(settings.clone());
    for _ in 0..3 {
        container.nodes.create(None).unwrap();
    }
    let outcome = container
        .positions
        .update_positions_payload(
            r#"[{"id": 3, "children": [{"id": "1"}]}, {"id": 2}]"#,
            PayloadFormat::Json,
        )
        .unwrap();
    assert_eq!(outcome, PositionOutcome::Reordered { nodes: 3 });

    let reopened = ServiceContainer::new(settings);
    let nodes = reopened.nodes.list().unwrap();
    let order: Vec<(u64, Option<u64>, u32, u32)> = nodes
        .iter()
        .map(|n| (n.id.0, n.parent_id.map(|p| p.0), n.lft, n.rgt))
        .collect();
    assert_eq!(
        order,
        vec![(3, None, 1, 4), (1, Some(3), 2, 3), (2, None, 5, 6)]
    );
    assert!(validate::check(&nodes).is_empty());

    // A rebuild from parent links reproduces the submitted order
    reopened.nodes.rebuild().unwrap();
    assert_eq!(reopened.nodes.list().unwrap(), nodes);
}
