use rt_admission_control::domain::topology::path::Path;
use rt_admission_control::domain::topology::routing_engine::RoutingEngine;
use rt_admission_control::domain::topology::topology_graph::TopologySnapshot;
use rt_admission_control::domain::utils::id::NodeId;
use rt_admission_control::loader::parser::parse_json_str;

/// Three parallel routes from 1 to 5 costing 2, 3 and 5, plus a broken link.
const PARALLEL_ROUTES: &str = r#"{
    "nodes": [1, 2, 3, 4, 5],
    "links": [
        { "src": 1, "dst": 2, "port": 2 },
        { "src": 1, "dst": 3, "port": 3 },
        { "src": 1, "dst": 4, "weight": 2.0, "port": 4 },
        { "src": 2, "dst": 5, "port": 5 },
        { "src": 3, "dst": 5, "weight": 2.0, "port": 5 },
        { "src": 4, "dst": 5, "weight": 3.0, "port": 5 },
        { "src": 5, "dst": 1, "weight": -1.0, "port": 1 }
    ]
}"#;

fn engine_from(json: &str) -> RoutingEngine {
    let snapshot: TopologySnapshot = parse_json_str(json).unwrap();
    let mut engine = RoutingEngine::new();
    engine.update_topology(&snapshot);
    engine
}

fn path(nodes: &[&str]) -> Path {
    nodes.iter().copied().collect()
}

#[test]
fn test_parallel_routes_from_json() {
    let engine = engine_from(PARALLEL_ROUTES);
    let (src, dst) = (NodeId::new("1"), NodeId::new("5"));

    let paths = engine.find_all_paths(&src, &dst);
    assert_eq!(paths, vec![path(&["1", "2", "5"]), path(&["1", "3", "5"]), path(&["1", "4", "5"])]);
    assert_eq!(engine.find_shortest_path(&src, &dst), Some(path(&["1", "2", "5"])));
    assert_eq!(engine.get_port(&NodeId::new("1"), &NodeId::new("4")), Some(4));

    let weights = engine.calculate_bucket_weight(&paths);
    let costs: Vec<f64> = weights.iter().map(|bucket| bucket.cost).collect();
    let shares: Vec<f64> = weights.iter().map(|bucket| bucket.weight).collect();
    assert_eq!(costs, vec![2.0, 3.0, 5.0]);
    assert_eq!(shares, vec![8.0, 7.0, 5.0]);
}

#[test]
fn test_negative_weight_link_is_dropped() {
    let engine = engine_from(PARALLEL_ROUTES);

    assert_eq!(engine.graph().link_count(), 6);
    assert!(engine.find_shortest_path(&NodeId::new("5"), &NodeId::new("1")).is_none());
}

#[test]
fn test_zero_cost_paths_get_zero_weight() {
    let engine = engine_from(
        r#"{ "links": [
            { "src": "a", "dst": "b", "weight": 0.0, "port": 1 },
            { "src": "a", "dst": "c", "weight": 0.0, "port": 2 },
            { "src": "b", "dst": "d", "weight": 0.0, "port": 1 },
            { "src": "c", "dst": "d", "weight": 0.0, "port": 1 }
        ] }"#,
    );

    let paths = engine.find_all_paths(&NodeId::new("a"), &NodeId::new("d"));
    let weights = engine.calculate_bucket_weight(&paths);

    assert_eq!(weights.len(), 2);
    assert!(weights.iter().all(|bucket| bucket.weight == 0.0));
}

#[test]
fn test_multicast_tree_over_parallel_routes() {
    let engine = engine_from(PARALLEL_ROUTES);
    let root = NodeId::new("1");

    let tree = engine.find_multicast_tree(&root, &[NodeId::new("5"), NodeId::new("3"), NodeId::new("9")]);

    assert_eq!(tree.next_hops_of(&root), &[NodeId::new("2"), NodeId::new("3")]);
    assert_eq!(tree.next_hops_of(&NodeId::new("2")), &[NodeId::new("5")]);
    assert!(tree.next_hops_of(&NodeId::new("3")).is_empty());
    assert_eq!(tree.unreachable, vec![NodeId::new("9")]);
}
