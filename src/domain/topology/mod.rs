pub mod multicast_tree;
pub mod path;
pub mod routing_engine;
pub mod topology_graph;
