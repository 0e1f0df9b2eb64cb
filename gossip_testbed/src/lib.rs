//! A testbed for timed gossip experiments. A [`Master`](crate::gossip::Master) spawns a set of
//! [`GossipNode`](crate::gossip::GossipNode) actors, hands every one of them the full membership,
//! lets them broadcast random numbers to each other for a while, tells them to be quiet, and
//! finally asks each of them for a weighted sum over everything it received.
//!
//! Nodes watch each other. When a peer dies, every survivor that knew it forwards the last few
//! numbers it heard from that peer to everyone else, so a crash does not erase what the dead node
//! already said.
//!
//! The crate is split in three:
//! - [`core`](crate::core): the actor substrate. Spawning, addressing, sending, failure
//!   monitoring and termination.
//! - [`gossip`](crate::gossip): the protocol engine, its state store and the orchestrator.
//! - [`testkit`](crate::testkit): logging and failure injection.

pub mod core;
pub mod gossip;
pub mod testkit;
