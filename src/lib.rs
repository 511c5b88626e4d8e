/*!
Distance-vector and link-state routing simulation.

A [`network::Topology`] is handed to one of the [`protocol`] engines, which runs to
completion and yields routing tables plus an ordered trace of
[`protocol::ProtocolEvent`]s. The trace can then be replayed at a fixed pace with a
[`playback::EventPlayer`].
*/

pub mod config;
pub mod network;
pub mod playback;
pub mod protocol;
