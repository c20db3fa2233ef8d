/*!
# HostPulse DevKit - Stubs et Utilitaires pour Tests

Bibliothèque facilitant les tests de bout en bout du pipeline avec:
- Kernel réel servi sur un port éphémère, horloge pilotée à la main
- Sink de flux en mémoire (pas besoin de client WebSocket)
- Builder de snapshots au format wire
*/

pub mod feed_stub;
pub mod snapshot_builder;
pub mod test_utils;

pub use feed_stub::{ChannelSink, FeedReceiver};
pub use snapshot_builder::SnapshotBuilder;
pub use test_utils::TestHarness;
