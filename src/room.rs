use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::peer::{NegotiationState, ParticipantConnection};
use crate::signaling::{ParticipantId, ParticipantRole};

/// Snapshot of one remote participant, safe to hand to the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantSummary {
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub role: ParticipantRole,
    pub is_muted: bool,
    pub is_video_off: bool,
    pub negotiation: NegotiationState,
}

/// Owns every live peer connection, keyed by participant id. At most one
/// connection per id; callers must remove an entry before re-creating it.
#[derive(Default)]
pub(crate) struct PeerRegistry {
    connections: HashMap<ParticipantId, ParticipantConnection>,
}

impl PeerRegistry {
    pub(crate) fn new() -> Self {
        Self {
            connections: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, conn: ParticipantConnection) -> Result<()> {
        match self.connections.entry(conn.participant_id) {
            Entry::Occupied(_) => Err(Error::DuplicateConnection(conn.participant_id)),
            Entry::Vacant(slot) => {
                slot.insert(conn);
                Ok(())
            }
        }
    }

    /// Closes and removes the connection; removing an unknown id is a no-op.
    pub(crate) async fn remove(&mut self, participant_id: ParticipantId) -> bool {
        match self.connections.remove(&participant_id) {
            Some(mut conn) => {
                conn.close().await;
                true
            }
            None => false,
        }
    }

    pub(crate) async fn close_all(&mut self) {
        for (_, mut conn) in self.connections.drain() {
            conn.close().await;
        }
    }

    pub(crate) fn contains(&self, participant_id: ParticipantId) -> bool {
        self.connections.contains_key(&participant_id)
    }

    pub(crate) fn get(&self, participant_id: ParticipantId) -> Option<&ParticipantConnection> {
        self.connections.get(&participant_id)
    }

    pub(crate) fn get_mut(
        &mut self,
        participant_id: ParticipantId,
    ) -> Option<&mut ParticipantConnection> {
        self.connections.get_mut(&participant_id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &ParticipantConnection> {
        self.connections.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.connections.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub(crate) fn summaries(&self) -> Vec<ParticipantSummary> {
        self.connections
            .values()
            .map(|conn| ParticipantSummary {
                participant_id: conn.participant_id,
                display_name: conn.display_name.clone(),
                role: conn.role,
                is_muted: conn.is_muted,
                is_video_off: conn.is_video_off,
                negotiation: conn.negotiation,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::LocalTrack;
    use crate::peer::PeerWiring;
    use crate::signaling::SignalingClient;
    use tokio::sync::mpsc;

    async fn connection(participant_id: ParticipantId) -> ParticipantConnection {
        let (out_tx, _out_rx) = mpsc::channel(32);
        let (_in_tx, in_rx) = mpsc::channel(1);
        let (sender, _receiver) = SignalingClient::from_parts(out_tx, in_rx).split();
        let (pc_tx, _pc_rx) = mpsc::unbounded_channel();
        ParticipantConnection::create(
            participant_id,
            format!("participant-{}", participant_id),
            ParticipantRole::Member,
            &[],
            &LocalTrack::audio(),
            &LocalTrack::camera(),
            PeerWiring {
                room_id: "room-test".to_string(),
                local_id: 1,
                outbound: sender,
                pc_events: pc_tx,
            },
        )
        .await
        .expect("create connection")
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let mut registry = PeerRegistry::new();
        registry.insert(connection(7).await).expect("first insert");

        let second = connection(7).await;
        assert!(matches!(
            registry.insert(second),
            Err(Error::DuplicateConnection(7))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn remove_unknown_is_noop() {
        let mut registry = PeerRegistry::new();
        assert!(!registry.remove(42).await);

        registry.insert(connection(42).await).expect("insert");
        assert!(registry.remove(42).await);
        assert!(registry.is_empty());
        assert!(!registry.remove(42).await);
    }

    #[tokio::test]
    async fn close_all_empties_the_registry() {
        let mut registry = PeerRegistry::new();
        registry.insert(connection(1).await).expect("insert");
        registry.insert(connection(2).await).expect("insert");
        assert_eq!(registry.len(), 2);

        registry.close_all().await;
        assert!(registry.is_empty());
    }
}
