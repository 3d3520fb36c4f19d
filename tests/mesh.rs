mod common;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use common::*;
use meeting_client::{
    MeetingSession, NegotiationState, ParticipantId, ParticipantInfo, ParticipantRole,
    SignalingClient, SignalingMessage,
};

/// Minimal in-memory signaling server: keeps a roster per room, routes
/// targeted negotiation traffic, broadcasts state changes, and grants every
/// moderation request.
#[derive(Clone, Default)]
struct Hub {
    clients: Arc<Mutex<HashMap<ParticipantId, HubClient>>>,
}

struct HubClient {
    info: ParticipantInfo,
    to_client: mpsc::Sender<SignalingMessage>,
}

impl Hub {
    fn new() -> Self {
        Self::default()
    }

    async fn connect(&self, info: ParticipantInfo) -> SignalingClient {
        let (out_tx, mut out_rx) = mpsc::channel(256);
        let (in_tx, in_rx) = mpsc::channel(256);

        let clients = Arc::clone(&self.clients);
        let me = info.clone();
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                match msg {
                    SignalingMessage::JoinRoom { room_id } => {
                        let mut clients = clients.lock().await;
                        let roster: Vec<ParticipantInfo> =
                            clients.values().map(|c| c.info.clone()).collect();
                        let _ = in_tx
                            .send(SignalingMessage::RoomJoined {
                                room_id: room_id.clone(),
                                participants: roster,
                            })
                            .await;
                        for client in clients.values() {
                            let _ = client
                                .to_client
                                .send(SignalingMessage::ParticipantJoined {
                                    room_id: room_id.clone(),
                                    participant_id: me.participant_id,
                                    display_name: me.display_name.clone(),
                                    role: me.role,
                                })
                                .await;
                        }
                        clients.insert(
                            me.participant_id,
                            HubClient {
                                info: me.clone(),
                                to_client: in_tx.clone(),
                            },
                        );
                    }
                    SignalingMessage::LeaveRoom { room_id } => {
                        let mut clients = clients.lock().await;
                        clients.remove(&me.participant_id);
                        for client in clients.values() {
                            let _ = client
                                .to_client
                                .send(SignalingMessage::ParticipantLeft {
                                    room_id: room_id.clone(),
                                    participant_id: me.participant_id,
                                    display_name: me.display_name.clone(),
                                })
                                .await;
                        }
                    }
                    SignalingMessage::Offer {
                        target_participant_id,
                        ..
                    }
                    | SignalingMessage::Answer {
                        target_participant_id,
                        ..
                    }
                    | SignalingMessage::IceCandidate {
                        target_participant_id,
                        ..
                    } => {
                        let clients = clients.lock().await;
                        if let Some(client) = clients.get(&target_participant_id) {
                            let _ = client.to_client.send(msg).await;
                        }
                    }
                    SignalingMessage::AudioStateChanged { .. }
                    | SignalingMessage::VideoStateChanged { .. }
                    | SignalingMessage::ScreenShareStarted { .. }
                    | SignalingMessage::ScreenShareStopped { .. }
                    | SignalingMessage::ChatMessage { .. } => {
                        let clients = clients.lock().await;
                        for (id, client) in clients.iter() {
                            if *id != me.participant_id {
                                let _ = client.to_client.send(msg.clone()).await;
                            }
                        }
                    }
                    SignalingMessage::MuteRequest {
                        room_id,
                        target_participant_id,
                    } => {
                        let clients = clients.lock().await;
                        if let Some(client) = clients.get(&target_participant_id) {
                            let _ = client
                                .to_client
                                .send(SignalingMessage::ForceMute {
                                    room_id,
                                    target_participant_id,
                                })
                                .await;
                        }
                    }
                    SignalingMessage::RemoveRequest {
                        room_id,
                        target_participant_id,
                    } => {
                        let clients = clients.lock().await;
                        if let Some(client) = clients.get(&target_participant_id) {
                            let _ = client
                                .to_client
                                .send(SignalingMessage::ForceRemove {
                                    room_id,
                                    target_participant_id,
                                })
                                .await;
                        }
                    }
                    _ => {}
                }
            }
        });

        SignalingClient::from_parts(out_tx, in_rx)
    }
}

async fn join_via_hub(
    hub: &Hub,
    participant_id: ParticipantId,
    display_name: &str,
    role: ParticipantRole,
) -> Arc<MeetingSession> {
    let participant = info(participant_id, display_name, role);
    let channel = hub.connect(participant.clone()).await;
    let mut config = config("mesh-room", participant_id, display_name);
    config.local = participant;
    MeetingSession::join(config, channel, Arc::new(StubDevices::new()))
        .await
        .expect("join via hub")
}

async fn ids_of(session: &MeetingSession) -> Vec<ParticipantId> {
    let mut ids: Vec<ParticipantId> = session
        .participants()
        .await
        .iter()
        .map(|p| p.participant_id)
        .collect();
    ids.sort_unstable();
    ids
}

/// Every connection has progressed past `New`: initiators hold a local
/// offer, responders have applied a remote one, or the pair already
/// connected.
async fn all_negotiating(session: &MeetingSession, expected: usize) -> bool {
    let participants = session.participants().await;
    participants.len() == expected
        && participants.iter().all(|p| {
            matches!(
                p.negotiation,
                NegotiationState::HaveLocalOffer
                    | NegotiationState::HaveRemoteOffer
                    | NegotiationState::Connected
            )
        })
}

#[tokio::test]
async fn three_party_mesh_builds_pairwise_connections() {
    let hub = Hub::new();

    let a = join_via_hub(&hub, 1, "Ada", ParticipantRole::Admin).await;
    wait_for!(a.participant_count().await == 0);

    let b = join_via_hub(&hub, 2, "Bea", ParticipantRole::Member).await;
    wait_for!(ids_of(&a).await == vec![2] && ids_of(&b).await == vec![1]);

    let c = join_via_hub(&hub, 3, "Cal", ParticipantRole::Member).await;
    wait_for!(ids_of(&a).await == vec![2, 3]
            && ids_of(&b).await == vec![1, 3]
            && ids_of(&c).await == vec![1, 2]);

    // Offer/answer exchanges complete across every pair.
    wait_for!(all_negotiating(&a, 2).await && all_negotiating(&b, 2).await && all_negotiating(&c, 2).await);

    // One participant leaving shrinks everyone else's mesh.
    b.leave().await;
    wait_for!(ids_of(&a).await == vec![3] && ids_of(&c).await == vec![1]);

    a.leave().await;
    c.leave().await;
}

#[tokio::test]
async fn host_mute_request_reaches_target_and_syncs_back() {
    let hub = Hub::new();

    let host = join_via_hub(&hub, 1, "Host", ParticipantRole::Admin).await;
    let guest = join_via_hub(&hub, 2, "Guest", ParticipantRole::Member).await;
    wait_for!(ids_of(&host).await == vec![2] && ids_of(&guest).await == vec![1]);

    assert!(!guest.is_audio_muted().await);
    host.request_mute(2).await.expect("request mute");

    // The guest mutes without any local action and the state syncs back to
    // the host's roster view.
    wait_for!(guest.is_audio_muted().await);
    assert!(!guest.local_audio_track().await.is_enabled());
    wait_for!(host.participants()
            .await
            .iter()
            .any(|p| p.participant_id == 2 && p.is_muted));

    host.leave().await;
    guest.leave().await;
}

#[tokio::test]
async fn host_removal_terminates_target_session() {
    let hub = Hub::new();

    let host = join_via_hub(&hub, 1, "Host", ParticipantRole::Admin).await;
    let guest = join_via_hub(&hub, 2, "Guest", ParticipantRole::Member).await;
    let bystander = join_via_hub(&hub, 3, "Bystander", ParticipantRole::Member).await;
    wait_for!(ids_of(&host).await == vec![2, 3]
            && ids_of(&guest).await == vec![1, 3]
            && ids_of(&bystander).await == vec![1, 2]);

    host.request_remove(2).await.expect("request remove");

    wait_for!(guest.is_closed());
    assert!(guest.participants().await.is_empty());
    assert!(guest.local_audio_track().await.is_stopped());

    // The removal's leave-room propagates to everyone else.
    wait_for!(ids_of(&host).await == vec![3] && ids_of(&bystander).await == vec![1]);

    host.leave().await;
    bystander.leave().await;
}
