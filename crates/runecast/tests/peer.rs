//! End-to-end peer sessions over a real loopback channel pair.

use std::collections::VecDeque;
use std::time::Duration;

use runecast::{PeerCommand, PeerEvent, PeerSession, connect_local};
use runecast_engine::{Outcome, Roller};
use runecast_protocol::{DieFace, FaceName, GameMessage, Side};
use runecast_transport::Connection;

/// Replays a fixed sequence of rolls.
struct ScriptedRoller {
    rolls: VecDeque<Vec<DieFace>>,
}

impl ScriptedRoller {
    fn new(rolls: &[[FaceName; 6]]) -> Self {
        Self {
            rolls: rolls
                .iter()
                .map(|names| names.iter().map(|&n| DieFace::new(n)).collect())
                .collect(),
        }
    }
}

impl Roller for ScriptedRoller {
    async fn roll(&mut self, _n: usize) -> Vec<DieFace> {
        self.rolls.pop_front().expect("script ran out of rolls")
    }
}

/// Drains events until one matches, failing the test after 5 seconds.
async fn wait_for<F>(session: &mut PeerSession, mut matches: F) -> PeerEvent
where
    F: FnMut(&PeerEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = session.next_event().await.expect("session ended");
            if matches(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

#[tokio::test]
async fn full_round_over_loopback() {
    let (host_conn, guest_conn) = connect_local().await.unwrap();

    // Host keeps three attacks; guest keeps one defense and two steals.
    let host_roller = ScriptedRoller::new(&[[
        FaceName::Axe,
        FaceName::Axe,
        FaceName::Axe,
        FaceName::Helmet,
        FaceName::Helmet,
        FaceName::Helmet,
    ]]);
    let guest_roller = ScriptedRoller::new(&[[
        FaceName::Helmet,
        FaceName::Hand,
        FaceName::Hand,
        FaceName::Shield,
        FaceName::Shield,
        FaceName::Shield,
    ]]);

    let mut host = PeerSession::spawn_with_roller(host_conn, true, host_roller);
    let mut guest = PeerSession::spawn_with_roller(guest_conn, false, guest_roller);

    assert_eq!(
        wait_for(&mut host, |e| matches!(e, PeerEvent::Connected { .. })).await,
        PeerEvent::Connected { is_host: true }
    );
    assert_eq!(
        wait_for(&mut guest, |e| matches!(e, PeerEvent::Connected { .. })).await,
        PeerEvent::Connected { is_host: false }
    );

    host.command(PeerCommand::Roll);
    host.command(PeerCommand::KeepDice);
    guest.command(PeerCommand::Roll);
    guest.command(PeerCommand::KeepDice);

    let host_report =
        match wait_for(&mut host, |e| matches!(e, PeerEvent::RoundResolved(_))).await {
            PeerEvent::RoundResolved(report) => report,
            _ => unreachable!(),
        };
    let guest_report =
        match wait_for(&mut guest, |e| matches!(e, PeerEvent::RoundResolved(_))).await {
            PeerEvent::RoundResolved(report) => report,
            _ => unreachable!(),
        };

    // 3 attacks against 1 defense.
    assert_eq!(host_report.damage_dealt, 2);
    assert_eq!(host_report.damage_taken, 0);
    // Mirror image on the other peer.
    assert_eq!(guest_report.damage_dealt, 0);
    assert_eq!(guest_report.damage_taken, 2);

    // Both copies agree on the post-round health values.
    let host_state = match wait_for(&mut host, |e| {
        matches!(e, PeerEvent::StateChanged(s) if s.opponent_health == 13)
    })
    .await
    {
        PeerEvent::StateChanged(state) => state,
        _ => unreachable!(),
    };
    assert_eq!(host_state.player_health, 15);

    let guest_state = match wait_for(&mut guest, |e| {
        matches!(e, PeerEvent::StateChanged(s) if s.player_health == 13)
    })
    .await
    {
        PeerEvent::StateChanged(state) => state,
        _ => unreachable!(),
    };
    assert_eq!(guest_state.opponent_health, 15);
}

#[tokio::test]
async fn connected_fires_exactly_once() {
    let (host_conn, guest_conn) = connect_local().await.unwrap();
    let mut host = PeerSession::spawn(host_conn, true);
    let _guest = PeerSession::spawn(guest_conn, false);

    wait_for(&mut host, |e| matches!(e, PeerEvent::Connected { .. })).await;

    // Drain whatever else the session emits in the first moments; a
    // second Connected would be a bug.
    let extra = tokio::time::timeout(Duration::from_millis(300), async {
        while let Some(event) = host.next_event().await {
            if matches!(event, PeerEvent::Connected { .. }) {
                return true;
            }
        }
        false
    })
    .await
    .unwrap_or(false);
    assert!(!extra, "Connected fired twice");
}

#[tokio::test]
async fn malformed_frames_are_dropped_not_fatal() {
    let (host_conn, guest_conn) = connect_local().await.unwrap();
    let mut host = PeerSession::spawn(host_conn, true);
    wait_for(&mut host, |e| matches!(e, PeerEvent::Connected { .. })).await;

    guest_conn.send(br#"{"type":"unknown"}"#).await.unwrap();
    guest_conn.send(b"not json at all").await.unwrap();

    // A well-formed roll after the garbage still lands.
    let roll = GameMessage::DiceRoll {
        dice: vec![DieFace::new(FaceName::Prayer); 6],
    };
    guest_conn
        .send(&serde_json::to_vec(&roll).unwrap())
        .await
        .unwrap();

    let state = match wait_for(&mut host, |e| {
        matches!(e, PeerEvent::StateChanged(s) if s.opponent_dice.len() == 6)
    })
    .await
    {
        PeerEvent::StateChanged(state) => state,
        _ => unreachable!(),
    };
    assert!(state.outcome.is_none());
}

#[tokio::test]
async fn remote_game_over_surfaces_locally() {
    let (host_conn, guest_conn) = connect_local().await.unwrap();
    let mut host = PeerSession::spawn(host_conn, true);
    wait_for(&mut host, |e| matches!(e, PeerEvent::Connected { .. })).await;

    let msg = GameMessage::GameOver {
        winner: Side::Player,
    };
    guest_conn
        .send(&serde_json::to_vec(&msg).unwrap())
        .await
        .unwrap();

    let event = wait_for(&mut host, |e| matches!(e, PeerEvent::GameOver(_))).await;
    assert_eq!(event, PeerEvent::GameOver(Outcome::OpponentWins));
}

#[tokio::test]
async fn channel_close_is_terminal() {
    let (host_conn, guest_conn) = connect_local().await.unwrap();
    let mut host = PeerSession::spawn(host_conn, true);
    wait_for(&mut host, |e| matches!(e, PeerEvent::Connected { .. })).await;

    guest_conn.close().await.unwrap();

    wait_for(&mut host, |e| matches!(e, PeerEvent::ConnectionLost)).await;
    // The session loop has exited; the event stream ends.
    assert!(host.next_event().await.is_none());
}
