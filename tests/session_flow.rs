// Integration tests for the session server over loopback TCP.
//
// Each test binds its own server on port 0 and drives it with real
// `GameClient`s, covering pairing, a full round, teardown on disconnect,
// concurrent submission and the hardened request handling.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use rps_duel::network::ClientError;
use rps_duel::{GameClient, GameServer, Move, Outcome, PlayerSlot, ServerConfig};

const STEP: Duration = Duration::from_secs(5);

/// Bind a server on a free port and run its accept loop in the background.
async fn start_server(idle_timeout: Option<Duration>) -> (Arc<GameServer>, SocketAddr) {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        idle_timeout,
        ..Default::default()
    };
    let server = Arc::new(GameServer::bind(config).await.unwrap());
    let addr = server.local_addr().unwrap();

    let runner = server.clone();
    tokio::spawn(async move { runner.run().await });

    (server, addr)
}

async fn connect(addr: SocketAddr) -> GameClient {
    tokio::time::timeout(STEP, GameClient::connect(addr))
        .await
        .expect("connect timed out")
        .unwrap()
}

async fn within<T>(fut: impl Future<Output = T>) -> T {
    tokio::time::timeout(STEP, fut).await.expect("step timed out")
}

/// Poll until the server reports no live sessions.
async fn wait_for_no_sessions(server: &GameServer) {
    within(async {
        while server.session_count().await > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
}

#[tokio::test]
async fn full_round_between_two_players() {
    let (server, addr) = start_server(None).await;

    let mut a = connect(addr).await;
    assert_eq!(a.slot(), PlayerSlot::One);
    let snapshot = within(a.get()).await.unwrap();
    assert_eq!(snapshot.id, 0);
    assert!(!snapshot.is_ready());

    let mut b = connect(addr).await;
    assert_eq!(b.slot(), PlayerSlot::Two);
    assert!(within(a.get()).await.unwrap().is_ready());

    let after_a = within(a.play(Move::Rock)).await.unwrap();
    assert!(after_a.has_moved(PlayerSlot::One));
    assert!(!after_a.both_moved());

    let after_b = within(b.play(Move::Scissors)).await.unwrap();
    assert!(after_b.both_moved());

    let seen_by_a = within(a.get()).await.unwrap();
    assert!(seen_by_a.both_moved());
    assert_eq!(seen_by_a.resolve(), Some(Outcome::PlayerOneWins));
    assert_eq!(seen_by_a.get_move(PlayerSlot::Two), Some(Move::Scissors));

    let after_reset = within(b.reset()).await.unwrap();
    assert!(!after_reset.both_moved());
    assert_eq!(after_reset.wins(PlayerSlot::One), 1);

    assert!(!within(a.get()).await.unwrap().both_moved());
    assert!(!within(b.get()).await.unwrap().both_moved());

    assert_eq!(server.session_count().await, 1);
    assert_eq!(server.connection_count().await, 2);
}

#[tokio::test]
async fn arrivals_pair_in_order() {
    let (server, addr) = start_server(None).await;

    let mut clients = Vec::new();
    for arrival in 0..6u64 {
        let mut client = connect(addr).await;
        let expected_slot = if arrival % 2 == 0 { PlayerSlot::One } else { PlayerSlot::Two };
        assert_eq!(client.slot(), expected_slot, "arrival {}", arrival + 1);
        assert_eq!(within(client.get()).await.unwrap().id, arrival / 2);
        clients.push(client);
    }

    assert_eq!(server.session_count().await, 3);
}

#[tokio::test]
async fn disconnect_before_pairing_opens_new_session() {
    let (server, addr) = start_server(None).await;

    let a = connect(addr).await;
    assert_eq!(a.slot(), PlayerSlot::One);
    drop(a);
    wait_for_no_sessions(&server).await;

    let mut b = connect(addr).await;
    assert_eq!(b.slot(), PlayerSlot::One);
    let snapshot = within(b.get()).await.unwrap();
    assert_eq!(snapshot.id, 1);
    assert!(!snapshot.is_ready());
}

#[tokio::test]
async fn concurrent_moves_are_not_lost() {
    let (_server, addr) = start_server(None).await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    let mut rng = rand::thread_rng();

    for round in 0..25 {
        let move_a = *Move::ALL.choose(&mut rng).unwrap();
        let move_b = *Move::ALL.choose(&mut rng).unwrap();

        let (ra, rb) = within(async { tokio::join!(a.play(move_a), b.play(move_b)) }).await;
        ra.unwrap();
        rb.unwrap();

        for snapshot in [within(a.get()).await.unwrap(), within(b.get()).await.unwrap()] {
            assert!(snapshot.both_moved(), "round {}", round);
            assert_eq!(snapshot.get_move(PlayerSlot::One), Some(move_a));
            assert_eq!(snapshot.get_move(PlayerSlot::Two), Some(move_b));
        }

        within(a.reset()).await.unwrap();
    }

    let totals = within(b.get()).await.unwrap();
    assert_eq!(
        totals.wins(PlayerSlot::One) + totals.wins(PlayerSlot::Two) + totals.ties(),
        25
    );
}

#[tokio::test]
async fn rounds_tally_when_first_player_resets() {
    let (_server, addr) = start_server(None).await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    let rounds = [
        (Move::Rock, Move::Scissors),
        (Move::Paper, Move::Scissors),
        (Move::Paper, Move::Paper),
    ];

    for (played, (move_a, move_b)) in (1..).zip(rounds) {
        within(a.play(move_a)).await.unwrap();
        within(b.play(move_b)).await.unwrap();
        assert!(within(a.get()).await.unwrap().both_moved());

        let after_reset = within(a.reset()).await.unwrap();
        assert_eq!(after_reset.rounds_played(), played);

        // The second player sees the round close through the tally.
        let seen_by_b = within(b.get()).await.unwrap();
        assert_eq!(seen_by_b.rounds_played(), played);
        assert!(!seen_by_b.has_moved(PlayerSlot::Two));
    }

    let totals = within(b.get()).await.unwrap();
    assert_eq!(totals.wins(PlayerSlot::One), 1);
    assert_eq!(totals.wins(PlayerSlot::Two), 1);
    assert_eq!(totals.ties(), 1);
}

#[tokio::test]
async fn invalid_request_leaves_session_untouched() {
    let (_server, addr) = start_server(None).await;
    let mut a = connect(addr).await;
    let _b = connect(addr).await;

    let before = within(a.get()).await.unwrap();
    let after = within(a.send_raw(b"lizard")).await.unwrap();
    assert_eq!(after, before);
    assert!(!after.has_moved(PlayerSlot::One));

    // Connection stays usable.
    let played = within(a.send_raw(b"paper")).await.unwrap();
    assert_eq!(played.get_move(PlayerSlot::One), Some(Move::Paper));
}

#[tokio::test]
async fn undecodable_request_tears_down_pair() {
    let (server, addr) = start_server(None).await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;

    let err = within(a.send_raw(&[0xff, 0xfe])).await.unwrap_err();
    assert!(matches!(err, ClientError::ConnectionClosed), "got {err:?}");

    within(b.closed()).await.unwrap();
    wait_for_no_sessions(&server).await;
}

#[tokio::test]
async fn peer_disconnect_closes_survivor() {
    let (server, addr) = start_server(None).await;
    let a = connect(addr).await;
    let mut b = connect(addr).await;

    drop(a);
    within(b.closed()).await.unwrap();
    wait_for_no_sessions(&server).await;

    // The next arrival starts a fresh session.
    let mut c = connect(addr).await;
    assert_eq!(c.slot(), PlayerSlot::One);
    assert_eq!(within(c.get()).await.unwrap().id, 1);
}

#[tokio::test]
async fn idle_connection_is_closed() {
    let (server, addr) = start_server(Some(Duration::from_millis(200))).await;
    let mut a = connect(addr).await;
    assert_eq!(server.session_count().await, 1);

    within(a.closed()).await.unwrap();
    wait_for_no_sessions(&server).await;
}

#[tokio::test]
async fn shutdown_stops_handlers() {
    let (server, addr) = start_server(None).await;
    let mut a = connect(addr).await;

    server.shutdown();
    within(a.closed()).await.unwrap();
    wait_for_no_sessions(&server).await;
}
