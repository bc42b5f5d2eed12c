//! Minimal text client: joins a session, plays a number of rounds, prints the score.
//!
//! Slot 0 closes each round with `reset` once both moves are in; slot 1 waits
//! for the tally to move instead, so neither side can clear the other's next
//! move.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use rps_duel::{GameClient, Move, Outcome, PlayerSlot, Session, DEFAULT_HOST, DEFAULT_PORT};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Play rock-paper-scissors against whoever connects next
#[derive(Parser, Debug)]
#[command(name = "rps-duel-client")]
#[command(version)]
struct Args {
    /// Moves to throw (rock, paper or scissors), cycled across rounds
    #[arg(required = true, value_parser = parse_move)]
    throws: Vec<Move>,

    /// Number of rounds to play
    #[arg(short, long, default_value_t = 1)]
    rounds: u32,

    /// Server host
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

fn parse_move(s: &str) -> Result<Move, String> {
    s.parse::<Move>().map_err(|e| e.to_string())
}

/// Outcome of the round tallied between two snapshots.
fn tallied_outcome(before: &Session, after: &Session) -> Option<Outcome> {
    if after.wins(PlayerSlot::One) > before.wins(PlayerSlot::One) {
        Some(Outcome::PlayerOneWins)
    } else if after.wins(PlayerSlot::Two) > before.wins(PlayerSlot::Two) {
        Some(Outcome::PlayerTwoWins)
    } else if after.ties() > before.ties() {
        Some(Outcome::Tie)
    } else {
        None
    }
}

/// The opponent's move, recovered from our own move and the outcome.
///
/// The snapshot's copy may already hold the opponent's next move.
fn opponent_move(mine: Move, me: PlayerSlot, outcome: Outcome) -> Move {
    match outcome.winner() {
        None => mine,
        Some(winner) if winner == me => mine.beats(),
        Some(_) => mine.beats().beats(),
    }
}

/// Result line from one player's point of view.
fn verdict(outcome: Outcome, me: PlayerSlot) -> &'static str {
    match outcome.winner() {
        Some(winner) if winner == me => "You Won!",
        Some(_) => "You Lost...",
        None => "Tie Game!",
    }
}

async fn poll_until<F>(client: &mut GameClient, done: F) -> anyhow::Result<Session>
where
    F: Fn(&Session) -> bool,
{
    loop {
        let session = client.get().await.context("couldn't get game")?;
        if done(&session) {
            return Ok(session);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    let mut client = GameClient::connect(addr.as_str())
        .await
        .context("could not reach server")?;
    let me = client.slot();
    println!("You are player {}", me);

    let mut before = poll_until(&mut client, Session::is_ready).await?;
    info!("Session {} ready", before.id);

    let throws = args.throws.iter().copied().cycle().take(args.rounds as usize);
    for (round, mine) in (1..).zip(throws) {
        client.play(mine).await?;
        println!("Round {}: your move {} (locked in)", round, mine);

        let after = match me {
            PlayerSlot::One => {
                poll_until(&mut client, Session::both_moved).await?;
                client.reset().await.context("couldn't reset round")?
            }
            PlayerSlot::Two => {
                let target = before.rounds_played() + 1;
                poll_until(&mut client, |s| s.rounds_played() >= target).await?
            }
        };

        let outcome = tallied_outcome(&before, &after).context("round was not tallied")?;
        println!("Opponent: {}", opponent_move(mine, me, outcome));
        println!("{}", verdict(outcome, me));
        before = after;
    }

    println!(
        "Score: {} won, {} lost, {} tied",
        before.wins(me),
        before.wins(me.other()),
        before.ties()
    );

    Ok(())
}
