//! Terminal front end for a runecast duel.
//!
//! Three modes:
//!   duel host           print an offer token, paste the answer back
//!   duel join <token>   answer an offer, print the answer token
//!   duel solo           play against the scripted stand-in
//!
//! In-game keys (each followed by enter): `r` rolls, `1`-`6` toggles
//! a die, `k` keeps the selection, `q` quits.

use tokio::io::{AsyncBufReadExt, BufReader};

use runecast::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("host") => host().await?,
        Some("join") => {
            let token = args.next().ok_or("join needs a token argument")?;
            join(&token).await?;
        }
        Some("solo") => play(Session::Solo(SoloSession::spawn())).await,
        _ => {
            eprintln!("usage: duel host | duel join <token> | duel solo");
            std::process::exit(2);
        }
    }
    Ok(())
}

async fn host() -> Result<(), RunecastError> {
    let (mut exchange, offer) = HostExchange::create_offer(SignalConfig::default()).await?;
    println!("send this offer token to your opponent:\n\n{}\n", offer.encode());
    println!("paste their answer token and press enter:");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let line = loop {
        match lines.next_line().await.map_err(|e| {
            runecast::signal::SignalError::Handshake(e.to_string())
        })? {
            Some(line) if !line.trim().is_empty() => break line,
            Some(_) => continue,
            None => return Ok(()),
        }
    };
    let answer = SignalToken::decode(&line)?;
    println!("waiting for your opponent to connect...");
    let conn = exchange.accept_answer(&answer).await?;

    play(Session::Peer(PeerSession::spawn(conn, true))).await;
    Ok(())
}

async fn join(token: &str) -> Result<(), RunecastError> {
    let offer = SignalToken::decode(token)?;
    let mut exchange = GuestExchange::new(SignalConfig::default());
    exchange.accept_offer(offer)?;
    let (answer, pending) = exchange.create_answer().await?;
    println!("send this answer token back to the host:\n\n{}\n", answer.encode());
    println!("connecting...");
    let conn = pending.established().await?;

    play(Session::Peer(PeerSession::spawn(conn, false))).await;
    Ok(())
}

/// Either flavor of session behind one surface for the play loop.
enum Session {
    Peer(PeerSession),
    Solo(SoloSession),
}

impl Session {
    fn command(&self, cmd: PeerCommand) {
        match self {
            Session::Peer(s) => s.command(cmd),
            Session::Solo(s) => s.command(cmd),
        }
    }

    async fn next_event(&mut self) -> Option<PeerEvent> {
        match self {
            Session::Peer(s) => s.next_event().await,
            Session::Solo(s) => s.next_event().await,
        }
    }
}

enum Input {
    Line(Option<String>),
    Event(Option<PeerEvent>),
}

async fn play(mut session: Session) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let input = tokio::select! {
            line = lines.next_line() => Input::Line(line.unwrap_or(None)),
            event = session.next_event() => Input::Event(event),
        };
        match input {
            Input::Line(Some(line)) => {
                if !dispatch(&session, line.trim()) {
                    break;
                }
            }
            Input::Event(Some(event)) => render(&event),
            // Stdin closed or the session ended.
            Input::Line(None) | Input::Event(None) => break,
        }
    }
}

/// Maps one input line to a command. Returns `false` on quit.
fn dispatch(session: &Session, input: &str) -> bool {
    match input {
        "q" => return false,
        "r" => session.command(PeerCommand::Roll),
        "k" => session.command(PeerCommand::KeepDice),
        "" => {}
        other => match other.parse::<usize>() {
            Ok(n) if (1..=6).contains(&n) => {
                session.command(PeerCommand::ToggleDie(n - 1));
            }
            _ => println!("keys: r = roll, 1-6 = toggle die, k = keep, q = quit"),
        },
    }
    true
}

fn render(event: &PeerEvent) {
    match event {
        PeerEvent::Connected { is_host } => {
            let seat = if *is_host { "host" } else { "guest" };
            println!("connected as {seat}");
        }
        PeerEvent::Status(status) => println!("-- {status}"),
        PeerEvent::StateChanged(state) => render_state(state),
        PeerEvent::RoundResolved(report) => {
            println!(
                "round {}: dealt {}, took {}, stole {}, lost {}, gained {} tokens",
                report.round,
                report.damage_dealt,
                report.damage_taken,
                report.tokens_stolen,
                report.tokens_lost,
                report.tokens_gained,
            );
        }
        PeerEvent::GameOver(outcome) => {
            let line = match outcome {
                Outcome::PlayerWins => "you win!",
                Outcome::OpponentWins => "you lose.",
                Outcome::Tie => "a tie.",
            };
            println!("== game over: {line}");
        }
        PeerEvent::ConnectionLost => {
            println!("connection lost; start a new game to play again");
        }
    }
}

fn render_state(state: &GameState) {
    println!(
        "you {:>2} hp {:>2} tokens | foe {:>2} hp {:>2} tokens",
        state.player_health, state.player_tokens, state.opponent_health, state.opponent_tokens,
    );
    if !state.player_dice.is_empty() {
        let dice: Vec<String> = state
            .player_dice
            .iter()
            .enumerate()
            .map(|(i, die)| {
                let mark = if state.selected_indices().contains(&i) {
                    "*"
                } else {
                    ""
                };
                format!("[{}]{:?}{}", i + 1, die.name, mark)
            })
            .collect();
        println!("your dice: {}", dice.join(" "));
    }
    if !state.opponent_selection().is_empty() {
        let kept: Vec<String> = state
            .opponent_selection()
            .iter()
            .map(|die| format!("{:?}", die.name))
            .collect();
        println!("foe kept: {}", kept.join(" "));
    }
}
