//! System chat announcements posted by the coordinator

pub fn joined(name: &str) -> String {
    format!("{name} joined the game")
}

pub fn left(name: &str) -> String {
    format!("{name} left the game")
}

pub fn eliminated(name: &str) -> String {
    format!("{name} was eliminated")
}

pub fn timed_out(name: &str) -> String {
    format!("{name} ran out of time and was eliminated")
}

pub fn game_started() -> String {
    "The game has started!".to_string()
}

pub fn new_round(round: u32) -> String {
    format!("New round! Round {round}")
}

pub fn winner(name: &str) -> String {
    format!("{name} has won the game!")
}

pub fn no_winner() -> String {
    "No one survived.".to_string()
}
