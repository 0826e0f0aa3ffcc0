// Domain layer: pure game rules and data, no I/O, no async.

pub mod drawing;
pub mod events;
pub mod hint;
pub mod lobby_state;
pub mod normalize;
pub mod player;
pub mod rank;
pub mod scoring;
pub mod words;
