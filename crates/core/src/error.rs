use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompassError {
    #[error("Unknown archetype: {0}")]
    UnknownArchetype(String),
}
