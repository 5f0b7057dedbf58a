use super::types::{CarId, IntersectionId, StreetId};

/// Errors raised while building the network or running the engine.
///
/// Construction errors describe input that parsed but does not form a valid
/// network. The remaining variants are invariant violations: they signal a bug
/// upstream and abort the run.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SimError {
    /// A street endpoint refers to an intersection the scenario never declared.
    #[error("street '{street}' references intersection {intersection} but only {count} exist")]
    IntersectionOutOfRange {
        street: String,
        intersection: usize,
        count: usize,
    },

    /// Two streets share a name.
    #[error("street '{name}' is declared more than once")]
    DuplicateStreet { name: String },

    /// A car path names a street that does not exist.
    #[error("car {car:?} follows unknown street '{name}'")]
    UnknownStreet { car: CarId, name: String },

    /// A car was declared without any street to drive on.
    #[error("car {car:?} has an empty path")]
    EmptyPath { car: CarId },

    /// Two consecutive streets of a path do not meet at an intersection.
    #[error("car {car:?} cannot drive from '{from}' onto '{to}'")]
    DisconnectedPath { car: CarId, from: String, to: String },

    /// A street id that is not part of the network.
    #[error("street {0:?} is not part of the network")]
    UnknownStreetId(StreetId),

    /// The scheduling policy granted a street that is not a candidate.
    #[error("intersection {intersection:?} granted {street:?}, which is not a candidate")]
    NotACandidate {
        intersection: IntersectionId,
        street: StreetId,
    },

    /// A released car wants a street that does not leave this intersection.
    #[error("car {car:?} at intersection {intersection:?} wants {street:?}, which is not outgoing")]
    NotOutgoing {
        intersection: IntersectionId,
        car: CarId,
        street: StreetId,
    },
}
