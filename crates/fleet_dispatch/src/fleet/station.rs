use serde::{Deserialize, Serialize};

use crate::define_id_newtype;

define_id_newtype!(StationId);

/// A stop on a route. Terminal stations are the boarding/alighting termini
/// shared between routes, the others are intermediate stops.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Station {
    id: StationId,
    name: String,
    is_terminal: bool,
}

impl Station {
    pub fn new(name: impl Into<String>, is_terminal: bool) -> Self {
        Station {
            id: StationId::new(),
            name: name.into(),
            is_terminal,
        }
    }

    pub fn terminal(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }

    pub fn stop(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    pub fn id(&self) -> StationId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_terminal(&self) -> bool {
        self.is_terminal
    }
}
