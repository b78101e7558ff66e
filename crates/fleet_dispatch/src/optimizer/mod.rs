use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    error::DispatchError,
    pool::{bus_depot::BusDepot, driver_hub::DriverHub},
    timetable::Timetable,
};

pub mod bruteforce;
pub mod genetic;
pub mod greedy;

use bruteforce::{Bruteforce, BruteforceParams};
use genetic::{Genetic, GeneticParams};
use greedy::{Greedy, GreedyParams};

/// Assigns a bus and a driver to the trips of a timetable, in place.
pub trait Optimizer: Send + Sync {
    fn optimize(
        &self,
        timetable: &Timetable,
        buses: &BusDepot,
        drivers: &DriverHub,
    ) -> Result<(), DispatchError>;
}

impl<O: Optimizer + ?Sized> Optimizer for Box<O> {
    fn optimize(
        &self,
        timetable: &Timetable,
        buses: &BusDepot,
        drivers: &DriverHub,
    ) -> Result<(), DispatchError> {
        (**self).optimize(timetable, buses, drivers)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum OptimizerKind {
    Bruteforce,
    Greedy,
    GeneticBruteforce,
    GeneticGreedy,
}

impl OptimizerKind {
    pub const ALL: [OptimizerKind; 4] = [
        OptimizerKind::Bruteforce,
        OptimizerKind::Greedy,
        OptimizerKind::GeneticBruteforce,
        OptimizerKind::GeneticGreedy,
    ];

    pub fn build(&self, params: &OptimizerParams) -> Box<dyn Optimizer> {
        let bruteforce = || Bruteforce::new(params.bruteforce.clone());
        let greedy = || Greedy::new(params.greedy.clone());

        match self {
            OptimizerKind::Bruteforce => Box::new(bruteforce()),
            OptimizerKind::Greedy => Box::new(greedy()),
            OptimizerKind::GeneticBruteforce => {
                Box::new(Genetic::new(bruteforce(), params.genetic.clone()))
            }
            OptimizerKind::GeneticGreedy => {
                Box::new(Genetic::new(greedy(), params.genetic.clone()))
            }
        }
    }
}

impl Display for OptimizerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptimizerKind::Bruteforce => write!(f, "bruteforce"),
            OptimizerKind::Greedy => write!(f, "greedy"),
            OptimizerKind::GeneticBruteforce => write!(f, "genetic-bruteforce"),
            OptimizerKind::GeneticGreedy => write!(f, "genetic-greedy"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown optimizer \"{0}\"")]
pub struct UnknownOptimizer(String);

impl FromStr for OptimizerKind {
    type Err = UnknownOptimizer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OptimizerKind::ALL
            .into_iter()
            .find(|kind| kind.to_string() == s)
            .ok_or_else(|| UnknownOptimizer(s.to_owned()))
    }
}

/// Parameters of every optimizer, so a single value can build any of them.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct OptimizerParams {
    pub bruteforce: BruteforceParams,
    pub greedy: GreedyParams,
    pub genetic: GeneticParams,
}
