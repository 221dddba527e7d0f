use serde::Serialize;

use crate::entities::Coordinate;

/// Path geometry in traversal order, as returned by the routing service.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Route {
    pub path: Vec<Coordinate>,
    /// Meters, when the provider reports it.
    pub distance: Option<f64>,
    /// Seconds, when the provider reports it.
    pub duration: Option<f64>,
}

impl Route {
    pub fn new(path: Vec<Coordinate>) -> Self {
        Self {
            path,
            distance: None,
            duration: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }
}
