//! Place search state
//!
//! Every request takes a generation number; a response only lands if its
//! generation is still current, so a slow answer to an old query can never
//! overwrite newer results.

use dayplan_model::PlaceResult;

/// Query, results and in-flight marker
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    query: String,
    results: Vec<PlaceResult>,
    in_flight: bool,
    generation: u64,
}

impl SearchState {
    /// Last submitted query
    #[inline]
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Current results
    #[inline]
    #[must_use]
    pub fn results(&self) -> &[PlaceResult] {
        &self.results
    }

    /// Whether a request is outstanding
    #[inline]
    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Current generation
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a request, invalidating any outstanding one
    pub(crate) fn begin(&mut self, query: &str) -> u64 {
        self.generation += 1;
        self.query = query.to_string();
        self.in_flight = true;
        self.generation
    }

    /// Record a query that needs no request
    pub(crate) fn skip(&mut self, query: &str) {
        self.generation += 1;
        self.query = query.to_string();
        self.results.clear();
        self.in_flight = false;
    }

    /// Install results; returns false for a stale generation
    pub(crate) fn complete(&mut self, generation: u64, results: Vec<PlaceResult>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.results = results;
        self.in_flight = false;
        true
    }

    /// Degrade to an empty list; returns false for a stale generation
    pub(crate) fn fail(&mut self, generation: u64) -> bool {
        self.complete(generation, Vec::new())
    }

    /// Drop outstanding requests and results
    pub(crate) fn cancel(&mut self) {
        self.generation += 1;
        self.query.clear();
        self.results.clear();
        self.in_flight = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dayplan_model::{Coordinates, PlaceId};

    fn place(id: &str) -> PlaceResult {
        PlaceResult {
            id: PlaceId::new(id).unwrap(),
            name: id.to_string(),
            coordinates: Coordinates::new(0.0, 0.0),
            category: "cafe".to_string(),
            rating: None,
            price_tier: None,
            address: None,
            photo_ref: None,
            city: None,
        }
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut search = SearchState::default();
        let first = search.begin("caf");
        let second = search.begin("cafe");

        assert!(search.complete(second, vec![place("new")]));
        assert!(!search.complete(first, vec![place("old")]));
        assert_eq!(search.results()[0].id.as_str(), "new");
        assert_eq!(search.query(), "cafe");
    }

    #[test]
    fn cancel_invalidates_in_flight() {
        let mut search = SearchState::default();
        let generation = search.begin("museum");
        search.cancel();

        assert!(!search.in_flight());
        assert!(!search.complete(generation, vec![place("late")]));
        assert!(search.results().is_empty());
    }

    #[test]
    fn failure_clears_results() {
        let mut search = SearchState::default();
        let generation = search.begin("bar");
        search.complete(generation, vec![place("a")]);

        let generation = search.begin("bars");
        assert!(search.fail(generation));
        assert!(search.results().is_empty());
        assert!(!search.in_flight());
    }

    #[test]
    fn skip_clears_without_request() {
        let mut search = SearchState::default();
        let generation = search.begin("tapas");
        search.skip("t");
        assert!(!search.in_flight());
        assert!(!search.complete(generation, vec![place("x")]));
        assert_eq!(search.query(), "t");
    }
}
