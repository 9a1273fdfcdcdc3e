//! Top-K nearest attraction selection.
//!
//! Every attraction is measured once and pushed through a bounded max-heap
//! holding the K best candidates seen so far, so a query is O(n log K).
//! Ties on distance keep catalog order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::domain::{Attraction, Location, NearbyAttraction};

use super::distance::distance_miles;

/// Number of attractions returned by a nearby query
pub const NEARBY_ATTRACTIONS_LIMIT: usize = 5;

/// An attraction selected by [`nearest`], with its distance from the reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked<'a> {
    pub attraction: &'a Attraction,
    pub distance: f64,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: f64,
    index: usize,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.index.cmp(&other.index))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// The `limit` attractions closest to `reference`, closest first.
pub fn nearest<'a>(reference: &Location, attractions: &'a [Attraction], limit: usize) -> Vec<Ranked<'a>> {
    if limit == 0 {
        return Vec::new();
    }

    // Max-heap: the top is the worst candidate currently kept
    let mut heap = BinaryHeap::with_capacity(limit.min(attractions.len()) + 1);

    for (index, attraction) in attractions.iter().enumerate() {
        let candidate = Candidate {
            distance: distance_miles(reference, &attraction.location()),
            index,
        };

        if heap.len() < limit {
            heap.push(candidate);
        } else if heap.peek().is_some_and(|worst| candidate < *worst) {
            heap.pop();
            heap.push(candidate);
        }
    }

    heap.into_sorted_vec()
        .into_iter()
        .map(|c| Ranked {
            attraction: &attractions[c.index],
            distance: c.distance,
        })
        .collect()
}

/// Rank the five attractions closest to `reference`.
///
/// `reward_points` is only consulted for the selected attractions.
pub fn rank<F>(reference: &Location, attractions: &[Attraction], mut reward_points: F) -> Vec<NearbyAttraction>
where
    F: FnMut(&Attraction) -> i32,
{
    nearest(reference, attractions, NEARBY_ATTRACTIONS_LIMIT)
        .into_iter()
        .map(|ranked| to_nearby(reference, ranked, reward_points(ranked.attraction)))
        .collect()
}

/// Build the answer entry for a ranked attraction
pub fn to_nearby(reference: &Location, ranked: Ranked<'_>, reward_points: i32) -> NearbyAttraction {
    NearbyAttraction {
        attraction_name: ranked.attraction.attraction_name.clone(),
        attraction_location: ranked.attraction.location(),
        user_location: *reference,
        distance: ranked.distance,
        reward_points,
    }
}
