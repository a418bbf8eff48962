//! Request queue ordering.
//!
//! Song requests for an event are played in arrival order. Positions are
//! recomputed from scratch on every change, so they are always 1-based and
//! gap-free regardless of how the set was edited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A song request waiting in an event's queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedRequest {
    pub id: i64,
    pub song_id: i64,
    pub requested_at: DateTime<Utc>,
    /// 1-based; 0 until [`assign_positions`] runs
    pub position: u32,
}

/// Sort requests by arrival (ties broken by id) and number them from 1.
pub fn assign_positions(requests: &mut [QueuedRequest]) {
    requests.sort_by(|a, b| a.requested_at.cmp(&b.requested_at).then(a.id.cmp(&b.id)));
    for (index, request) in requests.iter_mut().enumerate() {
        request.position = index as u32 + 1;
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn requests(offsets: Vec<i64>) -> Vec<QueuedRequest> {
        offsets
            .into_iter()
            .enumerate()
            .map(|(i, secs)| QueuedRequest {
                id: i as i64,
                song_id: 1,
                requested_at: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
                position: 0,
            })
            .collect()
    }

    proptest! {
        /// Positions are exactly 1..=n in timestamp order.
        #[test]
        fn positions_are_gap_free(offsets in prop::collection::vec(0i64..10_000, 0..50)) {
            let mut queue = requests(offsets);
            assign_positions(&mut queue);

            for (index, request) in queue.iter().enumerate() {
                prop_assert_eq!(request.position as usize, index + 1);
            }
            for pair in queue.windows(2) {
                prop_assert!(pair[0].requested_at <= pair[1].requested_at);
            }
        }

        /// Reordering the same set gives the same positions.
        #[test]
        fn ordering_is_stable_under_shuffles(
            offsets in prop::collection::vec(0i64..100, 1..30),
            rotate in 0usize..30,
        ) {
            let mut first = requests(offsets);
            assign_positions(&mut first);

            let mut second = first.clone();
            let len = second.len();
            second.rotate_left(rotate % len);
            second.reverse();
            assign_positions(&mut second);

            prop_assert_eq!(first, second);
        }
    }
}
