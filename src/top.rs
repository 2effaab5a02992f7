//! Ranking of the final word statistics

use crate::stats::{Ranked, WordStat};
use rayon::prelude::*;
use std::{collections::BinaryHeap, num::NonZeroUsize};

/// Order words by decreasing frequency, alphabetically for equal frequencies,
/// and only keep the `max_outputs` most frequent ones if requested
pub fn rank(stats: Vec<WordStat>, max_outputs: Option<NonZeroUsize>) -> Vec<WordStat> {
    let Some(max_len) = max_outputs.map(NonZeroUsize::get) else {
        // Without a limit on the output size, sort everything
        let mut sorted = stats;
        sorted.par_sort_unstable_by(WordStat::rank_cmp);
        return sorted;
    };

    // Find the top words up to this limit
    let top_stats = stats
        .into_par_iter()
        .map(Ranked)
        // First determine top words on each thread using a heap whose top is
        // the worst word seen so far...
        .fold(
            || BinaryHeap::with_capacity(max_len + 1),
            |mut heap, ranked| {
                heap.push(ranked);
                if heap.len() > max_len {
                    heap.pop();
                }
                heap
            },
        )
        // ...then merge thread results into a global result
        .reduce(BinaryHeap::new, |heap1, heap2| {
            let (mut dst, src) = if heap1.len() >= heap2.len() {
                (heap1, heap2)
            } else {
                (heap2, heap1)
            };
            for ranked in src {
                dst.push(ranked);
                if dst.len() > max_len {
                    dst.pop();
                }
            }
            dst
        });

    // Sorted vec of a heap is in increasing order, i.e. best word first
    top_stats
        .into_sorted_vec()
        .into_iter()
        .map(|Ranked(stat)| stat)
        .collect()
}
