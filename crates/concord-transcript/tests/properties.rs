//! Property-based tests for acknowledgment tracking.
//!
//! Transcripts are grown from random steps. Each step picks an author, a
//! subset of the other members as recipients, and a subset of the current
//! heads visible to the author as parents; the author's own latest message
//! is added when no chosen head already follows it. Every step is valid.

use concord_transcript::{Message, Transcript, TranscriptConfig};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashSet, VecDeque};

const MEMBERS: u8 = 4;

type Step = (u8, u8, u64);
type T = Transcript<u32, u8>;

fn steps_strategy() -> impl Strategy<Value = Vec<Step>> {
    prop::collection::vec((0..MEMBERS, any::<u8>(), any::<u64>()), 1..40)
}

fn next_message(t: &T, id: u32, (author, recipient_mask, parent_mask): Step) -> Message<u32, u8> {
    let recipients: Vec<u8> = (0..MEMBERS)
        .filter(|&r| r != author && recipient_mask & (1 << r) != 0)
        .collect();

    let mut parents: Vec<u32> = t
        .heads()
        .into_iter()
        .filter(|h| t.get(h).map_or(false, |msg| msg.is_visible_to(&author)))
        .enumerate()
        .filter(|(bit, _)| parent_mask & (1 << (bit % 64)) != 0)
        .map(|(_, h)| h)
        .collect();

    if let Some(last) = t.last_by(&author).copied() {
        if !parents.iter().any(|p| t.le(&last, p)) {
            parents.push(last);
        }
    }
    Message::new(id, author, parents, recipients)
}

fn grow(steps: &[Step]) -> T {
    let mut t = Transcript::with_config(TranscriptConfig {
        verify_invariants: true,
    });
    for (i, step) in steps.iter().enumerate() {
        let msg = next_message(&t, i as u32, *step);
        t.add(msg).expect("generated step is valid");
    }
    t
}

/// Every (message, member) pair acknowledged by some message of `member`,
/// found by walking without any pruning.
fn acknowledged_pairs(t: &T) -> HashSet<(u32, u8)> {
    let mut acked = HashSet::new();
    for n in t.ids() {
        let Some(msg) = t.get(n) else { continue };
        let author = msg.author;
        let mut seen = HashSet::new();
        let mut queue: VecDeque<u32> = msg.parents.iter().copied().collect();
        while let Some(x) = queue.pop_front() {
            if !seen.insert(x) {
                continue;
            }
            let Some(parent) = t.get(&x) else { continue };
            if parent.recipients.contains(&author) {
                acked.insert((x, author));
                queue.extend(parent.parents.iter().copied());
            }
        }
    }
    acked
}

proptest! {
    #[test]
    fn unackby_matches_unpruned_walk(steps in steps_strategy()) {
        let t = grow(&steps);
        let acked = acknowledged_pairs(&t);
        for id in t.ids() {
            let msg = t.get(id).unwrap();
            let expected: BTreeSet<u8> = msg
                .recipients
                .iter()
                .filter(|r| !acked.contains(&(*id, **r)))
                .copied()
                .collect();
            prop_assert_eq!(t.unackby(id), Some(&expected), "unackby({})", id);
        }
    }

    #[test]
    fn acknowledgment_is_monotonic(steps in steps_strategy()) {
        let mut t = Transcript::new();
        let mut done: BTreeSet<u32> = BTreeSet::new();
        for (i, step) in steps.iter().enumerate() {
            let msg = next_message(&t, i as u32, *step);
            let newly = t.add(msg).unwrap();
            for id in &newly {
                prop_assert!(done.insert(*id), "{} acknowledged twice", id);
            }
            for id in &done {
                prop_assert!(t.unackby(id).unwrap().is_empty());
            }
        }
    }

    #[test]
    fn unacked_follows_insertion_order(steps in steps_strategy()) {
        let t = grow(&steps);
        let positions: Vec<usize> = t
            .unacked()
            .iter()
            .map(|id| t.ids().iter().position(|x| x == id).unwrap())
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn refused_messages_change_nothing(steps in steps_strategy(), author in 0..MEMBERS) {
        let mut t = grow(&steps);
        let before = (t.ids().to_vec(), t.unacked(), t.heads(), t.all_authors().clone());

        let duplicate = Message::new(0, author, Vec::<u32>::new(), Vec::<u8>::new());
        prop_assert!(t.add(duplicate).is_err());
        let self_addressed = Message::new(1_000, author, t.heads(), vec![author]);
        prop_assert!(t.add(self_addressed).is_err());
        let dangling = Message::new(1_000, author, vec![5_000], Vec::<u8>::new());
        prop_assert!(t.add(dangling).is_err());

        prop_assert_eq!(before, (t.ids().to_vec(), t.unacked(), t.heads(), t.all_authors().clone()));
    }

    #[test]
    fn merge_members_of_heads_is_all_authors(steps in steps_strategy()) {
        let t = grow(&steps);
        let heads = t.heads();
        prop_assert_eq!(&t.merge_members(&heads).unwrap(), t.all_authors());
    }
}
