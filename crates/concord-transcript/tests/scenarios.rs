//! Acknowledgment and validation scenarios on small hand-built transcripts.
//!
//! Members are numbered 50, 51 and 52.

use concord_transcript::{GraphError, Message, Transcript, TranscriptConfig, TranscriptError};
use std::collections::BTreeSet;

type T = Transcript<u32, u32>;

fn m(id: u32, author: u32, parents: &[u32], recipients: &[u32]) -> Message<u32, u32> {
    Message::new(id, author, parents.iter().copied(), recipients.iter().copied())
}

fn set(members: &[u32]) -> BTreeSet<u32> {
    members.iter().copied().collect()
}

fn checked() -> T {
    Transcript::with_config(TranscriptConfig {
        verify_invariants: true,
    })
}

fn assert_unackby(t: &T, expected: &[(u32, &[u32])]) {
    for (id, members) in expected {
        assert_eq!(t.unackby(id), Some(&set(members)), "unackby({})", id);
    }
}

#[test]
fn test_empty_transcript() {
    let mut t = checked();
    t.check_invariants().unwrap();
    t.add(m(0, 50, &[], &[])).unwrap();
    assert!(t.unackby(&0).unwrap().is_empty());
    assert!(t.unacked().is_empty());
}

#[test]
fn test_acknowledgment_smoke() {
    let mut t = checked();
    t.add(m(0, 50, &[], &[51, 52])).unwrap();
    t.add(m(1, 50, &[0], &[51, 52])).unwrap();
    t.add(m(2, 51, &[1], &[50, 52])).unwrap();
    t.add(m(3, 52, &[1], &[50, 51])).unwrap();
    t.add(m(4, 52, &[2, 3], &[50, 51])).unwrap();
    t.add(m(5, 50, &[3], &[51, 52])).unwrap();

    assert_unackby(
        &t,
        &[
            (0, &[]),
            (1, &[]),
            (2, &[50]),
            (3, &[51]),
            (4, &[50, 51]),
            (5, &[51, 52]),
        ],
    );
    assert_eq!(t.unacked(), vec![2, 3, 4, 5]);

    assert_eq!(t.add(m(6, 51, &[4], &[50, 52])).unwrap(), vec![3]);
    assert_unackby(
        &t,
        &[
            (0, &[]),
            (1, &[]),
            (2, &[50]),
            (3, &[]),
            (4, &[50]),
            (5, &[51, 52]),
            (6, &[50, 52]),
        ],
    );
    assert_eq!(t.unacked(), vec![2, 4, 5, 6]);

    // 52's latest is 4, which 0 does not follow.
    assert_eq!(
        t.add(m(7, 52, &[0], &[50, 51])),
        Err(TranscriptError::Graph(GraphError::ChainOrder { id: 7, previous: 4 }))
    );
    // 0 was already behind 52's latest message.
    assert_eq!(
        t.add(m(7, 52, &[0, 6], &[50, 51])),
        Err(TranscriptError::Graph(GraphError::Stale {
            id: 7,
            parent: 0,
            previous: 4
        }))
    );
    // 4 precedes 6.
    assert_eq!(
        t.add(m(7, 52, &[4, 6], &[50, 51])),
        Err(TranscriptError::Graph(GraphError::NotAntichain {
            id: 7,
            ancestor: 4,
            descendant: 6
        }))
    );

    assert_eq!(t.len(), 7);
    assert_eq!(t.all_authors(), &set(&[50, 51, 52]));
}

#[test]
fn test_parents_must_be_an_antichain() {
    let mut t = checked();
    t.add(m(0, 50, &[], &[51, 52])).unwrap();
    t.add(m(1, 51, &[0], &[50, 52])).unwrap();
    t.add(m(2, 52, &[1], &[50, 51])).unwrap();
    assert!(t.le(&0, &2));

    // 0 precedes 2, and 2 is 52's own latest message.
    assert_eq!(
        t.add(m(3, 52, &[0, 2], &[50, 51])),
        Err(TranscriptError::Graph(GraphError::Stale {
            id: 3,
            parent: 0,
            previous: 2
        }))
    );
    // Naming its own latest message next to a later one.
    assert_eq!(
        t.add(m(3, 51, &[1, 2], &[50, 52])),
        Err(TranscriptError::Graph(GraphError::NotAntichain {
            id: 3,
            ancestor: 1,
            descendant: 2
        }))
    );
    assert_eq!(t.len(), 3);
}

#[test]
fn test_parents_must_be_visible() {
    let mut t = checked();
    t.add(m(0, 50, &[], &[51, 52])).unwrap();
    t.add(m(1, 51, &[0], &[50, 52])).unwrap();
    t.add(m(2, 50, &[0], &[51])).unwrap();

    assert_eq!(
        t.add(m(3, 52, &[1, 2], &[50, 51])),
        Err(TranscriptError::NotVisible {
            id: 3,
            parent: 2,
            author: 52
        })
    );
    assert_eq!(
        t.add(m(3, 52, &[1, 9], &[50, 51])),
        Err(TranscriptError::Graph(GraphError::MissingParents(vec![9])))
    );
}

#[test]
fn test_acks_skip_messages_not_sent_to_the_author() {
    // 6 and 3 were never sent to 52, so 52's message 0 acknowledges 1, 2
    // and 4 but nothing reached only through 3 or 6.
    let mut t = checked();
    t.add(m(8, 50, &[], &[51, 52])).unwrap();
    t.add(m(6, 50, &[8], &[51])).unwrap();
    t.add(m(5, 51, &[8], &[50, 52])).unwrap();
    t.add(m(4, 50, &[6], &[51, 52])).unwrap();
    t.add(m(3, 51, &[4, 5], &[50])).unwrap();
    t.add(m(2, 50, &[4], &[51, 52])).unwrap();
    t.add(m(1, 51, &[2, 3], &[50, 52])).unwrap();
    assert_eq!(t.unacked(), vec![8, 5, 4, 3, 2, 1]);

    assert_eq!(t.add(m(0, 52, &[1], &[50, 51])).unwrap(), vec![4, 2]);
    assert_eq!(t.unacked(), vec![8, 5, 3, 1, 0]);
    assert_unackby(
        &t,
        &[
            (8, &[52]),
            (6, &[]),
            (5, &[50, 52]),
            (4, &[]),
            (3, &[50]),
            (2, &[]),
            (1, &[50]),
            (0, &[50, 51]),
        ],
    );
    assert_eq!(t.suc_ruid(&4, &52), Some(&0));
    assert_eq!(t.suc_ruid(&8, &52), None);
}

#[test]
fn test_concurrent_messages_do_not_acknowledge_each_other() {
    let mut t = checked();
    t.add(m(0, 50, &[], &[51, 52])).unwrap();
    t.add(m(1, 51, &[0], &[50, 52])).unwrap();
    t.add(m(2, 52, &[0], &[50, 51])).unwrap();

    assert_eq!(t.suc_ruid(&1, &52), None);
    assert_eq!(t.suc_ruid(&2, &51), None);
    assert_eq!(t.suc_ruid(&0, &51), Some(&1));
    assert_eq!(t.suc_ruid(&0, &52), Some(&2));
    assert_eq!(t.unacked(), vec![1, 2]);
}

#[test]
fn test_rejection_leaves_transcript_unchanged() {
    let mut t = checked();
    t.add(m(0, 50, &[], &[51])).unwrap();
    t.add(m(1, 51, &[0], &[50])).unwrap();

    let before = (t.ids().to_vec(), t.unacked(), t.heads());
    assert!(t.add(m(1, 50, &[0], &[51])).is_err());
    assert!(t.add(m(2, 50, &[], &[51])).is_err());
    assert!(t.add(m(2, 51, &[0], &[51])).is_err());
    assert_eq!(before, (t.ids().to_vec(), t.unacked(), t.heads()));
    t.check_invariants().unwrap();
}

/// Two members, each message merging both previous messages.
fn hell_transcript(half: u32) -> T {
    let mut t = Transcript::new();
    t.add(m(0, 50, &[], &[51])).unwrap();
    t.add(m(1, 50, &[0], &[51])).unwrap();
    t.add(m(2, 51, &[0], &[50])).unwrap();
    for i in 1..half {
        t.add(m(2 * i + 1, 50, &[2 * i - 1, 2 * i], &[51])).unwrap();
        t.add(m(2 * i + 2, 51, &[2 * i - 1, 2 * i], &[50])).unwrap();
    }
    t
}

#[test]
fn test_hell_graph_invariants() {
    let t = hell_transcript(256);
    t.check_invariants().unwrap();
    assert_eq!(t.unacked(), vec![511, 512]);
}

#[test]
fn test_large_transcript_without_recursion() {
    let t = hell_transcript(5000);
    assert_eq!(t.len(), 10_001);
    assert_eq!(t.merge_members([&9999, &10000]).unwrap(), set(&[50, 51]));
    assert_eq!(t.unacked(), vec![9999, 10000]);
}
