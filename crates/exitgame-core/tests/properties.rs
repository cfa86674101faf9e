//! Ordering, payout-once, sticky invalidation, maturity gating, and
//! no-op-on-rejection guarantees.

mod common;

use common::{BOND, DELAY, Harness, alice, bob, carol, challenge};
use exitgame_core::{FinalizeState, StartExit};
use exitgame_types::{Address, ExitGameError, ExitId, OutputCoordinate, Transaction, U256};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

/// Owner of the `i`-th funded output in [`fund_grid`].
fn owner(i: usize) -> Address {
    Address::repeat(u8::try_from(i + 1).unwrap())
}

/// Commit `blocks` blocks of `per_block` funding transactions each.
fn fund_grid(h: &Harness, blocks: u32, per_block: usize) -> Vec<common::Committed> {
    let mut all = Vec::new();
    for b in 1..=blocks {
        let offset = all.len();
        let txs: Vec<Transaction> = (0..per_block)
            .map(|i| Transaction::fund(owner(offset + i), 100))
            .collect();
        all.extend(h.commit_block(b, &txs));
    }
    all
}

// ============================================================
// Priority ordering
// ============================================================

#[test]
fn settlement_order_ignores_submission_order() {
    for seed in 0..8u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut h = Harness::new();
        let grid = fund_grid(&h, 4, 3);

        let mut order: Vec<usize> = (0..grid.len()).collect();
        order.shuffle(&mut rng);

        let mut by_coordinate = Vec::new();
        for i in order {
            h.clock.advance(rng.gen_range(0..3_600));
            let exit_id = h.start(&grid[i], owner(i));
            by_coordinate.push((grid[i].output(0), exit_id));
        }
        by_coordinate.sort();

        h.mature();
        let report = h.game.finalize_exits(grid.len()).unwrap();
        let popped: Vec<ExitId> = report.outcomes.iter().map(|(id, _)| *id).collect();
        let expected: Vec<ExitId> = by_coordinate.iter().map(|(_, id)| *id).collect();
        assert_eq!(popped, expected, "seed {seed}");
    }
}

#[test]
fn pending_exits_are_listed_in_settlement_order() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut h = Harness::new();
    let grid = fund_grid(&h, 3, 4);

    let mut order: Vec<usize> = (0..grid.len()).collect();
    order.shuffle(&mut rng);
    for i in order {
        h.start(&grid[i], owner(i));
    }

    let pending = h.game.pending_exits();
    assert_eq!(pending.len(), grid.len());
    assert!(pending.windows(2).all(|w| w[0].0 < w[1].0));
    let coordinates: Vec<OutputCoordinate> = pending.iter().map(|(p, _)| p.coordinate()).collect();
    let expected: Vec<OutputCoordinate> = grid.iter().map(|c| c.output(0)).collect();
    assert_eq!(coordinates, expected);
}

// ============================================================
// Payout at most once
// ============================================================

#[test]
fn settled_exit_is_never_paid_again() {
    let mut h = Harness::new();
    let fund = &h.commit_block(1, &[Transaction::fund(alice(), 100)]).remove(0);
    let exit_id = h.start(fund, alice());
    h.mature();
    h.game.finalize_exits(5).unwrap();
    assert_eq!(h.ledger.transfer_count(), 1);

    let err = h.game.finalize_exits(5).unwrap_err();
    assert!(matches!(
        err,
        ExitGameError::NothingToFinalize {
            queue_len: 0,
            head_matures_at: None
        }
    ));

    // Re-submitting the same claim is a duplicate, not a fresh exit.
    let req = h.start_request(fund, 0, alice());
    let err = h.game.start_exit(req).unwrap_err();
    assert!(matches!(err, ExitGameError::DuplicateExit(id) if id == exit_id));

    h.mature();
    assert!(h.game.finalize_exits(5).is_err());
    assert_eq!(h.ledger.transfer_count(), 1);
    assert_eq!(h.ledger.balance(&alice()), U256::from(100 + BOND));
}

#[test]
fn challenge_after_settlement_is_rejected() {
    let mut h = Harness::new();
    let fund = &h.commit_block(1, &[Transaction::fund(alice(), 100)]).remove(0);
    let exit_id = h.start(fund, alice());
    h.mature();
    h.game.finalize_exits(1).unwrap();

    let spend = &h
        .commit_block(2, &[Transaction::split(fund.output(0), bob(), 100)])
        .remove(0);
    let err = h
        .game
        .challenge_spent_exit(challenge(exit_id, spend, 0))
        .unwrap_err();
    assert!(matches!(err, ExitGameError::ExitAlreadyFinalized(id) if id == exit_id));
    assert!(h.game.is_successful_exit(&exit_id));
}

// ============================================================
// Invalidation is sticky
// ============================================================

#[test]
fn invalid_exit_stays_invalid_and_unpaid() {
    let mut h = Harness::new();
    let fund = &h.commit_block(1, &[Transaction::fund(alice(), 100)]).remove(0);
    let exit_id = h.start(fund, alice());
    let spend = &h
        .commit_block(2, &[Transaction::split(fund.output(0), bob(), 100)])
        .remove(0);

    h.game
        .challenge_spent_exit(challenge(exit_id, spend, 0))
        .unwrap();
    let err = h
        .game
        .challenge_spent_exit(challenge(exit_id, spend, 0))
        .unwrap_err();
    assert!(matches!(err, ExitGameError::AlreadyInvalid(_)));
    assert!(!h.record(&exit_id).is_valid);

    h.mature();
    let report = h.game.finalize_exits(1).unwrap();
    assert_eq!(report.outcomes, vec![(exit_id, false)]);
    assert!(!h.record(&exit_id).is_valid);
    assert_eq!(h.ledger.balance(&alice()), U256::zero());
    assert_eq!(h.ledger.transfer_count(), 0);
}

// ============================================================
// Maturity gating
// ============================================================

#[test]
fn immature_head_blocks_mature_successors() {
    let mut h = Harness::new();
    let old = &h.commit_block(1, &[Transaction::fund(alice(), 100)]).remove(0);
    let young = &h.commit_block(2, &[Transaction::fund(bob(), 100)]).remove(0);

    // The younger output is claimed first and matures first.
    let young_exit = h.start(young, bob());
    h.clock.advance(DELAY - 1);
    let old_exit = h.start(old, alice());
    h.clock.advance(1);
    assert!(h.game.is_mature(&young_exit).unwrap());
    assert!(!h.game.is_mature(&old_exit).unwrap());

    let before = h.fingerprint();
    let err = h.game.finalize_exits(10).unwrap_err();
    let expected_head = common::GENESIS + 2 * DELAY - 1;
    assert!(matches!(
        err,
        ExitGameError::NothingToFinalize { queue_len: 2, head_matures_at: Some(t) } if t == expected_head
    ));
    assert_eq!(h.fingerprint(), before);

    h.clock.set(expected_head);
    let report = h.game.finalize_exits(10).unwrap();
    assert_eq!(report.outcomes, vec![(old_exit, true), (young_exit, true)]);
    assert_eq!(report.stop, FinalizeState::StoppedEmpty);
}

#[test]
fn maturity_boundary_is_inclusive() {
    let mut h = Harness::new();
    let fund = &h.commit_block(1, &[Transaction::fund(alice(), 100)]).remove(0);
    let exit_id = h.start(fund, alice());

    h.clock.advance(DELAY - 1);
    assert!(h.game.finalize_exits(1).is_err());
    h.clock.advance(1);
    assert_eq!(h.game.finalize_exits(1).unwrap().outcomes, vec![(exit_id, true)]);
}

// ============================================================
// Rejections change nothing
// ============================================================

#[test]
fn rejected_start_exit_changes_nothing() {
    let mut h = Harness::new();
    let block = h.commit_block(
        1,
        &[
            Transaction::fund(alice(), 100),
            Transaction::fund(bob(), 50),
        ],
    );
    let garbage = h.commit_raw(2, vec![b"definitely not a transaction".to_vec()]);
    h.start(&block[1], bob());
    h.game.take_events();

    let before = h.fingerprint();
    let valid = h.start_request(&block[0], 0, alice());

    let with = |edit: &dyn Fn(&mut StartExit)| {
        let mut r = valid.clone();
        edit(&mut r);
        r
    };
    let cases: Vec<(&str, StartExit)> = vec![
        ("bond", with(&|r| r.bond = U256::from(BOND + 1))),
        ("block", with(&|r| r.block_number = 77)),
        ("proof bytes", with(&|r| r.proof.push(0))),
        ("proof position", with(&|r| r.proof.clone_from(&block[1].proof))),
        ("malformed", h.start_request(&garbage[0], 0, alice())),
        ("output index", with(&|r| r.output_index = 1)),
        ("owner", with(&|r| r.caller = carol())),
        ("duplicate", h.start_request(&block[1], 0, bob())),
    ];

    for (name, req) in cases {
        let err = h.game.start_exit(req).unwrap_err();
        let matched = match name {
            "bond" => matches!(err, ExitGameError::InsufficientBond { .. }),
            "block" => matches!(err, ExitGameError::UnknownBlock(77)),
            "proof bytes" | "proof position" => matches!(err, ExitGameError::InvalidProof { .. }),
            "malformed" => matches!(err, ExitGameError::MalformedTransaction { .. }),
            "output index" => matches!(
                err,
                ExitGameError::OutputIndexOutOfRange {
                    index: 1,
                    outputs: 1
                }
            ),
            "owner" => matches!(err, ExitGameError::NotOutputOwner { .. }),
            "duplicate" => matches!(err, ExitGameError::DuplicateExit(_)),
            _ => false,
        };
        assert!(matched, "{name}: unexpected {err}");
        assert_eq!(h.fingerprint(), before, "{name} changed state");
    }
    assert!(h.game.take_events().is_empty());
}

#[test]
fn rejected_challenge_changes_nothing() {
    let mut h = Harness::new();
    let fund = &h.commit_block(1, &[Transaction::fund(alice(), 100)]).remove(0);
    let exit_id = h.start(fund, alice());
    let spend_block = h.commit_block(
        2,
        &[
            Transaction::split(fund.output(0), bob(), 100),
            Transaction::fund(carol(), 5),
        ],
    );
    let garbage = h.commit_raw(3, vec![b"\xff\xfe".to_vec()]);
    h.game.take_events();

    let before = h.fingerprint();
    let record_before = h.record(&exit_id);
    let valid = challenge(exit_id, &spend_block[0], 0);

    let unknown = {
        let mut r = valid.clone();
        r.exit_id = ExitId([0x42; 32]);
        r
    };
    assert!(matches!(
        h.game.challenge_spent_exit(unknown).unwrap_err(),
        ExitGameError::UnknownExit(_)
    ));

    let bad_proof = {
        let mut r = valid.clone();
        r.spend_proof.truncate(3);
        r
    };
    assert!(matches!(
        h.game.challenge_spent_exit(bad_proof).unwrap_err(),
        ExitGameError::InvalidProof { .. }
    ));

    let too_early = {
        let mut r = valid.clone();
        r.spend_block_number = 1;
        r
    };
    assert!(matches!(
        h.game.challenge_spent_exit(too_early).unwrap_err(),
        ExitGameError::SpendNotAfterExit { .. }
    ));

    let uncommitted = {
        let mut r = valid.clone();
        r.spend_block_number = 9;
        r
    };
    assert!(matches!(
        h.game.challenge_spent_exit(uncommitted).unwrap_err(),
        ExitGameError::UnknownBlock(9)
    ));

    assert!(matches!(
        h.game
            .challenge_spent_exit(challenge(exit_id, &garbage[0], 0))
            .unwrap_err(),
        ExitGameError::MalformedTransaction { .. }
    ));

    assert!(matches!(
        h.game
            .challenge_spent_exit(challenge(exit_id, &spend_block[0], 1))
            .unwrap_err(),
        ExitGameError::InputMismatch { input_index: 1, .. }
    ));
    assert!(matches!(
        h.game
            .challenge_spent_exit(challenge(exit_id, &spend_block[1], 0))
            .unwrap_err(),
        ExitGameError::InputMismatch { input_index: 0, .. }
    ));

    // Spending transaction paired with its neighbour's proof.
    let wrong_leaf = {
        let mut r = valid.clone();
        r.spend_proof = spend_block[1].proof.clone();
        r
    };
    assert!(matches!(
        h.game.challenge_spent_exit(wrong_leaf).unwrap_err(),
        ExitGameError::InvalidProof { .. }
    ));

    assert_eq!(h.fingerprint(), before);
    assert_eq!(h.record(&exit_id), record_before);
    assert!(h.game.take_events().is_empty());

    // The untouched valid challenge still works afterwards.
    assert!(!h.game.challenge_spent_exit(valid).unwrap().is_valid);
}
