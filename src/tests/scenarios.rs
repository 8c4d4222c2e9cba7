//! End-to-end scenarios over the textual protocol: parse a sequence,
//! optimize at a given level, and compare the printed program and its
//! effect byte-for-byte.

use crate::apply::apply;
use crate::block::Block;
use crate::expression::Expression;
use crate::parser::{parse_into, parse_sequence};

fn optimize(input: &str, level: u8) -> Expression {
    let mut expr = Expression::with_level(level);
    parse_into(input, &mut expr).expect("scenario input parses");
    expr
}

fn optimized_text(input: &str, level: u8) -> String {
    optimize(input, level).to_instructions()
}

/// The canonical five-instruction program; its net effect on an empty
/// file is `goodbye buddy`.
const CANONICAL: &str = "\
INSERT 0 hello world
REMOVE 0 4
INSERT 0 goodbye
REPLACE 8 abcde
REPLACE 8 buddy
";

#[test]
fn canonical_level_0_is_verbatim() {
    assert_eq!(optimized_text(CANONICAL, 0), CANONICAL);
}

#[test]
fn canonical_level_1() {
    assert_eq!(
        optimized_text(CANONICAL, 1),
        "\
INSERT 0 hello world
INSERT 0 goodbye
REMOVE 7 11
REPLACE 8 abcde
REPLACE 8 buddy
"
    );
}

#[test]
fn canonical_level_2() {
    assert_eq!(
        optimized_text(CANONICAL, 2),
        "\
INSERT 0  world
INSERT 0 goodbye
REPLACE 8 abcde
REPLACE 8 buddy
"
    );
}

#[test]
fn canonical_level_3() {
    assert_eq!(
        optimized_text(CANONICAL, 3),
        "\
INSERT 0  world
INSERT 0 goodbye
REPLACE 8 buddy
"
    );
}

#[test]
fn canonical_means_goodbye_buddy_at_every_level() {
    let original = parse_sequence(CANONICAL).unwrap();
    assert_eq!(apply(&original, b""), b"goodbye buddy");

    for level in 0..=3 {
        let expr = optimize(CANONICAL, level);
        let blocks: Vec<&Block> = expr.blocks().collect();
        assert_eq!(
            apply(blocks, b""),
            b"goodbye buddy",
            "level {level} changed the program's meaning"
        );
    }
}

#[test]
fn canonical_instruction_count_shrinks_with_level() {
    let counts: Vec<usize> = (0..=3).map(|l| optimize(CANONICAL, l).len()).collect();
    assert_eq!(counts, vec![5, 5, 4, 3]);
}

#[test]
fn insert_sort_scenario() {
    assert_eq!(
        optimized_text("INSERT 5 xyz; 3 ab", 1),
        "INSERT 3 ab\nINSERT 7 xyz\n"
    );
}

#[test]
fn remove_combine_scenario() {
    assert_eq!(optimized_text("REMOVE 0 3; 0 2", 1), "REMOVE 0 6\n");
}

#[test]
fn replace_split_by_remove_scenario() {
    assert_eq!(
        optimized_text("REPLACE 5 abcd\nREMOVE 6 7", 1),
        "REMOVE 6 7\nREPLACE 5 a\nREPLACE 6 d\n"
    );
}

#[test]
fn full_cancellation_scenario() {
    let input = "INSERT 0 hello\nREMOVE 0 4";
    assert!(optimized_text(input, 2).is_empty());

    // Level 1 only partitions; the pair survives untouched.
    assert_eq!(optimized_text(input, 1), "INSERT 0 hello\nREMOVE 0 4\n");
}
