//! Canned offline replies, picked by keyword sniffing

/// Keyword groups and their replies, checked in order
const KEYED_REPLIES: &[(&[&str], &str)] = &[
    (
        &["complexity", "big o", "big-o", "o(n", "time", "space"],
        "Count how many times your innermost operation runs as the input grows. Nested loops \
         over the same input usually mean quadratic time; a hash map often trades memory for a \
         single pass.",
    ),
    (
        &["edge", "corner", "empty", "null", "overflow"],
        "Try your idea on the smallest inputs first: an empty input, a single element, all \
         duplicates, and values at the limits of the constraints.",
    ),
    (
        &["optimi", "faster", "slow", "improve", "efficient"],
        "Look for repeated work. If you compute the same thing more than once, ask which \
         structure would let you remember it: a set, a map, a prefix sum or a sorted order.",
    ),
    (
        &["stuck", "hint", "help", "idea", "start"],
        "Solve the first example by hand and write down every step you take. The steps you \
         repeat are the loop; the things you look up are the data structure.",
    ),
    (
        &["bug", "error", "wrong", "fail", "exception"],
        "Trace your code line by line on the failing input and write the value of each \
         variable after every iteration. The first surprise is where the bug lives.",
    ),
];

/// Used when no keyword matches
const GENERAL_REPLIES: &[&str] = &[
    "Before writing more code, state the invariant your loop maintains and check it holds \
     after each iteration.",
    "Describe your approach in two sentences. If that is hard, the approach is not settled \
     yet, so list the options you are weighing and what each costs.",
    "Which constraint in the problem looks unusual? Unusual limits are often a hint toward \
     the intended technique.",
];

/// Pick a canned reply for `input`. Deterministic for a given input.
pub fn canned_response(input: &str) -> &'static str {
    let lower = input.to_lowercase();
    KEYED_REPLIES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, reply)| *reply)
        .unwrap_or_else(|| GENERAL_REPLIES[input.chars().count() % GENERAL_REPLIES.len()])
}
