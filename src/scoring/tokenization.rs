use std::collections::HashSet;

use crate::locale::Script;

/// Split reference text into comparable, lowercased word tokens.
///
/// Unsegmented scripts are segmented with the recognized words as the
/// dictionary, so boundaries follow what the recognizer actually heard.
pub fn tokenize_reference(text: &str, locale: &str, recognized: &[String]) -> Vec<String> {
    match Script::for_locale(locale) {
        Script::SpaceDelimited => split_space_delimited(text),
        Script::Unsegmented => segment_unsegmented(text, recognized),
    }
}

pub fn split_space_delimited(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|token| token.trim_matches(is_punctuation))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn segment_unsegmented(text: &str, recognized: &[String]) -> Vec<String> {
    let dictionary: HashSet<Vec<char>> = recognized
        .iter()
        .map(|word| word.trim().to_lowercase().chars().collect::<Vec<_>>())
        .filter(|chars| !chars.is_empty())
        .collect();
    let max_word_len = dictionary.iter().map(Vec::len).max().unwrap_or(1);

    let mut tokens = Vec::new();
    for run in separator_free_runs(&text.to_lowercase()) {
        tokens.extend(segment_run(&run, &dictionary, max_word_len));
    }
    tokens
}

fn separator_free_runs(text: &str) -> Vec<Vec<char>> {
    let mut runs = Vec::new();
    let mut cur = Vec::new();
    for c in text.chars() {
        if c.is_whitespace() || is_punctuation(c) {
            if !cur.is_empty() {
                runs.push(std::mem::take(&mut cur));
            }
            continue;
        }
        cur.push(c);
    }
    if !cur.is_empty() {
        runs.push(cur);
    }
    runs
}

/// ASCII punctuation plus the Latin-1, Devanagari danda, general, CJK and
/// fullwidth punctuation blocks. Letters and combining marks are never punctuation.
fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation()
        || matches!(
            c,
            '\u{00A1}' | '\u{00AB}' | '\u{00B7}' | '\u{00BB}' | '\u{00BF}'
                | '\u{0964}' | '\u{0965}'
                | '\u{2010}'..='\u{2027}'
                | '\u{2030}'..='\u{205E}'
                | '\u{3001}'..='\u{3003}'
                | '\u{3008}'..='\u{3011}'
                | '\u{3014}'..='\u{301F}'
                | '\u{30FB}'
                | '\u{FF01}'..='\u{FF0F}'
                | '\u{FF1A}'..='\u{FF20}'
                | '\u{FF3B}'..='\u{FF40}'
                | '\u{FF5B}'..='\u{FF65}'
        )
}

#[derive(Clone, Copy)]
struct Cell {
    tokens: usize,
    /// Characters not covered by a dictionary word, the tie-breaker.
    uncovered: usize,
    prev: usize,
}

/// Minimum-token segmentation of one run of non-separator characters.
///
/// Candidate tokens at each position: any dictionary word, a whole ASCII
/// alphanumeric run, or a single character.
fn segment_run(
    chars: &[char],
    dictionary: &HashSet<Vec<char>>,
    max_word_len: usize,
) -> Vec<String> {
    let n = chars.len();
    let mut best: Vec<Option<Cell>> = vec![None; n + 1];
    best[0] = Some(Cell {
        tokens: 0,
        uncovered: 0,
        prev: 0,
    });

    for start in 0..n {
        let Some(base) = best[start] else {
            continue;
        };
        let mut relax = |end: usize, uncovered: usize| {
            let candidate = Cell {
                tokens: base.tokens + 1,
                uncovered: base.uncovered + uncovered,
                prev: start,
            };
            let better = match best[end] {
                None => true,
                Some(cur) => {
                    (candidate.tokens, candidate.uncovered) < (cur.tokens, cur.uncovered)
                }
            };
            if better {
                best[end] = Some(candidate);
            }
        };

        let longest = max_word_len.min(n - start);
        for len in (1..=longest).rev() {
            if dictionary.contains(&chars[start..start + len]) {
                relax(start + len, 0);
            }
        }

        if chars[start].is_ascii_alphanumeric() {
            let run_len = chars[start..]
                .iter()
                .take_while(|c| c.is_ascii_alphanumeric())
                .count();
            relax(start + run_len, run_len);
        } else {
            relax(start + 1, 1);
        }
    }

    let mut bounds = Vec::new();
    let mut end = n;
    while end > 0 {
        let Some(cell) = best[end] else {
            break;
        };
        bounds.push((cell.prev, end));
        end = cell.prev;
    }
    bounds.reverse();
    bounds
        .into_iter()
        .map(|(start, end)| chars[start..end].iter().collect())
        .collect()
}
