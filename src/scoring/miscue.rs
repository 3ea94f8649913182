use std::ops::Range;

use crate::types::{ErrorType, RecognizedWord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpTag {
    Equal,
    Replace,
    Delete,
    Insert,
}

/// One edit-script step over half-open ranges of both sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opcode {
    pub tag: OpTag,
    pub reference: Range<usize>,
    pub recognized: Range<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Keep,
    Drop,
    Add,
}

/// Longest-common-subsequence edit script between reference and recognized tokens.
///
/// Adjacent drops and adds merge into a single `Replace`. Among equally short
/// scripts, reference-side drops are taken first.
pub fn diff_opcodes(reference: &[String], recognized: &[String]) -> Vec<Opcode> {
    let steps = lcs_steps(reference, recognized);

    let mut opcodes = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);
    let mut idx = 0usize;
    while idx < steps.len() {
        let (i0, j0) = (i, j);
        if steps[idx] == Step::Keep {
            while idx < steps.len() && steps[idx] == Step::Keep {
                i += 1;
                j += 1;
                idx += 1;
            }
            opcodes.push(Opcode {
                tag: OpTag::Equal,
                reference: i0..i,
                recognized: j0..j,
            });
            continue;
        }

        while idx < steps.len() && steps[idx] != Step::Keep {
            if steps[idx] == Step::Drop {
                i += 1;
            } else {
                j += 1;
            }
            idx += 1;
        }
        let tag = match (i > i0, j > j0) {
            (true, true) => OpTag::Replace,
            (true, false) => OpTag::Delete,
            _ => OpTag::Insert,
        };
        opcodes.push(Opcode {
            tag,
            reference: i0..i,
            recognized: j0..j,
        });
    }
    opcodes
}

/// Largest DP table (cells) built in one piece; bigger inputs split recursively.
const MAX_TABLE_CELLS: usize = 1 << 22;

fn lcs_steps(a: &[String], b: &[String]) -> Vec<Step> {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let (core_a, core_b) = (&a[prefix..a.len() - suffix], &b[prefix..b.len() - suffix]);

    let mut steps = Vec::with_capacity(a.len() + b.len());
    steps.extend(std::iter::repeat(Step::Keep).take(prefix));
    core_steps(core_a, core_b, MAX_TABLE_CELLS, &mut steps);
    steps.extend(std::iter::repeat(Step::Keep).take(suffix));
    steps
}

fn core_steps(a: &[String], b: &[String], max_cells: usize, out: &mut Vec<Step>) {
    let (n, m) = (a.len(), b.len());
    if n == 0 || m == 0 {
        out.extend(std::iter::repeat(Step::Drop).take(n));
        out.extend(std::iter::repeat(Step::Add).take(m));
        return;
    }
    if (n + 1).saturating_mul(m + 1) <= max_cells {
        table_steps(a, b, out);
        return;
    }
    if n == 1 {
        match b.iter().position(|token| *token == a[0]) {
            Some(k) => {
                out.extend(std::iter::repeat(Step::Add).take(k));
                out.push(Step::Keep);
                out.extend(std::iter::repeat(Step::Add).take(m - k - 1));
            }
            None => {
                out.push(Step::Drop);
                out.extend(std::iter::repeat(Step::Add).take(m));
            }
        }
        return;
    }

    // Hirschberg split: linear memory per level.
    let mid = n / 2;
    let head = prefix_lcs_row(&a[..mid], b);
    let tail = suffix_lcs_row(&a[mid..], b);
    let mut split = 0;
    let mut best = 0;
    for k in 0..=m {
        let total = head[k] + tail[k];
        if total > best || k == 0 {
            best = total;
            split = k;
        }
    }
    core_steps(&a[..mid], &b[..split], max_cells, out);
    core_steps(&a[mid..], &b[split..], max_cells, out);
}

/// row[j] = LCS length of `a` and `b[..j]`.
fn prefix_lcs_row(a: &[String], b: &[String]) -> Vec<u32> {
    let mut row = vec![0u32; b.len() + 1];
    for x in a {
        let mut diag = 0;
        for (j, y) in b.iter().enumerate() {
            let up = row[j + 1];
            row[j + 1] = if x == y { diag + 1 } else { up.max(row[j]) };
            diag = up;
        }
    }
    row
}

/// row[j] = LCS length of `a` and `b[j..]`.
fn suffix_lcs_row(a: &[String], b: &[String]) -> Vec<u32> {
    let m = b.len();
    let mut row = vec![0u32; m + 1];
    for x in a.iter().rev() {
        let mut diag = 0;
        for j in (0..m).rev() {
            let down = row[j];
            row[j] = if *x == b[j] { diag + 1 } else { down.max(row[j + 1]) };
            diag = down;
        }
    }
    row
}

fn table_steps(a: &[String], b: &[String], steps: &mut Vec<Step>) {
    let (n, m) = (a.len(), b.len());
    let width = m + 1;
    // suffix[i * width + j] = LCS length of a[i..] and b[j..]
    let mut suffix = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            suffix[i * width + j] = if a[i] == b[j] {
                suffix[(i + 1) * width + j + 1] + 1
            } else {
                suffix[(i + 1) * width + j].max(suffix[i * width + j + 1])
            };
        }
    }

    let (mut i, mut j) = (0usize, 0usize);
    while i < n && j < m {
        if a[i] == b[j] {
            steps.push(Step::Keep);
            i += 1;
            j += 1;
        } else if suffix[(i + 1) * width + j] >= suffix[i * width + j + 1] {
            steps.push(Step::Drop);
            i += 1;
        } else {
            steps.push(Step::Add);
            j += 1;
        }
    }
    steps.extend(std::iter::repeat(Step::Drop).take(n - i));
    steps.extend(std::iter::repeat(Step::Add).take(m - j));
}

/// Reconcile recognized words with the reference tokens.
///
/// Recognized words outside the common subsequence that carry no error become
/// `Insertion`; reference tokens outside it become synthetic `Omission` words.
/// With miscue detection off, the recognized words are returned as they are.
pub fn align_miscues(
    reference: &[String],
    recognized: &[RecognizedWord],
    enable_miscue: bool,
) -> Vec<RecognizedWord> {
    if !enable_miscue {
        return recognized.to_vec();
    }

    let recognized_text: Vec<String> = recognized.iter().map(|w| w.word.to_lowercase()).collect();
    let opcodes = diff_opcodes(reference, &recognized_text);

    let mut aligned = Vec::with_capacity(reference.len().max(recognized.len()));
    for op in &opcodes {
        match op.tag {
            OpTag::Equal => aligned.extend_from_slice(&recognized[op.recognized.clone()]),
            OpTag::Insert | OpTag::Replace | OpTag::Delete => {
                for word in &recognized[op.recognized.clone()] {
                    if word.error_type == ErrorType::Correct {
                        aligned.push(word.with_error_type(ErrorType::Insertion));
                    } else {
                        aligned.push(word.clone());
                    }
                }
                for token in &reference[op.reference.clone()] {
                    aligned.push(RecognizedWord::omission(token.clone()));
                }
            }
        }
    }

    tracing::debug!(
        reference_tokens = reference.len(),
        recognized_words = recognized.len(),
        aligned_words = aligned.len(),
        opcodes = opcodes.len(),
        "miscue alignment complete"
    );
    aligned
}
