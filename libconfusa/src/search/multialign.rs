use std::collections::HashMap;

use anyhow::{bail, Result};
use indexmap::IndexSet;
use thiserror::Error;

use super::queue::{best_first_search, SearchNode};
use crate::structs::Form;

/// One input sequence re-encoded as the strictly increasing list of
/// shared layer indices its symbols occupy.
pub type LayerSequence = Vec<usize>;

/// Budgets for the joint seed alignment. These are explicit and
/// retryable: the driver halves the seed set on exhaustion and drops
/// the step budget entirely as a last resort.
#[derive(Clone)]
pub struct MultialignParams {
    /// How many of the longest sequences are aligned jointly before
    /// the rest are merged in one at a time.
    pub seed_size: usize,
    /// Expansion budget for the joint seed search.
    pub step_budget: usize,
}

impl Default for MultialignParams {
    fn default() -> Self {
        MultialignParams {
            seed_size: 10,
            step_budget: 5000,
        }
    }
}

#[derive(Error, Debug)]
#[error("joint alignment found no solution at minimum seed size with no step budget")]
pub struct SearchExhaustedError;

#[derive(Error, Debug)]
#[error("layer {layer} holds '{expected}' but a merged sequence claims '{found}'")]
pub struct InconsistentLayerError {
    pub layer: usize,
    pub expected: char,
    pub found: char,
}

/// Joint alignment of the seed sequences, searched exactly. A state is
/// the vector of per-sequence consumption pointers; the path to it is
/// the list of layers emitted so far. Each expansion opens one layer
/// for a candidate symbol and advances every sequence whose next
/// symbol equals it: consuming a matching layer is never worse than
/// skipping it, so the restriction preserves optimality.
#[derive(Clone)]
struct SeedNode<'a> {
    sequences: &'a [Vec<char>],
    pointers: Vec<usize>,
    layers: Vec<char>,
}

impl SeedNode<'_> {
    /// Any layer list must still embed every remaining suffix, so the
    /// longest remaining suffix bounds the layers left to open.
    fn remaining_max(&self) -> usize {
        self.sequences
            .iter()
            .zip(&self.pointers)
            .map(|(sequence, &pointer)| sequence.len() - pointer)
            .max()
            .unwrap_or(0)
    }
}

impl SearchNode for SeedNode<'_> {
    type Key = Vec<usize>;
    type Priority = (usize, usize);

    fn key(&self) -> Vec<usize> {
        self.pointers.clone()
    }

    fn priority(&self) -> (usize, usize) {
        let heuristic = self.remaining_max();
        (self.layers.len() + heuristic, heuristic)
    }

    fn is_complete(&self) -> bool {
        self.sequences
            .iter()
            .zip(&self.pointers)
            .all(|(sequence, &pointer)| pointer == sequence.len())
    }

    fn successors(&self) -> Vec<Self> {
        let mut candidates: IndexSet<char> = IndexSet::new();
        for (sequence, &pointer) in self.sequences.iter().zip(&self.pointers) {
            if pointer < sequence.len() {
                candidates.insert(sequence[pointer]);
            }
        }

        candidates
            .into_iter()
            .map(|symbol| {
                let mut successor = self.clone();
                successor.layers.push(symbol);
                for (sequence, pointer) in self.sequences.iter().zip(&mut successor.pointers) {
                    if *pointer < sequence.len() && sequence[*pointer] == symbol {
                        *pointer += 1;
                    }
                }
                successor
            })
            .collect()
    }
}

/// Embed each sequence into the emitted layer list greedily from the
/// left. A minimal layer list always admits the greedy embedding.
fn extract(layers: &[char], sequences: &[Vec<char>]) -> Vec<LayerSequence> {
    sequences
        .iter()
        .map(|sequence| {
            let mut cursor = 0;
            sequence
                .iter()
                .map(|&symbol| {
                    while layers[cursor] != symbol {
                        cursor += 1;
                    }
                    let layer = cursor;
                    cursor += 1;
                    layer
                })
                .collect()
        })
        .collect()
}

fn seed_align(sequences: &[Vec<char>], step_budget: Option<usize>) -> Option<Vec<LayerSequence>> {
    let start = SeedNode {
        sequences,
        pointers: vec![0; sequences.len()],
        layers: vec![],
    };
    let best = best_first_search(start, step_budget)?;
    Some(extract(&best.layers, sequences))
}

/// Where one placement of the merged sequence landed: an existing layer
/// reused for free, or a fresh layer to be numbered during renumbering.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Placement {
    Existing(usize),
    Fresh,
}

/// Extends a single sequence against the fixed layer structure: the
/// next symbol either reuses a strictly later existing layer holding
/// the same symbol, or opens a fresh layer at cost one.
#[derive(Clone)]
struct MergeNode<'a> {
    sequence: &'a [char],
    layer_symbols: &'a [Option<char>],
    pointer: usize,
    previous: Option<usize>,
    opened: usize,
    placements: Vec<Placement>,
    heuristic: usize,
}

impl<'a> MergeNode<'a> {
    fn new(
        sequence: &'a [char],
        layer_symbols: &'a [Option<char>],
        pointer: usize,
        previous: Option<usize>,
        opened: usize,
        placements: Vec<Placement>,
    ) -> Self {
        let heuristic = merge_heuristic(sequence, layer_symbols, pointer, previous);
        MergeNode {
            sequence,
            layer_symbols,
            pointer,
            previous,
            opened,
            placements,
            heuristic,
        }
    }

    fn reusable_from(&self) -> usize {
        self.previous.map_or(0, |layer| layer + 1)
    }
}

/// Admissible lower bound on the layers the rest of the sequence is
/// forced to open: the per-symbol deficit between remaining need and
/// the matching layers still reachable.
fn merge_heuristic(
    sequence: &[char],
    layer_symbols: &[Option<char>],
    pointer: usize,
    previous: Option<usize>,
) -> usize {
    let mut need: HashMap<char, usize> = HashMap::new();
    for &symbol in &sequence[pointer..] {
        *need.entry(symbol).or_insert(0) += 1;
    }

    let reusable_from = previous.map_or(0, |layer| layer + 1);
    let mut available: HashMap<char, usize> = HashMap::new();
    for symbol in layer_symbols[reusable_from..].iter().flatten() {
        *available.entry(*symbol).or_insert(0) += 1;
    }

    need.iter()
        .map(|(symbol, &count)| count.saturating_sub(*available.get(symbol).unwrap_or(&0)))
        .sum()
}

impl SearchNode for MergeNode<'_> {
    type Key = (usize, Option<usize>);
    type Priority = (usize, usize);

    fn key(&self) -> (usize, Option<usize>) {
        (self.pointer, self.previous)
    }

    fn priority(&self) -> (usize, usize) {
        (self.opened + self.heuristic, self.heuristic)
    }

    fn is_complete(&self) -> bool {
        self.pointer == self.sequence.len()
    }

    fn successors(&self) -> Vec<Self> {
        if self.is_complete() {
            return vec![];
        }
        let symbol = self.sequence[self.pointer];

        let mut result = vec![];
        for layer in self.reusable_from()..self.layer_symbols.len() {
            if self.layer_symbols[layer] == Some(symbol) {
                let mut placements = self.placements.clone();
                placements.push(Placement::Existing(layer));
                result.push(MergeNode::new(
                    self.sequence,
                    self.layer_symbols,
                    self.pointer + 1,
                    Some(layer),
                    self.opened,
                    placements,
                ));
            }
        }

        // a fresh layer is always possible; it does not advance the
        // reuse frontier, since it is inserted rather than appended
        let mut placements = self.placements.clone();
        placements.push(Placement::Fresh);
        result.push(MergeNode::new(
            self.sequence,
            self.layer_symbols,
            self.pointer + 1,
            self.previous,
            self.opened + 1,
            placements,
        ));

        result
    }
}

/// Rebuild the layer-to-symbol table from the sequences merged so far,
/// verifying that no two of them claim different symbols for one
/// layer. A violation is a contract breach and fails the run.
fn layer_table(
    sequences: &[Vec<char>],
    extracted: &[LayerSequence],
) -> Result<Vec<Option<char>>, InconsistentLayerError> {
    let num_layers = extracted
        .iter()
        .flatten()
        .max()
        .map_or(0, |&layer| layer + 1);
    let mut symbols: Vec<Option<char>> = vec![None; num_layers];

    for (sequence, encoding) in sequences.iter().zip(extracted) {
        for (&symbol, &layer) in sequence.iter().zip(encoding) {
            match symbols[layer] {
                None => symbols[layer] = Some(symbol),
                Some(existing) if existing == symbol => {}
                Some(existing) => {
                    return Err(InconsistentLayerError {
                        layer,
                        expected: existing,
                        found: symbol,
                    })
                }
            }
        }
    }

    Ok(symbols)
}

/// Resolve fresh placements into concrete layer indices. A fresh layer
/// lands immediately after the previous placement of this sequence,
/// and every already-assigned index at or above the insertion point
/// shifts up by one.
fn renumber(placements: &[Placement], extracted: &mut [LayerSequence]) -> LayerSequence {
    let mut resolved: Vec<usize> = Vec::with_capacity(placements.len());
    let mut inserted_before = 0;
    for placement in placements {
        match placement {
            Placement::Existing(layer) => resolved.push(layer + inserted_before),
            Placement::Fresh => {
                resolved.push(resolved.last().map_or(0, |&position| position + 1));
                inserted_before += 1;
            }
        }
    }

    // insertion points in the pre-insertion numbering: each one bumps
    // every old index at or above it
    let mut insert_points: Vec<usize> = vec![];
    let mut last_existing: Option<usize> = None;
    for placement in placements {
        match placement {
            Placement::Existing(layer) => last_existing = Some(*layer),
            Placement::Fresh => insert_points.push(last_existing.map_or(0, |layer| layer + 1)),
        }
    }

    if !insert_points.is_empty() {
        for encoding in extracted.iter_mut() {
            for layer in encoding.iter_mut() {
                *layer += insert_points.iter().filter(|&&point| point <= *layer).count();
            }
        }
    }

    resolved
}

/// Merge one sequence into the layer structure fixed by everything
/// already aligned, then renumber if the merge opened fresh layers.
fn merge_sequence(
    sequence: &[char],
    merged: &[Vec<char>],
    extracted: &mut Vec<LayerSequence>,
) -> Result<()> {
    let symbols = layer_table(merged, extracted)?;
    let start = MergeNode::new(sequence, &symbols, 0, None, 0, vec![]);

    let best = match best_first_search(start, None) {
        Some(node) => node,
        // a fresh-layer successor always exists, so the merge search
        // cannot exhaust
        None => bail!("incremental merge search exhausted unexpectedly"),
    };

    let encoding = renumber(&best.placements, extracted);
    extracted.push(encoding);
    Ok(())
}

/// Align every sequence onto a shared set of integer-indexed layers,
/// minimizing new layers approximately: an exact joint alignment of
/// the longest few under a step budget, then one small search per
/// remaining sequence in descending length order. Encodings come back
/// in the caller's original order.
pub fn approximate_multialign(
    forms: &[Form],
    params: &MultialignParams,
) -> Result<Vec<LayerSequence>> {
    if forms.is_empty() {
        return Ok(vec![]);
    }

    let mut order: Vec<usize> = (0..forms.len()).collect();
    order.sort_by_key(|&idx| std::cmp::Reverse(forms[idx].len()));
    let sequences: Vec<Vec<char>> = order
        .iter()
        .map(|&idx| forms[idx].symbols().collect())
        .collect();

    let mut select = params.seed_size.clamp(1, sequences.len());
    let mut step_budget = Some(params.step_budget);
    let mut extracted = loop {
        if let Some(encodings) = seed_align(&sequences[..select], step_budget) {
            break encodings;
        }
        if select > 4 {
            select /= 2;
        } else if step_budget.is_some() {
            step_budget = None;
        } else {
            return Err(SearchExhaustedError.into());
        }
    };

    for idx in select..sequences.len() {
        merge_sequence(&sequences[idx], &sequences[..idx], &mut extracted)?;
    }

    let mut result = vec![LayerSequence::new(); forms.len()];
    for (position, &original) in order.iter().enumerate() {
        result[original] = std::mem::take(&mut extracted[position]);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forms(words: &[&str]) -> Vec<Form> {
        words.iter().map(|word| Form::new(word)).collect()
    }

    fn align(words: &[&str], params: &MultialignParams) -> Vec<LayerSequence> {
        approximate_multialign(&forms(words), params).unwrap()
    }

    #[test]
    fn test_single_sequence_uses_increasing_layers() {
        let encodings = align(&["abca"], &MultialignParams::default());
        assert_eq!(encodings, vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn test_empty_input() {
        let encodings = align(&[], &MultialignParams::default());
        assert!(encodings.is_empty());
    }

    #[test]
    fn test_empty_sequence_gets_empty_encoding() {
        let encodings = align(&["ab", ""], &MultialignParams::default());
        assert_eq!(encodings[0], vec![0, 1]);
        assert!(encodings[1].is_empty());
    }

    #[test]
    fn test_identical_sequences_share_layers() {
        let encodings = align(&["ab", "ab"], &MultialignParams::default());
        assert_eq!(encodings, vec![vec![0, 1], vec![0, 1]]);
    }

    #[test]
    fn test_subsequence_embeds_without_new_layers() {
        let encodings = align(&["ab", "b"], &MultialignParams::default());
        assert_eq!(encodings[0], vec![0, 1]);
        assert_eq!(encodings[1], vec![1]);
    }

    #[test]
    fn test_result_order_matches_input_order() {
        // the short sequence is processed last but reported first
        let encodings = align(&["b", "abc"], &MultialignParams::default());
        assert_eq!(encodings[0], vec![1]);
        assert_eq!(encodings[1], vec![0, 1, 2]);
    }

    #[test]
    fn test_merge_inserts_fresh_layer_at_front() {
        let params = MultialignParams {
            seed_size: 1,
            ..Default::default()
        };

        let encodings = align(&["abc", "xbc"], &params);
        assert_eq!(encodings[0], vec![1, 2, 3]);
        assert_eq!(encodings[1], vec![0, 2, 3]);
    }

    #[test]
    fn test_merge_inserts_fresh_layer_in_the_middle() {
        let params = MultialignParams {
            seed_size: 1,
            ..Default::default()
        };

        let encodings = align(&["abc", "axc"], &params);
        assert_eq!(encodings[0], vec![0, 2, 3]);
        assert_eq!(encodings[1], vec![0, 1, 3]);
    }

    #[test]
    fn test_encodings_are_strictly_increasing() {
        let params = MultialignParams {
            seed_size: 2,
            ..Default::default()
        };
        let encodings = align(&["singt", "sangt", "sungt", "st"], &params);

        for encoding in &encodings {
            assert!(encoding.windows(2).all(|pair| pair[0] < pair[1]));
        }
    }

    #[test]
    fn test_layers_hold_one_symbol_each() {
        let words = ["ing", "ang", "ung", "g", "ng"];
        let params = MultialignParams {
            seed_size: 3,
            ..Default::default()
        };
        let encodings = align(&words, &params);

        let sequences: Vec<Vec<char>> = forms(&words)
            .iter()
            .map(|form| form.symbols().collect())
            .collect();
        assert!(layer_table(&sequences, &encodings).is_ok());
    }

    #[test]
    fn test_layer_table_detects_conflicts() {
        let sequences = vec![vec!['a'], vec!['b']];
        let extracted = vec![vec![0], vec![0]];
        assert!(layer_table(&sequences, &extracted).is_err());
    }

    #[test]
    fn test_renumber_shifts_later_layers() {
        // reuse layer 0, insert a fresh layer, reuse old layer 2
        let placements = [
            Placement::Existing(0),
            Placement::Fresh,
            Placement::Existing(2),
        ];
        let mut extracted = vec![vec![0, 1, 2]];

        let resolved = renumber(&placements, &mut extracted);

        assert_eq!(resolved, vec![0, 1, 3]);
        assert_eq!(extracted, vec![vec![0, 2, 3]]);
    }
}
