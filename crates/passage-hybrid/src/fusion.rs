use std::cmp::Ordering;
use std::collections::HashMap;

use passage_core::types::Candidate;

use crate::normalize::normalize;

fn vector_slot(c: &mut Candidate) -> &mut Option<f32> { &mut c.vector_score }
fn lexical_slot(c: &mut Candidate) -> &mut Option<f32> { &mut c.lexical_score }

fn normalize_slot(candidates: &mut [Candidate], slot: fn(&mut Candidate) -> &mut Option<f32>) {
    let raw: Vec<f32> = candidates.iter_mut().map(|c| slot(c).unwrap_or(0.0)).collect();
    for (c, s) in candidates.iter_mut().zip(normalize(&raw)) {
        *slot(c) = Some(s);
    }
}

/// Rewrite each side's scores in place to their min-max normalized values.
pub fn normalize_candidates(vector: &mut [Candidate], lexical: &mut [Candidate]) {
    normalize_slot(vector, vector_slot);
    normalize_slot(lexical, lexical_slot);
}

/// Merge both sides by exact passage text and blend their (already
/// normalized) scores:
///
/// `fused = vector * (1 - lexical_weight) + lexical * lexical_weight`
///
/// A side that did not return the passage contributes nothing. Metadata comes
/// from the vector side; lexical-only hits keep an empty map. Within one side
/// the first occurrence of a text wins. The result is best first, ties in
/// merge order, cut to `pool_size`.
pub fn fuse(vector: Vec<Candidate>, lexical: Vec<Candidate>, lexical_weight: f32, pool_size: usize) -> Vec<Candidate> {
    let vector_weight = 1.0 - lexical_weight;
    let mut merged: Vec<Candidate> = Vec::with_capacity(vector.len() + lexical.len());
    let mut by_content: HashMap<String, usize> = HashMap::new();

    for c in vector {
        if by_content.contains_key(&c.content) { continue; }
        by_content.insert(c.content.clone(), merged.len());
        merged.push(c);
    }
    for c in lexical {
        match by_content.get(&c.content) {
            Some(&i) => {
                if merged[i].lexical_score.is_none() { merged[i].lexical_score = c.lexical_score; }
            }
            None => {
                by_content.insert(c.content.clone(), merged.len());
                merged.push(Candidate { metadata: Default::default(), ..c });
            }
        }
    }

    for c in &mut merged {
        let v = c.vector_score.unwrap_or(0.0);
        let l = c.lexical_score.unwrap_or(0.0);
        c.fused_score = Some(v * vector_weight + l * lexical_weight);
    }
    merged.sort_by(|a, b| b.fused_score.partial_cmp(&a.fused_score).unwrap_or(Ordering::Equal));
    merged.truncate(pool_size);
    merged
}
