use std::collections::HashMap;

use rand::Rng;

use crate::bank::{Question, QuestionOption};
use crate::engine::shuffle;

/// Display letter for a display position: 0 -> 'A', 1 -> 'B', ...
pub fn display_letter(position: usize) -> char {
    u32::try_from(position)
        .ok()
        .and_then(|p| char::from_u32('A' as u32 + p))
        .filter(char::is_ascii_uppercase)
        .unwrap_or('?')
}

/// Display position for a letter, case-insensitive.
pub fn letter_position(letter: char) -> Option<usize> {
    let upper = letter.to_ascii_uppercase();
    upper
        .is_ascii_uppercase()
        .then(|| (upper as u32 - 'A' as u32) as usize)
}

/// Per-question display order of options, plus the canonical value -> display
/// letter mapping derived from it. The mapping is only for rendering; grading
/// always works on canonical values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionLayout {
    order: Vec<usize>,
    letters: HashMap<String, char>,
}

impl OptionLayout {
    pub fn randomize<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> Self {
        let order = shuffle::permutation(question.options.len(), rng);
        Self::build(question, order)
    }

    /// Canonical order, as the bank lists the options.
    pub fn identity(question: &Question) -> Self {
        Self::build(question, (0..question.options.len()).collect())
    }

    /// Rebuild a layout from a persisted order. Returns `None` when the order
    /// is not a permutation of this question's option indices.
    pub fn from_order(question: &Question, order: Vec<usize>) -> Option<Self> {
        let n = question.options.len();
        if order.len() != n {
            return None;
        }
        let mut seen = vec![false; n];
        for &idx in &order {
            if idx >= n || seen[idx] {
                return None;
            }
            seen[idx] = true;
        }
        Some(Self::build(question, order))
    }

    fn build(question: &Question, order: Vec<usize>) -> Self {
        let letters = order
            .iter()
            .enumerate()
            .map(|(pos, &idx)| (question.options[idx].value.clone(), display_letter(pos)))
            .collect();
        Self { order, letters }
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn letter_for(&self, value: &str) -> Option<char> {
        self.letters.get(value).copied()
    }

    pub fn value_for_letter<'q>(&self, question: &'q Question, letter: char) -> Option<&'q str> {
        let pos = letter_position(letter)?;
        let idx = *self.order.get(pos)?;
        question.options.get(idx).map(|o| o.value.as_str())
    }

    /// Options in display order with their letters.
    pub fn displayed<'q>(&self, question: &'q Question) -> Vec<(char, &'q QuestionOption)> {
        self.order
            .iter()
            .enumerate()
            .filter_map(|(pos, &idx)| question.options.get(idx).map(|o| (display_letter(pos), o)))
            .collect()
    }

    /// Render canonical values as display letters, keeping unknown values as-is.
    pub fn letters_for<'a>(&self, values: impl IntoIterator<Item = &'a str>) -> String {
        values
            .into_iter()
            .map(|v| {
                self.letter_for(v)
                    .map(String::from)
                    .unwrap_or_else(|| v.to_string())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::bank::tests::question;

    #[test]
    fn letter_round_trip_recovers_canonical_value() {
        let q = question("Q1", &["A", "B", "C", "D", "E"], "C");
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..200 {
            let layout = OptionLayout::randomize(&q, &mut rng);
            for opt in &q.options {
                let letter = layout.letter_for(&opt.value).unwrap();
                assert_eq!(layout.value_for_letter(&q, letter), Some(opt.value.as_str()));
            }
        }
    }

    #[test]
    fn displayed_follows_order() {
        let q = question("Q1", &["A", "B", "C"], "A");
        let layout = OptionLayout::from_order(&q, vec![2, 0, 1]).unwrap();
        let shown: Vec<(char, &str)> = layout
            .displayed(&q)
            .into_iter()
            .map(|(l, o)| (l, o.value.as_str()))
            .collect();
        assert_eq!(shown, vec![('A', "C"), ('B', "A"), ('C', "B")]);
        assert_eq!(layout.letter_for("C"), Some('A'));
        assert_eq!(layout.letters_for(["A", "C"]), "BA");
    }

    #[test]
    fn from_order_rejects_non_permutations() {
        let q = question("Q1", &["A", "B", "C"], "A");
        assert!(OptionLayout::from_order(&q, vec![0, 1]).is_none());
        assert!(OptionLayout::from_order(&q, vec![0, 1, 1]).is_none());
        assert!(OptionLayout::from_order(&q, vec![0, 1, 3]).is_none());
    }

    #[test]
    fn lowercase_letters_resolve() {
        let q = question("Q1", &["A", "B"], "A");
        let layout = OptionLayout::identity(&q);
        assert_eq!(layout.value_for_letter(&q, 'b'), Some("B"));
        assert_eq!(layout.value_for_letter(&q, 'c'), None);
        assert_eq!(letter_position('1'), None);
    }
}
