use crate::model::Candidate;
use crate::store::case::CaseMode;
use std::borrow::Cow;

/// Positions of matching candidates, split by how they matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filtered {
    pub prefix: Vec<usize>,
    pub contains: Vec<usize>,
}

impl Filtered {
    pub fn len(&self) -> usize {
        self.prefix.len() + self.contains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Prefix matches first, then the rest, each in candidate order.
    pub fn ordered(&self) -> impl Iterator<Item = usize> + '_ {
        self.prefix.iter().chain(self.contains.iter()).copied()
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.ordered().collect()
    }
}

fn fold(text: &str, case: CaseMode) -> Cow<'_, str> {
    match case {
        CaseMode::Insensitive => Cow::Owned(text.to_lowercase()),
        CaseMode::Sensitive => Cow::Borrowed(text),
    }
}

/// Selects the candidates to show for `phrase`.
///
/// An empty phrase keeps the first `limit` candidates as they are. Otherwise
/// the first pass collects search keys starting with the phrase; if that
/// leaves room under `limit`, a second pass adds keys containing it further in
/// (or whose detail text contains it). Candidate order is kept within a pass.
pub fn filter<T: Candidate>(
    candidates: &[T],
    phrase: &str,
    case: CaseMode,
    limit: Option<usize>,
) -> Filtered {
    let limit = limit.unwrap_or(usize::MAX);
    let mut result = Filtered::default();

    if phrase.is_empty() {
        result.prefix = (0..candidates.len().min(limit)).collect();
        return result;
    }

    let needle = fold(phrase, case);
    let keys: Vec<Cow<'_, str>> = candidates.iter()
        .map(|c| fold(c.search_key(), case))
        .collect();

    for (i, key) in keys.iter().enumerate() {
        if result.prefix.len() >= limit {
            return result;
        }
        if key.starts_with(&*needle) {
            result.prefix.push(i);
        }
    }

    for (i, (key, candidate)) in keys.iter().zip(candidates).enumerate() {
        if result.len() >= limit {
            break;
        }
        if key.starts_with(&*needle) {
            continue;
        }
        if key.contains(&*needle) || fold(candidate.search_detail(), case).contains(&*needle) {
            result.contains.push(i);
        }
    }
    result
}
