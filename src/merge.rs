use std::collections::HashSet;

use crate::model::SubmissionStub;

/// Concatenates the stub lists of several sections and keeps one stub per id.
///
/// The first occurrence is kept, so with `[gallery, scraps]` a submission listed in
/// both sections keeps its gallery stub. Output order is first-seen order.
pub fn merge<I, S>(sections: I) -> Vec<SubmissionStub>
where
    I: IntoIterator<Item = S>,
    S: IntoIterator<Item = SubmissionStub>,
{
    let mut seen = HashSet::new();
    sections
        .into_iter()
        .flatten()
        .filter(|stub| seen.insert(stub.id.clone()))
        .collect()
}
