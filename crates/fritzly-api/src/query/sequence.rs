use super::fetch::ResultMap;
use crate::error::Error;

/// Put aggregated values back into request order.
///
/// The map must hold exactly the indices `0..total`; anything else means
/// the router skipped, invented, or repeated elements.
pub fn sequence(results: ResultMap, total: usize) -> Result<Vec<String>, Error> {
    if results.len() != total {
        return Err(Error::protocol(format!(
            "expected {total} values, router returned {}",
            results.len()
        )));
    }

    let mut slots: Vec<Option<String>> = vec![None; total];
    for (index, value) in results.into_entries() {
        let slot = usize::try_from(index)
            .ok()
            .and_then(|i| slots.get_mut(i))
            .ok_or_else(|| {
                Error::protocol(format!("element a{index} was never requested"))
            })?;
        *slot = Some(value);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(i, v)| v.ok_or_else(|| Error::protocol(format!("element a{i} missing"))))
        .collect()
}
