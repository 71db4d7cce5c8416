use std::collections::HashSet;
use std::hash::Hash;

use crate::error::LedgerError;
use crate::schemas::{Cents, Weight};

struct Remainder {
    // Numerator of the fractional part; every entry shares `total_weight` as denominator.
    numerator: u128,
    index: usize,
}

/// Splits `amount_cents` across weighted participants without losing a cent.
///
/// Every participant receives the floor of its exact proportional share. The
/// cents left over go one each to the participants with the largest fractional
/// remainder, ties resolved by position in `weights`. The result keeps the
/// input order and always sums to `amount_cents`.
pub fn compute_shares<K>(
    amount_cents: Cents,
    weights: &[(K, Weight)],
) -> Result<Vec<(K, Cents)>, LedgerError>
where
    K: Clone + Eq + Hash,
{
    if weights.is_empty() {
        return Err(LedgerError::InvalidInput("no participants".to_string()));
    }
    if amount_cents < 0 {
        return Err(LedgerError::InvalidInput("negative amount".to_string()));
    }
    let mut seen = HashSet::with_capacity(weights.len());
    if !weights.iter().all(|(id, _)| seen.insert(id)) {
        return Err(LedgerError::InvalidInput("duplicate participant".to_string()));
    }
    let total_weight: u128 = weights.iter().map(|(_, weight)| u128::from(*weight)).sum();
    if total_weight == 0 {
        return Err(LedgerError::InvalidInput("weights sum to zero".to_string()));
    }

    let amount = amount_cents as u128;
    let mut shares = Vec::with_capacity(weights.len());
    let mut remainders = Vec::with_capacity(weights.len());
    let mut allocated: u128 = 0;

    for (index, (id, weight)) in weights.iter().enumerate() {
        let exact = amount * u128::from(*weight);
        let base = exact / total_weight;
        allocated += base;
        // base <= amount_cents, so it fits back into Cents
        shares.push((id.clone(), base as Cents));
        remainders.push(Remainder {
            numerator: exact % total_weight,
            index,
        });
    }

    // 0 <= residual < weights.len()
    let residual = (amount - allocated) as usize;
    remainders.sort_by(|a, b| b.numerator.cmp(&a.numerator).then(a.index.cmp(&b.index)));
    for remainder in remainders.iter().take(residual) {
        shares[remainder.index].1 += 1;
    }

    Ok(shares)
}
