//! Input fee calculation
//!
//! <https://github.com/cashubtc/nuts/blob/main/02.md>

use std::collections::HashMap;

use cashu_core::nuts::Id;
use cashu_core::Amount;

use crate::error::Error;

/// Fee required to spend a proof set: `ceil(sum(input_fee_ppk) / 1000)`
pub fn calculate_fee(
    proofs_count: &HashMap<Id, u64>,
    keyset_fee_ppk: &HashMap<Id, u64>,
) -> Result<Amount, Error> {
    let mut sum_fee: u64 = 0;

    for (keyset_id, proof_count) in proofs_count {
        let fee_ppk = keyset_fee_ppk
            .get(keyset_id)
            .ok_or(Error::KeysetNotFound(*keyset_id))?;

        sum_fee += fee_ppk * proof_count;
    }

    let fee = sum_fee.div_ceil(1000);

    Ok(fee.into())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_calculate_fee() {
        let keyset_id = Id::from_str("001711afb1de20cb").unwrap();

        let mut keyset_fees = HashMap::new();
        keyset_fees.insert(keyset_id, 2);

        let mut proofs_count = HashMap::new();

        proofs_count.insert(keyset_id, 1);
        assert_eq!(
            calculate_fee(&proofs_count, &keyset_fees).unwrap(),
            Amount::from(1)
        );

        proofs_count.insert(keyset_id, 500);
        assert_eq!(
            calculate_fee(&proofs_count, &keyset_fees).unwrap(),
            Amount::from(1)
        );

        proofs_count.insert(keyset_id, 1000);
        assert_eq!(
            calculate_fee(&proofs_count, &keyset_fees).unwrap(),
            Amount::from(2)
        );

        proofs_count.insert(keyset_id, 3501);
        assert_eq!(
            calculate_fee(&proofs_count, &keyset_fees).unwrap(),
            Amount::from(8)
        );
    }

    #[test]
    fn test_zero_fee_keyset() {
        let keyset_id = Id::from_str("001711afb1de20cb").unwrap();

        let mut keyset_fees = HashMap::new();
        keyset_fees.insert(keyset_id, 0);

        let mut proofs_count = HashMap::new();
        proofs_count.insert(keyset_id, 100);

        assert_eq!(
            calculate_fee(&proofs_count, &keyset_fees).unwrap(),
            Amount::ZERO
        );
    }

    #[test]
    fn test_unknown_keyset_errors() {
        let keyset_id = Id::from_str("001711afb1de20cb").unwrap();

        let mut proofs_count = HashMap::new();
        proofs_count.insert(keyset_id, 1);

        assert!(calculate_fee(&proofs_count, &HashMap::new()).is_err());
    }
}
