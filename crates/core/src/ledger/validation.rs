//! Input validation and amount normalization.
//!
//! Runs before any store call, so rejected input never touches the store.

use rust_decimal::{Decimal, RoundingStrategy};
use tally_shared::types::{AccountId, TransactionId};

use super::error::LedgerError;
use super::types::OperationType;

/// Decimal places kept for every stored amount.
pub const AMOUNT_SCALE: u32 = 2;

/// Largest magnitude a stored amount may have (`NUMERIC(18, 2)`).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_808_348_671, 232_830_643, 0, false, 2);

/// Rounds an amount to [`AMOUNT_SCALE`] places using Banker's Rounding.
///
/// The result always carries exactly [`AMOUNT_SCALE`] places, so `30`
/// renders as `30.00`.
#[must_use]
pub fn normalize_amount(amount: Decimal) -> Decimal {
    let mut normalized =
        amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointNearestEven);
    normalized.rescale(AMOUNT_SCALE);
    normalized
}

/// Normalizes an amount and checks it fits the stored range.
///
/// # Errors
///
/// Returns `AmountOutOfRange` if the magnitude exceeds [`MAX_AMOUNT`].
pub fn validate_amount_range(amount: Decimal) -> Result<Decimal, LedgerError> {
    let amount = normalize_amount(amount);
    if amount.abs() > MAX_AMOUNT {
        return Err(LedgerError::AmountOutOfRange(amount));
    }
    Ok(amount)
}

/// Validates every field of a record request, reporting all violations.
///
/// A single violation is returned as itself; several are wrapped in
/// `InvalidInput`. The sign rule is only checked once the operation type
/// is known.
///
/// # Errors
///
/// Any of `InvalidAccountId`, `InvalidOperationType`, `AmountOutOfRange`,
/// `InvalidAmountSign`, or `InvalidInput` holding more than one of them.
pub fn validate_record(
    account_id: AccountId,
    operation_type_id: i32,
    amount: Decimal,
) -> Result<(AccountId, OperationType, Decimal), LedgerError> {
    let mut violations = Vec::new();

    if let Err(err) = validate_account_id(account_id) {
        violations.push(err);
    }

    let amount = match validate_amount_range(amount) {
        Ok(amount) => Some(amount),
        Err(err) => {
            violations.push(err);
            None
        }
    };

    let operation_type = match OperationType::try_from(operation_type_id) {
        Ok(operation_type) => Some(operation_type),
        Err(err) => {
            violations.push(err);
            None
        }
    };

    if let (Some(operation_type), Some(amount)) = (operation_type, amount)
        && !operation_type.kind().accepts(amount)
    {
        violations.push(LedgerError::InvalidAmountSign {
            operation_type,
            amount,
        });
    }

    match (operation_type, amount) {
        (Some(operation_type), Some(amount)) if violations.is_empty() => {
            Ok((account_id, operation_type, amount))
        }
        _ if violations.len() == 1 => Err(violations.remove(0)),
        _ => Err(LedgerError::InvalidInput(violations)),
    }
}

/// Validates a caller-supplied document number.
///
/// # Errors
///
/// Returns `InvalidDocumentNumber` unless the number is positive.
pub fn validate_document_number(document_number: i64) -> Result<i64, LedgerError> {
    if document_number <= 0 {
        return Err(LedgerError::InvalidDocumentNumber(document_number));
    }
    Ok(document_number)
}

/// Validates an account id.
///
/// # Errors
///
/// Returns `InvalidAccountId` unless the id is positive.
pub fn validate_account_id(account_id: AccountId) -> Result<AccountId, LedgerError> {
    if !account_id.is_valid() {
        return Err(LedgerError::InvalidAccountId(account_id.into_inner()));
    }
    Ok(account_id)
}

/// Validates a transaction id.
///
/// # Errors
///
/// Returns `InvalidTransactionId` unless the id is positive.
pub fn validate_transaction_id(
    transaction_id: TransactionId,
) -> Result<TransactionId, LedgerError> {
    if !transaction_id.is_valid() {
        return Err(LedgerError::InvalidTransactionId(transaction_id.into_inner()));
    }
    Ok(transaction_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    /// Record validation for a known-good account.
    fn validate_operation(
        operation_type_id: i32,
        amount: Decimal,
    ) -> Result<(OperationType, Decimal), LedgerError> {
        validate_record(AccountId::new(1), operation_type_id, amount).map(|(_, op, amount)| (op, amount))
    }

    #[rstest]
    #[case(1, dec!(-50))]
    #[case(2, dec!(-23.5))]
    #[case(3, dec!(-18.7))]
    #[case(4, dec!(60))]
    fn test_valid_operations(#[case] operation_type_id: i32, #[case] amount: Decimal) {
        let (op, normalized) = validate_operation(operation_type_id, amount).unwrap();
        assert_eq!(op.id(), operation_type_id);
        assert_eq!(normalized, amount);
    }

    #[rstest]
    #[case(1, dec!(50))]
    #[case(2, dec!(0.01))]
    #[case(3, dec!(18.7))]
    #[case(4, dec!(-60))]
    #[case(4, dec!(0))]
    #[case(1, dec!(-0.004))]
    fn test_sign_mismatch_rejected(#[case] operation_type_id: i32, #[case] amount: Decimal) {
        assert!(matches!(
            validate_operation(operation_type_id, amount),
            Err(LedgerError::InvalidAmountSign { .. })
        ));
    }

    #[rstest]
    #[case(0)]
    #[case(5)]
    #[case(-1)]
    fn test_unknown_operation_type_rejected(#[case] operation_type_id: i32) {
        assert!(matches!(
            validate_operation(operation_type_id, dec!(-10)),
            Err(LedgerError::InvalidOperationType(id)) if id == operation_type_id
        ));
    }

    #[rstest]
    #[case(4, dec!(9999999999999999.99))]
    #[case(1, dec!(-9999999999999999.99))]
    #[case(4, dec!(9999999999999999.994))]
    fn test_amount_at_bound_accepted(#[case] operation_type_id: i32, #[case] amount: Decimal) {
        let (_, normalized) = validate_operation(operation_type_id, amount).unwrap();
        assert_eq!(normalized.abs(), MAX_AMOUNT);
    }

    #[rstest]
    #[case(4, dec!(10000000000000000))]
    #[case(4, dec!(100000000000000000))]
    #[case(3, dec!(-10000000000000000.00))]
    #[case(4, dec!(9999999999999999.995))]
    fn test_amount_past_bound_rejected(#[case] operation_type_id: i32, #[case] amount: Decimal) {
        assert!(matches!(
            validate_operation(operation_type_id, amount),
            Err(LedgerError::AmountOutOfRange(_))
        ));
    }

    #[test]
    fn test_max_amount_value() {
        assert_eq!(MAX_AMOUNT, dec!(9999999999999999.99));
    }

    #[test]
    fn test_record_single_violation_returned_as_is() {
        assert!(matches!(
            validate_record(AccountId::new(1), 8, dec!(-5)),
            Err(LedgerError::InvalidOperationType(8))
        ));
        let (account_id, op, amount) = validate_record(AccountId::new(1), 4, dec!(5)).unwrap();
        assert_eq!(account_id, AccountId::new(1));
        assert_eq!(op, OperationType::Payment);
        assert_eq!(amount, dec!(5));
    }

    #[test]
    fn test_record_collects_every_violation() {
        let err = validate_record(AccountId::new(0), 1, dec!(25)).unwrap_err();
        let LedgerError::InvalidInput(violations) = &err else {
            panic!("expected InvalidInput, got {err:?}");
        };
        assert_eq!(violations.len(), 2);
        assert!(matches!(violations[0], LedgerError::InvalidAccountId(0)));
        assert!(matches!(violations[1], LedgerError::InvalidAmountSign { .. }));
        assert!(err.to_string().contains("the account_id must be a valid positive integer"));
        assert!(err.to_string().contains("purchases and withdraw operations"));

        let err = validate_record(AccountId::new(-4), 9, dec!(100000000000000000)).unwrap_err();
        assert!(matches!(&err, LedgerError::InvalidInput(v) if v.len() == 3));
        assert!(err.is_validation());
    }

    #[test]
    fn test_normalize_uses_bankers_rounding() {
        assert_eq!(normalize_amount(dec!(10.125)), dec!(10.12));
        assert_eq!(normalize_amount(dec!(10.135)), dec!(10.14));
        assert_eq!(normalize_amount(dec!(-10.125)), dec!(-10.12));
        assert_eq!(normalize_amount(dec!(7)), dec!(7));
        assert_eq!(normalize_amount(dec!(7)).to_string(), "7.00");
    }

    #[test]
    fn test_document_number() {
        assert_eq!(validate_document_number(12_345_678_900).unwrap(), 12_345_678_900);
        assert!(matches!(
            validate_document_number(0),
            Err(LedgerError::InvalidDocumentNumber(0))
        ));
        assert!(validate_document_number(-3).is_err());
    }

    #[test]
    fn test_ids() {
        assert!(validate_account_id(AccountId::new(1)).is_ok());
        assert!(matches!(
            validate_account_id(AccountId::new(0)),
            Err(LedgerError::InvalidAccountId(0))
        ));
        assert!(validate_transaction_id(TransactionId::new(2)).is_ok());
        assert!(matches!(
            validate_transaction_id(TransactionId::new(-2)),
            Err(LedgerError::InvalidTransactionId(-2))
        ));
    }
}
