//! Masked calldata reconciliation.
//!
//! Each order carries calldata plus a same-length replacement mask. A
//! non-zero mask byte means "the counterparty may supply this byte". Two
//! orders can settle only if applying each side's mask with the other
//! side's calldata as the source yields identical bytes.

use tradeseal_types::{Result, TradesealError};

/// `out[i] = if mask[i] != 0 { replacement[i] } else { original[i] }`.
///
/// An empty mask means exact match: `original` is returned unchanged and
/// `replacement` is not consulted.
pub fn guarded_array_replace(original: &[u8], replacement: &[u8], mask: &[u8]) -> Result<Vec<u8>> {
    if mask.is_empty() {
        return Ok(original.to_vec());
    }
    if original.len() != replacement.len() {
        return Err(TradesealError::LengthMismatch {
            what: "calldata vs counterparty calldata",
            left: original.len(),
            right: replacement.len(),
        });
    }
    if original.len() != mask.len() {
        return Err(TradesealError::LengthMismatch {
            what: "calldata vs replacement mask",
            left: original.len(),
            right: mask.len(),
        });
    }

    Ok(original
        .iter()
        .zip(replacement)
        .zip(mask)
        .map(|((o, r), m)| if *m == 0 { *o } else { *r })
        .collect())
}

/// Reconcile buy and sell calldata into the single call both sides agreed to.
///
/// Fails with `IncompatibleOrders` if the masked views differ and with
/// `LengthMismatch` if a mask doesn't cover its calldata.
pub fn merge_calldata(
    buy_calldata: &[u8],
    buy_mask: &[u8],
    sell_calldata: &[u8],
    sell_mask: &[u8],
) -> Result<Vec<u8>> {
    let buy_view = guarded_array_replace(buy_calldata, sell_calldata, buy_mask)?;
    let sell_view = guarded_array_replace(sell_calldata, buy_calldata, sell_mask)?;

    if buy_view != sell_view {
        tracing::debug!(
            buy_len = buy_view.len(),
            sell_len = sell_view.len(),
            "calldata views diverge after masking"
        );
        return Err(TradesealError::incompatible(
            "calldata differs after applying replacement masks",
        ));
    }
    Ok(buy_view)
}

/// Boolean form of [`merge_calldata`].
#[must_use]
pub fn order_calldata_can_match(
    buy_calldata: &[u8],
    buy_mask: &[u8],
    sell_calldata: &[u8],
    sell_mask: &[u8],
) -> bool {
    merge_calldata(buy_calldata, buy_mask, sell_calldata, sell_mask).is_ok()
}
