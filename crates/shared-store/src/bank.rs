//! # Bank Balance Store
//!
//! Minimal balance/supply bookkeeping behind the `BankApi` port. The
//! stream payment engine pulls reserve deficits through it, and the
//! reconciliation pass diffs its namespace against the payment module's.
//!
//! ## Wire keys (within the bank namespace byte)
//!
//! - Balance: `0x02 || 0x14 || 20-byte address || utf8 denom`
//!   (`0x14` is the address-length tag, equal to 20)
//! - Supply:  `0x00 || utf8 denom`

use crate::kv::{namespaces, KvRead, KvWrite};
use shared_types::{Address, Coin, Uint};
use thiserror::Error;

const BALANCE_TAG: u8 = 0x02;
const ADDRESS_LEN_TAG: u8 = 0x14;
const SUPPLY_TAG: u8 = 0x00;

/// Bank failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BankError {
    /// Sender balance below the requested amount.
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance {
        /// Current balance.
        have: Uint,
        /// Requested amount.
        need: Uint,
    },
}

/// Transfer/read port consumed by payment, SP and virtual-group escrows.
pub trait BankApi {
    /// Balance of `addr` in `denom`.
    fn balance_of(&self, store: &dyn KvRead, addr: Address, denom: &str) -> Uint;

    /// Move `coin` from `from` to `to`.
    fn transfer(
        &self,
        store: &mut dyn KvWrite,
        from: Address,
        to: Address,
        coin: &Coin,
    ) -> Result<(), BankError>;

    /// Mint `coin` to `addr`, growing supply (genesis and test fixtures).
    fn mint(&self, store: &mut dyn KvWrite, addr: Address, coin: &Coin);

    /// Total supply of `denom`.
    fn supply_of(&self, store: &dyn KvRead, denom: &str) -> Uint;
}

/// Stateless bank keeper over the KV port.
#[derive(Clone, Copy, Debug, Default)]
pub struct BankStore;

/// Balance key for `(addr, denom)`.
pub fn balance_key(addr: Address, denom: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(3 + 20 + denom.len());
    key.push(namespaces::BANK);
    key.push(BALANCE_TAG);
    key.push(ADDRESS_LEN_TAG);
    key.extend_from_slice(addr.as_bytes());
    key.extend_from_slice(denom.as_bytes());
    key
}

/// Supply key for `denom`.
pub fn supply_key(denom: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 + denom.len());
    key.push(namespaces::BANK);
    key.push(SUPPLY_TAG);
    key.extend_from_slice(denom.as_bytes());
    key
}

fn read_amount(store: &dyn KvRead, key: &[u8]) -> Uint {
    match store.get(key) {
        Some(bytes) => {
            if bytes.len() != 32 {
                panic!("bank amount must be 32 bytes, got {}", bytes.len());
            }
            Uint::from_big_endian(&bytes)
        }
        None => Uint::zero(),
    }
}

fn write_amount(store: &mut dyn KvWrite, key: Vec<u8>, amount: Uint) {
    if amount.is_zero() {
        store.delete(&key);
        return;
    }
    let mut bytes = [0u8; 32];
    amount.to_big_endian(&mut bytes);
    store.set(key, bytes.to_vec());
}

impl BankApi for BankStore {
    fn balance_of(&self, store: &dyn KvRead, addr: Address, denom: &str) -> Uint {
        read_amount(store, &balance_key(addr, denom))
    }

    fn transfer(
        &self,
        store: &mut dyn KvWrite,
        from: Address,
        to: Address,
        coin: &Coin,
    ) -> Result<(), BankError> {
        if coin.is_zero() {
            return Ok(());
        }
        let from_key = balance_key(from, &coin.denom);
        let have = read_amount(store, &from_key);
        if have < coin.amount {
            return Err(BankError::InsufficientBalance { have, need: coin.amount });
        }
        write_amount(store, from_key, have - coin.amount);
        let to_key = balance_key(to, &coin.denom);
        let to_have = read_amount(store, &to_key);
        write_amount(store, to_key, to_have + coin.amount);
        Ok(())
    }

    fn mint(&self, store: &mut dyn KvWrite, addr: Address, coin: &Coin) {
        if coin.is_zero() {
            return;
        }
        let key = balance_key(addr, &coin.denom);
        let have = read_amount(store, &key);
        write_amount(store, key, have + coin.amount);

        let skey = supply_key(&coin.denom);
        let supply = read_amount(store, &skey);
        write_amount(store, skey, supply + coin.amount);
    }

    fn supply_of(&self, store: &dyn KvRead, denom: &str) -> Uint {
        read_amount(store, &supply_key(denom))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemStore;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    #[test]
    fn test_balance_key_layout() {
        let key = balance_key(addr(0xAB), "umoca");
        assert_eq!(key[0], namespaces::BANK);
        assert_eq!(key[1], 0x02);
        assert_eq!(key[2], 0x14);
        assert_eq!(&key[3..23], &[0xAB; 20]);
        assert_eq!(&key[23..], b"umoca");
    }

    #[test]
    fn test_transfer_and_insufficient() {
        let mut store = MemStore::new();
        let bank = BankStore;
        bank.mint(&mut store, addr(1), &Coin::new("umoca", Uint::from(100u64)));

        bank.transfer(&mut store, addr(1), addr(2), &Coin::new("umoca", Uint::from(40u64)))
            .unwrap();
        assert_eq!(bank.balance_of(&store, addr(1), "umoca"), Uint::from(60u64));
        assert_eq!(bank.balance_of(&store, addr(2), "umoca"), Uint::from(40u64));

        let err = bank
            .transfer(&mut store, addr(2), addr(1), &Coin::new("umoca", Uint::from(41u64)))
            .unwrap_err();
        assert_eq!(
            err,
            BankError::InsufficientBalance { have: Uint::from(40u64), need: Uint::from(41u64) }
        );
    }

    #[test]
    fn test_mint_grows_supply() {
        let mut store = MemStore::new();
        let bank = BankStore;
        bank.mint(&mut store, addr(1), &Coin::new("umoca", Uint::from(5u64)));
        bank.mint(&mut store, addr(2), &Coin::new("umoca", Uint::from(7u64)));
        assert_eq!(bank.supply_of(&store, "umoca"), Uint::from(12u64));
    }
}
