use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use crate::models::address::parse_address;
use crate::models::text::encode_text;
use crate::models::{DepositOffer, OfferList, OfferSource, U256};

/// Fictional offers for demo environments. Never mixed with live offers.
const DEMO_SEEDS: &[(u64, &str, u64, &str, &str)] = &[
    (1, "0x7a2F8c9D3B45e6fa1D0C8e7b2A94F3D5E6C1b890", 5_000_000_000, "+63 917 XXX XXXX", "GCash"),
    (2, "0x3e1A9c5f7D2B8e4c6a0f1D3b5e7c9A2d4f6E8B01", 3_000_000_000, "+65 8XXX XXXX", "GrabPay"),
    (3, "0x9b4D2f6A8C1E3A5D7b0E2c4F6a8D0b3E5C7a9f12", 2_500_000_000, "+66 8X XXX XXXX", "PromptPay"),
    (4, "0x5c8E1A3D7B9F2E4a6D0c8F1B3A5E7c9d2f4B6A83", 1_500_000_000, "+62 812 XXXX XXXX", "Dana"),
    (5, "0x2d7f4B6A8E1C3a5E9c0D2f4B6a8D0E3c5F7b9a24", 8_000_000_000, "+65 9XXX XXXX", "PayNow"),
];

pub fn demo_offers() -> Vec<DepositOffer> {
    DEMO_SEEDS
        .iter()
        .filter_map(|(id, depositor, amount, payee, method)| {
            Some(DepositOffer {
                id: *id,
                depositor: parse_address(depositor).ok()?,
                amount: U256::from(*amount),
                shares_in_vault: U256::from(*amount),
                payee_details: encode_text(payee).ok()?,
                payment_method: encode_text(method).ok()?,
                accepting_intents: true,
            })
        })
        .collect()
}

/// Most recent `cap` deposit IDs, newest first. IDs start at 1.
pub fn candidate_ids(counter: u64, cap: u64) -> Vec<u64> {
    (0..counter.min(cap)).map(|i| counter - i).collect()
}

/// Active offers from `records`, newest first, one per ID. When nothing is
/// active and `demo_fallback` is set, the demo seeds are returned instead,
/// tagged as such.
pub fn build_offer_list<'a>(
    records: impl IntoIterator<Item = &'a DepositOffer>,
    demo_fallback: bool,
) -> OfferList {
    let mut seen = HashSet::new();
    let mut active: Vec<&DepositOffer> = records
        .into_iter()
        .filter(|d| d.is_active())
        .filter(|d| seen.insert(d.id))
        .collect();
    active.sort_by(|a, b| b.id.cmp(&a.id));

    if active.is_empty() && demo_fallback {
        let mut demo = demo_offers();
        demo.sort_by(|a, b| b.id.cmp(&a.id));
        return OfferList {
            source: OfferSource::Demo,
            offers: demo.iter().map(DepositOffer::view).collect(),
        };
    }

    OfferList {
        source: OfferSource::Live,
        offers: active.into_iter().map(DepositOffer::view).collect(),
    }
}

/// Slot per candidate ID; `None` means the read has not completed yet.
/// The displayable list is a projection over whatever has arrived.
#[derive(Debug, Default)]
pub struct OfferBook {
    slots: BTreeMap<u64, Option<Arc<DepositOffer>>>,
}

impl OfferBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks exactly `ids`. Records already loaded for retained IDs stay.
    pub fn track(&mut self, ids: &[u64]) {
        let wanted: HashSet<u64> = ids.iter().copied().collect();
        self.slots.retain(|id, _| wanted.contains(id));
        for id in ids {
            self.slots.entry(*id).or_insert(None);
        }
    }

    /// Stores an arrived record. Records for untracked IDs are ignored.
    pub fn record(&mut self, deposit: Arc<DepositOffer>) -> bool {
        match self.slots.get_mut(&deposit.id) {
            Some(slot) => {
                *slot = Some(deposit);
                true
            }
            None => false,
        }
    }

    pub fn mark_pending(&mut self, id: u64) {
        if let Some(slot) = self.slots.get_mut(&id) {
            *slot = None;
        }
    }

    pub fn get(&self, id: u64) -> Option<Arc<DepositOffer>> {
        self.slots.get(&id).cloned().flatten()
    }

    pub fn tracked(&self) -> usize {
        self.slots.len()
    }

    pub fn pending(&self) -> usize {
        self.slots.values().filter(|s| s.is_none()).count()
    }

    pub fn offer_list(&self, demo_fallback: bool) -> OfferList {
        build_offer_list(
            self.slots.values().filter_map(|s| s.as_deref()),
            demo_fallback,
        )
    }
}
