//! The deal record and the whole-document ledger view of it.
//!
//! The ledger is a single JSON document holding every deal. It is read in
//! full and written in full; `Deals` is that document. Fields the gateway
//! does not interpret (summary text, scoring, discount data written by the
//! ledger builder) are preserved round-trip via `extra`.

use serde::{Deserialize, Serialize};

use super::ids::DealId;

/// Promotion package attached to a deal after a confirmed payment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageTier {
    /// Not promoted. The only tier a deal can hold while `promoted` is false.
    #[default]
    None,
    /// Entry promotion tier.
    Flame,
    /// Premium tier; a confirmed inferno purchase also fires the blast trigger.
    Inferno,
}

impl PackageTier {
    /// Whether this tier can be purchased. `None` is a ledger resting state,
    /// never a valid purchase or checkout metadata value.
    pub fn is_purchasable(self) -> bool {
        !matches!(self, PackageTier::None)
    }

    /// The metadata/wire name of this tier.
    pub fn as_str(self) -> &'static str {
        match self {
            PackageTier::None => "none",
            PackageTier::Flame => "flame",
            PackageTier::Inferno => "inferno",
        }
    }
}

/// One promotable offer.
///
/// `url` is the affiliate-wrapped destination and is authoritative for
/// redirects. `promoted` and `package` change only on confirmed payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: DealId,
    pub brand: String,
    pub url: String,
    #[serde(default)]
    pub promoted: bool,
    #[serde(default)]
    pub package: PackageTier,
    /// Builder-owned fields (summary, value score, discount data) carried
    /// through untouched so a save never drops them.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Deal {
    pub fn new(id: impl Into<DealId>, brand: impl Into<String>, url: impl Into<String>) -> Self {
        Deal {
            id: id.into(),
            brand: brand.into(),
            url: url.into(),
            promoted: false,
            package: PackageTier::None,
            extra: serde_json::Map::new(),
        }
    }
}

/// The full ledger document: every deal, order irrelevant, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deals(pub Vec<Deal>);

impl Deals {
    /// Looks up a deal by string-normalized id.
    pub fn find(&self, id: &DealId) -> Option<&Deal> {
        self.0.iter().find(|d| &d.id == id)
    }

    /// Looks up a deal by string-normalized id, mutably.
    pub fn find_mut(&mut self, id: &DealId) -> Option<&mut Deal> {
        self.0.iter_mut().find(|d| &d.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_deal() -> Deal {
        Deal::new(7u64, "Acme", "https://partner.example/acme?ref=1")
    }

    #[test]
    fn new_deal_is_unpromoted() {
        let deal = sample_deal();
        assert!(!deal.promoted);
        assert_eq!(deal.package, PackageTier::None);
    }

    #[test]
    fn package_tier_wire_names() {
        assert_eq!(
            serde_json::to_string(&PackageTier::Inferno).unwrap(),
            "\"inferno\""
        );
        let parsed: PackageTier = serde_json::from_str("\"flame\"").unwrap();
        assert_eq!(parsed, PackageTier::Flame);
    }

    #[test]
    fn only_flame_and_inferno_are_purchasable() {
        assert!(!PackageTier::None.is_purchasable());
        assert!(PackageTier::Flame.is_purchasable());
        assert!(PackageTier::Inferno.is_purchasable());
    }

    #[test]
    fn find_uses_string_normalized_ids() {
        // The builder writes numeric ids; lookups arrive as path strings.
        let json = r#"[{"id": 7, "brand": "Acme", "url": "https://a.example"}]"#;
        let deals: Deals = serde_json::from_str(json).unwrap();

        assert!(deals.find(&DealId::from("7")).is_some());
        assert!(deals.find(&DealId::from("8")).is_none());
    }

    #[test]
    fn missing_promotion_fields_default() {
        let json = r#"[{"id": "1", "brand": "B", "url": "https://b.example"}]"#;
        let deals: Deals = serde_json::from_str(json).unwrap();
        let deal = deals.find(&DealId::from("1")).unwrap();

        assert!(!deal.promoted);
        assert_eq!(deal.package, PackageTier::None);
    }

    #[test]
    fn builder_fields_survive_roundtrip() {
        let json = r#"[{
            "id": 3,
            "brand": "Shopify",
            "url": "https://partner.example/shopify",
            "summary": "High-value SAAS intel",
            "value_score": 87,
            "discount_amount": 40
        }]"#;
        let deals: Deals = serde_json::from_str(json).unwrap();
        let out = serde_json::to_value(&deals).unwrap();

        assert_eq!(out[0]["summary"], "High-value SAAS intel");
        assert_eq!(out[0]["value_score"], 87);
        assert_eq!(out[0]["discount_amount"], 40);
    }

    #[test]
    fn find_mut_allows_promotion() {
        let mut deals = Deals(vec![sample_deal()]);
        let deal = deals.find_mut(&DealId::from("7")).unwrap();
        deal.promoted = true;
        deal.package = PackageTier::Inferno;

        let deal = deals.find(&DealId::from("7")).unwrap();
        assert!(deal.promoted);
        assert_eq!(deal.package, PackageTier::Inferno);
    }
}
