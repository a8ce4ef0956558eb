use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AddOnId(pub String);

/// An optional extra purchasable alongside a main service at a flat price.
/// `recommended` is a display-ordering hint only and never affects pricing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AddOnService {
    pub id: AddOnId,
    pub name: String,
    pub price: Decimal,
    pub category: String,
    pub recommended: bool,
}
