//! The fixed topic ontology.
//!
//! Topics are known ahead of time and never created at runtime. Incoming topic
//! strings are matched case-insensitively after trimming; anything outside the
//! list is rejected with [`Error::UnknownTopic`].

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::{Error, Result};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
  Serialize,
  Deserialize,
)]
#[serde(into = "&'static str", try_from = "String")]
#[strum(ascii_case_insensitive)]
pub enum Topic {
  #[strum(serialize = "interest rates")]
  InterestRates,
  #[strum(serialize = "inflation")]
  Inflation,
  #[strum(serialize = "monetary policy")]
  MonetaryPolicy,
  #[strum(serialize = "central bank independence")]
  CentralBankIndependence,
  #[strum(serialize = "banking system")]
  BankingSystem,
  #[strum(serialize = "credit conditions")]
  CreditConditions,
  #[strum(serialize = "equity markets")]
  EquityMarkets,
  #[strum(serialize = "bond markets")]
  BondMarkets,
  #[strum(serialize = "precious metals")]
  PreciousMetals,
  #[strum(serialize = "commodities")]
  Commodities,
  #[strum(serialize = "energy markets")]
  EnergyMarkets,
  #[strum(serialize = "oil markets")]
  OilMarkets,
  #[strum(serialize = "retail earnings")]
  RetailEarnings,
  #[strum(serialize = "tech earnings")]
  TechEarnings,
  #[strum(serialize = "corporate earnings")]
  CorporateEarnings,
  #[strum(serialize = "consumer spending")]
  ConsumerSpending,
  #[strum(serialize = "labor market")]
  LaborMarket,
  #[strum(serialize = "housing market")]
  HousingMarket,
  #[strum(serialize = "fiscal policy")]
  FiscalPolicy,
  #[strum(serialize = "public debt")]
  PublicDebt,
  #[strum(serialize = "taxation")]
  Taxation,
  #[strum(serialize = "trade")]
  Trade,
  #[strum(serialize = "geopolitics")]
  Geopolitics,
  #[strum(serialize = "economic sanctions")]
  EconomicSanctions,
  #[strum(serialize = "ai policy")]
  AiPolicy,
  #[strum(serialize = "tech policy")]
  TechPolicy,
}

impl Topic {
  /// Parse a caller-supplied topic string.
  pub fn parse(raw: &str) -> Result<Self> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
      .parse()
      .map_err(|_| Error::UnknownTopic(raw.to_owned()))
  }

  /// The canonical lower-case name, e.g. `"interest rates"`.
  pub fn as_str(self) -> &'static str { self.into() }

  /// Every topic, in ontology order.
  pub fn all() -> impl Iterator<Item = Topic> { Self::iter() }
}

impl TryFrom<String> for Topic {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> { Self::parse(&value) }
}
