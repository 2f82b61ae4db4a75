//! Per-run tunables.
//!
//! Deserialised by the binary from an optional TOML file overlaid with
//! `ODOO_*` environment variables. Every field has a default, so an empty
//! source yields a usable [`Settings`]; call [`Settings::normalized`] after
//! deserialising.

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// ISO code of the fiscal country, e.g. `PA`.
  pub country_code:                         String,
  pub sales_journal_code:                   String,
  pub sales_journal_name:                   String,
  pub credit_notes_journal_code:            String,
  pub credit_notes_journal_name:            String,
  /// Exemption fiscal position.
  pub fiscal_position_name:                 String,
  /// Withholding fiscal position.
  pub fiscal_position_retencion_name:       String,
  #[serde(deserialize_with = "flag")]
  pub fiscal_position_retencion_auto_apply: bool,
  pub tax_group_retencion_name:             String,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      country_code:                         "PA".into(),
      sales_journal_code:                   "FE".into(),
      sales_journal_name:                   "Facturación electrónica".into(),
      credit_notes_journal_code:            "NC".into(),
      credit_notes_journal_name:            "Notas de Crédito".into(),
      fiscal_position_name:                 "Exento de impuestos".into(),
      fiscal_position_retencion_name:       "Retención de impuestos".into(),
      fiscal_position_retencion_auto_apply: true,
      tax_group_retencion_name:             "Retención de Impuestos".into(),
    }
  }
}

impl Settings {
  /// Trim every value, replace blank values with their defaults and
  /// upper-case the country code.
  pub fn normalized(self) -> Self {
    let defaults = Self::default();
    let pick = |value: String, default: String| {
      let value = value.trim();
      if value.is_empty() { default } else { value.to_owned() }
    };

    Self {
      country_code: pick(self.country_code, defaults.country_code)
        .to_uppercase(),
      sales_journal_code: pick(self.sales_journal_code, defaults.sales_journal_code),
      sales_journal_name: pick(self.sales_journal_name, defaults.sales_journal_name),
      credit_notes_journal_code: pick(
        self.credit_notes_journal_code,
        defaults.credit_notes_journal_code,
      ),
      credit_notes_journal_name: pick(
        self.credit_notes_journal_name,
        defaults.credit_notes_journal_name,
      ),
      fiscal_position_name: pick(
        self.fiscal_position_name,
        defaults.fiscal_position_name,
      ),
      fiscal_position_retencion_name: pick(
        self.fiscal_position_retencion_name,
        defaults.fiscal_position_retencion_name,
      ),
      fiscal_position_retencion_auto_apply: self
        .fiscal_position_retencion_auto_apply,
      tax_group_retencion_name: pick(
        self.tax_group_retencion_name,
        defaults.tax_group_retencion_name,
      ),
    }
  }
}

/// Accept a real boolean, or the strings `1`, `true` and `yes`
/// (case-insensitive) as true. Any other string is false.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Raw {
    Bool(bool),
    Int(i64),
    Text(String),
  }

  Ok(match Raw::deserialize(deserializer)? {
    Raw::Bool(b) => b,
    Raw::Int(i) => i == 1,
    Raw::Text(s) => {
      matches!(s.trim(), "1" | "true" | "yes")
    }
  })
}
