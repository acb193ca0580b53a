// 🧾 Sale Slip - amount-based or weight-based sale at a karat's rate
//
// Only the numbers live here. Printing and receipt layout belong to
// whatever front end shows the slip.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::AurumError;
use crate::karat::Karat;
use crate::parser::parse_number;
use crate::units::{grams_from_tmr_input, tmr_from_grams, Tmr, TOLA_IN_GRAMS};
use crate::valuation::grams_for_amount;

/// What the customer specified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "basis", rename_all = "lowercase")]
pub enum SlipBasis {
    /// Spend this much money
    Amount { amount: String },
    /// Buy this much gold; `grams` wins over the TMR fields when filled in
    Weight {
        #[serde(default)]
        grams: String,
        #[serde(default)]
        tola: String,
        #[serde(default)]
        masha: String,
        #[serde(default)]
        ratti: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleSlip {
    pub bill_number: String,
    pub issued_at: DateTime<Local>,
    pub customer: Customer,
    pub description: String,
    pub karat: Karat,
    /// Price per tola at this karat, `round(rate × purity)`
    pub karat_rate: f64,
    pub grams: f64,
    /// Ratti rounded to 2 decimals
    pub tmr: Tmr,
    pub amount: f64,
}

impl SaleSlip {
    pub fn calculate(
        customer: Customer,
        description: &str,
        basis: &SlipBasis,
        karat: Karat,
        rate: f64,
        issued_at: DateTime<Local>,
    ) -> Result<SaleSlip, AurumError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(AurumError::InvalidRate(rate.to_string()));
        }

        let effective_rate = rate * karat.purity();

        let (grams, amount) = match basis {
            SlipBasis::Amount { amount } => {
                let amount = parse_number(amount);
                if amount <= 0.0 {
                    return Err(AurumError::InvalidAmount);
                }
                (grams_for_amount(amount, karat.value(), rate), amount)
            }
            SlipBasis::Weight {
                grams,
                tola,
                masha,
                ratti,
            } => {
                let grams = if !grams.trim().is_empty() {
                    parse_number(grams)
                } else {
                    grams_from_tmr_input(tola, masha, ratti)
                };
                if grams <= 0.0 {
                    return Err(AurumError::InvalidWeight);
                }
                (grams, (grams * (effective_rate / TOLA_IN_GRAMS)).round())
            }
        };

        Ok(SaleSlip {
            bill_number: bill_number(&issued_at),
            issued_at,
            customer,
            description: description.trim().to_string(),
            karat,
            karat_rate: effective_rate.round(),
            grams,
            tmr: tmr_from_grams(grams).rounded_ratti(2),
            amount,
        })
    }
}

/// `GS` + `YYYYMMDDHHmm` of the issue time
pub fn bill_number<Tz: TimeZone>(issued_at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("GS{}", issued_at.format("%Y%m%d%H%M"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: f64 = 341000.0;

    fn issued() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 7, 14, 5, 0).unwrap()
    }

    #[test]
    fn test_bill_number() {
        assert_eq!(bill_number(&issued()), "GS202503071405");
    }

    #[test]
    fn test_amount_basis() {
        let basis = SlipBasis::Amount {
            amount: "341000".to_string(),
        };
        let slip = SaleSlip::calculate(Customer::default(), "Bar", &basis, Karat::K24, RATE, issued())
            .unwrap();

        assert!((slip.grams - 11.664).abs() < 1e-9);
        assert_eq!(slip.tmr, Tmr::new(1.0, 0.0, 0.0));
        assert_eq!(slip.amount, 341000.0);
        assert_eq!(slip.karat_rate, 341000.0);
        assert_eq!(slip.bill_number, "GS202503071405");
    }

    #[test]
    fn test_weight_basis_with_karat() {
        let basis = SlipBasis::Weight {
            grams: String::new(),
            tola: "1".to_string(),
            masha: String::new(),
            ratti: String::new(),
        };
        let customer = Customer {
            name: "Ali".to_string(),
            phone: "0300".to_string(),
        };
        let slip = SaleSlip::calculate(customer, " Ring ", &basis, Karat::K22, RATE, issued()).unwrap();

        assert_eq!(slip.grams, 11.664);
        assert_eq!(slip.amount, 312595.0);
        assert_eq!(slip.karat_rate, 312595.0);
        assert_eq!(slip.description, "Ring");
        assert_eq!(slip.customer.name, "Ali");
    }

    #[test]
    fn test_ratti_is_rounded() {
        let basis = SlipBasis::Weight {
            grams: "0.2".to_string(),
            tola: String::new(),
            masha: String::new(),
            ratti: String::new(),
        };
        let slip = SaleSlip::calculate(Customer::default(), "", &basis, Karat::K24, RATE, issued())
            .unwrap();
        // 0.2 / 0.1215 = 1.646...
        assert_eq!(slip.tmr.ratti, 1.65);
    }

    #[test]
    fn test_rejects_empty_inputs() {
        let amount = SlipBasis::Amount {
            amount: "".to_string(),
        };
        assert_eq!(
            SaleSlip::calculate(Customer::default(), "", &amount, Karat::K24, RATE, issued()),
            Err(AurumError::InvalidAmount)
        );

        let weight = SlipBasis::Weight {
            grams: "abc".to_string(),
            tola: String::new(),
            masha: String::new(),
            ratti: String::new(),
        };
        assert_eq!(
            SaleSlip::calculate(Customer::default(), "", &weight, Karat::K24, RATE, issued()),
            Err(AurumError::InvalidWeight)
        );

        let ok_amount = SlipBasis::Amount {
            amount: "1000".to_string(),
        };
        assert!(SaleSlip::calculate(Customer::default(), "", &ok_amount, Karat::K24, 0.0, issued())
            .is_err());
    }

    #[test]
    fn test_basis_json_shape() {
        let basis: SlipBasis =
            serde_json::from_str(r#"{"basis":"weight","tola":"2","masha":"3"}"#).unwrap();
        assert_eq!(
            basis,
            SlipBasis::Weight {
                grams: String::new(),
                tola: "2".to_string(),
                masha: "3".to_string(),
                ratti: String::new(),
            }
        );
    }
}
