use std::fmt;

use nom::Finish;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::{error::Error, parser::payload};

/// Payload format indicator, always version 01
pub const VERSION: &str = "000201";
/// Point of initiation method, `12` marks a static QR
pub const POI_METHOD_STATIC: &str = "010212";
/// Application id sub-field of the merchant account information
pub const PROMPTPAY_AID: &str = "0016A000000677010111";
/// Tag and length of the merchant account information template
pub const MERCHANT_INFO_PREFIX: &str = "2937";
pub const COUNTRY_CODE: &str = "5802TH";
/// ISO 4217 numeric code for Thai Baht
pub const CURRENCY_CODE: &str = "5303764";
pub const AMOUNT_TAG: &str = "54";
/// Tag and length of the checksum, the 4 hex digits follow
pub const CHECKSUM_PREFIX: &str = "6304";
/// International prefix replacing the leading zero of a phone number
pub const PHONE_PREFIX: &str = "0066";
/// Length of the account number embedded in the payload, for both account types
pub const ACCOUNT_NUMBER_LEN: usize = 13;
pub const DEFAULT_QR_IMAGE_SIZE: u32 = 250;

const CITIZEN_ID_LEN: usize = 13;
const PHONE_NUMBER_LEN: usize = 10;

/// How the target account is identified
///
/// | Code | Target             |
/// |------|--------------------|
/// | 01   | Mobile phone (10)  |
/// | 02   | Citizen id (13)    |
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccountType {
    Telephone,
    Citizen,
}

impl AccountType {
    /// Classifies a raw target by its shape, 13 digits win over 10 digits
    pub fn classify(target: &str) -> Option<Self> {
        if is_digits(target, CITIZEN_ID_LEN) {
            Some(Self::Citizen)
        } else if is_digits(target, PHONE_NUMBER_LEN) {
            Some(Self::Telephone)
        } else {
            None
        }
    }

    /// Two digit sub-tag used inside the merchant account information
    pub fn code(self) -> &'static str {
        match self {
            Self::Telephone => "01",
            Self::Citizen => "02",
        }
    }
}

impl TryFrom<&str> for AccountType {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "01" => Ok(Self::Telephone),
            "02" => Ok(Self::Citizen),
            _ => Err(Error::Parse(format!("unknown account type {value:?}"))),
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

/// Non negative amount rounded to satang precision
///
/// The textual form drops trailing zeros left by rounding and keeps a single
/// `.0` on whole amounts: `100` is written as `100.0`, `50.20` as `50.2`.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Decimal", into = "Decimal"))]
pub struct Amount {
    value: Decimal,
    text: String,
}

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, Error> {
        if value < Decimal::ZERO {
            log::warn!("rejecting negative amount {value}");
            return Err(Error::NegativeAmount);
        }

        let mut value = value
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .normalize();
        // -0 survives the sign check
        value.set_sign_positive(true);

        let text = if value.scale() == 0 {
            format!("{value}.0")
        } else {
            value.to_string()
        };

        Ok(Self { value, text })
    }

    /// Amount exactly as written in a payload, at most 2 fractional digits
    pub fn from_wire(text: &str) -> Result<Self, Error> {
        let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        let well_formed = match text.split_once('.') {
            Some((int, frac)) => digits(int) && digits(frac) && frac.len() <= 2,
            None => digits(text),
        };
        if !well_formed {
            return Err(Error::InvalidAmount(text.to_owned()));
        }

        let value = text
            .parse()
            .map_err(|_| Error::InvalidAmount(text.to_owned()))?;
        Ok(Self {
            value,
            text: text.to_owned(),
        })
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Text embedded in the amount field
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Two digit length declared in front of the amount text
    pub fn length_code(&self) -> String {
        format!("{:02}", self.text.len())
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = Error;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(value: Amount) -> Self {
        value.value
    }
}

impl TryFrom<f64> for Amount {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value < 0.0 {
            return Err(Error::NegativeAmount);
        }
        let value = Decimal::try_from(value)
            .map_err(|_| Error::InvalidAmount(format!("{value:e}")))?;
        Self::new(value)
    }
}

impl TryFrom<&str> for Amount {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let parsed: Decimal = value
            .parse()
            .map_err(|_| Error::InvalidAmount(value.to_owned()))?;
        Self::new(parsed)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A validated PromptPay payment request
///
/// Built once from a target and an amount, the payload is derived from it
/// on demand and is always the same for the same request.
///
/// ```
/// use nom_promptpay::PromptPay;
///
/// let promptpay = PromptPay::new("0812345678", 50.23).unwrap();
/// assert_eq!(
///     promptpay.generate(),
///     "00020101021229370016A000000677010111011300668123456785802TH5303764540550.236304FCDA"
/// );
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "PromptPayRequest"))]
pub struct PromptPay {
    target: String,
    account_type: AccountType,
    /// Citizen id as is, phone numbers with the international prefix
    account_number: String,
    amount: Amount,
}

impl PromptPay {
    /// Validates the target shape first, then the amount
    pub fn new<A>(target: &str, amount: A) -> Result<Self, Error>
    where
        A: TryInto<Amount, Error = Error>,
    {
        let account_type = AccountType::classify(target).ok_or_else(|| {
            log::warn!("rejecting target {target:?}");
            Error::TargetFormat(target.to_owned())
        })?;

        let account_number = match account_type {
            AccountType::Citizen => target.to_owned(),
            AccountType::Telephone => format!("{PHONE_PREFIX}{}", &target[1..]),
        };

        let amount = amount.try_into()?;
        log::debug!("{target} classified as {account_type:?}, amount {amount}");

        Ok(Self {
            target: target.to_owned(),
            account_type,
            account_number,
            amount,
        })
    }

    /// Target as given by the caller
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    pub fn amount(&self) -> &Amount {
        &self.amount
    }

    /// Every field up to and including the checksum tag and length
    pub fn checksum_free_payload(&self) -> String {
        format!(
            "{VERSION}{POI_METHOD_STATIC}{MERCHANT_INFO_PREFIX}{PROMPTPAY_AID}{}{ACCOUNT_NUMBER_LEN}{}{COUNTRY_CODE}{CURRENCY_CODE}{AMOUNT_TAG}{}{}{CHECKSUM_PREFIX}",
            self.account_type.code(),
            self.account_number,
            self.amount.length_code(),
            self.amount.as_str(),
        )
    }

    /// Full payload including the checksum
    pub fn generate(&self) -> String {
        let payload = crate::finalize(&self.checksum_free_payload());
        log::debug!("generated payload {payload}");
        payload
    }
}

/// Caller supplied fields of a [`PromptPay`], everything else is derived again
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct PromptPayRequest {
    target: String,
    amount: Decimal,
}

#[cfg(feature = "serde")]
impl TryFrom<PromptPayRequest> for PromptPay {
    type Error = Error;

    fn try_from(value: PromptPayRequest) -> Result<Self, Self::Error> {
        Self::new(&value.target, value.amount)
    }
}

impl fmt::Display for PromptPay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.generate())
    }
}

/// Builds the payload for a target and amount in one go
pub fn generate<A>(target: &str, amount: A) -> Result<String, Error>
where
    A: TryInto<Amount, Error = Error>,
{
    PromptPay::new(target, amount).map(|promptpay| promptpay.generate())
}

/// A single tag-length-value field of a payload
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Field<'a> {
    pub tag: &'a str,
    pub value: &'a str,
}

/// A decoded PromptPay payload
///
/// Obtained from [`parser::payload`][crate::parser::payload], which also
/// checks field order, fixed fields and the checksum.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Payload {
    pub account_type: AccountType,
    pub account_number: String,
    /// Absent when the payer is expected to type the amount
    pub amount: Option<Amount>,
    /// CRC16 Calculated using [CCITT/CRC16][crate::crc16] algorithm and 0x1021 polynomial
    pub crc16: u16,
}

impl TryFrom<&str> for Payload {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let Some(split) = value.len().checked_sub(4).filter(|i| value.is_char_boundary(*i)) else {
            return Err(Error::Parse("payload too short".to_owned()));
        };
        let (body, actual) = value.split_at(split);
        let expected = crate::checksum(body);
        if !actual.eq_ignore_ascii_case(&expected) {
            log::warn!("checksum mismatch on {value:?}");
            return Err(Error::ChecksumMismatch {
                expected,
                actual: actual.to_owned(),
            });
        }

        match payload(value).finish() {
            Ok(("", payload)) => Ok(payload),
            Ok((rest, _)) => Err(Error::Parse(format!("trailing data {rest:?}"))),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merchant_info_length_matches_template() {
        // aid + account type tag + account length + account number
        let len = PROMPTPAY_AID.len() + 2 + 2 + ACCOUNT_NUMBER_LEN;
        assert_eq!(MERCHANT_INFO_PREFIX, format!("29{len}"));
    }

    #[test]
    fn classify_targets() {
        assert_eq!(AccountType::classify("0812345678"), Some(AccountType::Telephone));
        assert_eq!(AccountType::classify("1234567890123"), Some(AccountType::Citizen));
        assert_eq!(AccountType::classify("08123456789"), None);
        assert_eq!(AccountType::classify("081234567a"), None);
        assert_eq!(AccountType::classify("０812345678"), None);
        assert_eq!(AccountType::classify(""), None);
    }

    #[test]
    fn account_type_codes() {
        assert_eq!(AccountType::Telephone.code(), "01");
        assert_eq!(AccountType::Citizen.code(), "02");
        assert_eq!(AccountType::try_from("02").unwrap(), AccountType::Citizen);
        assert!(AccountType::try_from("03").is_err());
    }

    #[test]
    fn phone_numbers_are_normalized() {
        let promptpay = PromptPay::new("0812345678", 1.0).unwrap();
        assert_eq!(promptpay.account_number(), "0066812345678");
        assert_eq!(promptpay.account_number().len(), ACCOUNT_NUMBER_LEN);
        assert_eq!(promptpay.target(), "0812345678");

        let promptpay = PromptPay::new("1234567890123", 1.0).unwrap();
        assert_eq!(promptpay.account_number(), "1234567890123");
    }

    #[test]
    fn amount_text() {
        let text = |s: &str| Amount::try_from(s).unwrap().to_string();
        assert_eq!(text("50.23"), "50.23");
        assert_eq!(text("50.20"), "50.2");
        assert_eq!(text("100"), "100.0");
        assert_eq!(text("0"), "0.0");
        assert_eq!(text("-0"), "0.0");
        assert_eq!(text("1.005"), "1.01");
        assert_eq!(text("1.004"), "1.0");
        assert_eq!(text("9999999.99"), "9999999.99");
        assert_eq!(Amount::try_from(50.23).unwrap().as_str(), "50.23");
    }

    #[test]
    fn wire_amounts_are_kept_verbatim() {
        let amount = Amount::from_wire("50.20").unwrap();
        assert_eq!(amount.as_str(), "50.20");
        assert_eq!(amount.value(), Decimal::new(5020, 2));
        assert_eq!(Amount::from_wire("100").unwrap().as_str(), "100");

        for text in ["1.005", "-1.00", "1.", ".5", "", "1e3", "1,000.00", " 1.00"] {
            assert!(
                matches!(Amount::from_wire(text), Err(Error::InvalidAmount(_))),
                "{text}"
            );
        }
    }

    #[test]
    fn amount_length_code() {
        assert_eq!(Amount::try_from("50.23").unwrap().length_code(), "05");
        assert_eq!(Amount::try_from("9999999.99").unwrap().length_code(), "10");
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(matches!(Amount::try_from(-0.01), Err(Error::NegativeAmount)));
        assert!(matches!(Amount::try_from("-0.001"), Err(Error::NegativeAmount)));
        assert!(matches!(
            PromptPay::new("0812345678", -9999999.99),
            Err(Error::NegativeAmount)
        ));
    }

    #[test]
    fn non_finite_amounts_are_rejected() {
        assert!(matches!(Amount::try_from(f64::NAN), Err(Error::InvalidAmount(_))));
        assert!(matches!(Amount::try_from(f64::INFINITY), Err(Error::InvalidAmount(_))));
        assert!(matches!(Amount::try_from("ten"), Err(Error::InvalidAmount(_))));
        match Amount::try_from(f64::MAX) {
            Err(Error::InvalidAmount(text)) => assert_eq!(text, "1.7976931348623157e308"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn target_is_checked_before_amount() {
        assert!(matches!(
            PromptPay::new("08123456789", -1.0),
            Err(Error::TargetFormat(_))
        ));
    }

    #[test]
    fn checksum_free_payload_layout() {
        let promptpay = PromptPay::new("0812345678", 50.23).unwrap();
        assert_eq!(
            promptpay.checksum_free_payload(),
            "00020101021229370016A000000677010111011300668123456785802TH5303764540550.236304"
        );
        assert_eq!(promptpay.to_string(), promptpay.generate());
    }
}
