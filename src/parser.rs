use nom::{
    branch::alt,
    bytes::{
        complete::{tag, take, take_while_m_n},
        streaming,
    },
    combinator::{all_consuming, eof, map_parser, map_res, opt, verify},
    error::{Error, ErrorKind},
    IResult,
};

use crate::protocol::*;

fn two_digits(input: &str) -> IResult<&str, &str> {
    take_while_m_n(2, 2, |c: char| c.is_ascii_digit())(input)
}

/// Parse a single field
///
/// Two digit tag, two digit decimal length and `length` characters of value
pub fn tlv(input: &str) -> IResult<&str, Field<'_>> {
    let (input, tag) = two_digits(input)?;
    let (input, length) = map_res(two_digits, str::parse::<usize>)(input)?;
    let (input, value) = take(length)(input)?;
    Ok((input, Field { tag, value }))
}

/// Value of the next field, which must carry the `expected` tag
fn field<'a>(expected: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    move |input| {
        let (input, field) = verify(tlv, |field: &Field| field.tag == expected)(input)?;
        Ok((input, field.value))
    }
}

fn merchant_info(input: &str) -> IResult<&str, (AccountType, String)> {
    let (input, _aid) = tag(PROMPTPAY_AID)(input)?;
    let (input, account) = map_res(
        verify(tlv, |account: &Field| {
            account.value.len() == ACCOUNT_NUMBER_LEN
                && account.value.bytes().all(|b| b.is_ascii_digit())
        }),
        |account| {
            AccountType::try_from(account.tag)
                .map(|account_type| (account_type, account.value.to_owned()))
        },
    )(input)?;
    let (input, _) = eof(input)?;
    Ok((input, account))
}

/// Parse a complete payload
///
/// It does 3 main error checks:
/// - Fixed fields (version, merchant scheme, country, currency) are the expected ones
/// - Fields appear in the order they are generated
/// - Computes CRC and verifies it against the one sent
pub fn payload(input: &str) -> IResult<&str, Payload> {
    let start = input;

    let (input, _version) = tag(VERSION)(input)?;
    // dynamic (11) codes are accepted too
    let (input, _poi) = alt((tag(POI_METHOD_STATIC), tag("010211")))(input)?;
    let (input, (account_type, account_number)) =
        map_parser(field("29"), merchant_info)(input)?;
    let (input, _country) = tag(COUNTRY_CODE)(input)?;
    let (input, _currency) = tag(CURRENCY_CODE)(input)?;
    let (input, amount) = opt(map_res(field(AMOUNT_TAG), Amount::from_wire))(input)?;
    let (input, _) = tag(CHECKSUM_PREFIX)(input)?;

    let calculated_crc16 = crate::crc16(start[..start.len() - input.len()].as_bytes());
    let (input, crc16) = verify(
        map_res(
            take_while_m_n(4, 4, |c: char| c.is_ascii_hexdigit()),
            |hex| u16::from_str_radix(hex, 16),
        ),
        |crc16| *crc16 == calculated_crc16,
    )(input)?;

    Ok((
        input,
        Payload {
            account_type,
            account_number,
            amount,
            crc16,
        },
    ))
}

/// Parse a newline terminated payload from a byte buffer
///
/// Returns [`nom::Err::Incomplete`] until the terminating `\n` is available,
/// a trailing `\r` is ignored.
pub fn line(input: &[u8]) -> IResult<&[u8], Payload> {
    let (input, raw) = streaming::take_until("\n")(input)?;
    let (input, _) = streaming::tag("\n")(input)?;
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);

    let text = std::str::from_utf8(raw)
        .map_err(|_| nom::Err::Failure(Error::new(raw, ErrorKind::Char)))?;
    let (_, payload) = all_consuming(payload)(text)
        .map_err(|e| e.map(|e: Error<&str>| Error::new(raw, e.code)))?;

    Ok((input, payload))
}
