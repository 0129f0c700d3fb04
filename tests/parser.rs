use nom_promptpay::*;

#[test]
fn decode_generated_payloads() {
    for (target, amount, account_number) in [
        ("0812345678", "50.23", "0066812345678"),
        ("0000000000", "9999999.99", "0066000000000"),
        ("1101700203451", "100", "1101700203451"),
    ] {
        let promptpay = PromptPay::new(target, amount).unwrap();
        let payload = Payload::try_from(promptpay.generate().as_str()).unwrap();
        assert_eq!(payload.account_type, promptpay.account_type());
        assert_eq!(payload.account_number, account_number);
        assert_eq!(payload.amount.as_ref(), Some(promptpay.amount()));
    }
}

#[test]
fn decode_known_payload() {
    let payload = Payload::try_from(
        "00020101021229370016A000000677010111021300000000000005802TH530376454109999999.9963042B5D",
    )
    .unwrap();
    assert_eq!(
        payload,
        Payload {
            account_type: AccountType::Citizen,
            account_number: "0000000000000".to_owned(),
            amount: Some(Amount::try_from("9999999.99").unwrap()),
            crc16: 0x2B5D,
        }
    );
}

#[test]
fn lowercase_checksum_is_accepted() {
    let payload = Payload::try_from(
        "00020101021229370016A000000677010111011300668123456785802TH5303764540550.236304fcda",
    )
    .unwrap();
    assert_eq!(payload.crc16, 0xFCDA);
}

#[test]
fn checksum_mismatch() {
    let err = Payload::try_from(
        "00020101021229370016A000000677010111011300668123456785802TH5303764540550.246304FCDA",
    )
    .unwrap_err();
    assert!(matches!(err, Error::ChecksumMismatch { ref actual, .. } if actual == "FCDA"));
}

#[test]
fn wrong_country_is_rejected() {
    let payload =
        finalize("00020101021229370016A000000677010111011300668123456785802US5303764540550.236304");
    assert!(matches!(Payload::try_from(payload.as_str()), Err(Error::Parse(_))));
}

#[test]
fn too_short() {
    assert!(matches!(Payload::try_from("FCD"), Err(Error::Parse(_))));
    assert!(matches!(Payload::try_from(""), Err(Error::Parse(_))));
}

#[test]
fn fields_in_order() {
    let input = "00020101021229370016A000000677010111011300668123456785802TH5303764540550.236304FCDA";
    let mut fields = vec![];
    let mut rest = input;
    while !rest.is_empty() {
        let (next, field) = parser::tlv(rest).unwrap();
        fields.push(field.tag);
        rest = next;
    }
    assert_eq!(fields, ["00", "01", "29", "58", "53", "54", "63"]);
}

#[test]
fn decoded_amount_keeps_wire_text() {
    let payload = finalize(
        "00020101021229370016A000000677010111011300668123456785802TH5303764540550.206304",
    );
    let decoded = Payload::try_from(payload.as_str()).unwrap();
    assert_eq!(decoded.amount.unwrap().as_str(), "50.20");
}

#[test]
fn amount_with_more_than_two_decimals_is_rejected() {
    let payload = finalize(
        "00020101021229370016A000000677010111011300668123456785802TH530376454051.0056304",
    );
    assert!(matches!(Payload::try_from(payload.as_str()), Err(Error::Parse(_))));
}
