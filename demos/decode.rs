use std::io::Cursor;

use nom_promptpay::{PromptPay, PromptPayStream};

fn main() {
    // Write a couple of payloads as a scanner would emit them
    let mut stream = PromptPayStream::new(Cursor::new(Vec::new()));
    for (target, amount) in [("0812345678", 50.23), ("0000000000000", 9999999.99)] {
        let promptpay = PromptPay::new(target, amount).unwrap();
        stream.write_payload(&promptpay).expect("Write failed");
    }
    let buffer = stream.into_inner().into_inner();

    // Read them back
    let mut stream = PromptPayStream::new(Cursor::new(buffer));
    while let Ok(payload) = stream.read_payload() {
        println!("{payload:#?}");
    }
}
