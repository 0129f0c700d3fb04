use nom_promptpay::PromptPay;

fn main() {
    let mut args = std::env::args().skip(1);
    let target = args.next().unwrap_or_else(|| "0812345678".to_owned());
    let amount = args.next().unwrap_or_else(|| "50.23".to_owned());

    match PromptPay::new(&target, amount.as_str()) {
        Ok(promptpay) => println!("{promptpay}"),
        Err(e) => eprintln!("{e}"),
    }
}
