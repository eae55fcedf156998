fn main() {
    if let Err(e) = vita::run() {
        eprintln!("vita: {e}");
        std::process::exit(1);
    }
}
