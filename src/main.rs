fn main() {
    if let Err(err) = eurostat_longform::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
