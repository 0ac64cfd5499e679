fn main() {
    // ESP-IDF link/env propagation is only meaningful when cross-compiling
    // the firmware binary; host-side lib/test builds skip it.
    if std::env::var("CARGO_FEATURE_ESPIDF").is_ok() {
        embuild::espidf::sysenv::output();
    }
}
