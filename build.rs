fn main() {
    // Export the ESP-IDF environment for the espidf binary build.
    // Host-target library/test builds skip this entirely.
    if std::env::var_os("CARGO_FEATURE_ESPIDF").is_some() {
        embuild::espidf::sysenv::output();
    }
}
