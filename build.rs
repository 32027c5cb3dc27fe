fn main() {
    // ESP-IDF build environment propagation. Host-target test builds
    // (--no-default-features) skip this entirely.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
