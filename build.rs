fn main() {
    println!("cargo:rerun-if-changed=profiles/cocktailcube.json");
    println!("cargo:rerun-if-changed=profiles/winebar.json");

    // Only the firmware build needs the ESP-IDF environment exported.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
