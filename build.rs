fn main() {
    println!("cargo:rerun-if-env-changed=BRIDGE_CONFIG_JSON");
    println!("cargo:rerun-if-env-changed=BRIDGE_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=BRIDGE_WIFI_PASSWORD");
    println!("cargo:rerun-if-env-changed=BRIDGE_MQTT_HOST");
    println!("cargo:rerun-if-env-changed=BRIDGE_MQTT_USER");
    println!("cargo:rerun-if-env-changed=BRIDGE_MQTT_PASSWORD");

    // Host builds (tests, fuzzing) run without the ESP-IDF toolchain.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
